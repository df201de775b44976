//! 액세스 로그 라인 파서
//!
//! S3 스타일 서버 액세스 로그의 고정 문법을 파싱합니다. 문법은 공백으로
//! 구분된 필드의 고정 순서이며, 타임스탬프는 대괄호, 요청 URI/Referrer/
//! User-Agent는 큰따옴표(또는 부재 시 `-`)로 감쌉니다.
//!
//! # 라인 형식
//! ```text
//! OWNER BUCKET [TIME] IP REQUESTER REQ_ID OPERATION KEY "URI" STATUS
//! ERROR_CODE BYTES_SENT OBJECT_SIZE TOTAL_TIME TURN_AROUND "REFERRER"
//! "USER_AGENT" VERSION_ID...
//! ```
//!
//! # 사용 예시
//! ```ignore
//! use bucketstat_pipeline::parser::AccessLogParser;
//!
//! let parser = AccessLogParser::new();
//! let record = parser.parse_line(line)?;
//! assert_eq!(record.operation, "REST.GET.OBJECT");
//! ```

use bucketstat_core::types::{LogRecord, NumericField};
use chrono::NaiveDateTime;

/// 타임스탬프 고정 형식
///
/// 오프셋은 리터럴 `+0000`만 허용하며 UTC로 해석합니다.
const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S +0000";

/// 기본 최대 라인 길이 (바이트)
const DEFAULT_MAX_LINE_LEN: usize = 16 * 1024;

/// 라인 파싱 실패
///
/// 라인 번호는 호출자(파이프라인)가 부여합니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("column {column}: {reason}")]
pub struct ParseFailure {
    /// 실패 위치 (라인 내 바이트 오프셋)
    pub column: usize,
    /// 실패 사유
    pub reason: String,
}

impl ParseFailure {
    fn new(column: usize, reason: impl Into<String>) -> Self {
        Self {
            column,
            reason: reason.into(),
        }
    }
}

/// 액세스 로그 라인 파서
///
/// 라인 하나를 [`LogRecord`]로 변환합니다. 필수 필드가 문법과 어긋나면
/// 해당 라인 전체가 실패하며, 부분 파싱 상태는 없습니다.
pub struct AccessLogParser {
    /// 최대 허용 라인 길이 (바이트)
    max_line_len: usize,
}

impl AccessLogParser {
    /// 기본 설정으로 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self {
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }

    /// 최대 라인 길이를 설정합니다.
    pub fn with_max_line_len(mut self, len: usize) -> Self {
        self.max_line_len = len;
        self
    }

    /// 로그 라인 하나를 파싱합니다.
    ///
    /// 숫자-또는-부재 필드는 문법 수준에서 십진수 또는 `-`만 허용하고,
    /// 원시 토큰 그대로 [`NumericField`]에 보관합니다. 정수 변환은
    /// 소비자가 숫자 여부를 확인한 뒤에 수행합니다.
    pub fn parse_line(&self, line: &str) -> Result<LogRecord, ParseFailure> {
        if line.len() > self.max_line_len {
            return Err(ParseFailure::new(
                0,
                format!(
                    "line too long: {} bytes (max: {})",
                    line.len(),
                    self.max_line_len
                ),
            ));
        }

        let mut cursor = Cursor::new(line);

        let bucket_owner = cursor.plain_token("bucket owner")?.to_owned();
        let bucket = cursor.plain_token("bucket name")?.to_owned();
        let time_token = cursor.bracketed_token("timestamp")?;
        let timestamp = parse_timestamp(time_token, cursor.pos)?;
        let remote_ip = cursor.plain_token("remote ip")?.to_owned();
        let requester = cursor.plain_token("requester")?.to_owned();
        let request_id = cursor.plain_token("request id")?.to_owned();
        let operation = cursor.plain_token("operation")?.to_owned();
        let key = cursor.plain_token("key")?.to_owned();
        let request_uri = cursor.quoted_or_dash("request uri")?.to_owned();
        let http_status = cursor.numeric_or_dash("http status")?;
        let error_code = cursor.plain_token("error code")?.to_owned();
        let bytes_sent = cursor.numeric_or_dash("bytes sent")?;
        let object_size = cursor.numeric_or_dash("object size")?;
        let total_time_ms = cursor.numeric_or_dash("total time")?;
        let turn_around_time_ms = cursor.numeric_or_dash("turn around time")?;
        let referrer = cursor.quoted_or_dash("referrer")?.to_owned();
        let user_agent = cursor.quoted_or_dash("user agent")?.to_owned();
        let version_id = cursor.rest("version id")?.to_owned();

        Ok(LogRecord {
            bucket_owner,
            bucket,
            timestamp,
            remote_ip,
            requester,
            request_id,
            operation,
            key,
            request_uri,
            http_status,
            error_code,
            bytes_sent,
            object_size,
            total_time_ms,
            turn_around_time_ms,
            referrer,
            user_agent,
            version_id,
        })
    }
}

impl Default for AccessLogParser {
    fn default() -> Self {
        Self::new()
    }
}

/// 대괄호 안의 타임스탬프 토큰을 파싱합니다.
///
/// 형식은 `%d/%b/%Y:%H:%M:%S +0000`으로 고정이며, 다른 오프셋은
/// 문법 위반으로 처리합니다.
fn parse_timestamp(token: &str, column: usize) -> Result<chrono::DateTime<chrono::Utc>, ParseFailure> {
    let naive = NaiveDateTime::parse_from_str(token, TIMESTAMP_FORMAT).map_err(|e| {
        ParseFailure::new(column, format!("invalid timestamp '{token}': {e}"))
    })?;
    Ok(naive.and_utc())
}

/// 라인 커서 — 바이트 오프셋을 추적하며 토큰을 잘라냅니다.
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// 현재 위치의 나머지 입력
    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// 선행 공백을 건너뜁니다.
    fn skip_spaces(&mut self) {
        let trimmed = self.remaining().trim_start_matches(' ');
        self.pos = self.input.len() - trimmed.len();
    }

    /// 다음 공백 전까지의 토큰 하나를 잘라냅니다.
    fn plain_token(&mut self, field: &str) -> Result<&'a str, ParseFailure> {
        self.skip_spaces();
        let rest = self.remaining();
        if rest.is_empty() {
            return Err(ParseFailure::new(
                self.pos,
                format!("missing {field} field"),
            ));
        }
        let end = rest.find(' ').unwrap_or(rest.len());
        let token = &rest[..end];
        self.pos += end;
        Ok(token)
    }

    /// `[...]`로 감싼 토큰의 내부를 잘라냅니다.
    fn bracketed_token(&mut self, field: &str) -> Result<&'a str, ParseFailure> {
        self.skip_spaces();
        let rest = self.remaining();
        if !rest.starts_with('[') {
            return Err(ParseFailure::new(
                self.pos,
                format!("expected '[' opening {field} field"),
            ));
        }
        let close = rest.find(']').ok_or_else(|| {
            ParseFailure::new(self.pos, format!("unterminated {field} field"))
        })?;
        let token = &rest[1..close];
        self.pos += close + 1;
        Ok(token)
    }

    /// `"..."`로 감싼 토큰의 내부, 또는 리터럴 `-`를 잘라냅니다.
    ///
    /// 따옴표 안의 공백은 토큰의 일부입니다. 내부 따옴표 이스케이프는
    /// 문법에 없습니다.
    fn quoted_or_dash(&mut self, field: &str) -> Result<&'a str, ParseFailure> {
        self.skip_spaces();
        let rest = self.remaining();
        if rest.starts_with('-') && (rest.len() == 1 || rest.as_bytes()[1] == b' ') {
            self.pos += 1;
            return Ok("-");
        }
        if !rest.starts_with('"') {
            return Err(ParseFailure::new(
                self.pos,
                format!("expected quoted value or '-' for {field} field"),
            ));
        }
        let inner = &rest[1..];
        let close = inner.find('"').ok_or_else(|| {
            ParseFailure::new(self.pos, format!("unterminated quoted {field} field"))
        })?;
        if close == 0 {
            return Err(ParseFailure::new(
                self.pos,
                format!("empty quoted {field} field"),
            ));
        }
        let token = &inner[..close];
        self.pos += close + 2;
        Ok(token)
    }

    /// 십진수 숫자 또는 `-`만 허용하는 토큰을 잘라냅니다.
    fn numeric_or_dash(&mut self, field: &str) -> Result<NumericField, ParseFailure> {
        self.skip_spaces();
        let column = self.pos;
        let token = self.plain_token(field)?;
        if token != "-" && !token.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseFailure::new(
                column,
                format!("{field} field must be digits or '-', got '{token}'"),
            ));
        }
        Ok(NumericField::new(token))
    }

    /// 라인의 나머지 전체를 잘라냅니다. 비어 있으면 실패합니다.
    fn rest(&mut self, field: &str) -> Result<&'a str, ParseFailure> {
        self.skip_spaces();
        let rest = self.remaining().trim_end();
        if rest.is_empty() {
            return Err(ParseFailure::new(
                self.pos,
                format!("missing {field} field"),
            ));
        }
        self.pos = self.input.len();
        Ok(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const SAMPLE_LINE: &str = "79a59df900b949e55d96a1e698fbaced mybucket \
        [06/Feb/2019:00:00:38 +0000] 192.0.2.3 \
        arn:aws:iam::123456789012:user/bob 3E57427F3EXAMPLE REST.GET.OBJECT \
        photos/2019/cat.jpg \"GET /mybucket/photos/2019/cat.jpg HTTP/1.1\" \
        200 - 2662992 3462992 70 10 \"-\" \"S3Console/0.4\" -";

    #[test]
    fn parse_full_line() {
        let parser = AccessLogParser::new();
        let record = parser.parse_line(SAMPLE_LINE).unwrap();

        assert_eq!(record.bucket_owner, "79a59df900b949e55d96a1e698fbaced");
        assert_eq!(record.bucket, "mybucket");
        assert_eq!(record.remote_ip, "192.0.2.3");
        assert_eq!(record.operation, "REST.GET.OBJECT");
        assert_eq!(record.key, "photos/2019/cat.jpg");
        assert_eq!(
            record.request_uri,
            "GET /mybucket/photos/2019/cat.jpg HTTP/1.1"
        );
        assert_eq!(record.http_status.as_u64(), Some(200));
        assert_eq!(record.error_code, "-");
        assert_eq!(record.bytes_sent.as_u64(), Some(2_662_992));
        assert_eq!(record.object_size.as_u64(), Some(3_462_992));
        assert_eq!(record.total_time_ms.as_u64(), Some(70));
        assert_eq!(record.turn_around_time_ms.as_u64(), Some(10));
        assert_eq!(record.referrer, "-");
        assert_eq!(record.user_agent, "S3Console/0.4");
        assert_eq!(record.version_id, "-");
    }

    #[test]
    fn parse_timestamp_fields() {
        let parser = AccessLogParser::new();
        let record = parser.parse_line(SAMPLE_LINE).unwrap();
        assert_eq!(record.timestamp.year(), 2019);
        assert_eq!(record.timestamp.month(), 2);
        assert_eq!(record.timestamp.day(), 6);
        assert_eq!(record.timestamp.hour(), 0);
        assert_eq!(record.timestamp.second(), 38);
    }

    #[test]
    fn parse_is_deterministic() {
        let parser = AccessLogParser::new();
        let first = parser.parse_line(SAMPLE_LINE).unwrap();
        let second = parser.parse_line(SAMPLE_LINE).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn absent_numeric_fields_stay_absent() {
        let line = "owner bucket [06/Feb/2019:00:00:38 +0000] 10.0.0.1 - REQID \
            REST.HEAD.OBJECT key - 304 - - - - - - \"agent\" vid";
        let parser = AccessLogParser::new();
        let record = parser.parse_line(line).unwrap();
        assert_eq!(record.bytes_sent.as_u64(), None);
        assert_eq!(record.object_size.as_u64(), None);
        assert_eq!(record.total_time_ms.as_u64(), None);
        assert_eq!(record.turn_around_time_ms.as_u64(), None);
        assert_eq!(record.request_uri, "-");
        assert_eq!(record.referrer, "-");
    }

    #[test]
    fn dash_http_status_is_absent() {
        let line = "owner bucket [06/Feb/2019:00:00:38 +0000] 10.0.0.1 - REQID \
            REST.COPY.OBJECT_GET key - - - - - - - - \"agent\" vid";
        let parser = AccessLogParser::new();
        let record = parser.parse_line(line).unwrap();
        assert_eq!(record.http_status.as_u64(), None);
        assert_eq!(record.status_class(), None);
    }

    #[test]
    fn empty_line_fails() {
        let parser = AccessLogParser::new();
        assert!(parser.parse_line("").is_err());
    }

    #[test]
    fn truncated_line_fails() {
        let parser = AccessLogParser::new();
        let result = parser.parse_line("owner bucket [06/Feb/2019:00:00:38 +0000] 10.0.0.1");
        assert!(result.is_err());
    }

    #[test]
    fn missing_bracket_fails() {
        let line = "owner bucket 06/Feb/2019:00:00:38 +0000 10.0.0.1 - REQID \
            OP key - 200 - - - - - - \"agent\" vid";
        let parser = AccessLogParser::new();
        let err = parser.parse_line(line).unwrap_err();
        assert!(err.reason.contains("timestamp"));
    }

    #[test]
    fn unterminated_bracket_fails() {
        let line = "owner bucket [06/Feb/2019:00:00:38 +0000 10.0.0.1 - REQID \
            OP key - 200 - - - - - - \"agent\" vid";
        let parser = AccessLogParser::new();
        assert!(parser.parse_line(line).is_err());
    }

    #[test]
    fn invalid_timestamp_format_fails() {
        let line = "owner bucket [2019-02-06T00:00:38Z] 10.0.0.1 - REQID \
            OP key - 200 - - - - - - \"agent\" vid";
        let parser = AccessLogParser::new();
        let err = parser.parse_line(line).unwrap_err();
        assert!(err.reason.contains("timestamp"));
    }

    #[test]
    fn non_utc_offset_fails() {
        // 문법상 오프셋은 리터럴 +0000뿐
        let line = "owner bucket [06/Feb/2019:00:00:38 +0900] 10.0.0.1 - REQID \
            OP key - 200 - - - - - - \"agent\" vid";
        let parser = AccessLogParser::new();
        assert!(parser.parse_line(line).is_err());
    }

    #[test]
    fn non_numeric_status_fails() {
        let line = "owner bucket [06/Feb/2019:00:00:38 +0000] 10.0.0.1 - REQID \
            OP key - OK - - - - - - \"agent\" vid";
        let parser = AccessLogParser::new();
        let err = parser.parse_line(line).unwrap_err();
        assert!(err.reason.contains("http status"));
    }

    #[test]
    fn non_numeric_bytes_sent_fails() {
        let line = "owner bucket [06/Feb/2019:00:00:38 +0000] 10.0.0.1 - REQID \
            OP key - 200 - 12x3 - - - - \"agent\" vid";
        let parser = AccessLogParser::new();
        assert!(parser.parse_line(line).is_err());
    }

    #[test]
    fn unterminated_quote_fails() {
        let line = "owner bucket [06/Feb/2019:00:00:38 +0000] 10.0.0.1 - REQID \
            OP key \"GET /key HTTP/1.1 200 - - - - - - \"agent\" vid";
        let parser = AccessLogParser::new();
        assert!(parser.parse_line(line).is_err());
    }

    #[test]
    fn quoted_field_keeps_internal_whitespace() {
        let line = "owner bucket [06/Feb/2019:00:00:38 +0000] 10.0.0.1 - REQID \
            OP key - 200 - - - - - - \"Mozilla/5.0 (Windows NT 10.0; Win64)\" vid";
        let parser = AccessLogParser::new();
        let record = parser.parse_line(line).unwrap();
        assert_eq!(record.user_agent, "Mozilla/5.0 (Windows NT 10.0; Win64)");
    }

    #[test]
    fn missing_version_id_fails() {
        let line = "owner bucket [06/Feb/2019:00:00:38 +0000] 10.0.0.1 - REQID \
            OP key - 200 - - - - - - \"agent\"";
        let parser = AccessLogParser::new();
        let err = parser.parse_line(line).unwrap_err();
        assert!(err.reason.contains("version id"));
    }

    #[test]
    fn version_id_consumes_remainder() {
        let line = "owner bucket [06/Feb/2019:00:00:38 +0000] 10.0.0.1 - REQID \
            OP key - 200 - - - - - - \"agent\" 3HL4kqtJvjVBH40Nrjfkd trailing fields here";
        let parser = AccessLogParser::new();
        let record = parser.parse_line(line).unwrap();
        assert_eq!(record.version_id, "3HL4kqtJvjVBH40Nrjfkd trailing fields here");
    }

    #[test]
    fn too_long_line_fails() {
        let parser = AccessLogParser::new().with_max_line_len(32);
        assert!(parser.parse_line(SAMPLE_LINE).is_err());
    }

    #[test]
    fn failure_reports_column() {
        let parser = AccessLogParser::new();
        let err = parser
            .parse_line("owner bucket bad-rest-of-line")
            .unwrap_err();
        assert!(err.column > 0);
    }

    // Property-based tests using proptest
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_arbitrary_input_does_not_panic(line in ".{0,500}") {
                let parser = AccessLogParser::new();
                let _ = parser.parse_line(&line);
                // Should never panic
            }

            #[test]
            fn parse_generated_valid_lines(
                status in 100u64..600,
                bytes in prop::option::of(0u64..10_000_000),
                total_time in prop::option::of(0u64..60_000),
            ) {
                let fmt_num = |v: Option<u64>| match v {
                    Some(n) => n.to_string(),
                    None => "-".to_owned(),
                };
                let line = format!(
                    "owner bucket [06/Feb/2019:12:34:56 +0000] 10.0.0.1 - REQID \
                     REST.GET.OBJECT key \"GET /key HTTP/1.1\" {} - {} - {} - \"-\" \"agent\" vid",
                    status,
                    fmt_num(bytes),
                    fmt_num(total_time),
                );
                let parser = AccessLogParser::new();
                let record = parser.parse_line(&line).unwrap();
                prop_assert_eq!(record.http_status.as_u64(), Some(status));
                prop_assert_eq!(record.bytes_sent.as_u64(), bytes);
                prop_assert_eq!(record.total_time_ms.as_u64(), total_time);
            }
        }
    }
}
