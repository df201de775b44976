//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 파싱된 액세스 로그 레코드와 집계 결과 메트릭 데이텀을 정의합니다.
//! 파이프라인과 싱크 구현체는 이 타입들로 데이터를 교환합니다.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 숫자-또는-부재(`-`) 필드
///
/// 액세스 로그의 숫자 필드는 값이 없을 때 센티널 `-`로 기록됩니다.
/// 원시 토큰을 그대로 보관하고, 숫자 변환은 십진수 숫자로만 구성된
/// 토큰에 대해서만 수행합니다. `-`와 숫자가 아닌 토큰은 0이 아니라
/// "해당 없음"으로 취급됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NumericField(String);

impl NumericField {
    /// 원시 토큰에서 필드를 생성합니다.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// 부재 센티널(`-`) 필드를 생성합니다.
    pub fn absent() -> Self {
        Self("-".to_owned())
    }

    /// 원시 토큰을 반환합니다.
    pub fn token(&self) -> &str {
        &self.0
    }

    /// 토큰이 십진수 숫자로만 구성되어 있으면 값을 반환합니다.
    ///
    /// `-`, 빈 문자열, 숫자가 아닌 토큰은 `None`입니다.
    pub fn as_u64(&self) -> Option<u64> {
        if self.0.is_empty() || !self.0.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.0.parse().ok()
    }

    /// 값이 존재하는지(숫자로 변환 가능한지) 확인합니다.
    pub fn is_present(&self) -> bool {
        self.as_u64().is_some()
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 액세스 로그 레코드
///
/// 로그 라인 하나를 파싱한 불변 결과입니다. 필드 순서는
/// S3 서버 액세스 로그 형식의 문법 순서를 따릅니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// 버킷 소유자 (canonical user ID)
    pub bucket_owner: String,
    /// 버킷 이름
    pub bucket: String,
    /// 요청 시각 (UTC)
    pub timestamp: DateTime<Utc>,
    /// 원격 IP
    pub remote_ip: String,
    /// 요청자 (canonical user ID 또는 `-`)
    pub requester: String,
    /// 요청 ID
    pub request_id: String,
    /// 오퍼레이션 (예: `REST.GET.OBJECT`)
    pub operation: String,
    /// 오브젝트 키
    pub key: String,
    /// 요청 URI (따옴표 내부 원문, 부재 시 `-`)
    pub request_uri: String,
    /// HTTP 상태 코드 (숫자-또는-부재)
    pub http_status: NumericField,
    /// 에러 코드
    pub error_code: String,
    /// 전송 바이트 수 (숫자-또는-부재)
    pub bytes_sent: NumericField,
    /// 오브젝트 크기 (숫자-또는-부재)
    pub object_size: NumericField,
    /// 전체 요청 시간 (ms, 숫자-또는-부재)
    pub total_time_ms: NumericField,
    /// 턴어라운드 시간 (ms, 숫자-또는-부재)
    pub turn_around_time_ms: NumericField,
    /// Referrer (따옴표 내부 원문, 부재 시 `-`)
    pub referrer: String,
    /// User-Agent (따옴표 내부 원문, 부재 시 `-`)
    pub user_agent: String,
    /// 버전 ID (라인 나머지 전체)
    pub version_id: String,
}

impl LogRecord {
    /// HTTP 상태 코드의 클래스 문자를 반환합니다 (`2xx`의 `'2'` 등).
    ///
    /// 상태가 부재(`-`)이거나 숫자가 아니면 `None`입니다.
    pub fn status_class(&self) -> Option<char> {
        if !self.http_status.is_present() {
            return None;
        }
        self.http_status.token().chars().next()
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} {} status={}",
            self.timestamp.format("%Y-%m-%dT%H:%M:%S"),
            self.bucket,
            self.operation,
            self.key,
            self.http_status,
        )
    }
}

/// 메트릭 단위
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    /// 횟수
    Count,
    /// 밀리초
    Milliseconds,
    /// 바이트
    Bytes,
}

impl Unit {
    /// 싱크에 전달되는 단위 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "Count",
            Self::Milliseconds => "Milliseconds",
            Self::Bytes => "Bytes",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 메트릭 차원 (name/value 쌍, 순서 유지)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    /// 차원 이름 (예: `BucketName`)
    pub name: String,
    /// 차원 값
    pub value: String,
}

impl Dimension {
    /// 새 차원을 생성합니다.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// 누적 통계 — 하나의 (메트릭, 버킷) 키에 대한 실행 통계
///
/// 병합은 교환/결합 법칙을 만족하므로 도착 순서와 무관하게
/// 동일한 결과를 냅니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatisticSet {
    /// 샘플 수 (>= 1)
    pub sample_count: u64,
    /// 값 합계
    pub sum: f64,
    /// 최솟값
    pub minimum: f64,
    /// 최댓값
    pub maximum: f64,
}

impl StatisticSet {
    /// 첫 관측값으로 통계를 생성합니다.
    pub fn of(value: f64) -> Self {
        Self {
            sample_count: 1,
            sum: value,
            minimum: value,
            maximum: value,
        }
    }

    /// 관측값 하나를 병합합니다.
    pub fn merge(&mut self, value: f64) {
        self.sample_count += 1;
        self.sum += value;
        self.minimum = self.minimum.min(value);
        self.maximum = self.maximum.max(value);
    }
}

/// 집계 완료된 메트릭 데이텀
///
/// 싱크에 전달되는 최종 형태입니다. 타임스탬프는 초 단위 정밀도입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDatum {
    /// 메트릭 이름 (규칙 접두어 + `_` + 측정 종류)
    pub metric_name: String,
    /// 차원 목록 (순서 유지)
    pub dimensions: Vec<Dimension>,
    /// 버킷 타임스탬프 (UTC, 초 정밀도)
    pub timestamp: DateTime<Utc>,
    /// 단위
    pub unit: Unit,
    /// 누적 통계
    pub statistics: StatisticSet,
}

impl fmt::Display for MetricDatum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} n={} sum={} min={} max={} [{}]",
            self.metric_name,
            self.timestamp.format("%Y-%m-%dT%H:%M:%S"),
            self.statistics.sample_count,
            self.statistics.sum,
            self.statistics.minimum,
            self.statistics.maximum,
            self.unit,
        )
    }
}
