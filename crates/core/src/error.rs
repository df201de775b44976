//! 에러 타입 — 도메인별 에러 정의

/// bucketstat 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum BucketstatError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 로그 라인 파싱 에러
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// 로그 객체 조회 에러 (외부 협력자 경계)
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// 메트릭 전송 에러
    #[error("emit error: {0}")]
    Emit(#[from] EmitError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 로그 라인 파싱 에러
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// 액세스 로그 문법에 맞지 않는 라인
    #[error("malformed log line {line_no}: {reason}")]
    MalformedLine { line_no: usize, reason: String },

    /// 타임스탬프 형식 오류
    #[error("invalid timestamp '{token}': {reason}")]
    InvalidTimestamp { token: String, reason: String },
}

/// 로그 객체 조회 에러
///
/// 조회 실패는 그대로 전파되며, 파이프라인은 아무것도 전송하지 않고 중단합니다.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// 로그 객체를 가져올 수 없음
    #[error("log object unavailable: {key}: {reason}")]
    Unavailable { key: String, reason: String },
}

/// 메트릭 전송 에러
///
/// 재시도/백오프는 싱크 구현체(클라이언트 라이브러리)의 책임입니다.
/// 이미 수락된 배치는 수락된 상태로 유지됩니다.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// 싱크가 배치를 거부함
    #[error("sink rejected batch {batch_index}: {reason}")]
    Rejected { batch_index: usize, reason: String },

    /// 싱크에 도달할 수 없음
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}
