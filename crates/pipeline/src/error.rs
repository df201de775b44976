//! 파이프라인 에러 타입
//!
//! [`MeteringError`]는 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<MeteringError> for BucketstatError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use bucketstat_core::error::{BucketstatError, EmitError, ParseError};

/// 파이프라인 도메인 에러
///
/// 라인 파싱, 설정, 배치 전송 등 파이프라인 내부의 에러 상황을 포괄합니다.
#[derive(Debug, thiserror::Error)]
pub enum MeteringError {
    /// 액세스 로그 문법에 맞지 않는 라인
    ///
    /// `line_no`는 로그 객체 내 1부터 시작하는 라인 번호입니다.
    #[error("malformed log line {line_no} at column {column}: {reason}")]
    MalformedLine {
        /// 라인 번호 (1부터)
        line_no: usize,
        /// 실패 위치 (라인 내 바이트 오프셋)
        column: usize,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 싱크 배치 전송 실패
    #[error("emit failed for batch {batch_index}: {reason}")]
    EmitFailed {
        /// 실패한 배치 인덱스 (0부터)
        batch_index: usize,
        /// 실패 사유
        reason: String,
    },
}

impl From<MeteringError> for BucketstatError {
    fn from(err: MeteringError) -> Self {
        match err {
            MeteringError::MalformedLine {
                line_no, ref reason, ..
            } => BucketstatError::Parse(ParseError::MalformedLine {
                line_no,
                reason: reason.clone(),
            }),
            MeteringError::Config { field, reason } => {
                BucketstatError::Config(bucketstat_core::error::ConfigError::InvalidValue {
                    field,
                    reason,
                })
            }
            MeteringError::EmitFailed {
                batch_index,
                reason,
            } => BucketstatError::Emit(EmitError::Rejected {
                batch_index,
                reason,
            }),
        }
    }
}
