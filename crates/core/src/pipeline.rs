//! 파이프라인 trait — 외부 협력자 확장 포인트 정의
//!
//! 파이프라인 코어는 I/O를 직접 수행하지 않습니다. 로그 객체 조회와
//! 메트릭 전송은 이 trait들의 구현체가 담당합니다.

use bytes::Bytes;

use crate::error::BucketstatError;
use crate::types::MetricDatum;

/// 로그 객체 소스 trait
///
/// 원시 로그 객체(바이트 스트림)를 조회합니다. 조회 실패는
/// [`SourceError`](crate::error::SourceError)로 그대로 전파되며,
/// 이 경우 파이프라인은 아무것도 전송하지 않고 중단합니다.
pub trait LogSource: Send + Sync {
    /// 소스 이름 (로깅용)
    fn name(&self) -> &str;

    /// 키에 해당하는 로그 객체 전체를 조회
    async fn fetch(&self, key: &str) -> Result<Bytes, BucketstatError>;
}

/// 메트릭 싱크 trait
///
/// 집계 완료된 데이텀 배치를 모니터링 백엔드로 전송합니다.
/// 일시 장애에 대한 재시도/백오프는 구현체(클라이언트 라이브러리)의
/// 책임이며, 파이프라인은 이미 수락된 배치를 되돌리지 않습니다.
pub trait MetricsSink: Send + Sync {
    /// 싱크 이름 (로깅용)
    fn name(&self) -> &str;

    /// 데이텀 배치 하나를 네임스페이스 아래로 전송
    async fn emit(&self, namespace: &str, batch: &[MetricDatum]) -> Result<(), BucketstatError>;
}
