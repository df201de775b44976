//! 파이프라인 설정
//!
//! [`PipelineConfig`]는 core의 [`BucketstatConfig`](bucketstat_core::config::BucketstatConfig)에서
//! 파생되며, 파이프라인 내부에서 사용하는 형태로 정규화된 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use bucketstat_core::config::BucketstatConfig;
//! use bucketstat_pipeline::config::PipelineConfig;
//!
//! let core_config = BucketstatConfig::default();
//! let config = PipelineConfig::from_core(&core_config)?;
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::MeteringError;

/// 문법에 맞지 않는 라인 처리 정책
///
/// 기준 동작은 `Fail`입니다. `Skip`은 해당 라인을 경고 로그와 함께
/// 건너뛰고 실행 리포트에 집계합니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedLinePolicy {
    /// 첫 실패 라인에서 전체 실행을 중단 (기본값)
    #[default]
    Fail,
    /// 실패 라인을 건너뛰고 카운트
    Skip,
}

impl MalformedLinePolicy {
    /// 설정 문자열에서 정책을 파싱합니다.
    pub fn parse(s: &str) -> Result<Self, MeteringError> {
        match s {
            "fail" => Ok(Self::Fail),
            "skip" => Ok(Self::Skip),
            other => Err(MeteringError::Config {
                field: "metrics.malformed_line_policy".to_owned(),
                reason: format!("expected 'fail' or 'skip', got '{other}'"),
            }),
        }
    }
}

/// 파이프라인 설정
///
/// core 설정에서 파생되며, 파이프라인 실행에 필요한 값만 담습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 메인 메트릭 네임스페이스
    pub namespace: String,
    /// 타임스탬프 버킷 간격 (초)
    pub bucket_interval_secs: u32,
    /// 로그 객체 출처를 식별하는 차원 이름
    pub source_dimension: String,
    /// 문법 위반 라인 처리 정책
    pub malformed_line_policy: MalformedLinePolicy,
    /// 최대 허용 라인 길이 (바이트) — 초과하는 라인은 문법 위반으로 처리
    pub max_line_len: usize,
    /// 규칙 접두어 × 측정 종류 활성화 테이블 (없는 항목 = 비활성)
    pub enabled: BTreeMap<String, bool>,
    /// 자가 메트릭 전송 여부
    pub self_metrics_enabled: bool,
    /// 자가 메트릭 네임스페이스
    pub self_metrics_namespace: String,
    /// 인스턴스 차원 이름
    pub instance_dimension: String,
    /// 인스턴스 차원 값
    pub instance: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            namespace: "s3-access-logs".to_owned(),
            bucket_interval_secs: 60,
            source_dimension: "BucketName".to_owned(),
            malformed_line_policy: MalformedLinePolicy::Fail,
            max_line_len: 16 * 1024,
            enabled: BTreeMap::new(),
            self_metrics_enabled: true,
            self_metrics_namespace: "bucketstat/operations".to_owned(),
            instance_dimension: "Instance".to_owned(),
            instance: "bucketstat".to_owned(),
        }
    }
}

impl PipelineConfig {
    /// core 설정에서 파이프라인 설정을 생성합니다.
    pub fn from_core(
        core: &bucketstat_core::config::BucketstatConfig,
    ) -> Result<Self, MeteringError> {
        if core.metrics.bucket_interval_secs == 0 {
            return Err(MeteringError::Config {
                field: "metrics.bucket_interval_secs".to_owned(),
                reason: "interval must be greater than 0".to_owned(),
            });
        }

        Ok(Self {
            namespace: core.metrics.namespace.clone(),
            bucket_interval_secs: core.metrics.bucket_interval_secs,
            source_dimension: core.metrics.source_dimension.clone(),
            malformed_line_policy: MalformedLinePolicy::parse(
                &core.metrics.malformed_line_policy,
            )?,
            max_line_len: core.metrics.max_line_len,
            enabled: core.metrics.enabled.clone(),
            self_metrics_enabled: core.self_metrics.enabled,
            self_metrics_namespace: core.self_metrics.namespace.clone(),
            instance_dimension: core.self_metrics.instance_dimension.clone(),
            instance: core.self_metrics.instance.clone(),
        })
    }

    /// 해당 접두어 × 측정 종류 조합이 활성화되어 있는지 확인합니다.
    ///
    /// 테이블에 항목이 없으면 비활성입니다.
    pub fn is_enabled(&self, prefix: &str, suffix: &str) -> bool {
        self.enabled
            .get(&format!("{prefix}_{suffix}"))
            .copied()
            .unwrap_or(false)
    }
}
