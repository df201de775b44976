//! 설정 관리 — bucketstat.toml 파싱 및 런타임 설정
//!
//! [`BucketstatConfig`]는 파이프라인 전체의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`BUCKETSTAT_METRICS_NAMESPACE=...` 형식)
//! 3. 설정 파일 (`bucketstat.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), bucketstat_core::error::BucketstatError> {
//! use bucketstat_core::config::BucketstatConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = BucketstatConfig::load("bucketstat.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = BucketstatConfig::parse("[metrics]\nnamespace = \"s3/access\"")?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{BucketstatError, ConfigError};

/// 측정 종류 접미어 — `[metrics.enabled]` 키 검증에 사용
const MEASUREMENT_SUFFIXES: &[&str] = &[
    "RequestCount",
    "TotalRequestTime",
    "TurnAroundTime",
    "ObjectSize",
];

/// bucketstat 통합 설정
///
/// `bucketstat.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BucketstatConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 메트릭 집계/전송 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// 운영 자가 메트릭 설정
    #[serde(default)]
    pub self_metrics: SelfMetricsConfig,
}

impl BucketstatConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, BucketstatError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, BucketstatError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BucketstatError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                BucketstatError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, BucketstatError> {
        toml::from_str(toml_str).map_err(|e| {
            BucketstatError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `BUCKETSTAT_{SECTION}_{FIELD}`
    /// 예: `BUCKETSTAT_METRICS_NAMESPACE=s3/access`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "BUCKETSTAT_GENERAL_LOG_LEVEL");
        override_string(
            &mut self.general.log_format,
            "BUCKETSTAT_GENERAL_LOG_FORMAT",
        );

        // Metrics
        override_string(&mut self.metrics.namespace, "BUCKETSTAT_METRICS_NAMESPACE");
        override_u32(
            &mut self.metrics.bucket_interval_secs,
            "BUCKETSTAT_METRICS_BUCKET_INTERVAL_SECS",
        );
        override_string(
            &mut self.metrics.source_dimension,
            "BUCKETSTAT_METRICS_SOURCE_DIMENSION",
        );
        override_string(
            &mut self.metrics.malformed_line_policy,
            "BUCKETSTAT_METRICS_MALFORMED_LINE_POLICY",
        );
        override_usize(
            &mut self.metrics.max_line_len,
            "BUCKETSTAT_METRICS_MAX_LINE_LEN",
        );

        // Self metrics
        override_bool(
            &mut self.self_metrics.enabled,
            "BUCKETSTAT_SELF_METRICS_ENABLED",
        );
        override_string(
            &mut self.self_metrics.namespace,
            "BUCKETSTAT_SELF_METRICS_NAMESPACE",
        );
        override_string(
            &mut self.self_metrics.instance_dimension,
            "BUCKETSTAT_SELF_METRICS_INSTANCE_DIMENSION",
        );
        override_string(
            &mut self.self_metrics.instance,
            "BUCKETSTAT_SELF_METRICS_INSTANCE",
        );
    }

    /// 설정 값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), BucketstatError> {
        if self.metrics.namespace.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "metrics.namespace".to_owned(),
                reason: "namespace must not be empty".to_owned(),
            }
            .into());
        }

        if self.metrics.bucket_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "metrics.bucket_interval_secs".to_owned(),
                reason: "interval must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.metrics.max_line_len == 0 {
            return Err(ConfigError::InvalidValue {
                field: "metrics.max_line_len".to_owned(),
                reason: "max line length must be greater than 0".to_owned(),
            }
            .into());
        }

        match self.metrics.malformed_line_policy.as_str() {
            "fail" | "skip" => {}
            other => {
                return Err(ConfigError::InvalidValue {
                    field: "metrics.malformed_line_policy".to_owned(),
                    reason: format!("expected 'fail' or 'skip', got '{other}'"),
                }
                .into());
            }
        }

        // enabled 테이블 키는 "<Prefix>_<Kind>" 형식이어야 함
        // (Prefix 자체의 검증은 규칙 테이블을 아는 파이프라인 크레이트의 몫)
        for key in self.metrics.enabled.keys() {
            let known_suffix = MEASUREMENT_SUFFIXES
                .iter()
                .any(|suffix| key.ends_with(&format!("_{suffix}")));
            if !known_suffix {
                return Err(ConfigError::InvalidValue {
                    field: format!("metrics.enabled.{key}"),
                    reason: format!(
                        "key must end with one of: {}",
                        MEASUREMENT_SUFFIXES.join(", ")
                    ),
                }
                .into());
            }
        }

        if self.self_metrics.enabled && self.self_metrics.namespace.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "self_metrics.namespace".to_owned(),
                reason: "namespace must not be empty when self metrics are enabled".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 포맷 (text, json)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "text".to_owned(),
        }
    }
}

/// 메트릭 집계/전송 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// 싱크 네임스페이스
    pub namespace: String,
    /// 타임스탬프 버킷 간격 (초)
    pub bucket_interval_secs: u32,
    /// 로그 객체 출처를 식별하는 차원 이름
    pub source_dimension: String,
    /// 문법에 맞지 않는 라인 처리 정책 ("fail" 또는 "skip")
    pub malformed_line_policy: String,
    /// 최대 허용 라인 길이 (바이트) — 초과하는 라인은 문법 위반으로 처리
    #[serde(default = "default_max_line_len")]
    pub max_line_len: usize,
    /// 규칙 접두어 × 측정 종류 활성화 테이블
    ///
    /// 키 형식: `"<Prefix>_<Kind>"` (예: `"AllRequests_RequestCount"`).
    /// 항목이 없는 조합은 비활성으로 취급됩니다.
    #[serde(default)]
    pub enabled: BTreeMap<String, bool>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: "s3-access-logs".to_owned(),
            bucket_interval_secs: 60,
            source_dimension: "BucketName".to_owned(),
            malformed_line_policy: "fail".to_owned(),
            max_line_len: default_max_line_len(),
            enabled: BTreeMap::new(),
        }
    }
}

/// 최대 라인 길이 기본값 (바이트)
fn default_max_line_len() -> usize {
    16 * 1024
}

/// 운영 자가 메트릭 설정
///
/// 메인 배치 전송이 끝난 뒤, 전송 호출 횟수를 별도 네임스페이스로
/// 보고하는 자가 메트릭의 설정입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfMetricsConfig {
    /// 자가 메트릭 전송 여부
    pub enabled: bool,
    /// 자가 메트릭 네임스페이스
    pub namespace: String,
    /// 파이프라인 인스턴스를 식별하는 차원 이름
    pub instance_dimension: String,
    /// 인스턴스 차원 값
    pub instance: String,
}

impl Default for SelfMetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            namespace: "bucketstat/operations".to_owned(),
            instance_dimension: "Instance".to_owned(),
            instance: "bucketstat".to_owned(),
        }
    }
}

/// 환경변수 값으로 문자열 필드를 오버라이드합니다.
fn override_string(field: &mut String, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        *field = value;
    }
}

/// 환경변수 값으로 bool 필드를 오버라이드합니다.
fn override_bool(field: &mut bool, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.parse() {
            Ok(parsed) => *field = parsed,
            Err(_) => warn!(env = env_key, value, "ignoring non-boolean env override"),
        }
    }
}

/// 환경변수 값으로 u32 필드를 오버라이드합니다.
fn override_u32(field: &mut u32, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.parse() {
            Ok(parsed) => *field = parsed,
            Err(_) => warn!(env = env_key, value, "ignoring non-numeric env override"),
        }
    }
}

/// 환경변수 값으로 usize 필드를 오버라이드합니다.
fn override_usize(field: &mut usize, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.parse() {
            Ok(parsed) => *field = parsed,
            Err(_) => warn!(env = env_key, value, "ignoring non-numeric env override"),
        }
    }
}
