//! 메트릭 규칙 및 규칙 엔진
//!
//! 규칙은 평범한 데이터 값입니다: 이름 접두어, 레코드에 대한 순수
//! 술어(matchable 표현), 활성화된 측정 종류 집합. 규칙 집합은 시작
//! 시점에 정적으로 구성되며 이후 변경되지 않습니다.
//!
//! 규칙들은 서로 독립적입니다. 하나의 레코드가 0개, 1개, 또는 여러
//! 규칙에 동시에 매칭될 수 있습니다 (`AllRequests`는 모든 레코드에,
//! `RestGetObject_HTTP_2XX`는 좁은 부분집합에 매칭).

use chrono::{DateTime, Utc};

use bucketstat_core::types::{LogRecord, Unit};

use crate::config::PipelineConfig;
use crate::error::MeteringError;

/// 측정 종류
///
/// 로그 레코드에서 유도되는 네 가지 수치입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementKind {
    /// 요청 횟수 (상수 1)
    RequestCount,
    /// 전체 요청 시간 (ms)
    TotalRequestTime,
    /// 턴어라운드 시간 (ms)
    TurnAroundTime,
    /// 오브젝트 크기 (바이트)
    ObjectSize,
}

impl MeasurementKind {
    /// 모든 측정 종류 (메트릭 이름 조합 순서 고정)
    pub const ALL: [Self; 4] = [
        Self::RequestCount,
        Self::TotalRequestTime,
        Self::TurnAroundTime,
        Self::ObjectSize,
    ];

    /// 메트릭 이름 접미어
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::RequestCount => "RequestCount",
            Self::TotalRequestTime => "TotalRequestTime",
            Self::TurnAroundTime => "TurnAroundTime",
            Self::ObjectSize => "ObjectSize",
        }
    }

    /// 측정 단위
    pub fn unit(&self) -> Unit {
        match self {
            Self::RequestCount => Unit::Count,
            Self::TotalRequestTime | Self::TurnAroundTime => Unit::Milliseconds,
            Self::ObjectSize => Unit::Bytes,
        }
    }

    /// 레코드에서 측정값을 계산합니다.
    ///
    /// 값이 부재(`-`)이거나 숫자가 아닌 필드는 `None`을 반환하며,
    /// 해당 레코드는 이 측정에 기여하지 않습니다 (0이 아님).
    pub fn value_of(&self, record: &LogRecord) -> Option<f64> {
        match self {
            Self::RequestCount => Some(1.0),
            Self::TotalRequestTime => record.total_time_ms.as_u64().map(|v| v as f64),
            Self::TurnAroundTime => record.turn_around_time_ms.as_u64().map(|v| v as f64),
            Self::ObjectSize => record.object_size.as_u64().map(|v| v as f64),
        }
    }
}

/// 규칙 술어 — 레코드 분류 조건
///
/// 동적 디스패치 대신 매칭 가능한 표현으로 고정합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulePredicate {
    /// 모든 레코드에 매칭
    Always,
    /// 오퍼레이션 문자열 일치
    Operation(&'static str),
    /// 오퍼레이션 일치 + HTTP 상태 클래스 일치
    ///
    /// 상태가 부재(`-`)인 레코드에는 매칭되지 않습니다.
    OperationStatusClass {
        /// 오퍼레이션 문자열
        operation: &'static str,
        /// 상태 클래스 문자 (`'2'`, `'4'`, `'5'`)
        status_class: char,
    },
}

impl RulePredicate {
    /// 레코드가 술어를 만족하는지 평가합니다.
    pub fn matches(&self, record: &LogRecord) -> bool {
        match self {
            Self::Always => true,
            Self::Operation(op) => record.operation == *op,
            Self::OperationStatusClass {
                operation,
                status_class,
            } => {
                record.operation == *operation
                    && record.status_class() == Some(*status_class)
            }
        }
    }
}

/// 메트릭 규칙 — 접두어 + 술어 + 활성 측정 종류
///
/// 생성 후 불변입니다.
#[derive(Debug, Clone)]
pub struct MetricRule {
    /// 메트릭 이름 접두어
    prefix: &'static str,
    /// 분류 술어
    predicate: RulePredicate,
    /// 활성화된 측정 종류
    enabled_kinds: Vec<MeasurementKind>,
}

impl MetricRule {
    /// 규칙 접두어를 반환합니다.
    pub fn prefix(&self) -> &str {
        self.prefix
    }

    /// 활성화된 측정 종류 수를 반환합니다.
    pub fn enabled_kind_count(&self) -> usize {
        self.enabled_kinds.len()
    }

    /// 측정 종류에 대한 합성 메트릭 이름을 반환합니다.
    fn metric_name(&self, kind: MeasurementKind) -> String {
        format!("{}_{}", self.prefix, kind.suffix())
    }
}

/// 규칙 평가로 산출된 측정값 하나
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// 합성 메트릭 이름 (접두어 + `_` + 종류)
    pub metric_name: String,
    /// 레코드의 버킷 타임스탬프
    pub bucket: DateTime<Utc>,
    /// 단위
    pub unit: Unit,
    /// 측정값
    pub value: f64,
}

/// 기본 규칙 테이블 — (접두어, 술어) 쌍
///
/// 활성 측정 종류는 설정의 `[metrics.enabled]` 테이블이 결정합니다.
const DEFAULT_RULES: &[(&str, RulePredicate)] = &[
    ("AllRequests", RulePredicate::Always),
    ("RestGetObject", RulePredicate::Operation("REST.GET.OBJECT")),
    ("RestPutObject", RulePredicate::Operation("REST.PUT.OBJECT")),
    (
        "RestHeadObject",
        RulePredicate::Operation("REST.HEAD.OBJECT"),
    ),
    (
        "BatchDeleteObject",
        RulePredicate::Operation("BATCH.DELETE.OBJECT"),
    ),
    (
        "RestPostMultiObjectDelete",
        RulePredicate::Operation("REST.POST.MULTI_OBJECT_DELETE"),
    ),
    (
        "RestGetObject_HTTP_2XX",
        RulePredicate::OperationStatusClass {
            operation: "REST.GET.OBJECT",
            status_class: '2',
        },
    ),
    (
        "RestGetObject_HTTP_4XX",
        RulePredicate::OperationStatusClass {
            operation: "REST.GET.OBJECT",
            status_class: '4',
        },
    ),
    (
        "RestGetObject_HTTP_5XX",
        RulePredicate::OperationStatusClass {
            operation: "REST.GET.OBJECT",
            status_class: '5',
        },
    ),
    (
        "RestPutObject_HTTP_2XX",
        RulePredicate::OperationStatusClass {
            operation: "REST.PUT.OBJECT",
            status_class: '2',
        },
    ),
    (
        "RestPutObject_HTTP_4XX",
        RulePredicate::OperationStatusClass {
            operation: "REST.PUT.OBJECT",
            status_class: '4',
        },
    ),
    (
        "RestPutObject_HTTP_5XX",
        RulePredicate::OperationStatusClass {
            operation: "REST.PUT.OBJECT",
            status_class: '5',
        },
    ),
];

/// 규칙 엔진 — 모든 규칙을 모든 레코드에 평가합니다.
pub struct RuleEngine {
    /// 규칙 목록 (순서 고정)
    rules: Vec<MetricRule>,
}

impl RuleEngine {
    /// 설정의 활성화 테이블로 규칙 엔진을 구성합니다.
    ///
    /// 기본 규칙 테이블의 각 (접두어, 측정 종류) 조합 중 설정에서
    /// 활성화된 것만 평가 대상이 됩니다. 활성화 테이블의 키가 알 수
    /// 없는 접두어/종류 조합을 가리키면 설정 에러입니다.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, MeteringError> {
        // 활성화 키가 실제 조합을 가리키는지 검증
        for key in config.enabled.keys() {
            let known = DEFAULT_RULES.iter().any(|(prefix, _)| {
                MeasurementKind::ALL
                    .iter()
                    .any(|kind| format!("{}_{}", prefix, kind.suffix()) == *key)
            });
            if !known {
                return Err(MeteringError::Config {
                    field: format!("metrics.enabled.{key}"),
                    reason: "key does not name a known rule/measurement combination"
                        .to_owned(),
                });
            }
        }

        let rules = DEFAULT_RULES
            .iter()
            .map(|&(prefix, ref predicate)| MetricRule {
                prefix,
                predicate: predicate.clone(),
                enabled_kinds: MeasurementKind::ALL
                    .into_iter()
                    .filter(|kind| config.is_enabled(prefix, kind.suffix()))
                    .collect(),
            })
            .collect();

        Ok(Self { rules })
    }

    /// 규칙 수를 반환합니다.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// 활성화된 (규칙 × 측정 종류) 조합 수를 반환합니다.
    pub fn enabled_combination_count(&self) -> usize {
        self.rules.iter().map(MetricRule::enabled_kind_count).sum()
    }

    /// 레코드에 대해 모든 규칙을 평가하고 측정값을 산출합니다.
    ///
    /// `bucket`은 레코드의 버킷 타임스탬프입니다 (레코드당 한 번 계산).
    pub fn evaluate(&self, record: &LogRecord, bucket: DateTime<Utc>) -> Vec<Measurement> {
        let mut measurements = Vec::new();

        for rule in &self.rules {
            if !rule.predicate.matches(record) {
                continue;
            }
            for kind in &rule.enabled_kinds {
                if let Some(value) = kind.value_of(record) {
                    measurements.push(Measurement {
                        metric_name: rule.metric_name(*kind),
                        bucket,
                        unit: kind.unit(),
                        value,
                    });
                }
            }
        }

        measurements
    }
}
