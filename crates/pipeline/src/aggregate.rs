//! 메트릭 집계기
//!
//! (메트릭 이름, 버킷 타임스탬프) 키로 측정값을 통계 집합에 병합합니다.
//! 원시 측정값을 개별적으로 보관하지 않으므로 메모리 사용량은 라인 수가
//! 아니라 고유 키 수에 비례합니다.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use bucketstat_core::types::{StatisticSet, Unit};

use crate::rule::Measurement;

/// 집계 키 — 메트릭 이름과 버킷 타임스탬프의 쌍
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AggregationKey {
    /// 합성 메트릭 이름
    pub metric_name: String,
    /// 버킷 타임스탬프
    pub bucket: DateTime<Utc>,
}

/// 배출된 집계 항목 하나
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedMetric {
    /// 합성 메트릭 이름
    pub metric_name: String,
    /// 버킷 타임스탬프
    pub bucket: DateTime<Utc>,
    /// 단위
    pub unit: Unit,
    /// 병합된 통계 집합
    pub statistics: StatisticSet,
}

/// 측정값을 키별 통계 집합으로 병합하는 집계기
///
/// 병합은 순서 독립적입니다: 같은 측정값 집합이면 관측 순서와 무관하게
/// 같은 집계 결과가 나옵니다.
#[derive(Debug, Default)]
pub struct MetricAggregator {
    /// 키 → (단위, 통계). BTreeMap이라 배출 순서가 결정적입니다.
    entries: BTreeMap<AggregationKey, (Unit, StatisticSet)>,
}

impl MetricAggregator {
    /// 빈 집계기를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 측정값 하나를 집계에 반영합니다.
    ///
    /// 키가 이미 있으면 기존 통계에 병합하고, 없으면 새 항목을 만듭니다.
    pub fn observe(&mut self, measurement: &Measurement) {
        let key = AggregationKey {
            metric_name: measurement.metric_name.clone(),
            bucket: measurement.bucket,
        };
        match self.entries.get_mut(&key) {
            Some((_, statistics)) => statistics.merge(measurement.value),
            None => {
                self.entries
                    .insert(key, (measurement.unit, StatisticSet::of(measurement.value)));
            }
        }
    }

    /// 모든 집계 항목을 배출하고 내부 상태를 비웁니다.
    ///
    /// 배출 순서는 키 순서로 결정적입니다. 같은 실행에서 두 번째 호출은
    /// 빈 목록을 반환합니다.
    pub fn drain(&mut self) -> Vec<AggregatedMetric> {
        std::mem::take(&mut self.entries)
            .into_iter()
            .map(|(key, (unit, statistics))| AggregatedMetric {
                metric_name: key.metric_name,
                bucket: key.bucket,
                unit,
                statistics,
            })
            .collect()
    }

    /// 고유 집계 키 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 집계 항목이 없으면 `true`입니다.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
