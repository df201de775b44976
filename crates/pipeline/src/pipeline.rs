//! 파이프라인 실행 오케스트레이터
//!
//! 원시 로그 객체 하나를 받아 라인 분리 → 파싱 → 버킷 계산 → 규칙 평가
//! → 집계 → 배치 전송까지 한 번의 실행으로 수행합니다. 메인 단계가 모두
//! 끝난 뒤 전송 호출 횟수를 자가 메트릭으로 별도 네임스페이스에
//! 전송합니다.

use bytes::Bytes;
use chrono::Utc;
use metrics::counter;
use tracing::{debug, info, warn};

use bucketstat_core::error::BucketstatError;
use bucketstat_core::metrics::{
    LABEL_RESULT, LABEL_SOURCE, PIPELINE_BATCHES_EMITTED_TOTAL, PIPELINE_LINES_PARSED_TOTAL,
    PIPELINE_MEASUREMENTS_TOTAL, PIPELINE_PARSE_ERRORS_TOTAL,
};
use bucketstat_core::pipeline::MetricsSink;
use bucketstat_core::types::{Dimension, MetricDatum, Unit};

use crate::aggregate::{AggregatedMetric, MetricAggregator};
use crate::bucket::{TimeBucketer, minute_floor};
use crate::config::{MalformedLinePolicy, PipelineConfig};
use crate::error::MeteringError;
use crate::parser::AccessLogParser;
use crate::rule::{Measurement, RuleEngine};

/// 한 번의 전송 호출에 담을 수 있는 최대 데이텀 수 (백엔드 제한)
pub const MAX_DATUMS_PER_EMIT: usize = 20;

/// 자가 메트릭 이름 — 메인 단계의 전송 호출 횟수
const SELF_METRIC_EMIT_CALLS: &str = "Emit_RequestsCount";

/// 실행 결과 리포트
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// 처리 대상 라인 수 (빈 라인 제외)
    pub lines_total: usize,
    /// 파싱에 성공한 레코드 수
    pub records_parsed: usize,
    /// `skip` 정책으로 건너뛴 라인 수
    pub lines_skipped: usize,
    /// 고유 집계 키 수
    pub accumulators: usize,
    /// 메인 네임스페이스로 전송된 배치 수
    pub batches_emitted: usize,
}

/// 메트릭 파이프라인
///
/// 설정에서 구성된 파서, 버킷 계산기, 규칙 엔진을 보유합니다.
/// 실행 간 상태를 공유하지 않습니다: 집계기는 실행마다 새로 만듭니다.
pub struct MeterPipeline {
    config: PipelineConfig,
    parser: AccessLogParser,
    bucketer: TimeBucketer,
    engine: RuleEngine,
}

impl MeterPipeline {
    /// 설정으로 파이프라인을 구성합니다.
    pub fn new(config: PipelineConfig) -> Result<Self, MeteringError> {
        let bucketer = TimeBucketer::new(config.bucket_interval_secs)?;
        let engine = RuleEngine::from_config(&config)?;
        let parser = AccessLogParser::new().with_max_line_len(config.max_line_len);
        Ok(Self {
            config,
            parser,
            bucketer,
            engine,
        })
    }

    /// 규칙 엔진을 반환합니다.
    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// 로그 객체 하나를 처리하고 집계 결과를 싱크로 전송합니다.
    ///
    /// `source`는 로그 출처의 논리 이름으로, 모든 메인 데이텀의
    /// 출처 차원 값과 운영 메트릭 레이블로 사용됩니다.
    ///
    /// 라인 파싱 실패는 정책에 따라 실행 전체를 중단하거나(`fail`,
    /// 이 경우 아무것도 전송하지 않음) 경고와 함께 건너뜁니다(`skip`).
    /// 배치 전송 실패는 즉시 중단하며, 이미 수락된 배치는 되돌리지
    /// 않습니다.
    pub async fn run<S: MetricsSink>(
        &self,
        source: &str,
        raw: &Bytes,
        sink: &S,
    ) -> Result<RunReport, BucketstatError> {
        let mut report = RunReport::default();
        let mut aggregator = MetricAggregator::new();

        self.ingest(source, raw, &mut aggregator, &mut report)?;
        report.accumulators = aggregator.len();

        let drained = aggregator.drain();
        report.batches_emitted = self.emit_batches(source, drained, sink).await?;

        info!(
            source,
            lines = report.lines_total,
            parsed = report.records_parsed,
            skipped = report.lines_skipped,
            accumulators = report.accumulators,
            batches = report.batches_emitted,
            "pipeline run complete"
        );

        if self.config.self_metrics_enabled {
            self.emit_self_metric(report.batches_emitted, sink).await;
        }

        Ok(report)
    }

    /// 라인 분리 + 파싱 + 규칙 평가로 집계기를 채웁니다.
    fn ingest(
        &self,
        source: &str,
        raw: &Bytes,
        aggregator: &mut MetricAggregator,
        report: &mut RunReport,
    ) -> Result<(), BucketstatError> {
        for (idx, raw_line) in raw.split(|&b| b == b'\n').enumerate() {
            let raw_line = match raw_line.strip_suffix(b"\r") {
                Some(stripped) => stripped,
                None => raw_line,
            };
            if raw_line.is_empty() {
                continue;
            }
            let line_no = idx + 1;
            report.lines_total += 1;

            let parsed = std::str::from_utf8(raw_line)
                .map_err(|e| crate::parser::ParseFailure {
                    column: e.valid_up_to(),
                    reason: "line is not valid UTF-8".to_owned(),
                })
                .and_then(|line| self.parser.parse_line(line));

            let record = match parsed {
                Ok(record) => record,
                Err(failure) => {
                    counter!(PIPELINE_PARSE_ERRORS_TOTAL, LABEL_SOURCE => source.to_owned())
                        .increment(1);
                    match self.config.malformed_line_policy {
                        MalformedLinePolicy::Fail => {
                            return Err(MeteringError::MalformedLine {
                                line_no,
                                column: failure.column,
                                reason: failure.reason,
                            }
                            .into());
                        }
                        MalformedLinePolicy::Skip => {
                            warn!(source, line_no, %failure, "skipping malformed log line");
                            report.lines_skipped += 1;
                            continue;
                        }
                    }
                }
            };

            counter!(PIPELINE_LINES_PARSED_TOTAL, LABEL_SOURCE => source.to_owned())
                .increment(1);
            report.records_parsed += 1;

            // 버킷은 레코드당 한 번만 계산
            let bucket = self.bucketer.bucket(record.timestamp);
            let measurements = self.engine.evaluate(&record, bucket);
            counter!(PIPELINE_MEASUREMENTS_TOTAL, LABEL_SOURCE => source.to_owned())
                .increment(measurements.len() as u64);
            for measurement in &measurements {
                aggregator.observe(measurement);
            }
        }

        Ok(())
    }

    /// 집계 결과를 출처 차원을 찍어 배치로 전송합니다.
    async fn emit_batches<S: MetricsSink>(
        &self,
        source: &str,
        drained: Vec<AggregatedMetric>,
        sink: &S,
    ) -> Result<usize, BucketstatError> {
        let dimensions = vec![Dimension::new(&self.config.source_dimension, source)];
        let datums: Vec<MetricDatum> = drained
            .into_iter()
            .map(|aggregated| MetricDatum {
                metric_name: aggregated.metric_name,
                dimensions: dimensions.clone(),
                timestamp: aggregated.bucket,
                unit: aggregated.unit,
                statistics: aggregated.statistics,
            })
            .collect();

        let mut batches_emitted = 0;
        for (batch_index, batch) in datums.chunks(MAX_DATUMS_PER_EMIT).enumerate() {
            if let Err(err) = sink.emit(&self.config.namespace, batch).await {
                counter!(
                    PIPELINE_BATCHES_EMITTED_TOTAL,
                    LABEL_RESULT => "failure"
                )
                .increment(1);
                return Err(MeteringError::EmitFailed {
                    batch_index,
                    reason: err.to_string(),
                }
                .into());
            }
            counter!(
                PIPELINE_BATCHES_EMITTED_TOTAL,
                LABEL_RESULT => "success"
            )
            .increment(1);
            batches_emitted += 1;
            debug!(
                sink = sink.name(),
                batch_index,
                datums = batch.len(),
                "batch emitted"
            );
        }

        Ok(batches_emitted)
    }

    /// 전송 호출 횟수 자가 메트릭을 별도 네임스페이스로 전송합니다.
    ///
    /// 현재 분으로 버킷하며, 실패해도 이미 완료된 메인 단계에는 영향을
    /// 주지 않습니다 (경고 로그만 남김).
    async fn emit_self_metric<S: MetricsSink>(&self, emit_calls: usize, sink: &S) {
        let mut aggregator = MetricAggregator::new();
        aggregator.observe(&Measurement {
            metric_name: SELF_METRIC_EMIT_CALLS.to_owned(),
            bucket: minute_floor(Utc::now()),
            unit: Unit::Count,
            value: emit_calls as f64,
        });

        let dimensions = vec![Dimension::new(
            &self.config.instance_dimension,
            &self.config.instance,
        )];
        let batch: Vec<MetricDatum> = aggregator
            .drain()
            .into_iter()
            .map(|aggregated| MetricDatum {
                metric_name: aggregated.metric_name,
                dimensions: dimensions.clone(),
                timestamp: aggregated.bucket,
                unit: aggregated.unit,
                statistics: aggregated.statistics,
            })
            .collect();

        if let Err(err) = sink
            .emit(&self.config.self_metrics_namespace, &batch)
            .await
        {
            warn!(error = %err, "self-metric emission failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// 전송된 배치를 기록하는 테스트 싱크
    struct RecordingSink {
        calls: Mutex<Vec<(String, Vec<MetricDatum>)>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, Vec<MetricDatum>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl MetricsSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn emit(
            &self,
            namespace: &str,
            batch: &[MetricDatum],
        ) -> Result<(), BucketstatError> {
            self.calls
                .lock()
                .unwrap()
                .push((namespace.to_owned(), batch.to_vec()));
            Ok(())
        }
    }

    const VALID_LINE: &str = "79a59df900b949e5 mybucket [06/Feb/2019:00:00:38 +0000] \
        192.0.2.3 - 3E57427F3EXAMPLE REST.GET.OBJECT photos/cat.jpg \
        \"GET /mybucket/photos/cat.jpg HTTP/1.1\" 200 - 2662992 3462992 70 10 \
        \"-\" \"curl/7.54\" -";

    fn pipeline_with(enabled: &[&str], policy: MalformedLinePolicy) -> MeterPipeline {
        let mut config = PipelineConfig::default();
        config.malformed_line_policy = policy;
        config.self_metrics_enabled = false;
        config.enabled = enabled
            .iter()
            .map(|key| ((*key).to_owned(), true))
            .collect::<BTreeMap<_, _>>();
        MeterPipeline::new(config).unwrap()
    }

    #[tokio::test]
    async fn single_line_produces_one_batch() {
        let pipeline = pipeline_with(
            &["AllRequests_RequestCount"],
            MalformedLinePolicy::Fail,
        );
        let sink = RecordingSink::new();
        let raw = Bytes::from(format!("{VALID_LINE}\n"));

        let report = pipeline.run("mybucket", &raw, &sink).await.unwrap();
        assert_eq!(report.lines_total, 1);
        assert_eq!(report.records_parsed, 1);
        assert_eq!(report.accumulators, 1);
        assert_eq!(report.batches_emitted, 1);

        let calls = sink.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "s3-access-logs");
        assert_eq!(calls[0].1[0].metric_name, "AllRequests_RequestCount");
        assert_eq!(
            calls[0].1[0].dimensions,
            vec![Dimension::new("BucketName", "mybucket")]
        );
    }

    #[tokio::test]
    async fn fail_policy_aborts_and_emits_nothing() {
        let pipeline = pipeline_with(
            &["AllRequests_RequestCount"],
            MalformedLinePolicy::Fail,
        );
        let sink = RecordingSink::new();
        let raw = Bytes::from(format!("{VALID_LINE}\nnot a log line\n"));

        let result = pipeline.run("mybucket", &raw, &sink).await;
        assert!(matches!(result, Err(BucketstatError::Parse(_))));
        assert!(sink.calls().is_empty());
    }

    #[tokio::test]
    async fn skip_policy_counts_and_continues() {
        let pipeline = pipeline_with(
            &["AllRequests_RequestCount"],
            MalformedLinePolicy::Skip,
        );
        let sink = RecordingSink::new();
        let raw = Bytes::from(format!("not a log line\n{VALID_LINE}\n"));

        let report = pipeline.run("mybucket", &raw, &sink).await.unwrap();
        assert_eq!(report.lines_total, 2);
        assert_eq!(report.lines_skipped, 1);
        assert_eq!(report.records_parsed, 1);
        assert_eq!(report.batches_emitted, 1);
    }

    #[tokio::test]
    async fn blank_lines_are_ignored() {
        let pipeline = pipeline_with(
            &["AllRequests_RequestCount"],
            MalformedLinePolicy::Fail,
        );
        let sink = RecordingSink::new();
        let raw = Bytes::from(format!("{VALID_LINE}\r\n\n"));

        let report = pipeline.run("mybucket", &raw, &sink).await.unwrap();
        assert_eq!(report.lines_total, 1);
        assert_eq!(report.records_parsed, 1);
    }

    #[tokio::test]
    async fn empty_object_emits_nothing() {
        let pipeline = pipeline_with(
            &["AllRequests_RequestCount"],
            MalformedLinePolicy::Fail,
        );
        let sink = RecordingSink::new();

        let report = pipeline.run("mybucket", &Bytes::new(), &sink).await.unwrap();
        assert_eq!(report.lines_total, 0);
        assert_eq!(report.batches_emitted, 0);
        assert!(sink.calls().is_empty());
    }

    #[tokio::test]
    async fn configured_max_line_len_rejects_overlong_line() {
        let mut config = PipelineConfig::default();
        config.max_line_len = 64;
        config.malformed_line_policy = MalformedLinePolicy::Skip;
        config.self_metrics_enabled = false;
        config
            .enabled
            .insert("AllRequests_RequestCount".to_owned(), true);
        let pipeline = MeterPipeline::new(config).unwrap();
        let sink = RecordingSink::new();
        let raw = Bytes::from(format!("{VALID_LINE}\n"));

        let report = pipeline.run("mybucket", &raw, &sink).await.unwrap();
        assert_eq!(report.lines_total, 1);
        assert_eq!(report.lines_skipped, 1);
        assert_eq!(report.records_parsed, 0);
        assert!(sink.calls().is_empty());
    }

    #[tokio::test]
    async fn self_metric_goes_to_own_namespace() {
        let mut config = PipelineConfig::default();
        config
            .enabled
            .insert("AllRequests_RequestCount".to_owned(), true);
        let pipeline = MeterPipeline::new(config).unwrap();
        let sink = RecordingSink::new();
        let raw = Bytes::from(format!("{VALID_LINE}\n"));

        pipeline.run("mybucket", &raw, &sink).await.unwrap();

        let calls = sink.calls();
        assert_eq!(calls.len(), 2);
        let (namespace, batch) = &calls[1];
        assert_eq!(namespace, "bucketstat/operations");
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].metric_name, "Emit_RequestsCount");
        assert_eq!(batch[0].statistics.sum, 1.0);
        assert_eq!(
            batch[0].dimensions,
            vec![Dimension::new("Instance", "bucketstat")]
        );
        // 자가 메트릭 버킷은 초 미만이 없는 분 경계
        assert_eq!(batch[0].timestamp.timestamp() % 60, 0);
    }
}
