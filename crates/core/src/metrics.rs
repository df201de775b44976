//! 메트릭 상수 및 설명 등록
//!
//! 운영(observability) 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 파이프라인 모듈은 이 상수를 사용하여 `metrics::counter!()` 매크로를
//! 호출합니다. 레코더 설치는 임베더의 몫이며, 설치되지 않은 경우
//! 매크로 호출은 no-op입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `bucketstat_`
//! - 접미어: `_total` (counter)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 소스 버킷 레이블 키
pub const LABEL_SOURCE: &str = "source";

/// 전송 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── Pipeline 메트릭 ────────────────────────────────────────────────

/// 파싱에 성공한 로그 라인 수 (counter)
pub const PIPELINE_LINES_PARSED_TOTAL: &str = "bucketstat_pipeline_lines_parsed_total";

/// 파싱에 실패한 로그 라인 수 (counter)
pub const PIPELINE_PARSE_ERRORS_TOTAL: &str = "bucketstat_pipeline_parse_errors_total";

/// 규칙 평가로 생성된 측정값 수 (counter)
pub const PIPELINE_MEASUREMENTS_TOTAL: &str = "bucketstat_pipeline_measurements_total";

/// 싱크로 전송된 배치 수 (counter, label: result)
pub const PIPELINE_BATCHES_EMITTED_TOTAL: &str = "bucketstat_pipeline_batches_emitted_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::describe_counter;

    describe_counter!(
        PIPELINE_LINES_PARSED_TOTAL,
        "Total number of access log lines successfully parsed"
    );
    describe_counter!(
        PIPELINE_PARSE_ERRORS_TOTAL,
        "Total number of access log lines that failed to parse"
    );
    describe_counter!(
        PIPELINE_MEASUREMENTS_TOTAL,
        "Total number of measurements produced by rule evaluation"
    );
    describe_counter!(
        PIPELINE_BATCHES_EMITTED_TOTAL,
        "Total number of datum batches sent to the metrics sink"
    );
}
