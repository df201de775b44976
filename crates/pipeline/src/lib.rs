#![doc = include_str!("../README.md")]

pub mod aggregate;
pub mod bucket;
pub mod config;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod rule;

pub use aggregate::{AggregatedMetric, AggregationKey, MetricAggregator};
pub use bucket::{TimeBucketer, minute_floor};
pub use config::{MalformedLinePolicy, PipelineConfig};
pub use error::MeteringError;
pub use parser::{AccessLogParser, ParseFailure};
pub use pipeline::{MAX_DATUMS_PER_EMIT, MeterPipeline, RunReport};
pub use rule::{MeasurementKind, Measurement, MetricRule, RuleEngine, RulePredicate};
