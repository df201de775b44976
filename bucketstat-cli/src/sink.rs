//! Stdout metrics sink
//!
//! Writes aggregated datums to stdout instead of a monitoring backend.
//! JSON output is one datum per line so it can be piped into other tools.

use std::io::Write;

use bucketstat_core::error::{BucketstatError, EmitError};
use bucketstat_core::pipeline::MetricsSink;
use bucketstat_core::types::MetricDatum;

use crate::cli::OutputFormat;

/// [`MetricsSink`] implementation that prints datums to stdout.
pub struct StdoutMetricsSink {
    format: OutputFormat,
}

impl StdoutMetricsSink {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn write_batch(
        &self,
        w: &mut dyn Write,
        namespace: &str,
        batch: &[MetricDatum],
    ) -> Result<(), BucketstatError> {
        for datum in batch {
            match self.format {
                OutputFormat::Text => {
                    writeln!(w, "{namespace} {datum}").map_err(BucketstatError::Io)?;
                }
                OutputFormat::Json => {
                    let line = serde_json::json!({
                        "namespace": namespace,
                        "datum": datum,
                    });
                    let encoded = serde_json::to_string(&line).map_err(|e| {
                        BucketstatError::Emit(EmitError::Unavailable(e.to_string()))
                    })?;
                    writeln!(w, "{encoded}").map_err(BucketstatError::Io)?;
                }
            }
        }
        Ok(())
    }
}

impl MetricsSink for StdoutMetricsSink {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn emit(&self, namespace: &str, batch: &[MetricDatum]) -> Result<(), BucketstatError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.write_batch(&mut handle, namespace, batch)
    }
}
