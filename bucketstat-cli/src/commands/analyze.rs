//! `bucketstat analyze` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use bucketstat_core::config::BucketstatConfig;
use bucketstat_core::pipeline::LogSource;
use bucketstat_pipeline::config::PipelineConfig;
use bucketstat_pipeline::pipeline::MeterPipeline;

use crate::cli::AnalyzeArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};
use crate::sink::StdoutMetricsSink;
use crate::source::FileLogSource;

/// Execute the `analyze` command.
///
/// Loads the configuration, runs the pipeline over the given log file and
/// emits every aggregated datum to stdout through the sink. A run summary
/// is rendered after the datums.
///
/// # Errors
///
/// Returns `CliError::Core` when the run aborts (source unavailable,
/// malformed line under the `fail` policy, or emission failure).
pub async fn execute(
    args: AnalyzeArgs,
    config_path: &Path,
    writer: &OutputWriter,
    sink: StdoutMetricsSink,
) -> Result<(), CliError> {
    let config = BucketstatConfig::load(config_path).await?;
    let pipeline_config = PipelineConfig::from_core(&config)?;
    let pipeline = MeterPipeline::new(pipeline_config)?;

    let logfile = args.logfile.display().to_string();
    info!(logfile = %logfile, source = %args.source, "starting analysis");

    let file_source = FileLogSource::new();
    let raw = file_source.fetch(&logfile).await?;
    let report = pipeline.run(&args.source, &raw, &sink).await?;

    writer.render(&AnalyzeReport {
        logfile,
        source: args.source,
        lines_total: report.lines_total,
        records_parsed: report.records_parsed,
        lines_skipped: report.lines_skipped,
        accumulators: report.accumulators,
        batches_emitted: report.batches_emitted,
    })?;

    Ok(())
}

/// Run summary rendered after the emitted datums.
#[derive(Serialize)]
pub struct AnalyzeReport {
    /// Analyzed log file path
    pub logfile: String,
    /// Logical source name stamped on the datums
    pub source: String,
    /// Non-empty lines seen
    pub lines_total: usize,
    /// Lines successfully parsed
    pub records_parsed: usize,
    /// Lines skipped under the `skip` policy
    pub lines_skipped: usize,
    /// Unique (metric, bucket) accumulators
    pub accumulators: usize,
    /// Batches accepted by the sink
    pub batches_emitted: usize,
}

impl Render for AnalyzeReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w)?;
        writeln!(w, "Analysis: {} ({})", self.logfile.bold(), self.source)?;
        writeln!(w, "  Lines:        {}", self.lines_total)?;
        writeln!(w, "  Parsed:       {}", self.records_parsed)?;
        if self.lines_skipped > 0 {
            writeln!(
                w,
                "  Skipped:      {}",
                self.lines_skipped.to_string().yellow()
            )?;
        }
        writeln!(w, "  Accumulators: {}", self.accumulators)?;
        writeln!(w, "  Batches:      {}", self.batches_emitted)?;

        Ok(())
    }
}
