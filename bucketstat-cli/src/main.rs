//! bucketstat CLI 진입점
//!
//! 인자 파싱과 tracing 초기화 후 서브커맨드 핸들러로 위임합니다.
//! 로그는 stderr로 내보내고 stdout은 데이텀/리포트 출력 전용입니다.

use clap::Parser;

mod cli;
mod commands;
mod error;
mod output;
mod sink;
mod source;

use cli::{Cli, Commands};
use error::CliError;
use output::OutputWriter;
use sink::StdoutMetricsSink;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = cli.log_level.clone().unwrap_or_else(|| "info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(log_level.as_str())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(config = %cli.config.display(), "bucketstat starting");

    if let Err(e) = run(cli).await {
        use colored::Colorize;
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Analyze(args) => {
            let sink = StdoutMetricsSink::new(cli.output);
            commands::analyze::execute(args, &cli.config, &writer, sink).await
        }
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}
