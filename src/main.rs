use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use transaction_analyzer::{
    Analysis, AnalysisConfig, AnalysisError,
    logging::{LogFormat, LoggingConfig, init_logging},
};

#[cfg(not(target_env = "msvc"))]
use jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "transaction-analyzer")]
#[command(about = "Counts, summarises and filters transactional records, then writes a PDF report and a slide deck")]
#[command(version)]
struct Args {
    /// CSV file with a header row
    #[arg(default_value = "transactions.csv")]
    input: PathBuf,

    /// Where to write the PDF report
    #[arg(default_value = "report.pdf")]
    report: PathBuf,

    /// Where to write the slide deck
    #[arg(default_value = "presentation.pptx")]
    slides: PathBuf,

    /// Log level filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log format: compact or text
    #[arg(long, default_value = "compact")]
    log_format: String,
}

fn main() {
    let start = Instant::now();
    let args = Args::parse();

    let config = AnalysisConfig::default()
        .with_input(args.input)
        .with_report_path(args.report)
        .with_slides_path(args.slides)
        .with_logging(LoggingConfig {
            level: args.log_level,
            format: LogFormat::from_name(&args.log_format),
        });

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Warning: {}", e);
    }

    match run(&config) {
        Ok(report) => println!("{}", report),
        Err(err) => println!("{}", err.console_message(&config.input)),
    }

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    println!("Execution time: {:.2} ms", elapsed_ms);
}

fn run(config: &AnalysisConfig) -> Result<String, AnalysisError> {
    let analysis = Analysis::load(config.clone())?;
    let report = analysis.run()?;
    Ok(report.to_string())
}
