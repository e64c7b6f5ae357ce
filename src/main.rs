use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use email_harvest::{ExtractionPipeline, PipelineConfig, SubmittedFile};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One email per line
    Simple,
    /// Header, email-to-file mapping and statistics
    Detailed,
    /// Full report as JSON
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "email-harvest",
    version,
    about = "Extract unique email addresses from PDF, DOCX, DOC and ZIP files"
)]
struct Cli {
    /// Files to process, in priority order for provenance
    #[arg(required = true, value_name = "FILE")]
    inputs: Vec<PathBuf>,

    /// Report layout
    #[arg(long, value_enum, default_value = "simple")]
    format: OutputFormat,

    /// Write the report here instead of stdout
    #[arg(long, short, value_name = "PATH")]
    output: Option<PathBuf>,

    /// JSON pipeline configuration
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Files read in parallel
    #[arg(long)]
    workers: Option<usize>,

    /// Per-file timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(workers) = cli.workers {
        config = config.with_workers(workers);
    }
    if let Some(secs) = cli.timeout {
        config = config.with_file_timeout(secs);
    }

    let mut files = Vec::with_capacity(cli.inputs.len());
    for path in &cli.inputs {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        files.push(SubmittedFile::new(name, bytes));
    }

    let report = ExtractionPipeline::new(config).run(files).await?;

    let rendered = match cli.format {
        OutputFormat::Simple => report.render_simple(),
        OutputFormat::Detailed => report.render_detailed(),
        OutputFormat::Json => serde_json::to_string_pretty(&report)? + "\n",
    };

    match cli.output {
        Some(path) => std::fs::write(&path, rendered)
            .with_context(|| format!("writing {}", path.display()))?,
        None => print!("{rendered}"),
    }

    Ok(())
}
