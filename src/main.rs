//! Endpoint Comments CLI - regenerate endpoint comments across a workspace.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use endpoint_comments::config::discover_config;
use endpoint_comments::output::{format_document, format_summary, format_summary_json, OutputFormat};
use endpoint_comments::{regenerate, FsHost, RegenerateSummary};

/// Endpoint Comments - annotate Spring route declarations with their URLs
#[derive(Parser, Debug)]
#[command(name = "endpoint-comments")]
#[command(author = "Augentic Team")]
#[command(version)]
#[command(about = "Write `// GET https://...` comments above Spring route annotations", long_about = None)]
struct Args {
    /// Workspace directories or single files
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Base URL of generated comments (overrides endpoint-comments.toml)
    #[arg(long)]
    base_url: Option<String>,

    /// Do not write; exit with an error if any file would change
    #[arg(long, conflicts_with = "list")]
    check: bool,

    /// Print resolved endpoints without touching files
    #[arg(long)]
    list: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    format: OutputFormatArg,

    /// Only print the summary
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    /// Human-readable colored output
    Pretty,
    /// JSON output for tooling integration
    Json,
    /// Compact one-line-per-endpoint
    Compact,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Pretty => OutputFormat::Pretty,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Compact => OutputFormat::Compact,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,endpoint_comments=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Build the host for one path: config discovered from the path, CLI flags
/// on top. `--check` and `--list` never write.
fn host_for(path: &Path, args: &Args) -> Result<FsHost> {
    let config = discover_config(path)
        .with_context(|| format!("loading configuration for {}", path.display()))?
        .with_base_url(args.base_url.clone());

    let host = FsHost::new(path, config);
    Ok(if args.check || args.list {
        host.dry_run()
    } else {
        host
    })
}

fn run(args: &Args) -> Result<Vec<RegenerateSummary>> {
    args.paths
        .iter()
        .map(|path| {
            let host = host_for(path, args)?;
            regenerate(&host).with_context(|| format!("scanning {}", path.display()))
        })
        .collect()
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let summaries = match run(&args) {
        Ok(summaries) => summaries,
        Err(err) => {
            eprintln!("{}: {:#}", "Error".red().bold(), err);
            return ExitCode::from(2);
        }
    };

    let output_format: OutputFormat = args.format.into();

    if matches!(output_format, OutputFormat::Json) {
        for summary in &summaries {
            println!("{}", format_summary_json(summary));
        }
    } else {
        for summary in &summaries {
            if !args.quiet {
                for report in &summary.documents {
                    if report.blocks.is_empty() && report.error.is_none() {
                        continue;
                    }
                    print!("{}", format_document(report, output_format));
                }
                println!();
            }
            println!("{}", format_summary(summary));
        }
    }

    let failures: usize = summaries.iter().map(|s| s.failures().count()).sum();
    let pending: usize = summaries.iter().map(|s| s.documents_changed()).sum();

    if failures > 0 {
        ExitCode::from(1)
    } else if args.check && pending > 0 {
        // dry run: `changed` means "would change"
        eprintln!(
            "{} {} document(s) have stale endpoint comments",
            "Check failed:".red().bold(),
            pending
        );
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
