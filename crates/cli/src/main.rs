use anyhow::Result;
use clap::Parser;
use eolfmt::summary;
use eolfmt::version::BuildInfo;
use eolfmt_core::{config, Orchestrator, RunSummary, ScanError};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eolfmt")]
#[command(about = "Ensure files end with a trailing newline", long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    /// Files or directories to fix (defaults to the current directory)
    paths: Vec<PathBuf>,

    /// Number of files processed in parallel (defaults to available CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Path to a config file
    #[arg(short, long)]
    config: Option<String>,

    /// Print the summary as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Log per-file decisions to stderr
    #[arg(short, long, default_value_t = false, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, default_value_t = false)]
    quiet: bool,

    /// Show version information
    #[arg(short = 'V', long, default_value_t = false)]
    version: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.version {
        println!("{}", BuildInfo::current().render());
        return;
    }

    init_logging(&cli);

    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging(cli: &Cli) {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut cfg = config::load(cli.config.as_deref())?;
    if let Some(jobs) = cli.jobs {
        cfg.parallelism = Some(jobs);
    }

    let paths = if cli.paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        cli.paths
    };

    let orchestrator = Orchestrator::new(cfg)?;
    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    match orchestrator.run(&paths, cancel).await {
        Ok(result) => {
            print_summary(&result, cli.json)?;
            Ok(())
        }
        Err(ScanError::Cancelled { summary }) => {
            print_summary(&summary, cli.json)?;
            Err(ScanError::Cancelled { summary }.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_summary(result: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", summary::render_json(result)?);
    } else {
        println!("{}", summary::render(result));
    }
    Ok(())
}

/// Cancels `token` on SIGINT, or SIGTERM on unix.
async fn cancel_on_signal(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = interrupted() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                debug!("SIGTERM handler unavailable: {}", e);
                interrupted().await;
            }
        }
    }
    #[cfg(not(unix))]
    interrupted().await;

    debug!("signal received, cancelling");
    token.cancel();
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        debug!("Ctrl-C handler unavailable: {}", e);
        std::future::pending::<()>().await;
    }
}
