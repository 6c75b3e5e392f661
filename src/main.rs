//! depres-rs - Resolve a setup file into an execution plan
//!
//! Usage: `depres-rs <setup-file> [--log-file FILE]`
//!
//! The setup file (TOML or JSON) holds the registry feed and the run
//! configuration. The node table, execution order and output order are
//! logged; graph artifacts are written where the configuration asks for
//! them.

use anyhow::Context;
use clap::Parser;
use depres_rs::{
    config::SetupFile,
    printer::RecordingPrinter,
    resolver::{DependencyResolver, Registry},
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "depres-rs")]
#[command(about = "Resolve compute-node dependencies into an execution plan")]
struct Args {
    /// Setup file with registry and run configuration
    setup_file: PathBuf,

    /// Also write logs to this file
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = init_logging(args.log_file.as_ref())?;

    tracing::info!("Loading setup from {:?}", args.setup_file);
    let setup = SetupFile::load(&args.setup_file)
        .with_context(|| format!("Failed to load setup file {:?}", args.setup_file))?;

    let registry = Registry::from_feed(setup.registry);
    let mut resolver = DependencyResolver::new(registry, setup.config);

    let resolved = resolver.resolve().map(|_| ());
    tracing::info!("\n{}", resolver.node_table());
    tracing::info!("\n{}", resolver.backend_table());
    resolved.context("Dependency resolution failed")?;

    for (position, vertex) in resolver.execution_order().iter().enumerate() {
        tracing::info!("{:>4}: {}", position, resolver.registry().label(*vertex));
    }
    tracing::info!("\n{}", resolver.evaluation_order_report());

    let mut printer = RecordingPrinter::default();
    let printed = resolver.initialise_printer(&mut printer);
    tracing::info!("{} outputs marked for printing", printed.len());

    resolver
        .write_artifacts()
        .context("Failed to write graph artifacts")?;

    Ok(())
}

fn init_logging(
    log_file: Option<&PathBuf>,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,depres_rs=debug"));

    match log_file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("Log file path {:?} has no file name", path))?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
            Ok(None)
        }
    }
}
