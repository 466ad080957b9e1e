use clap::{Parser, Subcommand};
use engine::{DocumentMeta, DocumentSink, Engine, FileSink, Namespaces, NoopSink};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

mod config;
mod docker;
mod render;
mod telemetry;

use config::Config;

/// Keeps a dashboard config file in sync with container labels.
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Path to the YAML config file. Built-in defaults are used when omitted.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Watch the Docker host and rewrite the dashboard on every change.
    Watch,
    /// Build the dashboard once from a YAML file of label maps.
    Render {
        labels: PathBuf,
        /// Print the document instead of writing the output file.
        #[arg(long)]
        stdout: bool,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error("invalid config: {0}")]
    Validation(#[from] config::ValidationError),
    #[error(transparent)]
    Telemetry(#[from] telemetry::TelemetryError),
    #[error(transparent)]
    Watch(#[from] docker::WatchError),
    #[error(transparent)]
    Render(#[from] render::RenderError),
    #[error("could not encode document: {0}")]
    Encode(#[from] serde_yaml::Error),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Exiting");
            eprintln!("dashsync: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.validate()?;

    let _sentry = telemetry::init(&config)?;

    match cli.command {
        CliCommand::Watch => {
            let engine = Arc::new(build_engine(
                &config,
                Arc::new(FileSink::new(&config.output.path)),
            ));
            tracing::info!(output = %config.output.path.display(), "Watcher started");

            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            rt.block_on(async {
                let watcher = docker::DockerWatcher::connect(config.docker.include_services)?;
                watcher.run(engine).await
            })?;
        }
        CliCommand::Render { labels, stdout } => {
            let sink: Arc<dyn DocumentSink + Send + Sync> = if stdout {
                Arc::new(NoopSink)
            } else {
                Arc::new(FileSink::new(&config.output.path))
            };
            let engine = build_engine(&config, sink);
            let document = render::render(&engine, &labels)?;

            if stdout {
                print!("{}", serde_yaml::to_string(&document)?);
            } else {
                tracing::info!(
                    output = %config.output.path.display(),
                    groups = document.groups.len(),
                    "Dashboard written"
                );
            }
        }
    }

    Ok(())
}

fn build_engine(config: &Config, sink: Arc<dyn DocumentSink + Send + Sync>) -> Engine {
    Engine::new(
        Namespaces::from(&config.labels),
        DocumentMeta::from(&config.document),
        sink,
    )
}
