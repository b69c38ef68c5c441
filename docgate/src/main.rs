mod config;
mod telemetry;

use clap::{Args, Parser};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "docgate")]
enum CliCommand {
    /// Run the document gateway
    Gateway(GatewayArgs),
}

#[derive(Args)]
struct GatewayArgs {
    #[arg(long)]
    config_file: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error("no `gateway` section in config file")]
    MissingGatewayConfig,
    #[error(transparent)]
    Telemetry(#[from] telemetry::TelemetryError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Gateway(#[from] gateway::GatewayError),
}

fn main() -> ExitCode {
    let cli = CliCommand::parse();

    match cli {
        CliCommand::Gateway(args) => match run_gateway(&args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "Gateway exited with error");
                eprintln!("docgate: {e}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run_gateway(args: &GatewayArgs) -> Result<(), CliError> {
    let config = config::Config::from_file(&args.config_file)?;

    // Sentry goes first so the tracing layer has a client to forward to.
    let _sentry_guard = telemetry::init_sentry(config.common.logging.as_ref());
    telemetry::init_logging();
    telemetry::init_metrics(config.common.metrics.as_ref())?;

    let gateway_config = config.gateway.ok_or(CliError::MissingGatewayConfig)?;

    tracing::info!(config_file = %args.config_file.display(), "Starting gateway");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(gateway::run(gateway_config))?;

    Ok(())
}
