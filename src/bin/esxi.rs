use clap::Parser;
use esxi_toolkit::app::App;
use esxi_toolkit::cli::Cli;
use esxi_toolkit::config::Config;
use esxi_toolkit::prelude::{AppState, Result};
use esxi_toolkit::telemetry;

/// The main entry point for the command-line tool.
///
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging. Records go to stdout, diagnostics to stderr.
    let subscriber =
        telemetry::get_subscriber(telemetry::level_from_verbosity(cli.verbose), std::io::stderr);
    telemetry::init_subscriber(subscriber)?;
    tracing::debug!(target: "app", ?cli, "Cli arguments parsed.");

    let config = Config::load(cli.config.as_deref())?;
    let mut state = AppState::from_config(&config)?;
    if let Some(error_mode) = cli.error_mode {
        state.error_mode = error_mode;
    }
    tracing::debug!(target: "app", ?state, "State ready.");

    let app = App::new(state, cli.format, config.latest_policy);
    let mut stdout = std::io::stdout().lock();
    app.run(cli.command, &mut stdout).await
}
