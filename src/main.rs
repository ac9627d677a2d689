//! Voice Memo CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use voice_memo::cli::{
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    handle_daemon_command, run_list, run_serve, run_theme, Presenter, EXIT_ERROR,
};
use voice_memo::infrastructure::XdgConfigStore;

const LOG_ENV: &str = "VOICE_MEMO_LOG";
const DEFAULT_LOG_FILTER: &str = "voice_memo=info";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();
    let presenter = Presenter::new();

    match cli.command {
        Commands::Serve(options) => run_serve(options).await,
        Commands::Daemon { action } => match handle_daemon_command(action, &presenter).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                presenter.error(&e);
                ExitCode::from(EXIT_ERROR)
            }
        },
        Commands::List { recordings_dir } => run_list(recordings_dir).await,
        Commands::Theme => run_theme(),
        Commands::Config { action } => {
            let store = XdgConfigStore::new();
            match handle_config_command(action, &store, &presenter).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_ERROR)
                }
            }
        }
    }
}
