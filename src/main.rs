//! dbchat binary entry point.

use clap::Parser;
use dbchat::cli::Cli;
use dbchat::config::AppConfig;
use dbchat::error::error_chain;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", error_chain(&e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> dbchat::Result<()> {
    let mut config = AppConfig::from_env()?;
    cli.apply(&mut config);

    dbchat::logging::init_logging(&config.log_path())?;
    tracing::info!(bind = %config.bind, model = %config.model, "dbchat.start");

    dbchat::server::serve(config).await
}
