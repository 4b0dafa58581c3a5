//! ion-publish CLI binary entry point.

use std::sync::Arc;

use clap::Parser;
use ion_publish::cli::{AuthCommands, Cli, Commands};
use ion_publish::config::IonConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match IonConfig::load(cli.config.as_deref()) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Auth(auth_args) => match auth_args.command {
            AuthCommands::Login => ion_publish::cli::auth::handle_login(config).await,
            AuthCommands::Status => ion_publish::cli::auth::handle_status(config).await,
            AuthCommands::Logout => ion_publish::cli::auth::handle_logout(config).await,
        },
        Commands::Publish(args) => ion_publish::cli::publish::handle_publish(config, args).await,
        Commands::Status(args) => ion_publish::cli::publish::handle_status(config, args).await,
    };

    if let Err(e) = result {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}
