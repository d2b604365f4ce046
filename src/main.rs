//! hitos CLI binary entry point.

use std::sync::Arc;

use hitos_client::auth::{FileCredentialStore, LogRedirect};
use hitos_client::cli::{AuthCommands, Cli, Commands};
use hitos_client::client::ApiClient;
use hitos_client::config::ClientConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();

    let result = run(cli).await;
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.api_url {
        config.base_url = url;
    }
    let store = Arc::new(FileCredentialStore::new(config.credential_path.clone()));
    let client = ApiClient::new(config, store, Arc::new(LogRedirect))?;

    match cli.command {
        Commands::Auth(auth_args) => match auth_args.command {
            AuthCommands::Login(args) => {
                hitos_client::cli::auth::handle_login(&client, &args.username, args.password).await
            }
            AuthCommands::Status => hitos_client::cli::auth::handle_status(&client).await,
            AuthCommands::Logout => hitos_client::cli::auth::handle_logout(&client).await,
        },
        Commands::Get(args) => {
            hitos_client::cli::resource::handle_get(&client, &args.path, &args.query).await
        }
    }
}
