use anyhow::{Context, Result};
use clap::Parser;
use gambit::cli::{App, Cli, Commands, Config, KeyCommand};
use gambit::crypto::{Identity, ParticipantId};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve { bind, ephemeral } => {
            let bind_addr = bind.unwrap_or_else(|| config.bind_addr.clone());
            let app = if ephemeral {
                warn!("Running with an in-memory database; nothing will be persisted");
                App::ephemeral(config)?
            } else {
                info!("Using database at {}", config.database_path().display());
                App::new(config)?
            };
            info!("Server key: {}", app.identity.public_key_base64());

            app.serve(&bind_addr, shutdown_signal()).await?;
            info!("Server stopped");
        }
        Commands::Key { command } => {
            let key_path = &config.signing_key_file;
            match command {
                KeyCommand::Path => {
                    info!("Key storage path: {}", key_path.display());
                    if key_path.exists() {
                        info!("✓ Key file exists");
                    } else {
                        info!("✗ Key file does not exist");
                        info!("Run 'gambit key generate' to create one");
                    }
                }
                KeyCommand::Generate => {
                    if key_path.exists() {
                        warn!("A key already exists at: {}", key_path.display());
                        warn!("This will overwrite the existing key; issued credentials stop verifying!");
                    }
                    let identity = Identity::generate()?;
                    identity.save(key_path)?;
                    info!("Key generated successfully!");
                    info!("Public Key: {}", identity.public_key_base64());
                    info!("Saved to: {}", key_path.display());
                }
                KeyCommand::Info => match Identity::load(key_path) {
                    Ok(identity) => {
                        info!("Public Key: {}", identity.public_key_base64());
                        info!("Storage location: {}", key_path.display());
                    }
                    Err(e) => {
                        error!("No key found: {}", e);
                        info!("Run 'gambit key generate' to create one");
                    }
                },
            }
        }
        Commands::Credential { participant } => {
            let identity = Identity::load_or_generate(&config.signing_key_file)
                .context("Failed to load signing key")?;
            println!("{}", identity.issue_credential(&ParticipantId::new(participant)));
        }
    }

    Ok(())
}
