use clap::{Parser, Subcommand};

use quorumfs::config::QuorumfsConfig;
use quorumfs::driver;
use quorumfs::server::QuorumfsServer;

#[derive(Parser)]
#[command(name = "quorumfs", about = "Replicated append-only text file store")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bootstrap this node's replica set and serve the peer/client RPC surface.
    Serve {
        #[arg(long, default_value = "config.json")]
        config: String,
    },
    /// Run a scripted sequence of client commands against a running cluster.
    Drive {
        #[arg(long, default_value = "config.json")]
        config: String,
        /// Path to a command file (`client <id>` / `read <file>` / `write <file> <text>`).
        script: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config: config_path } => {
            let config = QuorumfsConfig::from_file(&config_path)?;
            config.maybe_rewrite_next_node(&config_path)?;

            let server = QuorumfsServer::bootstrap(config).await?;
            tracing::info!("node bootstrapped, starting RPC listener");
            server.start().await?;
        }
        Command::Drive { config, script } => {
            let config = QuorumfsConfig::from_file(&config)?;
            let script = std::fs::read_to_string(&script)?;
            driver::run_commands(&config, &script).await;
        }
    }

    Ok(())
}
