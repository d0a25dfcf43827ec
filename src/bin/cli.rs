//! CLI for quick cluster interaction

use clap::{Parser, Subcommand};
use rxline::{Client, ClientConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rxline")]
#[command(about = "rxline cluster client CLI")]
#[command(version)]
struct Cli {
    /// Cluster endpoints, comma separated
    #[arg(
        long,
        default_value = "http://127.0.0.1:2379",
        value_delimiter = ','
    )]
    endpoints: Vec<String>,

    /// Per-call deadline (e.g. "500ms", "5s")
    #[arg(long, default_value = "5s")]
    deadline: String,

    /// Transport errors tolerated per call
    #[arg(long, default_value = "5")]
    max_retries: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get a key
    Get {
        /// Key
        key: String,
    },

    /// Put a key/value pair
    Put {
        /// Key
        key: String,

        /// Value
        value: String,
    },

    /// Delete a key
    Del {
        /// Key
        key: String,
    },

    /// List cluster members
    Members,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::new(cli.endpoints);
    config.call_deadline_ms = rxline::common::parse_duration(&cli.deadline)?.as_millis() as u64;
    config.max_retries = cli.max_retries;

    let client = Client::connect(config).await?;

    match cli.command {
        Commands::Get { key } => {
            let resp = client.get(key.as_bytes().to_vec()).await?;
            if resp.kvs.is_empty() {
                println!("(not found)");
            }
            for kv in resp.kvs {
                println!(
                    "{} = {}",
                    String::from_utf8_lossy(&kv.key),
                    String::from_utf8_lossy(&kv.value)
                );
            }
        }

        Commands::Put { key, value } => {
            client
                .put(key.as_bytes().to_vec(), value.into_bytes())
                .await?;
            println!("OK");
        }

        Commands::Del { key } => {
            let resp = client.delete(key.as_bytes().to_vec()).await?;
            println!("deleted {} key(s)", resp.deleted);
        }

        Commands::Members => {
            let leader = client.leader();
            for member in client.members() {
                let mark = match &leader {
                    Some(l) if l.id == member.id => " (leader)",
                    _ => "",
                };
                println!("{:>20}  {}{}", member.id, member.addr, mark);
            }
        }
    }

    Ok(())
}
