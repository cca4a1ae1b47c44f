//! Channel list maintenance from the terminal.

use anyhow::Context;
use channel_analyst::config::{init_logger, load_environment, Config};
use channel_analyst::db::{self, ChannelStore};
use channel_analyst::error::StoreError;
use channel_analyst::models::DEFAULT_CATEGORY;
use channel_analyst::utils::extract_channel_id;
use clap::{Parser, Subcommand};
use log::warn;

#[derive(Parser)]
#[command(name = "channels", about = "Manage the channels available for analysis")]
struct Cli {
    /// Defaults to DATABASE_URL.
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show every saved channel.
    List,
    /// Save a new channel.
    Add {
        name: String,
        /// Channel id (UC...) or a youtube.com/channel/ URL.
        channel: String,
        #[arg(long, default_value = DEFAULT_CATEGORY)]
        category: String,
    },
    /// Remove a channel by id.
    Delete { channel_id: String },
    /// Copy the channels of another database into this one, skipping known ids.
    Import { source_url: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_environment();
    init_logger();
    let cli = Cli::parse();

    let database_url = match cli.database_url {
        Some(url) => url,
        None => Config::database_url_from_env()?,
    };
    let store = ChannelStore::new(db::connect(&database_url).await?);

    match cli.command {
        Command::List => {
            let channels = store.list_channels().await?;
            println!("--- Canales en la Base de Datos ---");
            if channels.is_empty() {
                println!("No hay canales.");
            }
            for channel in channels {
                println!(
                    "- Nombre: {}, ID: {}, Categoría: {}",
                    channel.channel_name, channel.channel_id, channel.category
                );
            }
        }
        Command::Add {
            name,
            channel,
            category,
        } => {
            let channel_id = extract_channel_id(&channel)
                .with_context(|| format!("'{channel}' is not a channel id or channel URL"))?;
            match store.add_channel(&name, &channel_id, &category).await {
                Ok(_) => println!("¡Canal '{name}' añadido con éxito!"),
                Err(StoreError::DuplicateChannel(_)) => {
                    println!("Error: Ese ID de canal ya existe en la base de datos.")
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Delete { channel_id } => {
            if store.delete_channel(&channel_id).await? {
                println!("¡Canal con ID '{channel_id}' borrado con éxito!");
            } else {
                println!("No se encontró ningún canal con el ID '{channel_id}'.");
            }
        }
        Command::Import { source_url } => {
            let source = ChannelStore::new(db::connect(&source_url).await?);
            let channels = source.list_channels().await?;
            println!("Se encontraron {} canales para migrar.", channels.len());

            let mut imported = 0;
            for channel in channels {
                match store
                    .add_channel(&channel.channel_name, &channel.channel_id, &channel.category)
                    .await
                {
                    Ok(_) => imported += 1,
                    Err(StoreError::DuplicateChannel(_)) => {
                        warn!("Channel '{}' already exists, skipping", channel.channel_name)
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            println!("¡Migración completada! {imported} canales importados.");
        }
    }

    Ok(())
}
