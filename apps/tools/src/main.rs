use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use shared::{catalog, domain::ShortId, record::normalize};
use storage::{BouquetStore, Storage};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/bouquets.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a stored bouquet after migration, with any repairs applied.
    Show { short_id: String },
    /// Import records exported from an older deployment.
    Import { path: PathBuf },
    Catalog,
    Count,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Catalog => {
            for flower in catalog::flowers() {
                println!(
                    "{:>2}  {:<11} {:<7} {:<10} {}",
                    flower.id.0,
                    flower.name,
                    format!("{:?}", flower.size).to_lowercase(),
                    flower.birth_month,
                    flower.meaning
                );
            }
        }
        Command::Show { short_id } => {
            let storage = Storage::new(&cli.database_url).await?;
            let short_id = ShortId::parse(&short_id)?;
            let Some(raw) = storage.find_bouquet_record(&short_id).await? else {
                bail!("bouquet {short_id} not found");
            };
            let normalized = normalize(&raw).with_context(|| format!("bouquet {short_id}"))?;
            println!("{}", serde_json::to_string_pretty(&normalized.bouquet)?);
            for recovery in &normalized.recoveries {
                println!("repaired: {recovery:?}");
            }
        }
        Command::Import { path } => {
            let storage = Storage::new(&cli.database_url).await?;
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let records = match serde_json::from_str::<Value>(&raw)? {
                Value::Array(records) => records,
                record => vec![record],
            };
            for record in &records {
                let short_id = match record.get("short_id").and_then(Value::as_str) {
                    Some(id) => ShortId::parse(id)?,
                    None => ShortId::generate(),
                };
                storage.import_raw_record(&short_id, record).await?;
                println!("imported short_id={short_id}");
            }
        }
        Command::Count => {
            let storage = Storage::new(&cli.database_url).await?;
            println!("{}", storage.count_bouquets().await?);
        }
    }

    Ok(())
}
