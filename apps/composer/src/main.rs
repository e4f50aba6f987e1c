use anyhow::{bail, Result};
use clap::Parser;
use client_core::{wizard::PublishError, BouquetClient, Wizard, WizardStep};
use shared::{
    catalog,
    domain::{FlowerId, Letter},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Builds a bouquet step by step and publishes it to a bouquet server.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8443")]
    server_url: String,
    /// Catalog id to add; repeat for each stem.
    #[arg(long = "flower", required = true)]
    flowers: Vec<u32>,
    #[arg(long, default_value = "color")]
    mode: String,
    #[arg(long, default_value_t = 0)]
    greenery: u32,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value = "")]
    sender: String,
    #[arg(long, default_value = "")]
    recipient: String,
    #[arg(long, default_value = "")]
    message: String,
    /// Print the request instead of sending it.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let mut wizard = Wizard::new(shared::draft::BouquetDraft::new(args.mode.clone()));
    println!("[1/4] {}", WizardStep::PickFlowers.title());
    for id in &args.flowers {
        let id = FlowerId(*id);
        let Some(flower) = catalog::find(id) else {
            bail!("flower {id} is not in the catalog");
        };
        match wizard.add_flower(id) {
            Ok(count) => println!("  + {} (x{count})", flower.name),
            Err(err) => warn!(%id, %err, "flower skipped"),
        }
    }
    wizard.next()?;

    println!("[2/4] {}", WizardStep::Customize.title());
    let order = match args.seed {
        Some(seed) => wizard.shuffle_seeded(seed)?,
        None => wizard.shuffle()?,
    };
    wizard.set_greenery(args.greenery)?;
    println!("  order {order:?}, greenery {}", args.greenery);
    for instance in wizard.draft().instances() {
        if let Some(flower) = catalog::find(instance.flower_id) {
            println!("  #{} {} ({}px)", instance.order, flower.name, flower.size.pixels());
        }
    }
    wizard.next()?;

    println!("[3/4] {}", WizardStep::WriteCard.title());
    let letter = Letter {
        sender: args.sender,
        recipient: args.recipient,
        message: args.message,
    };
    println!(
        "  Dear {},\n  {}\n  Sincerely, {}",
        letter.display_recipient(),
        letter.display_message(),
        letter.display_sender()
    );
    wizard.set_letter(letter)?;
    wizard.next()?;

    println!("[4/4] {}", WizardStep::Share.title());
    if args.dry_run {
        println!("{}", serde_json::to_string_pretty(&wizard.request()?)?);
        return Ok(());
    }

    let client = BouquetClient::new(args.server_url);
    let created = match wizard.publish(&client).await {
        Ok(created) => created,
        Err(PublishError::Client(err)) => {
            eprintln!("{}", err.code().headline());
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };
    info!(short_id = %created.short_id, "published");
    println!("  link:     {}", created.share.url);
    println!("  twitter:  {}", created.share.twitter);
    println!("  facebook: {}", created.share.facebook);
    println!("  whatsapp: {}", created.share.whatsapp);
    Ok(())
}
