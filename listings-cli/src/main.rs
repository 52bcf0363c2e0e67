//! Listings CLI
//!
//! Command-line interface for the listings directory API.

use anyhow::Result;
use clap::{Parser, Subcommand};

use listings_client::ListingsClient;
use listings_types::{CorrelationRef, CreateListingRequest, ListingId};

#[derive(Parser)]
#[command(name = "listings")]
#[command(author, version, about = "Listings directory CLI client", long_about = None)]
struct Cli {
    /// Base URL of the listings API
    #[arg(long, env = "LISTINGS_API_URL", default_value = "http://localhost:5000")]
    api_url: String,

    /// Admin token for verification and featuring
    #[arg(long, env = "LISTINGS_ADMIN_KEY")]
    admin_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Listing operations
    Listing {
        #[command(subcommand)]
        action: ListingCommands,
    },
    /// Featured-listing payments
    Payment {
        #[command(subcommand)]
        action: PaymentCommands,
    },
    /// Check API health
    Health,
}

#[derive(Subcommand)]
enum ListingCommands {
    /// Add a business to the directory
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        city: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        whatsapp: String,
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Get listing details
    Get {
        /// Listing ID (UUID)
        id: String,
    },
    /// Toggle the verified badge (admin)
    Verify { id: String },
    /// Payment history, newest first (admin)
    Payments { id: String },
}

#[derive(Subcommand)]
enum PaymentCommands {
    /// Send a "pay to feature" charge to a phone (admin)
    Feature {
        #[arg(long)]
        listing: String,
        /// Payer MSISDN, e.g. 254712345678
        #[arg(long)]
        phone: String,
        /// Amount in cents, whole shillings only
        #[arg(long)]
        amount: i64,
    },
    /// Look up a payment request by correlation reference (admin)
    Get { reference: String },
    /// Expire stale PENDING requests now (admin)
    Sweep,
}

fn parse_listing_id(s: &str) -> Result<ListingId> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("Invalid listing ID: {}", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut client = ListingsClient::new(&cli.api_url);
    if let Some(key) = cli.admin_key {
        client = client.with_admin_key(key);
    }

    match cli.command {
        Commands::Health => {
            if client.health().await? {
                println!("✓ API is healthy");
            } else {
                println!("✗ API is not healthy");
                std::process::exit(1);
            }
        }

        Commands::Listing { action } => match action {
            ListingCommands::Create {
                name,
                category,
                city,
                description,
                whatsapp,
                image_url,
            } => {
                let req = CreateListingRequest {
                    business_name: name,
                    category,
                    city,
                    description,
                    whatsapp,
                    image_url,
                };
                let listing = client.create_listing(&req).await?;
                println!("{}", serde_json::to_string_pretty(&listing)?);
            }
            ListingCommands::Get { id } => {
                let listing = client.get_listing(parse_listing_id(&id)?).await?;
                println!("{}", serde_json::to_string_pretty(&listing)?);
            }
            ListingCommands::Verify { id } => {
                let listing = client.toggle_verified(parse_listing_id(&id)?).await?;
                println!("{}", serde_json::to_string_pretty(&listing)?);
            }
            ListingCommands::Payments { id } => {
                let history = client
                    .list_listing_payments(parse_listing_id(&id)?)
                    .await?;
                println!("{}", serde_json::to_string_pretty(&history)?);
            }
        },

        Commands::Payment { action } => match action {
            PaymentCommands::Feature {
                listing,
                phone,
                amount,
            } => {
                let resp = client
                    .feature_listing(parse_listing_id(&listing)?, &phone, amount)
                    .await?;
                println!("{}", serde_json::to_string_pretty(&resp)?);
            }
            PaymentCommands::Get { reference } => {
                let payment = client.get_payment(&CorrelationRef::from(reference)).await?;
                println!("{}", serde_json::to_string_pretty(&payment)?);
            }
            PaymentCommands::Sweep => {
                let expired = client.sweep().await?;
                println!("Expired {} stale payment request(s)", expired);
            }
        },
    }

    Ok(())
}
