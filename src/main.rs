use clap::{Parser, Subcommand};
use fractal_dns::config::Config;
use fractal_dns::dns::DNSPacket;
use fractal_dns::dns::enums::DNSResourceType;
use fractal_dns::security::{SecurityKeys, WireSecurity};
use fractal_dns::zone::{AuthoritativeResponder, NewRecord, ZoneStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "fractal-dns")]
#[command(version)]
#[command(about = "Sharded DNS zone storage with signed responses", long_about = None)]
struct Cli {
    /// Zone directory (overrides FRACTAL_ZONE_DIR)
    #[arg(long, global = true)]
    zone_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List zones with record counts
    List,

    /// Create an empty zone
    Create { zone: String },

    /// Delete a zone and all of its shards
    Delete { zone: String },

    /// Add or update a record
    Add {
        zone: String,
        /// Label relative to the zone, `@` for the apex
        domain: String,
        #[arg(value_name = "TYPE")]
        rtype: String,
        value: String,
        #[arg(long)]
        ttl: Option<u32>,
        #[arg(long)]
        priority: Option<u16>,
    },

    /// Remove a record
    Remove {
        zone: String,
        domain: String,
        #[arg(value_name = "TYPE")]
        rtype: String,
    },

    /// Look up records for a fully qualified name
    Lookup {
        name: String,
        #[arg(value_name = "TYPE", default_value = "A")]
        rtype: String,
    },

    /// Answer a query the way the responder would, printed as JSON
    Query {
        name: String,
        #[arg(value_name = "TYPE", default_value = "A")]
        rtype: String,
    },

    /// Print a zone in BIND format
    Export { zone: String },

    /// Generate a response signing key file
    Keygen {
        #[arg(long, default_value = "wire.key")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(zone_dir) = cli.zone_dir {
        config.zone_dir = zone_dir;
    }
    debug!("Configuration: {:?}", config);

    if let Commands::Keygen { out } = &cli.command {
        let keys = SecurityKeys::generate()?;
        keys.save(out).await?;
        info!("Wrote {} key pair to {}", keys.algorithm(), out.display());
        println!("{}", hex::encode(&keys.key_pair().public_key));
        return Ok(());
    }

    let store = Arc::new(ZoneStore::from_config(&config));
    store.load_all().await?;

    match cli.command {
        Commands::List => {
            for (name, summary) in store.list_zones() {
                println!(
                    "{}\t{} records\t{}\t{}",
                    name,
                    summary.record_count,
                    if summary.sharded { "sharded" } else { "plain" },
                    summary.last_updated.to_rfc3339()
                );
            }
        }
        Commands::Create { zone } => {
            store.create_zone(&zone).await?;
            println!("Created zone {}", zone);
        }
        Commands::Delete { zone } => {
            store.delete_zone(&zone).await?;
            println!("Deleted zone {}", zone);
        }
        Commands::Add {
            zone,
            domain,
            rtype,
            value,
            ttl,
            priority,
        } => {
            let record = store
                .add_record(
                    &zone,
                    NewRecord {
                        domain,
                        rtype,
                        value,
                        priority,
                        ttl,
                    },
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Remove {
            zone,
            domain,
            rtype,
        } => {
            let removed = store.delete_record(&zone, &domain, &rtype).await?;
            println!("Removed {} {} {}", removed.domain, removed.rtype, removed.value);
        }
        Commands::Lookup { name, rtype } => {
            let records = store.lookup(&name, &rtype).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Query { name, rtype } => {
            let qtype: DNSResourceType = rtype.parse()?;
            let keys = match &config.wire_key_file {
                Some(path) => Some(SecurityKeys::load(path).await?),
                None => None,
            };
            let security = WireSecurity::with_limits(keys, config.replay_window, config.max_questions);
            let responder = AuthoritativeResponder::new(store.clone(), Arc::new(security));

            let query = DNSPacket::query(rand::random(), &name, qtype);
            let response = responder.respond(&query).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Export { zone } => {
            print!("{}", store.export_text(&zone).await?);
        }
        Commands::Keygen { .. } => {}
    }

    Ok(())
}
