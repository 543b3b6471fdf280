use std::io::Write;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use sentinel_dm::auth;
use sentinel_dm::client::HubClient;
use sentinel_dm::config::Config;
use sentinel_dm::download::{self, DownloadOutcome};
use sentinel_dm::hub::Hub;
use sentinel_dm::metadata::{self, ProgressReporter};
use sentinel_dm::query::{self, MissionSelection};
use sentinel_dm::roi;
use sentinel_dm::search;
use sentinel_dm::store::{MetadataStore, ProductStatus};
use sentinel_dm::workdir::Paths;
use sentinel_dm::SdmError;

/// Manage Copernicus and EUMETSAT remote sensing data from the command line.
#[derive(Parser)]
#[command(name = "sdm", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize the current directory as an sdm project.
    Init {
        /// Delete the configuration file and the metadata database.
        #[arg(long)]
        clean: bool,
    },
    /// Generate a search query from the configuration and print it.
    GenerateQuery {
        /// Include Sentinel-1 products.
        #[arg(long)]
        s1: bool,
        /// Include Sentinel-2 products.
        #[arg(long)]
        s2: bool,
        /// Include Sentinel-3 products.
        #[arg(long)]
        s3: bool,
    },
    /// Execute a search request and record new products.
    Search {
        /// Send the request to EUMETSAT (for Sentinel-3 ocean data).
        #[arg(long)]
        eumetsat: bool,
    },
    /// Download products and metadata.
    Fetch {
        #[command(subcommand)]
        target: FetchTarget,
    },
    /// Manage the metadata database.
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum FetchTarget {
    /// Fetch metadata for all found products.
    Metadata {
        /// Send the requests to EUMETSAT (for Sentinel-3 ocean data).
        #[arg(long)]
        eumetsat: bool,
    },
    /// Fetch an individual product.
    Product {
        /// Product ID to fetch.
        #[arg(long)]
        id: Option<String>,
        /// Product name to fetch.
        #[arg(long)]
        name: Option<String>,
        /// Send the request to EUMETSAT (for Sentinel-3 ocean data).
        #[arg(long)]
        eumetsat: bool,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Delete all metadata from the database.
    Purge {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

struct ConsoleReporter {
    label: &'static str,
}

impl ProgressReporter for ConsoleReporter {
    fn tick(&self, done: usize, total: usize) {
        print!("\r{} [{done}/{total}]", self.label);
        let _ = std::io::stdout().flush();
    }
}

fn hub_for(eumetsat: bool) -> Hub {
    if eumetsat {
        Hub::Eumetsat
    } else {
        Hub::Copernicus
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let paths = Paths::new(std::env::current_dir()?);

    let result = match cli.command {
        Command::Init { clean } => init(&paths, clean).await,
        Command::GenerateQuery { s1, s2, s3 } => {
            generate_query(&paths, MissionSelection { s1, s2, s3 }).await
        }
        Command::Search { eumetsat } => run_search(&paths, eumetsat).await,
        Command::Fetch { target } => match target {
            FetchTarget::Metadata { eumetsat } => fetch_metadata(&paths, eumetsat).await,
            FetchTarget::Product { id, name, eumetsat } => {
                fetch_product(&paths, id, name, eumetsat).await
            }
        },
        Command::Db { action } => match action {
            DbAction::Purge { yes } => purge(&paths, yes).await,
        },
    };

    match result {
        Ok(()) => Ok(()),
        Err(SdmError::ConfigurationMissing) => {
            eprintln!("Cannot load the configuration file. Terminating.");
            std::process::exit(1);
        }
        Err(SdmError::NoAuthentication) => {
            eprintln!("No authentication information found. Terminating.");
            std::process::exit(1);
        }
        Err(SdmError::RequestFailed { status, reason }) => {
            eprintln!("Request status code: {status} [{reason}]. Terminating.");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

async fn init(paths: &Paths, clean: bool) -> sentinel_dm::Result<()> {
    if clean {
        paths.clean()?;
        println!("Cleaning up complete.");
        return Ok(());
    }

    paths.initialize()?;

    if paths.config().exists() {
        println!("Configuration file already exists.");
    } else {
        Config::write_template(paths.config())?;
        println!("Generated a template configuration file.");
    }

    // Opening the store creates the database and its schema.
    MetadataStore::open(paths.database()).await?;
    println!("Ensured the metadata database.");
    println!("Ensured the working tree structure.");
    Ok(())
}

async fn generate_query(paths: &Paths, selection: MissionSelection) -> sentinel_dm::Result<()> {
    if selection.is_empty() {
        println!("No satellite flag specified for the query.");
        return Ok(());
    }

    let config = Config::read(paths.config())?;
    let roi = roi::resolve(&config.search.roi).await?;

    match query::build_query(&config.search, &roi, selection) {
        Some(query) => println!("{query}"),
        None => println!("Search is not configured for the selected satellites."),
    }
    Ok(())
}

async fn run_search(paths: &Paths, eumetsat: bool) -> sentinel_dm::Result<()> {
    let config = Config::read(paths.config())?;
    let hub = hub_for(eumetsat);

    let selection = if eumetsat {
        if config.search.sentinel3.is_none() {
            println!("Search is not configured for Sentinel-3. Terminating.");
            return Ok(());
        }
        MissionSelection {
            s1: false,
            s2: false,
            s3: true,
        }
    } else {
        MissionSelection::from_spec(&config.search)
    };

    let roi = roi::resolve(&config.search.roi).await?;
    let Some(query) = query::build_query(&config.search, &roi, selection) else {
        println!("Search is not configured for any satellite. Terminating.");
        return Ok(());
    };

    let credentials = auth::get_credentials(&config, hub).ok_or(SdmError::NoAuthentication)?;
    let client = HubClient::new(hub, credentials)?;
    let store = MetadataStore::open(paths.database()).await?;

    let (new_count, total_count) = search::reconcile(&query, &client, &store, hub).await?;

    if (new_count, total_count) == (0, 0) {
        println!("Found no matching products.");
    } else if new_count == 1 {
        println!("Found 1 new product ({total_count} total).");
    } else {
        println!("Found {new_count} new products ({total_count} total).");
    }
    Ok(())
}

async fn fetch_metadata(paths: &Paths, eumetsat: bool) -> sentinel_dm::Result<()> {
    let config = Config::read(paths.config())?;
    let hub = hub_for(eumetsat);

    let store = MetadataStore::open(paths.database()).await?;
    let found = store.list_by_status(ProductStatus::Found, hub).await?;
    if found.is_empty() {
        println!("No new search results to fetch metadata for.");
        return Ok(());
    }
    let ids: Vec<String> = found.into_iter().map(|r| r.product_id).collect();

    let credentials = auth::get_credentials(&config, hub).ok_or(SdmError::NoAuthentication)?;
    let client = HubClient::new(hub, credentials)?;

    let reporter = ConsoleReporter {
        label: "Fetching metadata",
    };
    reporter.tick(0, ids.len());
    metadata::enrich_products(&client, &store, &ids, hub, &reporter).await?;

    println!("\nFetched all available metadata.");
    Ok(())
}

async fn fetch_product(
    paths: &Paths,
    id: Option<String>,
    name: Option<String>,
    eumetsat: bool,
) -> sentinel_dm::Result<()> {
    let config = Config::read(paths.config())?;
    let hub = hub_for(eumetsat);
    let store = MetadataStore::open(paths.database()).await?;

    let id = match (id, name) {
        (Some(id), _) => id,
        (None, Some(name)) => match store.find_by_title(&name).await? {
            Some(record) => record.product_id,
            None => {
                println!("Cannot find a product with that name.");
                return Ok(());
            }
        },
        (None, None) => {
            println!("Not enough information to fetch a product.");
            return Ok(());
        }
    };

    let credentials = auth::get_credentials(&config, hub).ok_or(SdmError::NoAuthentication)?;
    let client = HubClient::new(hub, credentials)?;

    // Refresh size and availability before deciding anything.
    let record = metadata::enrich_product(&client, &store, &id, hub).await?;

    if matches!(
        record.status,
        ProductStatus::Offline | ProductStatus::Requested
    ) {
        println!("The product is not online.");
        return Ok(());
    }

    let dest = download::destination(&paths.raw_storage(), &record);
    let (progress_tx, progress_rx) = mpsc::channel(16);
    let printer = tokio::spawn(print_progress(progress_rx, record.title.clone()));

    let outcome = download::download_product(&client, &record, &dest, progress_tx).await;
    let _ = printer.await;

    match outcome? {
        DownloadOutcome::AlreadyDownloaded | DownloadOutcome::Completed(_) => {
            println!("\n{}", record.title);
        }
    }
    Ok(())
}

async fn print_progress(mut progress: mpsc::Receiver<u64>, title: String) {
    while let Some(percent) = progress.recv().await {
        print!("\rDownloading {title} [{percent}%]");
        let _ = std::io::stdout().flush();
    }
}

async fn purge(paths: &Paths, yes: bool) -> sentinel_dm::Result<()> {
    if !yes {
        print!("Delete all metadata? [y/N] ");
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            return Ok(());
        }
    }

    let store = MetadataStore::open(paths.database()).await?;
    let deleted = store.purge().await?;
    println!("Metadata database purged ({deleted} records).");
    Ok(())
}
