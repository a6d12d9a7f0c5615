use anyhow::Context;
use clap::Parser;
use quotevault_core::{
    interchange, sync::Syncer, Config, Error, QuotePatch, QuoteRepository, SessionCache,
};
use quotevault_remote::RemoteClient;
use quotevault_store::SqliteStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "quotevault")]
#[command(version, about = "Quote collection with local persistence and remote sync", long_about = None)]
struct Cli {
    /// Override the quote database path
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show one or more random quotes
    Random {
        /// Restrict to a category (persisted as the last-used filter)
        #[arg(long)]
        category: Option<String>,
        /// How many quotes to show
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
    /// List quotes, honoring the saved filter
    List {
        /// Restrict to a category (persisted as the last-used filter)
        #[arg(long)]
        category: Option<String>,
    },
    /// Add a quote
    Add {
        /// The quote text
        text: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        author: Option<String>,
    },
    /// Edit an existing quote by id
    Edit {
        id: String,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        author: Option<String>,
    },
    /// Delete a quote by id
    Delete { id: String },
    /// List the categories currently in the collection
    Categories,
    /// Import quotes from a JSON file
    Import { file: PathBuf },
    /// Export the collection to a JSON file
    Export { file: PathBuf },
    /// Run one fetch-and-merge cycle now
    Sync,
    /// Sync on a timer until Ctrl-C
    Watch {
        /// Seconds between sync ticks (defaults to the configured value)
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - helps when things go sideways
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quotevault=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("could not load configuration")?;

    let data_path = match &cli.data {
        Some(path) => path.clone(),
        None => config.data_path()?,
    };
    tracing::debug!("Using quote store at {}", data_path.display());
    let store = SqliteStore::open(&data_path)
        .with_context(|| format!("could not open quote store at {}", data_path.display()))?;

    let mut repo = QuoteRepository::new(Box::new(store));
    repo.load_or_seed()
        .context("could not load the quote collection")?;

    match cli.command {
        Commands::Random { category, count } => {
            let filter = apply_filter(&mut repo, category.as_deref());
            let mut session = SessionCache::new();

            for _ in 0..count {
                match repo.pick_random(filter.as_deref()) {
                    Some(quote) => {
                        print_quote(&quote);
                        session.remember_viewed(&quote);
                    }
                    None => {
                        println!("No quotes match this filter.");
                        break;
                    }
                }
            }
            if session.views() > 1 {
                println!("({} quotes viewed this session)", session.views());
            }
        }

        Commands::List { category } => {
            let filter = apply_filter(&mut repo, category.as_deref());
            let quotes = repo.list(filter.as_deref());
            if quotes.is_empty() {
                println!("No quotes to show.");
            }
            for quote in quotes {
                print_quote(&quote);
            }
        }

        Commands::Add {
            text,
            category,
            author,
        } => {
            let result = repo.add(
                &text,
                category.as_deref().unwrap_or(""),
                author.as_deref(),
            );
            match result {
                Ok(quote) => println!("Added {}", quote.id),
                Err(e @ Error::Storage(_)) => warn_not_durable(&e),
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Edit {
            id,
            text,
            category,
            author,
        } => {
            let patch = QuotePatch {
                text,
                category,
                author,
            };
            if patch.is_empty() {
                anyhow::bail!("nothing to change; pass --text, --category, or --author");
            }
            match repo.edit(&id, patch) {
                Ok(quote) => {
                    println!("Updated {}", quote.id);
                    print_quote(&quote);
                }
                Err(e @ Error::Storage(_)) => warn_not_durable(&e),
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Delete { id } => match repo.delete(&id) {
            Ok(quote) => println!("Deleted \"{}\"", quote.text),
            Err(e @ Error::Storage(_)) => warn_not_durable(&e),
            Err(e) => return Err(e.into()),
        },

        Commands::Categories => {
            for category in repo.categories() {
                println!("{}", category);
            }
        }

        Commands::Import { file } => {
            let report = interchange::import_file(&mut repo, &file)
                .with_context(|| format!("import from {} failed", file.display()))?;
            println!(
                "Imported {} quotes ({} skipped)",
                report.admitted, report.skipped
            );
        }

        Commands::Export { file } => {
            interchange::export_to_file(&repo, &file)
                .with_context(|| format!("export to {} failed", file.display()))?;
            println!("Exported {} quotes to {}", repo.len(), file.display());
        }

        Commands::Sync => {
            let mut syncer = build_syncer(repo, &config);
            let result = syncer.sync_once().await;
            match result.error {
                Some(e) => println!("Sync reported a problem: {}", e),
                None => println!(
                    "Sync complete: fetched {}, pushed {}, collection {}",
                    result.fetched,
                    result.pushed,
                    if result.changed { "changed" } else { "unchanged" }
                ),
            }
        }

        Commands::Watch { interval } => {
            if !config.remote.enabled {
                println!("Remote sync is disabled in the configuration.");
                return Ok(());
            }
            let secs = interval.unwrap_or(config.sync.interval_secs);
            println!("Syncing every {}s; Ctrl-C to stop.", secs);

            let repo = Arc::new(Mutex::new(repo));
            let syncer = Syncer::new(Arc::clone(&repo), remote_client(&config))
                .with_fetch_limit(config.remote.fetch_limit)
                .with_mirror_writes(config.remote.mirror_writes);

            let handle = syncer.spawn(Duration::from_secs(secs));
            tokio::signal::ctrl_c().await?;
            handle.stop();

            println!("Stopped. {} quotes in the collection.", repo.lock().await.len());
        }
    }

    Ok(())
}

/// Resolve the effective category filter: an explicit flag becomes the new
/// persisted filter, otherwise the last-used one applies.
fn apply_filter(repo: &mut QuoteRepository, flag: Option<&str>) -> Option<String> {
    if let Some(category) = flag {
        if let Err(e) = repo.set_filter(category) {
            warn_not_durable(&e);
        }
    }
    match repo.filter() {
        "all" => None,
        f => Some(f.to_string()),
    }
}

fn build_syncer(repo: QuoteRepository, config: &Config) -> Syncer {
    Syncer::new(Arc::new(Mutex::new(repo)), remote_client(config))
        .with_fetch_limit(config.remote.fetch_limit)
        .with_mirror_writes(config.remote.mirror_writes)
}

fn remote_client(config: &Config) -> RemoteClient {
    RemoteClient::new(config.remote.base_url.clone())
}

fn print_quote(quote: &quotevault_core::Quote) {
    match &quote.author {
        Some(author) => println!(
            "\"{}\" — {} [{}] ({})",
            quote.text, author, quote.category, quote.id
        ),
        None => println!("\"{}\" [{}] ({})", quote.text, quote.category, quote.id),
    }
}

fn warn_not_durable(err: &Error) {
    eprintln!(
        "warning: change applied for this session but saving failed: {}",
        err
    );
}
