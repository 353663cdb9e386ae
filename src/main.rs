use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use reading_shelf::catalog::{CatalogSource, GoogleBooksClient};
use reading_shelf::collections::{
    CollectionBackend, CollectionError, CollectionStore, FileBackend, HttpBackend,
};
use reading_shelf::config::{
    find_config_file, get_config, load_config, user_config_path, BackendKind, Config,
};
use reading_shelf::models::{CatalogItem, CollectionKind, Query, SearchPage};
use reading_shelf::pagination::Direction;
use reading_shelf::session::{SearchSession, SessionOptions};
use reading_shelf::utils::{is_terminal, items_table, page_summary, HttpClient};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Reading Shelf - Search books and keep track of what you want to read and have read
#[derive(Parser, Debug)]
#[command(name = "reading-shelf")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search books by author and title and keep reading lists", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Collection selector for `list`
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ListKind {
    /// Books you want to read
    Want,
    /// Books you have read
    Read,
}

impl From<ListKind> for CollectionKind {
    fn from(kind: ListKind) -> Self {
        match kind {
            ListKind::Want => CollectionKind::WantToRead,
            ListKind::Read => CollectionKind::Read,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search the catalog by author and/or title
    #[command(alias = "s")]
    Search {
        /// Author to match
        #[arg(long, short)]
        author: Option<String>,

        /// Title to match
        #[arg(long, short)]
        title: Option<String>,

        /// Page to show (1-based)
        #[arg(long, short, default_value_t = 1)]
        page: usize,

        /// Gather all pages up to the configured limit and rank them together
        #[arg(long, conflicts_with = "page")]
        all: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Add a catalog volume to your want-to-read list
    Want {
        /// Catalog volume id
        id: String,
    },

    /// Mark a catalog volume as read
    Read {
        /// Catalog volume id
        id: String,
    },

    /// Show one of your collections
    #[command(alias = "ls")]
    List {
        /// Which collection
        #[arg(value_enum)]
        collection: ListKind,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Write a configuration file with default values
    Init {
        /// Where to write it (defaults to the user config directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if let Some(config_path) = &cli.config {
        load_config(config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?
    } else if let Some(config_path) = find_config_file() {
        load_config(&config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?
    } else {
        get_config().context("Failed to read configuration from environment")?
    };

    init_tracing(&cli, &config);

    match cli.command {
        Commands::Search {
            author,
            title,
            page,
            all,
            json,
        } => {
            let query = Query::new(author.as_deref(), title.as_deref());
            let mut session = SearchSession::new(
                open_catalog(&config)?,
                SessionOptions::from(&config.catalog),
            );

            let result = if all {
                session.fetch_all(query).await?
            } else {
                session.search(query).await?;
                // paging is relative, so walk forward to the requested page
                while session.pagination().page_index() < page {
                    session.change_page(Direction::Next).await?;
                }
                session
                    .page()
                    .context("Search finished without a page to show")?
            };

            print_page(result, json || !is_terminal())?;
        }

        Commands::Want { id } => {
            let mut store = open_store(&config).await?;
            if let Some(collection) = store.membership(&id) {
                if !cli.quiet {
                    println!("{} is already in {}", id, collection);
                }
                return Ok(());
            }

            let catalog = open_catalog(&config)?;
            let item = catalog
                .get_by_id(&id)
                .await
                .with_context(|| format!("Failed to look up volume {}", id))?;
            let title = item.title.clone();
            store.add_to_want_to_read(item).await?;

            if !cli.quiet {
                println!("Added \"{}\" to {}", title, CollectionKind::WantToRead);
            }
        }

        Commands::Read { id } => {
            let mut store = open_store(&config).await?;
            let stored = store
                .list_want_to_read()
                .iter()
                .find(|item| item.id == id)
                .cloned();

            let item = match stored {
                Some(item) => item,
                None => open_catalog(&config)?
                    .get_by_id(&id)
                    .await
                    .with_context(|| format!("Failed to look up volume {}", id))?,
            };
            let title = item.title.clone();

            match store.move_to_read(item).await {
                Ok(()) => {
                    if !cli.quiet {
                        println!("Marked \"{}\" as read", title);
                    }
                }
                Err(e @ CollectionError::PartialMove { .. }) => {
                    // the next start reconciles the leftover row
                    eprintln!("Warning: {}", e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::List { collection, json } => {
            let store = open_store(&config).await?;
            let items = store.list(collection.into());
            print_items(items, json || !is_terminal())?;
        }

        Commands::Config { action } => match action {
            ConfigCommands::Init { path, force } => {
                let path = match path.or_else(user_config_path) {
                    Some(path) => path,
                    None => bail!("No config directory available, pass --path"),
                };
                if path.exists() && !force {
                    bail!(
                        "{} already exists, use --force to overwrite",
                        path.display()
                    );
                }
                Config::default()
                    .save(&path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                if !cli.quiet {
                    println!("Wrote {}", path.display());
                }
            }
            ConfigCommands::Show => {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        },
    }

    Ok(())
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error".to_string()
    } else {
        match cli.verbose {
            0 => config.logging.level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("reading_shelf={}", level)),
    );

    let json = config.logging.is_json();
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

fn open_catalog(config: &Config) -> Result<Arc<dyn CatalogSource>> {
    let client = HttpClient::with_timeout(config.catalog.request_timeout())
        .context("Failed to build HTTP client")?;
    Ok(Arc::new(GoogleBooksClient::with_base_url(
        client,
        &config.catalog.base_url,
        config.catalog.api_key.clone(),
    )))
}

fn open_backend(config: &Config) -> Result<Arc<dyn CollectionBackend>> {
    match config.persistence.backend {
        BackendKind::File => Ok(Arc::new(FileBackend::new(&config.persistence.path))),
        BackendKind::Http => {
            let base_url = config
                .persistence
                .base_url
                .as_deref()
                .context("persistence.base_url is required for the http backend")?;
            let client = HttpClient::with_timeout(config.catalog.request_timeout())
                .context("Failed to build HTTP client")?;
            Ok(Arc::new(HttpBackend::new(client, base_url)))
        }
    }
}

async fn open_store(config: &Config) -> Result<CollectionStore> {
    let backend = open_backend(config)?;
    tracing::debug!(backend = backend.name(), "Loading collections");
    CollectionStore::load(backend, config.retry_config())
        .await
        .context("Failed to load collections")
}

fn print_page(page: &SearchPage, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(page)?);
        return Ok(());
    }

    if !page.is_empty() {
        let first_position = (page.page_index - 1) * page.page_size + 1;
        println!("{}", items_table(&page.items, first_position));
    }
    println!("{}", page_summary(page));
    Ok(())
}

fn print_items(items: &[CatalogItem], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else if items.is_empty() {
        println!("Nothing here yet");
    } else {
        println!("{}", items_table(items, 1));
    }
    Ok(())
}
