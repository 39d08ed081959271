//! vsx-gallery CLI - serve, populate and inspect a VS Code compatible gallery

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vsx_gallery::config::{self, GalleryConfig};
use vsx_gallery::import;
use vsx_gallery::search::{IndexSearch, PageRequest, SearchOptions, SortBy, SortOrder};
use vsx_gallery::ui::{self, Icons};
use vsx_gallery::{RepositoryService, SqliteStore, VsCodeAdapter};

#[derive(Parser)]
#[command(name = "vsx-gallery")]
#[command(version)]
#[command(about = "VS Code Gallery compatible extension server")]
#[command(long_about = r#"
vsx-gallery serves the extension marketplace protocol used by VS Code:
  • Gallery queries by id, name or free text
  • Versioned asset and package downloads
  • Import of unpacked extensions into a local SQLite store

Example usage:
  vsx-gallery init
  vsx-gallery import --path ./vscode-yaml --owner redhat
  vsx-gallery review --extension redhat.vscode-yaml --user alice --rating 5
  vsx-gallery serve --port 8080
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gallery HTTP server
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Public URL prefix used in asset links
        #[arg(long)]
        base_url: Option<String>,

        /// Answer free-text queries with empty results
        #[arg(long)]
        no_search: bool,
    },

    /// Import an unpacked extension directory
    Import {
        /// Directory containing package.json
        #[arg(short, long)]
        path: PathBuf,

        /// Record this user as owner of the namespace
        #[arg(short, long)]
        owner: Option<String>,
    },

    /// Search the extension index
    Search {
        /// Search query
        #[arg(short, long)]
        query: String,

        /// Restrict to a namespace
        #[arg(short, long)]
        namespace: Option<String>,

        /// Maximum number of results
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// relevance, downloadCount, timestamp or averageRating
        #[arg(long, default_value = "relevance")]
        sort_by: String,

        /// asc or desc
        #[arg(long, default_value = "desc")]
        sort_order: String,
    },

    /// Record a user's review of an extension
    Review {
        /// Extension as namespace.name
        #[arg(short, long)]
        extension: String,

        /// Reviewer login; replaces their previous review
        #[arg(short, long)]
        user: String,

        /// Rating from 1 to 5
        #[arg(short, long)]
        rating: u8,

        /// Optional review text
        #[arg(long)]
        comment: Option<String>,
    },

    /// Show statistics about the gallery database
    Stats,

    /// Write a default config file and create the database
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let mut config = config::load_config(Some(&config_path))?.unwrap_or_default();
    let database = database_path(cli.database.as_deref(), &config);

    match cli.command {
        Commands::Serve { host, port, base_url, no_search } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if base_url.is_some() {
                config.server.base_url = base_url;
            }
            if no_search {
                config.search.enabled = false;
            }

            let store = Arc::new(open_store(&database)?);
            let search = Arc::new(IndexSearch::new(store.clone(), config.search.enabled));
            let adapter = VsCodeAdapter::new(store, search, config.server.base_url())
                .with_page_sizes(config.search.default_page_size, config.search.max_page_size);

            ui::header(Icons::ROCKET, "Starting vsx-gallery");
            ui::info("Database", &database.display().to_string());
            ui::info("Asset base URL", &config.server.base_url());
            if !config.search.enabled {
                ui::warn("Search is disabled; text queries return no results");
            }

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(vsx_gallery::server::start_server(
                &config.server.host,
                config.server.port,
                adapter,
            ))?;
        }

        Commands::Import { path, owner } => {
            let store = open_store(&database)?;
            ui::header(Icons::PACKAGE, &format!("Importing {}", path.display()));

            match import::import_extension(&store, &path, owner.as_deref()) {
                Ok(extension) => {
                    let version = extension
                        .latest
                        .as_ref()
                        .map(|v| v.version.clone())
                        .unwrap_or_default();
                    ui::success(&format!("Imported {} (latest {})", extension.qualified_name(), version));
                    ui::summary_row("Database:", &database.display().to_string());
                }
                Err(e) => {
                    ui::error(&format!("Import failed: {}", e));
                    return Err(e.into());
                }
            }
        }

        Commands::Search { query, namespace, limit, sort_by, sort_order } => {
            let store = open_store(&database)?;
            let sort_by: SortBy = sort_by.parse()?;
            let sort_order: SortOrder = sort_order.parse()?;

            let mut options = SearchOptions::new(Some(query.clone()), PageRequest::of(0, limit))
                .with_sort(sort_order, sort_by);
            if let Some(namespace) = namespace {
                options = options.with_namespace(namespace);
            }

            ui::header(Icons::SEARCH, &format!("Searching for '{}'", query));
            let page = store.search_extensions(&options)?;

            let mut extensions = Vec::with_capacity(page.hits.len());
            for hit in &page.hits {
                if let Some(extension) = store.find_extension_by_id(hit.id)? {
                    extensions.push(extension);
                }
            }

            if extensions.is_empty() {
                ui::warn("No extensions found.");
            } else {
                println!("{}", ui::extension_table(&extensions));
                ui::summary_row("Total matches:", &page.total.to_string());
            }
        }

        Commands::Review { extension, user, rating, comment } => {
            let store = open_store(&database)?;
            let Some((namespace, name)) = extension.split_once('.') else {
                anyhow::bail!("expected namespace.name, got {}", extension);
            };
            let found = store
                .find_extension(name, namespace)?
                .ok_or_else(|| anyhow::anyhow!("extension {} not found", extension))?;

            store.add_review(&found, &user, rating, comment.as_deref())?;
            let reviews = store.count_active_reviews(&found)?;
            let average = store
                .find_extension_by_id(found.id)?
                .and_then(|e| e.average_rating)
                .unwrap_or_default();
            tracing::info!("Recorded review of {} by {}", found.qualified_name(), user);

            ui::success(&format!("Reviewed {} ({}/5)", found.qualified_name(), rating));
            ui::summary_row("Average rating:", &format!("{:.1} from {} reviews", average, reviews));
        }

        Commands::Stats => {
            let store = open_store(&database)?;
            let stats = store.stats()?;

            ui::header(Icons::STATS, &format!("Gallery statistics ({})", database.display()));
            println!("{}", ui::stats_table(&stats));
        }

        Commands::Init { force } => {
            let mut init_config = GalleryConfig::default();
            init_config.database = Some(database.display().to_string());
            config::write_config(&config_path, &init_config, force)?;
            open_store(&database)?;

            ui::success(&format!("Wrote {}", config_path.display()));
            ui::summary_row("Database:", &database.display().to_string());
        }
    }

    Ok(())
}

fn database_path(flag: Option<&Path>, config: &GalleryConfig) -> PathBuf {
    match (flag, &config.database) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(path)) => PathBuf::from(path),
        (None, None) => config::default_database_path_in(Path::new(".")),
    }
}

fn open_store(database: &Path) -> anyhow::Result<SqliteStore> {
    config::ensure_db_dir(database)?;
    tracing::debug!("Opening database {}", database.display());
    Ok(SqliteStore::open(database)?)
}
