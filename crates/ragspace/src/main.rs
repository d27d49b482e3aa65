//! # ragspace CLI
//!
//! Command-line interface and server entry point for ragspace, a
//! workspace-scoped retrieval-augmented-generation service.
//!
//! ## Commands
//!
//! - `ragspace serve` - run the HTTP API
//! - `ragspace workspace create <NAME>` - create a workspace
//! - `ragspace data-source add` - attach a filesystem data source
//! - `ragspace ingest` - ingest a data source's files
//! - `ragspace query` - one-shot query, streaming the answer to stdout
//! - `ragspace config` - show or initialize configuration
//!
//! ## Examples
//!
//! ```bash
//! ragspace workspace create acme
//! ragspace data-source add --workspace <ID> --name docs --path ~/docs
//! ragspace ingest --workspace <ID> --data-source <DS_ID>
//! ragspace query --workspace <ID> "What does the handbook say about travel?"
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use ragspace_connect::ConnectorRegistry;
use ragspace_core::{Connector, MetadataStore, VectorStore};
use ragspace_ingest::{IngestConfig, IngestionPipeline};
use ragspace_providers::ProviderRegistry;
use ragspace_rag::RagEngine;
use ragspace_server::{AppState, RateLimiter};
use ragspace_store::SqliteStore;
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "ragspace")]
#[command(about = "Workspace-scoped RAG service")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.config/ragspace/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Bind address (overrides config)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Manage workspaces
    Workspace {
        #[command(subcommand)]
        action: WorkspaceAction,
    },

    /// Manage data sources
    DataSource {
        #[command(subcommand)]
        action: DataSourceAction,
    },

    /// Ingest files from a data source
    Ingest {
        /// Workspace id
        #[arg(short, long)]
        workspace: Uuid,

        /// Data source id
        #[arg(short, long)]
        data_source: Uuid,
    },

    /// Query a workspace, streaming the answer to stdout
    Query {
        /// Workspace id
        #[arg(short, long)]
        workspace: Uuid,

        /// Query string
        query: String,

        /// Template id
        #[arg(short, long)]
        template: Option<Uuid>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum WorkspaceAction {
    /// Create a workspace
    Create {
        /// Workspace name
        name: String,
    },
}

#[derive(Subcommand)]
enum DataSourceAction {
    /// Attach a filesystem data source to a workspace
    Add {
        /// Workspace id
        #[arg(short, long)]
        workspace: Uuid,

        /// Data source name
        #[arg(short, long)]
        name: String,

        /// Base directory to index
        #[arg(short, long)]
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print a sample configuration file
    Init,
    /// Show the config file path
    Path,
}

/// The wired component stack shared by every command.
struct Components {
    store: Arc<SqliteStore>,
    connectors: Arc<ConnectorRegistry>,
    pipeline: Arc<IngestionPipeline>,
    engine: Arc<RagEngine>,
}

fn create_components(config: &Config) -> Result<Components> {
    let db_path = config
        .storage
        .database_path()
        .context("could not resolve a data directory; set storage.path or RAGSPACE_DATA_DIR")?;
    let store = Arc::new(SqliteStore::open(&db_path).context("failed to open store")?);

    let connectors = Arc::new(ConnectorRegistry::with_defaults());
    let providers = Arc::new(ProviderRegistry::from_env());

    let embedder = providers
        .default_embedder()
        .context("no default embedding provider registered")?;

    let pipeline = Arc::new(IngestionPipeline::new(
        Arc::clone(&store) as Arc<dyn MetadataStore>,
        Arc::clone(&store) as Arc<dyn VectorStore>,
        Arc::clone(&connectors),
        embedder,
        IngestConfig {
            chunk_size: config.ingest.chunk_size,
            max_files: config.ingest.max_files,
            embed_concurrency: config.ingest.embed_concurrency,
        },
    ));

    let engine = Arc::new(
        RagEngine::new(
            Arc::clone(&store) as Arc<dyn MetadataStore>,
            Arc::clone(&store) as Arc<dyn VectorStore>,
            providers,
        )
        .context("failed to build RAG engine")?,
    );

    Ok(Components {
        store,
        connectors,
        pipeline,
        engine,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = if let Some(ref path) = cli.config {
        Config::load_from(Some(path.clone())).map_err(anyhow::Error::msg)?
    } else {
        Config::load().map_err(anyhow::Error::msg)?
    };

    match cli.command {
        Commands::Serve { bind } => {
            let components = create_components(&config)?;
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());

            let limiter = Arc::new(RateLimiter::new(
                config.limits.max_requests,
                Duration::from_secs(config.limits.window_secs),
            ));

            let state = AppState::new(
                Arc::clone(&components.store) as Arc<dyn MetadataStore>,
                Arc::clone(&components.store) as Arc<dyn VectorStore>,
                components.connectors,
                components.pipeline,
                components.engine,
                limiter,
            );

            let listener = tokio::net::TcpListener::bind(&bind)
                .await
                .with_context(|| format!("failed to bind {bind}"))?;
            info!("listening on {bind}");

            axum::serve(listener, ragspace_server::router(state))
                .await
                .context("server error")?;
        }

        Commands::Workspace { action } => match action {
            WorkspaceAction::Create { name } => {
                let components = create_components(&config)?;
                let workspace = components.store.create_workspace(&name, None).await?;
                println!("{}", serde_json::to_string_pretty(&workspace)?);
            }
        },

        Commands::DataSource { action } => match action {
            DataSourceAction::Add {
                workspace,
                name,
                path,
            } => {
                let components = create_components(&config)?;

                components
                    .store
                    .workspace(workspace)
                    .await?
                    .with_context(|| format!("workspace {workspace} not found"))?;

                let connector = components
                    .connectors
                    .get("filesystem")
                    .context("filesystem connector not registered")?;
                let ds_config = json!({"path": path.to_string_lossy()});
                if !connector.validate_config(&ds_config).await? {
                    anyhow::bail!("{} is not a readable directory", path.display());
                }

                let data_source = components
                    .store
                    .create_data_source(workspace, &name, "filesystem", ds_config)
                    .await?;
                println!("{}", serde_json::to_string_pretty(&data_source)?);
            }
        },

        Commands::Ingest {
            workspace,
            data_source,
        } => {
            let components = create_components(&config)?;
            let report = components
                .pipeline
                .ingest_data_source(workspace, data_source)
                .await?;

            println!(
                "Ingested {} documents ({} chunks), {} failed",
                report.ingested, report.chunks, report.failed
            );
        }

        Commands::Query {
            workspace,
            query,
            template,
        } => {
            let components = create_components(&config)?;
            let response = components.engine.query(workspace, &query, template).await?;

            if response.citations.is_empty() {
                println!("(no sources matched)");
            } else {
                println!("Sources:");
                for citation in &response.citations {
                    let title = citation
                        .document
                        .as_ref()
                        .map_or("Unknown", |d| d.title.as_str());
                    println!("  {title} (score: {:.3})", citation.score);
                }
            }
            println!();

            let mut stream = response.stream;
            let mut stdout = std::io::stdout();
            while let Some(token) = stream.next().await {
                write!(stdout, "{}", token?)?;
                stdout.flush()?;
            }
            println!();
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", toml::to_string_pretty(&config)?);
            }
            ConfigAction::Init => {
                println!("{}", Config::sample_toml());
            }
            ConfigAction::Path => {
                if let Some(path) = Config::config_path() {
                    println!("{}", path.display());
                } else {
                    println!("Could not determine config directory");
                }
            }
        },
    }

    Ok(())
}
