mod config;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use summ_api::{AppState, AppStateInner};
use summ_db::Database;
use summ_llm::{
    InferenceModel, MetadataResolver, SummaryModel, Summarizer, YoutubeTranscripts, http_client,
};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "summ")]
#[command(about = "Summarize YouTube videos from their transcripts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web server (default)
    Serve,
    /// Clear the existing data and create new tables
    InitDb,
    /// Add a summary category
    AddCategory {
        /// Category name, e.g. "Sports"
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "summ=debug,summ_api=debug,summ_llm=debug,summ_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let db = Database::open(&config.db_path)
        .with_context(|| format!("opening database {}", config.db_path.display()))?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config, db).await,
        Commands::InitDb => {
            db.reset()?;
            println!("Initialized the database.");
            Ok(())
        }
        Commands::AddCategory { name } => {
            let name = name.trim();
            anyhow::ensure!(!name.is_empty(), "category name must not be empty");
            let id = db.create_category(name)?;
            println!("Added category {name} ({id}).");
            Ok(())
        }
    }
}

async fn serve(config: Config, db: Database) -> anyhow::Result<()> {
    let client = http_client(config.http_timeout).context("building HTTP client")?;

    let model: Option<Arc<dyn SummaryModel>> = match InferenceModel::load(&config.model()) {
        Ok(model) => {
            let model: Arc<dyn SummaryModel> = Arc::new(model);
            Some(model)
        }
        Err(e) => {
            error!("Summaries will be placeholders: {}", e);
            None
        }
    };

    let state: AppState = Arc::new(AppStateInner {
        db,
        session_secret: config.secret_key.clone(),
        metadata: Arc::new(MetadataResolver::new(client.clone())),
        transcripts: Arc::new(YoutubeTranscripts::new(client)),
        summarizer: Summarizer::new(model),
    });

    let app = summ_api::router(state).layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("summ listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Could not install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
