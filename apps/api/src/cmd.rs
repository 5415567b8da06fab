//! Command-line entry points: serve (default), migrate, rerank.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use uuid::Uuid;

use crate::config::{Config, DispatchMode};
use crate::db::{create_pool, run_migrations};
use crate::dispatch::{InlineDispatcher, SpawnDispatcher, TaskDispatcher};
use crate::ingest::Ingestor;
use crate::ranking::rerank::rerank_all;
use crate::ranking::scorer::{MatchScorer, TfidfScorer};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{ApplicationStore, PgApplicationStore};

#[derive(Parser)]
#[command(name = "api", about = "Applicant tracking and resume ranking service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server (the default).
    Serve,
    /// Apply pending database migrations.
    Migrate,
    /// Recompute match scores for one job, or for every job.
    Rerank {
        /// Limit the rerank to a single job.
        #[arg(long)]
        job_id: Option<Uuid>,
    },
}

pub async fn run(config: Config) -> Result<()> {
    match Cli::parse().command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Migrate => migrate(config).await,
        Command::Rerank { job_id } => rerank(config, job_id).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting Hireline API v{}", env!("CARGO_PKG_VERSION"));

    let pool = create_pool(&config.database_url).await?;

    let store: Arc<dyn ApplicationStore> =
        Arc::new(PgApplicationStore::new(pool, config.db_row_locking));
    let scorer: Arc<dyn MatchScorer> = Arc::new(TfidfScorer::new());
    let ingestor = Arc::new(Ingestor::new(
        store.clone(),
        scorer.clone(),
        config.upload_dir.clone(),
    ));
    let dispatcher: Arc<dyn TaskDispatcher> = match config.dispatch_mode {
        DispatchMode::Background => Arc::new(SpawnDispatcher::new(ingestor)),
        DispatchMode::Inline => Arc::new(InlineDispatcher::new(ingestor)),
    };
    info!("Task dispatch mode: {:?}", config.dispatch_mode);

    let state = AppState {
        store,
        scorer,
        dispatcher,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn migrate(config: Config) -> Result<()> {
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    println!("Migrations applied successfully");
    Ok(())
}

async fn rerank(config: Config, job_id: Option<Uuid>) -> Result<()> {
    let pool = create_pool(&config.database_url).await?;
    let store = PgApplicationStore::new(pool, config.db_row_locking);
    let scorer = TfidfScorer::new();

    let summaries = rerank_all(&store, &scorer, job_id).await?;
    for summary in &summaries {
        println!(
            "job {}: {} applications rescored",
            summary.job_id, summary.rescored
        );
    }
    println!("Reranked {} job(s)", summaries.len());
    Ok(())
}
