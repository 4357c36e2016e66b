//! animeu-ranking entry point.
//!
//! `serve` (the default) starts the HTTP server. `recompute` and `seed` run
//! one lock-guarded job in the foreground and exit.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use clap::{Parser, Subcommand};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use animeu_ranking::api;
use animeu_ranking::app_state::AppState;
use animeu_ranking::config::RankingConfig;
use animeu_ranking::persistence::{CharacterCatalog, MemoryStore, PostgresStore, Stores};
use animeu_ranking::rating::EloParams;
use animeu_ranking::service::{
    ActionService, BattleSeeder, Job, JobReport, JobRunner, LockManager, RankingService,
    RecomputeJob, RecomputeOutcome,
};

#[derive(Debug, Parser)]
#[command(name = "animeu-ranking", version, about = "ELO rankings for character battles")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the HTTP server.
    Serve,
    /// Fold new games into a fresh snapshot and exit.
    Recompute,
    /// Generate synthetic battles from the character catalog and exit.
    Seed {
        /// Number of battles to generate.
        #[arg(long, default_value_t = 50_000)]
        battles: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = RankingConfig::from_env().context("invalid LISTEN_ADDR")?;
    init_tracing(config.log_json);

    // Build persistence layer
    let stores = build_stores(&config).await?;
    let seeder = match &config.character_data_file {
        Some(path) => {
            let catalog = CharacterCatalog::from_path(path)
                .await
                .with_context(|| format!("loading character catalog {}", path.display()))?;
            let seeder = BattleSeeder::new(
                Arc::new(catalog),
                Arc::clone(&stores.games),
                Arc::clone(&stores.accounts),
            )?
            .with_cadence(config.cadence());
            Some(Arc::new(seeder))
        }
        None => {
            tracing::info!("CHARACTER_DATA_FILE not set, battle seeding disabled");
            None
        }
    };

    // Build job layer
    let recompute = RecomputeJob::new(Arc::clone(&stores.games), Arc::clone(&stores.snapshots))
        .with_cadence(config.cadence());
    tracing::info!(fingerprint = %recompute.fingerprint(), "rating algorithm loaded");
    let runner = JobRunner::new(LockManager::new(Arc::clone(&stores.locks)), Arc::new(recompute))
        .with_seeder(seeder);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let runner = runner.with_grace(config.completion_grace());
            serve(config, stores, runner).await
        }
        Command::Recompute => run_once(&runner, Job::RecomputeRatings).await,
        Command::Seed { battles } => run_once(&runner, Job::SeedBattles { count: battles }).await,
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn build_stores(config: &RankingConfig) -> anyhow::Result<Stores> {
    if config.persistence_enabled {
        let store = PostgresStore::connect(config)
            .await
            .context("connecting to PostgreSQL")?;
        tracing::info!("using PostgreSQL persistence");
        Ok(Stores::from_backend(Arc::new(store)))
    } else {
        tracing::warn!("persistence disabled, using in-memory stores");
        Ok(Stores::from_backend(Arc::new(MemoryStore::new())))
    }
}

async fn serve(config: RankingConfig, stores: Stores, runner: JobRunner) -> anyhow::Result<()> {
    tracing::info!(addr = %config.listen_addr, "starting animeu-ranking");

    // Build service layer
    let actions = Arc::new(ActionService::new(
        runner,
        config.seed_default_battles,
        config.seed_max_battles,
    ));
    let rankings = Arc::new(RankingService::new(
        stores.games,
        stores.snapshots,
        stores.accounts,
        EloParams::default(),
    ));
    let app_state = AppState { actions, rankings };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(config.request_timeout()))
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn run_once(runner: &JobRunner, job: Job) -> anyhow::Result<()> {
    let report = runner
        .run_exclusive(job)
        .await
        .with_context(|| format!("{} job did not complete", job.lock_name()))?;
    match report {
        JobReport::Recomputed(RecomputeOutcome::NoGames) => {
            tracing::info!("no games recorded, nothing to rank");
        }
        JobReport::Recomputed(RecomputeOutcome::Updated {
            watermark,
            games_folded,
            full_rebuild,
            competitors,
        }) => {
            tracing::info!(
                %watermark,
                games = games_folded,
                full_rebuild,
                competitors,
                "ratings recomputed"
            );
        }
        JobReport::Seeded(outcome) => {
            tracing::info!(
                battles = outcome.battles,
                account = %outcome.account_id,
                "battles seeded"
            );
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
