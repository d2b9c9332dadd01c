//! Telemetry-ingest-and-alert engine process entry point: tracing setup,
//! config load, pool/cache bootstrap, migration run, background task
//! spawn (flow collector, scheduler), and the axum surface named in §6.
//! Mirrors `ferrex-server::main`'s bootstrap shape.

mod errors;
mod handlers;
mod routes;
mod state;

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use netmon_config::Config;
use netmon_core::flow::{backfill_if_needed, FlowCollector};
use netmon_core::scheduler::SchedulerRunner;
use netmon_core::store::cache::RedisCache;
use netmon_core::store::{migrations, Store};

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "netmon_server=info,netmon_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!("configuration loaded");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database.url)
        .await?;
    info!("connected to postgres");

    migrations::run(&pool).await?;
    info!("migrations complete");

    let cache = RedisCache::new(&config.redis.url).await?;
    info!("connected to redis");

    let store = Arc::new(Store::new(pool, cache));

    if let Err(err) = backfill_if_needed(&store, config.flow.rollup_backfill_days).await {
        warn!(%err, "flow rollup backfill failed; continuing without it");
    }

    let http = reqwest::Client::builder()
        .danger_accept_invalid_certs(!config.device.ssl_verify)
        .build()?;

    let flow_collector = Arc::new(FlowCollector::new(store.clone(), config.flow.clone()));
    let flow_task = tokio::spawn(flow_collector.clone().run());

    let scheduler = Arc::new(SchedulerRunner::new(
        store.clone(),
        http.clone(),
        config.smtp.clone(),
        config.snmp.clone(),
        config.ping.clone(),
        config.flow.retention_days,
    )?);
    let scheduler_task = tokio::spawn(scheduler.clone().run());

    let state = AppState {
        store,
        http,
        snmp_timeout: Duration::from_secs(config.snmp.timeout_seconds),
    };

    let app = create_app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], 8080));
    info!(%addr, "starting netmon server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    scheduler.stop();
    flow_collector.shutdown_token().cancel();
    let _ = tokio::join!(flow_task, scheduler_task);

    Ok(())
}

fn create_app(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/health", axum::routing::get(health_handler))
        .merge(routes::api_router(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health_handler() -> &'static str {
    "ok"
}
