mod config;
mod error;
mod handlers;
mod middleware;
mod state;

use {
    axum::{
        extract::DefaultBodyLimit,
        routing::{get, post},
        Router,
    },
    clap::Parser,
    config::Arguments,
    observe::{metrics::LivenessChecking, shutdown::ShutdownController},
    state::{AppState, Liveness},
    std::sync::Arc,
};

#[tokio::main]
async fn main() {
    let args = match Arguments::try_parse() {
        Ok(args) => args,
        Err(err) => {
            err.print().ok();
            std::process::exit(2);
        }
    };

    observe::tracing::initialize(&args.logging.log_filter, args.logging.log_json);
    observe::panic_hook::install();
    observe::metrics::setup_registry(Some("aether_router".to_string()));
    tracing::info!(?args, "starting aether-router");

    if let Err(err) = run(args).await {
        tracing::error!(%err, "fatal init failure");
        std::process::exit(1);
    }
}

async fn run(args: Arguments) -> anyhow::Result<()> {
    let db = sqlx::postgres::PgPoolOptions::new()
        .max_connections(args.database.max_connections)
        .connect(&args.database.database_url)
        .await?;

    let pools = repository::pools::PoolRepository::new(db.clone());
    let transactions = repository::transactions::TransactionRepository::new(db.clone());
    let failed_refunds = repository::failed_refunds::FailedRefundRepository::new(db.clone());
    let users = repository::users::UserRepository::new(db.clone());

    let lanes = full_mesh();
    let bridges = bridge::BridgeAdapterSet::new(
        bridge::Ccip::new(lanes.clone(), &args.bridges.ccip_fee),
        bridge::Hyperlane::new(lanes, &args.bridges.hyperlane_fee),
    );
    let router = Arc::new(router::SmartRouter::new(db.clone(), pools.clone(), transactions, failed_refunds, bridges));

    let nonces = auth::NonceStore::new();
    let sweeper = auth::spawn_sweeper(nonces.clone(), auth::SWEEPER_INTERVAL);
    let auth_service = Arc::new(auth::AuthService::new(nonces, users));

    let hub = hub::Hub::spawn();
    let rate_limiter: Arc<dyn middleware::RateLimiter> = Arc::new(middleware::NoopRateLimiter);

    let state = AppState {
        router,
        pools,
        auth: auth_service,
        hub,
        rate_limiter,
    };

    let app = Router::new()
        .route("/auth/challenge", post(handlers::auth::challenge))
        .route("/auth/verify", post(handlers::auth::verify))
        .route("/pools", get(handlers::pools::list))
        .route("/pools/{poolId}", get(handlers::pools::get))
        .route("/quote", get(handlers::quote::optimal))
        .route("/quote/cross", get(handlers::quote::cross))
        .route("/swap", post(handlers::swap::execute))
        .route("/swap/cross", post(handlers::swap::execute_cross))
        .route("/ws", get(handlers::ws::upgrade))
        .layer(middleware::SecurityHeadersLayer)
        .layer(middleware::cors_layer(args.cors.cors_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(args.server.max_body_bytes))
        .with_state(state);

    let shutdown = ShutdownController::new_shutdown_on_signal();
    let liveness: Arc<dyn LivenessChecking> = Arc::new(Liveness::new(db));
    tokio::spawn(observe::metrics::serve_metrics(liveness, args.server.metrics_address));

    let listener = tokio::net::TcpListener::bind(args.server.bind_address).await?;
    tracing::info!(addr = %args.server.bind_address, "listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown.wait()).await?;

    sweeper.stop();
    Ok(())
}

/// Every well-known chain pairs with every other for both bridge providers.
/// A real deployment would read this from config per-lane; flattening it to
/// a full mesh keeps the binary usable without one (§6 "bridge endpoints").
fn full_mesh() -> Vec<(model::ChainId, model::ChainId)> {
    let chains = [
        model::ChainId::ETHEREUM,
        model::ChainId::ARBITRUM_ONE,
        model::ChainId::BASE,
        model::ChainId::GNOSIS,
        model::ChainId::OPTIMISM,
    ];
    chains
        .iter()
        .flat_map(|&src| chains.iter().filter(move |&&dst| dst != src).map(move |&dst| (src, dst)))
        .collect()
}
