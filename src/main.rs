use clap::Parser;
use stock_history_api::build_app;
use stock_history_api::config::Args;
use stock_history_api::rate_limit::idle_sweeper;
use stock_history_api::state::AppState;
use stock_history_api::store::StockStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // parse cli arguments
    let args = Args::parse();

    let store = StockStore::load(&args.data_dir)?;
    info!(
        data_dir = %args.data_dir.display(),
        companies = store.company_count(),
        records = store.record_count(),
        "stock data loaded"
    );

    let gate_config = args.gate_config();
    let state = AppState::new(store, args.api_key.as_str(), gate_config)
        .with_allowed_origins(args.allowed_origins.clone());

    // spawn the idle window sweeper
    tokio::spawn(idle_sweeper(
        state.gate.clone(),
        state.clock.clone(),
        args.sweep_interval(),
    ));

    let app = build_app(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        %addr,
        limit = gate_config.limit,
        window = ?gate_config.window,
        idle_ttl = ?gate_config.idle_ttl,
        allowed_origins = ?args.allowed_origins,
        "stock history api listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
