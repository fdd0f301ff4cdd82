use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use refuge_server::activity_log::ActivityLog;
use refuge_server::config::Config;
use refuge_server::context::ServerContext;
use refuge_server::db::KvStore;
use refuge_server::pipeline::ArtifactState;
use refuge_server::routes::create_routes;
use refuge_server::services::{SessionRegistry, SupplyService};
use refuge_server::{dataplane, dispatch, generators, pipeline};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "refuge_server=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting server...");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });

    // Open the store and seed the shelter document
    let store = KvStore::open(&config.db_path).unwrap_or_else(|e| {
        error!("Failed to open key-value store at {}: {e}", config.db_path);
        std::process::exit(1);
    });
    let supplies = SupplyService::new(store).unwrap_or_else(|e| {
        error!("Failed to seed the shelter document: {e}");
        std::process::exit(1);
    });

    let activity_log = ActivityLog::create(&config.activity_log_path).unwrap_or_else(|e| {
        error!(
            "Failed to open activity log at {}: {e}",
            config.activity_log_path
        );
        std::process::exit(1);
    });

    let (dispatch_tx, dispatch_rx) = dispatch::channel();
    let ctx = Arc::new(ServerContext {
        config: config.clone(),
        registry: SessionRegistry::new(),
        supplies,
        artifact: ArtifactState::new(),
        dispatch: dispatch_tx,
        activity_log,
    });

    // Background tasks: artifact pipeline (runs once), the two generators,
    // the data-plane accept loop and the dispatch worker.
    tokio::spawn(pipeline::run(ctx.clone()));
    tokio::spawn(generators::temperature::run(ctx.clone()));
    tokio::spawn(generators::emergency::run(ctx.clone()));
    tokio::spawn(dispatch::run_worker(ctx.clone(), dispatch_rx));
    {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            if let Err(e) = dataplane::run(ctx).await {
                error!("Data-plane server error: {e}");
            }
        });
    }

    let app = create_routes(ctx).layer(TraceLayer::new_for_http());

    // Start the HTTP/API server
    let listener = tokio::net::TcpListener::bind(config.server_address())
        .await
        .unwrap_or_else(|e| {
            error!("Failed to bind to {}: {e}", config.server_address());
            std::process::exit(1);
        });

    info!("🚀 Server running on http://{}", config.server_address());
    info!("📡 Data plane available on {}", config.data_plane_address());

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                error!("Server error: {e}");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!(" Ending program");
        }
    }
}
