use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::context::ServerContext;
use crate::handlers::{get_alerts, get_supplies, handle_post};

/// Create the control-plane routes
pub fn create_routes(ctx: Arc<ServerContext>) -> Router {
    Router::new()
        .route("/", post(handle_post))
        .route("/supplies", get(get_supplies))
        .route("/alerts", get(get_alerts))
        .with_state(ctx)
}
