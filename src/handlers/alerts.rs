use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, error};

use crate::context::ServerContext;

/// `GET /alerts`: the `alerts` + `emergencies` sections as one JSON object.
pub async fn get_alerts(State(ctx): State<Arc<ServerContext>>) -> Response {
    debug!("The client asked alerts");
    match ctx.supplies.alerts_snapshot().await {
        Ok(view) => Json(view).into_response(),
        Err(e) => {
            error!("failed to read alerts: {e}");
            "Failed to retrieve state".into_response()
        }
    }
}
