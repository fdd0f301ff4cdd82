use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, error};

use crate::context::ServerContext;

/// `GET /supplies`: the `food` + `medicine` sections as one JSON object.
pub async fn get_supplies(State(ctx): State<Arc<ServerContext>>) -> Response {
    debug!("The client asked supplies");
    match ctx.supplies.supplies_snapshot().await {
        Ok(view) => Json(view).into_response(),
        Err(e) => {
            error!("failed to read supplies: {e}");
            "Failed to retrieve state".into_response()
        }
    }
}
