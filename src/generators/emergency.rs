use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use rand::Rng;
use serde_json::json;
use tracing::{error, info};

use crate::activity_log::TIMESTAMP_FORMAT;
use crate::context::ServerContext;

/// The fixed set of emergency broadcasts.
const MESSAGES: [&str; 3] = ["Server failure", "Power outage", "Earthquake"];

/// Emergency notification loop: every 25-31 seconds pick one of the fixed
/// messages, log it, and overwrite `emergencies.last_event` and
/// `emergencies.date` in the shelter document. Runs for the lifetime of
/// the process.
pub async fn run(ctx: Arc<ServerContext>) {
    loop {
        let secs = rand::rng().random_range(25..31);
        tokio::time::sleep(Duration::from_secs(secs)).await;

        let message = {
            let mut rng = rand::rng();
            MESSAGES[rng.random_range(0..MESSAGES.len())]
        };

        info!("{message}");
        ctx.activity_log.record(message, None);

        let date = Local::now().format(TIMESTAMP_FORMAT).to_string();
        if let Err(e) = ctx
            .supplies
            .modify_alerts_and_emergencies("last_event", &json!(message))
            .await
        {
            error!("failed to record emergency event: {e}");
        }
        if let Err(e) = ctx
            .supplies
            .modify_alerts_and_emergencies("date", &json!(date))
            .await
        {
            error!("failed to record emergency date: {e}");
        }
    }
}
