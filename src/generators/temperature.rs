use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde_json::json;
use tracing::{debug, error, info};

use crate::context::ServerContext;

/// The four monitored entry points.
const ENTRIES: [&str; 4] = ["north_entry", "east_entry", "west_entry", "south_entry"];

/// Body temperature at or above which an infection alert is raised.
const ALERT_THRESHOLD: f32 = 38.0;

/// Temperature alert loop: every 5-9 seconds sample a temperature in
/// [36.0, 40.0) at a random entry; at or above 38.0 raise an infection
/// alert and increment that entry's counter. Below the threshold nothing
/// is mutated. Runs for the lifetime of the process.
pub async fn run(ctx: Arc<ServerContext>) {
    loop {
        let secs = rand::rng().random_range(5..9);
        tokio::time::sleep(Duration::from_secs(secs)).await;

        let (temperature, entry) = {
            let mut rng = rand::rng();
            let temperature: f32 = rng.random_range(36.0..40.0);
            let entry = ENTRIES[rng.random_range(0..ENTRIES.len())];
            (temperature, entry)
        };

        if temperature < ALERT_THRESHOLD {
            debug!("{entry} temperature check: {temperature:.2}");
            continue;
        }

        let alert = format!("Alert of possible infection in {entry} , {temperature:.2}");
        info!("{alert}");
        ctx.activity_log.record(&alert, None);

        if let Err(e) = ctx
            .supplies
            .modify_alerts_and_emergencies(entry, &json!(1))
            .await
        {
            error!("failed to record {entry} alert: {e}");
        }
    }
}
