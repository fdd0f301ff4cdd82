use tokio::sync::mpsc;

use crate::activity_log::ActivityLog;
use crate::config::Config;
use crate::dispatch::DispatchJob;
use crate::pipeline::ArtifactState;
use crate::services::{SessionRegistry, SupplyService};

/// Everything a handler needs, passed explicitly as shared state instead
/// of captured ambient globals.
pub struct ServerContext {
    pub config: Config,
    pub registry: SessionRegistry,
    pub supplies: SupplyService,
    pub artifact: ArtifactState,
    pub dispatch: mpsc::UnboundedSender<DispatchJob>,
    pub activity_log: ActivityLog,
}
