use std::sync::Arc;

use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

/// Write half of a data-plane connection, shared between the registry and
/// the dispatch worker.
pub type SharedSocket = Arc<Mutex<OwnedWriteHalf>>;

/// A registered session, keyed by its token in the registry.
///
/// The socket is attached when the data-plane handshake completes for this
/// token and stays `None` until then.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub authorized: bool,
    pub socket: Option<SharedSocket>,
}

impl Session {
    pub fn new(username: String, authorized: bool) -> Self {
        Self {
            username,
            authorized,
            socket: None,
        }
    }
}
