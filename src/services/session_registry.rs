use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::models::session::{Session, SharedSocket};

/// Token-keyed map of live sessions.
///
/// The registry is reached from HTTP handler tasks and from the data-plane
/// accept loop, so every access goes through its internal lock. Lookups on
/// a missing token return `None` instead of failing; callers check the
/// option before use.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    users: Mutex<HashMap<String, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn users(&self) -> std::sync::MutexGuard<'_, HashMap<String, Session>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a session, overwriting any previous session for the token.
    pub fn add_user(&self, username: &str, token: &str, authorized: bool) {
        self.users()
            .insert(token.to_string(), Session::new(username.to_string(), authorized));
    }

    pub fn user_from_token(&self, token: &str) -> Option<String> {
        self.users().get(token).map(|s| s.username.clone())
    }

    /// Linear scan; first match wins when a username was registered twice.
    pub fn token_from_user(&self, username: &str) -> Option<String> {
        self.users()
            .iter()
            .find(|(_, s)| s.username == username)
            .map(|(token, _)| token.clone())
    }

    pub fn is_authorized(&self, token: &str) -> Option<bool> {
        self.users().get(token).map(|s| s.authorized)
    }

    pub fn socket_from_token(&self, token: &str) -> Option<SharedSocket> {
        self.users().get(token).and_then(|s| s.socket.clone())
    }

    /// Attach a data-plane socket to the session; no-op when the token is
    /// unknown. The last registrant for a token wins.
    pub fn update_socket(&self, token: &str, socket: SharedSocket) {
        if let Some(session) = self.users().get_mut(token) {
            session.socket = Some(socket);
        }
    }

    pub fn remove_user(&self, token: &str) {
        self.users().remove(token);
    }
}
