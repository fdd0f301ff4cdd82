use rand::Rng;

use crate::config::Config;

const TOKEN_LEN: usize = 32;
const TOKEN_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate a session token: 32 symbols drawn uniformly from `0-9A-Z`.
///
/// Uniqueness is probabilistic, not enforced; the namespace is large
/// enough that collisions are not a practical concern.
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

/// A session is authorized iff the supplied credentials match the single
/// privileged identity from the configuration.
pub fn check_credentials(config: &Config, username: &str, password: &str) -> bool {
    username == config.privileged_username && password == config.privileged_password
}
