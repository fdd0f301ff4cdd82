use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP control-plane port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Raw-socket data-plane port
    #[serde(default = "default_data_port")]
    pub data_port: u16,

    /// Path of the embedded key-value database
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Path of the append-only activity log
    #[serde(default = "default_activity_log_path")]
    pub activity_log_path: String,

    /// Input image fed to the artifact pipeline
    #[serde(default = "default_image_path")]
    pub image_path: String,

    /// Where the edge-detected image is written
    #[serde(default = "default_edge_image_path")]
    pub edge_image_path: String,

    /// Where the compressed artifact is written
    #[serde(default = "default_compressed_image_path")]
    pub compressed_image_path: String,

    /// Size in bytes of the chunks the artifact is split into
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    // The single privileged identity allowed to modify supplies
    #[serde(default = "default_privileged_username")]
    pub privileged_username: String,
    #[serde(default = "default_privileged_password")]
    pub privileged_password: String,

    // Canny edge-detection parameters
    #[serde(default = "default_canny_low")]
    pub canny_low_threshold: f32,
    #[serde(default = "default_canny_high")]
    pub canny_high_threshold: f32,
    #[serde(default = "default_canny_sigma")]
    pub canny_sigma: f32,
    #[serde(default = "default_canny_kernel_size")]
    pub canny_kernel_size: usize,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        // Load from environment variables using envy
        match envy::from_env::<Config>() {
            Ok(config) => {
                info!("✅ Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("❌ Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    /// Get the full control-plane address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the full data-plane address
    pub fn data_plane_address(&self) -> String {
        format!("{}:{}", self.host, self.data_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_port: default_data_port(),
            db_path: default_db_path(),
            activity_log_path: default_activity_log_path(),
            image_path: default_image_path(),
            edge_image_path: default_edge_image_path(),
            compressed_image_path: default_compressed_image_path(),
            chunk_size: default_chunk_size(),
            privileged_username: default_privileged_username(),
            privileged_password: default_privileged_password(),
            canny_low_threshold: default_canny_low(),
            canny_high_threshold: default_canny_high(),
            canny_sigma: default_canny_sigma(),
            canny_kernel_size: default_canny_kernel_size(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    EnvError(envy::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EnvError(e) => write!(f, "Environment variable error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_data_port() -> u16 {
    8081
}

fn default_db_path() -> String {
    "./database".to_string()
}

fn default_activity_log_path() -> String {
    "./var/log/refuge.log".to_string()
}

fn default_image_path() -> String {
    "./imgtrial/testImage.png".to_string()
}

fn default_edge_image_path() -> String {
    "./imgtrial/canny.png".to_string()
}

fn default_compressed_image_path() -> String {
    "./imgtrial/canny.tar.gz".to_string()
}

fn default_chunk_size() -> usize {
    1024 * 1024
}

fn default_privileged_username() -> String {
    "UBUNTU".to_string()
}

fn default_privileged_password() -> String {
    "UBUNTU".to_string()
}

fn default_canny_low() -> f32 {
    40.0
}

fn default_canny_high() -> f32 {
    80.0
}

fn default_canny_sigma() -> f32 {
    1.0
}

fn default_canny_kernel_size() -> usize {
    5
}
