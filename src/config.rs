use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Artifact repository connection details, read from `ARTIFACTORY_*` env vars.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactoryConfig {
    pub host: String,
    pub user: String,
    pub token: String,
}

/// Git host connection details for release metadata lookups, read from
/// `GITLAB_*` env vars.
#[derive(Debug, Clone, Deserialize)]
pub struct GitlabConfig {
    pub host: String,
    pub token: String,
}

/// Process-wide configuration, loaded once at startup and injected into
/// every component. See spec section 6 for the full field list.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_path: String,

    pub aws_region: String,

    pub api_q_url: String,
    #[serde(default = "default_api_q_max_number_of_message")]
    pub api_q_max_number_of_message: i32,
    #[serde(default = "default_api_q_wait_time_second")]
    pub api_q_wait_time_second: i32,
    #[serde(default = "default_api_q_visibility_timeout")]
    pub api_q_visibility_timeout: i32,
    #[serde(default = "default_api_q_worker_timeout_seconds")]
    pub api_q_worker_timeout_seconds: u64,

    pub s3_bucket: String,

    #[serde(default = "default_http_callback_timeout_seconds")]
    pub http_callback_timeout_seconds: u64,

    #[serde(default = "default_cron_timeout_seconds")]
    pub cron_timeout_seconds: u64,
}

fn default_api_q_max_number_of_message() -> i32 {
    10
}

fn default_api_q_wait_time_second() -> i32 {
    20
}

fn default_api_q_visibility_timeout() -> i32 {
    300
}

fn default_api_q_worker_timeout_seconds() -> u64 {
    120
}

fn default_http_callback_timeout_seconds() -> u64 {
    10
}

fn default_cron_timeout_seconds() -> u64 {
    60
}

impl Config {
    /// Loads configuration from the process environment (optionally layered
    /// over a `.env` file for local development), failing fast if a
    /// required field is missing.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        envy::prefixed("EVE_")
            .from_env::<Config>()
            .map_err(|e| AppError::Config(e.to_string()))
    }
}

impl ArtifactoryConfig {
    pub fn from_env() -> AppResult<Self> {
        envy::prefixed("EVE_ARTIFACTORY_")
            .from_env::<ArtifactoryConfig>()
            .map_err(|e| AppError::Config(e.to_string()))
    }
}

/// Gitlab config is read separately since it's only consulted by release
/// metadata lookups, not every request path; kept out of the top-level
/// `Config` struct to avoid making it a hard startup requirement.
impl GitlabConfig {
    pub fn from_env() -> AppResult<Self> {
        envy::prefixed("EVE_GITLAB_")
            .from_env::<GitlabConfig>()
            .map_err(|e| AppError::Config(e.to_string()))
    }
}
