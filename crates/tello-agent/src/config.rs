//! Agent configuration from environment.

use std::env;
use std::net::IpAddr;

use tello_sdk::TelloConfig;
use thiserror::Error;

pub const REQUIRED_VARS: [&str; 2] = ["AZURE_OPENAI_ENDPOINT", "AZURE_OPENAI_API_KEY"];
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub openai_endpoint: String,
    pub openai_api_key: String,
    pub realtime_deployment: String,
    pub realtime_api_version: String,
    pub vision_endpoint: Option<String>,
    pub vision_key: Option<String>,
    pub vision_threshold: f64,
    pub tello_ip: IpAddr,
    pub tello_port: u16,
    pub tello_state_port: u16,
    pub tello_video_port: u16,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<String> = REQUIRED_VARS
            .iter()
            .filter(|key| get(**key).is_none())
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        Ok(Self {
            openai_endpoint: get("AZURE_OPENAI_ENDPOINT").unwrap_or_default(),
            openai_api_key: get("AZURE_OPENAI_API_KEY").unwrap_or_default(),
            realtime_deployment: get("AZURE_OPENAI_REALTIME_DEPLOYMENT")
                .unwrap_or_else(|| "gpt-4o-realtime-preview".to_string()),
            realtime_api_version: get("AZURE_OPENAI_REALTIME_API_VERSION")
                .unwrap_or_else(|| tello_realtime::client::DEFAULT_API_VERSION.to_string()),
            vision_endpoint: get("AZURE_AI_VISION_ENDPOINT"),
            vision_key: get("AZURE_AI_VISION_KEY"),
            vision_threshold: get("VISION_CONFIDENCE_THRESHOLD")
                .and_then(|s| s.parse().ok())
                .unwrap_or(tello_vision::analyzer::DEFAULT_CONFIDENCE_THRESHOLD),
            tello_ip: get("TELLO_IP")
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(|| TelloConfig::default().ip),
            tello_port: get("TELLO_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(8889),
            tello_state_port: get("TELLO_STATE_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(8890),
            tello_video_port: get("TELLO_VIDEO_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(11111),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }

    pub fn tello_config(&self) -> TelloConfig {
        TelloConfig {
            ip: self.tello_ip,
            command_port: self.tello_port,
            state_port: self.tello_state_port,
            video_port: self.tello_video_port,
            ..Default::default()
        }
    }
}
