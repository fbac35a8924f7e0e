//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Speech collaborator settings.
    #[serde(default)]
    pub voice: VoiceConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "roomcast_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Speech collaborator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    /// Path to the whisper.cpp-style STT binary.
    #[serde(default = "default_stt_binary")]
    pub stt_binary: String,

    /// Path to the STT model file.
    #[serde(default = "default_stt_model")]
    pub stt_model: String,

    /// Path to the piper-style TTS binary.
    #[serde(default = "default_tts_binary")]
    pub tts_binary: String,

    /// Path to the TTS voice model. When unset, the system `espeak-ng`
    /// fallback is used instead of the TTS binary.
    #[serde(default)]
    pub tts_model: Option<String>,

    /// Bound on a single transcription call, in seconds.
    #[serde(default = "default_stt_timeout_secs")]
    pub stt_timeout_secs: u64,

    /// Bound on a single synthesis call, in seconds.
    #[serde(default = "default_tts_timeout_secs")]
    pub tts_timeout_secs: u64,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    5001
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_stt_binary() -> String {
    "whisper-cli".to_string()
}

fn default_stt_model() -> String {
    "models/ggml-base.en.bin".to_string()
}

fn default_tts_binary() -> String {
    "piper".to_string()
}

fn default_stt_timeout_secs() -> u64 {
    120
}

fn default_tts_timeout_secs() -> u64 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            stt_binary: default_stt_binary(),
            stt_model: default_stt_model(),
            tts_binary: default_tts_binary(),
            tts_model: None,
            stt_timeout_secs: default_stt_timeout_secs(),
            tts_timeout_secs: default_tts_timeout_secs(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `ROOMCAST_HOST` overrides `server.host`
/// - `ROOMCAST_PORT` overrides `server.port`
/// - `ROOMCAST_LOG_LEVEL` overrides `logging.level`
/// - `ROOMCAST_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `ROOMCAST_STT_BINARY` overrides `voice.stt_binary`
/// - `ROOMCAST_STT_MODEL` overrides `voice.stt_model`
/// - `ROOMCAST_TTS_BINARY` overrides `voice.tts_binary`
/// - `ROOMCAST_TTS_MODEL` overrides `voice.tts_model`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("ROOMCAST_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("ROOMCAST_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(level) = std::env::var("ROOMCAST_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("ROOMCAST_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Ok(binary) = std::env::var("ROOMCAST_STT_BINARY") {
        config.voice.stt_binary = binary;
    }
    if let Ok(model) = std::env::var("ROOMCAST_STT_MODEL") {
        config.voice.stt_model = model;
    }
    if let Ok(binary) = std::env::var("ROOMCAST_TTS_BINARY") {
        config.voice.tts_binary = binary;
    }
    if let Ok(model) = std::env::var("ROOMCAST_TTS_MODEL") {
        config.voice.tts_model = Some(model);
    }

    Ok(config)
}
