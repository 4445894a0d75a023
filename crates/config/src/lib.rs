use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Top-level application settings.
///
/// Layered from `config/default.toml` (optional), an optional
/// `config/{LECTIO_PROFILE}.toml`, and `LECTIO__`-prefixed environment
/// variables (`LECTIO__SERVER__PORT=8080`), later layers winning.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub queue: QueueSettings,
    #[serde(default)]
    pub evaluation: EvaluationSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_mongo_uri")]
    pub uri: String,
    #[serde(default = "default_db_name")]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Directory where submitted audio blobs are kept until their job
    /// reaches a terminal state.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueSettings {
    /// Seconds between worker polling cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Endpoint probed to confirm network reachability before claiming a job.
    #[serde(default = "default_probe_url")]
    pub connectivity_probe_url: String,
    /// Probe request timeout in seconds.
    #[serde(default = "default_probe_timeout")]
    pub connectivity_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationSettings {
    /// Whisper GGML model paths, tried in order until one loads.
    #[serde(default = "default_whisper_paths")]
    pub whisper_model_paths: Vec<String>,
    /// Directory holding per-language acoustic models (`<dir>/<lang>/model.onnx`).
    #[serde(default = "default_acoustic_dir")]
    pub acoustic_model_dir: String,
    /// Initial-WER threshold (percent) above which the acoustic fallback kicks in.
    #[serde(default = "default_fallback_wer")]
    pub fallback_wer_threshold: f64,
    /// Languages served by the acoustic fallback tier (ISO 639-1).
    #[serde(default = "default_fallback_languages")]
    pub fallback_languages: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_mongo_uri() -> String {
    "mongodb://localhost:27017".to_string()
}
fn default_db_name() -> String {
    "lectio".to_string()
}
fn default_upload_dir() -> String {
    "queued_audio".to_string()
}
fn default_poll_interval() -> u64 {
    30
}
fn default_probe_url() -> String {
    "https://www.google.com".to_string()
}
fn default_probe_timeout() -> u64 {
    5
}
fn default_whisper_paths() -> Vec<String> {
    vec![
        "models/ggml-large-v3.bin".to_string(),
        "models/ggml-medium.bin".to_string(),
    ]
}
fn default_acoustic_dir() -> String {
    "models/acoustic".to_string()
}
fn default_fallback_wer() -> f64 {
    50.0
}
fn default_fallback_languages() -> Vec<String> {
    ["te", "hi", "ta", "kn", "ml", "bn", "gu", "mr", "or", "pa"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            uri: default_mongo_uri(),
            name: default_db_name(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
        }
    }
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            connectivity_probe_url: default_probe_url(),
            connectivity_timeout_secs: default_probe_timeout(),
        }
    }
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            whisper_model_paths: default_whisper_paths(),
            acoustic_model_dir: default_acoustic_dir(),
            fallback_wer_threshold: default_fallback_wer(),
            fallback_languages: default_fallback_languages(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let profile = std::env::var("LECTIO_PROFILE").unwrap_or_else(|_| "default".to_string());

        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{profile}")).required(false))
            .add_source(Environment::with_prefix("LECTIO").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.queue.poll_interval_secs, 30);
        assert_eq!(settings.evaluation.fallback_wer_threshold, 50.0);
        assert!(settings.evaluation.fallback_languages.contains(&"hi".to_string()));
        assert_eq!(settings.server.port, 8080);
    }
}
