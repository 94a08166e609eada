//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::{AppConfig, EncoderConfig, StorageConfig};
use crate::domain::error::ConfigError;
use crate::domain::units::{ByteSize, Duration};

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS, VALID_LOG_FORMATS};
use super::presenter::Presenter;

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    validate_config_value(key, value)?;

    let mut config = store.load().await?;
    set_value(&mut config, key, value)?;
    store.save(&config).await?;

    presenter.success(&format!("{} = {}", key, display_value(key, value)));
    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let config = store.load().await?;

    match get_value(&config, key) {
        Some(v) => presenter.output(&display_value(key, &v)),
        None => presenter.output("(not set)"),
    }
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        let value = get_value(&config, key)
            .map(|v| display_value(key, &v))
            .unwrap_or_else(|| "(not set)".to_string());
        presenter.key_value(key, &value);
    }
    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        })
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: message.into(),
    }
}

/// Validate a config value based on key type
fn validate_config_value(key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "call_timeout" | "backoff" | "max_backoff" | "min_segment" | "encoder.timeout" => {
            value
                .parse::<Duration>()
                .map_err(|e| invalid(key, e.to_string()))?;
        }
        "max_payload" => {
            value
                .parse::<ByteSize>()
                .map_err(|e| invalid(key, e.to_string()))?;
        }
        "max_concurrency" | "max_attempts" => {
            parse_positive(value).map_err(|m| invalid(key, m))?;
        }
        "encoder.bitrate_kbps" => {
            let kbps = parse_positive(value).map_err(|m| invalid(key, m))?;
            if !(6..=510).contains(&kbps) {
                return Err(invalid(key, "Opus bitrate must be between 6 and 510 kbps"));
            }
        }
        "log_format" => {
            if !VALID_LOG_FORMATS.contains(&value.to_lowercase().as_str()) {
                return Err(invalid(
                    key,
                    format!(
                        "Invalid value '{}'. Valid options: {}",
                        value,
                        VALID_LOG_FORMATS.join(", ")
                    ),
                ));
            }
        }
        "api_base_url" => {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(invalid(key, "Value must be an http:// or https:// URL"));
            }
        }
        "model" | "encoder.ffmpeg" | "encoder.ffprobe" | "storage.library_dir"
        | "storage.transcript_dir" => {
            if value.trim().is_empty() {
                return Err(invalid(key, "Value must not be empty"));
            }
        }
        _ => {} // api_key accepts any string
    }
    Ok(())
}

fn parse_positive(value: &str) -> Result<u32, String> {
    match value.parse::<u32>() {
        Ok(0) | Err(_) => Err("Value must be a positive integer".to_string()),
        Ok(n) => Ok(n),
    }
}

/// Store an already validated value under `key`
fn set_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let text = Some(value.to_string());
    match key {
        "api_key" => config.api_key = text,
        "model" => config.model = text,
        "api_base_url" => config.api_base_url = text,
        "max_payload" => config.max_payload = text,
        "max_concurrency" => {
            config.max_concurrency =
                Some(parse_positive(value).map_err(|m| invalid(key, m))? as usize)
        }
        "max_attempts" => {
            config.max_attempts = Some(parse_positive(value).map_err(|m| invalid(key, m))?)
        }
        "call_timeout" => config.call_timeout = text,
        "backoff" => config.backoff = text,
        "max_backoff" => config.max_backoff = text,
        "min_segment" => config.min_segment = text,
        "log_format" => config.log_format = Some(value.to_lowercase()),
        "encoder.bitrate_kbps" => {
            encoder_mut(config).bitrate_kbps =
                Some(parse_positive(value).map_err(|m| invalid(key, m))?)
        }
        "encoder.ffmpeg" => encoder_mut(config).ffmpeg = text,
        "encoder.ffprobe" => encoder_mut(config).ffprobe = text,
        "encoder.timeout" => encoder_mut(config).timeout = text,
        "storage.library_dir" => storage_mut(config).library_dir = text,
        "storage.transcript_dir" => storage_mut(config).transcript_dir = text,
        _ => return Err(invalid(key, "Unknown key")),
    }
    Ok(())
}

fn get_value(config: &AppConfig, key: &str) -> Option<String> {
    let encoder = config.encoder.as_ref();
    let storage = config.storage.as_ref();
    match key {
        "api_key" => config.api_key.clone(),
        "model" => config.model.clone(),
        "api_base_url" => config.api_base_url.clone(),
        "max_payload" => config.max_payload.clone(),
        "max_concurrency" => config.max_concurrency.map(|n| n.to_string()),
        "max_attempts" => config.max_attempts.map(|n| n.to_string()),
        "call_timeout" => config.call_timeout.clone(),
        "backoff" => config.backoff.clone(),
        "max_backoff" => config.max_backoff.clone(),
        "min_segment" => config.min_segment.clone(),
        "log_format" => config.log_format.clone(),
        "encoder.bitrate_kbps" => encoder.and_then(|e| e.bitrate_kbps).map(|n| n.to_string()),
        "encoder.ffmpeg" => encoder.and_then(|e| e.ffmpeg.clone()),
        "encoder.ffprobe" => encoder.and_then(|e| e.ffprobe.clone()),
        "encoder.timeout" => encoder.and_then(|e| e.timeout.clone()),
        "storage.library_dir" => storage.and_then(|s| s.library_dir.clone()),
        "storage.transcript_dir" => storage.and_then(|s| s.transcript_dir.clone()),
        _ => None,
    }
}

fn encoder_mut(config: &mut AppConfig) -> &mut EncoderConfig {
    config.encoder.get_or_insert_with(EncoderConfig::default)
}

fn storage_mut(config: &mut AppConfig) -> &mut StorageConfig {
    config.storage.get_or_insert_with(StorageConfig::default)
}

fn display_value(key: &str, value: &str) -> String {
    if key == "api_key" {
        mask_api_key(value)
    } else {
        value.to_string()
    }
}

/// Mask API key for display (show first 4 and last 4 chars)
fn mask_api_key(key: &str) -> String {
    if key.len() <= 8 {
        "*".repeat(key.len())
    } else {
        format!("{}...{}", &key[..4], &key[key.len() - 4..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::XdgConfigStore;

    #[test]
    fn mask_api_key_long() {
        let masked = mask_api_key("abcdefghijklmnop");
        assert_eq!(masked, "abcd...mnop");
    }

    #[test]
    fn mask_api_key_short() {
        let masked = mask_api_key("short");
        assert_eq!(masked, "*****");
    }

    #[test]
    fn validate_durations_and_sizes() {
        assert!(validate_config_value("call_timeout", "90s").is_ok());
        assert!(validate_config_value("backoff", "250ms").is_ok());
        assert!(validate_config_value("encoder.timeout", "soon").is_err());
        assert!(validate_config_value("max_payload", "20MiB").is_ok());
        assert!(validate_config_value("max_payload", "0").is_err());
    }

    #[test]
    fn validate_integers() {
        assert!(validate_config_value("max_concurrency", "8").is_ok());
        assert!(validate_config_value("max_concurrency", "0").is_err());
        assert!(validate_config_value("max_attempts", "-1").is_err());
        assert!(validate_config_value("encoder.bitrate_kbps", "32").is_ok());
        assert!(validate_config_value("encoder.bitrate_kbps", "2").is_err());
    }

    #[test]
    fn validate_enumerations_and_urls() {
        assert!(validate_config_value("log_format", "JSON").is_ok());
        assert!(validate_config_value("log_format", "xml").is_err());
        assert!(validate_config_value("api_base_url", "http://localhost:8080").is_ok());
        assert!(validate_config_value("api_base_url", "localhost").is_err());
        assert!(validate_config_value("storage.library_dir", " ").is_err());
    }

    #[test]
    fn set_then_get_every_key() {
        let mut config = AppConfig::empty();
        let samples = [
            ("api_key", "secret-key-123456"),
            ("model", "gemini-2.5-flash"),
            ("api_base_url", "http://localhost:1"),
            ("max_payload", "5MiB"),
            ("max_concurrency", "3"),
            ("max_attempts", "6"),
            ("call_timeout", "1m"),
            ("backoff", "1s"),
            ("max_backoff", "10s"),
            ("min_segment", "2s"),
            ("log_format", "json"),
            ("encoder.bitrate_kbps", "24"),
            ("encoder.ffmpeg", "/opt/ffmpeg"),
            ("encoder.ffprobe", "/opt/ffprobe"),
            ("encoder.timeout", "5m"),
            ("storage.library_dir", "/srv/library"),
            ("storage.transcript_dir", "/srv/transcripts"),
        ];
        assert_eq!(samples.len(), VALID_CONFIG_KEYS.len());

        for (key, value) in samples {
            set_value(&mut config, key, value).unwrap();
        }
        for (key, value) in samples {
            assert_eq!(get_value(&config, key).as_deref(), Some(value), "{}", key);
        }
    }

    #[tokio::test]
    async fn set_persists_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("config.toml"));
        let presenter = Presenter::new();

        handle_set(&store, &presenter, "max_payload", "2MiB")
            .await
            .unwrap();
        let err = handle_set(&store, &presenter, "duration", "30s")
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigError::ValidationError { .. }));
        assert_eq!(
            store.load().await.unwrap().max_payload_or_default(),
            ByteSize::mib(2)
        );
    }
}
