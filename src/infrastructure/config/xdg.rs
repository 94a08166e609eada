//! TOML config file under the XDG config directory

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

const APP_DIR: &str = "podscribe";
const FILE_NAME: &str = "config.toml";

/// Config store at `$XDG_CONFIG_HOME/podscribe/config.toml`
pub struct XdgConfigStore {
    path: PathBuf,
}

impl XdgConfigStore {
    pub fn new() -> Self {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("~/.config"));
        Self::with_path(base.join(APP_DIR).join(FILE_NAME))
    }

    /// Store backed by an explicit file, e.g. in tests
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn decode(content: &str) -> Result<AppConfig, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn encode(config: &AppConfig) -> Result<String, ConfigError> {
        toml::to_string_pretty(config).map_err(|e| ConfigError::WriteError(e.to_string()))
    }

    fn staging_path(&self) -> PathBuf {
        self.path.with_extension("toml.tmp")
    }
}

impl Default for XdgConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

fn write_error(path: &Path, e: std::io::Error) -> ConfigError {
    ConfigError::WriteError(format!("{}: {}", path.display(), e))
}

/// The file may hold an API key; keep it owner-only.
#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[async_trait]
impl ConfigStore for XdgConfigStore {
    async fn load(&self) -> Result<AppConfig, ConfigError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Self::decode(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(AppConfig::empty()),
            Err(e) => Err(ConfigError::ReadError(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Write to a sibling file and rename it into place so a crash never
    /// leaves a truncated config behind.
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let content = Self::encode(config)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| write_error(parent, e))?;
        }

        let staging = self.staging_path();
        fs::write(&staging, content)
            .await
            .map_err(|e| write_error(&staging, e))?;
        restrict_permissions(&staging)
            .await
            .map_err(|e| write_error(&staging, e))?;
        fs::rename(&staging, &self.path)
            .await
            .map_err(|e| write_error(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), "Saved configuration");
        Ok(())
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    async fn init(&self) -> Result<(), ConfigError> {
        if self.exists() {
            return Err(ConfigError::AlreadyExists(self.path.display().to_string()));
        }
        self.save(&AppConfig::defaults()).await
    }
}
