//! Configuration provider using Figment

use crate::{error::ConfigError, types::ResolverConfig, ConfigResult};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Environment variable prefix for resolver settings, e.g. `SEISHDR_DISPLAY_WIDTH`.
pub const ENV_PREFIX: &str = "SEISHDR_";

/// Supported configuration file formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "toml" => Ok(ConfigFormat::Toml),
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "json" => Ok(ConfigFormat::Json),
            _ => Err(ConfigError::UnsupportedFormat { format: ext }),
        }
    }
}

/// Loads [`ResolverConfig`] with precedence (later overrides earlier):
/// 1. Default values
/// 2. An optional configuration file
/// 3. Environment variables with the `SEISHDR_` prefix
///
/// Nothing is cached; every call reads its sources again.
#[derive(Debug, Default)]
pub struct ConfigProvider {
    file: Option<PathBuf>,
}

impl ConfigProvider {
    pub fn new() -> Self {
        Self { file: None }
    }

    /// Layer a configuration file between the defaults and the environment.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Load and validate the resolver configuration.
    pub fn load(&self) -> ConfigResult<ResolverConfig> {
        let figment = self.build_figment()?;
        let config: ResolverConfig = figment.extract()?;
        config.validate()?;

        debug!(
            display_width = ?config.display_width,
            oversize = ?config.oversize,
            leap_seconds = config.leap_seconds.len(),
            "resolver configuration loaded"
        );
        Ok(config)
    }

    fn build_figment(&self) -> ConfigResult<Figment> {
        let mut figment = Figment::new().merge(Serialized::defaults(ResolverConfig::default()));

        if let Some(path) = &self.file {
            figment = figment.merge(self.load_config_file(path)?);
        }

        Ok(figment.merge(self.load_env_vars()))
    }

    fn load_config_file(&self, path: &Path) -> ConfigResult<Figment> {
        if !path.is_file() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let format = ConfigFormat::from_path(path)?;
        trace!("Loading config file: {} ({:?})", path.display(), format);

        Ok(match format {
            ConfigFormat::Toml => Figment::from(Toml::file(path)),
            ConfigFormat::Yaml => Figment::from(Yaml::file(path)),
            ConfigFormat::Json => Figment::from(Json::file(path)),
        })
    }

    fn load_env_vars(&self) -> Figment {
        Figment::new().merge(Env::prefixed(ENV_PREFIX).map(|key| key.as_str().to_lowercase().into()))
    }
}
