//! Resolver configuration for seishdr using figment
//!
//! # Sources
//!
//! Precedence, lowest first: built-in defaults, an optional TOML/YAML/JSON
//! file, then `SEISHDR_*` environment variables.
//!
//! ```toml
//! display_width = 16
//! oversize = "marker"
//! oversize_marker = "<oversized>"
//!
//! [[leap_seconds]]
//! date = "2017-01-01"
//! tai_minus_utc = 37
//! ```
//!
//! ```no_run
//! use seishdr_config::ConfigProvider;
//!
//! let config = ConfigProvider::new().with_file("seishdr.toml").load()?;
//! println!("width: {:?}", config.display_width);
//! # Ok::<(), seishdr_config::ConfigError>(())
//! ```

pub mod error;
pub mod provider;
pub mod types;

pub use error::ConfigError;
pub use provider::{ConfigFormat, ConfigProvider, ENV_PREFIX};
pub use types::{LeapSecondEntry, OversizePolicy, ResolverConfig, LEAP_DATE_FORMAT};

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load configuration from defaults and the environment only.
pub fn load_configuration() -> ConfigResult<ResolverConfig> {
    ConfigProvider::new().load()
}
