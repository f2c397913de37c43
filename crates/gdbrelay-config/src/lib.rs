//! gdbrelay-config: layered TOML configuration for gdbrelay.

pub mod config;
pub mod error;
pub mod load;
pub mod merge;
pub mod validate;

pub use config::{Config, DebuggerConfig, LogConfig, LogLevel, SessionConfig};
pub use error::ConfigError;
pub use load::{default_config_dir, load_config, load_from_str};
