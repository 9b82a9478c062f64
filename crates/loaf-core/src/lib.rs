pub mod app_config;
pub mod config;
pub mod events;
pub mod location;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, Viewbox};
pub use config::{load_app_config, load_app_config_from_env};
pub use events::{MapEvent, SourceTable, ThreadSelection};
pub use location::{
    coordinate_pair, display_address, normalize_location, normalize_location_str, Coordinates,
    LocationRecord,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown source table: {0}")]
    UnknownSourceTable(String),
}
