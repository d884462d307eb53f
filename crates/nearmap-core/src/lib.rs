pub mod app_config;
pub mod classify;
pub mod config;
pub mod geo;
pub mod types;

pub use app_config::{AppConfig, DefaultLocationConfig, Environment, OverlayPolicy};
pub use classify::{
    classify, ClassifiedError, ErrorCategory, ErrorOrigin, FailureCode, RecoveryAction, UiRegion,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::{Bounds, Coordinate, CoordinateError};
pub use types::{
    Business, BusinessLocation, Category, Hours, Location, LocationSource, MarkerIcon,
    Photo,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
