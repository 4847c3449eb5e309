//! Configuration system
//!
//! Loads ~/.config/contributors/params.yaml with support for:
//! - Remembered credentials and organization
//! - Default fetch strategy
//! - Fetch tuning (API URL, concurrency cap, snapshot buffering)

mod loading_params;
pub mod validation;

pub use loading_params::{FetchConfig, LoadingParams};
pub use validation::{validate_params, validate_params_result, ValidationError};
