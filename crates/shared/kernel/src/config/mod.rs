//! Load-time configuration: scalar settings from the environment and the error taxonomy
//! shared by every loading step.

mod error;
mod settings;

pub use error::{ConfigError, ConfigErrorExt, SecretResolutionError};
pub use settings::{
    AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, CloudCredentials, REQUIRED_VARS, SETTINGS_VARS,
    load_settings,
};
