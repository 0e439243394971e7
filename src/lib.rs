//! AWS client bootstrapper library
//!
//! Resolves ambient AWS credentials and region, optionally assumes an IAM
//! role through STS, and builds S3 / DynamoDB clients bound to either
//! configuration.

pub mod aws;
pub mod context;
pub mod error;
pub mod settings;

pub use context::{CancelHandle, Context};
pub use error::{AssumeRoleError, BootstrapError, ConfigurationError, Result};
pub use settings::Settings;
