//! AWS client bootstrapping
//!
//! This module provides the bootstrap flow:
//! - [`config::load_ambient`] - resolve ambient credentials and region
//! - [`sts::assume_role`] - exchange them for role-scoped credentials
//! - [`clients::new_client`] - build S3 / DynamoDB clients from either
//! - [`types`] - shared types (RoleIdentifier, ServiceKind, Configuration)

pub mod clients;
pub mod config;
pub mod sts;
pub mod types;

// Re-export commonly used types
pub use clients::{
    dynamodb_client, new_client, new_client_with, s3_client, ClientOptions, ServiceClient,
};
pub use config::{load_ambient, AmbientConfiguration};
pub use sts::{
    assume_role, assume_role_with, AssumeRoleOptions, ScopedConfiguration, StsBroker, TokenBroker,
};
pub use types::{Configuration, RoleIdentifier, ServiceKind};
