//! Shared AWS bootstrap types

use std::fmt;

use aws_config::SdkConfig;

/// Opaque name of the role to assume, usually an IAM role ARN.
///
/// The value is passed to STS as-is; malformed identifiers are rejected there.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoleIdentifier(String);

impl RoleIdentifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoleIdentifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RoleIdentifier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Which service a client is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// Amazon S3
    ObjectStorage,
    /// Amazon DynamoDB
    KeyValueStore,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::ObjectStorage => "S3",
            ServiceKind::KeyValueStore => "DynamoDB",
        }
    }
}

/// A resolved configuration that service clients can be built from
pub trait Configuration {
    fn sdk_config(&self) -> &SdkConfig;

    /// Region the configuration resolved to; never empty once loaded
    fn region(&self) -> &str;
}
