//! Error types for configuration loading and role assumption

use aws_credential_types::provider::error::CredentialsError;
use thiserror::Error;

/// Result type alias for bootstrap operations
pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Ambient configuration could not be resolved
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// No region from env, profile or instance metadata
    #[error("no AWS region could be resolved from the environment, profile or instance metadata")]
    MissingRegion,

    /// The default chain produced no credentials provider at all
    #[error("no AWS credentials provider is configured")]
    NoCredentialsProvider,

    /// The provider exists but could not produce credentials
    #[error("failed to resolve AWS credentials: {0}")]
    Credentials(#[source] CredentialsError),
}

/// The token exchange with STS failed
#[derive(Debug, Error)]
pub enum AssumeRoleError {
    /// STS refused the request or could not be reached
    #[error("STS rejected assume-role for {role}: {message}")]
    Rejected { role: String, message: String },

    /// STS answered without a credentials block
    #[error("STS returned no credentials for {role}")]
    MissingCredentials { role: String },

    /// The expiration timestamp is outside the representable range
    #[error("STS returned an invalid expiration for {role}")]
    InvalidExpiration { role: String },
}

/// Top-level error returned by every fallible bootstrap operation
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    AssumeRole(#[from] AssumeRoleError),

    /// The context was cancelled before `operation` completed
    #[error("{operation} was cancelled")]
    Cancelled { operation: &'static str },

    /// The context deadline passed before `operation` completed
    #[error("{operation} exceeded its deadline")]
    DeadlineExceeded { operation: &'static str },
}

impl BootstrapError {
    /// True for both explicit cancellation and an expired deadline
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            BootstrapError::Cancelled { .. } | BootstrapError::DeadlineExceeded { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_cancellation() {
        assert!(BootstrapError::Cancelled { operation: "load" }.is_cancellation());
        assert!(BootstrapError::DeadlineExceeded { operation: "load" }.is_cancellation());
        assert!(!BootstrapError::from(ConfigurationError::MissingRegion).is_cancellation());
    }

    #[test]
    fn test_error_messages() {
        let err = BootstrapError::from(AssumeRoleError::Rejected {
            role: "role/ReadOnly".to_string(),
            message: "AccessDenied".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "STS rejected assume-role for role/ReadOnly: AccessDenied"
        );

        let err = BootstrapError::from(ConfigurationError::MissingRegion);
        assert!(err.to_string().starts_with("no AWS region could be resolved"));

        let err = BootstrapError::DeadlineExceeded { operation: "assume role" };
        assert_eq!(err.to_string(), "assume role exceeded its deadline");
    }
}
