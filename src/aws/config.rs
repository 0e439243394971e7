//! Ambient configuration resolution
//!
//! Loads the default AWS configuration (environment variables, shared
//! profile files, ECS/EC2 instance metadata) and checks that it actually
//! carries a region and usable credentials.

use std::time::SystemTime;

use aws_config::{BehaviorVersion, ConfigLoader, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use tracing::{debug, info};

use crate::aws::types::Configuration;
use crate::context::Context;
use crate::error::{ConfigurationError, Result};
use crate::settings::Settings;

/// Configuration resolved from the hosting environment
#[derive(Debug, Clone)]
pub struct AmbientConfiguration {
    sdk_config: SdkConfig,
    region: String,
    credentials_expiry: Option<SystemTime>,
}

impl AmbientConfiguration {
    /// Validate an already-loaded `SdkConfig`.
    ///
    /// Fails when no region is set or the credentials provider cannot produce
    /// credentials. The provider is asked exactly once, under `ctx`.
    pub async fn from_sdk_config(ctx: &Context, sdk_config: SdkConfig) -> Result<Self> {
        let region = sdk_config
            .region()
            .map(|r| r.as_ref().trim().to_string())
            .filter(|r| !r.is_empty())
            .ok_or(ConfigurationError::MissingRegion)?;

        let provider = sdk_config
            .credentials_provider()
            .ok_or(ConfigurationError::NoCredentialsProvider)?;

        let credentials = ctx
            .run("resolve credentials", provider.provide_credentials())
            .await?
            .map_err(ConfigurationError::Credentials)?;

        debug!(
            "Resolved credentials (temporary: {}, expires: {:?})",
            credentials.session_token().is_some(),
            credentials.expiry()
        );

        Ok(Self {
            region,
            credentials_expiry: credentials.expiry(),
            sdk_config,
        })
    }

    /// Expiry of the credentials seen at load time; `None` for long-lived keys
    pub fn credentials_expiry(&self) -> Option<SystemTime> {
        self.credentials_expiry
    }
}

impl Configuration for AmbientConfiguration {
    fn sdk_config(&self) -> &SdkConfig {
        &self.sdk_config
    }

    fn region(&self) -> &str {
        &self.region
    }
}

/// Build the default config loader with the overrides from `settings`
pub fn loader(settings: &Settings) -> ConfigLoader {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(profile) = &settings.profile {
        loader = loader.profile_name(profile);
    }
    if let Some(region) = &settings.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint) = &settings.endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }

    loader
}

/// Load and validate the ambient configuration.
///
/// Errors are returned as-is; nothing is retried.
pub async fn load_ambient(ctx: &Context, settings: &Settings) -> Result<AmbientConfiguration> {
    info!(
        "Loading AWS configuration (profile: {})",
        settings.profile.as_deref().unwrap_or("default chain")
    );

    let sdk_config = ctx
        .run("load configuration", loader(settings).load())
        .await?;

    let ambient = AmbientConfiguration::from_sdk_config(ctx, sdk_config).await?;
    info!("Using region: {}", ambient.region());
    Ok(ambient)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::test_util::{sdk_config, static_credentials, FailingCredentials, PendingCredentials};
    use crate::error::BootstrapError;
    use aws_credential_types::provider::SharedCredentialsProvider;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_valid_environment_has_region() {
        let ctx = Context::background();
        let ambient = AmbientConfiguration::from_sdk_config(&ctx, sdk_config("eu-central-1").await)
            .await
            .unwrap();

        assert_eq!(ambient.region(), "eu-central-1");
        assert!(ambient.credentials_expiry().is_none());
    }

    #[tokio::test]
    async fn test_loading_twice_is_equivalent() {
        let ctx = Context::background();
        let settings = Settings {
            region: Some("us-east-1".to_string()),
            ..Default::default()
        };

        let mut loaded = Vec::new();
        for _ in 0..2 {
            let config = loader(&settings)
                .credentials_provider(static_credentials("AKIDAMBIENT"))
                .load()
                .await;
            loaded.push(AmbientConfiguration::from_sdk_config(&ctx, config).await.unwrap());
        }
        let (first, second) = (&loaded[0], &loaded[1]);
        assert_eq!(first.region(), "us-east-1");
        assert_eq!(first.region(), second.region());

        let a = first.sdk_config().credentials_provider().unwrap().provide_credentials().await.unwrap();
        let b = second.sdk_config().credentials_provider().unwrap().provide_credentials().await.unwrap();
        assert_eq!(a.access_key_id(), b.access_key_id());
    }

    #[tokio::test]
    async fn test_missing_region() {
        let config = sdk_config("us-east-1").await.into_builder().region(None::<Region>).build();

        let err = AmbientConfiguration::from_sdk_config(&Context::background(), config)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::Configuration(ConfigurationError::MissingRegion)
        ));
    }

    #[tokio::test]
    async fn test_blank_region_is_missing() {
        let config = sdk_config("   ").await;

        let err = AmbientConfiguration::from_sdk_config(&Context::background(), config)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::Configuration(ConfigurationError::MissingRegion)
        ));
    }

    #[tokio::test]
    async fn test_no_credentials_provider() {
        let config = SdkConfig::builder()
            .region(Region::new("us-east-1"))
            .behavior_version(BehaviorVersion::latest())
            .build();

        let err = AmbientConfiguration::from_sdk_config(&Context::background(), config)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::Configuration(ConfigurationError::NoCredentialsProvider)
        ));
    }

    #[tokio::test]
    async fn test_unusable_credentials() {
        let config = sdk_config("us-east-1")
            .await
            .into_builder()
            .credentials_provider(SharedCredentialsProvider::new(FailingCredentials))
            .build();

        let err = AmbientConfiguration::from_sdk_config(&Context::background(), config)
            .await
            .unwrap_err();
        match err {
            BootstrapError::Configuration(ConfigurationError::Credentials(_)) => {}
            other => panic!("expected credentials error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_credentials_resolution_respects_deadline() {
        let config = sdk_config("us-east-1")
            .await
            .into_builder()
            .credentials_provider(SharedCredentialsProvider::new(PendingCredentials))
            .build();
        let ctx = Context::background().with_timeout(std::time::Duration::from_millis(20));

        let err = AmbientConfiguration::from_sdk_config(&ctx, config).await.unwrap_err();
        assert!(err.is_cancellation());
    }

    #[tokio::test]
    async fn test_load_ambient_with_expired_context() {
        let ctx = Context::background().with_deadline(Instant::now());

        let err = load_ambient(&ctx, &Settings::default()).await.unwrap_err();
        match err {
            BootstrapError::DeadlineExceeded { operation } => {
                assert_eq!(operation, "load configuration")
            }
            other => panic!("expected deadline error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_ambient_with_cancelled_context() {
        let (ctx, handle) = Context::with_cancel();
        handle.cancel();

        let err = load_ambient(&ctx, &Settings::default()).await.unwrap_err();
        assert!(matches!(err, BootstrapError::Cancelled { .. }));
    }

    #[tokio::test]
    async fn test_loader_applies_region_override() {
        let settings = Settings {
            region: Some("ap-southeast-2".to_string()),
            endpoint_url: Some("http://localhost:4566".to_string()),
            ..Default::default()
        };

        let config = loader(&settings).load().await;
        assert_eq!(config.region().map(|r| r.as_ref()), Some("ap-southeast-2"));
        assert_eq!(config.endpoint_url(), Some("http://localhost:4566"));
    }
}
