//! Role assumption through AWS STS
//!
//! [`assume_role`] performs one `AssumeRole` exchange and wraps the returned
//! temporary credentials in a new configuration. Renewals after expiry are
//! left to the SDK's [`AssumeRoleProvider`].

use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use aws_config::sts::AssumeRoleProvider;
use aws_config::SdkConfig;
use aws_credential_types::provider::{future, ProvideCredentials, SharedCredentialsProvider};
use aws_credential_types::Credentials;
use aws_sdk_sts::error::DisplayErrorContext;
use aws_sdk_sts::Client as StsClient;
use tracing::{debug, info};

use crate::aws::config::AmbientConfiguration;
use crate::aws::types::{Configuration, RoleIdentifier};
use crate::context::Context;
use crate::error::{AssumeRoleError, Result};
use crate::settings::Settings;

/// Provider name attached to credentials obtained from the exchange
const PROVIDER_NAME: &str = "AssumeRole";

/// Optional parameters of the `AssumeRole` request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssumeRoleOptions {
    /// Defaults to `aws-bootstrap-<unix millis>`
    pub session_name: Option<String>,
    pub external_id: Option<String>,
    /// Requested session lifetime; STS applies its own default when unset
    pub duration: Option<Duration>,
}

impl AssumeRoleOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            session_name: settings.session_name.clone(),
            external_id: settings.external_id.clone(),
            duration: settings.session_duration(),
        }
    }

    fn resolved_session_name(&self) -> String {
        self.session_name
            .clone()
            .unwrap_or_else(default_session_name)
    }

    fn duration_seconds(&self) -> Option<i32> {
        self.duration
            .map(|d| i32::try_from(d.as_secs()).unwrap_or(i32::MAX))
    }
}

pub fn default_session_name() -> String {
    format!("aws-bootstrap-{}", chrono::Utc::now().timestamp_millis())
}

/// The service that trades the caller's identity for temporary role credentials
#[async_trait]
pub trait TokenBroker: Send + Sync {
    /// Perform a single exchange for `role`
    async fn exchange(
        &self,
        role: &RoleIdentifier,
        session_name: &str,
        options: &AssumeRoleOptions,
    ) -> std::result::Result<Credentials, AssumeRoleError>;

    /// Provider that renews credentials for `role` once the first ones expire
    async fn refresher(
        &self,
        role: &RoleIdentifier,
        session_name: &str,
        options: &AssumeRoleOptions,
    ) -> SharedCredentialsProvider;
}

/// [`TokenBroker`] backed by AWS STS
#[derive(Debug, Clone)]
pub struct StsBroker {
    client: StsClient,
    sdk_config: SdkConfig,
}

impl StsBroker {
    /// Create an STS client using the ambient identity
    pub fn new(ambient: &AmbientConfiguration) -> Self {
        Self {
            client: StsClient::new(ambient.sdk_config()),
            sdk_config: ambient.sdk_config().clone(),
        }
    }
}

#[async_trait]
impl TokenBroker for StsBroker {
    async fn exchange(
        &self,
        role: &RoleIdentifier,
        session_name: &str,
        options: &AssumeRoleOptions,
    ) -> std::result::Result<Credentials, AssumeRoleError> {
        let response = self
            .client
            .assume_role()
            .role_arn(role.as_str())
            .role_session_name(session_name)
            .set_external_id(options.external_id.clone())
            .set_duration_seconds(options.duration_seconds())
            .send()
            .await
            .map_err(|e| AssumeRoleError::Rejected {
                role: role.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let sts_creds = response
            .credentials()
            .ok_or_else(|| AssumeRoleError::MissingCredentials {
                role: role.to_string(),
            })?;

        let expiry = SystemTime::try_from(*sts_creds.expiration()).map_err(|_| {
            AssumeRoleError::InvalidExpiration {
                role: role.to_string(),
            }
        })?;

        Ok(Credentials::new(
            sts_creds.access_key_id(),
            sts_creds.secret_access_key(),
            Some(sts_creds.session_token().to_string()),
            Some(expiry),
            PROVIDER_NAME,
        ))
    }

    async fn refresher(
        &self,
        role: &RoleIdentifier,
        session_name: &str,
        options: &AssumeRoleOptions,
    ) -> SharedCredentialsProvider {
        let mut builder = AssumeRoleProvider::builder(role.as_str())
            .session_name(session_name)
            .configure(&self.sdk_config);
        if let Some(external_id) = &options.external_id {
            builder = builder.external_id(external_id);
        }
        if let Some(duration) = options.duration {
            builder = builder.session_length(duration);
        }
        SharedCredentialsProvider::new(builder.build().await)
    }
}

/// Serves the credentials from the initial exchange once, then defers to the refresher
#[derive(Debug)]
struct SeededCredentials {
    seed: Mutex<Option<Credentials>>,
    refresher: SharedCredentialsProvider,
}

impl SeededCredentials {
    fn new(seed: Credentials, refresher: SharedCredentialsProvider) -> Self {
        Self {
            seed: Mutex::new(Some(seed)),
            refresher,
        }
    }

    fn take_seed(&self) -> Option<Credentials> {
        let seed = self.seed.lock().ok()?.take()?;
        match seed.expiry() {
            Some(expiry) if expiry <= SystemTime::now() => None,
            _ => Some(seed),
        }
    }
}

impl ProvideCredentials for SeededCredentials {
    fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
    where
        Self: 'a,
    {
        match self.take_seed() {
            Some(seed) => future::ProvideCredentials::ready(Ok(seed)),
            None => self.refresher.provide_credentials(),
        }
    }
}

/// Configuration carrying temporary credentials for an assumed role
#[derive(Debug, Clone)]
pub struct ScopedConfiguration {
    sdk_config: SdkConfig,
    region: String,
    role: RoleIdentifier,
    expiry: Option<SystemTime>,
}

impl ScopedConfiguration {
    pub fn role(&self) -> &RoleIdentifier {
        &self.role
    }

    /// Expiry of the credentials from the initial exchange
    pub fn expiry(&self) -> Option<SystemTime> {
        self.expiry
    }
}

impl Configuration for ScopedConfiguration {
    fn sdk_config(&self) -> &SdkConfig {
        &self.sdk_config
    }

    fn region(&self) -> &str {
        &self.region
    }
}

/// Assume `role` with the ambient identity via STS
pub async fn assume_role(
    ctx: &Context,
    ambient: &AmbientConfiguration,
    role: &RoleIdentifier,
    options: &AssumeRoleOptions,
) -> Result<ScopedConfiguration> {
    let broker = StsBroker::new(ambient);
    assume_role_with(ctx, ambient, role, options, &broker).await
}

/// Assume `role` through an arbitrary [`TokenBroker`].
///
/// Issues exactly one exchange. On failure nothing is derived from
/// `ambient` and there is no fallback to its credentials.
pub async fn assume_role_with<B>(
    ctx: &Context,
    ambient: &AmbientConfiguration,
    role: &RoleIdentifier,
    options: &AssumeRoleOptions,
    broker: &B,
) -> Result<ScopedConfiguration>
where
    B: TokenBroker + ?Sized,
{
    let session_name = options.resolved_session_name();
    info!("Assuming role {} (session: {})", role, session_name);

    let credentials = ctx
        .run("assume role", broker.exchange(role, &session_name, options))
        .await??;
    let expiry = credentials.expiry();
    debug!("Assumed role {}, credentials expire at {:?}", role, expiry);

    let refresher = ctx
        .run("assume role", broker.refresher(role, &session_name, options))
        .await?;
    let provider = SeededCredentials::new(credentials, refresher);

    let sdk_config = ambient
        .sdk_config()
        .clone()
        .into_builder()
        .credentials_provider(SharedCredentialsProvider::new(provider))
        .build();

    Ok(ScopedConfiguration {
        sdk_config,
        region: ambient.region().to_string(),
        role: role.clone(),
        expiry,
    })
}
