//! Service client construction
//!
//! Building a client only wires the configuration into the SDK; no request
//! is sent until the client is used.

use crate::aws::types::{Configuration, ServiceKind};

/// Per-client options not carried by the shared configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientOptions {
    /// Path-style S3 addressing, for S3-compatible endpoints
    pub force_path_style: bool,
}

/// A client bound to exactly one configuration
#[derive(Debug, Clone)]
pub enum ServiceClient {
    ObjectStorage(aws_sdk_s3::Client),
    KeyValueStore(aws_sdk_dynamodb::Client),
}

impl ServiceClient {
    pub fn kind(&self) -> ServiceKind {
        match self {
            ServiceClient::ObjectStorage(_) => ServiceKind::ObjectStorage,
            ServiceClient::KeyValueStore(_) => ServiceKind::KeyValueStore,
        }
    }

    /// Region the client will send requests to
    pub fn region(&self) -> Option<&str> {
        let region = match self {
            ServiceClient::ObjectStorage(client) => client.config().region(),
            ServiceClient::KeyValueStore(client) => client.config().region(),
        };
        region.map(|r| r.as_ref())
    }

    pub fn as_s3(&self) -> Option<&aws_sdk_s3::Client> {
        match self {
            ServiceClient::ObjectStorage(client) => Some(client),
            _ => None,
        }
    }

    pub fn as_dynamodb(&self) -> Option<&aws_sdk_dynamodb::Client> {
        match self {
            ServiceClient::KeyValueStore(client) => Some(client),
            _ => None,
        }
    }
}

/// Build a client for `kind` with default options
pub fn new_client(config: &impl Configuration, kind: ServiceKind) -> ServiceClient {
    new_client_with(config, kind, ClientOptions::default())
}

pub fn new_client_with(
    config: &impl Configuration,
    kind: ServiceKind,
    options: ClientOptions,
) -> ServiceClient {
    tracing::debug!("Creating {} client in {}", kind.as_str(), config.region());
    match kind {
        ServiceKind::ObjectStorage => ServiceClient::ObjectStorage(s3_client(config, options)),
        ServiceKind::KeyValueStore => ServiceClient::KeyValueStore(dynamodb_client(config)),
    }
}

/// Create an S3 client using the given configuration
pub fn s3_client(config: &impl Configuration, options: ClientOptions) -> aws_sdk_s3::Client {
    let s3_config = aws_sdk_s3::config::Builder::from(config.sdk_config())
        .force_path_style(options.force_path_style)
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}

/// Create a DynamoDB client using the given configuration
pub fn dynamodb_client(config: &impl Configuration) -> aws_sdk_dynamodb::Client {
    aws_sdk_dynamodb::Client::new(config.sdk_config())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::test_util::ambient;

    #[tokio::test]
    async fn test_new_client_object_storage() {
        let ambient = ambient("eu-west-1").await;

        let client = new_client(&ambient, ServiceKind::ObjectStorage);
        assert_eq!(client.kind(), ServiceKind::ObjectStorage);
        assert_eq!(client.region(), Some("eu-west-1"));
        assert!(client.as_s3().is_some());
        assert!(client.as_dynamodb().is_none());
    }

    #[tokio::test]
    async fn test_new_client_key_value_store() {
        let ambient = ambient("ap-northeast-1").await;

        let client = new_client(&ambient, ServiceKind::KeyValueStore);
        assert_eq!(client.kind(), ServiceKind::KeyValueStore);
        assert_eq!(client.region(), Some("ap-northeast-1"));
        assert!(client.as_dynamodb().is_some());
        assert!(client.as_s3().is_none());
    }

    #[tokio::test]
    async fn test_force_path_style() {
        let ambient = ambient("us-east-1").await;

        let options = ClientOptions { force_path_style: true };
        let client = new_client_with(&ambient, ServiceKind::ObjectStorage, options);
        assert_eq!(client.kind(), ServiceKind::ObjectStorage);
        assert_eq!(client.region(), Some("us-east-1"));
    }

    #[tokio::test]
    async fn test_clients_are_independent_handles() {
        let ambient = ambient("us-east-1").await;

        let first = new_client(&ambient, ServiceKind::ObjectStorage);
        let second = first.clone();
        assert_eq!(first.region(), second.region());
        assert_eq!(
            dynamodb_client(&ambient).config().region().map(|r| r.as_ref()),
            Some("us-east-1")
        );
    }
}
