//! AWS client bootstrapper
//!
//! Creates an S3 client with the ambient identity, then assumes the
//! configured role and creates a DynamoDB client scoped to it.

use anyhow::Result;
use aws_bootstrap::aws::{
    self, AssumeRoleOptions, ClientOptions, Configuration, RoleIdentifier,
};
use aws_bootstrap::settings::ENV_ROLE_ARN;
use aws_bootstrap::{Context, Settings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting aws-bootstrap v{}", env!("CARGO_PKG_VERSION"));

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            println!("Error loading settings: {:#}", e);
            return Ok(());
        }
    };

    let ctx = match settings.timeout() {
        Some(timeout) => Context::background().with_timeout(timeout),
        None => Context::background(),
    };

    // Configuration for the ambient identity (execution role, env or profile)
    let ambient = match aws::load_ambient(&ctx, &settings).await {
        Ok(config) => config,
        Err(e) => {
            println!("Error creating AWS configuration for the ambient identity: {}", e);
            return Ok(());
        }
    };

    let client_options = ClientOptions {
        force_path_style: settings.force_path_style,
    };
    let s3_client = aws::s3_client(&ambient, client_options);
    println!("S3 client created successfully (region: {})", ambient.region());

    let Some(role_arn) = settings.role_arn.clone() else {
        println!("No role to assume; set {} to create the DynamoDB client", ENV_ROLE_ARN);
        return Ok(());
    };
    let role = RoleIdentifier::from(role_arn);

    let scoped = match aws::assume_role(
        &ctx,
        &ambient,
        &role,
        &AssumeRoleOptions::from_settings(&settings),
    )
    .await
    {
        Ok(config) => config,
        Err(e) => {
            println!("Error assuming role {}: {}", role, e);
            return Ok(());
        }
    };

    let dynamodb_client = aws::dynamodb_client(&scoped);
    println!(
        "DynamoDB client created successfully (role: {}, region: {})",
        scoped.role(),
        scoped.region()
    );

    // s3_client and dynamodb_client are ready to use from here
    tracing::debug!(?s3_client, ?dynamodb_client, "Clients ready");

    Ok(())
}
