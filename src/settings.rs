//! Bootstrap settings
//!
//! Settings are read from the platform-specific app data folder:
//! - Linux: ~/.config/aws-bootstrap/settings.json
//! - Windows: %APPDATA%/aws-bootstrap/settings.json
//! - macOS: ~/Library/Application Support/aws-bootstrap/settings.json
//!
//! and then overridden by `AWS_BOOTSTRAP_*` environment variables.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PROFILE: &str = "AWS_BOOTSTRAP_PROFILE";
pub const ENV_REGION: &str = "AWS_BOOTSTRAP_REGION";
pub const ENV_ENDPOINT_URL: &str = "AWS_BOOTSTRAP_ENDPOINT_URL";
pub const ENV_ROLE_ARN: &str = "AWS_BOOTSTRAP_ROLE_ARN";
pub const ENV_SESSION_NAME: &str = "AWS_BOOTSTRAP_SESSION_NAME";
pub const ENV_EXTERNAL_ID: &str = "AWS_BOOTSTRAP_EXTERNAL_ID";
pub const ENV_SESSION_DURATION: &str = "AWS_BOOTSTRAP_SESSION_DURATION";
pub const ENV_TIMEOUT: &str = "AWS_BOOTSTRAP_TIMEOUT";
pub const ENV_FORCE_PATH_STYLE: &str = "AWS_BOOTSTRAP_FORCE_PATH_STYLE";

/// Settings for resolving configuration, assuming the role and building clients
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Settings {
    /// Named profile used for the ambient configuration
    #[serde(default)]
    pub profile: Option<String>,

    /// Region override; otherwise the default chain decides
    #[serde(default)]
    pub region: Option<String>,

    /// Endpoint override for every service (e.g. LocalStack)
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Role to assume for the DynamoDB client
    #[serde(default)]
    pub role_arn: Option<String>,

    #[serde(default)]
    pub session_name: Option<String>,

    #[serde(default)]
    pub external_id: Option<String>,

    /// Requested lifetime of the assumed-role session, in seconds
    #[serde(default)]
    pub session_duration_secs: Option<u64>,

    /// Deadline for the whole bootstrap run, in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Use path-style S3 addressing (needed by most S3-compatible endpoints)
    #[serde(default)]
    pub force_path_style: bool,
}

impl Settings {
    /// Load settings from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut settings = Self::load_from(&Self::settings_path()?)?;
        settings.apply_env(|key| env::var(key).ok())?;
        Ok(settings)
    }

    /// Load settings from `path`, returning defaults if the file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Settings file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;

        let settings: Settings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings from {:?}", path))?;

        tracing::info!(
            "Loaded settings: profile={:?}, region={:?}, role_arn={:?}",
            settings.profile,
            settings.region,
            settings.role_arn
        );

        Ok(settings)
    }

    /// Get the path to the settings file
    pub fn settings_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "github.n-orlov", "aws-bootstrap")
            .context("Failed to determine settings directory")?;

        Ok(proj_dirs.config_dir().join("settings.json"))
    }

    /// Override fields from environment variables looked up through `lookup`.
    ///
    /// Empty values are ignored. Numeric and boolean variables that fail to
    /// parse are errors naming the variable.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(profile) = var(ENV_PROFILE) {
            self.profile = Some(profile);
        }
        if let Some(region) = var(ENV_REGION) {
            self.region = Some(region);
        }
        if let Some(endpoint) = var(ENV_ENDPOINT_URL) {
            self.endpoint_url = Some(endpoint);
        }
        if let Some(role_arn) = var(ENV_ROLE_ARN) {
            self.role_arn = Some(role_arn);
        }
        if let Some(session_name) = var(ENV_SESSION_NAME) {
            self.session_name = Some(session_name);
        }
        if let Some(external_id) = var(ENV_EXTERNAL_ID) {
            self.external_id = Some(external_id);
        }
        if let Some(duration) = var(ENV_SESSION_DURATION) {
            self.session_duration_secs = Some(parse_secs(ENV_SESSION_DURATION, &duration)?);
        }
        if let Some(timeout) = var(ENV_TIMEOUT) {
            self.timeout_secs = Some(parse_secs(ENV_TIMEOUT, &timeout)?);
        }
        if let Some(flag) = var(ENV_FORCE_PATH_STYLE) {
            self.force_path_style = parse_bool(ENV_FORCE_PATH_STYLE, &flag)?;
        }

        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn session_duration(&self) -> Option<Duration> {
        self.session_duration_secs.map(Duration::from_secs)
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .with_context(|| format!("{} must be a valid number of seconds, got: '{}'", key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => anyhow::bail!("{} must be true or false, got: '{}'", key, value),
    }
}
