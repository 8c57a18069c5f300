/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use serde::Deserialize;
use tokio::fs;

use crate::config::Builder;
use crate::error;
use crate::store::S3ObjectStore;
use crate::types::{Backoff, ConcurrencySetting, FailedTransferPolicy};
use crate::Config;

/// Config file read when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "./config.yaml";

/// Region used when a store section only names an endpoint URL
pub const DEFAULT_REGION: &str = "us-east-1";

const CREDENTIALS_PROVIDER_NAME: &str = "bucket-migrator-config-file";

const DEFAULT_FIXED_BACKOFF_MS: u64 = 1_000;
const DEFAULT_INITIAL_BACKOFF_MS: u64 = 100;
const DEFAULT_MAX_BACKOFF_MS: u64 = 20_000;

/// Serialization format of a config file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// YAML (the default for any extension other than `.json`)
    Yaml,
    /// JSON
    Json,
}

impl FileFormat {
    /// Pick the format from the file extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => FileFormat::Json,
            _ => FileFormat::Yaml,
        }
    }
}

/// Contents of a migration config file.
///
/// ```yaml
/// oss:
///   endpoint: oss-cn-hangzhou.aliyuncs.com
///   accesskeyid: <id>
///   accesskeysecret: <secret>
///   bucketname: source-bucket
///   token: ""
/// s3:
///   endpoint: us-west-2
///   accesskeyid: <id>
///   accesskeysecret: <secret>
///   bucketname: destination-bucket
///   token: ""
/// migration:
///   concurrency: 16
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// The store objects are migrated from
    #[serde(rename = "oss", alias = "source")]
    pub source: StoreConfig,

    /// The store objects are migrated to
    #[serde(rename = "s3", alias = "destination")]
    pub destination: StoreConfig,

    /// Optional tuning of the migration
    #[serde(default)]
    pub migration: MigrationSettings,
}

impl ConfigFile {
    /// Read and validate the config file at `path`
    pub async fn read(path: impl AsRef<Path>) -> Result<Self, error::Error> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).await.map_err(|err| {
            error::Error::new(
                error::ErrorKind::IOError,
                format!("failed to read config file {}: {err}", path.display()),
            )
        })?;
        Self::parse(&contents, FileFormat::from_path(path))
    }

    /// Parse and validate config file contents
    pub fn parse(contents: &str, format: FileFormat) -> Result<Self, error::Error> {
        let file: ConfigFile = match format {
            FileFormat::Yaml => serde_yaml::from_str(contents)?,
            FileFormat::Json => serde_json::from_str(contents)?,
        };
        file.source.validate("oss")?;
        file.destination.validate("s3")?;
        file.migration.validate()?;
        Ok(file)
    }
}

/// Connection settings of one store
#[derive(Clone, Deserialize)]
pub struct StoreConfig {
    /// Endpoint URL or host of the service. A value without a scheme or dot names a region.
    #[serde(default)]
    pub endpoint: String,

    /// Access key id
    #[serde(alias = "accessKeyId", alias = "access_key_id")]
    pub accesskeyid: String,

    /// Secret access key
    #[serde(alias = "accessKeySecret", alias = "access_key_secret")]
    pub accesskeysecret: String,

    /// Bucket name
    #[serde(alias = "bucketName", alias = "bucket_name", alias = "bucket")]
    pub bucketname: String,

    /// Optional session token. Empty means none.
    #[serde(default)]
    pub token: Option<String>,

    /// Explicit signing region
    #[serde(default)]
    pub region: Option<String>,

    /// Address buckets by path instead of by virtual host
    #[serde(default, alias = "forcePathStyle")]
    pub force_path_style: bool,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("endpoint", &self.endpoint)
            .field("accesskeyid", &self.accesskeyid)
            .field("accesskeysecret", &"** redacted **")
            .field("bucketname", &self.bucketname)
            .field("token", &self.token.as_ref().map(|_| "** redacted **"))
            .field("region", &self.region)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

impl StoreConfig {
    fn validate(&self, section: &str) -> Result<(), error::Error> {
        let required = [
            ("bucketname", &self.bucketname),
            ("accesskeyid", &self.accesskeyid),
            ("accesskeysecret", &self.accesskeysecret),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(error::config_invalid(format!(
                    "`{section}.{field}` must not be empty"
                )));
            }
        }
        Ok(())
    }

    /// The endpoint URL to send requests to, if the endpoint names one.
    ///
    /// A host without a scheme is addressed over `http://`.
    pub fn endpoint_url(&self) -> Option<String> {
        let endpoint = self.endpoint.trim();
        if endpoint.contains("://") {
            Some(endpoint.to_owned())
        } else if endpoint.contains('.') {
            Some(format!("http://{endpoint}"))
        } else {
            None
        }
    }

    /// The signing region
    pub fn region(&self) -> String {
        if let Some(region) = self.region.as_deref().filter(|r| !r.trim().is_empty()) {
            return region.trim().to_owned();
        }
        let endpoint = self.endpoint.trim();
        if self.endpoint_url().is_none() && !endpoint.is_empty() {
            endpoint.to_owned()
        } else {
            DEFAULT_REGION.to_owned()
        }
    }

    /// The session token, if any
    pub fn session_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    /// Build an S3 API store for this section
    pub async fn connect(&self) -> Result<S3ObjectStore, error::Error> {
        let credentials = Credentials::new(
            self.accesskeyid.trim(),
            self.accesskeysecret.trim(),
            self.session_token().map(str::to_owned),
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.region()))
            .credentials_provider(credentials);
        if let Some(url) = self.endpoint_url() {
            loader = loader.endpoint_url(url);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(self.force_path_style)
            .build();
        let client = aws_sdk_s3::Client::from_conf(s3_config);

        Ok(S3ObjectStore::new(client, self.bucketname.trim()))
    }
}

/// Backoff strategy named in a config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    /// Retry immediately
    None,
    /// Wait `backoff_ms` before every retry
    Fixed,
    /// Start at `backoff_ms` and double up to `max_backoff_ms`
    Exponential,
}

/// Failure policy named in a config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicySetting {
    /// Record the failure and keep going
    Continue,
    /// Stop the migration
    Abort,
}

impl From<FailurePolicySetting> for FailedTransferPolicy {
    fn from(value: FailurePolicySetting) -> Self {
        match value {
            FailurePolicySetting::Continue => FailedTransferPolicy::Continue,
            FailurePolicySetting::Abort => FailedTransferPolicy::Abort,
        }
    }
}

/// The optional `migration` section of a config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MigrationSettings {
    /// Number of objects migrated concurrently
    pub concurrency: Option<usize>,
    /// Attempts per object
    pub max_attempts: Option<u32>,
    /// Backoff strategy between attempts
    pub backoff: Option<BackoffKind>,
    /// Fixed or initial delay between attempts in milliseconds
    pub backoff_ms: Option<u64>,
    /// Upper bound on an exponential delay in milliseconds
    pub max_backoff_ms: Option<u64>,
    /// Objects requested per listing page
    pub page_size: Option<i32>,
    /// Timeout for a single read or write in seconds
    pub io_timeout_secs: Option<u64>,
    /// Only migrate keys starting with this prefix
    pub key_prefix: Option<String>,
    /// What to do with an object that exhausts its attempts
    pub failure_policy: Option<FailurePolicySetting>,
}

impl MigrationSettings {
    fn validate(&self) -> Result<(), error::Error> {
        if self.concurrency == Some(0) {
            return Err(error::config_invalid(
                "`migration.concurrency` must be at least 1",
            ));
        }
        if self.max_attempts == Some(0) {
            return Err(error::config_invalid(
                "`migration.max_attempts` must be at least 1",
            ));
        }
        if self.io_timeout_secs == Some(0) {
            return Err(error::config_invalid(
                "`migration.io_timeout_secs` must be at least 1",
            ));
        }
        Ok(())
    }

    /// The backoff these settings describe.
    ///
    /// A `backoff_ms` without an explicit `backoff` kind means a fixed delay.
    pub fn backoff(&self) -> Backoff {
        let kind = match (self.backoff, self.backoff_ms) {
            (Some(kind), _) => kind,
            (None, Some(_)) => BackoffKind::Fixed,
            (None, None) => BackoffKind::None,
        };
        match kind {
            BackoffKind::None => Backoff::None,
            BackoffKind::Fixed => Backoff::Fixed(Duration::from_millis(
                self.backoff_ms.unwrap_or(DEFAULT_FIXED_BACKOFF_MS),
            )),
            BackoffKind::Exponential => Backoff::Exponential {
                initial: Duration::from_millis(
                    self.backoff_ms.unwrap_or(DEFAULT_INITIAL_BACKOFF_MS),
                ),
                max: Duration::from_millis(self.max_backoff_ms.unwrap_or(DEFAULT_MAX_BACKOFF_MS)),
            },
        }
    }

    /// The failure policy, defaulting to continue
    pub fn failure_policy(&self) -> FailedTransferPolicy {
        self.failure_policy.map(Into::into).unwrap_or_default()
    }

    /// Only migrate keys starting with this prefix
    pub fn key_prefix(&self) -> Option<&str> {
        self.key_prefix.as_deref().filter(|p| !p.is_empty())
    }
}

/// Load a migration [`Config`] from a config file.
#[derive(Debug)]
pub struct ConfigLoader {
    path: PathBuf,
    file: ConfigFile,
    concurrency: Option<usize>,
    max_attempts: Option<u32>,
}

impl ConfigLoader {
    /// Read the config file at `path`
    pub async fn from_path(path: impl Into<PathBuf>) -> Result<Self, error::Error> {
        let path = path.into();
        let file = ConfigFile::read(&path).await?;
        Ok(Self {
            path,
            file,
            concurrency: None,
            max_attempts: None,
        })
    }

    /// Path of the file this loader was read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The `migration` section of the config file
    pub fn settings(&self) -> &MigrationSettings {
        &self.file.migration
    }

    /// Override the number of objects migrated concurrently
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    /// Override the maximum number of attempts per object
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Apply the file settings and overrides (not the stores) to a config builder
    fn apply_settings(&self, mut builder: Builder) -> Builder {
        let settings = &self.file.migration;
        if let Some(concurrency) = self.concurrency.or(settings.concurrency) {
            builder = builder.concurrency(ConcurrencySetting::Explicit(concurrency));
        }
        if let Some(max_attempts) = self.max_attempts.or(settings.max_attempts) {
            builder = builder.max_attempts(max_attempts);
        }
        if let Some(page_size) = settings.page_size {
            builder = builder.page_size(page_size);
        }
        if let Some(secs) = settings.io_timeout_secs {
            builder = builder.io_timeout(Duration::from_secs(secs));
        }
        builder.backoff(settings.backoff())
    }

    /// Build both store clients and the migration configuration
    pub async fn load(self) -> Result<Config, error::Error> {
        let source = self.file.source.connect().await?;
        let destination = self.file.destination.connect().await?;
        tracing::debug!(
            "loaded config from {}: source bucket {:?}, destination bucket {:?}",
            self.path.display(),
            source.bucket(),
            destination.bucket()
        );

        self.apply_settings(Config::builder())
            .source(Arc::new(source))
            .destination(Arc::new(destination))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const YAML: &str = r#"
oss:
  endpoint: oss-cn-hangzhou.aliyuncs.com
  accesskeyid: oss-id
  accesskeysecret: oss-secret
  bucketname: source-bucket
  token: ""
s3:
  endpoint: us-west-2
  accesskeyid: s3-id
  accesskeysecret: s3-secret
  bucketname: destination-bucket
  token: session-token
"#;

    #[test]
    fn test_parse_yaml() {
        let file = ConfigFile::parse(YAML, FileFormat::Yaml).unwrap();

        assert_eq!("source-bucket", file.source.bucketname);
        assert_eq!(
            Some("http://oss-cn-hangzhou.aliyuncs.com".to_owned()),
            file.source.endpoint_url()
        );
        assert_eq!(DEFAULT_REGION, file.source.region());
        assert_eq!(None, file.source.session_token());

        assert_eq!(None, file.destination.endpoint_url());
        assert_eq!("us-west-2", file.destination.region());
        assert_eq!(Some("session-token"), file.destination.session_token());

        assert_eq!(Backoff::None, file.migration.backoff());
        assert_eq!(FailedTransferPolicy::Continue, file.migration.failure_policy());
    }

    #[test]
    fn test_parse_json_with_aliases() {
        let json = r#"{
            "source": {
                "endpoint": "https://minio.local:9000",
                "accessKeyId": "id",
                "accessKeySecret": "secret",
                "bucketName": "src",
                "region": "cn-hangzhou",
                "forcePathStyle": true
            },
            "destination": {
                "accessKeyId": "id",
                "accessKeySecret": "secret",
                "bucketName": "dst"
            },
            "migration": {
                "backoff": "exponential",
                "backoff_ms": 50,
                "failure_policy": "abort",
                "key_prefix": "logs/"
            }
        }"#;

        let file = ConfigFile::parse(json, FileFormat::Json).unwrap();
        assert_eq!(
            Some("https://minio.local:9000".to_owned()),
            file.source.endpoint_url()
        );
        assert_eq!("cn-hangzhou", file.source.region());
        assert!(file.source.force_path_style);
        assert_eq!(DEFAULT_REGION, file.destination.region());
        assert_eq!(
            Backoff::Exponential {
                initial: Duration::from_millis(50),
                max: Duration::from_millis(DEFAULT_MAX_BACKOFF_MS),
            },
            file.migration.backoff()
        );
        assert_eq!(FailedTransferPolicy::Abort, file.migration.failure_policy());
        assert_eq!(Some("logs/"), file.migration.key_prefix());
    }

    #[test]
    fn test_backoff_ms_alone_is_fixed() {
        let settings = MigrationSettings {
            backoff_ms: Some(250),
            ..Default::default()
        };
        assert_eq!(Backoff::Fixed(Duration::from_millis(250)), settings.backoff());
    }

    #[test]
    fn test_missing_section() {
        let yaml = r#"
oss:
  accesskeyid: id
  accesskeysecret: secret
  bucketname: src
"#;
        let err = ConfigFile::parse(yaml, FileFormat::Yaml).unwrap_err();
        assert_eq!(&ErrorKind::ConfigInvalid, err.kind());
    }

    #[test]
    fn test_empty_bucket_name() {
        let yaml = YAML.replace("bucketname: source-bucket", "bucketname: \"\"");
        let err = ConfigFile::parse(&yaml, FileFormat::Yaml).unwrap_err();
        assert_eq!(&ErrorKind::ConfigInvalid, err.kind());
        let source = std::error::Error::source(&err).unwrap().to_string();
        assert!(source.contains("oss.bucketname"), "{source}");
    }

    #[test]
    fn test_invalid_migration_settings() {
        let yaml = format!("{YAML}migration:\n  max_attempts: 0\n");
        let err = ConfigFile::parse(&yaml, FileFormat::Yaml).unwrap_err();
        assert_eq!(&ErrorKind::ConfigInvalid, err.kind());
    }

    #[test]
    fn test_secrets_are_not_logged() {
        let file = ConfigFile::parse(YAML, FileFormat::Yaml).unwrap();
        let debug = format!("{:?}", file);
        assert!(!debug.contains("oss-secret"));
        assert!(!debug.contains("session-token"));
    }

    #[test]
    fn test_file_format_from_path() {
        assert_eq!(FileFormat::Json, FileFormat::from_path(Path::new("a/b.JSON")));
        assert_eq!(FileFormat::Yaml, FileFormat::from_path(Path::new("config.yaml")));
        assert_eq!(FileFormat::Yaml, FileFormat::from_path(Path::new("config")));
    }
}
