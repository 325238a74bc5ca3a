use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use seqstore_identity::{parse_metadata_keys, IdentityError, WriterConfig};
use seqstore_store::{CannedAcl, InMemoryObjectStore, ObjectStore, S3ObjectStore};

use crate::error::{ServerError, ServerResult};

pub const ENV_BUCKET: &str = "S3_BUCKET";
pub const ENV_PREFIX: &str = "S3_PREFIX";
pub const ENV_EXTENSION: &str = "S3_EXTENSION";
pub const ENV_ACL: &str = "S3_OBJECT_ACL";
pub const ENV_ENDPOINT: &str = "S3_ENDPOINT";
pub const ENV_IDENTITY_KEY: &str = "IDENTITY_KEY";
pub const ENV_METADATA_KEYS: &str = "METADATA_KEYS";
pub const ENV_BIND: &str = "SEQSTORE_BIND";
pub const ENV_BACKEND: &str = "SEQSTORE_BACKEND";

/// Which object store the service writes to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    S3,
    Memory,
}

impl std::str::FromStr for Backend {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "memory" => Ok(Self::Memory),
            other => Err(ServerError::Config(format!("unknown backend: {other:?}"))),
        }
    }
}

/// Process-wide service configuration.
///
/// Resolved once at startup: defaults, then an optional TOML file, then
/// environment variables. The result is shared read-only with every request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub backend: Backend,
    pub bucket: Option<String>,
    /// Custom S3-compatible endpoint.
    pub endpoint: Option<String>,
    /// Key prefix including its trailing delimiter.
    pub prefix: String,
    pub extension: Option<String>,
    pub acl: Option<CannedAcl>,
    pub identity_key: Option<String>,
    /// Request headers copied into object metadata.
    pub metadata_keys: Option<Vec<String>>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            backend: Backend::S3,
            bucket: None,
            endpoint: None,
            prefix: String::new(),
            extension: None,
            acl: None,
            identity_key: None,
            metadata_keys: None,
        }
    }
}

impl ServiceConfig {
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> ServerResult<Self> {
        Self::default().apply_env(|name| std::env::var(name).ok())
    }

    /// Override settings with the variables `lookup` finds.
    pub fn apply_env<F>(mut self, lookup: F) -> ServerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup(ENV_BIND) {
            self.bind_addr = bind
                .parse()
                .map_err(|e| ServerError::Config(format!("{ENV_BIND}={bind:?}: {e}")))?;
        }
        if let Some(backend) = lookup(ENV_BACKEND) {
            self.backend = backend.parse::<Backend>()?;
        }
        if let Some(bucket) = lookup(ENV_BUCKET) {
            self.bucket = Some(bucket);
        }
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            self.endpoint = Some(endpoint);
        }
        if let Some(prefix) = lookup(ENV_PREFIX) {
            self.prefix = prefix;
        }
        if let Some(extension) = lookup(ENV_EXTENSION) {
            self.extension = Some(extension);
        }
        if let Some(acl) = lookup(ENV_ACL) {
            self.acl = Some(
                acl.parse::<CannedAcl>()
                    .map_err(|e| ServerError::Config(format!("{ENV_ACL}: {e}")))?,
            );
        }
        if let Some(identity_key) = lookup(ENV_IDENTITY_KEY) {
            self.identity_key = Some(identity_key);
        }
        if let Some(keys) = lookup(ENV_METADATA_KEYS) {
            self.metadata_keys = parse_metadata_keys(Some(&keys));
        }
        Ok(self)
    }

    /// Validated writer settings. Missing extension or ACL is an error.
    pub fn writer_config(&self) -> ServerResult<WriterConfig> {
        let mut builder = WriterConfig::builder()
            .prefix(self.prefix.clone())
            .identity_key(self.identity_key.clone());
        if let Some(extension) = &self.extension {
            builder = builder.extension(extension.clone());
        }
        if let Some(acl) = self.acl {
            builder = builder.acl(acl);
        }
        builder.build().map_err(|e| match e {
            IdentityError::InvalidConfig(message) => ServerError::Config(message),
            other => ServerError::Identity(other),
        })
    }

    /// Build the configured object store.
    pub fn build_store(&self) -> ServerResult<Arc<dyn ObjectStore>> {
        match self.backend {
            Backend::Memory => Ok(Arc::new(InMemoryObjectStore::new())),
            Backend::S3 => {
                let bucket = self
                    .bucket
                    .as_deref()
                    .ok_or_else(|| ServerError::Config(format!("{ENV_BUCKET} is not set")))?;
                let acl = self
                    .acl
                    .ok_or_else(|| ServerError::Config("invalid S3 ACL".into()))?;
                let mut store = S3ObjectStore::new(bucket, acl)?;
                if let Some(endpoint) = &self.endpoint {
                    store = store.with_endpoint(endpoint.clone());
                }
                Ok(Arc::new(store))
            }
        }
    }
}
