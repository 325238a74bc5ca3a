use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// User metadata attached to a stored object: header name to header value.
pub type Metadata = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// ObjectKey
// ---------------------------------------------------------------------------

/// A key inside the bucket, kept as `prefix` + `name`.
///
/// The prefix is a folder-like path that must carry its own trailing
/// delimiter (`"entities/"`); the full key is the plain concatenation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    prefix: String,
    name: String,
}

impl ObjectKey {
    pub fn new(prefix: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            name: name.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full key as stored in the bucket.
    pub fn full(&self) -> String {
        format!("{}{}", self.prefix, self.name)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.name)
    }
}

// ---------------------------------------------------------------------------
// CannedAcl
// ---------------------------------------------------------------------------

/// S3 canned access-control list applied to written objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CannedAcl {
    Private,
    PublicRead,
    PublicReadWrite,
    AuthenticatedRead,
    AwsExecRead,
    BucketOwnerRead,
    BucketOwnerFullControl,
}

impl CannedAcl {
    /// The wire value sent in the `x-amz-acl` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::PublicRead => "public-read",
            Self::PublicReadWrite => "public-read-write",
            Self::AuthenticatedRead => "authenticated-read",
            Self::AwsExecRead => "aws-exec-read",
            Self::BucketOwnerRead => "bucket-owner-read",
            Self::BucketOwnerFullControl => "bucket-owner-full-control",
        }
    }
}

impl fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CannedAcl {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "private" => Ok(Self::Private),
            "public-read" => Ok(Self::PublicRead),
            "public-read-write" => Ok(Self::PublicReadWrite),
            "authenticated-read" => Ok(Self::AuthenticatedRead),
            "aws-exec-read" => Ok(Self::AwsExecRead),
            "bucket-owner-read" => Ok(Self::BucketOwnerRead),
            "bucket-owner-full-control" => Ok(Self::BucketOwnerFullControl),
            other => Err(StoreError::Config(format!("unknown canned ACL: {other:?}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// PutRequest / StoredObject
// ---------------------------------------------------------------------------

/// Everything needed to write one object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutRequest {
    pub key: ObjectKey,
    pub body: Bytes,
    pub acl: CannedAcl,
    /// Asks the backend to merge `metadata` into whatever metadata the key
    /// already carries instead of replacing it.
    pub keep_metadata: bool,
    pub metadata: Metadata,
}

impl PutRequest {
    /// A put that replaces any existing metadata on the key.
    pub fn new(key: ObjectKey, body: impl Into<Bytes>, acl: CannedAcl) -> Self {
        Self {
            key,
            body: body.into(),
            acl,
            keep_metadata: false,
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn keep_metadata(mut self, keep: bool) -> Self {
        self.keep_metadata = keep;
        self
    }
}

/// An object as held by the in-memory backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Bytes,
    pub acl: CannedAcl,
    pub metadata: Metadata,
}

impl StoredObject {
    /// Decode the body as JSON.
    pub fn json(&self) -> Result<serde_json::Value, StoreError> {
        serde_json::from_slice(&self.body).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

impl From<&PutRequest> for StoredObject {
    fn from(request: &PutRequest) -> Self {
        Self {
            body: request.body.clone(),
            acl: request.acl,
            metadata: request.metadata.clone(),
        }
    }
}
