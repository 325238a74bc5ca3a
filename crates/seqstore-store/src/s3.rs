//! S3 object storage backend.
//!
//! [`S3ObjectStore`] implements the [`ObjectStore`] port on top of the
//! `object_store` crate's `AmazonS3` client. Credentials and region come
//! from the usual `AWS_*` environment variables.
//!
//! `object_store` has no per-request ACL option, so the canned ACL is fixed
//! when the backend is created and sent as an `x-amz-acl` default header on
//! every request the client makes.

use std::borrow::Cow;

use async_trait::async_trait;
use http::{HeaderMap, HeaderValue};
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::{
    Attribute, AttributeValue, Attributes, ClientOptions, ObjectStore as _, PutOptions, PutPayload,
};
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use crate::error::{StoreError, StoreResult};
use crate::object::{CannedAcl, ObjectKey, PutRequest};
use crate::traits::ObjectStore;

const ACL_HEADER: &str = "x-amz-acl";

/// An [`ObjectStore`] backed by an S3 bucket.
///
/// The underlying client is built on first use and reused for the lifetime
/// of this value.
pub struct S3ObjectStore {
    bucket: String,
    acl: CannedAcl,
    endpoint: Option<String>,
    client: OnceCell<AmazonS3>,
}

impl S3ObjectStore {
    /// Create a backend for `bucket` that writes objects with `acl`.
    pub fn new(bucket: impl Into<String>, acl: CannedAcl) -> StoreResult<Self> {
        let bucket = bucket.into();
        if bucket.trim().is_empty() {
            return Err(StoreError::Config("invalid S3 bucket".into()));
        }
        Ok(Self {
            bucket,
            acl,
            endpoint: None,
            client: OnceCell::new(),
        })
    }

    /// Point the client at a custom S3-compatible endpoint (MinIO, LocalStack).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn acl(&self) -> CannedAcl {
        self.acl
    }

    async fn client(&self) -> StoreResult<&AmazonS3> {
        self.client
            .get_or_try_init(|| async {
                let mut headers = HeaderMap::new();
                headers.insert(ACL_HEADER, HeaderValue::from_static(self.acl.as_str()));

                let mut builder = AmazonS3Builder::from_env()
                    .with_bucket_name(&self.bucket)
                    .with_client_options(ClientOptions::new().with_default_headers(headers));
                if let Some(endpoint) = &self.endpoint {
                    builder = builder.with_endpoint(endpoint).with_allow_http(true);
                }

                match builder.build() {
                    Ok(client) => {
                        debug!(bucket = %self.bucket, acl = %self.acl, "S3 client initialised");
                        Ok(client)
                    }
                    Err(e) => Err(StoreError::Unavailable(format!(
                        "failed to create S3 client for {}: {e}",
                        self.bucket
                    ))),
                }
            })
            .await
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn list_object_names(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let client = self.client().await?;
        let names = list_prefixed(client, prefix).await?;
        debug!(count = names.len(), "listed objects");
        Ok(names)
    }

    #[instrument(skip(self), fields(bucket = %self.bucket, key = %key))]
    async fn exists(&self, key: &ObjectKey) -> StoreResult<bool> {
        let client = self.client().await?;
        match client.head(&ObjectPath::from(key.full())).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(StoreError::Head {
                key: key.full(),
                message: e.to_string(),
            }),
        }
    }

    #[instrument(skip(self, request), fields(bucket = %self.bucket, key = %request.key, size = request.body.len()))]
    async fn put_object(&self, request: PutRequest) -> StoreResult<()> {
        if request.acl != self.acl {
            return Err(StoreError::Config(format!(
                "S3 backend writes with ACL {} but {} was requested",
                self.acl, request.acl
            )));
        }
        let client = self.client().await?;

        // TODO: when `keep_metadata` is set, head the key first and merge its
        // user metadata into `request.metadata`; today it is replaced.
        let opts = PutOptions {
            attributes: metadata_attributes(&request),
            ..Default::default()
        };
        let key = request.key.full();
        client
            .put_opts(&ObjectPath::from(key.as_str()), PutPayload::from(request.body), opts)
            .await
            .map_err(|e| StoreError::Put {
                key,
                message: e.to_string(),
            })?;
        Ok(())
    }
}

/// Every key that starts with `prefix`, in a single directory level.
///
/// Key prefixes are raw strings (`"p/"`, `"p/items-"`, `"items-"`) while
/// `object_store` lists by directory, so the listing runs on the prefix's
/// parent directory and is filtered back down to the prefix.
/// `list_with_delimiter` follows continuation tokens until the listing is
/// exhausted.
async fn list_prefixed<C>(client: &C, prefix: &str) -> StoreResult<Vec<String>>
where
    C: object_store::ObjectStore + ?Sized,
{
    let parent = parent_path(prefix);
    let listing = client
        .list_with_delimiter(parent.as_ref())
        .await
        .map_err(|e| StoreError::List {
            prefix: prefix.to_string(),
            message: e.to_string(),
        })?;

    Ok(listing
        .objects
        .into_iter()
        .map(|meta| meta.location.to_string())
        .filter(|key| key.starts_with(prefix))
        .collect())
}

/// Directory that holds the keys starting with `prefix`.
///
/// `object_store` paths never carry a trailing delimiter, so `"p/"` and
/// `"p/items-"` both list `p`; a prefix without a delimiter lists the bucket
/// root.
fn parent_path(prefix: &str) -> Option<ObjectPath> {
    let dir = prefix.rfind('/').map_or("", |i| &prefix[..i]);
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        None
    } else {
        Some(ObjectPath::from(dir))
    }
}

fn metadata_attributes(request: &PutRequest) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(
        Attribute::ContentType,
        AttributeValue::from("application/json"),
    );
    for (name, value) in &request.metadata {
        attributes.insert(
            Attribute::Metadata(Cow::Owned(name.clone())),
            AttributeValue::from(value.clone()),
        );
    }
    attributes
}

impl std::fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("bucket", &self.bucket)
            .field("acl", &self.acl)
            .field("connected", &self.client.initialized())
            .finish()
    }
}
