use async_trait::async_trait;

use crate::error::StoreResult;
use crate::object::{ObjectKey, PutRequest};

/// Narrow object-store interface consumed by the identity layer.
///
/// All implementations must satisfy these invariants:
/// - `list_object_names` returns the complete listing, following
///   continuation tokens until the backend reports no more pages.
/// - Listing is non-recursive: keys nested one delimiter deeper than the
///   prefix are not returned.
/// - `exists` resolves `Ok(false)` for a missing key and only fails on a
///   transport error.
/// - No operation retries; the first failure is returned to the caller.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Full keys of every object directly under `prefix`.
    async fn list_object_names(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Whether `key` currently exists.
    async fn exists(&self, key: &ObjectKey) -> StoreResult<bool>;

    /// Write an object, overwriting any existing body at the key.
    async fn put_object(&self, request: PutRequest) -> StoreResult<()>;
}

#[async_trait]
impl<S: ObjectStore + ?Sized> ObjectStore for std::sync::Arc<S> {
    async fn list_object_names(&self, prefix: &str) -> StoreResult<Vec<String>> {
        (**self).list_object_names(prefix).await
    }

    async fn exists(&self, key: &ObjectKey) -> StoreResult<bool> {
        (**self).exists(key).await
    }

    async fn put_object(&self, request: PutRequest) -> StoreResult<()> {
        (**self).put_object(request).await
    }
}
