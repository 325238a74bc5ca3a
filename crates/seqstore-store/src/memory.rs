use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::{CannedAcl, Metadata, ObjectKey, PutRequest, StoredObject};
use crate::traits::ObjectStore;

/// Page size used when none is configured; matches the S3 listing maximum.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// An operation of the [`ObjectStore`] port, used for fault injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreOperation {
    List,
    Exists,
    Put,
}

/// A call observed by [`InMemoryObjectStore`], in arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreCall {
    List { prefix: String },
    Exists { key: String },
    Put { key: String, keep_metadata: bool },
}

/// In-memory, `BTreeMap`-based object store.
///
/// Intended for tests and local runs. Listing is served in pages of
/// `page_size` keys and drained through continuation tokens, the same way a
/// real bucket listing is, so pagination bugs show up here too. Every call is
/// recorded, and a failure can be queued for the next call of a given
/// operation.
pub struct InMemoryObjectStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    page_size: usize,
    pages_served: AtomicUsize,
    calls: Mutex<Vec<StoreCall>>,
    faults: Mutex<Vec<(StoreOperation, String)>>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Create an empty store that lists at most `page_size` keys per page.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            page_size: page_size.max(1),
            pages_served: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            faults: Mutex::new(Vec::new()),
        }
    }

    /// Seed an object directly, bypassing call recording.
    pub fn insert(&self, key: impl Into<String>, body: impl Into<Bytes>) {
        let object = StoredObject {
            body: body.into(),
            acl: CannedAcl::Private,
            metadata: Metadata::new(),
        };
        self.objects
            .write()
            .expect("lock poisoned")
            .insert(key.into(), object);
    }

    /// Read back an object by its full key.
    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().expect("lock poisoned").get(key).cloned()
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().expect("lock poisoned").clone()
    }

    /// Number of `Put` calls received so far.
    pub fn put_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, StoreCall::Put { .. }))
            .count()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().expect("lock poisoned").clear();
    }

    /// Total listing pages served across all `list_object_names` calls.
    pub fn pages_served(&self) -> usize {
        self.pages_served.load(Ordering::SeqCst)
    }

    /// Make the next call of `operation` fail with `message`.
    pub fn fail_next(&self, operation: StoreOperation, message: impl Into<String>) {
        self.faults
            .lock()
            .expect("lock poisoned")
            .push((operation, message.into()));
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().expect("lock poisoned").push(call);
    }

    fn take_fault(&self, operation: StoreOperation) -> Option<String> {
        let mut faults = self.faults.lock().expect("lock poisoned");
        let pos = faults.iter().position(|(op, _)| *op == operation)?;
        Some(faults.remove(pos).1)
    }

    /// One listing page starting after `start_after` (or at `prefix`).
    ///
    /// Returns the keys and the continuation token for the next page, if any.
    fn list_page(&self, prefix: &str, start_after: Option<&str>) -> (Vec<String>, Option<String>) {
        let map = self.objects.read().expect("lock poisoned");
        let lower = match start_after {
            Some(token) => Bound::Excluded(token.to_string()),
            None => Bound::Included(prefix.to_string()),
        };
        let mut matching = map
            .range::<String, _>((lower, Bound::Unbounded))
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(prefix))
            .filter(|key| {
                let rest = &key[prefix.len()..];
                !rest.is_empty() && !rest.contains('/')
            })
            .peekable();

        let mut keys = Vec::new();
        while keys.len() < self.page_size {
            match matching.next() {
                Some(key) => keys.push(key.clone()),
                None => break,
            }
        }
        let next = if matching.peek().is_some() {
            keys.last().cloned()
        } else {
            None
        };
        self.pages_served.fetch_add(1, Ordering::SeqCst);
        (keys, next)
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn list_object_names(&self, prefix: &str) -> StoreResult<Vec<String>> {
        self.record(StoreCall::List {
            prefix: prefix.to_string(),
        });
        if let Some(message) = self.take_fault(StoreOperation::List) {
            return Err(StoreError::List {
                prefix: prefix.to_string(),
                message,
            });
        }

        let mut names = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let (page, next) = self.list_page(prefix, token.as_deref());
            names.extend(page);
            match next {
                Some(t) => token = Some(t),
                None => break,
            }
        }
        debug!(prefix, count = names.len(), "listed objects");
        Ok(names)
    }

    async fn exists(&self, key: &ObjectKey) -> StoreResult<bool> {
        let full = key.full();
        self.record(StoreCall::Exists { key: full.clone() });
        if let Some(message) = self.take_fault(StoreOperation::Exists) {
            return Err(StoreError::Head { key: full, message });
        }
        Ok(self.objects.read().expect("lock poisoned").contains_key(&full))
    }

    async fn put_object(&self, request: PutRequest) -> StoreResult<()> {
        let full = request.key.full();
        self.record(StoreCall::Put {
            key: full.clone(),
            keep_metadata: request.keep_metadata,
        });
        if let Some(message) = self.take_fault(StoreOperation::Put) {
            return Err(StoreError::Put { key: full, message });
        }

        // TODO: merge the key's existing metadata into `request.metadata` when
        // `keep_metadata` is set; today the new metadata replaces it.
        let object = StoredObject::from(&request);
        self.objects
            .write()
            .expect("lock poisoned")
            .insert(full, object);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .field("page_size", &self.page_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(key: &str, body: &str) -> PutRequest {
        let (prefix, name) = key.rsplit_once('/').map_or(("", key), |(p, n)| (p, n));
        let prefix = if prefix.is_empty() {
            String::new()
        } else {
            format!("{prefix}/")
        };
        PutRequest::new(ObjectKey::new(prefix, name), body.to_string(), CannedAcl::Private)
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn list_empty_store() {
        let store = InMemoryObjectStore::new();
        assert!(store.list_object_names("p/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_only_returns_keys_under_prefix() {
        let store = InMemoryObjectStore::new();
        store.insert("p/1.json", "{}");
        store.insert("p/2.json", "{}");
        store.insert("q/3.json", "{}");
        store.insert("o/4.json", "{}");

        let names = store.list_object_names("p/").await.unwrap();
        assert_eq!(names, vec!["p/1.json", "p/2.json"]);
    }

    #[tokio::test]
    async fn list_is_not_recursive() {
        let store = InMemoryObjectStore::new();
        store.insert("p/", "");
        store.insert("p/1.json", "{}");
        store.insert("p/archive/9.json", "{}");

        let names = store.list_object_names("p/").await.unwrap();
        assert_eq!(names, vec!["p/1.json"]);
    }

    #[tokio::test]
    async fn list_drains_every_page() {
        let store = InMemoryObjectStore::with_page_size(2);
        for i in 1..=7 {
            store.insert(format!("p/{i}.json"), "{}");
        }

        let names = store.list_object_names("p/").await.unwrap();
        assert_eq!(names.len(), 7);
        assert_eq!(store.pages_served(), 4);
    }

    #[tokio::test]
    async fn list_exact_multiple_of_page_size() {
        let store = InMemoryObjectStore::with_page_size(3);
        for i in 1..=6 {
            store.insert(format!("p/{i}.json"), "{}");
        }

        assert_eq!(store.list_object_names("p/").await.unwrap().len(), 6);
        assert_eq!(store.pages_served(), 2);
    }

    #[tokio::test]
    async fn list_with_empty_prefix_returns_top_level() {
        let store = InMemoryObjectStore::new();
        store.insert("1.json", "{}");
        store.insert("p/2.json", "{}");

        assert_eq!(store.list_object_names("").await.unwrap(), vec!["1.json"]);
    }

    // -----------------------------------------------------------------------
    // Exists / Put
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn exists_reports_missing_as_false() {
        let store = InMemoryObjectStore::new();
        assert!(!store.exists(&ObjectKey::new("p/", "1.json")).await.unwrap());
    }

    #[tokio::test]
    async fn put_then_exists() {
        let store = InMemoryObjectStore::new();
        store.put_object(put("p/1.json", r#"{"id":1}"#)).await.unwrap();

        assert!(store.exists(&ObjectKey::new("p/", "1.json")).await.unwrap());
        assert_eq!(store.get("p/1.json").unwrap().json().unwrap()["id"], 1);
    }

    #[tokio::test]
    async fn put_overwrites_body_and_metadata() {
        let store = InMemoryObjectStore::new();
        let mut first = Metadata::new();
        first.insert("X-A".into(), "1".into());
        store
            .put_object(put("p/1.json", "{\"v\":1}").with_metadata(first))
            .await
            .unwrap();

        let mut second = Metadata::new();
        second.insert("X-B".into(), "2".into());
        store
            .put_object(put("p/1.json", "{\"v\":2}").keep_metadata(true).with_metadata(second.clone()))
            .await
            .unwrap();

        let stored = store.get("p/1.json").unwrap();
        assert_eq!(stored.json().unwrap()["v"], 2);
        assert_eq!(stored.metadata, second);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn put_keeps_acl() {
        let store = InMemoryObjectStore::new();
        let req = PutRequest::new(ObjectKey::new("p/", "1.json"), "{}", CannedAcl::PublicRead);
        store.put_object(req).await.unwrap();
        assert_eq!(store.get("p/1.json").unwrap().acl, CannedAcl::PublicRead);
    }

    // -----------------------------------------------------------------------
    // Call recording / fault injection
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn calls_are_recorded_in_order() {
        let store = InMemoryObjectStore::new();
        store.list_object_names("p/").await.unwrap();
        store.exists(&ObjectKey::new("p/", "1.json")).await.unwrap();
        store.put_object(put("p/1.json", "{}")).await.unwrap();

        assert_eq!(
            store.calls(),
            vec![
                StoreCall::List { prefix: "p/".into() },
                StoreCall::Exists { key: "p/1.json".into() },
                StoreCall::Put { key: "p/1.json".into(), keep_metadata: false },
            ]
        );
        assert_eq!(store.put_count(), 1);

        store.clear_calls();
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn injected_list_failure_names_the_operation() {
        let store = InMemoryObjectStore::new();
        store.fail_next(StoreOperation::List, "connection reset");

        let err = store.list_object_names("p/").await.unwrap_err();
        assert!(matches!(err, StoreError::List { .. }));
        assert!(err.to_string().contains("list failed under prefix [p/]"));
        assert!(err.to_string().contains("connection reset"));

        // Fault is one-shot.
        assert!(store.list_object_names("p/").await.is_ok());
    }

    #[tokio::test]
    async fn injected_put_failure_writes_nothing() {
        let store = InMemoryObjectStore::new();
        store.fail_next(StoreOperation::Put, "access denied");

        let err = store.put_object(put("p/1.json", "{}")).await.unwrap_err();
        assert!(matches!(err, StoreError::Put { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn injected_exists_failure_is_an_error_not_false() {
        let store = InMemoryObjectStore::new();
        store.fail_next(StoreOperation::Exists, "timeout");

        let err = store.exists(&ObjectKey::new("p/", "1.json")).await.unwrap_err();
        assert!(matches!(err, StoreError::Head { .. }));
    }

    #[test]
    fn debug_shows_count() {
        let store = InMemoryObjectStore::new();
        store.insert("a", "");
        let dbg = format!("{store:?}");
        assert!(dbg.contains("object_count: 1"));
    }
}
