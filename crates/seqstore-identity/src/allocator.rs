//! Next-id computation from an object key listing.
//!
//! The next id is one more than the highest id found among the keys under
//! the prefix. Keys that do not look like `<prefix><digits><extension>` are
//! skipped. The result depends only on the set of keys, never on their
//! order, so the whole listing must be in hand before computing it.

use seqstore_store::ObjectStore;
use tracing::debug;

use crate::config::WriterConfig;
use crate::entity::EntityId;
use crate::error::{IdentityError, IdentityResult};

/// Extract the id from `key`, if it is `<prefix><digits><extension>`.
///
/// Returns `None` for keys outside the prefix, keys with another extension,
/// sub-folder markers, non-numeric stems, zero, and values beyond `u64`.
pub fn parse_id(key: &str, prefix: &str, extension: &str) -> Option<u64> {
    let stem = key.strip_prefix(prefix)?.strip_suffix(extension)?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse::<u64>().ok().filter(|&id| id > 0)
}

/// Compute the id following the highest id in `keys`.
///
/// An empty listing, or one with no parseable keys, yields 1.
pub fn allocate_next<I, K>(keys: I, prefix: &str, extension: &str) -> IdentityResult<EntityId>
where
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
{
    let max = keys
        .into_iter()
        .filter_map(|key| parse_id(key.as_ref(), prefix, extension))
        .max()
        .unwrap_or(0);
    let next = max
        .checked_add(1)
        .ok_or(IdentityError::IdSpaceExhausted { max })?;
    EntityId::new(next)
}

/// Allocates ids for one prefix + extension namespace.
#[derive(Clone, Debug)]
pub struct IdentityAllocator {
    prefix: String,
    extension: String,
}

impl IdentityAllocator {
    pub fn new(prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            extension: extension.into(),
        }
    }

    pub fn from_config(config: &WriterConfig) -> Self {
        Self::new(config.prefix(), config.extension())
    }

    /// Next id given an already complete listing.
    pub fn next_id<I, K>(&self, keys: I) -> IdentityResult<EntityId>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        allocate_next(keys, &self.prefix, &self.extension)
    }

    /// List every key under the prefix, then compute the next id.
    ///
    /// Listing failures are returned unchanged; nothing is retried.
    pub async fn allocate<S>(&self, store: &S) -> IdentityResult<EntityId>
    where
        S: ObjectStore + ?Sized,
    {
        let keys = store.list_object_names(&self.prefix).await?;
        let next = self.next_id(&keys)?;
        debug!(prefix = %self.prefix, listed = keys.len(), next_id = %next, "allocated id");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use seqstore_store::{InMemoryObjectStore, StoreError, StoreOperation};

    fn next(keys: &[&str]) -> u64 {
        allocate_next(keys, "p/", ".json").unwrap().get()
    }

    // -----------------------------------------------------------------------
    // parse_id
    // -----------------------------------------------------------------------

    #[test]
    fn parse_id_accepts_prefix_digits_extension() {
        assert_eq!(parse_id("p/7.json", "p/", ".json"), Some(7));
        assert_eq!(parse_id("p/007.json", "p/", ".json"), Some(7));
        assert_eq!(parse_id("7.json", "", ".json"), Some(7));
    }

    #[test]
    fn parse_id_rejects_everything_else() {
        assert_eq!(parse_id("p/abc.json", "p/", ".json"), None);
        assert_eq!(parse_id("p/7.txt", "p/", ".json"), None);
        assert_eq!(parse_id("q/7.json", "p/", ".json"), None);
        assert_eq!(parse_id("p/", "p/", ".json"), None);
        assert_eq!(parse_id("p/.json", "p/", ".json"), None);
        assert_eq!(parse_id("p/0.json", "p/", ".json"), None);
        assert_eq!(parse_id("p/-3.json", "p/", ".json"), None);
        assert_eq!(parse_id("p/+3.json", "p/", ".json"), None);
        assert_eq!(parse_id("p/3a.json", "p/", ".json"), None);
        assert_eq!(parse_id("p/sub/3.json", "p/", ".json"), None);
        assert_eq!(parse_id("p/99999999999999999999.json", "p/", ".json"), None);
    }

    // -----------------------------------------------------------------------
    // allocate_next
    // -----------------------------------------------------------------------

    #[test]
    fn next_after_maximum() {
        assert_eq!(next(&["p/3.json", "p/7.json", "p/1.json"]), 8);
    }

    #[test]
    fn empty_listing_starts_at_one() {
        assert_eq!(next(&[]), 1);
    }

    #[test]
    fn non_numeric_keys_are_ignored() {
        assert_eq!(next(&["p/abc.json"]), 1);
        assert_eq!(next(&["p/abc.json", "p/2.json", "p/readme.txt"]), 3);
    }

    #[test]
    fn gaps_are_not_filled() {
        assert_eq!(next(&["p/1.json", "p/10.json"]), 11);
    }

    #[test]
    fn exhausted_id_space_is_an_error() {
        let max = format!("p/{}.json", u64::MAX);
        let err = allocate_next([max.as_str()], "p/", ".json").unwrap_err();
        assert!(matches!(err, IdentityError::IdSpaceExhausted { max } if max == u64::MAX));
    }

    proptest! {
        #[test]
        fn order_does_not_matter(ids in proptest::collection::vec(1u64..1_000_000, 0..64)) {
            let keys: Vec<String> = ids.iter().map(|id| format!("p/{id}.json")).collect();
            let forward = allocate_next(&keys, "p/", ".json").unwrap();
            let backward = allocate_next(keys.iter().rev(), "p/", ".json").unwrap();
            prop_assert_eq!(forward, backward);

            let expected = ids.iter().max().copied().unwrap_or(0) + 1;
            prop_assert_eq!(forward.get(), expected);
        }

        #[test]
        fn never_at_or_below_observed_maximum(ids in proptest::collection::vec(1u64..1_000_000, 1..64)) {
            let keys: Vec<String> = ids.iter().map(|id| format!("p/{id}.json")).collect();
            let next = allocate_next(&keys, "p/", ".json").unwrap();
            prop_assert!(ids.iter().all(|&id| next.get() > id));
        }
    }

    // -----------------------------------------------------------------------
    // IdentityAllocator against a store
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn allocate_reads_every_page() {
        let store = InMemoryObjectStore::with_page_size(2);
        // Highest id sits on the last page.
        for id in [1, 2, 3, 4, 5, 90] {
            store.insert(format!("p/{id}.json"), "{}");
        }

        let allocator = IdentityAllocator::new("p/", ".json");
        assert_eq!(allocator.allocate(&store).await.unwrap().get(), 91);
        assert_eq!(store.pages_served(), 3);
    }

    #[tokio::test]
    async fn allocate_ignores_nested_and_foreign_keys() {
        let store = InMemoryObjectStore::new();
        store.insert("p/", "");
        store.insert("p/2.json", "{}");
        store.insert("p/archive/50.json", "{}");
        store.insert("q/70.json", "{}");

        let allocator = IdentityAllocator::new("p/", ".json");
        assert_eq!(allocator.allocate(&store).await.unwrap().get(), 3);
    }

    #[tokio::test]
    async fn allocate_surfaces_listing_failure() {
        let store = InMemoryObjectStore::new();
        store.fail_next(StoreOperation::List, "throttled");

        let allocator = IdentityAllocator::new("p/", ".json");
        let err = allocator.allocate(&store).await.unwrap_err();
        assert!(matches!(err, IdentityError::Store(StoreError::List { .. })));
        assert_eq!(store.calls().len(), 1);
    }
}
