//! Numeric identity allocation and entity persistence for seqstore.
//!
//! Entities are JSON objects stored one per key at
//! `<prefix><id><extension>`. Ids are positive integers assigned by scanning
//! the keys that already exist under the prefix.
//!
//! # Operations
//!
//! - [`IdentityAllocator`] -- next unused id from a full key listing
//! - [`CreateEntity`] -- allocate, stamp the id on the entity, write it
//! - [`ReplaceEntity`] -- check the id matches and the key exists, overwrite it
//! - [`extract_metadata`] -- copy configured request headers into object metadata
//!
//! # Ordering
//!
//! Listing completes (every page) before an id is computed, and the
//! existence check completes before a replace writes. Writers are cheap
//! values built per request; nothing is cached between calls.
//!
//! # Known limitation
//!
//! Allocation is list-then-write with no lock or conditional put. Two
//! concurrent creates under the same prefix can both observe the same
//! maximum, allocate the same id, and the later write silently replaces the
//! earlier one. Callers that need strict uniqueness must serialize creates
//! per prefix.

pub mod allocator;
pub mod config;
pub mod create;
pub mod entity;
pub mod error;
pub mod metadata;
pub mod replace;

pub use allocator::{allocate_next, parse_id, IdentityAllocator};
pub use config::{WriterConfig, WriterConfigBuilder};
pub use create::{CreateEntity, CreatedEntity};
pub use entity::{Entity, EntityId};
pub use error::{ErrorKind, IdentityError, IdentityResult};
pub use metadata::{extract_metadata, parse_metadata_keys, HeaderSource};
pub use replace::ReplaceEntity;
