//! Object storage port for seqstore.
//!
//! The identity layer never talks to a storage service directly. It goes
//! through the narrow [`ObjectStore`] trait defined here, which offers only
//! the three operations entity persistence needs: a full key listing under
//! a prefix, an existence check, and a put.
//!
//! # Storage Backends
//!
//! - [`InMemoryObjectStore`] -- `BTreeMap`-based store for tests and local runs
//! - [`S3ObjectStore`] -- S3 (or S3-compatible) bucket via the `object_store` crate
//!
//! # Design Rules
//!
//! 1. `list_object_names` drains every page before returning.
//! 2. `exists` reports a missing key as `Ok(false)`; only transport failures are errors.
//! 3. Every error names the operation that failed.
//! 4. The store never interprets object bodies.

pub mod error;
pub mod memory;
pub mod object;
pub mod s3;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryObjectStore, StoreCall, StoreOperation};
pub use object::{CannedAcl, Metadata, ObjectKey, PutRequest, StoredObject};
pub use s3::S3ObjectStore;
pub use traits::ObjectStore;
