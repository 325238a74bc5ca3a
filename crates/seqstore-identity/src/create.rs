use seqstore_store::{Metadata, ObjectStore, PutRequest};
use tracing::info;

use crate::allocator::IdentityAllocator;
use crate::config::WriterConfig;
use crate::entity::{Entity, EntityId};
use crate::error::{IdentityError, IdentityResult};

/// Result of a successful create.
#[derive(Clone, Debug, PartialEq)]
pub struct CreatedEntity {
    pub id: EntityId,
    /// The entity as written, with the id stamped on it when an identity
    /// key is configured.
    pub entity: Entity,
}

/// Stores a new entity under the next free numeric id.
///
/// Allocation is list-then-write. Two concurrent creates under the same
/// prefix can allocate the same id, and the later write replaces the
/// earlier one.
pub struct CreateEntity<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    config: &'a WriterConfig,
    entity: Entity,
    metadata: Metadata,
}

impl<'a, S: ObjectStore + ?Sized> CreateEntity<'a, S> {
    /// Validate inputs. Fails before any store call.
    pub fn new(store: &'a S, config: &'a WriterConfig, entity: Entity) -> IdentityResult<Self> {
        if entity.is_empty() {
            return Err(IdentityError::InvalidEntity("entity is empty".into()));
        }
        Ok(Self {
            store,
            config,
            entity,
            metadata: Metadata::new(),
        })
    }

    /// Metadata written with the new object.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// List, allocate, stamp, write.
    ///
    /// The write is the last step, so a failure at any point leaves nothing
    /// behind to undo.
    pub async fn execute(self) -> IdentityResult<CreatedEntity> {
        let Self {
            store,
            config,
            mut entity,
            metadata,
        } = self;

        let id = IdentityAllocator::from_config(config).allocate(store).await?;
        if let Some(field) = config.identity_key() {
            entity.set_id(field, id);
        }

        let key = config.key_for(id);
        let request = PutRequest::new(key.clone(), entity.to_json_bytes()?, config.acl())
            .with_metadata(metadata)
            .keep_metadata(false);
        store.put_object(request).await?;

        info!(%key, %id, "entity created");
        Ok(CreatedEntity { id, entity })
    }
}
