use seqstore_store::{Metadata, ObjectStore, PutRequest};
use tracing::{info, warn};

use crate::config::WriterConfig;
use crate::entity::{Entity, EntityId};
use crate::error::{IdentityError, IdentityResult};

/// Overwrites the entity stored under an existing id.
///
/// The existence check and the write are separate store calls; the key can
/// change between them.
pub struct ReplaceEntity<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    config: &'a WriterConfig,
    id: EntityId,
    entity: Entity,
    metadata: Metadata,
}

impl<'a, S: ObjectStore + ?Sized> ReplaceEntity<'a, S> {
    /// Validate inputs. Fails before any store call.
    ///
    /// `id` must be greater than 1, the entity must be non-empty, and when an
    /// identity key is configured the entity must carry the same id.
    pub fn new(
        store: &'a S,
        config: &'a WriterConfig,
        id: u64,
        entity: Entity,
    ) -> IdentityResult<Self> {
        if id <= 1 {
            return Err(IdentityError::InvalidId(format!(
                "id must be greater than 1, got {id}"
            )));
        }
        let id = EntityId::new(id)?;
        if entity.is_empty() {
            return Err(IdentityError::InvalidEntity("entity is empty".into()));
        }
        if let Some(field) = config.identity_key() {
            if entity.id(field) != Some(id) {
                return Err(IdentityError::IdMismatch {
                    expected: id,
                    found: entity.describe_field(field),
                });
            }
        }

        Ok(Self {
            store,
            config,
            id,
            entity,
            metadata: Metadata::new(),
        })
    }

    /// Metadata written with the object.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Check the key exists, then overwrite it.
    pub async fn execute(self) -> IdentityResult<Entity> {
        let key = self.config.key_for(self.id);

        if !self.store.exists(&key).await? {
            warn!(%key, "replace target not found");
            return Err(IdentityError::NotFound { key: key.full() });
        }

        let request = PutRequest::new(key.clone(), self.entity.to_json_bytes()?, self.config.acl())
            .with_metadata(self.metadata)
            .keep_metadata(true);
        self.store.put_object(request).await?;

        info!(%key, id = %self.id, "entity replaced");
        Ok(self.entity)
    }
}
