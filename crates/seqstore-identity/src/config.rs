use seqstore_store::{CannedAcl, ObjectKey};

use crate::entity::EntityId;
use crate::error::{IdentityError, IdentityResult};

/// Where and how entities are written.
///
/// Built once at startup through [`WriterConfigBuilder`], which rejects a
/// missing extension or ACL, then shared by reference with every writer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriterConfig {
    prefix: String,
    extension: String,
    identity_key: Option<String>,
    acl: CannedAcl,
}

impl WriterConfig {
    pub fn builder() -> WriterConfigBuilder {
        WriterConfigBuilder::default()
    }

    /// Folder-like key prefix including its trailing delimiter, possibly empty.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// File extension including the dot, e.g. `.json`.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Entity field that carries the id, if ids are stamped on entities.
    pub fn identity_key(&self) -> Option<&str> {
        self.identity_key.as_deref()
    }

    pub fn acl(&self) -> CannedAcl {
        self.acl
    }

    /// The object key an entity with `id` is stored under.
    pub fn key_for(&self, id: EntityId) -> ObjectKey {
        ObjectKey::new(self.prefix.clone(), format!("{id}{}", self.extension))
    }
}

/// Builder for [`WriterConfig`].
#[derive(Clone, Debug, Default)]
pub struct WriterConfigBuilder {
    prefix: String,
    extension: Option<String>,
    identity_key: Option<String>,
    acl: Option<CannedAcl>,
}

impl WriterConfigBuilder {
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// An empty name is treated as "not configured".
    pub fn identity_key(mut self, identity_key: Option<impl Into<String>>) -> Self {
        self.identity_key = identity_key.map(Into::into).filter(|k| !k.is_empty());
        self
    }

    pub fn acl(mut self, acl: CannedAcl) -> Self {
        self.acl = Some(acl);
        self
    }

    pub fn build(self) -> IdentityResult<WriterConfig> {
        let extension = self
            .extension
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| IdentityError::InvalidConfig("invalid extension".into()))?;
        let acl = self
            .acl
            .ok_or_else(|| IdentityError::InvalidConfig("invalid S3 ACL".into()))?;

        Ok(WriterConfig {
            prefix: self.prefix,
            extension,
            identity_key: self.identity_key,
            acl,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WriterConfig {
        WriterConfig::builder()
            .prefix("p/")
            .extension(".json")
            .identity_key(Some("id"))
            .acl(CannedAcl::Private)
            .build()
            .unwrap()
    }

    #[test]
    fn builds_with_all_settings() {
        let c = config();
        assert_eq!(c.prefix(), "p/");
        assert_eq!(c.extension(), ".json");
        assert_eq!(c.identity_key(), Some("id"));
        assert_eq!(c.acl(), CannedAcl::Private);
    }

    #[test]
    fn key_for_joins_prefix_id_extension() {
        let key = config().key_for(EntityId::new(5).unwrap());
        assert_eq!(key.full(), "p/5.json");
    }

    #[test]
    fn missing_extension_is_rejected() {
        let err = WriterConfig::builder()
            .acl(CannedAcl::Private)
            .build()
            .unwrap_err();
        assert!(matches!(err, IdentityError::InvalidConfig(ref m) if m.contains("extension")));

        let err = WriterConfig::builder()
            .extension("")
            .acl(CannedAcl::Private)
            .build()
            .unwrap_err();
        assert!(matches!(err, IdentityError::InvalidConfig(_)));
    }

    #[test]
    fn missing_acl_is_rejected() {
        let err = WriterConfig::builder().extension(".json").build().unwrap_err();
        assert!(matches!(err, IdentityError::InvalidConfig(ref m) if m.contains("ACL")));
    }

    #[test]
    fn empty_identity_key_means_none() {
        let c = WriterConfig::builder()
            .extension(".json")
            .identity_key(Some(""))
            .acl(CannedAcl::Private)
            .build()
            .unwrap();
        assert_eq!(c.identity_key(), None);

        let c = WriterConfig::builder()
            .extension(".json")
            .identity_key(None::<String>)
            .acl(CannedAcl::Private)
            .build()
            .unwrap();
        assert_eq!(c.identity_key(), None);
    }

    #[test]
    fn prefix_defaults_to_bucket_root() {
        let c = WriterConfig::builder()
            .extension(".json")
            .acl(CannedAcl::Private)
            .build()
            .unwrap();
        assert_eq!(c.prefix(), "");
        assert_eq!(c.key_for(EntityId::FIRST).full(), "1.json");
    }
}
