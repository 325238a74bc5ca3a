use std::sync::Arc;

use seqstore_identity::WriterConfig;
use seqstore_store::ObjectStore;

use crate::config::ServiceConfig;
use crate::error::ServerResult;

/// Shared, read-only state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub writer: Arc<WriterConfig>,
    pub metadata_keys: Arc<Option<Vec<String>>>,
    /// Name reported in "Missing identifier" responses.
    pub identity_label: Arc<str>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        writer: WriterConfig,
        metadata_keys: Option<Vec<String>>,
    ) -> Self {
        let identity_label: Arc<str> = Arc::from(writer.identity_key().unwrap_or("id"));
        Self {
            store,
            writer: Arc::new(writer),
            metadata_keys: Arc::new(metadata_keys),
            identity_label,
        }
    }

    /// Validate the writer settings and build the configured backend.
    pub fn from_config(config: &ServiceConfig) -> ServerResult<Self> {
        let writer = config.writer_config()?;
        let store = config.build_store()?;
        Ok(Self::new(store, writer, config.metadata_keys.clone()))
    }

    pub fn metadata_keys(&self) -> Option<&[String]> {
        self.metadata_keys.as_deref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("writer", &self.writer)
            .field("metadata_keys", &self.metadata_keys)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Backend;
    use seqstore_store::CannedAcl;

    #[test]
    fn from_memory_config() {
        let config = ServiceConfig {
            backend: Backend::Memory,
            prefix: "p/".into(),
            extension: Some(".json".into()),
            acl: Some(CannedAcl::Private),
            identity_key: Some("entityId".into()),
            metadata_keys: Some(vec!["X-A".into()]),
            ..Default::default()
        };
        let state = AppState::from_config(&config).unwrap();
        assert_eq!(state.writer.prefix(), "p/");
        assert_eq!(&*state.identity_label, "entityId");
        assert_eq!(state.metadata_keys(), Some(&["X-A".to_string()][..]));
    }

    #[test]
    fn identity_label_defaults_to_id() {
        for identity_key in [None, Some(String::new())] {
            let config = ServiceConfig {
                backend: Backend::Memory,
                extension: Some(".json".into()),
                acl: Some(CannedAcl::Private),
                identity_key,
                ..Default::default()
            };
            let state = AppState::from_config(&config).unwrap();
            assert_eq!(&*state.identity_label, "id");
        }
    }

    #[test]
    fn invalid_writer_settings_fail_at_startup() {
        let config = ServiceConfig {
            backend: Backend::Memory,
            ..Default::default()
        };
        assert!(AppState::from_config(&config).is_err());
    }
}
