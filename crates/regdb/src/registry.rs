use crate::Error;
use regdb_core::{
    accounting::{LocalPersonalObjectAccounting, PersonalObjectAccounting},
    auth::{Authenticator, MaintainerCredentials},
    config::RegistryConfig,
    error::{LookupError, UpdateError},
    index::IndexRegistry,
    model::{AttributeType, CiString, ObjectType, Record, RecordHandle},
    obs::{self, MetricsReport},
    pipeline::{UpdatePipeline, UpdateRequest},
    store::{MemoryStore, RecordLookup, RecordStore},
    update::{Credentials, UpdateContext},
    validate::ValidatorRegistry,
};
use std::{path::Path, sync::Arc};
use tracing::info;

///
/// Registry
///
/// A fully wired write path over the in-memory store: default strategies,
/// validators and index map, configured from `RegistryConfig`.
///

pub struct Registry {
    config: RegistryConfig,
    store: Arc<MemoryStore>,
    pipeline: UpdatePipeline,
    accounting: Option<LocalPersonalObjectAccounting>,
}

impl Registry {
    pub fn from_config(config: RegistryConfig) -> Result<Self, Error> {
        config.validate()?;

        let store = Arc::new(MemoryStore::new());
        let indexes = Arc::new(IndexRegistry::with_defaults());
        let authenticator = Authenticator::with_defaults(
            store.clone(),
            Arc::new(MaintainerCredentials),
            config.principal_policy(),
        );
        let validators = ValidatorRegistry::with_defaults(store.clone(), indexes.clone());
        let pipeline = UpdatePipeline::new(store.clone(), indexes, authenticator, validators)
            .with_retry_policy(config.retry_policy())
            .with_source(config.source.name.as_str());

        info!(
            source = %config.source.name,
            attempts = config.retry.attempts,
            "registry ready"
        );

        Ok(Self {
            accounting: config.accounting(),
            config,
            store,
            pipeline,
        })
    }

    /// Load configuration from a TOML file and build the registry.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::from_config(RegistryConfig::from_file(path)?)
    }

    /// Registry with every configuration default.
    pub fn in_memory() -> Result<Self, Error> {
        Self::from_config(RegistryConfig::default())
    }

    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Bootstrap records without authentication or validation, indexed like
    /// any other write.
    pub fn seed(&self, records: impl IntoIterator<Item = Record>) -> Result<Vec<Record>, Error> {
        Ok(self.store.load(self.pipeline.indexes(), records)?)
    }

    pub fn submit(&self, request: UpdateRequest) -> UpdateContext {
        self.pipeline.process(request)
    }

    /// Submit record text. The stored object with the same type and key, if
    /// any, becomes the reference.
    pub fn submit_text(
        &self,
        text: &str,
        delete_requested: bool,
        credentials: impl Into<Credentials>,
    ) -> Result<UpdateContext, Error> {
        let submitted =
            Record::parse(text).map_err(|err| UpdateError::Malformed(err.into()))?;
        let reference = match self
            .store
            .get_by_key(submitted.object_type(), submitted.key())
        {
            Ok(record) => Some(record),
            Err(LookupError::NotFound { .. }) => None,
            Err(err) => return Err(err.into()),
        };

        Ok(self.submit(UpdateRequest {
            reference,
            submitted: Some(submitted),
            delete_requested,
            credentials: credentials.into(),
        }))
    }

    pub fn lookup(&self, object_type: ObjectType, key: &str) -> Result<Record, Error> {
        Ok(self.store.get_by_key(object_type, &CiString::new(key))?)
    }

    pub fn find(&self, attribute: AttributeType, value: &str) -> Result<Vec<RecordHandle>, Error> {
        Ok(self
            .store
            .find_in_index(self.pipeline.indexes(), attribute, &CiString::new(value))?)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Read-path accounting, when enabled.
    #[must_use]
    pub fn accounting(&self) -> Option<&dyn PersonalObjectAccounting> {
        self.accounting
            .as_ref()
            .map(|accounting| accounting as &dyn PersonalObjectAccounting)
    }

    #[must_use]
    pub fn metrics() -> MetricsReport {
        obs::metrics_report()
    }
}
