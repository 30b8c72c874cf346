//! Shared fixtures for unit tests.

use crate::{
    auth::sha256_hex,
    index::IndexRegistry,
    model::Record,
    store::MemoryStore,
    update::{Credential, Credentials, UpdateContext},
};
use std::sync::Arc;

pub(crate) fn record(text: &str) -> Record {
    Record::parse(text).expect("fixture record parses")
}

/// Self-maintained mntner whose only auth is a SHA2 hash of `password`.
pub(crate) fn mntner(key: &str, password: &str) -> Record {
    record(&format!(
        "mntner: {key}\nauth: SHA2-PW {}\nmnt-by: {key}\nsource: TEST\n",
        sha256_hex(password)
    ))
}

pub(crate) fn empty_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

pub(crate) fn seeded_store(records: impl IntoIterator<Item = Record>) -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store
        .load(&IndexRegistry::with_defaults(), records)
        .expect("fixture records load");

    Arc::new(store)
}

/// Stored copy of `key`, with its object id.
pub(crate) fn stored(store: &MemoryStore, object_type: crate::model::ObjectType, key: &str) -> Record {
    use crate::store::RecordLookup;

    store
        .get_by_key(object_type, &key.into())
        .expect("fixture record is stored")
}

pub(crate) fn password_context(password: &str) -> UpdateContext {
    UpdateContext::new(Credentials::new(vec![Credential::Password(
        password.to_string(),
    )]))
}
