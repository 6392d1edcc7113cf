use aliases_core::KvStore;
use aliases_engine::{AliasStore, Registry};

/// Shared handler state: the definition registry and the alias store over
/// one backend.
pub struct AppState<S> {
    registry: Registry<S>,
    store: AliasStore<S>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            store: self.store.clone(),
        }
    }
}

impl<S: KvStore> AppState<S> {
    pub fn new(registry: Registry<S>, store: AliasStore<S>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &Registry<S> {
        &self.registry
    }

    pub fn store(&self) -> &AliasStore<S> {
        &self.store
    }
}
