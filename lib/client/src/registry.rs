//! Client registry.
//!
//! Maps client IDs handed out by the connect node to the connection settings
//! they were created with. Entries live for the lifetime of the registry.

use crate::config::ConnectionConfig;
use seatable_core::ClientId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Shared registry of SeaTable connections.
///
/// Cloning is cheap and clones share the same underlying map. Lookups take a
/// read lock; registration takes the write lock. No lock is held across an
/// await point.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    clients: Arc<RwLock<HashMap<ClientId, Arc<ConnectionConfig>>>>,
}

impl ClientRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a connection and returns the freshly generated ID for it.
    pub fn register(&self, config: ConnectionConfig) -> ClientId {
        let id = ClientId::generate(config.base_uuid());
        // Inserts are single statements, so a poisoned map is still consistent.
        let mut clients = self.clients.write().unwrap_or_else(PoisonError::into_inner);
        clients.insert(id.clone(), Arc::new(config));
        debug!(client_id = %id, clients = clients.len(), "registered client");
        id
    }

    /// Looks up the connection registered under `id`.
    #[must_use]
    pub fn lookup(&self, id: &ClientId) -> Option<Arc<ConnectionConfig>> {
        let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);
        clients.get(id).cloned()
    }

    /// Returns the number of registered clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no client has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base: &str) -> ConnectionConfig {
        ConnectionConfig::new("https://cloud.seatable.io", base, "token")
    }

    #[test]
    fn register_then_lookup_returns_config() {
        let registry = ClientRegistry::new();
        let id = registry.register(config("base-a"));

        let found = registry.lookup(&id).expect("registered");
        assert_eq!(*found, config("base-a"));
    }

    #[test]
    fn lookup_unknown_id_is_none() {
        let registry = ClientRegistry::new();
        registry.register(config("base-a"));

        assert!(registry.lookup(&ClientId::from("st_nope_0")).is_none());
    }

    #[test]
    fn repeated_connects_get_distinct_ids() {
        let registry = ClientRegistry::new();
        let first = registry.register(config("base-a"));
        let second = registry.register(config("base-a"));

        assert_ne!(first, second);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn clones_share_entries() {
        let registry = ClientRegistry::new();
        let other = registry.clone();
        let id = registry.register(config("base-a"));

        assert!(other.lookup(&id).is_some());
    }

    #[test]
    fn concurrent_register_and_lookup() {
        let registry = ClientRegistry::new();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    let id = registry.register(config(&format!("base-{i}")));
                    for _ in 0..100 {
                        assert!(registry.lookup(&id).is_some());
                    }
                    id
                })
            })
            .collect();

        let ids: Vec<ClientId> = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .collect();

        assert_eq!(registry.len(), 8);
        for id in &ids {
            assert!(registry.lookup(id).is_some());
        }
    }
}
