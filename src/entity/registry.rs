//! Registry of entity descriptors, keyed by Rust type.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use super::{Entity, EntityDescriptor};
use crate::error::OomError;

static GLOBAL: Lazy<EntityRegistry> = Lazy::new(EntityRegistry::new);

/// Append-only map from entity type to its descriptor.
///
/// Registration is idempotent. When two threads register the same type at
/// once, both get the descriptor that landed first.
#[derive(Default)]
pub struct EntityRegistry {
    entries: RwLock<HashMap<TypeId, Arc<EntityDescriptor>>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T`, returning the cached descriptor if it is already known.
    ///
    /// # Errors
    ///
    /// Returns `OomError::InvalidEntity` when the metadata is inconsistent.
    pub fn register<T: Entity>(&self) -> Result<Arc<EntityDescriptor>, OomError> {
        let key = TypeId::of::<T>();
        if let Some(existing) = self.entries.read().get(&key) {
            return Ok(Arc::clone(existing));
        }

        let descriptor = Arc::new(EntityDescriptor::from_meta(T::metadata())?);
        let mut entries = self.entries.write();
        let stored = entries.entry(key).or_insert_with(|| {
            log::debug!(
                "registered entity {} -> {} ({} columns)",
                descriptor.type_name(),
                descriptor.table_reference(),
                descriptor.columns().len()
            );
            descriptor
        });
        Ok(Arc::clone(stored))
    }

    /// Descriptor for `T`.
    ///
    /// # Errors
    ///
    /// Returns `OomError::UnregisteredEntity` when `T` was never registered.
    pub fn lookup<T: Entity>(&self) -> Result<Arc<EntityDescriptor>, OomError> {
        self.entries
            .read()
            .get(&TypeId::of::<T>())
            .cloned()
            .ok_or(OomError::UnregisteredEntity {
                entity: type_name::<T>(),
            })
    }

    pub fn is_registered<T: Entity>(&self) -> bool {
        self.entries.read().contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// The process-wide registry used by the statement builders
pub fn registry() -> &'static EntityRegistry {
    &GLOBAL
}

/// Register `T` in the process-wide registry.
pub fn register_entity<T: Entity>() -> Result<Arc<EntityDescriptor>, OomError> {
    GLOBAL.register::<T>()
}

/// Look up `T` in the process-wide registry.
pub fn lookup_entity<T: Entity>() -> Result<Arc<EntityDescriptor>, OomError> {
    GLOBAL.lookup::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::fixtures::{GirlBoy, Orphan, Tester};
    use std::thread;

    #[test]
    fn test_register_is_idempotent() {
        let registry = EntityRegistry::new();
        let first = registry.register::<Tester>().expect("register");
        let second = registry.register::<Tester>().expect("register again");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_unregistered() {
        let registry = EntityRegistry::new();
        assert!(registry.is_empty());
        match registry.lookup::<Orphan>() {
            Err(OomError::UnregisteredEntity { entity }) => assert!(entity.ends_with("Orphan")),
            other => panic!("expected UnregisteredEntity, got {other:?}"),
        }
    }

    #[test]
    fn test_lookup_matches_register() {
        let registry = EntityRegistry::new();
        let registered = registry.register::<GirlBoy>().expect("register");
        let found = registry.lookup::<GirlBoy>().expect("lookup");
        assert_eq!(*registered, *found);
        assert!(registry.is_registered::<GirlBoy>());
        assert!(!registry.is_registered::<Tester>());
    }

    #[test]
    fn test_concurrent_registration_keeps_one_descriptor() {
        let registry = Arc::new(EntityRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.register::<Tester>().expect("register"))
            })
            .collect();
        let descriptors: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread"))
            .collect();
        assert!(descriptors.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_global_registry() {
        register_entity::<Tester>().expect("register");
        assert_eq!(lookup_entity::<Tester>().expect("lookup").table_name(), "TESTER");
        assert!(registry().is_registered::<Tester>());
    }
}
