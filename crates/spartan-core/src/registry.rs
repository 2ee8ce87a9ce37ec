use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::interface_map::InterfaceMap;
use crate::traits::Codec;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("module '{0}' already registered")]
    DuplicateRegistration(String),
    #[error("module '{0}' is not registered")]
    NotRegistered(String),
}

type Factory<T> = Box<dyn Fn(&mut InterfaceMap) -> anyhow::Result<T> + Send + Sync>;

/// A name→factory registry, one per module capability (inputs, filters,
/// outputs). Registries are populated once at startup and read-only
/// thereafter; registering a duplicate name is refused rather than silently
/// overwriting the previous entry, matching the startup-fatal semantics the
/// engine requires of duplicate module registration.
pub struct Registry<T> {
    factories: Mutex<HashMap<String, Factory<T>>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            factories: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, name: impl Into<String>, factory: F) -> Result<(), RegistryError>
    where
        F: Fn(&mut InterfaceMap) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let name = name.into();
        let mut guard = self.factories.lock().expect("registry mutex poisoned");
        if guard.contains_key(&name) {
            return Err(RegistryError::DuplicateRegistration(name));
        }
        guard.insert(name, Box::new(factory));
        Ok(())
    }

    pub fn create(&self, name: &str, options: &mut InterfaceMap) -> anyhow::Result<T> {
        let guard = self.factories.lock().expect("registry mutex poisoned");
        let factory = guard
            .get(name)
            .ok_or_else(|| RegistryError::NotRegistered(name.to_string()))?;
        factory(options)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.lock().expect("registry mutex poisoned").contains_key(name)
    }
}

/// Codecs are registered as pre-built singleton instances rather than
/// factories, since a codec carries no per-invocation configuration beyond
/// its name.
#[derive(Default)]
pub struct CodecRegistry {
    codecs: Mutex<HashMap<String, Arc<dyn Codec>>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, codec: Arc<dyn Codec>) -> Result<(), RegistryError> {
        let name = name.into();
        let mut guard = self.codecs.lock().expect("codec registry mutex poisoned");
        if guard.contains_key(&name) {
            return Err(RegistryError::DuplicateRegistration(name));
        }
        guard.insert(name, codec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Codec>, RegistryError> {
        self.codecs
            .lock()
            .expect("codec registry mutex poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotRegistered(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_registration_is_refused() {
        let registry: Registry<i32> = Registry::new();
        registry.register("a", |_opts| Ok(1)).unwrap();
        let err = registry.register("a", |_opts| Ok(2)).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateRegistration(name) if name == "a"));
    }

    #[test]
    fn create_runs_the_stored_factory() {
        let registry: Registry<i32> = Registry::new();
        registry.register("doubler", |_opts| Ok(42)).unwrap();
        let mut opts = InterfaceMap::new();
        assert_eq!(registry.create("doubler", &mut opts).unwrap(), 42);
    }

    #[test]
    fn unregistered_name_errors() {
        let registry: Registry<i32> = Registry::new();
        let mut opts = InterfaceMap::new();
        assert!(registry.create("missing", &mut opts).is_err());
    }
}
