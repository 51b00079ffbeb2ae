//! The per-container store of constructed services.

use crate::core::ServiceKey;
use crate::error::{ContainerError, Result};
use crate::service::Service;
use crate::types::TypeIntrospector;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Holds at most one service per key. Entries are never replaced.
pub struct ServiceRegistry {
  services: DashMap<ServiceKey, Service>,
  types: Arc<dyn TypeIntrospector>,
}

impl ServiceRegistry {
  pub fn new(types: Arc<dyn TypeIntrospector>) -> Self {
    Self {
      services: DashMap::new(),
      types,
    }
  }

  pub fn has(&self, key: &ServiceKey) -> bool {
    self.services.contains_key(key)
  }

  pub fn get(&self, key: &ServiceKey) -> Option<Service> {
    self.services.get(key).map(|entry| entry.value().clone())
  }

  /// Stores `service` under `key`.
  ///
  /// Fails if the key is taken, or if the service's own type is abstract.
  pub fn set(&self, key: ServiceKey, service: Service) -> Result<()> {
    self.check_instantiable(&service)?;

    match self.services.entry(key) {
      Entry::Occupied(entry) => Err(ContainerError::DuplicateService(entry.key().to_string())),
      Entry::Vacant(entry) => {
        debug!(key = %entry.key(), ty = %service.type_key(), "service registered");
        entry.insert(service);
        Ok(())
      }
    }
  }

  /// Stores a freshly constructed service, or returns the one that is
  /// already there.
  ///
  /// When two threads race to build the same type, the first to commit wins
  /// and the other receives the winner's instance.
  pub(crate) fn commit(&self, key: ServiceKey, service: Service) -> Result<Service> {
    self.check_instantiable(&service)?;

    match self.services.entry(key) {
      Entry::Occupied(entry) => {
        debug!(key = %entry.key(), "service committed concurrently, reusing the first instance");
        Ok(entry.get().clone())
      }
      Entry::Vacant(entry) => {
        debug!(key = %entry.key(), "service constructed");
        entry.insert(service.clone());
        Ok(service)
      }
    }
  }

  pub fn len(&self) -> usize {
    self.services.len()
  }

  pub fn is_empty(&self) -> bool {
    self.services.is_empty()
  }

  fn check_instantiable(&self, service: &Service) -> Result<()> {
    if self.types.is_abstract(&service.type_key()) {
      return Err(ContainerError::AbstractInstance(
        service.type_key().name().to_owned(),
      ));
    }
    Ok(())
  }
}
