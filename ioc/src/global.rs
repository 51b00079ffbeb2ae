//! The process-wide type registry.

use crate::types::TypeRegistry;
use once_cell::sync::Lazy;

// Created on first access. Only type declarations live here; services are
// always owned by a container.
static GLOBAL_TYPES: Lazy<TypeRegistry> = Lazy::new(TypeRegistry::new);

/// Provides a reference to the global type registry.
///
/// Plugins can declare their types from anywhere in an application, and any
/// number of containers can be built on top of the same declarations without
/// sharing a single service.
///
/// # Examples
///
/// ```
/// use weft_ioc::{types, Container};
///
/// #[derive(Default)]
/// struct Clock;
///
/// types().register_default::<Clock>();
///
/// let container = Container::new(types());
/// assert!(container.resolve::<Clock>().is_ok());
/// ```
pub fn types() -> &'static TypeRegistry {
  &GLOBAL_TYPES
}
