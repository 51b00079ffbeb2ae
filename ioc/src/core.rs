//! Core keys and references shared by every part of the container.

use crate::error::{ContainerError, Result};
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};

thread_local! {
  // The (container id, concrete type) pairs currently being constructed on this
  // thread, in the order construction started. Reentering a pair is a cycle.
  static RESOLVING_STACK: RefCell<Vec<(u64, TypeKey)>> = const { RefCell::new(Vec::new()) };
}

/// An RAII guard that detects dependency cycles during construction.
///
/// Creating the guard pushes the type onto the thread-local resolution stack and
/// fails with [`ContainerError::CyclicDependency`] if the same container is
/// already constructing that type further up the stack. Dropping the guard pops
/// the entry again.
pub(crate) struct ResolutionGuard {
  container: u64,
  key: TypeKey,
}

impl ResolutionGuard {
  pub(crate) fn new(container: u64, key: TypeKey) -> Result<Self> {
    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      let start = stack
        .iter()
        .position(|(owner, entry)| *owner == container && *entry == key);

      if let Some(start) = start {
        let path = stack[start..]
          .iter()
          .filter(|(owner, _)| *owner == container)
          .map(|(_, entry)| entry.name())
          .chain(std::iter::once(key.name()))
          .collect::<Vec<_>>()
          .join(" -> ");
        return Err(ContainerError::CyclicDependency { path });
      }

      stack.push((container, key));
      Ok(())
    })?;

    Ok(Self { container, key })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      if let Some(index) = stack
        .iter()
        .rposition(|(owner, entry)| *owner == self.container && *entry == self.key)
      {
        stack.remove(index);
      }
    });
  }
}

/// Identifies a type known to the container: a concrete struct, an abstract
/// family (usually a `dyn Trait`), or one of the primitive scalars.
///
/// Equality and hashing only consider the [`TypeId`]; the name is kept for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
  id: TypeId,
  name: &'static str,
}

impl TypeKey {
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      id: TypeId::of::<T>(),
      name: std::any::type_name::<T>(),
    }
  }

  pub fn id(&self) -> TypeId {
    self.id
  }

  pub fn name(&self) -> &'static str {
    self.name
  }
}

impl PartialEq for TypeKey {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

impl fmt::Debug for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "TypeKey({})", self.name)
  }
}

impl fmt::Display for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name)
  }
}

/// The declared type of a constructor parameter: either a single type or a
/// list over an abstract family.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TypeRef {
  Type(TypeKey),
  ListOf(TypeKey),
}

impl TypeRef {
  pub fn of<T: ?Sized + Any>() -> Self {
    TypeRef::Type(TypeKey::of::<T>())
  }

  pub fn list_of<T: ?Sized + Any>() -> Self {
    TypeRef::ListOf(TypeKey::of::<T>())
  }
}

impl From<TypeKey> for TypeRef {
  fn from(key: TypeKey) -> Self {
    TypeRef::Type(key)
  }
}

impl fmt::Display for TypeRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TypeRef::Type(key) => write!(f, "{}", key),
      TypeRef::ListOf(key) => write!(f, "Vec<{}>", key),
    }
  }
}

/// What a caller asks the container for.
///
/// The classification happens once, at the call boundary: a type, a list over
/// an abstract family, or a string name looked up among named services and
/// then parameters.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Reference {
  Type(TypeKey),
  ListOf(TypeKey),
  Name(String),
}

impl Reference {
  pub fn of<T: ?Sized + Any>() -> Self {
    Reference::Type(TypeKey::of::<T>())
  }

  pub fn list_of<T: ?Sized + Any>() -> Self {
    Reference::ListOf(TypeKey::of::<T>())
  }
}

impl From<TypeKey> for Reference {
  fn from(key: TypeKey) -> Self {
    Reference::Type(key)
  }
}

impl From<TypeRef> for Reference {
  fn from(ty: TypeRef) -> Self {
    match ty {
      TypeRef::Type(key) => Reference::Type(key),
      TypeRef::ListOf(key) => Reference::ListOf(key),
    }
  }
}

impl From<&str> for Reference {
  fn from(name: &str) -> Self {
    Reference::Name(name.to_owned())
  }
}

impl From<String> for Reference {
  fn from(name: String) -> Self {
    Reference::Name(name)
  }
}

impl fmt::Display for Reference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Reference::Type(key) => write!(f, "{}", key),
      Reference::ListOf(key) => write!(f, "Vec<{}>", key),
      Reference::Name(name) => write!(f, "'{}'", name),
    }
  }
}

/// The key of a slot in the service registry.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum ServiceKey {
  Type(TypeKey),
  Name(String),
}

impl ServiceKey {
  pub fn of<T: ?Sized + Any>() -> Self {
    ServiceKey::Type(TypeKey::of::<T>())
  }
}

impl From<TypeKey> for ServiceKey {
  fn from(key: TypeKey) -> Self {
    ServiceKey::Type(key)
  }
}

impl From<&str> for ServiceKey {
  fn from(name: &str) -> Self {
    ServiceKey::Name(name.to_owned())
  }
}

impl From<String> for ServiceKey {
  fn from(name: String) -> Self {
    ServiceKey::Name(name)
  }
}

impl fmt::Display for ServiceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ServiceKey::Type(key) => write!(f, "{}", key),
      ServiceKey::Name(name) => f.write_str(name),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Alpha;
  struct Beta;

  #[test]
  fn type_keys_compare_by_type_id() {
    assert_eq!(TypeKey::of::<Alpha>(), TypeKey::of::<Alpha>());
    assert_ne!(TypeKey::of::<Alpha>(), TypeKey::of::<Beta>());
    assert!(TypeKey::of::<Alpha>().name().ends_with("Alpha"));
  }

  #[test]
  fn guard_reports_cycle_path() {
    let alpha = TypeKey::of::<Alpha>();
    let beta = TypeKey::of::<Beta>();

    let _outer = ResolutionGuard::new(1, alpha).unwrap();
    let _inner = ResolutionGuard::new(1, beta).unwrap();
    let err = ResolutionGuard::new(1, alpha).err().unwrap();

    match err {
      ContainerError::CyclicDependency { path } => {
        assert_eq!(path.matches(" -> ").count(), 2);
        assert!(path.starts_with(alpha.name()));
        assert!(path.ends_with(alpha.name()));
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn guard_is_scoped_per_container_and_released_on_drop() {
    let alpha = TypeKey::of::<Alpha>();

    let first = ResolutionGuard::new(7, alpha).unwrap();
    // Another container may build the same type at the same time.
    let _other = ResolutionGuard::new(8, alpha).unwrap();
    drop(first);

    assert!(ResolutionGuard::new(7, alpha).is_ok());
  }
}
