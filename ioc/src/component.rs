//! Declared constructors: parameters, arguments and the `Component` trait.

use crate::core::{TypeKey, TypeRef};
use crate::error::{ContainerError, Result};
use crate::parameters::Scalar;
use crate::service::Value;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// One named, typed constructor parameter.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Param {
  name: String,
  ty: TypeRef,
}

impl Param {
  pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
    Self {
      name: name.into(),
      ty,
    }
  }

  pub fn text(name: impl Into<String>) -> Self {
    Self::new(name, TypeRef::of::<String>())
  }

  pub fn integer(name: impl Into<String>) -> Self {
    Self::new(name, TypeRef::of::<i64>())
  }

  pub fn real(name: impl Into<String>) -> Self {
    Self::new(name, TypeRef::of::<f64>())
  }

  /// A dependency on a service: a concrete type or an abstract family.
  pub fn of<T: ?Sized + Any>(name: impl Into<String>) -> Self {
    Self::new(name, TypeRef::of::<T>())
  }

  /// A dependency on every implementation of an abstract family.
  pub fn list_of<T: ?Sized + Any>(name: impl Into<String>) -> Self {
    Self::new(name, TypeRef::list_of::<T>())
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn ty(&self) -> &TypeRef {
    &self.ty
  }
}

/// A type the container knows how to build.
///
/// `parameters` declares the constructor signature; the container resolves a
/// value for each parameter and passes them to `construct`.
///
/// ```
/// use weft_ioc::{Arguments, Component, Param, Result};
/// use std::sync::Arc;
///
/// struct Database {
///   url: String,
/// }
///
/// impl Component for Database {
///   fn parameters() -> Vec<Param> {
///     vec![Param::text("database_url")]
///   }
///
///   fn construct(args: &Arguments) -> Result<Self> {
///     Ok(Database { url: args.text("database_url")? })
///   }
/// }
///
/// struct UserRepository {
///   db: Arc<Database>,
/// }
///
/// impl Component for UserRepository {
///   fn parameters() -> Vec<Param> {
///     vec![Param::of::<Database>("db")]
///   }
///
///   fn construct(args: &Arguments) -> Result<Self> {
///     Ok(UserRepository { db: args.service("db")? })
///   }
/// }
/// ```
pub trait Component: Any + Send + Sync + Sized {
  fn parameters() -> Vec<Param> {
    Vec::new()
  }

  fn construct(args: &Arguments) -> Result<Self>;
}

/// The resolved constructor arguments for one type, keyed by parameter name.
#[derive(Clone, Debug)]
pub struct Arguments {
  owner: TypeKey,
  values: HashMap<String, Value>,
}

impl Arguments {
  pub fn new(owner: TypeKey) -> Self {
    Self {
      owner,
      values: HashMap::new(),
    }
  }

  pub fn insert(&mut self, name: impl Into<String>, value: Value) {
    self.values.insert(name.into(), value);
  }

  /// The type these arguments are meant for.
  pub fn owner(&self) -> TypeKey {
    self.owner
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn value(&self, name: &str) -> Result<&Value> {
    self
      .values
      .get(name)
      .ok_or_else(|| ContainerError::MissingArgument {
        owner: self.owner.name().to_owned(),
        argument: name.to_owned(),
      })
  }

  pub fn scalar(&self, name: &str) -> Result<&Scalar> {
    self
      .value(name)?
      .as_scalar()
      .ok_or_else(|| self.mismatch(name, "a scalar".to_owned()))
  }

  pub fn text(&self, name: &str) -> Result<String> {
    self
      .scalar(name)?
      .as_text()
      .map(str::to_owned)
      .ok_or_else(|| self.mismatch(name, "text".to_owned()))
  }

  pub fn integer(&self, name: &str) -> Result<i64> {
    self
      .scalar(name)?
      .as_integer()
      .ok_or_else(|| self.mismatch(name, "an integer".to_owned()))
  }

  pub fn real(&self, name: &str) -> Result<f64> {
    self
      .scalar(name)?
      .as_real()
      .ok_or_else(|| self.mismatch(name, "a real".to_owned()))
  }

  /// The service passed for `name`, viewed as `T`.
  pub fn service<T: ?Sized + Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    self
      .value(name)?
      .as_service()
      .and_then(|service| service.get::<T>())
      .ok_or_else(|| self.mismatch(name, format!("a service of type {}", std::any::type_name::<T>())))
  }

  /// The list of services passed for `name`, each viewed as `T`.
  pub fn services<T: ?Sized + Any + Send + Sync>(&self, name: &str) -> Result<Vec<Arc<T>>> {
    let expected = || format!("a list of {}", std::any::type_name::<T>());
    let list = self
      .value(name)?
      .as_list()
      .ok_or_else(|| self.mismatch(name, expected()))?;

    list
      .iter()
      .map(|service| service.get::<T>().ok_or_else(|| self.mismatch(name, expected())))
      .collect()
  }

  fn mismatch(&self, name: &str, expected: String) -> ContainerError {
    ContainerError::ArgumentMismatch {
      owner: self.owner.name().to_owned(),
      argument: name.to_owned(),
      expected,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::service::Service;

  struct Owner;
  struct Engine {
    power: i64,
  }

  fn arguments() -> Arguments {
    let mut args = Arguments::new(TypeKey::of::<Owner>());
    args.insert("name", Value::from("weft"));
    args.insert("retries", Value::from(3));
    args.insert("engine", Value::from(Service::new(Engine { power: 9 })));
    args
  }

  #[test]
  fn typed_accessors_read_matching_values() {
    let args = arguments();

    assert_eq!(args.text("name").unwrap(), "weft");
    assert_eq!(args.integer("retries").unwrap(), 3);
    assert_eq!(args.service::<Engine>("engine").unwrap().power, 9);
    assert_eq!(args.len(), 3);
  }

  #[test]
  fn accessors_report_missing_and_mismatched_arguments() {
    let args = arguments();

    assert!(matches!(
      args.text("color"),
      Err(ContainerError::MissingArgument { ref argument, .. }) if argument == "color"
    ));
    assert!(matches!(
      args.text("retries"),
      Err(ContainerError::ArgumentMismatch { ref argument, .. }) if argument == "retries"
    ));
    assert!(matches!(
      args.service::<Owner>("engine"),
      Err(ContainerError::ArgumentMismatch { .. })
    ));
    assert!(matches!(
      args.services::<Engine>("engine"),
      Err(ContainerError::ArgumentMismatch { .. })
    ));
  }

  #[test]
  fn param_helpers_declare_scalar_types() {
    assert_eq!(Param::text("a").ty(), &TypeRef::of::<String>());
    assert_eq!(Param::integer("b").ty(), &TypeRef::of::<i64>());
    assert_eq!(Param::real("c").ty(), &TypeRef::of::<f64>());
    assert_eq!(Param::list_of::<Engine>("d").ty(), &TypeRef::ListOf(TypeKey::of::<Engine>()));
  }
}
