//! Build schemes: explicit construction recipes that override default
//! argument resolution for one type.

use crate::core::{TypeKey, TypeRef};
use crate::error::{ContainerError, Result};
use crate::service::Value;
use std::any::Any;
use std::collections::HashMap;
use tracing::warn;

/// Selects which constructor argument an override applies to.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum ArgumentKey {
  /// The argument with this parameter name.
  Name(String),
  /// Any argument declared with this type.
  Type(TypeRef),
}

/// What a build scheme supplies for an argument.
#[derive(Clone, Debug)]
pub enum Override {
  /// Used as-is, without checking it against the declared type.
  Value(Value),
  /// Construct the argument's declared type recursively, without a scheme.
  Construct,
}

/// A construction recipe for one target type.
///
/// ```
/// use weft_ioc::{BuildScheme, TypeRef};
///
/// struct Mailer;
/// struct Transport;
///
/// let scheme = BuildScheme::of::<Mailer>()
///   .named("mailer")
///   .with("sender", "noreply@example.com")
///   .construct_type(TypeRef::of::<Transport>());
///
/// assert_eq!(scheme.name(), Some("mailer"));
/// assert_eq!(scheme.arguments().len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct BuildScheme {
  target: TypeKey,
  name: Option<String>,
  arguments: Vec<(ArgumentKey, Override)>,
}

impl BuildScheme {
  pub fn new(target: TypeKey) -> Self {
    Self {
      target,
      name: None,
      arguments: Vec::new(),
    }
  }

  pub fn of<T: ?Sized + Any>() -> Self {
    Self::new(TypeKey::of::<T>())
  }

  /// Registers the scheme under `name` instead of its target type.
  pub fn named(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  /// Supplies a literal value for the argument called `argument`.
  pub fn with(self, argument: impl Into<String>, value: impl Into<Value>) -> Self {
    self.argument(
      ArgumentKey::Name(argument.into()),
      Override::Value(value.into()),
    )
  }

  /// Supplies a literal value for every argument declared as `ty`.
  pub fn with_type(self, ty: TypeRef, value: impl Into<Value>) -> Self {
    self.argument(ArgumentKey::Type(ty), Override::Value(value.into()))
  }

  /// Forces recursive construction of the argument called `argument`.
  pub fn construct(self, argument: impl Into<String>) -> Self {
    self.argument(ArgumentKey::Name(argument.into()), Override::Construct)
  }

  /// Forces recursive construction of every argument declared as `ty`.
  pub fn construct_type(self, ty: TypeRef) -> Self {
    self.argument(ArgumentKey::Type(ty), Override::Construct)
  }

  pub fn argument(mut self, key: ArgumentKey, value: Override) -> Self {
    match self.arguments.iter_mut().find(|(existing, _)| *existing == key) {
      Some(slot) => slot.1 = value,
      None => self.arguments.push((key, value)),
    }
    self
  }

  pub fn target(&self) -> TypeKey {
    self.target
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  pub fn arguments(&self) -> &[(ArgumentKey, Override)] {
    &self.arguments
  }

  /// The override for an argument, matched by name first and by declared
  /// type second.
  pub fn override_for(&self, name: &str, ty: &TypeRef) -> Option<&Override> {
    let by_name = self.arguments.iter().find(|(key, _)| match key {
      ArgumentKey::Name(n) => n == name,
      ArgumentKey::Type(_) => false,
    });
    let by_type = || {
      self
        .arguments
        .iter()
        .find(|(key, _)| matches!(key, ArgumentKey::Type(t) if t == ty))
    };
    by_name.or_else(by_type).map(|(_, value)| value)
  }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum SchemeKey {
  Name(String),
  Type(TypeKey),
}

impl SchemeKey {
  fn for_scheme(scheme: &BuildScheme) -> Self {
    match &scheme.name {
      Some(name) => SchemeKey::Name(name.clone()),
      None => SchemeKey::Type(scheme.target),
    }
  }
}

/// The immutable index of build schemes a container is created with.
#[derive(Clone, Debug, Default)]
pub struct BuildSchemes {
  schemes: Vec<BuildScheme>,
  index: HashMap<SchemeKey, usize>,
}

impl BuildSchemes {
  pub fn new(schemes: impl IntoIterator<Item = BuildScheme>) -> Self {
    let mut this = Self::default();
    for scheme in schemes {
      let key = SchemeKey::for_scheme(&scheme);
      match this.index.get(&key) {
        Some(&slot) => {
          warn!(key = ?key, "build scheme registered twice, the later one wins");
          this.schemes[slot] = scheme;
        }
        None => {
          this.index.insert(key, this.schemes.len());
          this.schemes.push(scheme);
        }
      }
    }
    this
  }

  /// Finds the scheme for constructing `ty` under the lookup key `name`.
  ///
  /// A scheme keyed by `name` wins over one keyed by `ty`, and both win over a
  /// named scheme that merely targets `ty`. A scheme found by key whose target
  /// is not `ty` is a configuration error. `ty` is `None` for list arguments,
  /// which no scheme can target.
  pub fn lookup(&self, name: Option<&str>, ty: Option<&TypeKey>) -> Result<Option<&BuildScheme>> {
    let by_name = name.and_then(|n| self.index.get(&SchemeKey::Name(n.to_owned())));
    let by_type = || ty.and_then(|t| self.index.get(&SchemeKey::Type(*t)));

    let scheme = match by_name.or_else(by_type) {
      Some(&slot) => &self.schemes[slot],
      None => {
        return Ok(
          ty.and_then(|t| self.schemes.iter().find(|scheme| scheme.target == *t)),
        )
      }
    };

    if Some(&scheme.target) == ty {
      Ok(Some(scheme))
    } else {
      let requested = match ty {
        Some(t) => t.name().to_owned(),
        None => name.unwrap_or_default().to_owned(),
      };
      Err(ContainerError::WrongBuildScheme(requested))
    }
  }

  pub fn len(&self) -> usize {
    self.schemes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.schemes.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &BuildScheme> {
    self.schemes.iter()
  }
}

impl FromIterator<BuildScheme> for BuildSchemes {
  fn from_iter<I: IntoIterator<Item = BuildScheme>>(iter: I) -> Self {
    Self::new(iter)
  }
}
