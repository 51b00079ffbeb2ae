//! The main `Container` struct: the resolution and construction engine.

use crate::component::{Arguments, Param};
use crate::core::{Reference, ResolutionGuard, ServiceKey, TypeKey, TypeRef};
use crate::error::{ContainerError, Result};
use crate::parameters::{Parameters, Scalar};
use crate::registry::ServiceRegistry;
use crate::scheme::{BuildScheme, BuildSchemes, Override};
use crate::service::{Service, Value};
use crate::types::TypeIntrospector;
use std::any::Any;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(0);

/// The dependency injection container.
///
/// A container owns its parameters, build schemes and constructed services.
/// Each concrete type is constructed at most once per container; asking for
/// it again returns the same instance. Containers never share services, even
/// when they share a [`TypeRegistry`](crate::TypeRegistry).
pub struct Container {
  id: u64,
  types: Arc<dyn TypeIntrospector>,
  parameters: Parameters,
  schemes: BuildSchemes,
  services: ServiceRegistry,
}

/// Collects the parameters and build schemes for a new [`Container`].
pub struct ContainerBuilder {
  types: Arc<dyn TypeIntrospector>,
  parameters: Parameters,
  schemes: Vec<BuildScheme>,
}

impl ContainerBuilder {
  pub fn parameters(mut self, parameters: Parameters) -> Self {
    self.parameters = parameters;
    self
  }

  pub fn scheme(mut self, scheme: BuildScheme) -> Self {
    self.schemes.push(scheme);
    self
  }

  pub fn schemes(mut self, schemes: impl IntoIterator<Item = BuildScheme>) -> Self {
    self.schemes.extend(schemes);
    self
  }

  pub fn build(self) -> Container {
    let id = NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed);
    debug!(
      container = id,
      parameters = self.parameters.len(),
      schemes = self.schemes.len(),
      "container created"
    );
    Container {
      id,
      services: ServiceRegistry::new(Arc::clone(&self.types)),
      types: self.types,
      parameters: self.parameters,
      schemes: BuildSchemes::new(self.schemes),
    }
  }
}

impl Container {
  /// A container with no parameters and no build schemes.
  pub fn new(types: impl TypeIntrospector + 'static) -> Self {
    Self::builder(types).build()
  }

  pub fn builder(types: impl TypeIntrospector + 'static) -> ContainerBuilder {
    ContainerBuilder {
      types: Arc::new(types),
      parameters: Parameters::new(),
      schemes: Vec::new(),
    }
  }

  // --- Resolution ---

  /// Resolves a type, a list over an abstract family, or a name.
  ///
  /// Names are looked up among named services first and parameters second.
  pub fn get(&self, reference: impl Into<Reference>) -> Result<Value> {
    let reference = reference.into();
    debug!(container = self.id, %reference, "resolving");

    match reference {
      Reference::ListOf(item) => self.collect(&item).map(Value::List),
      Reference::Type(ty) => {
        if !self.types.is_known(&ty) || self.types.is_primitive_scalar(&ty) {
          return Err(ContainerError::InvalidReference(ty.name().to_owned()));
        }
        let scheme = self.schemes.lookup(None, Some(&ty))?;
        self.construct_type(&ty, scheme).map(Value::Service)
      }
      Reference::Name(name) => match self.services.get(&ServiceKey::Name(name.clone())) {
        Some(service) => Ok(Value::Service(service)),
        None => self.parameters.get(&name).cloned().map(Value::Scalar),
      },
    }
  }

  /// Resolves `T`, which may be a concrete type or an abstract family such as
  /// `dyn Trait`.
  pub fn resolve<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>> {
    let service = self
      .get(Reference::of::<T>())?
      .into_service()
      .ok_or_else(|| ContainerError::InvalidReference(std::any::type_name::<T>().to_owned()))?;
    view::<T>(&service)
  }

  /// Resolves the service registered under `name`, viewed as `T`.
  pub fn resolve_named<T: ?Sized + Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    match self.get(name)? {
      Value::Service(service) => view::<T>(&service),
      other => Err(ContainerError::TypeMismatch {
        expected: std::any::type_name::<T>().to_owned(),
        found: other.describe(),
      }),
    }
  }

  /// Resolves one instance of every concrete direct implementation of `T`.
  pub fn resolve_all<T: ?Sized + Any + Send + Sync>(&self) -> Result<Vec<Arc<T>>> {
    self
      .collect(&TypeKey::of::<T>())?
      .iter()
      .map(view::<T>)
      .collect()
  }

  // --- Registry access ---

  pub fn has_service(&self, key: impl Into<ServiceKey>) -> bool {
    self.services.has(&key.into())
  }

  pub fn service(&self, key: impl Into<ServiceKey>) -> Option<Service> {
    self.services.get(&key.into())
  }

  /// Pre-seeds the registry. Fails if the key is taken or the service's own
  /// type is abstract.
  pub fn set_service(&self, key: impl Into<ServiceKey>, service: Service) -> Result<()> {
    self.services.set(key.into(), service)
  }

  /// Pre-seeds the registry with a value, keeping every family its type was
  /// registered under so it can satisfy abstract dependencies by name.
  pub fn add_instance<T: Any + Send + Sync>(&self, key: impl Into<ServiceKey>, value: T) -> Result<()> {
    let supertypes = self.types.supertypes(&TypeKey::of::<T>());
    self.set_service(key, Service::new(value).with_supertypes(supertypes))
  }

  pub fn get_parameter(&self, name: &str) -> Result<Scalar> {
    self.parameters.get(name).cloned()
  }

  pub fn parameters(&self) -> &Parameters {
    &self.parameters
  }

  /// Looks up the build scheme that would be used for `ty` under `name`.
  pub fn build_scheme(&self, name: Option<&str>, ty: &TypeKey) -> Result<Option<&BuildScheme>> {
    self.schemes.lookup(name, Some(ty))
  }

  // --- Construction ---

  fn construct(&self, ty: &TypeRef, scheme: Option<&BuildScheme>) -> Result<Value> {
    match ty {
      TypeRef::ListOf(item) => self.collect(item).map(Value::List),
      TypeRef::Type(key) => self.construct_type(key, scheme).map(Value::Service),
    }
  }

  /// Replaces an abstract type by its first direct subclass until a concrete
  /// type is reached.
  fn reduce(&self, ty: &TypeKey) -> Result<TypeKey> {
    let mut current = *ty;
    let mut visited = HashSet::new();

    while self.types.is_abstract(&current) {
      if !visited.insert(current) {
        return Err(ContainerError::CyclicDependency {
          path: format!("{} is its own subclass", current),
        });
      }
      current = self
        .types
        .direct_subclasses(&current)
        .first()
        .copied()
        .ok_or_else(|| ContainerError::NoImplementationFound(current.name().to_owned()))?;
      trace!(from = %ty, to = %current, "abstract type reduced");
    }

    if !self.types.is_known(&current) || self.types.is_primitive_scalar(&current) {
      return Err(ContainerError::InvalidReference(current.name().to_owned()));
    }
    Ok(current)
  }

  fn construct_type(&self, ty: &TypeKey, scheme: Option<&BuildScheme>) -> Result<Service> {
    let concrete = self.reduce(ty)?;
    let key = ServiceKey::Type(concrete);
    if let Some(existing) = self.services.get(&key) {
      return Ok(existing);
    }

    let _guard = ResolutionGuard::new(self.id, concrete)?;

    let mut args = Arguments::new(concrete);
    for param in self.types.constructor_parameters(&concrete) {
      let value = self.resolve_argument(&param, scheme)?;
      args.insert(param.name(), value);
    }

    let service = self.types.instantiate(&concrete, args)?;
    self.services.commit(key, service)
  }

  fn resolve_argument(&self, param: &Param, scheme: Option<&BuildScheme>) -> Result<Value> {
    let name = param.name();
    let declared = param.ty();

    if let Some(value) = scheme.and_then(|s| s.override_for(name, declared)) {
      return match value {
        Override::Construct => {
          trace!(argument = name, %declared, "forced construction from build scheme");
          self.construct(declared, None)
        }
        Override::Value(value) => {
          trace!(argument = name, "literal from build scheme");
          Ok(value.clone())
        }
      };
    }

    if let TypeRef::Type(expected) = declared {
      if let Some(service) = self.services.get(&ServiceKey::Name(name.to_owned())) {
        if service.is(expected) {
          trace!(argument = name, "named service");
          // Constructors read primitive arguments as scalars.
          let value = match service.to_scalar() {
            Some(scalar) if self.types.is_primitive_scalar(expected) => Value::Scalar(scalar),
            _ => Value::Service(service),
          };
          return Ok(value);
        }
      }

      if self.types.is_primitive_scalar(expected) {
        let parameter = self.parameters.get(name)?;
        if parameter.type_key() != *expected {
          return Err(ContainerError::WrongParameterType {
            name: name.to_owned(),
            expected: expected.name().to_owned(),
            found: parameter.type_key().name().to_owned(),
          });
        }
        trace!(argument = name, "configuration parameter");
        return Ok(Value::Scalar(parameter.clone()));
      }
    }

    let target = match declared {
      TypeRef::Type(key) => Some(key),
      TypeRef::ListOf(_) => None,
    };
    let scheme = self.schemes.lookup(Some(name), target)?;
    trace!(argument = name, %declared, "nested construction");
    self.construct(declared, scheme)
  }

  /// Builds one instance of every concrete direct subclass of an abstract
  /// family, in registration order.
  fn collect(&self, item: &TypeKey) -> Result<Vec<Service>> {
    if !self.types.is_abstract(item) {
      return Err(ContainerError::NonAbstractListItem(item.name().to_owned()));
    }

    self
      .types
      .direct_subclasses(item)
      .iter()
      .filter(|subclass| !self.types.is_abstract(subclass))
      .map(|subclass| self.construct_type(subclass, None))
      .collect()
  }
}

fn view<T: ?Sized + Any + Send + Sync>(service: &Service) -> Result<Arc<T>> {
  service.get::<T>().ok_or_else(|| ContainerError::TypeMismatch {
    expected: std::any::type_name::<T>().to_owned(),
    found: service.type_key().name().to_owned(),
  })
}
