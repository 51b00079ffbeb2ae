//! Type-erased service instances and the values the container hands out.

use crate::core::TypeKey;
use crate::parameters::Scalar;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

// Holds an `Arc<T>` for some `T: ?Sized`, so trait objects can be stored too.
pub(crate) type Handle = Arc<dyn Any + Send + Sync>;
pub(crate) type Upcast = Arc<dyn Fn(&Handle) -> Option<Handle> + Send + Sync>;

/// A type a service can be viewed as, together with the conversion to it.
#[derive(Clone)]
pub struct Supertype {
  key: TypeKey,
  upcast: Upcast,
}

impl Supertype {
  pub(crate) fn new<C, P>(upcast: fn(Arc<C>) -> Arc<P>) -> Self
  where
    C: ?Sized + Any + Send + Sync,
    P: ?Sized + Any + Send + Sync,
  {
    Self {
      key: TypeKey::of::<P>(),
      upcast: Arc::new(move |handle: &Handle| {
        handle
          .downcast_ref::<Arc<C>>()
          .map(|child| Arc::new(upcast(Arc::clone(child))) as Handle)
      }),
    }
  }

  /// Chains `self` with a supertype of `self`'s own type.
  pub(crate) fn then(&self, next: &Supertype) -> Supertype {
    let first = Arc::clone(&self.upcast);
    let second = Arc::clone(&next.upcast);
    Supertype {
      key: next.key,
      upcast: Arc::new(move |handle: &Handle| first(handle).and_then(|mid| second(&mid))),
    }
  }

  pub fn key(&self) -> TypeKey {
    self.key
  }
}

impl fmt::Debug for Supertype {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Supertype({})", self.key)
  }
}

/// A constructed, shared service instance.
///
/// Cloning a `Service` clones the pointer, not the instance. The concrete type
/// is remembered, and so is every abstract family the instance can be viewed
/// as, which lets [`Service::get`] hand out `Arc<dyn Trait>` as well as
/// `Arc<Concrete>`.
#[derive(Clone)]
pub struct Service {
  key: TypeKey,
  handle: Handle,
  supertypes: Arc<[Supertype]>,
}

impl Service {
  pub fn new<T: Any + Send + Sync>(value: T) -> Self {
    Self::from_arc(Arc::new(value))
  }

  pub fn from_arc<T: ?Sized + Any + Send + Sync>(value: Arc<T>) -> Self {
    let supertypes: Arc<[Supertype]> = Arc::new([]);
    Self {
      key: TypeKey::of::<T>(),
      handle: Arc::new(value),
      supertypes,
    }
  }

  pub(crate) fn from_handle(key: TypeKey, handle: Handle, supertypes: Arc<[Supertype]>) -> Self {
    Self {
      key,
      handle,
      supertypes,
    }
  }

  /// Attaches the families this instance can be viewed as.
  pub fn with_supertypes(mut self, supertypes: Arc<[Supertype]>) -> Self {
    self.supertypes = supertypes;
    self
  }

  /// The runtime type the instance was created as.
  pub fn type_key(&self) -> TypeKey {
    self.key
  }

  /// Whether the instance is of type `ty` or of one of its subtypes.
  pub fn is(&self, ty: &TypeKey) -> bool {
    self.key == *ty || self.supertypes.iter().any(|st| st.key == *ty)
  }

  /// Views the instance as `T`, which may be its own type or any family it
  /// was registered under.
  pub fn get<T: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<T>> {
    let wanted = TypeId::of::<T>();
    if self.key.id() == wanted {
      return self.handle.downcast_ref::<Arc<T>>().cloned();
    }

    let supertype = self.supertypes.iter().find(|st| st.key.id() == wanted)?;
    let converted = (supertype.upcast)(&self.handle)?;
    converted.downcast_ref::<Arc<T>>().cloned()
  }

  /// Reads the instance as a configuration scalar, if it is a `String`,
  /// `i64` or `f64`.
  pub fn to_scalar(&self) -> Option<Scalar> {
    if let Some(text) = self.get::<String>() {
      return Some(Scalar::Text((*text).clone()));
    }
    if let Some(integer) = self.get::<i64>() {
      return Some(Scalar::Integer(*integer));
    }
    self.get::<f64>().map(|real| Scalar::Real(*real))
  }

  /// Whether both values point at the same instance.
  pub fn ptr_eq(a: &Service, b: &Service) -> bool {
    Arc::ptr_eq(&a.handle, &b.handle)
  }
}

impl fmt::Debug for Service {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Service")
      .field("type", &self.key.name())
      .field("supertypes", &self.supertypes.len())
      .finish_non_exhaustive()
  }
}

/// The result of a resolution: one service, a list of services, or a scalar
/// parameter.
#[derive(Clone, Debug)]
pub enum Value {
  Service(Service),
  List(Vec<Service>),
  Scalar(Scalar),
}

impl Value {
  pub fn as_service(&self) -> Option<&Service> {
    match self {
      Value::Service(service) => Some(service),
      _ => None,
    }
  }

  pub fn as_list(&self) -> Option<&[Service]> {
    match self {
      Value::List(list) => Some(list),
      _ => None,
    }
  }

  pub fn as_scalar(&self) -> Option<&Scalar> {
    match self {
      Value::Scalar(scalar) => Some(scalar),
      _ => None,
    }
  }

  pub fn into_service(self) -> Option<Service> {
    match self {
      Value::Service(service) => Some(service),
      _ => None,
    }
  }

  pub fn into_list(self) -> Option<Vec<Service>> {
    match self {
      Value::List(list) => Some(list),
      _ => None,
    }
  }

  pub(crate) fn describe(&self) -> String {
    match self {
      Value::Service(service) => format!("service {}", service.type_key()),
      Value::List(list) => format!("list of {} services", list.len()),
      Value::Scalar(scalar) => format!("{} {}", scalar.kind(), scalar),
    }
  }
}

impl From<Service> for Value {
  fn from(service: Service) -> Self {
    Value::Service(service)
  }
}

impl From<Vec<Service>> for Value {
  fn from(list: Vec<Service>) -> Self {
    Value::List(list)
  }
}

impl From<Scalar> for Value {
  fn from(scalar: Scalar) -> Self {
    Value::Scalar(scalar)
  }
}

impl From<&str> for Value {
  fn from(text: &str) -> Self {
    Value::Scalar(text.into())
  }
}

impl From<String> for Value {
  fn from(text: String) -> Self {
    Value::Scalar(text.into())
  }
}

impl From<i64> for Value {
  fn from(number: i64) -> Self {
    Value::Scalar(number.into())
  }
}

impl From<i32> for Value {
  fn from(number: i32) -> Self {
    Value::Scalar(number.into())
  }
}

impl From<f64> for Value {
  fn from(number: f64) -> Self {
    Value::Scalar(number.into())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  trait Speaker: Send + Sync {
    fn speak(&self) -> String;
  }

  trait LoudSpeaker: Speaker {
    fn into_speaker(self: Arc<Self>) -> Arc<dyn Speaker>;
  }

  struct Parrot;

  impl Speaker for Parrot {
    fn speak(&self) -> String {
      "squawk".to_string()
    }
  }

  impl LoudSpeaker for Parrot {
    fn into_speaker(self: Arc<Self>) -> Arc<dyn Speaker> {
      self
    }
  }

  #[test]
  fn service_is_its_own_type() {
    let service = Service::new(Parrot);

    assert!(service.is(&TypeKey::of::<Parrot>()));
    assert!(!service.is(&TypeKey::of::<dyn Speaker>()));
    assert!(service.get::<Parrot>().is_some());
    assert!(service.get::<dyn Speaker>().is_none());
  }

  #[test]
  fn service_upcasts_through_supertypes() {
    let direct = Supertype::new::<Parrot, dyn LoudSpeaker>(|p| p);
    let parent = Supertype::new::<dyn LoudSpeaker, dyn Speaker>(|p| p.into_speaker());
    let chained = direct.then(&parent);
    let supertypes: Arc<[Supertype]> = Arc::from(vec![direct, chained]);

    let service = Service::new(Parrot).with_supertypes(supertypes);

    assert!(service.is(&TypeKey::of::<dyn Speaker>()));
    assert_eq!(service.get::<dyn Speaker>().unwrap().speak(), "squawk");
    assert!(service.get::<dyn LoudSpeaker>().is_some());
  }

  #[test]
  fn primitive_services_read_as_scalars() {
    assert_eq!(
      Service::new(String::from("hi")).to_scalar(),
      Some(Scalar::Text("hi".to_string()))
    );
    assert_eq!(Service::new(7_i64).to_scalar(), Some(Scalar::Integer(7)));
    assert_eq!(Service::new(0.25_f64).to_scalar(), Some(Scalar::Real(0.25)));
    assert_eq!(Service::new(Parrot).to_scalar(), None);
  }

  #[test]
  fn clones_share_the_instance() {
    let service = Service::new(Parrot);
    let copy = service.clone();

    assert!(Service::ptr_eq(&service, &copy));
    assert!(!Service::ptr_eq(&service, &Service::new(Parrot)));
    assert!(Arc::ptr_eq(
      &service.get::<Parrot>().unwrap(),
      &copy.get::<Parrot>().unwrap()
    ));
  }
}
