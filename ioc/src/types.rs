//! The type registry: the explicit, declarative replacement for runtime
//! reflection that the construction engine consumes.

use crate::component::{Arguments, Component, Param};
use crate::core::TypeKey;
use crate::error::{ContainerError, Result};
use crate::service::{Handle, Service, Supertype};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// What the construction engine needs to know about types.
///
/// Subclass order is registration order, and parameter order is declaration
/// order; both must be stable so that abstract reduction and error messages
/// are reproducible.
pub trait TypeIntrospector: Send + Sync {
  /// Whether the type was declared at all.
  fn is_known(&self, ty: &TypeKey) -> bool;

  fn is_abstract(&self, ty: &TypeKey) -> bool;

  /// True for `String`, `i64` and `f64`, the types configuration values have.
  fn is_primitive_scalar(&self, ty: &TypeKey) -> bool;

  fn direct_subclasses(&self, ty: &TypeKey) -> Vec<TypeKey>;

  /// An empty list means the type is built with no arguments.
  fn constructor_parameters(&self, ty: &TypeKey) -> Vec<Param>;

  /// Every family an instance of `ty` can be viewed as, transitively.
  fn supertypes(&self, ty: &TypeKey) -> Arc<[Supertype]>;

  fn instantiate(&self, ty: &TypeKey, args: Arguments) -> Result<Service>;
}

impl<T: TypeIntrospector + ?Sized> TypeIntrospector for &T {
  fn is_known(&self, ty: &TypeKey) -> bool {
    (**self).is_known(ty)
  }

  fn is_abstract(&self, ty: &TypeKey) -> bool {
    (**self).is_abstract(ty)
  }

  fn is_primitive_scalar(&self, ty: &TypeKey) -> bool {
    (**self).is_primitive_scalar(ty)
  }

  fn direct_subclasses(&self, ty: &TypeKey) -> Vec<TypeKey> {
    (**self).direct_subclasses(ty)
  }

  fn constructor_parameters(&self, ty: &TypeKey) -> Vec<Param> {
    (**self).constructor_parameters(ty)
  }

  fn supertypes(&self, ty: &TypeKey) -> Arc<[Supertype]> {
    (**self).supertypes(ty)
  }

  fn instantiate(&self, ty: &TypeKey, args: Arguments) -> Result<Service> {
    (**self).instantiate(ty, args)
  }
}

impl<T: TypeIntrospector + ?Sized> TypeIntrospector for Arc<T> {
  fn is_known(&self, ty: &TypeKey) -> bool {
    (**self).is_known(ty)
  }

  fn is_abstract(&self, ty: &TypeKey) -> bool {
    (**self).is_abstract(ty)
  }

  fn is_primitive_scalar(&self, ty: &TypeKey) -> bool {
    (**self).is_primitive_scalar(ty)
  }

  fn direct_subclasses(&self, ty: &TypeKey) -> Vec<TypeKey> {
    (**self).direct_subclasses(ty)
  }

  fn constructor_parameters(&self, ty: &TypeKey) -> Vec<Param> {
    (**self).constructor_parameters(ty)
  }

  fn supertypes(&self, ty: &TypeKey) -> Arc<[Supertype]> {
    (**self).supertypes(ty)
  }

  fn instantiate(&self, ty: &TypeKey, args: Arguments) -> Result<Service> {
    (**self).instantiate(ty, args)
  }
}

type Factory = Arc<dyn Fn(&Arguments) -> Result<Handle> + Send + Sync>;

#[derive(Clone)]
enum Shape {
  // Mentioned by `implement` but not declared yet.
  Pending,
  Scalar,
  Abstract,
  Concrete { params: Vec<Param>, factory: Factory },
}

#[derive(Clone)]
struct TypeEntry {
  key: TypeKey,
  shape: Shape,
  subclasses: Vec<TypeKey>,
  parents: Vec<Supertype>,
}

impl TypeEntry {
  fn new(key: TypeKey, shape: Shape) -> Self {
    Self {
      key,
      shape,
      subclasses: Vec::new(),
      parents: Vec::new(),
    }
  }
}

/// A registry of constructible types and abstract families.
///
/// Registration takes `&self`, so a registry can be shared (see
/// [`global::types`](crate::global::types)) and filled from anywhere during
/// start-up. `String`, `i64` and `f64` are always registered as the primitive
/// scalars.
///
/// ```
/// use weft_ioc::{implements, TypeRegistry};
///
/// trait Greeter: Send + Sync {
///   fn greet(&self) -> String;
/// }
///
/// #[derive(Default)]
/// struct English;
///
/// impl Greeter for English {
///   fn greet(&self) -> String {
///     "Hello!".to_string()
///   }
/// }
///
/// let types = TypeRegistry::new();
/// types.register_default::<English>();
/// implements!(types, English => dyn Greeter);
/// ```
pub struct TypeRegistry {
  entries: RwLock<HashMap<TypeId, TypeEntry>>,
}

impl Default for TypeRegistry {
  fn default() -> Self {
    Self::new()
  }
}

impl Clone for TypeRegistry {
  fn clone(&self) -> Self {
    Self {
      entries: RwLock::new(self.entries.read().clone()),
    }
  }
}

impl TypeRegistry {
  pub fn new() -> Self {
    let mut entries = HashMap::new();
    for key in [
      TypeKey::of::<String>(),
      TypeKey::of::<i64>(),
      TypeKey::of::<f64>(),
    ] {
      entries.insert(key.id(), TypeEntry::new(key, Shape::Scalar));
    }
    Self {
      entries: RwLock::new(entries),
    }
  }

  // --- PRIVATE HELPERS ---

  fn declare(&self, key: TypeKey, shape: Shape) {
    let mut entries = self.entries.write();
    let entry = entries
      .entry(key.id())
      .or_insert_with(|| TypeEntry::new(key, Shape::Pending));
    entry.shape = shape;
  }

  fn collect_supertypes(
    entries: &HashMap<TypeId, TypeEntry>,
    id: TypeId,
    via: Option<&Supertype>,
    seen: &mut HashSet<TypeId>,
    out: &mut Vec<Supertype>,
  ) {
    let Some(entry) = entries.get(&id) else {
      return;
    };
    for parent in &entry.parents {
      if !seen.insert(parent.key().id()) {
        continue;
      }
      let supertype = match via {
        Some(path) => path.then(parent),
        None => parent.clone(),
      };
      out.push(supertype.clone());
      Self::collect_supertypes(entries, parent.key().id(), Some(&supertype), seen, out);
    }
  }

  // --- PUBLIC API ---

  /// Registers a concrete type with a declared constructor.
  pub fn register<T: Component>(&self) {
    self.register_with(T::parameters(), T::construct);
  }

  /// Registers a concrete type built with no arguments.
  pub fn register_default<T: Default + Any + Send + Sync>(&self) {
    self.register_with(Vec::new(), |_| Ok(T::default()));
  }

  /// Registers a concrete type from an explicit parameter list and factory.
  pub fn register_with<T: Any + Send + Sync>(
    &self,
    params: Vec<Param>,
    factory: impl Fn(&Arguments) -> Result<T> + Send + Sync + 'static,
  ) {
    let factory: Factory =
      Arc::new(move |args: &Arguments| factory(args).map(|value| Arc::new(Arc::new(value)) as Handle));
    self.declare(TypeKey::of::<T>(), Shape::Concrete { params, factory });
  }

  /// Declares an abstract family, usually a `dyn Trait`.
  pub fn family<F: ?Sized + Any>(&self) {
    self.declare(TypeKey::of::<F>(), Shape::Abstract);
  }

  /// Records `C` as a direct subclass of `P`.
  ///
  /// `P` is declared abstract if it was unknown. `C` may be concrete or
  /// itself abstract. `upcast` converts an instance of `C` into `P`; for a
  /// trait object family, `|c| c` is all it takes, which is what
  /// [`implements!`](crate::implements) expands to.
  pub fn implement<P, C>(&self, upcast: fn(Arc<C>) -> Arc<P>)
  where
    P: ?Sized + Any + Send + Sync,
    C: ?Sized + Any + Send + Sync,
  {
    let parent = TypeKey::of::<P>();
    let child = TypeKey::of::<C>();
    let mut entries = self.entries.write();

    let parent_entry = entries
      .entry(parent.id())
      .or_insert_with(|| TypeEntry::new(parent, Shape::Abstract));
    if matches!(parent_entry.shape, Shape::Pending) {
      parent_entry.shape = Shape::Abstract;
    }
    if parent_entry.subclasses.contains(&child) {
      return;
    }
    parent_entry.subclasses.push(child);

    entries
      .entry(child.id())
      .or_insert_with(|| TypeEntry::new(child, Shape::Pending))
      .parents
      .push(Supertype::new::<C, P>(upcast));
  }

  /// Number of declared types, including the primitive scalars.
  pub fn len(&self) -> usize {
    self
      .entries
      .read()
      .values()
      .filter(|entry| !matches!(entry.shape, Shape::Pending))
      .count()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl TypeIntrospector for TypeRegistry {
  fn is_known(&self, ty: &TypeKey) -> bool {
    self
      .entries
      .read()
      .get(&ty.id())
      .is_some_and(|entry| !matches!(entry.shape, Shape::Pending))
  }

  fn is_abstract(&self, ty: &TypeKey) -> bool {
    self
      .entries
      .read()
      .get(&ty.id())
      .is_some_and(|entry| matches!(entry.shape, Shape::Abstract))
  }

  fn is_primitive_scalar(&self, ty: &TypeKey) -> bool {
    self
      .entries
      .read()
      .get(&ty.id())
      .is_some_and(|entry| matches!(entry.shape, Shape::Scalar))
  }

  fn direct_subclasses(&self, ty: &TypeKey) -> Vec<TypeKey> {
    self
      .entries
      .read()
      .get(&ty.id())
      .map(|entry| entry.subclasses.clone())
      .unwrap_or_default()
  }

  fn constructor_parameters(&self, ty: &TypeKey) -> Vec<Param> {
    match self.entries.read().get(&ty.id()).map(|entry| &entry.shape) {
      Some(Shape::Concrete { params, .. }) => params.clone(),
      _ => Vec::new(),
    }
  }

  fn supertypes(&self, ty: &TypeKey) -> Arc<[Supertype]> {
    let entries = self.entries.read();
    let mut out = Vec::new();
    let mut seen = HashSet::from([ty.id()]);
    Self::collect_supertypes(&entries, ty.id(), None, &mut seen, &mut out);
    Arc::from(out)
  }

  fn instantiate(&self, ty: &TypeKey, args: Arguments) -> Result<Service> {
    let (key, factory) = {
      let entries = self.entries.read();
      match entries.get(&ty.id()) {
        Some(TypeEntry {
          key,
          shape: Shape::Concrete { factory, .. },
          ..
        }) => (*key, Arc::clone(factory)),
        _ => return Err(ContainerError::InvalidReference(ty.name().to_owned())),
      }
    };

    // The lock is released before running user code.
    let handle = factory(&args)?;
    Ok(Service::from_handle(key, handle, self.supertypes(ty)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  trait Figure: Send + Sync {
    fn sides(&self) -> u32;
  }

  trait Polygon: Figure {
    fn into_figure(self: Arc<Self>) -> Arc<dyn Figure>;
  }

  #[derive(Default)]
  struct Circle;

  #[derive(Default)]
  struct Square;

  impl Figure for Circle {
    fn sides(&self) -> u32 {
      0
    }
  }

  impl Figure for Square {
    fn sides(&self) -> u32 {
      4
    }
  }

  impl Polygon for Square {
    fn into_figure(self: Arc<Self>) -> Arc<dyn Figure> {
      self
    }
  }

  fn registry() -> TypeRegistry {
    let types = TypeRegistry::new();
    types.register_default::<Circle>();
    types.register_default::<Square>();
    types.implement::<dyn Figure, Circle>(|c| c);
    types.implement::<dyn Figure, dyn Polygon>(|p| p.into_figure());
    types.implement::<dyn Polygon, Square>(|s| s);
    types
  }

  #[test]
  fn primitives_are_preregistered() {
    let types = TypeRegistry::new();

    assert!(types.is_primitive_scalar(&TypeKey::of::<String>()));
    assert!(types.is_primitive_scalar(&TypeKey::of::<i64>()));
    assert!(types.is_primitive_scalar(&TypeKey::of::<f64>()));
    assert!(!types.is_primitive_scalar(&TypeKey::of::<i32>()));
    assert_eq!(types.len(), 3);
  }

  #[test]
  fn subclasses_keep_registration_order() {
    let types = registry();

    assert!(types.is_abstract(&TypeKey::of::<dyn Figure>()));
    assert!(types.is_abstract(&TypeKey::of::<dyn Polygon>()));
    assert!(!types.is_abstract(&TypeKey::of::<Circle>()));
    assert_eq!(
      types.direct_subclasses(&TypeKey::of::<dyn Figure>()),
      vec![TypeKey::of::<Circle>(), TypeKey::of::<dyn Polygon>()]
    );
  }

  #[test]
  fn implementing_twice_does_not_duplicate_the_subclass() {
    let types = registry();
    types.implement::<dyn Figure, Circle>(|c| c);

    assert_eq!(types.direct_subclasses(&TypeKey::of::<dyn Figure>()).len(), 2);
  }

  #[test]
  fn instances_can_be_viewed_through_transitive_families() {
    let types = registry();
    let square = TypeKey::of::<Square>();

    let service = types.instantiate(&square, Arguments::new(square)).unwrap();

    assert_eq!(service.get::<dyn Figure>().unwrap().sides(), 4);
    assert!(service.get::<dyn Polygon>().is_some());
    let supertypes = types.supertypes(&square);
    let keys: Vec<_> = supertypes.iter().map(|st| st.key()).collect();
    assert_eq!(keys, vec![TypeKey::of::<dyn Polygon>(), TypeKey::of::<dyn Figure>()]);
  }

  #[test]
  fn families_and_pending_types_cannot_be_instantiated() {
    let types = TypeRegistry::new();
    types.implement::<dyn Figure, Circle>(|c| c);
    let circle = TypeKey::of::<Circle>();
    let shape = TypeKey::of::<dyn Figure>();

    assert!(!types.is_known(&circle));
    assert!(matches!(
      types.instantiate(&circle, Arguments::new(circle)),
      Err(ContainerError::InvalidReference(_))
    ));
    assert!(matches!(
      types.instantiate(&shape, Arguments::new(shape)),
      Err(ContainerError::InvalidReference(_))
    ));

    types.register_default::<Circle>();
    assert!(types.is_known(&circle));
    assert_eq!(types.direct_subclasses(&shape), vec![circle]);
  }

  #[test]
  fn component_parameters_are_reported_in_declaration_order() {
    struct Canvas;

    impl Component for Canvas {
      fn parameters() -> Vec<Param> {
        vec![Param::integer("width"), Param::integer("height"), Param::list_of::<dyn Figure>("shapes")]
      }

      fn construct(_args: &Arguments) -> Result<Self> {
        Ok(Canvas)
      }
    }

    let types = TypeRegistry::new();
    types.register::<Canvas>();

    let names: Vec<_> = types
      .constructor_parameters(&TypeKey::of::<Canvas>())
      .into_iter()
      .map(|param| param.name().to_owned())
      .collect();
    assert_eq!(names, vec!["width", "height", "shapes"]);
  }
}
