use pretty_assertions::assert_eq;
use std::sync::Arc;
use weft_ioc::{
  implements, Arguments, Component, Container, ContainerError, Param, Parameters, Reference, Result,
  Scalar, TypeKey, TypeRegistry,
};

// --- Test Fixtures ---

// Families must be Send + Sync for their instances to live in a container.
trait Storage: Send + Sync {
  fn kind(&self) -> &'static str;
}

#[derive(Default)]
struct DiskStorage;
impl Storage for DiskStorage {
  fn kind(&self) -> &'static str {
    "disk"
  }
}

#[derive(Default)]
struct MemoryStorage;
impl Storage for MemoryStorage {
  fn kind(&self) -> &'static str {
    "memory"
  }
}

struct Settings {
  title: String,
  retries: i64,
  ratio: f64,
}

impl Component for Settings {
  fn parameters() -> Vec<Param> {
    vec![
      Param::text("title"),
      Param::integer("retries"),
      Param::real("ratio"),
    ]
  }

  fn construct(args: &Arguments) -> Result<Self> {
    Ok(Settings {
      title: args.text("title")?,
      retries: args.integer("retries")?,
      ratio: args.real("ratio")?,
    })
  }
}

// Depends on an abstract family and a concrete type.
struct Archive {
  storage: Arc<dyn Storage>,
  settings: Arc<Settings>,
}

impl Component for Archive {
  fn parameters() -> Vec<Param> {
    vec![
      Param::of::<dyn Storage>("storage"),
      Param::of::<Settings>("settings"),
    ]
  }

  fn construct(args: &Arguments) -> Result<Self> {
    Ok(Archive {
      storage: args.service("storage")?,
      settings: args.service("settings")?,
    })
  }
}

fn types() -> TypeRegistry {
  let types = TypeRegistry::new();
  types.register_default::<DiskStorage>();
  types.register_default::<MemoryStorage>();
  types.register::<Settings>();
  types.register::<Archive>();
  implements!(types, DiskStorage => dyn Storage);
  implements!(types, MemoryStorage => dyn Storage);
  types
}

fn parameters() -> Parameters {
  Parameters::from_yaml_str("title: nightly\nretries: 3\nratio: 0.5\n").unwrap()
}

fn container() -> Container {
  Container::builder(types()).parameters(parameters()).build()
}

// --- Basic Tests ---

#[test]
fn test_construction_is_idempotent() {
  // Arrange
  let container = container();

  // Act
  let first = container.resolve::<Settings>().unwrap();
  let second = container.resolve::<Settings>().unwrap();

  // Assert
  assert!(Arc::ptr_eq(&first, &second));
  assert!(container.has_service(TypeKey::of::<Settings>()));
}

#[test]
fn test_scalar_parameters_come_from_configuration() {
  // Arrange
  let container = container();

  // Act
  let settings = container.resolve::<Settings>().unwrap();

  // Assert
  assert_eq!(settings.title, "nightly");
  assert_eq!(settings.retries, 3);
  assert_eq!(settings.ratio, 0.5);
}

#[test]
fn test_abstract_type_resolves_to_first_subclass() {
  // Arrange
  let container = container();

  // Act
  let storage = container.resolve::<dyn Storage>().unwrap();
  let disk = container.resolve::<DiskStorage>().unwrap();

  // Assert
  assert_eq!(storage.kind(), "disk");
  // The instance lives under the concrete type's slot.
  let storage_ptr = Arc::as_ptr(&storage) as *const ();
  let disk_ptr = Arc::as_ptr(&disk) as *const ();
  assert_eq!(storage_ptr, disk_ptr);
  assert!(!container.has_service(TypeKey::of::<dyn Storage>()));
}

#[test]
fn test_nested_dependencies_are_built_recursively() {
  // Arrange
  let container = container();

  // Act
  let archive = container.resolve::<Archive>().unwrap();

  // Assert
  assert_eq!(archive.storage.kind(), "disk");
  assert_eq!(archive.settings.title, "nightly");
  assert!(Arc::ptr_eq(
    &archive.settings,
    &container.resolve::<Settings>().unwrap()
  ));
}

#[test]
fn test_list_resolution_follows_subclass_order() {
  // Arrange
  let container = container();

  // Act
  let all = container.resolve_all::<dyn Storage>().unwrap();
  let again = container.get(Reference::list_of::<dyn Storage>()).unwrap();

  // Assert
  let kinds: Vec<_> = all.iter().map(|storage| storage.kind()).collect();
  assert_eq!(kinds, vec!["disk", "memory"]);
  assert_eq!(again.as_list().map(<[_]>::len), Some(2));
  // Items are the per-type singletons, even though the list is rebuilt.
  let memory = container.resolve::<MemoryStorage>().unwrap();
  assert_eq!(Arc::as_ptr(&all[1]) as *const (), Arc::as_ptr(&memory) as *const ());
}

#[test]
fn test_names_resolve_to_parameters() {
  // Arrange
  let container = container();

  // Act
  let title = container.get("title").unwrap();

  // Assert
  assert_eq!(title.as_scalar(), Some(&Scalar::from("nightly")));
  assert_eq!(container.get_parameter("retries").unwrap(), Scalar::Integer(3));
}

#[test]
fn test_unknown_parameter_is_reported_by_name() {
  // Arrange
  let container = Container::new(types());

  // Act
  let err = container.get("missing").unwrap_err();
  let nested = container.resolve::<Archive>().err();

  // Assert
  assert!(matches!(err, ContainerError::UnknownParameter(name) if name == "missing"));
  assert!(matches!(nested, Some(ContainerError::UnknownParameter(name)) if name == "title"));
}

#[test]
fn test_parameter_of_the_wrong_type_is_rejected() {
  // Arrange
  let parameters = Parameters::from_json_str(r#"{"title": "t", "retries": "three", "ratio": 1.0}"#)
    .unwrap();
  let container = Container::builder(types()).parameters(parameters).build();

  // Act
  let err = container.resolve::<Settings>().err();

  // Assert
  match err {
    Some(ContainerError::WrongParameterType { name, expected, found }) => {
      assert_eq!(name, "retries");
      assert_eq!(expected, std::any::type_name::<i64>());
      assert_eq!(found, std::any::type_name::<String>());
    }
    other => panic!("expected WrongParameterType, got {:?}", other),
  }
}

#[test]
fn test_integer_does_not_satisfy_a_real_parameter() {
  // Arrange
  let parameters = Parameters::from_json_str(r#"{"title": "t", "retries": 1, "ratio": 2}"#).unwrap();
  let container = Container::builder(types()).parameters(parameters).build();

  // Act
  let err = container.resolve::<Settings>().err();

  // Assert
  assert!(matches!(
    err,
    Some(ContainerError::WrongParameterType { ref name, .. }) if name == "ratio"
  ));
}

#[test]
fn test_family_without_implementations_fails() {
  // Arrange
  trait Unimplemented: Send + Sync {}
  let types = types();
  types.family::<dyn Unimplemented>();
  let container = Container::new(types);

  // Act
  let err = container.resolve::<dyn Unimplemented>().err();

  // Assert
  assert!(matches!(err, Some(ContainerError::NoImplementationFound(_))));
}

#[test]
fn test_constructor_can_reject_its_arguments() {
  // Arrange
  struct Pool;
  let types = TypeRegistry::new();
  types.register_with(vec![Param::integer("size")], |args| {
    let size = args.integer("size")?;
    if size <= 0 {
      return Err(ContainerError::construction("Pool", format!("size must be positive, got {}", size)));
    }
    Ok(Pool)
  });
  let container = Container::builder(types)
    .parameters([("size", 0)].into_iter().collect())
    .build();

  // Act
  let err = container.resolve::<Pool>().err();

  // Assert
  assert!(matches!(err, Some(ContainerError::Construction { ref target, .. }) if target == "Pool"));
  assert!(!container.has_service(TypeKey::of::<Pool>()));
}
