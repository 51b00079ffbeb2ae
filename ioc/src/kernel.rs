//! Application bootstrap: runs registration modules, loads configuration and
//! build schemes, and hands back a ready container.

use crate::container::Container;
use crate::error::{ContainerError, Result};
use crate::parameters::Parameters;
use crate::scheme::BuildScheme;
use crate::types::TypeRegistry;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Supplies the scalar parameters a container is created with.
pub trait ConfigProvider: Send + Sync {
  fn parameters(&self) -> Result<Parameters>;
}

impl ConfigProvider for Parameters {
  fn parameters(&self) -> Result<Parameters> {
    Ok(self.clone())
  }
}

/// Reads parameters from a YAML or JSON file, chosen by extension.
///
/// Files ending in `.json` are parsed as JSON; anything else as YAML.
#[derive(Debug, Clone)]
pub struct ConfigFile {
  path: PathBuf,
}

impl ConfigFile {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }
}

impl ConfigProvider for ConfigFile {
  fn parameters(&self) -> Result<Parameters> {
    let source = fs::read_to_string(&self.path).map_err(|e| {
      ContainerError::ConfigParse(format!("cannot read {}: {}", self.path.display(), e))
    })?;

    let is_json = self
      .path
      .extension()
      .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
      Parameters::from_json_str(&source)
    } else {
      Parameters::from_yaml_str(&source)
    }
  }
}

/// Supplies the build schemes a container is created with.
pub trait BuildSchemeProvider: Send + Sync {
  fn schemes(&self) -> Vec<BuildScheme>;
}

impl BuildSchemeProvider for Vec<BuildScheme> {
  fn schemes(&self) -> Vec<BuildScheme> {
    self.clone()
  }
}

/// A named function that declares a group of types.
pub type Module = fn(&TypeRegistry);

/// Boots an application: every module declares its types, then a container
/// is created from the configured parameters and build schemes.
///
/// ```
/// use weft_ioc::{BuildScheme, Kernel, Parameters, TypeRegistry};
///
/// #[derive(Default)]
/// struct Clock;
///
/// fn clock_module(types: &TypeRegistry) {
///   types.register_default::<Clock>();
/// }
///
/// let kernel = Kernel::new(Parameters::new(), Vec::<BuildScheme>::new())
///   .module("clock", clock_module);
///
/// let container = kernel.boot().unwrap();
/// assert!(container.resolve::<Clock>().is_ok());
/// kernel.shutdown();
/// ```
pub struct Kernel {
  types: Arc<TypeRegistry>,
  config: Box<dyn ConfigProvider>,
  schemes: Box<dyn BuildSchemeProvider>,
  modules: Vec<(&'static str, Module)>,
}

impl Kernel {
  pub fn new(
    config: impl ConfigProvider + 'static,
    schemes: impl BuildSchemeProvider + 'static,
  ) -> Self {
    Self {
      types: Arc::new(TypeRegistry::new()),
      config: Box::new(config),
      schemes: Box::new(schemes),
      modules: Vec::new(),
    }
  }

  /// Declares types into `types` instead of a registry private to the kernel.
  pub fn with_types(mut self, types: Arc<TypeRegistry>) -> Self {
    self.types = types;
    self
  }

  pub fn module(mut self, name: &'static str, module: Module) -> Self {
    self.modules.push((name, module));
    self
  }

  pub fn types(&self) -> &Arc<TypeRegistry> {
    &self.types
  }

  /// Runs every module in the order they were added, then builds a
  /// container. Configuration errors abort the boot.
  pub fn boot(&self) -> Result<Container> {
    info!(modules = self.modules.len(), "booting kernel");

    for (name, module) in &self.modules {
      debug!(module = *name, "loading module");
      module(&self.types);
    }

    let parameters = self.config.parameters()?;
    let schemes = self.schemes.schemes();
    let container = Container::builder(Arc::clone(&self.types))
      .parameters(parameters)
      .schemes(schemes)
      .build();

    info!(types = self.types.len(), "kernel booted");
    Ok(container)
  }

  pub fn shutdown(&self) {
    info!("kernel shut down");
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  struct Port(i64);

  fn network(types: &TypeRegistry) {
    types.register_with(vec![crate::Param::integer("port")], |args| {
      Ok(Port(args.integer("port")?))
    });
  }

  fn temp_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("weft-ioc-{}-{}", std::process::id(), name));
    let mut file = fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
  }

  #[test]
  fn config_file_format_follows_extension() {
    let yaml = temp_file("config.yaml", "port: 8080\n");
    let json = temp_file("config.json", r#"{"port": 9090}"#);

    let from_yaml = ConfigFile::new(&yaml).parameters().unwrap();
    let from_json = ConfigFile::new(&json).parameters().unwrap();

    assert_eq!(from_yaml.get("port").unwrap().as_integer(), Some(8080));
    assert_eq!(from_json.get("port").unwrap().as_integer(), Some(9090));
    let _ = fs::remove_file(yaml);
    let _ = fs::remove_file(json);
  }

  #[test]
  fn missing_config_file_aborts_boot() {
    let kernel = Kernel::new(ConfigFile::new("/nonexistent/weft.yaml"), Vec::<BuildScheme>::new())
      .module("network", network);

    assert!(matches!(kernel.boot(), Err(ContainerError::ConfigParse(_))));
  }

  #[test]
  fn boot_runs_modules_before_building() {
    let params: Parameters = [("port", 7000)].into_iter().collect();
    let kernel = Kernel::new(params, Vec::<BuildScheme>::new()).module("network", network);

    let container = kernel.boot().unwrap();

    assert_eq!(container.resolve::<Port>().unwrap().0, 7000);
  }
}
