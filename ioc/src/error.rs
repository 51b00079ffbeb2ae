use thiserror::Error;

/// Every way resolving or configuring a container can fail.
///
/// All of these are wiring or configuration defects. Nothing is retried, and a
/// failed construction never leaves a partially built service behind.
#[derive(Debug, Error)]
pub enum ContainerError {
  #[error("Unknown parameter '{0}'")]
  UnknownParameter(String),

  #[error("Invalid reference {0}")]
  InvalidReference(String),

  #[error("Service with key '{0}' already loaded")]
  DuplicateService(String),

  #[error("Service '{0}' is abstract")]
  AbstractInstance(String),

  #[error("Service '{0}' uses wrong build scheme")]
  WrongBuildScheme(String),

  #[error("No implementation found for {0}")]
  NoImplementationFound(String),

  #[error("Wrong parameter type for '{name}': expected {expected}, found {found}")]
  WrongParameterType {
    name: String,
    expected: String,
    found: String,
  },

  #[error("List item type {0} is not abstract")]
  NonAbstractListItem(String),

  #[error("Circular dependency detected: {path}")]
  CyclicDependency { path: String },

  #[error("{owner} has no argument named '{argument}'")]
  MissingArgument { owner: String, argument: String },

  #[error("Argument '{argument}' of {owner} is not {expected}")]
  ArgumentMismatch {
    owner: String,
    argument: String,
    expected: String,
  },

  #[error("Service of type {found} cannot be used as {expected}")]
  TypeMismatch { expected: String, found: String },

  #[error("Parameter '{name}' has an unsupported value: {found}")]
  UnsupportedParameter { name: String, found: String },

  #[error("Failed to parse configuration: {0}")]
  ConfigParse(String),

  #[error("Failed to construct {target}: {reason}")]
  Construction { target: String, reason: String },
}

impl ContainerError {
  /// Convenience for constructors that need to reject their arguments.
  pub fn construction(target: impl Into<String>, reason: impl Into<String>) -> Self {
    ContainerError::Construction {
      target: target.into(),
      reason: reason.into(),
    }
  }
}

/// A specialized `Result` type for container operations.
pub type Result<T, E = ContainerError> = std::result::Result<T, E>;
