//! # Weft IoC
//!
//! A configuration-driven dependency injection container for Rust.
//!
//! Weft IoC builds whole object graphs on demand. Each type declares the
//! parameters its constructor needs; the container resolves every parameter
//! recursively from configuration values, named services, build schemes and
//! other constructible types, and constructs each concrete type at most once.
//!
//! ## Core Concepts
//!
//! - **TypeRegistry**: Declares concrete types, abstract families (`dyn Trait`)
//!   and which types implement which family.
//! - **Container**: Owns the parameters, build schemes and constructed
//!   services of one application.
//! - **Parameters**: Named scalar configuration values, loadable from YAML,
//!   JSON or any `serde::Serialize` value.
//! - **BuildScheme**: An explicit recipe that overrides how the arguments of
//!   one type are resolved.
//! - **Resolution**: `Container::resolve` returns a `Result`; the `resolve!`
//!   macro panics if a dependency cannot be built.
//!
//! ## Quick Start
//!
//! ```
//! use weft_ioc::{implements, resolve, Arguments, Component, Container, Param, Parameters, Result, TypeRegistry};
//! use std::sync::Arc;
//!
//! // Define a trait and a concrete implementation.
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! struct EnglishGreeter {
//!     message: String,
//! }
//!
//! impl Greeter for EnglishGreeter {
//!     fn greet(&self) -> String {
//!         self.message.clone()
//!     }
//! }
//!
//! // Declare what the constructor needs.
//! impl Component for EnglishGreeter {
//!     fn parameters() -> Vec<Param> {
//!         vec![Param::text("greeting_message")]
//!     }
//!
//!     fn construct(args: &Arguments) -> Result<Self> {
//!         Ok(EnglishGreeter { message: args.text("greeting_message")? })
//!     }
//! }
//!
//! fn main() {
//!     let types = TypeRegistry::new();
//!     types.register::<EnglishGreeter>();
//!     implements!(types, EnglishGreeter => dyn Greeter);
//!
//!     let parameters = Parameters::from_yaml_str("greeting_message: Hello, World!").unwrap();
//!     let container = Container::builder(types).parameters(parameters).build();
//!
//!     // Resolve the service by its trait; the concrete type is built on demand.
//!     let greeter_service: Arc<dyn Greeter> = resolve!(container, trait Greeter);
//!
//!     assert_eq!(greeter_service.greet(), "Hello, World!");
//!     println!("{}", greeter_service.greet());
//! }
//! ```

mod component;
mod container;
mod core;
mod error;
mod global;
mod kernel;
mod macros;
mod parameters;
mod registry;
mod scheme;
mod service;
mod types;

pub use crate::core::{Reference, ServiceKey, TypeKey, TypeRef};
pub use component::{Arguments, Component, Param};
pub use container::{Container, ContainerBuilder};
pub use error::{ContainerError, Result};
pub use global::types;
pub use kernel::{BuildSchemeProvider, ConfigFile, ConfigProvider, Kernel, Module};
pub use parameters::{Parameters, Scalar};
pub use registry::ServiceRegistry;
pub use scheme::{ArgumentKey, BuildScheme, BuildSchemes, Override};
pub use service::{Service, Supertype, Value};
pub use types::{TypeIntrospector, TypeRegistry};
