use weft_ioc::{
  Arguments, Component, Container, ContainerError, Param, Parameters, Result, TypeRegistry,
};

struct HttpServer {
  port: i64,
}

impl Component for HttpServer {
  fn parameters() -> Vec<Param> {
    vec![Param::integer("port")]
  }

  fn construct(args: &Arguments) -> Result<Self> {
    Ok(HttpServer {
      port: args.integer("port")?,
    })
  }
}

struct NeverDeclared;

fn container(config: &str) -> Container {
  let types = TypeRegistry::new();
  types.register::<HttpServer>();
  let parameters = Parameters::from_yaml_str(config).unwrap_or_default();
  Container::builder(types).parameters(parameters).build()
}

fn main() {
  // The configuration has no `port` key.
  match container("host: 0.0.0.0").resolve::<HttpServer>() {
    Err(ContainerError::UnknownParameter(name)) => println!("missing configuration key: {}", name),
    other => panic!("expected an unknown parameter, got {:?}", other.err()),
  }

  // The key is there but holds text where an integer is declared.
  match container("port: eighty").resolve::<HttpServer>() {
    Err(err @ ContainerError::WrongParameterType { .. }) => println!("{}", err),
    other => panic!("expected a wrong parameter type, got {:?}", other.err()),
  }

  // A type nobody declared cannot be resolved at all.
  match container("port: 80").resolve::<NeverDeclared>() {
    Err(err @ ContainerError::InvalidReference(_)) => println!("{}", err),
    other => panic!("expected an invalid reference, got {:?}", other.err()),
  }

  let server = container("port: 80").resolve::<HttpServer>().unwrap_or_else(|err| panic!("{}", err));
  println!("listening on port {}", server.port);
}
