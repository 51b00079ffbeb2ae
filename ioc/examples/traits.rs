use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use weft_ioc::{implements, resolve, Arguments, Component, Param, Result};

// 1. Define the abstraction (the trait)
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

// 2. Define a concrete implementation
#[derive(Default)]
struct ConsoleLogger;
impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[CONSOLE LOG]: {}", message);
  }
}

// 3. Define a service that depends on the abstraction
struct ReportService {
  logger: Arc<dyn Logger>,
}

impl Component for ReportService {
  fn parameters() -> Vec<Param> {
    vec![Param::of::<dyn Logger>("logger")]
  }

  fn construct(args: &Arguments) -> Result<Self> {
    Ok(ReportService {
      logger: args.service("logger")?,
    })
  }
}

impl ReportService {
  fn generate_report(&self) {
    self.logger.log("Starting report generation.");
    // ... logic to generate report ...
    self.logger.log("Finished report generation.");
  }
}

fn main() {
  // RUST_LOG=weft_ioc=trace shows every resolution step.
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  // --- Registration ---

  // Declare the types in the global registry. ConsoleLogger becomes the
  // implementation of `dyn Logger`; ReportService declares it needs one.
  let types = weft_ioc::types();
  types.register_default::<ConsoleLogger>();
  types.register::<ReportService>();
  implements!(types, ConsoleLogger => dyn Logger);

  let container = weft_ioc::Container::new(types);

  // --- Resolution and Usage ---
  println!("Resolving the high-level service...");
  let report_service = resolve!(container, ReportService);

  println!("Using the service...");
  report_service.generate_report();

  // The output shows messages from the ConsoleLogger, proving the dependency was injected.
}
