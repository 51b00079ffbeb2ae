use std::sync::Arc;
use weft_ioc::{implements, Arguments, Component, Container, Param, Result, TypeRegistry};

// Two ways of delivering an alert. `PagerChannel` is declared first, so it is
// what `dyn AlertChannel` resolves to by default.
trait AlertChannel: Send + Sync {
  fn deliver(&self, alert: &str) -> String;
}

#[derive(Default)]
struct PagerChannel;
impl AlertChannel for PagerChannel {
  fn deliver(&self, alert: &str) -> String {
    format!("paged on-call: {}", alert)
  }
}

struct WebhookChannel {
  url: String,
}
impl AlertChannel for WebhookChannel {
  fn deliver(&self, alert: &str) -> String {
    format!("POST {} <- {}", self.url, alert)
  }
}

// Asks for its channel through an argument called `channel`.
struct Monitor {
  channel: Arc<dyn AlertChannel>,
}

impl Component for Monitor {
  fn parameters() -> Vec<Param> {
    vec![Param::of::<dyn AlertChannel>("channel")]
  }

  fn construct(args: &Arguments) -> Result<Self> {
    Ok(Monitor {
      channel: args.service("channel")?,
    })
  }
}

fn types() -> TypeRegistry {
  let types = TypeRegistry::new();
  types.register_default::<PagerChannel>();
  types.register::<Monitor>();
  implements!(types, PagerChannel => dyn AlertChannel);
  implements!(types, WebhookChannel => dyn AlertChannel);
  types
}

fn main() -> Result<()> {
  // Without a named service the family's first implementation is built.
  let default_wiring = Container::new(types());
  let monitor = default_wiring.resolve::<Monitor>()?;
  println!("{}", monitor.channel.deliver("disk full"));

  // A service registered under the argument's name takes precedence, as long
  // as it belongs to the declared family.
  let custom_wiring = Container::new(types());
  custom_wiring.add_instance(
    "channel",
    WebhookChannel {
      url: "https://hooks.example.com/alerts".to_string(),
    },
  )?;
  let monitor = custom_wiring.resolve::<Monitor>()?;
  let delivered = monitor.channel.deliver("disk full");
  println!("{}", delivered);

  assert!(delivered.starts_with("POST"));
  Ok(())
}
