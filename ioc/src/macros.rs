//! Public macros for declaring families and resolving services.

/// Records a concrete type as a direct subclass of one or more families.
///
/// Each family is usually a `dyn Trait` the type implements; the upcast is
/// the plain unsizing coercion.
///
/// # Examples
///
/// ```
/// use weft_ioc::{implements, Container, TypeRegistry};
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// trait Farewell: Send + Sync { fn bye(&self) -> String; }
///
/// #[derive(Default)]
/// struct English;
/// impl Greeter for English { fn greet(&self) -> String { "Hello!".to_string() } }
/// impl Farewell for English { fn bye(&self) -> String { "Bye!".to_string() } }
///
/// let types = TypeRegistry::new();
/// types.register_default::<English>();
/// implements!(types, English => dyn Greeter, dyn Farewell);
///
/// let container = Container::new(types);
/// assert_eq!(container.resolve::<dyn Greeter>().unwrap().greet(), "Hello!");
/// assert_eq!(container.resolve::<dyn Farewell>().unwrap().bye(), "Bye!");
/// ```
#[macro_export]
macro_rules! implements {
    ($types:expr, $concrete:ty => $($family:ty),+ $(,)?) => {
        $(
            $types.implement::<$family, $concrete>(|concrete| concrete);
        )+
    };
}

/// Resolves a service from a container, panicking if it cannot be built.
///
/// This macro is meant for application wiring code where a missing
/// dependency is a programming error. For a non-panicking version, use
/// `Container::resolve` or `Container::resolve_named` directly.
///
/// # Panics
///
/// Panics with the resolution error if the service cannot be resolved.
///
/// # Examples
///
/// ```
/// use weft_ioc::{implements, resolve, Container, TypeRegistry};
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
///
/// #[derive(Default)]
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter { fn greet(&self) -> String { "Hello!".to_string() } }
///
/// let types = TypeRegistry::new();
/// types.register_default::<EnglishGreeter>();
/// implements!(types, EnglishGreeter => dyn Greeter);
/// let container = Container::new(types);
///
/// // Resolve the trait object
/// let greeter = resolve!(container, trait Greeter);
/// assert_eq!(greeter.greet(), "Hello!");
///
/// // Or the concrete type, which is the same instance
/// let concrete = resolve!(container, EnglishGreeter);
/// assert_eq!(concrete.greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! resolve {
    // resolve!(container, trait MyTrait)
    // `:ident` captures the trait's name; `dyn` is added in the expansion.
    ($container:expr, trait $trait_ident:ident) => {
        $container
            .resolve::<dyn $trait_ident>()
            .unwrap_or_else(|err| {
                panic!(
                    "Failed to resolve required trait service {}: {}",
                    std::any::type_name::<dyn $trait_ident>(),
                    err
                )
            })
    };

    // resolve!(container, trait MyTrait, "name")
    ($container:expr, trait $trait_ident:ident, $name:expr) => {
        $container
            .resolve_named::<dyn $trait_ident>($name)
            .unwrap_or_else(|err| {
                panic!(
                    "Failed to resolve required trait service with name '{}': {}",
                    $name, err
                )
            })
    };

    // resolve!(container, MyService)
    ($container:expr, $type:ty) => {
        $container.resolve::<$type>().unwrap_or_else(|err| {
            panic!(
                "Failed to resolve required service {}: {}",
                std::any::type_name::<$type>(),
                err
            )
        })
    };

    // resolve!(container, MyService, "name")
    ($container:expr, $type:ty, $name:expr) => {
        $container
            .resolve_named::<$type>($name)
            .unwrap_or_else(|err| {
                panic!(
                    "Failed to resolve required service with name '{}': {}",
                    $name, err
                )
            })
    };
}
