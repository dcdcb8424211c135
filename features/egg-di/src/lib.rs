//! Egg DI hatches the dependencies of a function right before it is called.
//!
//! Every call gets its own resolution scope - nothing is shared between calls.
//!
//! Egg DI consists of the following parts:
//!
//! 1. [`Provider`] - something which produces a value: a plain function, an async function, a
//!    callable struct ([`Provide`]) or a generator style stream with a teardown
//! 2. [`Egg`] - a declared dependency on a provider, cached per call by default
//! 3. [`Signature`] - the ordered parameters of a provider or target, each either injected from
//!    an egg or taken by name from the values available in the call
//! 4. [`Hatcher`] - resolves eggs recursively, caches values, detects circular dependencies and
//!    collects generator teardowns
//! 5. [`hatch_eggs`] / [`hatch_eggs_sync`] - wraps a target function
//!
//! # Example
//!
//! ```rust
//! use egg_di::{hatch_eggs, Args, DynError, Egg, Provider, Signature};
//!
//! let get_base_value = Provider::suspending("get_base_value", Signature::new(), |_| async {
//!     Ok::<_, DynError>(10_i32)
//! });
//! let get_doubled = Provider::plain(
//!     "get_doubled",
//!     Signature::new().inject("base", Egg::new(&get_base_value)),
//!     |kwargs| Ok(*kwargs.get::<i32>("base")? * 2),
//! );
//!
//! let func = hatch_eggs(
//!     Signature::new().inject("value", Egg::new(&get_doubled)),
//!     |kwargs| async move { Ok::<_, DynError>(*kwargs.get::<i32>("value")? + 5) },
//! );
//!
//! assert_eq!(func.call_blocking(Args::new()).unwrap(), 25);
//! // Supplied arguments win over eggs
//! assert_eq!(func.call_blocking(Args::new().kwarg("value", 100_i32)).unwrap(), 105);
//! ```

pub mod args;
pub mod cleanup;
pub mod decorator;
pub mod dependency_graph;
pub mod egg;
pub mod errors;
pub mod hatcher;
pub mod kwargs;
pub mod options;
pub mod provider;
pub mod signature;
pub mod types;

pub use args::Args;
pub use cleanup::{generator, CleanupHandle};
pub use decorator::{hatch_eggs, hatch_eggs_sync, HatchEggs};
pub use egg::{Egg, ProviderCell};
pub use errors::{HatchError, KwargError, ResolveError};
pub use hatcher::Hatcher;
pub use kwargs::Kwargs;
pub use options::HatchOptions;
pub use provider::{Provide, Provider, ProviderId};
pub use signature::{find_marker, Param, ParamDefault, Signature};
pub use types::{DynError, Injectable, Instance};
