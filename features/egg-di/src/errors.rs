use std::sync::Arc;

use thiserror::Error;

use crate::types::DynError;

/// Errors while hatching a single egg
///
/// These propagate unwrapped through nested resolution until they reach the decorator.
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    /// A provider was requested while it was already being resolved
    #[error("Circular dependency: {provider}")]
    CircularDependency { provider: String },

    /// A provider parameter has no egg, no available value and no default
    #[error("Missing '{param}' for {provider}. Available: {available:?}")]
    MissingDependency {
        param: String,
        provider: String,
        available: Vec<String>,
    },

    /// A deferred egg was hatched before its cell was bound
    #[error("Deferred provider '{cell}' was never bound")]
    UnboundProvider { cell: String },

    /// The provider itself failed
    #[error("Provider '{provider}' failed - error: {error}")]
    ProviderFailed {
        provider: String,
        error: Arc<DynError>,
    },
}

/// Errors returned from a hatched call
#[derive(Error, Debug)]
pub enum HatchError {
    /// Resolving one of the target's own parameters failed
    #[error("Failed to hatch '{param}': {source}")]
    DependencyHatching {
        param: String,
        #[source]
        source: ResolveError,
    },
    /// The target ran and returned an error
    #[error("Target failed: {0}")]
    Target(DynError),
    /// The call did not complete in time
    #[error("Hatched call timed out")]
    Timeout,
}

/// Errors when reading a resolved value out of [`crate::kwargs::Kwargs`]
#[derive(Error, Debug, Clone)]
pub enum KwargError {
    #[error("No value for '{0}'")]
    Missing(String),
    #[error("Failed to downcast '{name}', required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        name: String,
        required_type: &'static str,
        actual_type: &'static str,
    },
}
