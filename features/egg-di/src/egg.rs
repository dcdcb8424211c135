use std::{
    fmt::{Debug, Display},
    sync::{Arc, OnceLock},
};

use crate::{
    errors::ResolveError,
    provider::{Provider, ProviderId},
};

/// An Egg is a declared dependency on a [`Provider`]
///
/// The provider's own parameters get matched by name from the values available during hatching.
/// Nesting works. Cached by default - all eggs of the same provider share one value per call.
#[derive(Clone)]
pub struct Egg {
    source: EggSource,
    use_cache: bool,
}

#[derive(Clone)]
enum EggSource {
    Provider(Provider),
    Deferred(ProviderCell),
}

impl Egg {
    /// A cached dependency on `provider`
    pub fn new(provider: &Provider) -> Self {
        Egg {
            source: EggSource::Provider(provider.clone()),
            use_cache: true,
        }
    }

    /// A dependency on `provider` which is invoked again on every request
    pub fn uncached(provider: &Provider) -> Self {
        Egg {
            use_cache: false,
            ..Egg::new(provider)
        }
    }

    /// A dependency on a provider which is bound to `cell` later
    ///
    /// Needed to declare providers which depend on each other.
    pub fn deferred(cell: &ProviderCell) -> Self {
        Egg {
            source: EggSource::Deferred(cell.clone()),
            use_cache: true,
        }
    }

    pub fn with_cache(self, use_cache: bool) -> Self {
        Egg { use_cache, ..self }
    }

    pub fn use_cache(&self) -> bool {
        self.use_cache
    }

    /// The provider this egg hatches from
    pub fn provider(&self) -> Result<Provider, ResolveError> {
        match &self.source {
            EggSource::Provider(provider) => Ok(provider.clone()),
            EggSource::Deferred(cell) => cell.get().ok_or_else(|| ResolveError::UnboundProvider {
                cell: cell.name().to_string(),
            }),
        }
    }

    /// Identity of the provider, `None` for an unbound deferred egg
    pub fn provider_id(&self) -> Option<ProviderId> {
        self.provider().ok().map(|provider| provider.id())
    }

    /// Name of the provider, or of the cell for deferred eggs
    pub fn name(&self) -> String {
        match &self.source {
            EggSource::Provider(provider) => provider.name().to_string(),
            EggSource::Deferred(cell) => match cell.get() {
                Some(provider) => provider.name().to_string(),
                None => cell.name().to_string(),
            },
        }
    }
}
impl Display for Egg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Egg({})", self.name())
    }
}
impl Debug for Egg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

/// A slot for a provider which does not exist yet
///
/// Binding is one-shot. All clones see the bound provider.
#[derive(Clone)]
pub struct ProviderCell {
    name: Arc<str>,
    slot: Arc<OnceLock<Provider>>,
}
impl Debug for ProviderCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCell")
            .field("name", &self.name)
            .field("bound", &self.slot.get().is_some())
            .finish()
    }
}

impl ProviderCell {
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        ProviderCell {
            name: name.into(),
            slot: Arc::new(OnceLock::new()),
        }
    }

    /// Binds the provider, returning it back if the cell was already bound
    pub fn bind(&self, provider: &Provider) -> Result<(), Provider> {
        self.slot.set(provider.clone())
    }

    pub fn get(&self) -> Option<Provider> {
        self.slot.get().cloned()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
