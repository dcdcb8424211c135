use std::{
    collections::{BTreeMap, HashMap, HashSet},
    mem,
    sync::Arc,
    thread,
};

use futures::{future::BoxFuture, FutureExt};

use crate::{
    cleanup::{close_in_reverse, CleanupHandle},
    egg::Egg,
    errors::ResolveError,
    kwargs::Kwargs,
    options::HatchOptions,
    provider::{Provider, ProviderId},
    signature::find_marker,
    types::Instance,
};

/// Egg Hatcher - hatches eggs into their values
///
/// Scoped to a single top-level call: handles caching, circular dependency detection and
/// recursive resolution. Values resolved for nested parameters are published by name, so later
/// providers can take them without declaring an egg.
pub struct Hatcher {
    available: BTreeMap<String, Instance>,
    cache: HashMap<ProviderId, Instance>,
    resolving: HashSet<ProviderId>,
    cleanups: Vec<CleanupHandle>,
    options: HatchOptions,
}

impl Hatcher {
    pub fn new(available: BTreeMap<String, Instance>) -> Self {
        Self::with_options(available, HatchOptions::default())
    }

    pub fn with_options(available: BTreeMap<String, Instance>, options: HatchOptions) -> Self {
        Hatcher {
            available,
            cache: HashMap::new(),
            resolving: HashSet::new(),
            cleanups: Vec::new(),
            options,
        }
    }

    pub fn available(&self) -> &BTreeMap<String, Instance> {
        &self.available
    }

    /// True while `provider` is being resolved further up the call stack
    pub fn is_resolving(&self, provider: ProviderId) -> bool {
        self.resolving.contains(&provider)
    }

    /// True if no provider is currently being resolved
    pub fn is_idle(&self) -> bool {
        self.resolving.is_empty()
    }

    pub fn is_cached(&self, egg: &Egg) -> bool {
        egg.use_cache()
            && egg
                .provider_id()
                .is_some_and(|id| self.cache.contains_key(&id))
    }

    /// Number of generator teardowns still to run
    pub fn pending_cleanups(&self) -> usize {
        self.cleanups.len()
    }

    /// Hatches an egg to its value
    pub fn hatch<'a>(&'a mut self, egg: &'a Egg) -> BoxFuture<'a, Result<Instance, ResolveError>> {
        async move {
            let provider = egg.provider()?;
            let id = provider.id();

            if self.resolving.contains(&id) {
                tracing::error!("Circular dependency on {}", provider.name());
                return Err(ResolveError::CircularDependency {
                    provider: provider.name().to_string(),
                });
            }

            if egg.use_cache() {
                if let Some(cached) = self.cache.get(&id) {
                    tracing::debug!("Using cached value of {}", provider.name());
                    return Ok(cached.clone());
                }
            }

            self.resolving.insert(id);
            let result = self.construct(&provider).await;
            self.resolving.remove(&id);
            let value = result?;

            // Only the first cache-enabled resolution is stored
            if egg.use_cache() {
                self.cache.entry(id).or_insert_with(|| value.clone());
            }

            Ok(value)
        }
        .boxed()
    }

    /// Builds the keyword arguments for `provider`, hatching nested eggs
    pub async fn build_kwargs(&mut self, provider: &Provider) -> Result<Kwargs, ResolveError> {
        let mut kwargs = Kwargs::new();

        for param in provider.signature().params() {
            let name = param.name();

            if let Some(egg) = find_marker(param) {
                let value = self.hatch(egg).await?;
                kwargs.insert(name, value.clone());
                self.available.insert(name.to_string(), value);
            } else if let Some(value) = self.available.get(name) {
                kwargs.insert(name, value.clone());
            } else if !param.has_default() {
                tracing::error!("Missing '{}' for {}", name, provider.name());
                return Err(ResolveError::MissingDependency {
                    param: name.to_string(),
                    provider: provider.name().to_string(),
                    available: self.available.keys().cloned().collect(),
                });
            }
            // Has a default - leave it to the provider
        }

        Ok(kwargs)
    }

    /// Closes all teardown handles, most recently acquired first
    pub async fn close_all(&mut self) {
        if self.pending_cleanups() == 0 {
            return;
        }

        tracing::debug!("Running {} teardowns", self.pending_cleanups());
        close_in_reverse(mem::take(&mut self.cleanups), self.options.teardown_timeout).await;
    }

    async fn construct(&mut self, provider: &Provider) -> Result<Instance, ResolveError> {
        let kwargs = self.build_kwargs(provider).await?;

        tracing::debug!("Invoking {} with {} arguments", provider.name(), kwargs.len());
        let (value, cleanup) =
            provider
                .invoke(kwargs)
                .await
                .map_err(|error| ResolveError::ProviderFailed {
                    provider: provider.name().to_string(),
                    error: Arc::new(error),
                })?;

        if let Some(handle) = cleanup {
            self.cleanups.push(handle);
        }

        Ok(value)
    }
}

/// Teardowns left over when a call is dropped before [`Hatcher::close_all`] ran
///
/// They run on their own thread, so a dropped call never blocks the caller's executor.
impl Drop for Hatcher {
    fn drop(&mut self) {
        if self.pending_cleanups() == 0 {
            return;
        }

        let cleanups = mem::take(&mut self.cleanups);
        let timeout = self.options.teardown_timeout;
        tracing::warn!("Hatcher dropped with {} pending teardowns", cleanups.len());

        thread::spawn(move || {
            futures::executor::block_on(close_in_reverse(cleanups, timeout));
        });
    }
}
