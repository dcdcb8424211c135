use std::{fmt::Debug, future::Future, pin::pin, time::Duration};

use futures::{future::BoxFuture, FutureExt};

use crate::{
    args::Args,
    cleanup::deadline,
    dependency_graph::{DependencyGraph, DependencyGraphErrors},
    errors::HatchError,
    hatcher::Hatcher,
    kwargs::Kwargs,
    options::HatchOptions,
    signature::{find_marker, Signature},
    types::DynError,
};

enum Target<T> {
    Plain(Box<dyn Fn(Kwargs) -> Result<T, DynError> + Send + Sync>),
    Suspending(Box<dyn Fn(Kwargs) -> BoxFuture<'static, Result<T, DynError>> + Send + Sync>),
}

/// A target function whose eggs are hatched on every call
///
/// Created by [`hatch_eggs`] or [`hatch_eggs_sync`].
pub struct HatchEggs<T> {
    signature: Signature,
    target: Target<T>,
    options: HatchOptions,
}
impl<T> Debug for HatchEggs<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HatchEggs")
            .field("signature", &self.signature)
            .field("suspending", &self.is_suspending())
            .field("options", &self.options)
            .finish()
    }
}

/// Wraps an async target, resolving its eggs before each call
///
/// ```ignore
/// let initialize = hatch_eggs(
///     Signature::new()
///         .param("tenant_name")
///         .inject("client", Egg::new(&get_client)),
///     |kwargs| async move {
///         let client = kwargs.get::<Client>("client")?;
///         ...
///     },
/// );
///
/// initialize.call(Args::new().kwarg("tenant_name", "acme".to_string())).await?;
/// ```
pub fn hatch_eggs<T, F, Fut>(signature: Signature, target: F) -> HatchEggs<T>
where
    T: Send + 'static,
    F: Fn(Kwargs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, DynError>> + Send + 'static,
{
    HatchEggs {
        signature,
        target: Target::Suspending(Box::new(move |kwargs| target(kwargs).boxed())),
        options: HatchOptions::default(),
    }
}

/// Wraps a synchronous target, resolving its eggs before each call
///
/// Use [`HatchEggs::call_blocking`] to call it from synchronous code.
pub fn hatch_eggs_sync<T, F>(signature: Signature, target: F) -> HatchEggs<T>
where
    T: Send + 'static,
    F: Fn(Kwargs) -> Result<T, DynError> + Send + Sync + 'static,
{
    HatchEggs {
        signature,
        target: Target::Plain(Box::new(target)),
        options: HatchOptions::default(),
    }
}

impl<T> HatchEggs<T> {
    /// Bounds resolution plus invocation of each call
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Bounds each generator teardown
    pub fn teardown_timeout(mut self, timeout: Duration) -> Self {
        self.options.teardown_timeout = Some(timeout);
        self
    }

    pub fn with_options(mut self, options: HatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &HatchOptions {
        &self.options
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn is_suspending(&self) -> bool {
        matches!(self.target, Target::Suspending(_))
    }

    /// Statically checks the eggs reachable from the target for cycles and unbound providers
    pub fn check(&self) -> Result<(), DependencyGraphErrors> {
        DependencyGraph::of(&self.signature).check()
    }
}

impl<T: Send + 'static> HatchEggs<T> {
    /// Hatches the eggs and calls the target
    ///
    /// All generator teardowns run before this returns - after success, failure or timeout.
    pub async fn call(&self, args: Args) -> Result<T, HatchError> {
        let available = args.bind(&self.signature);
        let mut hatcher = Hatcher::with_options(available.clone(), self.options);

        let outcome = {
            let mut run = pin!(self.run(&mut hatcher, Kwargs::from(available)).fuse());
            let mut timeout_rx = deadline(self.options.timeout);

            futures::select! {
                outcome = run => outcome,
                _ = timeout_rx => {
                    tracing::warn!("Hatched call timed out after {:?}", self.options.timeout);
                    Err(HatchError::Timeout)
                }
            }
        };

        hatcher.close_all().await;
        outcome
    }

    /// Runs [`HatchEggs::call`] to completion on a fresh executor, blocking the current thread
    pub fn call_blocking(&self, args: Args) -> Result<T, HatchError> {
        futures::executor::block_on(self.call(args))
    }

    async fn run(&self, hatcher: &mut Hatcher, mut kwargs: Kwargs) -> Result<T, HatchError> {
        for param in self.signature.params() {
            // Supplied arguments win over eggs
            if kwargs.contains(param.name()) {
                continue;
            }

            let Some(egg) = find_marker(param) else {
                continue;
            };

            tracing::debug!("Hatching '{}' from {}", param.name(), egg);
            let value = hatcher
                .hatch(egg)
                .await
                .map_err(|source| HatchError::DependencyHatching {
                    param: param.name().to_string(),
                    source,
                })?;
            kwargs.insert(param.name(), value);
        }

        let result = match &self.target {
            Target::Plain(target) => target(kwargs),
            Target::Suspending(target) => target(kwargs).await,
        };

        result.map_err(HatchError::Target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{egg::Egg, provider::Provider};

    #[test]
    fn sync_target_is_called_blocking() {
        let base = Provider::plain("get_base_value", Signature::new(), |_| Ok(10_i32));
        let func = hatch_eggs_sync(
            Signature::new().inject("value", Egg::new(&base)),
            |kwargs| Ok(*kwargs.get::<i32>("value")? + 1),
        );

        assert!(!func.is_suspending());
        assert_eq!(func.call_blocking(Args::new()).unwrap(), 11);
    }

    #[test]
    fn positional_arguments_override_eggs() {
        let base = Provider::plain("get_base_value", Signature::new(), |_| Ok(10_i32));
        let func = hatch_eggs_sync(
            Signature::new().inject("value", Egg::new(&base)),
            |kwargs| Ok(*kwargs.get::<i32>("value")? + 1),
        );

        assert_eq!(func.call_blocking(Args::new().arg(100_i32)).unwrap(), 101);
    }

    #[test]
    fn target_errors_are_not_wrapped_as_hatching_errors() {
        let func = hatch_eggs_sync(Signature::new(), |_| {
            Err::<(), DynError>("target exploded".into())
        });

        match func.call_blocking(Args::new()) {
            Err(HatchError::Target(error)) => assert_eq!(error.to_string(), "target exploded"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn builder_sets_options() {
        let func = hatch_eggs(Signature::new(), |_| async { Ok::<_, DynError>(()) })
            .timeout(Duration::from_secs(1))
            .teardown_timeout(Duration::from_millis(10));

        assert!(func.is_suspending());
        assert_eq!(func.options().timeout, Some(Duration::from_secs(1)));
        assert_eq!(
            func.options().teardown_timeout,
            Some(Duration::from_millis(10))
        );
    }
}
