use std::{
    fmt::Debug,
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use futures::{future::BoxFuture, stream::BoxStream, FutureExt, Stream, StreamExt};

use crate::{
    cleanup::CleanupHandle,
    kwargs::Kwargs,
    signature::Signature,
    types::{DynError, Injectable, Instance, TypeInfo},
};

static NEXT_PROVIDER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a provider
///
/// Assigned once when the provider is created, shared by all clones.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProviderId(u64);
impl ProviderId {
    fn next() -> Self {
        ProviderId(NEXT_PROVIDER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Name and identity of a provider
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct ProviderInfo {
    pub id: ProviderId,
    pub name: String,
}
impl std::fmt::Display for ProviderInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// A callable struct which can provide a value
///
/// The struct's own fields parameterize it, the [`Signature`] declares what it needs from the
/// hatcher.
///
/// ```ignore
/// struct Multiplier(i32);
/// impl Provide for Multiplier {
///     type Output = i32;
///
///     fn signature(&self) -> Signature {
///         Signature::new().inject("base", Egg::new(&base_value))
///     }
///
///     async fn call(&self, kwargs: Kwargs) -> Result<i32, DynError> {
///         Ok(*kwargs.get::<i32>("base")? * self.0)
///     }
/// }
/// ```
pub trait Provide: Send + Sync + 'static {
    type Output: Injectable;

    /// Name used in errors and logs
    fn name(&self) -> String {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Parameters this provider declares
    fn signature(&self) -> Signature;

    /// Produces the value from the resolved keyword arguments
    fn call(
        &self,
        kwargs: Kwargs,
    ) -> impl Future<Output = Result<Self::Output, DynError>> + Send + '_;
}

/// The ways a provider can be invoked
pub enum Invocation {
    /// Called synchronously
    Plain(Box<dyn Fn(Kwargs) -> Result<Instance, DynError> + Send + Sync>),
    /// Called and awaited
    Suspending(Box<dyn Fn(Kwargs) -> BoxFuture<'static, Result<Instance, DynError>> + Send + Sync>),
    /// Generator style: the first item is the value, advancing once more runs the teardown
    Scoped(Box<dyn Fn(Kwargs) -> BoxStream<'static, Result<Instance, DynError>> + Send + Sync>),
}
impl Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Invocation::Plain(_) => "Plain",
            Invocation::Suspending(_) => "Suspending",
            Invocation::Scoped(_) => "Scoped",
        })
    }
}

/// A producer of a dependency value
///
/// Cheap to clone - clones share the same [`ProviderId`], so they hit the same cache entry.
#[derive(Clone)]
pub struct Provider(Arc<ProviderInner>);
struct ProviderInner {
    info: ProviderInfo,
    supplies: TypeInfo,
    signature: Signature,
    invocation: Invocation,
}
impl Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.0.info.name)
            .field("supplies", &self.0.supplies.type_name)
            .field("invocation", &self.0.invocation)
            .finish()
    }
}

impl Provider {
    fn build(
        name: String,
        supplies: TypeInfo,
        signature: Signature,
        invocation: Invocation,
    ) -> Self {
        Provider(Arc::new(ProviderInner {
            info: ProviderInfo {
                id: ProviderId::next(),
                name,
            },
            supplies,
            signature,
            invocation,
        }))
    }

    /// A synchronous provider
    pub fn plain<T, F>(name: impl Into<String>, signature: Signature, provide: F) -> Self
    where
        T: Injectable,
        F: Fn(Kwargs) -> Result<T, DynError> + Send + Sync + 'static,
    {
        Self::build(
            name.into(),
            TypeInfo::of::<T>(),
            signature,
            Invocation::Plain(Box::new(move |kwargs| provide(kwargs).map(Instance::new))),
        )
    }

    /// An async provider
    pub fn suspending<T, F, Fut>(name: impl Into<String>, signature: Signature, provide: F) -> Self
    where
        T: Injectable,
        F: Fn(Kwargs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, DynError>> + Send + 'static,
    {
        Self::build(
            name.into(),
            TypeInfo::of::<T>(),
            signature,
            Invocation::Suspending(Box::new(move |kwargs| {
                provide(kwargs).map(|result| result.map(Instance::new)).boxed()
            })),
        )
    }

    /// A generator style provider
    ///
    /// The stream's first item is the provided value. The stream is kept alive until the hatched
    /// call finishes, then polled once more to run its teardown. See [`crate::cleanup::generator`].
    pub fn scoped<T, F, S>(name: impl Into<String>, signature: Signature, provide: F) -> Self
    where
        T: Injectable,
        F: Fn(Kwargs) -> S + Send + Sync + 'static,
        S: Stream<Item = Result<T, DynError>> + Send + 'static,
    {
        Self::build(
            name.into(),
            TypeInfo::of::<T>(),
            signature,
            Invocation::Scoped(Box::new(move |kwargs| {
                provide(kwargs)
                    .map(|item| item.map(Instance::new))
                    .boxed()
            })),
        )
    }

    /// Adapts a callable struct
    pub fn callable<P: Provide>(provide: P) -> Self {
        let name = provide.name();
        let signature = provide.signature();
        let provide = Arc::new(provide);

        Self::build(
            name,
            TypeInfo::of::<P::Output>(),
            signature,
            Invocation::Suspending(Box::new(move |kwargs| {
                let provide = provide.clone();
                async move { provide.call(kwargs).await.map(Instance::new) }.boxed()
            })),
        )
    }

    pub fn id(&self) -> ProviderId {
        self.0.info.id
    }

    pub fn name(&self) -> &str {
        &self.0.info.name
    }

    pub fn info(&self) -> &ProviderInfo {
        &self.0.info
    }

    /// Type of the provided value
    pub fn supplies(&self) -> TypeInfo {
        self.0.supplies
    }

    pub fn signature(&self) -> &Signature {
        &self.0.signature
    }

    pub fn invocation(&self) -> &Invocation {
        &self.0.invocation
    }

    /// Calls the provider with already resolved keyword arguments
    ///
    /// Generator style providers are advanced exactly once, the live stream is returned as
    /// cleanup handle.
    pub async fn invoke(
        &self,
        kwargs: Kwargs,
    ) -> Result<(Instance, Option<CleanupHandle>), DynError> {
        match &self.0.invocation {
            Invocation::Plain(provide) => provide(kwargs).map(|value| (value, None)),
            Invocation::Suspending(provide) => provide(kwargs).await.map(|value| (value, None)),
            Invocation::Scoped(provide) => {
                let mut stream = provide(kwargs);
                match stream.next().await {
                    Some(Ok(value)) => {
                        let handle = CleanupHandle::new(self.name().to_string(), stream);
                        Ok((value, Some(handle)))
                    }
                    Some(Err(error)) => Err(error),
                    None => Err(format!("'{}' did not yield a value", self.name()).into()),
                }
            }
        }
    }
}

/// Strips module paths from a type name - `my_crate::deps::Multiplier` becomes `Multiplier`
fn short_type_name(type_name: &str) -> String {
    let base = type_name.split('<').next().unwrap_or(type_name);
    let short = base.rsplit("::").next().unwrap_or(base);
    match type_name.find('<') {
        Some(generics) => format!("{short}{}", &type_name[generics..]),
        None => short.to_string(),
    }
}
