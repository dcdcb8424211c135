use std::{
    fmt::Debug,
    future::Future,
    sync::mpsc::{self, RecvTimeoutError},
    thread::{self, JoinHandle},
    time::Duration,
};

use futures::{
    future::{self, BoxFuture, Fuse},
    stream::{self, BoxStream},
    FutureExt, StreamExt,
};
use futures_channel::oneshot;

use crate::types::{DynError, Instance};

/// The live stream of a generator style provider, after it yielded its value
///
/// Advancing it once more runs the provider's teardown.
pub struct CleanupHandle {
    provider: String,
    stream: BoxStream<'static, Result<Instance, DynError>>,
}
impl Debug for CleanupHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CleanupHandle").field(&self.provider).finish()
    }
}

impl CleanupHandle {
    pub(crate) fn new(provider: String, stream: BoxStream<'static, Result<Instance, DynError>>) -> Self {
        Self { provider, stream }
    }

    /// Name of the provider this handle belongs to
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Runs the teardown, bounded by `timeout`
    ///
    /// Never fails - teardown errors and timeouts are only logged.
    pub async fn close(mut self, timeout: Option<Duration>) {
        let mut timeout_rx = deadline(timeout);
        let mut step = self.stream.next().fuse();

        futures::select! {
            result = step => match result {
                None => tracing::debug!("Teardown of {} completed", self.provider),
                Some(Ok(_)) => tracing::warn!(
                    "Teardown of {} failed - generator yielded more than one value",
                    self.provider
                ),
                Some(Err(error)) => {
                    tracing::warn!("Teardown of {} failed - error: {}", self.provider, error)
                }
            },
            _ = timeout_rx => {
                tracing::warn!(
                    "Teardown of {} timed out after {:?} - abandoning its stream, the teardown may never finish",
                    self.provider,
                    timeout
                )
            }
        }
    }
}

/// Closes handles most recently acquired first, each bounded by `timeout`
pub(crate) async fn close_in_reverse(mut handles: Vec<CleanupHandle>, timeout: Option<Duration>) {
    while let Some(handle) = handles.pop() {
        handle.close(timeout).await;
    }
}

/// Resolves once `timeout` has passed, never if there is none
///
/// A sleeping thread signals the deadline so we stay independent of the async runtime.
pub(crate) fn deadline(timeout: Option<Duration>) -> Fuse<BoxFuture<'static, ()>> {
    match timeout {
        Some(timeout) => timer(timeout).0,
        None => future::pending().boxed().fuse(),
    }
}

/// Spawns the timer thread behind [`deadline`]
///
/// Dropping the returned future wakes the thread, so it never outlives its deadline's user.
fn timer(timeout: Duration) -> (Fuse<BoxFuture<'static, ()>>, JoinHandle<()>) {
    let (timeout_tx, timeout_rx) = oneshot::channel::<()>();
    let (cancel_tx, cancel_rx) = mpsc::channel::<()>();

    let thread = thread::spawn(move || {
        // A disconnect means the deadline was dropped before it passed
        if let Err(RecvTimeoutError::Timeout) = cancel_rx.recv_timeout(timeout) {
            let _ = timeout_tx.send(());
        }
    });

    let expired = async move {
        let _cancel = cancel_tx;
        let _ = timeout_rx.await;
    };

    (expired.boxed().fuse(), thread)
}

/// Builds a generator style stream from a setup and a teardown
///
/// Yields the setup value once. When polled again it runs the teardown and ends, or yields the
/// teardown's error. A failed setup ends the stream without running the teardown.
///
/// ```ignore
/// let connection = Provider::scoped("connection", Signature::new(), |_| {
///     generator(async { Ok(Connection::open()) }, || async { Ok(()) })
/// });
/// ```
pub fn generator<T, Setup, Teardown, TeardownFut>(
    setup: Setup,
    teardown: Teardown,
) -> BoxStream<'static, Result<T, DynError>>
where
    T: Send + 'static,
    Setup: Future<Output = Result<T, DynError>> + Send + 'static,
    Teardown: FnOnce() -> TeardownFut + Send + 'static,
    TeardownFut: Future<Output = Result<(), DynError>> + Send + 'static,
{
    enum Step<S, D> {
        Setup(S, D),
        Teardown(D),
        Done,
    }

    stream::unfold(Step::Setup(setup, teardown), |step| async move {
        match step {
            Step::Setup(setup, teardown) => match setup.await {
                Ok(value) => Some((Ok(value), Step::Teardown(teardown))),
                Err(error) => Some((Err(error), Step::Done)),
            },
            Step::Teardown(teardown) => match teardown().await {
                Ok(()) => None,
                Err(error) => Some((Err(error), Step::Done)),
            },
            Step::Done => None,
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use futures::executor::block_on;

    use super::*;

    fn handle(stream: BoxStream<'static, Result<i32, DynError>>) -> CleanupHandle {
        CleanupHandle::new("test".to_string(), stream.map(|item| item.map(Instance::new)).boxed())
    }

    #[test]
    fn generator_runs_teardown_on_second_step() {
        let closed = Arc::new(AtomicUsize::new(0));
        let counter = closed.clone();
        let mut stream = generator(async { Ok::<_, DynError>(7) }, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, DynError>(())
        });

        assert_eq!(block_on(stream.next()).unwrap().unwrap(), 7);
        assert_eq!(closed.load(Ordering::SeqCst), 0);
        assert!(block_on(stream.next()).is_none());
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_setup_skips_teardown() {
        let closed = Arc::new(AtomicUsize::new(0));
        let counter = closed.clone();
        let mut stream = generator(
            async { Err::<i32, DynError>("no connection".into()) },
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, DynError>(())
            },
        );

        assert!(block_on(stream.next()).unwrap().is_err());
        assert!(block_on(stream.next()).is_none());
        assert_eq!(closed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn close_swallows_teardown_errors() {
        let mut stream = generator(async { Ok::<_, DynError>(1) }, || async {
            Err::<(), DynError>("boom".into())
        });
        let _ = block_on(stream.next());

        block_on(handle(stream).close(Some(Duration::from_secs(1))));
    }

    #[test]
    fn close_gives_up_after_timeout() {
        let mut stream = stream::once(async { Ok::<i32, DynError>(1) })
            .chain(stream::once(future::pending::<Result<i32, DynError>>()))
            .boxed();
        let _ = block_on(stream.next());

        block_on(handle(stream).close(Some(Duration::from_millis(20))));
    }

    #[test]
    fn timer_fires_after_timeout() {
        let (expired, thread) = timer(Duration::from_millis(10));

        block_on(expired);
        thread.join().unwrap();
    }

    #[test]
    fn dropped_timer_stops_its_thread() {
        let started = std::time::Instant::now();
        let (expired, thread) = timer(Duration::from_secs(60));

        drop(expired);
        thread.join().unwrap();

        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn unbounded_deadline_never_fires() {
        let mut expired = deadline(None);

        assert!((&mut expired).now_or_never().is_none());
    }
}
