//! Per-key coalescing of concurrent executions.

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Weak};

type InFlight<K, T> = Mutex<HashMap<K, Shared<BoxFuture<'static, T>>>>;

/// Joins concurrent requests for the same key onto a single execution.
///
/// The first caller for a key becomes the leader: its factory is invoked and
/// the resulting future is registered. Callers arriving while it is pending
/// await the same future and receive a clone of its output, success or
/// failure. The entry removes itself as the future settles, so the next call
/// for the key starts a fresh execution.
///
/// Executions are driven on their own tokio task. A caller that stops
/// waiting does not cancel the execution for anyone else, and an execution
/// every caller abandoned still settles and deregisters. Must be called
/// from within a tokio runtime.
///
/// # Example
///
/// ```
/// use mediagate_cache::RequestCoalescer;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let coalescer: RequestCoalescer<&str, u32> = RequestCoalescer::new();
/// let (a, b) = tokio::join!(
///     coalescer.run("key", || async {
///         tokio::task::yield_now().await;
///         7
///     }),
///     coalescer.run("key", || async { 8 }),
/// );
/// assert_eq!((a, b), (7, 7));
/// assert_eq!(coalescer.in_flight(), 0);
/// # }
/// ```
pub struct RequestCoalescer<K, T: Clone> {
    in_flight: Arc<InFlight<K, T>>,
}

impl<K, T> RequestCoalescer<K, T>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Create a coalescer with nothing in flight.
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `factory` for `key`, or join the execution already in flight.
    ///
    /// `factory` is only called by the leader and must not call back into
    /// this coalescer.
    pub async fn run<F, Fut>(&self, key: K, factory: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (execution, led) = {
            let mut in_flight = self.in_flight.lock();
            match in_flight.get(&key) {
                Some(execution) => {
                    tracing::debug!(?key, "coalesce wait: joining in-flight execution");
                    (execution.clone(), false)
                }
                None => {
                    let execution = settle_then_deregister(
                        factory(),
                        Arc::downgrade(&self.in_flight),
                        key.clone(),
                    );
                    in_flight.insert(key.clone(), execution.clone());
                    tracing::debug!(
                        ?key,
                        in_flight = in_flight.len(),
                        "coalesce lead: started execution"
                    );
                    (execution, true)
                }
            }
        };
        if led {
            // Detached; the output is dropped once the driver finishes.
            tokio::spawn(execution.clone().map(drop));
        }
        execution.await
    }

    /// Number of keys with an execution in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }
}

fn settle_then_deregister<K, T, Fut>(
    future: Fut,
    registry: Weak<InFlight<K, T>>,
    key: K,
) -> Shared<BoxFuture<'static, T>>
where
    K: Eq + Hash + fmt::Debug + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    async move {
        let output = future.await;
        if let Some(registry) = registry.upgrade() {
            registry.lock().remove(&key);
            tracing::debug!(?key, "coalesce complete: execution settled");
        }
        output
    }
    .boxed()
    .shared()
}

impl<K, T> Default for RequestCoalescer<K, T>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T: Clone> Clone for RequestCoalescer<K, T> {
    fn clone(&self) -> Self {
        Self {
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<K, T: Clone> fmt::Debug for RequestCoalescer<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestCoalescer")
            .field("in_flight", &self.in_flight.lock().len())
            .finish()
    }
}
