//! In-flight request coalescing.
//!
//! Callers asking for the same key while a request for that key is still
//! outstanding are handed the outstanding request instead of starting another
//! one. Every waiter receives a clone of the same output, and the key is
//! released as soon as the request completes, so the next call after
//! completion starts a fresh request.
//!
//! There is no timeout and no cancellation: a request that never completes
//! keeps its key registered, and every later caller for that key waits on it.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

type InFlight<V> = Shared<BoxFuture<'static, V>>;

/// Registry of in-flight requests keyed by `K`, each resolving to `V`.
///
/// Cloning a `Coalescer` is cheap and the clones share one registry.
///
/// # Examples
///
/// ```
/// use folio_asyncutils::Coalescer;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let requests: Coalescer<String, u32> = Coalescer::new();
/// let (a, b) = tokio::join!(
///     requests.run("/api/texts/Genesis.1".to_string(), || async {
///         // Still pending when the second caller arrives.
///         tokio::task::yield_now().await;
///         42
///     }),
///     requests.run("/api/texts/Genesis.1".to_string(), || async { 7 }),
/// );
/// // The second caller joined the first request.
/// assert_eq!((a, b), (42, 42));
/// # }
/// ```
pub struct Coalescer<K, V>
where
    K: Eq + Hash,
{
    inflight: Arc<DashMap<K, InFlight<V>>>,
}

impl<K, V> Clone for Coalescer<K, V>
where
    K: Eq + Hash,
{
    fn clone(&self) -> Self {
        Self { inflight: Arc::clone(&self.inflight) }
    }
}

impl<K, V> Default for Coalescer<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Coalescer<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self { inflight: Arc::new(DashMap::new()) }
    }

    /// Await the request registered for `key`, starting it with `start` if
    /// nothing is in flight for that key yet.
    ///
    /// `start` is only called when this caller is the first one for `key`;
    /// otherwise it is dropped unused.
    pub async fn run<F, Fut>(&self, key: K, start: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V> + Send + 'static,
    {
        let shared = match self.inflight.entry(key) {
            Entry::Occupied(entry) => {
                tracing::debug!(key = ?entry.key(), "Joining in-flight request");
                entry.get().clone()
            },
            Entry::Vacant(entry) => {
                let registry = Arc::clone(&self.inflight);
                let key = entry.key().clone();
                let request = start();
                let future = async move {
                    let output = request.await;
                    // Released before any waiter observes the output.
                    registry.remove(&key);
                    output
                }
                .boxed()
                .shared();
                entry.insert(future.clone());
                future
            },
        };
        shared.await
    }

    /// Number of keys with a request currently in flight.
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.inflight.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_request() {
        let requests: Coalescer<String, String> = Coalescer::new();
        let started = Arc::new(AtomicUsize::new(0));
        let (release, gate) = oneshot::channel::<()>();

        let first = {
            let started = Arc::clone(&started);
            requests.run("/api/texts/Genesis.1".to_string(), move || async move {
                started.fetch_add(1, Ordering::SeqCst);
                gate.await.ok();
                "payload".to_string()
            })
        };
        let second = {
            let started = Arc::clone(&started);
            requests.run("/api/texts/Genesis.1".to_string(), move || async move {
                started.fetch_add(1, Ordering::SeqCst);
                "other".to_string()
            })
        };
        let releaser = async move {
            tokio::task::yield_now().await;
            release.send(()).ok();
        };

        let (a, b, ()) = tokio::join!(first, second, releaser);
        assert_eq!(a, "payload");
        assert_eq!(b, "payload");
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(requests.in_flight(), 0);
    }

    #[rstest]
    #[case("/api/links/Genesis.1", "/api/links/Genesis.2")]
    #[case("/api/texts/Genesis.1?context=0", "/api/texts/Genesis.1?context=1")]
    #[tokio::test]
    async fn test_distinct_keys_start_distinct_requests(#[case] left: &str, #[case] right: &str) {
        let requests: Coalescer<String, usize> = Coalescer::new();
        let started = Arc::new(AtomicUsize::new(0));
        let make = |started: Arc<AtomicUsize>| {
            move || async move { started.fetch_add(1, Ordering::SeqCst) }
        };
        let (a, b) = tokio::join!(
            requests.run(left.to_string(), make(Arc::clone(&started))),
            requests.run(right.to_string(), make(Arc::clone(&started))),
        );
        assert_ne!(a, b);
        assert_eq!(started.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_key_released_after_completion() {
        let requests: Coalescer<&'static str, u32> = Coalescer::new();
        let first = requests.run("key", || async { 1 }).await;
        assert!(!requests.is_in_flight(&"key"));
        let second = requests.run("key", || async { 2 }).await;
        assert_eq!((first, second), (1, 2));
    }

    #[tokio::test]
    async fn test_pending_request_stays_registered() {
        let requests: Coalescer<&'static str, u32> = Coalescer::new();
        let (_release, gate) = oneshot::channel::<()>();
        let pending = requests.run("key", move || async move {
            gate.await.ok();
            1
        });
        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(10), pending).await;
        assert!(timed_out.is_err());
        assert!(requests.is_in_flight(&"key"));
    }
}
