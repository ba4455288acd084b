use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};
use tokio::sync::mpsc as tokio_mpsc;
use tracing::debug;

type SubscriptionId = u64;
type Filter<T> = Box<dyn Fn(&T) -> bool + Send>;

struct Subscription<T> {
    filter: Option<Filter<T>>,
    tx: tokio_mpsc::UnboundedSender<T>,
}

type Subscriptions<T> = Arc<Mutex<HashMap<SubscriptionId, Subscription<T>>>>;

/// Fan-out handle for progress events.
///
/// Producers send into one unbounded channel; a background task forwards
/// every event, in order, to each live subscriber.
pub struct ProgressHandle<T> {
    subscriptions: Subscriptions<T>,
    next_id: Arc<AtomicU64>,
}

impl<T> Clone for ProgressHandle<T> {
    fn clone(&self) -> Self {
        Self {
            subscriptions: self.subscriptions.clone(),
            next_id: self.next_id.clone(),
        }
    }
}

fn lock<T>(subscriptions: &Subscriptions<T>) -> MutexGuard<'_, HashMap<SubscriptionId, Subscription<T>>> {
    subscriptions.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> ProgressHandle<T>
where
    T: Clone + Send + 'static,
{
    /// Create a new progress handle and spawn background task to process progress updates
    pub fn new(
        mut progress_rx: tokio_mpsc::UnboundedReceiver<T>,
        runtime_handle: tokio::runtime::Handle,
    ) -> Self {
        let subscriptions: Subscriptions<T> = Arc::new(Mutex::new(HashMap::new()));
        let subscriptions_clone = subscriptions.clone();

        runtime_handle.spawn(async move {
            while let Some(progress) = progress_rx.recv().await {
                let mut subs = lock(&subscriptions_clone);
                let mut to_remove = Vec::new();

                for (id, subscription) in subs.iter() {
                    let wanted = subscription
                        .filter
                        .as_ref()
                        .map_or(true, |filter| filter(&progress));
                    // If send fails, receiver was dropped - mark for removal
                    if wanted && subscription.tx.send(progress.clone()).is_err() {
                        to_remove.push(*id);
                    }
                }

                for id in to_remove {
                    subs.remove(&id);
                }
            }
            // Close every subscriber once the producer is gone
            lock(&subscriptions_clone).clear();
            debug!("Progress channel closed, exiting");
        });

        Self {
            subscriptions,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Subscribe to every progress update.
    /// Subscription is automatically removed when receiver is dropped
    pub fn subscribe_all(&self) -> tokio_mpsc::UnboundedReceiver<T> {
        self.insert(None)
    }

    /// Subscribe to the updates accepted by `filter`
    pub fn subscribe_matching<F>(&self, filter: F) -> tokio_mpsc::UnboundedReceiver<T>
    where
        F: Fn(&T) -> bool + Send + 'static,
    {
        self.insert(Some(Box::new(filter)))
    }

    fn insert(&self, filter: Option<Filter<T>>) -> tokio_mpsc::UnboundedReceiver<T> {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.subscriptions).insert(id, Subscription { filter, tx });
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_reach_all_subscribers_in_order() {
        let (tx, rx) = tokio_mpsc::unbounded_channel::<u32>();
        let handle = ProgressHandle::new(rx, tokio::runtime::Handle::current());

        let mut all = handle.subscribe_all();
        let mut evens = handle.subscribe_matching(|n| n % 2 == 0);

        for n in 1..=4 {
            tx.send(n).unwrap();
        }

        for expected in 1..=4 {
            assert_eq!(all.recv().await, Some(expected));
        }
        assert_eq!(evens.recv().await, Some(2));
        assert_eq!(evens.recv().await, Some(4));
    }

    #[tokio::test]
    async fn test_dropped_subscriber_does_not_block_others() {
        let (tx, rx) = tokio_mpsc::unbounded_channel::<u32>();
        let handle = ProgressHandle::new(rx, tokio::runtime::Handle::current());

        let dropped = handle.subscribe_all();
        let mut kept = handle.subscribe_all();
        drop(dropped);

        tx.send(7).unwrap();
        assert_eq!(kept.recv().await, Some(7));
    }
}
