//! Topic based fan-out of events to live listeners.
//!
//! Every listener owns an unbounded queue, so publishing never waits on a listener: a slow
//! or stalled listener only grows its own queue. Payloads are delivered to every listener
//! registered on the topic when [`EventBroker::publish`] is called, in publish order.

use std::{
    collections::HashMap,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    task::{Context, Poll},
};

use futures_util::Stream;
use tokio::sync::mpsc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Identifies one listener on one topic. Can be used to unsubscribe from anywhere.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    topic: String,
    id: ListenerId,
}

impl ListenerHandle {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }
}

struct Topics<T> {
    next_id: u64,
    listeners: HashMap<String, Vec<(ListenerId, mpsc::UnboundedSender<T>)>>,
}

impl<T> Topics<T> {
    fn remove(&mut self, handle: &ListenerHandle) -> bool {
        let Some(listeners) = self.listeners.get_mut(&handle.topic) else {
            return false;
        };

        let before = listeners.len();
        listeners.retain(|(id, _)| *id != handle.id);
        let removed = listeners.len() != before;

        if listeners.is_empty() {
            self.listeners.remove(&handle.topic);
        }

        removed
    }
}

fn lock<T>(topics: &Mutex<Topics<T>>) -> MutexGuard<'_, Topics<T>> {
    topics.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The registry of topics and their listeners. Cheap to clone, clones share listeners.
pub struct EventBroker<T = serde_json::Value> {
    topics: Arc<Mutex<Topics<T>>>,
}

impl<T> Clone for EventBroker<T> {
    fn clone(&self) -> Self {
        Self {
            topics: Arc::clone(&self.topics),
        }
    }
}

impl<T> Default for EventBroker<T> {
    fn default() -> Self {
        Self {
            topics: Arc::new(Mutex::new(Topics {
                next_id: 0,
                listeners: HashMap::new(),
            })),
        }
    }
}

impl<T> std::fmt::Debug for EventBroker<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let topics = lock(&self.topics);
        f.debug_struct("EventBroker")
            .field("topics", &topics.listeners.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T: Clone + Send + 'static> EventBroker<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new listener on `topic`.
    ///
    /// The listener only sees payloads published after this call.
    pub fn subscribe(&self, topic: impl Into<String>) -> Listener<T> {
        let topic = topic.into();
        let (sender, receiver) = mpsc::unbounded_channel();

        let mut topics = lock(&self.topics);
        let id = ListenerId(topics.next_id);
        topics.next_id += 1;
        topics.listeners.entry(topic.clone()).or_default().push((id, sender));

        tracing::debug!(topic, listener = id.0, "listener subscribed");

        Listener {
            handle: ListenerHandle { topic, id },
            receiver,
            topics: Arc::downgrade(&self.topics),
        }
    }

    /// Delivers `payload` to every listener currently registered on `topic` and returns how
    /// many listeners it was handed to. Publishing to a topic nobody listens to is a no-op.
    pub fn publish(&self, topic: &str, payload: T) -> usize {
        let mut topics = lock(&self.topics);
        let Some(listeners) = topics.listeners.get_mut(topic) else {
            tracing::debug!(topic, "published event without listeners");
            return 0;
        };

        // Listeners whose receiving end is gone are pruned on the way.
        listeners.retain(|(_, sender)| sender.send(payload.clone()).is_ok());
        let delivered = listeners.len();

        if listeners.is_empty() {
            topics.listeners.remove(topic);
        }

        tracing::debug!(topic, delivered, "published event");

        delivered
    }

    /// Releases a listener. The listener still yields what was published before this call and
    /// then ends. Returns `false` when the handle was already released.
    pub fn unsubscribe(&self, handle: &ListenerHandle) -> bool {
        let removed = lock(&self.topics).remove(handle);

        if removed {
            tracing::debug!(topic = handle.topic, listener = handle.id.0, "listener unsubscribed");
        }

        removed
    }

    pub fn listener_count(&self, topic: &str) -> usize {
        lock(&self.topics).listeners.get(topic).map(Vec::len).unwrap_or_default()
    }

    /// Releases every listener on every topic. Listeners drain their pending payloads and end.
    pub fn close_all(&self) {
        let mut topics = lock(&self.topics);
        let count = topics.listeners.values().map(Vec::len).sum::<usize>();
        topics.listeners.clear();

        tracing::debug!(listeners = count, "closed all listeners");
    }
}

/// The receiving end of a subscription: an unbounded stream of payloads, in publish order.
///
/// The stream ends once the listener has been released, either through
/// [`EventBroker::unsubscribe`], [`Listener::close`] or [`EventBroker::close_all`].
/// Dropping the listener releases it.
pub struct Listener<T> {
    handle: ListenerHandle,
    receiver: mpsc::UnboundedReceiver<T>,
    topics: Weak<Mutex<Topics<T>>>,
}

impl<T> Listener<T> {
    pub fn handle(&self) -> &ListenerHandle {
        &self.handle
    }

    /// Releases this listener. Safe to call at any time, any number of times.
    pub fn close(&mut self) {
        if let Some(topics) = self.topics.upgrade() {
            lock(&topics).remove(&self.handle);
        }
        self.receiver.close();
    }
}

impl<T> Stream for Listener<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

impl<T> Drop for Listener<T> {
    fn drop(&mut self) {
        if let Some(topics) = self.topics.upgrade() {
            lock(&topics).remove(&self.handle);
        }
    }
}

impl<T> std::fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener").field("handle", &self.handle).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_util::StreamExt;

    use super::*;

    #[tokio::test]
    async fn every_listener_receives_every_payload_in_order() {
        let broker = EventBroker::<u32>::new();
        let listeners = (0..3).map(|_| broker.subscribe("CAR_INSERTED")).collect::<Vec<_>>();

        for payload in 0..5 {
            assert_eq!(broker.publish("CAR_INSERTED", payload), 3);
        }
        broker.close_all();

        for listener in listeners {
            assert_eq!(listener.collect::<Vec<_>>().await, [0, 1, 2, 3, 4]);
        }
    }

    #[tokio::test]
    async fn late_listeners_miss_earlier_payloads() {
        let broker = EventBroker::<u32>::new();
        let early = broker.subscribe("topic");

        broker.publish("topic", 1);
        broker.publish("topic", 2);
        let late = broker.subscribe("topic");
        broker.publish("topic", 3);
        broker.close_all();

        assert_eq!(early.collect::<Vec<_>>().await, [1, 2, 3]);
        assert_eq!(late.collect::<Vec<_>>().await, [3]);
    }

    #[tokio::test]
    async fn publishing_without_listeners_is_a_no_op() {
        let broker = EventBroker::<u32>::new();
        assert_eq!(broker.publish("nobody", 1), 0);
        assert_eq!(broker.listener_count("nobody"), 0);
    }

    #[tokio::test]
    async fn topics_are_independent() {
        let broker = EventBroker::<&'static str>::new();
        let cars = broker.subscribe("cars");
        let parts = broker.subscribe("parts");

        broker.publish("cars", "car");
        broker.publish("parts", "part");
        broker.close_all();

        assert_eq!(cars.collect::<Vec<_>>().await, ["car"]);
        assert_eq!(parts.collect::<Vec<_>>().await, ["part"]);
    }

    #[tokio::test]
    async fn unsubscribe_only_affects_that_listener() {
        let broker = EventBroker::<u32>::new();
        let first = broker.subscribe("topic");
        let second = broker.subscribe("topic");

        broker.publish("topic", 1);
        assert!(broker.unsubscribe(first.handle()));
        assert!(!broker.unsubscribe(first.handle()));
        assert_eq!(broker.publish("topic", 2), 1);
        broker.close_all();

        assert_eq!(first.collect::<Vec<_>>().await, [1]);
        assert_eq!(second.collect::<Vec<_>>().await, [1, 2]);
    }

    #[tokio::test]
    async fn dropping_a_listener_releases_it() {
        let broker = EventBroker::<u32>::new();
        let listener = broker.subscribe("topic");
        let other = broker.subscribe("topic");
        assert_eq!(broker.listener_count("topic"), 2);

        drop(listener);
        assert_eq!(broker.listener_count("topic"), 1);

        drop(other);
        assert_eq!(broker.listener_count("topic"), 0);
        assert_eq!(broker.publish("topic", 1), 0);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let broker = EventBroker::<u32>::new();
        let mut listener = broker.subscribe("topic");

        listener.close();
        listener.close();
        broker.publish("topic", 1);

        assert_eq!(listener.next().await, None);
    }

    #[tokio::test]
    async fn a_stalled_listener_does_not_hold_back_the_others() {
        let broker = EventBroker::<u32>::new();
        let _stalled = broker.subscribe("topic");
        let reader = broker.subscribe("topic");

        let publisher = {
            let broker = broker.clone();
            tokio::spawn(async move {
                for payload in 0..10_000 {
                    broker.publish("topic", payload);
                }
            })
        };

        tokio::time::timeout(Duration::from_secs(5), publisher)
            .await
            .expect("publisher was blocked")
            .unwrap();

        let received = reader.take(10_000).collect::<Vec<_>>().await;
        assert_eq!(received, (0..10_000).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn closing_while_publishing_is_safe() {
        let broker = EventBroker::<u32>::new();
        let mut listener = broker.subscribe("topic");
        let witness = broker.subscribe("topic");

        let publisher = {
            let broker = broker.clone();
            tokio::spawn(async move {
                for payload in 0..1_000 {
                    broker.publish("topic", payload);
                    tokio::task::yield_now().await;
                }
            })
        };

        tokio::task::yield_now().await;
        listener.close();
        publisher.await.unwrap();
        broker.close_all();

        let received = listener.collect::<Vec<_>>().await;
        assert!(received.len() <= 1_000);
        assert!(received.iter().zip(0..).all(|(payload, expected)| *payload == expected));
        assert_eq!(witness.collect::<Vec<_>>().await.len(), 1_000);
    }
}
