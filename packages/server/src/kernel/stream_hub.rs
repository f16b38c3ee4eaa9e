//! In-process pub/sub hub for real-time streaming.
//!
//! Topics are typed: one per issue (`issue:{id}`, field changes and new
//! comments) and one per user (`user:{id}`, new notifications only). Read-state
//! changes are never pushed; clients re-query to observe them.
//!
//! # Usage
//!
//! Producers (domain activities):
//!   hub.publish(&Topic::Issue(id), json!({"type": "comment_added", ...})).await;
//!
//! Consumers (SSE endpoints):
//!   let subscription = hub.subscribe(&Topic::User(user_id)).await;
//!   ...
//!   subscription.unsubscribe().await;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use futures::Stream;
use tokio::sync::{broadcast, RwLock};

use crate::common::{CivicError, IssueId, UserId};

/// A live subscription topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Issue(IssueId),
    User(UserId),
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Issue(id) => write!(f, "issue:{}", id),
            Topic::User(id) => write!(f, "user:{}", id),
        }
    }
}

impl FromStr for Topic {
    type Err = CivicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CivicError::Validation(format!("invalid topic: {}", s));
        let (prefix, id) = s.split_once(':').ok_or_else(invalid)?;
        match prefix {
            "issue" => IssueId::parse(id).map(Topic::Issue).map_err(|_| invalid()),
            "user" => UserId::parse(id).map(Topic::User).map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

/// Message received from a subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum HubMessage {
    Event(serde_json::Value),
    /// The subscriber fell behind and `n` events were dropped.
    Lagged(u64),
}

/// Generic in-process pub/sub hub.
///
/// Thread-safe, cloneable. Payloads are `serde_json::Value`; domains serialize
/// their own types and set a `"type"` field naming the event.
#[derive(Clone)]
pub struct StreamHub {
    channels: Arc<RwLock<HashMap<Topic, broadcast::Sender<serde_json::Value>>>>,
    capacity: usize,
}

impl StreamHub {
    /// Create a new StreamHub with default capacity (256 messages per channel).
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Publish to a topic. No-op if nobody is subscribed.
    pub async fn publish(&self, topic: &Topic, value: serde_json::Value) {
        let channels = self.channels.read().await;
        if let Some(tx) = channels.get(topic) {
            // Ignore send errors (no active receivers)
            let _ = tx.send(value);
        }
    }

    /// Subscribe to a topic. Creates the channel if it doesn't exist.
    pub async fn subscribe(&self, topic: &Topic) -> Subscription {
        let mut channels = self.channels.write().await;
        let tx = channels
            .entry(*topic)
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        Subscription {
            topic: *topic,
            receiver: Some(tx.subscribe()),
            hub: self.clone(),
        }
    }

    /// Number of open subscriptions on a topic.
    pub async fn subscriber_count(&self, topic: &Topic) -> usize {
        self.channels
            .read()
            .await
            .get(topic)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Remove channels with zero subscribers (housekeeping).
    pub async fn cleanup(&self) {
        let mut channels = self.channels.write().await;
        channels.retain(|_, tx| tx.receiver_count() > 0);
    }

    fn prune_locked(
        channels: &mut HashMap<Topic, broadcast::Sender<serde_json::Value>>,
        topic: &Topic,
    ) {
        if channels
            .get(topic)
            .is_some_and(|tx| tx.receiver_count() == 0)
        {
            channels.remove(topic);
        }
    }
}

impl Default for StreamHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for one open subscription.
///
/// `unsubscribe` releases it deterministically. Dropping the handle releases
/// the receiver too and prunes the channel when the hub lock is free; anything
/// left behind is collected by `StreamHub::cleanup`.
pub struct Subscription {
    topic: Topic,
    receiver: Option<broadcast::Receiver<serde_json::Value>>,
    hub: StreamHub,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Wait for the next message. `None` once the subscription is closed.
    pub async fn recv(&mut self) -> Option<HubMessage> {
        let receiver = self.receiver.as_mut()?;
        match receiver.recv().await {
            Ok(value) => Some(HubMessage::Event(value)),
            Err(broadcast::error::RecvError::Lagged(n)) => Some(HubMessage::Lagged(n)),
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }

    /// Non-blocking receive, for tests and polling consumers.
    pub fn try_recv(&mut self) -> Option<HubMessage> {
        let receiver = self.receiver.as_mut()?;
        match receiver.try_recv() {
            Ok(value) => Some(HubMessage::Event(value)),
            Err(broadcast::error::TryRecvError::Lagged(n)) => Some(HubMessage::Lagged(n)),
            Err(_) => None,
        }
    }

    /// Release the subscription and drop the topic channel if it was the last one.
    pub async fn unsubscribe(mut self) {
        self.receiver.take();
        let mut channels = self.hub.channels.write().await;
        StreamHub::prune_locked(&mut channels, &self.topic);
    }

    /// Turn the subscription into a stream; the subscription is released when
    /// the stream is dropped.
    pub fn into_stream(self) -> impl Stream<Item = HubMessage> + Send {
        futures::stream::unfold(self, |mut subscription| async move {
            subscription
                .recv()
                .await
                .map(|message| (message, subscription))
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.receiver.take().is_some() {
            if let Ok(mut channels) = self.hub.channels.try_write() {
                StreamHub::prune_locked(&mut channels, &self.topic);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_subscriber_on_same_topic() {
        let hub = StreamHub::new();
        let issue_id = IssueId::new();
        let mut sub = hub.subscribe(&Topic::Issue(issue_id)).await;

        let value = serde_json::json!({"type": "issue_updated"});
        hub.publish(&Topic::Issue(issue_id), value.clone()).await;

        assert_eq!(sub.recv().await, Some(HubMessage::Event(value)));
    }

    #[tokio::test]
    async fn topics_are_isolated() {
        let hub = StreamHub::new();
        let user_a = UserId::new();
        let user_b = UserId::new();
        let mut sub_a = hub.subscribe(&Topic::User(user_a)).await;

        hub.publish(&Topic::User(user_b), serde_json::json!({"type": "x"}))
            .await;

        assert_eq!(sub_a.try_recv(), None);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_noop() {
        let hub = StreamHub::new();
        hub.publish(&Topic::User(UserId::new()), serde_json::json!({}))
            .await;
        assert!(hub.channels.read().await.is_empty());
    }

    #[tokio::test]
    async fn unsubscribe_releases_the_channel() {
        let hub = StreamHub::new();
        let topic = Topic::User(UserId::new());
        let sub = hub.subscribe(&topic).await;
        assert_eq!(hub.subscriber_count(&topic).await, 1);

        sub.unsubscribe().await;

        assert_eq!(hub.subscriber_count(&topic).await, 0);
        assert!(hub.channels.read().await.is_empty());
    }

    #[tokio::test]
    async fn unsubscribe_keeps_channel_for_remaining_subscribers() {
        let hub = StreamHub::new();
        let topic = Topic::Issue(IssueId::new());
        let first = hub.subscribe(&topic).await;
        let mut second = hub.subscribe(&topic).await;

        first.unsubscribe().await;
        hub.publish(&topic, serde_json::json!({"type": "still_here"}))
            .await;

        assert_eq!(hub.subscriber_count(&topic).await, 1);
        assert!(matches!(second.recv().await, Some(HubMessage::Event(_))));
    }

    #[tokio::test]
    async fn dropping_subscription_prunes_channel() {
        let hub = StreamHub::new();
        let topic = Topic::User(UserId::new());
        drop(hub.subscribe(&topic).await);
        assert!(hub.channels.read().await.is_empty());
    }

    #[tokio::test]
    async fn cleanup_collects_channels_left_by_contended_drops() {
        let hub = StreamHub::new();
        let topic = Topic::User(UserId::new());
        let sub = hub.subscribe(&topic).await;

        // Drop while the hub is read-locked, so the drop cannot prune.
        let guard = hub.channels.read().await;
        drop(sub);
        drop(guard);
        assert_eq!(hub.channels.read().await.len(), 1);

        hub.cleanup().await;
        assert!(hub.channels.read().await.is_empty());
    }

    #[tokio::test]
    async fn lagging_subscriber_is_told_how_many_were_missed() {
        let hub = StreamHub::with_capacity(2);
        let topic = Topic::User(UserId::new());
        let mut sub = hub.subscribe(&topic).await;

        for i in 0..4 {
            hub.publish(&topic, serde_json::json!({"n": i})).await;
        }

        assert_eq!(sub.recv().await, Some(HubMessage::Lagged(2)));
    }

    #[test]
    fn topic_string_form_parses_back() {
        let topic = Topic::Issue(IssueId::new());
        assert_eq!(topic.to_string().parse::<Topic>().unwrap(), topic);

        let topic = Topic::User(UserId::new());
        assert_eq!(topic.to_string().parse::<Topic>().unwrap(), topic);
    }

    #[test]
    fn unknown_topic_prefix_is_rejected() {
        assert!("chat:123".parse::<Topic>().is_err());
        assert!("issue:not-a-uuid".parse::<Topic>().is_err());
        assert!("issue".parse::<Topic>().is_err());
    }
}
