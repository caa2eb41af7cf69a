//! Ordered pub/sub registry for the simulation's control protocol.
//!
//! The protocol is small and fixed: a global `step` broadcast that advances
//! every entity, a targeted per-worker channel used for `pull-request`
//! hand-offs, and a reserved `arbitrate` channel that nothing publishes yet.
//!
//! The messenger tracks *who* listens on each topic and in what order;
//! delivery itself is executed by [`crate::simulation::Simulation`], which
//! owns the entities. Delivery is synchronous, in subscription order, and
//! fire-and-forget: publishing to a topic with no subscribers is a valid
//! no-op, never an error.
//!
//! Subscribing the same entity to the same topic twice registers it twice
//! (and it will be delivered to twice); unsubscribing removes the first
//! matching entry only.

use crate::assembly::Assembly;
use crate::id::WorkerId;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Topics and subscribers
// ---------------------------------------------------------------------------

/// An addressable message channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Topic {
    /// Global broadcast advancing the whole simulation by one tick.
    Step,
    /// Targeted channel for a single worker.
    Worker(WorkerId),
    /// Reserved for future contention resolution between workers.
    /// Registered in the protocol but never published.
    Arbitrate,
}

/// A party that can subscribe to topics and receive envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SubscriberId {
    Conveyor,
    Worker(WorkerId),
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// The command tag carried by an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Command {
    /// Advance one simulation tick.
    Step,
    /// Offer the enclosed assembly to the receiver.
    PullRequest,
}

/// The payload carried alongside a command.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Payload {
    /// No payload (`step` broadcasts).
    Empty,
    /// An assembly changing hands. Exactly one receiver may take it.
    Assembly(Assembly),
}

/// A tagged message delivered to subscribers: `{cmd, content}`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Envelope {
    pub cmd: Command,
    pub content: Payload,
}

impl Envelope {
    /// A bare `step` envelope.
    pub fn step() -> Self {
        Self {
            cmd: Command::Step,
            content: Payload::Empty,
        }
    }

    /// A `pull-request` envelope offering an assembly.
    pub fn pull_request(assembly: Assembly) -> Self {
        Self {
            cmd: Command::PullRequest,
            content: Payload::Assembly(assembly),
        }
    }
}

// ---------------------------------------------------------------------------
// Messenger
// ---------------------------------------------------------------------------

/// Subscription registry mapping topics to ordered subscriber lists.
///
/// Created once per simulation run and torn down with it; there is no
/// global state.
#[derive(Debug, Default)]
pub struct Messenger {
    subscriptions: HashMap<Topic, Vec<SubscriberId>>,
}

impl Messenger {
    /// Create an empty messenger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber on a topic. Appends to the end of the topic's
    /// delivery order; duplicate registrations are kept.
    pub fn subscribe(&mut self, topic: Topic, subscriber: SubscriberId) {
        self.subscriptions.entry(topic).or_default().push(subscriber);
    }

    /// Remove the first matching registration of `subscriber` on `topic`.
    /// Returns whether anything was removed.
    pub fn unsubscribe(&mut self, topic: Topic, subscriber: SubscriberId) -> bool {
        let Some(subscribers) = self.subscriptions.get_mut(&topic) else {
            return false;
        };
        match subscribers.iter().position(|s| *s == subscriber) {
            Some(index) => {
                subscribers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Current subscribers of a topic, in subscription order. Empty when the
    /// topic has no subscribers.
    pub fn subscribers(&self, topic: Topic) -> &[SubscriberId] {
        self.subscriptions
            .get(&topic)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of registrations on a topic (duplicates counted).
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.subscribers(topic).len()
    }

    /// Whether `subscriber` has at least one registration on `topic`.
    pub fn is_subscribed(&self, topic: Topic, subscriber: SubscriberId) -> bool {
        self.subscribers(topic).contains(&subscriber)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::IconId;
    use slotmap::SlotMap;

    fn make_worker_id() -> WorkerId {
        let mut sm = SlotMap::<WorkerId, ()>::with_key();
        sm.insert(())
    }

    #[test]
    fn subscribe_preserves_order() {
        let mut messenger = Messenger::new();
        let a = make_worker_id();

        messenger.subscribe(Topic::Step, SubscriberId::Conveyor);
        messenger.subscribe(Topic::Step, SubscriberId::Worker(a));

        assert_eq!(
            messenger.subscribers(Topic::Step),
            &[SubscriberId::Conveyor, SubscriberId::Worker(a)]
        );
    }

    #[test]
    fn duplicate_subscription_is_kept() {
        let mut messenger = Messenger::new();
        let a = make_worker_id();

        messenger.subscribe(Topic::Step, SubscriberId::Worker(a));
        messenger.subscribe(Topic::Step, SubscriberId::Worker(a));

        assert_eq!(messenger.subscriber_count(Topic::Step), 2);
    }

    #[test]
    fn unsubscribe_removes_first_match_only() {
        let mut messenger = Messenger::new();
        let a = make_worker_id();

        messenger.subscribe(Topic::Step, SubscriberId::Worker(a));
        messenger.subscribe(Topic::Step, SubscriberId::Conveyor);
        messenger.subscribe(Topic::Step, SubscriberId::Worker(a));

        assert!(messenger.unsubscribe(Topic::Step, SubscriberId::Worker(a)));
        assert_eq!(
            messenger.subscribers(Topic::Step),
            &[SubscriberId::Conveyor, SubscriberId::Worker(a)]
        );
    }

    #[test]
    fn unsubscribe_unknown_is_noop() {
        let mut messenger = Messenger::new();
        assert!(!messenger.unsubscribe(Topic::Step, SubscriberId::Conveyor));

        messenger.subscribe(Topic::Arbitrate, SubscriberId::Conveyor);
        assert!(!messenger.unsubscribe(Topic::Arbitrate, SubscriberId::Worker(make_worker_id())));
        assert_eq!(messenger.subscriber_count(Topic::Arbitrate), 1);
    }

    #[test]
    fn empty_topic_has_no_subscribers() {
        let messenger = Messenger::new();
        assert!(messenger.subscribers(Topic::Step).is_empty());
        assert_eq!(messenger.subscriber_count(Topic::Step), 0);
    }

    #[test]
    fn worker_topics_are_distinct() {
        let mut messenger = Messenger::new();
        let a = make_worker_id();
        let mut sm = SlotMap::<WorkerId, ()>::with_key();
        sm.insert(());
        let b = sm.insert(());

        messenger.subscribe(Topic::Worker(a), SubscriberId::Worker(a));

        assert!(messenger.is_subscribed(Topic::Worker(a), SubscriberId::Worker(a)));
        assert!(!messenger.is_subscribed(Topic::Worker(b), SubscriberId::Worker(a)));
    }

    #[test]
    fn envelope_constructors() {
        let step = Envelope::step();
        assert_eq!(step.cmd, Command::Step);
        assert_eq!(step.content, Payload::Empty);

        let offer = Envelope::pull_request(Assembly::new(IconId(3)));
        assert_eq!(offer.cmd, Command::PullRequest);
        match offer.content {
            Payload::Assembly(a) => assert_eq!(a.icon, IconId(3)),
            Payload::Empty => panic!("expected assembly payload"),
        }
    }
}
