//! Shared entity capabilities.
//!
//! Every simulation entity (conveyor, worker) carries an [`EntityCore`]:
//! an advisory grid placement plus the list of topics it is subscribed to.
//! This is a composable capability bundle, not a base class -- entities
//! embed it as a field.

use crate::messenger::{Messenger, SubscriberId, Topic};

/// Advisory grid position. Carried by every entity; no algorithm reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
}

impl Placement {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Capability bundle shared by all simulation entities: a placement and the
/// entity's current topic subscriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EntityCore {
    pub placement: Placement,
    observed: Vec<Topic>,
}

impl EntityCore {
    /// Create a core with the given placement and no subscriptions.
    pub fn new(placement: Placement) -> Self {
        Self {
            placement,
            observed: Vec::new(),
        }
    }

    /// Subscribe `me` to each topic in order, recording them for teardown.
    pub fn subscribe_all(
        &mut self,
        messenger: &mut Messenger,
        me: SubscriberId,
        topics: &[Topic],
    ) {
        for &topic in topics {
            messenger.subscribe(topic, me);
            self.observed.push(topic);
        }
    }

    /// Remove every recorded subscription of `me`.
    pub fn unsubscribe_all(&mut self, messenger: &mut Messenger, me: SubscriberId) {
        for topic in self.observed.drain(..) {
            messenger.unsubscribe(topic, me);
        }
    }

    /// Topics this entity is currently subscribed to, in subscription order.
    pub fn observed_topics(&self) -> &[Topic] {
        &self.observed
    }
}
