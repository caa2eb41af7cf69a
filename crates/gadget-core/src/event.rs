//! Typed observation events for display and analytics.
//!
//! Events are emitted while a tick executes and delivered in a batch at the
//! end of the tick, oldest first. Listeners are passive: they observe the
//! stream but cannot mutate the simulation. This is the hook where a
//! front-end renders belt movement, hand-offs, and the parts-bin tally.

use crate::id::{IconId, Ticks, WorkerId};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A simulation observation event. All events carry the tick at which they
/// occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    /// A component spawned into the front belt cell.
    AssemblySpawned { icon: IconId, tick: Ticks },
    /// The last belt cell's contents dropped into the parts bin.
    AssemblyBinned { icon: IconId, tick: Ticks },
    /// A worker accepted a component off the belt.
    PullAccepted {
        worker: WorkerId,
        icon: IconId,
        tick: Ticks,
    },
    /// A worker collected its final component and began making.
    MakingStarted { worker: WorkerId, tick: Ticks },
    /// A worker finished a product.
    ProductFinished {
        worker: WorkerId,
        icon: IconId,
        tick: Ticks,
    },
    /// A finished product was placed onto an empty belt cell.
    ProductPlaced {
        worker: WorkerId,
        icon: IconId,
        tick: Ticks,
    },
    /// The parts-bin tally changed.
    TallyChanged {
        counts: BTreeMap<IconId, u32>,
        tick: Ticks,
    },
}

/// Discriminant tag for event types, used for counters and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimEventKind {
    AssemblySpawned,
    AssemblyBinned,
    PullAccepted,
    MakingStarted,
    ProductFinished,
    ProductPlaced,
    TallyChanged,
}

/// Total number of event kinds.
const EVENT_KIND_COUNT: usize = 7;

impl SimEvent {
    /// Get the discriminant kind for this event.
    pub fn kind(&self) -> SimEventKind {
        match self {
            SimEvent::AssemblySpawned { .. } => SimEventKind::AssemblySpawned,
            SimEvent::AssemblyBinned { .. } => SimEventKind::AssemblyBinned,
            SimEvent::PullAccepted { .. } => SimEventKind::PullAccepted,
            SimEvent::MakingStarted { .. } => SimEventKind::MakingStarted,
            SimEvent::ProductFinished { .. } => SimEventKind::ProductFinished,
            SimEvent::ProductPlaced { .. } => SimEventKind::ProductPlaced,
            SimEvent::TallyChanged { .. } => SimEventKind::TallyChanged,
        }
    }
}

impl SimEventKind {
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventSink
// ---------------------------------------------------------------------------

/// A passive listener receives events read-only.
pub type PassiveListener = Box<dyn FnMut(&SimEvent)>;

/// Collects events during a tick and delivers them to passive listeners at
/// the end of it. Keeps a running total per event kind.
pub struct EventSink {
    buffer: Vec<SimEvent>,
    listeners: Vec<PassiveListener>,
    totals: [u64; EVENT_KIND_COUNT],
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("buffer", &self.buffer)
            .field("listeners", &self.listeners.len())
            .field("totals", &self.totals)
            .finish()
    }
}

impl EventSink {
    /// Create a sink with no listeners.
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            listeners: Vec::new(),
            totals: [0; EVENT_KIND_COUNT],
        }
    }

    /// Register a passive listener. Listeners are called in registration
    /// order during delivery.
    pub fn on_passive(&mut self, listener: PassiveListener) {
        self.listeners.push(listener);
    }

    /// Record an event for delivery at the end of the current tick.
    pub fn emit(&mut self, event: SimEvent) {
        self.totals[event.kind().index()] += 1;
        self.buffer.push(event);
    }

    /// Deliver all buffered events, oldest first, to every listener, then
    /// clear the buffer.
    pub fn deliver(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        for listener in &mut self.listeners {
            for event in &self.buffer {
                listener(event);
            }
        }
        self.buffer.clear();
    }

    /// Events currently buffered (emitted this tick, not yet delivered).
    pub fn buffered(&self) -> &[SimEvent] {
        &self.buffer
    }

    /// Total events ever emitted for a kind.
    pub fn total_emitted(&self, kind: SimEventKind) -> u64 {
        self.totals[kind.index()]
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
