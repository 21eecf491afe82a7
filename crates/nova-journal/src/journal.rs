//! Navigation journal for tracing every lifecycle edge and navigation step.
//!
//! The [`NavigationJournal`] records what happened to each controller, in the
//! order it happened: lifecycle transitions, pushes, pops, presentations,
//! fades, and the disappear notification that precedes teardown. Every entry
//! ([`NavigationEvent`]) carries the frame it happened on and a global
//! sequence number, so ordering guarantees such as
//! "disappear -> hide finished -> destroyed" can be checked after the fact.
//!
//! The journal is populated by the window as it works. A journal built with
//! [`NavigationJournal::bounded`] keeps only its most recent events and
//! evicts the oldest one on overflow; sequence numbers are never reused, so
//! ordering checks stay valid across evictions. Call
//! [`NavigationJournal::clear`] to drop history outright.
//!
//! # Example
//!
//! ```
//! use nova_core::prelude::*;
//! use nova_journal::journal::{NavigationEventKind, NavigationJournal};
//!
//! let mut journal = NavigationJournal::new();
//! let id = ControllerId::new(0, 0);
//!
//! journal.record(0, id, NavigationEventKind::Lifecycle {
//!     from: LifecycleState::Created,
//!     to: LifecycleState::WillLoad,
//! });
//! journal.record(1, id, NavigationEventKind::Presented);
//!
//! assert_eq!(journal.len(), 2);
//! assert_eq!(journal.events_for_controller(id).count(), 2);
//! assert_eq!(journal.lifecycle_of(id), vec![LifecycleState::WillLoad]);
//! ```

use nova_core::controller::ControllerId;
use nova_core::lifecycle::LifecycleState;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// NavigationEventKind
// ---------------------------------------------------------------------------

/// What happened to a controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NavigationEventKind {
    /// A lifecycle edge was taken.
    Lifecycle {
        from: LifecycleState,
        to: LifecycleState,
    },
    /// The controller was created from the named template.
    Instantiated { template: String },
    /// Presented as a top-level controller of the window.
    Presented,
    /// Dismissal from the window started.
    Dismissed,
    /// Pushed onto `navigation`; `depth` is the stack depth afterwards.
    Pushed {
        navigation: ControllerId,
        depth: usize,
    },
    /// Popped off `navigation`; `depth` is the stack depth afterwards.
    Popped {
        navigation: ControllerId,
        depth: usize,
    },
    /// The disappear hook ran.
    WillDisappear,
    /// A fade began.
    FadeStarted { from: f32, to: f32, duration: f32 },
    /// A fade reached its target.
    FadeFinished { opacity: f32 },
}

impl NavigationEventKind {
    /// Short, stable name of the variant, for filtering.
    pub fn name(&self) -> &'static str {
        match self {
            NavigationEventKind::Lifecycle { .. } => "lifecycle",
            NavigationEventKind::Instantiated { .. } => "instantiated",
            NavigationEventKind::Presented => "presented",
            NavigationEventKind::Dismissed => "dismissed",
            NavigationEventKind::Pushed { .. } => "pushed",
            NavigationEventKind::Popped { .. } => "popped",
            NavigationEventKind::WillDisappear => "will_disappear",
            NavigationEventKind::FadeStarted { .. } => "fade_started",
            NavigationEventKind::FadeFinished { .. } => "fade_finished",
        }
    }
}

// ---------------------------------------------------------------------------
// NavigationEvent
// ---------------------------------------------------------------------------

/// A single journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationEvent {
    /// The controller the event is about.
    pub controller: ControllerId,
    /// What happened.
    pub kind: NavigationEventKind,
    /// Frame number at the time of the event.
    pub frame: u64,
    /// Position in the journal's total order.
    pub sequence: u64,
}

// ---------------------------------------------------------------------------
// NavigationJournal
// ---------------------------------------------------------------------------

/// Ordered record of [`NavigationEvent`]s with query helpers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavigationJournal {
    events: VecDeque<NavigationEvent>,
    next_sequence: u64,
    /// Maximum number of retained events; `None` keeps everything.
    capacity: Option<usize>,
    evicted: u64,
}

impl NavigationJournal {
    /// Create a new, empty, unbounded journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a journal that retains at most `capacity` events.
    ///
    /// A capacity of zero records nothing but still hands out sequence
    /// numbers.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Number of events dropped to stay within capacity.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Append an event and return its sequence number.
    pub fn record(&mut self, frame: u64, controller: ControllerId, kind: NavigationEventKind) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.events.push_back(NavigationEvent {
            controller,
            kind,
            frame,
            sequence,
        });
        if let Some(capacity) = self.capacity {
            while self.events.len() > capacity {
                self.events.pop_front();
                self.evicted += 1;
            }
        }
        sequence
    }

    /// Drop all recorded events. Sequence numbers keep increasing.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All retained events in recording order.
    pub fn all_events(&self) -> impl Iterator<Item = &NavigationEvent> {
        self.events.iter()
    }

    /// Events about one controller.
    pub fn events_for_controller(
        &self,
        controller: ControllerId,
    ) -> impl Iterator<Item = &NavigationEvent> {
        self.events
            .iter()
            .filter(move |e| e.controller == controller)
    }

    /// Events whose kind has the given [`NavigationEventKind::name`].
    pub fn events_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a NavigationEvent> {
        self.events.iter().filter(move |e| e.kind.name() == name)
    }

    /// The lifecycle states a controller has entered, in order.
    pub fn lifecycle_of(&self, controller: ControllerId) -> Vec<LifecycleState> {
        self.events_for_controller(controller)
            .filter_map(|e| match e.kind {
                NavigationEventKind::Lifecycle { to, .. } => Some(to),
                _ => None,
            })
            .collect()
    }

    /// Sequence number of the first event about `controller` matching
    /// `predicate`.
    pub fn first_sequence(
        &self,
        controller: ControllerId,
        predicate: impl Fn(&NavigationEventKind) -> bool,
    ) -> Option<u64> {
        self.events_for_controller(controller)
            .find(|e| predicate(&e.kind))
            .map(|e| e.sequence)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(slot: u32) -> ControllerId {
        ControllerId::new(slot, 0)
    }

    fn lifecycle(from: LifecycleState, to: LifecycleState) -> NavigationEventKind {
        NavigationEventKind::Lifecycle { from, to }
    }

    #[test]
    fn empty_journal() {
        let journal = NavigationJournal::new();
        assert!(journal.is_empty());
        assert_eq!(journal.events_for_controller(controller(0)).count(), 0);
        assert!(journal.lifecycle_of(controller(0)).is_empty());
    }

    #[test]
    fn sequences_are_monotonic_across_clear() {
        let mut journal = NavigationJournal::new();
        assert_eq!(journal.record(0, controller(0), NavigationEventKind::Presented), 0);
        assert_eq!(journal.record(0, controller(0), NavigationEventKind::Dismissed), 1);
        journal.clear();
        assert!(journal.is_empty());
        assert_eq!(journal.record(3, controller(1), NavigationEventKind::Presented), 2);
    }

    #[test]
    fn filter_by_controller_and_name() {
        let mut journal = NavigationJournal::new();
        let nav = controller(0);
        let child = controller(1);
        journal.record(0, nav, NavigationEventKind::Presented);
        journal.record(
            1,
            child,
            NavigationEventKind::Pushed {
                navigation: nav,
                depth: 1,
            },
        );
        journal.record(
            1,
            child,
            NavigationEventKind::FadeStarted {
                from: 0.0,
                to: 1.0,
                duration: 0.2,
            },
        );

        assert_eq!(journal.events_for_controller(child).count(), 2);
        assert_eq!(journal.events_named("pushed").count(), 1);
        assert_eq!(journal.events_named("presented").next().unwrap().controller, nav);
    }

    #[test]
    fn lifecycle_of_lists_entered_states() {
        let mut journal = NavigationJournal::new();
        let id = controller(2);
        journal.record(0, id, lifecycle(LifecycleState::Created, LifecycleState::WillLoad));
        journal.record(0, id, NavigationEventKind::Presented);
        journal.record(1, id, lifecycle(LifecycleState::WillLoad, LifecycleState::DidLoad));
        journal.record(1, id, lifecycle(LifecycleState::DidLoad, LifecycleState::Enabled));

        assert_eq!(
            journal.lifecycle_of(id),
            vec![
                LifecycleState::WillLoad,
                LifecycleState::DidLoad,
                LifecycleState::Enabled
            ]
        );
    }

    #[test]
    fn first_sequence_orders_teardown() {
        let mut journal = NavigationJournal::new();
        let id = controller(5);
        journal.record(4, id, NavigationEventKind::WillDisappear);
        journal.record(9, id, NavigationEventKind::FadeFinished { opacity: 0.0 });
        journal.record(9, id, lifecycle(LifecycleState::WillUnload, LifecycleState::Destroyed));

        let disappear = journal
            .first_sequence(id, |k| matches!(k, NavigationEventKind::WillDisappear))
            .unwrap();
        let faded = journal
            .first_sequence(id, |k| matches!(k, NavigationEventKind::FadeFinished { .. }))
            .unwrap();
        let destroyed = journal
            .first_sequence(id, |k| {
                matches!(k, NavigationEventKind::Lifecycle { to: LifecycleState::Destroyed, .. })
            })
            .unwrap();
        assert!(disappear < faded && faded < destroyed);
    }

    #[test]
    fn bounded_journal_evicts_oldest_events() {
        let mut journal = NavigationJournal::bounded(3);
        let id = controller(0);
        for frame in 0..10 {
            journal.record(frame, id, NavigationEventKind::WillDisappear);
        }
        assert_eq!(journal.len(), 3);
        assert_eq!(journal.evicted(), 7);
        let sequences: Vec<u64> = journal.all_events().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![7, 8, 9]);
        assert_eq!(journal.first_sequence(id, |_| true), Some(7));
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut journal = NavigationJournal::bounded(0);
        assert_eq!(journal.record(0, controller(0), NavigationEventKind::Presented), 0);
        assert_eq!(journal.record(0, controller(0), NavigationEventKind::Dismissed), 1);
        assert!(journal.is_empty());
        assert_eq!(journal.evicted(), 2);
    }

    #[test]
    fn journal_serializes_to_json() {
        let mut journal = NavigationJournal::new();
        journal.record(0, controller(0), NavigationEventKind::WillDisappear);
        let json = serde_json::to_string(&journal).unwrap();
        assert!(json.contains("WillDisappear"));
    }
}
