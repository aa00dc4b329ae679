//! Synchronous publish/subscribe for reasoner lifecycle events.
//!
//! Channels are a closed set of event kinds; payloads ride on the event
//! variants themselves. Observer failures are contained: a panicking
//! observer is logged and the cycle continues. The bus is runtime wiring
//! and is never persisted.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::warn;

use crate::sentence::{Sentence, Task};
use crate::term::Term;

/// The closed set of channels the core publishes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A concept was created.
    ConceptNew,
    /// A concept was recovered from the subconscious cache.
    ConceptRemember,
    /// A concept was displaced out of the store.
    ConceptForget,
    /// A belief entered a concept's table.
    ConceptBeliefAdd,
    /// A belief was pushed out of a concept's table.
    ConceptBeliefRemove,
    /// A task entered the system.
    TaskAdd,
    /// A task left the system.
    TaskRemove,
    /// A cycle began.
    CycleStart,
    /// A cycle finished.
    CycleEnd,
    /// A reset began.
    ResetStart,
    /// A reset finished.
    ResetEnd,
    /// A question was answered by a stored belief.
    Answer,
    /// A task cleared the volume gate for reporting.
    Output,
}

/// An event with its payload.
#[derive(Debug, Clone)]
pub enum Event {
    /// A concept was created for `term`.
    ConceptNew {
        /// The new concept's term.
        term: Term,
    },
    /// `term`'s concept returned from the subconscious cache.
    ConceptRemember {
        /// The remembered concept's term.
        term: Term,
    },
    /// `term`'s concept was displaced from the store.
    ConceptForget {
        /// The forgotten concept's term.
        term: Term,
    },
    /// `belief` entered the table of `concept`.
    ConceptBeliefAdd {
        /// Term of the owning concept.
        concept: Term,
        /// The belief added.
        belief: Sentence,
    },
    /// `belief` was pushed out of the table of `concept`.
    ConceptBeliefRemove {
        /// Term of the owning concept.
        concept: Term,
        /// The belief removed.
        belief: Sentence,
    },
    /// `task` entered the system.
    TaskAdd {
        /// The task.
        task: Task,
        /// Why it was added ("Perceived", "Derived", "Executed", ...).
        reason: String,
    },
    /// `task` left the system.
    TaskRemove {
        /// The task.
        task: Task,
        /// Why it was removed ("Neglected", "Displaced", ...).
        reason: String,
    },
    /// A cycle began at `time`.
    CycleStart {
        /// Cycle timestamp.
        time: i64,
    },
    /// A cycle finished at `time`.
    CycleEnd {
        /// Cycle timestamp.
        time: i64,
    },
    /// A reset began.
    ResetStart,
    /// A reset finished.
    ResetEnd,
    /// `belief` answered `question`.
    Answer {
        /// The question task.
        question: Task,
        /// The answering belief.
        belief: Sentence,
    },
    /// `task` cleared the volume gate.
    Output {
        /// The reported task.
        task: Task,
    },
}

impl Event {
    /// The channel this event publishes on.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ConceptNew { .. } => EventKind::ConceptNew,
            Self::ConceptRemember { .. } => EventKind::ConceptRemember,
            Self::ConceptForget { .. } => EventKind::ConceptForget,
            Self::ConceptBeliefAdd { .. } => EventKind::ConceptBeliefAdd,
            Self::ConceptBeliefRemove { .. } => EventKind::ConceptBeliefRemove,
            Self::TaskAdd { .. } => EventKind::TaskAdd,
            Self::TaskRemove { .. } => EventKind::TaskRemove,
            Self::CycleStart { .. } => EventKind::CycleStart,
            Self::CycleEnd { .. } => EventKind::CycleEnd,
            Self::ResetStart => EventKind::ResetStart,
            Self::ResetEnd => EventKind::ResetEnd,
            Self::Answer { .. } => EventKind::Answer,
            Self::Output { .. } => EventKind::Output,
        }
    }
}

/// An event observer.
pub type Observer = Box<dyn Fn(&Event) + Send>;

/// Channel → observer registry with synchronous, failure-contained emission.
#[derive(Default)]
pub struct EventBus {
    channels: HashMap<EventKind, Vec<Observer>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("channels", &self.channels.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl EventBus {
    /// Create a bus with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer on one channel.
    pub fn subscribe(&mut self, kind: EventKind, observer: impl Fn(&Event) + Send + 'static) {
        self.channels.entry(kind).or_default().push(Box::new(observer));
    }

    /// Whether any observer listens on `kind`.
    #[must_use]
    pub fn is_active(&self, kind: EventKind) -> bool {
        self.channels.get(&kind).is_some_and(|observers| !observers.is_empty())
    }

    /// Deliver an event to every observer of its channel, in registration
    /// order. A panicking observer is logged and skipped; emission never
    /// fails into the caller.
    pub fn emit(&self, event: &Event) {
        let Some(observers) = self.channels.get(&event.kind()) else {
            return;
        };
        for observer in observers {
            if catch_unwind(AssertUnwindSafe(|| observer(event))).is_err() {
                warn!(kind = ?event.kind(), "event observer panicked; continuing");
            }
        }
    }
}
