//! # ALANN Core
//!
//! Attention and inference-control core for a non-axiomatic reasoner.
//!
//! The reasoner operates under bounded memory and bounded time: every
//! cycle must make forward progress no matter how starved it is. This
//! crate is the control layer that decides, cycle by cycle, which beliefs
//! and tasks get attention, how their importance decays, and which premise
//! pairs reach the rule table:
//!
//! - **Budgets** — `(priority, durability, quality)` triples with
//!   activation merges and decay-on-reinsertion forgetting.
//! - **Bags** — bounded priority containers: a deterministic
//!   [`bag::PriorityMap`] and a probabilistic [`classic_bag::ClassicBag`]
//!   behind one [`bag::Bag`] trait.
//! - **Concepts** — per-term units holding ranked belief tables and
//!   term-link templates, stored with displacement into a subconscious
//!   overflow cache.
//! - **The cycle** — anchor selection, task firing with a novelty gate,
//!   and a bounded premise batch feeding the external rule table.
//!
//! The term parser, truth algebra, rule table, and I/O channels are
//! collaborators behind the traits in [`interfaces`]; the core never
//! implements them.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod bag;
pub mod budget;
pub mod classic_bag;
pub mod concept;
pub mod config;
pub mod context;
pub mod cycle;
pub mod error;
pub mod events;
pub mod interfaces;
pub mod item;
pub mod memory;
pub mod metrics;
pub mod persistence;
pub mod premise;
pub mod rng;
pub mod sentence;
pub mod stamp;
pub mod subconscious;
pub mod term;
pub mod truth;

pub use bag::{Bag, Insertion, PriorityMap};
pub use budget::{ActivationMode, BudgetValue};
pub use classic_bag::ClassicBag;
pub use concept::Concept;
pub use config::ReasonerConfig;
pub use context::DerivationContext;
pub use error::{AlannError, Result};
pub use events::{Event, EventBus, EventKind};
pub use interfaces::{Clock, ConceptBuilder, DefaultConceptBuilder, Deriver, ManualClock, NullDeriver};
pub use item::Item;
pub use memory::Memory;
pub use persistence::SnapshotStore;
pub use premise::Premise;
pub use sentence::{Punctuation, Sentence, Task, TaskSource};
pub use stamp::{BaseEntry, Stamp, Tense, ETERNAL};
pub use subconscious::Subconscious;
pub use term::{unify_query, Connector, Term, VarKind};
pub use truth::TruthValue;
