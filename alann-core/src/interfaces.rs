//! Collaborator interfaces the core requires but does not implement.
//!
//! The control layer decides *what* to attend to; these traits are the
//! seams where the rest of a reasoner plugs in: concept construction, the
//! rule table, answer delivery, decision execution, and the clock.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::budget::BudgetValue;
use crate::concept::Concept;
use crate::config::ReasonerConfig;
use crate::context::DerivationContext;
use crate::error::Result;
use crate::memory::Memory;
use crate::premise::Premise;
use crate::sentence::{Sentence, Task};
use crate::term::Term;

/// Monotonic cycle counter.
pub trait Clock {
    /// The current cycle timestamp.
    fn time(&self) -> i64;
}

/// A clock advanced explicitly by the driver. The usual choice for tests
/// and for drivers that tie logical time to their own loop.
#[derive(Debug, Default)]
pub struct ManualClock(AtomicI64);

impl ManualClock {
    /// Create a clock at the given timestamp.
    #[must_use]
    pub fn starting_at(time: i64) -> Self {
        Self(AtomicI64::new(time))
    }

    /// Set the timestamp.
    pub fn set(&self, time: i64) {
        self.0.store(time, Ordering::SeqCst);
    }

    /// Advance the timestamp by `delta`.
    pub fn advance(&self, delta: i64) {
        self.0.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn time(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Builds concepts for terms, or refuses terms that cannot host one.
pub trait ConceptBuilder {
    /// Build a concept, or return `None` when the term cannot host one.
    fn new_concept(
        &self,
        budget: BudgetValue,
        term: &Term,
        config: &ReasonerConfig,
    ) -> Option<Concept>;
}

/// The standard builder: any non-interval, non-variable term hosts a
/// concept. A bare variable names nothing, so it is refused; compounds
/// containing variables are fine (question concepts need them).
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultConceptBuilder;

impl ConceptBuilder for DefaultConceptBuilder {
    fn new_concept(
        &self,
        budget: BudgetValue,
        term: &Term,
        _config: &ReasonerConfig,
    ) -> Option<Concept> {
        if term.is_interval() || term.is_variable() {
            return None;
        }
        Some(Concept::new(budget, term.clone()))
    }
}

/// The inference engine behind the premise queue: the rule table, solution
/// delivery, and operation execution.
///
/// Implementations derive new tasks by calling
/// [`Memory::add_task`] with `derived = true`; the core re-enters them into
/// the cycling queue. Errors returned here are logged by the premise
/// executor and never propagate further.
pub trait Deriver {
    /// Fire the rule table on a premise pair.
    ///
    /// # Errors
    /// Implementations may fail; the failure is contained at the premise
    /// boundary.
    fn reason(
        &mut self,
        premise: &Premise,
        ctx: &mut DerivationContext<'_>,
        memory: &mut Memory,
    ) -> Result<()>;

    /// Offer a belief as a solution to a question or goal task.
    ///
    /// # Errors
    /// Implementations may fail; the failure is contained at the premise
    /// boundary.
    fn try_solution(
        &mut self,
        belief: &Sentence,
        task: &Task,
        ctx: &mut DerivationContext<'_>,
        memory: &mut Memory,
    ) -> Result<()>;

    /// Execute the decision side-effect for a derived operation task.
    fn execute_decision(&mut self, task: &Task, memory: &mut Memory) {
        let _ = (task, memory);
    }
}

/// A deriver that derives nothing. Useful for attention-only drivers and
/// for exercising the control layer in isolation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDeriver;

impl Deriver for NullDeriver {
    fn reason(
        &mut self,
        _premise: &Premise,
        _ctx: &mut DerivationContext<'_>,
        _memory: &mut Memory,
    ) -> Result<()> {
        Ok(())
    }

    fn try_solution(
        &mut self,
        _belief: &Sentence,
        _task: &Task,
        _ctx: &mut DerivationContext<'_>,
        _memory: &mut Memory,
    ) -> Result<()> {
        Ok(())
    }
}
