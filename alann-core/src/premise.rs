//! Pending premises.
//!
//! When a task fires against a belief concept, the pair is not derived on
//! the spot; it becomes a premise record in a bounded priority queue, and a
//! batch of the most promising records is executed at the end of the cycle.
//! Every enqueued record is distinct — the queue is a priority heap with
//! capacity-driven eviction of the least important pending premise, not a
//! dedup table.

use serde::{Deserialize, Serialize};

use crate::budget::BudgetValue;
use crate::item::Item;
use crate::sentence::{Sentence, Task};
use crate::term::Term;

/// One (task, belief?) pair queued for rule-table derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Premise {
    id: u64,
    /// The task side of the pair.
    pub task: Task,
    /// Canonical (interval-stripped) term of the task's concept.
    pub task_concept_term: Term,
    /// The component term the pairing went through.
    pub subterm: Term,
    /// Term of the concept the belief came from.
    pub belief_concept_term: Term,
    /// The belief side; `None` marks a virtual premise, letting rules fire
    /// on the task and subterm alone.
    pub belief: Option<Sentence>,
    /// Whether this pairing came from the temporal-anchor fanout.
    pub temporal: bool,
    budget: BudgetValue,
}

impl Premise {
    /// Build a premise record and derive its budget.
    ///
    /// Priority is the belief concept's priority scaled by the belief's
    /// truth expectation — or by 0.5 for a virtual premise, a hand-tuned
    /// constant that positions beliefless pairings mid-field. Durability
    /// follows the task-link forget horizon; quality is zero, so starved
    /// records decay all the way out.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        task: Task,
        task_concept_term: Term,
        subterm: Term,
        belief_concept_term: Term,
        belief: Option<Sentence>,
        temporal: bool,
        belief_concept_priority: f32,
        tasklink_forget_durations: f32,
    ) -> Self {
        let weight = belief
            .as_ref()
            .and_then(|b| b.truth.as_ref())
            .map_or(0.5, crate::truth::TruthValue::expectation);
        let budget = BudgetValue::new(
            belief_concept_priority * weight,
            tasklink_forget_durations,
            0.0,
        );
        Self {
            id,
            task,
            task_concept_term,
            subterm,
            belief_concept_term,
            belief,
            temporal,
            budget,
        }
    }

    /// The record's queue identity.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether this is a virtual (beliefless) premise.
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.belief.is_none()
    }
}

impl Item<u64> for Premise {
    fn name(&self) -> &u64 {
        &self.id
    }

    fn budget(&self) -> &BudgetValue {
        &self.budget
    }

    fn budget_mut(&mut self) -> &mut BudgetValue {
        &mut self.budget
    }
}
