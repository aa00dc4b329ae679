//! Concepts: the per-term reasoning units.
//!
//! A concept owns the judgments made about its term (the belief table),
//! the term-link templates that decompose its compound term, the novelty
//! clock that spaces out its firings, and the most recent event belief for
//! temporal inference. Concepts hold no back-reference to the memory: any
//! operation that needs to publish events takes the bus as a parameter.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::budget::{rank_belief, BudgetValue};
use crate::events::{Event, EventBus};
use crate::item::Item;
use crate::sentence::{Sentence, Task};
use crate::term::Term;

/// How a term link relates the concept to a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermLinkKind {
    /// Component of a plain compound.
    Component,
    /// Component of a statement (copula compound).
    ComponentStatement,
}

/// A template link from a compound concept to one of its components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermLink {
    /// The component term the link points at.
    pub target: Term,
    /// Structural role of the component.
    pub kind: TermLinkKind,
}

/// The reasoning unit for one term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
    /// The term is the unique identity of the concept.
    pub term: Term,
    /// Attention budget.
    pub budget: BudgetValue,
    /// Judgments about the term, strictly descending by rank.
    pub beliefs: Vec<Task>,
    /// Component decomposition of the term; empty for atomic terms.
    pub term_link_templates: Vec<TermLink>,
    /// Cycle of the last firing; `i64::MIN` until the first one.
    pub last_fire_time: i64,
    /// Most recent non-eternal judgment, for temporal pairing.
    pub event: Option<Sentence>,
}

impl Concept {
    /// Build a concept for `term` with the given starting budget.
    ///
    /// Term-link templates are derived from the term's component structure
    /// once, here; they never change afterwards.
    #[must_use]
    pub fn new(budget: BudgetValue, term: Term) -> Self {
        let kind = match &term {
            Term::Compound(connector, _) if connector.is_statement() => {
                TermLinkKind::ComponentStatement
            }
            _ => TermLinkKind::Component,
        };
        let term_link_templates = term
            .component_terms()
            .into_iter()
            .map(|target| TermLink { target, kind })
            .collect();
        Self {
            term,
            budget,
            beliefs: Vec::new(),
            term_link_templates,
            last_fire_time: i64::MIN,
            event: None,
        }
    }

    /// Insert a judgment task into the belief table.
    ///
    /// The table stays strictly descending by rank; at equal rank the newer
    /// belief is placed first. A belief with identical truth and evidence
    /// to the one at its insertion point is rejected as a duplicate. When
    /// the table overflows `capacity`, the lowest-ranked belief is dropped
    /// and reported; a new belief ranked below a full table is silently
    /// discarded.
    pub fn add_belief(&mut self, task: &Task, capacity: usize, bus: &EventBus) {
        debug_assert!(task.sentence.is_judgment());
        let rank = rank_belief(&task.sentence);

        let mut inserted = false;
        for i in 0..self.beliefs.len() {
            let existing = &self.beliefs[i].sentence;
            if rank >= rank_belief(existing) {
                if task.sentence.truth == existing.truth
                    && task.sentence.stamp.equals_evidence(&existing.stamp)
                {
                    return;
                }
                self.beliefs.insert(i, task.clone());
                inserted = true;
                break;
            }
        }
        if !inserted {
            if self.beliefs.len() < capacity {
                self.beliefs.push(task.clone());
            } else {
                return;
            }
        }

        if self.beliefs.len() > capacity {
            if let Some(removed) = self.beliefs.pop() {
                bus.emit(&Event::ConceptBeliefRemove {
                    concept: self.term.clone(),
                    belief: removed.sentence,
                });
            }
        }
        bus.emit(&Event::ConceptBeliefAdd {
            concept: self.term.clone(),
            belief: task.sentence.clone(),
        });

        if !task.sentence.is_eternal() {
            let newer = self
                .event
                .as_ref()
                .is_none_or(|e| task.sentence.stamp.occurrence_time >= e.stamp.occurrence_time);
            if newer {
                self.event = Some(task.sentence.clone());
            }
        }
    }

    /// The best-ranked belief, if any.
    #[must_use]
    pub fn best_belief(&self) -> Option<&Task> {
        self.beliefs.first()
    }
}

impl Item<Term> for Concept {
    fn name(&self) -> &Term {
        &self.term
    }

    fn budget(&self) -> &BudgetValue {
        &self.budget
    }

    fn budget_mut(&mut self) -> &mut BudgetValue {
        &mut self.budget
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} beliefs:{}", self.term, self.beliefs.len())
    }
}
