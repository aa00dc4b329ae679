//! The memory root: run-time state of one reasoner.
//!
//! Memory owns the concept store, the subconscious cache, the task queues,
//! the premise queue, the event bus, and the stamp-serial counter. It is
//! strictly single-writer: every mutating entry point takes `&mut self`,
//! and drivers that shard work across threads wrap it in their own
//! exclusive region. The whole struct is serializable as one opaque
//! snapshot; the bus and counters are runtime wiring and are re-created on
//! load.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bag::{Bag, Insertion, PriorityMap};
use crate::budget::{activate, ActivationMode, BudgetValue};
use crate::concept::Concept;
use crate::config::ReasonerConfig;
use crate::error::Result;
use crate::events::{Event, EventBus};
use crate::interfaces::ConceptBuilder;
use crate::metrics::{CycleCounters, CycleTimings};
use crate::premise::Premise;
use crate::rng::ReasonerRng;
use crate::sentence::{Punctuation, Sentence, Task, TaskSource};
use crate::stamp::{BaseEntry, Stamp, Tense, UNSTAMPED};
use crate::subconscious::Subconscious;
use crate::term::Term;
use crate::truth::{truth_to_quality, TruthValue};

/// Run-time state of a reasoner, excluding I/O channels.
#[derive(Debug, Serialize, Deserialize)]
pub struct Memory {
    /// Attention parameters.
    pub config: ReasonerConfig,
    /// Identity baked into every stamp serial this reasoner issues.
    pub reasoner_id: i64,
    /// The bounded concept store.
    pub concepts: PriorityMap<Term, Concept>,
    /// Overflow cache for displaced concepts; `None` when disabled.
    pub subconscious: Option<Subconscious>,
    /// Input tasks waiting for their first cycle, oldest first.
    pub input_tasks: VecDeque<Task>,
    /// Tasks circulating between cycles.
    pub cycling_tasks: PriorityMap<Sentence, Task>,
    /// Premise records pending derivation.
    pub premise_queue: PriorityMap<u64, Premise>,
    next_premise_id: u64,
    current_stamp_serial: u64,
    /// Per-reasoner randomness for probabilistic bag variants.
    pub rng: ReasonerRng,
    /// Lifecycle event bus. Runtime wiring, not persisted.
    #[serde(skip)]
    pub bus: EventBus,
    /// Control-loop counters. Not persisted.
    #[serde(skip)]
    pub counters: CycleCounters,
    /// Recent cycle durations. Not persisted.
    #[serde(skip)]
    pub timings: CycleTimings,
    #[serde(skip)]
    pending_decisions: Vec<Task>,
}

impl Memory {
    /// Create a fresh memory from validated parameters.
    ///
    /// # Errors
    /// Returns [`crate::error::AlannError::ParameterOutOfRange`] when a
    /// parameter fails validation.
    pub fn new(config: ReasonerConfig) -> Result<Self> {
        config.validate()?;
        let subconscious = if config.subconscious_bag_size == 0 {
            None
        } else {
            Some(Subconscious::new(config.subconscious_bag_size))
        };
        let rng = ReasonerRng::new(config.random_seed);
        Ok(Self {
            concepts: PriorityMap::new(config.concept_bag_size),
            subconscious,
            input_tasks: VecDeque::new(),
            cycling_tasks: PriorityMap::new(config.task_link_bag_size),
            premise_queue: PriorityMap::new(config.task_link_bag_size),
            next_premise_id: 0,
            current_stamp_serial: 0,
            reasoner_id: 0,
            rng,
            bus: EventBus::new(),
            counters: CycleCounters::new(),
            timings: CycleTimings::default(),
            pending_decisions: Vec::new(),
            config,
        })
    }

    /// Clear all stores and queues and rewind the RNG. Stamp serials keep
    /// counting so evidence issued before the reset stays distinguishable.
    pub fn reset(&mut self) {
        self.bus.emit(&Event::ResetStart);
        self.concepts.clear();
        if let Some(cache) = self.subconscious.as_mut() {
            cache.clear();
        }
        self.input_tasks.clear();
        self.cycling_tasks.clear();
        self.premise_queue.clear();
        self.pending_decisions.clear();
        self.rng.reseed(self.config.random_seed);
        self.bus.emit(&Event::ResetEnd);
    }

    /// Issue a fresh evidence serial.
    pub fn new_stamp_serial(&mut self) -> BaseEntry {
        let serial = self.current_stamp_serial;
        self.current_stamp_serial += 1;
        BaseEntry {
            reasoner_id: self.reasoner_id,
            serial,
        }
    }

    pub(crate) fn next_premise_id(&mut self) -> u64 {
        let id = self.next_premise_id;
        self.next_premise_id += 1;
        id
    }

    pub(crate) fn take_pending_decisions(&mut self) -> Vec<Task> {
        std::mem::take(&mut self.pending_decisions)
    }

    /// Look up the concept for a term, without touching its budget.
    #[must_use]
    pub fn concept(&self, term: &Term) -> Option<&Concept> {
        self.concepts.get(&term.replace_intervals())
    }

    /// Look up or create the concept for `term`, activating its budget and
    /// reinserting it with one forgetting touch.
    ///
    /// Returns the canonical term keying the live concept, or `None` when
    /// the term is an interval, the builder refuses it, creation is not
    /// requested, or the store immediately bounced the concept back out.
    pub fn conceptualize(
        &mut self,
        budget: BudgetValue,
        term: &Term,
        create_if_missing: bool,
        builder: &dyn ConceptBuilder,
        now: i64,
    ) -> Option<Term> {
        if term.is_interval() {
            return None;
        }
        let term = term.replace_intervals();

        let mut found = self.concepts.take(&term);
        if found.is_none() {
            if let Some(cache) = self.subconscious.as_mut() {
                if let Some(mut cached) = cache.take(&term) {
                    // the time spent forgotten must not count against it
                    cached.budget.last_forget_time = now;
                    self.bus.emit(&Event::ConceptRemember { term: term.clone() });
                    CycleCounters::bump(&self.counters.concepts_remembered);
                    found = Some(cached);
                }
            }
        }

        let concept = match found {
            Some(mut existing) => {
                activate(&mut existing.budget, &budget, ActivationMode::TaskLink);
                existing
            }
            None => {
                if !create_if_missing {
                    return None;
                }
                let created = builder.new_concept(budget, &term, &self.config)?;
                debug!(term = %term, "concept created");
                self.bus.emit(&Event::ConceptNew { term: term.clone() });
                CycleCounters::bump(&self.counters.concepts_created);
                created
            }
        };

        let forget_cycles = self.config.cycles(self.config.concept_forget_durations);
        match self
            .concepts
            .put_back(concept, forget_cycles, self.config.quality_rescaled, now)
        {
            Insertion::Inserted => Some(term),
            Insertion::Displaced(other) => {
                self.concept_removed(other);
                Some(term)
            }
            Insertion::Rejected(bounced) => {
                self.concept_removed(bounced);
                None
            }
        }
    }

    /// Shorthand: conceptualize a task's term with the task's budget.
    pub fn conceptualize_task(
        &mut self,
        task: &Task,
        builder: &dyn ConceptBuilder,
        now: i64,
    ) -> Option<Term> {
        self.conceptualize(task.budget, task.term(), true, builder, now)
    }

    /// Merge a budget into an existing concept under `mode`, re-sifting it.
    pub fn activate_concept(
        &mut self,
        term: &Term,
        budget: &BudgetValue,
        mode: ActivationMode,
        now: i64,
    ) {
        let Some(mut concept) = self.concepts.take(&term.replace_intervals()) else {
            return;
        };
        activate(&mut concept.budget, budget, mode);
        self.put_back_concept(concept, now);
    }

    /// Apply one forgetting touch to a stored concept.
    pub fn forget_concept(&mut self, term: &Term, now: i64) {
        let Some(concept) = self.concepts.take(&term.replace_intervals()) else {
            return;
        };
        self.put_back_concept(concept, now);
    }

    /// Reinsert a concept with concept-level decay, routing any displaced
    /// concept to the subconscious.
    pub fn put_back_concept(&mut self, concept: Concept, now: i64) {
        let forget_cycles = self.config.cycles(self.config.concept_forget_durations);
        let result =
            self.concepts
                .put_back(concept, forget_cycles, self.config.quality_rescaled, now);
        if let Some(removed) = result.into_removed() {
            self.concept_removed(removed);
        }
    }

    /// A concept left the store: cache it if the subconscious is enabled,
    /// and report the displacement.
    pub fn concept_removed(&mut self, concept: Concept) {
        let term = concept.term.clone();
        if let Some(cache) = self.subconscious.as_mut() {
            cache.add(concept);
        }
        debug!(term = %term, "concept forgotten");
        self.bus.emit(&Event::ConceptForget { term });
        CycleCounters::bump(&self.counters.concepts_forgotten);
    }

    /// Insert a judgment into a stored concept's belief table.
    pub(crate) fn add_belief(&mut self, term: &Term, task: &Task) {
        let capacity = self.config.concept_beliefs_max;
        let bus = &self.bus;
        self.concepts.mutate(term, |concept| {
            concept.add_belief(task, capacity, bus);
        });
    }

    /// Route a task into the system.
    ///
    /// Derived tasks are pre-conceptualized and join the cycling queue;
    /// derived operation terms additionally schedule a decision side-effect.
    /// Input tasks queue for the next cycle.
    pub fn add_task(
        &mut self,
        task: Task,
        reason: &str,
        derived: bool,
        builder: &dyn ConceptBuilder,
        now: i64,
    ) {
        if derived {
            let _ = self.conceptualize_task(&task, builder, now);
            if let Some(old) = self.cycling_tasks.put_in(task.clone()).into_removed() {
                self.remove_task(old, "Displaced");
            }
            if task.term().is_operation() {
                self.pending_decisions.push(task.clone());
            }
        } else {
            self.input_tasks.push_back(task.clone());
        }
        self.bus.emit(&Event::TaskAdd {
            task: task.clone(),
            reason: reason.to_string(),
        });
        CycleCounters::bump(&self.counters.tasks_added);
        self.output(&task);
    }

    /// Process a task arriving from outside: time its stamp if unset, then
    /// admit it through the noise gate or neglect it.
    pub fn input_task(&mut self, mut task: Task, builder: &dyn ConceptBuilder, now: i64) {
        if task.sentence.stamp.creation_time == UNSTAMPED {
            task.sentence.stamp.creation_time = now;
        }
        if task.budget.above_threshold(self.config.budget_threshold) {
            self.add_task(task, "Perceived", false, builder, now);
        } else {
            self.remove_task(task, "Neglected");
        }
    }

    /// Drop a task and report why.
    pub fn remove_task(&mut self, task: Task, reason: &str) {
        self.bus.emit(&Event::TaskRemove {
            task,
            reason: reason.to_string(),
        });
        CycleCounters::bump(&self.counters.tasks_removed);
    }

    /// Feedback path for an executed operation: wrap the outcome in a
    /// present-tense judgment task with the configured feedback budget.
    pub fn executed_task(
        &mut self,
        operation: Term,
        truth: TruthValue,
        builder: &dyn ConceptBuilder,
        now: i64,
    ) {
        let stamp = Stamp::from_input(
            self.new_stamp_serial(),
            now,
            Tense::Present,
            self.config.duration,
        );
        let sentence = Sentence::new(operation, Punctuation::Judgment, Some(truth), stamp);
        let budget = BudgetValue::new(
            self.config.default_feedback_priority,
            self.config.default_feedback_durability,
            truth_to_quality(&truth),
        );
        let task = Task::new(sentence, budget, TaskSource::Input);
        self.add_task(task, "Executed", false, builder, now);
    }

    /// Report a task if its budget summary clears the volume gate.
    pub fn output(&self, task: &Task) {
        if task.budget.summary() >= self.config.noise_level() {
            self.bus.emit(&Event::Output { task: task.clone() });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::DefaultConceptBuilder;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn memory_with(config: ReasonerConfig) -> Memory {
        Memory::new(config).expect("valid config")
    }

    fn small_memory() -> Memory {
        memory_with(ReasonerConfig {
            concept_bag_size: 8,
            subconscious_bag_size: 8,
            ..ReasonerConfig::default()
        })
    }

    #[test]
    fn conceptualize_twice_creates_once() {
        let builder = DefaultConceptBuilder;
        let mut memory = small_memory();
        let created = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&created);
        memory.bus.subscribe(crate::events::EventKind::ConceptNew, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let term = Term::inheritance(Term::atom("bird"), Term::atom("animal"));
        let budget = BudgetValue::new(0.5, 0.5, 0.5);
        let first = memory.conceptualize(budget, &term, true, &builder, 0);
        let second = memory.conceptualize(budget, &term, true, &builder, 0);
        assert_eq!(first, second);
        assert_eq!(first, Some(term));
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(memory.concepts.len(), 1);
    }

    #[test]
    fn conceptualize_rejects_intervals() {
        let builder = DefaultConceptBuilder;
        let mut memory = small_memory();
        let budget = BudgetValue::new(0.5, 0.5, 0.5);
        assert!(memory
            .conceptualize(budget, &Term::Interval(3), true, &builder, 0)
            .is_none());
        assert!(memory.concepts.is_empty());
    }

    #[test]
    fn conceptualize_without_create_returns_none_for_absent() {
        let builder = DefaultConceptBuilder;
        let mut memory = small_memory();
        let budget = BudgetValue::new(0.5, 0.5, 0.5);
        assert!(memory
            .conceptualize(budget, &Term::atom("ghost"), false, &builder, 0)
            .is_none());
    }

    #[test]
    fn capacity_zero_store_bounces_every_concept() {
        let builder = DefaultConceptBuilder;
        let mut memory = memory_with(ReasonerConfig {
            concept_bag_size: 0,
            subconscious_bag_size: 8,
            ..ReasonerConfig::default()
        });
        let forgotten = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&forgotten);
        memory
            .bus
            .subscribe(crate::events::EventKind::ConceptForget, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        let budget = BudgetValue::new(0.9, 0.5, 0.5);
        for _ in 0..3 {
            assert!(memory
                .conceptualize(budget, &Term::atom("bird"), true, &builder, 0)
                .is_none());
        }
        assert_eq!(forgotten.load(Ordering::SeqCst), 3);
        assert!(memory.concepts.is_empty());
    }

    #[test]
    fn displaced_concept_is_remembered_from_subconscious() {
        let builder = DefaultConceptBuilder;
        let mut memory = memory_with(ReasonerConfig {
            concept_bag_size: 2,
            subconscious_bag_size: 8,
            ..ReasonerConfig::default()
        });
        let b_term = Term::atom("b");
        let _ = memory.conceptualize(BudgetValue::new(0.9, 0.9, 0.5), &Term::atom("a"), true, &builder, 0);
        let _ = memory.conceptualize(BudgetValue::new(0.5, 0.9, 0.5), &b_term, true, &builder, 0);
        let _ = memory.conceptualize(BudgetValue::new(0.7, 0.9, 0.5), &Term::atom("c"), true, &builder, 0);

        assert!(memory.concepts.get(&b_term).is_none(), "b was the lowest");
        assert!(memory
            .subconscious
            .as_ref()
            .expect("cache enabled")
            .contains(&b_term));

        let remembered = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&remembered);
        memory
            .bus
            .subscribe(crate::events::EventKind::ConceptRemember, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        let restored = memory.conceptualize(
            BudgetValue::new(0.9, 0.9, 0.5),
            &b_term,
            true,
            &builder,
            40,
        );
        assert_eq!(restored, Some(b_term.clone()));
        assert_eq!(remembered.load(Ordering::SeqCst), 1);
        let concept = memory.concepts.get(&b_term).expect("restored");
        assert_eq!(concept.budget.last_forget_time, 40);
    }

    #[test]
    fn input_task_below_threshold_is_neglected() {
        let builder = DefaultConceptBuilder;
        let mut memory = small_memory();
        let removed = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&removed);
        memory
            .bus
            .subscribe(crate::events::EventKind::TaskRemove, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        let entry = memory.new_stamp_serial();
        let stamp = Stamp::from_input(entry, 0, Tense::Eternal, 5);
        let sentence = Sentence::new(
            Term::atom("noise"),
            Punctuation::Judgment,
            Some(TruthValue::new(0.5, 0.01)),
            stamp,
        );
        let task = Task::new(sentence, BudgetValue::new(0.0, 0.0, 0.0), TaskSource::Input);
        memory.input_task(task, &builder, 0);
        assert_eq!(removed.load(Ordering::SeqCst), 1);
        assert!(memory.input_tasks.is_empty());
    }

    #[test]
    fn input_task_fills_missing_creation_time() {
        let builder = DefaultConceptBuilder;
        let mut memory = small_memory();
        let entry = memory.new_stamp_serial();
        let mut stamp = Stamp::from_input(entry, 0, Tense::Eternal, 5);
        stamp.creation_time = UNSTAMPED;
        let sentence = Sentence::new(
            Term::atom("late"),
            Punctuation::Judgment,
            Some(TruthValue::new(1.0, 0.9)),
            stamp,
        );
        let task = Task::new(sentence, BudgetValue::new(0.8, 0.5, 0.5), TaskSource::Input);
        memory.input_task(task, &builder, 17);
        let queued = memory.input_tasks.front().expect("admitted");
        assert_eq!(queued.sentence.stamp.creation_time, 17);
    }

    #[test]
    fn stamp_serials_are_monotonic() {
        let mut memory = small_memory();
        let a = memory.new_stamp_serial();
        let b = memory.new_stamp_serial();
        assert_eq!(a.serial + 1, b.serial);
        assert_eq!(a.reasoner_id, memory.reasoner_id);
    }

    #[test]
    fn reset_clears_state_and_emits_bookends() {
        let builder = DefaultConceptBuilder;
        let mut memory = small_memory();
        let _ = memory.conceptualize(
            BudgetValue::new(0.5, 0.5, 0.5),
            &Term::atom("x"),
            true,
            &builder,
            0,
        );
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let start_log = Arc::clone(&order);
        memory
            .bus
            .subscribe(crate::events::EventKind::ResetStart, move |_| {
                start_log.lock().push("start");
            });
        let end_log = Arc::clone(&order);
        memory
            .bus
            .subscribe(crate::events::EventKind::ResetEnd, move |_| {
                end_log.lock().push("end");
            });
        memory.reset();
        assert!(memory.concepts.is_empty());
        assert_eq!(*order.lock(), vec!["start", "end"]);
    }
}
