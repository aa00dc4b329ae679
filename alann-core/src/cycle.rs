//! The inference cycle.
//!
//! One step: drain the highest-priority concepts as temporal anchors,
//! select tasks (inputs first), pre-activate their concepts, fire each task
//! to enqueue premises, then execute a bounded batch of the most promising
//! premises. Everything here is synchronous and single-writer; ordering
//! within a cycle is exactly the order of this file's calls.

use std::time::Instant;

use tracing::{trace, warn};

use crate::bag::Bag;
use crate::context::DerivationContext;
use crate::events::Event;
use crate::interfaces::{Clock, ConceptBuilder, Deriver};
use crate::memory::Memory;
use crate::metrics::CycleCounters;
use crate::premise::Premise;
use crate::sentence::{Sentence, Task};
use crate::stamp::Stamp;
use crate::term::{unify_query, Term};

impl Memory {
    /// Run one full cycle, bracketed by `CycleStart`/`CycleEnd`.
    pub fn cycle(
        &mut self,
        deriver: &mut dyn Deriver,
        builder: &dyn ConceptBuilder,
        clock: &dyn Clock,
    ) {
        let started = Instant::now();
        let now = clock.time();
        self.bus.emit(&Event::CycleStart { time: now });
        alann_cycle(self, deriver, builder, clock);
        self.bus.emit(&Event::CycleEnd { time: now });
        CycleCounters::bump(&self.counters.cycles);
        self.timings.record(started.elapsed());
    }
}

/// The cycle body: anchors, selection, pre-activation, firing, premises.
pub fn alann_cycle(
    memory: &mut Memory,
    deriver: &mut dyn Deriver,
    builder: &dyn ConceptBuilder,
    clock: &dyn Clock,
) {
    let now = clock.time();

    // 1. drain the highest-priority concepts for temporal inference, then
    //    reinsert each with one decay for having been looked at
    let mut anchors = Vec::with_capacity(memory.config.sequence_bag_attempts);
    for _ in 0..memory.config.sequence_bag_attempts {
        let Some(concept) = memory.concepts.take_highest() else {
            break;
        };
        anchors.push(concept);
    }
    let anchor_terms: Vec<Term> = anchors.iter().map(|c| c.term.clone()).collect();
    for concept in anchors {
        memory.put_back_concept(concept, now);
    }

    // 2. select tasks, preferring fresh input over cycling backlog
    let mut selected = Vec::with_capacity(memory.config.tasks_max_fired);
    for _ in 0..memory.config.tasks_max_fired {
        if let Some(task) = memory.input_tasks.pop_front() {
            selected.push(task);
        } else if let Some(task) = memory.cycling_tasks.take_highest() {
            selected.push(task);
        }
    }

    // 3. pre-activate so every selected task's concept is present and
    //    budget-boosted before any of them fires
    for task in &selected {
        let _ = memory.conceptualize_task(task, builder, now);
    }

    // 4. fire, then return each task to the cycling queue with decay
    for task in selected {
        trace!(task = %task, "firing");
        fire_task(memory, &task, &anchor_terms, builder, now);
        let forget_cycles = memory.config.cycles(memory.config.tasklink_forget_durations);
        let relative_threshold = memory.config.quality_rescaled;
        if let Some(old) = memory
            .cycling_tasks
            .put_back(task, forget_cycles, relative_threshold, now)
            .into_removed()
        {
            memory.remove_task(old, "Displaced");
        }
    }

    // 5. execute the most promising pending premises
    for _ in 0..memory.config.premises_max_fired {
        let Some(premise) = memory.premise_queue.take_highest() else {
            break;
        };
        execute_premise(memory, deriver, builder, now, &premise);
    }
}

/// Fire one task: link its judgment into the relevant belief tables, gate
/// on novelty, then pair it with every belief of every component concept.
pub fn fire_task(
    memory: &mut Memory,
    task: &Task,
    anchor_terms: &[Term],
    builder: &dyn ConceptBuilder,
    now: i64,
) {
    // concepts have no intervals
    let task_concept_term = task.term().replace_intervals();
    if memory.conceptualize_task(task, builder, now).is_none() {
        return;
    }
    add_to_beliefs_conceptualizing_components(memory, &task_concept_term, task, builder, now);
    memory.forget_concept(&task_concept_term, now);

    // a concept that fired less than the novelty horizon ago sits this one out
    let novelty_horizon = memory.config.novelty_horizon;
    let may_fire = memory
        .concepts
        .get(&task_concept_term)
        .is_some_and(|c| now.saturating_sub(c.last_fire_time) >= novelty_horizon);
    if !may_fire {
        return;
    }
    memory
        .concepts
        .mutate(&task_concept_term, |c| c.last_fire_time = now);

    let templates: Vec<Term> = memory
        .concepts
        .get(&task_concept_term)
        .map(|c| c.term_link_templates.iter().map(|l| l.target.clone()).collect())
        .unwrap_or_default();

    for subterm in templates {
        if memory.concept(&subterm).is_none() {
            continue;
        }
        memory.forget_concept(&subterm, now);
        let canonical = subterm.replace_intervals();
        let Some((concept_priority, beliefs)) = memory.concepts.get(&canonical).map(|c| {
            let sentences: Vec<Sentence> =
                c.beliefs.iter().map(|b| b.sentence.clone()).collect();
            (c.budget.priority, sentences)
        }) else {
            continue;
        };
        for belief in beliefs {
            enqueue_premise(
                memory,
                task,
                &task_concept_term,
                belief.term.clone(),
                canonical.clone(),
                Some(belief),
                false,
                concept_priority,
            );
        }
        // virtual premise, for rules that need only the task and subterm
        enqueue_premise(
            memory,
            task,
            &task_concept_term,
            canonical.clone(),
            canonical,
            None,
            false,
            concept_priority,
        );
    }

    // temporal fanout: pair an event judgment with the cycle's anchors
    if !task.sentence.is_eternal() && task.sentence.is_judgment() {
        for anchor in anchor_terms {
            let Some((anchor_priority, event)) = memory
                .concepts
                .get(anchor)
                .and_then(|c| c.event.as_ref().map(|e| (c.budget.priority, e.clone())))
            else {
                continue;
            };
            enqueue_premise(
                memory,
                task,
                &task_concept_term,
                event.term.clone(),
                anchor.clone(),
                Some(event),
                true,
                anchor_priority,
            );
        }
    }
}

/// Insert a judgment into its own concept's belief table and into every
/// component concept's, creating component concepts on demand. Questions
/// and goals still conceptualize their components, they just add no
/// beliefs.
fn add_to_beliefs_conceptualizing_components(
    memory: &mut Memory,
    task_concept_term: &Term,
    task: &Task,
    builder: &dyn ConceptBuilder,
    now: i64,
) {
    if task.sentence.is_judgment() {
        memory.add_belief(task_concept_term, task);
    }
    let components: Vec<Term> = memory
        .concepts
        .get(task_concept_term)
        .map(|c| c.term_link_templates.iter().map(|l| l.target.clone()).collect())
        .unwrap_or_default();
    for component in components {
        let Some(component_key) =
            memory.conceptualize(task.budget, &component, true, builder, now)
        else {
            continue;
        };
        if task.sentence.is_judgment() {
            memory.add_belief(&component_key, task);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn enqueue_premise(
    memory: &mut Memory,
    task: &Task,
    task_concept_term: &Term,
    subterm: Term,
    belief_concept_term: Term,
    belief: Option<Sentence>,
    temporal: bool,
    belief_concept_priority: f32,
) {
    let id = memory.next_premise_id();
    let premise = Premise::new(
        id,
        task.clone(),
        task_concept_term.clone(),
        subterm,
        belief_concept_term,
        belief,
        temporal,
        belief_concept_priority,
        memory.config.tasklink_forget_durations,
    );
    // at capacity the least promising pending premise is evicted, silently
    let _ = memory.premise_queue.put_in(premise);
    CycleCounters::bump(&memory.counters.premises_enqueued);
}

/// Execute one premise: build the derivation context, try the belief as an
/// answer for non-judgment tasks, then hand the pair to the rule table.
/// Deriver failures are logged here and go no further.
fn execute_premise(
    memory: &mut Memory,
    deriver: &mut dyn Deriver,
    builder: &dyn ConceptBuilder,
    now: i64,
    premise: &Premise,
) {
    let new_stamp = match &premise.belief {
        Some(belief) => Stamp::merge(
            &premise.task.sentence.stamp,
            &belief.stamp,
            now,
            memory.config.max_evidence_length,
        ),
        None => premise.task.sentence.stamp.retimed(now),
    };
    let mut ctx = DerivationContext {
        current_task: premise.task.clone(),
        current_term: premise.task_concept_term.clone(),
        current_concept: premise.belief_concept_term.clone(),
        current_belief: premise.belief.clone(),
        new_stamp,
        now,
        builder,
    };

    if !premise.task.sentence.is_judgment() {
        if let Some(belief) = &premise.belief {
            if unify_query(&premise.task.sentence.term, &belief.term) {
                if let Err(error) = deriver.try_solution(belief, &premise.task, &mut ctx, memory)
                {
                    warn!(%error, "solution delivery failed");
                }
            }
        }
    }

    if let Err(error) = deriver.reason(premise, &mut ctx, memory) {
        warn!(%error, "derivation failed");
    }
    CycleCounters::bump(&memory.counters.premises_fired);

    for decision in memory.take_pending_decisions() {
        deriver.execute_decision(&decision, memory);
    }
}
