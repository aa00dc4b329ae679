//! End-to-end control-loop scenarios: input → conceptualization → firing →
//! premise execution, novelty gating, displacement into the subconscious,
//! question answering, queue overflow, and snapshot round trips.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alann_core::{
    Bag, BudgetValue, Clock, DefaultConceptBuilder, DerivationContext, Deriver, Event, EventKind,
    ManualClock, Memory, Premise, Punctuation, ReasonerConfig, Result, Sentence, SnapshotStore,
    Stamp, Task, TaskSource, Tense, Term, TruthValue,
};

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Parameters used by the behavioral scenarios.
fn scenario_config() -> ReasonerConfig {
    ReasonerConfig {
        duration: 5,
        novelty_horizon: 10,
        tasks_max_fired: 1,
        premises_max_fired: 8,
        concept_bag_size: 32,
        concept_beliefs_max: 7,
        subconscious_bag_size: 32,
        ..ReasonerConfig::default()
    }
}

fn judgment(memory: &mut Memory, term: Term, frequency: f32, confidence: f32) -> Task {
    let stamp = Stamp::from_input(memory.new_stamp_serial(), 0, Tense::Eternal, 5);
    Task::new(
        Sentence::new(
            term,
            Punctuation::Judgment,
            Some(TruthValue::new(frequency, confidence)),
            stamp,
        ),
        BudgetValue::new(0.8, 0.5, 0.5),
        TaskSource::Input,
    )
}

fn question(memory: &mut Memory, term: Term) -> Task {
    let stamp = Stamp::from_input(memory.new_stamp_serial(), 0, Tense::Eternal, 5);
    Task::new(
        Sentence::new(term, Punctuation::Question, None, stamp),
        BudgetValue::new(0.9, 0.9, 0.9),
        TaskSource::Input,
    )
}

/// Subscribe a recorder to every channel; returns the shared trace.
fn record_events(memory: &mut Memory) -> Arc<Mutex<Vec<String>>> {
    let trace = Arc::new(Mutex::new(Vec::new()));
    for kind in [
        EventKind::ConceptNew,
        EventKind::ConceptRemember,
        EventKind::ConceptForget,
        EventKind::ConceptBeliefAdd,
        EventKind::ConceptBeliefRemove,
        EventKind::TaskAdd,
        EventKind::TaskRemove,
        EventKind::CycleStart,
        EventKind::CycleEnd,
        EventKind::ResetStart,
        EventKind::ResetEnd,
        EventKind::Answer,
        EventKind::Output,
    ] {
        let sink = Arc::clone(&trace);
        memory.bus.subscribe(kind, move |event| {
            sink.lock().unwrap().push(format!("{event:?}"));
        });
    }
    trace
}

fn kinds(trace: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    trace
        .lock()
        .unwrap()
        .iter()
        .map(|line| {
            line.split([' ', '{'])
                .next()
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

/// Deriver that counts rule-table firings and answers questions through
/// the bus, the way a local-rules implementation would.
#[derive(Default)]
struct CountingDeriver {
    reasoned: usize,
    virtual_premises: usize,
    grounded_premises: usize,
    solutions: Vec<(Sentence, Task)>,
}

impl Deriver for CountingDeriver {
    fn reason(
        &mut self,
        premise: &Premise,
        _ctx: &mut DerivationContext<'_>,
        _memory: &mut Memory,
    ) -> Result<()> {
        self.reasoned += 1;
        if premise.is_virtual() {
            self.virtual_premises += 1;
        } else {
            self.grounded_premises += 1;
        }
        Ok(())
    }

    fn try_solution(
        &mut self,
        belief: &Sentence,
        task: &Task,
        _ctx: &mut DerivationContext<'_>,
        memory: &mut Memory,
    ) -> Result<()> {
        memory.bus.emit(&Event::Answer {
            question: task.clone(),
            belief: belief.clone(),
        });
        self.solutions.push((belief.clone(), task.clone()));
        Ok(())
    }
}

fn bird_animal() -> Term {
    Term::inheritance(Term::atom("bird"), Term::atom("animal"))
}

// ---------------------------------------------------------------------------
// Scenario: single judgment, single belief
// ---------------------------------------------------------------------------

#[test]
fn single_judgment_creates_concepts_and_fires_premises() {
    let builder = DefaultConceptBuilder;
    let clock = ManualClock::starting_at(0);
    let mut deriver = CountingDeriver::default();
    let mut memory = Memory::new(scenario_config()).expect("valid config");

    let j1 = judgment(&mut memory, bird_animal(), 1.0, 0.9);
    memory.input_task(j1.clone(), &builder, clock.time());
    let trace = record_events(&mut memory);
    memory.cycle(&mut deriver, &builder, &clock);

    // the statement concept and both component concepts exist
    for term in [bird_animal(), Term::atom("bird"), Term::atom("animal")] {
        let concept = memory.concept(&term).expect("concept exists");
        assert_eq!(concept.beliefs.len(), 1, "belief missing in {term}");
        assert_eq!(concept.beliefs[0].sentence, j1.sentence);
    }

    // two grounded premises (one per component belief) plus two virtual
    assert_eq!(deriver.reasoned, 4);
    assert_eq!(deriver.grounded_premises, 2);
    assert_eq!(deriver.virtual_premises, 2);
    assert!(memory.premise_queue.is_empty());

    let observed = kinds(&trace);
    assert_eq!(observed.first().map(String::as_str), Some("CycleStart"));
    assert_eq!(observed.last().map(String::as_str), Some("CycleEnd"));
    assert_eq!(
        observed.iter().filter(|k| *k == "ConceptNew").count(),
        3,
        "expected exactly bird→animal, bird, animal"
    );
}

#[test]
fn empty_cycle_emits_only_bookends() {
    let builder = DefaultConceptBuilder;
    let clock = ManualClock::starting_at(0);
    let mut deriver = CountingDeriver::default();
    let mut memory = Memory::new(scenario_config()).expect("valid config");
    let trace = record_events(&mut memory);

    memory.cycle(&mut deriver, &builder, &clock);

    assert_eq!(kinds(&trace), vec!["CycleStart", "CycleEnd"]);
    assert_eq!(deriver.reasoned, 0);
}

// ---------------------------------------------------------------------------
// Scenario: novelty gating
// ---------------------------------------------------------------------------

#[test]
fn novelty_horizon_blocks_rapid_refiring() {
    let builder = DefaultConceptBuilder;
    let clock = ManualClock::starting_at(0);
    let mut deriver = CountingDeriver::default();
    let mut memory = Memory::new(scenario_config()).expect("valid config");

    let j1 = judgment(&mut memory, bird_animal(), 1.0, 0.9);
    memory.input_task(j1, &builder, clock.time());

    memory.cycle(&mut deriver, &builder, &clock);
    assert_eq!(memory.concept(&bird_animal()).expect("exists").last_fire_time, 0);
    assert_eq!(deriver.reasoned, 4);

    // one cycle later: 1 - 0 < 10, the concept sits this one out
    clock.set(1);
    memory.cycle(&mut deriver, &builder, &clock);
    assert_eq!(memory.concept(&bird_animal()).expect("exists").last_fire_time, 0);
    assert_eq!(deriver.reasoned, 4, "no premises while gated");

    // past the horizon it fires again
    clock.set(11);
    memory.cycle(&mut deriver, &builder, &clock);
    assert_eq!(memory.concept(&bird_animal()).expect("exists").last_fire_time, 11);
    assert_eq!(deriver.reasoned, 8);
}

// ---------------------------------------------------------------------------
// Scenario: capacity displacement and remembering
// ---------------------------------------------------------------------------

#[test]
fn displacement_goes_through_subconscious_and_back() {
    let builder = DefaultConceptBuilder;
    let mut memory = Memory::new(ReasonerConfig {
        concept_bag_size: 2,
        subconscious_bag_size: 8,
        ..scenario_config()
    })
    .expect("valid config");
    let trace = record_events(&mut memory);

    let b = Term::atom("b");
    let _ = memory.conceptualize(BudgetValue::new(0.9, 0.9, 0.5), &Term::atom("a"), true, &builder, 0);
    let _ = memory.conceptualize(BudgetValue::new(0.5, 0.9, 0.5), &b, true, &builder, 0);
    let _ = memory.conceptualize(BudgetValue::new(0.7, 0.9, 0.5), &Term::atom("c"), true, &builder, 0);

    let observed = kinds(&trace);
    assert_eq!(observed.iter().filter(|k| *k == "ConceptForget").count(), 1);
    assert!(memory.concept(&b).is_none());
    assert!(memory.subconscious.as_ref().expect("enabled").contains(&b));

    let restored = memory.conceptualize(BudgetValue::new(0.8, 0.9, 0.5), &b, true, &builder, 30);
    assert_eq!(restored, Some(b.clone()));
    assert_eq!(
        memory.concept(&b).expect("remembered").budget.last_forget_time,
        30
    );
    let observed = kinds(&trace);
    assert_eq!(observed.iter().filter(|k| *k == "ConceptRemember").count(), 1);
    // no second ConceptNew for b
    assert_eq!(observed.iter().filter(|k| *k == "ConceptNew").count(), 3);
}

// ---------------------------------------------------------------------------
// Scenario: question answering
// ---------------------------------------------------------------------------

#[test]
fn question_is_answered_by_matching_belief() {
    let builder = DefaultConceptBuilder;
    let clock = ManualClock::starting_at(0);
    let mut deriver = CountingDeriver::default();
    let mut memory = Memory::new(scenario_config()).expect("valid config");
    let trace = record_events(&mut memory);

    let j1 = judgment(&mut memory, bird_animal(), 1.0, 0.9);
    memory.input_task(j1.clone(), &builder, clock.time());
    memory.cycle(&mut deriver, &builder, &clock);

    let q = question(
        &mut memory,
        Term::inheritance(Term::query_var("what"), Term::atom("animal")),
    );
    clock.set(1);
    memory.input_task(q.clone(), &builder, clock.time());
    memory.cycle(&mut deriver, &builder, &clock);

    assert_eq!(deriver.solutions.len(), 1, "one belief answers the question");
    let (belief, answered) = &deriver.solutions[0];
    assert_eq!(belief, &j1.sentence);
    assert_eq!(answered.sentence, q.sentence);
    assert_eq!(kinds(&trace).iter().filter(|k| *k == "Answer").count(), 1);
}

// ---------------------------------------------------------------------------
// Scenario: premise queue overflow
// ---------------------------------------------------------------------------

#[test]
fn premise_queue_evicts_the_least_promising() {
    let mut memory = Memory::new(ReasonerConfig {
        task_link_bag_size: 4,
        ..scenario_config()
    })
    .expect("valid config");

    // expectations 0.1 .. 0.6 against a unit-priority belief concept
    let truths = [
        TruthValue::new(0.0, 0.8), // e = 0.1
        TruthValue::new(0.0, 0.6), // e = 0.2
        TruthValue::new(0.0, 0.4), // e = 0.3
        TruthValue::new(0.0, 0.2), // e = 0.4
        TruthValue::new(0.5, 0.9), // e = 0.5
        TruthValue::new(1.0, 0.2), // e = 0.6
    ];
    let task = judgment(&mut memory, bird_animal(), 1.0, 0.9);
    for (i, truth) in truths.into_iter().enumerate() {
        let stamp = Stamp::from_input(memory.new_stamp_serial(), 0, Tense::Eternal, 5);
        let belief = Sentence::new(Term::atom("bird"), Punctuation::Judgment, Some(truth), stamp);
        let premise = Premise::new(
            i as u64,
            task.clone(),
            bird_animal(),
            Term::atom("bird"),
            Term::atom("bird"),
            Some(belief),
            false,
            1.0,
            4.0,
        );
        let _ = memory.premise_queue.put_in(premise);
    }

    assert_eq!(memory.premise_queue.len(), 4);
    let mut surviving: Vec<f32> = std::iter::from_fn(|| memory.premise_queue.take_highest())
        .map(|p| alann_core::Item::priority(&p))
        .collect();
    surviving.sort_by(f32::total_cmp);
    let expected = [0.3, 0.4, 0.5, 0.6];
    assert_eq!(surviving.len(), expected.len());
    for (got, want) in surviving.iter().zip(expected) {
        assert!((got - want).abs() < 1e-3, "got {got}, want {want}");
    }
}

// ---------------------------------------------------------------------------
// Scenario: forgetting monotonicity through the store
// ---------------------------------------------------------------------------

#[test]
fn repeated_reinsertion_decays_toward_the_quality_floor() {
    let builder = DefaultConceptBuilder;
    let mut memory = Memory::new(scenario_config()).expect("valid config");
    let term = Term::atom("fading");
    let _ = memory.conceptualize(BudgetValue::new(0.8, 0.5, 0.1), &term, true, &builder, 0);
    // conceptualization merged the budget; pin the starting point explicitly
    memory.concepts.mutate(&term, |c| {
        c.budget = BudgetValue::new(0.8, 0.5, 0.1);
    });

    let floor = 0.1 * memory.config.quality_rescaled;
    let mut previous = 0.8_f32;
    for step in 1..=10 {
        memory.forget_concept(&term, i64::from(step) * 5);
        let priority = memory.concept(&term).expect("still stored").budget.priority;
        assert!(priority < previous, "step {step}: {priority} !< {previous}");
        assert!(priority >= floor, "step {step}: {priority} crossed the floor");
        previous = priority;
    }
    assert!(previous - floor < 0.05, "should be converging on the floor");
}

// ---------------------------------------------------------------------------
// Snapshot round trips
// ---------------------------------------------------------------------------

#[test]
fn snapshot_round_trip_replays_identical_event_traces() {
    let builder = DefaultConceptBuilder;
    let clock = ManualClock::starting_at(0);
    let mut deriver = CountingDeriver::default();
    let mut memory = Memory::new(scenario_config()).expect("valid config");

    let j1 = judgment(&mut memory, bird_animal(), 1.0, 0.9);
    memory.input_task(j1, &builder, clock.time());
    memory.cycle(&mut deriver, &builder, &clock);

    let dir = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::open(dir.path().join("memory.db")).expect("open");
    store.save(&memory).expect("save");

    // original continues
    let original_trace = record_events(&mut memory);
    for time in [11, 25] {
        clock.set(time);
        memory.cycle(&mut deriver, &builder, &clock);
    }

    // restored copy replays the same cycles from the same state
    let mut restored = store
        .load(memory.reasoner_id)
        .expect("load")
        .expect("snapshot exists");
    let restored_trace = record_events(&mut restored);
    let replay_clock = ManualClock::starting_at(0);
    let mut replay_deriver = CountingDeriver::default();
    for time in [11, 25] {
        replay_clock.set(time);
        restored.cycle(&mut replay_deriver, &builder, &replay_clock);
    }

    assert_eq!(
        *original_trace.lock().unwrap(),
        *restored_trace.lock().unwrap(),
        "same inputs and clock must replay the same events"
    );
}

#[test]
fn store_size_never_exceeds_capacity_under_load() {
    let builder = DefaultConceptBuilder;
    let clock = ManualClock::starting_at(0);
    let mut deriver = CountingDeriver::default();
    let mut memory = Memory::new(ReasonerConfig {
        concept_bag_size: 8,
        subconscious_bag_size: 8,
        ..scenario_config()
    })
    .expect("valid config");

    for i in 0..40 {
        let term = Term::inheritance(Term::atom(&format!("s{i}")), Term::atom(&format!("p{i}")));
        let task = judgment(&mut memory, term, 1.0, 0.9);
        clock.set(i);
        memory.input_task(task, &builder, clock.time());
        memory.cycle(&mut deriver, &builder, &clock);
        assert!(memory.concepts.len() <= 8, "cycle {i} overflowed the store");
    }
}

// ---------------------------------------------------------------------------
// Operation feedback
// ---------------------------------------------------------------------------

#[test]
fn executed_operations_feed_back_as_input_judgments() {
    let builder = DefaultConceptBuilder;
    let mut memory = Memory::new(scenario_config()).expect("valid config");
    let operation = Term::operation("open", vec![Term::atom("door")]);
    memory.executed_task(operation.clone(), TruthValue::new(1.0, 0.9), &builder, 12);

    let task = memory.input_tasks.front().expect("feedback queued");
    assert!(task.is_input());
    assert!(task.sentence.is_judgment());
    assert_eq!(task.sentence.term, operation);
    assert_eq!(task.sentence.stamp.occurrence_time, 12);
    assert!(
        (task.budget.priority - memory.config.default_feedback_priority).abs() < f32::EPSILON
    );
}
