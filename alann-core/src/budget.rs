//! Budget values and the attention arithmetic over them.
//!
//! A budget is the whole attention interface of an item: priority orders
//! the bags, durability slows forgetting, quality is the floor priority can
//! never decay through. Activation merges an incoming budget into a stored
//! one; forgetting decays priority on every reinsertion.

use serde::{Deserialize, Serialize};

use crate::sentence::Sentence;

/// `(priority, durability, quality)` plus the forgetting clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetValue {
    /// How urgent the item is right now.
    pub priority: f32,
    /// How slowly priority decays, in [0, 1].
    pub durability: f32,
    /// Long-term usefulness; the relative floor for decay.
    pub quality: f32,
    /// Cycle at which forgetting was last applied. Negative until the first
    /// application; monotonically non-decreasing afterwards.
    pub last_forget_time: i64,
}

impl BudgetValue {
    /// Create a budget with all three components clamped to [0, 1].
    #[must_use]
    pub fn new(priority: f32, durability: f32, quality: f32) -> Self {
        Self {
            priority: priority.clamp(0.0, 1.0),
            durability: durability.clamp(0.0, 1.0),
            quality: quality.clamp(0.0, 1.0),
            last_forget_time: -1,
        }
    }

    /// Geometric mean of the three components, the scalar used for noise
    /// thresholds and output gating.
    #[must_use]
    pub fn summary(&self) -> f32 {
        (self.priority * self.durability * self.quality).cbrt()
    }

    /// Whether the summary clears the configured noise floor.
    #[must_use]
    pub fn above_threshold(&self, noise_floor: f32) -> bool {
        self.summary() >= noise_floor
    }
}

/// Probabilistic-or of two unit-interval values. Never below either operand.
#[must_use]
pub fn or(a: f32, b: f32) -> f32 {
    1.0 - (1.0 - a) * (1.0 - b)
}

/// How an incoming budget is merged into a stored one.
///
/// Each mode is a deterministic pure function of the two triples. All modes
/// raise priority to at least the max of the operands, move durability
/// toward the stronger operand, and leave quality untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationMode {
    /// Or-combined priority, averaged durability. The general-purpose merge.
    Classic,
    /// Component-wise maximum. Used when re-activating from the cache.
    Max,
    /// Or-combined priority, maximum durability. Used when a task touches
    /// its concept.
    TaskLink,
}

/// Merge `incoming` into `target` under the given mode.
pub fn activate(target: &mut BudgetValue, incoming: &BudgetValue, mode: ActivationMode) {
    match mode {
        ActivationMode::Classic => {
            target.priority = or(target.priority, incoming.priority);
            target.durability = (target.durability + incoming.durability) / 2.0;
        }
        ActivationMode::Max => {
            target.priority = target.priority.max(incoming.priority);
            target.durability = target.durability.max(incoming.durability);
        }
        ActivationMode::TaskLink => {
            target.priority = or(target.priority, incoming.priority);
            target.durability = target.durability.max(incoming.durability);
        }
    }
}

/// Decay `budget.priority` toward its quality floor.
///
/// The floor is `quality * relative_threshold`; the surplus above it decays
/// by `durability ^ (dt / forget_cycles)` where `dt` is the cycle delta
/// since the last application, never less than one step so that every
/// reinsertion pays a decay. Priority never crosses the floor and
/// `last_forget_time` never moves backwards.
pub fn apply_forgetting(budget: &mut BudgetValue, forget_cycles: f32, relative_threshold: f32, now: i64) {
    let dt = if budget.last_forget_time < 0 {
        1
    } else {
        now.saturating_sub(budget.last_forget_time).max(1)
    };
    budget.last_forget_time = budget.last_forget_time.max(now);

    let floor = budget.quality * relative_threshold;
    if budget.priority <= floor {
        return;
    }
    let factor = budget.durability.powf(dt as f32 / forget_cycles);
    budget.priority = floor + (budget.priority - floor) * factor;
}

/// Rank of a judgment in a belief table: truth expectation.
///
/// Recency enters through insertion order, not the rank itself: at equal
/// rank the newer belief is placed first.
#[must_use]
pub fn rank_belief(sentence: &Sentence) -> f32 {
    sentence
        .truth
        .as_ref()
        .map_or(0.0, crate::truth::TruthValue::expectation)
}
