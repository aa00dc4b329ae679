//! Configuration for the ALANN reasoner.
//!
//! All attention parameters live here and are loadable from TOML. Every
//! field has a serde default so partial config files work; `validate()`
//! rejects out-of-range values fatally before a [`crate::memory::Memory`]
//! is ever built.

use serde::{Deserialize, Serialize};

use crate::error::{AlannError, Result};

/// Reasoner parameters controlling attention, forgetting, and cycle budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonerConfig {
    /// Capacity of the concept store.
    #[serde(default = "default_concept_bag_size")]
    pub concept_bag_size: usize,
    /// Capacity of the cycling-task queue and the premise queue.
    #[serde(default = "default_task_link_bag_size")]
    pub task_link_bag_size: usize,
    /// Beliefs retained per concept.
    #[serde(default = "default_concept_beliefs_max")]
    pub concept_beliefs_max: usize,
    /// Capacity of the subconscious overflow cache. 0 disables the cache.
    #[serde(default = "default_subconscious_bag_size")]
    pub subconscious_bag_size: usize,
    /// Decay durations applied when a concept is reinserted.
    #[serde(default = "default_concept_forget_durations")]
    pub concept_forget_durations: f32,
    /// Decay durations applied when a task or premise is reinserted.
    #[serde(default = "default_tasklink_forget_durations")]
    pub tasklink_forget_durations: f32,
    /// Minimum cycles between two firings of the same concept.
    #[serde(default = "default_novelty_horizon")]
    pub novelty_horizon: i64,
    /// Temporal anchors drained per cycle.
    #[serde(default = "default_sequence_bag_attempts")]
    pub sequence_bag_attempts: usize,
    /// Tasks fired per cycle.
    #[serde(default = "default_tasks_max_fired")]
    pub tasks_max_fired: usize,
    /// Premise records executed per cycle.
    #[serde(default = "default_premises_max_fired")]
    pub premises_max_fired: usize,
    /// Cycles per logical duration.
    #[serde(default = "default_duration")]
    pub duration: u32,
    /// Output reporting threshold, 0-100. 0 reports nothing below a full
    /// budget summary, 100 reports everything.
    #[serde(default)]
    pub volume: u32,
    /// Quality floor multiplier used by forgetting.
    #[serde(default = "default_quality_rescaled")]
    pub quality_rescaled: f32,
    /// Noise floor compared against the budget summary by
    /// `BudgetValue::above_threshold`.
    #[serde(default = "default_budget_threshold")]
    pub budget_threshold: f32,
    /// Priority assigned to operation-feedback tasks.
    #[serde(default = "default_feedback_priority")]
    pub default_feedback_priority: f32,
    /// Durability assigned to operation-feedback tasks.
    #[serde(default = "default_feedback_durability")]
    pub default_feedback_durability: f32,
    /// Maximum evidential-base length kept after a stamp merge.
    #[serde(default = "default_max_evidence_length")]
    pub max_evidence_length: usize,
    /// Seed for the per-reasoner RNG (probabilistic bag sampling).
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            concept_bag_size: default_concept_bag_size(),
            task_link_bag_size: default_task_link_bag_size(),
            concept_beliefs_max: default_concept_beliefs_max(),
            subconscious_bag_size: default_subconscious_bag_size(),
            concept_forget_durations: default_concept_forget_durations(),
            tasklink_forget_durations: default_tasklink_forget_durations(),
            novelty_horizon: default_novelty_horizon(),
            sequence_bag_attempts: default_sequence_bag_attempts(),
            tasks_max_fired: default_tasks_max_fired(),
            premises_max_fired: default_premises_max_fired(),
            duration: default_duration(),
            volume: 0,
            quality_rescaled: default_quality_rescaled(),
            budget_threshold: default_budget_threshold(),
            default_feedback_priority: default_feedback_priority(),
            default_feedback_durability: default_feedback_durability(),
            max_evidence_length: default_max_evidence_length(),
            random_seed: default_random_seed(),
        }
    }
}

impl ReasonerConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns [`AlannError::Serialization`] if the TOML is invalid, or
    /// [`AlannError::ParameterOutOfRange`] if a value fails validation.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| AlannError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if a value
    /// fails validation.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check every parameter against its legal range.
    ///
    /// # Errors
    /// Returns [`AlannError::ParameterOutOfRange`] naming the first bad
    /// parameter.
    pub fn validate(&self) -> Result<()> {
        fn unit_interval(name: &str, value: f32) -> Result<()> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(AlannError::ParameterOutOfRange {
                    name: name.to_string(),
                    value: f64::from(value),
                    expected: "0.0 ..= 1.0".to_string(),
                })
            }
        }

        if self.volume > 100 {
            return Err(AlannError::ParameterOutOfRange {
                name: "volume".to_string(),
                value: f64::from(self.volume),
                expected: "0 ..= 100".to_string(),
            });
        }
        if self.duration == 0 {
            return Err(AlannError::ParameterOutOfRange {
                name: "duration".to_string(),
                value: 0.0,
                expected: ">= 1".to_string(),
            });
        }
        if self.novelty_horizon < 0 {
            return Err(AlannError::ParameterOutOfRange {
                name: "novelty_horizon".to_string(),
                value: self.novelty_horizon as f64,
                expected: ">= 0".to_string(),
            });
        }
        if self.concept_forget_durations <= 0.0 {
            return Err(AlannError::ParameterOutOfRange {
                name: "concept_forget_durations".to_string(),
                value: f64::from(self.concept_forget_durations),
                expected: "> 0.0".to_string(),
            });
        }
        if self.tasklink_forget_durations <= 0.0 {
            return Err(AlannError::ParameterOutOfRange {
                name: "tasklink_forget_durations".to_string(),
                value: f64::from(self.tasklink_forget_durations),
                expected: "> 0.0".to_string(),
            });
        }
        unit_interval("quality_rescaled", self.quality_rescaled)?;
        unit_interval("budget_threshold", self.budget_threshold)?;
        unit_interval("default_feedback_priority", self.default_feedback_priority)?;
        unit_interval("default_feedback_durability", self.default_feedback_durability)?;
        Ok(())
    }

    /// Convert logical durations to cycles.
    #[must_use]
    pub fn cycles(&self, durations: f32) -> f32 {
        self.duration as f32 * durations
    }

    /// The noise level implied by `volume`: budget summaries below this are
    /// not reported.
    #[must_use]
    pub fn noise_level(&self) -> f32 {
        1.0 - (self.volume as f32 / 100.0)
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_concept_bag_size() -> usize { 10_000 }
fn default_task_link_bag_size() -> usize { 4_000 }
fn default_concept_beliefs_max() -> usize { 28 }
fn default_subconscious_bag_size() -> usize { 10_000 }
fn default_concept_forget_durations() -> f32 { 2.0 }
fn default_tasklink_forget_durations() -> f32 { 4.0 }
fn default_novelty_horizon() -> i64 { 10 }
fn default_sequence_bag_attempts() -> usize { 10 }
fn default_tasks_max_fired() -> usize { 1 }
fn default_premises_max_fired() -> usize { 8 }
fn default_duration() -> u32 { 5 }
fn default_quality_rescaled() -> f32 { 0.1 }
fn default_budget_threshold() -> f32 { 0.01 }
fn default_feedback_priority() -> f32 { 0.9 }
fn default_feedback_durability() -> f32 { 0.5 }
fn default_max_evidence_length() -> usize { 20 }
fn default_random_seed() -> u64 { 1 }
