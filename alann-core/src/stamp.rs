//! Evidence stamps.
//!
//! A stamp records when a sentence was created, when it is about
//! (occurrence), and which input evidence it rests on. The evidential base
//! is the circularity guard: two premises whose bases overlap must not be
//! combined, a check the deriver performs with [`Stamp::overlaps`].

use serde::{Deserialize, Serialize};

/// Occurrence-time marker for sentences that hold timelessly.
pub const ETERNAL: i64 = i64::MIN;

/// Creation-time marker for tasks whose stamp has not been timed yet.
pub const UNSTAMPED: i64 = -1;

/// One unit of input evidence: which reasoner saw it, and its serial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BaseEntry {
    /// Identity of the reasoner that produced the evidence.
    pub reasoner_id: i64,
    /// Monotonic serial issued by that reasoner.
    pub serial: u64,
}

/// Tense of an input sentence relative to the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tense {
    /// Not bound to any time.
    Eternal,
    /// One duration before now.
    Past,
    /// Now.
    Present,
    /// One duration after now.
    Future,
}

/// Evidence-trail metadata attached to every sentence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stamp {
    /// Cycle at which the sentence entered the system. [`UNSTAMPED`] until
    /// input processing assigns it.
    pub creation_time: i64,
    /// Cycle the sentence is about, or [`ETERNAL`].
    pub occurrence_time: i64,
    /// Evidence serials this sentence rests on, newest first.
    pub evidential_base: Vec<BaseEntry>,
}

impl Stamp {
    /// Stamp for a fresh input sentence from a single evidence serial.
    #[must_use]
    pub fn from_input(entry: BaseEntry, now: i64, tense: Tense, duration: u32) -> Self {
        let occurrence_time = match tense {
            Tense::Eternal => ETERNAL,
            Tense::Past => now - i64::from(duration),
            Tense::Present => now,
            Tense::Future => now + i64::from(duration),
        };
        Self {
            creation_time: now,
            occurrence_time,
            evidential_base: vec![entry],
        }
    }

    /// Whether the sentence holds timelessly.
    #[must_use]
    pub fn is_eternal(&self) -> bool {
        self.occurrence_time == ETERNAL
    }

    /// A copy of this stamp re-created at `now`, evidence unchanged.
    #[must_use]
    pub fn retimed(&self, now: i64) -> Self {
        Self {
            creation_time: now,
            ..self.clone()
        }
    }

    /// Merge the stamps of a premise pair into a derivation stamp.
    ///
    /// Bases are interleaved (task evidence first) and truncated to `cap`
    /// entries; the occurrence time is the task's, since the task premise
    /// anchors the derivation in time.
    #[must_use]
    pub fn merge(task: &Stamp, belief: &Stamp, now: i64, cap: usize) -> Self {
        let mut base = Vec::with_capacity(cap.min(
            task.evidential_base.len() + belief.evidential_base.len(),
        ));
        let mut a = task.evidential_base.iter();
        let mut b = belief.evidential_base.iter();
        loop {
            let x = a.next();
            let y = b.next();
            if x.is_none() && y.is_none() {
                break;
            }
            if let Some(entry) = x {
                base.push(*entry);
            }
            if let Some(entry) = y {
                base.push(*entry);
            }
        }
        base.truncate(cap);
        Self {
            creation_time: now,
            occurrence_time: task.occurrence_time,
            evidential_base: base,
        }
    }

    /// Whether two stamps share any evidence serial.
    #[must_use]
    pub fn overlaps(&self, other: &Stamp) -> bool {
        self.evidential_base
            .iter()
            .any(|entry| other.evidential_base.contains(entry))
    }

    /// Evidence-level equality: same occurrence and same base, creation
    /// time ignored. Used for belief deduplication.
    #[must_use]
    pub fn equals_evidence(&self, other: &Stamp) -> bool {
        self.occurrence_time == other.occurrence_time
            && self.evidential_base == other.evidential_base
    }
}
