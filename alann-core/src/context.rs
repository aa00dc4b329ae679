//! Per-premise derivation scratch-pad.

use crate::interfaces::ConceptBuilder;
use crate::sentence::{Sentence, Task};
use crate::stamp::Stamp;
use crate::term::Term;

/// Everything a deriver needs while executing one premise: the current
/// task, term, concept, belief, the pre-merged stamp for derivations, the
/// cycle timestamp, and the concept builder so derived tasks can be
/// conceptualized on re-entry.
pub struct DerivationContext<'a> {
    /// The task under derivation.
    pub current_task: Task,
    /// Canonical term of the task's concept.
    pub current_term: Term,
    /// Term of the belief concept the premise went through.
    pub current_concept: Term,
    /// The belief side of the premise, if any.
    pub current_belief: Option<Sentence>,
    /// Stamp for sentences derived from this premise: the merged task and
    /// belief evidence, or the task's evidence retimed for a virtual
    /// premise.
    pub new_stamp: Stamp,
    /// The cycle timestamp the premise executes at.
    pub now: i64,
    /// Builder for concepts created during task re-entry.
    pub builder: &'a dyn ConceptBuilder,
}
