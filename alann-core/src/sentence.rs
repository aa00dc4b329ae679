//! Sentences and the tasks that carry them.
//!
//! A sentence is a term plus punctuation, truth, and stamp; a task is a
//! sentence with an attention budget. Sentence identity (term, punctuation,
//! truth, evidence) keys the cycling-task queue, so two deliveries of the
//! same content collapse onto one slot.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::budget::BudgetValue;
use crate::item::Item;
use crate::stamp::Stamp;
use crate::term::Term;
use crate::truth::TruthValue;

/// What kind of speech act a sentence is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Punctuation {
    /// `.` — a statement believed to some degree.
    Judgment,
    /// `?` — a request for the best matching judgment.
    Question,
    /// `!` — a desired state.
    Goal,
}

impl Punctuation {
    fn mark(self) -> char {
        match self {
            Self::Judgment => '.',
            Self::Question => '?',
            Self::Goal => '!',
        }
    }
}

/// A punctuated, stamped term, with truth for judgments and goals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentence {
    /// Content of the sentence.
    pub term: Term,
    /// Speech-act kind.
    pub punctuation: Punctuation,
    /// Truth value; `None` for questions.
    pub truth: Option<TruthValue>,
    /// Evidence trail.
    pub stamp: Stamp,
}

impl Sentence {
    /// Create a sentence.
    #[must_use]
    pub fn new(term: Term, punctuation: Punctuation, truth: Option<TruthValue>, stamp: Stamp) -> Self {
        Self {
            term,
            punctuation,
            truth,
            stamp,
        }
    }

    /// Whether this is a judgment.
    #[must_use]
    pub fn is_judgment(&self) -> bool {
        self.punctuation == Punctuation::Judgment
    }

    /// Whether this is a question.
    #[must_use]
    pub fn is_question(&self) -> bool {
        self.punctuation == Punctuation::Question
    }

    /// Whether this sentence holds timelessly.
    #[must_use]
    pub fn is_eternal(&self) -> bool {
        self.stamp.is_eternal()
    }
}

impl PartialEq for Sentence {
    /// Identity is content identity: term, punctuation, truth, and evidence;
    /// the stamp's creation time is bookkeeping, not identity.
    fn eq(&self, other: &Self) -> bool {
        self.term == other.term
            && self.punctuation == other.punctuation
            && self.truth == other.truth
            && self.stamp.equals_evidence(&other.stamp)
    }
}

impl Eq for Sentence {}

impl Hash for Sentence {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.term.hash(state);
        self.punctuation.hash(state);
        self.truth.hash(state);
        self.stamp.occurrence_time.hash(state);
        self.stamp.evidential_base.hash(state);
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.term, self.punctuation.mark())?;
        if let Some(truth) = &self.truth {
            write!(f, " {truth}")?;
        }
        Ok(())
    }
}

/// Where a task entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskSource {
    /// From an input channel or operation feedback.
    Input,
    /// Produced by the rule table.
    Derived,
}

/// A budgeted unit of work for the reasoner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// The sentence this task processes.
    pub sentence: Sentence,
    /// Attention budget.
    pub budget: BudgetValue,
    /// Provenance.
    pub source: TaskSource,
}

impl Task {
    /// Create a task.
    #[must_use]
    pub fn new(sentence: Sentence, budget: BudgetValue, source: TaskSource) -> Self {
        Self {
            sentence,
            budget,
            source,
        }
    }

    /// The task's term.
    #[must_use]
    pub fn term(&self) -> &Term {
        &self.sentence.term
    }

    /// Whether the task came from outside the reasoner.
    #[must_use]
    pub fn is_input(&self) -> bool {
        self.source == TaskSource::Input
    }
}

impl Item<Sentence> for Task {
    fn name(&self) -> &Sentence {
        &self.sentence
    }

    fn budget(&self) -> &BudgetValue {
        &self.budget
    }

    fn budget_mut(&mut self) -> &mut BudgetValue {
        &mut self.budget
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sentence)
    }
}
