//! The subconscious overflow cache.
//!
//! Concepts displaced from the bounded store land here instead of being
//! destroyed outright, and conceptualization checks this cache before
//! building a concept from scratch. The cache is a plain LRU keyed by
//! term; it takes no part in priority selection.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::concept::Concept;
use crate::term::Term;

/// LRU cache of recently displaced concepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "SubconsciousRepr", into = "SubconsciousRepr")]
pub struct Subconscious {
    capacity: usize,
    entries: HashMap<Term, Concept>,
    order: VecDeque<Term>,
}

impl Subconscious {
    /// Create an empty cache with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Maximum number of cached concepts.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of cached concepts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a concept for `term` is cached.
    #[must_use]
    pub fn contains(&self, term: &Term) -> bool {
        self.entries.contains_key(term)
    }

    /// Cache a displaced concept, evicting the least recently touched one
    /// when full. Re-inserting an existing term refreshes its recency.
    pub fn add(&mut self, concept: Concept) {
        if self.capacity == 0 {
            return;
        }
        let term = concept.term.clone();
        if self.entries.insert(term.clone(), concept).is_some() {
            self.order.retain(|t| t != &term);
        }
        self.order.push_back(term);
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }

    /// Remove and return the concept for `term`, if cached.
    pub fn take(&mut self, term: &Term) -> Option<Concept> {
        let concept = self.entries.remove(term)?;
        self.order.retain(|t| t != term);
        Some(concept)
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

#[derive(Serialize, Deserialize)]
struct SubconsciousRepr {
    capacity: usize,
    items: Vec<Concept>,
}

impl From<SubconsciousRepr> for Subconscious {
    fn from(repr: SubconsciousRepr) -> Self {
        let mut cache = Self::new(repr.capacity);
        for concept in repr.items {
            cache.add(concept);
        }
        cache
    }
}

impl From<Subconscious> for SubconsciousRepr {
    fn from(cache: Subconscious) -> Self {
        let Subconscious {
            capacity,
            mut entries,
            order,
        } = cache;
        let mut items = Vec::with_capacity(entries.len());
        for term in &order {
            if let Some(concept) = entries.remove(term) {
                items.push(concept);
            }
        }
        Self { capacity, items }
    }
}
