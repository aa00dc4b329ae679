//! The classic probabilistic bag.
//!
//! Same bounded-container contract as [`crate::bag::PriorityMap`], but
//! `take_next` samples an item with probability proportional to priority
//! instead of always popping the maximum. Attention drivers that want
//! stochastic exploration swap this in behind the [`Bag`] trait; the
//! default cycle does not use it.

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::bag::{Bag, Insertion};
use crate::item::Item;
use crate::rng::ReasonerRng;

/// Floor weight so zero-priority items keep a nonzero selection chance.
const MIN_SELECTION_WEIGHT: f64 = 1e-3;

/// Bounded container with priority-proportional sampling.
///
/// Operations are O(n); this variant trades asymptotics for sampling
/// fairness and is meant for stores small enough that a scan is cheap.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize, V: Serialize",
    deserialize = "K: Deserialize<'de> + Clone + Eq + Hash, V: Deserialize<'de>"
))]
pub struct ClassicBag<K: Eq + Hash, V> {
    capacity: usize,
    items: Vec<V>,
    #[serde(skip)]
    index: HashMap<K, usize>,
    #[serde(skip)]
    index_dirty: bool,
}

impl<K: Clone + Eq + Hash, V: Item<K>> ClassicBag<K, V> {
    /// Create an empty bag with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: Vec::new(),
            index: HashMap::new(),
            index_dirty: false,
        }
    }

    fn rebuild_index(&mut self) {
        if !self.index_dirty && self.index.len() == self.items.len() {
            return;
        }
        self.index.clear();
        for (i, item) in self.items.iter().enumerate() {
            self.index.insert(item.name().clone(), i);
        }
        self.index_dirty = false;
    }

    fn remove_at(&mut self, position: usize) -> V {
        let item = self.items.swap_remove(position);
        self.index_dirty = true;
        item
    }

    fn weight(item: &V) -> f64 {
        f64::from(item.priority()).max(MIN_SELECTION_WEIGHT)
    }

    fn position_of_lowest(&self) -> Option<usize> {
        self.items
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.priority()
                    .partial_cmp(&b.priority())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
    }
}

impl<K: Clone + Eq + Hash, V: Item<K>> Bag<K, V> for ClassicBag<K, V> {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn put_in(&mut self, item: V) -> Insertion<V> {
        self.rebuild_index();
        if let Some(&position) = self.index.get(item.name()) {
            let old = std::mem::replace(&mut self.items[position], item);
            return Insertion::Displaced(old);
        }
        if self.capacity == 0 {
            return Insertion::Rejected(item);
        }
        let mut displaced = None;
        if self.items.len() >= self.capacity {
            if let Some(position) = self.position_of_lowest() {
                displaced = Some(self.remove_at(position));
            }
        }
        self.items.push(item);
        self.index_dirty = true;
        match displaced {
            Some(old) => Insertion::Displaced(old),
            None => Insertion::Inserted,
        }
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.items.iter().find(|item| item.name() == key)
    }

    fn take(&mut self, key: &K) -> Option<V> {
        self.rebuild_index();
        let position = self.index.get(key).copied()?;
        Some(self.remove_at(position))
    }

    fn take_highest(&mut self) -> Option<V> {
        let position = self
            .items
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                a.priority()
                    .partial_cmp(&b.priority())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)?;
        Some(self.remove_at(position))
    }

    fn take_next(&mut self, rng: &mut ReasonerRng) -> Option<V> {
        if self.items.is_empty() {
            return None;
        }
        let total: f64 = self.items.iter().map(Self::weight).sum();
        // one draw per selection, so replaying the draw count replays picks
        let mut target = rng.next_f64() * total;
        let mut position = self.items.len() - 1;
        for (i, item) in self.items.iter().enumerate() {
            target -= Self::weight(item);
            if target <= 0.0 {
                position = i;
                break;
            }
        }
        Some(self.remove_at(position))
    }

    fn clear(&mut self) {
        self.items.clear();
        self.index.clear();
        self.index_dirty = false;
    }

    fn values(&self) -> Vec<&V> {
        let mut refs: Vec<&V> = self.items.iter().collect();
        refs.sort_by(|a, b| {
            b.priority()
                .partial_cmp(&a.priority())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        refs
    }
}
