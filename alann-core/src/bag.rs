//! Bounded priority containers.
//!
//! [`PriorityMap`] is the deterministic store used for concepts, cycling
//! tasks, and pending premises: a key-indexed map paired with a rank index,
//! so lookup, removal, and highest/lowest selection are all O(log n).
//! Insertion at capacity evicts the lowest-priority element. The
//! probabilistic variant lives in [`crate::classic_bag`]; the cycle only
//! depends on the [`Bag`] trait.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::budget::apply_forgetting;
use crate::item::Item;
use crate::rng::ReasonerRng;

/// Outcome of inserting into a bounded bag.
///
/// The three cases are semantically distinct and callers must treat them
/// so: `Displaced` may return the *caller's own* item when an equal-key
/// insert replaced it, and `Rejected` always returns the incoming item.
#[derive(Debug)]
pub enum Insertion<V> {
    /// The item went in without evicting anything.
    Inserted,
    /// The item went in; the returned element was evicted to make room (or
    /// replaced under the same key).
    Displaced(V),
    /// The bag has no room at all (capacity 0); the incoming item comes
    /// straight back.
    Rejected(V),
}

impl<V> Insertion<V> {
    /// The evicted or bounced item, if any.
    #[must_use]
    pub fn into_removed(self) -> Option<V> {
        match self {
            Self::Inserted => None,
            Self::Displaced(v) | Self::Rejected(v) => Some(v),
        }
    }
}

/// The container interface the inference cycle is written against.
pub trait Bag<K, V: Item<K>> {
    /// Maximum number of items held.
    fn capacity(&self) -> usize;

    /// Current number of items.
    fn len(&self) -> usize;

    /// Whether the bag holds nothing.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert an item, evicting the lowest-priority element at capacity.
    /// An item with an already-present key replaces (and returns) the old
    /// one instead of evicting the lowest.
    fn put_in(&mut self, item: V) -> Insertion<V>;

    /// Borrow an item without touching it.
    fn get(&self, key: &K) -> Option<&V>;

    /// Remove an item by key.
    fn take(&mut self, key: &K) -> Option<V>;

    /// Remove and return the highest-priority item.
    fn take_highest(&mut self) -> Option<V>;

    /// Remove an item with probability roughly proportional to priority.
    /// Deterministic bags may fall back to [`Bag::take_highest`].
    fn take_next(&mut self, rng: &mut ReasonerRng) -> Option<V>;

    /// Apply forgetting to the item's budget, then insert it. The decay is
    /// never skipped, even when the bag has room to spare.
    fn put_back(
        &mut self,
        mut item: V,
        forget_cycles: f32,
        relative_threshold: f32,
        now: i64,
    ) -> Insertion<V> {
        apply_forgetting(item.budget_mut(), forget_cycles, relative_threshold, now);
        self.put_in(item)
    }

    /// Drop every item.
    fn clear(&mut self);

    /// All items, highest priority first.
    fn values(&self) -> Vec<&V>;
}

// ---------------------------------------------------------------------------
// PriorityMap
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Slot<V> {
    item: V,
    seq: u64,
    rank: OrderedFloat<f32>,
}

/// Bounded, key-indexed priority container.
///
/// Ties are broken by insertion sequence, which keeps eviction and
/// selection deterministic per run. Budgets of stored items are
/// immutable from the outside; every budget change goes through
/// [`Bag::put_back`] or [`PriorityMap::mutate`], both of which re-sift the
/// rank index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    bound(
        serialize = "K: Clone + Eq + Hash, V: Item<K> + Clone + Serialize",
        deserialize = "K: Clone + Eq + Hash, V: Item<K> + Deserialize<'de>"
    ),
    from = "PriorityMapRepr<V>",
    into = "PriorityMapRepr<V>"
)]
pub struct PriorityMap<K, V> {
    capacity: usize,
    next_seq: u64,
    entries: HashMap<K, Slot<V>>,
    order: BTreeSet<(OrderedFloat<f32>, u64)>,
    by_seq: HashMap<u64, K>,
}

impl<K: Clone + Eq + Hash, V: Item<K>> PriorityMap<K, V> {
    /// Create an empty map with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            next_seq: 0,
            entries: HashMap::new(),
            order: BTreeSet::new(),
            by_seq: HashMap::new(),
        }
    }

    fn insert_unchecked(&mut self, item: V) {
        let key = item.name().clone();
        let seq = self.next_seq;
        self.next_seq += 1;
        let rank = OrderedFloat(item.priority());
        self.order.insert((rank, seq));
        self.by_seq.insert(seq, key.clone());
        self.entries.insert(key, Slot { item, seq, rank });
    }

    fn remove_entry(&mut self, key: &K) -> Option<V> {
        let slot = self.entries.remove(key)?;
        self.order.remove(&(slot.rank, slot.seq));
        self.by_seq.remove(&slot.seq);
        Some(slot.item)
    }

    fn key_of_lowest(&self) -> Option<K> {
        let (_, seq) = self.order.iter().next()?;
        self.by_seq.get(seq).cloned()
    }

    fn key_of_highest(&self) -> Option<K> {
        let (_, seq) = self.order.iter().next_back()?;
        self.by_seq.get(seq).cloned()
    }

    /// Run a closure against a stored item, then re-sift its rank.
    ///
    /// This is the only sanctioned in-place mutation: the rank index is
    /// rebuilt from the (possibly changed) budget afterwards, so heap order
    /// cannot be silently corrupted. Returns whether the key was present.
    pub fn mutate(&mut self, key: &K, f: impl FnOnce(&mut V)) -> bool {
        let Some(slot) = self.entries.get_mut(key) else {
            return false;
        };
        self.order.remove(&(slot.rank, slot.seq));
        f(&mut slot.item);
        slot.rank = OrderedFloat(slot.item.priority());
        self.order.insert((slot.rank, slot.seq));
        true
    }

    /// Iterate items, highest priority first.
    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.order.iter().rev().filter_map(move |(_, seq)| {
            self.by_seq
                .get(seq)
                .and_then(|key| self.entries.get(key))
                .map(|slot| &slot.item)
        })
    }
}

impl<K: Clone + Eq + Hash, V: Item<K>> Bag<K, V> for PriorityMap<K, V> {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn put_in(&mut self, item: V) -> Insertion<V> {
        // same key: replace, regardless of capacity pressure
        if self.entries.contains_key(item.name()) {
            let key = item.name().clone();
            let old = self.remove_entry(&key);
            self.insert_unchecked(item);
            return match old {
                Some(old) => Insertion::Displaced(old),
                None => Insertion::Inserted,
            };
        }
        if self.capacity == 0 {
            return Insertion::Rejected(item);
        }
        let mut displaced = None;
        if self.entries.len() >= self.capacity {
            if let Some(lowest) = self.key_of_lowest() {
                displaced = self.remove_entry(&lowest);
            }
        }
        self.insert_unchecked(item);
        match displaced {
            Some(old) => Insertion::Displaced(old),
            None => Insertion::Inserted,
        }
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|slot| &slot.item)
    }

    fn take(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key)
    }

    fn take_highest(&mut self) -> Option<V> {
        let key = self.key_of_highest()?;
        self.remove_entry(&key)
    }

    fn take_next(&mut self, _rng: &mut ReasonerRng) -> Option<V> {
        // deterministic variant: the maximum is the sample
        self.take_highest()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.by_seq.clear();
    }

    fn values(&self) -> Vec<&V> {
        self.iter().collect()
    }
}

// ---------------------------------------------------------------------------
// Serde representation
// ---------------------------------------------------------------------------

/// Wire form of a [`PriorityMap`]: capacity plus items in ascending rank
/// order. Keys and the rank index are rebuilt on load, preserving tie order.
#[derive(Serialize, Deserialize)]
pub struct PriorityMapRepr<V> {
    capacity: usize,
    items: Vec<V>,
}

impl<K: Clone + Eq + Hash, V: Item<K>> From<PriorityMapRepr<V>> for PriorityMap<K, V> {
    fn from(repr: PriorityMapRepr<V>) -> Self {
        let mut map = Self::new(repr.capacity);
        for item in repr.items {
            let _ = map.put_in(item);
        }
        map
    }
}

impl<K: Clone + Eq + Hash, V: Item<K> + Clone> From<PriorityMap<K, V>> for PriorityMapRepr<V> {
    fn from(map: PriorityMap<K, V>) -> Self {
        let mut items: Vec<V> = Vec::with_capacity(map.len());
        for (_, seq) in &map.order {
            if let Some(slot) = map.by_seq.get(seq).and_then(|key| map.entries.get(key)) {
                items.push(slot.item.clone());
            }
        }
        Self {
            capacity: map.capacity,
            items,
        }
    }
}
