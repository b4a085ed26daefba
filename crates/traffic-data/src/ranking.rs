//! Grouped counts and sums with stable top-N selection.

use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;

/// One entry of a grouped series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupValue<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> GroupValue<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

#[derive(Debug, Clone)]
struct Slot<K> {
    key: K,
    count: u64,
    sum: f64,
}

/// Accumulates per-key counts and sums, remembering first-encounter order.
///
/// Rankings sort descending with a stable sort, so ties keep the order in
/// which keys were first seen.
#[derive(Debug, Clone)]
pub struct GroupTally<K> {
    slots: Vec<Slot<K>>,
    index: HashMap<K, usize>,
}

impl<K> Default for GroupTally<K> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Clone + Eq + Hash> GroupTally<K> {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, key: &K) -> &mut Slot<K> {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                self.slots.push(Slot {
                    key: key.clone(),
                    count: 0,
                    sum: 0.0,
                });
                self.index.insert(key.clone(), self.slots.len() - 1);
                self.slots.len() - 1
            }
        };
        &mut self.slots[idx]
    }

    /// Count one occurrence of `key`, adding `amount` to its sum when known.
    pub fn add(&mut self, key: &K, amount: Option<f64>) {
        let slot = self.slot(key);
        slot.count += 1;
        if let Some(amount) = amount {
            slot.sum += amount;
        }
    }

    /// Number of distinct keys.
    pub fn unique(&self) -> usize {
        self.slots.len()
    }

    /// Top `n` keys by occurrence count.
    pub fn by_count(&self, n: usize) -> Vec<GroupValue<K, u64>> {
        let mut ranked: Vec<&Slot<K>> = self.slots.iter().collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked
            .into_iter()
            .take(n)
            .map(|s| GroupValue::new(s.key.clone(), s.count))
            .collect()
    }

    /// Top `n` keys by summed amount.
    pub fn by_sum(&self, n: usize) -> Vec<GroupValue<K, f64>> {
        let mut ranked: Vec<&Slot<K>> = self.slots.iter().collect();
        ranked.sort_by(|a, b| b.sum.total_cmp(&a.sum));
        ranked
            .into_iter()
            .take(n)
            .map(|s| GroupValue::new(s.key.clone(), s.sum))
            .collect()
    }
}
