//! Group-by counting over trip records.
//!
//! Every "most popular" statistic is an argmax over group sizes. The
//! tie-break differs per statistic, so [`GroupCounts`] keeps both the key
//! order and the order in which each key was first seen.

use std::collections::BTreeMap;

use serde::Serialize;

// ── Popular ───────────────────────────────────────────────────────────────────

/// The winning group of an argmax and its size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Popular<T> {
    pub value: T,
    pub count: usize,
}

/// One row of a value-count table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

// ── GroupCounts ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Slot {
    count: usize,
    first_seen: usize,
}

/// Occurrence counts per key.
#[derive(Debug, Clone)]
pub struct GroupCounts<K> {
    // BTreeMap keeps keys in their natural order for key-based tie-breaks.
    groups: BTreeMap<K, Slot>,
    total: usize,
}

impl<K: Ord> Default for GroupCounts<K> {
    fn default() -> Self {
        Self {
            groups: BTreeMap::new(),
            total: 0,
        }
    }
}

impl<K: Ord + Clone> GroupCounts<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `key`.
    pub fn add(&mut self, key: K) {
        let position = self.total;
        self.groups
            .entry(key)
            .or_insert(Slot {
                count: 0,
                first_seen: position,
            })
            .count += 1;
        self.total += 1;
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of occurrences added.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn get(&self, key: &K) -> usize {
        self.groups.get(key).map_or(0, |slot| slot.count)
    }

    /// Largest group; ties go to the smallest key.
    pub fn mode_by_key(&self) -> Option<Popular<K>> {
        let mut best: Option<(&K, usize)> = None;
        for (key, slot) in &self.groups {
            if best.map_or(true, |(_, count)| slot.count > count) {
                best = Some((key, slot.count));
            }
        }
        best.map(|(key, count)| Popular {
            value: key.clone(),
            count,
        })
    }

    /// Largest group; ties go to the key seen first.
    pub fn mode_by_first_seen(&self) -> Option<Popular<K>> {
        self.groups
            .iter()
            .max_by(|(_, a), (_, b)| {
                a.count
                    .cmp(&b.count)
                    .then_with(|| b.first_seen.cmp(&a.first_seen))
            })
            .map(|(key, slot)| Popular {
                value: key.clone(),
                count: slot.count,
            })
    }

    /// All groups by descending count, ties by ascending key.
    pub fn ranked(&self) -> Vec<(K, usize)> {
        let mut rows: Vec<(K, usize)> = self
            .groups
            .iter()
            .map(|(key, slot)| (key.clone(), slot.count))
            .collect();
        // Stable sort over key-ordered input keeps ascending keys on ties.
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        rows
    }
}

impl<K: Ord + Clone> FromIterator<K> for GroupCounts<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut counts = Self::new();
        for key in iter {
            counts.add(key);
        }
        counts
    }
}

impl<K: Ord + Clone + ToString> GroupCounts<K> {
    /// Value-count table with display labels, ordered like [`Self::ranked`].
    pub fn value_counts(&self) -> Vec<CategoryCount> {
        self.ranked()
            .into_iter()
            .map(|(key, count)| CategoryCount {
                label: key.to_string(),
                count,
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
