use std::collections::{HashMap, HashSet};

use crate::models::{Deal, Zone};

/// Per-zone memory of deal ids that have already been announced.
///
/// Entries are never removed and nothing is persisted, so a new store
/// (i.e. a process restart) announces every currently qualifying deal again.
#[derive(Debug, Default)]
pub struct ZoneDedupStore {
    seen: HashMap<Zone, HashSet<String>>,
}

impl ZoneDedupStore {
    /// Create a store with an empty set for each configured zone.
    pub fn new<'a>(zones: impl IntoIterator<Item = &'a Zone>) -> Self {
        let seen = zones
            .into_iter()
            .map(|zone| (zone.clone(), HashSet::new()))
            .collect();
        Self { seen }
    }

    pub fn is_new(&self, zone: &Zone, id: &str) -> bool {
        self.seen
            .get(zone)
            .map_or(true, |ids| !ids.contains(id))
    }

    /// Record `id` as announced for `zone`. Returns `false` if it already was.
    pub fn mark_seen(&mut self, zone: &Zone, id: &str) -> bool {
        self.seen
            .entry(zone.clone())
            .or_default()
            .insert(id.to_string())
    }

    /// Check-then-mark a batch in order and return the deals not seen before.
    /// Each id is marked as soon as it is kept, so repeats within `deals` are
    /// dropped too.
    pub fn retain_new(&mut self, zone: &Zone, deals: Vec<Deal>) -> Vec<Deal> {
        let ids = self.seen.entry(zone.clone()).or_default();
        deals
            .into_iter()
            .filter(|deal| ids.insert(deal.id().to_string()))
            .collect()
    }

    pub fn seen_count(&self, zone: &Zone) -> usize {
        self.seen.get(zone).map_or(0, HashSet::len)
    }

    pub fn total_seen(&self) -> usize {
        self.seen.values().map(HashSet::len).sum()
    }
}
