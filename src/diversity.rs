//! # Diversity Selection
//! Greedy top-K with category seeding and an optional per-category cap.
//!
//! Phase A takes the best item of each seed category in order. Phase B fills
//! the rest by score, skipping items whose primary category is already at
//! the cap. Category membership is always the item's primary category.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::item::ContentItem;

/// Primary-category counts of a selection.
pub fn category_distribution(items: &[ContentItem]) -> BTreeMap<String, usize> {
    let mut dist = BTreeMap::new();
    for it in items {
        *dist.entry(it.primary_category.clone()).or_insert(0) += 1;
    }
    dist
}

fn by_score_desc(a: &ContentItem, b: &ContentItem) -> Ordering {
    b.priority_score
        .partial_cmp(&a.priority_score)
        .unwrap_or(Ordering::Equal)
}

pub struct DiversitySelector<'a> {
    target_count: usize,
    cap: Option<usize>,
    seed_categories: &'a [String],
}

impl<'a> DiversitySelector<'a> {
    pub fn new(target_count: usize, cap: Option<usize>, seed_categories: &'a [String]) -> Self {
        Self {
            target_count,
            cap,
            seed_categories,
        }
    }

    fn within_cap(&self, counts: &HashMap<String, usize>, category: &str) -> bool {
        match self.cap {
            Some(cap) => counts.get(category).copied().unwrap_or(0) < cap,
            None => true,
        }
    }

    /// Returns the selection ordered by score, highest first (stable).
    pub fn select(&self, items: Vec<ContentItem>) -> Vec<ContentItem> {
        if self.target_count == 0 || items.is_empty() {
            return Vec::new();
        }

        let fits_cap = self.cap.map_or(true, |cap| {
            category_distribution(&items).values().all(|&n| n <= cap)
        });
        if items.len() <= self.target_count && fits_cap {
            debug!(target: "diversity", n = items.len(), "everything fits, skipping diversity");
            let mut all = items;
            all.sort_by(by_score_desc);
            return all;
        }

        let mut pool: Vec<Option<ContentItem>> = items.into_iter().map(Some).collect();
        let mut selected: Vec<ContentItem> =
            Vec::with_capacity(self.target_count.min(pool.len()));
        let mut counts: HashMap<String, usize> = HashMap::new();

        // Phase A: seeding
        for cat in self.seed_categories {
            if selected.len() >= self.target_count {
                break;
            }
            if !self.within_cap(&counts, cat) {
                continue;
            }
            let best = pool
                .iter()
                .enumerate()
                .filter_map(|(i, slot)| slot.as_ref().map(|it| (i, it)))
                .filter(|(_, it)| &it.primary_category == cat)
                // max_by keeps the last maximum; reverse the tie so the first wins.
                .max_by(|(ia, a), (ib, b)| by_score_desc(b, a).then(ib.cmp(ia)))
                .map(|(i, _)| i);
            if let Some(it) = best.and_then(|i| pool[i].take()) {
                debug!(target: "diversity", category = %cat, id = it.fingerprint(), "seeded");
                *counts.entry(it.primary_category.clone()).or_insert(0) += 1;
                selected.push(it);
            }
        }

        // Phase B: fill by score
        let mut rest: Vec<ContentItem> = pool.into_iter().flatten().collect();
        rest.sort_by(by_score_desc);
        let mut skipped = 0usize;
        for it in rest {
            if selected.len() >= self.target_count {
                break;
            }
            if !self.within_cap(&counts, &it.primary_category) {
                skipped += 1;
                continue;
            }
            *counts.entry(it.primary_category.clone()).or_insert(0) += 1;
            selected.push(it);
        }

        debug!(
            target: "diversity",
            selected = selected.len(),
            cap_skips = skipped,
            "selection complete"
        );
        selected.sort_by(by_score_desc);
        selected
    }
}
