//! Stable facility ordering for presentation.

use crate::schema::EventRecord;
use std::collections::HashMap;

/// Orders a store's facilities by descending total event-ledger revenue.
///
/// Ties keep the order in which facilities were first encountered in the
/// event ledger, so the ordering is fully deterministic across runs. Pure
/// function of its inputs.
pub fn rank_facilities(events: &[EventRecord], store: &str) -> Vec<String> {
    let mut totals: Vec<(String, i64)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for event in events.iter().filter(|e| e.store == store) {
        match index.get(&event.facility) {
            Some(&i) => totals[i].1 += event.revenue,
            None => {
                index.insert(event.facility.clone(), totals.len());
                totals.push((event.facility.clone(), event.revenue));
            }
        }
    }

    // sort_by_key is stable, so equal totals preserve discovery order.
    totals.sort_by_key(|(_, revenue)| std::cmp::Reverse(*revenue));
    totals.into_iter().map(|(name, _)| name).collect()
}
