//! Reconciliation of the two ledgers onto one set of canonical identities
//! and one shared observation window.
//!
//! The billing ledger names stores by their channel-side facility labels, so
//! its records are re-keyed through the alias table before any aggregation.
//! The event ledger defines the cutoff date (its maximum valid date); billing
//! records dated after the cutoff are sync artifacts and are dropped.

use crate::calendar::{trailing_months, MonthKey};
use crate::error::{ReconcileError, Result};
use crate::ingestion::{ingest_events, ingest_ledger};
use crate::normalize::{canonical_key, ChannelRules};
use crate::schema::{AliasRow, EventRecord, LedgerRecord, ReportInput};
use chrono::NaiveDate;
use log::{debug, info};
use std::collections::BTreeMap;

/// Number of month buckets in every aggregation window.
pub const WINDOW_MONTHS: usize = 13;

/// Many-to-one alias lookup between channel-side facility labels and
/// canonical store names. Both sides are stored canonicalized.
#[derive(Debug, Clone, Default)]
pub struct NameMap {
    forward: BTreeMap<String, String>,
    reverse: BTreeMap<String, Vec<String>>,
}

impl NameMap {
    pub fn from_rows(rows: &[AliasRow]) -> Self {
        let mut map = NameMap::default();
        for row in rows {
            let alias = canonical_key(&row.channel_side_name);
            let store = canonical_key(&row.canonical_store);
            if alias.is_empty() || store.is_empty() {
                continue;
            }
            map.reverse
                .entry(store.clone())
                .or_default()
                .push(alias.clone());
            map.forward.insert(alias, store);
        }
        map
    }

    /// Resolves a raw label to its canonical store name. Unmapped labels pass
    /// through as their own canonical key; the business may have untagged
    /// stores and that is not an error.
    pub fn canonical_for(&self, raw: &str) -> String {
        let key = canonical_key(raw);
        self.forward.get(&key).cloned().unwrap_or(key)
    }

    /// All channel-side aliases registered for a canonical store.
    pub fn aliases_of(&self, store: &str) -> &[String] {
        self.reverse
            .get(&canonical_key(store))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

/// The immutable per-run temporal context: computed once from the event
/// ledger and threaded into every aggregation and milestone call.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub cutoff_date: NaiveDate,
    pub months: Vec<MonthKey>,
    pub channel_rules: ChannelRules,
}

impl ReportContext {
    pub fn from_events(events: &[EventRecord], channel_rules: ChannelRules) -> Result<Self> {
        let cutoff_date = events
            .iter()
            .map(|e| e.date)
            .max()
            .ok_or(ReconcileError::NoValidEventDates)?;

        Ok(Self {
            cutoff_date,
            months: trailing_months(cutoff_date, WINDOW_MONTHS),
            channel_rules,
        })
    }

    /// The bucket containing the cutoff date.
    pub fn current_month(&self) -> MonthKey {
        self.months[self.months.len() - 1]
    }

    /// The reference previous month (second-to-last bucket), the only
    /// historical bucket eligible for zero-backfill.
    pub fn previous_month(&self) -> MonthKey {
        self.months[self.months.len() - 2]
    }
}

/// One immutable reconciled snapshot, ready for aggregation.
#[derive(Debug, Clone)]
pub struct ReconciledData {
    pub context: ReportContext,
    /// Event records with canonical store/facility names and classified
    /// channels.
    pub events: Vec<EventRecord>,
    /// Billing records re-keyed to canonical store names and clipped to the
    /// cutoff date.
    pub ledger: Vec<LedgerRecord>,
    /// Canonical store names in presentation order.
    pub stores: Vec<String>,
    pub name_map: NameMap,
}

/// Runs the full reconciliation pass over one input snapshot.
pub fn reconcile(input: &ReportInput, channel_rules: ChannelRules) -> Result<ReconciledData> {
    let name_map = NameMap::from_rows(&input.aliases);

    let mut events = ingest_events(&input.events);
    for event in &mut events {
        event.store = canonical_key(&event.store);
        event.facility = canonical_key(&event.facility);
        event.channel = channel_rules.classify(&event.channel);
    }

    let context = ReportContext::from_events(&events, channel_rules)?;
    info!(
        "reconcile: cutoff {} (current bucket {})",
        context.cutoff_date,
        context.current_month()
    );

    let raw_ledger = ingest_ledger(&input.billing);
    let before = raw_ledger.len();
    let mut ledger: Vec<LedgerRecord> = raw_ledger
        .into_iter()
        .filter(|r| r.date <= context.cutoff_date)
        .collect();
    if ledger.len() < before {
        debug!(
            "reconcile: clipped {} billing records dated after cutoff",
            before - ledger.len()
        );
    }
    for record in &mut ledger {
        record.store = name_map.canonical_for(&record.store);
    }

    let mut stores = Vec::new();
    for raw in &input.store_order {
        let name = canonical_key(raw);
        if !name.is_empty() && !stores.contains(&name) {
            stores.push(name);
        }
    }
    if stores.is_empty() {
        return Err(ReconcileError::EmptyStoreOrder);
    }

    Ok(ReconciledData {
        context,
        events,
        ledger,
        stores,
        name_map,
    })
}
