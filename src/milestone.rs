//! Day-granular cumulative progress within each month bucket.
//!
//! For every bucket the calculator builds the full day calendar from the 1st
//! through the month end (or the cutoff date for the current, partial month),
//! accumulates the store component (billing base categories plus in-house
//! event revenue) and the external component (non-primary event revenue), and
//! samples the running totals at fixed day offsets. An offset whose target
//! day has not happened yet is reported as unavailable, never as zero: a
//! `None` milestone means "no data yet", a `Some(0)` means "zero revenue".

use crate::calendar::{days_between, MonthKey};
use crate::reconcile::ReconciledData;
use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The fixed day-of-month checkpoints, before clamping to month length. Each
/// bucket additionally gets one sample at its end date.
pub const MILESTONE_DAYS: [u32; 5] = [5, 10, 15, 20, 25];

/// Number of samples per bucket: the fixed checkpoints plus the period end.
pub const MILESTONE_SLOTS: usize = MILESTONE_DAYS.len() + 1;

/// Cumulative milestone samples for one (store, bucket). `None` marks an
/// offset past the bucket's end date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MilestoneMonth {
    pub month: MonthKey,
    /// Billing base categories plus primary-channel event revenue.
    pub store: Vec<Option<i64>>,
    /// Non-primary-channel event revenue.
    pub external: Vec<Option<i64>>,
    /// Element-wise sum of the two components.
    pub total: Vec<Option<i64>>,
}

/// Milestone scope: one store, or the whole business.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilestoneScope<'a> {
    Global,
    Store(&'a str),
}

impl MilestoneScope<'_> {
    fn matches(&self, store: &str) -> bool {
        match self {
            MilestoneScope::Global => true,
            MilestoneScope::Store(name) => store == *name,
        }
    }
}

/// Computes the milestone series for every bucket in the window.
pub fn milestone_series(data: &ReconciledData, scope: MilestoneScope<'_>) -> Vec<MilestoneMonth> {
    let context = &data.context;
    let rules = &context.channel_rules;
    let current = context.current_month();

    // Daily component sums over the whole window, keyed by date.
    let mut daily_store: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    let mut daily_external: BTreeMap<NaiveDate, i64> = BTreeMap::new();

    for record in data.ledger.iter().filter(|r| scope.matches(&r.store)) {
        *daily_store.entry(record.date).or_default() += record.base_total();
    }
    for event in data.events.iter().filter(|e| scope.matches(&e.store)) {
        if rules.is_primary(&event.channel) {
            *daily_store.entry(event.date).or_default() += event.revenue;
        } else {
            *daily_external.entry(event.date).or_default() += event.revenue;
        }
    }

    let mut series = Vec::with_capacity(context.months.len());
    for &month in &context.months {
        let end_date = if month == current {
            context.cutoff_date
        } else {
            month.last_day()
        };

        // Running cumulative sums over the bucket's day calendar.
        let mut cum_store = Vec::new();
        let mut cum_external = Vec::new();
        let mut run_store = 0i64;
        let mut run_external = 0i64;
        let days = days_between(month.first_day(), end_date);
        for day in &days {
            run_store += daily_store.get(day).copied().unwrap_or(0);
            run_external += daily_external.get(day).copied().unwrap_or(0);
            cum_store.push(run_store);
            cum_external.push(run_external);
        }

        let last_day = month.last_day().day();
        let mut store = Vec::with_capacity(MILESTONE_SLOTS);
        let mut external = Vec::with_capacity(MILESTONE_SLOTS);
        let mut total = Vec::with_capacity(MILESTONE_SLOTS);

        for &offset in &MILESTONE_DAYS {
            let target_day = offset.min(last_day);
            if target_day as usize <= days.len() {
                let idx = target_day as usize - 1;
                store.push(Some(cum_store[idx]));
                external.push(Some(cum_external[idx]));
                total.push(Some(cum_store[idx] + cum_external[idx]));
            } else {
                // The day has not happened yet in the current partial month.
                store.push(None);
                external.push(None);
                total.push(None);
            }
        }

        // Period-end sample, always available.
        let last_idx = days.len() - 1;
        store.push(Some(cum_store[last_idx]));
        external.push(Some(cum_external[last_idx]));
        total.push(Some(cum_store[last_idx] + cum_external[last_idx]));

        series.push(MilestoneMonth {
            month,
            store,
            external,
            total,
        });
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::ChannelRules;
    use crate::reconcile::reconcile;
    use crate::schema::{RawEventRow, RawLedgerRow, ReportInput};

    fn event_row(date: &str, channel: &str, revenue: &str) -> RawEventRow {
        RawEventRow {
            date: date.to_string(),
            store: "Central".to_string(),
            facility: "Room A".to_string(),
            channel: channel.to_string(),
            revenue: revenue.to_string(),
            bookings: "1".to_string(),
        }
    }

    fn ledger_row(date: &str, usage: &str) -> RawLedgerRow {
        RawLedgerRow {
            date: date.to_string(),
            store: "Central".to_string(),
            monthly_contract: "0".to_string(),
            revenue_share: "0".to_string(),
            other_fee: "0".to_string(),
            usage_fee: usage.to_string(),
            facility_booking: "0".to_string(),
            external_channel: "0".to_string(),
        }
    }

    fn reconciled(events: Vec<RawEventRow>, billing: Vec<RawLedgerRow>) -> crate::reconcile::ReconciledData {
        let input = ReportInput {
            events,
            store_order: vec!["Central".to_string()],
            aliases: vec![],
            billing,
        };
        reconcile(&input, ChannelRules::default()).unwrap()
    }

    #[test]
    fn test_progress_scenario_with_unavailable_offsets() {
        // Cutoff 2024-03-18: primary 1,000 on day 3, external 2,000 on day 10.
        let data = reconciled(
            vec![
                event_row("2024-03-03", "Roomly", "1000"),
                event_row("2024-03-10", "Instabase", "2000"),
                event_row("2024-03-18", "Roomly", "0"),
            ],
            vec![],
        );
        let series = milestone_series(&data, MilestoneScope::Store("Central"));
        let current = series.last().unwrap();

        // ~5: only the day-3 primary booking has landed
        assert_eq!(current.store[0], Some(1000));
        assert_eq!(current.external[0], Some(0));
        // ~15: both bookings
        assert_eq!(current.store[2], Some(1000));
        assert_eq!(current.external[2], Some(2000));
        assert_eq!(current.total[2], Some(3000));
        // ~20 and ~25 exceed the cutoff date: unavailable, not zero
        assert_eq!(current.total[3], None);
        assert_eq!(current.total[4], None);
        // Period end = cutoff date
        assert_eq!(current.total[5], Some(3000));
    }

    #[test]
    fn test_base_categories_feed_store_component() {
        let data = reconciled(
            vec![event_row("2024-03-18", "Roomly", "100")],
            vec![ledger_row("2024-03-02", "400")],
        );
        let series = milestone_series(&data, MilestoneScope::Store("Central"));
        let current = series.last().unwrap();

        // Day 5 cumulative: billing base 400, no event yet
        assert_eq!(current.store[0], Some(400));
        // Period end: 400 base + 100 primary event
        assert_eq!(current.store[5], Some(500));
        assert_eq!(current.external[5], Some(0));
    }

    #[test]
    fn test_monotonic_within_bucket() {
        let data = reconciled(
            vec![
                event_row("2024-03-02", "Roomly", "10"),
                event_row("2024-03-08", "Instabase", "20"),
                event_row("2024-03-14", "Roomly", "30"),
                event_row("2024-03-27", "Spacee", "5"),
                event_row("2024-03-31", "Roomly", "1"),
            ],
            vec![ledger_row("2024-03-09", "7")],
        );
        let series = milestone_series(&data, MilestoneScope::Store("Central"));

        for month in &series {
            for values in [&month.store, &month.external, &month.total] {
                let mut last = i64::MIN;
                for value in values.iter().flatten() {
                    assert!(*value >= last, "milestones must be non-decreasing");
                    last = *value;
                }
            }
        }
    }

    #[test]
    fn test_closed_month_fully_sampled() {
        let data = reconciled(
            vec![
                event_row("2024-03-18", "Roomly", "1"),
                event_row("2024-02-25", "Roomly", "500"),
            ],
            vec![],
        );
        let series = milestone_series(&data, MilestoneScope::Store("Central"));
        let february = &series[series.len() - 2];

        // A closed month never has unavailable offsets.
        assert!(february.total.iter().all(|v| v.is_some()));
        assert_eq!(february.store[4], Some(500));
        assert_eq!(february.store[5], Some(500));
        // Day-20 sample predates the booking
        assert_eq!(february.store[3], Some(0));
    }

    #[test]
    fn test_offsets_clamped_to_short_month() {
        // February 2023 has 28 days; the ~25 offset stays at day 25 but the
        // end sample covers the 28th.
        let data = reconciled(
            vec![
                event_row("2023-03-01", "Roomly", "1"),
                event_row("2023-02-28", "Roomly", "900"),
            ],
            vec![],
        );
        let series = milestone_series(&data, MilestoneScope::Store("Central"));
        let february = series.iter().find(|m| m.month.label() == "2023-02").unwrap();

        assert_eq!(february.store[4], Some(0));
        assert_eq!(february.store[5], Some(900));
    }

    #[test]
    fn test_empty_month_still_reports_unavailable_future() {
        // No records at all in the current bucket besides the cutoff anchor;
        // future offsets are still unavailable rather than zero.
        let data = reconciled(vec![event_row("2024-03-06", "Roomly", "0")], vec![]);
        let series = milestone_series(&data, MilestoneScope::Store("Nowhere"));
        let current = series.last().unwrap();

        assert_eq!(current.store[0], Some(0));
        assert_eq!(current.store[1], None);
        assert_eq!(current.total[5], Some(0));
    }

    #[test]
    fn test_global_scope_sums_all_stores() {
        let mut other = event_row("2024-03-03", "Roomly", "300");
        other.store = "Harbor".to_string();
        let data = reconciled(
            vec![
                event_row("2024-03-02", "Roomly", "200"),
                other,
                event_row("2024-03-09", "Roomly", "0"),
            ],
            vec![],
        );
        let series = milestone_series(&data, MilestoneScope::Global);
        let current = series.last().unwrap();

        assert_eq!(current.store[0], Some(500));
    }
}
