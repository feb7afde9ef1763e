//! Monthly rollup of both ledgers over the 13-bucket trailing window.
//!
//! Two independent aggregation modes exist. Ledger mode sums the six billing
//! categories and then reconciles the two event-sourced categories against
//! the event ledger, because the billing sync runs on a delay: the current
//! bucket is always recomputed from events, and a reported zero in the
//! reference previous bucket is backfilled once. Event mode sums event
//! revenue (and booking counts at facility scope) per canonical channel.

use crate::calendar::MonthKey;
use crate::reconcile::{ReconciledData, ReportContext};
use crate::schema::{EventRecord, LedgerCategory, LedgerRecord};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Month-over-month ratio of a tracked value against the preceding bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MomRatio {
    /// No prior baseline: both the current and the preceding value are zero.
    NoBaseline,
    /// Newly appeared: the preceding value is zero, the current one is not.
    New,
    /// `floor(curr / prev * 100)` as an integer percentage.
    Percent(i64),
}

impl MomRatio {
    pub fn compute(curr: i64, prev: i64) -> Self {
        if prev == 0 {
            if curr == 0 {
                MomRatio::NoBaseline
            } else {
                MomRatio::New
            }
        } else {
            MomRatio::Percent(curr * 100 / prev)
        }
    }
}

/// Where a bucket sits relative to the cutoff month. Drives the
/// reconciliation decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketPosition {
    Current,
    Previous,
    Earlier,
}

impl BucketPosition {
    pub fn of(context: &ReportContext, month: MonthKey) -> Self {
        if month == context.current_month() {
            BucketPosition::Current
        } else if month == context.previous_month() {
            BucketPosition::Previous
        } else {
            BucketPosition::Earlier
        }
    }
}

/// Which ledger categories get recomputed from the event ledger for one
/// bucket. Keyed by (bucket position, reported-external-is-zero) so every
/// case of the policy is enumerable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowReconciliation {
    pub recompute_facility_booking: bool,
    pub recompute_external_channel: bool,
}

impl RowReconciliation {
    pub fn decide(position: BucketPosition, reported_external_is_zero: bool) -> Self {
        match (position, reported_external_is_zero) {
            // The billing sync lags; the event ledger is authoritative for
            // the partial current month.
            (BucketPosition::Current, _) => Self {
                recompute_facility_booking: true,
                recompute_external_channel: true,
            },
            // A zero in the reference previous month means "not yet synced",
            // not "no revenue"; backfill it once.
            (BucketPosition::Previous, true) => Self {
                recompute_facility_booking: false,
                recompute_external_channel: true,
            },
            // A non-zero reported value is trusted, as is all older history.
            (BucketPosition::Previous, false) | (BucketPosition::Earlier, _) => Self {
                recompute_facility_booking: false,
                recompute_external_channel: false,
            },
        }
    }
}

/// Ledger-mode aggregated row for one (scope, bucket).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LedgerMonthRow {
    pub month: MonthKey,
    pub monthly_contract: i64,
    pub revenue_share: i64,
    pub other_fee: i64,
    pub usage_fee: i64,
    pub facility_booking: i64,
    pub external_channel: i64,
    /// Always the sum of the six categories above.
    pub total: i64,
    pub usage_fee_mom: MomRatio,
    pub facility_booking_mom: MomRatio,
    pub external_channel_mom: MomRatio,
}

impl LedgerMonthRow {
    pub fn category(&self, category: LedgerCategory) -> i64 {
        match category {
            LedgerCategory::MonthlyContract => self.monthly_contract,
            LedgerCategory::RevenueShare => self.revenue_share,
            LedgerCategory::OtherFee => self.other_fee,
            LedgerCategory::UsageFee => self.usage_fee,
            LedgerCategory::FacilityBooking => self.facility_booking,
            LedgerCategory::ExternalChannel => self.external_channel,
        }
    }
}

/// Per-channel revenue within an event-mode row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChannelCell {
    pub channel: String,
    pub revenue: i64,
    pub revenue_mom: MomRatio,
}

/// Event-mode aggregated row for a global or store scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EventMonthRow {
    pub month: MonthKey,
    /// One cell per canonical channel, in classifier order. Open-class
    /// channels are not tabulated here.
    pub channels: Vec<ChannelCell>,
    /// Sum over the canonical channels.
    pub total: i64,
    pub total_mom: MomRatio,
}

/// Per-channel revenue and booking counts within a facility-scope row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FacilityChannelCell {
    pub channel: String,
    pub revenue: i64,
    pub revenue_mom: MomRatio,
    pub bookings: i64,
}

/// Event-mode aggregated row for one (store, facility) scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FacilityMonthRow {
    pub month: MonthKey,
    pub channels: Vec<FacilityChannelCell>,
    pub total: i64,
    pub total_bookings: i64,
    pub total_mom: MomRatio,
}

/// Aggregation scope: the whole business, one store, or one facility within
/// a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    Global,
    Store(&'a str),
    Facility(&'a str, &'a str),
}

impl Scope<'_> {
    fn matches_event(&self, event: &EventRecord) -> bool {
        match self {
            Scope::Global => true,
            Scope::Store(store) => event.store == *store,
            Scope::Facility(store, facility) => {
                event.store == *store && event.facility == *facility
            }
        }
    }

    fn matches_ledger(&self, record: &LedgerRecord) -> bool {
        match self {
            Scope::Global => true,
            Scope::Store(store) => record.store == *store,
            // The billing ledger has no facility axis.
            Scope::Facility(store, _) => record.store == *store,
        }
    }
}

/// Read-only aggregation pass over one reconciled snapshot.
pub struct Aggregator<'a> {
    data: &'a ReconciledData,
}

impl<'a> Aggregator<'a> {
    pub fn new(data: &'a ReconciledData) -> Self {
        Self { data }
    }

    fn context(&self) -> &ReportContext {
        &self.data.context
    }

    fn event_revenue_where(
        &self,
        scope: Scope<'_>,
        month: MonthKey,
        primary: bool,
    ) -> i64 {
        let rules = &self.context().channel_rules;
        self.data
            .events
            .iter()
            .filter(|e| scope.matches_event(e) && month.contains(e.date))
            .filter(|e| rules.is_primary(&e.channel) == primary)
            .map(|e| e.revenue)
            .sum()
    }

    fn channel_sums(
        &self,
        scope: Scope<'_>,
        month: MonthKey,
        channel: &str,
    ) -> (i64, i64) {
        self.data
            .events
            .iter()
            .filter(|e| scope.matches_event(e) && month.contains(e.date) && e.channel == channel)
            .fold((0, 0), |(rev, cnt), e| (rev + e.revenue, cnt + e.bookings))
    }

    /// Ledger-mode series: six billing categories per bucket, with the
    /// reconciliation decision table applied, then MoM ratios on the three
    /// tracked categories. A bucket with no matching records yields an
    /// all-zero row.
    pub fn ledger_series(&self, scope: Scope<'_>) -> Vec<LedgerMonthRow> {
        let context = self.context();
        let mut rows: Vec<LedgerMonthRow> = Vec::with_capacity(context.months.len());

        for &month in &context.months {
            let mut sums = [0i64; 6];
            for record in self
                .data
                .ledger
                .iter()
                .filter(|r| scope.matches_ledger(r) && month.contains(r.date))
            {
                for (i, category) in LedgerCategory::ALL.iter().enumerate() {
                    sums[i] += record.category(*category);
                }
            }

            let [monthly_contract, revenue_share, other_fee, usage_fee, mut facility_booking, mut external_channel] =
                sums;

            let position = BucketPosition::of(context, month);
            let action = RowReconciliation::decide(position, external_channel == 0);
            if action.recompute_facility_booking {
                facility_booking = self.event_revenue_where(scope, month, true);
            }
            if action.recompute_external_channel {
                external_channel = self.event_revenue_where(scope, month, false);
            }

            let total = monthly_contract
                + revenue_share
                + other_fee
                + usage_fee
                + facility_booking
                + external_channel;

            rows.push(LedgerMonthRow {
                month,
                monthly_contract,
                revenue_share,
                other_fee,
                usage_fee,
                facility_booking,
                external_channel,
                total,
                usage_fee_mom: MomRatio::NoBaseline,
                facility_booking_mom: MomRatio::NoBaseline,
                external_channel_mom: MomRatio::NoBaseline,
            });
        }

        for i in 0..rows.len() {
            let (prev_usage, prev_booking, prev_external) = if i > 0 {
                (
                    rows[i - 1].usage_fee,
                    rows[i - 1].facility_booking,
                    rows[i - 1].external_channel,
                )
            } else {
                (0, 0, 0)
            };
            let row = &mut rows[i];
            row.usage_fee_mom = MomRatio::compute(row.usage_fee, prev_usage);
            row.facility_booking_mom = MomRatio::compute(row.facility_booking, prev_booking);
            row.external_channel_mom = MomRatio::compute(row.external_channel, prev_external);
        }

        rows
    }

    /// Event-mode series for a global or store scope: per-canonical-channel
    /// revenue with MoM ratios on every channel and on the total.
    pub fn event_series(&self, scope: Scope<'_>) -> Vec<EventMonthRow> {
        let context = self.context();
        let channels = context.channel_rules.canonical_channels();
        let mut rows: Vec<EventMonthRow> = Vec::with_capacity(context.months.len());

        for &month in &context.months {
            let cells: Vec<ChannelCell> = channels
                .iter()
                .map(|channel| {
                    let (revenue, _) = self.channel_sums(scope, month, channel);
                    ChannelCell {
                        channel: channel.clone(),
                        revenue,
                        revenue_mom: MomRatio::NoBaseline,
                    }
                })
                .collect();
            let total = cells.iter().map(|c| c.revenue).sum();

            rows.push(EventMonthRow {
                month,
                channels: cells,
                total,
                total_mom: MomRatio::NoBaseline,
            });
        }

        for i in 0..rows.len() {
            let prev_total = if i > 0 { rows[i - 1].total } else { 0 };
            let prev_channels: Vec<i64> = if i > 0 {
                rows[i - 1].channels.iter().map(|c| c.revenue).collect()
            } else {
                vec![0; channels.len()]
            };
            let row = &mut rows[i];
            row.total_mom = MomRatio::compute(row.total, prev_total);
            for (cell, prev) in row.channels.iter_mut().zip(prev_channels) {
                cell.revenue_mom = MomRatio::compute(cell.revenue, prev);
            }
        }

        rows
    }

    /// Event-mode series for one facility, with booking counts alongside
    /// revenue. Counts carry no MoM ratio.
    pub fn facility_series(&self, store: &str, facility: &str) -> Vec<FacilityMonthRow> {
        let context = self.context();
        let scope = Scope::Facility(store, facility);
        let channels = context.channel_rules.canonical_channels();
        let mut rows: Vec<FacilityMonthRow> = Vec::with_capacity(context.months.len());

        for &month in &context.months {
            let cells: Vec<FacilityChannelCell> = channels
                .iter()
                .map(|channel| {
                    let (revenue, bookings) = self.channel_sums(scope, month, channel);
                    FacilityChannelCell {
                        channel: channel.clone(),
                        revenue,
                        revenue_mom: MomRatio::NoBaseline,
                        bookings,
                    }
                })
                .collect();
            let total = cells.iter().map(|c| c.revenue).sum();
            let total_bookings = cells.iter().map(|c| c.bookings).sum();

            rows.push(FacilityMonthRow {
                month,
                channels: cells,
                total,
                total_bookings,
                total_mom: MomRatio::NoBaseline,
            });
        }

        for i in 0..rows.len() {
            let prev_total = if i > 0 { rows[i - 1].total } else { 0 };
            let prev_channels: Vec<i64> = if i > 0 {
                rows[i - 1].channels.iter().map(|c| c.revenue).collect()
            } else {
                vec![0; channels.len()]
            };
            let row = &mut rows[i];
            row.total_mom = MomRatio::compute(row.total, prev_total);
            for (cell, prev) in row.channels.iter_mut().zip(prev_channels) {
                cell.revenue_mom = MomRatio::compute(cell.revenue, prev);
            }
        }

        rows
    }
}
