//! # Venue Revenue Reconciler
//!
//! A library for reconciling the two revenue ledgers of a multi-site
//! facility-rental business — a per-booking event ledger and a per-store
//! billing ledger — into one gap-filled, 13-month-bucketed dashboard
//! structure with day-granular milestone progress.
//!
//! ## Core Concepts
//!
//! - **Canonical identity**: free-text store, facility, and channel labels
//!   are collapsed onto one normalized spelling before any aggregation
//! - **Cutoff date**: the maximum valid date in the event ledger; it anchors
//!   the current accounting period and clips stale billing records
//! - **Reconciliation**: the billing sync lags, so the current bucket's
//!   event-sourced categories are always recomputed from the event ledger,
//!   and a reported zero in the previous bucket is backfilled once
//! - **Milestones**: cumulative revenue sampled at fixed day offsets, with
//!   not-yet-reached offsets reported as unavailable rather than zero
//!
//! ## Example
//!
//! ```rust,ignore
//! use venue_revenue_reconciler::*;
//!
//! let input = ReportInput {
//!     events: vec![RawEventRow {
//!         date: "2024/03/18".to_string(),
//!         store: "Central".to_string(),
//!         facility: "Room A".to_string(),
//!         channel: "Roomly".to_string(),
//!         revenue: "12,000円".to_string(),
//!         bookings: "3".to_string(),
//!     }],
//!     store_order: vec!["Central".to_string()],
//!     aliases: vec![],
//!     billing: vec![],
//! };
//!
//! let report = process_dashboard(&input).unwrap();
//! println!("{}", report.to_json().unwrap());
//! ```

pub mod aggregate;
pub mod calendar;
pub mod error;
pub mod ingestion;
pub mod milestone;
pub mod normalize;
pub mod rank;
pub mod reconcile;
pub mod report;
pub mod schema;

pub use aggregate::{
    Aggregator, BucketPosition, ChannelCell, EventMonthRow, FacilityChannelCell, FacilityMonthRow,
    LedgerMonthRow, MomRatio, RowReconciliation, Scope,
};
pub use calendar::MonthKey;
pub use error::{InputKind, ReconcileError, Result};
pub use ingestion::*;
pub use milestone::{milestone_series, MilestoneMonth, MilestoneScope, MILESTONE_DAYS};
pub use normalize::{canonical_key, ChannelRule, ChannelRules};
pub use rank::rank_facilities;
pub use reconcile::{reconcile, NameMap, ReconciledData, ReportContext, WINDOW_MONTHS};
pub use report::{DashboardReport, FacilityReport, StoreReport};
pub use schema::*;

use log::{debug, info};

pub struct DashboardProcessor;

impl DashboardProcessor {
    /// Runs one full reconciliation-and-aggregation pass over an input
    /// snapshot with the default channel rules.
    pub fn process(input: &ReportInput) -> Result<DashboardReport> {
        Self::process_with_rules(input, ChannelRules::default())
    }

    pub fn process_with_rules(
        input: &ReportInput,
        channel_rules: ChannelRules,
    ) -> Result<DashboardReport> {
        validate_input(input)?;

        info!(
            "Processing {} event rows and {} billing rows across {} ordered stores",
            input.events.len(),
            input.billing.len(),
            input.store_order.len()
        );

        let data = reconcile(input, channel_rules)?;
        debug!(
            "Reconciled snapshot: {} events, {} billing records, {} aliases",
            data.events.len(),
            data.ledger.len(),
            data.name_map.len()
        );

        Ok(DashboardReport::build(&data))
    }
}

pub fn process_dashboard(input: &ReportInput) -> Result<DashboardReport> {
    DashboardProcessor::process(input)
}

fn validate_input(input: &ReportInput) -> Result<()> {
    if input.events.is_empty() {
        return Err(ReconcileError::MissingInput(InputKind::EventLedger));
    }
    if input.store_order.is_empty() {
        return Err(ReconcileError::MissingInput(InputKind::StoreOrder));
    }
    if input.aliases.is_empty() {
        return Err(ReconcileError::MissingInput(InputKind::AliasTable));
    }
    if input.billing.is_empty() {
        return Err(ReconcileError::MissingInput(InputKind::BillingLedger));
    }
    Ok(())
}
