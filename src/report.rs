//! The assembled dashboard report: the sole contract with the presentation
//! layer. The structure is fully self-describing; a renderer needs no lookup
//! beyond this module's JSON schema.

use crate::aggregate::{Aggregator, EventMonthRow, FacilityMonthRow, LedgerMonthRow, Scope};
use crate::calendar::MonthKey;
use crate::milestone::{milestone_series, MilestoneMonth, MilestoneScope};
use crate::rank::rank_facilities;
use crate::reconcile::ReconciledData;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Event-mode series for one facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FacilityReport {
    pub name: String,
    pub event_series: Vec<FacilityMonthRow>,
}

/// Everything the presentation layer renders for one store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StoreReport {
    pub name: String,
    /// Billing-ledger rollup with reconciliation overrides applied.
    pub ledger_series: Vec<LedgerMonthRow>,
    /// Event-ledger rollup per canonical channel.
    pub event_series: Vec<EventMonthRow>,
    /// Facilities in trailing-revenue order.
    pub facilities: Vec<FacilityReport>,
    /// Cumulative day-offset progress, one entry per month bucket.
    pub milestone_series: Vec<MilestoneMonth>,
}

/// The complete output of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DashboardReport {
    /// Maximum valid date in the event ledger; anchors the current bucket.
    pub cutoff_date: NaiveDate,
    /// The 13 month buckets, oldest first. Every series in this report is
    /// parallel to this axis.
    pub months: Vec<MonthKey>,
    pub global_ledger_series: Vec<LedgerMonthRow>,
    pub global_event_series: Vec<EventMonthRow>,
    pub stores: Vec<StoreReport>,
}

impl DashboardReport {
    /// Builds the full report from one reconciled snapshot. Global series see
    /// every record, including stores absent from the ordering list; only
    /// per-store iteration is restricted to the ordered stores.
    pub fn build(data: &ReconciledData) -> Self {
        let aggregator = Aggregator::new(data);

        let stores = data
            .stores
            .iter()
            .map(|store| {
                let facilities = rank_facilities(&data.events, store)
                    .into_iter()
                    .map(|facility| FacilityReport {
                        event_series: aggregator.facility_series(store, &facility),
                        name: facility,
                    })
                    .collect();

                StoreReport {
                    name: store.clone(),
                    ledger_series: aggregator.ledger_series(Scope::Store(store)),
                    event_series: aggregator.event_series(Scope::Store(store)),
                    facilities,
                    milestone_series: milestone_series(data, MilestoneScope::Store(store)),
                }
            })
            .collect();

        DashboardReport {
            cutoff_date: data.context.cutoff_date,
            months: data.context.months.clone(),
            global_ledger_series: aggregator.ledger_series(Scope::Global),
            global_event_series: aggregator.event_series(Scope::Global),
            stores,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(DashboardReport)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
