use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One row of the event ledger exactly as the loader hands it over: every
/// field is still text because the upstream sheets decorate amounts with
/// currency marks and write dates with either `-` or `/` separators.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RawEventRow {
    #[schemars(description = "Booking date, YYYY-MM-DD or YYYY/MM/DD. Rows with unparseable dates are excluded from aggregation.")]
    pub date: String,

    #[schemars(description = "Free-text store name as entered in the sheet")]
    pub store: String,

    #[schemars(description = "Free-text facility (room) name within the store")]
    pub facility: String,

    #[schemars(description = "Free-text booking channel label, classified by substring rules")]
    pub channel: String,

    #[schemars(description = "Revenue amount, possibly currency-decorated (e.g. '12,000円'). Unparseable values count as zero.")]
    pub revenue: String,

    #[schemars(description = "Number of bookings, possibly decorated. Unparseable values count as zero.")]
    pub bookings: String,
}

/// One row of the per-store billing ledger, also still text-typed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RawLedgerRow {
    #[schemars(description = "Billing date, YYYY-MM-DD or YYYY/MM/DD")]
    pub date: String,

    #[schemars(description = "Free-text store name on the billing side")]
    pub store: String,

    #[schemars(description = "Fixed monthly contract revenue")]
    pub monthly_contract: String,

    #[schemars(description = "Revenue-share distributions")]
    pub revenue_share: String,

    #[schemars(description = "Miscellaneous other fees")]
    pub other_fee: String,

    #[schemars(description = "Metered usage fees")]
    pub usage_fee: String,

    #[schemars(description = "Facility booking revenue as reported by the billing sync")]
    pub facility_booking: String,

    #[schemars(description = "External channel revenue as reported by the billing sync. A reported zero in the reference previous month is treated as not-yet-synced and backfilled from the event ledger.")]
    pub external_channel: String,
}

/// One alias mapping from the tag table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AliasRow {
    #[schemars(description = "Facility name as it appears on the channel/billing side")]
    pub channel_side_name: String,

    #[schemars(description = "The canonical store name it belongs to (many-to-one)")]
    pub canonical_store: String,
}

/// The four input tables of one reconciliation run. This is the full input
/// snapshot; every run recomputes from it, there is no incremental state.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReportInput {
    #[schemars(description = "Per-booking event ledger (authoritative for the current partial month)")]
    pub events: Vec<RawEventRow>,

    #[schemars(description = "Store names in canonical spelling, defining the per-store iteration order. Stores absent from this list are skipped in per-store output.")]
    pub store_order: Vec<String>,

    #[schemars(description = "Channel-side facility name to canonical store name aliases")]
    pub aliases: Vec<AliasRow>,

    #[schemars(description = "Per-store billing ledger, clipped to the cutoff date during reconciliation")]
    pub billing: Vec<RawLedgerRow>,
}

impl ReportInput {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ReportInput)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// The six revenue categories of the billing ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LedgerCategory {
    MonthlyContract,
    RevenueShare,
    OtherFee,
    UsageFee,
    FacilityBooking,
    ExternalChannel,
}

impl LedgerCategory {
    pub const ALL: [LedgerCategory; 6] = [
        LedgerCategory::MonthlyContract,
        LedgerCategory::RevenueShare,
        LedgerCategory::OtherFee,
        LedgerCategory::UsageFee,
        LedgerCategory::FacilityBooking,
        LedgerCategory::ExternalChannel,
    ];

    /// The categories that make up the milestone "store component", i.e.
    /// everything the billing ledger reports that is not reconciled against
    /// the event ledger.
    pub const BASE: [LedgerCategory; 4] = [
        LedgerCategory::MonthlyContract,
        LedgerCategory::RevenueShare,
        LedgerCategory::OtherFee,
        LedgerCategory::UsageFee,
    ];
}

/// A typed event-ledger record after ingestion and reconciliation: names are
/// canonical, the channel is classified, amounts are clean integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub date: NaiveDate,
    pub store: String,
    pub facility: String,
    pub channel: String,
    pub revenue: i64,
    pub bookings: i64,
}

/// A typed billing-ledger record after ingestion and reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub date: NaiveDate,
    pub store: String,
    pub monthly_contract: i64,
    pub revenue_share: i64,
    pub other_fee: i64,
    pub usage_fee: i64,
    pub facility_booking: i64,
    pub external_channel: i64,
}

impl LedgerRecord {
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

    /// Sum of the base categories (everything except the two reconciled ones).
    pub fn base_total(&self) -> i64 {
        LedgerCategory::BASE.iter().map(|c| self.category(*c)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_schema_generation() {
        let schema_json = ReportInput::schema_as_json().unwrap();
        assert!(schema_json.contains("events"));
        assert!(schema_json.contains("store_order"));
        assert!(schema_json.contains("aliases"));
        assert!(schema_json.contains("billing"));
    }

    #[test]
    fn test_ledger_record_category_access() {
        let record = LedgerRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            store: "Central".to_string(),
            monthly_contract: 100,
            revenue_share: 20,
            other_fee: 3,
            usage_fee: 40,
            facility_booking: 500,
            external_channel: 600,
        };

        assert_eq!(record.category(LedgerCategory::UsageFee), 40);
        assert_eq!(record.base_total(), 163);

        let full: i64 = LedgerCategory::ALL
            .iter()
            .map(|c| record.category(*c))
            .sum();
        assert_eq!(full, 1263);
    }

    #[test]
    fn test_input_round_trip() {
        let input = ReportInput {
            events: vec![RawEventRow {
                date: "2024/03/05".to_string(),
                store: "Central".to_string(),
                facility: "Room A".to_string(),
                channel: "Roomly".to_string(),
                revenue: "1,000円".to_string(),
                bookings: "2".to_string(),
            }],
            store_order: vec!["Central".to_string()],
            aliases: vec![],
            billing: vec![],
        };

        let json = serde_json::to_string(&input).unwrap();
        let back: ReportInput = serde_json::from_str(&json).unwrap();
        assert_eq!(back.events.len(), 1);
        assert_eq!(back.events[0].revenue, "1,000円");
    }
}
