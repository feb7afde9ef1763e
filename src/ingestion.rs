//! Lenient conversion of raw text rows into typed ledger records.
//!
//! The upstream sheets are edited by hand, so amounts arrive decorated with
//! currency marks and thousands separators, and dates switch between `-` and
//! `/` separators. Per the error-handling contract: an unparseable amount
//! counts as zero, an unparseable date excludes the whole row from any
//! date-bucketed aggregation. Neither is ever fatal.

use crate::schema::{EventRecord, LedgerRecord, RawEventRow, RawLedgerRow};
use chrono::NaiveDate;
use log::debug;

/// Parses a ledger date, accepting `-` or `/` separators. Returns `None` for
/// anything else; the caller drops the row.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim().replace('/', "-");
    NaiveDate::parse_from_str(&text, "%Y-%m-%d").ok()
}

/// Parses a possibly currency-decorated amount ("12,000円", "¥300", "1500.0").
/// Decimal text truncates toward zero; unparseable text counts as zero.
pub fn parse_amount(raw: &str) -> i64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '円' | '¥' | '￥'))
        .collect();

    if cleaned.is_empty() {
        return 0;
    }

    cleaned
        .parse::<i64>()
        .ok()
        .or_else(|| cleaned.parse::<f64>().ok().map(|v| v.trunc() as i64))
        .unwrap_or(0)
}

/// Converts raw event rows into typed records, dropping rows without a
/// parseable date. Store, facility, and channel names are carried through
/// verbatim; the reconciliation engine canonicalizes them.
pub fn ingest_events(rows: &[RawEventRow]) -> Vec<EventRecord> {
    let mut records = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;

    for row in rows {
        match parse_date(&row.date) {
            Some(date) => records.push(EventRecord {
                date,
                store: row.store.clone(),
                facility: row.facility.clone(),
                channel: row.channel.clone(),
                revenue: parse_amount(&row.revenue),
                bookings: parse_amount(&row.bookings),
            }),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!("ingest_events: dropped {} rows with unparseable dates", dropped);
    }
    records
}

/// Converts raw billing rows into typed records, dropping rows without a
/// parseable date.
pub fn ingest_ledger(rows: &[RawLedgerRow]) -> Vec<LedgerRecord> {
    let mut records = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;

    for row in rows {
        match parse_date(&row.date) {
            Some(date) => records.push(LedgerRecord {
                date,
                store: row.store.clone(),
                monthly_contract: parse_amount(&row.monthly_contract),
                revenue_share: parse_amount(&row.revenue_share),
                other_fee: parse_amount(&row.other_fee),
                usage_fee: parse_amount(&row.usage_fee),
                facility_booking: parse_amount(&row.facility_booking),
                external_channel: parse_amount(&row.external_channel),
            }),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!("ingest_ledger: dropped {} rows with unparseable dates", dropped);
    }
    records
}
