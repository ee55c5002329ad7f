//! Turns raw fetched records into validated value objects.
//!
//! This is the only place malformed input is handled. A bad record is logged
//! and dropped; it never aborts the rest of the batch.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Expense, Partners, RawExpense, RawSettlement, Settlement};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("unparseable date {0:?}")]
    InvalidDate(String),

    #[error("invalid amount {0}")]
    InvalidAmount(f64),

    #[error("unknown partner {0:?}")]
    UnknownPartner(String),

    #[error("payer and payee are the same partner")]
    SelfSettlement,
}

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Parse a timestamp in any of the shapes the store or an export may carry.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Parse a calendar date; a full timestamp is accepted and its date part kept.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(trimmed).map(|ts| ts.date()))
}

fn check_amount(amount: f64) -> Result<f64, RecordError> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(amount)
    } else {
        Err(RecordError::InvalidAmount(amount))
    }
}

pub fn validate_expense(raw: &RawExpense, partners: &Partners) -> Result<Expense, RecordError> {
    let date = parse_date(&raw.date).ok_or_else(|| RecordError::InvalidDate(raw.date.clone()))?;
    let amount = check_amount(raw.amount)?;
    let paid_by = partners.resolve(&raw.paid_by_id);
    if paid_by.is_none() {
        debug!(id = raw.id, payer = %raw.paid_by_id, "expense payer matches neither partner");
    }
    Ok(Expense {
        id: raw.id,
        amount,
        category: raw.category.trim().to_string(),
        paid_by,
        paid_by_id: raw.paid_by_id.clone(),
        date,
        created_at: raw.created_at.as_deref().and_then(parse_timestamp),
        description: raw.description.clone(),
    })
}

pub fn validate_settlement(
    raw: &RawSettlement,
    partners: &Partners,
) -> Result<Settlement, RecordError> {
    let date = parse_date(&raw.date).ok_or_else(|| RecordError::InvalidDate(raw.date.clone()))?;
    let amount = check_amount(raw.amount)?;
    let paid_by = partners
        .resolve(&raw.paid_by_id)
        .ok_or_else(|| RecordError::UnknownPartner(raw.paid_by_id.clone()))?;
    let paid_to = partners
        .resolve(&raw.paid_to_id)
        .ok_or_else(|| RecordError::UnknownPartner(raw.paid_to_id.clone()))?;
    if paid_by == paid_to {
        return Err(RecordError::SelfSettlement);
    }
    Ok(Settlement {
        id: raw.id,
        amount,
        paid_by,
        paid_to,
        description: raw.description.clone(),
        date,
        created_at: raw.created_at.as_deref().and_then(parse_timestamp),
    })
}

/// Keep the expenses that validate, in input order.
pub fn validate_expenses(raw: &[RawExpense], partners: &Partners) -> Vec<Expense> {
    raw.iter()
        .filter_map(|r| match validate_expense(r, partners) {
            Ok(e) => Some(e),
            Err(err) => {
                warn!(id = r.id, "dropping expense: {err}");
                None
            }
        })
        .collect()
}

/// Keep the settlements that validate, in input order.
pub fn validate_settlements(raw: &[RawSettlement], partners: &Partners) -> Vec<Settlement> {
    raw.iter()
        .filter_map(|r| match validate_settlement(r, partners) {
            Ok(s) => Some(s),
            Err(err) => {
                warn!(id = r.id, "dropping settlement: {err}");
                None
            }
        })
        .collect()
}
