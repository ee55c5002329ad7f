//! Cumulative balance series, replayed from expenses and settlements.

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::models::{Expense, Partner, Settlement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum EntryKind {
    Expense,
    Settlement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceHistoryPoint {
    pub date: NaiveDate,
    pub kind: EntryKind,
    pub record_id: i64,
    pub amount: f64,
    pub running_balance: f64,
    pub cumulative_expenses: f64,
    pub cumulative_settlements: f64,
}

enum Entry<'a> {
    Expense(&'a Expense),
    Settlement(&'a Settlement),
}

impl Entry<'_> {
    fn date(&self) -> NaiveDate {
        match self {
            Entry::Expense(e) => e.date,
            Entry::Settlement(s) => s.date,
        }
    }

    fn created_at(&self) -> Option<NaiveDateTime> {
        match self {
            Entry::Expense(e) => e.created_at,
            Entry::Settlement(s) => s.created_at,
        }
    }

    fn kind(&self) -> EntryKind {
        match self {
            Entry::Expense(_) => EntryKind::Expense,
            Entry::Settlement(_) => EntryKind::Settlement,
        }
    }

    fn id(&self) -> i64 {
        match self {
            Entry::Expense(e) => e.id,
            Entry::Settlement(s) => s.id,
        }
    }

    fn amount(&self) -> f64 {
        match self {
            Entry::Expense(e) => e.amount,
            Entry::Settlement(s) => s.amount,
        }
    }
}

/// Chronological order with a total tie-break, so the replay never depends on
/// fetch order: date, then creation time (missing first), then expenses before
/// settlements, then id.
fn replay_order(x: &Entry, y: &Entry) -> Ordering {
    x.date()
        .cmp(&y.date())
        .then_with(|| x.created_at().cmp(&y.created_at()))
        .then_with(|| x.kind().cmp(&y.kind()))
        .then_with(|| x.id().cmp(&y.id()))
}

/// One point per record. An expense paid by A moves the balance up, one paid
/// by B moves it down, and every settlement moves it down regardless of who
/// paid whom. Expenses with an unknown payer only add to the cumulative total.
pub fn reconstruct_balance_history(
    expenses: &[Expense],
    settlements: &[Settlement],
) -> Vec<BalanceHistoryPoint> {
    let mut entries: Vec<Entry> = expenses
        .iter()
        .map(Entry::Expense)
        .chain(settlements.iter().map(Entry::Settlement))
        .collect();
    entries.sort_by(replay_order);

    let mut running_balance = 0.0f64;
    let mut cumulative_expenses = 0.0f64;
    let mut cumulative_settlements = 0.0f64;
    let mut points = Vec::with_capacity(entries.len());

    for entry in &entries {
        match entry {
            Entry::Expense(e) => {
                match e.paid_by {
                    Some(Partner::A) => running_balance += e.amount,
                    Some(Partner::B) => running_balance -= e.amount,
                    None => {}
                }
                cumulative_expenses += e.amount;
            }
            Entry::Settlement(s) => {
                running_balance -= s.amount;
                cumulative_settlements += s.amount;
            }
        }
        points.push(BalanceHistoryPoint {
            date: entry.date(),
            kind: entry.kind(),
            record_id: entry.id(),
            amount: entry.amount(),
            running_balance,
            cumulative_expenses,
            cumulative_settlements,
        });
    }

    points
}
