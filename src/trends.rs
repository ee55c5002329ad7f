//! Derived comparisons: period-over-period change, partner comparison,
//! time-of-day patterns and top category ranking.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Days, NaiveDate, Timelike, Weekday};
use serde::Serialize;

use crate::buckets::{
    aggregate_by_category, aggregate_by_period, category_key, BucketFilter, Granularity,
};
use crate::models::{Expense, Partner, CENT_EPSILON};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    pub fn from_change(change: f64) -> Self {
        if change.abs() < CENT_EPSILON {
            Trend::Stable
        } else if change > 0.0 {
            Trend::Up
        } else {
            Trend::Down
        }
    }
}

fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    }
}

// ---------------------------------------------------------------------------
// Category period comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryComparison {
    pub category: String,
    pub current_amount: f64,
    pub previous_amount: f64,
    pub change: f64,
    pub change_percent: f64,
    pub trend: Trend,
}

/// Exclusive lower bound of the `days`-long window ending at `end`. A window
/// reaching past the calendar range starts at `NaiveDate::MIN`.
fn window_start(end: NaiveDate, days: u32) -> NaiveDate {
    end.checked_sub_days(Days::new(u64::from(days))).unwrap_or(NaiveDate::MIN)
}

struct WindowTotal<'a> {
    label: &'a str,
    amount: f64,
}

/// Per-category totals for dates in `(end - days, end]`, keyed by
/// [`category_key`].
fn window_totals(expenses: &[Expense], end: NaiveDate, days: u32) -> HashMap<String, WindowTotal<'_>> {
    let start = window_start(end, days);
    let mut totals: HashMap<String, WindowTotal> = HashMap::new();
    for e in expenses.iter().filter(|e| e.date > start && e.date <= end) {
        let total = totals.entry(category_key(&e.category)).or_insert(WindowTotal {
            label: &e.category,
            amount: 0.0,
        });
        if e.category.as_str() < total.label {
            total.label = &e.category;
        }
        total.amount += e.amount;
    }
    totals
}

/// Compares the last `period_days` ending at `as_of` with the `period_days`
/// before that, for every category spent on in the current window.
pub fn compare_periods(expenses: &[Expense], period_days: u32, as_of: NaiveDate) -> Vec<CategoryComparison> {
    if period_days == 0 {
        return Vec::new();
    }
    let current = window_totals(expenses, as_of, period_days);
    let previous = window_totals(expenses, window_start(as_of, period_days), period_days);

    let mut rows: Vec<CategoryComparison> = current
        .into_iter()
        .map(|(key, total)| {
            let current_amount = total.amount;
            let previous_amount = previous.get(&key).map_or(0.0, |t| t.amount);
            let change = current_amount - previous_amount;
            CategoryComparison {
                category: total.label.to_string(),
                current_amount,
                previous_amount,
                change,
                change_percent: percent_change(current_amount, previous_amount),
                trend: Trend::from_change(change),
            }
        })
        .collect();
    rows.sort_by(|x, y| {
        y.current_amount
            .total_cmp(&x.current_amount)
            .then_with(|| x.category.cmp(&y.category))
    });
    rows
}

// ---------------------------------------------------------------------------
// Partner comparison per period
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserComparisonPoint {
    pub key: String,
    pub amount_a: f64,
    pub amount_b: f64,
    /// `amount_a - amount_b`
    pub difference: f64,
    pub leader: Option<Partner>,
    pub total: f64,
    pub change_from_previous: f64,
    pub trend: Trend,
}

pub fn compare_user_spending(expenses: &[Expense], granularity: Granularity) -> Vec<UserComparisonPoint> {
    let buckets = aggregate_by_period(expenses, granularity, &BucketFilter::default());
    let mut previous_total: Option<f64> = None;

    buckets
        .into_iter()
        .map(|bucket| {
            let difference = bucket.by_partner.a - bucket.by_partner.b;
            let leader = match Trend::from_change(difference) {
                Trend::Up => Some(Partner::A),
                Trend::Down => Some(Partner::B),
                Trend::Stable => None,
            };
            let change = previous_total.map_or(0.0, |prev| bucket.total_amount - prev);
            previous_total = Some(bucket.total_amount);
            UserComparisonPoint {
                key: bucket.key,
                amount_a: bucket.by_partner.a,
                amount_b: bucket.by_partner.b,
                difference,
                leader,
                total: bucket.total_amount,
                change_from_previous: change,
                trend: Trend::from_change(change),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Time-of-day patterns
// ---------------------------------------------------------------------------

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimePatternCell {
    pub weekday: Weekday,
    pub hour: u32,
    pub count: usize,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum HourBlock {
    Night,
    Morning,
    Afternoon,
    Evening,
}

impl HourBlock {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=5 => HourBlock::Night,
            6..=11 => HourBlock::Morning,
            12..=17 => HourBlock::Afternoon,
            _ => HourBlock::Evening,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HourBlock::Night => "Night",
            HourBlock::Morning => "Morning",
            HourBlock::Afternoon => "Afternoon",
            HourBlock::Evening => "Evening",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeBlockCell {
    pub weekday: Weekday,
    pub block: HourBlock,
    pub count: usize,
    pub amount: f64,
}

/// Sparse (weekday, hour) matrix, Monday first. Only expenses that carry a
/// creation timestamp take part; a bare date has no time of day.
pub fn compute_time_patterns(expenses: &[Expense]) -> Vec<TimePatternCell> {
    let mut cells: BTreeMap<(u32, u32), (usize, f64)> = BTreeMap::new();
    for e in expenses {
        let Some(ts) = e.created_at else { continue };
        let cell = cells
            .entry((ts.weekday().num_days_from_monday(), ts.hour()))
            .or_default();
        cell.0 += 1;
        cell.1 += e.amount;
    }

    cells
        .into_iter()
        .map(|((day, hour), (count, amount))| TimePatternCell {
            weekday: WEEKDAYS[day as usize],
            hour,
            count,
            amount,
        })
        .collect()
}

pub fn collapse_to_blocks(cells: &[TimePatternCell]) -> Vec<TimeBlockCell> {
    let mut blocks: BTreeMap<(u32, HourBlock), (usize, f64)> = BTreeMap::new();
    for cell in cells {
        let entry = blocks
            .entry((cell.weekday.num_days_from_monday(), HourBlock::from_hour(cell.hour)))
            .or_default();
        entry.0 += cell.count;
        entry.1 += cell.amount;
    }

    blocks
        .into_iter()
        .map(|((day, block), (count, amount))| TimeBlockCell {
            weekday: WEEKDAYS[day as usize],
            block,
            count,
            amount,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Top categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCategory {
    pub rank: usize,
    pub category: String,
    pub total_amount: f64,
    pub expense_count: usize,
    pub share_of_amount: f64,
    pub share_of_count: f64,
    pub trend: Trend,
}

/// The `n` largest categories over all expenses, each annotated with its trend
/// across the last two `period_days` windows ending at `as_of`.
pub fn rank_top_categories(
    expenses: &[Expense],
    n: usize,
    period_days: u32,
    as_of: NaiveDate,
) -> Vec<RankedCategory> {
    let total_count = expenses.len();
    let (current, previous) = if period_days == 0 {
        (HashMap::new(), HashMap::new())
    } else {
        (
            window_totals(expenses, as_of, period_days),
            window_totals(expenses, window_start(as_of, period_days), period_days),
        )
    };

    aggregate_by_category(expenses)
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, bucket)| {
            let key = category_key(&bucket.category);
            let now = current.get(&key).map_or(0.0, |t| t.amount);
            let before = previous.get(&key).map_or(0.0, |t| t.amount);
            RankedCategory {
                rank: i + 1,
                share_of_amount: bucket.percentage,
                share_of_count: if total_count == 0 {
                    0.0
                } else {
                    bucket.expense_count as f64 / total_count as f64 * 100.0
                },
                trend: Trend::from_change(now - before),
                total_amount: bucket.total_amount,
                expense_count: bucket.expense_count,
                category: bucket.category,
            }
        })
        .collect()
}
