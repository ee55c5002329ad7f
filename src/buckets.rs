//! Period and category aggregation over validated expenses.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::{Expense, Partner, PerPartner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Granularity {
    Month,
    Week,
}

/// `YYYY-MM` for months, ISO `YYYY-Www` for weeks. Both sort chronologically.
pub fn bucket_key(date: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Month => format!("{:04}-{:02}", date.year(), date.month()),
        Granularity::Week => {
            let week = date.iso_week();
            format!("{:04}-W{:02}", week.year(), week.week())
        }
    }
}

/// Grouping key for a category. Spellings that differ only in case are the
/// same category everywhere.
pub fn category_key(category: &str) -> String {
    category.trim().to_lowercase()
}

/// Restricts which expenses take part in an aggregation. Empty lists allow
/// everything; both date bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct BucketFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub categories: Vec<String>,
    pub partners: Vec<Partner>,
}

impl BucketFilter {
    pub fn matches(&self, expense: &Expense) -> bool {
        if self.from.is_some_and(|from| expense.date < from) {
            return false;
        }
        if self.to.is_some_and(|to| expense.date > to) {
            return false;
        }
        if !self.categories.is_empty()
            && !self.categories.iter().any(|c| category_key(c) == category_key(&expense.category))
        {
            return false;
        }
        if !self.partners.is_empty() {
            return match expense.paid_by {
                Some(p) => self.partners.contains(&p),
                None => false,
            };
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodBucket {
    pub key: String,
    pub total_amount: f64,
    pub expense_count: usize,
    pub by_partner: PerPartner,
    pub avg_expense_amount: f64,
}

/// Monthly buckets are period buckets keyed `YYYY-MM`.
pub type MonthlyBucket = PeriodBucket;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBucket {
    pub category: String,
    pub total_amount: f64,
    pub expense_count: usize,
    pub by_partner: PerPartner,
    pub avg_expense_amount: f64,
    pub percentage: f64,
}

#[derive(Default)]
struct Tally {
    total: f64,
    count: usize,
    by_partner: PerPartner,
}

impl Tally {
    fn add(&mut self, expense: &Expense) {
        self.total += expense.amount;
        self.count += 1;
        if let Some(p) = expense.paid_by {
            self.by_partner.add(p, expense.amount);
        }
    }

    fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

pub fn aggregate_by_period(
    expenses: &[Expense],
    granularity: Granularity,
    filter: &BucketFilter,
) -> Vec<PeriodBucket> {
    let mut tallies: BTreeMap<String, Tally> = BTreeMap::new();
    for expense in expenses.iter().filter(|e| filter.matches(e)) {
        tallies
            .entry(bucket_key(expense.date, granularity))
            .or_default()
            .add(expense);
    }

    tallies
        .into_iter()
        .map(|(key, t)| PeriodBucket {
            key,
            total_amount: t.total,
            expense_count: t.count,
            by_partner: t.by_partner,
            avg_expense_amount: t.average(),
        })
        .collect()
}

pub fn aggregate_by_month(expenses: &[Expense], filter: &BucketFilter) -> Vec<MonthlyBucket> {
    aggregate_by_period(expenses, Granularity::Month, filter)
}

/// Category totals ranked by amount, largest first. Categories are grouped
/// case-insensitively and labelled with the smallest spelling seen.
pub fn aggregate_by_category(expenses: &[Expense]) -> Vec<CategoryBucket> {
    let mut tallies: HashMap<String, (&str, Tally)> = HashMap::new();
    for expense in expenses {
        let (label, tally) = tallies
            .entry(category_key(&expense.category))
            .or_insert_with(|| (expense.category.as_str(), Tally::default()));
        if expense.category.as_str() < *label {
            *label = expense.category.as_str();
        }
        tally.add(expense);
    }
    let grand_total: f64 = tallies.values().map(|(_, t)| t.total).sum();

    let mut buckets: Vec<CategoryBucket> = tallies
        .into_values()
        .map(|(category, t)| CategoryBucket {
            category: category.to_string(),
            total_amount: t.total,
            expense_count: t.count,
            by_partner: t.by_partner,
            avg_expense_amount: t.average(),
            percentage: if grand_total > 0.0 { t.total / grand_total * 100.0 } else { 0.0 },
        })
        .collect();
    buckets.sort_by(|x, y| {
        y.total_amount
            .total_cmp(&x.total_amount)
            .then_with(|| x.category.cmp(&y.category))
    });
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::tests::expense;
    use crate::models::Partners;
    use crate::validate::tests::raw_expense;
    use crate::validate::validate_expenses;

    fn categorized(id: i64, amount: f64, category: &str, payer: Partner, date: &str) -> Expense {
        Expense {
            category: category.to_string(),
            ..expense(id, amount, Some(payer), date)
        }
    }

    fn sample() -> Vec<Expense> {
        vec![
            categorized(1, 30.0, "Food", Partner::A, "2024-01-03"),
            categorized(2, 20.0, "Food", Partner::B, "2024-01-20"),
            categorized(3, 10.0, "Transport", Partner::A, "2024-02-01"),
            categorized(4, 45.0, "Rent", Partner::B, "2024-03-31"),
            categorized(5, 5.0, "Transport", Partner::B, "2024-02-14"),
        ]
    }

    #[test]
    fn test_bucket_keys() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(bucket_key(d, Granularity::Month), "2024-01");
        assert_eq!(bucket_key(d, Granularity::Week), "2024-W01");
        // 2024-12-30 belongs to ISO week 1 of 2025
        let d = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        assert_eq!(bucket_key(d, Granularity::Week), "2025-W01");
    }

    #[test]
    fn test_monthly_totals_and_order() {
        let months = aggregate_by_month(&sample(), &BucketFilter::default());
        let keys: Vec<&str> = months.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["2024-01", "2024-02", "2024-03"]);

        let jan = &months[0];
        assert_eq!(jan.total_amount, 50.0);
        assert_eq!(jan.expense_count, 2);
        assert_eq!(jan.avg_expense_amount, 25.0);
        assert_eq!(jan.by_partner.a, 30.0);
        assert_eq!(jan.by_partner.b, 20.0);
    }

    #[test]
    fn test_monthly_is_permutation_invariant() {
        let mut expenses = sample();
        let forward = aggregate_by_month(&expenses, &BucketFilter::default());
        expenses.reverse();
        expenses.swap(0, 2);
        assert_eq!(aggregate_by_month(&expenses, &BucketFilter::default()), forward);
    }

    #[test]
    fn test_malformed_record_does_not_change_aggregation() {
        let partners = Partners::new("a", "b");
        let with_bad = validate_expenses(
            &[
                raw_expense(1, 10.0, "Food", "a", "2024-01-01"),
                raw_expense(2, 99.0, "Food", "a", "not-a-date"),
                raw_expense(3, 15.0, "Food", "b", "2024-02-01"),
            ],
            &partners,
        );
        let clean = validate_expenses(
            &[
                raw_expense(1, 10.0, "Food", "a", "2024-01-01"),
                raw_expense(3, 15.0, "Food", "b", "2024-02-01"),
            ],
            &partners,
        );
        let filter = BucketFilter::default();
        assert_eq!(aggregate_by_month(&with_bad, &filter), aggregate_by_month(&clean, &filter));
        assert_eq!(aggregate_by_category(&with_bad), aggregate_by_category(&clean));
    }

    #[test]
    fn test_filters() {
        let expenses = sample();
        let filter = BucketFilter {
            from: NaiveDate::from_ymd_opt(2024, 1, 10),
            to: NaiveDate::from_ymd_opt(2024, 2, 28),
            ..Default::default()
        };
        let months = aggregate_by_month(&expenses, &filter);
        assert_eq!(months.iter().map(|m| m.expense_count).sum::<usize>(), 3);

        let filter = BucketFilter {
            categories: vec!["transport".to_string()],
            ..Default::default()
        };
        let months = aggregate_by_month(&expenses, &filter);
        assert_eq!(months.len(), 1);
        assert_eq!(months[0].total_amount, 15.0);

        let filter = BucketFilter {
            partners: vec![Partner::A],
            ..Default::default()
        };
        let total: f64 = aggregate_by_month(&expenses, &filter).iter().map(|m| m.total_amount).sum();
        assert_eq!(total, 40.0);
    }

    #[test]
    fn test_partner_filter_drops_unknown_payers() {
        let expenses = vec![expense(1, 10.0, None, "2024-01-01")];
        let filter = BucketFilter {
            partners: vec![Partner::A, Partner::B],
            ..Default::default()
        };
        assert!(aggregate_by_month(&expenses, &filter).is_empty());
        assert_eq!(aggregate_by_month(&expenses, &BucketFilter::default())[0].total_amount, 10.0);
    }

    #[test]
    fn test_weekly_buckets() {
        let weeks = aggregate_by_period(&sample(), Granularity::Week, &BucketFilter::default());
        assert_eq!(weeks.first().map(|w| w.key.as_str()), Some("2024-W01"));
        assert!(weeks.windows(2).all(|w| w[0].key < w[1].key));
    }

    #[test]
    fn test_category_ranking_and_percentages() {
        let cats = aggregate_by_category(&sample());
        let names: Vec<&str> = cats.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["Food", "Rent", "Transport"]);
        assert_eq!(cats[0].total_amount, 50.0);
        assert_eq!(cats[2].expense_count, 2);
        assert_eq!(cats[2].avg_expense_amount, 7.5);
        let pct: f64 = cats.iter().map(|c| c.percentage).sum();
        assert!((pct - 100.0).abs() < 0.1);
    }

    #[test]
    fn test_categories_group_case_insensitively() {
        let expenses = vec![
            categorized(1, 10.0, "food", Partner::A, "2024-01-01"),
            categorized(2, 15.0, "Food", Partner::B, "2024-01-02"),
            categorized(3, 5.0, "FOOD", Partner::A, "2024-01-03"),
        ];
        let cats = aggregate_by_category(&expenses);
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0].category, "FOOD");
        assert_eq!(cats[0].total_amount, 30.0);
        assert_eq!(cats[0].expense_count, 3);

        let mut reversed = expenses.clone();
        reversed.reverse();
        assert_eq!(aggregate_by_category(&reversed), cats);

        let filter = BucketFilter {
            categories: vec!["fOOd".to_string()],
            ..Default::default()
        };
        assert_eq!(aggregate_by_month(&expenses, &filter)[0].expense_count, 3);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_by_month(&[], &BucketFilter::default()).is_empty());
        assert!(aggregate_by_category(&[]).is_empty());
    }

    #[test]
    fn test_zero_amounts_do_not_divide_by_zero() {
        let cats = aggregate_by_category(&[categorized(1, 0.0, "Gift", Partner::A, "2024-01-01")]);
        assert_eq!(cats[0].percentage, 0.0);
        assert_eq!(cats[0].avg_expense_amount, 0.0);
    }
}
