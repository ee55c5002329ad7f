use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::balance::{compute_balance_with_settlements, OwingDirection};
use crate::buckets::{
    aggregate_by_category, aggregate_by_month, aggregate_by_period, BucketFilter, Granularity,
};
use crate::cli::{load_ledger, parse_date_arg, print_json, resolve_partner, today, Ledger};
use crate::error::Result;
use crate::fmt::{money, percent};
use crate::history::{reconstruct_balance_history, EntryKind};
use crate::models::{Partner, Partners};
use crate::trends::{
    collapse_to_blocks, compare_periods, compare_user_spending, compute_time_patterns,
    rank_top_categories, Trend,
};

fn granularity(week: bool) -> Granularity {
    if week {
        Granularity::Week
    } else {
        Granularity::Month
    }
}

fn trend_cell(trend: Trend) -> String {
    match trend {
        Trend::Up => "▲ up".red().to_string(),
        Trend::Down => "▼ down".green().to_string(),
        Trend::Stable => "= stable".to_string(),
    }
}

fn owing_sentence(partners: &Partners, direction: OwingDirection, amount: String) -> String {
    match direction.debtor() {
        Some(debtor) => format!(
            "{} owes {} {amount}",
            partners.label(debtor),
            partners.label(debtor.other())
        ),
        None => "All square".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Balance
// ---------------------------------------------------------------------------

pub fn balance(json: bool) -> Result<()> {
    let Ledger { settings, expenses, settlements } = load_ledger()?;
    let state = compute_balance_with_settlements(&expenses, &settlements);
    if json {
        return print_json(&state);
    }

    let fmt = &settings.money;
    let partners = &settings.partners;
    let mut table = Table::new();
    table.set_header(vec!["", partners.label(Partner::A), partners.label(Partner::B)]);
    table.add_row(vec![
        Cell::new("Paid"),
        Cell::new(money(state.total_by_partner.a, fmt)),
        Cell::new(money(state.total_by_partner.b, fmt)),
    ]);
    table.add_row(vec![
        Cell::new("Fair share"),
        Cell::new(money(state.fair_share, fmt)),
        Cell::new(money(state.fair_share, fmt)),
    ]);
    table.add_row(vec![
        Cell::new("Settlements paid"),
        Cell::new(money(state.settlements_out.a, fmt)),
        Cell::new(money(state.settlements_out.b, fmt)),
    ]);
    table.add_row(vec![
        Cell::new("Settlements received"),
        Cell::new(money(state.settlements_in.a, fmt)),
        Cell::new(money(state.settlements_in.b, fmt)),
    ]);
    println!("Balance\n{table}");
    println!("Combined spending: {}", money(state.combined_total, fmt));

    let headline = owing_sentence(partners, state.direction, money(state.net_balance, fmt));
    println!("{}", headline.bold());
    if settlements.is_empty() {
        return Ok(());
    }
    let settled = owing_sentence(
        partners,
        state.settled_direction(),
        money(state.settled_net_signed.abs(), fmt),
    );
    println!("After settlements: {settled}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Monthly / weekly
// ---------------------------------------------------------------------------

pub fn monthly(
    json: bool,
    week: bool,
    from_date: Option<String>,
    to_date: Option<String>,
    categories: Vec<String>,
    partner_ids: Vec<String>,
) -> Result<()> {
    let ledger = load_ledger()?;
    let partners = &ledger.settings.partners;
    let filter = BucketFilter {
        from: from_date.as_deref().map(parse_date_arg).transpose()?,
        to: to_date.as_deref().map(parse_date_arg).transpose()?,
        categories,
        partners: partner_ids
            .iter()
            .map(|id| resolve_partner(partners, id))
            .collect::<Result<Vec<_>>>()?,
    };
    let buckets = if week {
        aggregate_by_period(&ledger.expenses, Granularity::Week, &filter)
    } else {
        aggregate_by_month(&ledger.expenses, &filter)
    };
    if json {
        return print_json(&buckets);
    }
    if buckets.is_empty() {
        println!("No expenses found.");
        return Ok(());
    }

    let fmt = &ledger.settings.money;
    let mut table = Table::new();
    table.set_header(vec![
        if week { "Week" } else { "Month" },
        "Total",
        "Count",
        "Average",
        partners.label(Partner::A),
        partners.label(Partner::B),
    ]);
    for b in &buckets {
        table.add_row(vec![
            Cell::new(&b.key),
            Cell::new(money(b.total_amount, fmt)),
            Cell::new(b.expense_count),
            Cell::new(money(b.avg_expense_amount, fmt)),
            Cell::new(money(b.by_partner.a, fmt)),
            Cell::new(money(b.by_partner.b, fmt)),
        ]);
    }
    let title = if week { "Weekly Spending" } else { "Monthly Spending" };
    println!("{title}\n{table}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

pub fn categories(json: bool) -> Result<()> {
    let ledger = load_ledger()?;
    let buckets = aggregate_by_category(&ledger.expenses);
    if json {
        return print_json(&buckets);
    }

    let fmt = &ledger.settings.money;
    let mut table = Table::new();
    table.set_header(vec!["Category", "Amount", "%", "Count", "Average"]);
    for b in &buckets {
        table.add_row(vec![
            Cell::new(&b.category),
            Cell::new(money(b.total_amount, fmt)),
            Cell::new(percent(b.percentage)),
            Cell::new(b.expense_count),
            Cell::new(money(b.avg_expense_amount, fmt)),
        ]);
    }
    let total: f64 = buckets.iter().map(|b| b.total_amount).sum();
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(money(total, fmt)),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
    ]);
    println!("Spending by Category\n{table}");
    Ok(())
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

pub fn history(json: bool) -> Result<()> {
    let ledger = load_ledger()?;
    let points = reconstruct_balance_history(&ledger.expenses, &ledger.settlements);
    if json {
        return print_json(&points);
    }
    if points.is_empty() {
        println!("No activity recorded.");
        return Ok(());
    }

    let fmt = &ledger.settings.money;
    let mut table = Table::new();
    table.set_header(vec!["Date", "Entry", "Amount", "Balance", "Spent to Date", "Settled to Date"]);
    for p in &points {
        let entry = match p.kind {
            EntryKind::Expense => format!("expense #{}", p.record_id),
            EntryKind::Settlement => format!("settlement #{}", p.record_id),
        };
        let running = if p.running_balance >= 0.0 {
            money(p.running_balance, fmt)
        } else {
            money(p.running_balance, fmt).yellow().to_string()
        };
        table.add_row(vec![
            Cell::new(p.date),
            Cell::new(entry),
            Cell::new(money(p.amount, fmt)),
            Cell::new(running),
            Cell::new(money(p.cumulative_expenses, fmt)),
            Cell::new(money(p.cumulative_settlements, fmt)),
        ]);
    }
    println!("Balance History\n{table}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Comparisons
// ---------------------------------------------------------------------------

pub fn compare(json: bool, days: Option<u32>) -> Result<()> {
    let ledger = load_ledger()?;
    let days = days.unwrap_or(ledger.settings.default_period_days);
    let rows = compare_periods(&ledger.expenses, days, today());
    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No spending in the last {days} days.");
        return Ok(());
    }

    let fmt = &ledger.settings.money;
    let mut table = Table::new();
    table.set_header(vec!["Category", "Last Period", "This Period", "Change", "Change %", "Trend"]);
    for r in &rows {
        table.add_row(vec![
            Cell::new(&r.category),
            Cell::new(money(r.previous_amount, fmt)),
            Cell::new(money(r.current_amount, fmt)),
            Cell::new(money(r.change, fmt)),
            Cell::new(percent(r.change_percent)),
            Cell::new(trend_cell(r.trend)),
        ]);
    }
    println!("Last {days} Days vs Previous {days}\n{table}");
    Ok(())
}

pub fn users(json: bool, week: bool) -> Result<()> {
    let ledger = load_ledger()?;
    let points = compare_user_spending(&ledger.expenses, granularity(week));
    if json {
        return print_json(&points);
    }
    if points.is_empty() {
        println!("No expenses found.");
        return Ok(());
    }

    let fmt = &ledger.settings.money;
    let partners = &ledger.settings.partners;
    let mut table = Table::new();
    table.set_header(vec![
        if week { "Week" } else { "Month" },
        partners.label(Partner::A),
        partners.label(Partner::B),
        "Difference",
        "Spent More",
        "Total",
        "Trend",
    ]);
    for p in &points {
        table.add_row(vec![
            Cell::new(&p.key),
            Cell::new(money(p.amount_a, fmt)),
            Cell::new(money(p.amount_b, fmt)),
            Cell::new(money(p.difference.abs(), fmt)),
            Cell::new(p.leader.map(|l| partners.label(l)).unwrap_or("—")),
            Cell::new(money(p.total, fmt)),
            Cell::new(trend_cell(p.trend)),
        ]);
    }
    println!("Spending by Partner\n{table}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

pub fn patterns(json: bool, blocks: bool) -> Result<()> {
    let ledger = load_ledger()?;
    let cells = compute_time_patterns(&ledger.expenses);
    let fmt = &ledger.settings.money;

    if blocks {
        let collapsed = collapse_to_blocks(&cells);
        if json {
            return print_json(&collapsed);
        }
        let mut table = Table::new();
        table.set_header(vec!["Day", "Time of Day", "Count", "Amount"]);
        for c in &collapsed {
            table.add_row(vec![
                Cell::new(c.weekday),
                Cell::new(c.block.label()),
                Cell::new(c.count),
                Cell::new(money(c.amount, fmt)),
            ]);
        }
        println!("Spending by Time of Day\n{table}");
        return Ok(());
    }

    if json {
        return print_json(&cells);
    }
    let mut table = Table::new();
    table.set_header(vec!["Day", "Hour", "Count", "Amount"]);
    for c in &cells {
        table.add_row(vec![
            Cell::new(c.weekday),
            Cell::new(format!("{:02}:00", c.hour)),
            Cell::new(c.count),
            Cell::new(money(c.amount, fmt)),
        ]);
    }
    println!("Spending by Hour\n{table}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Top categories
// ---------------------------------------------------------------------------

pub fn top(json: bool, limit: usize, days: Option<u32>) -> Result<()> {
    let ledger = load_ledger()?;
    let days = days.unwrap_or(ledger.settings.default_period_days);
    let ranked = rank_top_categories(&ledger.expenses, limit, days, today());
    if json {
        return print_json(&ranked);
    }

    let fmt = &ledger.settings.money;
    let mut table = Table::new();
    table.set_header(vec!["#", "Category", "Amount", "% of Spend", "% of Expenses", "Trend"]);
    for r in &ranked {
        table.add_row(vec![
            Cell::new(r.rank),
            Cell::new(&r.category),
            Cell::new(money(r.total_amount, fmt)),
            Cell::new(percent(r.share_of_amount)),
            Cell::new(percent(r.share_of_count)),
            Cell::new(trend_cell(r.trend)),
        ]);
    }
    println!("Top {limit} Categories (trend over {days} days)\n{table}");
    Ok(())
}
