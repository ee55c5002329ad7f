use comfy_table::{Cell, Table};
use tracing::info;

use crate::cli::{load_ledger, open_db, print_json, resolve_partner, today};
use crate::db;
use crate::error::{Result, TandemError};
use crate::fmt::money;
use crate::models::{NewExpense, Partners, RawExpense};
use crate::settings::load_settings;
use crate::validate::validate_expense;

/// Validate user input the same way stored rows are validated, then pin the
/// payer to a known partner.
fn checked(
    partners: &Partners,
    amount: f64,
    category: &str,
    paid_by: &str,
    date: &str,
    description: Option<String>,
) -> Result<NewExpense> {
    let raw = RawExpense {
        id: 0,
        amount,
        category: category.to_string(),
        paid_by_id: paid_by.to_string(),
        date: date.to_string(),
        created_at: None,
        description: description.filter(|d| !d.trim().is_empty()),
    };
    let expense = validate_expense(&raw, partners)?;
    let partner = resolve_partner(partners, paid_by)?;
    Ok(NewExpense {
        amount: expense.amount,
        category: expense.category,
        paid_by_id: partners.id(partner).to_string(),
        date: expense.date.format("%Y-%m-%d").to_string(),
        description: expense.description,
        created_at: None,
    })
}

pub fn add(
    amount: f64,
    category: &str,
    paid_by: &str,
    date: Option<&str>,
    description: Option<String>,
) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let date = date.map(str::to_string).unwrap_or_else(|| today().format("%Y-%m-%d").to_string());
    let new = checked(&settings.partners, amount, category, paid_by, &date, description)?;
    let id = db::insert_expense(&conn, &new)?;
    info!(id, "expense added");
    println!(
        "Added expense {id}: {} {} paid by {}",
        money(new.amount, &settings.money),
        new.category,
        new.paid_by_id
    );
    Ok(())
}

pub fn update(
    id: i64,
    amount: f64,
    category: &str,
    paid_by: &str,
    date: &str,
    description: Option<String>,
) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let new = checked(&settings.partners, amount, category, paid_by, date, description)?;
    db::update_expense(&conn, id, &new)?;
    info!(id, "expense updated");
    println!("Updated expense {id}");
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let existing = db::get_expense(&conn, id)?.ok_or(TandemError::NotFound { kind: "expense", id })?;
    db::delete_expense(&conn, id)?;
    info!(id, "expense deleted");
    println!(
        "Deleted expense {id}: {} {} on {}",
        money(existing.amount, &settings.money),
        existing.category,
        existing.date
    );
    Ok(())
}

pub fn list(json: bool) -> Result<()> {
    let ledger = load_ledger()?;
    if json {
        return print_json(&ledger.expenses);
    }
    if ledger.expenses.is_empty() {
        println!("No expenses recorded.");
        return Ok(());
    }

    let partners = &ledger.settings.partners;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Category", "Amount", "Paid By", "Description"]);
    for e in &ledger.expenses {
        let payer = match e.paid_by {
            Some(p) => partners.label(p).to_string(),
            None => format!("{} (unknown)", e.paid_by_id),
        };
        table.add_row(vec![
            Cell::new(e.id),
            Cell::new(e.date),
            Cell::new(&e.category),
            Cell::new(money(e.amount, &ledger.settings.money)),
            Cell::new(payer),
            Cell::new(e.description.as_deref().unwrap_or("")),
        ]);
    }
    println!("Expenses\n{table}");
    Ok(())
}
