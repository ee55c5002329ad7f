use comfy_table::{Cell, Table};
use tracing::info;

use crate::cli::{load_ledger, open_db, print_json, today};
use crate::db;
use crate::error::Result;
use crate::fmt::money;
use crate::models::{NewSettlement, RawSettlement};
use crate::settings::load_settings;
use crate::validate::validate_settlement;

pub fn add(
    amount: f64,
    from: &str,
    to: &str,
    date: Option<&str>,
    description: Option<String>,
) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let partners = &settings.partners;
    let date = date.map(str::to_string).unwrap_or_else(|| today().format("%Y-%m-%d").to_string());

    let settlement = validate_settlement(
        &RawSettlement {
            id: 0,
            amount,
            paid_by_id: from.to_string(),
            paid_to_id: to.to_string(),
            description: description.filter(|d| !d.trim().is_empty()),
            date,
            created_at: None,
        },
        partners,
    )?;

    let id = db::insert_settlement(
        &conn,
        &NewSettlement {
            amount: settlement.amount,
            paid_by_id: partners.id(settlement.paid_by).to_string(),
            paid_to_id: partners.id(settlement.paid_to).to_string(),
            date: settlement.date.format("%Y-%m-%d").to_string(),
            description: settlement.description,
            created_at: None,
        },
    )?;
    info!(id, "settlement added");
    println!(
        "Recorded settlement {id}: {} paid {} {}",
        partners.label(settlement.paid_by),
        partners.label(settlement.paid_to),
        money(settlement.amount, &settings.money)
    );
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    db::delete_settlement(&conn, id)?;
    info!(id, "settlement deleted");
    println!("Deleted settlement {id}");
    Ok(())
}

pub fn list(json: bool) -> Result<()> {
    let ledger = load_ledger()?;
    if json {
        return print_json(&ledger.settlements);
    }
    if ledger.settlements.is_empty() {
        println!("No settlements recorded.");
        return Ok(());
    }

    let partners = &ledger.settings.partners;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "From", "To", "Amount", "Description"]);
    for s in &ledger.settlements {
        table.add_row(vec![
            Cell::new(s.id),
            Cell::new(s.date),
            Cell::new(partners.label(s.paid_by)),
            Cell::new(partners.label(s.paid_to)),
            Cell::new(money(s.amount, &ledger.settings.money)),
            Cell::new(s.description.as_deref().unwrap_or("")),
        ]);
    }
    println!("Settlements\n{table}");
    Ok(())
}
