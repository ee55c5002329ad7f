use chrono::{Datelike, Local, NaiveDate};
use rusqlite::Connection;

use crate::cli::open_db;
use crate::db::{count_rows, init_db, insert_expense, insert_settlement};
use crate::error::Result;
use crate::models::{NewExpense, NewSettlement, Partner, Partners};
use crate::settings::load_settings;

const MONTHS: u32 = 6;

/// Recurring expenses generated every month.
struct RecurringExpense {
    day: u32,
    hour: u32,
    category: &'static str,
    description: &'static str,
    amount: f64,
    payer: Partner,
}

const RECURRING: &[RecurringExpense] = &[
    RecurringExpense { day: 1, hour: 9, category: "Rent", description: "Apartment rent", amount: 1400.00, payer: Partner::A },
    RecurringExpense { day: 4, hour: 20, category: "Utilities", description: "Electricity", amount: 64.30, payer: Partner::B },
    RecurringExpense { day: 10, hour: 21, category: "Utilities", description: "Internet", amount: 39.99, payer: Partner::A },
    RecurringExpense { day: 15, hour: 12, category: "Subscriptions", description: "Streaming", amount: 15.49, payer: Partner::B },
];

/// Rotating one-off expenses: each month picks a subset based on index.
struct RotatingExpense {
    day: u32,
    hour: u32,
    category: &'static str,
    description: &'static str,
    amount: f64,
}

const ROTATING: &[RotatingExpense] = &[
    RotatingExpense { day: 3, hour: 18, category: "Groceries", description: "Weekly shop", amount: 86.40 },
    RotatingExpense { day: 7, hour: 13, category: "Dining", description: "Lunch out", amount: 32.50 },
    RotatingExpense { day: 9, hour: 19, category: "Groceries", description: "Market", amount: 54.75 },
    RotatingExpense { day: 12, hour: 8, category: "Transport", description: "Fuel", amount: 48.00 },
    RotatingExpense { day: 16, hour: 22, category: "Dining", description: "Takeaway", amount: 27.80 },
    RotatingExpense { day: 19, hour: 11, category: "Household", description: "Cleaning supplies", amount: 21.35 },
    RotatingExpense { day: 22, hour: 17, category: "Groceries", description: "Weekly shop", amount: 92.10 },
    RotatingExpense { day: 25, hour: 2, category: "Entertainment", description: "Concert tickets", amount: 120.00 },
    RotatingExpense { day: 27, hour: 15, category: "Transport", description: "Train tickets", amount: 36.20 },
];

/// Clamp a day to the last valid day of the given year/month.
fn clamp_day(year: i32, month: u32, day: u32) -> u32 {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
        .min(day)
}

fn stamp(year: i32, month: u32, day: u32, hour: u32) -> (String, String) {
    let d = clamp_day(year, month, day);
    let date = format!("{year:04}-{month:02}-{d:02}");
    let created_at = format!("{date} {hour:02}:{:02}:00", (day * 7) % 60);
    (date, created_at)
}

fn insert_demo_data(conn: &Connection, partners: &Partners) -> Result<(usize, usize)> {
    let today = Local::now().date_naive();
    let mut expenses = 0usize;
    let mut settlements = 0usize;

    let tx = conn.unchecked_transaction()?;
    for i in 0..MONTHS {
        let target = today - chrono::Months::new(MONTHS - 1 - i);
        let (year, month) = (target.year(), target.month());
        let idx = i as usize;

        for r in RECURRING {
            let (date, created_at) = stamp(year, month, r.day, r.hour);
            insert_expense(
                &tx,
                &NewExpense {
                    amount: r.amount,
                    category: r.category.to_string(),
                    paid_by_id: partners.id(r.payer).to_string(),
                    date,
                    description: Some(r.description.to_string()),
                    created_at: Some(created_at),
                },
            )?;
            expenses += 1;
        }

        // Four rotating extras per month, payer alternating
        for j in 0..4usize {
            let pick = (idx * 4 + j) % ROTATING.len();
            let r = &ROTATING[pick];
            let payer = if (idx + j) % 2 == 0 { Partner::A } else { Partner::B };
            let vary = 1.0 + ((idx + j) % 5) as f64 * 0.04;
            let (date, created_at) = stamp(year, month, r.day, r.hour);
            insert_expense(
                &tx,
                &NewExpense {
                    amount: (r.amount * vary * 100.0).round() / 100.0,
                    category: r.category.to_string(),
                    paid_by_id: partners.id(payer).to_string(),
                    date,
                    description: Some(r.description.to_string()),
                    created_at: Some(created_at),
                },
            )?;
            expenses += 1;
        }

        // B squares up part of the rent every other month
        if idx % 2 == 1 {
            let (date, created_at) = stamp(year, month, 28, 10);
            insert_settlement(
                &tx,
                &NewSettlement {
                    amount: 500.0,
                    paid_by_id: partners.id(Partner::B).to_string(),
                    paid_to_id: partners.id(Partner::A).to_string(),
                    date,
                    description: Some("Rent share".to_string()),
                    created_at: Some(created_at),
                },
            )?;
            settlements += 1;
        }
    }
    tx.commit()?;

    Ok((expenses, settlements))
}

pub fn run() -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    init_db(&conn)?;

    // Idempotency guard
    if count_rows(&conn, "expenses")? > 0 {
        println!("Demo data not loaded: the ledger already has expenses.");
        return Ok(());
    }

    let (expenses, settlements) = insert_demo_data(&conn, &settings.partners)?;

    println!("Demo data loaded!");
    println!("  Expenses:     {expenses}");
    println!("  Settlements:  {settlements}");
    println!();
    println!("Try these next:");
    println!("  tandem report balance");
    println!("  tandem report monthly");
    println!("  tandem report categories");
    println!("  tandem report history");
    println!("  tandem report top");
    println!("  tandem report patterns --blocks");

    Ok(())
}
