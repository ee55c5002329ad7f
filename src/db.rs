use std::path::Path;

use chrono::Local;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension};

use crate::error::{Result, TandemError};
use crate::models::{NewExpense, NewSettlement, RawExpense, RawSettlement};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS expenses (
    id INTEGER PRIMARY KEY,
    amount REAL NOT NULL,
    category TEXT NOT NULL,
    paid_by TEXT NOT NULL,
    date TEXT NOT NULL,
    description TEXT,
    created_at TEXT DEFAULT (datetime('now', 'localtime'))
);

CREATE TABLE IF NOT EXISTS settlements (
    id INTEGER PRIMARY KEY,
    amount REAL NOT NULL,
    paid_by TEXT NOT NULL,
    paid_to TEXT NOT NULL,
    description TEXT,
    date TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now', 'localtime'))
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    checksum TEXT NOT NULL,
    record_count INTEGER,
    import_date TEXT DEFAULT (datetime('now', 'localtime'))
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Local wall-clock time, the same clock demo and imported timestamps use.
fn local_timestamp() -> String {
    Local::now().naive_local().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Non-numeric amounts read as NaN so validation drops the row instead of the
/// whole listing failing.
fn amount_at(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<f64> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Real(v) => v,
        ValueRef::Integer(v) => v as f64,
        _ => f64::NAN,
    })
}

// ---------------------------------------------------------------------------
// Expenses
// ---------------------------------------------------------------------------

pub fn insert_expense(conn: &Connection, e: &NewExpense) -> Result<i64> {
    conn.execute(
        "INSERT INTO expenses (amount, category, paid_by, date, description, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            e.amount,
            e.category,
            e.paid_by_id,
            e.date,
            e.description,
            e.created_at.clone().unwrap_or_else(local_timestamp),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Replace every user-editable field of an expense.
pub fn update_expense(conn: &Connection, id: i64, e: &NewExpense) -> Result<()> {
    let changed = conn.execute(
        "UPDATE expenses SET amount = ?1, category = ?2, paid_by = ?3, date = ?4, description = ?5 \
         WHERE id = ?6",
        rusqlite::params![e.amount, e.category, e.paid_by_id, e.date, e.description, id],
    )?;
    if changed == 0 {
        return Err(TandemError::NotFound { kind: "expense", id });
    }
    Ok(())
}

pub fn delete_expense(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn.execute("DELETE FROM expenses WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(TandemError::NotFound { kind: "expense", id });
    }
    Ok(())
}

pub fn get_expense(conn: &Connection, id: i64) -> Result<Option<RawExpense>> {
    let row = conn
        .query_row(
            "SELECT id, amount, category, paid_by, date, created_at, description \
             FROM expenses WHERE id = ?1",
            [id],
            expense_from_row,
        )
        .optional()?;
    Ok(row)
}

/// All expenses in insertion order.
pub fn list_expenses(conn: &Connection) -> Result<Vec<RawExpense>> {
    let mut stmt = conn.prepare(
        "SELECT id, amount, category, paid_by, date, created_at, description \
         FROM expenses ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], expense_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn expense_from_row(row: &rusqlite::Row) -> rusqlite::Result<RawExpense> {
    Ok(RawExpense {
        id: row.get(0)?,
        amount: amount_at(row, 1)?,
        category: row.get(2)?,
        paid_by_id: row.get(3)?,
        date: row.get(4)?,
        created_at: row.get(5)?,
        description: row.get(6)?,
    })
}

// ---------------------------------------------------------------------------
// Settlements
// ---------------------------------------------------------------------------

pub fn insert_settlement(conn: &Connection, s: &NewSettlement) -> Result<i64> {
    conn.execute(
        "INSERT INTO settlements (amount, paid_by, paid_to, description, date, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            s.amount,
            s.paid_by_id,
            s.paid_to_id,
            s.description,
            s.date,
            s.created_at.clone().unwrap_or_else(local_timestamp),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn delete_settlement(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn.execute("DELETE FROM settlements WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(TandemError::NotFound { kind: "settlement", id });
    }
    Ok(())
}

/// All settlements in insertion order.
pub fn list_settlements(conn: &Connection) -> Result<Vec<RawSettlement>> {
    let mut stmt = conn.prepare(
        "SELECT id, amount, paid_by, paid_to, description, date, created_at \
         FROM settlements ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(RawSettlement {
                id: row.get(0)?,
                amount: amount_at(row, 1)?,
                paid_by_id: row.get(2)?,
                paid_to_id: row.get(3)?,
                description: row.get(4)?,
                date: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    let sql = format!("SELECT count(*) FROM {table}");
    Ok(conn.query_row(&sql, [], |r| r.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buckets::aggregate_by_category;
    use crate::models::Partners;
    use crate::validate::{parse_timestamp, validate_expenses, validate_settlements};

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn lunch(amount: f64, payer: &str) -> NewExpense {
        NewExpense {
            amount,
            category: "Food".to_string(),
            paid_by_id: payer.to_string(),
            date: "2025-01-15".to_string(),
            description: Some("Lunch".to_string()),
            created_at: None,
        }
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["expenses", "settlements", "imports"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_expense_crud() {
        let (_dir, conn) = test_db();
        let first = insert_expense(&conn, &lunch(12.5, "a")).unwrap();
        let second = insert_expense(&conn, &lunch(7.0, "b")).unwrap();

        let listed = list_expenses(&conn).unwrap();
        assert_eq!(listed.iter().map(|e| e.id).collect::<Vec<_>>(), vec![first, second]);
        assert!(listed[0].created_at.is_some());

        let mut changed = lunch(20.0, "b");
        changed.category = "Groceries".to_string();
        changed.description = None;
        update_expense(&conn, first, &changed).unwrap();
        let row = get_expense(&conn, first).unwrap().unwrap();
        assert_eq!(row.amount, 20.0);
        assert_eq!(row.category, "Groceries");
        assert_eq!(row.paid_by_id, "b");
        assert_eq!(row.description, None);

        delete_expense(&conn, second).unwrap();
        assert_eq!(count_rows(&conn, "expenses").unwrap(), 1);
    }

    #[test]
    fn test_missing_ids_are_not_found() {
        let (_dir, conn) = test_db();
        assert!(matches!(
            delete_expense(&conn, 42),
            Err(TandemError::NotFound { kind: "expense", id: 42 })
        ));
        assert!(matches!(
            update_expense(&conn, 7, &lunch(1.0, "a")),
            Err(TandemError::NotFound { .. })
        ));
        assert!(matches!(delete_settlement(&conn, 1), Err(TandemError::NotFound { .. })));
        assert!(get_expense(&conn, 3).unwrap().is_none());
    }

    #[test]
    fn test_explicit_created_at_is_kept() {
        let (_dir, conn) = test_db();
        let mut e = lunch(3.0, "a");
        e.created_at = Some("2025-01-15 19:45:00".to_string());
        insert_expense(&conn, &e).unwrap();
        let listed = list_expenses(&conn).unwrap();
        assert_eq!(listed[0].created_at.as_deref(), Some("2025-01-15 19:45:00"));
    }

    #[test]
    fn test_non_numeric_amount_does_not_fail_listing() {
        let (_dir, conn) = test_db();
        insert_expense(&conn, &lunch(12.0, "a")).unwrap();
        conn.execute(
            "INSERT INTO expenses (amount, category, paid_by, date) VALUES ('abc', 'Food', 'b', '2025-01-16')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO settlements (amount, paid_by, paid_to, date) VALUES ('lots', 'a', 'b', '2025-01-16')",
            [],
        )
        .unwrap();

        let listed = list_expenses(&conn).unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[1].amount.is_nan());

        let partners = Partners::new("a", "b");
        let valid = validate_expenses(&listed, &partners);
        assert_eq!(valid.len(), 1);
        let cats = aggregate_by_category(&valid);
        assert_eq!(cats[0].total_amount, 12.0);

        let settlements = list_settlements(&conn).unwrap();
        assert!(validate_settlements(&settlements, &partners).is_empty());
    }

    #[test]
    fn test_default_created_at_is_local_time() {
        let (_dir, conn) = test_db();
        let before = Local::now().naive_local();
        insert_expense(&conn, &lunch(3.0, "a")).unwrap();
        let after = Local::now().naive_local();

        let stored = list_expenses(&conn).unwrap()[0].created_at.clone().unwrap();
        let stamp = parse_timestamp(&stored).unwrap();
        // Stored at second precision
        assert!(stamp >= before - chrono::Duration::seconds(1) && stamp <= after, "{stored}");
    }

    #[test]
    fn test_settlement_crud() {
        let (_dir, conn) = test_db();
        let id = insert_settlement(
            &conn,
            &NewSettlement {
                amount: 40.0,
                paid_by_id: "b".to_string(),
                paid_to_id: "a".to_string(),
                date: "2025-02-01".to_string(),
                description: None,
                created_at: None,
            },
        )
        .unwrap();
        let listed = list_settlements(&conn).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].paid_to_id, "a");
        delete_settlement(&conn, id).unwrap();
        assert!(list_settlements(&conn).unwrap().is_empty());
    }
}
