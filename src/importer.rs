use std::path::Path;

use rusqlite::Connection;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::db::insert_expense;
use crate::error::{Result, TandemError};
use crate::models::{NewExpense, Partners, RawExpense};
use crate::validate::{parse_date, validate_expense};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Lenient amount parsing: strips `$`, thousands separators and quotes;
/// `(12.50)` reads as negative.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.replace([',', '"', '$'], "");
    let s = s.trim();
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return inner.trim().parse::<f64>().ok().map(|v| -v);
    }
    s.parse().ok()
}

/// Normalize `MM/DD/YYYY` to `YYYY-MM-DD`; anything else is returned as-is
/// for validation to judge.
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    if parse_date(raw).is_some() {
        return raw.to_string();
    }
    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() == 3 {
        if let (Ok(m), Ok(d), Ok(y)) = (parts[0].parse::<u32>(), parts[1].parse::<u32>(), parts[2].parse::<i32>()) {
            if let Some(date) = chrono::NaiveDate::from_ymd_opt(y, m, d) {
                return date.format("%Y-%m-%d").to_string();
            }
        }
    }
    raw.to_string()
}

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

struct Columns {
    date: usize,
    amount: usize,
    category: usize,
    paid_by: usize,
    description: Option<usize>,
}

fn find_columns(headers: &csv::StringRecord) -> Result<Columns> {
    let find = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
    };
    let require = |names: &[&str]| {
        find(names).ok_or_else(|| TandemError::InvalidInput(format!("missing CSV column: {}", names[0])))
    };
    Ok(Columns {
        date: require(&["date"])?,
        amount: require(&["amount"])?,
        category: require(&["category"])?,
        paid_by: require(&["paid_by", "paid by", "payer"])?,
        description: find(&["description", "note", "notes"]),
    })
}

/// Read an expense CSV into raw records. Ids are 1-based row numbers and only
/// identify rows in log output.
pub fn read_expense_rows(file_path: &Path) -> Result<Vec<RawExpense>> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let cols = find_columns(rdr.headers()?)?;

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let field = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();
        let description = cols.description.map(field).filter(|d| !d.is_empty());
        rows.push(RawExpense {
            id: i as i64 + 1,
            amount: parse_amount(&field(cols.amount)).unwrap_or(f64::NAN),
            category: field(cols.category),
            paid_by_id: field(cols.paid_by),
            date: normalize_date(&field(cols.date)),
            created_at: None,
            description,
        });
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// import_expenses_csv
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub duplicate_file: bool,
}

pub fn import_expenses_csv(conn: &Connection, file_path: &Path, partners: &Partners) -> Result<ImportResult> {
    let checksum = compute_checksum(file_path)?;
    {
        let mut stmt = conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1")?;
        if stmt.exists([&checksum])? {
            return Ok(ImportResult {
                imported: 0,
                skipped: 0,
                duplicate_file: true,
            });
        }
    }

    let raw_rows = read_expense_rows(file_path)?;

    let tx = conn.unchecked_transaction()?;
    let mut imported = 0usize;
    let mut skipped = 0usize;
    for raw in &raw_rows {
        let expense = match validate_expense(raw, partners) {
            Ok(e) => e,
            Err(err) => {
                warn!(row = raw.id, "skipping CSV row: {err}");
                skipped += 1;
                continue;
            }
        };
        let Some(partner) = expense.paid_by else {
            warn!(row = raw.id, payer = %raw.paid_by_id, "skipping CSV row: unknown partner");
            skipped += 1;
            continue;
        };
        insert_expense(
            &tx,
            &NewExpense {
                amount: expense.amount,
                category: expense.category,
                paid_by_id: partners.id(partner).to_string(),
                date: expense.date.format("%Y-%m-%d").to_string(),
                description: expense.description,
                created_at: None,
            },
        )?;
        imported += 1;
    }

    tx.execute(
        "INSERT INTO imports (filename, checksum, record_count) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            file_path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
            checksum,
            imported as i64,
        ],
    )?;
    tx.commit()?;

    info!(imported, skipped, file = %file_path.display(), "import finished");
    Ok(ImportResult {
        imported,
        skipped,
        duplicate_file: false,
    })
}
