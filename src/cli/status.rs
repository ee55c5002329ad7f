use crate::db::{count_rows, get_connection};
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::{db_path, load_settings};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = db_path(&settings);

    println!("Partner A:  {} ({})", settings.partners.a.label(), settings.partners.a.id);
    println!("Partner B:  {} ({})", settings.partners.b.label(), settings.partners.b.id);
    println!("Currency:   {}", settings.money.symbol);
    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;
        println!();
        println!("Expenses:      {}", count_rows(&conn, "expenses")?);
        println!("Settlements:   {}", count_rows(&conn, "settlements")?);
        println!("Imports:       {}", count_rows(&conn, "imports")?);
    } else {
        println!();
        println!("Database not found. Run `tandem init` to set up.");
    }

    Ok(())
}
