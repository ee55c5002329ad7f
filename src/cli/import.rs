use std::path::Path;

use crate::cli::open_db;
use crate::error::Result;
use crate::importer::import_expenses_csv;
use crate::settings::load_settings;

pub fn run(file: &str) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let result = import_expenses_csv(&conn, Path::new(file), &settings.partners)?;

    if result.duplicate_file {
        println!("This file has already been imported.");
        return Ok(());
    }
    println!("Imported {} expenses ({} rows skipped)", result.imported, result.skipped);
    Ok(())
}
