use std::path::PathBuf;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::models::PartnerInfo;
use crate::settings::{db_path, load_settings, save_settings, shellexpand_path, Settings};

pub fn run(
    data_dir: Option<String>,
    partner_a: Option<String>,
    partner_b: Option<String>,
    currency: Option<String>,
) -> Result<()> {
    let mut settings = load_settings();
    let defaults = Settings::default();

    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    } else if settings.data_dir == defaults.data_dir && settings.partners == defaults.partners {
        // First run: prompt for data dir
        let default = &settings.data_dir;
        println!("Data directory [{}]: ", default);
        let mut input = String::new();
        std::io::stdin().read_line(&mut input).ok();
        let chosen = input.trim();
        if !chosen.is_empty() {
            settings.data_dir = shellexpand_path(chosen);
        }
    }

    if let Some(id) = partner_a {
        settings.partners.a = PartnerInfo::new(&id, &id);
    }
    if let Some(id) = partner_b {
        settings.partners.b = PartnerInfo::new(&id, &id);
    }
    if let Some(symbol) = currency {
        settings.money.symbol = symbol;
    }

    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;

    let conn = get_connection(&db_path(&settings))?;
    init_db(&conn)?;

    println!("Initialized tandem at {}", resolved.display());
    println!(
        "Partners: {} and {}",
        settings.partners.a.id, settings.partners.b.id
    );
    Ok(())
}
