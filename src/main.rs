mod balance;
mod buckets;
mod cli;
mod db;
mod error;
mod fmt;
mod history;
mod importer;
mod models;
mod settings;
mod trends;
mod validate;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ExpenseCommands, ReportCommands, SettleCommands};

fn main() {
    let cli = Cli::parse();
    init_logger(cli.log_level);
    debug!("tandem started");

    let json = cli.json;
    let result = match cli.command {
        Commands::Init {
            data_dir,
            partner_a,
            partner_b,
            currency,
        } => cli::init::run(data_dir, partner_a, partner_b, currency),
        Commands::Expense { command } => match command {
            ExpenseCommands::Add {
                amount,
                category,
                paid_by,
                date,
                description,
            } => cli::expenses::add(amount, &category, &paid_by, date.as_deref(), description),
            ExpenseCommands::List => cli::expenses::list(json),
            ExpenseCommands::Update {
                id,
                amount,
                category,
                paid_by,
                date,
                description,
            } => cli::expenses::update(id, amount, &category, &paid_by, &date, description),
            ExpenseCommands::Delete { id } => cli::expenses::delete(id),
        },
        Commands::Settle { command } => match command {
            SettleCommands::Add {
                amount,
                from,
                to,
                date,
                description,
            } => cli::settle::add(amount, &from, &to, date.as_deref(), description),
            SettleCommands::List => cli::settle::list(json),
            SettleCommands::Delete { id } => cli::settle::delete(id),
        },
        Commands::Import { file } => cli::import::run(&file),
        Commands::Demo => cli::demo::run(),
        Commands::Status => cli::status::run(),
        Commands::Report { command } => match command {
            ReportCommands::Balance => cli::report::balance(json),
            ReportCommands::Monthly {
                week,
                from_date,
                to_date,
                categories,
                partners,
            } => cli::report::monthly(json, week, from_date, to_date, categories, partners),
            ReportCommands::Categories => cli::report::categories(json),
            ReportCommands::History => cli::report::history(json),
            ReportCommands::Compare { days } => cli::report::compare(json, days),
            ReportCommands::Users { week } => cli::report::users(json, week),
            ReportCommands::Patterns { blocks } => cli::report::patterns(json, blocks),
            ReportCommands::Top { limit, days } => cli::report::top(json, limit, days),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so report output on stdout stays pipeable.
fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => EnvFilter::new(format!(
            "{}={level},{}={level}",
            env!("CARGO_CRATE_NAME"),
            env!("CARGO_BIN_NAME"),
        )),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
