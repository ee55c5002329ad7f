use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn tandem(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tandem").unwrap();
    cmd.env("HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

/// A fresh home with an initialized ledger for taha and burak.
fn setup() -> TempDir {
    let home = tempfile::tempdir().unwrap();
    let data_dir = home.path().join("ledger");
    tandem(&home)
        .args(["init", "--data-dir"])
        .arg(&data_dir)
        .args(["--partner-a", "taha", "--partner-b", "burak"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Partners: taha and burak"));
    home
}

fn add_expense(home: &TempDir, amount: &str, payer: &str, date: &str, category: &str) {
    tandem(home)
        .args(["expense", "add", amount, "--paid-by", payer, "--date", date, "--category", category])
        .assert()
        .success();
}

#[test]
fn reports_need_an_initialized_ledger() {
    let home = tempfile::tempdir().unwrap();
    tandem(&home)
        .args(["report", "balance"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("tandem init"));
}

#[test]
fn balance_after_two_expenses() {
    let home = setup();
    add_expense(&home, "100", "taha", "2024-01-01", "Rent");
    add_expense(&home, "50", "burak", "2024-01-15", "Food");

    tandem(&home)
        .args(["report", "balance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("burak owes taha $25.00"))
        .stdout(predicate::str::contains("$150.00"));

    tandem(&home)
        .args(["--json", "report", "balance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"net_balance\": 25.0"))
        .stdout(predicate::str::contains("\"direction\": \"BOwesA\""));
}

#[test]
fn settlement_shows_adjusted_balance() {
    let home = setup();
    add_expense(&home, "100", "taha", "2024-01-01", "Rent");
    tandem(&home)
        .args(["settle", "add", "50", "--from", "burak", "--to", "taha", "--date", "2024-01-02"])
        .assert()
        .success()
        .stdout(predicate::str::contains("burak paid taha $50.00"));

    tandem(&home)
        .args(["report", "balance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("burak owes taha $50.00"))
        .stdout(predicate::str::contains("After settlements: All square"));
}

#[test]
fn self_settlement_is_rejected() {
    let home = setup();
    tandem(&home)
        .args(["settle", "add", "10", "--from", "taha", "--to", "TAHA"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("same partner"));
}

#[test]
fn unknown_partner_is_rejected() {
    let home = setup();
    tandem(&home)
        .args(["expense", "add", "10", "--paid-by", "carol", "--category", "Food"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown partner: carol"));
}

#[test]
fn invalid_date_is_rejected() {
    let home = setup();
    tandem(&home)
        .args(["expense", "add", "10", "--paid-by", "taha", "--category", "Food", "--date", "2024-02-30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unparseable date"));
}

#[test]
fn added_expense_is_stamped_with_local_time() {
    let home = setup();
    let before = chrono::Local::now().naive_local();
    add_expense(&home, "10", "taha", "2024-01-01", "Food");
    let after = chrono::Local::now().naive_local();

    let output = tandem(&home).args(["--json", "expense", "list"]).output().unwrap();
    assert!(output.status.success());
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let stamp: chrono::NaiveDateTime = serde_json::from_value(listed[0]["created_at"].clone()).unwrap();
    assert!(stamp >= before - chrono::Duration::seconds(1) && stamp <= after, "{stamp}");
}

#[test]
fn expense_update_and_delete() {
    let home = setup();
    add_expense(&home, "10", "taha", "2024-01-01", "Food");
    tandem(&home)
        .args(["expense", "update", "1", "25", "--paid-by", "burak", "--category", "Dining", "--date", "2024-01-03"])
        .assert()
        .success();
    tandem(&home)
        .args(["expense", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dining"))
        .stdout(predicate::str::contains("$25.00"));

    tandem(&home)
        .args(["expense", "delete", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted expense 1: $25.00 Dining"));
    tandem(&home)
        .args(["expense", "delete", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No expense with id 1"));
}

#[test]
fn monthly_and_category_reports() {
    let home = setup();
    add_expense(&home, "30", "taha", "2024-01-01", "Food");
    add_expense(&home, "20", "burak", "2024-01-02", "Food");
    add_expense(&home, "10", "taha", "2024-02-03", "Transport");

    tandem(&home)
        .args(["report", "monthly"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-01"))
        .stdout(predicate::str::contains("2024-02"));

    tandem(&home)
        .args(["report", "monthly", "--category", "transport"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-02"))
        .stdout(predicate::str::contains("2024-01").not());

    tandem(&home)
        .args(["--json", "report", "categories"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"category\": \"Food\""))
        .stdout(predicate::str::contains("\"total_amount\": 50.0"));

    tandem(&home)
        .args(["--json", "report", "top", "-n", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"category\": \"Food\""))
        .stdout(predicate::str::contains("Transport").not());
}

#[test]
fn csv_import_and_reimport() {
    let home = setup();
    let csv = home.path().join("shared.csv");
    std::fs::write(
        &csv,
        "date,amount,category,paid_by\n2024-01-01,12.50,Food,taha\n2024-01-02,7.50,Food,carol\n",
    )
    .unwrap();

    tandem(&home)
        .arg("import")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 expenses (1 rows skipped)"));
    tandem(&home)
        .arg("import")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("already been imported"));
}

#[test]
fn demo_then_every_report_runs() {
    let home = setup();
    tandem(&home)
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::contains("Demo data loaded!"));
    tandem(&home)
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::contains("already has expenses"));

    for args in [
        vec!["report", "balance"],
        vec!["report", "monthly", "--week"],
        vec!["report", "categories"],
        vec!["report", "history"],
        vec!["report", "compare", "--days", "60"],
        vec!["report", "users"],
        vec!["report", "patterns"],
        vec!["report", "patterns", "--blocks"],
        vec!["report", "top"],
        vec!["status"],
    ] {
        tandem(&home).args(&args).assert().success();
    }
}
