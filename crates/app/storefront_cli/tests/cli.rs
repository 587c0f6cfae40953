use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    Command::cargo_bin("storefront_cli").expect("storefront_cli binary")
}

#[test]
fn version_prints_package_version() {
    cli()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("storefront_cli"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn help_lists_commands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate-codes"))
        .stdout(predicate::str::contains("add-admin"));
}

#[test]
fn generate_codes_prints_one_code_per_line() {
    let code = predicate::str::is_match(r"^([A-Z0-9]{4}-[A-Z0-9]{4}-[A-Z0-9]{4}-[A-Z0-9]{4}\n){3}$")
        .expect("valid regex");
    cli()
        .args(["generate-codes", "--count", "3"])
        .assert()
        .success()
        .stdout(code);
}

#[test]
fn generate_codes_rejects_zero() {
    cli()
        .args(["generate-codes", "--count", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("count must be between"));
}

#[test]
fn add_admin_enforces_password_policy_before_connecting() {
    cli()
        .args([
            "add-admin",
            "--email",
            "ops@example.com",
            "--password",
            "short",
            "--database-url",
            "postgres://127.0.0.1:1/none",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Password must be at least 8 characters"));
}
