//! CLI smoke tests.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn pricelens(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pricelens").unwrap();
    cmd.current_dir(dir.path());
    cmd.env_remove("ANTHROPIC_API_KEY");
    cmd.env_remove("PRICELENS_DB");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    pricelens(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("seed"))
        .stdout(predicate::str::contains("compute"))
        .stdout(predicate::str::contains("elasticity"))
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn missing_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    pricelens(&dir).assert().failure();
}

#[test]
fn elasticity_requires_a_key() {
    let dir = TempDir::new().unwrap();
    pricelens(&dir)
        .arg("elasticity")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--product"));
}

#[test]
fn ask_without_api_key_names_the_variable() {
    let dir = TempDir::new().unwrap();
    pricelens(&dir)
        .args(["ask", "anything"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ANTHROPIC_API_KEY"));
}

#[test]
fn seed_then_compute_round_trips() {
    let dir = TempDir::new().unwrap();

    pricelens(&dir)
        .args(["seed", "--orders", "120", "--products", "3", "--customers", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Seeded 3 products and 120 orders"));

    pricelens(&dir)
        .args(["compute", "--no-progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed 120 orders"))
        .stdout(predicate::str::contains("products:"));
}

#[test]
fn missing_config_file_is_reported() {
    let dir = TempDir::new().unwrap();
    pricelens(&dir)
        .args(["--config", "nope.toml", "compute"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}
