//! Integration tests for the `clinic-desk` command line
//!
//! Every test runs the binary against its own temporary data directory with
//! the file backend.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

#[allow(deprecated)]
fn clinic(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("clinic-desk").unwrap();
    cmd.arg("--data-dir")
        .arg(data_dir.path())
        .env_remove("CLINIC_CONFIG")
        .env_remove("CLINIC_ADMIN_PASSWORD")
        .env("CLINIC_AUTH__BCRYPT_COST", "4")
        .env("RUST_LOG", "warn");
    cmd
}

fn json_output(cmd: &mut Command) -> Value {
    let output = cmd.arg("--json").output().unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn new_ticket(data_dir: &TempDir, name: &str) -> Value {
    json_output(clinic(data_dir).args([
        "ticket",
        "new",
        "--name",
        name,
        "--phone",
        "0300 1234567",
        "--fees",
        "800",
    ]))
}

#[test]
#[allow(deprecated)]
fn test_help_lists_commands() {
    Command::cargo_bin("clinic-desk")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("serve")
                .and(predicate::str::contains("ticket"))
                .and(predicate::str::contains("user")),
        );
}

#[test]
fn test_admin_init_is_idempotent() {
    let data_dir = TempDir::new().unwrap();

    let created =
        json_output(clinic(&data_dir).args(["admin", "init", "--password", "first-password"]));
    assert_eq!(created["created"], true);
    assert_eq!(created["user"]["role"], "admin");

    let again =
        json_output(clinic(&data_dir).args(["admin", "init", "--password", "other-password"]));
    assert_eq!(again["created"], false);

    let users = json_output(clinic(&data_dir).args(["user", "list"]));
    assert_eq!(users.as_array().unwrap().len(), 1);
    assert_eq!(users[0]["username"], "admin");
}

#[test]
fn test_ticket_numbers_increase_across_invocations() {
    let data_dir = TempDir::new().unwrap();

    let first = new_ticket(&data_dir, "Amina Bibi");
    let second = new_ticket(&data_dir, "Bilal Khan");

    let first_number = first["ticketNumber"].as_str().unwrap();
    let second_number = second["ticketNumber"].as_str().unwrap();
    assert!(first_number.starts_with('T') && first_number.len() == 12);
    assert!(first_number.ends_with("001"), "{first_number}");
    assert_eq!(&second_number[..9], &first_number[..9]);
    assert!(second_number.ends_with("002"), "{second_number}");
    assert_eq!(first["createdByUsername"], "console");

    assert!(data_dir.path().join("tickets").join(format!("{first_number}.yaml")).exists());
}

#[test]
fn test_status_update_and_filtered_list() {
    let data_dir = TempDir::new().unwrap();
    let ticket = new_ticket(&data_dir, "Amina Bibi");
    new_ticket(&data_dir, "Bilal Khan");
    let number = ticket["ticketNumber"].as_str().unwrap();

    let updated = json_output(clinic(&data_dir).args(["ticket", "status", number, "completed"]));
    assert_eq!(updated["status"], "completed");

    let listed = json_output(clinic(&data_dir).args([
        "ticket",
        "list",
        "--status",
        "completed",
        "--date",
        "today",
    ]));
    assert_eq!(listed["tickets"].as_array().unwrap().len(), 1);
    assert_eq!(listed["tickets"][0]["ticketNumber"], number);
    assert_eq!(listed["pagination"]["total"], 1);

    let all = json_output(clinic(&data_dir).args(["ticket", "list"]));
    assert_eq!(all["pagination"]["total"], 2);
}

#[test]
fn test_show_unknown_ticket_fails() {
    let data_dir = TempDir::new().unwrap();
    clinic(&data_dir)
        .args(["ticket", "show", "T20200101001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Ticket not found"));
}

#[test]
fn test_invalid_intake_is_rejected() {
    let data_dir = TempDir::new().unwrap();
    clinic(&data_dir)
        .args(["ticket", "new", "--name", "Amina", "--phone", "call me"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Phone number format is invalid"));
}

#[test]
fn test_receipt_written_to_file() {
    let data_dir = TempDir::new().unwrap();
    let ticket = new_ticket(&data_dir, "Amina Bibi");
    let number = ticket["ticketNumber"].as_str().unwrap();
    let path = data_dir.path().join("receipt.txt");

    clinic(&data_dir)
        .args(["ticket", "receipt", number, "--output"])
        .arg(&path)
        .assert()
        .success();

    let receipt = std::fs::read_to_string(&path).unwrap();
    assert!(receipt.contains(number));
    assert!(receipt.contains("Amina Bibi"));
    assert!(receipt.contains("800.00"));
}

#[test]
fn test_export_csv() {
    let data_dir = TempDir::new().unwrap();
    new_ticket(&data_dir, "Amina Bibi");
    new_ticket(&data_dir, "Bilal Khan");

    clinic(&data_dir)
        .args(["ticket", "export", "--format", "csv"])
        .assert()
        .success()
        .stdout(
            predicate::str::starts_with("id,ticketNumber,patientName")
                .and(predicate::str::contains("Bilal Khan")),
        );
}

#[test]
fn test_user_add_and_deactivate() {
    let data_dir = TempDir::new().unwrap();

    let user = json_output(clinic(&data_dir).args([
        "user",
        "add",
        "Reception",
        "--password",
        "desk-password",
    ]));
    assert_eq!(user["username"], "reception");
    assert_eq!(user["role"], "staff");

    let updated = json_output(clinic(&data_dir).args(["user", "set", "reception", "--deactivate"]));
    assert_eq!(updated["isActive"], false);

    clinic(&data_dir)
        .args(["user", "reset-password", "reception", "--password", "short"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 8 characters"));
}
