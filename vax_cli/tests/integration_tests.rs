//! Integration tests for the vaxsched binary.
//!
//! These tests drive the interactive shell through stdin and verify:
//! - Account registration and the password policy
//! - Session rules (one identity at a time, role gates)
//! - Reservation outcomes and their effect on schedule and inventory
//! - Persistence of ledgers and appointment ids across processes
//! - Appointment export

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const PW: &str = "Abcdef1!";

/// A database and an empty config file in a private temp directory
struct TestEnv {
    _dir: TempDir,
    db: PathBuf,
    config: PathBuf,
}

fn setup_test_env() -> TestEnv {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db = dir.path().join("scheduler.db");
    let config = dir.path().join("config.toml");
    fs::write(&config, "").expect("Failed to write config");
    TestEnv {
        _dir: dir,
        db,
        config,
    }
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("vaxsched"))
}

fn shell(env: &TestEnv) -> Command {
    let mut cmd = cli();
    cmd.arg("--db").arg(&env.db).arg("--config").arg(&env.config);
    cmd
}

/// Run `script` through one shell process and return its stdout.
fn run_script(env: &TestEnv, script: &str) -> String {
    let output = shell(env)
        .write_stdin(script.to_string())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8(output).expect("stdout is UTF-8")
}

/// Caregiver `cg` with a slot on 2024-06-01 and vaccine `V` with `doses`.
fn seed_caregiver(env: &TestEnv, doses: u32) {
    let out = run_script(
        env,
        &format!(
            "create_caregiver cg {PW}\n\
             login_caregiver cg {PW}\n\
             upload_availability 2024-06-01\n\
             add_doses V {doses}\n\
             quit\n"
        ),
    );
    assert!(out.contains("Availability uploaded for 2024-06-01!"), "{out}");
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Vaccine appointment reservation scheduler",
        ));
}

#[test]
fn test_greeting_and_quit() {
    let env = setup_test_env();
    shell(&env)
        .write_stdin("quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("*** Please enter one of the following commands ***"))
        .stdout(predicate::str::contains("Bye!"));

    assert!(env.db.exists());
}

#[test]
fn test_username_cannot_be_reused_for_role() {
    let env = setup_test_env();
    let out = run_script(
        &env,
        &format!(
            "create_patient sam {PW}\n\
             create_patient sam {PW}\n\
             create_patient sam Other1#pw\n\
             create_caregiver sam {PW}\n\
             quit\n"
        ),
    );

    assert_eq!(out.matches("Username taken, try again!").count(), 2);
    assert!(out.contains("Patient account created: sam"));
    assert!(out.contains("Caregiver account created: sam"));
}

#[test]
fn test_password_policy() {
    let env = setup_test_env();
    let out = run_script(
        &env,
        "create_patient a abcdefgh\n\
         create_patient b ABCDEFG1\n\
         create_patient c Abcdefg1\n\
         create_patient d Ab1!\n\
         create_patient e Abcdef1!\n\
         quit\n",
    );

    assert_eq!(out.matches("Password is not strong enough").count(), 4);
    assert!(out.contains("Patient account created: e"));
}

#[test]
fn test_second_login_rejected() {
    let env = setup_test_env();
    let out = run_script(
        &env,
        &format!(
            "create_patient pat {PW}\n\
             create_caregiver cg {PW}\n\
             login_patient pat {PW}\n\
             login_caregiver cg {PW}\n\
             upload_availability 2024-06-01\n\
             logout\n\
             login_caregiver cg {PW}\n\
             quit\n"
        ),
    );

    assert!(out.contains("Patient logged in as: pat"));
    assert!(out.contains("Already logged-in as pat!"));
    // Still the patient: caregiver-only command is refused
    assert!(out.contains("Please login as a caregiver!"));
    assert!(out.contains("You have been logged out"));
    assert!(out.contains("Caregiver logged in as: cg"));
}

#[test]
fn test_bad_login() {
    let env = setup_test_env();
    let out = run_script(
        &env,
        &format!(
            "create_patient pat {PW}\n\
             login_patient pat Wrong1!!\n\
             login_patient ghost {PW}\n\
             show_appointments\n\
             quit\n"
        ),
    );

    assert_eq!(out.matches("Login failed. Please try again!").count(), 2);
    assert!(out.contains("Please login as a caregiver or patient!"));
}

#[test]
fn test_reservation_success() {
    let env = setup_test_env();
    seed_caregiver(&env, 5);

    let out = run_script(
        &env,
        &format!(
            "create_patient pat {PW}\n\
             login_patient pat {PW}\n\
             search_caregiver_schedule 2024-06-01\n\
             reserve 2024-06-01 V\n\
             search_caregiver_schedule 2024-06-01\n\
             show_appointments\n\
             quit\n"
        ),
    );

    assert!(out.contains("Caregivers available on 2024-06-01: cg"));
    assert!(out.contains("There are 5 doses of the V vaccine available!"));
    assert!(out.contains("Reservation 1 made with cg!"));
    assert!(out.contains("Caregivers available on 2024-06-01: none"));
    assert!(out.contains("There are 4 doses of the V vaccine available!"));
    assert!(out.contains("Appointment #1: V on 2024-06-01 with caregiver cg"));

    let caregiver_view = run_script(&env, &format!("login_caregiver cg {PW}\nshow_appointments\nquit\n"));
    assert!(caregiver_view.contains("Appointment #1: V on 2024-06-01 with patient pat"));
}

#[test]
fn test_out_of_stock_changes_nothing() {
    let env = setup_test_env();
    seed_caregiver(&env, 0);

    let out = run_script(
        &env,
        &format!(
            "create_patient pat {PW}\n\
             login_patient pat {PW}\n\
             reserve 2024-06-01 V\n\
             search_caregiver_schedule 2024-06-01\n\
             show_appointments\n\
             quit\n"
        ),
    );

    assert!(out.contains("There are 0 doses of the V vaccine available!"));
    assert!(out.contains("Caregivers available on 2024-06-01: cg"));
    assert!(out.contains("No appointments scheduled."));
    assert!(!out.contains("made with"));
}

#[test]
fn test_reservation_failures() {
    let env = setup_test_env();
    seed_caregiver(&env, 2);

    let out = run_script(
        &env,
        &format!(
            "create_patient pat {PW}\n\
             reserve 2024-06-01 V\n\
             login_patient pat {PW}\n\
             reserve 2024-6-1 V\n\
             reserve 2024-06-01 Moderna\n\
             reserve 2024-06-02 V\n\
             quit\n"
        ),
    );

    assert!(out.contains("Please login as a patient!"));
    assert!(out.contains("Invalid input: '2024-6-1' is not a valid date"));
    assert!(out.contains("Vaccine Moderna not found!"));
    assert!(out.contains("There are no caregivers available on 2024-06-02!"));
}

#[test]
fn test_appointment_ids_increase_across_processes() {
    let env = setup_test_env();
    let out = run_script(
        &env,
        &format!(
            "create_caregiver alice {PW}\n\
             create_caregiver bob {PW}\n\
             login_caregiver bob {PW}\n\
             upload_availability 2024-06-01\n\
             add_doses V 3\n\
             logout\n\
             login_caregiver alice {PW}\n\
             upload_availability 2024-06-01\n\
             upload_availability 2024-06-02\n\
             quit\n"
        ),
    );
    assert_eq!(out.matches("Availability uploaded").count(), 3);

    let first = run_script(
        &env,
        &format!(
            "create_patient pat {PW}\n\
             login_patient pat {PW}\n\
             reserve 2024-06-01 V\n\
             reserve 2024-06-01 V\n\
             quit\n"
        ),
    );
    // Lexicographic tie-break: alice before bob, regardless of upload order
    assert!(first.contains("Reservation 1 made with alice!"));
    assert!(first.contains("Reservation 2 made with bob!"));

    let second = run_script(&env, &format!("login_patient pat {PW}\nreserve 2024-06-02 V\nquit\n"));
    assert!(second.contains("Reservation 3 made with alice!"));
}

#[test]
fn test_duplicate_availability() {
    let env = setup_test_env();
    seed_caregiver(&env, 1);

    let out = run_script(
        &env,
        &format!(
            "login_caregiver cg {PW}\n\
             upload_availability 2024-06-01\n\
             search_caregiver_schedule 2024-06-01\n\
             quit\n"
        ),
    );

    assert!(out.contains("Availability for 2024-06-01 is already uploaded"));
    assert!(out.contains("Caregivers available on 2024-06-01: cg\n"));
}

#[test]
fn test_add_doses_validation() {
    let env = setup_test_env();
    let out = run_script(
        &env,
        &format!(
            "create_caregiver cg {PW}\n\
             login_caregiver cg {PW}\n\
             add_doses V -5\n\
             add_doses V lots\n\
             add_doses V +4\n\
             add_doses V 2\n\
             add_doses V 3\n\
             quit\n"
        ),
    );

    assert_eq!(out.matches("is not a valid number of doses").count(), 3);
    assert!(out.contains("Doses updated! V now has 2 doses."));
    assert!(out.contains("Doses updated! V now has 5 doses."));
}

#[test]
fn test_cancel_is_reported_unsupported() {
    let env = setup_test_env();
    shell(&env)
        .write_stdin("cancel 1\ncancel\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cancelling appointments is not supported yet."))
        .stdout(predicate::str::contains("Usage: cancel <appointment_id>"));
}

#[test]
fn test_export_csv_and_json() {
    let env = setup_test_env();
    seed_caregiver(&env, 3);
    run_script(
        &env,
        &format!("create_patient pat {PW}\nlogin_patient pat {PW}\nreserve 2024-06-01 V\nquit\n"),
    );

    shell(&env)
        .arg("export")
        .assert()
        .success()
        .stdout(predicate::str::contains("id,vaccine,date,patient,caregiver"))
        .stdout(predicate::str::contains("1,V,2024-06-01,pat,cg"));

    let json_path = env.db.with_file_name("appointments.json");
    shell(&env)
        .arg("export")
        .arg("--format")
        .arg("json")
        .arg("--out")
        .arg(&json_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 appointments"));

    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(parsed[0]["id"], 1);
    assert_eq!(parsed[0]["caregiver"], "cg");
    assert_eq!(parsed[0]["date"], "2024-06-01");
}

#[test]
fn test_login_after_register_config() {
    let env = setup_test_env();
    fs::write(&env.config, "[auth]\nlogin_after_register = true\n").unwrap();

    let out = run_script(&env, &format!("create_patient pat {PW}\nshow_appointments\nquit\n"));
    assert!(out.contains("No appointments scheduled."));
}
