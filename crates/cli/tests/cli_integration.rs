//! CLI integration tests for the `schemark` binary.
//!
//! Uses `assert_cmd` to spawn the binary and verify exit codes, stdout
//! content, and stderr diagnostics against temporary schema files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn schemark() -> Command {
    Command::cargo_bin("schemark").expect("binary builds")
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("fixture written");
    path
}

const PETS: &str = "\
enum Kind
    dog
    cat

struct Pet
    Kind kind
    string name
    int(>= 0) age
";

#[test]
fn help_exits_0_with_description() {
    schemark()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Schema Markdown compiler"));
}

#[test]
fn compile_prints_type_model_json() {
    let dir = TempDir::new().expect("tempdir");
    let schema = write_file(&dir, "pets.smd", PETS);
    let output = schemark()
        .arg("compile")
        .arg(&schema)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let model: serde_json::Value = serde_json::from_slice(&output).expect("stdout is JSON");
    assert_eq!(model["Pet"]["struct"]["name"], "Pet");
    assert_eq!(model["Kind"]["enum"]["values"][0]["name"], "dog");
}

#[test]
fn compile_reports_diagnostics_with_positions() {
    let dir = TempDir::new().expect("tempdir");
    let schema = write_file(
        &dir,
        "bad.smd",
        "\
struct S
    Missing m
",
    );
    schemark()
        .arg("compile")
        .arg(&schema)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            ":2: error: Unknown type 'Missing' from 'S' member 'm'",
        ));
}

#[test]
fn compile_accumulates_multiple_files() {
    let dir = TempDir::new().expect("tempdir");
    let pets = write_file(
        &dir,
        "pets.smd",
        "\
struct Pet
    Kind kind
",
    );
    let kinds = write_file(
        &dir,
        "kinds.smd",
        "\
enum Kind
    dog
",
    );
    schemark()
        .arg("check")
        .arg(&pets)
        .arg(&kinds)
        .assert()
        .success();
}

#[test]
fn validate_prints_coerced_value() {
    let dir = TempDir::new().expect("tempdir");
    let schema = write_file(&dir, "pets.smd", PETS);
    let value = write_file(
        &dir,
        "pet.json",
        r#"{"kind": "dog", "name": "Rex", "age": "3"}"#,
    );
    let output = schemark()
        .arg("validate")
        .arg(&schema)
        .arg("--type")
        .arg("Pet")
        .arg("--value")
        .arg(&value)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let validated: serde_json::Value = serde_json::from_slice(&output).expect("stdout is JSON");
    assert_eq!(validated["age"], 3);
}

#[test]
fn validate_reports_violation() {
    let dir = TempDir::new().expect("tempdir");
    let schema = write_file(&dir, "pets.smd", PETS);
    let value = write_file(&dir, "pet.json", r#"{"kind": "bird", "name": "Tweety", "age": 1}"#);
    schemark()
        .arg("validate")
        .arg(&schema)
        .arg("--type")
        .arg("Pet")
        .arg("--value")
        .arg(&value)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("expected type 'Kind'"));
}

#[test]
fn missing_file_exits_2() {
    schemark()
        .arg("compile")
        .arg("does-not-exist.smd")
        .assert()
        .failure()
        .code(2);
}
