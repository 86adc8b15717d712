use std::process::Command;

use synthsyx::Target;

mod common;
use common::{file_target, registry, sample_patches, write_syx};

fn synthsyx() -> Command {
    Command::new(env!("CARGO_BIN_EXE_synthsyx"))
}

#[test]
fn list_names_every_message() {
    let registry = registry();
    let messages: Vec<Vec<u8>> = sample_patches()
        .iter()
        .map(|p| registry.emit(p, file_target(p)).unwrap().to_bytes())
        .collect();
    let file = write_syx(&messages);

    let output = synthsyx().arg("list").arg(file.path()).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), messages.len());
    assert_eq!(lines[0], "0: alesis-d4 [05] ROCK KIT");
    assert_eq!(lines[2], "2: matrix-1000 [417] BRS4 BIG");
    assert_eq!(lines[5], "5: dx7 [edit] TUB BELLS");
    assert_eq!(lines[7], "7: matrix-1000-global [edit] Global");
}

#[test]
fn show_prints_json() {
    let registry = registry();
    let patches = sample_patches();
    let file = write_syx(&[registry.emit(&patches[5], Target::EditBuffer).unwrap().to_bytes()]);

    let output = synthsyx().arg("show").arg(file.path()).output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["family"], "dx7");
    assert_eq!(json["patch"]["name"], "TUB BELLS");
    assert_eq!(json["patch"]["algorithm"], 4);
}

#[test]
fn request_prints_hex_on_the_chosen_channel() {
    let output = synthsyx()
        .args(["--channel", "3", "request", "dx7"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "F0 43 22 00 F7\n");

    let output = synthsyx().args(["request", "matrix-1000"]).output().unwrap();
    assert!(!output.status.success());

    let output = synthsyx().args(["request", "matrix-1000-global"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "F0 10 06 04 03 00 F7\n");

    let output = synthsyx().args(["--channel", "17", "request", "dx7"]).output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn request_for_a_stored_program_changes_program_first() {
    let output = synthsyx()
        .args(["--channel", "2", "request", "microkorg", "--bank", "1", "--number", "3"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "C1 43\npause 200 ms\nF0 42 31 58 10 F7\n"
    );
}

#[test]
fn extract_writes_a_standalone_dump() {
    let registry = registry();
    let patches = sample_patches();
    let messages: Vec<Vec<u8>> = patches
        .iter()
        .map(|p| registry.emit(p, file_target(p)).unwrap().to_bytes())
        .collect();
    let file = write_syx(&messages);
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("kit.syx");

    let output = synthsyx()
        .arg("extract")
        .arg(file.path())
        .args(["--index", "0", "--out"])
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(std::fs::read(&out).unwrap(), messages[0]);

    let output = synthsyx()
        .arg("extract")
        .arg(file.path())
        .args(["--index", "99", "--out"])
        .arg(&out)
        .output()
        .unwrap();
    assert!(!output.status.success());
}
