//! Tests for the quartermaster binary.
//!
//! Spawns the executable against the bundled scenario and checks the JSON
//! plan it prints and its exit codes.

use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    let exe = env!("CARGO_BIN_EXE_quartermaster");
    Command::new(exe)
        .args(args)
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to start quartermaster")
}

fn plan_json(args: &[&str]) -> serde_json::Value {
    let output = run(args);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be a JSON plan")
}

#[test]
fn prints_a_plan_for_the_first_player() {
    let plan = plan_json(&["--scenario", "scenarios/islands.json", "--seed", "11"]);
    assert_eq!(plan["player"], "red");
    assert_eq!(plan["round"], 3);
    assert_eq!(plan["cancelled"], false);
    assert!(plan["moves"].is_array());
    assert!(plan["battles"].is_array());
    let left = plan["resources_left"].as_i64().unwrap();
    assert!((0..=30).contains(&left));
}

#[test]
fn player_can_be_chosen() {
    let plan = plan_json(&["--scenario", "scenarios/islands.json", "--player", "blue", "--seed", "2"]);
    assert_eq!(plan["player"], "blue");
    for purchase in plan["purchases"].as_array().unwrap() {
        assert_eq!(purchase["territory"], "eastland");
    }
}

#[test]
fn same_seed_same_output() {
    let args = ["--scenario", "scenarios/islands.json", "--seed", "99"];
    assert_eq!(run(&args).stdout, run(&args).stdout);
}

#[test]
fn missing_scenario_is_a_usage_error() {
    let output = run(&[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[test]
fn unknown_player_fails() {
    let output = run(&["--scenario", "scenarios/islands.json", "--player", "purple"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn unreadable_scenario_fails() {
    let output = run(&["--scenario", "scenarios/does_not_exist.json"]);
    assert_eq!(output.status.code(), Some(1));
}
