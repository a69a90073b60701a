//! Integration tests for the featherline CLI.
//!
//! These tests run the actual binary and verify end-to-end behavior.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

/// Get the path to the featherline binary from the workspace root.
fn binary_path() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.pop(); // Go up from featherline-cli to crates
    path.pop(); // Go up from crates to the workspace root

    // Try release first, then debug
    let release = path.join("target/release/featherline");
    if release.exists() {
        return release;
    }
    path.join("target/debug/featherline")
}

/// Write a small scene file into a temp directory and return its path.
fn write_test_scene() -> PathBuf {
    let dir = std::env::temp_dir().join("featherline-cli-tests");
    fs::create_dir_all(&dir).expect("Failed to create temp dir");
    let path = dir.join(format!("scene-{}.yaml", std::process::id()));
    fs::write(
        &path,
        r#"
name: "integration"
canvas: { width: 100, height: 100 }
curves:
  - name: front
    pattern: triangles
    width: 3
    length: 12
    points: [[10, 50], [90, 50]]
regions:
  - name: precip
    pattern: baseline
    width: 1
    length: 10
    fill: true
    outer: [[20, 20], [80, 20], [80, 80], [20, 80]]
    lattice:
      symbol: rain
      x_repeat: 15
      y_repeat: 15
symbols:
  - name: rain
    width: 3
    height: 3
"#,
    )
    .expect("Failed to write scene file");
    path
}

#[test]
fn patterns_command_lists_builtins() {
    let output = Command::new(binary_path())
        .arg("patterns")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("baseline"), "Should list 'baseline'");
    assert!(stdout.contains("triangles"), "Should list 'triangles'");
    assert!(stdout.contains("scallop"), "Should list 'scallop'");
    assert!(stdout.contains("double"), "Should list 'double'");
}

#[test]
fn render_command_produces_svg() {
    let scene = write_test_scene();
    let output = Command::new(binary_path())
        .args(["render", scene.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "render should exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("<?xml"), "Should have XML declaration");
    assert!(stdout.contains("<svg"), "Should have SVG element");
    assert!(stdout.contains("id=\"front\""), "Should have curve group");
    assert!(stdout.contains("id=\"precip\""), "Should have region group");
    assert!(stdout.contains("sym-rain"), "Should place lattice symbols");
    assert!(stdout.contains("</svg>"), "Should close SVG element");
}

#[test]
fn render_command_produces_json() {
    let scene = write_test_scene();
    let output = Command::new(binary_path())
        .args(["render", scene.to_str().unwrap(), "-f", "json"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "render should exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"paths\""), "Should have paths key");
    assert!(stdout.contains("\"symbols\""), "Should have symbols key");
    assert!(stdout.contains("\"rain\""), "Should place rain symbols");
    assert!(stdout.contains("\"group\":\"front\""), "Should tag curve group");
}

#[test]
fn render_command_writes_output_file() {
    let scene = write_test_scene();
    let out = std::env::temp_dir()
        .join("featherline-cli-tests")
        .join(format!("out-{}.svg", std::process::id()));

    let output = Command::new(binary_path())
        .args([
            "render",
            scene.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "render should exit 0");
    let written = fs::read_to_string(&out).expect("Output file should exist");
    assert!(written.contains("<svg"));
    let _ = fs::remove_file(&out);
}

#[test]
fn example_command_prints_valid_scene() {
    let output = Command::new(binary_path())
        .arg("example")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("canvas:"), "Should include canvas section");
    assert!(stdout.contains("curves:"), "Should include curves section");

    // The printed example must itself be renderable.
    let dir = std::env::temp_dir().join("featherline-cli-tests");
    fs::create_dir_all(&dir).expect("Failed to create temp dir");
    let path = dir.join(format!("example-{}.yaml", std::process::id()));
    fs::write(&path, stdout.as_bytes()).expect("Failed to write example scene");

    let render = Command::new(binary_path())
        .args(["render", path.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");
    assert!(render.status.success(), "example scene should render");
    let svg = String::from_utf8_lossy(&render.stdout);
    assert!(svg.contains("<svg"));
    let _ = fs::remove_file(&path);
}

#[test]
fn help_command_shows_usage() {
    let output = Command::new(binary_path())
        .arg("help")
        .output()
        .expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("render"), "Should mention render command");
    assert!(stderr.contains("patterns"), "Should mention patterns command");
}

#[test]
fn unknown_command_exits_nonzero() {
    let output = Command::new(binary_path())
        .arg("frobnicate")
        .output()
        .expect("Failed to execute command");
    assert!(!output.status.success());
}
