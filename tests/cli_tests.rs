use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const PROGRAM: &str = r#"{
    "names": [
        { "name": "stem", "kind": "external" },
        { "name": "unused_helper", "kind": "routine", "used": false }
    ],
    "definitions": [
        {
            "kind": { "define": { "routine": 0, "body": { "kind": { "literal": "ing" } } } },
            "line": 1
        },
        {
            "kind": { "define": { "routine": 1, "body": { "kind": "delete" } } },
            "line": 4
        }
    ]
}"#;

const MALFORMED_PROGRAM: &str = r#"{
    "names": [{ "name": "stem", "kind": "external" }],
    "definitions": [
        { "kind": { "define": { "routine": 0, "body": { "kind": { "or": [{ "kind": "next" }] } } } } }
    ]
}"#;

fn patc(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_patc"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("patc should run")
}

#[test]
fn build_writes_the_class_to_stdout() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join("stem.json"), PROGRAM).expect("write program");

    let output = patc(dir.path(), &["build", "stem.json", "--hide-warnings"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("<?php\n"));
    assert!(stdout.contains("    public function stem():bool {\n"));
    assert!(stdout.contains("if (!($this->eq_s(\"ing\")))"));
    assert!(!stdout.contains("r_unused_helper"));
}

#[test]
fn build_writes_the_output_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join("stem.json"), PROGRAM).expect("write program");

    let output = patc(
        dir.path(),
        &["build", "stem.json", "-o", "Stem.php", "--hide-timers"],
    );
    assert!(output.status.success());

    let generated = fs::read_to_string(dir.path().join("Stem.php")).expect("output file");
    assert!(generated.contains("class SnowballStemmer extends SnowballProgram {"));
    assert!(generated.ends_with("}\n"));
}

#[test]
fn config_file_in_the_working_directory_is_used() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join("stem.json"), PROGRAM).expect("write program");
    fs::write(
        dir.path().join("patternc.toml"),
        "class_name = \"PorterStemmer\"\ncomments = true\n",
    )
    .expect("write config");

    let output = patc(dir.path(), &["build", "stem.json"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("class PorterStemmer extends SnowballProgram {"));
    assert!(stdout.contains("// define stem, line 1"));
}

#[test]
fn explicit_config_must_exist() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join("stem.json"), PROGRAM).expect("write program");

    let output = patc(dir.path(), &["build", "stem.json", "--config", "missing.toml"]);
    assert!(!output.status.success());
    assert!(!String::from_utf8_lossy(&output.stdout).contains("<?php"));
}

#[test]
fn check_reports_malformed_programs() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join("good.json"), PROGRAM).expect("write program");
    fs::write(dir.path().join("bad.json"), MALFORMED_PROGRAM).expect("write program");

    assert!(patc(dir.path(), &["check", "good.json"]).status.success());
    assert!(!patc(dir.path(), &["check", "bad.json"]).status.success());
    assert!(!patc(dir.path(), &["check", "missing.json"]).status.success());
}

#[test]
fn unknown_commands_fail() {
    let dir = tempfile::tempdir().expect("temp dir");
    assert!(!patc(dir.path(), &["compile", "stem.json"]).status.success());
    assert!(patc(dir.path(), &["help"]).status.success());
}
