//! CLI integration tests for the jsonapi-codec binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("jsonapi-codec"))
}

// Helper to create a temp document file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const WELL_FORMED: &str = r#"{
    "data": {
        "type": "posts",
        "id": "1",
        "attributes": { "title": "hello" },
        "relationships": {
            "comments": {
                "data": [
                    { "type": "comments", "id": "5" }
                ]
            }
        }
    },
    "included": [
        { "type": "comments", "id": "5", "attributes": { "body": "hi" } }
    ]
}"#;

mod check_command {
    use super::*;

    #[test]
    fn well_formed_document() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", WELL_FORMED);

        cmd()
            .args(["check", doc.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("well-formed"));
    }

    #[test]
    fn missing_type_is_a_finding() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", r#"{ "data": { "id": "1" } }"#);

        cmd()
            .args(["check", doc.to_str().unwrap()])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("string type"))
            .stdout(predicate::str::contains("1 finding(s)"));
    }

    #[test]
    fn non_string_id_is_a_finding() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", r#"{ "data": { "type": "posts", "id": 1 } }"#);

        cmd()
            .args(["check", doc.to_str().unwrap()])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("/data/id"));
    }

    #[test]
    fn data_and_errors_must_not_coexist() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(
            &dir,
            "doc.json",
            r#"{ "data": null, "errors": [{ "title": "boom" }] }"#,
        );

        cmd()
            .args(["check", doc.to_str().unwrap()])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("data and errors"));
    }

    #[test]
    fn duplicate_included_key_is_a_finding() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(
            &dir,
            "doc.json",
            r#"{
                "data": { "type": "posts", "id": "1" },
                "included": [
                    { "type": "comments", "id": "5" },
                    { "type": "comments", "id": "5" }
                ]
            }"#,
        );

        cmd()
            .args(["check", doc.to_str().unwrap()])
            .assert()
            .code(1)
            .stdout(predicate::str::contains(r#"duplicate included key "comments,5""#));
    }

    #[test]
    fn relationship_without_data_member() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(
            &dir,
            "doc.json",
            r#"{
                "data": {
                    "type": "posts",
                    "id": "1",
                    "relationships": { "author": { "links": {} } }
                }
            }"#,
        );

        cmd()
            .args(["check", doc.to_str().unwrap()])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("/data/relationships/author"))
            .stdout(predicate::str::contains("missing data"));
    }

    #[test]
    fn quiet_suppresses_the_listing() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", r#"{ "data": { "id": "1" } }"#);

        cmd()
            .args(["check", doc.to_str().unwrap(), "--quiet"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("string type").not())
            .stdout(predicate::str::contains("1 finding(s)"));
    }

    #[test]
    fn json_output_well_formed() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", WELL_FORMED);

        cmd()
            .args(["check", doc.to_str().unwrap(), "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""ok": true"#));
    }

    #[test]
    fn json_output_with_findings() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", r#"{ "data": 5 }"#);

        cmd()
            .args(["check", doc.to_str().unwrap(), "--json"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains(r#""ok": false"#))
            .stdout(predicate::str::contains(r#""diagnostics""#));
    }
}

mod inspect_command {
    use super::*;

    #[test]
    fn summarizes_primary_and_included() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", WELL_FORMED);

        cmd()
            .args(["inspect", doc.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("primary: 1 posts resource(s) [1]"))
            .stdout(predicate::str::contains("relationships: comments"))
            .stdout(predicate::str::contains("included: 1 resource(s) (comments)"));
    }

    #[test]
    fn collection_document() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(
            &dir,
            "doc.json",
            r#"{
                "data": [
                    { "type": "posts", "id": "1" },
                    { "type": "posts", "id": "2" }
                ]
            }"#,
        );

        cmd()
            .args(["inspect", doc.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("primary: 2 posts resource(s) [1, 2]"))
            .stdout(predicate::str::contains("included: 0 resource(s)"));
    }

    #[test]
    fn null_data_document() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", r#"{ "data": null }"#);

        cmd()
            .args(["inspect", doc.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("primary: none"));
    }

    #[test]
    fn json_output() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", WELL_FORMED);

        cmd()
            .args(["inspect", doc.to_str().unwrap(), "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""primary_type": "posts""#))
            .stdout(predicate::str::contains(r#""included_count": 1"#));
    }
}

mod error_handling {
    use super::*;

    #[test]
    fn file_not_found() {
        cmd()
            .args(["check", "/nonexistent/doc.json"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("not found"));
    }

    #[test]
    fn invalid_json() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "bad.json", r#"{ not valid json"#);

        cmd()
            .args(["check", doc.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid JSON"));
    }

    #[test]
    fn inspect_file_not_found() {
        cmd()
            .args(["inspect", "/nonexistent/doc.json"])
            .assert()
            .code(3);
    }
}

mod help_and_version {
    use super::*;

    #[test]
    fn help_flag() {
        cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Check and inspect resource documents"));
    }

    #[test]
    fn version_flag() {
        cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("jsonapi-codec"));
    }

    #[test]
    fn check_help() {
        cmd()
            .args(["check", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--json"))
            .stdout(predicate::str::contains("--quiet"));
    }

    #[test]
    fn missing_file_argument() {
        cmd().arg("check").assert().failure();
    }
}
