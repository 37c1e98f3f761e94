use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn cli() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("classpath-instrument").unwrap();
    cmd.env_remove("CLASSPATH_INSTRUMENT_LOG")
        .env_remove("CLASSPATH_INSTRUMENT_THREADS")
        .env_remove("CLASSPATH_INSTRUMENT_PRETTY");
    cmd
}

fn os_name_unit() -> Value {
    json!({
        "header": { "version": 52, "access": 1, "name": "com/example/Foo" },
        "source_file": "Foo.java",
        "members": [
            { "method": {
                "decl": { "access": 9, "name": "osName", "descriptor": "()Ljava/lang/String;" },
                "code": [
                    { "ldc": { "value": { "string": "os.name" } } },
                    { "invoke": {
                        "kind": "static",
                        "owner": "java/lang/System",
                        "name": "getProperty",
                        "descriptor": "(Ljava/lang/String;)Ljava/lang/String;"
                    } },
                    { "op": { "opcode": 176 } }
                ]
            } }
        ]
    })
}

fn plain_unit(name: &str) -> Value {
    json!({
        "header": { "version": 52, "access": 1, "name": name },
        "members": [
            { "method": {
                "decl": { "access": 1, "name": "<init>", "descriptor": "()V" },
                "code": [ { "op": { "opcode": 177 } } ]
            } }
        ]
    })
}

fn write_json(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, serde_json::to_string(value).unwrap()).unwrap();
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// =============================================================================
// rules / fingerprint
// =============================================================================

#[test]
fn test_rules_lists_all_redirects() {
    cli()
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "org.gradle.internal.classpath.Instrumented",
        ))
        .stdout(predicate::str::contains(
            "java.lang.System: java.lang.String getProperty(java.lang.String)",
        ))
        .stdout(predicate::str::contains("10 rule(s)"));
}

#[test]
fn test_rules_json_filtered_by_owner() {
    let output = cli()
        .args(["--json", "rules", "--owner", "java.lang.Long"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let rules: Value = serde_json::from_slice(&output.stdout).unwrap();
    let rules = rules.as_array().unwrap();
    assert_eq!(rules.len(), 3);
    for rule in rules {
        assert_eq!(rule["owner"], "java/lang/Long");
        assert_eq!(rule["shim_owner"], "org/gradle/internal/classpath/Instrumented");
        assert_eq!(rule["shim_name"], "getLong");
    }
}

#[test]
fn test_fingerprint_human_and_json_agree() {
    let human = cli().arg("fingerprint").output().unwrap();
    assert!(human.status.success());
    let stdout = String::from_utf8(human.stdout).unwrap();
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some("InstrumentingTransformer v6"));
    let digest = lines.next().unwrap();
    assert_eq!(digest.len(), 64);
    assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));

    let json = cli().args(["--json", "fingerprint"]).output().unwrap();
    let value: Value = serde_json::from_slice(&json.stdout).unwrap();
    assert_eq!(value["transform_id"], "InstrumentingTransformer");
    assert_eq!(value["format_version"], 6);
    assert_eq!(value["sha256"], digest);
}

// =============================================================================
// rewrite
// =============================================================================

#[test]
fn test_rewrite_single_file() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("Foo.json");
    let out_dir = temp.path().join("out");
    write_json(&input, &os_name_unit());

    cli()
        .arg("rewrite")
        .arg(&input)
        .arg("--out-dir")
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 redirected"));

    let rewritten = read_json(&out_dir.join("Foo.json"));
    let code = &rewritten["members"][0]["method"]["code"];
    assert_eq!(code[0]["ldc"]["value"]["string"], "os.name");
    assert_eq!(code[1]["ldc"]["value"]["string"], "com.example.Foo");
    assert_eq!(code[2]["invoke"]["owner"], "org/gradle/internal/classpath/Instrumented");
    assert_eq!(code[2]["invoke"]["name"], "systemProperty");
    assert_eq!(
        code[2]["invoke"]["descriptor"],
        "(Ljava/lang/String;Ljava/lang/String;)Ljava/lang/String;"
    );
    assert_eq!(rewritten["source_file"], "Foo.java");
}

#[test]
fn test_rewrite_directory_keeps_layout() {
    let temp = TempDir::new().unwrap();
    let units = temp.path().join("units");
    let out_dir = temp.path().join("out");
    write_json(&units.join("com/example/Foo.json"), &os_name_unit());
    write_json(&units.join("p/Plain.json"), &plain_unit("p/Plain"));
    fs::write(units.join("README.txt"), "not a unit").unwrap();

    let output = cli()
        .args(["--json", "rewrite", "--threads", "2"])
        .arg(&units)
        .arg("--out-dir")
        .arg(&out_dir)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["units"].as_array().unwrap().len(), 2);
    assert_eq!(report["failed"], 0);
    assert_eq!(report["total"]["redirected_calls"], 1);
    assert_eq!(report["total"]["by_target"]["systemProperty"], 1);

    assert!(out_dir.join("com/example/Foo.json").exists());
    let plain = read_json(&out_dir.join("p/Plain.json"));
    assert_eq!(plain["header"]["name"], "p/Plain");
    assert_eq!(
        plain["members"][0]["method"]["code"],
        plain_unit("p/Plain")["members"][0]["method"]["code"]
    );
    assert!(!out_dir.join("README.txt").exists());
}

#[test]
fn test_rewrite_rejects_invalid_unit_file() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("Broken.json");
    fs::write(&input, "{ \"header\": 1 }").unwrap();

    cli()
        .arg("rewrite")
        .arg(&input)
        .arg("--out-dir")
        .arg(temp.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("parse unit file"));
}

#[test]
fn test_rewrite_rejects_colliding_outputs() {
    let temp = TempDir::new().unwrap();
    let first = temp.path().join("a/Foo.json");
    let second = temp.path().join("b/Foo.json");
    let out_dir = temp.path().join("out");
    write_json(&first, &os_name_unit());
    write_json(&second, &plain_unit("b/Foo"));

    cli()
        .arg("rewrite")
        .arg(&first)
        .arg(&second)
        .arg("--out-dir")
        .arg(&out_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("both map to output Foo.json"));
    assert!(!out_dir.join("Foo.json").exists());
}

#[test]
fn test_rewrite_requires_inputs() {
    cli()
        .args(["rewrite", "--out-dir", "out"])
        .assert()
        .failure();
}
