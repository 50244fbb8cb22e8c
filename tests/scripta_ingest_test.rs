use md5::{Digest, Md5};
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn read_catalog(home: &Path) -> Vec<Value> {
    let raw = fs::read_to_string(home.join("database.json")).expect("read catalog");
    let parsed: Value = serde_json::from_str(&raw).expect("parse catalog");
    parsed.as_array().cloned().expect("catalog array")
}

fn scripta(home: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("scripta");
    cmd.current_dir(home).env("SCRIPTA_HOME", home);
    cmd
}

#[test]
fn scan_catalogs_new_file_and_deletes_duplicate() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path();
    let dropit = home.join("dropit");
    fs::create_dir_all(&dropit).expect("mkdir dropit");
    fs::write(dropit.join("lease.txt"), "lease agreement body\n").expect("write a");

    scripta(home)
        .args(["scan", "--date", "2024-01-05", "--refnum", "KM-77/Zx"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cataloged file="))
        .stdout(predicate::str::contains("cataloged=1"));

    let catalog = read_catalog(home);
    assert_eq!(catalog.len(), 1);
    let record = &catalog[0];
    assert_eq!(record["index"], 1);
    assert_eq!(record["format"], "txt");
    let digest = record["digest"].as_str().expect("digest");
    assert_eq!(digest, format!("{:x}", Md5::digest(b"lease agreement body\n")));
    let stored = home
        .join("storage/2024/01/05")
        .join(format!("{digest}.txt"));
    assert!(stored.is_file());
    assert_eq!(record["path"], stored.display().to_string());
    assert!(!dropit.join("lease.txt").exists());

    fs::write(dropit.join("copy.txt"), "lease agreement body\n").expect("write b");
    scripta(home)
        .args(["scan", "--date", "2030-12-31"])
        .assert()
        .success()
        .stdout(predicate::str::contains("existing_index=1 deleted=true"));

    assert!(!dropit.join("copy.txt").exists());
    assert_eq!(read_catalog(home).len(), 1);
    assert!(!home.join("storage/2030").exists());

    let audit = fs::read_to_string(home.join("logs/audit.log")).expect("audit log");
    assert_eq!(audit.lines().count(), 2);
    assert!(audit.contains("\"phase\":\"ingest\""));
}

#[test]
fn invalid_date_leaves_file_staged_and_exits_non_zero() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path();
    let dropit = home.join("dropit");
    fs::create_dir_all(&dropit).expect("mkdir dropit");
    fs::write(dropit.join("scan.pdf"), "%PDF-1.4 fake").expect("write");

    scripta(home)
        .args(["scan", "--date", "2024-13-40"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("code=INVALID_DATE"))
        .stderr(predicate::str::contains("SCRIPTA_WARN code=INVALID_DATE"));

    assert!(dropit.join("scan.pdf").is_file());
    assert!(!home.join("storage/2024").exists());
}

#[test]
fn quarantine_policy_keeps_duplicate_bytes() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path();
    let dropit = home.join("dropit");
    fs::create_dir_all(&dropit).expect("mkdir dropit");
    fs::write(dropit.join("a.txt"), "same").expect("write a");
    fs::write(dropit.join("b.txt"), "same").expect("write b");

    scripta(home)
        .env("SCRIPTA_DUPLICATE_POLICY", "quarantine")
        .args(["scan", "--date", "2024-01-05"])
        .assert()
        .success()
        .stdout(predicate::str::contains("quarantined="));

    assert_eq!(read_catalog(home).len(), 1);
    let quarantined: Vec<_> = fs::read_dir(home.join("quarantine"))
        .expect("quarantine dir")
        .collect();
    assert_eq!(quarantined.len(), 1);
    assert!(!dropit.join("b.txt").exists());
}

#[test]
fn corrupt_catalog_aborts_before_touching_files() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path();
    let dropit = home.join("dropit");
    fs::create_dir_all(&dropit).expect("mkdir dropit");
    fs::write(dropit.join("a.txt"), "a").expect("write");
    fs::write(home.join("database.json"), "{not json").expect("write catalog");

    scripta(home)
        .args(["scan", "--date", "2024-01-05"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));

    assert!(dropit.join("a.txt").is_file());
    assert_eq!(
        fs::read_to_string(home.join("database.json")).expect("read"),
        "{not json"
    );
}

#[test]
fn add_ingests_a_file_outside_staging() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("home");
    fs::create_dir_all(&home).expect("mkdir home");
    let outside = tmp.path().join("invoice.PDF");
    fs::write(&outside, "invoice").expect("write");

    scripta(&home)
        .arg("add")
        .arg(&outside)
        .args(["--date", "2023-11-02", "--description", "Invoice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("index=1"));

    let catalog = read_catalog(&home);
    assert_eq!(catalog[0]["description"], "Invoice");
    assert_eq!(catalog[0]["format"], "pdf");
    assert!(catalog[0]["path"].as_str().expect("path").ends_with(".PDF"));
    assert!(!outside.exists());
}

#[test]
fn watch_runs_bounded_passes_and_stop_writes_marker() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path();
    let dropit = home.join("dropit");
    fs::create_dir_all(&dropit).expect("mkdir dropit");
    fs::write(dropit.join("a.txt"), "first").expect("write");

    scripta(home)
        .args([
            "watch",
            "--date",
            "2024-02-29",
            "--interval-secs",
            "1",
            "--max-passes",
            "2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("passes=2"))
        .stdout(predicate::str::contains("cancelled=false"))
        .stderr(predicate::str::contains("scripta watch: pass=2"));

    assert_eq!(read_catalog(home).len(), 1);
    assert!(home.join("storage/2024/02/29").is_dir());

    scripta(home).arg("stop").assert().success();
    assert!(home.join("state/watch.stop").is_file());
}

fn write_logging_opener(script: &Path, log: &Path) {
    let body = format!(
        "#!/usr/bin/env bash\nprintf '%s\\n' \"$1\" >> '{}'\n",
        log.display()
    );
    fs::write(script, body).expect("write opener");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(script).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(script, perms).expect("chmod");
    }
}

fn wait_for_lines(log: &Path, want: usize) -> Vec<String> {
    for _ in 0..50 {
        if let Ok(raw) = fs::read_to_string(log) {
            let lines: Vec<String> = raw.lines().map(str::to_string).collect();
            if lines.len() >= want {
                return lines;
            }
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }
    Vec::new()
}

#[cfg(unix)]
#[test]
fn interactive_scan_opens_each_document_before_prompting() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("home");
    let dropit = home.join("dropit");
    fs::create_dir_all(&dropit).expect("mkdir dropit");
    fs::write(dropit.join("letter.txt"), "dear archive").expect("write");
    let opener = tmp.path().join("opener.sh");
    let log = tmp.path().join("opened.log");
    write_logging_opener(&opener, &log);

    scripta(&home)
        .env("SCRIPTA_OPENER", &opener)
        .args(["scan", "--interactive"])
        .write_stdin("Letter\n2024-01-05\nAlice\nBob\nL-1\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Date (YYYY-MM-DD): "))
        .stdout(predicate::str::contains("cataloged=1"));

    assert_eq!(
        wait_for_lines(&log, 1),
        vec![dropit.join("letter.txt").display().to_string()]
    );
    let catalog = read_catalog(&home);
    assert_eq!(catalog[0]["description"], "Letter");
    assert_eq!(catalog[0]["refnum"], "L-1");
}

#[test]
fn interactive_scan_without_viewer_still_prompts() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path();
    let dropit = home.join("dropit");
    fs::create_dir_all(&dropit).expect("mkdir dropit");
    fs::write(dropit.join("memo.txt"), "memo").expect("write");

    scripta(home)
        .env("SCRIPTA_OPENER", "scripta-no-such-viewer")
        .args(["scan", "--interactive"])
        .write_stdin("Memo\n2024-01-05\n\n\n\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("SCRIPTA_WARN code=VIEWER_UNAVAILABLE"))
        .stdout(predicate::str::contains("cataloged=1"));
}

#[test]
fn watch_reports_failed_totals_without_keeping_passes() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path();
    let dropit = home.join("dropit");
    fs::create_dir_all(&dropit).expect("mkdir dropit");
    fs::write(dropit.join("bad.txt"), "bad").expect("write");

    scripta(home)
        .args([
            "watch",
            "--date",
            "2024-13-40",
            "--interval-secs",
            "1",
            "--max-passes",
            "2",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "scripta watch: pass=1 failed file=",
        ))
        .stderr(predicate::str::contains(
            "scripta watch: pass=2 failed file=",
        ))
        .stdout(predicate::str::contains("failed=2"))
        .stdout(predicate::str::contains("cataloged=0 duplicates=0"));

    assert!(dropit.join("bad.txt").is_file());
}
