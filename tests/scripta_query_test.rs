use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::Path;
use tempfile::tempdir;

fn scripta(home: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("scripta");
    cmd.current_dir(home).env("SCRIPTA_HOME", home);
    cmd
}

fn ingest(home: &Path, name: &str, content: &str, args: &[&str]) {
    let dropit = home.join("dropit");
    fs::create_dir_all(&dropit).expect("mkdir dropit");
    fs::write(dropit.join(name), content).expect("write staged file");
    scripta(home).arg("scan").args(args).assert().success();
}

fn seeded_home(home: &Path) {
    ingest(
        home,
        "lease.txt",
        "Lease agreement for flat 5\nsigned in March",
        &[
            "--date",
            "2024-03-01",
            "--description",
            "Lease",
            "--refnum",
            "KM-77/Zx",
        ],
    );
    ingest(
        home,
        "tax.txt",
        "Tax notice 2023",
        &[
            "--date",
            "2023-06-15",
            "--description",
            "Tax notice",
            "--refnum",
            "T-1",
        ],
    );
}

#[test]
fn list_orders_by_date_and_search_matches_refnum() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path();
    seeded_home(home);

    scripta(home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "  2. 2023-06-15 - T-1 - Tax notice\n  1. 2024-03-01 - KM-77/Zx - Lease\n",
        ));

    scripta(home)
        .args(["search", "km-77/zX"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. "))
        .stdout(predicate::str::contains(" - Lease"))
        .stdout(predicate::str::contains("Tax notice").not());

    scripta(home)
        .args(["search", "nothing-like-this"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no matches"));
}

#[test]
fn edit_updates_fields_and_rejects_unknown_index() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path();
    seeded_home(home);

    scripta(home)
        .args(["edit", "2", "--description", "Tax notice 2023", "--date", "2023-07-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2. 2023-07-01 - T-1 - Tax notice 2023"));

    let before = fs::read(home.join("database.json")).expect("read catalog");
    scripta(home)
        .args(["edit", "9", "--description", "x"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("NOT_FOUND"));
    scripta(home)
        .args(["edit", "1", "--date", "2024-13-40"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("INVALID_DATE"));
    assert_eq!(fs::read(home.join("database.json")).expect("read"), before);
}

#[test]
fn json_report_is_machine_readable() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path();
    seeded_home(home);

    let output = scripta(home)
        .args(["list", "--json"])
        .output()
        .expect("run list");
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["command"], "list");
    assert_eq!(report["ok"], true);
    assert_eq!(report["details"].as_array().expect("details").len(), 2);
}

#[test]
fn backup_zips_archive_tree_and_catalog() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path();
    seeded_home(home);
    let output = tmp.path().join("out/backup.zip");

    scripta(home)
        .arg("backup")
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("archived_files=2"))
        .stdout(predicate::str::contains("catalog_included=true"));

    let file = fs::File::open(&output).expect("open zip");
    let mut archive = zip::ZipArchive::new(file).expect("read zip");
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(names.len(), 3);
    assert!(names.contains(&"database.json".to_string()));
    assert!(names.iter().any(|n| n.starts_with("2024/03/01/")));
    assert!(names.iter().any(|n| n.starts_with("2023/06/15/")));

    let mut catalog = String::new();
    archive
        .by_name("database.json")
        .expect("catalog entry")
        .read_to_string(&mut catalog)
        .expect("read entry");
    assert_eq!(
        catalog,
        fs::read_to_string(home.join("database.json")).expect("read catalog")
    );
}

#[test]
fn stats_and_suggest_use_stored_files() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path();
    seeded_home(home);

    scripta(home)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("documents=2"))
        .stdout(predicate::str::contains("total_size_mb=0.00"));

    scripta(home)
        .env("SCRIPTA_TITLER_PROVIDER", "local")
        .args(["suggest", "1", "--apply"])
        .assert()
        .success()
        .stdout(predicate::str::contains("suggestion=Lease agreement for flat 5"))
        .stdout(predicate::str::contains("applied index=1"));

    scripta(home)
        .args(["search", "flat 5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. "));

    scripta(home)
        .args(["suggest", "7"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("NOT_FOUND"));
}

#[test]
fn open_launches_configured_opener() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path();
    seeded_home(home);

    scripta(home)
        .env("SCRIPTA_OPENER", "true")
        .args(["open", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("opened index=1"));

    scripta(home)
        .env("SCRIPTA_OPENER", "true")
        .args(["open", "42"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("NOT_FOUND"));
}

#[test]
fn status_flags_unrecognized_scripta_variables() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path();

    scripta(home)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("catalog_records=0"));

    scripta(home)
        .env("SCRIPTA_STAGNG_DIR", "/tmp/typo")
        .arg("status")
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "unknown environment variable SCRIPTA_STAGNG_DIR",
        ));
}
