// Drives the compiled binary against a throwaway session folder.
// A private --config path keeps the user's stored defaults out of the way.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use tempfile::{tempdir, TempDir};

fn session(dir: &Path, id: &str, body: &str) {
    fs::write(dir.join(format!("{id}_stats.xml")), body).unwrap();
}

fn fixture() -> TempDir {
    let dir = tempdir().unwrap();
    session(
        dir.path(),
        "20240812-193000",
        r#"<stats playtime="1800" dead="1" killed_by="lava" enemies_killed="40"/>"#,
    );
    session(
        dir.path(),
        "20250110-220000",
        r#"<stats playtime="4200" dead="0" enemies_killed="310" gold_all="9000" gold="1000">
  <biomes_visited><E key="$biome_boss_victoryroom" value="1"/></biomes_visited>
</stats>"#,
    );
    session(
        dir.path(),
        "20250111-010000",
        r#"<stats playtime="600" dead="1" killed_by="Acid" enemies_killed="12"/>"#,
    );
    dir
}

fn recap(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("noita-recap").unwrap();
    cmd.arg(dir.path())
        .arg("--config")
        .arg(dir.path().join("config.json"));
    cmd
}

#[test]
fn list_years_counts_files() {
    let dir = fixture();
    let out = recap(&dir).arg("--list-years").output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(stdout.lines().collect::<Vec<_>>(), ["all (3)", "2025 (2)", "2024 (1)"]);
}

#[test]
fn json_report_for_one_year() {
    let dir = fixture();
    let out = recap(&dir)
        .args(["--year", "2025", "--format", "json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["year"], "2025");
    assert_eq!(value["total_sessions"], 2);
    assert_eq!(value["session_types"]["victory"], 1);
    assert_eq!(value["death_causes"][0]["name"], "acid");
}

#[test]
fn text_archive_written_to_file_with_session_log() {
    let dir = fixture();
    let report = dir.path().join("recap.txt");
    let log = dir.path().join("sessions.csv");
    recap(&dir)
        .arg("--output")
        .arg(&report)
        .arg("--sessions-csv")
        .arg(&log)
        .assert()
        .success();

    let txt = fs::read_to_string(&report).unwrap();
    assert!(txt.starts_with("=== NOITA RECAP ARCHIVE (all) ==="));
    assert!(txt.contains("- Sessions: 3"));

    let csv = fs::read_to_string(&log).unwrap();
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.lines().nth(1).unwrap().starts_with("20240812-193000"));
}

#[test]
fn save_config_remembers_year() {
    let dir = fixture();
    recap(&dir)
        .args(["--year", "2024", "--save-config", "--list-years"])
        .assert()
        .success();
    let stored = fs::read_to_string(dir.path().join("config.json")).unwrap();
    assert!(stored.contains("\"2024\""));

    let out = recap(&dir).args(["--format", "json"]).output().unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["total_sessions"], 1);
}

#[test]
fn missing_directory_fails() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("noita-recap").unwrap();
    cmd.arg(dir.path().join("gone"))
        .arg("--config")
        .arg(dir.path().join("config.json"))
        .assert()
        .failure();
}

#[test]
fn invalid_year_is_rejected() {
    let dir = fixture();
    recap(&dir).args(["--year", "someday"]).assert().failure();
}
