use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn plugreport(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("plugreport").unwrap();
    cmd.env("HOME", home).env_remove("RUST_LOG");
    cmd
}

fn setup() -> tempfile::TempDir {
    let home = tempfile::tempdir().unwrap();
    let data = home.path().join("data");
    plugreport(home.path())
        .args(["init", "--data-dir", data.to_str().unwrap(), "--default-user", "approver"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized plugreport"));
    plugreport(home.path())
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::contains("Demo data loaded!"));
    home
}

#[test]
fn report_without_database_fails() {
    let home = tempfile::tempdir().unwrap();
    plugreport(home.path())
        .args(["report", "unapproved", "--as", "admin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No database found"));
}

#[test]
fn demo_is_idempotent() {
    let home = setup();
    plugreport(home.path())
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::contains("already loaded"));
}

#[test]
fn lists_viewable_reports() {
    let home = setup();
    plugreport(home.path())
        .arg("reports")
        .assert()
        .success()
        .stdout(predicate::str::contains("unapproved"))
        .stdout(predicate::str::contains("reviews"))
        .stdout(predicate::str::contains("myplugins").not());
}

#[test]
fn shows_first_page_of_queue() {
    let home = setup();
    plugreport(home.path())
        .args(["report", "unapproved", "--per-page", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Plugins pending approval"))
        .stdout(predicate::str::contains("Magic link login"))
        .stdout(predicate::str::contains("Engagement report"))
        .stdout(predicate::str::contains("Flashcards").not())
        .stdout(predicate::str::contains("Page 1 of 3 (5 rows)"));
}

#[test]
fn query_string_selects_page_and_sort() {
    let home = setup();
    plugreport(home.path())
        .args(["report", "--query", "report=unapproved&perpage=2&page=2&sort=timequeued&dir=desc"])
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"page\": 2"))
        .stdout(predicate::str::contains("Flashcards"))
        .stdout(predicate::str::contains("Magic link login").not())
        .stdout(predicate::str::contains("\"total\": 5"));
}

#[test]
fn deep_link_is_clamped() {
    let home = setup();
    plugreport(home.path())
        .args(["report", "unapproved", "--per-page", "2", "--page", "99"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Page 3 of 3 (5 rows)"));
}

#[test]
fn huge_page_index_is_clamped() {
    let home = setup();
    plugreport(home.path())
        .args(["report", "unapproved", "--per-page", "2", "--page", "18446744073709551615"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Page 3 of 3 (5 rows)"))
        .stdout(predicate::str::contains("Flashcards"));
    plugreport(home.path())
        .args(["report", "--query", "report=unapproved&page=100000000000000000&perpage=100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Page 1 of 1 (5 rows)"));
}

#[test]
fn denied_report_fails_without_output() {
    let home = setup();
    plugreport(home.path())
        .args(["report", "myplugins"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("permission to view the report 'myplugins'"));
}

#[test]
fn denied_report_renders_html_error_page() {
    let home = setup();
    plugreport(home.path())
        .args(["report", "myplugins", "--as", "reviewer", "--format", "html"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("<title>Permission denied"))
        .stdout(predicate::str::contains("<table").not());
}

#[test]
fn unknown_report_shows_selector() {
    let home = setup();
    plugreport(home.path())
        .args(["report", "nosuchreport", "--as", "dana"])
        .assert()
        .success()
        .stdout(predicate::str::contains("myplugins"))
        .stdout(predicate::str::contains("unapproved").not());
}

#[test]
fn html_report_has_sort_links() {
    let home = setup();
    plugreport(home.path())
        .args(["report", "reviews", "--as", "reviewer", "--format", "html"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<!DOCTYPE html>"))
        .stdout(predicate::str::contains("sort=reviewer&amp;dir=asc"))
        .stdout(predicate::str::contains("href=\"https://moodle.org/plugins/mod_quizgame\""));
}

#[test]
fn unknown_user_is_an_error() {
    let home = setup();
    plugreport(home.path())
        .args(["report", "reviews", "--as", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown user: ghost"));
}

#[test]
fn sync_ads_from_file() {
    let home = setup();
    let feed = home.path().join("ads.json");
    let ads = r#"[
        {"partnerid": "p1", "name": "Partner One", "url": "https://one.test"},
        {"partnerid": "p2", "name": "Partner Two", "url": "https://two.test", "country": "DE"}
    ]"#;
    std::fs::write(&feed, ads).unwrap();
    plugreport(home.path())
        .args(["sync-ads", "--source", feed.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 inserted, 0 removed, 0 skipped"));
    plugreport(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Partner ads:  2"));
}

#[test]
fn sync_ads_without_source_fails() {
    let home = setup();
    plugreport(home.path())
        .arg("sync-ads")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no partner-ads source configured"));
}
