use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn trawl() -> Command {
    Command::cargo_bin("trawl").unwrap()
}

fn user_msg(ts: &str, text: &str) -> String {
    format!(
        r#"{{"timestamp":"{}","type":"response_item","payload":{{"type":"message","role":"user","content":[{{"type":"input_text","text":"{}"}}]}}}}"#,
        ts, text
    )
}

#[test]
fn refresh_search_sessions_round_trip() {
    let temp = TempDir::new().unwrap();
    let sessions = temp.path().join("sessions");
    let data = temp.path().join("data");
    std::fs::create_dir_all(&sessions).unwrap();

    let lines = format!(
        "{}\n{}\n",
        user_msg("2026-03-01T10:00:00.000Z", "set up the zanzibar cluster"),
        user_msg("2026-03-01T10:01:00.000Z", "unrelated request"),
    );
    std::fs::write(sessions.join("run-1.jsonl"), lines).unwrap();

    let sessions_arg = sessions.to_str().unwrap();
    let data_arg = data.to_str().unwrap();

    trawl()
        .args([
            "refresh",
            "--sessions-dir",
            sessions_arg,
            "--data-dir",
            data_arg,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("scanned=1"))
        .stdout(predicate::str::contains("events=2"));

    trawl()
        .args(["search", "zanzibar", "--data-dir", data_arg, "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("zanzibar cluster"))
        .stdout(predicate::str::contains("\"mode\""));

    trawl()
        .args(["sessions", "--data-dir", data_arg])
        .assert()
        .success()
        .stdout(predicate::str::contains("user=2"))
        .stdout(predicate::str::contains("run-1.jsonl"));

    trawl()
        .args(["stats", "--data-dir", data_arg, "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"events\":2"));
}

#[test]
fn repeated_refresh_ingests_nothing_new() {
    let temp = TempDir::new().unwrap();
    let sessions = temp.path().join("sessions");
    let data = temp.path().join("data");
    std::fs::create_dir_all(&sessions).unwrap();
    std::fs::write(
        sessions.join("run-1.jsonl"),
        format!("{}\n", user_msg("2026-03-01T10:00:00.000Z", "only once")),
    )
    .unwrap();

    let sessions_arg = sessions.to_str().unwrap();
    let data_arg = data.to_str().unwrap();

    trawl()
        .args([
            "refresh",
            "--sessions-dir",
            sessions_arg,
            "--data-dir",
            data_arg,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("events=1"));

    trawl()
        .args([
            "refresh",
            "--sessions-dir",
            sessions_arg,
            "--data-dir",
            data_arg,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("events=0"))
        .stdout(predicate::str::contains("changed=0"));
}

#[test]
fn search_without_index_points_at_refresh() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");

    trawl()
        .args([
            "search",
            "anything",
            "--data-dir",
            data.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("trawl refresh"));
}

#[test]
fn search_with_context_prints_neighbors() {
    let temp = TempDir::new().unwrap();
    let sessions = temp.path().join("sessions");
    let data = temp.path().join("data");
    std::fs::create_dir_all(&sessions).unwrap();

    let lines = format!(
        "{}\n{}\n{}\n",
        user_msg("2026-03-01T10:00:00.000Z", "before"),
        user_msg("2026-03-01T10:01:00.000Z", "the amethyst question"),
        user_msg("2026-03-01T10:02:00.000Z", "after"),
    );
    std::fs::write(sessions.join("run-1.jsonl"), lines).unwrap();

    let sessions_arg = sessions.to_str().unwrap();
    let data_arg = data.to_str().unwrap();

    trawl()
        .args([
            "refresh",
            "--sessions-dir",
            sessions_arg,
            "--data-dir",
            data_arg,
        ])
        .assert()
        .success();

    trawl()
        .args([
            "search",
            "amethyst",
            "--data-dir",
            data_arg,
            "--context",
            "1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("before"))
        .stdout(predicate::str::contains("after"));
}
