use std::process::Command;

fn tracker_bin() -> &'static str {
    env!("CARGO_BIN_EXE_habit-tracker")
}

fn run_tracker(args: &[&str], envs: &[(&str, &str)]) -> std::process::Output {
    let mut cmd = Command::new(tracker_bin());
    cmd.env_remove("HABIT_TRACKER_DB_PATH")
        .env_remove("HABIT_TRACKER_TODAY")
        .env_remove("HABIT_TRACKER_LOG");
    cmd.args(args);
    for (k, v) in envs {
        cmd.env(k, v);
    }
    cmd.output().expect("failed to run habit-tracker binary")
}

fn stdout_str(out: &std::process::Output) -> String {
    String::from_utf8_lossy(&out.stdout).to_string()
}

fn stderr_str(out: &std::process::Output) -> String {
    String::from_utf8_lossy(&out.stderr).to_string()
}

fn assert_ok(out: &std::process::Output) {
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr_str(out));
}

#[test]
fn accounts_are_isolated_and_sessions_switch() {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("data").join("db.json");
    let db = db_path.to_string_lossy().to_string();
    let env = [
        ("HABIT_TRACKER_DB_PATH", db.as_str()),
        ("HABIT_TRACKER_TODAY", "2026-10-19"),
        ("NO_COLOR", "1"),
    ];

    let out = run_tracker(
        &["signup", "--email", "ada@example.com", "--password", "hunter22", "--name", "Ada"],
        &env,
    );
    assert_ok(&out);
    assert!(stdout_str(&out).contains("Signed up as Ada <ada@example.com>"));
    assert_ok(&run_tracker(&["add", "Read"], &env));

    // Stored hash, never the password.
    let raw = std::fs::read_to_string(&db_path).unwrap();
    assert!(!raw.contains("hunter22"));
    assert!(raw.contains("$argon2"));

    let out = run_tracker(
        &["signup", "--email", "ADA@example.com", "--password", "whatever1", "--name", "Imposter"],
        &env,
    );
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr_str(&out).contains("Email already registered"));

    assert_ok(&run_tracker(
        &["signup", "--email", "bo@example.com", "--password", "password9", "--name", "Bo"],
        &env,
    ));
    let out = run_tracker(&["--format", "json", "list"], &env);
    assert_ok(&out);
    let v: serde_json::Value = serde_json::from_str(stdout_str(&out).trim()).unwrap();
    assert_eq!(v["habits"].as_array().unwrap().len(), 0);

    let out = run_tracker(&["show", "read"], &env);
    assert_eq!(out.status.code(), Some(3));

    let out = run_tracker(&["signout"], &env);
    assert_ok(&out);
    let out = run_tracker(&["whoami"], &env);
    assert_eq!(out.status.code(), Some(6));

    let out = run_tracker(
        &["signin", "--email", "ada@example.com", "--password", "wrong-pass"],
        &env,
    );
    assert_eq!(out.status.code(), Some(6));
    assert!(stderr_str(&out).contains("Invalid credentials"));

    let out = run_tracker(
        &["signin", "--email", "ada@example.com", "--password", "hunter22"],
        &env,
    );
    assert_ok(&out);

    let out = run_tracker(&["--format", "json", "whoami"], &env);
    assert_ok(&out);
    let v: serde_json::Value = serde_json::from_str(stdout_str(&out).trim()).unwrap();
    assert_eq!(v["user"]["name"], "Ada");
    assert!(v["user"].get("password_hash").is_none());

    let out = run_tracker(&["--format", "json", "list"], &env);
    let v: serde_json::Value = serde_json::from_str(stdout_str(&out).trim()).unwrap();
    assert_eq!(v["habits"][0]["name"], "Read");
}

#[test]
fn table_output_for_today_and_progress() {
    let tmp = tempfile::tempdir().unwrap();
    let db = tmp.path().join("db.json").to_string_lossy().to_string();
    let global = ["--db", db.as_str(), "--today", "2026-10-19", "--no-color"];

    let with = |extra: &[&str]| -> std::process::Output {
        let mut args: Vec<&str> = global.to_vec();
        args.extend_from_slice(extra);
        run_tracker(&args, &[])
    };

    assert_ok(&with(&[
        "signup", "--email", "ada@example.com", "--password", "hunter22", "--name", "Ada",
    ]));

    let out = with(&["today"]);
    assert_ok(&out);
    let text = stdout_str(&out);
    assert!(text.contains("Today 2026-10-19: 0 of 0 habits completed (0%)"));
    assert!(text.contains("No habits for today"));

    assert_ok(&with(&["add", "Read", "--icon", "📚"]));
    assert_ok(&with(&["add", "Gym", "--days", "weekdays"]));
    assert_ok(&with(&["done", "read", "--date", "2026-10-18"]));

    let out = with(&["done", "read"]);
    assert_ok(&out);
    assert!(stdout_str(&out).contains("[x] Read done for 2026-10-19 (streak 2)"));

    let out = with(&["skip", "gym"]);
    assert_ok(&out);
    assert!(stdout_str(&out).contains("[-] Gym skipped for 2026-10-19"));

    let out = with(&["today"]);
    assert_ok(&out);
    let text = stdout_str(&out);
    assert!(text.contains("1 of 2 habits completed (50%)"), "{}", text);
    assert!(text.contains("[x]  📚 Read"), "{}", text);
    assert!(text.contains("[-]  💪 Gym"), "{}", text);

    let out = with(&["progress"]);
    assert_ok(&out);
    let text = stdout_str(&out);
    assert!(text.contains("Active habits:  2 of 2"), "{}", text);
    assert!(text.contains("Best streak:    2 days"), "{}", text);
    assert!(text.contains("Mon, Tue, Wed, Thu, Fri"), "{}", text);

    let out = with(&["history", "read"]);
    assert_ok(&out);
    let lines: Vec<String> = stdout_str(&out).lines().map(str::to_string).collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("2026-10-19  [x]"));
    assert!(lines[2].starts_with("2026-10-18  [x]"));
}

#[test]
fn bad_today_and_corrupt_db_are_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("db.json");
    let db = db_path.to_string_lossy().to_string();

    let out = run_tracker(&["--db", db.as_str(), "--today", "2026-13-01", "today"], &[]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr_str(&out).contains("Invalid today"));

    std::fs::write(&db_path, "{ definitely not json").unwrap();
    let out = run_tracker(&["--db", db.as_str(), "whoami"], &[]);
    assert_eq!(out.status.code(), Some(5));
    assert!(stderr_str(&out).contains("DB corrupted"));
}
