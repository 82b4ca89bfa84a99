use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::Connection;

const PASSWORD: &str = "Correct1Horse";

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_diary"))
}

struct Sandbox {
    base: PathBuf,
}

impl Sandbox {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        // Short names keep the socket path under the Unix length limit.
        let short_prefix = &prefix[..prefix.len().min(8)];
        let base = std::env::temp_dir().join(format!(
            "d{}_{}_{}",
            short_prefix,
            std::process::id(),
            nanos % 1_000_000_000
        ));
        for dir in ["c", "d", "r"] {
            std::fs::create_dir_all(base.join(dir)).expect("create sandbox dir");
        }
        Self { base }
    }

    fn diary_path(&self) -> PathBuf {
        self.base.join("d").join("test.db")
    }

    fn command(&self) -> Command {
        let runtime = self.base.join("r");
        let mut cmd = Command::new(bin());
        cmd.env("XDG_CONFIG_HOME", self.base.join("c"))
            .env("XDG_DATA_HOME", self.base.join("d"))
            .env("XDG_RUNTIME_DIR", &runtime)
            // macOS keeps the socket under TMPDIR
            .env("TMPDIR", &runtime)
            .env_remove("DIARY_PATH")
            .env_remove("DIARY_CONFIG")
            .env_remove("DIARY_PASSWORD")
            .env_remove("DIARY_NEW_PASSWORD");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command().args(args).output().expect("run diary")
    }

    fn run_with_password(&self, args: &[&str], password: &str) -> Output {
        self.command()
            .env("DIARY_PASSWORD", password)
            .args(args)
            .output()
            .expect("run diary")
    }

    fn init(&self, mode: &str) {
        let path = self.diary_path();
        let output = self.run_with_password(
            &["init", path.to_str().unwrap(), "--mode", mode, "--no-input"],
            PASSWORD,
        );
        assert_success(&output);
    }

    fn connection(&self) -> Connection {
        Connection::open(self.diary_path()).expect("open sqlite")
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        let _ = self.run(&["lock", "--all"]);
        let _ = std::fs::remove_dir_all(&self.base);
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "command failed: stdout={} stderr={}",
        stdout(output),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn entry_id(output: &Output) -> String {
    stdout(output)
        .lines()
        .find_map(|line| line.strip_prefix("id="))
        .map(str::to_string)
        .expect("add prints id=")
}

fn stored_entry(conn: &Connection, id: &str) -> (bool, String) {
    conn.query_row(
        "SELECT encrypted, data FROM entries WHERE id = ?1",
        [id],
        |row| Ok((row.get::<_, i64>(0)? != 0, row.get::<_, String>(1)?)),
    )
    .expect("entry row")
}

fn add_entry(sandbox: &Sandbox, notes: &str) -> String {
    let note_value = format!("Notes={}", notes);
    let output = sandbox.run(&[
        "add",
        "Journal",
        "--value",
        &note_value,
        "--value",
        "Mood=7",
        "--value",
        "Activities=sport,work",
        "--no-input",
    ]);
    assert_success(&output);
    entry_id(&output)
}

#[test]
fn test_plaintext_diary_flow() {
    let sandbox = Sandbox::new("plain");
    sandbox.init("none");

    let id = add_entry(&sandbox, "Walked by the river");
    let (encrypted, data) = stored_entry(&sandbox.connection(), &id);
    assert!(!encrypted);
    assert!(data.contains("Walked by the river"));

    let list = sandbox.run(&["list", "--tag", "sport", "--json"]);
    assert_success(&list);
    let entries: serde_json::Value = serde_json::from_str(&stdout(&list)).unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 1);
    assert_eq!(entries[0]["template"], "Journal");
    assert_eq!(entries[0]["tags"], serde_json::json!(["sport", "work"]));

    let show = sandbox.run(&["show", &id[..8]]);
    assert_success(&show);
    assert!(stdout(&show).contains("Walked by the river"));
}

#[test]
fn test_full_mode_stores_ciphertext() {
    let sandbox = Sandbox::new("full");
    sandbox.init("full");

    let id = add_entry(&sandbox, "Secret plans");
    let conn = sandbox.connection();
    let (encrypted, data) = stored_entry(&conn, &id);
    assert!(encrypted);
    assert!(!data.contains("Secret plans"));
    let tags: Option<String> = conn
        .query_row("SELECT tags_json FROM entries WHERE id = ?1", [&id], |row| {
            row.get(0)
        })
        .unwrap();
    assert!(tags.map(|t| t == "[]").unwrap_or(true));

    // The session opened at init decrypts without asking again.
    let show = sandbox.run(&["show", &id, "--json"]);
    assert_success(&show);
    assert!(stdout(&show).contains("Secret plans"));
}

#[test]
fn test_locked_diary_refuses_encrypted_reads() {
    let sandbox = Sandbox::new("locked");
    sandbox.init("full");
    let id = add_entry(&sandbox, "Behind the lock");
    assert_success(&sandbox.run(&["lock"]));

    let show = sandbox.run(&["show", &id]);
    assert_eq!(show.status.code(), Some(6));
    let add = sandbox.run(&["add", "Journal", "--value", "Notes=x", "--no-input"]);
    assert_eq!(add.status.code(), Some(6));

    // Metadata stays listable while locked.
    let list = sandbox.run(&["list", "--json"]);
    assert_success(&list);

    let unlock = sandbox.run_with_password(&["unlock", "--no-input"], PASSWORD);
    assert_success(&unlock);
    assert_success(&sandbox.run(&["show", &id]));
}

#[test]
fn test_wrong_password_is_rejected() {
    let sandbox = Sandbox::new("wrongpw");
    sandbox.init("full");
    assert_success(&sandbox.run(&["lock"]));

    let unlock = sandbox.run_with_password(&["unlock", "--no-input"], "Wrong1Password");
    assert_eq!(unlock.status.code(), Some(5));

    let status = sandbox.run(&["status", "--json"]);
    assert_success(&status);
    let value: serde_json::Value = serde_json::from_str(&stdout(&status)).unwrap();
    assert_eq!(value["unlocked"], false);
    assert_eq!(value["encryption_mode"], "full");
}

#[test]
fn test_mode_round_trip_rewrites_entries() {
    let sandbox = Sandbox::new("mode");
    sandbox.init("none");
    let id = add_entry(&sandbox, "Before encryption");

    let upgrade = sandbox.run_with_password(&["mode", "full", "--no-input"], PASSWORD);
    assert_success(&upgrade);
    let (encrypted, data) = stored_entry(&sandbox.connection(), &id);
    assert!(encrypted);
    assert!(!data.contains("Before encryption"));

    // Downgrading always needs the password again.
    let refused = sandbox.run(&["mode", "none", "--no-input"]);
    assert_eq!(refused.status.code(), Some(5));

    let downgrade = sandbox.run_with_password(&["mode", "none", "--no-input"], PASSWORD);
    assert_success(&downgrade);
    let (encrypted, data) = stored_entry(&sandbox.connection(), &id);
    assert!(!encrypted);
    assert!(data.contains("Before encryption"));
}

#[test]
fn test_password_change_keeps_entries_readable() {
    let sandbox = Sandbox::new("chpw");
    sandbox.init("full");
    let id = add_entry(&sandbox, "Survives rotation");
    let (_, before) = stored_entry(&sandbox.connection(), &id);

    let change = sandbox
        .command()
        .env("DIARY_PASSWORD", PASSWORD)
        .env("DIARY_NEW_PASSWORD", "Battery2Staple")
        .args(["password", "change", "--no-input"])
        .output()
        .unwrap();
    assert_success(&change);
    let (_, after) = stored_entry(&sandbox.connection(), &id);
    assert_ne!(before, after);

    assert_success(&sandbox.run(&["lock"]));
    let old = sandbox.run_with_password(&["unlock", "--no-input"], PASSWORD);
    assert_eq!(old.status.code(), Some(5));
    let new = sandbox.run_with_password(&["unlock", "--no-input"], "Battery2Staple");
    assert_success(&new);
    let show = sandbox.run(&["show", &id]);
    assert!(stdout(&show).contains("Survives rotation"));
}

#[test]
fn test_export_to_file_decrypts() {
    let sandbox = Sandbox::new("export");
    sandbox.init("full");
    add_entry(&sandbox, "First");
    add_entry(&sandbox, "Second");
    let out = sandbox.base.join("export.jsonl");

    let export = sandbox.run(&[
        "export",
        "--format",
        "jsonl",
        "--output",
        out.to_str().unwrap(),
    ]);
    assert_success(&export);
    let contents = std::fs::read_to_string(&out).unwrap();
    assert_eq!(contents.lines().count(), 2);
    assert!(contents.contains("First"));
    assert!(contents.contains("Second"));
    assert!(contents.contains("\"sport\""));
}

#[test]
fn test_templates_and_missing_template() {
    let sandbox = Sandbox::new("tmpl");
    sandbox.init("none");

    let add = sandbox.run(&[
        "template",
        "add",
        "Workout",
        "--block",
        "text:Exercise",
        "--block",
        "slider:Effort:1-5",
    ]);
    assert_success(&add);
    let list = sandbox.run(&["template", "list", "--json"]);
    let names: Vec<String> = serde_json::from_str::<serde_json::Value>(&stdout(&list))
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    assert!(names.contains(&"Journal".to_string()));
    assert!(names.contains(&"Workout".to_string()));

    let out_of_range = sandbox.run(&["add", "Workout", "--value", "Effort=9", "--no-input"]);
    assert_eq!(out_of_range.status.code(), Some(4));
    let missing = sandbox.run(&["add", "Nope", "--value", "x=y", "--no-input"]);
    assert_eq!(missing.status.code(), Some(3));
}

#[test]
fn test_missing_diary_reports_not_found() {
    let sandbox = Sandbox::new("missing");
    let path = sandbox.base.join("absent.db");
    let output = sandbox.run(&["--diary", path.to_str().unwrap(), "list"]);
    assert_eq!(output.status.code(), Some(3));
}

#[cfg(feature = "test-support")]
mod biometric {
    use super::*;

    fn init_https(sandbox: &Sandbox) {
        let path = sandbox.diary_path();
        let output = sandbox.run_with_password(
            &[
                "init",
                path.to_str().unwrap(),
                "--mode",
                "full",
                "--origin",
                "https://diary.example.org",
                "--no-input",
            ],
            PASSWORD,
        );
        assert_success(&output);
    }

    fn with_authenticator(sandbox: &Sandbox, presence: &str, args: &[&str]) -> Output {
        sandbox
            .command()
            .env("DIARY_TEST_AUTHENTICATOR", presence)
            .args(args)
            .output()
            .unwrap()
    }

    #[test]
    fn test_biometric_unlock_after_lock() {
        let sandbox = Sandbox::new("bio");
        init_https(&sandbox);
        let id = add_entry(&sandbox, "Fingerprint");

        let enable = sandbox
            .command()
            .env("DIARY_TEST_AUTHENTICATOR", "approve")
            .env("DIARY_PASSWORD", PASSWORD)
            .args(["biometric", "enable", "--no-input"])
            .output()
            .unwrap();
        assert_success(&enable);
        assert_success(&sandbox.run(&["lock"]));

        let cancelled = with_authenticator(&sandbox, "cancel", &["unlock", "--biometric"]);
        assert_eq!(cancelled.status.code(), Some(5));

        let unlock = with_authenticator(&sandbox, "approve", &["unlock", "--biometric"]);
        assert_success(&unlock);
        assert!(stdout(&sandbox.run(&["show", &id])).contains("Fingerprint"));
    }

    #[test]
    fn test_biometric_is_unavailable_on_localhost() {
        let sandbox = Sandbox::new("biolocal");
        sandbox.init("full");
        let status = with_authenticator(&sandbox, "approve", &["biometric", "status", "--json"]);
        assert_success(&status);
        let value: serde_json::Value = serde_json::from_str(&stdout(&status)).unwrap();
        assert_eq!(value["state"], "unavailable");
    }

    #[test]
    fn test_downgrade_revokes_biometric() {
        let sandbox = Sandbox::new("biodown");
        init_https(&sandbox);
        let enable = sandbox
            .command()
            .env("DIARY_TEST_AUTHENTICATOR", "approve")
            .env("DIARY_PASSWORD", PASSWORD)
            .args(["biometric", "enable", "--no-input"])
            .output()
            .unwrap();
        assert_success(&enable);

        let downgrade = sandbox.run_with_password(&["mode", "none", "--no-input"], PASSWORD);
        assert_success(&downgrade);
        let status = with_authenticator(&sandbox, "approve", &["biometric", "status", "--json"]);
        let value: serde_json::Value = serde_json::from_str(&stdout(&status)).unwrap();
        assert_eq!(value["enabled"], false);
    }
}
