use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Env var named as the generation credential in test configs; never set.
const UNSET_KEY_VAR: &str = "DOCQA_TEST_UNSET_GENERATION_KEY";

fn docqa_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("docqa");
    path
}

fn write_config(root: &Path, backend: &str) -> PathBuf {
    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[store]
backend = "{backend}"
db_path = "{root}/data/docqa.sqlite"
knowledge_file = "{root}/data/knowledge_base.txt"

[generation]
api_key_env = "{key}"

[search]
api_key_env = "{key}_SEARCH"

[server]
bind = "127.0.0.1:7331"
"#,
        backend = backend,
        root = root.display(),
        key = UNSET_KEY_VAR,
    );

    let config_path = config_dir.join("docqa.toml");
    fs::write(&config_path, config_content).unwrap();
    config_path
}

fn setup_test_env(backend: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let files_dir = root.join("files");
    fs::create_dir_all(files_dir.join("week2")).unwrap();
    fs::write(
        files_dir.join("bltu.txt"),
        "BLTU stands for Basic Logic Transfer Unit.\nIt moves\nbits between registers.",
    )
    .unwrap();
    fs::write(
        files_dir.join("week2").join("biology.txt"),
        "Photosynthesis converts light energy into chemical energy.",
    )
    .unwrap();
    fs::write(files_dir.join("diagram.png"), [0u8, 159, 146, 150]).unwrap();

    let config_path = write_config(&root, backend);
    (tmp, config_path)
}

fn run_docqa(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = docqa_binary();
    let root = config_path.parent().and_then(Path::parent).unwrap();
    let output = Command::new(&binary)
        .current_dir(root)
        .env_remove(UNSET_KEY_VAR)
        .env("RUST_LOG", "warn")
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run docqa binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn files(config_path: &Path, name: &str) -> String {
    let root = config_path.parent().and_then(Path::parent).unwrap();
    root.join("files").join(name).display().to_string()
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env("database");

    let (stdout, stderr, success) = run_docqa(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env("database");

    let (_, _, success1) = run_docqa(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_docqa(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_init_writes_default_config_when_missing() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("config").join("docqa.toml");

    let (stdout, stderr, success) = run_docqa(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Wrote default configuration"));

    let written = fs::read_to_string(&config_path).unwrap();
    assert!(written.contains("gemini-2.0-flash"));
    assert!(written.contains("full_context_limit = 500000"));
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("config").join("docqa.toml");
    let (_, stderr, success) = run_docqa(&config_path, &["stats"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_invalid_retrieval_config_rejected() {
    let (_tmp, config_path) = setup_test_env("database");
    let mut content = fs::read_to_string(&config_path).unwrap();
    content.push_str("\n[retrieval]\nchunk_size = 100\noverlap = 150\n");
    fs::write(&config_path, content).unwrap();

    let (_, stderr, success) = run_docqa(&config_path, &["init"]);
    assert!(!success);
    assert!(stderr.contains("overlap"));
}

#[test]
fn test_ingest_and_list() {
    let (_tmp, config_path) = setup_test_env("database");
    run_docqa(&config_path, &["init"]);

    let (stdout, stderr, success) = run_docqa(
        &config_path,
        &["ingest", &files(&config_path, "bltu.txt"), "--uploaded-by", "sam"],
    );
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("ingest bltu.txt"));
    assert!(stdout.contains("Inserted"));

    let (stdout, _, success) = run_docqa(&config_path, &["list"]);
    assert!(success);
    assert!(stdout.contains("bltu.txt"));
    assert!(stdout.contains("sam"));
}

#[test]
fn test_reingest_same_file_is_unchanged() {
    let (_tmp, config_path) = setup_test_env("database");
    let path = files(&config_path, "bltu.txt");

    run_docqa(&config_path, &["ingest", &path]);
    let (stdout, _, success) = run_docqa(&config_path, &["ingest", &path]);
    assert!(success);
    assert!(stdout.contains("Unchanged"));
}

#[test]
fn test_ingest_unsupported_file_fails() {
    let (_tmp, config_path) = setup_test_env("database");
    let (_, stderr, success) =
        run_docqa(&config_path, &["ingest", &files(&config_path, "diagram.png")]);
    assert!(!success);
    assert!(stderr.contains("unsupported file type"));
}

#[test]
fn test_context_is_full_corpus_normalized() {
    let (_tmp, config_path) = setup_test_env("database");
    run_docqa(&config_path, &["ingest", &files(&config_path, "bltu.txt")]);

    let (stdout, _, success) = run_docqa(&config_path, &["context", "What does BLTU stand for?"]);
    assert!(success);
    assert!(stdout.contains(
        "BLTU stands for Basic Logic Transfer Unit. It moves bits between registers."
    ));
}

#[test]
fn test_ask_without_credential_returns_excerpt() {
    let (_tmp, config_path) = setup_test_env("database");
    run_docqa(&config_path, &["ingest", &files(&config_path, "bltu.txt")]);

    let (stdout, stderr, success) =
        run_docqa(&config_path, &["ask", "What does BLTU stand for?", "--explain"]);
    assert!(success, "ask failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("I found the relevant information in your notes"));
    assert!(stdout.contains("the answering assistant is unavailable"));
    assert!(stdout.contains("Basic Logic Transfer Unit"));
    assert!(stdout.contains("tier: excerpt"));
}

#[test]
fn test_ask_empty_corpus_not_found() {
    let (_tmp, config_path) = setup_test_env("database");
    run_docqa(&config_path, &["init"]);

    let (stdout, _, success) = run_docqa(&config_path, &["ask", "What is osmosis?"]);
    assert!(success);
    assert!(stdout.contains("I couldn't find the answer in your documents."));
}

#[test]
fn test_delete_document() {
    let (_tmp, config_path) = setup_test_env("database");
    run_docqa(&config_path, &["ingest", &files(&config_path, "bltu.txt")]);

    let (stdout, _, _) = run_docqa(&config_path, &["list"]);
    let id = stdout
        .lines()
        .find(|l| l.contains("bltu.txt"))
        .and_then(|l| l.split_whitespace().next())
        .unwrap()
        .to_string();

    let (stdout, _, success) = run_docqa(&config_path, &["delete", &id]);
    assert!(success);
    assert!(stdout.contains("Deleted"));

    let (stdout, _, _) = run_docqa(&config_path, &["list"]);
    assert!(stdout.contains("No documents stored."));

    let (_, stderr, success) = run_docqa(&config_path, &["delete", &id]);
    assert!(!success);
    assert!(stderr.contains("No document with id"));
}

#[test]
fn test_reindex_database() {
    let (tmp, config_path) = setup_test_env("database");
    let dir = tmp.path().join("files");

    let (stdout, stderr, success) =
        run_docqa(&config_path, &["reindex", dir.to_str().unwrap()]);
    assert!(success, "reindex failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("ingested: 2"));

    let (stdout, _, _) = run_docqa(&config_path, &["reindex", dir.to_str().unwrap()]);
    assert!(stdout.contains("unchanged: 2"));

    let (stdout, _, _) = run_docqa(&config_path, &["list"]);
    assert!(stdout.contains("system_recovery"));
}

#[test]
fn test_file_backend_appends_knowledge_file() {
    let (tmp, config_path) = setup_test_env("file");

    let (stdout, stderr, success) = run_docqa(
        &config_path,
        &[
            "ingest",
            &files(&config_path, "bltu.txt"),
            "--source",
            "lecture-1",
            "--uploaded-by",
            "kim",
        ],
    );
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);

    let kb = fs::read_to_string(tmp.path().join("data").join("knowledge_base.txt")).unwrap();
    assert!(kb.contains("--- Source: lecture-1 (uploaded by kim) ---"));
    assert!(kb.contains("BLTU stands for Basic Logic Transfer Unit."));

    let (_, stderr, success) = run_docqa(&config_path, &["list"]);
    assert!(!success);
    assert!(stderr.contains("requires the database backend"));
}

#[test]
fn test_file_backend_reindex_rebuilds() {
    let (tmp, config_path) = setup_test_env("file");
    let dir = tmp.path().join("files");

    run_docqa(&config_path, &["reindex", dir.to_str().unwrap()]);
    run_docqa(&config_path, &["reindex", dir.to_str().unwrap()]);

    let kb = fs::read_to_string(tmp.path().join("data").join("knowledge_base.txt")).unwrap();
    assert_eq!(kb.matches("Photosynthesis converts light energy").count(), 1);
}

#[test]
fn test_stats() {
    let (_tmp, config_path) = setup_test_env("database");
    run_docqa(&config_path, &["ingest", &files(&config_path, "bltu.txt")]);

    let (stdout, _, success) = run_docqa(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Documents:   1"));
    assert!(stdout.contains("full context"));
    assert!(stdout.contains("gemini-2.0-flash"));
    assert!(stdout.contains("disabled"));
}

#[test]
fn test_completions() {
    let (_tmp, config_path) = setup_test_env("database");
    let (stdout, _, success) = run_docqa(&config_path, &["completions", "bash"]);
    assert!(success);
    assert!(stdout.contains("docqa"));
}
