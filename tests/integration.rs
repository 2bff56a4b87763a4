use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn clonetime_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("clonetime");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    // Offline: no browser, no model. Every estimate is the tier fallback.
    let config_content = format!(
        r#"[db]
path = "{}/data/clonetime.sqlite"

[runtime]
mode = "production"

[crawler]
browser = false
fetch_timeout_secs = 5

[llm]
provider = "disabled"
"#,
        root.display()
    );

    let config_path = config_dir.join("clonetime.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_clonetime(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = clonetime_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("CLONETIME_ENV")
        .env("CLONETIME_LOG", "warn")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run clonetime binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

/// Serve a tiny marketing site on an ephemeral port from a background
/// thread. Returns its base URL.
fn spawn_test_site() -> String {
    use axum::{response::Html, routing::get, Router};

    let filler = "Acme keeps small teams organised with shared boards and timelines. ".repeat(3);
    let home = format!(
        "<html><head><title>Acme Boards</title></head><body><h1>Acme</h1><p>{}</p></body></html>",
        filler
    );
    let pricing = format!(
        "<html><head><title>Pricing</title></head><body><p>Free for five users. {}</p></body></html>",
        filler
    );

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let app = Router::new()
                .route("/", get(move || std::future::ready(Html(home.clone()))))
                .route("/pricing", get(move || std::future::ready(Html(pricing.clone()))));
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });

    format!("http://{}", addr)
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_clonetime(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_clonetime(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_clonetime(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_fingerprint_needs_no_config() {
    let missing = Path::new("/nonexistent/clonetime.toml");
    let (stdout, stderr, success) = run_clonetime(
        missing,
        &["fingerprint", "HTTP://Example.com/Docs/", "--tier", "prod-lite"],
    );
    assert!(success, "fingerprint failed: {}", stderr);
    assert!(stdout.contains("url_canonical: https://example.com/docs"));
    assert!(stdout
        .contains("fingerprint:   d0ed2233c2e487a53631a1630d3dbc1cf10a13917f184ae4673cf2a426731cfe"));
}

#[test]
fn test_fingerprint_rejects_bad_tier() {
    let (_tmp, config_path) = setup_test_env();
    let (_, stderr, success) =
        run_clonetime(&config_path, &["fingerprint", "example.com", "--tier", "gold"]);
    assert!(!success);
    assert!(stderr.contains("Invalid tier"));
}

#[test]
fn test_analyze_caches_result() {
    let (_tmp, config_path) = setup_test_env();
    let site = spawn_test_site();
    run_clonetime(&config_path, &["init"]);

    let (first, stderr, success) =
        run_clonetime(&config_path, &["analyze", &site, "--tier", "speedrun", "--json"]);
    assert!(success, "analyze failed: stdout={}, stderr={}", first, stderr);

    let result: serde_json::Value = serde_json::from_str(&first).unwrap();
    assert_eq!(result["total_hours"], 4.0);
    let evidence_urls: Vec<&str> = result["evidence"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["url"].as_str().unwrap())
        .collect();
    assert_eq!(evidence_urls, vec![site.clone(), format!("{}/pricing", site)]);

    // Trailing slash and force (ignored in production) still hit the cache
    let again = format!("{}/", site);
    let (second, _, success) = run_clonetime(
        &config_path,
        &["analyze", &again, "--tier", "speedrun", "--json", "--force"],
    );
    assert!(success);
    assert_eq!(second, first);
}

#[test]
fn test_analyze_human_report() {
    let (_tmp, config_path) = setup_test_env();
    let site = spawn_test_site();
    run_clonetime(&config_path, &["init"]);

    let (stdout, stderr, success) = run_clonetime(&config_path, &["analyze", &site, "--tier", "mvp"]);
    assert!(success, "analyze failed: {}", stderr);
    assert!(stdout.contains("total_hours: 8.0"));
    assert!(stdout.contains("--- Missions"));
    assert!(stdout.contains("[M] "));
}

#[test]
fn test_analyze_rejects_missing_host() {
    let (_tmp, config_path) = setup_test_env();
    run_clonetime(&config_path, &["init"]);

    let (_, stderr, success) = run_clonetime(&config_path, &["analyze", "https://", "--tier", "mvp"]);
    assert!(!success);
    assert!(stderr.contains("Invalid URL format"));
}

#[test]
fn test_list_empty_then_populated() {
    let (_tmp, config_path) = setup_test_env();
    let site = spawn_test_site();
    run_clonetime(&config_path, &["init"]);

    let (stdout, _, success) = run_clonetime(&config_path, &["list"]);
    assert!(success);
    assert!(stdout.contains("No analyses found."));

    run_clonetime(&config_path, &["analyze", &site, "--tier", "prod-lite"]);

    let (stdout, stderr, success) = run_clonetime(&config_path, &["list", "--search", "127.0.0.1"]);
    assert!(success, "list failed: {}", stderr);
    assert!(stdout.contains("prod-lite"));
    assert!(stdout.contains("16.0h"));

    let (stdout, _, success) = run_clonetime(&config_path, &["list", "--json", "--limit", "100"]);
    assert!(success);
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["tier"], "prod-lite");
}

#[test]
fn test_missing_config_errors() {
    let (_, stderr, success) = run_clonetime(Path::new("/nonexistent/clonetime.toml"), &["list"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
