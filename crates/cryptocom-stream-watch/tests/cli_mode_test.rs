use std::process::Command;

#[test]
fn cli_mode_with_config_and_dry_run_works() {
    let binary_path = env!("CARGO_BIN_EXE_cryptocom-stream-watch");
    let config_path = format!("{}/examples/watch.yaml", env!("CARGO_MANIFEST_DIR"));

    let output = Command::new(binary_path)
        .arg("--config")
        .arg(config_path)
        .arg("--dry-run")
        .arg("--log-level")
        .arg("error")
        .output()
        .expect("Failed to start cryptocom-stream-watch binary");

    assert!(
        output.status.success(),
        "Process exited with non-zero status: {}\nStdout: {}\nStderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn cli_mode_rejects_invalid_config() {
    let binary_path = env!("CARGO_BIN_EXE_cryptocom-stream-watch");
    let dir = std::env::temp_dir().join(format!("cryptocom-watch-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    let config_path = dir.join("invalid.yaml");
    std::fs::write(&config_path, "watches:\n  - kind: balance\n").expect("write config");

    let output = Command::new(binary_path)
        .arg("--config")
        .arg(&config_path)
        .arg("--dry-run")
        .output()
        .expect("Failed to start cryptocom-stream-watch binary");

    assert!(!output.status.success(), "private watch without credentials must fail");
    let _ = std::fs::remove_dir_all(&dir);
}
