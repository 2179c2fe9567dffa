//! Non-interactive subcommands run through `run_app`.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use codealarm::cli::Cli;
use codealarm::error::{ExitCode, StructuredError};
use codealarm::identity::IdentityStore;
use codealarm::storage::STORE_FILE_NAME;
use tempfile::TempDir;

use super::mock_service;

/// Write a config pointing storage at `dir` and return its path.
fn write_config(dir: &Path) -> PathBuf {
    let path = dir.join("config.toml");
    let content = format!("storage_dir = {:?}\n", dir.join("data").display().to_string());
    fs::write(&path, content).unwrap();
    path
}

fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec!["codealarm", "--no-color"];
    argv.extend_from_slice(args);
    codealarm::run_app(Cli::try_parse_from(argv).unwrap())
}

#[test]
fn test_whoami_without_login() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());

    let err = run(&["--config", config.to_str().unwrap(), "whoami"]).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::NotLoggedIn);

    let structured = StructuredError::new(&err, ExitCode::for_error(&err));
    assert_eq!(structured.code, "CA002");
    assert!(structured.message.contains("not logged in"));
}

#[test]
fn test_login_whoami_logout() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mock = runtime.block_on(mock_service::start());
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());
    let config = config.to_str().unwrap();

    let code = run(&["--config", config, "--base-url", &mock.base_url, "login", "alice"]).unwrap();
    assert_eq!(code, ExitCode::Success);

    let store = IdentityStore::open(dir.path().join("data").join(STORE_FILE_NAME)).unwrap();
    assert_eq!(store.current().unwrap().username, "alice");

    assert_eq!(run(&["--config", config, "whoami"]).unwrap(), ExitCode::Success);
    assert_eq!(
        run(&["--config", config, "--base-url", &mock.base_url, "status"]).unwrap(),
        ExitCode::Success
    );

    assert_eq!(run(&["--config", config, "logout"]).unwrap(), ExitCode::Success);
    let store = IdentityStore::open(dir.path().join("data").join(STORE_FILE_NAME)).unwrap();
    assert!(store.current().is_none());
}

#[test]
fn test_login_invalid_user_exit_code() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mock = runtime.block_on(mock_service::start());
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());

    let err = run(&[
        "--config",
        config.to_str().unwrap(),
        "--base-url",
        &mock.base_url,
        "login",
        "ghost",
    ])
    .unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::ServiceUnavailable);
    assert!(format!("{err:#}").contains("Invalid username. Please try again."));
}

#[test]
fn test_status_service_error() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mock = runtime.block_on(mock_service::start());
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());
    let config = config.to_str().unwrap();

    run(&["--config", config, "--base-url", &mock.base_url, "login", "flaky"]).unwrap();
    let err = run(&["--config", config, "--base-url", &mock.base_url, "status"]).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::ServiceUnavailable);
}

#[test]
fn test_config_init_refuses_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fresh.toml");
    let path_str = path.to_str().unwrap();

    assert_eq!(run(&["--config", path_str, "config", "--init"]).unwrap(), ExitCode::Success);
    assert!(fs::read_to_string(&path).unwrap().contains("[service]"));

    assert!(run(&["--config", path_str, "config", "--init"]).is_err());
    assert_eq!(
        run(&["--config", path_str, "config", "--init", "--force"]).unwrap(),
        ExitCode::Success
    );
}

#[test]
fn test_config_show() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());
    assert_eq!(
        run(&["--config", config.to_str().unwrap(), "config"]).unwrap(),
        ExitCode::Success
    );
}
