//! Tests for environment and file configuration

use serial_test::serial;
use std::io::Write;

use notice_sentinel::config::Config;

const VARS: &[&str] = &[
    "REDIS_CHAN",
    "REDIS_HOST",
    "REDIS_PORT",
    "REDIS_PASS",
    "SERVER_NAME",
    "START_TARGET_ID",
    "SLOT",
    "PERIOD_SEC",
    "NOTICE_API_URL",
    "NOTICE_PAGE_URL",
    "CONNECT_TIMEOUT_MS",
    "READ_TIMEOUT_MS",
    "SENTINEL_LOG_LEVEL",
    "SENTINEL_LOG_FORMAT",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_from_empty_env() {
    clear_env();

    let config = Config::from_env().unwrap();
    assert_eq!(config.redis.channel, "announces");
    assert_eq!(config.redis.host, "127.0.0.1");
    assert_eq!(config.redis.port, 6379);
    assert!(config.redis.password.is_empty());
    assert_eq!(config.instance.period_secs, 4);
    assert_eq!(config.instance.start_id, 0);
    assert_eq!(config.instance.slot, None);
    assert!(!config.instance.server_name.is_empty());
    assert_eq!(config.fetch.connect_timeout_ms, 2000);
    assert_eq!(config.fetch.read_timeout_ms, 3000);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_env_overrides() {
    clear_env();
    std::env::set_var("REDIS_CHAN", "listings");
    std::env::set_var("REDIS_HOST", "redis.internal");
    std::env::set_var("REDIS_PORT", "6380");
    std::env::set_var("REDIS_PASS", "hunter2");
    std::env::set_var("SERVER_NAME", "seoul-2");
    std::env::set_var("START_TARGET_ID", "4821");
    std::env::set_var("SLOT", "3");
    std::env::set_var("PERIOD_SEC", "5");
    std::env::set_var("NOTICE_API_URL", "http://localhost:9000/feed");

    let config = Config::from_env().unwrap();
    clear_env();

    assert_eq!(config.redis.channel, "listings");
    assert_eq!(config.redis.host, "redis.internal");
    assert_eq!(config.redis.port, 6380);
    assert_eq!(config.redis.password, "hunter2");
    assert_eq!(config.instance.server_name, "seoul-2");
    assert_eq!(config.instance.start_id, 4821);
    assert_eq!(config.instance.slot, Some(3));
    assert_eq!(config.instance.period_secs, 5);
    assert_eq!(config.fetch.api_url, "http://localhost:9000/feed");
}

#[test]
#[serial]
fn test_invalid_start_id_is_fatal() {
    clear_env();
    std::env::set_var("START_TARGET_ID", "latest");

    let result = Config::from_env();
    clear_env();

    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("START_TARGET_ID"));
}

#[test]
#[serial]
fn test_invalid_slot_falls_back_to_random() {
    clear_env();
    std::env::set_var("SLOT", "abc");

    let config = Config::from_env();
    clear_env();

    assert_eq!(config.unwrap().instance.slot, None);
}

#[test]
#[serial]
fn test_invalid_port_is_fatal() {
    clear_env();
    std::env::set_var("REDIS_PORT", "70000");

    let result = Config::from_env();
    clear_env();

    assert!(result.is_err());
}

#[test]
#[serial]
fn test_blank_values_use_defaults() {
    clear_env();
    std::env::set_var("REDIS_CHAN", "  ");
    std::env::set_var("PERIOD_SEC", "");

    let config = Config::from_env().unwrap();
    clear_env();

    assert_eq!(config.redis.channel, "announces");
    assert_eq!(config.instance.period_secs, 4);
}

#[test]
fn test_from_toml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[instance]
server_name = "frankfurt-1"
period_secs = 6
slot = 5
start_id = 900

[fetch]
api_url = "http://127.0.0.1:8080/feed"
notice_page_url = "http://127.0.0.1:8080/notice"
connect_timeout_ms = 500
read_timeout_ms = 800

[redis]
host = "10.0.0.5"
port = 6379
channel = "announces"

[logging]
level = "debug"
format = "json"
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.instance.server_name, "frankfurt-1");
    assert_eq!(config.instance.slot, Some(5));
    assert_eq!(config.instance.start_id, 900);
    assert_eq!(config.redis.password, "");
    assert_eq!(config.redis.pool_size, 2);
    assert_eq!(config.logging.format, "json");

    let fetcher = config.fetcher_config();
    assert_eq!(fetcher.read_timeout.as_millis(), 800);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::from_file(&dir.path().join("absent.toml"));
    assert!(result.is_err());
}
