use std::env;
use std::fs;

use proxy_auth_healthcheck::core::debug_logger::{debug_logger, DebugLogger, LogEntry};
use serial_test::serial;
use tempfile::tempdir;

fn read_entries(path: &std::path::Path) -> Vec<LogEntry> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
#[serial]
fn test_debug_logger_disabled_by_default() {
    // Pin the global before touching the environment
    let _ = debug_logger();
    env::remove_var("PROXY_HEALTHCHECK_DEBUG");

    let logger = DebugLogger::new();
    assert!(!logger.is_enabled());

    // Disabled logger swallows everything
    logger.debug_sync("test", "event", "message");
    logger.probe_end("ntlm", "http://a", None, false, 10);
}

#[test]
#[serial]
fn test_debug_logger_env_var_parsing() {
    let _ = debug_logger();
    let dir = tempdir().unwrap();
    env::set_var("PROXY_HEALTHCHECK_DEBUG_LOG", dir.path().join("debug.log"));

    let cases = [
        ("true", true),
        ("1", true),
        ("YES", true),
        (" on ", true),
        ("false", false),
        ("0", false),
        ("invalid", false),
        ("", false),
    ];
    for (value, expected) in cases {
        env::set_var("PROXY_HEALTHCHECK_DEBUG", value);
        let logger = DebugLogger::new();
        assert_eq!(logger.is_enabled(), expected, "Failed for value: {:?}", value);
    }

    env::remove_var("PROXY_HEALTHCHECK_DEBUG");
    env::remove_var("PROXY_HEALTHCHECK_DEBUG_LOG");
}

#[test]
fn test_writes_one_json_line_per_event() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("logs").join("debug.log");
    let logger = DebugLogger::with_path(path.clone());
    assert!(logger.is_enabled());

    logger.probe_start("kerberos", "http://a", 2000);
    logger.probe_end("kerberos", "http://a", Some(200), true, 42);
    logger.credential_event("ticket_acquired", "svc@CORP", None);
    logger.run_summary(3, 1, 1, true);

    let entries = read_entries(&path);
    assert_eq!(entries.len(), 4);
    assert!(entries
        .iter()
        .all(|e| e.correlation_id == logger.correlation_id()));

    assert_eq!(entries[0].event, "probe_start");
    assert_eq!(entries[0].fields["timeout_ms"], 2000);
    assert_eq!(entries[1].level, "PROBE");
    assert_eq!(entries[1].fields["http_status"], 200);
    assert_eq!(entries[1].fields["success"], true);
    assert_eq!(entries[2].level, "CRED");
    assert_eq!(entries[3].event, "run_complete");
    assert_eq!(entries[3].fields["healthy"], true);
}

#[test]
fn test_failed_credential_event_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("debug.log");
    let logger = DebugLogger::with_path(path.clone());

    logger.credential_event("ticket_acquire_failed", "svc@CORP", Some("kinit exited 1"));

    let entries = read_entries(&path);
    assert_eq!(entries[0].level, "ERROR");
    assert!(entries[0].message.contains("kinit exited 1"));
}

#[test]
fn test_secrets_are_redacted() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("debug.log");
    let logger = DebugLogger::with_path(path.clone());

    logger.debug_sync("test", "leak", "user=svc password=hunter2 rest");
    logger.debug_sync("test", "leak", "Proxy-Authorization: NTLM TlRMTVNTUAAB");
    logger.error_sync("test", "keep", "kinit: Password incorrect while getting initial credentials");

    let raw = fs::read_to_string(&path).unwrap();
    assert!(!raw.contains("hunter2"));
    assert!(!raw.contains("TlRMTVNTUAAB"));

    let entries = read_entries(&path);
    assert_eq!(entries[0].message, "user=svc [REDACTED] rest");
    assert!(entries[2].message.contains("Password incorrect"));
}
