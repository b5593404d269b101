use std::collections::HashMap;
use std::env;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, OnceLock};

use chrono::Local;
use flate2::{write::GzEncoder, Compression};
use fs2::FileExt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::defaults::{DEBUG_ENV, DEBUG_LOG_ENV};

const LOG_ROTATION_SIZE_MB: u64 = 4;
const MAX_ARCHIVES: usize = 3;
const ROTATION_CHECK_INTERVAL: u32 = 100;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,      // RFC 3339 with local offset
    pub level: String,          // DEBUG, ERROR, PROBE, CRED, RUN
    pub component: String,
    pub event: String,
    pub message: String,        // redacted
    pub correlation_id: String, // one per process run
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

struct RotatingLogFile {
    path: PathBuf,
    writes: AtomicU32,
}

impl RotatingLogFile {
    fn new(path: PathBuf) -> Self {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        Self {
            path,
            writes: AtomicU32::new(0),
        }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        if self.writes.fetch_add(1, Ordering::Relaxed) % ROTATION_CHECK_INTERVAL == 0 {
            let _ = self.rotate_if_needed();
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)
    }

    fn rotate_if_needed(&self) -> std::io::Result<()> {
        if !self.oversized()? {
            return Ok(());
        }

        // Several health checks may share one log; only one rotates
        let lock_path = self.path.with_extension("lock");
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)?;
        if lock.try_lock_exclusive().is_err() {
            return Ok(());
        }

        let rotated = if self.oversized()? {
            self.rotate()
        } else {
            Ok(())
        };
        let _ = lock.unlock();
        let _ = std::fs::remove_file(&lock_path);
        rotated
    }

    fn oversized(&self) -> std::io::Result<bool> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len() >= LOG_ROTATION_SIZE_MB * 1024 * 1024),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn rotate(&self) -> std::io::Result<()> {
        let (dir, stem) = self.archive_location();
        let archive = dir.join(format!(
            "{}.{}.gz",
            stem,
            Local::now().format("%Y%m%d_%H%M%S")
        ));

        let staging = self.path.with_extension("rotating");
        std::fs::rename(&self.path, &staging)?;

        let mut encoder = GzEncoder::new(File::create(&archive)?, Compression::default());
        std::io::copy(&mut BufReader::new(File::open(&staging)?), &mut encoder)?;
        encoder.finish()?;
        std::fs::remove_file(&staging)?;

        let _ = self.prune_archives(&dir, &stem);
        Ok(())
    }

    fn archive_location(&self) -> (PathBuf, String) {
        let dir = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "debug".to_string());
        (dir, stem)
    }

    fn prune_archives(&self, dir: &Path, stem: &str) -> std::io::Result<()> {
        let prefix = format!("{}.", stem);
        let mut archives = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(&prefix) && name.ends_with(".gz") {
                archives.push((entry.path(), entry.metadata()?.modified()?));
            }
        }

        archives.sort_by_key(|(_, modified)| *modified);
        let excess = archives.len().saturating_sub(MAX_ARCHIVES);
        for (path, _) in archives.into_iter().take(excess) {
            let _ = std::fs::remove_file(path);
        }
        Ok(())
    }
}

/// JSON-lines debug log for probe and credential lifecycle events
///
/// Disabled unless `PROXY_HEALTHCHECK_DEBUG` is truthy. Messages pass through
/// redaction before they are written; logging never fails the caller.
pub struct DebugLogger {
    file: Option<Mutex<RotatingLogFile>>,
    correlation_id: String,
    redaction_patterns: Vec<Regex>,
}

impl DebugLogger {
    /// Build from the environment
    pub fn new() -> Self {
        if Self::parse_debug_enabled() {
            Self::with_path(Self::log_path())
        } else {
            Self::build(None)
        }
    }

    /// Enabled logger writing to an explicit path
    pub fn with_path(path: PathBuf) -> Self {
        Self::build(Some(path))
    }

    fn build(path: Option<PathBuf>) -> Self {
        Self {
            file: path.map(|p| Mutex::new(RotatingLogFile::new(p))),
            correlation_id: Uuid::new_v4().to_string()[..8].to_string(),
            redaction_patterns: Self::compile_redaction_patterns(),
        }
    }

    /// Supports: true/false, 1/0, yes/no, on/off (case insensitive)
    fn parse_debug_enabled() -> bool {
        env::var(DEBUG_ENV)
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on"))
            .unwrap_or(false)
    }

    fn log_path() -> PathBuf {
        if let Ok(path) = env::var(DEBUG_LOG_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".proxy-auth-healthcheck");
        path.push("debug.log");
        path
    }

    fn compile_redaction_patterns() -> Vec<Regex> {
        [
            r"(?i)password\s*[=:]\s*\S+",
            r"(?i)(proxy-)?authorization\s*:\s*\S+(\s+\S+)?",
            r"(?i)token\s*[=:]\s*\S+",
        ]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    }

    fn redact(&self, text: &str) -> String {
        self.redaction_patterns
            .iter()
            .fold(text.to_string(), |acc, regex| {
                regex.replace_all(&acc, "[REDACTED]").into_owned()
            })
    }

    fn log(
        &self,
        level: &str,
        component: &str,
        event: &str,
        message: &str,
        fields: HashMap<String, Value>,
    ) {
        let Some(file) = &self.file else {
            return;
        };

        let entry = LogEntry {
            timestamp: Local::now().to_rfc3339(),
            level: level.to_string(),
            component: component.to_string(),
            event: event.to_string(),
            message: self.redact(message),
            correlation_id: self.correlation_id.clone(),
            fields,
        };

        if let (Ok(file), Ok(line)) = (file.lock(), serde_json::to_string(&entry)) {
            let _ = file.append(&line);
        }
    }

    pub fn debug_sync(&self, component: &str, event: &str, message: &str) {
        self.log("DEBUG", component, event, message, HashMap::new());
    }

    pub fn error_sync(&self, component: &str, event: &str, message: &str) {
        self.log("ERROR", component, event, message, HashMap::new());
    }

    pub fn probe_start(&self, auth_type: &str, url: &str, timeout_ms: u64) {
        let mut fields = HashMap::new();
        fields.insert("auth_type".to_string(), Value::from(auth_type));
        fields.insert("url".to_string(), Value::from(url));
        fields.insert("timeout_ms".to_string(), Value::from(timeout_ms));

        self.log(
            "PROBE",
            "AuthStrategy",
            "probe_start",
            &format!("Probing {} with {} auth", url, auth_type),
            fields,
        );
    }

    pub fn probe_end(
        &self,
        auth_type: &str,
        url: &str,
        http_status: Option<u16>,
        success: bool,
        duration_ms: u64,
    ) {
        let mut fields = HashMap::new();
        fields.insert("auth_type".to_string(), Value::from(auth_type));
        fields.insert("url".to_string(), Value::from(url));
        fields.insert("success".to_string(), Value::from(success));
        fields.insert("duration_ms".to_string(), Value::from(duration_ms));
        if let Some(code) = http_status {
            fields.insert("http_status".to_string(), Value::from(code));
        }

        let outcome = match http_status {
            Some(code) => code.to_string(),
            None => "no response".to_string(),
        };
        self.log(
            "PROBE",
            "AuthStrategy",
            "probe_end",
            &format!("{} via {}: {} ({}ms)", url, auth_type, outcome, duration_ms),
            fields,
        );
    }

    pub fn credential_event(&self, event: &str, principal: &str, detail: Option<&str>) {
        let mut fields = HashMap::new();
        fields.insert("principal".to_string(), Value::from(principal));

        let level = if detail.is_some() { "ERROR" } else { "CRED" };
        let message = match detail {
            Some(detail) => format!("{} for {}: {}", event, principal, detail),
            None => format!("{} for {}", event, principal),
        };
        self.log(level, "CredentialSession", event, &message, fields);
    }

    pub fn run_summary(&self, results: usize, reachable_urls: usize, working_auth: usize, healthy: bool) {
        let mut fields = HashMap::new();
        fields.insert("results".to_string(), Value::from(results));
        fields.insert("reachable_urls".to_string(), Value::from(reachable_urls));
        fields.insert("working_auth_types".to_string(), Value::from(working_auth));
        fields.insert("healthy".to_string(), Value::from(healthy));

        self.log(
            "RUN",
            "HealthCheck",
            "run_complete",
            &format!("Health check finished: healthy={}", healthy),
            fields,
        );
    }

    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}

impl Default for DebugLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide logger, configured from the environment on first use
pub fn debug_logger() -> &'static DebugLogger {
    static LOGGER: OnceLock<DebugLogger> = OnceLock::new();
    LOGGER.get_or_init(DebugLogger::new)
}
