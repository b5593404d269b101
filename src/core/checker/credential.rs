//! Kerberos ticket lifecycle
//!
//! A [`CredentialSession`] wraps one Kerberos strategy run:
//! `Uninitialized -> Acquired -> Destroyed`, linear, no retries. The ticket is
//! obtained and destroyed through an injectable [`CredentialProcess`];
//! production uses the system `kinit` / `kdestroy` commands.

use std::fmt;
use std::io::Write;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Arc;

use tokio::runtime::{Handle, RuntimeFlavor};

use crate::config::defaults::{KDESTROY_COMMAND, KINIT_COMMAND};
use crate::core::debug_logger::debug_logger;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("could not start {command} command: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{command} did not run successfully: {status} stderr: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("credential worker failed: {0}")]
    Worker(String),
}

/// External ticket management commands
///
/// Both calls block until the process exits; diagnostic output is captured
/// completely before the exit status is inspected.
pub trait CredentialProcess: Send + Sync {
    /// Obtain a ticket for `principal`, feeding `password` on a private channel
    fn acquire(&self, principal: &str, password: &str) -> Result<(), CredentialError>;

    /// Destroy the current ticket
    fn destroy(&self) -> Result<(), CredentialError>;
}

/// `kinit` / `kdestroy` from the system Kerberos client
#[derive(Debug, Clone)]
pub struct KerberosTicketCommands {
    kinit: String,
    kdestroy: String,
}

impl Default for KerberosTicketCommands {
    fn default() -> Self {
        Self {
            kinit: KINIT_COMMAND.to_string(),
            kdestroy: KDESTROY_COMMAND.to_string(),
        }
    }
}

impl KerberosTicketCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use different programs, e.g. absolute paths or test doubles
    pub fn with_programs(kinit: impl Into<String>, kdestroy: impl Into<String>) -> Self {
        Self {
            kinit: kinit.into(),
            kdestroy: kdestroy.into(),
        }
    }

    fn spawn_error(command: &str, source: std::io::Error) -> CredentialError {
        CredentialError::Spawn {
            command: command.to_string(),
            source,
        }
    }

    fn check_exit(command: &str, status: ExitStatus, stderr: &[u8]) -> Result<(), CredentialError> {
        if status.success() {
            return Ok(());
        }
        Err(CredentialError::Failed {
            command: command.to_string(),
            status: status.to_string(),
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        })
    }
}

impl CredentialProcess for KerberosTicketCommands {
    fn acquire(&self, principal: &str, password: &str) -> Result<(), CredentialError> {
        let mut child = Command::new(&self.kinit)
            .arg(principal)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Self::spawn_error(&self.kinit, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A kinit that exits early closes its end; the exit status reports why
            let _ = stdin.write_all(password.as_bytes());
            let _ = stdin.write_all(b"\n");
        }

        let output = child
            .wait_with_output()
            .map_err(|e| Self::spawn_error(&self.kinit, e))?;
        Self::check_exit(&self.kinit, output.status, &output.stderr)
    }

    fn destroy(&self) -> Result<(), CredentialError> {
        let output = Command::new(&self.kdestroy)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Self::spawn_error(&self.kdestroy, e))?;
        Self::check_exit(&self.kdestroy, output.status, &output.stderr)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Acquired,
    Destroyed,
}

/// Ticket owned by a single Kerberos strategy run
///
/// An `Acquired` session that is dropped without [`CredentialSession::destroy`]
/// tears the ticket down synchronously.
pub struct CredentialSession {
    process: Arc<dyn CredentialProcess>,
    principal: String,
    state: SessionState,
}

impl fmt::Debug for CredentialSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSession")
            .field("principal", &self.principal)
            .field("state", &self.state)
            .finish()
    }
}

impl CredentialSession {
    pub fn new(process: Arc<dyn CredentialProcess>, principal: impl Into<String>) -> Self {
        Self {
            process,
            principal: principal.into(),
            state: SessionState::Uninitialized,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Acquire the ticket. On failure the session stays `Uninitialized`.
    pub async fn acquire(&mut self, password: &str) -> Result<(), CredentialError> {
        if self.state != SessionState::Uninitialized {
            return Ok(());
        }

        let process = Arc::clone(&self.process);
        let principal = self.principal.clone();
        let password = password.to_string();
        let acquired = tokio::task::spawn_blocking(move || process.acquire(&principal, &password))
            .await
            .map_err(|e| CredentialError::Worker(e.to_string()))
            .and_then(|result| result);

        match &acquired {
            Ok(()) => {
                self.state = SessionState::Acquired;
                debug_logger().credential_event("ticket_acquired", &self.principal, None);
            }
            Err(e) => {
                debug_logger().credential_event(
                    "ticket_acquisition_failed",
                    &self.principal,
                    Some(&e.to_string()),
                );
            }
        }
        acquired
    }

    /// Destroy the ticket if one was acquired. Best effort: a failing teardown
    /// is reported to the operator and returned, and the session is still
    /// considered destroyed.
    pub async fn destroy(&mut self) -> Result<(), CredentialError> {
        if self.state != SessionState::Acquired {
            return Ok(());
        }
        self.state = SessionState::Destroyed;

        let process = Arc::clone(&self.process);
        let destroyed = tokio::task::spawn_blocking(move || process.destroy())
            .await
            .map_err(|e| CredentialError::Worker(e.to_string()))
            .and_then(|result| result);
        self.report_teardown(&destroyed);
        destroyed
    }

    fn report_teardown(&self, outcome: &Result<(), CredentialError>) {
        match outcome {
            Ok(()) => debug_logger().credential_event("ticket_destroyed", &self.principal, None),
            Err(e) => {
                debug_logger().credential_event(
                    "ticket_teardown_failed",
                    &self.principal,
                    Some(&e.to_string()),
                );
                eprintln!("warning: kerberos ticket cleanup failed: {}", e);
            }
        }
    }
}

impl Drop for CredentialSession {
    // Only reached on error or panic paths; the normal path awaits `destroy`
    fn drop(&mut self) {
        if self.state != SessionState::Acquired {
            return;
        }
        self.state = SessionState::Destroyed;

        let process = &self.process;
        let destroyed = match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| process.destroy())
            }
            _ => process.destroy(),
        };
        self.report_teardown(&destroyed);
    }
}
