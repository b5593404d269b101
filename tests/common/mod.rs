//! Common test doubles for the probe transport and the Kerberos commands

use proxy_auth_healthcheck::core::checker::{
    AuthType, CredentialError, CredentialProcess, ProbeClient, ProbeRequest, ProbeResponse,
    ProxyAuth,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn urls(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

/// Which strategy issued a request, recovered from its proxy auth mode
pub fn auth_type_of(request: &ProbeRequest) -> AuthType {
    match request.auth {
        ProxyAuth::None => AuthType::No,
        ProxyAuth::Ntlm { .. } => AuthType::Ntlm,
        ProxyAuth::Negotiate => AuthType::Kerberos,
    }
}

/// Scripted probe transport
///
/// Responses are looked up by (URL, strategy), then by URL, then fall back to
/// `default`. Every request is recorded.
#[derive(Default)]
pub struct MockProbeClient {
    by_strategy: HashMap<(String, AuthType), Result<u16, String>>,
    by_url: HashMap<String, Result<u16, String>>,
    default: Option<Result<u16, String>>,
    delay: Option<fn(&ProbeRequest) -> Duration>,
    pub requests: Mutex<Vec<ProbeRequest>>,
}

impl MockProbeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every probe completes with 200
    pub fn always_ok() -> Self {
        Self::new().with_default(Ok(200))
    }

    pub fn with_default(mut self, outcome: Result<u16, String>) -> Self {
        self.default = Some(outcome);
        self
    }

    pub fn respond(mut self, url: &str, auth_type: AuthType, status: u16) -> Self {
        self.by_strategy
            .insert((url.to_string(), auth_type), Ok(status));
        self
    }

    pub fn fail(mut self, url: &str, auth_type: AuthType, error: &str) -> Self {
        self.by_strategy
            .insert((url.to_string(), auth_type), Err(error.to_string()));
        self
    }

    pub fn respond_url(mut self, url: &str, status: u16) -> Self {
        self.by_url.insert(url.to_string(), Ok(status));
        self
    }

    pub fn with_delay(mut self, delay: fn(&ProbeRequest) -> Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn recorded(&self) -> Vec<ProbeRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ProbeClient for MockProbeClient {
    async fn probe(&self, request: ProbeRequest) -> Result<ProbeResponse, String> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay(&request)).await;
        }

        let key = (request.url.clone(), auth_type_of(&request));
        let outcome = self
            .by_strategy
            .get(&key)
            .or_else(|| self.by_url.get(&request.url))
            .or(self.default.as_ref())
            .cloned()
            .unwrap_or_else(|| Err("URL not mocked".to_string()));

        outcome.map(|status_code| ProbeResponse {
            status_code,
            elapsed: Duration::from_millis(150),
        })
    }
}

/// Kerberos command double counting its calls
#[derive(Default)]
pub struct FakeCredentialProcess {
    pub fail_acquire: bool,
    pub fail_destroy: bool,
    pub acquired: AtomicUsize,
    pub destroyed: AtomicUsize,
    pub principals: Mutex<Vec<String>>,
    pub passwords: Mutex<Vec<String>>,
}

impl FakeCredentialProcess {
    pub fn working() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            fail_acquire: true,
            ..Self::default()
        })
    }

    pub fn failing_teardown() -> Arc<Self> {
        Arc::new(Self {
            fail_destroy: true,
            ..Self::default()
        })
    }

    pub fn acquire_calls(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn destroy_calls(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl CredentialProcess for FakeCredentialProcess {
    fn acquire(&self, principal: &str, password: &str) -> Result<(), CredentialError> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        self.principals.lock().unwrap().push(principal.to_string());
        self.passwords.lock().unwrap().push(password.to_string());
        if self.fail_acquire {
            return Err(CredentialError::Failed {
                command: "kinit".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "kinit: Password incorrect while getting initial credentials".to_string(),
            });
        }
        Ok(())
    }

    fn destroy(&self) -> Result<(), CredentialError> {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        if self.fail_destroy {
            return Err(CredentialError::Failed {
                command: "kdestroy".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "kdestroy: No credentials cache found".to_string(),
            });
        }
        Ok(())
    }
}
