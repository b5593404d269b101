//! Authentication strategies
//!
//! Each strategy probes every URL through the proxy with its own proxy auth
//! mode. URL probes of one strategy run in parallel tokio tasks; the strategy
//! completes only after every one of them has written its result.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::mpsc::UnboundedSender;

use super::client::{ProbeClient, ProbeRequest, ProxyAuth};
use super::credential::{CredentialProcess, CredentialSession};
use super::types::{AuthType, HealthCheckError, ProbeResult, ProxyEndpoint};
use crate::core::debug_logger::debug_logger;

/// Unauthenticated passthrough
#[derive(Debug, Clone)]
pub struct NoAuthStrategy {
    pub proxy: ProxyEndpoint,
    pub timeout: Duration,
}

/// NTLM with the proxy credentials applied on every probe
#[derive(Clone)]
pub struct NtlmStrategy {
    pub proxy: ProxyEndpoint,
    pub timeout: Duration,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for NtlmStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NtlmStrategy")
            .field("proxy", &self.proxy)
            .field("timeout", &self.timeout)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// GSS-Negotiate backed by a Kerberos ticket acquired for this run
#[derive(Clone)]
pub struct KerberosStrategy {
    /// Requests name the ingress host; the connection goes to the proxy address
    pub proxy: ProxyEndpoint,
    pub timeout: Duration,
    pub principal: String,
    pub password: String,
    pub credentials: Arc<dyn CredentialProcess>,
}

impl KerberosStrategy {
    /// `ingress_address` forms the Negotiate exchange; `proxy_address` is
    /// where the connection is made. They are equal outside cluster checks.
    pub fn new(
        ingress_address: impl Into<String>,
        proxy_address: impl Into<String>,
        port: u16,
        timeout: Duration,
        principal: impl Into<String>,
        password: impl Into<String>,
        credentials: Arc<dyn CredentialProcess>,
    ) -> Self {
        Self {
            proxy: ProxyEndpoint::pinned(ingress_address, proxy_address, port),
            timeout,
            principal: principal.into(),
            password: password.into(),
            credentials,
        }
    }
}

impl fmt::Debug for KerberosStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KerberosStrategy")
            .field("proxy", &self.proxy)
            .field("timeout", &self.timeout)
            .field("principal", &self.principal)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// The closed set of strategies a health check can run
#[derive(Debug, Clone)]
pub enum AuthStrategy {
    NoAuth(NoAuthStrategy),
    Ntlm(NtlmStrategy),
    Kerberos(KerberosStrategy),
}

impl AuthStrategy {
    pub fn no_auth(proxy: ProxyEndpoint, timeout: Duration) -> Self {
        AuthStrategy::NoAuth(NoAuthStrategy { proxy, timeout })
    }

    pub fn ntlm(
        proxy: ProxyEndpoint,
        timeout: Duration,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        AuthStrategy::Ntlm(NtlmStrategy {
            proxy,
            timeout,
            username: username.into(),
            password: password.into(),
        })
    }

    pub fn auth_type(&self) -> AuthType {
        match self {
            AuthStrategy::NoAuth(_) => AuthType::No,
            AuthStrategy::Ntlm(_) => AuthType::Ntlm,
            AuthStrategy::Kerberos(_) => AuthType::Kerberos,
        }
    }

    fn proxy(&self) -> &ProxyEndpoint {
        match self {
            AuthStrategy::NoAuth(s) => &s.proxy,
            AuthStrategy::Ntlm(s) => &s.proxy,
            AuthStrategy::Kerberos(s) => &s.proxy,
        }
    }

    fn timeout(&self) -> Duration {
        match self {
            AuthStrategy::NoAuth(s) => s.timeout,
            AuthStrategy::Ntlm(s) => s.timeout,
            AuthStrategy::Kerberos(s) => s.timeout,
        }
    }

    fn proxy_auth(&self) -> ProxyAuth {
        match self {
            AuthStrategy::NoAuth(_) => ProxyAuth::None,
            AuthStrategy::Ntlm(s) => ProxyAuth::Ntlm {
                username: s.username.clone(),
                password: s.password.clone(),
            },
            AuthStrategy::Kerberos(_) => ProxyAuth::Negotiate,
        }
    }

    /// The transport request this strategy issues for `url`
    pub fn probe_request(&self, url: &str) -> ProbeRequest {
        ProbeRequest {
            url: url.to_string(),
            proxy: self.proxy().clone(),
            auth: self.proxy_auth(),
            timeout: self.timeout(),
        }
    }

    /// Acquire whatever this strategy needs before probing can start.
    ///
    /// Only Kerberos has such a step; its failure means no probe of this
    /// strategy may run.
    pub async fn prepare(self) -> Result<PreparedStrategy, HealthCheckError> {
        let session = match &self {
            AuthStrategy::Kerberos(kerberos) => {
                let mut session =
                    CredentialSession::new(Arc::clone(&kerberos.credentials), &kerberos.principal);
                session.acquire(&kerberos.password).await?;
                Some(session)
            }
            _ => None,
        };

        Ok(PreparedStrategy {
            strategy: self,
            session,
        })
    }

    /// Probe every URL and write one result per URL to `sink`.
    ///
    /// Resolves once all results are written and, for Kerberos, the ticket has
    /// been torn down. Errors only when Kerberos acquisition fails, in which
    /// case nothing is written.
    pub async fn check(
        self,
        urls: Arc<[String]>,
        client: Arc<dyn ProbeClient>,
        sink: UnboundedSender<ProbeResult>,
    ) -> Result<(), HealthCheckError> {
        self.prepare().await?.check(urls, client, sink).await;
        Ok(())
    }
}

/// A strategy whose prerequisites are in place, ready to probe
#[derive(Debug)]
pub struct PreparedStrategy {
    strategy: AuthStrategy,
    session: Option<CredentialSession>,
}

impl PreparedStrategy {
    pub fn auth_type(&self) -> AuthType {
        self.strategy.auth_type()
    }

    pub async fn check(
        mut self,
        urls: Arc<[String]>,
        client: Arc<dyn ProbeClient>,
        sink: UnboundedSender<ProbeResult>,
    ) {
        probe_all(&self.strategy, &urls, &client, &sink).await;

        if let Some(session) = self.session.as_mut() {
            // Reported by the session itself; never part of the verdict
            let _ = session.destroy().await;
        }
    }
}

async fn probe_all(
    strategy: &AuthStrategy,
    urls: &[String],
    client: &Arc<dyn ProbeClient>,
    sink: &UnboundedSender<ProbeResult>,
) {
    let auth_type = strategy.auth_type();

    let handles: Vec<_> = urls
        .iter()
        .map(|url| {
            let request = strategy.probe_request(url);
            let client = Arc::clone(client);
            let sink = sink.clone();
            tokio::spawn(async move {
                let result = probe_one(client.as_ref(), auth_type, request).await;
                let _ = sink.send(result);
            })
        })
        .collect();

    for (url, joined) in urls.iter().zip(join_all(handles).await) {
        if let Err(e) = joined {
            // The task died before sending; keep the one-result-per-URL count
            debug_logger().error_sync(
                "AuthStrategy",
                "probe_task_failed",
                &format!("{} via {}: {}", url, auth_type, e),
            );
            let _ = sink.send(ProbeResult::not_completed(url.as_str(), auth_type));
        }
    }
}

async fn probe_one(client: &dyn ProbeClient, auth_type: AuthType, request: ProbeRequest) -> ProbeResult {
    let logger = debug_logger();
    let url = request.url.clone();
    logger.probe_start(auth_type.as_str(), &url, request.timeout.as_millis() as u64);

    let started = Instant::now();
    let outcome = client.probe(request).await;
    let result = ProbeResult::from_outcome(url.as_str(), auth_type, &outcome);

    logger.probe_end(
        auth_type.as_str(),
        &url,
        outcome.as_ref().ok().map(|response| response.status_code),
        result.status,
        started.elapsed().as_millis() as u64,
    );
    if let Err(e) = &outcome {
        logger.debug_sync("AuthStrategy", "probe_error", &format!("{}: {}", url, e));
    }
    result
}
