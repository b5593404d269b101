//! Probe Client Implementations
//!
//! HTTP client abstraction specialized for proxied probe requests: a single
//! GET through an HTTP forward proxy with a per-strategy proxy auth mode,
//! redirects followed, response body discarded.

use std::fmt;
use std::time::Duration;

use curl::easy::{Auth, Easy, List, ProxyType};

use super::types::ProxyEndpoint;

/// Proxy authentication mode applied to one probe
#[derive(Clone, PartialEq, Eq)]
pub enum ProxyAuth {
    /// Plain passthrough
    None,
    /// NTLM with explicit credentials
    Ntlm { username: String, password: String },
    /// GSS-Negotiate; identity comes from the ticket cache, explicit credentials stay empty
    Negotiate,
}

impl fmt::Debug for ProxyAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyAuth::None => f.write_str("None"),
            ProxyAuth::Ntlm { username, .. } => f
                .debug_struct("Ntlm")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            ProxyAuth::Negotiate => f.write_str("Negotiate"),
        }
    }
}

/// Everything the transport needs for one probe
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRequest {
    pub url: String,
    pub proxy: ProxyEndpoint,
    pub auth: ProxyAuth,
    /// Hard upper bound on the whole transfer
    pub timeout: Duration,
}

/// Completed probe: final status code (after redirects) and total time
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResponse {
    pub status_code: u16,
    pub elapsed: Duration,
}

/// HTTP probe capability
///
/// # Implementation Requirements
/// * Must proxy through `request.proxy` as an HTTP proxy
/// * Must negotiate the proxy auth scheme given in `request.auth`
/// * Must follow redirects and discard the response body
/// * Must enforce `request.timeout` itself
///
/// # Returns
/// * `Ok(ProbeResponse)` - transfer completed, with any status code
/// * `Err(String)` - the probe did not complete (transport error or timeout)
#[async_trait::async_trait]
pub trait ProbeClient: Send + Sync {
    async fn probe(&self, request: ProbeRequest) -> Result<ProbeResponse, String>;
}

/// Production probe client backed by libcurl
///
/// Each probe gets its own easy handle on tokio's blocking pool, so slow
/// proxies only occupy their own worker thread.
#[derive(Debug, Default, Clone)]
pub struct CurlProbeClient;

impl CurlProbeClient {
    pub fn new() -> Self {
        Self
    }

    fn perform(request: &ProbeRequest) -> Result<ProbeResponse, curl::Error> {
        let mut easy = Easy::new();
        easy.verbose(false)?;
        easy.url(&request.url)?;
        easy.follow_location(true)?;
        easy.timeout(request.timeout)?;

        easy.proxy_type(ProxyType::Http)?;
        easy.proxy(&request.proxy.address)?;
        easy.proxy_port(request.proxy.port)?;
        if let Some(ip) = &request.proxy.connect_address {
            // Keep the FQDN for the auth exchange, connect to the node
            let mut resolve = List::new();
            resolve.append(&format!(
                "{}:{}:{}",
                request.proxy.address, request.proxy.port, ip
            ))?;
            easy.resolve(resolve)?;
        }

        match &request.auth {
            ProxyAuth::None => {}
            ProxyAuth::Ntlm { username, password } => {
                let mut auth = Auth::new();
                auth.ntlm(true);
                easy.proxy_auth(&auth)?;
                easy.proxy_username(username)?;
                easy.proxy_password(password)?;
            }
            ProxyAuth::Negotiate => {
                let mut auth = Auth::new();
                auth.gssnegotiate(true);
                easy.proxy_auth(&auth)?;
                easy.proxy_username("")?;
                easy.proxy_password("")?;
            }
        }

        easy.write_function(|data| Ok(data.len()))?;
        easy.perform()?;

        let status_code = u16::try_from(easy.response_code()?).unwrap_or(0);
        let elapsed = easy.total_time()?;
        Ok(ProbeResponse {
            status_code,
            elapsed,
        })
    }
}

#[async_trait::async_trait]
impl ProbeClient for CurlProbeClient {
    async fn probe(&self, request: ProbeRequest) -> Result<ProbeResponse, String> {
        tokio::task::spawn_blocking(move || Self::perform(&request))
            .await
            .map_err(|e| format!("Probe worker failed: {}", e))?
            .map_err(|e| format!("Probe request failed: {}", e))
    }
}
