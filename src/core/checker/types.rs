//! Shared value types for proxy authentication checks

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::client::ProbeResponse;
use super::credential::CredentialError;

/// Proxy authentication mechanism under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    /// Plain passthrough, no proxy credentials
    No,
    /// NTLM with explicit username/password
    Ntlm,
    /// GSS-Negotiate using a Kerberos ticket
    Kerberos,
}

impl AuthType {
    /// Every supported strategy, in the order `all` expands to
    pub const ALL: [AuthType; 3] = [AuthType::Ntlm, AuthType::Kerberos, AuthType::No];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::No => "no",
            AuthType::Ntlm => "ntlm",
            AuthType::Kerberos => "kerberos",
        }
    }

    /// Whether this strategy needs proxy username/password
    pub fn requires_credentials(&self) -> bool {
        !matches!(self, AuthType::No)
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("authentication type {0} is not allowed")]
pub struct UnknownAuthType(pub String);

impl FromStr for AuthType {
    type Err = UnknownAuthType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no" => Ok(AuthType::No),
            "ntlm" => Ok(AuthType::Ntlm),
            "kerberos" => Ok(AuthType::Kerberos),
            other => Err(UnknownAuthType(other.to_string())),
        }
    }
}

/// Outcome of one (URL, strategy) probe
///
/// Serializes with the field names of the verbose report:
/// `{"URL": .., "AuthType": .., "Status": 0|1, "ResponseTime": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "AuthType")]
    pub auth_type: AuthType,
    /// True only when the probe completed with status code 200
    #[serde(rename = "Status", serialize_with = "serialize_status")]
    pub status: bool,
    /// Total transfer time in seconds; 0 when the probe never completed
    #[serde(rename = "ResponseTime")]
    pub response_time: f64,
}

fn serialize_status<S: Serializer>(status: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*status))
}

impl ProbeResult {
    /// Result for a probe that never completed (transport error, timeout).
    ///
    /// The zero response time doubles as a "no timing available" marker and is
    /// indistinguishable from a measured zero latency.
    pub fn not_completed(url: impl Into<String>, auth_type: AuthType) -> Self {
        Self {
            url: url.into(),
            auth_type,
            status: false,
            response_time: 0.0,
        }
    }

    /// Result for a probe that completed with the given status code
    pub fn completed(
        url: impl Into<String>,
        auth_type: AuthType,
        response: &ProbeResponse,
    ) -> Self {
        Self {
            url: url.into(),
            auth_type,
            status: response.status_code == 200,
            response_time: response.elapsed.as_secs_f64(),
        }
    }

    /// Map a probe capability outcome onto a result
    pub fn from_outcome(
        url: impl Into<String>,
        auth_type: AuthType,
        outcome: &Result<ProbeResponse, String>,
    ) -> Self {
        match outcome {
            Ok(response) => Self::completed(url, auth_type, response),
            Err(_) => Self::not_completed(url, auth_type),
        }
    }
}

/// Network location of the proxy under test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    /// Host name placed in the request (and used for the Negotiate SPN)
    pub address: String,
    pub port: u16,
    /// Address the connection is pinned to when it differs from `address`
    pub connect_address: Option<String>,
}

impl ProxyEndpoint {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            connect_address: None,
        }
    }

    /// Address `host` in requests but connect to `connect_address`.
    /// Identical addresses collapse to a plain endpoint.
    pub fn pinned(host: impl Into<String>, connect_address: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        let connect_address = connect_address.into();
        let connect_address = (connect_address != host).then_some(connect_address);
        Self {
            address: host,
            port,
            connect_address,
        }
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.connect_address {
            Some(ip) => write!(f, "{}:{} (via {})", self.address, self.port, ip),
            None => write!(f, "{}:{}", self.address, self.port),
        }
    }
}

/// Failures that stop a health-check run before a verdict exists
#[derive(Debug, thiserror::Error)]
pub enum HealthCheckError {
    #[error("kerberos credential acquisition failed: {0}")]
    CredentialAcquisition(#[from] CredentialError),
    #[error("{auth_type} strategy aborted: {reason}")]
    StrategyAborted { auth_type: AuthType, reason: String },
}
