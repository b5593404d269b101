//! Proxy Authentication Health Checks
//!
//! This module provides the concurrent health-check engine:
//! - Three proxy auth strategies (no-auth, NTLM, Kerberos/Negotiate) behind one enum
//! - Parallel probes per strategy and per URL, collected over one channel
//! - Kerberos ticket lifecycle wrapped around the Kerberos strategy
//! - Strict-URL / strict-auth decision policy

pub mod client;
pub mod credential;
pub mod orchestrator;
pub mod policy;
pub mod strategy;
pub mod types;

// Re-export public API
pub use client::{CurlProbeClient, ProbeClient, ProbeRequest, ProbeResponse, ProxyAuth};
pub use credential::{
    CredentialError, CredentialProcess, CredentialSession, KerberosTicketCommands, SessionState,
};
pub use orchestrator::{HealthCheck, HealthReport};
pub use policy::{successful_auth_types, successful_urls, DecisionPolicy};
pub use strategy::{AuthStrategy, KerberosStrategy, NoAuthStrategy, NtlmStrategy, PreparedStrategy};
pub use types::{AuthType, HealthCheckError, ProbeResult, ProxyEndpoint, UnknownAuthType};
