//! Run configuration
//!
//! Command-line flags and an optional TOML file are merged and validated into
//! a [`RunConfig`], which is the only configuration the check engine sees.

pub mod defaults;
pub mod loader;

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::Cli;
use crate::core::checker::{
    AuthStrategy, AuthType, CredentialProcess, DecisionPolicy, KerberosStrategy, ProxyEndpoint,
};
use defaults::{ALL_AUTH_TYPES, DEFAULT_PROXY_PORT, DEFAULT_TIMEOUT_SECS};
pub use loader::FileConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("the required flag `--url' was not specified")]
    MissingUrl,
    #[error("the required flag `--auth-type' was not specified")]
    MissingAuthType,
    #[error("authentication type {0} is not allowed")]
    UnknownAuthType(String),
    #[error("the required flag `--proxy-addr' was not specified")]
    MissingProxyAddress,
    #[error("the required flags `--proxy-username' and `--proxy-password' were not specified")]
    MissingCredentials,
    #[error("the required flags `--ingress-proxy-addr' were not specified")]
    MissingIngressAddress,
    #[error("cluster check requires `--proxy-addr' to be an IP address, got {0}")]
    ClusterAddressNotIp(String),
    #[error("timeout must be at least one second")]
    InvalidTimeout,
    #[error("config read error {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse error {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Validated, immutable settings for one health-check run
#[derive(Clone, PartialEq)]
pub struct RunConfig {
    /// Distinct URLs in the order given
    pub urls: Vec<String>,
    /// Distinct strategies in the order given, `all` already expanded
    pub auth_types: Vec<AuthType>,
    pub proxy_address: String,
    pub proxy_port: u16,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
    /// Host used for the Kerberos exchange; equals `proxy_address` unless cluster-checking
    pub ingress_address: String,
    pub policy: DecisionPolicy,
    pub verbose: bool,
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("urls", &self.urls)
            .field("auth_types", &self.auth_types)
            .field("proxy_address", &self.proxy_address)
            .field("proxy_port", &self.proxy_port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("ingress_address", &self.ingress_address)
            .field("policy", &self.policy)
            .field("verbose", &self.verbose)
            .finish()
    }
}

impl RunConfig {
    /// Merge command-line flags over file values and validate.
    pub fn resolve(cli: &Cli, file: &FileConfig) -> Result<Self, ConfigError> {
        let urls = dedup(cli.urls.iter().map(|u| u.trim().to_string()).filter(|u| !u.is_empty()));
        if urls.is_empty() {
            return Err(ConfigError::MissingUrl);
        }

        let auth_types = parse_auth_types(&cli.auth_types)?;

        let proxy_address = cli
            .proxy_addr
            .clone()
            .or_else(|| file.proxy_addr.clone())
            .filter(|addr| !addr.trim().is_empty())
            .ok_or(ConfigError::MissingProxyAddress)?;
        let proxy_port = cli.proxy_port.or(file.proxy_port).unwrap_or(DEFAULT_PROXY_PORT);

        let username = cli
            .proxy_username
            .clone()
            .or_else(|| file.proxy_username.clone())
            .unwrap_or_default();
        let password = cli
            .proxy_password
            .clone()
            .or_else(|| file.proxy_password.clone())
            .unwrap_or_default();
        let needs_credentials = auth_types.iter().any(AuthType::requires_credentials);
        if needs_credentials && (username.is_empty() || password.is_empty()) {
            return Err(ConfigError::MissingCredentials);
        }

        let timeout_secs = cli.timeout.or(file.timeout).unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        let cluster_check = cli.cluster_check || file.cluster_check.unwrap_or(false);
        let ingress_address = if cluster_check {
            // The connection is pinned to this address, which libcurl only takes numerically
            if proxy_address.trim().parse::<IpAddr>().is_err() {
                return Err(ConfigError::ClusterAddressNotIp(proxy_address));
            }
            cli.ingress_proxy_addr
                .clone()
                .or_else(|| file.ingress_proxy_addr.clone())
                .filter(|addr| !addr.trim().is_empty())
                .ok_or(ConfigError::MissingIngressAddress)?
        } else {
            proxy_address.clone()
        };

        let policy = DecisionPolicy::new(
            cli.strict_url || file.strict_url.unwrap_or(false),
            cli.strict_auth || file.strict_auth.unwrap_or(false),
        );

        Ok(Self {
            urls,
            auth_types,
            proxy_address,
            proxy_port,
            username,
            password,
            timeout: Duration::from_secs(timeout_secs),
            ingress_address,
            policy,
            verbose: cli.verbose,
        })
    }

    /// Build one strategy per requested auth type, in request order
    pub fn strategies(&self, credentials: Arc<dyn CredentialProcess>) -> Vec<AuthStrategy> {
        self.auth_types
            .iter()
            .map(|auth_type| match auth_type {
                AuthType::No => AuthStrategy::no_auth(self.proxy_endpoint(), self.timeout),
                AuthType::Ntlm => AuthStrategy::ntlm(
                    self.proxy_endpoint(),
                    self.timeout,
                    &self.username,
                    &self.password,
                ),
                AuthType::Kerberos => AuthStrategy::Kerberos(KerberosStrategy::new(
                    &self.ingress_address,
                    &self.proxy_address,
                    self.proxy_port,
                    self.timeout,
                    &self.username,
                    &self.password,
                    Arc::clone(&credentials),
                )),
            })
            .collect()
    }

    fn proxy_endpoint(&self) -> ProxyEndpoint {
        ProxyEndpoint::new(&self.proxy_address, self.proxy_port)
    }
}

/// Expand `all`, reject unknown names, drop repeats
fn parse_auth_types(raw: &[String]) -> Result<Vec<AuthType>, ConfigError> {
    let names: Vec<&str> = raw
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .collect();
    if names.is_empty() {
        return Err(ConfigError::MissingAuthType);
    }

    if names.contains(&ALL_AUTH_TYPES) {
        return Ok(AuthType::ALL.to_vec());
    }

    let parsed = names
        .into_iter()
        .map(|name| {
            name.parse::<AuthType>()
                .map_err(|e| ConfigError::UnknownAuthType(e.0))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(dedup(parsed))
}

fn dedup<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut unique = Vec::new();
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}
