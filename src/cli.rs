use clap::{CommandFactory, Parser};
use std::path::PathBuf;

use crate::config::defaults::PASSWORD_ENV;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "proxy-auth-healthcheck")]
#[command(version = concat!("Ver:", env!("CARGO_PKG_VERSION")))]
#[command(about = "Forward proxy health check with no-auth, NTLM and Kerberos authentication")]
pub struct Cli {
    /// URL to check for availability (repeatable)
    #[arg(short = 'u', long = "url", required = true)]
    pub urls: Vec<String>,

    /// Proxy authentication mechanism: ntlm, kerberos, no, all (repeatable or comma separated)
    #[arg(long = "auth-type", required = true, value_delimiter = ',')]
    pub auth_types: Vec<String>,

    /// Proxy server address
    #[arg(long = "proxy-addr")]
    pub proxy_addr: Option<String>,

    /// Proxy server port [default: 3128]
    #[arg(long = "proxy-port")]
    pub proxy_port: Option<u16>,

    /// Proxy user login
    #[arg(long = "proxy-username")]
    pub proxy_username: Option<String>,

    /// Proxy user password
    #[arg(long = "proxy-password", env = PASSWORD_ENV, hide_env_values = true)]
    pub proxy_password: Option<String>,

    /// Connection timeout per probe in seconds [default: 2]
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    /// Healthy only if every URL is available
    #[arg(long = "strict-url")]
    pub strict_url: bool,

    /// Healthy only if every auth method succeeds on at least one URL
    #[arg(long = "strict-auth")]
    pub strict_auth: bool,

    /// Check through a proxy cluster node instead of a standalone proxy server
    #[arg(long = "cluster-check")]
    pub cluster_check: bool,

    /// Ingress proxy FQDN used for the Kerberos exchange in cluster checks;
    /// the connection still goes to --proxy-addr
    #[arg(long = "ingress-proxy-addr")]
    pub ingress_proxy_addr: Option<String>,

    /// Output verbose health check information
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// TOML file with default proxy settings
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Help goes to stderr; stdout only carries the verdict
    pub fn print_help() {
        eprintln!("{}", Self::command().render_help());
    }
}
