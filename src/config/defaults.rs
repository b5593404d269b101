// Defaults and well-known names shared by the CLI, config loader and core

pub const DEFAULT_PROXY_PORT: u16 = 3128;
pub const DEFAULT_TIMEOUT_SECS: u64 = 2;

/// Literal that expands to every strategy
pub const ALL_AUTH_TYPES: &str = "all";

pub const KINIT_COMMAND: &str = "kinit";
pub const KDESTROY_COMMAND: &str = "kdestroy";

pub const PASSWORD_ENV: &str = "PROXY_HEALTHCHECK_PASSWORD";
pub const DEBUG_ENV: &str = "PROXY_HEALTHCHECK_DEBUG";
pub const DEBUG_LOG_ENV: &str = "PROXY_HEALTHCHECK_DEBUG_LOG";

pub const CONFIG_DIR_NAME: &str = "proxy-auth-healthcheck";
pub const CONFIG_FILE_NAME: &str = "config.toml";
