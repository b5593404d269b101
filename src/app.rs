//! Process front end
//!
//! Turns the command line into an [`Outcome`]: the line to print and whether
//! the process succeeded. `main` only prints and exits.

use std::ffi::OsString;
use std::sync::Arc;

use clap::Parser;

use crate::cli::Cli;
use crate::config::{FileConfig, RunConfig};
use crate::core::checker::{CredentialProcess, HealthCheck, HealthReport, ProbeClient};
use crate::core::debug_logger;

#[derive(Debug)]
pub enum Outcome {
    /// Started without arguments
    Help,
    /// Rejected by the argument parser, which reports it itself
    Usage(clap::Error),
    /// Invalid configuration or a fatal check error; no verdict exists
    Failed(String),
    /// `output` is `1`/`0`, or the result list as JSON when verbose
    Verdict { output: String, healthy: bool },
}

impl Outcome {
    pub fn success(&self) -> bool {
        matches!(
            self,
            Outcome::Help | Outcome::Verdict { healthy: true, .. }
        )
    }
}

/// The stdout line for a finished run
pub fn render(report: &HealthReport, verbose: bool) -> Result<String, serde_json::Error> {
    if verbose {
        serde_json::to_string(&report.results)
    } else {
        Ok(if report.healthy { "1" } else { "0" }.to_string())
    }
}

/// Parse `args` (program name first), run the check and describe the result.
pub async fn run<I, T>(
    args: I,
    client: Arc<dyn ProbeClient>,
    credentials: Arc<dyn CredentialProcess>,
) -> Outcome
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if args.len() <= 1 {
        return Outcome::Help;
    }

    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => return Outcome::Usage(e),
    };

    match check(&cli, client, credentials).await {
        Ok(outcome) => outcome,
        Err(e) => {
            debug_logger().error_sync("main", "run_failed", &e.to_string());
            Outcome::Failed(e.to_string())
        }
    }
}

async fn check(
    cli: &Cli,
    client: Arc<dyn ProbeClient>,
    credentials: Arc<dyn CredentialProcess>,
) -> Result<Outcome, Box<dyn std::error::Error>> {
    let file = FileConfig::load(cli.config.as_deref())?;
    let config = RunConfig::resolve(cli, &file)?;
    debug_logger().debug_sync("main", "config_resolved", &format!("{:?}", config));

    let check = HealthCheck::new(
        config.urls.clone(),
        config.strategies(credentials),
        config.policy,
        client,
    );
    let report = check.run().await?;

    Ok(Outcome::Verdict {
        output: render(&report, config.verbose)?,
        healthy: report.healthy,
    })
}
