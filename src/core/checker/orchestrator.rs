//! Health-check orchestration
//!
//! Fan-out/fan-in over the selected strategies:
//! 1. Prepare every strategy (Kerberos acquires its ticket); any failure
//!    aborts the run before a single probe is issued
//! 2. Spawn one task per strategy, all writing into one unbounded channel
//! 3. Join every strategy task, then drain the channel
//! 4. Order the results and apply the decision policy
//!
//! The orchestrator drops its own sender before joining, so the channel can
//! only report closed once every producer is gone.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

use super::client::ProbeClient;
use super::policy::{successful_auth_types, successful_urls, DecisionPolicy};
use super::strategy::AuthStrategy;
use super::types::{AuthType, HealthCheckError, ProbeResult};
use crate::core::debug_logger::debug_logger;

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// One result per (strategy, URL), ordered by requested URL then strategy
    pub results: Vec<ProbeResult>,
    /// URLs that succeeded under at least one strategy
    pub reachable_urls: Vec<String>,
    /// Strategies that succeeded on at least one URL
    pub working_auth_types: Vec<AuthType>,
    pub healthy: bool,
}

impl HealthReport {
    pub fn from_results(
        mut results: Vec<ProbeResult>,
        urls: &[String],
        auth_types: &[AuthType],
        policy: &DecisionPolicy,
    ) -> Self {
        let rank_url = |url: &str| urls.iter().position(|u| u == url).unwrap_or(usize::MAX);
        let rank_auth = |auth: AuthType| {
            auth_types
                .iter()
                .position(|a| *a == auth)
                .unwrap_or(usize::MAX)
        };
        results.sort_by_key(|r| (rank_url(r.url.as_str()), rank_auth(r.auth_type)));

        let healthy = policy.decide(&results, urls, auth_types);
        Self {
            reachable_urls: successful_urls(&results),
            working_auth_types: successful_auth_types(&results),
            results,
            healthy,
        }
    }
}

/// One health-check run over a fixed set of strategies and URLs
pub struct HealthCheck {
    urls: Vec<String>,
    strategies: Vec<AuthStrategy>,
    policy: DecisionPolicy,
    client: Arc<dyn ProbeClient>,
}

impl HealthCheck {
    pub fn new(
        urls: Vec<String>,
        strategies: Vec<AuthStrategy>,
        policy: DecisionPolicy,
        client: Arc<dyn ProbeClient>,
    ) -> Self {
        Self {
            urls,
            strategies,
            policy,
            client,
        }
    }

    pub fn auth_types(&self) -> Vec<AuthType> {
        self.strategies.iter().map(AuthStrategy::auth_type).collect()
    }

    /// Number of results a complete run produces
    pub fn expected_results(&self) -> usize {
        self.strategies.len() * self.urls.len()
    }

    /// Run every strategy against every URL and decide.
    ///
    /// # Returns
    /// * `Ok(HealthReport)` - all probes ran; `healthy` holds the verdict
    /// * `Err(HealthCheckError)` - Kerberos credentials could not be acquired
    ///   or a strategy task died; no verdict exists
    pub async fn run(self) -> Result<HealthReport, HealthCheckError> {
        let logger = debug_logger();
        let auth_types = self.auth_types();
        let expected = self.expected_results();

        let mut prepared = Vec::with_capacity(self.strategies.len());
        for strategy in self.strategies {
            // Sessions already acquired are torn down when `prepared` drops
            prepared.push(strategy.prepare().await?);
        }

        let urls: Arc<[String]> = self.urls.clone().into();
        let (sink, mut results_rx) = mpsc::unbounded_channel();

        let tasks: Vec<_> = prepared
            .into_iter()
            .map(|strategy| {
                let auth_type = strategy.auth_type();
                let task = tokio::spawn(strategy.check(
                    Arc::clone(&urls),
                    Arc::clone(&self.client),
                    sink.clone(),
                ));
                (auth_type, task)
            })
            .collect();
        drop(sink);

        let mut aborted = None;
        for (auth_type, task) in tasks {
            if let Err(e) = task.await {
                logger.error_sync(
                    "HealthCheck",
                    "strategy_task_failed",
                    &format!("{} strategy: {}", auth_type, e),
                );
                aborted.get_or_insert(HealthCheckError::StrategyAborted {
                    auth_type,
                    reason: e.to_string(),
                });
            }
        }
        if let Some(e) = aborted {
            return Err(e);
        }

        let mut results = Vec::with_capacity(expected);
        while let Some(result) = results_rx.recv().await {
            results.push(result);
        }
        if results.len() != expected {
            logger.error_sync(
                "HealthCheck",
                "result_count_mismatch",
                &format!("expected {} results, collected {}", expected, results.len()),
            );
        }

        let report = HealthReport::from_results(results, &self.urls, &auth_types, &self.policy);
        logger.run_summary(
            report.results.len(),
            report.reachable_urls.len(),
            report.working_auth_types.len(),
            report.healthy,
        );
        Ok(report)
    }
}
