//! Pass/fail decision over collected probe results

use std::collections::HashSet;

use super::types::{AuthType, ProbeResult};

/// Strictness flags for the verdict
///
/// * default - healthy if any URL succeeded under any strategy
/// * `strict_url` - every requested URL must succeed under at least one strategy
/// * `strict_auth` - every requested strategy must succeed on at least one URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecisionPolicy {
    pub strict_url: bool,
    pub strict_auth: bool,
}

impl DecisionPolicy {
    pub fn new(strict_url: bool, strict_auth: bool) -> Self {
        Self {
            strict_url,
            strict_auth,
        }
    }

    /// Apply the policy. Duplicate entries in `urls` / `auth_types` count once.
    pub fn decide(&self, results: &[ProbeResult], urls: &[String], auth_types: &[AuthType]) -> bool {
        let reachable: HashSet<String> = successful_urls(results).into_iter().collect();
        if reachable.is_empty() {
            return false;
        }

        if self.strict_auth {
            let working: HashSet<AuthType> = successful_auth_types(results).into_iter().collect();
            if !auth_types.iter().all(|auth_type| working.contains(auth_type)) {
                return false;
            }
        }

        !self.strict_url || urls.iter().all(|url| reachable.contains(url))
    }
}

/// Distinct URLs with at least one successful probe, in first-seen order
pub fn successful_urls(results: &[ProbeResult]) -> Vec<String> {
    let mut seen = HashSet::new();
    results
        .iter()
        .filter(|r| r.status && seen.insert(r.url.as_str()))
        .map(|r| r.url.clone())
        .collect()
}

/// Distinct strategies with at least one successful probe, in first-seen order
pub fn successful_auth_types(results: &[ProbeResult]) -> Vec<AuthType> {
    let mut seen = HashSet::new();
    results
        .iter()
        .filter(|r| r.status && seen.insert(r.auth_type))
        .map(|r| r.auth_type)
        .collect()
}
