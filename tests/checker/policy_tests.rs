use proxy_auth_healthcheck::core::checker::{AuthType, DecisionPolicy, ProbeResult};

use crate::common::urls;

fn result(url: &str, auth_type: AuthType, status: bool) -> ProbeResult {
    ProbeResult {
        url: url.to_string(),
        auth_type,
        status,
        response_time: if status { 0.2 } else { 0.0 },
    }
}

const STRATEGIES: [AuthType; 2] = [AuthType::No, AuthType::Ntlm];

fn all_flag_combinations() -> Vec<DecisionPolicy> {
    vec![
        DecisionPolicy::new(false, false),
        DecisionPolicy::new(true, false),
        DecisionPolicy::new(false, true),
        DecisionPolicy::new(true, true),
    ]
}

#[test]
fn test_one_reachable_url_passes_by_default() {
    let results = vec![
        result("A", AuthType::No, true),
        result("B", AuthType::No, false),
        result("A", AuthType::Ntlm, false),
        result("B", AuthType::Ntlm, false),
    ];
    let requested = urls(&["A", "B"]);

    assert!(DecisionPolicy::default().decide(&results, &requested, &STRATEGIES));
}

#[test]
fn test_strict_url_requires_every_url() {
    let results = vec![
        result("A", AuthType::No, true),
        result("B", AuthType::No, false),
        result("A", AuthType::Ntlm, false),
        result("B", AuthType::Ntlm, false),
    ];
    let requested = urls(&["A", "B"]);

    assert!(!DecisionPolicy::new(true, false).decide(&results, &requested, &STRATEGIES));
}

#[test]
fn test_strict_auth_requires_every_strategy() {
    let results = vec![
        result("A", AuthType::No, true),
        result("B", AuthType::No, false),
        result("A", AuthType::Ntlm, false),
        result("B", AuthType::Ntlm, false),
    ];
    let requested = urls(&["A", "B"]);

    assert!(!DecisionPolicy::new(false, true).decide(&results, &requested, &STRATEGIES));
}

#[test]
fn test_everything_succeeding_passes_strictest_policy() {
    let results = vec![
        result("A", AuthType::No, true),
        result("B", AuthType::No, true),
        result("A", AuthType::Ntlm, true),
        result("B", AuthType::Ntlm, true),
    ];
    let requested = urls(&["A", "B"]);

    for policy in all_flag_combinations() {
        assert!(policy.decide(&results, &requested, &STRATEGIES), "{:?}", policy);
    }
}

#[test]
fn test_no_success_fails_every_policy() {
    let results = vec![
        result("A", AuthType::No, false),
        result("B", AuthType::No, false),
        result("A", AuthType::Ntlm, false),
        result("B", AuthType::Ntlm, false),
    ];
    let requested = urls(&["A", "B"]);

    for policy in all_flag_combinations() {
        assert!(!policy.decide(&results, &requested, &STRATEGIES), "{:?}", policy);
    }
    for policy in all_flag_combinations() {
        assert!(!policy.decide(&[], &requested, &STRATEGIES), "{:?}", policy);
    }
}

#[test]
fn test_strict_url_satisfied_by_different_strategies() {
    // A only works without auth, B only with NTLM: every URL is still reachable
    let results = vec![
        result("A", AuthType::No, true),
        result("B", AuthType::No, false),
        result("A", AuthType::Ntlm, false),
        result("B", AuthType::Ntlm, true),
    ];
    let requested = urls(&["A", "B"]);

    assert!(DecisionPolicy::new(true, true).decide(&results, &requested, &STRATEGIES));
}
