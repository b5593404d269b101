use clap::Parser;
use proxy_auth_healthcheck::cli::Cli;

#[test]
fn test_repeated_and_comma_separated_values() {
    let cli = Cli::try_parse_from([
        "proxy-auth-healthcheck",
        "-u",
        "http://a",
        "--url",
        "http://b",
        "--auth-type",
        "ntlm,kerberos",
        "--auth-type",
        "no",
        "--proxy-addr",
        "proxy.corp",
        "--strict-url",
        "-v",
    ])
    .unwrap();

    assert_eq!(cli.urls, vec!["http://a", "http://b"]);
    assert_eq!(cli.auth_types, vec!["ntlm", "kerberos", "no"]);
    assert_eq!(cli.proxy_addr.as_deref(), Some("proxy.corp"));
    assert!(cli.strict_url);
    assert!(!cli.strict_auth);
    assert!(cli.verbose);
    assert_eq!(cli.proxy_port, None);
}

#[test]
fn test_url_and_auth_type_are_required() {
    assert!(Cli::try_parse_from(["proxy-auth-healthcheck", "--auth-type", "no"]).is_err());
    assert!(Cli::try_parse_from(["proxy-auth-healthcheck", "-u", "http://a"]).is_err());
}

#[test]
fn test_port_must_be_numeric() {
    let parsed = Cli::try_parse_from([
        "proxy-auth-healthcheck",
        "-u",
        "http://a",
        "--auth-type",
        "no",
        "--proxy-port",
        "squid",
    ]);
    assert!(parsed.is_err());
}
