#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use callgate_gateway::config;
use callgate_gateway::policy::AclMode;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
host:
  listen: "127.0.0.1:8082"
  queue_capacty: 16 # typo should fail
acl:
  inline: '{}'
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "INTERNAL");
    assert!(err.to_string().contains("invalid yaml"));
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
acl:
  inline: '{"biz_admin": ["/service.BusinessLogic/*"]}'
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.host.listen, "127.0.0.1:8082");
    assert_eq!(cfg.host.queue_capacity, 1024);
    assert_eq!(cfg.acl.mode(), AclMode::Lenient);
    assert!(cfg.acl.load_raw().unwrap().contains("biz_admin"));
}

#[test]
fn reject_wrong_version() {
    let bad = r#"
version: 2
acl:
  inline: '{}'
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("version"));
}

#[test]
fn reject_both_acl_sources() {
    let bad = r#"
version: 1
acl:
  inline: '{}'
  file: "acl.json"
"#;
    assert!(config::load_from_str(bad).is_err());

    let none = r#"
version: 1
acl:
  strict: true
"#;
    assert!(config::load_from_str(none).is_err());
}

#[test]
fn reject_out_of_range_host_values() {
    for host in [
        "listen: \"not-an-addr\"",
        "queue_capacity: 0",
        "max_stat_interval_secs: 0",
    ] {
        let doc = format!("version: 1\nhost:\n  {host}\nacl:\n  inline: '{{}}'\n");
        assert!(config::load_from_str(&doc).is_err(), "{host}");
    }
}

#[test]
fn strict_flag_selects_strict_mode() {
    let ok = r#"
version: 1
acl:
  strict: true
  file: "acl.json"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.acl.mode(), AclMode::Strict);
    assert!(cfg.acl.load_raw().is_err());
}
