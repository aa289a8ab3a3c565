use creg_kernel::config::{AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, ConfigError};
use creg_kernel::prelude::*;
use std::net::IpAddr;
use std::path::Path;
use strum::IntoEnumIterator;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    env: Env,
}

impl Fixture {
    fn new() -> Self {
        let env = Env::default()
            .with(AWS_ACCESS_KEY_ID, "AKIAEXAMPLE")
            .with(AWS_SECRET_ACCESS_KEY, "aws-secret")
            .with("OPS_TOKEN", "ops-secret")
            .with("CI_TOKEN", "ci-secret");
        Self { dir: tempfile::tempdir().unwrap(), env }
    }

    fn write(&self, yaml: &str) -> std::path::PathBuf {
        let path = self.dir.path().join("config.yaml");
        std::fs::write(&path, yaml).unwrap();
        path
    }

    fn load_from(&self, path: &Path) -> Result<RegistryConfig, ConfigError> {
        RegistryConfig::loader().env(self.env.clone()).file(path).load()
    }

    fn load(&self, yaml: &str) -> Result<RegistryConfig, ConfigError> {
        let path = self.write(yaml);
        self.load_from(&path)
    }
}

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

const API_CERT: &str = r"
certs:
  - key: api.example.com
    email: ops@example.com
    domains: [api.example.com]
    plugin: dns-route53
";

#[test]
fn loads_single_certificate() {
    let registry = Fixture::new().load(API_CERT).unwrap();

    assert_eq!(registry.certificates().len(), 1);
    let entry = registry.certificate("api.example.com").unwrap();
    assert_eq!(entry.email(), "ops@example.com");
    assert_eq!(entry.domains(), ["api.example.com"]);
    assert_eq!(entry.plugin(), "dns-route53");
    assert!(registry.tokens().is_empty());
    assert_eq!(registry.settings().log_level, LogLevel::Info);
}

#[test]
fn empty_file_yields_empty_registry() {
    let registry = Fixture::new().load("").unwrap();
    assert!(registry.certificates().is_empty());
    assert!(registry.tokens().is_empty());
}

#[test]
fn unset_secret_aborts_load() {
    let err = Fixture::new()
        .load(
            r"
tokens:
  - env_ref: MISSING_TOKEN
    allowed_ips: [10.0.0.0/8]
    permissions: ['*:health']
",
        )
        .unwrap_err();

    match &err {
        ConfigError::Secret { source, .. } => {
            assert_eq!(source.variable(), "MISSING_TOKEN");
            assert_eq!(source.field(), "tokens[0].env_ref");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("MISSING_TOKEN"));
}

#[test]
fn duplicate_keys_fail_in_either_order() {
    let first = r"
certs:
  - key: dup
    email: a@example.com
    domains: [a.example.com]
    plugin: dns-route53
  - key: dup
    email: b@example.com
    domains: [b.example.com, c.example.com]
    plugin: dns-route53
";
    let second = r"
certs:
  - key: dup
    email: b@example.com
    domains: [b.example.com, c.example.com]
    plugin: dns-route53
  - key: dup
    email: a@example.com
    domains: [a.example.com]
    plugin: dns-route53
";
    let fixture = Fixture::new();
    for yaml in [first, second] {
        let err = fixture.load(yaml).unwrap_err();
        let ConfigError::DuplicateKey { key, index, first, .. } = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(key, "dup");
        assert_eq!(*index, 1);
        assert_eq!(*first, 0);
        assert_eq!(err.field().as_deref(), Some("certs[1].key"));
    }
}

#[test]
fn authorizes_through_both_gates() {
    let registry = Fixture::new()
        .load(
            r"
certs:
  - key: dup
    email: ops@example.com
    domains: [dup.example.com]
    plugin: dns-route53
tokens:
  - env_ref: OPS_TOKEN
    allowed_ips: [10.0.0.0/8]
    permissions: ['dup:renew']
",
        )
        .unwrap();

    assert_eq!(
        registry.authorize("ops-secret", ip("10.1.2.3"), Some("dup"), Action::Renew),
        AuthDecision::Allow
    );
    assert_eq!(
        registry.authorize("ops-secret", ip("192.168.1.1"), Some("dup"), Action::Renew),
        AuthDecision::Deny(DenyReason::NetworkNotAllowed)
    );
    assert_eq!(
        registry.authorize("ops-secret", ip("10.1.2.3"), Some("dup"), Action::Issue),
        AuthDecision::Deny(DenyReason::PermissionMissing)
    );
    assert_eq!(
        registry.authorize("wrong", ip("10.1.2.3"), Some("dup"), Action::Renew),
        AuthDecision::Deny(DenyReason::UnknownCredential)
    );
    assert_eq!(
        registry.authorize("", ip("10.1.2.3"), Some("dup"), Action::Renew),
        AuthDecision::Deny(DenyReason::UnknownCredential)
    );
}

#[test]
fn wildcard_and_specific_grants() {
    let registry = Fixture::new()
        .load(
            r"
certs:
  - key: my-cert
    email: ops@example.com
    domains: [my.example.com]
    plugin: dns-route53
  - key: other-cert
    email: ops@example.com
    domains: [other.example.com]
    plugin: dns-route53
tokens:
  - env_ref: OPS_TOKEN
    allowed_ips: ['0.0.0.0/0', '::/0']
    permissions: ['*:*']
  - env: CI_TOKEN
    allowed_ips: ['0.0.0.0/0']
    permissions: ['my-cert:read']
",
        )
        .unwrap();

    let caller = ip("203.0.113.9");
    for entry in registry.certificates() {
        for action in Action::iter() {
            assert!(registry.authorize("ops-secret", caller, Some(entry.key()), action).is_allowed());
        }
    }
    assert!(registry.authorize("ops-secret", ip("2001:db8::1"), None, Action::Health).is_allowed());

    assert!(registry.authorize("ci-secret", caller, Some("my-cert"), Action::Read).is_allowed());
    assert!(!registry.authorize("ci-secret", caller, Some("my-cert"), Action::Renew).is_allowed());
    assert!(!registry.authorize("ci-secret", caller, Some("other-cert"), Action::Read).is_allowed());
}

#[test]
fn empty_allow_list_denies_everyone() {
    let registry = Fixture::new()
        .load(
            r"
tokens:
  - env_ref: OPS_TOKEN
    allowed_ips: []
    permissions: ['*:*']
",
        )
        .unwrap();

    for caller in ["0.0.0.0", "::", "127.0.0.1"] {
        assert_eq!(
            registry.authorize("ops-secret", ip(caller), None, Action::Health),
            AuthDecision::Deny(DenyReason::NetworkNotAllowed)
        );
    }
}

#[test]
fn secret_read_from_a_file_with_trailing_newline_authenticates() {
    let mut fixture = Fixture::new();
    fixture.env = fixture.env.clone().with("FILE_TOKEN", "file-secret\n");
    let registry = fixture
        .load(
            r"
tokens:
  - env_ref: FILE_TOKEN
    allowed_ips: [127.0.0.1]
    permissions: ['*:health']
",
        )
        .unwrap();

    assert!(registry.authorize("file-secret", ip("127.0.0.1"), None, Action::Health).is_allowed());
}

#[test]
fn rejects_permission_for_undeclared_certificate() {
    let err = Fixture::new()
        .load(&format!(
            "{API_CERT}tokens:\n  - env_ref: OPS_TOKEN\n    allowed_ips: []\n    permissions: ['api.example.com:read', 'ghost:read']\n"
        ))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Validation { .. }));
    assert_eq!(err.field().as_deref(), Some("tokens[0].permissions[1]"));
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn rejects_tokens_sharing_a_secret() {
    let fixture = Fixture::new();
    let fixture = Fixture { env: fixture.env.with("SAME_TOKEN", "ops-secret"), dir: fixture.dir };

    let err = fixture
        .load(
            r"
tokens:
  - env_ref: OPS_TOKEN
    allowed_ips: []
    permissions: []
  - env_ref: SAME_TOKEN
    allowed_ips: []
    permissions: []
",
        )
        .unwrap_err();
    assert_eq!(err.field().as_deref(), Some("tokens[1].env_ref"));
    assert!(err.to_string().contains("tokens[0]"));
}

#[test]
fn nested_paths_and_file_context() {
    let err = Fixture::new()
        .load(
            r"
certs:
  - key: a
    email: a@example.com
    domains: [a.example.com]
    plugin: dns-route53
  - key: b
    email: b@example.com
    domains: [b.example.com]
    plugin: dns-route53
  - key: c
    email: c@example.com
    domains: [localhost]
    plugin: dns-route53
",
        )
        .unwrap_err();
    assert_eq!(err.field().as_deref(), Some("certs[2].domains[0]"));
    assert!(err.to_string().contains("config.yaml"));
    assert!(err.to_string().contains("localhost"));
}

#[test]
fn rejects_non_mapping_items() {
    let err = Fixture::new().load("certs:\n  - just-a-string\n").unwrap_err();
    assert_eq!(err.field().as_deref(), Some("certs[0]"));

    let err = Fixture::new().load("tokens: {}\n").unwrap_err();
    assert_eq!(err.field().as_deref(), Some("tokens"));
}

#[test]
fn missing_and_malformed_files_are_distinct() {
    let fixture = Fixture::new();

    let err = fixture.load_from(&fixture.dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound { .. }));

    let err = fixture.load("certs: [unterminated\n").unwrap_err();
    assert!(matches!(err, ConfigError::Syntax { .. }));
    assert!(err.to_string().contains("config.yaml"));
}

#[test]
fn missing_credentials_are_reported_before_the_file() {
    let fixture = Fixture::new();
    let path = fixture.write(API_CERT);

    let err = RegistryConfig::loader().env(Env::default()).file(path).load().unwrap_err();
    let ConfigError::MissingEnv { names } = &err else { panic!("unexpected error: {err}") };
    assert_eq!(*names, [AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY]);
}

#[test]
fn conf_file_comes_from_environment() {
    let fixture = Fixture::new();
    let path = fixture.write(API_CERT);
    let env = fixture.env.clone().with("CONF_FILE", path.to_string_lossy());

    let registry = RegistryConfig::loader().env(env).load().unwrap();
    assert_eq!(registry.settings().conf_file, path);
}

#[test]
fn failed_reload_keeps_active_config() {
    let fixture = Fixture::new();
    let handle = RegistryHandle::new(fixture.load(API_CERT).unwrap());
    let before = handle.current();

    let err = handle.reload(|| fixture.load("certs: [unterminated\n")).unwrap_err();
    assert!(matches!(err, ConfigError::Syntax { .. }));
    assert!(std::sync::Arc::ptr_eq(&before, &handle.current()));
    assert!(handle.current().certificate("api.example.com").is_some());

    let reloaded = handle.reload(|| fixture.load("certs: []\n")).unwrap();
    assert!(reloaded.certificates().is_empty());
    assert!(handle.current().certificate("api.example.com").is_none());
    // Snapshots taken before the swap are unaffected.
    assert!(before.certificate("api.example.com").is_some());
}
