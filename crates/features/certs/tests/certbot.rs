#![cfg(unix)]

use creg_certs::CertbotOperations;
use creg_kernel::config::{AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY};
use creg_kernel::prelude::*;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

const FAKE_CERTBOT: &str = r#"#!/bin/sh
if [ "$1" = "renew" ]; then
    echo "renewal failed" >&2
    exit 3
fi
echo "$@"
echo "key=$AWS_ACCESS_KEY_ID"
"#;

fn registry(root: &Path) -> RegistryConfig {
    registry_with(root, "AKIAEXAMPLE")
}

/// Loads a registry whose certbot binary, directories and AWS key all live under `root`.
fn registry_with(root: &Path, access_key: &str) -> RegistryConfig {
    std::fs::create_dir_all(root).unwrap();
    let bin = root.join("certbot");
    std::fs::write(&bin, FAKE_CERTBOT).unwrap();
    std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();

    let conf = root.join("config.yaml");
    std::fs::write(
        &conf,
        "certs:\n  - key: api.example.com\n    email: ops@example.com\n    domains: [api.example.com, www.example.com]\n    plugin: dns-route53\n",
    )
    .unwrap();

    let env = Env::default()
        .with(AWS_ACCESS_KEY_ID, access_key)
        .with(AWS_SECRET_ACCESS_KEY, "aws-secret")
        .with("CERTS_DIR", root.join("certs").to_string_lossy())
        .with("LOGS_DIR", root.join("logs").to_string_lossy())
        .with("CERTBOT_BIN", bin.to_string_lossy());
    RegistryConfig::loader().env(env).file(conf).load().unwrap()
}

#[tokio::test]
async fn runs_certbot_and_reads_chain() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path());
    let ops = CertbotOperations::new();
    let entry = registry.certificate("api.example.com").unwrap();

    let issued = ops.issue(&registry, entry).await.unwrap();
    assert!(issued.body.starts_with("certonly --non-interactive"));
    assert!(issued.body.contains("--dns-route53"));
    assert!(issued.body.contains("--cert-name api.example.com"));
    assert!(issued.body.contains("-d api.example.com -d www.example.com"));
    assert!(issued.body.contains("key=AKIAEXAMPLE"));

    let err = ops.renew(&registry, entry).await.unwrap_err();
    match err {
        OperationError::Command { status, stderr, .. } => {
            assert_eq!(status, "3");
            assert_eq!(stderr, "renewal failed");
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = ops.read(&registry, entry).await.unwrap_err();
    assert!(matches!(err, OperationError::NotIssued { .. }));

    let live = dir.path().join("certs/live/api.example.com");
    std::fs::create_dir_all(&live).unwrap();
    std::fs::write(live.join("fullchain.pem"), "-----BEGIN CERTIFICATE-----\n").unwrap();

    let read = ops.read(&registry, entry).await.unwrap();
    assert_eq!(read.body, "-----BEGIN CERTIFICATE-----\n");
    assert!(read.path.ends_with("live/api.example.com/fullchain.pem"));
}

#[tokio::test]
async fn in_flight_call_keeps_its_snapshot_across_reload() {
    let dir = tempfile::tempdir().unwrap();
    let old_root = dir.path().join("old");
    let new_root = dir.path().join("new");

    let handle = RegistryHandle::new(registry_with(&old_root, "AKIAOLD"));
    let snapshot = handle.current();
    handle.reload(|| Ok(registry_with(&new_root, "AKIANEW"))).unwrap();
    assert!(handle.current().settings().certbot_bin.starts_with(&new_root));

    let ops = CertbotOperations::new();
    let entry = snapshot.certificate("api.example.com").unwrap();
    let issued = ops.issue(&snapshot, entry).await.unwrap();

    let old_certs = old_root.join("certs");
    assert!(issued.body.contains(&format!("--config-dir {}", old_certs.display())));
    assert!(issued.body.contains("key=AKIAOLD"));
    assert!(!issued.body.contains("AKIANEW"));
    assert!(issued.path.starts_with(&*old_certs.to_string_lossy()));
}
