//! Tests for the kubectl and kubeseal helpers.

#![cfg(unix)]

use super::*;
use crate::config::ProviderConfig;
use crate::mutex::MutexKv;
use crate::provider::Provider;
use crate::test_support::{Stub, capture_logs, recorded_args, was_called};
use serial_test::serial;
use std::sync::Arc;
use tempfile::TempDir;

fn provider(bin_dir: &std::path::Path) -> Provider {
    Provider::new(
        ProviderConfig {
            bin_dir: bin_dir.display().to_string(),
            ..Default::default()
        },
        Arc::new(MutexKv::new()),
    )
}

fn secret() -> PullSecret {
    PullSecret {
        name: "registry".to_string(),
        namespace: "tools".to_string(),
        server: "quay.io".to_string(),
        username: "robot".to_string(),
        password: "hunter2".to_string(),
    }
}

#[test]
#[serial]
fn test_pull_secret_manifest_is_written_from_stdout() {
    let bin = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    Stub::new("kubectl")
        .stdout(r#"{"kind": "Secret", "data": {".dockerconfigjson": "aHVudGVyMg=="}}"#)
        .install(bin.path());

    let dest_dir = work.path().join("secrets");
    let (result, logs) = capture_logs(|| {
        create_pull_secret(&provider(bin.path()), &secret(), &dest_dir, "pull-secret.yaml")
    });

    let path = result.unwrap();
    assert_eq!(path, dest_dir.join("pull-secret.yaml"));
    assert!(std::fs::read_to_string(&path).unwrap().contains("\"kind\": \"Secret\""));

    assert_eq!(
        recorded_args(bin.path(), "kubectl"),
        vec![
            "create",
            "secret",
            "docker-registry",
            "registry",
            "--namespace",
            "tools",
            "--docker-server=quay.io",
            "--docker-username=robot",
            "--docker-password=hunter2",
            "--dry-run=client",
            "--output=json"
        ]
    );

    assert!(logs.contains("--docker-password=[REDACTED]"));
    assert!(!logs.contains("hunter2"));
    assert!(!logs.contains("aHVudGVyMg=="));
}

#[test]
fn test_pull_secret_debug_hides_password() {
    assert!(!format!("{:?}", secret()).contains("hunter2"));
}

#[test]
#[serial]
fn test_seal_dir_seals_only_yaml_files() {
    let bin = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    Stub::new("kubeseal")
        .script("sed 's/kind: Secret/kind: SealedSecret/'")
        .install(bin.path());

    let source = work.path().join("secrets");
    std::fs::create_dir(&source).unwrap();
    std::fs::write(source.join("db.yaml"), "kind: Secret\n").unwrap();
    std::fs::write(source.join("README.md"), "not a secret\n").unwrap();

    let cert = write_cert(&work.path().join("tmp"), "CERT").unwrap();
    assert_eq!(std::fs::read_to_string(&cert).unwrap(), "CERT");
    assert!(cert.ends_with(CERT_FILE_NAME));

    let dest = work.path().join("sealed");
    let sealed = seal_dir(&provider(bin.path()), &cert, &source, &dest, &[]).unwrap();

    assert_eq!(sealed, vec![dest.join("db.yaml")]);
    assert_eq!(
        std::fs::read_to_string(dest.join("db.yaml")).unwrap(),
        "kind: SealedSecret\n"
    );
    assert!(!dest.join("README.md").exists());

    let args = recorded_args(bin.path(), "kubeseal");
    assert_eq!(
        args,
        vec!["--cert", &cert.display().to_string(), "--format", "yaml"]
    );
    assert!(!was_called(bin.path(), "kubectl"));
}

#[test]
#[serial]
fn test_seal_file_pipes_through_annotate() {
    let bin = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    Stub::new("kubeseal")
        .script("sed 's/kind: Secret/kind: SealedSecret/'")
        .install(bin.path());
    Stub::new("kubectl")
        .script("cat\nprintf 'annotated: %s\\n' \"$7\"")
        .install(bin.path());

    let source = work.path().join("db.yaml");
    std::fs::write(&source, "kind: Secret\n").unwrap();
    let dest = work.path().join("db-sealed.yaml");

    seal_file(
        &provider(bin.path()),
        &work.path().join(CERT_FILE_NAME),
        &source,
        &dest,
        &["argocd.argoproj.io/sync-wave=-1".to_string()],
    )
    .unwrap();

    assert_eq!(
        std::fs::read_to_string(&dest).unwrap(),
        "kind: SealedSecret\nannotated: argocd.argoproj.io/sync-wave=-1\n"
    );
    assert_eq!(
        recorded_args(bin.path(), "kubectl"),
        vec![
            "annotate",
            "-f",
            "-",
            "--local=true",
            "--dry-run=client",
            "--output=yaml",
            "argocd.argoproj.io/sync-wave=-1"
        ]
    );
}

#[test]
#[serial]
fn test_kubeseal_failure_is_reported() {
    let bin = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    Stub::new("kubeseal")
        .stderr("error: cannot fetch certificate")
        .exit(1)
        .install(bin.path());

    let source = work.path().join("db.yaml");
    std::fs::write(&source, "kind: Secret\n").unwrap();

    let err = seal_file(
        &provider(bin.path()),
        &work.path().join(CERT_FILE_NAME),
        &source,
        &work.path().join("out.yaml"),
        &[],
    )
    .unwrap_err();

    assert!(err.to_string().contains("cannot fetch certificate"));
    assert!(!work.path().join("out.yaml").exists());
}

#[test]
fn test_missing_source_dir_is_io_error() {
    let work = TempDir::new().unwrap();
    let err = seal_dir(
        &provider(work.path()),
        &work.path().join(CERT_FILE_NAME),
        &work.path().join("missing"),
        &work.path().join("sealed"),
        &[],
    )
    .unwrap_err();

    assert!(matches!(err, crate::error::ProviderError::IoError(_)));
}
