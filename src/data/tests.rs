//! Tests for the data sources.

use super::*;
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::mutex::MutexKv;
use crate::provider::Provider;
use std::path::Path;
use std::sync::Arc;

fn provider_with(bin_dir: &Path, config: ProviderConfig) -> Provider {
    Provider::new(
        ProviderConfig {
            bin_dir: bin_dir.display().to_string(),
            ..config
        },
        Arc::new(MutexKv::new()),
    )
}

fn package(name: &str) -> Package {
    Package {
        package_name: name.to_string(),
        ..Default::default()
    }
}

fn names(packages: &[Package]) -> Vec<&str> {
    packages.iter().map(|p| p.package_name.as_str()).collect()
}

#[test]
fn test_empty_filter_returns_all_packages() {
    let packages = vec![package("cert-manager"), package("openshift-pipelines")];
    assert_eq!(filter_packages(&packages, &[]).unwrap(), packages);
}

#[test]
fn test_filter_order_decides_result_order() {
    let packages = vec![
        package("cert-manager"),
        package("openshift-pipelines-operator"),
        package("openshift-gitops-operator"),
    ];
    let filters = vec!["gitops".to_string(), "^cert-".to_string()];

    let result = filter_packages(&packages, &filters).unwrap();
    assert_eq!(names(&result), vec!["openshift-gitops-operator", "cert-manager"]);
}

#[test]
fn test_invalid_filter_is_config_error() {
    let err = filter_packages(&[package("a")], &["(unclosed".to_string()]).unwrap_err();
    assert!(matches!(err, ProviderError::ConfigError(_)));
}

#[test]
fn test_metadata_parses_tool_output() {
    let metadata: GitopsMetadata = serde_json::from_str(
        r#"{"cluster": {"defaultIngressSubdomain": "apps.example.com", "type": "ocp4", "openShiftVersion": "4.12"},
            "packages": [{"packageName": "cert-manager", "catalogSource": "community-operators", "channels": ["stable"]}]}"#,
    )
    .unwrap();

    assert_eq!(metadata.cluster.default_ingress_subdomain, "apps.example.com");
    assert_eq!(metadata.cluster.cluster_type, "ocp4");
    assert_eq!(metadata.cluster.openshift_version, "4.12");
    assert_eq!(metadata.packages[0].catalog_source, "community-operators");

    let shown = serde_json::to_value(&metadata.packages[0]).unwrap();
    assert_eq!(shown["package_name"], "cert-manager");
    assert_eq!(shown["channels"][0], "stable");
}

#[test]
fn test_repo_config_debug_hides_token() {
    let source: RepoConfigSource =
        serde_yaml::from_str("bootstrap_url: https://github.com/org/gitops\ntoken: s3cret\n")
            .unwrap();
    assert_eq!(source.branch, "main");
    assert!(!format!("{:?}", source).contains("s3cret"));
}

#[cfg(unix)]
mod stub_runs {
    use super::*;
    use crate::mutex::LockKey;
    use crate::resources::{GitCredential, GitopsConfigResult, GitopsTarget};
    use crate::test_support::{Stub, recorded_args, recorded_env, was_called};
    use serial_test::serial;
    use tempfile::TempDir;

    const CONFIG: &str = "bootstrap:\n  argocd-config:\n    url: https://github.com/org/gitops\n";

    const METADATA: &str = r#"{"cluster": {"defaultIngressSubdomain": "apps.example.com", "defaultIngressSecret": "ingress-tls", "kubeVersion": "v1.25", "openShiftVersion": "4.12", "type": "ocp4"}, "packages": [{"packageName": "cert-manager"}, {"packageName": "openshift-gitops-operator"}]}"#;

    fn target() -> GitopsTarget {
        GitopsTarget {
            server_name: "east".to_string(),
            credentials: "user:token".to_string(),
            config: CONFIG.to_string(),
            ..Default::default()
        }
    }

    #[test]
    #[serial]
    fn test_cluster_metadata() {
        let bin = TempDir::new().unwrap();
        Stub::new("igc").json(METADATA).install(bin.path());
        let provider = provider_with(bin.path(), ProviderConfig::default());

        let source = MetadataClusterConfig {
            kube_config_path: "/tmp/kubeconfig".to_string(),
            target: target(),
        };
        let state = source.read(&provider).unwrap();

        assert_eq!(state.id, "cluster:east:main");
        assert_eq!(state.str_attr("default_ingress_subdomain"), Some("apps.example.com"));
        assert_eq!(state.str_attr("cluster_type"), Some("ocp4"));
        assert_eq!(state.str_attr("openshift_version"), Some("4.12"));
        assert_eq!(state.str_attr("gitops_namespace"), Some(""));

        let args = recorded_args(bin.path(), "igc");
        assert_eq!(
            &args[..5],
            ["gitops-metadata-get", "--branch", "main", "--serverName", "east"]
        );
        assert_eq!(args[5], "--output");

        let env = recorded_env(bin.path(), "igc");
        assert!(env.contains("KUBECONFIG=/tmp/kubeconfig"));
        assert!(env.contains("GIT_CREDENTIALS=user:token"));
    }

    #[test]
    #[serial]
    fn test_packages_are_filtered() {
        let bin = TempDir::new().unwrap();
        Stub::new("igc").json(METADATA).install(bin.path());
        let provider = provider_with(bin.path(), ProviderConfig::default());

        let source = MetadataPackagesConfig {
            package_name_filter: vec!["gitops".to_string()],
            kube_config_path: String::new(),
            target: target(),
        };
        let state = source.read(&provider).unwrap();

        assert_eq!(state.id, "packages:east:main");
        let packages = state.attributes["packages"].as_array().unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0]["package_name"], "openshift-gitops-operator");
    }

    #[test]
    #[serial]
    fn test_invalid_filter_runs_nothing() {
        let bin = TempDir::new().unwrap();
        Stub::new("igc").json(METADATA).install(bin.path());
        let provider = provider_with(bin.path(), ProviderConfig::default());

        let source = MetadataPackagesConfig {
            package_name_filter: vec!["[".to_string()],
            kube_config_path: String::new(),
            target: target(),
        };

        assert!(matches!(
            source.read(&provider),
            Err(ProviderError::ConfigError(_))
        ));
        assert!(!was_called(bin.path(), "igc"));
        assert!(provider.locks().is_empty());
    }

    #[test]
    #[serial]
    fn test_repo_config_uses_provider_credentials() {
        let bin = TempDir::new().unwrap();
        Stub::new("igc")
            .json(r#"{"bootstrap": {"argocd-config": {"project": "0-bootstrap", "url": "https://github.com/org/gitops"}}}"#)
            .install(bin.path());
        let provider = provider_with(
            bin.path(),
            ProviderConfig {
                username: "robot".to_string(),
                token: "s3cret".to_string(),
                ca_cert_file: "/certs/ca.crt".to_string(),
                ..Default::default()
            },
        );

        let source: RepoConfigSource =
            serde_yaml::from_str("bootstrap_url: https://github.com/org/gitops.git\n").unwrap();
        let state = source.read(&provider).unwrap();

        assert_eq!(state.id, "repo-config:https://github.com/org/gitops.git:main");

        let config: GitopsConfigResult =
            serde_json::from_str(state.str_attr("gitops_config").unwrap()).unwrap();
        assert_eq!(config.boostrap.argocd_config.project, "0-bootstrap");

        let credentials: Vec<GitCredential> =
            serde_json::from_str(state.str_attr("git_credentials").unwrap()).unwrap();
        assert_eq!(credentials[0].url, "*");
        assert_eq!(credentials[0].repo, "*");
        assert_eq!(credentials[0].username, "robot");

        let args = recorded_args(bin.path(), "igc");
        assert_eq!(
            &args[..8],
            [
                "gitops-config",
                "https://github.com/org/gitops.git",
                "--branch",
                "main",
                "--serverName",
                "default",
                "--caCert",
                "/certs/ca.crt"
            ]
        );

        let env = recorded_env(bin.path(), "igc");
        assert!(env.contains("GIT_USERNAME=robot"));
        assert!(env.contains("GIT_TOKEN=s3cret"));

        let key = LockKey::for_url("https://github.com/org/gitops.git");
        assert!(provider.locks().try_lock(&key).is_some());
        assert_eq!(provider.locks().len(), 1);
    }
}
