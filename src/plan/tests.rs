//! Tests for plan parsing and state persistence.

use super::*;
use crate::error::ProviderError;
use crate::resources::ResourceState;
use tempfile::TempDir;

const PLAN: &str = r#"
provider:
  bin_dir: ./bin
  debug: true
  username: robot
resources:
  repo:
    resource: gitops_repo
    host: github.com
    org: org
    repo: gitops
    public: true
  app1:
    resource: gitops_module
    name: app1
    namespace: ns1
    layer: infrastructure
    content_dir: charts/app1
    credentials: user:token
    config: "{}"
  team:
    resource: gitops_namespace
    name: team-a
    credentials: user:token
    config: "{}"
data:
  cluster:
    source: gitops_metadata_cluster
    server_name: east
    credentials: user:token
    config: "{}"
  operators:
    source: gitops_metadata_packages
    package_name_filter: [gitops, pipelines]
    credentials: user:token
    config: "{}"
"#;

#[test]
fn test_plan_parses_every_section() {
    let plan = Plan::from_yaml(PLAN).unwrap();

    assert_eq!(plan.provider.bin_dir, "./bin");
    assert!(plan.provider.debug);
    assert_eq!(plan.provider.lock, "branch");
    assert_eq!(plan.resources.len(), 3);
    assert_eq!(plan.data.len(), 2);

    match &plan.resources["repo"] {
        ResourceSpec::Repo(repo) => {
            assert_eq!(repo.repo, "gitops");
            assert!(repo.public);
            assert_eq!(repo.tmp_dir, ".tmp/gitops-init");
        }
        other => panic!("expected gitops_repo, got {:?}", other),
    }

    match &plan.data["operators"] {
        DataSpec::MetadataPackages(source) => {
            assert_eq!(source.package_name_filter, vec!["gitops", "pipelines"]);
            assert_eq!(source.target.server_name, "default");
        }
        other => panic!("expected gitops_metadata_packages, got {:?}", other),
    }
}

#[test]
fn test_addresses_use_kind_and_name() {
    let plan = Plan::from_yaml(PLAN).unwrap();

    assert_eq!(plan.resource_address("app1").unwrap(), "gitops_module.app1");
    assert_eq!(plan.resource_address("team").unwrap(), "gitops_namespace.team");
    assert_eq!(
        plan.data_address("cluster").unwrap(),
        "data.gitops_metadata_cluster.cluster"
    );
    assert!(plan.resource_address("missing").is_none());
}

#[test]
fn test_empty_plan_is_valid() {
    let plan = Plan::from_yaml("{}").unwrap();
    assert!(plan.resources.is_empty());
    assert!(plan.data.is_empty());
    assert_eq!(plan.provider.server_name, "default");
}

#[test]
fn test_unknown_resource_kind_is_user_error() {
    let err = Plan::from_yaml("resources:\n  x:\n    resource: gitops_cluster\n").unwrap_err();
    assert!(matches!(err, ProviderError::UserError(_)));
    assert!(err.to_string().contains("failed to parse plan YAML"));
}

#[test]
fn test_invalid_provider_block_is_config_error() {
    let err = Plan::from_yaml("provider:\n  lock: ''\n").unwrap_err();
    assert!(matches!(err, ProviderError::ConfigError(_)));
}

#[test]
fn test_missing_plan_file_is_user_error() {
    let dir = TempDir::new().unwrap();
    let err = Plan::load(dir.path().join("plan.yaml")).unwrap_err();
    assert!(matches!(err, ProviderError::UserError(_)));
}

#[test]
fn test_missing_state_file_is_no_state() {
    let dir = TempDir::new().unwrap();
    assert!(State::load(dir.path().join("state.json")).unwrap().is_none());
}

#[test]
fn test_state_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("state.json");

    let mut state = State::default();
    state.resources.insert(
        "app1".to_string(),
        ResourceState::new("ns1:app1:default:infrastructure:base"),
    );
    state.data.insert(
        "cluster".to_string(),
        ResourceState::new("cluster:default:main").with("cluster_type", "ocp4"),
    );
    state.touch();
    state.save(&path).unwrap();

    let loaded = State::load(&path).unwrap().unwrap();
    assert_eq!(loaded, state);

    let json = std::fs::read_to_string(&path).unwrap();
    assert!(json.contains("\"applied_at\""));
    assert!(json.contains("ns1:app1:default:infrastructure:base"));
}

#[test]
fn test_corrupt_state_is_user_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "not json").unwrap();

    assert!(matches!(
        State::load(&path),
        Err(ProviderError::UserError(_))
    ));
}
