use std::fs;
use std::path::Path;

use appdef::{
    CACHE_DIR, DESCRIPTOR_FILE, Descriptor, DescriptorError, ErrorKind, LocalFetcher, Repo, Secret,
};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

const SOURCE: &str = r#"
apiVersion = "apps.example.dev/v1alpha1"
kind = "AppDef"

[metadata]
name = "platform"

[spec]
version = "v0.7.0"
useBasicAuth = false

[[spec.repos]]
name = "manifests"
uri = "https://example.dev/manifests/archive/v0.7.0.tar.gz"
root = "manifests-0.7.0"

[[spec.secrets]]
name = "password"
secretSource = { envSource = { name = "APP_PASSWORD" } }

[[spec.plugins]]
name = "gcp"

[[spec.plugins.pluginParameters]]
name = "region"
value = "us-east1"

[spec.plugins.spec]
project = "demo"
zone = "us-east1-d"
"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Istio {
    version: String,
    mtls: bool,
    gateways: Vec<String>,
}

fn stage_source(dir: &Path, body: &str) -> String {
    let path = dir.join("upstream.toml");
    fs::write(&path, body).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn save_after_load_preserves_repos_plugins_and_secrets() {
    let temp = TempDir::new().unwrap();
    let source = stage_source(temp.path(), SOURCE);
    let app_dir = temp.path().join("app");

    let loaded = Descriptor::load(&source, &app_dir, &LocalFetcher).unwrap();
    let out = temp.path().join("saved.toml");
    loaded.write_to_file(&out).unwrap();

    let original: Descriptor = toml::from_str(SOURCE).unwrap();
    let saved: Descriptor = toml::from_str(&fs::read_to_string(&out).unwrap()).unwrap();

    assert_eq!(saved.spec.repos, original.spec.repos);
    assert_eq!(saved.spec.plugins, original.spec.plugins);
    assert_eq!(saved.spec.secrets, original.spec.secrets);
    assert_eq!(saved.spec.parameters, original.spec.parameters);
    assert_eq!(saved.metadata, original.metadata);
}

#[test]
fn literal_secrets_never_reach_disk() {
    let temp = TempDir::new().unwrap();
    let source = stage_source(temp.path(), SOURCE);
    let app_dir = temp.path().join("app");

    let mut d = Descriptor::load(&source, &app_dir, &LocalFetcher).unwrap();
    d.set_secret(Secret::literal("admin-token", "do-not-persist"))
        .unwrap();
    d.write_to_file(app_dir.join(DESCRIPTOR_FILE)).unwrap();

    let written = fs::read_to_string(app_dir.join(DESCRIPTOR_FILE)).unwrap();
    assert!(!written.contains("do-not-persist"));
    assert!(!written.contains("admin-token"));
    assert!(written.contains("APP_PASSWORD"));

    let env = |_: &str| -> Option<String> { None };
    assert_eq!(d.secret_with("admin-token", &env).unwrap(), "do-not-persist");
}

#[test]
fn typed_plugin_insert_and_replace() {
    let mut d: Descriptor = toml::from_str(SOURCE).unwrap();
    let istio = Istio {
        version: "1.1.6".to_string(),
        mtls: true,
        gateways: vec!["ingress".to_string()],
    };

    d.set_plugin("istio", &istio).unwrap();
    assert_eq!(d.get_plugin_spec::<Istio>("istio").unwrap(), istio);

    let replacement = Istio {
        mtls: false,
        ..istio.clone()
    };
    d.set_plugin("istio", &replacement).unwrap();
    assert_eq!(d.get_plugin_spec::<Istio>("istio").unwrap(), replacement);
    assert_eq!(d.spec.plugins.len(), 2);

    let err = d.get_plugin_spec::<Istio>("gcp").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    let err = d.get_plugin_spec::<Istio>("aws").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn plugin_parameters_survive_payload_replacement() {
    let mut d: Descriptor = toml::from_str(SOURCE).unwrap();
    d.set_plugin("gcp", &toml::toml! { project = "other" }).unwrap();

    let env = |_: &str| -> Option<String> { None };
    assert_eq!(
        d.plugin_parameter_with("gcp", "region", &env).unwrap(),
        "us-east1"
    );
}

#[test]
fn env_secret_with_unset_variable_is_empty() {
    let d: Descriptor = toml::from_str(SOURCE).unwrap();
    let env = |_: &str| -> Option<String> { None };

    assert_eq!(d.secret_with("password", &env).unwrap(), "");
    let err = d.secret_with("nope", &env).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn sync_twice_yields_same_entry_and_no_extra_dirs() {
    let temp = TempDir::new().unwrap();
    let upstream = temp.path().join("upstream");
    fs::create_dir_all(upstream.join("kustomize")).unwrap();
    fs::write(upstream.join("kustomize/base.yaml"), "kind: Namespace\n").unwrap();

    let app_dir = temp.path().join("app");
    let source = stage_source(temp.path(), "[spec]\n");
    let mut d = Descriptor::load(&source, &app_dir, &LocalFetcher).unwrap();
    d.spec.repos = vec![Repo::new("manifests", upstream.to_string_lossy()).with_root("kustomize")];

    d.sync_cache(&LocalFetcher).unwrap();
    let first = d.status.repos_cache.clone();
    d.sync_cache(&LocalFetcher).unwrap();

    assert_eq!(d.status.repos_cache, first);
    let entries: Vec<_> = fs::read_dir(app_dir.join(CACHE_DIR))
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec!["manifests"]);
    assert!(first["manifests"].local_path.join("base.yaml").is_file());
}

#[test]
fn sync_failure_keeps_earlier_entries_and_names_repo() {
    let temp = TempDir::new().unwrap();
    let upstream = temp.path().join("upstream");
    fs::create_dir_all(&upstream).unwrap();
    fs::write(upstream.join("README"), "ok\n").unwrap();

    let app_dir = temp.path().join("app");
    let source = stage_source(temp.path(), "[spec]\n");
    let mut d = Descriptor::load(&source, &app_dir, &LocalFetcher).unwrap();
    d.spec.repos = vec![
        Repo::new("good", upstream.to_string_lossy()),
        Repo::new("broken", "https://unreachable.invalid/repo.tar.gz"),
    ];

    let err = d.sync_cache(&LocalFetcher).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unreachable);
    match &err {
        DescriptorError::RepoFetch { repo, uri, .. } => {
            assert_eq!(repo, "broken");
            assert_eq!(uri, "https://unreachable.invalid/repo.tar.gz");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(d.status.repos_cache.len(), 1);
    assert!(d.status.repos_cache.contains_key("good"));
}
