use std::env;
use std::fs;
use std::sync::Arc;

use serde_json::json;
use serial_test::serial;
use tempfile::tempdir;

use top_secret_core::preprocess::{base64_decode, typed};
use top_secret_core::{
    ChainConfig, ChainSecretSource, DirectoryObjectStore, DirectorySecretSource, EnvSecretSource,
    FileSecretSource, MemoryObjectStore, ObjectStore, RemoteSecretSource, SecretError,
    SecretSource, TypedValue,
};

#[test]
#[serial]
fn env_then_directory_then_files_then_remote() {
    let dir = tempdir().unwrap();
    let secrets_dir = dir.path().join("run-secrets");
    fs::create_dir(&secrets_dir).unwrap();
    fs::write(secrets_dir.join("db_password"), "  from-directory\n").unwrap();

    let settings = dir.path().join("settings.yaml");
    fs::write(&settings, "db_password: from-file\nport: i:5432\ndebug: b:off\n").unwrap();

    let store = Arc::new(MemoryObjectStore::new());
    store.insert("configs", "prod/app.yaml", "api_token: from-remote\nport: 1\n");

    env::set_var("INTEGRATION_APP_db_password", "from-env");

    let chain = ChainSecretSource::new(vec![
        Arc::new(EnvSecretSource::with_prefixes(["INTEGRATION_APP_"])),
        Arc::new(DirectorySecretSource::new(&secrets_dir)),
        Arc::new(FileSecretSource::load([&settings], true).unwrap()),
        Arc::new(RemoteSecretSource::new(store.clone(), "configs", ["prod/app"])),
    ]);

    assert_eq!(chain.resolve("db_password").unwrap().source, "env");

    env::remove_var("INTEGRATION_APP_db_password");
    let resolved = chain.resolve("db_password").unwrap();
    assert_eq!(resolved.source, "directory");
    assert_eq!(resolved.value, json!("from-directory"));

    // Found in the file source, so the remote objects are never fetched
    assert_eq!(typed(&chain.get_string("port").unwrap()).unwrap(), TypedValue::Int(5432));
    assert_eq!(typed(&chain.get_string("debug").unwrap()).unwrap(), TypedValue::Bool(false));
    assert_eq!(store.list_calls(), 0);

    assert_eq!(chain.resolve("api_token").unwrap().source, "remote");
    assert_eq!(store.read_calls(), 1);

    let err = chain.get("nowhere").unwrap_err();
    assert!(err.is_missing());
    assert_eq!(store.read_calls(), 1);
}

#[test]
fn configured_chain_with_directory_object_store() {
    let dir = tempdir().unwrap();
    let bucket = dir.path().join("objects").join("team-bucket");
    fs::create_dir_all(bucket.join("services")).unwrap();
    fs::write(
        bucket.join("services").join("billing.yaml"),
        "stripe_key: c2stdGVzdC0xMjM=\n",
    )
    .unwrap();

    let secrets_dir = dir.path().join("secrets");
    fs::create_dir(&secrets_dir).unwrap();
    fs::write(secrets_dir.join("smtp.pass"), "mail-secret").unwrap();

    let config_path = dir.path().join("chain.yaml");
    fs::write(
        &config_path,
        format!(
            "sources:\n  - type: directory\n    base_path: {}\n    postfix: pass\n\
             \x20 - type: remote\n    bucket: team-bucket\n    objects: [services/billing]\n\
             \x20   lazy: false\n",
            secrets_dir.display()
        ),
    )
    .unwrap();

    let config = ChainConfig::from_path(&config_path).unwrap();
    let store: Arc<dyn ObjectStore> =
        Arc::new(DirectoryObjectStore::new(dir.path().join("objects")));
    let chain = config.build(Some(store)).unwrap();

    assert_eq!(chain.get_string("smtp").unwrap(), "mail-secret");
    let encoded = chain.get_string("stripe_key").unwrap();
    assert_eq!(base64_decode(&encoded).unwrap(), "sk-test-123");
}

#[test]
fn configuration_errors_are_not_treated_as_missing() {
    let dir = tempdir().unwrap();
    let store: Arc<dyn ObjectStore> = Arc::new(MemoryObjectStore::new());

    let config = ChainConfig::from_yaml_str(&format!(
        "sources:\n  - type: file\n    files: [{}]\n    require_files_exist: true\n",
        dir.path().join("absent.json").display()
    ))
    .unwrap();
    assert!(matches!(config.build(Some(store)), Err(SecretError::FileNotFound(_))));

    let empty_bucket = Arc::new(MemoryObjectStore::new());
    empty_bucket.insert("bucket", "other.yaml", "k: v\n");
    let chain = ChainSecretSource::new(vec![
        Arc::new(RemoteSecretSource::new(empty_bucket, "bucket", ["wanted"])),
        Arc::new(DirectorySecretSource::new(dir.path())),
    ]);

    let err = chain.get("k").unwrap_err();
    assert!(matches!(err, SecretError::ObjectNotFound { .. }));
}
