use nova_config::{BoundFailurePolicy, ConfigError, ReflectConfig};
use pretty_assertions::assert_eq;

#[test]
fn load_from_path_reads_all_sections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nova-reflect.toml");
    std::fs::write(
        &path,
        r#"
[cache]
enabled = false

[bounds]
failure_policy = "memoize"

[logging]
level = "debug"
json = true
"#,
    )
    .unwrap();

    let config = ReflectConfig::load_from_path(&path).unwrap();
    assert!(!config.cache.enabled);
    assert_eq!(config.bounds.failure_policy, BoundFailurePolicy::Memoize);
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let err = ReflectConfig::load_from_path(&path).unwrap_err();
    match err {
        ConfigError::Io { path: reported, .. } => {
            assert_eq!(reported, path.display().to_string())
        }
        other => panic!("expected io error, got {other:?}"),
    }
}

#[test]
fn toml_errors_omit_source_snippet() {
    let err = ReflectConfig::load_from_str("[bounds]\nfailure_policy = \"sometimes-secret\"\n")
        .unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("failed to parse toml config"), "{message}");
    assert!(!message.contains("failure_policy = "), "{message}");
}
