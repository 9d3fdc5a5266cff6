//! Config parsing, defaults, and environment overrides.

use std::collections::HashMap;
use std::path::PathBuf;

use leadscout::config::{runtime_paths, Config};

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn empty_toml_gives_defaults() {
    let config = match Config::from_toml("") {
        Ok(config) => config,
        Err(err) => panic!("empty config should parse: {err}"),
    };
    assert_eq!(config.completion.base_url, "https://openrouter.ai/api/v1");
    assert_eq!(config.completion.model, "deepseek/deepseek-chat-v3.1:free");
    assert_eq!(config.completion.api_key_env, "OPENROUTER_API_KEY");
    assert_eq!(config.completion.max_results, 30);
    assert_eq!(config.completion.timeout_secs, 120);
    assert_eq!(config.gmail.redirect_host, "127.0.0.1");
    assert_eq!(config.gmail.redirect_port, 0);
    assert_eq!(config.logging.level, "warn");
    assert!(!config.logging.file);
}

#[test]
fn partial_sections_keep_other_defaults() {
    let config = Config::from_toml(
        r#"
[completion]
model = "openai/gpt-4o-mini"
max_results = 12

[logging]
file = true
"#,
    )
    .expect("parse");
    assert_eq!(config.completion.model, "openai/gpt-4o-mini");
    assert_eq!(config.completion.max_results, 12);
    assert_eq!(config.completion.timeout_secs, 120);
    assert!(config.logging.file);
    assert_eq!(config.logging.level, "warn");
}

#[test]
fn mistyped_field_is_an_error() {
    assert!(Config::from_toml("[completion]\nmax_results = \"many\"\n").is_err());
}

#[test]
fn env_overrides_win_over_file() {
    let mut config = Config::from_toml("[completion]\nmodel = \"from-file\"\n").expect("parse");
    config.apply_overrides(env_of(&[
        ("LEADSCOUT_MODEL", "from-env"),
        ("LEADSCOUT_COMPLETION_URL", "http://localhost:4000/v1"),
        ("LEADSCOUT_TIMEOUT_SECS", "30"),
        ("LEADSCOUT_GMAIL_API_BASE", "http://localhost:5000"),
        ("LEADSCOUT_LOG_LEVEL", "debug"),
    ]));
    assert_eq!(config.completion.model, "from-env");
    assert_eq!(config.completion.base_url, "http://localhost:4000/v1");
    assert_eq!(config.completion.timeout_secs, 30);
    assert_eq!(config.gmail.api_base, "http://localhost:5000");
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn invalid_numeric_override_is_ignored() {
    let mut config = Config::default();
    config.apply_overrides(env_of(&[
        ("LEADSCOUT_TIMEOUT_SECS", "soon"),
        ("LEADSCOUT_MAX_RESULTS", "-3"),
    ]));
    assert_eq!(config.completion.timeout_secs, 120);
    assert_eq!(config.completion.max_results, 30);

    let rejected: Vec<(&str, &str)> = config
        .rejected_overrides()
        .iter()
        .map(|r| (r.var, r.value.as_str()))
        .collect();
    assert_eq!(
        rejected,
        vec![("LEADSCOUT_TIMEOUT_SECS", "soon"), ("LEADSCOUT_MAX_RESULTS", "-3")]
    );
}

#[test]
fn valid_overrides_are_not_reported() {
    let mut config = Config::default();
    config.apply_overrides(env_of(&[("LEADSCOUT_TIMEOUT_SECS", "45")]));
    assert_eq!(config.completion.timeout_secs, 45);
    assert!(config.rejected_overrides().is_empty());
}

#[test]
fn load_with_reads_file_and_applies_env() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("config.toml"),
        "[paths]\ndata_dir = \"data\"\n",
    )
    .expect("write config");

    let config = match Config::load_with(dir.path(), env_of(&[("LEADSCOUT_MAX_RESULTS", "5")])) {
        Ok(config) => config,
        Err(err) => panic!("config should load: {err}"),
    };
    assert_eq!(config.completion.max_results, 5);

    let paths = runtime_paths(dir.path(), &config);
    assert_eq!(paths.store_db, dir.path().join("data").join("leadscout.db"));
    assert_eq!(paths.env_file, dir.path().join(".env"));
}

#[test]
fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config::load_with(dir.path(), env_of(&[])).expect("load");
    assert_eq!(config.completion.max_results, 30);
}

#[test]
fn config_path_env_points_elsewhere() {
    let dir = tempfile::tempdir().expect("tempdir");
    let custom: PathBuf = dir.path().join("custom.toml");
    std::fs::write(&custom, "[logging]\nlevel = \"info\"\n").expect("write");
    let custom_str = custom.display().to_string();

    let config = Config::load_with(
        PathBuf::from("/nonexistent").as_path(),
        env_of(&[("LEADSCOUT_CONFIG", custom_str.as_str())]),
    )
    .expect("load");
    assert_eq!(config.logging.level, "info");
}

#[test]
fn broken_file_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("config.toml"), "[completion\n").expect("write");
    let err = match Config::load_with(dir.path(), env_of(&[])) {
        Ok(_) => panic!("broken config should fail"),
        Err(err) => err,
    };
    assert!(format!("{err:#}").contains("config.toml"));
}
