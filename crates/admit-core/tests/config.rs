use admit_core::config::{dirs_path, GlobalConfig, OutputFormat};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_global_config_defaults() {
    let config = GlobalConfig::default();
    assert_eq!(config.log.level, "warn");
    assert_eq!(config.output.format, OutputFormat::Text);
}

#[test]
fn test_global_config_empty_toml_uses_defaults() {
    let config: GlobalConfig = toml::from_str("").unwrap();
    assert_eq!(config.log.level, "warn");
    assert_eq!(config.output.format, OutputFormat::Text);
}

#[test]
fn test_global_config_parse_from_toml() {
    let toml = r#"
[log]
level = "admit_queue=trace"

[output]
format = "json"
"#;
    let config: GlobalConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.log.level, "admit_queue=trace");
    assert_eq!(config.output.format, OutputFormat::Json);
}

#[test]
fn test_dirs_path_contains_admit() {
    assert!(dirs_path().ends_with(".admit"));
}

#[test]
fn test_load_from_missing_file_returns_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = GlobalConfig::load_from(&tmp.path().join("config.toml")).unwrap();
    assert_eq!(config.log.level, "warn");
}

#[test]
fn test_load_from_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    fs::write(&path, "[output]\nformat = \"json\"\n").unwrap();
    let config = GlobalConfig::load_from(&path).unwrap();
    assert_eq!(config.output.format, OutputFormat::Json);
    assert_eq!(config.log.level, "warn");
}

#[test]
fn test_load_from_invalid_file_fails() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    fs::write(&path, "[output]\nformat = \"yaml\"\n").unwrap();
    let err = GlobalConfig::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("Config error"), "got: {err}");
}

#[test]
fn test_output_format_from_str() {
    assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
    assert_eq!("TEXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
    assert!("xml".parse::<OutputFormat>().is_err());
    assert_eq!(OutputFormat::Json.to_string(), "json");
}
