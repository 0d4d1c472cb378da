use std::path::PathBuf;

use telemux_core::{Channel, ConfigError, PipelineConfig};

#[test]
fn empty_config_uses_defaults() {
    let config = PipelineConfig::from_toml_str("").expect("defaults are valid");
    assert_eq!(config, PipelineConfig::default());
    assert_eq!(config.input_dir, PathBuf::from("data"));
    assert_eq!(config.output_dir, PathBuf::from("out"));
    assert_eq!(config.extension, "csv");
    assert_eq!(config.channels, Channel::ALL.to_vec());
    assert_eq!(config.jobs, 1);
}

#[test]
fn parses_full_config() {
    let config = PipelineConfig::from_toml_str(
        r#"
            input_dir = "logs/2024-09-01"
            output_dir = "normalized"
            extension = ".CSV"
            channels = ["ecu", "stroke/front", "stroke_rear", "ecu"]
            jobs = 4
        "#,
    )
    .expect("config parses");

    assert_eq!(config.input_dir, PathBuf::from("logs/2024-09-01"));
    assert_eq!(config.output_dir, PathBuf::from("normalized"));
    assert_eq!(config.extension, "CSV");
    assert_eq!(
        config.channels,
        vec![Channel::Ecu, Channel::StrokeFront, Channel::StrokeRear]
    );
    assert_eq!(config.jobs, 4);
}

#[test]
fn rejects_unknown_channel_and_keys() {
    let err = PipelineConfig::from_toml_str(r#"channels = ["gps"]"#).unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
    assert!(err.to_string().contains("unknown channel 'gps'"));

    let err = PipelineConfig::from_toml_str(r#"input = "data""#).unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

#[test]
fn rejects_invalid_values() {
    for content in [
        "jobs = 0",
        "channels = []",
        r#"extension = "*""#,
        r#"extension = """#,
    ] {
        let err = PipelineConfig::from_toml_str(content).unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid(_)),
            "{content} should be invalid, got {err}"
        );
    }
}

#[test]
fn load_reports_missing_file() {
    let err = PipelineConfig::load(&PathBuf::from("/nonexistent/telemux.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn load_reads_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("telemux.toml");
    std::fs::write(&path, "channels = [\"rpm\"]\njobs = 2\n").unwrap();

    let config = PipelineConfig::load(&path).expect("config loads");
    assert_eq!(config.channels, vec![Channel::Rpm]);
    assert_eq!(config.jobs, 2);
}
