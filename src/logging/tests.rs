// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{LogConfig, LogLevel};

#[test]
fn test_log_level_rejects_out_of_range() {
    assert!(LogLevel::new(7).is_err());
    assert_eq!(LogLevel::from_u8(7), None);
    assert_eq!(LogLevel::try_from(4).ok(), Some(LogLevel::DEBUG));
}

#[test]
fn test_filter_string_caps_library_noise_below_dump() {
    insta::assert_snapshot!(
        LogLevel::DEBUG.to_filter_string(),
        @"debug,gix=warn,reqwest=warn,hyper_util=warn"
    );
    assert_eq!(LogLevel::DUMP.to_filter_string(), "trace");
    assert_eq!(LogLevel::SILENT.to_filter_string(), "off");
}

#[test]
fn test_log_level_serde_round_trip() {
    let json = serde_json::to_string(&LogLevel::TRACE).unwrap();
    assert_eq!(json, "5");
    let parsed: LogLevel = serde_json::from_str("2").unwrap();
    assert_eq!(parsed, LogLevel::WARN);
    assert!(serde_json::from_str::<LogLevel>("9").is_err());
}

#[test]
fn test_log_config_defaults() {
    let config = LogConfig::default();
    assert_eq!(config.console_level(), LogLevel::INFO);
    assert_eq!(config.file_level(), LogLevel::TRACE);
    assert!(config.log_file().is_none());
    assert!(config.console_ansi());
    assert!(!config.json_file());
}

#[test]
fn test_log_config_builder_setters() {
    let config = LogConfig::builder()
        .with_console_level(LogLevel::WARN)
        .with_log_file("logs/duo.log".to_string())
        .with_json_file(true)
        .with_console_ansi(false)
        .build();
    assert_eq!(config.console_level(), LogLevel::WARN);
    assert_eq!(config.log_file(), Some("logs/duo.log"));
    assert!(config.json_file());
    assert!(!config.console_ansi());
}
