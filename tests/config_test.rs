//! Integration tests for configuration loading

use carrier_track::infra::Config;
use carrier_track::services::TrackingExtractor;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[server]
bind_address = "127.0.0.1"
port = 8080

[fetcher]
url_template = "http://localhost:9000/track/{tracking_number}"
timeout_ms = 1500
user_agent = "carrier-track-test"

[markers]
banner = "section.status-banner"

[metrics]
interval_secs = 15
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.bind_address(), "127.0.0.1");
    assert_eq!(config.port(), 8080);
    assert_eq!(config.fetch_url_template(), "http://localhost:9000/track/{tracking_number}");
    assert_eq!(config.fetch_timeout_ms(), 1500);
    assert_eq!(config.fetch_user_agent(), "carrier-track-test");
    assert_eq!(config.markers().banner, "section.status-banner");
    assert_eq!(config.markers().history_step, "div.tb-step");
    assert_eq!(config.metrics_interval_secs(), 15);
    assert_eq!(config.config_file(), temp_file.path().display().to_string());

    assert!(TrackingExtractor::from_marker_set(config.markers()).is_ok());
}

#[test]
fn test_invalid_marker_selector_rejected_at_compile() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[markers]\nhistory_step = \"div..tb-step\"\n").unwrap();
    temp_file.flush().unwrap();

    // Parses as TOML, fails when the selector is compiled
    let config = Config::from_file(temp_file.path()).unwrap();
    let err = TrackingExtractor::from_marker_set(config.markers()).unwrap_err();
    assert!(err.to_string().contains("history_step"));
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.bind_address(), "0.0.0.0");
    assert_eq!(config.port(), 5001);
    assert_eq!(config.fetch_timeout_ms(), 20_000);
    assert!(config.fetch_url_template().contains("{tracking_number}"));
}

#[test]
fn test_malformed_file_falls_back_to_defaults() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[server\nport = ").unwrap();
    temp_file.flush().unwrap();

    assert!(Config::from_file(temp_file.path()).is_err());
    let config = Config::load_from_path(&temp_file.path().display().to_string());
    assert_eq!(config.port(), 5001);
}
