//! Integration test: line built from a configuration file.
//!
//! Loads TOML from disk, creates sample folders, and (on unix) runs one
//! carrier through the synthetic camera and a shell classifier in real time.

use std::io::Write;

use sortline_common::prelude::*;
use sortline_control::config::load_config;
use sortline_control::cycle::LineRunner;
use sortline_control::error::LineError;

fn lane_file(save_folder: &std::path::Path) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[shared]
log_level = "debug"
service_name = "file-lane"

[motion]
speed = 10.0
stop_precision = 0.01
inspection_pause_ms = 1500

[route]
inspection = [0.0, 0.0, 0.0]
sorting = [1.0, 0.0, 0.0]
accepted = [2.0, 0.0, 1.0]
rejected = [2.0, 0.0, -1.0]

[scheduler]
tick_hz = 100

[[stations]]
id = 1
capture_precision = 0.01
resolution = [32, 24]
save_folder = "{}"
classifier = ["true"]

[simulation]
carrier_count = 1
run_for_ms = 20000
"#,
        save_folder.display()
    )
    .unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn runner_creates_sample_folder() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("captures").join("lane-1");
    let file = lane_file(&folder);

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.shared.log_level, LogLevel::Debug);
    assert_eq!(config.stations[0].save_folder, folder);

    let line = LineRunner::from_config(&config).unwrap();
    assert!(folder.is_dir());
    assert_eq!(line.active_sessions(), 0);
}

#[test]
fn unwritable_sample_folder_is_startup_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("occupied");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let file = lane_file(&blocker.join("captures"));

    let config = load_config(file.path()).unwrap();
    let err = LineRunner::from_config(&config).unwrap_err();
    assert!(matches!(err, LineError::SampleFolder { .. }));
}

#[test]
fn invalid_file_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[shared]\nservice_name = \"x\"\n[route]\ninspection = 3").unwrap();
    assert!(matches!(load_config(file.path()), Err(ConfigError::ParseError(_))));
}

#[cfg(unix)]
#[tokio::test]
async fn synthetic_camera_and_process_classifier() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("captures");
    let file = lane_file(&folder);

    let mut config = load_config(file.path()).unwrap();
    config.stations[0].classifier = vec![
        "sh".into(),
        "-c".into(),
        format!("test -s \"$2\" && echo '{}'", super::DEFECTIVE),
        "classify".into(),
    ];

    let mut line = LineRunner::from_config(&config).unwrap();
    let stats = line.run(std::future::pending()).await;

    assert_eq!(stats.sessions_succeeded, 1);
    assert_eq!(stats.rejected, 1);

    let samples: Vec<_> = std::fs::read_dir(&folder)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(samples.len(), 1);
    assert!(samples[0].starts_with("Blister_"));
    assert!(samples[0].ends_with("_S01_0001.png"));
}

#[test]
fn shipped_config_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/line.toml");
    let config = load_config(&path).unwrap();
    assert_eq!(config.stations.len(), 1);
    assert_eq!(config.stations[0].fallback, FallbackPolicy::FailOpen);
    assert_eq!(config.motion.unknown_verdict, UnknownVerdictPolicy::Accept);
}
