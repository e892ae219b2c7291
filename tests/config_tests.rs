//! Configuration loading from files and environment.

use std::io::Write;

use scoreline::error::{ConfigError, Error};
use scoreline::infrastructure::bootstrap::build_broadcaster;
use scoreline::infrastructure::config::settings::{BroadcastKind, Config, API_KEY_ENV};

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp config");
    file.write_all(content.as_bytes()).expect("write temp config");
    file
}

#[test]
fn loads_file_and_reads_api_key_from_env() {
    let file = write_config(
        r#"
        [database]
        path = "reference.db"

        [broadcast]
        kind = "centrifugo"
        api_url = "http://centrifugo:8000"
        timeout_ms = 1500

        [simulation]
        duration_secs = 40
        seed = 11
        "#,
    );

    std::env::set_var(API_KEY_ENV, "from-env");
    let config = Config::load(file.path()).unwrap();
    std::env::remove_var(API_KEY_ENV);

    assert_eq!(config.broadcast.kind, BroadcastKind::Centrifugo);
    assert_eq!(config.broadcast.api_key.as_deref(), Some("from-env"));
    assert_eq!(config.broadcast.timeout().as_millis(), 1500);
    assert_eq!(config.simulation.session_settings(None).seed, Some(11));
    assert_eq!(build_broadcaster(&config.broadcast).unwrap().name(), "centrifugo");
}

#[test]
fn missing_file_is_read_error() {
    let err = Config::load("/nonexistent/scoreline.toml").unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::ReadFile(_))));
}

#[test]
fn empty_activation_list_is_rejected() {
    let file = write_config("[activation]\nevents = []\n");
    let err = Config::load(file.path()).unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::MissingField {
            field: "activation.events"
        })
    ));
}

#[test]
fn unknown_broadcast_kind_is_parse_error() {
    let file = write_config("[broadcast]\nkind = \"carrier-pigeon\"\n");
    let err = Config::load(file.path()).unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
}
