//! Configuration layering through the public API.

use scrivener::ScrivenerConfig;
use std::io::Write;

#[test]
fn explicit_file_layers_above_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        "[server]\nbase_url = \"http://gpu-box:11434\"\n\n[generation]\nmax_attempts = 5\n\n[logging]\njson = true"
    )
    .unwrap();

    let config = ScrivenerConfig::load_with(Some(file.path())).unwrap();
    assert_eq!(config.server().base_url, "http://gpu-box:11434");
    assert_eq!(config.generation().max_attempts, 5);
    assert!(config.logging().json);
    assert_eq!(*config.engine_config().unwrap().max_attempts(), 5);
}

#[test]
fn bad_server_url_is_rejected() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[server]\nbase_url = \"gpu-box:11434\"").unwrap();

    let err = ScrivenerConfig::from_file(file.path()).unwrap_err();
    assert!(err.message().contains("base_url"));
}
