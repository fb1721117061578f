use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::Config;
use crate::environment::error::EnvironmentError;
use crate::environment::interpreter::{requested_interpreter, resolve_interpreter, search_path};
use crate::plugin_system::{PluginOptions, PluginSpec, parse_spec};

#[test]
fn test_requested_interpreter_precedence() {
    let global = Config {
        interpreter: Some("python3.11".to_string()),
        ..Config::default()
    };
    let plain = parse_spec("flagellum", "flagellum");
    let pinned = plain.clone().with_options(PluginOptions {
        interpreter: Some("/opt/python3.12".to_string()),
        ..PluginOptions::default()
    });

    assert_eq!(requested_interpreter(&plain, &Config::default()), "python3");
    assert_eq!(requested_interpreter(&plain, &global), "python3.11");
    assert_eq!(requested_interpreter(&pinned, &global), "/opt/python3.12");
}

#[test]
fn test_search_path_skips_virtual_env() {
    let dir = tempfile::tempdir().unwrap();
    let venv_bin = dir.path().join("venv").join("bin");
    let system_bin = dir.path().join("usr").join("bin");
    for bin in [&venv_bin, &system_bin] {
        std::fs::create_dir_all(bin).unwrap();
        std::fs::write(bin.join("python3"), "").unwrap();
    }
    let path: OsString = std::env::join_paths([&venv_bin, &system_bin]).unwrap();

    assert_eq!(search_path("python3", &path, None), Some(venv_bin.join("python3")));
    assert_eq!(
        search_path("python3", &path, Some(&dir.path().join("venv"))),
        Some(system_bin.join("python3"))
    );
    assert_eq!(search_path("python2", &path, None), None);
}

#[test]
fn test_explicit_path_is_used_as_is() {
    let dir = tempfile::tempdir().unwrap();
    let interpreter = dir.path().join("python-custom");
    std::fs::write(&interpreter, "").unwrap();

    let resolved = resolve_interpreter("flagellum", interpreter.to_str().unwrap()).unwrap();
    assert_eq!(resolved, interpreter);
}

#[test]
fn test_missing_explicit_path_is_an_error() {
    let missing: PathBuf = ["/nonexistent", "bin", "python3"].iter().collect();
    match resolve_interpreter("flagellum", missing.to_str().unwrap()) {
        Err(EnvironmentError::InterpreterNotFound { plugin, interpreter }) => {
            assert_eq!(plugin, "flagellum");
            assert_eq!(interpreter, missing.to_str().unwrap());
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_unknown_bare_name_is_an_error() {
    let spec = PluginSpec::simple("flagellum");
    let err = resolve_interpreter(spec.name(), "trellis-no-such-python").unwrap_err();
    assert!(matches!(err, EnvironmentError::InterpreterNotFound { .. }));
}
