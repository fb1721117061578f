use serde_json::json;

use crate::config::ConfigError;
use crate::plugin_system::descriptor::{PluginDescriptor, spec_from_config};
use crate::plugin_system::spec::{InstallMethod, is_plain_name};

#[test]
fn test_name_defaults_to_spec() {
    let spec = spec_from_config(&json!({ "spec": "flagellum" })).unwrap();
    assert_eq!(spec.name(), "flagellum");
    assert_eq!(spec.method(), &InstallMethod::Distribution("flagellum".to_string()));
}

#[test]
fn test_full_descriptor() {
    let value = json!({
        "name": "cilia",
        "spec": "dir:/src/cilia",
        "debug": true,
        "pythonpath": ["/src/shared"],
        "interpreter": "python3.11",
        "extensions": ["cilia-ext"],
        "track": false,
    });
    let spec = spec_from_config(&value).unwrap();

    assert_eq!(spec.name(), "cilia");
    assert_eq!(spec.method(), &InstallMethod::Directory("/src/cilia".to_string()));
    let options = spec.options();
    assert_eq!(options.debug, Some(true));
    assert_eq!(options.search_paths, vec!["/src/shared".to_string()]);
    assert_eq!(options.interpreter.as_deref(), Some("python3.11"));
    assert_eq!(options.extra_install_args, vec!["cilia-ext".to_string()]);
    assert!(!options.track);
}

#[test]
fn test_camel_case_aliases() {
    let value = json!({
        "spec": "cilia",
        "extraSearchPaths": ["/a"],
        "interpreterOverride": "/usr/bin/python3",
        "extraInstallArgs": ["--pre"],
    });
    let descriptor = PluginDescriptor::from_value(&value).unwrap();
    assert_eq!(descriptor.search_paths, vec!["/a".to_string()]);
    assert_eq!(descriptor.interpreter.as_deref(), Some("/usr/bin/python3"));
    assert_eq!(descriptor.extra_install_args, vec!["--pre".to_string()]);
    assert!(descriptor.options().track);
}

#[test]
fn test_missing_spec_is_rejected() {
    let err = spec_from_config(&json!({ "name": "cilia" })).unwrap_err();
    assert!(matches!(err, ConfigError::MissingSpec { .. }));
    assert!(err.to_string().contains("missing attribute `spec`"));
}

#[test]
fn test_non_string_spec_is_rejected() {
    let err = spec_from_config(&json!({ "spec": 3 })).unwrap_err();
    assert!(matches!(err, ConfigError::MissingSpec { .. }));
}

#[test]
fn test_non_object_is_rejected() {
    let err = spec_from_config(&json!("flagellum")).unwrap_err();
    assert!(matches!(err, ConfigError::NotAnObject { .. }));
}

#[test]
fn test_wrongly_typed_option_names_the_plugin() {
    let err = spec_from_config(&json!({ "name": "cilia", "spec": "cilia", "debug": "yes" })).unwrap_err();
    match err {
        ConfigError::InvalidDescriptor { plugin, .. } => assert_eq!(plugin, "cilia"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_path_like_names_are_rejected() {
    for value in [
        json!({ "spec": "/home/user/work/myproj" }),
        json!({ "spec": "dir:/src/cilia" }),
        json!({ "name": "../escape", "spec": "escape" }),
        json!({ "name": "", "spec": "escape" }),
    ] {
        let err = spec_from_config(&value).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDescriptor { .. }), "accepted {value}");
    }

    let spec = spec_from_config(&json!({ "name": "cilia", "spec": "dir:/src/cilia" })).unwrap();
    assert_eq!(spec.name(), "cilia");
}

#[test]
fn test_plain_names() {
    assert!(is_plain_name("cilia-tools>=0.3"));
    assert!(is_plain_name("flagellum"));
    assert!(!is_plain_name("a/b"));
    assert!(!is_plain_name(".."));
    assert!(!is_plain_name("."));
    assert!(!is_plain_name("/abs"));
}
