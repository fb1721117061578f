use std::path::PathBuf;

use crate::environment::Environment;
use crate::orchestrator::{ActiveInstance, OrchestratorState, PluginPhase};
use crate::plugin_system::{PluginSpec, parse_spec};
use crate::rpc::{ProcedureKind, RegisteredProcedure, RpcProcedure};

fn state_with(names: &[&str]) -> OrchestratorState {
    let mut state = OrchestratorState::new();
    for name in names {
        assert!(state.add_spec(PluginSpec::simple(name)));
    }
    state
}

fn env(name: &str) -> Environment {
    Environment::python(name, PathBuf::from("/envs").join(name))
}

fn procedure(name: &str, channel: u64) -> RegisteredProcedure {
    RegisteredProcedure {
        procedure: RpcProcedure {
            kind: ProcedureKind::Command,
            name: name.to_string(),
            sync: false,
            group: None,
            options: Default::default(),
        },
        channel,
    }
}

#[test]
fn test_duplicate_names_are_refused() {
    let mut state = state_with(&["flagellum"]);
    assert!(!state.add_spec(parse_spec("flagellum", "dir:/src/flagellum")));
    assert_eq!(state.specs().len(), 1);
}

#[test]
fn test_phase_progression() {
    let mut state = state_with(&["flagellum"]);
    assert_eq!(state.phase("flagellum"), Some(PluginPhase::Configured));
    assert_eq!(state.phase("ghost"), None);

    state.mark_ready(env("flagellum"));
    assert_eq!(state.phase("flagellum"), Some(PluginPhase::EnvironmentReady));

    state.insert_active(ActiveInstance::new("flagellum", 3, 1003));
    assert_eq!(state.phase("flagellum"), Some(PluginPhase::Uninitialized));
    assert_eq!(state.uninitialized_names(), vec!["flagellum".to_string()]);

    state.initialization_complete();
    assert_eq!(state.phase("flagellum"), Some(PluginPhase::Running));
    assert!(state.phase("flagellum").unwrap().is_active());

    state.remove_active("flagellum");
    assert_eq!(state.phase("flagellum"), Some(PluginPhase::EnvironmentReady));
}

#[test]
fn test_listings_follow_configuration_order_with_self_last() {
    let mut state = state_with(&["myo", "cilia", "flagellum"]);
    state.set_self_spec(PluginSpec::simple("trellis"));
    for name in ["trellis", "flagellum", "myo"] {
        state.mark_ready(env(name));
    }

    assert_eq!(state.ready_names(), vec!["myo", "flagellum", "trellis"]);
    assert!(state.is_self("trellis"));
    assert!(!state.is_self("myo"));
    assert!(state.spec("trellis").is_some());
    assert_eq!(state.specs().len(), 3);
}

#[test]
fn test_procedures_only_attach_to_active_plugins() {
    let mut state = state_with(&["flagellum", "cilia"]);
    state.mark_ready(env("flagellum"));
    state.insert_active(ActiveInstance::new("flagellum", 1, 1001));

    state.set_procedures("flagellum", vec![procedure("FlagellumRun", 1)]);
    state.set_procedures("cilia", vec![procedure("CiliaRun", 2)]);
    assert_eq!(state.procedures("flagellum").len(), 1);
    assert!(state.procedures("cilia").is_empty());

    let (instance, procedures) = state.remove_active("flagellum").unwrap();
    assert_eq!(instance.channel, 1);
    assert_eq!(procedures.len(), 1);
    assert!(state.procedures("flagellum").is_empty());
    assert!(state.remove_active("flagellum").is_none());
}

#[test]
fn test_forget_environment_spares_active_plugins() {
    let mut state = state_with(&["flagellum", "cilia"]);
    state.mark_ready(env("flagellum"));
    state.mark_ready(env("cilia"));
    state.insert_active(ActiveInstance::new("cilia", 1, 1001));

    state.forget_environment("flagellum");
    state.forget_environment("cilia");
    assert!(!state.is_ready("flagellum"));
    assert!(state.environment("flagellum").is_none());
    assert!(state.is_ready("cilia"));
}

#[test]
fn test_instance_prefix() {
    assert_eq!(ActiveInstance::new("cilia-tools", 1, 1).prefix(), "CiliaTools");
}
