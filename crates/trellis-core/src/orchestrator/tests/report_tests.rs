use crate::orchestrator::manager::select;
use crate::orchestrator::{
    ActivationReport, InstallOperation, InstallReport, PluginFailure, SelectionError,
};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_empty_filter_selects_everything() {
    let (matched, unmatched) = select(names(&["a", "b"]), &[]);
    assert_eq!(matched, names(&["a", "b"]));
    assert!(unmatched.is_empty());
}

#[test]
fn test_filter_keeps_candidate_order_and_reports_leftovers() {
    let (matched, unmatched) = select(names(&["myo", "cilia", "flagellum"]), &names(&["flagellum", "ghost", "myo"]));
    assert_eq!(matched, names(&["myo", "flagellum"]));
    assert_eq!(unmatched, names(&["ghost"]));
}

#[test]
fn test_selection_error_message() {
    let err = SelectionError::new("activation", &names(&["ghost", "phantom"]));
    assert_eq!(err.to_string(), "no plugins match for activation: ghost, phantom");
}

#[test]
fn test_install_messages() {
    let mut report = InstallReport::new(InstallOperation::Install);
    assert_eq!(report.message(), "nothing installed");

    report.succeeded = names(&["flagellum", "cilia"]);
    assert_eq!(report.message(), "installed flagellum, cilia");
    assert!(report.is_success());

    report.failed.push(PluginFailure::new("myo", "pip exited with 1"));
    assert_eq!(
        report.message(),
        "installed flagellum, cilia; installation failed for myo (pip exited with 1)"
    );

    let mut update = InstallReport::new(InstallOperation::Update);
    update.failed.push(PluginFailure::new("myo", "timed out"));
    assert_eq!(update.message(), "update failed for myo (timed out)");
    assert!(!update.is_success());
}

#[test]
fn test_activation_notices() {
    let report = ActivationReport {
        already_active: names(&["flagellum"]),
        unmatched: names(&["ghost"]),
        ..ActivationReport::default()
    };
    assert!(report.is_noop());
    assert_eq!(
        report.notices(),
        vec!["already active: flagellum".to_string(), "not installed: ghost".to_string()]
    );
}
