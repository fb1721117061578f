use std::ops::Range;

use futures::future::join_all;

use crate::host::Host;
use crate::plugin_system::camel_case;
use crate::stage_manager::{StageResult, stage_command};

/// A plugin taking part in the startup handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarrierParticipant {
    pub name: String,
    pub prefix: String,
}

impl BarrierParticipant {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            prefix: camel_case(name),
        }
    }
}

/// Outcome of one stage for one plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub stage: u8,
    pub plugin: String,
    pub result: StageResult,
}

/// Every stage outcome of a barrier run, in execution order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BarrierReport {
    pub outcomes: Vec<StageOutcome>,
}

impl BarrierReport {
    pub fn failures(&self) -> impl Iterator<Item = &StageOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_failure())
    }

    pub fn for_plugin<'a>(&'a self, plugin: &'a str) -> impl Iterator<Item = &'a StageOutcome> + 'a {
        self.outcomes.iter().filter(move |o| o.plugin == plugin)
    }

    /// The highest stage that ran for every participant without failing
    pub fn completed_stage(&self) -> Option<u8> {
        let mut completed = None;
        let mut stages: Vec<u8> = self.outcomes.iter().map(|o| o.stage).collect();
        stages.dedup();
        for stage in stages {
            if self.outcomes.iter().any(|o| o.stage == stage && o.result.is_failure()) {
                break;
            }
            completed = Some(stage);
        }
        completed
    }
}

/// Run `stages` for every participant.
///
/// Within a stage the participants run concurrently; the next stage starts
/// only once all of them finished the current one. A failing stage is
/// recorded and does not stop later stages.
pub async fn run_staged_barrier(host: &dyn Host, participants: &[BarrierParticipant], stages: Range<u8>) -> BarrierReport {
    let mut report = BarrierReport::default();
    if participants.is_empty() {
        return report;
    }

    for stage in stages {
        log::debug!("Running stage {} for {} plugins", stage, participants.len());
        let results = join_all(participants.iter().map(|p| run_stage(host, p, stage))).await;
        for (participant, result) in participants.iter().zip(results) {
            if let StageResult::Failure(msg) = &result {
                log::warn!("Stage {} of '{}' failed: {}", stage, participant.name, msg);
            }
            report.outcomes.push(StageOutcome {
                stage,
                plugin: participant.name.clone(),
                result,
            });
        }
    }
    report
}

async fn run_stage(host: &dyn Host, participant: &BarrierParticipant, stage: u8) -> StageResult {
    let command = stage_command(&participant.prefix, stage);
    match host.command_exists(&command).await {
        Ok(true) => match host.run_command(&command, &[]).await {
            Ok(()) => StageResult::Success,
            Err(e) => StageResult::Failure(e.to_string()),
        },
        Ok(false) => StageResult::Skipped(format!("`{}` is not defined", command)),
        Err(e) => StageResult::Failure(e.to_string()),
    }
}
