use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use wfr_core::{EntityKind, JobId, PollBudget};
use wfr_scheduler::InMemoryScheduler;

use crate::config::BudgetsConfig;
use crate::poller::{Poller, RecordingSleeper};
use crate::reconciler::{SnapshotReconciler, TransitionExpectation};
use crate::walker::{HierarchyWalker, WalkerSettings};
use crate::ReconcileError;

#[derive(Debug, Deserialize)]
pub struct ScenarioExpected {
    pub scenario_id: String,
    pub pipeline: ScenarioPipeline,
    /// Applied to every wait; keeps fixtures independent of the defaults.
    #[serde(default)]
    pub budget: Option<PollBudget>,
    pub expect: ScenarioExpectations,
}

#[derive(Debug, Deserialize)]
pub struct ScenarioPipeline {
    pub name: String,
    pub kind: EntityKind,
}

#[derive(Debug, Deserialize)]
pub struct ScenarioExpectations {
    pub latest_bundle: JobId,
    pub coordinator_creation: Outcome,
    #[serde(default)]
    pub default_coordinator: Option<JobId>,
    #[serde(default)]
    pub transition: Option<ScenarioTransition>,
}

#[derive(Debug, Deserialize)]
pub struct ScenarioTransition {
    pub old: JobId,
    /// RFC 3339 nominal times scheduled before the operation.
    pub prior: Vec<String>,
    pub new_bundle: bool,
    pub same_instances: bool,
    pub outcome: Outcome,
    #[serde(default)]
    pub missing: Vec<String>,
}

impl ScenarioTransition {
    pub fn prior_times(&self) -> Result<Vec<OffsetDateTime>> {
        parse_times(&self.prior)
    }

    pub fn missing_times(&self) -> Result<Vec<OffsetDateTime>> {
        parse_times(&self.missing)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Ok,
    BudgetExhausted,
    UnexpectedBundle,
    InstancesLost,
    NoDefaultCoordinator,
    Other,
}

impl Outcome {
    fn of(err: &ReconcileError) -> Self {
        match err {
            ReconcileError::BudgetExhausted { .. } => Outcome::BudgetExhausted,
            ReconcileError::UnexpectedBundle { .. } => Outcome::UnexpectedBundle,
            ReconcileError::InstancesLost { .. } => Outcome::InstancesLost,
            ReconcileError::NoDefaultCoordinator { .. } => Outcome::NoDefaultCoordinator,
            _ => Outcome::Other,
        }
    }
}

#[derive(Debug)]
pub struct ScenarioResult {
    pub latest_bundle: JobId,
    pub coordinator_creation: Outcome,
    pub default_coordinator: Option<JobId>,
    pub transition: Option<Outcome>,
    /// Nominal times reported lost by the transition check.
    pub missing: Vec<OffsetDateTime>,
    /// Pauses the poller took between attempts.
    pub sleeps: usize,
    pub queries: u64,
}

pub fn load_expected(dir: &Path) -> Result<ScenarioExpected> {
    let p = dir.join("expected.yaml");
    let s = std::fs::read_to_string(&p).with_context(|| format!("read expected.yaml: {}", p.display()))?;
    let exp: ScenarioExpected = serde_yaml::from_str(&s).with_context(|| "parse expected.yaml")?;
    Ok(exp)
}

/// Replays a scenario against an in-memory scheduler loaded from
/// `scheduler.yaml`:
/// - resolves the pipeline's latest bundle
/// - waits for its coordinators
/// - picks the default coordinator
/// - runs the transition check when the scenario has one
///
/// Polling never really sleeps; the number of pauses is reported instead.
pub fn simulate(dir: &Path) -> Result<ScenarioResult> {
    let exp = load_expected(dir)?;
    let scheduler = InMemoryScheduler::load_fixture(&dir.join("scheduler.yaml"))?;
    let sleeper = Arc::new(RecordingSleeper::new());
    let mut settings = WalkerSettings::default();
    if let Some(b) = exp.budget {
        settings.budgets = BudgetsConfig {
            coordinator_creation: b,
            action_creation: b,
            action_terminal: b,
            bundle_status: b,
            bundle_over: b,
        };
    }
    let walker = HierarchyWalker::new(&scheduler, Poller::new(sleeper.clone()), settings);
    let kind = exp.pipeline.kind;

    let latest_bundle = walker.latest_bundle_id(&exp.pipeline.name, kind)?;
    let mut result = ScenarioResult {
        latest_bundle: latest_bundle.clone(),
        coordinator_creation: Outcome::Ok,
        default_coordinator: None,
        transition: None,
        missing: Vec::new(),
        sleeps: 0,
        queries: 0,
    };

    match walker.wait_for_coordinator_creation(&latest_bundle) {
        Ok(_) => {
            result.default_coordinator = walker.default_coordinator(&latest_bundle, kind)?.map(|c| c.id);
            if let Some(t) = &exp.expect.transition {
                let reconciler = SnapshotReconciler::new(&walker);
                let expect = TransitionExpectation::new(t.new_bundle, t.same_instances);
                let outcome = reconciler.verify_bundle_transition(kind, &t.old, &latest_bundle, &t.prior_times()?, expect);
                result.transition = Some(match outcome {
                    Ok(()) => Outcome::Ok,
                    Err(e) => {
                        if let ReconcileError::InstancesLost { missing, .. } = &e {
                            result.missing = missing.clone();
                        }
                        Outcome::of(&e)
                    }
                });
            }
        }
        Err(e) => result.coordinator_creation = Outcome::of(&e),
    }

    result.sleeps = sleeper.count();
    result.queries = scheduler.query_count();
    Ok(result)
}

fn parse_times(raw: &[String]) -> Result<Vec<OffsetDateTime>> {
    raw.iter()
        .map(|s| OffsetDateTime::parse(s, &Rfc3339).with_context(|| format!("parse nominal time {s:?}")))
        .collect()
}
