use time::OffsetDateTime;
use tracing::{debug, info, warn};
use wfr_core::{
    bundle_filter, max_by_sequence, min_by_sequence, sort_by_sequence, ActionSnapshot, ActionStatus, BundleSnapshot,
    CoordinatorSnapshot, EntityKind, JobId, JobStatus,
};
use wfr_scheduler::{SchedulerClient, SchedulerError};

use crate::config::{BudgetsConfig, Config};
use crate::error::{ReconcileError, Result};
use crate::poller::{PollOutcome, Polled, Poller};

/// Knobs the walker reads from configuration.
#[derive(Clone, Debug)]
pub struct WalkerSettings {
    pub bundle_prefix: String,
    pub list_length: usize,
    pub budgets: BudgetsConfig,
}

impl Default for WalkerSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for WalkerSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            bundle_prefix: cfg.scheduler.bundle_prefix.clone(),
            list_length: cfg.scheduler.list_length,
            budgets: cfg.budgets,
        }
    }
}

/// Navigates bundle -> coordinator -> action for one scheduler, waiting on
/// parts of the hierarchy that have not shown up yet.
pub struct HierarchyWalker<'a> {
    client: &'a dyn SchedulerClient,
    poller: Poller,
    settings: WalkerSettings,
}

impl<'a> HierarchyWalker<'a> {
    pub fn new(client: &'a dyn SchedulerClient, poller: Poller, settings: WalkerSettings) -> Self {
        Self { client, poller, settings }
    }

    pub fn client(&self) -> &'a dyn SchedulerClient {
        self.client
    }

    pub fn settings(&self) -> &WalkerSettings {
        &self.settings
    }

    pub fn filter_for(&self, name: &str, kind: EntityKind) -> String {
        bundle_filter(&self.settings.bundle_prefix, kind, name)
    }

    // ---- bundle discovery ----

    /// Ids of the bundles generated for a pipeline, newest first.
    pub fn bundle_ids(&self, name: &str, kind: EntityKind) -> Result<Vec<JobId>> {
        let filter = self.filter_for(name, kind);
        info!(endpoint = %self.client.endpoint(), %filter, "listing bundles");
        let bundles = self.client.list_bundles(&filter, 1, self.settings.list_length)?;
        let ids: Vec<JobId> = bundles.into_iter().map(|b| b.id).collect();
        for id in &ids {
            info!(bundle = %id, "bundle");
        }
        Ok(ids)
    }

    pub fn bundle_count(&self, name: &str, kind: EntityKind) -> Result<usize> {
        Ok(self.bundle_ids(name, kind)?.len())
    }

    /// The most recently submitted bundle of the pipeline.
    pub fn latest_bundle_id(&self, name: &str, kind: EntityKind) -> Result<JobId> {
        let ids = self.bundle_ids(name, kind)?;
        max_by_sequence(&ids)?.cloned().ok_or_else(|| self.no_bundle(name, kind, None))
    }

    pub fn oldest_bundle_id(&self, name: &str, kind: EntityKind) -> Result<JobId> {
        let ids = self.bundle_ids(name, kind)?;
        min_by_sequence(&ids)?.cloned().ok_or_else(|| self.no_bundle(name, kind, None))
    }

    /// The `n`-th bundle in submission order, 0 being the oldest.
    pub fn sequence_bundle_id(&self, name: &str, kind: EntityKind, n: usize) -> Result<JobId> {
        let ids = sort_by_sequence(&self.bundle_ids(name, kind)?)?;
        ids.into_iter().nth(n).ok_or_else(|| self.no_bundle(name, kind, Some(n)))
    }

    /// Status of the first listed bundle of the pipeline, if any exists.
    pub fn bundle_status(&self, name: &str, kind: EntityKind) -> Result<Option<JobStatus>> {
        let filter = self.filter_for(name, kind);
        let bundles = self.client.list_bundles(&filter, 1, self.settings.list_length)?;
        Ok(bundles.first().map(|b| b.status))
    }

    fn no_bundle(&self, name: &str, kind: EntityKind, index: Option<usize>) -> ReconcileError {
        ReconcileError::NoBundle { filter: self.filter_for(name, kind), index }
    }

    // ---- coordinators ----

    /// First coordinator of the bundle whose app name carries the role of
    /// `kind`, with its actions. `None` when no coordinator matches.
    pub fn default_coordinator(&self, bundle_id: &JobId, kind: EntityKind) -> Result<Option<CoordinatorSnapshot>> {
        let Some(role) = kind.coordinator_role() else {
            warn!(bundle = %bundle_id, %kind, "entity kind has no coordinator role");
            return Ok(None);
        };
        let bundle = self.client.bundle_info(bundle_id)?;
        match bundle.coordinators.iter().find(|c| c.has_role(role)) {
            Some(coord) => {
                debug!(bundle = %bundle_id, coordinator = %coord.id, app_name = %coord.app_name, "default coordinator");
                Ok(Some(self.client.coordinator_info(&coord.id)?))
            }
            None => {
                warn!(bundle = %bundle_id, role, "desired coordinator does not exist");
                Ok(None)
            }
        }
    }

    pub fn require_default_coordinator(&self, bundle_id: &JobId, kind: EntityKind) -> Result<CoordinatorSnapshot> {
        self.default_coordinator(bundle_id, kind)?.ok_or_else(|| ReconcileError::NoDefaultCoordinator {
            bundle: bundle_id.clone(),
            role: kind.coordinator_role().unwrap_or("any").to_string(),
        })
    }

    /// First coordinator listed under the bundle, with its actions. The
    /// coordinator may lag behind the bundle listing it, so it is waited for.
    pub fn first_coordinator(&self, bundle: &BundleSnapshot) -> Result<CoordinatorSnapshot> {
        let coord = bundle.coordinators.first().ok_or_else(|| ReconcileError::NoDefaultCoordinator {
            bundle: bundle.id.clone(),
            role: "any".to_string(),
        })?;
        let what = format!("coordinator {}", coord.id);
        let polled = self.poller.poll_until(&what, self.settings.budgets.coordinator_creation, || {
            let info = pending_if_absent(self.client.coordinator_info(&coord.id))?;
            let ready = info.is_some();
            Ok::<_, SchedulerError>((info, ready))
        })?;
        settle(polled, what, "coordinator visibility")
    }

    // ---- waits ----

    /// Waits until the bundle lists at least one coordinator.
    pub fn wait_for_coordinator_creation(&self, bundle_id: &JobId) -> Result<BundleSnapshot> {
        let what = format!("bundle {bundle_id}");
        let polled = self.poller.poll_until(&what, self.settings.budgets.coordinator_creation, || {
            let bundle = pending_if_absent(self.client.bundle_info(bundle_id))?;
            let ready = bundle.as_ref().is_some_and(|b| !b.coordinators.is_empty());
            Ok::<_, SchedulerError>((bundle, ready))
        })?;
        settle(polled, what, "coordinator creation")
    }

    /// Waits until the coordinator has materialized at least one action.
    pub fn wait_for_actions(&self, coordinator_id: &JobId) -> Result<CoordinatorSnapshot> {
        let what = format!("coordinator {coordinator_id}");
        let polled = self.poller.poll_until(&what, self.settings.budgets.action_creation, || {
            let coord = pending_if_absent(self.client.coordinator_info(coordinator_id))?;
            let ready = coord.as_ref().is_some_and(|c| !c.actions.is_empty());
            Ok::<_, SchedulerError>((coord, ready))
        })?;
        settle(polled, what, "action creation")
    }

    /// Waits for the action to reach SUCCEEDED, KILLED or FAILED. Returns the
    /// last snapshot and whether it is terminal; running out of budget is not
    /// an error here unless the action never showed up at all.
    pub fn wait_for_action_terminal(&self, action_id: &JobId) -> Result<(ActionSnapshot, bool)> {
        let what = format!("action {action_id}");
        let polled = self.poller.poll_until(&what, self.settings.budgets.action_terminal, || {
            let action = pending_if_absent(self.client.action_info(action_id))?;
            let done = action.as_ref().is_some_and(|a| a.status.is_terminal());
            Ok::<_, SchedulerError>((action, done))
        })?;
        let done = polled.ok();
        match (polled.outcome, polled.value) {
            (PollOutcome::Cancelled, _) => Err(ReconcileError::Cancelled { what, attempts: polled.attempts }),
            (_, Some(last)) => Ok((last, done)),
            (_, None) => Err(ReconcileError::BudgetExhausted {
                what,
                condition: "action visibility".to_string(),
                attempts: polled.attempts,
            }),
        }
    }

    /// Waits for every retention action of the bundle to finish and requires
    /// each one to have succeeded. Returns the action ids.
    pub fn wait_for_retention_workflow(&self, bundle_id: &JobId) -> Result<Vec<JobId>> {
        let bundle = self.wait_for_coordinator_creation(bundle_id)?;
        let coord = self.first_coordinator(&bundle)?;
        let coord = self.wait_for_actions(&coord.id)?;
        let mut ids = Vec::with_capacity(coord.actions.len());
        for action in &coord.actions {
            let (last, _) = self.wait_for_action_terminal(&action.id)?;
            if last.status != ActionStatus::Succeeded {
                return Err(ReconcileError::UnexpectedStatus {
                    what: format!("retention action {}", last.id),
                    expected: ActionStatus::Succeeded.to_string(),
                    actual: last.status.to_string(),
                });
            }
            info!(action = %last.id, "retention action succeeded");
            ids.push(last.id);
        }
        Ok(ids)
    }

    /// Waits for the pipeline's first listed bundle to report `expected`.
    /// Returns false when it never does.
    pub fn wait_for_bundle_status(&self, name: &str, kind: EntityKind, expected: JobStatus) -> Result<bool> {
        let what = self.filter_for(name, kind);
        let polled = self.poller.poll_until(&what, self.settings.budgets.bundle_status, || {
            let status = self.bundle_status(name, kind)?;
            Ok::<_, ReconcileError>((status, status == Some(expected)))
        })?;
        match polled.outcome {
            PollOutcome::Cancelled => Err(ReconcileError::Cancelled { what, attempts: polled.attempts }),
            PollOutcome::Satisfied => Ok(true),
            PollOutcome::Exhausted => {
                warn!(%what, %expected, last = ?polled.value, "bundle never reached expected status");
                Ok(false)
            }
        }
    }

    /// Waits for the bundle to reach a terminal status and returns it.
    pub fn wait_for_bundle_over(&self, bundle_id: &JobId) -> Result<JobStatus> {
        let what = format!("bundle {bundle_id}");
        let polled = self.poller.poll_until(&what, self.settings.budgets.bundle_over, || {
            let status = pending_if_absent(self.client.bundle_info(bundle_id))?.map(|b| b.status);
            Ok::<_, SchedulerError>((status, status.is_some_and(|s| s.is_terminal())))
        })?;
        settle(polled, what, "terminal bundle status")
    }

    // ---- derived views ----

    /// Workflow job ids launched by the first coordinator's actions, in
    /// nominal order. Actions that have not started yet are skipped.
    pub fn workflow_ids(&self, bundle_id: &JobId) -> Result<Vec<String>> {
        let bundle = self.wait_for_coordinator_creation(bundle_id)?;
        let coord = self.first_coordinator(&bundle)?;
        Ok(coord.actions.into_iter().filter_map(|a| a.external_id).collect())
    }

    pub fn first_nominal_time(&self, bundle_id: &JobId) -> Result<Option<OffsetDateTime>> {
        let bundle = self.wait_for_coordinator_creation(bundle_id)?;
        let coord = self.first_coordinator(&bundle)?;
        Ok(coord.actions.first().map(|a| a.nominal_time))
    }

    /// Number of instances the bundle's processing coordinator has created.
    pub fn workflow_instance_count(&self, bundle_id: &JobId) -> Result<usize> {
        Ok(self.require_default_coordinator(bundle_id, EntityKind::Process)?.actions.len())
    }

    /// Creation times of the actions of the bundle's first processing
    /// coordinator that has any, sorted. `None` when no such coordinator
    /// has created an action yet.
    pub fn running_coordinator_start_times(&self, bundle_id: &JobId) -> Result<Option<Vec<OffsetDateTime>>> {
        let role = EntityKind::Process.coordinator_role().unwrap_or("DEFAULT");
        let bundle = self.client.bundle_info(bundle_id)?;
        for coord in bundle.coordinators.iter().filter(|c| c.has_role(role)) {
            let info = self.client.coordinator_info(&coord.id)?;
            let mut created: Vec<OffsetDateTime> = info.actions.iter().filter_map(|a| a.created_time).collect();
            if !created.is_empty() {
                created.sort();
                debug!(bundle = %bundle_id, coordinator = %coord.id, count = created.len(), "action creation times");
                return Ok(Some(created));
            }
        }
        Ok(None)
    }

    /// Start time of the default coordinator of the pipeline's `bundle_no`-th bundle.
    pub fn coordinator_start_time(&self, name: &str, kind: EntityKind, bundle_no: usize) -> Result<Option<OffsetDateTime>> {
        let bundle_id = self.sequence_bundle_id(name, kind, bundle_no)?;
        Ok(self.require_default_coordinator(&bundle_id, kind)?.start_time)
    }
}

/// A job the scheduler does not know yet is treated as "not there yet".
fn pending_if_absent<T>(res: std::result::Result<T, SchedulerError>) -> std::result::Result<Option<T>, SchedulerError> {
    match res {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

fn settle<T>(polled: Polled<Option<T>>, what: String, condition: &str) -> Result<T> {
    match (polled.outcome, polled.value) {
        (PollOutcome::Satisfied, Some(v)) => Ok(v),
        (PollOutcome::Cancelled, _) => Err(ReconcileError::Cancelled { what, attempts: polled.attempts }),
        _ => Err(ReconcileError::BudgetExhausted {
            what,
            condition: condition.to_string(),
            attempts: polled.attempts,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::RecordingSleeper;
    use std::sync::Arc;
    use time::macros::datetime;
    use wfr_core::PollBudget;
    use wfr_scheduler::{InMemoryScheduler, Reveal};

    fn coordinator(id: &str, app_name: &str) -> CoordinatorSnapshot {
        CoordinatorSnapshot {
            id: JobId::from_str(id),
            app_name: app_name.to_string(),
            status: JobStatus::Running,
            start_time: Some(datetime!(2013-01-01 00:00 UTC)),
            actions: vec![],
        }
    }

    fn action(id: &str, nominal: OffsetDateTime, status: ActionStatus) -> ActionSnapshot {
        ActionSnapshot {
            id: JobId::from_str(id),
            nominal_time: nominal,
            created_time: None,
            status,
            external_id: None,
            missing_dependencies: vec![],
        }
    }

    fn walker(scheduler: &InMemoryScheduler) -> (HierarchyWalker<'_>, Arc<RecordingSleeper>) {
        let sleeper = Arc::new(RecordingSleeper::new());
        let mut settings = WalkerSettings::default();
        settings.budgets.coordinator_creation = PollBudget::new(5, 2);
        settings.budgets.action_terminal = PollBudget::new(4, 10);
        settings.budgets.bundle_status = PollBudget::new(3, 5);
        settings.budgets.action_creation = PollBudget::new(3, 4);
        settings.budgets.bundle_over = PollBudget::new(3, 20);
        (HierarchyWalker::new(scheduler, Poller::new(sleeper.clone()), settings), sleeper)
    }

    #[test]
    fn latest_and_oldest_compare_sequence_numerically() {
        let scheduler = InMemoryScheduler::new();
        scheduler.add_bundle("12-130101000000000-oozie-oozi-B", "FALCON_PROCESS_agg", JobStatus::Killed);
        scheduler.add_bundle("5-130101000000000-oozie-oozi-B", "FALCON_PROCESS_agg", JobStatus::Running);
        let (w, _) = walker(&scheduler);
        assert_eq!(w.latest_bundle_id("agg", EntityKind::Process).unwrap().as_str(), "12-130101000000000-oozie-oozi-B");
        assert_eq!(w.oldest_bundle_id("agg", EntityKind::Process).unwrap().as_str(), "5-130101000000000-oozie-oozi-B");
        assert_eq!(w.sequence_bundle_id("agg", EntityKind::Process, 1).unwrap().as_str(), "12-130101000000000-oozie-oozi-B");
        assert_eq!(w.bundle_count("agg", EntityKind::Process).unwrap(), 2);
    }

    #[test]
    fn no_bundle_is_reported_with_filter() {
        let scheduler = InMemoryScheduler::new();
        let (w, _) = walker(&scheduler);
        let err = w.latest_bundle_id("agg", EntityKind::Feed).unwrap_err();
        assert!(matches!(err, ReconcileError::NoBundle { ref filter, index: None } if filter == "name=FALCON_FEED_agg"));
        let err = w.sequence_bundle_id("agg", EntityKind::Feed, 3).unwrap_err();
        assert!(matches!(err, ReconcileError::NoBundle { index: Some(3), .. }));
    }

    #[test]
    fn feed_picks_replication_coordinator() {
        let scheduler = InMemoryScheduler::new();
        let b = scheduler.add_bundle("1-a-B", "FALCON_FEED_raw", JobStatus::Running);
        scheduler.add_coordinator(&b, coordinator("2-a-C", "FALCON_FEED_RETENTION_raw"));
        scheduler.add_coordinator(&b, coordinator("3-a-C", "FALCON_FEED_REPLICATION_raw_cluster2"));
        let (w, _) = walker(&scheduler);
        let coord = w.default_coordinator(&b, EntityKind::Feed).unwrap().unwrap();
        assert_eq!(coord.id.as_str(), "3-a-C");
    }

    #[test]
    fn cluster_kind_has_no_default_coordinator() {
        let scheduler = InMemoryScheduler::new();
        let b = scheduler.add_bundle("1-a-B", "FALCON_CLUSTER_c", JobStatus::Running);
        scheduler.add_coordinator(&b, coordinator("2-a-C", "DEFAULT"));
        let (w, _) = walker(&scheduler);
        assert!(w.default_coordinator(&b, EntityKind::Cluster).unwrap().is_none());
        assert!(matches!(
            w.require_default_coordinator(&b, EntityKind::Cluster),
            Err(ReconcileError::NoDefaultCoordinator { .. })
        ));
    }

    #[test]
    fn bundle_not_yet_known_is_waited_for() {
        let scheduler = InMemoryScheduler::new();
        let mut late = coordinator("2-a-C", "FALCON_PROCESS_DEFAULT_agg");
        late.actions.push(action("2-a-C@1", datetime!(2013-01-01 00:00 UTC), ActionStatus::Waiting));
        scheduler.reveal_after(
            3,
            Reveal::Bundle {
                bundle: wfr_scheduler::FixtureBundle {
                    id: JobId::from_str("1-a-B"),
                    name: "FALCON_PROCESS_agg".into(),
                    status: JobStatus::Running,
                    coordinators: vec![late],
                },
            },
        );
        let (w, sleeper) = walker(&scheduler);
        let bundle = w.wait_for_coordinator_creation(&JobId::from_str("1-a-B")).unwrap();
        assert_eq!(bundle.coordinators.len(), 1);
        assert_eq!(sleeper.count(), 2);
    }

    #[test]
    fn transport_error_during_wait_propagates() {
        let scheduler = InMemoryScheduler::new();
        let b = scheduler.add_bundle("1-a-B", "FALCON_PROCESS_agg", JobStatus::Prep);
        scheduler.fail_next(SchedulerError::Transport("connection reset".into()));
        let (w, sleeper) = walker(&scheduler);
        let err = w.wait_for_coordinator_creation(&b).unwrap_err();
        assert!(matches!(err, ReconcileError::Scheduler(SchedulerError::Transport(_))));
        assert_eq!(sleeper.count(), 0);
    }

    #[test]
    fn action_terminal_wait_reports_last_state() {
        let scheduler = InMemoryScheduler::new();
        let b = scheduler.add_bundle("1-a-B", "FALCON_PROCESS_agg", JobStatus::Running);
        let mut coord = coordinator("2-a-C", "DEFAULT");
        coord.actions.push(action("2-a-C@1", datetime!(2013-01-01 00:00 UTC), ActionStatus::Running));
        scheduler.add_coordinator(&b, coord);
        let (w, sleeper) = walker(&scheduler);

        let (last, done) = w.wait_for_action_terminal(&JobId::from_str("2-a-C@1")).unwrap();
        assert!(!done);
        assert_eq!(last.status, ActionStatus::Running);
        assert_eq!(sleeper.count(), 3);

        scheduler.set_action_status(&JobId::from_str("2-a-C@1"), ActionStatus::Killed);
        let (last, done) = w.wait_for_action_terminal(&JobId::from_str("2-a-C@1")).unwrap();
        assert!(done);
        assert_eq!(last.status, ActionStatus::Killed);
    }

    #[test]
    fn retention_requires_every_action_to_succeed() {
        let scheduler = InMemoryScheduler::new();
        let b = scheduler.add_bundle("1-a-B", "FALCON_FEED_raw", JobStatus::Running);
        let mut coord = coordinator("2-a-C", "FALCON_FEED_RETENTION_raw");
        coord.actions.push(action("2-a-C@1", datetime!(2013-01-01 00:00 UTC), ActionStatus::Succeeded));
        coord.actions.push(action("2-a-C@2", datetime!(2013-01-01 00:05 UTC), ActionStatus::Running));
        scheduler.add_coordinator(&b, coord);
        scheduler.reveal_after(
            8,
            Reveal::ActionStatus { action_id: JobId::from_str("2-a-C@2"), status: ActionStatus::Succeeded },
        );
        let (w, _) = walker(&scheduler);
        let ids = w.wait_for_retention_workflow(&b).unwrap();
        assert_eq!(ids, vec![JobId::from_str("2-a-C@1"), JobId::from_str("2-a-C@2")]);

        scheduler.set_action_status(&JobId::from_str("2-a-C@2"), ActionStatus::Failed);
        let err = w.wait_for_retention_workflow(&b).unwrap_err();
        assert!(matches!(err, ReconcileError::UnexpectedStatus { ref actual, .. } if actual == "FAILED"));
    }

    #[test]
    fn bundle_status_wait_returns_false_on_exhaustion() {
        let scheduler = InMemoryScheduler::new();
        scheduler.add_bundle("1-a-B", "FALCON_PROCESS_agg", JobStatus::Running);
        let (w, sleeper) = walker(&scheduler);
        assert!(!w.wait_for_bundle_status("agg", EntityKind::Process, JobStatus::Suspended).unwrap());
        assert_eq!(sleeper.count(), 2);
        assert!(w.wait_for_bundle_status("agg", EntityKind::Process, JobStatus::Running).unwrap());
    }

    #[test]
    fn derived_views_read_first_coordinator() {
        let scheduler = InMemoryScheduler::new();
        let b = scheduler.add_bundle("1-a-B", "FALCON_PROCESS_agg", JobStatus::Running);
        let mut coord = coordinator("2-a-C", "FALCON_PROCESS_DEFAULT_agg");
        let mut started = action("2-a-C@1", datetime!(2013-01-01 00:00 UTC), ActionStatus::Running);
        started.external_id = Some("7-a-W".into());
        coord.actions.push(started);
        coord.actions.push(action("2-a-C@2", datetime!(2013-01-01 00:05 UTC), ActionStatus::Waiting));
        scheduler.add_coordinator(&b, coord);
        let (w, _) = walker(&scheduler);

        assert_eq!(w.workflow_ids(&b).unwrap(), vec!["7-a-W".to_string()]);
        assert_eq!(w.first_nominal_time(&b).unwrap(), Some(datetime!(2013-01-01 00:00 UTC)));
        assert_eq!(w.workflow_instance_count(&b).unwrap(), 2);
        assert_eq!(
            w.coordinator_start_time("agg", EntityKind::Process, 0).unwrap(),
            Some(datetime!(2013-01-01 00:00 UTC))
        );
    }

    #[test]
    fn action_not_yet_visible_is_retried() {
        let scheduler = InMemoryScheduler::new();
        let b = scheduler.add_bundle("1-a-B", "FALCON_PROCESS_agg", JobStatus::Running);
        scheduler.add_coordinator(&b, coordinator("2-a-C", "DEFAULT"));
        scheduler.reveal_after(
            2,
            Reveal::Action {
                coordinator_id: JobId::from_str("2-a-C"),
                action: action("2-a-C@1", datetime!(2013-01-01 00:00 UTC), ActionStatus::Succeeded),
            },
        );
        let (w, sleeper) = walker(&scheduler);
        let (last, done) = w.wait_for_action_terminal(&JobId::from_str("2-a-C@1")).unwrap();
        assert!(done);
        assert_eq!(last.status, ActionStatus::Succeeded);
        assert_eq!(sleeper.count(), 1);
    }

    #[test]
    fn action_never_visible_exhausts_budget() {
        let scheduler = InMemoryScheduler::new();
        let (w, sleeper) = walker(&scheduler);
        let err = w.wait_for_action_terminal(&JobId::from_str("9-a-C@1")).unwrap_err();
        assert!(matches!(err, ReconcileError::BudgetExhausted { attempts: 4, .. }));
        assert_eq!(sleeper.count(), 3);
    }

    #[test]
    fn coordinator_lagging_its_bundle_is_waited_for() {
        let scheduler = InMemoryScheduler::new();
        let listed = BundleSnapshot {
            id: JobId::from_str("1-a-B"),
            name: "FALCON_PROCESS_agg".into(),
            status: JobStatus::Running,
            coordinators: vec![wfr_core::CoordinatorRef {
                id: JobId::from_str("2-a-C"),
                app_name: "FALCON_PROCESS_DEFAULT_agg".into(),
                status: JobStatus::Running,
            }],
        };
        scheduler.reveal_after(
            2,
            Reveal::Coordinator { bundle_id: listed.id.clone(), coordinator: coordinator("2-a-C", "FALCON_PROCESS_DEFAULT_agg") },
        );
        let (w, sleeper) = walker(&scheduler);
        let coord = w.first_coordinator(&listed).unwrap();
        assert_eq!(coord.id.as_str(), "2-a-C");
        assert_eq!(sleeper.count(), 1);
    }

    #[test]
    fn actions_that_never_appear_exhaust_budget() {
        let scheduler = InMemoryScheduler::new();
        let b = scheduler.add_bundle("1-a-B", "FALCON_PROCESS_agg", JobStatus::Running);
        scheduler.add_coordinator(&b, coordinator("2-a-C", "DEFAULT"));
        let (w, sleeper) = walker(&scheduler);
        let err = w.wait_for_actions(&JobId::from_str("2-a-C")).unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::BudgetExhausted { ref condition, attempts: 3, .. } if condition == "action creation"
        ));
        assert_eq!(sleeper.slept(), vec![std::time::Duration::from_secs(4); 2]);
    }

    #[test]
    fn bundle_over_waits_for_terminal_status() {
        let scheduler = InMemoryScheduler::new();
        let b = scheduler.add_bundle("1-a-B", "FALCON_PROCESS_agg", JobStatus::Running);
        scheduler.reveal_after(2, Reveal::BundleStatus { bundle_id: b.clone(), status: JobStatus::Killed });
        let (w, sleeper) = walker(&scheduler);
        assert_eq!(w.wait_for_bundle_over(&b).unwrap(), JobStatus::Killed);
        assert_eq!(sleeper.count(), 1);
    }

    #[test]
    fn bundle_that_keeps_running_exhausts_budget() {
        let scheduler = InMemoryScheduler::new();
        let b = scheduler.add_bundle("1-a-B", "FALCON_PROCESS_agg", JobStatus::Running);
        let (w, sleeper) = walker(&scheduler);
        let err = w.wait_for_bundle_over(&b).unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::BudgetExhausted { ref condition, attempts: 3, .. } if condition == "terminal bundle status"
        ));
        assert_eq!(sleeper.count(), 2);
    }

    #[test]
    fn start_times_come_from_created_actions_of_default_coordinator() {
        let scheduler = InMemoryScheduler::new();
        let b = scheduler.add_bundle("1-a-B", "FALCON_PROCESS_agg", JobStatus::Running);
        let mut coord = coordinator("2-a-C", "FALCON_PROCESS_DEFAULT_agg");
        let mut late = action("2-a-C@2", datetime!(2013-01-01 00:05 UTC), ActionStatus::Waiting);
        late.created_time = Some(datetime!(2013-01-01 00:07 UTC));
        let mut early = action("2-a-C@1", datetime!(2013-01-01 00:00 UTC), ActionStatus::Running);
        early.created_time = Some(datetime!(2013-01-01 00:02 UTC));
        coord.actions = vec![late, early];
        scheduler.add_coordinator(&b, coord);
        let (w, _) = walker(&scheduler);
        assert_eq!(
            w.running_coordinator_start_times(&b).unwrap(),
            Some(vec![datetime!(2013-01-01 00:02 UTC), datetime!(2013-01-01 00:07 UTC)])
        );

        let idle = scheduler.add_bundle("3-a-B", "FALCON_PROCESS_agg", JobStatus::Prep);
        scheduler.add_coordinator(&idle, coordinator("4-a-C", "FALCON_PROCESS_DEFAULT_agg"));
        scheduler.add_coordinator(&idle, coordinator("5-a-C", "FALCON_PROCESS_REPLICATION_agg"));
        assert_eq!(w.running_coordinator_start_times(&idle).unwrap(), None);
    }
}
