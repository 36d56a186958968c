use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;
use wfr_core::{
    ActionSnapshot, ActionStatus, BundleSnapshot, CoordinatorRef, CoordinatorSnapshot, JobId, JobStatus,
};

use crate::traits::{SchedulerClient, SchedulerError};

/// A change to the job hierarchy, applied either immediately or after the
/// scheduler has answered a given number of queries.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reveal {
    Bundle { bundle: FixtureBundle },
    Coordinator { bundle_id: JobId, coordinator: CoordinatorSnapshot },
    Action { coordinator_id: JobId, action: ActionSnapshot },
    ActionStatus { action_id: JobId, status: ActionStatus },
    BundleStatus { bundle_id: JobId, status: JobStatus },
}

#[derive(Clone, Debug, Deserialize)]
pub struct ScheduledReveal {
    pub after_queries: u64,
    pub change: Reveal,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FixtureBundle {
    pub id: JobId,
    pub name: String,
    pub status: JobStatus,
    #[serde(default)]
    pub coordinators: Vec<CoordinatorSnapshot>,
}

/// Scheduler state as written in a YAML scenario fixture.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SchedulerFixture {
    #[serde(default)]
    pub bundles: Vec<FixtureBundle>,
    #[serde(default)]
    pub reveals: Vec<ScheduledReveal>,
}

/// In-memory scheduler for tests. Jobs can be made to show up late to mimic
/// the eventual consistency of the real service.
#[derive(Default)]
pub struct InMemoryScheduler {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    /// Submission order; listings return newest first.
    bundles: Vec<BundleSnapshot>,
    coordinators: HashMap<String, CoordinatorSnapshot>,
    pending: Vec<ScheduledReveal>,
    failures: Vec<SchedulerError>,
    queries: u64,
}

impl InMemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: SchedulerFixture) -> Self {
        let scheduler = Self::new();
        {
            let mut inner = scheduler.lock();
            for bundle in fixture.bundles {
                inner.apply(Reveal::Bundle { bundle });
            }
            inner.pending = fixture.reveals;
        }
        scheduler
    }

    pub fn load_fixture(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let fixture: SchedulerFixture =
            serde_yaml::from_str(&s).with_context(|| format!("parse scheduler fixture {}", path.display()))?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn add_bundle(&self, id: &str, name: &str, status: JobStatus) -> JobId {
        let id = JobId::from_str(id);
        self.lock().apply(Reveal::Bundle {
            bundle: FixtureBundle { id: id.clone(), name: name.to_string(), status, coordinators: vec![] },
        });
        id
    }

    pub fn add_coordinator(&self, bundle_id: &JobId, coordinator: CoordinatorSnapshot) {
        self.lock().apply(Reveal::Coordinator { bundle_id: bundle_id.clone(), coordinator });
    }

    pub fn add_action(&self, coordinator_id: &JobId, action: ActionSnapshot) {
        self.lock().apply(Reveal::Action { coordinator_id: coordinator_id.clone(), action });
    }

    pub fn set_action_status(&self, action_id: &JobId, status: ActionStatus) {
        self.lock().apply(Reveal::ActionStatus { action_id: action_id.clone(), status });
    }

    pub fn set_bundle_status(&self, bundle_id: &JobId, status: JobStatus) {
        self.lock().apply(Reveal::BundleStatus { bundle_id: bundle_id.clone(), status });
    }

    /// Applies `change` once `after_queries` queries have been answered in total.
    pub fn reveal_after(&self, after_queries: u64, change: Reveal) {
        self.lock().pending.push(ScheduledReveal { after_queries, change });
    }

    /// Makes the next query fail with `err`. Queued failures are returned in order.
    pub fn fail_next(&self, err: SchedulerError) {
        self.lock().failures.push(err);
    }

    pub fn query_count(&self) -> u64 {
        self.lock().queries
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means another test thread panicked mid-update.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Inner {
    fn tick(&mut self) -> Result<(), SchedulerError> {
        self.queries += 1;
        let now = self.queries;
        let (due, rest): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.pending).into_iter().partition(|r| r.after_queries <= now);
        self.pending = rest;
        for r in due {
            debug!(query = now, "revealing scheduled change");
            self.apply(r.change);
        }
        if !self.failures.is_empty() {
            return Err(self.failures.remove(0));
        }
        Ok(())
    }

    fn apply(&mut self, change: Reveal) {
        match change {
            Reveal::Bundle { bundle } => {
                self.bundles.push(BundleSnapshot {
                    id: bundle.id.clone(),
                    name: bundle.name,
                    status: bundle.status,
                    coordinators: vec![],
                });
                for coordinator in bundle.coordinators {
                    self.attach_coordinator(&bundle.id, coordinator);
                }
            }
            Reveal::Coordinator { bundle_id, coordinator } => self.attach_coordinator(&bundle_id, coordinator),
            Reveal::Action { coordinator_id, action } => {
                if let Some(coord) = self.coordinators.get_mut(coordinator_id.as_str()) {
                    let pos = coord.actions.partition_point(|a| a.nominal_time < action.nominal_time);
                    coord.actions.insert(pos, action);
                }
            }
            Reveal::ActionStatus { action_id, status } => {
                if let Some(action) = self
                    .coordinators
                    .values_mut()
                    .flat_map(|c| c.actions.iter_mut())
                    .find(|a| a.id == action_id)
                {
                    action.status = status;
                }
            }
            Reveal::BundleStatus { bundle_id, status } => {
                if let Some(bundle) = self.bundles.iter_mut().find(|b| b.id == bundle_id) {
                    bundle.status = status;
                }
            }
        }
    }

    fn attach_coordinator(&mut self, bundle_id: &JobId, mut coordinator: CoordinatorSnapshot) {
        coordinator.actions.sort_by_key(|a| a.nominal_time);
        if let Some(bundle) = self.bundles.iter_mut().find(|b| &b.id == bundle_id) {
            bundle.coordinators.push(CoordinatorRef {
                id: coordinator.id.clone(),
                app_name: coordinator.app_name.clone(),
                status: coordinator.status,
            });
        }
        self.coordinators.insert(coordinator.id.0.clone(), coordinator);
    }

    fn matches_filter(bundle: &BundleSnapshot, filter: &str) -> Result<bool, SchedulerError> {
        for clause in filter.split(';').filter(|c| !c.trim().is_empty()) {
            let (key, value) = clause
                .split_once('=')
                .ok_or_else(|| SchedulerError::Protocol(format!("malformed filter clause {clause:?}")))?;
            let ok = match key.trim().to_ascii_lowercase().as_str() {
                "name" => bundle.name == value.trim(),
                "status" => bundle.status.as_str().eq_ignore_ascii_case(value.trim()),
                "id" => bundle.id.as_str() == value.trim(),
                other => return Err(SchedulerError::Protocol(format!("unsupported filter key {other:?}"))),
            };
            if !ok {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl SchedulerClient for InMemoryScheduler {
    fn endpoint(&self) -> String {
        "memory://scheduler".to_string()
    }

    fn bundle_info(&self, bundle_id: &JobId) -> Result<BundleSnapshot, SchedulerError> {
        let mut inner = self.lock();
        inner.tick()?;
        inner
            .bundles
            .iter()
            .find(|b| &b.id == bundle_id)
            .cloned()
            .ok_or_else(|| SchedulerError::NotFound { id: bundle_id.0.clone() })
    }

    fn coordinator_info(&self, coordinator_id: &JobId) -> Result<CoordinatorSnapshot, SchedulerError> {
        let mut inner = self.lock();
        inner.tick()?;
        inner
            .coordinators
            .get(coordinator_id.as_str())
            .cloned()
            .ok_or_else(|| SchedulerError::NotFound { id: coordinator_id.0.clone() })
    }

    fn action_info(&self, action_id: &JobId) -> Result<ActionSnapshot, SchedulerError> {
        let mut inner = self.lock();
        inner.tick()?;
        inner
            .coordinators
            .values()
            .flat_map(|c| c.actions.iter())
            .find(|a| &a.id == action_id)
            .cloned()
            .ok_or_else(|| SchedulerError::NotFound { id: action_id.0.clone() })
    }

    fn list_bundles(&self, filter: &str, offset: usize, len: usize) -> Result<Vec<BundleSnapshot>, SchedulerError> {
        let mut inner = self.lock();
        inner.tick()?;
        let mut out = Vec::new();
        for bundle in inner.bundles.iter().rev() {
            if Inner::matches_filter(bundle, filter)? {
                out.push(bundle.clone());
            }
        }
        Ok(out.into_iter().skip(offset.saturating_sub(1)).take(len).collect())
    }
}
