use time::OffsetDateTime;
use tracing::{info, warn};
use wfr_core::{missing_instances, EntityKind, JobId, NominalTimeSnapshot};

use crate::error::{ReconcileError, Result};
use crate::walker::HierarchyWalker;

/// What a lifecycle operation is supposed to have done to a pipeline's bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionExpectation {
    /// The operation replaced the bundle with a new one.
    pub new_bundle: bool,
    /// Every instance scheduled before the operation survives it.
    pub same_instances: bool,
}

impl TransitionExpectation {
    pub const UNCHANGED: Self = Self { new_bundle: false, same_instances: false };
    pub const NEW_BUNDLE: Self = Self { new_bundle: true, same_instances: false };
    pub const NEW_BUNDLE_SAME_INSTANCES: Self = Self { new_bundle: true, same_instances: true };

    pub fn new(new_bundle: bool, same_instances: bool) -> Self {
        Self { new_bundle, same_instances }
    }
}

/// Before/after comparisons of a pipeline's scheduled instances.
pub struct SnapshotReconciler<'w, 'a> {
    walker: &'w HierarchyWalker<'a>,
}

impl<'w, 'a> SnapshotReconciler<'w, 'a> {
    pub fn new(walker: &'w HierarchyWalker<'a>) -> Self {
        Self { walker }
    }

    /// Nominal time -> status of every action under the bundle's default coordinator.
    pub fn snapshot_nominal_times(&self, bundle_id: &JobId, kind: EntityKind) -> Result<NominalTimeSnapshot> {
        let coord = self.walker.require_default_coordinator(bundle_id, kind)?;
        Ok(NominalTimeSnapshot::from_actions(&coord.actions))
    }

    /// Checks that going from `old` to `new` did what `expect` says. When the
    /// instances must be preserved, each of `prior` has to show up under the
    /// old or the new bundle.
    pub fn verify_bundle_transition(
        &self,
        kind: EntityKind,
        old: &JobId,
        new: &JobId,
        prior: &[OffsetDateTime],
        expect: TransitionExpectation,
    ) -> Result<()> {
        if !expect.new_bundle {
            if old != new {
                return Err(unexpected_bundle(kind, "the same", old, new));
            }
            return Ok(());
        }
        if old == new {
            return Err(unexpected_bundle(kind, "a new", old, new));
        }
        if !expect.same_instances {
            return Ok(());
        }

        let old_snapshot = self.snapshot_nominal_times(old, kind)?;
        let new_snapshot = self.snapshot_nominal_times(new, kind)?;
        let missing = missing_instances(prior, &[&old_snapshot.union(&new_snapshot)]);
        if missing.is_empty() {
            info!(%old, %new, instances = prior.len(), "all prior instances carried over");
            return Ok(());
        }
        warn!(
            %old,
            %new,
            missing = missing.len(),
            old_instances = old_snapshot.len(),
            new_instances = new_snapshot.len(),
            "instances lost across bundle transition"
        );
        Err(ReconcileError::InstancesLost {
            old: old.clone(),
            new: new.clone(),
            missing,
            old_times: old_snapshot.nominal_times(),
            new_times: new_snapshot.nominal_times(),
        })
    }

    /// Resolves the pipeline's latest bundle and verifies the transition to it.
    /// Returns the latest bundle id.
    pub fn verify_new_bundle_creation(
        &self,
        name: &str,
        kind: EntityKind,
        old: &JobId,
        prior: &[OffsetDateTime],
        expect: TransitionExpectation,
    ) -> Result<JobId> {
        let latest = self.walker.latest_bundle_id(name, kind)?;
        self.verify_bundle_transition(kind, old, &latest, prior, expect)?;
        Ok(latest)
    }
}

fn unexpected_bundle(kind: EntityKind, expected: &'static str, old: &JobId, new: &JobId) -> ReconcileError {
    ReconcileError::UnexpectedBundle { entity: kind.to_string(), expected, old: old.clone(), new: new.clone() }
}
