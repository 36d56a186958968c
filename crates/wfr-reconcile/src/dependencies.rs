use tracing::{debug, info};
use wfr_core::{EntityKind, JobId};
use wfr_scheduler::PathProvisioner;

use crate::error::{ReconcileError, Result};
use crate::walker::HierarchyWalker;

/// Finds the input paths actions are blocked on and has them created.
pub struct DependencyResolver<'w, 'a> {
    walker: &'w HierarchyWalker<'a>,
    provisioner: &'w dyn PathProvisioner,
}

impl<'w, 'a> DependencyResolver<'w, 'a> {
    pub fn new(walker: &'w HierarchyWalker<'a>, provisioner: &'w dyn PathProvisioner) -> Self {
        Self { walker, provisioner }
    }

    pub fn missing_dependencies_for_action(&self, coordinator_id: &JobId, action_index: usize) -> Result<Vec<String>> {
        let coord = self.walker.client().coordinator_info(coordinator_id)?;
        let len = coord.actions.len();
        let action = coord.actions.into_iter().nth(action_index).ok_or_else(|| {
            ReconcileError::ActionIndexOutOfRange { coordinator: coordinator_id.clone(), index: action_index, len }
        })?;
        Ok(action.missing_dependencies)
    }

    /// Every missing path of every action of every coordinator, in listing order.
    pub fn missing_dependencies_for_bundle(&self, bundle_id: &JobId) -> Result<Vec<String>> {
        let bundle = self.walker.client().bundle_info(bundle_id)?;
        let mut paths = Vec::new();
        for coord_ref in &bundle.coordinators {
            let coord = self.walker.client().coordinator_info(&coord_ref.id)?;
            for action in coord.actions {
                paths.extend(action.missing_dependencies);
            }
        }
        debug!(bundle = %bundle_id, paths = paths.len(), "collected missing dependencies");
        Ok(paths)
    }

    /// Missing paths of the `instance`-th action of each coordinator of the bundle.
    pub fn missing_dependencies_for_instance(&self, bundle_id: &JobId, instance: usize) -> Result<Vec<String>> {
        let bundle = self.walker.client().bundle_info(bundle_id)?;
        let mut paths = Vec::new();
        for coord_ref in &bundle.coordinators {
            paths.extend(self.missing_dependencies_for_action(&coord_ref.id, instance)?);
        }
        Ok(paths)
    }

    /// Missing paths of the first action of the first coordinator, once the
    /// bundle has a coordinator. `None` when that coordinator has no actions.
    pub fn first_missing_dependencies(&self, bundle_id: &JobId) -> Result<Option<Vec<String>>> {
        let bundle = self.walker.wait_for_coordinator_creation(bundle_id)?;
        let coord = self.walker.first_coordinator(&bundle)?;
        Ok(coord.actions.into_iter().next().map(|a| a.missing_dependencies))
    }

    /// Creates the given paths, skipping blank entries.
    pub fn materialize(&self, paths: &[String]) -> Result<()> {
        let paths: Vec<String> = paths.iter().filter(|p| !p.trim().is_empty()).cloned().collect();
        if paths.is_empty() {
            return Ok(());
        }
        info!(count = paths.len(), "materializing missing dependencies");
        self.provisioner.create_paths(&paths).map_err(ReconcileError::Provisioning)
    }

    /// Materializes the dependencies of the pipeline's `bundle_no`-th bundle
    /// (0 = oldest), either for one instance or for all of them. Returns the
    /// paths handed to the provisioner.
    pub fn create_missing_dependencies(
        &self,
        name: &str,
        kind: EntityKind,
        bundle_no: usize,
        instance: Option<usize>,
    ) -> Result<Vec<String>> {
        let bundle_id = self.walker.sequence_bundle_id(name, kind, bundle_no)?;
        let paths = match instance {
            Some(i) => self.missing_dependencies_for_instance(&bundle_id, i)?,
            None => self.missing_dependencies_for_bundle(&bundle_id)?,
        };
        self.materialize(&paths)?;
        Ok(paths)
    }
}
