//! JSON shapes of the Oozie v2 job API and their conversion into snapshots.

use serde::Deserialize;
use wfr_core::{
    parse_wire_time, split_missing_dependencies, ActionSnapshot, BundleSnapshot, CoordinatorRef,
    CoordinatorSnapshot, JobId,
};
use wfr_scheduler::SchedulerError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireBundle {
    pub bundle_job_id: String,
    #[serde(default)]
    pub bundle_job_name: Option<String>,
    pub status: String,
    #[serde(default)]
    pub bundle_coord_jobs: Vec<WireCoordinator>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCoordinator {
    pub coord_job_id: String,
    #[serde(default)]
    pub coord_job_name: Option<String>,
    pub status: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub actions: Vec<WireAction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAction {
    pub id: String,
    #[serde(default)]
    pub nominal_time: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
    pub status: String,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub missing_dependencies: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireJobs {
    #[serde(default)]
    pub bundlejobs: Vec<WireBundle>,
}

impl TryFrom<WireBundle> for BundleSnapshot {
    type Error = SchedulerError;

    fn try_from(w: WireBundle) -> Result<Self, Self::Error> {
        let coordinators = w
            .bundle_coord_jobs
            .into_iter()
            .map(|c| -> Result<CoordinatorRef, SchedulerError> {
                Ok(CoordinatorRef {
                    id: JobId(c.coord_job_id),
                    app_name: c.coord_job_name.unwrap_or_default(),
                    status: c.status.parse()?,
                })
            })
            .collect::<Result<Vec<_>, SchedulerError>>()?;
        Ok(BundleSnapshot {
            id: JobId(w.bundle_job_id),
            name: w.bundle_job_name.unwrap_or_default(),
            status: w.status.parse()?,
            coordinators,
        })
    }
}

impl TryFrom<WireCoordinator> for CoordinatorSnapshot {
    type Error = SchedulerError;

    fn try_from(w: WireCoordinator) -> Result<Self, Self::Error> {
        let start_time = w.start_time.as_deref().map(parse_wire_time).transpose()?;
        let mut actions = w
            .actions
            .into_iter()
            .map(ActionSnapshot::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        actions.sort_by_key(|a| a.nominal_time);
        Ok(CoordinatorSnapshot {
            id: JobId(w.coord_job_id),
            app_name: w.coord_job_name.unwrap_or_default(),
            status: w.status.parse()?,
            start_time,
            actions,
        })
    }
}

impl TryFrom<WireAction> for ActionSnapshot {
    type Error = SchedulerError;

    fn try_from(w: WireAction) -> Result<Self, Self::Error> {
        let nominal = w
            .nominal_time
            .as_deref()
            .ok_or_else(|| SchedulerError::Protocol(format!("action {} has no nominal time", w.id)))?;
        Ok(ActionSnapshot {
            nominal_time: parse_wire_time(nominal)?,
            created_time: w.created_time.as_deref().map(parse_wire_time).transpose()?,
            status: w.status.parse()?,
            external_id: w.external_id.filter(|s| !s.is_empty()),
            missing_dependencies: split_missing_dependencies(w.missing_dependencies.as_deref().unwrap_or("")),
            id: JobId(w.id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use wfr_core::{ActionStatus, JobStatus};

    #[test]
    fn bundle_lists_coordinators_without_actions() {
        let raw = r#"{
            "bundleJobId": "0000012-130101000000000-oozie-oozi-B",
            "bundleJobName": "FALCON_PROCESS_agg",
            "status": "RUNNING",
            "bundleCoordJobs": [
                {"coordJobId": "0000013-130101000000000-oozie-oozi-C",
                 "coordJobName": "FALCON_PROCESS_DEFAULT_agg",
                 "status": "RUNNING"}
            ]
        }"#;
        let wire: WireBundle = serde_json::from_str(raw).unwrap();
        let bundle = BundleSnapshot::try_from(wire).unwrap();
        assert_eq!(bundle.status, JobStatus::Running);
        assert_eq!(bundle.coordinators.len(), 1);
        assert_eq!(bundle.coordinators[0].app_name, "FALCON_PROCESS_DEFAULT_agg");
    }

    #[test]
    fn coordinator_actions_are_parsed_at_the_boundary() {
        let raw = r#"{
            "coordJobId": "0000013-130101000000000-oozie-oozi-C",
            "coordJobName": "FALCON_PROCESS_DEFAULT_agg",
            "status": "RUNNING",
            "startTime": "Tue, 01 Jan 2013 00:00:00 GMT",
            "actions": [
                {"id": "0000013-130101000000000-oozie-oozi-C@2",
                 "nominalTime": "Tue, 01 Jan 2013 00:05:00 GMT",
                 "status": "WAITING",
                 "missingDependencies": "hdfs://nn/a/b#hdfs://nn/a/c"},
                {"id": "0000013-130101000000000-oozie-oozi-C@1",
                 "nominalTime": "Tue, 01 Jan 2013 00:00:00 GMT",
                 "createdTime": "Tue, 01 Jan 2013 00:01:00 GMT",
                 "status": "SUCCEEDED",
                 "externalId": "0000020-130101000000000-oozie-oozi-W",
                 "missingDependencies": ""}
            ]
        }"#;
        let wire: WireCoordinator = serde_json::from_str(raw).unwrap();
        let coord = CoordinatorSnapshot::try_from(wire).unwrap();
        assert_eq!(coord.start_time, Some(datetime!(2013-01-01 00:00 UTC)));
        assert_eq!(coord.actions[0].status, ActionStatus::Succeeded);
        assert!(coord.actions[0].missing_dependencies.is_empty());
        assert_eq!(coord.actions[0].external_id.as_deref(), Some("0000020-130101000000000-oozie-oozi-W"));
        assert_eq!(coord.actions[1].missing_dependencies, vec!["hdfs://nn/a/b", "hdfs://nn/a/c"]);
    }

    #[test]
    fn unknown_status_is_protocol_error() {
        let wire = WireAction {
            id: "1-C@1".into(),
            nominal_time: Some("Tue, 01 Jan 2013 00:00:00 GMT".into()),
            created_time: None,
            status: "EXPLODED".into(),
            external_id: None,
            missing_dependencies: None,
        };
        assert!(matches!(ActionSnapshot::try_from(wire), Err(SchedulerError::Protocol(_))));
    }
}
