use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use wfr_core::{ActionSnapshot, BundleSnapshot, CoordinatorSnapshot, JobId};
use wfr_scheduler::{SchedulerClient, SchedulerError};

use crate::wire::{WireAction, WireBundle, WireCoordinator, WireJobs};

/// Upper bound on actions fetched with a coordinator's info.
const COORDINATOR_ACTIONS_LEN: usize = 1000;

/// `SchedulerClient` over the Oozie v2 REST API.
pub struct OozieClient {
    base_url: String,
    http: Client,
}

impl OozieClient {
    /// `base_url` is the Oozie root, e.g. `http://localhost:11000/oozie`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build().context("build http client")?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), http })
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)], id: &str) -> Result<T, SchedulerError> {
        let url = format!("{}/v2/{}", self.base_url, path);
        debug!(%url, ?query, "GET");
        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .map_err(|e| SchedulerError::Transport(format!("GET {url}: {e}")))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SchedulerError::NotFound { id: id.to_string() });
        }
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(SchedulerError::Transport(format!("GET {url}: {status}: {}", body.trim())));
        }
        let bytes = resp.bytes().map_err(|e| SchedulerError::Transport(format!("read {url}: {e}")))?;
        serde_json::from_slice(&bytes).map_err(|e| SchedulerError::Protocol(format!("decode {url}: {e}")))
    }

    fn job_info<T: DeserializeOwned>(&self, id: &JobId, extra: &[(&str, String)]) -> Result<T, SchedulerError> {
        let mut query = vec![("show", "info".to_string())];
        query.extend(extra.iter().cloned());
        self.get_json(&format!("job/{}", id.as_str()), &query, id.as_str())
    }
}

impl SchedulerClient for OozieClient {
    fn endpoint(&self) -> String {
        self.base_url.clone()
    }

    fn bundle_info(&self, bundle_id: &JobId) -> Result<BundleSnapshot, SchedulerError> {
        let wire: WireBundle = self.job_info(bundle_id, &[])?;
        BundleSnapshot::try_from(wire)
    }

    fn coordinator_info(&self, coordinator_id: &JobId) -> Result<CoordinatorSnapshot, SchedulerError> {
        let wire: WireCoordinator = self.job_info(
            coordinator_id,
            &[("offset", "1".to_string()), ("len", COORDINATOR_ACTIONS_LEN.to_string())],
        )?;
        CoordinatorSnapshot::try_from(wire)
    }

    fn action_info(&self, action_id: &JobId) -> Result<ActionSnapshot, SchedulerError> {
        let wire: WireAction = self.job_info(action_id, &[])?;
        ActionSnapshot::try_from(wire)
    }

    fn list_bundles(&self, filter: &str, offset: usize, len: usize) -> Result<Vec<BundleSnapshot>, SchedulerError> {
        info!(endpoint = %self.base_url, %filter, "listing bundles");
        let query = [
            ("jobtype", "bundle".to_string()),
            ("filter", filter.to_string()),
            ("offset", offset.max(1).to_string()),
            ("len", len.to_string()),
        ];
        let jobs: WireJobs = self.get_json("jobs", &query, filter)?;
        jobs.bundlejobs.into_iter().map(BundleSnapshot::try_from).collect()
    }
}
