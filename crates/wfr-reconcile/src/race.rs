use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use tracing::{debug, info};
use wfr_core::{EntityOp, EntityRef, ServiceResponse};
use wfr_scheduler::EntityService;

use crate::ops::request_handler;

/// Pause each worker takes before issuing its request.
pub const RACE_STAGGER: Duration = Duration::from_millis(50);

#[derive(Clone, Debug)]
pub struct RaceRequest {
    pub label: String,
    pub op: EntityOp,
    pub entity: EntityRef,
    pub user: String,
}

impl RaceRequest {
    pub fn new(label: impl Into<String>, op: EntityOp, entity: EntityRef, user: impl Into<String>) -> Self {
        Self { label: label.into(), op, entity, user: user.into() }
    }
}

#[derive(Debug)]
pub struct RaceResult {
    pub label: String,
    pub op: EntityOp,
    pub response: anyhow::Result<ServiceResponse>,
}

impl RaceResult {
    pub fn succeeded(&self) -> bool {
        matches!(&self.response, Ok(r) if r.is_success())
    }
}

/// Issues every request from its own thread at roughly the same time and
/// collects one result per request, in request order.
pub fn race(service: &dyn EntityService, requests: Vec<RaceRequest>) -> Vec<RaceResult> {
    race_with_stagger(service, requests, RACE_STAGGER)
}

pub fn race_with_stagger(service: &dyn EntityService, requests: Vec<RaceRequest>, stagger: Duration) -> Vec<RaceResult> {
    info!(workers = requests.len(), "racing entity requests");
    thread::scope(|scope| {
        let workers: Vec<_> = requests
            .into_iter()
            .map(|req| {
                let label = req.label.clone();
                let op = req.op;
                let handle = scope.spawn(move || {
                    thread::sleep(stagger);
                    debug!(label = %req.label, op = %req.op, user = %req.user, "issuing");
                    request_handler(req.op)(service, &req.entity, &req.user)
                });
                (label, op, handle)
            })
            .collect();

        workers
            .into_iter()
            .map(|(label, op, handle)| {
                let response = handle.join().unwrap_or_else(|_| Err(anyhow!("worker {label} panicked")));
                RaceResult { label, op, response }
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::testing::FakeService;
    use wfr_core::{EntityKind, ResponseStatus};

    fn entity(name: &str) -> EntityRef {
        EntityRef { name: name.to_string(), kind: EntityKind::Process, definition: String::new() }
    }

    #[test]
    fn one_result_per_request_in_order() {
        let svc = FakeService::owned_by("alice");
        let results = race_with_stagger(
            &svc,
            vec![
                RaceRequest::new("first", EntityOp::Submit, entity("agg"), "alice"),
                RaceRequest::new("second", EntityOp::Suspend, entity("agg"), "bob"),
                RaceRequest::new("third", EntityOp::Status, entity("agg"), "unreachable"),
            ],
            Duration::from_millis(1),
        );
        let labels: Vec<&str> = results.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["first", "second", "third"]);
        assert!(results[0].succeeded());
        assert_eq!(results[1].response.as_ref().unwrap().status, ResponseStatus::Failed);
        assert!(results[2].response.is_err());
        assert_eq!(svc.calls.lock().unwrap().len(), 3);
    }

    #[test]
    fn no_requests_no_results() {
        let svc = FakeService::owned_by("alice");
        assert!(race(&svc, Vec::new()).is_empty());
    }
}
