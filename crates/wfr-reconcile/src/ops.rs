use anyhow::Result;
use tracing::{info, warn};
use wfr_core::{EntityOp, EntityRef, ServiceResponse};
use wfr_scheduler::EntityService;

/// Issues one operation and returns the service's reply.
pub type RequestHandler = fn(&dyn EntityService, &EntityRef, &str) -> Result<ServiceResponse>;

pub fn request_handler(op: EntityOp) -> RequestHandler {
    match op {
        EntityOp::Status => |s, e, u| s.status(e, u),
        EntityOp::Dependency => |s, e, u| s.dependencies(e, u),
        EntityOp::Listing => |s, e, u| Ok(ServiceResponse::succeeded(s.list(e.kind, u)?.join(","))),
        EntityOp::Definition => |s, e, u| s.definition(e, u),
        EntityOp::Delete => |s, e, u| s.delete(e, u),
        // re-submits the same definition as its own update
        EntityOp::Update => |s, e, u| s.update(e, e, u),
        EntityOp::Schedule => |s, e, u| s.schedule(e, u),
        EntityOp::Submit => |s, e, u| s.submit(e, u),
        EntityOp::SubmitAndSchedule => |s, e, u| s.submit_and_schedule(e, u),
        EntityOp::Suspend => |s, e, u| s.suspend(e, u),
        EntityOp::Resume => |s, e, u| s.resume(e, u),
    }
}

/// Whether `user` was allowed to perform `op`. A listing always answers;
/// the entity has to be visible in it.
pub fn permitted(service: &dyn EntityService, op: EntityOp, entity: &EntityRef, user: &str) -> Result<bool> {
    match op {
        EntityOp::Listing => Ok(service.list(entity.kind, user)?.iter().any(|n| n == &entity.name)),
        _ => Ok(request_handler(op)(service, entity, user)?.is_success()),
    }
}

/// Runs `op` as `user`. A collaborator error counts as "not permitted".
pub fn execute_as(service: &dyn EntityService, op: EntityOp, entity: &EntityRef, user: &str) -> bool {
    match permitted(service, op, entity, user) {
        Ok(permitted) => {
            info!(%op, entity = %entity.name, user, permitted, "entity operation");
            permitted
        }
        Err(e) => {
            warn!(%op, entity = %entity.name, user, error = %format!("{e:#}"), "entity operation failed");
            false
        }
    }
}
