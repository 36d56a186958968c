use crate::{CoreError, EntityKind, JobId};

/// Scheduler-side filter selecting the bundles generated for one pipeline entity.
pub fn bundle_filter(prefix: &str, kind: EntityKind, name: &str) -> String {
    format!("name={}_{}_{}", prefix, kind.as_str(), name)
}

/// Most recently submitted id. Ties keep the first one seen.
pub fn max_by_sequence(ids: &[JobId]) -> Result<Option<&JobId>, CoreError> {
    pick_by_sequence(ids, |candidate, best| candidate > best)
}

/// Oldest submitted id. Ties keep the first one seen.
pub fn min_by_sequence(ids: &[JobId]) -> Result<Option<&JobId>, CoreError> {
    pick_by_sequence(ids, |candidate, best| candidate < best)
}

/// Ids ordered oldest first. Stable for equal sequence numbers.
pub fn sort_by_sequence(ids: &[JobId]) -> Result<Vec<JobId>, CoreError> {
    let mut keyed = ids
        .iter()
        .map(|id| id.sequence().map(|seq| (seq, id.clone())))
        .collect::<Result<Vec<_>, _>>()?;
    keyed.sort_by_key(|(seq, _)| *seq);
    Ok(keyed.into_iter().map(|(_, id)| id).collect())
}

fn pick_by_sequence(ids: &[JobId], better: impl Fn(u64, u64) -> bool) -> Result<Option<&JobId>, CoreError> {
    let mut best: Option<(u64, &JobId)> = None;
    for id in ids {
        let seq = id.sequence()?;
        match best {
            Some((best_seq, _)) if !better(seq, best_seq) => {}
            _ => best = Some((seq, id)),
        }
    }
    Ok(best.map(|(_, id)| id))
}
