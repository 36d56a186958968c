use std::collections::BTreeMap;

use time::OffsetDateTime;

use crate::{timefmt::format_wire_time, ActionSnapshot, ActionStatus};

/// Point-in-time view of a coordinator's instances: nominal time -> status.
///
/// The snapshot is taken by the caller before a lifecycle operation and
/// compared with fresh snapshots afterwards; it is never refreshed in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NominalTimeSnapshot {
    instances: BTreeMap<OffsetDateTime, ActionStatus>,
}

impl NominalTimeSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_actions<'a>(actions: impl IntoIterator<Item = &'a ActionSnapshot>) -> Self {
        let instances = actions.into_iter().map(|a| (a.nominal_time, a.status)).collect();
        Self { instances }
    }

    pub fn insert(&mut self, nominal_time: OffsetDateTime, status: ActionStatus) {
        self.instances.insert(nominal_time, status);
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn contains(&self, nominal_time: &OffsetDateTime) -> bool {
        self.instances.contains_key(nominal_time)
    }

    pub fn status_of(&self, nominal_time: &OffsetDateTime) -> Option<ActionStatus> {
        self.instances.get(nominal_time).copied()
    }

    pub fn nominal_times(&self) -> Vec<OffsetDateTime> {
        self.instances.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OffsetDateTime, &ActionStatus)> {
        self.instances.iter()
    }

    /// Instances present in either snapshot. On overlap `other` wins, so pass
    /// the newer snapshot second.
    pub fn union(&self, other: &NominalTimeSnapshot) -> NominalTimeSnapshot {
        let mut instances = self.instances.clone();
        instances.extend(other.instances.iter().map(|(t, s)| (*t, *s)));
        Self { instances }
    }
}

/// Prior nominal times that appear in none of the `observed` snapshots, in order.
pub fn missing_instances(prior: &[OffsetDateTime], observed: &[&NominalTimeSnapshot]) -> Vec<OffsetDateTime> {
    let mut missing: Vec<OffsetDateTime> = prior
        .iter()
        .filter(|t| !observed.iter().any(|snap| snap.contains(t)))
        .copied()
        .collect();
    missing.sort();
    missing.dedup();
    missing
}

/// Renders nominal times the way the scheduler prints them, for diagnostics.
pub fn render_times(times: &[OffsetDateTime]) -> String {
    let rendered: Vec<String> = times.iter().map(|t| format_wire_time(*t)).collect();
    format!("[{}]", rendered.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn snap(entries: &[(OffsetDateTime, ActionStatus)]) -> NominalTimeSnapshot {
        let mut s = NominalTimeSnapshot::new();
        for (t, st) in entries {
            s.insert(*t, *st);
        }
        s
    }

    #[test]
    fn union_prefers_newer_status() {
        let t1 = datetime!(2013-01-01 00:00 UTC);
        let t2 = datetime!(2013-01-01 00:05 UTC);
        let old = snap(&[(t1, ActionStatus::Running), (t2, ActionStatus::Waiting)]);
        let new = snap(&[(t2, ActionStatus::Succeeded)]);
        let merged = old.union(&new);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.status_of(&t2), Some(ActionStatus::Succeeded));
    }

    #[test]
    fn missing_checks_every_observed_snapshot() {
        let t1 = datetime!(2013-01-01 00:00 UTC);
        let t2 = datetime!(2013-01-01 00:05 UTC);
        let t3 = datetime!(2013-01-01 00:10 UTC);
        let old = snap(&[(t1, ActionStatus::Succeeded)]);
        let new = snap(&[(t3, ActionStatus::Waiting)]);
        assert_eq!(missing_instances(&[t1, t2, t3], &[&old, &new]), vec![t2]);
        assert!(missing_instances(&[t1, t3], &[&old, &new]).is_empty());
    }

    #[test]
    fn render_uses_wire_format() {
        let t = datetime!(2013-01-01 00:05 UTC);
        assert_eq!(render_times(&[t]), "[Tue, 01 Jan 2013 00:05:00 GMT]");
    }
}
