use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long a wait may keep re-querying the scheduler: a fixed number of
/// attempts with a fixed pause between them (no pause before the first).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollBudget {
    pub attempts: u32,
    pub interval_secs: u64,
}

impl PollBudget {
    pub const fn new(attempts: u32, interval_secs: u64) -> Self {
        Self { attempts, interval_secs }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Default budgets:
/// - coordinator creation under a bundle: 60 x 2s
/// - first actions under a coordinator: 120 x 4s
/// - action reaching SUCCEEDED/KILLED/FAILED: 180 x 10s
/// - bundle reaching an expected status: 20 x 5s
/// - bundle reaching a terminal status: 30 x 20s
pub const COORDINATOR_CREATION: PollBudget = PollBudget::new(60, 2);
pub const ACTION_CREATION: PollBudget = PollBudget::new(120, 4);
pub const ACTION_TERMINAL: PollBudget = PollBudget::new(180, 10);
pub const BUNDLE_STATUS: PollBudget = PollBudget::new(20, 5);
pub const BUNDLE_OVER: PollBudget = PollBudget::new(30, 20);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_is_whole_seconds() {
        assert_eq!(COORDINATOR_CREATION.interval(), Duration::from_secs(2));
        assert_eq!(BUNDLE_OVER.interval(), Duration::from_secs(20));
    }
}
