//! Poll outcome metrics for the listener client.

use std::fmt;
use std::sync::Arc;

use argus::metrics::{Counter, NullMetric};

/// Metric name for the poll counter.
pub const POLLS_METRIC: &str = "polls_total";

/// Label key for the poll outcome.
pub const OUTCOME_LABEL: &str = "outcome";

/// Outcome value for polls whose fetch succeeded.
pub const OUTCOME_SUCCESS: &str = "success";

/// Outcome value for polls whose fetch failed.
pub const OUTCOME_FAILURE: &str = "failure";

/// The instruments the listener client emits through.
#[derive(Clone)]
pub struct PollMeasures {
    /// Counter of poll attempts, labeled by outcome.
    pub polls: Arc<dyn Counter>,
}

impl PollMeasures {
    /// Wraps a poll counter.
    pub fn new(polls: Arc<dyn Counter>) -> Self {
        Self { polls }
    }

    /// A bundle where the counter is a no-op.
    pub fn disabled() -> Self {
        Self::new(Arc::new(NullMetric))
    }
}

impl fmt::Debug for PollMeasures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollMeasures").finish_non_exhaustive()
    }
}
