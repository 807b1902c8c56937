use serde::{Deserialize, Serialize};

/// Process-wide recognition counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Completed finalizations and file recognitions
    pub total_requests: u64,

    /// Sessions currently registered
    pub active_sessions: usize,
}
