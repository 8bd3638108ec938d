use chrono::{DateTime, Utc};
use serde::Serialize;

/// Identity of one run, fixed when the run starts.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunContext {
    pub run_id: String,
    pub run_name: String,
    pub start_time: DateTime<Utc>,
    pub host_identity: String,
}

impl RunContext {
    pub fn start(run_name: &str, host_identity: &str, now: DateTime<Utc>) -> Self {
        let run_id = format!("{}-{}", host_identity, now.format("%Y%m%d%H%M%S"));
        Self {
            run_id,
            run_name: run_name.to_string(),
            start_time: now,
            host_identity: host_identity.to_string(),
        }
    }
}
