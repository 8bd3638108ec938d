use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Free-form result payload reported by a step.
pub type RawResult = Map<String, Value>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HostStats {
    pub ok: u64,
    pub changed: u64,
    pub unreachable: u64,
    pub failures: u64,
    pub skipped: u64,
    pub rescued: u64,
    pub ignored: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    RunStart,
    PhaseStart {
        phase_name: String,
    },
    StepStart {
        step_name: String,
    },
    StepOk {
        host: String,
        step_name: String,
        changed: Option<bool>,
        result: RawResult,
    },
    StepFailed {
        host: String,
        step_name: String,
        ignore_errors: bool,
        result: RawResult,
    },
    StepSkipped {
        host: String,
        step_name: String,
    },
    HostUnreachable {
        host: String,
        step_name: String,
        result: RawResult,
    },
    RunStats {
        per_host_summary: HashMap<String, HostStats>,
    },
}

impl LifecycleEvent {
    /// The `event_type` tag stamped on the document built from this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RunStart => "playbook_start",
            Self::PhaseStart { .. } => "play_start",
            Self::StepStart { .. } => "task_start",
            Self::StepOk { .. } => "task_ok",
            Self::StepFailed { .. } => "task_failed",
            Self::StepSkipped { .. } => "task_skipped",
            Self::HostUnreachable { .. } => "host_unreachable",
            Self::RunStats { .. } => "playbook_stats",
        }
    }
}
