use crate::error::{RelayError, Result};
use crate::models::{HostStats, LifecycleEvent, RawResult};
use serde::Deserialize;
use std::collections::HashMap;

/// One line of the newline-delimited event stream read by the binary.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InboundEvent {
    PlaybookStart {
        playbook: String,
    },
    PlayStart {
        play: String,
    },
    TaskStart {
        task: String,
    },
    TaskOk {
        host: String,
        task: String,
        changed: Option<bool>,
        #[serde(default)]
        result: RawResult,
    },
    TaskFailed {
        host: String,
        task: String,
        #[serde(default)]
        ignore_errors: bool,
        #[serde(default)]
        result: RawResult,
    },
    TaskSkipped {
        host: String,
        task: String,
    },
    HostUnreachable {
        host: String,
        task: String,
        #[serde(default)]
        result: RawResult,
    },
    PlaybookStats {
        summary: HashMap<String, HostStats>,
    },
}

impl InboundEvent {
    pub fn parse(line: &str) -> Result<Self> {
        serde_json::from_str(line).map_err(|e| RelayError::InvalidEvent(e.to_string()))
    }

    /// Run name carried by a start-of-run event.
    pub fn run_name(&self) -> Option<&str> {
        match self {
            Self::PlaybookStart { playbook } => Some(playbook.as_str()),
            _ => None,
        }
    }
}

impl From<InboundEvent> for LifecycleEvent {
    fn from(event: InboundEvent) -> Self {
        match event {
            InboundEvent::PlaybookStart { .. } => LifecycleEvent::RunStart,
            InboundEvent::PlayStart { play } => LifecycleEvent::PhaseStart { phase_name: play },
            InboundEvent::TaskStart { task } => LifecycleEvent::StepStart { step_name: task },
            InboundEvent::TaskOk {
                host,
                task,
                changed,
                result,
            } => LifecycleEvent::StepOk {
                host,
                step_name: task,
                changed,
                result,
            },
            InboundEvent::TaskFailed {
                host,
                task,
                ignore_errors,
                result,
            } => LifecycleEvent::StepFailed {
                host,
                step_name: task,
                ignore_errors,
                result,
            },
            InboundEvent::TaskSkipped { host, task } => LifecycleEvent::StepSkipped {
                host,
                step_name: task,
            },
            InboundEvent::HostUnreachable { host, task, result } => {
                LifecycleEvent::HostUnreachable {
                    host,
                    step_name: task,
                    result,
                }
            }
            InboundEvent::PlaybookStats { summary } => LifecycleEvent::RunStats {
                per_host_summary: summary,
            },
        }
    }
}
