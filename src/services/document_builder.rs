use crate::error::{RelayError, Result};
use crate::models::{HostStats, LifecycleEvent, LogDocument, RawResult, RunContext, format_timestamp};
use crate::services::sanitizer::sanitize;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use std::collections::HashMap;

pub const DEFAULT_FAILED_MESSAGE: &str = "Unknown error";
pub const DEFAULT_UNREACHABLE_MESSAGE: &str = "Host unreachable";

/// Maps lifecycle events onto log documents. Performs no I/O.
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    log_task_results: bool,
}

impl DocumentBuilder {
    pub fn new(log_task_results: bool) -> Self {
        Self { log_task_results }
    }

    pub fn build(
        &self,
        ctx: Option<&RunContext>,
        event: &LifecycleEvent,
        now: DateTime<Utc>,
    ) -> Result<LogDocument> {
        let ctx = ctx.ok_or(RelayError::UninitializedContext)?;

        let timestamp = match event {
            LifecycleEvent::RunStart => ctx.start_time,
            _ => now,
        };
        let mut doc = Self::base_document(ctx, event, timestamp);

        match event {
            LifecycleEvent::RunStart => {
                doc.insert("status", "started");
            }
            LifecycleEvent::PhaseStart { phase_name } => {
                doc.insert("play", phase_name.as_str());
            }
            LifecycleEvent::StepStart { step_name } => {
                doc.insert("task", step_name.as_str());
            }
            LifecycleEvent::StepOk {
                host,
                step_name,
                changed,
                result,
            } => {
                doc.insert("host", host.as_str());
                doc.insert("task", step_name.as_str());
                doc.insert("status", "success");
                let changed = changed
                    .map(Value::Bool)
                    .or_else(|| result.get("changed").cloned())
                    .unwrap_or(Value::Bool(false));
                doc.insert("changed", changed);
                self.attach_result(&mut doc, result);
            }
            LifecycleEvent::StepFailed {
                host,
                step_name,
                ignore_errors,
                result,
            } => {
                doc.insert("host", host.as_str());
                doc.insert("task", step_name.as_str());
                doc.insert("status", "failed");
                doc.insert("ignore_errors", *ignore_errors);
                doc.insert(
                    "error_message",
                    error_message(result, DEFAULT_FAILED_MESSAGE),
                );
                self.attach_result(&mut doc, result);
            }
            LifecycleEvent::StepSkipped { host, step_name } => {
                doc.insert("host", host.as_str());
                doc.insert("task", step_name.as_str());
                doc.insert("status", "skipped");
            }
            LifecycleEvent::HostUnreachable {
                host,
                step_name,
                result,
            } => {
                doc.insert("host", host.as_str());
                doc.insert("task", step_name.as_str());
                doc.insert("status", "unreachable");
                doc.insert(
                    "error_message",
                    error_message(result, DEFAULT_UNREACHABLE_MESSAGE),
                );
            }
            LifecycleEvent::RunStats { per_host_summary } => {
                doc.insert("status", "completed");
                doc.insert("start_time", format_timestamp(ctx.start_time));
                doc.insert("end_time", format_timestamp(now));
                doc.insert("duration_seconds", duration_seconds(ctx.start_time, now));
                doc.insert("summary", summarize(per_host_summary));
            }
        }

        Ok(doc)
    }

    fn base_document(
        ctx: &RunContext,
        event: &LifecycleEvent,
        timestamp: DateTime<Utc>,
    ) -> LogDocument {
        let mut doc = LogDocument::new();
        doc.insert("@timestamp", format_timestamp(timestamp));
        doc.insert("event_type", event.event_type());
        doc.insert("playbook_id", ctx.run_id.as_str());
        doc.insert("playbook", ctx.run_name.as_str());
        doc.insert("hostname", ctx.host_identity.as_str());
        doc
    }

    fn attach_result(&self, doc: &mut LogDocument, result: &RawResult) {
        if self.log_task_results {
            doc.insert("result", sanitize(result));
        }
    }
}

fn error_message(result: &RawResult, default: &str) -> Value {
    result
        .get("msg")
        .cloned()
        .unwrap_or_else(|| Value::from(default))
}

pub fn duration_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let elapsed = end - start;
    match elapsed.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => elapsed.num_milliseconds() as f64 / 1_000.0,
    }
}

fn summarize(per_host_summary: &HashMap<String, HostStats>) -> Map<String, Value> {
    let mut hosts: Vec<&String> = per_host_summary.keys().collect();
    hosts.sort();

    let mut summary = Map::new();
    for host in hosts {
        let s = &per_host_summary[host];
        summary.insert(
            host.clone(),
            json!({
                "ok": s.ok,
                "changed": s.changed,
                "unreachable": s.unreachable,
                "failures": s.failures,
                "skipped": s.skipped,
                "rescued": s.rescued,
                "ignored": s.ignored,
            }),
        );
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sanitizer::TRUNCATION_MARKER;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn ctx() -> RunContext {
        RunContext::start("deploy.yml", "workerA", t0())
    }

    fn raw(value: Value) -> RawResult {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn stats(ok: u64) -> HostStats {
        HostStats {
            ok,
            changed: 1,
            ..HostStats::default()
        }
    }

    #[test]
    fn building_without_context_fails() {
        let builder = DocumentBuilder::new(true);
        let err = builder
            .build(None, &LifecycleEvent::RunStart, t0())
            .unwrap_err();
        assert!(matches!(err, RelayError::UninitializedContext));
    }

    #[test]
    fn run_start_document() {
        let ctx = ctx();
        let later = t0() + Duration::seconds(3);
        let doc = DocumentBuilder::new(true)
            .build(Some(&ctx), &LifecycleEvent::RunStart, later)
            .unwrap();

        assert_eq!(doc.event_type(), Some("playbook_start"));
        assert_eq!(doc.get("status"), Some(&json!("started")));
        assert_eq!(doc.get("playbook"), Some(&json!("deploy.yml")));
        assert_eq!(doc.get("playbook_id"), Some(&json!("workerA-20240501120000")));
        assert_eq!(doc.get("hostname"), Some(&json!("workerA")));
        assert_eq!(
            doc.get("@timestamp"),
            Some(&json!("2024-05-01T12:00:00.000000Z"))
        );
    }

    #[test]
    fn every_document_carries_the_common_fields() {
        let ctx = ctx();
        let builder = DocumentBuilder::new(true);
        let events = vec![
            LifecycleEvent::RunStart,
            LifecycleEvent::PhaseStart {
                phase_name: "web".into(),
            },
            LifecycleEvent::StepStart {
                step_name: "install pkg".into(),
            },
            LifecycleEvent::StepSkipped {
                host: "h1".into(),
                step_name: "install pkg".into(),
            },
            LifecycleEvent::RunStats {
                per_host_summary: HashMap::new(),
            },
        ];

        for event in &events {
            let doc = builder.build(Some(&ctx), event, t0()).unwrap();
            for key in ["@timestamp", "event_type", "playbook_id", "playbook", "hostname"] {
                assert!(doc.get(key).is_some(), "{key} missing on {:?}", event);
            }
            assert_eq!(doc.event_type(), Some(event.event_type()));
        }
    }

    #[test]
    fn phase_and_step_start_documents() {
        let ctx = ctx();
        let builder = DocumentBuilder::new(true);

        let play = builder
            .build(
                Some(&ctx),
                &LifecycleEvent::PhaseStart {
                    phase_name: "web".into(),
                },
                t0(),
            )
            .unwrap();
        assert_eq!(play.event_type(), Some("play_start"));
        assert_eq!(play.get("play"), Some(&json!("web")));
        assert!(play.get("status").is_none());

        let task = builder
            .build(
                Some(&ctx),
                &LifecycleEvent::StepStart {
                    step_name: "install pkg".into(),
                },
                t0(),
            )
            .unwrap();
        assert_eq!(task.event_type(), Some("task_start"));
        assert_eq!(task.get("task"), Some(&json!("install pkg")));
    }

    #[test]
    fn step_ok_defaults_changed_to_false() {
        let doc = DocumentBuilder::new(true)
            .build(
                Some(&ctx()),
                &LifecycleEvent::StepOk {
                    host: "h1".into(),
                    step_name: "ping".into(),
                    changed: None,
                    result: RawResult::new(),
                },
                t0(),
            )
            .unwrap();

        assert_eq!(doc.event_type(), Some("task_ok"));
        assert_eq!(doc.get("status"), Some(&json!("success")));
        assert_eq!(doc.get("host"), Some(&json!("h1")));
        assert_eq!(doc.get("changed"), Some(&json!(false)));
    }

    #[test]
    fn step_ok_reads_changed_from_result() {
        let doc = DocumentBuilder::new(true)
            .build(
                Some(&ctx()),
                &LifecycleEvent::StepOk {
                    host: "h1".into(),
                    step_name: "copy".into(),
                    changed: None,
                    result: raw(json!({ "changed": true })),
                },
                t0(),
            )
            .unwrap();
        assert_eq!(doc.get("changed"), Some(&json!(true)));
    }

    #[test]
    fn step_ok_copies_non_bool_changed_verbatim() {
        let doc = DocumentBuilder::new(false)
            .build(
                Some(&ctx()),
                &LifecycleEvent::StepOk {
                    host: "h1".into(),
                    step_name: "command".into(),
                    changed: None,
                    result: raw(json!({ "changed": "yes" })),
                },
                t0(),
            )
            .unwrap();
        assert_eq!(doc.get("changed"), Some(&json!("yes")));
    }

    #[test]
    fn step_ok_includes_sanitized_result_when_enabled() {
        let result = raw(json!({
            "stdout": "z".repeat(6000),
            "invocation": { "module_args": {} },
        }));
        let event = LifecycleEvent::StepOk {
            host: "h1".into(),
            step_name: "shell".into(),
            changed: Some(true),
            result,
        };

        let doc = DocumentBuilder::new(true)
            .build(Some(&ctx()), &event, t0())
            .unwrap();
        let attached = doc.get("result").and_then(Value::as_object).unwrap();
        assert!(attached.get("invocation").is_none());
        let stdout = attached.get("stdout").and_then(Value::as_str).unwrap();
        assert!(stdout.ends_with(TRUNCATION_MARKER));

        let doc = DocumentBuilder::new(false)
            .build(Some(&ctx()), &event, t0())
            .unwrap();
        assert!(doc.get("result").is_none());
    }

    #[test]
    fn step_failed_defaults_error_message() {
        let doc = DocumentBuilder::new(true)
            .build(
                Some(&ctx()),
                &LifecycleEvent::StepFailed {
                    host: "h1".into(),
                    step_name: "install pkg".into(),
                    ignore_errors: false,
                    result: RawResult::new(),
                },
                t0(),
            )
            .unwrap();

        assert_eq!(doc.event_type(), Some("task_failed"));
        assert_eq!(doc.get("status"), Some(&json!("failed")));
        assert_eq!(doc.get("ignore_errors"), Some(&json!(false)));
        assert_eq!(doc.get("error_message"), Some(&json!("Unknown error")));
        assert_eq!(doc.get("result"), Some(&json!({})));
    }

    #[test]
    fn step_failed_uses_result_msg() {
        let doc = DocumentBuilder::new(false)
            .build(
                Some(&ctx()),
                &LifecycleEvent::StepFailed {
                    host: "h1".into(),
                    step_name: "install pkg".into(),
                    ignore_errors: true,
                    result: raw(json!({ "msg": "No package matching 'foo'" })),
                },
                t0(),
            )
            .unwrap();

        assert_eq!(doc.get("ignore_errors"), Some(&json!(true)));
        assert_eq!(
            doc.get("error_message"),
            Some(&json!("No package matching 'foo'"))
        );
        assert!(doc.get("result").is_none());
    }

    #[test]
    fn skipped_and_unreachable_documents() {
        let ctx = ctx();
        let builder = DocumentBuilder::new(true);

        let skipped = builder
            .build(
                Some(&ctx),
                &LifecycleEvent::StepSkipped {
                    host: "h2".into(),
                    step_name: "reboot".into(),
                },
                t0(),
            )
            .unwrap();
        assert_eq!(skipped.event_type(), Some("task_skipped"));
        assert_eq!(skipped.get("status"), Some(&json!("skipped")));

        let unreachable = builder
            .build(
                Some(&ctx),
                &LifecycleEvent::HostUnreachable {
                    host: "h3".into(),
                    step_name: "gather facts".into(),
                    result: RawResult::new(),
                },
                t0(),
            )
            .unwrap();
        assert_eq!(unreachable.event_type(), Some("host_unreachable"));
        assert_eq!(unreachable.get("status"), Some(&json!("unreachable")));
        assert_eq!(unreachable.get("host"), Some(&json!("h3")));
        assert_eq!(
            unreachable.get("error_message"),
            Some(&json!("Host unreachable"))
        );
        assert!(unreachable.get("result").is_none());
    }

    #[test]
    fn run_stats_sorts_hosts_and_reports_duration() {
        let mut per_host_summary = HashMap::new();
        per_host_summary.insert("web-2".to_string(), stats(3));
        per_host_summary.insert("h1".to_string(), stats(5));
        per_host_summary.insert("h0".to_string(), stats(4));
        per_host_summary.insert("db".to_string(), stats(1));

        let end = t0() + Duration::milliseconds(12_500);
        let doc = DocumentBuilder::new(true)
            .build(
                Some(&ctx()),
                &LifecycleEvent::RunStats { per_host_summary },
                end,
            )
            .unwrap();

        assert_eq!(doc.event_type(), Some("playbook_stats"));
        assert_eq!(doc.get("status"), Some(&json!("completed")));
        assert_eq!(
            doc.get("start_time"),
            Some(&json!("2024-05-01T12:00:00.000000Z"))
        );
        assert_eq!(
            doc.get("end_time"),
            Some(&json!("2024-05-01T12:00:12.500000Z"))
        );
        assert_eq!(doc.get("@timestamp"), doc.get("end_time"));
        assert_eq!(doc.get("duration_seconds"), Some(&json!(12.5)));

        let summary = doc.get("summary").and_then(Value::as_object).unwrap();
        let hosts: Vec<&str> = summary.keys().map(String::as_str).collect();
        assert_eq!(hosts, vec!["db", "h0", "h1", "web-2"]);
        assert_eq!(
            summary["h1"],
            json!({
                "ok": 5, "changed": 1, "unreachable": 0, "failures": 0,
                "skipped": 0, "rescued": 0, "ignored": 0
            })
        );
    }

    #[test]
    fn documents_serialize_to_json_objects() {
        let doc = DocumentBuilder::new(true)
            .build(Some(&ctx()), &LifecycleEvent::RunStart, t0())
            .unwrap();
        let text = serde_json::to_string(&doc).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert!(parsed.is_object());
        assert_eq!(parsed["event_type"], json!("playbook_start"));
    }
}
