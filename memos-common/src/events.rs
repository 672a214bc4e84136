//! Job event types
//!
//! Engines report progress as [`Notification`]s through a synchronous callback.
//! The control plane stamps each notification with a per-job sequence number and
//! a timestamp, turning it into a [`JobEvent`] that is logged and fanned out to
//! live subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Kind of a job event
///
/// Serialized in lowercase; also used as the SSE `event:` name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Engine began work; `data.total` carries the record count
    Started,
    /// Per-record progress; `data` carries `current` / `total`
    Progress,
    /// Informational message (skipped resources, phase changes)
    Log,
    /// One record was sent or deleted
    Success,
    /// The job failed; appended by the runner
    Error,
    /// The job completed; appended by the runner with the result summary
    Finished,
}

impl EventKind {
    /// Wire name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Started => "started",
            EventKind::Progress => "progress",
            EventKind::Log => "log",
            EventKind::Success => "success",
            EventKind::Error => "error",
            EventKind::Finished => "finished",
        }
    }

    /// Whether this kind ends a job's event sequence
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventKind::Error | EventKind::Finished)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress notification emitted by an engine while it runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Notification {
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
        }
    }

    /// Attach a structured payload
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn started(message: impl Into<String>, total: usize) -> Self {
        Self::new(EventKind::Started, message).with_data(json!({ "total": total }))
    }

    pub fn progress(message: impl Into<String>, current: usize, total: usize) -> Self {
        Self::new(EventKind::Progress, message)
            .with_data(json!({ "current": current, "total": total }))
    }

    pub fn log(message: impl Into<String>) -> Self {
        Self::new(EventKind::Log, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(EventKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(EventKind::Error, message)
    }

    pub fn finished(message: impl Into<String>, summary: Value) -> Self {
        Self::new(EventKind::Finished, message).with_data(summary)
    }
}

/// Immutable event record in a job's log
///
/// `seq` starts at 1 and increases by one per appended event, so it doubles as
/// the event's identity for subscribers that reconnect and see a replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEvent {
    pub seq: u64,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl JobEvent {
    /// Stamp a notification with its sequence number and append time
    pub fn stamp(seq: u64, notification: Notification) -> Self {
        Self {
            seq,
            kind: notification.kind,
            message: notification.message,
            data: notification.data,
            timestamp: crate::time::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&EventKind::Progress).unwrap(),
            "\"progress\""
        );
        assert_eq!(EventKind::Finished.as_str(), "finished");
        assert_eq!(EventKind::Log.to_string(), "log");
    }

    #[test]
    fn test_terminal_kinds() {
        assert!(EventKind::Finished.is_terminal());
        assert!(EventKind::Error.is_terminal());
        assert!(!EventKind::Started.is_terminal());
        assert!(!EventKind::Success.is_terminal());
    }

    #[test]
    fn test_progress_notification_carries_counters() {
        let n = Notification::progress("Sending memo 2/5", 2, 5);
        assert_eq!(n.kind, EventKind::Progress);
        assert_eq!(n.data, Some(json!({ "current": 2, "total": 5 })));
    }

    #[test]
    fn test_job_event_serializes_type_field() {
        let event = JobEvent::stamp(3, Notification::log("Uploading resources"));
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["seq"], 3);
        assert_eq!(value["type"], "log");
        assert_eq!(value["message"], "Uploading resources");
        // Absent payloads are omitted, not null
        assert!(value.get("data").is_none());
        assert!(value["timestamp"].is_string());
    }
}
