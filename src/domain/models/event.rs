//! Supervisor event envelope and inbox row model.
//!
//! Events about task progress reach the supervisor through two independent
//! channels: a push notification path and a durable polling fallback reading
//! the audit log. `event_id` is the deduplication key across both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which ingestion channel produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    /// Arrived through the push notification path
    EventBus,
    /// Recovered from the audit log by the poller
    Polling,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EventBus => "eventbus",
            Self::Polling => "polling",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "eventbus" => Some(Self::EventBus),
            "polling" => Some(Self::Polling),
            _ => None,
        }
    }
}

/// Event types produced on the verdict path carry this prefix; the processor
/// logs them instead of routing them through policies.
pub const GUARDIAN_EVENT_PREFIX: &str = "guardian.";

/// An event about task progress, constructible from either a push
/// notification or a polled audit row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupervisorEvent {
    /// Deduplication key across both ingestion paths
    pub event_id: String,
    /// Which channel produced this instance
    pub source: EventSource,
    /// Related task, if any
    pub task_id: Option<Uuid>,
    /// Dispatch key for the policy router
    pub event_type: String,
    /// When the underlying fact occurred
    pub ts: DateTime<Utc>,
    /// Open structured payload
    pub payload: serde_json::Value,
}

impl SupervisorEvent {
    /// Build an event from an external push notification.
    pub fn from_push(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        task_id: Option<Uuid>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            source: EventSource::EventBus,
            task_id,
            event_type: event_type.into(),
            ts: Utc::now(),
            payload,
        }
    }

    /// Build an event from a polled audit log row. The id is derived from the
    /// source rowid so both ingestion paths dedupe on the same key.
    pub fn from_audit_row(
        audit_rowid: i64,
        task_id: Uuid,
        event_type: impl Into<String>,
        ts: DateTime<Utc>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: format!("audit-{audit_rowid}"),
            source: EventSource::Polling,
            task_id: Some(task_id),
            event_type: event_type.into(),
            ts,
            payload,
        }
    }

    /// Whether this event belongs to the guardian verdict path.
    pub fn is_guardian_event(&self) -> bool {
        self.event_type.starts_with(GUARDIAN_EVENT_PREFIX)
    }
}

/// Lifecycle status of a persisted inbox row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InboxStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl InboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A persisted inbox row: the event plus its work-queue bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboxEntry {
    pub event: SupervisorEvent,
    pub status: InboxStatus,
    pub retry_count: u32,
    pub received_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

/// High-water mark recording how far the poller has consumed a source log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub source_table: String,
    pub last_seen_id: i64,
    pub updated_at: DateTime<Utc>,
}
