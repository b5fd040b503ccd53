//! # Queue Item Model
//!
//! Types describing one pending unit of offline work: what to do, where it
//! goes, how urgent it is, and how its retry budget stands.
//!
//! ## Overview
//!
//! A [`QueueItem`] is created at enqueue time and lives in the operation
//! queue until it reaches a terminal state and is cleared. Items serialize
//! to JSON for crash recovery through the host's collection store; the
//! `as_str`/`FromStr` pairs on the enums keep the persisted representation
//! stable across releases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Result, SyncError};

/// Type-safe queued operation identifier.
///
/// Backed by a UUIDv7 so the identifier embeds its creation instant for
/// debugging. Queue ordering never derives from the ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(Uuid);

impl OperationId {
    /// Create a new random operation ID
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse an operation ID from a string
    pub fn from_string(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| SyncError::OperationNotFound {
                operation_id: s.to_string(),
            })
    }

    /// Get the string representation
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a queued operation does to its target collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Create a new document
    Create,
    /// Update an existing document
    Update,
    /// Delete a document
    Delete,
    /// Full synchronization request
    Sync,
    /// Caller-defined operation
    Custom,
}

impl OperationKind {
    /// Convert kind to its persisted string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Sync => "sync",
            Self::Custom => "custom",
        }
    }
}

impl std::str::FromStr for OperationKind {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "sync" => Ok(Self::Sync),
            "custom" => Ok(Self::Custom),
            _ => Err(SyncError::InvalidKind(s.to_string())),
        }
    }
}

/// Scheduling priority; lower numeral is served first
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Must go out as soon as possible (e.g. missed-dose alerts)
    Critical = 1,
    /// Important user-visible changes
    High = 2,
    /// Regular changes
    #[default]
    Normal = 3,
    /// Background housekeeping
    Low = 4,
}

impl Priority {
    /// Convert priority to its numeric representation
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// Parse priority from its numeric representation
    pub fn from_i32(i: i32) -> Result<Self> {
        match i {
            1 => Ok(Self::Critical),
            2 => Ok(Self::High),
            3 => Ok(Self::Normal),
            4 => Ok(Self::Low),
            _ => Err(SyncError::InvalidPriority(i)),
        }
    }

    /// Convert priority to its persisted string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
        }
    }
}

/// Queued operation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    /// Waiting for its first attempt
    Pending,
    /// Attempt currently in flight
    Processing,
    /// Handler succeeded; terminal
    Completed,
    /// Last attempt failed; eligible for retry
    Failed,
    /// Retry budget exhausted; terminal
    Discarded,
}

impl OperationStatus {
    /// Convert status to its persisted string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Discarded => "discarded",
        }
    }

    /// Check if status is terminal (only `reprocess` leaves a terminal state)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Discarded)
    }

    /// Check if status makes the item a processing candidate
    pub fn is_ready_candidate(&self) -> bool {
        matches!(self, Self::Pending | Self::Failed)
    }
}

impl std::str::FromStr for OperationStatus {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "discarded" => Ok(Self::Discarded),
            _ => Err(SyncError::InvalidStatus(s.to_string())),
        }
    }
}

/// One pending unit of offline work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    /// Unique identifier
    pub id: OperationId,
    /// What this operation does
    pub kind: OperationKind,
    /// Logical destination collection (e.g. "medications")
    pub collection: String,
    /// Target document ID, if the operation concerns an existing document
    pub target_id: Option<String>,
    /// Opaque operation payload; the core never interprets it
    pub payload: Value,
    /// Scheduling priority
    pub priority: Priority,
    /// Current status
    pub status: OperationStatus,
    /// Failed attempts so far
    pub retry_count: u32,
    /// Retry budget
    pub max_retries: u32,
    /// Earliest instant the next attempt may run; `None` means immediately
    pub next_eligible_at: Option<DateTime<Utc>>,
    /// When the item was admitted
    pub created_at: DateTime<Utc>,
    /// When the most recent attempt finished
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Stringified error from the most recent failed attempt
    pub last_error: Option<String>,
    /// Authenticated owner the item was admitted under
    pub owner_id: String,
    /// Opaque caller annotations
    pub metadata: Option<Value>,
}

impl QueueItem {
    /// Check if the retry budget still allows another attempt
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Check if the item is ready at `now`: a processing candidate whose
    /// eligibility instant is unset or past.
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        self.status.is_ready_candidate()
            && self.next_eligible_at.map_or(true, |at| at <= now)
    }
}

/// Optional knobs accepted at enqueue time
#[derive(Debug, Clone, Default)]
pub struct EnqueueOptions {
    /// Target document ID
    pub target_id: Option<String>,
    /// Scheduling priority (defaults to [`Priority::Normal`])
    pub priority: Option<Priority>,
    /// Retry budget override
    pub max_retries: Option<u32>,
    /// Opaque caller annotations
    pub metadata: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(priority: Priority) -> QueueItem {
        QueueItem {
            id: OperationId::new(),
            kind: OperationKind::Update,
            collection: "medications".to_string(),
            target_id: Some("med-1".to_string()),
            payload: json!({"dose_mg": 20}),
            priority,
            status: OperationStatus::Pending,
            retry_count: 0,
            max_retries: 3,
            next_eligible_at: None,
            created_at: Utc::now(),
            last_attempt_at: None,
            last_error: None,
            owner_id: "patient-1".to_string(),
            metadata: None,
        }
    }

    #[test]
    fn test_operation_id_round_trip() {
        let id = OperationId::new();
        let parsed = OperationId::from_string(&id.as_str()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_operation_status_strings() {
        assert_eq!(OperationStatus::Pending.as_str(), "pending");
        assert_eq!(
            "discarded".parse::<OperationStatus>().unwrap(),
            OperationStatus::Discarded
        );
        assert!("paused".parse::<OperationStatus>().is_err());
        assert!(OperationStatus::Completed.is_terminal());
        assert!(OperationStatus::Discarded.is_terminal());
        assert!(!OperationStatus::Failed.is_terminal());
    }

    #[test]
    fn test_operation_kind_strings() {
        assert_eq!(OperationKind::Sync.as_str(), "sync");
        assert_eq!(
            "custom".parse::<OperationKind>().unwrap(),
            OperationKind::Custom
        );
        assert!("upsert".parse::<OperationKind>().is_err());
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Critical < Priority::High);
        assert!(Priority::High < Priority::Normal);
        assert!(Priority::Normal < Priority::Low);
        assert_eq!(Priority::Critical.as_i32(), 1);
        assert_eq!(Priority::from_i32(4).unwrap(), Priority::Low);
        assert!(Priority::from_i32(0).is_err());
    }

    #[test]
    fn test_readiness() {
        let now = Utc::now();

        let mut pending = item(Priority::Normal);
        assert!(pending.is_ready(now));

        pending.next_eligible_at = Some(now + chrono::Duration::seconds(30));
        assert!(!pending.is_ready(now));

        pending.next_eligible_at = Some(now - chrono::Duration::seconds(1));
        assert!(pending.is_ready(now));

        pending.status = OperationStatus::Completed;
        assert!(!pending.is_ready(now));
    }

    #[test]
    fn test_retry_budget() {
        let mut i = item(Priority::High);
        assert!(i.can_retry());
        i.retry_count = 3;
        assert!(!i.can_retry());
    }

    #[test]
    fn test_item_serialization_round_trip() {
        let original = item(Priority::Critical);
        let value = serde_json::to_value(&original).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["priority"], "critical");
        assert_eq!(value["kind"], "update");

        let restored: QueueItem = serde_json::from_value(value).unwrap();
        assert_eq!(restored.id, original.id);
        assert_eq!(restored.priority, original.priority);
        assert_eq!(restored.payload, original.payload);
    }
}
