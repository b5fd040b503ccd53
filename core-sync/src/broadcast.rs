//! # Device Change Broadcast Rules
//!
//! Decides whether an incoming cross-device change should be applied
//! locally.
//!
//! ## Overview
//!
//! Every outgoing change carries a fresh one-shot correlation token. When a
//! change comes back around through the backend's fan-out, the token match
//! identifies it as this device's own echo and it is dropped; the token is
//! consumed by that match, so a later change reusing the same document still
//! applies. Independently, last-write-wins staleness drops changes strictly
//! older than the local copy.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

/// Type-safe device identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(Uuid);

impl DeviceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One document change travelling between devices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEnvelope {
    /// One-shot correlation token identifying the originating send
    pub token: Uuid,
    pub collection: String,
    pub document_id: String,
    pub data: Value,
    pub modified_at: DateTime<Utc>,
    pub origin_device: DeviceId,
}

/// What to do with an incoming change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyDecision {
    /// Apply the change locally
    Apply,
    /// This device's own change echoed back; drop it
    SelfEcho,
    /// Strictly older than the local copy; drop it
    Stale,
}

/// Per-process originator of outgoing changes and gatekeeper for incoming ones
pub struct ChangeBroadcaster {
    device_id: DeviceId,
    last_token: Mutex<Option<Uuid>>,
}

impl ChangeBroadcaster {
    pub fn new() -> Self {
        Self {
            device_id: DeviceId::new(),
            last_token: Mutex::new(None),
        }
    }

    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    /// Wrap an outgoing change in an envelope with a fresh token.
    ///
    /// The token replaces any previously recorded one; only the most recent
    /// send is echo-protected.
    pub fn originate(
        &self,
        collection: &str,
        document_id: &str,
        data: Value,
        modified_at: DateTime<Utc>,
    ) -> ChangeEnvelope {
        let token = Uuid::new_v4();
        {
            let mut last = self.last_token.lock().unwrap();
            *last = Some(token);
        }
        ChangeEnvelope {
            token,
            collection: collection.to_string(),
            document_id: document_id.to_string(),
            data,
            modified_at,
            origin_device: self.device_id,
        }
    }

    /// Decide whether an incoming change applies locally.
    ///
    /// `local_modified_at` is the modification instant of the local copy, if
    /// any. Self-echo wins over staleness; a matching token is consumed.
    pub fn evaluate(
        &self,
        incoming: &ChangeEnvelope,
        local_modified_at: Option<DateTime<Utc>>,
    ) -> ApplyDecision {
        {
            let mut last = self.last_token.lock().unwrap();
            if *last == Some(incoming.token) {
                *last = None;
                debug!(
                    document_id = %incoming.document_id,
                    "Dropping self-echoed change"
                );
                return ApplyDecision::SelfEcho;
            }
        }

        if let Some(local) = local_modified_at {
            if incoming.modified_at < local {
                debug!(
                    document_id = %incoming.document_id,
                    "Dropping stale incoming change"
                );
                return ApplyDecision::Stale;
            }
        }

        ApplyDecision::Apply
    }
}

impl Default for ChangeBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
