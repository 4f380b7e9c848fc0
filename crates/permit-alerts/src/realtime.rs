//! Realtime channel messages and reconnect policy.
//!
//! The socket itself belongs to the host application. This module decodes
//! what arrives on it, decides which messages should trigger an alert
//! refresh, and tracks reconnect attempts with capped exponential backoff.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Message pushed by the realtime endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeMessage {
    ProjectUpdate {
        #[serde(default)]
        action: Option<String>,
        #[serde(default)]
        data: Option<Value>,
    },
    ApplicationUpdate {
        #[serde(default)]
        action: Option<String>,
        #[serde(default)]
        data: Option<Value>,
    },
    DashboardRefresh,
    Notification {
        #[serde(default)]
        data: Option<Value>,
    },
    ConnectionStatus {
        #[serde(default)]
        message: Option<String>,
    },
    Pong,
    Error {
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl RealtimeMessage {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Refresh signal carried by this message, if any.
    #[must_use]
    pub const fn refresh_signal(&self) -> Option<RefreshSignal> {
        match self {
            Self::ProjectUpdate { .. } => Some(RefreshSignal::ProjectUpdate),
            Self::ApplicationUpdate { .. } => Some(RefreshSignal::ApplicationUpdate),
            Self::DashboardRefresh => Some(RefreshSignal::DashboardRefresh),
            Self::Notification { .. }
            | Self::ConnectionStatus { .. }
            | Self::Pong
            | Self::Error { .. }
            | Self::Unknown => None,
        }
    }
}

/// Why a refresh was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshSignal {
    Timer,
    Manual,
    ProjectUpdate,
    ApplicationUpdate,
    DashboardRefresh,
}

/// Decode a raw realtime frame into a refresh signal.
///
/// Undecodable frames are logged and ignored.
#[must_use]
pub fn signal_from_frame(raw: &str) -> Option<RefreshSignal> {
    match RealtimeMessage::parse(raw) {
        Ok(RealtimeMessage::Error { message }) => {
            warn!(message = ?message, "Realtime endpoint reported an error");
            None
        }
        Ok(message) => message.refresh_signal(),
        Err(e) => {
            debug!(error = %e, "Ignoring undecodable realtime frame");
            None
        }
    }
}

/// Capped exponential backoff with a fixed attempt budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectPolicy {
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_base_delay_ms() -> u64 {
    3_000
}
fn default_max_delay_ms() -> u64 {
    60_000
}
fn default_max_attempts() -> u32 {
    5
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (0-based), or `None` once the
    /// budget is spent.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let millis = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Some(Duration::from_millis(millis))
    }
}

/// Connection state as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Open,
    Reconnecting { attempt: u32, delay: Duration },
    /// Attempts exhausted; the host should stop reconnecting and fall back
    /// to polling.
    Failed { reason: String },
}

/// Applies a [`ReconnectPolicy`] to open/close events.
#[derive(Debug, Clone)]
pub struct ReconnectTracker {
    policy: ReconnectPolicy,
    attempts: u32,
    state: ConnectionState,
}

impl ReconnectTracker {
    #[must_use]
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            state: ConnectionState::Disconnected,
        }
    }

    #[must_use]
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn on_open(&mut self) {
        self.attempts = 0;
        self.state = ConnectionState::Open;
    }

    /// Record a close. Returns the delay before the next attempt, or `None`
    /// when the close was clean or the attempt budget is exhausted.
    pub fn on_close(&mut self, clean: bool) -> Option<Duration> {
        if clean {
            self.state = ConnectionState::Disconnected;
            return None;
        }
        if let Some(delay) = self.policy.delay_for(self.attempts) {
            self.attempts += 1;
            self.state = ConnectionState::Reconnecting {
                attempt: self.attempts,
                delay,
            };
            Some(delay)
        } else {
            warn!(
                attempts = self.attempts,
                "Realtime reconnect attempts exhausted"
            );
            self.state = ConnectionState::Failed {
                reason: "Maximum reconnection attempts reached".to_string(),
            };
            None
        }
    }
}
