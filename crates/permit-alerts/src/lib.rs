//! Deadline alerts for construction permit projects.
//!
//! This crate derives prioritized alerts from project records: upcoming and
//! overdue inspections, stalled permit approvals, late settlements, missing
//! documents and records nobody has touched in a while. Alerts are
//! aggregated across the portfolio, ordered by severity and can be dismissed
//! for the rest of a session.
//!
//! # Usage
//!
//! ```no_run
//! use permit_alerts::{AlertBoard, AlertMonitor, MonitorConfig};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! // Configure from environment variables
//! let config = MonitorConfig::from_env()?;
//! let board = Arc::new(AlertBoard::from_config(&config)?);
//!
//! // Refresh hourly in the background
//! let monitor = AlertMonitor::new(board.clone(), config.refresh_interval()).spawn();
//!
//! for alert in board.alerts().await {
//!     println!("[{}] {}: {}", alert.severity, alert.title, alert.message);
//! }
//!
//! monitor.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`DeadlineRule`] implementations each check one policy against a
//!   [`ProjectSnapshot`]
//! - [`Evaluator`] runs the rule set for one project at an injected instant
//! - [`aggregate`] evaluates every project, removes dismissed and duplicate
//!   alerts and sorts by severity
//! - [`ProjectSource`] supplies projects from the REST API, Supabase or a file
//! - [`AlertBoard`] holds the current alerts and dismissals;
//!   [`AlertMonitor`] refreshes it on a timer and on realtime signals

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregator;
pub mod alert;
pub mod board;
pub mod clock;
pub mod config;
pub mod dates;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod monitor;
pub mod realtime;
pub mod rules;
pub mod source;

pub use aggregator::{aggregate, sort_by_severity, AlertSummary, DismissedSet};
pub use alert::{AlertCategory, AlertId, AlertKind, AlertRecord, ProjectRef, Severity};
pub use board::{AlertBoard, RefreshOutcome};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{MonitorConfig, SourceConfig};
pub use error::{ConfigError, SourceError};
pub use evaluator::Evaluator;
pub use model::{
    Application, ApplicationStatus, Checkpoint, Financial, ProjectSnapshot, ProjectStatus,
    RequiredDocument, Schedule,
};
pub use monitor::{AlertMonitor, MonitorHandle};
pub use realtime::{ReconnectPolicy, ReconnectTracker, RefreshSignal};
pub use rules::{default_rules, DeadlineRule, RuleContext, RuleThresholds};
pub use source::{
    FileProjectSource, ProjectSource, RestProjectSource, StaticProjectSource,
    SupabaseProjectSource,
};
