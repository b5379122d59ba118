// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client SDK for beacon product analytics.
//!
//! The tracker records a closed catalog of product events and forwards them
//! to an analytics sink. Events recorded before the sink is ready are held in
//! a bounded backlog and delivered in order once initialization succeeds.
//! Initialization retries with exponential backoff and gives up after a
//! fixed number of attempts.
//!
//! # Quick Start
//!
//! ```ignore
//! use beacon_analytics::init_mixpanel;
//!
//! #[tokio::main]
//! async fn main() {
//!     let tracker = init_mixpanel("project-token", false);
//!
//!     tracker.track_session_started(false);
//!     tracker.track_discussion_started("d-1", "career", 3);
//!     tracker.identify_user("user-42", None);
//!
//!     tracker.settled().await;
//!     tracker.flush().await;
//! }
//! ```
//!
//! # Failure Model
//!
//! Tracking never fails from the caller's point of view. Every method returns
//! `()`; sink errors, invalid payloads and backlog overflow are logged through
//! `tracing` and dropped. Set `RUST_LOG=beacon_analytics=debug` or pass
//! `debug = true` to `init` for verbose diagnostics.
//!
//! # Readiness
//!
//! | State | track | identify / reset |
//! |-------|-------|------------------|
//! | `NotReady`, `Initializing` | queued (up to capacity) | ignored with a warning |
//! | `Ready` | sent | sent |
//! | `FailedPermanently` | queued until full, never sent | ignored with a warning |

/// Logs at `info` when debug mode is on, `trace` otherwise.
macro_rules! diag {
	($enabled:expr, $($arg:tt)+) => {
		if $enabled {
			tracing::info!($($arg)+);
		} else {
			tracing::trace!($($arg)+);
		}
	};
}

pub mod backlog;
pub mod backoff;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod mixpanel;
pub mod platform;
pub mod sink;
pub mod token;
pub mod tracker;

pub use backlog::{BacklogQueue, QueuedEvent};
pub use backoff::BackoffPolicy;
pub use config::{load_token_env, ConfigError, SinkConfig, TrackerConfig};
pub use controller::{InitController, SinkState};
pub use error::{AnalyticsError, Result, SinkError};
pub use logging::{init_tracing, LogFormat};
pub use mixpanel::MixpanelSink;
pub use platform::Platform;
pub use sink::{Callback, Sink, SinkAdapter};
pub use token::SinkToken;
pub use tracker::{init_from_env, init_mixpanel, Tracker, TrackerBuilder};

pub use beacon_analytics_core::{
	AiInteracted, Category, CatalogError, DecisionAbandoned, DecisionCompleted, DiscussionStarted,
	Event, EventKind, FeedbackClicked, FeedbackSubmitted, Properties, SessionEnded, SessionStarted,
	UserIdentity,
};
