// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The public tracking entry point.
//!
//! Every method here returns `()` and never fails or panics on the caller's
//! behalf: problems are logged through `tracing` and the call becomes a
//! no-op. Tracking calls never block on the network.

use std::sync::Arc;

use beacon_analytics_core::{
	validate_user_id, AiInteracted, DecisionAbandoned, DecisionCompleted, DiscussionStarted, Event,
	EventKind, FeedbackClicked, FeedbackSubmitted, Properties, SessionEnded, SessionStarted,
	UserIdentity,
};
use chrono::{DateTime, SecondsFormat, Utc};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::backlog::QueuedEvent;
use crate::backoff::BackoffPolicy;
use crate::config::{ConfigError, SinkConfig, TrackerConfig};
use crate::controller::{InitController, SinkState};
use crate::dispatch::SinkCommand;
use crate::error::AnalyticsError;
use crate::logging::{init_tracing, LogFormat};
use crate::mixpanel::MixpanelSink;
use crate::platform::Platform;
use crate::sink::{run_callback, Callback, Sink};

/// Property holding the event's category name.
pub const EVENT_CATEGORY_PROPERTY: &str = "event_category";
/// Property holding the event's ISO-8601 timestamp.
pub const TIMESTAMP_PROPERTY: &str = "timestamp";

/// Handle to the analytics client.
///
/// Cloning is cheap; all clones share one controller, backlog and sink.
///
/// # Example
///
/// ```ignore
/// use beacon_analytics::{Tracker, MixpanelSink};
///
/// let tracker = Tracker::builder().sink(MixpanelSink::default()).build();
///
/// // Recorded before the sink is ready: held in the backlog.
/// tracker.track_session_started(false);
///
/// tracker.init("project-token", false);
/// tracker.track_feedback_submitted("great app");
/// ```
#[derive(Clone)]
pub struct Tracker {
	controller: Arc<InitController>,
}

impl Tracker {
	pub fn builder() -> TrackerBuilder {
		TrackerBuilder::new()
	}

	pub fn new(sink: Arc<dyn Sink>, config: TrackerConfig) -> Self {
		Self {
			controller: Arc::new(InitController::new(sink, &config)),
		}
	}

	/// Starts sink initialization in the background.
	///
	/// Must be called from within a tokio runtime. Only the first call has
	/// an effect. Returns the handle of the retry task.
	///
	/// With `debug` set, per-call diagnostics are raised to `INFO` and a
	/// stderr subscriber is installed through [`init_tracing`] unless the host
	/// already set a global one.
	pub fn init(&self, token: impl Into<String>, debug: bool) -> Option<JoinHandle<()>> {
		let token: String = token.into();
		self.init_with(SinkConfig::new(token, debug))
	}

	/// Like [`Tracker::init`], with an explicit sink configuration.
	pub fn init_with(&self, config: SinkConfig) -> Option<JoinHandle<()>> {
		if config.debug {
			self.controller.set_debug(true);
			init_tracing(true, LogFormat::Compact);
		}
		self.controller.start(config)
	}

	/// Records a catalog event.
	pub fn track_event(&self, event: Event) {
		self.record(event, None, None);
	}

	/// Records a catalog event and runs `callback` once it has been queued
	/// or handed to the sink, whatever the outcome.
	pub fn track_event_with_callback<F>(&self, event: Event, callback: F)
	where
		F: FnOnce() + Send + 'static,
	{
		self.record(event, None, Some(Box::new(callback)));
	}

	/// Records a catalog event with an explicit timestamp.
	pub fn track_event_at(&self, event: Event, timestamp: DateTime<Utc>) {
		self.record(event, Some(timestamp), None);
	}

	/// Records an event from dynamic properties.
	///
	/// The properties are checked against the catalog entry for `kind`; an
	/// invalid payload is logged and dropped. A `timestamp` property must be
	/// RFC 3339 and is kept as the event time.
	pub fn track(&self, kind: EventKind, mut properties: Properties) {
		let timestamp = match properties.remove(TIMESTAMP_PROPERTY) {
			None => None,
			Some(value) => match value.as_str().map(DateTime::parse_from_rfc3339) {
				Some(Ok(ts)) => Some(ts.with_timezone(&Utc)),
				_ => {
					warn!(event = %kind, timestamp = %value, "Dropped event with malformed timestamp");
					return;
				}
			},
		};

		match Event::from_properties(kind, properties) {
			Ok(event) => self.record(event, timestamp, None),
			Err(e) => {
				let err = AnalyticsError::InvalidPayload(e);
				warn!(event = %kind, error = %err, "Dropped event with invalid payload");
			}
		}
	}

	/// Associates subsequent events with `user_id`.
	///
	/// Identity calls are not queued: before the sink is ready this logs a
	/// warning and does nothing.
	pub fn identify_user(&self, user_id: &str, properties: Option<Properties>) {
		if let Err(reason) = validate_user_id(user_id) {
			warn!(reason, "Ignored identify call with invalid user id");
			return;
		}

		let identity =
			UserIdentity::new(user_id).with_properties(properties.unwrap_or_default());
		self.dispatch_when_ready("identify", SinkCommand::Identify(identity));
	}

	/// Forgets the identified user. Same readiness rule as
	/// [`Tracker::identify_user`].
	pub fn reset_user(&self) {
		self.dispatch_when_ready("reset", SinkCommand::Reset);
	}

	pub fn track_session_started(&self, is_returning_user: bool) {
		self.track_event(
			SessionStarted {
				is_returning_user,
				days_since_last_session: None,
			}
			.into(),
		);
	}

	pub fn track_session_ended(
		&self,
		session_duration_seconds: u64,
		decisions_started: u32,
		decisions_completed: u32,
	) {
		self.track_event(
			SessionEnded {
				session_duration_seconds,
				decisions_started,
				decisions_completed,
			}
			.into(),
		);
	}

	pub fn track_discussion_started(
		&self,
		decision_id: impl Into<String>,
		decision_type: impl Into<String>,
		option_count: u32,
	) {
		self.track_event(
			DiscussionStarted {
				decision_id: decision_id.into(),
				decision_type: decision_type.into(),
				option_count,
			}
			.into(),
		);
	}

	pub fn track_decision_completed(
		&self,
		decision_id: impl Into<String>,
		decision_type: impl Into<String>,
		chosen_option: impl Into<String>,
		time_to_decide_seconds: u64,
	) {
		self.track_event(
			DecisionCompleted {
				decision_id: decision_id.into(),
				decision_type: decision_type.into(),
				chosen_option: chosen_option.into(),
				time_to_decide_seconds,
			}
			.into(),
		);
	}

	pub fn track_decision_abandoned(
		&self,
		decision_id: impl Into<String>,
		last_step: impl Into<String>,
		time_spent_seconds: u64,
	) {
		self.track_event(
			DecisionAbandoned {
				decision_id: decision_id.into(),
				last_step: last_step.into(),
				time_spent_seconds,
			}
			.into(),
		);
	}

	pub fn track_ai_interaction(
		&self,
		interaction_type: impl Into<String>,
		response_time_ms: u64,
		succeeded: bool,
	) {
		self.track_event(
			AiInteracted {
				interaction_type: interaction_type.into(),
				response_time_ms,
				succeeded,
				decision_id: None,
				topics: Vec::new(),
			}
			.into(),
		);
	}

	pub fn track_feedback_clicked(&self, source: impl Into<String>) {
		self.track_event(
			FeedbackClicked {
				source: source.into(),
			}
			.into(),
		);
	}

	pub fn track_feedback_submitted(&self, feedback_text: impl Into<String>) {
		self.track_event(
			FeedbackSubmitted {
				feedback_text: feedback_text.into(),
				rating: None,
			}
			.into(),
		);
	}

	pub fn state(&self) -> SinkState {
		self.controller.state()
	}

	/// Events waiting in the backlog.
	pub fn queued_events(&self) -> usize {
		self.controller.queued_events()
	}

	pub fn is_debug(&self) -> bool {
		self.controller.is_debug()
	}

	/// Resolves once initialization has succeeded or given up.
	pub async fn settled(&self) -> SinkState {
		self.controller.settled().await
	}

	/// Waits until every call made before this one has reached the sink.
	///
	/// Returns immediately while the sink is not ready.
	pub async fn flush(&self) {
		let (ack, done) = oneshot::channel();
		let dispatched = {
			let gate = self.controller.gate();
			match gate.ready_dispatcher() {
				Some(dispatcher) => dispatcher.dispatch(SinkCommand::Flush(ack)).is_ok(),
				None => false,
			}
		};
		if dispatched {
			let _ = done.await;
		}
	}

	fn record(&self, event: Event, timestamp: Option<DateTime<Utc>>, callback: Option<Callback>) {
		let kind = event.kind();
		let properties = match enrich(event, timestamp) {
			Ok(properties) => properties,
			Err(err) => {
				warn!(event = %kind, error = %err, "Dropped event that failed to serialize");
				if let Some(callback) = callback {
					run_callback(callback);
				}
				return;
			}
		};
		let queued = QueuedEvent { kind, properties };
		let verbose = self.controller.is_debug();

		let mut gate = self.controller.gate();
		if let Some(dispatcher) = gate.ready_dispatcher() {
			diag!(verbose, event = %kind, "Tracking event");
			if let Err(source) = dispatcher.dispatch(SinkCommand::Send {
				event: queued,
				callback,
			}) {
				let err = AnalyticsError::SinkDelivery {
					operation: "send",
					source,
				};
				warn!(event = %kind, error = %err, "Failed to dispatch event");
			}
			return;
		}

		let accepted = gate.backlog.enqueue(queued);
		let queued_now = gate.backlog.size();
		let capacity = gate.backlog.capacity();
		drop(gate);

		if accepted {
			diag!(verbose, event = %kind, queued = queued_now, "Queued event until sink is ready");
		} else {
			let err = AnalyticsError::QueueCapacityExceeded { kind, capacity };
			warn!(error = %err, "Dropped event");
		}

		if let Some(callback) = callback {
			run_callback(callback);
		}
	}

	fn dispatch_when_ready(&self, operation: &'static str, command: SinkCommand) {
		let gate = self.controller.gate();
		let Some(dispatcher) = gate.ready_dispatcher() else {
			let state = gate.state;
			drop(gate);
			let err = AnalyticsError::PreconditionViolation { operation };
			warn!(error = %err, state = state.as_str(), "Ignored identity call");
			return;
		};

		diag!(self.controller.is_debug(), operation, "Forwarding identity call");
		if let Err(source) = dispatcher.dispatch(command) {
			let err = AnalyticsError::SinkDelivery { operation, source };
			warn!(error = %err, "Failed to dispatch identity call");
		}
	}
}

/// Adds `event_category` and, unless already present, `timestamp`.
fn enrich(
	event: Event,
	timestamp: Option<DateTime<Utc>>,
) -> Result<Properties, beacon_analytics_core::CatalogError> {
	let category = event.category();
	let mut properties = event.into_properties()?;
	properties.set(EVENT_CATEGORY_PROPERTY, category.as_str());
	properties.insert_if_absent(TIMESTAMP_PROPERTY, || {
		timestamp
			.unwrap_or_else(Utc::now)
			.to_rfc3339_opts(SecondsFormat::Millis, true)
	});
	Ok(properties)
}

/// Builder for constructing a [`Tracker`].
pub struct TrackerBuilder {
	sink: Option<Arc<dyn Sink>>,
	config: TrackerConfig,
}

impl TrackerBuilder {
	pub fn new() -> Self {
		Self {
			sink: None,
			config: TrackerConfig::default(),
		}
	}

	/// Sets the transport. Defaults to [`MixpanelSink`].
	pub fn sink<S: Sink + 'static>(mut self, sink: S) -> Self {
		self.sink = Some(Arc::new(sink));
		self
	}

	pub fn shared_sink(mut self, sink: Arc<dyn Sink>) -> Self {
		self.sink = Some(sink);
		self
	}

	pub fn config(mut self, config: TrackerConfig) -> Self {
		self.config = config;
		self
	}

	pub fn queue_capacity(mut self, capacity: usize) -> Self {
		self.config.queue_capacity = capacity;
		self
	}

	pub fn backoff(mut self, backoff: BackoffPolicy) -> Self {
		self.config.backoff = backoff;
		self
	}

	pub fn app_version(mut self, version: impl Into<String>) -> Self {
		self.config.app_version = version.into();
		self
	}

	pub fn platform(mut self, platform: Platform) -> Self {
		self.config.platform = platform;
		self
	}

	pub fn build(self) -> Tracker {
		let sink = self
			.sink
			.unwrap_or_else(|| Arc::new(MixpanelSink::from_config(&self.config)));
		Tracker::new(sink, self.config)
	}
}

impl Default for TrackerBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Builds a tracker over the HTTP sink with default settings and starts it.
///
/// Must be called from within a tokio runtime. `debug` behaves as in
/// [`Tracker::init`].
pub fn init_mixpanel(token: impl Into<String>, debug: bool) -> Tracker {
	let tracker = Tracker::builder().build();
	tracker.init(token, debug);
	tracker
}

/// Like [`init_mixpanel`], reading the token and settings from the
/// environment.
pub fn init_from_env() -> Result<Tracker, ConfigError> {
	let sink_config = SinkConfig::from_env()?;
	let tracker = Tracker::builder().config(TrackerConfig::from_env()?).build();
	tracker.init_with(sink_config);
	Ok(tracker)
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_enrich_adds_category_and_timestamp() {
		let props = enrich(
			FeedbackSubmitted {
				feedback_text: "great app".to_string(),
				rating: None,
			}
			.into(),
			None,
		)
		.unwrap();

		assert_eq!(props.get("feedback_text"), Some(&json!("great app")));
		assert_eq!(props.get("event_category"), Some(&json!("Feedback")));
		let ts = props.get("timestamp").and_then(|v| v.as_str()).unwrap();
		assert!(DateTime::parse_from_rfc3339(ts).is_ok(), "bad timestamp {ts}");
	}

	#[test]
	fn test_enrich_uses_explicit_timestamp() {
		let at = DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
			.unwrap()
			.with_timezone(&Utc);
		let props = enrich(
			SessionStarted {
				is_returning_user: true,
				days_since_last_session: Some(2),
			}
			.into(),
			Some(at),
		)
		.unwrap();

		assert_eq!(props.get("timestamp"), Some(&json!("2025-03-01T12:00:00.000Z")));
		assert_eq!(props.get("event_category"), Some(&json!("Session")));
	}

	#[test]
	fn test_tracking_without_runtime_only_queues() {
		let tracker = Tracker::builder().queue_capacity(2).build();
		tracker.track_feedback_clicked("menu");
		tracker.track_session_started(false);
		tracker.track_session_started(true);

		assert_eq!(tracker.state(), SinkState::NotReady);
		assert_eq!(tracker.queued_events(), 2);
	}

	#[test]
	fn test_init_without_runtime_is_harmless() {
		let tracker = Tracker::builder().build();
		assert!(tracker.init("token", true).is_none());
		assert_eq!(tracker.state(), SinkState::NotReady);
		assert!(tracker.is_debug());
	}

	#[test]
	fn test_identity_calls_before_ready_are_noops() {
		let tracker = Tracker::builder().build();
		tracker.identify_user("u1", None);
		tracker.identify_user("", None);
		tracker.reset_user();
		assert_eq!(tracker.queued_events(), 0);
	}
}
