// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sink initialization state machine.
//!
//! ```text
//! NotReady ──start──▶ Initializing ──ok──▶ Ready
//!                        │  ▲
//!                  fail  │  │ backoff elapsed
//!                        ▼  │
//!                      (retry) ──attempts exhausted──▶ FailedPermanently
//! ```
//!
//! Transitions only move forward. `Ready` and `FailedPermanently` are
//! terminal for the lifetime of the controller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use beacon_analytics_core::Properties;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::backlog::BacklogQueue;
use crate::backoff::BackoffPolicy;
use crate::config::{SinkConfig, TrackerConfig};
use crate::dispatch::{Dispatcher, SinkCommand};
use crate::error::AnalyticsError;
use crate::platform::default_properties;
use crate::sink::{Sink, SinkAdapter};

/// Readiness of the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
	NotReady,
	Initializing,
	Ready,
	FailedPermanently,
}

impl SinkState {
	pub fn is_terminal(&self) -> bool {
		matches!(self, SinkState::Ready | SinkState::FailedPermanently)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			SinkState::NotReady => "not_ready",
			SinkState::Initializing => "initializing",
			SinkState::Ready => "ready",
			SinkState::FailedPermanently => "failed_permanently",
		}
	}
}

/// State guarded by the controller lock.
///
/// The tracker checks readiness and enqueues or dispatches under this lock,
/// and the controller drains under it, so no post-ready event can overtake
/// the backlog.
pub(crate) struct Gate {
	pub(crate) state: SinkState,
	pub(crate) retry_count: u32,
	pub(crate) backlog: BacklogQueue,
	pub(crate) dispatcher: Option<Dispatcher>,
}

impl Gate {
	/// The dispatcher, once the sink is ready.
	pub(crate) fn ready_dispatcher(&self) -> Option<&Dispatcher> {
		match self.state {
			SinkState::Ready => self.dispatcher.as_ref(),
			_ => None,
		}
	}
}

/// Drives sink initialization with retry and owns the backlog.
pub struct InitController {
	gate: Mutex<Gate>,
	adapter: SinkAdapter,
	backoff: BackoffPolicy,
	defaults: Properties,
	debug: Arc<AtomicBool>,
	state_tx: watch::Sender<SinkState>,
}

impl InitController {
	pub fn new(sink: Arc<dyn Sink>, config: &TrackerConfig) -> Self {
		let (state_tx, _) = watch::channel(SinkState::NotReady);
		Self {
			gate: Mutex::new(Gate {
				state: SinkState::NotReady,
				retry_count: 0,
				backlog: BacklogQueue::new(config.queue_capacity),
				dispatcher: None,
			}),
			adapter: SinkAdapter::new(sink),
			backoff: config.backoff.clone(),
			defaults: default_properties(config.platform, &config.app_version),
			debug: Arc::new(AtomicBool::new(false)),
			state_tx,
		}
	}

	pub fn state(&self) -> SinkState {
		self.gate().state
	}

	/// Number of failed initialization attempts so far.
	pub fn retry_count(&self) -> u32 {
		self.gate().retry_count
	}

	pub fn queued_events(&self) -> usize {
		self.gate().backlog.size()
	}

	pub fn set_debug(&self, enabled: bool) {
		self.debug.store(enabled, Ordering::Relaxed);
	}

	pub fn is_debug(&self) -> bool {
		self.debug.load(Ordering::Relaxed)
	}

	/// Watches state transitions.
	pub fn subscribe(&self) -> watch::Receiver<SinkState> {
		self.state_tx.subscribe()
	}

	/// Resolves once the state is `Ready` or `FailedPermanently`.
	///
	/// Pending forever if [`InitController::start`] is never called.
	pub async fn settled(&self) -> SinkState {
		let mut rx = self.state_tx.subscribe();
		let settled = rx.wait_for(SinkState::is_terminal).await.map(|state| *state);
		settled.unwrap_or_else(|_| self.state())
	}

	/// Begins initialization on the current tokio runtime.
	///
	/// Only the first call from `NotReady` starts a retry cycle; later calls
	/// are logged and ignored. Returns the handle of the retry task.
	pub fn start(self: &Arc<Self>, config: SinkConfig) -> Option<JoinHandle<()>> {
		let runtime = match tokio::runtime::Handle::try_current() {
			Ok(handle) => handle,
			Err(e) => {
				error!(error = %e, "Analytics sink initialization requires a tokio runtime");
				return None;
			}
		};

		{
			let mut gate = self.gate();
			if gate.state != SinkState::NotReady {
				warn!(
					state = gate.state.as_str(),
					"Analytics sink initialization already started"
				);
				return None;
			}
			gate.state = SinkState::Initializing;
		}
		self.state_tx.send_replace(SinkState::Initializing);

		let controller = Arc::clone(self);
		Some(runtime.spawn(controller.run(config)))
	}

	async fn run(self: Arc<Self>, config: SinkConfig) {
		loop {
			let attempt = self.retry_count() + 1;
			diag!(
				self.is_debug(),
				attempt,
				max_attempts = self.backoff.max_attempts,
				"Initializing analytics sink"
			);

			let source = match self.adapter.initialize(&config).await {
				Ok(()) => {
					self.become_ready();
					return;
				}
				Err(e) => e,
			};

			let retry_count = {
				let mut gate = self.gate();
				gate.retry_count += 1;
				gate.retry_count
			};
			let err = AnalyticsError::SinkInitialization { attempt, source };

			if !self.backoff.should_retry(retry_count) {
				error!(
					error = %err,
					attempts = retry_count,
					"Analytics sink initialization failed permanently"
				);
				self.settle(SinkState::FailedPermanently);
				return;
			}

			let delay = self.backoff.delay_for(retry_count);
			warn!(
				error = %err,
				delay_ms = delay.as_millis() as u64,
				"Analytics sink initialization failed, retrying"
			);
			tokio::time::sleep(delay).await;
		}
	}

	/// Starts delivery and drains the backlog, all under the gate lock.
	fn become_ready(&self) {
		let (dispatcher, _worker) = Dispatcher::spawn(self.adapter.clone(), Arc::clone(&self.debug));

		let drained = {
			let mut gate = self.gate();

			if let Err(source) = dispatcher.dispatch(SinkCommand::Register(self.defaults.clone())) {
				let err = AnalyticsError::SinkDelivery {
					operation: "register",
					source,
				};
				warn!(error = %err, "Failed to register default properties");
			}

			let drained = gate.backlog.size();
			gate.backlog.drain(|event| {
				dispatcher.dispatch(SinkCommand::Send {
					event,
					callback: None,
				})
			});

			gate.dispatcher = Some(dispatcher);
			gate.state = SinkState::Ready;
			drained
		};
		self.state_tx.send_replace(SinkState::Ready);

		diag!(self.is_debug(), drained, "Analytics sink ready, backlog flushed");
	}

	fn settle(&self, state: SinkState) {
		self.gate().state = state;
		self.state_tx.send_replace(state);
	}

	pub(crate) fn gate(&self) -> MutexGuard<'_, Gate> {
		self.gate.lock().unwrap_or_else(PoisonError::into_inner)
	}
}
