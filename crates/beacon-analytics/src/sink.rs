// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The boundary around the external analytics transport.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use beacon_analytics_core::{Properties, UserIdentity};
use tracing::{debug, error};

use crate::backlog::QueuedEvent;
use crate::config::SinkConfig;
use crate::error::Result;

/// Completion hook for a tracked event.
///
/// Invoked exactly once, whether delivery succeeded or not.
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// An analytics transport.
///
/// Implementations report failure through [`SinkError`](crate::SinkError)
/// and perform no retries of their own.
#[async_trait::async_trait]
pub trait Sink: Send + Sync {
	/// Prepares the transport. May be called again after a failure.
	async fn initialize(&self, config: &SinkConfig) -> Result<()>;

	/// Registers properties attached to every subsequent event.
	async fn register(&self, properties: &Properties) -> Result<()>;

	async fn send(&self, event: &QueuedEvent) -> Result<()>;

	async fn identify(&self, identity: &UserIdentity) -> Result<()>;

	/// Forgets the identified user.
	async fn reset(&self) -> Result<()>;
}

/// Thin wrapper over a [`Sink`] adding completion callbacks.
#[derive(Clone)]
pub struct SinkAdapter {
	sink: Arc<dyn Sink>,
}

impl SinkAdapter {
	pub fn new(sink: Arc<dyn Sink>) -> Self {
		Self { sink }
	}

	pub async fn initialize(&self, config: &SinkConfig) -> Result<()> {
		self.sink.initialize(config).await
	}

	pub async fn register(&self, properties: &Properties) -> Result<()> {
		self.sink.register(properties).await
	}

	/// Sends one event, then runs `callback` regardless of the outcome.
	pub async fn send(&self, event: &QueuedEvent, callback: Option<Callback>) -> Result<()> {
		let result = self.sink.send(event).await;
		if let Some(callback) = callback {
			run_callback(callback);
		}
		result
	}

	pub async fn identify(&self, identity: &UserIdentity) -> Result<()> {
		self.sink.identify(identity).await
	}

	pub async fn reset(&self) -> Result<()> {
		self.sink.reset().await
	}
}

/// Runs a caller-supplied callback, containing any panic it raises.
pub(crate) fn run_callback(callback: Callback) {
	if catch_unwind(AssertUnwindSafe(callback)).is_err() {
		error!("Tracking callback panicked");
	} else {
		debug!("Tracking callback completed");
	}
}
