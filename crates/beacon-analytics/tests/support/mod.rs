// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use beacon_analytics::{
	EventKind, Properties, QueuedEvent, Result, Sink, SinkConfig, SinkError, UserIdentity,
};
use tokio::time::Instant;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
	Register(Properties),
	Send {
		kind: EventKind,
		properties: Properties,
	},
	Identify(UserIdentity),
	Reset,
}

/// In-memory sink that records every call it receives.
pub struct RecordingSink {
	/// Number of `initialize` calls that fail before one succeeds.
	init_failures: u32,
	/// When set, every operation after `initialize` fails.
	fail_delivery: bool,
	init_attempts: Mutex<Vec<Instant>>,
	calls: Mutex<Vec<Call>>,
}

impl RecordingSink {
	pub fn healthy() -> Self {
		Self::new(0, false)
	}

	pub fn failing_init(failures: u32) -> Self {
		Self::new(failures, false)
	}

	pub fn never_ready() -> Self {
		Self::new(u32::MAX, false)
	}

	pub fn failing_delivery() -> Self {
		Self::new(0, true)
	}

	/// Fails `initialize` forever and every delivery call.
	pub fn broken() -> Self {
		Self::new(u32::MAX, true)
	}

	fn new(init_failures: u32, fail_delivery: bool) -> Self {
		Self {
			init_failures,
			fail_delivery,
			init_attempts: Mutex::new(Vec::new()),
			calls: Mutex::new(Vec::new()),
		}
	}

	pub fn init_attempts(&self) -> Vec<Instant> {
		self.init_attempts.lock().unwrap().clone()
	}

	pub fn calls(&self) -> Vec<Call> {
		self.calls.lock().unwrap().clone()
	}

	pub fn sends(&self) -> Vec<(EventKind, Properties)> {
		self.calls()
			.into_iter()
			.filter_map(|call| match call {
				Call::Send { kind, properties } => Some((kind, properties)),
				_ => None,
			})
			.collect()
	}

	fn record(&self, call: Call) -> Result<()> {
		self.calls.lock().unwrap().push(call);
		if self.fail_delivery {
			return Err(SinkError::Other("delivery failed".to_string()));
		}
		Ok(())
	}
}

#[async_trait]
impl Sink for RecordingSink {
	async fn initialize(&self, _config: &SinkConfig) -> Result<()> {
		let mut attempts = self.init_attempts.lock().unwrap();
		attempts.push(Instant::now());
		if (attempts.len() as u32) <= self.init_failures {
			return Err(SinkError::Other("initialize failed".to_string()));
		}
		Ok(())
	}

	async fn register(&self, properties: &Properties) -> Result<()> {
		self.record(Call::Register(properties.clone()))
	}

	async fn send(&self, event: &QueuedEvent) -> Result<()> {
		self.record(Call::Send {
			kind: event.kind,
			properties: event.properties.clone(),
		})
	}

	async fn identify(&self, identity: &UserIdentity) -> Result<()> {
		self.record(Call::Identify(identity.clone()))
	}

	async fn reset(&self) -> Result<()> {
		self.record(Call::Reset)
	}
}

/// Sequence number carried in the `source` field by [`numbered`].
pub fn seq_of(properties: &Properties) -> usize {
	properties
		.get("source")
		.and_then(|v| v.as_str())
		.and_then(|s| s.strip_prefix("seq-"))
		.and_then(|s| s.parse().ok())
		.unwrap()
}

pub fn numbered(seq: usize) -> String {
	format!("seq-{seq}")
}

/// In-memory log sink for a scoped `tracing` subscriber.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
	pub fn contents(&self) -> String {
		String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
	}

	/// Installs an INFO-level subscriber writing here for the current thread.
	pub fn install(&self) -> tracing::subscriber::DefaultGuard {
		let subscriber = tracing_subscriber::fmt()
			.with_max_level(tracing::Level::INFO)
			.with_ansi(false)
			.with_writer(self.clone())
			.finish();
		tracing::subscriber::set_default(subscriber)
	}
}

impl io::Write for CapturedLogs {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.lock().unwrap().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

impl<'a> MakeWriter<'a> for CapturedLogs {
	type Writer = CapturedLogs;

	fn make_writer(&'a self) -> Self::Writer {
		self.clone()
	}
}
