// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ordered delivery worker.
//!
//! Every call that reaches the sink after it becomes ready goes through one
//! channel drained by one task, so the sink observes commands in the order
//! they were dispatched. Failures are logged and never retried.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use beacon_analytics_core::{Properties, UserIdentity};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::backlog::QueuedEvent;
use crate::error::{AnalyticsError, SinkError};
use crate::sink::{run_callback, Callback, SinkAdapter};

/// Work item for the delivery worker.
pub enum SinkCommand {
	Register(Properties),
	Send {
		event: QueuedEvent,
		callback: Option<Callback>,
	},
	Identify(UserIdentity),
	Reset,
	/// Acknowledged once every earlier command has been applied.
	Flush(oneshot::Sender<()>),
}

impl SinkCommand {
	fn operation(&self) -> &'static str {
		match self {
			SinkCommand::Register(_) => "register",
			SinkCommand::Send { .. } => "send",
			SinkCommand::Identify(_) => "identify",
			SinkCommand::Reset => "reset",
			SinkCommand::Flush(_) => "flush",
		}
	}
}

/// Handle for queueing commands on the delivery worker.
#[derive(Clone)]
pub struct Dispatcher {
	tx: mpsc::UnboundedSender<SinkCommand>,
}

impl Dispatcher {
	/// Spawns the worker on the current tokio runtime.
	///
	/// The worker stops once every `Dispatcher` clone has been dropped and the
	/// channel is empty.
	pub fn spawn(adapter: SinkAdapter, debug: Arc<AtomicBool>) -> (Self, JoinHandle<()>) {
		let (tx, rx) = mpsc::unbounded_channel();
		let handle = tokio::spawn(run(adapter, rx, debug));
		(Self { tx }, handle)
	}

	/// Queues a command without waiting.
	///
	/// If the worker is gone the command is discarded, though a `Send`
	/// callback still runs.
	pub fn dispatch(&self, command: SinkCommand) -> Result<(), SinkError> {
		self.tx.send(command).map_err(|rejected| {
			if let SinkCommand::Send {
				callback: Some(callback),
				..
			} = rejected.0
			{
				run_callback(callback);
			}
			SinkError::ChannelClosed
		})
	}
}

async fn run(
	adapter: SinkAdapter,
	mut rx: mpsc::UnboundedReceiver<SinkCommand>,
	debug: Arc<AtomicBool>,
) {
	while let Some(command) = rx.recv().await {
		let operation = command.operation();
		let verbose = debug.load(Ordering::Relaxed);

		let result = match command {
			SinkCommand::Register(properties) => adapter.register(&properties).await,
			SinkCommand::Send { event, callback } => {
				diag!(verbose, event = %event.kind, "Sending event to sink");
				adapter.send(&event, callback).await
			}
			SinkCommand::Identify(identity) => adapter.identify(&identity).await,
			SinkCommand::Reset => adapter.reset().await,
			SinkCommand::Flush(ack) => {
				let _ = ack.send(());
				Ok(())
			}
		};

		if let Err(source) = result {
			let err = AnalyticsError::SinkDelivery { operation, source };
			warn!(error = %err, "Sink delivery failed");
		}
	}

	if debug.load(Ordering::Relaxed) {
		info!("Analytics delivery worker stopped");
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::SinkConfig;
	use crate::sink::Sink;
	use beacon_analytics_core::EventKind;
	use tokio::sync::Mutex;

	#[derive(Default)]
	struct LogSink {
		calls: Mutex<Vec<String>>,
	}

	#[async_trait::async_trait]
	impl Sink for LogSink {
		async fn initialize(&self, _config: &SinkConfig) -> crate::error::Result<()> {
			Ok(())
		}

		async fn register(&self, _properties: &Properties) -> crate::error::Result<()> {
			self.calls.lock().await.push("register".to_string());
			Ok(())
		}

		async fn send(&self, event: &QueuedEvent) -> crate::error::Result<()> {
			let seq = event.properties.get("seq").and_then(|v| v.as_u64()).unwrap_or(0);
			self.calls.lock().await.push(format!("send:{seq}"));
			if seq == 1 {
				return Err(SinkError::Other("rejected".to_string()));
			}
			Ok(())
		}

		async fn identify(&self, identity: &UserIdentity) -> crate::error::Result<()> {
			self.calls
				.lock()
				.await
				.push(format!("identify:{}", identity.user_id));
			Ok(())
		}

		async fn reset(&self) -> crate::error::Result<()> {
			self.calls.lock().await.push("reset".to_string());
			Ok(())
		}
	}

	fn send(seq: u64) -> SinkCommand {
		SinkCommand::Send {
			event: QueuedEvent {
				kind: EventKind::FeedbackClicked,
				properties: Properties::new().insert("seq", seq),
			},
			callback: None,
		}
	}

	#[tokio::test]
	async fn test_commands_apply_in_dispatch_order_despite_failures() {
		let sink = Arc::new(LogSink::default());
		let (dispatcher, _handle) =
			Dispatcher::spawn(SinkAdapter::new(sink.clone()), Arc::new(AtomicBool::new(false)));

		dispatcher
			.dispatch(SinkCommand::Register(Properties::new()))
			.unwrap();
		dispatcher.dispatch(send(0)).unwrap();
		dispatcher.dispatch(send(1)).unwrap();
		dispatcher
			.dispatch(SinkCommand::Identify(UserIdentity::new("u1")))
			.unwrap();
		dispatcher.dispatch(send(2)).unwrap();
		dispatcher.dispatch(SinkCommand::Reset).unwrap();

		let (ack, done) = oneshot::channel();
		dispatcher.dispatch(SinkCommand::Flush(ack)).unwrap();
		done.await.unwrap();

		assert_eq!(
			*sink.calls.lock().await,
			vec![
				"register",
				"send:0",
				"send:1",
				"identify:u1",
				"send:2",
				"reset"
			]
		);
	}

	#[tokio::test]
	async fn test_worker_stops_when_dispatchers_are_dropped() {
		let sink = Arc::new(LogSink::default());
		let (dispatcher, handle) =
			Dispatcher::spawn(SinkAdapter::new(sink), Arc::new(AtomicBool::new(true)));
		dispatcher.dispatch(send(0)).unwrap();
		drop(dispatcher);
		handle.await.unwrap();
	}
}
