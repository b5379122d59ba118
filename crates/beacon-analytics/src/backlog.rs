// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded FIFO of events recorded before the sink is ready.

use std::collections::VecDeque;

use beacon_analytics_core::{EventKind, Properties};
use tracing::warn;

use crate::config::DEFAULT_QUEUE_CAPACITY;
use crate::error::SinkError;

/// An enriched event waiting for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedEvent {
	pub kind: EventKind,
	/// Catalog payload plus `event_category` and `timestamp`.
	pub properties: Properties,
}

/// Capacity-bounded backlog.
///
/// Once full, new entries are refused and the ones already held are kept.
#[derive(Debug)]
pub struct BacklogQueue {
	entries: VecDeque<QueuedEvent>,
	capacity: usize,
}

impl BacklogQueue {
	pub fn new(capacity: usize) -> Self {
		Self {
			entries: VecDeque::with_capacity(capacity),
			capacity,
		}
	}

	/// Appends to the tail. Returns `false` and drops `event` when full.
	pub fn enqueue(&mut self, event: QueuedEvent) -> bool {
		if self.entries.len() >= self.capacity {
			return false;
		}
		self.entries.push_back(event);
		true
	}

	/// Pops every entry in order and hands it to `deliver`.
	///
	/// Each entry is removed before `deliver` sees it. A failed delivery is
	/// logged and the drain moves on to the next entry.
	pub fn drain<F>(&mut self, mut deliver: F)
	where
		F: FnMut(QueuedEvent) -> Result<(), SinkError>,
	{
		while let Some(event) = self.entries.pop_front() {
			let kind = event.kind;
			if let Err(e) = deliver(event) {
				warn!(event = %kind, error = %e, "Dropped queued event during drain");
			}
		}
	}

	pub fn size(&self) -> usize {
		self.entries.len()
	}

	pub fn len(&self) -> usize {
		self.size()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}
}

impl Default for BacklogQueue {
	fn default() -> Self {
		Self::new(DEFAULT_QUEUE_CAPACITY)
	}
}
