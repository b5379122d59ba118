// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the analytics SDK.
//!
//! None of these ever reach the host application through the tracker. They
//! exist so failures can be logged with a precise cause.

use beacon_analytics_core::{CatalogError, EventKind};
use thiserror::Error;

/// Failure reported by a sink operation.
///
/// The tracker only distinguishes success from failure; the variants are for
/// diagnostics.
#[derive(Debug, Error)]
pub enum SinkError {
	/// An operation was attempted before `initialize` succeeded.
	#[error("sink is not initialized")]
	NotInitialized,

	/// The sink configuration was rejected.
	#[error("invalid sink configuration: {0}")]
	InvalidConfig(String),

	/// HTTP request failed.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// The transport answered but refused the request.
	#[error("sink rejected request ({status}): {message}")]
	Rejected { status: u16, message: String },

	/// The delivery worker is gone.
	#[error("delivery channel closed")]
	ChannelClosed,

	#[error("{0}")]
	Other(String),
}

/// Failure taxonomy of the tracking core.
#[derive(Debug, Error)]
pub enum AnalyticsError {
	/// The sink failed to initialize.
	#[error("sink initialization failed (attempt {attempt}): {source}")]
	SinkInitialization {
		attempt: u32,
		#[source]
		source: SinkError,
	},

	/// A single send, identify, reset or register call failed. Not retried.
	#[error("sink {operation} failed: {source}")]
	SinkDelivery {
		operation: &'static str,
		#[source]
		source: SinkError,
	},

	/// The backlog was full; the new event was dropped.
	#[error("backlog full ({capacity} events), dropped {kind}")]
	QueueCapacityExceeded { kind: EventKind, capacity: usize },

	/// An identity operation was called before the sink was ready.
	#[error("{operation} called before the sink is ready")]
	PreconditionViolation { operation: &'static str },

	/// A payload did not satisfy its catalog entry.
	#[error("invalid event payload: {0}")]
	InvalidPayload(#[from] CatalogError),
}

/// Result type alias for sink operations.
pub type Result<T> = std::result::Result<T, SinkError>;
