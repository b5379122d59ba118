// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for catalog lookups and payload validation.

use thiserror::Error;

use crate::catalog::EventKind;

/// Errors raised while resolving or validating catalog entries.
#[derive(Debug, Error)]
pub enum CatalogError {
	/// The name does not match any catalog entry.
	#[error("unknown event kind: {0}")]
	UnknownEvent(String),

	/// The payload does not satisfy the schema of its catalog entry.
	#[error("invalid payload for {kind}: {reason}")]
	InvalidPayload { kind: EventKind, reason: String },

	/// A payload value is neither a primitive nor an array of primitives.
	#[error("property '{key}' must be a primitive or an array of primitives")]
	NonPrimitiveValue { key: String },
}

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
