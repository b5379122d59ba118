// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Project token wrapper that keeps the value out of logs.

use std::fmt;

use zeroize::Zeroize;

/// Placeholder printed instead of the token.
pub const REDACTED: &str = "[REDACTED]";

/// The sink project token.
///
/// `Debug` and `Display` print [`REDACTED`]; the value is zeroed on drop and
/// must be read through [`SinkToken::expose`].
///
/// ```
/// use beacon_analytics::SinkToken;
///
/// let token = SinkToken::new("abc123");
/// assert_eq!(format!("{token}"), "[REDACTED]");
/// assert_eq!(format!("{token:?}"), "SinkToken(\"[REDACTED]\")");
/// assert_eq!(token.expose(), "abc123");
/// ```
#[derive(Clone, PartialEq, Eq, Zeroize)]
#[zeroize(drop)]
pub struct SinkToken {
	inner: String,
}

impl SinkToken {
	pub fn new(value: impl Into<String>) -> Self {
		Self {
			inner: value.into(),
		}
	}

	pub fn expose(&self) -> &str {
		&self.inner
	}

	pub fn is_blank(&self) -> bool {
		self.inner.trim().is_empty()
	}
}

impl fmt::Debug for SinkToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("SinkToken").field(&REDACTED).finish()
	}
}

impl fmt::Display for SinkToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl From<String> for SinkToken {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl From<&str> for SinkToken {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
