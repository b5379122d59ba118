// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User identity payloads.

use serde::{Deserialize, Serialize};

use crate::properties::Properties;

/// Maximum length of a user identifier, in bytes.
pub const MAX_USER_ID_LENGTH: usize = 200;

/// Associates subsequent events with a known user.
///
/// The client forwards this to the sink and keeps no copy of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
	pub user_id: String,
	#[serde(default)]
	pub properties: Properties,
}

impl UserIdentity {
	pub fn new(user_id: impl Into<String>) -> Self {
		Self {
			user_id: user_id.into(),
			properties: Properties::new(),
		}
	}

	/// Sets profile properties (builder pattern).
	pub fn with_properties(mut self, properties: Properties) -> Self {
		self.properties = properties;
		self
	}
}

/// Checks that a user identifier is non-empty, not blank and within
/// [`MAX_USER_ID_LENGTH`].
pub fn validate_user_id(user_id: &str) -> Result<(), &'static str> {
	if user_id.trim().is_empty() {
		return Err("user id cannot be empty");
	}
	if user_id.len() > MAX_USER_ID_LENGTH {
		return Err("user id exceeds maximum length");
	}
	Ok(())
}
