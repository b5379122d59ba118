// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracker and sink configuration, with environment loading.
//!
//! Tokens follow the `VAR` / `VAR_FILE` convention: when `VAR_FILE` is set the
//! token is read from that path (a single trailing newline is stripped),
//! otherwise `VAR` is used directly.

use std::path::PathBuf;
use std::time::Duration;
use std::{env, fs};

use thiserror::Error;

use crate::backoff::BackoffPolicy;
use crate::platform::Platform;
use crate::token::SinkToken;

/// Default backlog capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 50;
/// Default sink API host.
pub const DEFAULT_API_HOST: &str = "https://api.mixpanel.com";

pub const TOKEN_ENV: &str = "MIXPANEL_TOKEN";
pub const API_HOST_ENV: &str = "MIXPANEL_API_HOST";
pub const DEBUG_ENV: &str = "BEACON_ANALYTICS_DEBUG";
pub const QUEUE_CAPACITY_ENV: &str = "BEACON_ANALYTICS_QUEUE_CAPACITY";
pub const MAX_INIT_ATTEMPTS_ENV: &str = "BEACON_ANALYTICS_MAX_INIT_ATTEMPTS";
pub const RETRY_BASE_MS_ENV: &str = "BEACON_ANALYTICS_RETRY_BASE_MS";
pub const APP_VERSION_ENV: &str = "BEACON_ANALYTICS_APP_VERSION";

/// Errors that can occur while loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read token file at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("token file path in {var} is empty")]
	EmptyPath { var: String },

	#[error("required token not found: set either {var} or {file_var}")]
	MissingToken { var: String, file_var: String },

	#[error("invalid value for {var}: {value}")]
	InvalidValue { var: String, value: String },
}

/// Settings handed to the sink's `initialize`.
#[derive(Debug, Clone)]
pub struct SinkConfig {
	pub token: SinkToken,
	pub debug: bool,
}

impl SinkConfig {
	pub fn new(token: impl Into<SinkToken>, debug: bool) -> Self {
		Self {
			token: token.into(),
			debug,
		}
	}

	/// Reads `MIXPANEL_TOKEN[_FILE]` and `BEACON_ANALYTICS_DEBUG`.
	pub fn from_env() -> Result<Self, ConfigError> {
		let token = load_token_env(TOKEN_ENV)?.ok_or_else(|| ConfigError::MissingToken {
			var: TOKEN_ENV.to_string(),
			file_var: format!("{TOKEN_ENV}_FILE"),
		})?;
		let debug = parse_env(DEBUG_ENV, parse_bool)?.unwrap_or(false);
		Ok(Self { token, debug })
	}
}

/// Settings for the tracker and its initialization controller.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
	/// Maximum number of events held while the sink is not ready.
	pub queue_capacity: usize,
	/// Retry schedule for sink initialization.
	pub backoff: BackoffPolicy,
	/// Reported as the `app_version` default property.
	pub app_version: String,
	/// Reported as the `platform` default property.
	pub platform: Platform,
	/// Base URL for the HTTP sink.
	pub api_host: String,
	/// Timeout for each HTTP request issued by the HTTP sink.
	pub request_timeout: Duration,
}

impl Default for TrackerConfig {
	fn default() -> Self {
		Self {
			queue_capacity: DEFAULT_QUEUE_CAPACITY,
			backoff: BackoffPolicy::default(),
			app_version: env!("CARGO_PKG_VERSION").to_string(),
			platform: Platform::current(),
			api_host: DEFAULT_API_HOST.to_string(),
			request_timeout: Duration::from_secs(10),
		}
	}
}

impl TrackerConfig {
	/// Starts from the defaults and applies any `BEACON_ANALYTICS_*` overrides.
	pub fn from_env() -> Result<Self, ConfigError> {
		let mut config = Self::default();

		if let Some(capacity) = parse_env(QUEUE_CAPACITY_ENV, |v| v.parse::<usize>().ok())? {
			config.queue_capacity = capacity;
		}
		if let Some(attempts) = parse_env(MAX_INIT_ATTEMPTS_ENV, |v| {
			v.parse::<u32>().ok().filter(|n| *n > 0)
		})? {
			config.backoff.max_attempts = attempts;
		}
		if let Some(base_ms) = parse_env(RETRY_BASE_MS_ENV, |v| v.parse::<u64>().ok())? {
			config.backoff.base_delay = Duration::from_millis(base_ms);
		}
		if let Some(version) = non_empty_env(APP_VERSION_ENV) {
			config.app_version = version;
		}
		if let Some(host) = non_empty_env(API_HOST_ENV) {
			config.api_host = host;
		}

		Ok(config)
	}
}

/// Loads a token from `{var}_FILE` or `{var}`.
///
/// Returns `Ok(None)` when neither is set.
pub fn load_token_env(var: &str) -> Result<Option<SinkToken>, ConfigError> {
	let file_var = format!("{var}_FILE");

	if let Ok(path_str) = env::var(&file_var) {
		if path_str.is_empty() {
			return Err(ConfigError::EmptyPath { var: file_var });
		}

		let path = PathBuf::from(&path_str);
		let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
			path: path.clone(),
			source,
		})?;

		let token = content.strip_suffix('\n').unwrap_or(&content);
		return Ok(Some(SinkToken::new(token)));
	}

	Ok(non_empty_env(var).map(SinkToken::new))
}

fn non_empty_env(name: &str) -> Option<String> {
	env::var(name).ok().filter(|s| !s.is_empty())
}

fn parse_env<T>(
	var: &str,
	parse: impl FnOnce(&str) -> Option<T>,
) -> Result<Option<T>, ConfigError> {
	match non_empty_env(var) {
		None => Ok(None),
		Some(value) => match parse(value.trim()) {
			Some(parsed) => Ok(Some(parsed)),
			None => Err(ConfigError::InvalidValue {
				var: var.to_string(),
				value,
			}),
		},
	}
}

fn parse_bool(value: &str) -> Option<bool> {
	match value.to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" => Some(false),
		_ => None,
	}
}
