// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Optional subscriber setup for hosts that do not install their own.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Output format for [`init_tracing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
	#[default]
	Pretty,
	Compact,
	Json,
}

/// Default filter when `RUST_LOG` is unset.
pub fn default_filter(debug: bool) -> String {
	let level = if debug { "info" } else { "warn" };
	format!("beacon_analytics={level}")
}

/// Installs a global stderr subscriber.
///
/// `RUST_LOG` takes precedence over `debug`. Returns `false` when a global
/// subscriber was already installed.
pub fn init_tracing(debug: bool, format: LogFormat) -> bool {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));

	let registry = tracing_subscriber::registry().with(filter);
	let result = match format {
		LogFormat::Json => registry
			.with(fmt::layer().json().with_writer(std::io::stderr))
			.try_init(),
		LogFormat::Compact => registry
			.with(fmt::layer().compact().with_writer(std::io::stderr))
			.try_init(),
		LogFormat::Pretty => registry
			.with(fmt::layer().with_writer(std::io::stderr))
			.try_init(),
	};
	result.is_ok()
}
