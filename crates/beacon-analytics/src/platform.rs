// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Platform classification and the default properties registered with the
//! sink once it is ready.

use std::fmt;

use beacon_analytics_core::Properties;
use serde::{Deserialize, Serialize};

/// Property key for the platform classification.
pub const PLATFORM_PROPERTY: &str = "platform";
/// Property key for the host application version.
pub const APP_VERSION_PROPERTY: &str = "app_version";

/// Coarse class of device the host application runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
	Desktop,
	Mobile,
	Web,
	Server,
	Unknown,
}

impl Platform {
	/// Classifies the platform this binary was compiled for.
	pub fn current() -> Self {
		if cfg!(target_family = "wasm") {
			return Platform::Web;
		}
		Self::from_os(std::env::consts::OS)
	}

	/// Classifies a `std::env::consts::OS` value.
	pub fn from_os(os: &str) -> Self {
		match os {
			"ios" | "android" => Platform::Mobile,
			"macos" | "windows" => Platform::Desktop,
			// Linux hosts are usually workstations; headless deployments can
			// override through the tracker builder.
			"linux" => Platform::Desktop,
			"freebsd" | "netbsd" | "openbsd" | "illumos" | "solaris" => Platform::Server,
			_ => Platform::Unknown,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Platform::Desktop => "desktop",
			Platform::Mobile => "mobile",
			Platform::Web => "web",
			Platform::Server => "server",
			Platform::Unknown => "unknown",
		}
	}
}

impl fmt::Display for Platform {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Builds the property set attached to every event once the sink is ready.
pub fn default_properties(platform: Platform, app_version: &str) -> Properties {
	Properties::new()
		.insert(PLATFORM_PROPERTY, platform.as_str())
		.insert(APP_VERSION_PROPERTY, app_version)
}
