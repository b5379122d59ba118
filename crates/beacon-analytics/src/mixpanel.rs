// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP sink speaking the Mixpanel ingestion API.
//!
//! Events go to `POST {host}/track?verbose=1` and profile updates to
//! `POST {host}/engage?verbose=1`, one JSON array per request. A request
//! counts as delivered only when the host answers 2xx with `"status": 1`.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use beacon_analytics_core::{Properties, UserIdentity};
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::backlog::QueuedEvent;
use crate::config::{SinkConfig, TrackerConfig, DEFAULT_API_HOST};
use crate::error::{Result, SinkError};
use crate::sink::Sink;
use crate::token::SinkToken;
use crate::tracker::TIMESTAMP_PROPERTY;

/// SDK name reported in the user agent.
pub const SDK_NAME: &str = "beacon-analytics";
/// SDK version reported in the user agent.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

const IDENTIFY_EVENT: &str = "$identify";

#[derive(Debug, Deserialize)]
struct VerboseResponse {
	status: i64,
	#[serde(default)]
	error: Option<String>,
}

struct Session {
	client: Option<Client>,
	token: Option<SinkToken>,
	distinct_id: String,
	super_properties: Properties,
	debug: bool,
}

/// Everything a request needs, copied out of the session lock.
struct Snapshot {
	client: Client,
	token: String,
	distinct_id: String,
	super_properties: Properties,
	debug: bool,
}

/// [`Sink`] backed by the Mixpanel HTTP API.
pub struct MixpanelSink {
	api_host: String,
	request_timeout: Duration,
	session: Mutex<Session>,
}

impl MixpanelSink {
	pub fn new(api_host: impl Into<String>) -> Self {
		Self {
			api_host: api_host.into().trim_end_matches('/').to_string(),
			request_timeout: Duration::from_secs(10),
			session: Mutex::new(Session {
				client: None,
				token: None,
				distinct_id: anonymous_id(),
				super_properties: Properties::new(),
				debug: false,
			}),
		}
	}

	pub fn from_config(config: &TrackerConfig) -> Self {
		Self::new(config.api_host.clone()).with_timeout(config.request_timeout)
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	/// Identifier events are currently attributed to.
	pub fn distinct_id(&self) -> String {
		self.session().distinct_id.clone()
	}

	fn session(&self) -> MutexGuard<'_, Session> {
		self.session.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn snapshot(&self) -> Result<Snapshot> {
		let session = self.session();
		match (&session.client, &session.token) {
			(Some(client), Some(token)) => Ok(Snapshot {
				client: client.clone(),
				token: token.expose().to_string(),
				distinct_id: session.distinct_id.clone(),
				super_properties: session.super_properties.clone(),
				debug: session.debug,
			}),
			_ => Err(SinkError::NotInitialized),
		}
	}

	async fn post(&self, client: &Client, endpoint: &str, body: &Value) -> Result<()> {
		let url = format!("{}/{endpoint}?verbose=1", self.api_host);
		let response = client.post(&url).json(body).send().await?;

		let status = response.status();
		if !status.is_success() {
			return Err(SinkError::Rejected {
				status: status.as_u16(),
				message: response.text().await.unwrap_or_default(),
			});
		}

		let verdict: VerboseResponse = response.json().await?;
		if verdict.status != 1 {
			return Err(SinkError::Rejected {
				status: status.as_u16(),
				message: verdict
					.error
					.unwrap_or_else(|| "request rejected".to_string()),
			});
		}
		Ok(())
	}

	async fn track(&self, snapshot: &Snapshot, event: &str, payload: &Properties) -> Result<()> {
		let mut properties = snapshot.super_properties.clone();
		properties.extend(payload.clone());
		properties.set("token", snapshot.token.as_str());
		properties.set("distinct_id", snapshot.distinct_id.as_str());
		properties.set("time", event_time(payload));
		properties.set("$insert_id", Uuid::now_v7().to_string());

		diag!(snapshot.debug, event, distinct_id = %snapshot.distinct_id, "Posting event");
		let body = json!([{ "event": event, "properties": properties }]);
		self.post(&snapshot.client, "track", &body).await
	}
}

impl Default for MixpanelSink {
	fn default() -> Self {
		Self::new(DEFAULT_API_HOST)
	}
}

#[async_trait::async_trait]
impl Sink for MixpanelSink {
	async fn initialize(&self, config: &SinkConfig) -> Result<()> {
		if config.token.is_blank() {
			return Err(SinkError::InvalidConfig("project token is empty".to_string()));
		}
		Url::parse(&self.api_host)
			.map_err(|e| SinkError::InvalidConfig(format!("api host {}: {e}", self.api_host)))?;

		let client = Client::builder()
			.user_agent(format!("{SDK_NAME}/{SDK_VERSION}"))
			.timeout(self.request_timeout)
			.build()?;

		let mut session = self.session();
		session.client = Some(client);
		session.token = Some(config.token.clone());
		session.debug = config.debug;
		debug!(api_host = %self.api_host, token = ?config.token, "Mixpanel sink initialized");
		Ok(())
	}

	async fn register(&self, properties: &Properties) -> Result<()> {
		let mut session = self.session();
		if session.client.is_none() {
			return Err(SinkError::NotInitialized);
		}
		session.super_properties.extend(properties.clone());
		Ok(())
	}

	async fn send(&self, event: &QueuedEvent) -> Result<()> {
		let snapshot = self.snapshot()?;
		self.track(&snapshot, event.kind.as_str(), &event.properties)
			.await
	}

	async fn identify(&self, identity: &UserIdentity) -> Result<()> {
		let mut snapshot = self.snapshot()?;
		let anon_id = snapshot.distinct_id.clone();

		if anon_id != identity.user_id {
			let link = Properties::new()
				.insert("$identified_id", identity.user_id.as_str())
				.insert("$anon_id", anon_id.as_str());
			snapshot.distinct_id = identity.user_id.clone();
			self.track(&snapshot, IDENTIFY_EVENT, &link).await?;
		}
		self.session().distinct_id = identity.user_id.clone();

		if identity.properties.is_empty() {
			return Ok(());
		}
		let body = json!([{
			"$token": snapshot.token,
			"$distinct_id": identity.user_id,
			"$set": identity.properties,
		}]);
		self.post(&snapshot.client, "engage", &body).await
	}

	async fn reset(&self) -> Result<()> {
		let mut session = self.session();
		if session.client.is_none() {
			return Err(SinkError::NotInitialized);
		}
		session.distinct_id = anonymous_id();
		Ok(())
	}
}

fn anonymous_id() -> String {
	format!("$device:{}", Uuid::new_v4())
}

/// Milliseconds since the epoch, from the event's own timestamp when it
/// carries a parseable one.
fn event_time(payload: &Properties) -> i64 {
	payload
		.get(TIMESTAMP_PROPERTY)
		.and_then(Value::as_str)
		.and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
		.map(|ts| ts.with_timezone(&Utc))
		.unwrap_or_else(Utc::now)
		.timestamp_millis()
}
