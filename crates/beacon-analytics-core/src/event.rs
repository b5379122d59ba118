// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Typed payload records for each catalog entry.
//!
//! [`Event`] has one variant per [`EventKind`], each carrying the record that
//! describes its payload. Required fields are plain struct fields, so a typed
//! caller cannot build an incomplete payload. Callers holding dynamic data go
//! through [`Event::from_properties`], which applies the same schema at runtime.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::catalog::{Category, EventKind};
use crate::error::{CatalogError, Result};
use crate::properties::Properties;

/// A new or returning user opened the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStarted {
	pub is_returning_user: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub days_since_last_session: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEnded {
	pub session_duration_seconds: u64,
	pub decisions_started: u32,
	pub decisions_completed: u32,
}

/// A user opened a discussion for a new decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscussionStarted {
	pub decision_id: String,
	pub decision_type: String,
	pub option_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionCompleted {
	pub decision_id: String,
	pub decision_type: String,
	pub chosen_option: String,
	pub time_to_decide_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionAbandoned {
	pub decision_id: String,
	/// Flow step the user was on when they left.
	pub last_step: String,
	pub time_spent_seconds: u64,
}

/// A request/response exchange with the AI assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiInteracted {
	pub interaction_type: String,
	pub response_time_ms: u64,
	pub succeeded: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub decision_id: Option<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackClicked {
	/// Screen or control the feedback entry point was opened from.
	pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSubmitted {
	pub feedback_text: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rating: Option<u8>,
}

/// A catalog event together with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
	SessionStarted(SessionStarted),
	SessionEnded(SessionEnded),
	DiscussionStarted(DiscussionStarted),
	DecisionCompleted(DecisionCompleted),
	DecisionAbandoned(DecisionAbandoned),
	AiInteracted(AiInteracted),
	FeedbackClicked(FeedbackClicked),
	FeedbackSubmitted(FeedbackSubmitted),
}

impl Event {
	pub fn kind(&self) -> EventKind {
		match self {
			Event::SessionStarted(_) => EventKind::SessionStarted,
			Event::SessionEnded(_) => EventKind::SessionEnded,
			Event::DiscussionStarted(_) => EventKind::DiscussionStarted,
			Event::DecisionCompleted(_) => EventKind::DecisionCompleted,
			Event::DecisionAbandoned(_) => EventKind::DecisionAbandoned,
			Event::AiInteracted(_) => EventKind::AiInteracted,
			Event::FeedbackClicked(_) => EventKind::FeedbackClicked,
			Event::FeedbackSubmitted(_) => EventKind::FeedbackSubmitted,
		}
	}

	pub fn category(&self) -> Category {
		self.kind().category()
	}

	/// Serializes the payload record into a flat property map.
	pub fn into_properties(self) -> Result<Properties> {
		let kind = self.kind();
		let value = match self {
			Event::SessionStarted(p) => serde_json::to_value(p),
			Event::SessionEnded(p) => serde_json::to_value(p),
			Event::DiscussionStarted(p) => serde_json::to_value(p),
			Event::DecisionCompleted(p) => serde_json::to_value(p),
			Event::DecisionAbandoned(p) => serde_json::to_value(p),
			Event::AiInteracted(p) => serde_json::to_value(p),
			Event::FeedbackClicked(p) => serde_json::to_value(p),
			Event::FeedbackSubmitted(p) => serde_json::to_value(p),
		}
		.map_err(|e| CatalogError::InvalidPayload {
			kind,
			reason: e.to_string(),
		})?;
		Ok(Properties::from(value))
	}

	/// Builds an event from dynamic properties, enforcing the catalog schema.
	///
	/// Fails when a required field is missing, a field has the wrong type, or a
	/// value is not a primitive / array of primitives. Fields the catalog entry
	/// does not declare are ignored.
	///
	/// ```
	/// use beacon_analytics_core::{Event, EventKind, Properties};
	///
	/// let event = Event::from_properties(
	///     EventKind::FeedbackSubmitted,
	///     Properties::new().insert("feedback_text", "great app"),
	/// ).unwrap();
	/// assert_eq!(event.kind(), EventKind::FeedbackSubmitted);
	///
	/// assert!(Event::from_properties(EventKind::FeedbackSubmitted, Properties::new()).is_err());
	/// ```
	pub fn from_properties(kind: EventKind, properties: Properties) -> Result<Event> {
		properties.validate_primitive()?;

		if let Some(missing) = kind
			.required_fields()
			.iter()
			.find(|field| !properties.contains_key(field))
		{
			return Err(CatalogError::InvalidPayload {
				kind,
				reason: format!("missing required field '{missing}'"),
			});
		}

		let value = properties.into_value();
		let event = match kind {
			EventKind::SessionStarted => Event::SessionStarted(decode(kind, value)?),
			EventKind::SessionEnded => Event::SessionEnded(decode(kind, value)?),
			EventKind::DiscussionStarted => Event::DiscussionStarted(decode(kind, value)?),
			EventKind::DecisionCompleted => Event::DecisionCompleted(decode(kind, value)?),
			EventKind::DecisionAbandoned => Event::DecisionAbandoned(decode(kind, value)?),
			EventKind::AiInteracted => Event::AiInteracted(decode(kind, value)?),
			EventKind::FeedbackClicked => Event::FeedbackClicked(decode(kind, value)?),
			EventKind::FeedbackSubmitted => Event::FeedbackSubmitted(decode(kind, value)?),
		};
		Ok(event)
	}
}

fn decode<T: DeserializeOwned>(kind: EventKind, value: serde_json::Value) -> Result<T> {
	serde_json::from_value(value).map_err(|e| CatalogError::InvalidPayload {
		kind,
		reason: e.to_string(),
	})
}

macro_rules! impl_from_payload {
	($($variant:ident),* $(,)?) => {
		$(
			impl From<$variant> for Event {
				fn from(payload: $variant) -> Self {
					Event::$variant(payload)
				}
			}
		)*
	};
}

impl_from_payload!(
	SessionStarted,
	SessionEnded,
	DiscussionStarted,
	DecisionCompleted,
	DecisionAbandoned,
	AiInteracted,
	FeedbackClicked,
	FeedbackSubmitted,
);

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn sample(kind: EventKind) -> Event {
		match kind {
			EventKind::SessionStarted => SessionStarted {
				is_returning_user: true,
				days_since_last_session: Some(3),
			}
			.into(),
			EventKind::SessionEnded => SessionEnded {
				session_duration_seconds: 600,
				decisions_started: 2,
				decisions_completed: 1,
			}
			.into(),
			EventKind::DiscussionStarted => DiscussionStarted {
				decision_id: "d-1".to_string(),
				decision_type: "career".to_string(),
				option_count: 3,
			}
			.into(),
			EventKind::DecisionCompleted => DecisionCompleted {
				decision_id: "d-1".to_string(),
				decision_type: "career".to_string(),
				chosen_option: "stay".to_string(),
				time_to_decide_seconds: 420,
			}
			.into(),
			EventKind::DecisionAbandoned => DecisionAbandoned {
				decision_id: "d-2".to_string(),
				last_step: "weigh_options".to_string(),
				time_spent_seconds: 90,
			}
			.into(),
			EventKind::AiInteracted => AiInteracted {
				interaction_type: "suggest_options".to_string(),
				response_time_ms: 1200,
				succeeded: true,
				decision_id: None,
				topics: vec!["money".to_string()],
			}
			.into(),
			EventKind::FeedbackClicked => FeedbackClicked {
				source: "settings".to_string(),
			}
			.into(),
			EventKind::FeedbackSubmitted => FeedbackSubmitted {
				feedback_text: "great app".to_string(),
				rating: None,
			}
			.into(),
		}
	}

	#[test]
	fn test_payloads_carry_every_required_field() {
		for kind in EventKind::ALL {
			let event = sample(kind);
			assert_eq!(event.kind(), kind);
			let props = event.into_properties().unwrap();
			for field in kind.required_fields() {
				assert!(props.contains_key(field), "{kind} payload lacks {field}");
			}
			assert!(props.validate_primitive().is_ok());
		}
	}

	#[test]
	fn test_from_properties_accepts_serialized_payloads() {
		for kind in EventKind::ALL {
			let event = sample(kind);
			let props = event.clone().into_properties().unwrap();
			assert_eq!(Event::from_properties(kind, props).unwrap(), event);
		}
	}

	#[test]
	fn test_optional_fields_are_omitted_when_unset() {
		let props = Event::from(FeedbackSubmitted {
			feedback_text: "ok".to_string(),
			rating: None,
		})
		.into_properties()
		.unwrap();
		assert_eq!(props.len(), 1);
		assert!(!props.contains_key("rating"));
	}

	#[test]
	fn test_missing_required_field_names_the_field() {
		let err = Event::from_properties(
			EventKind::DecisionAbandoned,
			Properties::new()
				.insert("decision_id", "d-9")
				.insert("time_spent_seconds", 5),
		)
		.unwrap_err();

		match err {
			CatalogError::InvalidPayload { kind, reason } => {
				assert_eq!(kind, EventKind::DecisionAbandoned);
				assert!(reason.contains("last_step"), "reason was {reason}");
			}
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[test]
	fn test_wrong_field_type_is_rejected() {
		let result = Event::from_properties(
			EventKind::SessionStarted,
			Properties::new().insert("is_returning_user", "yes"),
		);
		assert!(matches!(result, Err(CatalogError::InvalidPayload { .. })));
	}

	#[test]
	fn test_nested_values_are_rejected_before_schema_check() {
		let result = Event::from_properties(
			EventKind::FeedbackClicked,
			Properties::new().insert("source", json!({"screen": "home"})),
		);
		assert!(matches!(result, Err(CatalogError::NonPrimitiveValue { .. })));
	}
}
