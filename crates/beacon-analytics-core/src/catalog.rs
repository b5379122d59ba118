// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The closed catalog of event kinds.
//!
//! Every event the client can record is listed here together with its
//! category and the payload fields it requires. Adding an event is a catalog
//! edit: a new [`EventKind`] variant, its entry in [`EventKind::ALL`], and a
//! payload record in [`crate::event`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Coarse grouping attached to every event as `event_category`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
	Session,
	DecisionFlow,
	#[serde(rename = "AIInteraction")]
	AiInteraction,
	Feedback,
}

impl Category {
	pub fn as_str(&self) -> &'static str {
		match self {
			Category::Session => "Session",
			Category::DecisionFlow => "DecisionFlow",
			Category::AiInteraction => "AIInteraction",
			Category::Feedback => "Feedback",
		}
	}
}

impl fmt::Display for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Identifier of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
	SessionStarted,
	SessionEnded,
	DiscussionStarted,
	DecisionCompleted,
	DecisionAbandoned,
	#[serde(rename = "AIInteracted")]
	AiInteracted,
	FeedbackClicked,
	FeedbackSubmitted,
}

impl EventKind {
	/// Every catalog entry, in declaration order.
	pub const ALL: [EventKind; 8] = [
		EventKind::SessionStarted,
		EventKind::SessionEnded,
		EventKind::DiscussionStarted,
		EventKind::DecisionCompleted,
		EventKind::DecisionAbandoned,
		EventKind::AiInteracted,
		EventKind::FeedbackClicked,
		EventKind::FeedbackSubmitted,
	];

	/// The event name sent to the sink.
	pub fn as_str(&self) -> &'static str {
		match self {
			EventKind::SessionStarted => "SessionStarted",
			EventKind::SessionEnded => "SessionEnded",
			EventKind::DiscussionStarted => "DiscussionStarted",
			EventKind::DecisionCompleted => "DecisionCompleted",
			EventKind::DecisionAbandoned => "DecisionAbandoned",
			EventKind::AiInteracted => "AIInteracted",
			EventKind::FeedbackClicked => "FeedbackClicked",
			EventKind::FeedbackSubmitted => "FeedbackSubmitted",
		}
	}

	pub fn category(&self) -> Category {
		match self {
			EventKind::SessionStarted | EventKind::SessionEnded => Category::Session,
			EventKind::DiscussionStarted
			| EventKind::DecisionCompleted
			| EventKind::DecisionAbandoned => Category::DecisionFlow,
			EventKind::AiInteracted => Category::AiInteraction,
			EventKind::FeedbackClicked | EventKind::FeedbackSubmitted => Category::Feedback,
		}
	}

	/// Payload fields that must be present before the event is queued or sent.
	///
	/// `event_category` and `timestamp` are filled in by the tracker and are
	/// not listed.
	pub fn required_fields(&self) -> &'static [&'static str] {
		match self {
			EventKind::SessionStarted => &["is_returning_user"],
			EventKind::SessionEnded => &[
				"session_duration_seconds",
				"decisions_started",
				"decisions_completed",
			],
			EventKind::DiscussionStarted => &["decision_id", "decision_type", "option_count"],
			EventKind::DecisionCompleted => &[
				"decision_id",
				"decision_type",
				"chosen_option",
				"time_to_decide_seconds",
			],
			EventKind::DecisionAbandoned => &["decision_id", "last_step", "time_spent_seconds"],
			EventKind::AiInteracted => &["interaction_type", "response_time_ms", "succeeded"],
			EventKind::FeedbackClicked => &["source"],
			EventKind::FeedbackSubmitted => &["feedback_text"],
		}
	}
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for EventKind {
	type Err = CatalogError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		EventKind::ALL
			.into_iter()
			.find(|kind| kind.as_str() == s)
			.ok_or_else(|| CatalogError::UnknownEvent(s.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_every_kind_round_trips_through_its_name() {
		for kind in EventKind::ALL {
			assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
		}
	}

	#[test]
	fn test_unknown_name_is_rejected() {
		let err = "PageViewed".parse::<EventKind>().unwrap_err();
		assert!(matches!(err, CatalogError::UnknownEvent(name) if name == "PageViewed"));
	}

	#[test]
	fn test_categories() {
		assert_eq!(EventKind::SessionStarted.category(), Category::Session);
		assert_eq!(EventKind::DiscussionStarted.category(), Category::DecisionFlow);
		assert_eq!(EventKind::AiInteracted.category(), Category::AiInteraction);
		assert_eq!(EventKind::FeedbackSubmitted.category(), Category::Feedback);
		assert_eq!(Category::AiInteraction.as_str(), "AIInteraction");
	}

	#[test]
	fn test_serde_names_match_wire_names() {
		for kind in EventKind::ALL {
			let json = serde_json::to_value(kind).unwrap();
			assert_eq!(json, serde_json::Value::String(kind.as_str().to_string()));
			let category = serde_json::to_value(kind.category()).unwrap();
			assert_eq!(category.as_str(), Some(kind.category().as_str()));
		}
	}

	#[test]
	fn test_required_fields_never_include_auto_filled_fields() {
		for kind in EventKind::ALL {
			let fields = kind.required_fields();
			assert!(!fields.is_empty(), "{kind} has no required fields");
			assert!(!fields.contains(&"event_category"));
			assert!(!fields.contains(&"timestamp"));
		}
	}

	proptest! {
		#[test]
		fn arbitrary_lowercase_names_are_unknown(name in "[a-z_]{1,30}") {
			prop_assert!(name.parse::<EventKind>().is_err());
		}
	}
}
