// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for beacon product analytics.
//!
//! This crate holds the closed event catalog and the payload shapes shared by
//! the client SDK (`beacon-analytics`) and anything that inspects its output.
//!
//! # Overview
//!
//! - [`EventKind`] and [`Category`]: the catalog, with required fields per kind
//! - [`Event`]: one variant per kind, each carrying its typed payload record
//! - [`Properties`]: flat property maps for payloads and profiles
//! - [`UserIdentity`]: the identify payload
//!
//! # Example
//!
//! ```
//! use beacon_analytics_core::{Category, Event, EventKind, FeedbackSubmitted};
//!
//! let event = Event::from(FeedbackSubmitted {
//!     feedback_text: "great app".to_string(),
//!     rating: Some(5),
//! });
//! assert_eq!(event.kind(), EventKind::FeedbackSubmitted);
//! assert_eq!(event.category(), Category::Feedback);
//!
//! let props = event.into_properties().unwrap();
//! assert_eq!(props.get("rating"), Some(&serde_json::json!(5)));
//! ```

pub mod catalog;
pub mod error;
pub mod event;
pub mod identify;
pub mod properties;

pub use catalog::{Category, EventKind};
pub use error::{CatalogError, Result};
pub use event::{
	AiInteracted, DecisionAbandoned, DecisionCompleted, DiscussionStarted, Event, FeedbackClicked,
	FeedbackSubmitted, SessionEnded, SessionStarted,
};
pub use identify::{validate_user_id, UserIdentity, MAX_USER_ID_LENGTH};
pub use properties::Properties;

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn feedback_text_survives_dynamic_validation(text in ".{0,200}") {
			let event = Event::from_properties(
				EventKind::FeedbackSubmitted,
				Properties::new().insert("feedback_text", text.clone()),
			).unwrap();
			prop_assert_eq!(
				event,
				Event::FeedbackSubmitted(FeedbackSubmitted { feedback_text: text, rating: None })
			);
		}
	}
}
