// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Flat property maps carried by events, identities and registered defaults.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CatalogError, Result};

/// A builder-style map of named properties.
///
/// Event payloads only admit primitives (string, number, bool, null) and
/// arrays of primitives; [`Properties::validate_primitive`] checks this.
///
/// # Example
///
/// ```
/// use beacon_analytics_core::Properties;
///
/// let props = Properties::new()
///     .insert("plan", "pro")
///     .insert("seats", 5)
///     .insert("beta", true);
/// assert_eq!(props.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties {
	inner: Map<String, Value>,
}

impl Properties {
	pub fn new() -> Self {
		Self { inner: Map::new() }
	}

	/// Inserts a key-value pair, replacing any previous value for the key.
	pub fn insert<K, V>(mut self, key: K, value: V) -> Self
	where
		K: Into<String>,
		V: Into<Value>,
	{
		self.inner.insert(key.into(), value.into());
		self
	}

	/// Sets `key` only when it is not already present.
	pub fn insert_if_absent<K, V>(&mut self, key: K, value: impl FnOnce() -> V)
	where
		K: Into<String>,
		V: Into<Value>,
	{
		self.inner.entry(key.into()).or_insert_with(|| value().into());
	}

	/// Overwrites `key` in place.
	pub fn set<K, V>(&mut self, key: K, value: V)
	where
		K: Into<String>,
		V: Into<Value>,
	{
		self.inner.insert(key.into(), value.into());
	}

	/// Merges another map into this one; values from `other` win.
	pub fn merge(mut self, other: Properties) -> Self {
		self.extend(other);
		self
	}

	/// In-place form of [`Properties::merge`].
	pub fn extend(&mut self, other: Properties) {
		for (k, v) in other.inner {
			self.inner.insert(k, v);
		}
	}

	/// Takes `key` out of the map.
	pub fn remove(&mut self, key: &str) -> Option<Value> {
		self.inner.remove(key)
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.inner.get(key)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.inner.contains_key(key)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
		self.inner.iter()
	}

	/// Fails on the first value that is an object or an array holding
	/// anything other than primitives.
	pub fn validate_primitive(&self) -> Result<()> {
		for (key, value) in &self.inner {
			let ok = match value {
				Value::Object(_) => false,
				Value::Array(items) => items
					.iter()
					.all(|item| !matches!(item, Value::Array(_) | Value::Object(_))),
				_ => true,
			};
			if !ok {
				return Err(CatalogError::NonPrimitiveValue { key: key.clone() });
			}
		}
		Ok(())
	}

	pub fn into_map(self) -> Map<String, Value> {
		self.inner
	}

	pub fn into_value(self) -> Value {
		Value::Object(self.inner)
	}
}

impl From<Properties> for Value {
	fn from(props: Properties) -> Self {
		props.into_value()
	}
}

impl From<Value> for Properties {
	fn from(value: Value) -> Self {
		match value {
			Value::Object(map) => Self { inner: map },
			_ => Self::new(),
		}
	}
}

impl From<Map<String, Value>> for Properties {
	fn from(map: Map<String, Value>) -> Self {
		Self { inner: map }
	}
}

impl IntoIterator for Properties {
	type Item = (String, Value);
	type IntoIter = serde_json::map::IntoIter;

	fn into_iter(self) -> Self::IntoIter {
		self.inner.into_iter()
	}
}
