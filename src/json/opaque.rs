use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Fields of an entity that the schema does not know about.
///
/// They are kept as parsed so newer or vendor specific fields are not lost.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(transparent)]
pub struct Unclassified(pub BTreeMap<String, Value>);

impl Unclassified {
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	/// Attempts to decode the field `key` as `T`.
	pub fn try_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
		serde_json::from_value(self.0.get(key)?.clone()).ok()
	}
}

/// The application specific `extras` of an entity.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(transparent)]
pub struct Extras(pub Option<Value>);

impl Extras {
	pub fn is_empty(&self) -> bool {
		self.0.is_none()
	}

	pub fn value(&self) -> Option<&Value> {
		self.0.as_ref()
	}

	/// Decodes the whole `extras` value as `T`.
	pub fn decode<T: DeserializeOwned>(&self) -> Option<T> {
		serde_json::from_value(self.0.clone()?).ok()
	}

	/// Decodes the member `key` of an object `extras` as `T`.
	pub fn try_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
		serde_json::from_value(self.0.as_ref()?.get(key)?.clone()).ok()
	}
}
