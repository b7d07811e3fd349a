//! Extension payloads attached to document entities, and the registry that types them.

use std::{any::Any, collections::BTreeMap, sync::Arc};

use rustc_hash::FxHashMap;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

pub mod khr;

pub use khr::*;

/// A typed extension payload created by a registered factory.
#[derive(Clone)]
pub struct ExtensionInstance {
	inner: Arc<dyn Any + Send + Sync>,
}

impl ExtensionInstance {
	pub fn new<T: Any + Send + Sync>(v: T) -> Self {
		Self { inner: Arc::new(v) }
	}

	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.inner.downcast_ref::<T>()
	}
}

impl std::fmt::Debug for ExtensionInstance {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("ExtensionInstance")
	}
}

/// One entry of an `extensions` object.
///
/// The json is always kept so unknown extensions survive untouched.
#[derive(Debug, Clone)]
pub struct ExtensionValue {
	raw: Value,
	instance: Option<ExtensionInstance>,
}

impl ExtensionValue {
	pub fn raw(&self) -> &Value {
		&self.raw
	}

	pub fn is_typed(&self) -> bool {
		self.instance.is_some()
	}

	pub fn instance(&self) -> Option<&ExtensionInstance> {
		self.instance.as_ref()
	}
}

// the instance is derived from the json, so only the json takes part
impl PartialEq for ExtensionValue {
	fn eq(&self, other: &Self) -> bool {
		self.raw == other.raw
	}
}

/// The `extensions` object of a document entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extensions {
	entries: BTreeMap<String, ExtensionValue>,
}

impl<'de> Deserialize<'de> for Extensions {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
		Ok(Self {
			entries: raw.into_iter().map(|(name, raw)| (name, ExtensionValue { raw, instance: None })).collect(),
		})
	}
}

impl Extensions {
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.entries.contains_key(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &ExtensionValue)> {
		self.entries.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn raw(&self, name: &str) -> Option<&Value> {
		self.entries.get(name).map(|e| &e.raw)
	}

	/// The typed payload for `name`, if a factory for it was registered when the document was parsed.
	pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
		self.entries.get(name)?.instance.as_ref()?.downcast_ref::<T>()
	}

	/// Decodes the payload for `name` on demand, whether or not it is registered.
	pub fn decode<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
		serde_json::from_value(self.entries.get(name)?.raw.clone()).ok()
	}

	/// Creates typed instances for every entry with a registered factory.
	pub fn attach(&mut self, registry: &ExtensionRegistry) {
		for (name, entry) in self.entries.iter_mut() {
			entry.instance = registry.try_create(name, &entry.raw);
			if entry.instance.is_none() && registry.is_registered(name) {
				log::debug!("extension {name} is registered but its payload did not decode");
			}
		}
	}
}

type Factory = Box<dyn Fn(&Value) -> Option<ExtensionInstance> + Send + Sync>;

/// Maps extension names to factories producing typed payloads.
///
/// Populate it once before parsing, then share it by reference. Parsing never mutates it.
#[derive(Default)]
pub struct ExtensionRegistry {
	factories: FxHashMap<String, Factory>,
}

impl ExtensionRegistry {
	/// An empty registry, every extension stays opaque json.
	pub fn new() -> Self {
		Self::default()
	}

	/// A registry with all the Khronos extensions this crate has payload types for.
	pub fn khronos() -> Self {
		let mut registry = Self::new();
		khr::register_all(&mut registry);
		registry
	}

	pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
	where F: Fn(&Value) -> Option<ExtensionInstance> + Send + Sync + 'static {
		self.factories.insert(name.into(), Box::new(factory));
	}

	/// Registers a factory that deserializes the payload into `T`.
	pub fn register_typed<T: DeserializeOwned + Send + Sync + 'static>(&mut self, name: impl Into<String>) {
		self.register(name, |raw| {
			serde_json::from_value::<T>(raw.clone()).ok().map(ExtensionInstance::new)
		});
	}

	pub fn try_create(&self, name: &str, raw: &Value) -> Option<ExtensionInstance> {
		self.factories.get(name).and_then(|factory| factory(raw))
	}

	pub fn is_registered(&self, name: &str) -> bool {
		self.factories.contains_key(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.factories.keys().map(String::as_str)
	}
}

impl std::fmt::Debug for ExtensionRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut names = self.names().collect::<Vec<_>>();
		names.sort_unstable();
		f.debug_struct("ExtensionRegistry").field("factories", &names).finish()
	}
}
