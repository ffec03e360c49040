//! Per-type serializer registry
//!
//! Derived serializers are memoized here, keyed by `TypeId`. Population is
//! explicit and idempotent: the first caller derives, concurrent callers may
//! derive redundantly but exactly one result is kept, and every later call
//! observes that same shared instance.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

use indexmap::IndexMap;
use utoipa::openapi::{Components, ComponentsBuilder};

use crate::record::AutoSerialize;
use crate::serializer::RecordSerializer;

/// A registry of derived serializers keyed by record type identity
///
/// A process-global instance backs [`AutoSerialize::serializer`]; separate
/// instances can be created for isolated schema collections.
///
/// # Examples
///
/// ```
/// use reinhardt_autoserialize::{AutoSerialize, Field, SerializerRegistry};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Tag {
///     label: String,
/// }
///
/// impl AutoSerialize for Tag {
///     fn record_fields() -> Vec<Field> {
///         vec![Field::new::<String>("label")]
///     }
/// }
///
/// let registry = SerializerRegistry::new();
/// let serializer = registry.get_or_derive::<Tag>();
/// assert_eq!(serializer.name(), "Tag");
/// assert!(registry.contains::<Tag>());
/// ```
#[derive(Clone)]
pub struct SerializerRegistry {
	serializers: Arc<Mutex<HashMap<TypeId, Arc<RecordSerializer>>>>,
}

impl SerializerRegistry {
	/// Create a new empty registry
	pub fn new() -> Self {
		Self {
			serializers: Arc::new(Mutex::new(HashMap::new())),
		}
	}

	/// Get the serializer for a record type, deriving it on first use
	///
	/// Derivation happens outside the lock: user hooks may look up other
	/// serializers, and a concurrent caller may race the derivation. The
	/// race is resolved by keeping whichever entry lands first and
	/// discarding the duplicate.
	pub fn get_or_derive<T: AutoSerialize>(&self) -> Arc<RecordSerializer> {
		let type_id = TypeId::of::<T>();

		if let Some(existing) = self.serializers.lock().unwrap().get(&type_id) {
			return existing.clone();
		}

		let derived = Arc::new(RecordSerializer::derive::<T>());

		let mut serializers = self.serializers.lock().unwrap();
		serializers
			.entry(type_id)
			.or_insert_with(|| {
				tracing::debug!("derived serializer for '{}'", derived.name());
				derived.clone()
			})
			.clone()
	}

	/// Get the serializer for a record type, if already derived
	pub fn get<T: 'static>(&self) -> Option<Arc<RecordSerializer>> {
		let serializers = self.serializers.lock().unwrap();
		serializers.get(&TypeId::of::<T>()).cloned()
	}

	/// Whether a serializer has been derived for the type
	pub fn contains<T: 'static>(&self) -> bool {
		let serializers = self.serializers.lock().unwrap();
		serializers.contains_key(&TypeId::of::<T>())
	}

	/// Number of derived serializers
	pub fn len(&self) -> usize {
		let serializers = self.serializers.lock().unwrap();
		serializers.len()
	}

	/// Whether the registry is empty
	pub fn is_empty(&self) -> bool {
		let serializers = self.serializers.lock().unwrap();
		serializers.is_empty()
	}

	/// Remove every derived serializer
	///
	/// Later lookups re-derive. Intended for tests on isolated registries.
	pub fn clear(&self) {
		let mut serializers = self.serializers.lock().unwrap();
		serializers.clear();
	}

	/// Export every registered schema to OpenAPI `Components`
	///
	/// Includes schemas reached through nested record fields even when the
	/// nested type was never registered directly. Output is ordered by
	/// component name so documents render deterministically.
	pub fn to_components(&self) -> Components {
		let mut entries: Vec<Arc<RecordSerializer>> = {
			let serializers = self.serializers.lock().unwrap();
			serializers.values().cloned().collect()
		};
		// Nested lookups during collection can re-enter this registry,
		// so the lock is released before walking the entries.
		entries.sort_by_key(|s| s.name());

		let mut schemas = IndexMap::new();
		for serializer in &entries {
			serializer.collect_schemas(&mut schemas);
		}

		let mut builder = ComponentsBuilder::new();
		for (name, schema) in schemas {
			builder = builder.schema(name, schema);
		}
		builder.build()
	}
}

impl Default for SerializerRegistry {
	fn default() -> Self {
		Self::new()
	}
}

static GLOBAL_REGISTRY: LazyLock<SerializerRegistry> = LazyLock::new(SerializerRegistry::new);

/// The memoized serializer for a record type, from the global registry
pub fn serializer_for<T: AutoSerialize>() -> Arc<RecordSerializer> {
	GLOBAL_REGISTRY.get_or_derive::<T>()
}

/// The process-global registry backing [`AutoSerialize::serializer`]
pub fn global_registry() -> &'static SerializerRegistry {
	&GLOBAL_REGISTRY
}

#[cfg(test)]
mod tests {
	use serde::{Deserialize, Serialize};

	use super::*;
	use crate::fields::Field;

	#[derive(Debug, Serialize, Deserialize)]
	struct City {
		name: String,
		population: u64,
	}

	impl AutoSerialize for City {
		fn record_fields() -> Vec<Field> {
			vec![
				Field::new::<String>("name"),
				Field::new::<u64>("population"),
			]
		}
	}

	#[derive(Debug, Serialize, Deserialize)]
	struct Country {
		name: String,
		capital: City,
	}

	impl AutoSerialize for Country {
		fn record_fields() -> Vec<Field> {
			vec![
				Field::new::<String>("name"),
				Field::record::<City>("capital"),
			]
		}
	}

	#[test]
	fn test_get_or_derive_memoizes() {
		let registry = SerializerRegistry::new();
		let first = registry.get_or_derive::<City>();
		let second = registry.get_or_derive::<City>();
		assert!(Arc::ptr_eq(&first, &second));
	}

	#[test]
	fn test_get_before_derivation() {
		let registry = SerializerRegistry::new();
		assert!(registry.get::<City>().is_none());
		assert!(!registry.contains::<City>());

		registry.get_or_derive::<City>();
		assert!(registry.get::<City>().is_some());
		assert!(registry.contains::<City>());
	}

	#[test]
	fn test_len_and_clear() {
		let registry = SerializerRegistry::new();
		assert!(registry.is_empty());

		registry.get_or_derive::<City>();
		registry.get_or_derive::<Country>();
		assert_eq!(registry.len(), 2);

		registry.clear();
		assert!(registry.is_empty());
	}

	#[test]
	fn test_clear_then_rederive() {
		let registry = SerializerRegistry::new();
		let first = registry.get_or_derive::<City>();
		registry.clear();
		let second = registry.get_or_derive::<City>();
		assert!(!Arc::ptr_eq(&first, &second));
		assert_eq!(first.name(), second.name());
	}

	#[test]
	fn test_global_serializer_is_shared() {
		let first = serializer_for::<City>();
		let second = serializer_for::<City>();
		assert!(Arc::ptr_eq(&first, &second));
	}

	#[test]
	fn test_to_components_includes_nested_schemas() {
		let registry = SerializerRegistry::new();
		registry.get_or_derive::<Country>();

		let components = registry.to_components();
		assert!(components.schemas.contains_key("Country"));
		assert!(components.schemas.contains_key("City"));
	}
}
