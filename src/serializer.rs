//! The derived serializer
//!
//! A [`RecordSerializer`] is derived once per record type and shared through
//! the registry. It owns everything the crate knows about a record beyond
//! its serde implementation: the component name, the declared fields, the
//! configured field selection, and the rendered example payload.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use utoipa::openapi::path::{Parameter, ParameterBuilder, ParameterIn};
use utoipa::openapi::schema::{ObjectBuilder, Schema, SchemaType, Type};
use utoipa::openapi::{Ref, RefOr, Required};

use crate::fields::{Field, FieldKind, FieldSchema, component_ref};
use crate::record::{AutoSerialize, FieldSelection};

/// Derived converter between a record type and its plain data representation
///
/// Obtained through [`AutoSerialize::serializer`]; never constructed by
/// application code. The serializer's name always equals the record type's
/// name, and at most one serializer exists per record type per process.
#[derive(Debug)]
pub struct RecordSerializer {
	name: &'static str,
	fields: Vec<Field>,
	selection: FieldSelection,
	example: Option<Value>,
}

impl RecordSerializer {
	/// Derive the serializer for a record type
	///
	/// The example payload is rendered here, through the same serialization
	/// and field selection as `to_data`, so the attached example is exactly
	/// what the record's example factory would produce on the wire.
	pub(crate) fn derive<T: AutoSerialize>() -> Self {
		let mut serializer = Self {
			name: T::record_name(),
			fields: T::record_fields(),
			selection: T::fields(),
			example: None,
		};
		serializer.example = T::example().and_then(|record| serializer.render_example(&record));
		serializer
	}

	fn render_example(&self, record: &impl serde::Serialize) -> Option<Value> {
		match serde_json::to_value(record) {
			Ok(Value::Object(mut map)) => {
				self.apply_selection(&mut map);
				Some(Value::Object(map))
			}
			Ok(_) => {
				tracing::warn!("example for '{}' is not an object; dropping it", self.name);
				None
			}
			Err(e) => {
				tracing::warn!("failed to render example for '{}': {}", self.name, e);
				None
			}
		}
	}

	/// The schema component name; equals the record type's name
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// All declared fields, before selection
	pub fn fields(&self) -> &[Field] {
		&self.fields
	}

	/// The configured field selection
	pub fn selection(&self) -> &FieldSelection {
		&self.selection
	}

	/// Names of the fields the serializer exposes, in declaration order
	pub fn field_names(&self) -> Vec<&'static str> {
		self.selected_fields().map(Field::name).collect()
	}

	/// The rendered example payload, if the record type provides one
	pub fn example(&self) -> Option<&Value> {
		self.example.as_ref()
	}

	/// Whether a field is declared and included by the selection
	pub fn is_field_included(&self, name: &str) -> bool {
		self.fields.iter().any(|f| f.name() == name) && self.selection.includes(name)
	}

	fn selected_fields(&self) -> impl Iterator<Item = &Field> {
		self.fields
			.iter()
			.filter(|f| self.selection.includes(f.name()))
	}

	/// Restrict a serialized map to the declared, selected fields
	///
	/// Recurses into declared record values and array items, so each nested
	/// record is filtered by its own type's selection.
	pub(crate) fn apply_selection(&self, data: &mut Map<String, Value>) {
		data.retain(|key, _| self.is_field_included(key));
		for field in &self.fields {
			if let Some(value) = data.get_mut(field.name()) {
				field.schema().filter_nested(value);
			}
		}
	}

	/// The full object schema for this record
	///
	/// Title is the record name; properties and the required list cover the
	/// selected fields; the rendered example is attached when present, under
	/// the single 3.0-style `example` key utoipa marks deprecated.
	#[allow(deprecated)]
	pub fn schema(&self) -> Schema {
		let mut builder = ObjectBuilder::new()
			.schema_type(SchemaType::Type(Type::Object))
			.title(Some(self.name));

		for field in self.selected_fields() {
			builder = builder.property(field.name(), field.schema().to_openapi());
			if field.schema().is_required() {
				builder = builder.required(field.name());
			}
		}

		if let Some(example) = &self.example {
			builder = builder.example(Some(example.clone()));
		}

		Schema::Object(builder.build())
	}

	/// A `$ref` to this record's component schema
	pub fn schema_ref(&self) -> RefOr<Schema> {
		RefOr::Ref(Ref::new(component_ref(self.name)))
	}

	/// Query parameters describing the selected fields
	///
	/// Query strings are flat, so only scalar fields are representable;
	/// nested record and array fields are skipped with a warning.
	pub fn query_parameters(&self) -> Vec<Parameter> {
		let mut parameters = Vec::new();

		for field in self.selected_fields() {
			if !field.schema().is_scalar() {
				tracing::warn!(
					"field '{}' of '{}' cannot be expressed as a query parameter",
					field.name(),
					self.name
				);
				continue;
			}

			let required = if field.schema().is_required() {
				Required::True
			} else {
				Required::False
			};

			parameters.push(
				ParameterBuilder::new()
					.name(field.name())
					.parameter_in(ParameterIn::Query)
					.required(required)
					.schema(Some(field.schema().to_openapi()))
					.build(),
			);
		}

		parameters
	}

	/// Collect this record's schema and every transitively nested one
	///
	/// Keyed by component name and deduplicated, so mutually-referencing
	/// record graphs terminate.
	pub fn collect_schemas(&self, schemas: &mut IndexMap<String, Schema>) {
		if schemas.contains_key(self.name) {
			return;
		}
		schemas.insert(self.name.to_string(), self.schema());

		for field in self.selected_fields() {
			collect_nested(field.schema(), schemas);
		}
	}
}

fn collect_nested(schema: &FieldSchema, schemas: &mut IndexMap<String, Schema>) {
	match schema.kind() {
		FieldKind::Record { serializer, .. } => (serializer)().collect_schemas(schemas),
		FieldKind::Array(items) => collect_nested(items, schemas),
		_ => {}
	}
}
