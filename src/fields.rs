//! Field declarations for record types
//!
//! A record declares its attributes as [`Field`]s. Each field carries a
//! [`FieldSchema`] describing how the attribute maps into the OpenAPI
//! document model: primitive kind, requiredness, optional format, or a
//! reference to another record's derived schema.
//!
//! The mapping for an attribute type is provided by the [`ApiField`]
//! capability trait. Implementations exist for the primitive types plus
//! `Option<T>` and `Vec<T>`; a user type may implement it directly to
//! override the default mapping wherever that type appears as an attribute.

use std::sync::Arc;

use serde_json::{Map, Value};
use utoipa::openapi::schema::{Array, ObjectBuilder, Schema, SchemaFormat, SchemaType, Type};
use utoipa::openapi::{Ref, RefOr};

use crate::error::{AutoSerializeError, ValidationError};
use crate::record::AutoSerialize;
use crate::registry;
use crate::serializer::RecordSerializer;

/// Schema capability for attribute types
///
/// Maps a Rust type onto the field schema the derived serializer uses for
/// attributes of that type. Implementing this on your own type replaces the
/// default mapping for every attribute declared with it.
///
/// # Examples
///
/// ```
/// use reinhardt_autoserialize::{ApiField, FieldSchema};
///
/// struct Isbn(String);
///
/// impl ApiField for Isbn {
///     fn field_schema() -> FieldSchema {
///         FieldSchema::string().with_format("isbn")
///     }
/// }
///
/// assert_eq!(Isbn::field_schema().format(), Some("isbn"));
/// ```
pub trait ApiField {
	/// The schema used for attributes of this type
	fn field_schema() -> FieldSchema;
}

/// How a single attribute renders into the OpenAPI document model
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
	kind: FieldKind,
	required: bool,
	format: Option<String>,
}

/// The shape of an attribute's schema
#[derive(Debug, Clone)]
pub enum FieldKind {
	Boolean,
	Integer,
	Number,
	String,
	/// Sequence of a uniform item schema
	Array(Box<FieldSchema>),
	/// Another record's derived schema, referenced by name
	///
	/// The serializer is resolved lazily so mutually-nested record
	/// declarations never recurse while a serializer is being derived.
	/// The validator and filter captured at declaration feed nested
	/// values through the record's own hook and field selection.
	Record {
		name: &'static str,
		serializer: fn() -> Arc<RecordSerializer>,
		validate: fn(&Value) -> Result<(), ValidationError>,
		filter: fn(&mut Map<String, Value>),
	},
}

// Record fields compare by schema name; the function pointers carry no
// stable identity.
impl PartialEq for FieldKind {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(FieldKind::Boolean, FieldKind::Boolean)
			| (FieldKind::Integer, FieldKind::Integer)
			| (FieldKind::Number, FieldKind::Number)
			| (FieldKind::String, FieldKind::String) => true,
			(FieldKind::Array(left), FieldKind::Array(right)) => left == right,
			(FieldKind::Record { name: left, .. }, FieldKind::Record { name: right, .. }) => {
				left == right
			}
			_ => false,
		}
	}
}

impl FieldSchema {
	fn new(kind: FieldKind) -> Self {
		Self {
			kind,
			required: true,
			format: None,
		}
	}

	/// Boolean attribute schema
	pub fn boolean() -> Self {
		Self::new(FieldKind::Boolean)
	}

	/// Integer attribute schema
	pub fn integer() -> Self {
		Self::new(FieldKind::Integer)
	}

	/// Floating-point attribute schema
	pub fn number() -> Self {
		Self::new(FieldKind::Number)
	}

	/// String attribute schema
	pub fn string() -> Self {
		Self::new(FieldKind::String)
	}

	/// Array attribute schema with the given item schema
	pub fn array(items: FieldSchema) -> Self {
		Self::new(FieldKind::Array(Box::new(items)))
	}

	/// Nested record attribute schema
	///
	/// Renders as a `$ref` to the record's component schema.
	pub fn record<T: AutoSerialize>() -> Self {
		Self::new(FieldKind::Record {
			name: T::record_name(),
			serializer: registry::serializer_for::<T>,
			validate: validate_record_value::<T>,
			filter: filter_record_data::<T>,
		})
	}

	/// Mark the attribute as not required
	pub fn optional(mut self) -> Self {
		self.required = false;
		self
	}

	/// Attach a schema format hint (for example `"date-time"`)
	pub fn with_format(mut self, format: impl Into<String>) -> Self {
		self.format = Some(format.into());
		self
	}

	/// Wrap this schema into an array of itself
	pub fn many(self) -> Self {
		Self::array(self)
	}

	/// The schema kind
	pub fn kind(&self) -> &FieldKind {
		&self.kind
	}

	/// Whether the attribute is required
	pub fn is_required(&self) -> bool {
		self.required
	}

	/// The format hint, if any
	pub fn format(&self) -> Option<&str> {
		self.format.as_deref()
	}

	/// Whether this schema is a flat scalar, representable in a query string
	pub(crate) fn is_scalar(&self) -> bool {
		matches!(
			self.kind,
			FieldKind::Boolean | FieldKind::Integer | FieldKind::Number | FieldKind::String
		)
	}

	/// Run nested record validation over a serialized value
	///
	/// Record values are fed through their record type's own
	/// deserialization, which recurses in turn; array items are walked
	/// element-wise. Scalar kinds always pass.
	pub(crate) fn validate_nested(&self, value: &Value) -> Result<(), ValidationError> {
		match &self.kind {
			FieldKind::Record { validate, .. } => {
				if value.is_null() && !self.required {
					return Ok(());
				}
				validate(value)
			}
			FieldKind::Array(items) => {
				if let Value::Array(elements) = value {
					for element in elements {
						items.validate_nested(element)?;
					}
				}
				Ok(())
			}
			_ => Ok(()),
		}
	}

	/// Apply nested record field selections to a serialized value
	pub(crate) fn filter_nested(&self, value: &mut Value) {
		match &self.kind {
			FieldKind::Record { filter, .. } => {
				if let Value::Object(map) = value {
					filter(map);
				}
			}
			FieldKind::Array(items) => {
				if let Value::Array(elements) = value {
					for element in elements {
						items.filter_nested(element);
					}
				}
			}
			_ => {}
		}
	}

	/// Render into the OpenAPI document model
	///
	/// Nested records render as `$ref`s; everything else renders inline.
	pub fn to_openapi(&self) -> RefOr<Schema> {
		match &self.kind {
			FieldKind::Boolean => self.primitive(Type::Boolean),
			FieldKind::Integer => self.primitive(Type::Integer),
			FieldKind::Number => self.primitive(Type::Number),
			FieldKind::String => self.primitive(Type::String),
			FieldKind::Array(items) => RefOr::T(Schema::Array(Array::new(items.to_openapi()))),
			FieldKind::Record { name, .. } => RefOr::Ref(Ref::new(component_ref(name))),
		}
	}

	fn primitive(&self, ty: Type) -> RefOr<Schema> {
		let mut builder = ObjectBuilder::new().schema_type(SchemaType::Type(ty));
		if let Some(format) = &self.format {
			builder = builder.format(Some(SchemaFormat::Custom(format.clone())));
		}
		RefOr::T(Schema::Object(builder.build()))
	}
}

/// The `$ref` location for a named record component
pub(crate) fn component_ref(name: &str) -> String {
	format!("#/components/schemas/{}", name)
}

fn validate_record_value<T: AutoSerialize>(value: &Value) -> Result<(), ValidationError> {
	let Value::Object(data) = value else {
		return Err(ValidationError::deserialize(format!(
			"expected a '{}' object",
			T::record_name()
		)));
	};
	match T::from_data(data.clone()) {
		Ok(_) => Ok(()),
		Err(AutoSerializeError::Validation(error)) => Err(error),
		Err(error) => Err(ValidationError::custom(error.message())),
	}
}

// Declaration-driven rather than registry-driven: example rendering runs
// during derivation, which must not re-enter the registry.
fn filter_record_data<T: AutoSerialize>(data: &mut Map<String, Value>) {
	let fields = T::record_fields();
	let selection = T::fields();
	data.retain(|key, _| fields.iter().any(|f| f.name() == key) && selection.includes(key));
	for field in &fields {
		if let Some(value) = data.get_mut(field.name()) {
			field.schema().filter_nested(value);
		}
	}
}

/// A declared attribute of a record type
///
/// # Examples
///
/// ```
/// use reinhardt_autoserialize::Field;
///
/// let field = Field::new::<f64>("x");
/// assert_eq!(field.name(), "x");
/// assert!(field.schema().is_required());
///
/// let field = Field::new::<Option<String>>("nickname");
/// assert!(!field.schema().is_required());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
	name: &'static str,
	schema: FieldSchema,
}

impl Field {
	/// Declare an attribute using its type's default schema capability
	pub fn new<T: ApiField>(name: &'static str) -> Self {
		Self {
			name,
			schema: T::field_schema(),
		}
	}

	/// Declare a nested record attribute
	pub fn record<T: AutoSerialize>(name: &'static str) -> Self {
		Self {
			name,
			schema: FieldSchema::record::<T>(),
		}
	}

	/// Declare an attribute with an explicit schema
	pub fn with_schema(name: &'static str, schema: FieldSchema) -> Self {
		Self { name, schema }
	}

	/// Mark the attribute as not required
	pub fn optional(mut self) -> Self {
		self.schema = self.schema.optional();
		self
	}

	/// Turn the attribute into a sequence of its declared schema
	pub fn many(mut self) -> Self {
		self.schema = self.schema.many();
		self
	}

	/// The attribute name
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// The attribute schema
	pub fn schema(&self) -> &FieldSchema {
		&self.schema
	}
}

impl ApiField for bool {
	fn field_schema() -> FieldSchema {
		FieldSchema::boolean()
	}
}

impl ApiField for String {
	fn field_schema() -> FieldSchema {
		FieldSchema::string()
	}
}

impl ApiField for f32 {
	fn field_schema() -> FieldSchema {
		FieldSchema::number()
	}
}

impl ApiField for f64 {
	fn field_schema() -> FieldSchema {
		FieldSchema::number()
	}
}

macro_rules! integer_api_field {
	($($ty:ty),* $(,)?) => {
		$(
			impl ApiField for $ty {
				fn field_schema() -> FieldSchema {
					FieldSchema::integer()
				}
			}
		)*
	};
}

integer_api_field!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl<T: ApiField> ApiField for Option<T> {
	fn field_schema() -> FieldSchema {
		T::field_schema().optional()
	}
}

impl<T: ApiField> ApiField for Vec<T> {
	fn field_schema() -> FieldSchema {
		T::field_schema().many()
	}
}
