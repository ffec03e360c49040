//! The self-serializing record trait
//!
//! [`AutoSerialize`] glues a plain serde record type to the HTTP layer: a
//! conforming type gains conversion to and from plain JSON mappings, request
//! extraction for GET and POST, JSON response assembly, and a derived
//! serializer with an OpenAPI schema. The only required declaration is the
//! field list; name, field selection, validation, and example are optional
//! capabilities with defaults.

use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Response, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{AutoSerializeError, AutoSerializeResult, ValidationError};
use crate::fields::Field;
use crate::registry;
use crate::serializer::RecordSerializer;

/// Which declared fields the derived serializer exposes
///
/// Applies to serialized output, the derived schema, query parameters, and
/// the rendered example. A record nested inside another is filtered by its
/// own type's selection wherever it appears. Deserialization always accepts
/// the full record: serde needs every non-optional attribute to construct it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldSelection {
	/// Every declared field
	#[default]
	All,
	/// Only the named fields
	Only(Vec<&'static str>),
	/// Every declared field except the named ones
	Except(Vec<&'static str>),
}

impl FieldSelection {
	/// Whether a field name passes this selection
	pub fn includes(&self, name: &str) -> bool {
		match self {
			FieldSelection::All => true,
			FieldSelection::Only(names) => names.iter().any(|n| *n == name),
			FieldSelection::Except(names) => !names.iter().any(|n| *n == name),
		}
	}
}

/// Records that serialize themselves to and from the HTTP layer
///
/// Implementing this trait on a serde record type derives a serializer for
/// it (memoized per type), wires a validation hook into every
/// deserialization path, and exposes conversion methods for request and
/// response handling.
///
/// # Examples
///
/// ```
/// use reinhardt_autoserialize::{AutoSerialize, Field, ValidationError};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// struct Point {
///     x: f64,
///     y: f64,
/// }
///
/// impl AutoSerialize for Point {
///     fn record_fields() -> Vec<Field> {
///         vec![Field::new::<f64>("x"), Field::new::<f64>("y")]
///     }
///
///     fn validate(point: Self) -> Result<Self, ValidationError> {
///         if point.x + point.y > 1000.0 {
///             return Err(ValidationError::custom("too far"));
///         }
///         Ok(point)
///     }
/// }
///
/// let point = Point { x: 1.2, y: 3.4 };
/// let data = point.to_data().unwrap();
/// assert_eq!(data["x"], 1.2);
///
/// let back = Point::from_data(data).unwrap();
/// assert_eq!(back, point);
///
/// assert_eq!(Point::serializer().name(), "Point");
/// ```
pub trait AutoSerialize: Serialize + DeserializeOwned + Sized + 'static {
	/// The fields the derived serializer maps
	///
	/// Declaration order is preserved in the schema and everywhere else.
	/// An attribute left out here is dropped from serialized output, so
	/// the list should cover every serde field of the record.
	fn record_fields() -> Vec<Field>;

	/// The schema component name
	///
	/// Defaults to the short type name. Override for generic records or
	/// when two record types would otherwise collide on their short name.
	fn record_name() -> &'static str {
		let full = std::any::type_name::<Self>();
		match full.rsplit("::").next() {
			Some(short) => short,
			None => full,
		}
	}

	/// The subset of declared fields the serializer exposes
	fn fields() -> FieldSelection {
		FieldSelection::All
	}

	/// Validation hook, applied after every deserialization
	///
	/// The default accepts everything. Overrides may veto a record or
	/// normalize it before returning. When the record appears as a declared
	/// nested field of another record, the hook also runs during the
	/// parent's deserialization.
	fn validate(record: Self) -> Result<Self, ValidationError> {
		Ok(record)
	}

	/// Example record used for API documentation
	///
	/// When provided, the rendered payload is attached to the derived
	/// serializer and its schema.
	fn example() -> Option<Self> {
		None
	}

	/// The derived serializer for this record type
	///
	/// Derived on first use and memoized in the global registry; every
	/// call observes the same instance.
	fn serializer() -> Arc<RecordSerializer> {
		registry::serializer_for::<Self>()
	}

	/// Serialize into a plain JSON mapping
	///
	/// Output is restricted to the declared, selected fields; nested record
	/// values are filtered by their own type's selection.
	fn to_data(&self) -> AutoSerializeResult<Map<String, Value>> {
		let value = serde_json::to_value(self).map_err(AutoSerializeError::serde)?;
		let Value::Object(mut map) = value else {
			return Err(AutoSerializeError::new(format!(
				"record '{}' did not serialize to an object",
				Self::record_name()
			)));
		};
		Self::serializer().apply_selection(&mut map);
		Ok(map)
	}

	/// Serialize into a `200 OK` JSON response
	fn to_response(&self) -> AutoSerializeResult<Response<Bytes>> {
		let data = self.to_data()?;
		let body = serde_json::to_vec(&Value::Object(data)).map_err(AutoSerializeError::serde)?;
		Ok(json_response(StatusCode::OK, Bytes::from(body)))
	}

	/// Build a record from a plain JSON mapping
	///
	/// Wrong-typed or missing attributes surface as
	/// [`ValidationError::Deserialize`]. Declared nested record fields are
	/// validated through their own record type first, so their hooks run
	/// too; then the hook of this type runs on the constructed record.
	fn from_data(data: Map<String, Value>) -> AutoSerializeResult<Self> {
		let serializer = Self::serializer();
		for field in serializer.fields() {
			if let Some(value) = data.get(field.name()) {
				field
					.schema()
					.validate_nested(value)
					.map_err(|e| ValidationError::field(field.name(), e.message()))?;
			}
		}

		let record: Self = serde_json::from_value(Value::Object(data))
			.map_err(|e| ValidationError::deserialize(e.to_string()))?;
		Ok(Self::validate(record)?)
	}

	/// Build a record from a GET request's query string
	///
	/// Query strings are flat: sequences and nested records are not
	/// representable here and fail deserialization.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_autoserialize::{AutoSerialize, Field};
	/// use serde::{Deserialize, Serialize};
	///
	/// #[derive(Debug, Serialize, Deserialize)]
	/// struct Query {
	///     term: String,
	///     limit: u32,
	/// }
	///
	/// impl AutoSerialize for Query {
	///     fn record_fields() -> Vec<Field> {
	///         vec![Field::new::<String>("term"), Field::new::<u32>("limit")]
	///     }
	/// }
	///
	/// let request = http::Request::builder()
	///     .uri("/search?term=jazz&limit=10")
	///     .body(())
	///     .unwrap();
	///
	/// let query = Query::from_get_request(&request).unwrap();
	/// assert_eq!(query.term, "jazz");
	/// assert_eq!(query.limit, 10);
	/// ```
	fn from_get_request<B>(request: &Request<B>) -> AutoSerializeResult<Self> {
		let query = request.uri().query().unwrap_or("");
		let record: Self = serde_urlencoded::from_str(query)
			.map_err(|e| ValidationError::deserialize(e.to_string()))?;
		Ok(Self::validate(record)?)
	}

	/// Build a record from a POST request's JSON body
	fn from_post_request<B: AsRef<[u8]>>(request: &Request<B>) -> AutoSerializeResult<Self> {
		let value: Value = serde_json::from_slice(request.body().as_ref())
			.map_err(|e| ValidationError::deserialize(e.to_string()))?;
		let Value::Object(map) = value else {
			return Err(ValidationError::deserialize("request body is not a JSON object").into());
		};
		Self::from_data(map)
	}
}

fn json_response(status: StatusCode, body: Bytes) -> Response<Bytes> {
	let mut response = Response::new(body);
	*response.status_mut() = status;
	response.headers_mut().insert(
		header::CONTENT_TYPE,
		header::HeaderValue::from_static("application/json"),
	);
	response
}
