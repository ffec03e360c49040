//! Self-serializing records for Reinhardt-style APIs
//!
//! Data records declare their API fields once and gain DRF-style behavior
//! from that declaration: serialization to JSON response payloads,
//! deserialization from query strings and JSON bodies with a validation
//! hook, a memoized derived serializer per record type, and OpenAPI schema
//! output carrying a worked example.
//!
//! # Examples
//!
//! ```
//! use http::Request;
//! use reinhardt_autoserialize::{AutoSerialize, Field, ValidationError};
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Point {
//!     x: f64,
//!     y: f64,
//! }
//!
//! impl AutoSerialize for Point {
//!     fn record_fields() -> Vec<Field> {
//!         vec![Field::new::<f64>("x"), Field::new::<f64>("y")]
//!     }
//!
//!     fn validate(point: Self) -> Result<Self, ValidationError> {
//!         if point.x + point.y > 1000.0 {
//!             return Err(ValidationError::custom("too far"));
//!         }
//!         Ok(point)
//!     }
//!
//!     fn example() -> Option<Self> {
//!         Some(Point { x: 1.2, y: 3.4 })
//!     }
//! }
//!
//! // Deserialize from a GET request's query string, running validation.
//! let request = Request::builder()
//!     .uri("/points?x=1.2&y=3.4")
//!     .body(())
//!     .unwrap();
//! let point = Point::from_get_request(&request).unwrap();
//! assert_eq!(point.x, 1.2);
//!
//! // Serialize back out as response data.
//! let data = point.to_data().unwrap();
//! assert_eq!(serde_json::Value::Object(data), json!({"x": 1.2, "y": 3.4}));
//!
//! // One derived serializer per record type, shared and memoized.
//! assert_eq!(Point::serializer().name(), "Point");
//! ```

pub mod error;
pub mod fields;
pub mod record;
pub mod registry;
pub mod serializer;
pub mod swagger;

pub use error::{AutoSerializeError, AutoSerializeResult, ValidationError};
pub use fields::{ApiField, Field, FieldKind, FieldSchema};
pub use record::{AutoSerialize, FieldSelection};
pub use registry::{SerializerRegistry, global_registry, serializer_for};
pub use serializer::RecordSerializer;
pub use swagger::{swagger_get_schema, swagger_post_schema};

/// Re-exports of the `utoipa` OpenAPI types this crate builds on
pub mod openapi {
	pub use utoipa::openapi::path::{
		HttpMethod, Operation, OperationBuilder, Parameter, ParameterBuilder, ParameterIn,
		PathItem, PathItemBuilder,
	};
	pub use utoipa::openapi::request_body::{RequestBody, RequestBodyBuilder};
	pub use utoipa::openapi::response::{Response, ResponseBuilder};
	pub use utoipa::openapi::schema::{Array, Object, ObjectBuilder, SchemaType, Type};
	pub use utoipa::openapi::{
		Components, ComponentsBuilder, Content as MediaType, ContentBuilder, Ref, RefOr,
		Required, Schema,
	};
}

/// Re-export commonly used types
pub mod prelude {
	pub use crate::error::*;
	pub use crate::fields::*;
	pub use crate::record::*;
	pub use crate::registry::*;
	pub use crate::serializer::*;
	pub use crate::swagger::*;
}

#[cfg(test)]
mod tests {
	use serde::{Deserialize, Serialize};

	use super::*;

	#[derive(Debug, Serialize, Deserialize)]
	struct Marker {
		label: String,
	}

	impl AutoSerialize for Marker {
		fn record_fields() -> Vec<Field> {
			vec![Field::new::<String>("label")]
		}
	}

	#[test]
	fn test_root_exports() {
		let marker = Marker {
			label: "a".to_string(),
		};
		let data = marker.to_data().unwrap();
		let back = Marker::from_data(data).unwrap();
		assert_eq!(back.label, "a");
	}

	#[test]
	fn test_prelude_exports() {
		use crate::prelude::*;

		let serializer = serializer_for::<Marker>();
		assert_eq!(serializer.name(), "Marker");
		assert!(global_registry().contains::<Marker>());
	}
}
