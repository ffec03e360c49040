//! Operation annotation helpers
//!
//! This module provides functions that attach a record's derived schema to an
//! OpenAPI operation: a JSON request body for POST-style endpoints, query
//! parameters for GET-style endpoints, and JSON responses for both. The
//! builders come back unbuilt so call sites keep chaining operation metadata.

use std::sync::Arc;

use http::StatusCode;
use utoipa::openapi::ContentBuilder;
use utoipa::openapi::path::OperationBuilder;
use utoipa::openapi::request_body::{RequestBody, RequestBodyBuilder};
use utoipa::openapi::response::ResponseBuilder;
use utoipa::openapi::{RefOr, Response};

use crate::serializer::RecordSerializer;

/// Annotate a POST-style operation with record schemas
///
/// When a body type is given, the operation gets a required
/// `application/json` request body carrying the serializer's schema and
/// example. Each `(status, serializer)` pair adds one JSON response.
///
/// # Examples
///
/// ```
/// use http::StatusCode;
/// use reinhardt_autoserialize::{swagger_post_schema, AutoSerialize, Field};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Echo {
///     message: String,
/// }
///
/// impl AutoSerialize for Echo {
///     fn record_fields() -> Vec<Field> {
///         vec![Field::new::<String>("message")]
///     }
/// }
///
/// let operation = swagger_post_schema(
///     Some(Echo::serializer()),
///     vec![(StatusCode::OK, Echo::serializer())],
/// )
/// .operation_id(Some("echo_create"))
/// .build();
///
/// assert!(operation.request_body.is_some());
/// assert!(operation.responses.responses.contains_key("200"));
/// ```
pub fn swagger_post_schema(
	body_type: Option<Arc<RecordSerializer>>,
	response_types: Vec<(StatusCode, Arc<RecordSerializer>)>,
) -> OperationBuilder {
	let mut builder = OperationBuilder::new();

	if let Some(serializer) = body_type {
		builder = builder.request_body(Some(create_request_body(&serializer)));
	}

	attach_responses(builder, response_types)
}

/// Annotate a GET-style operation with record schemas
///
/// When a query type is given, each of its scalar fields becomes a query
/// parameter. Each `(status, serializer)` pair adds one JSON response.
///
/// # Examples
///
/// ```
/// use reinhardt_autoserialize::{swagger_get_schema, AutoSerialize, Field};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Search {
///     term: String,
///     limit: Option<u32>,
/// }
///
/// impl AutoSerialize for Search {
///     fn record_fields() -> Vec<Field> {
///         vec![
///             Field::new::<String>("term"),
///             Field::new::<Option<u32>>("limit"),
///         ]
///     }
/// }
///
/// let operation = swagger_get_schema(Some(Search::serializer()), vec![]).build();
/// assert_eq!(operation.parameters.map(|p| p.len()), Some(2));
/// ```
pub fn swagger_get_schema(
	query_type: Option<Arc<RecordSerializer>>,
	response_types: Vec<(StatusCode, Arc<RecordSerializer>)>,
) -> OperationBuilder {
	let mut builder = OperationBuilder::new();

	if let Some(serializer) = query_type {
		for parameter in serializer.query_parameters() {
			builder = builder.parameter(parameter);
		}
	}

	attach_responses(builder, response_types)
}

fn attach_responses(
	mut builder: OperationBuilder,
	response_types: Vec<(StatusCode, Arc<RecordSerializer>)>,
) -> OperationBuilder {
	for (status, serializer) in response_types {
		builder = builder.response(status.as_str(), create_response(&serializer));
	}
	builder
}

fn create_request_body(serializer: &RecordSerializer) -> RequestBody {
	RequestBodyBuilder::new()
		.description(Some(format!("{} payload", serializer.name())))
		.content("application/json", create_content(serializer))
		.required(Some(utoipa::openapi::Required::True))
		.build()
}

fn create_response(serializer: &RecordSerializer) -> RefOr<Response> {
	let builder = ResponseBuilder::new()
		.description(format!("{} response", serializer.name()))
		.content("application/json", create_content(serializer));

	RefOr::T(builder.build())
}

fn create_content(serializer: &RecordSerializer) -> utoipa::openapi::Content {
	let mut content = ContentBuilder::new().schema(Some(serializer.schema()));

	if let Some(example) = serializer.example() {
		content = content.example(Some(example.clone()));
	}

	content.build()
}
