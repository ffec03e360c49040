//! Error types for record serialization
//!
//! Validation failures carry enough structure to report which field was
//! rejected and why; everything else is wrapped into operation-level
//! variants that map onto HTTP status codes.

use bytes::Bytes;
use http::{StatusCode, header};
use thiserror::Error;

/// Result alias used throughout the crate
pub type AutoSerializeResult<T> = Result<T, AutoSerializeError>;

/// Errors raised while validating inbound data
///
/// Produced by the deserialization paths (`from_data`, `from_get_request`,
/// `from_post_request`) and by user validation hooks.
///
/// # Examples
///
/// ```
/// use reinhardt_autoserialize::ValidationError;
///
/// let err = ValidationError::custom("too far");
/// assert_eq!(err.message(), "too far");
/// assert!(err.field_name().is_none());
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
	/// A named field was rejected
	#[error("Field '{field_name}': {message}")]
	Field { field_name: String, message: String },
	/// The payload could not be deserialized into the record
	///
	/// Covers wrong-typed values, missing required attributes, and
	/// malformed JSON or query strings.
	#[error("Invalid data: {message}")]
	Deserialize { message: String },
	/// Rejection raised by a record's validation hook
	#[error("Validation error: {message}")]
	Custom { message: String },
}

impl ValidationError {
	/// Create a field-level rejection
	pub fn field(field_name: impl Into<String>, message: impl Into<String>) -> Self {
		ValidationError::Field {
			field_name: field_name.into(),
			message: message.into(),
		}
	}

	/// Create a deserialization failure
	pub fn deserialize(message: impl Into<String>) -> Self {
		ValidationError::Deserialize {
			message: message.into(),
		}
	}

	/// Create a custom rejection, typically from a validation hook
	pub fn custom(message: impl Into<String>) -> Self {
		ValidationError::Custom {
			message: message.into(),
		}
	}

	/// Returns the error message
	pub fn message(&self) -> &str {
		match self {
			ValidationError::Field { message, .. } => message,
			ValidationError::Deserialize { message } => message,
			ValidationError::Custom { message } => message,
		}
	}

	/// Returns the rejected field name, if the error names one
	pub fn field_name(&self) -> Option<&str> {
		match self {
			ValidationError::Field { field_name, .. } => Some(field_name.as_str()),
			_ => None,
		}
	}
}

/// Errors that can occur during serialization operations
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutoSerializeError {
	/// Inbound data failed validation
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Serde serialization error on the outbound path
	#[error("Serde error: {message}")]
	Serde { message: String },
	/// Other error
	#[error("Serialization error: {message}")]
	Other { message: String },
}

impl AutoSerializeError {
	/// Create a new generic error
	pub fn new(message: impl Into<String>) -> Self {
		AutoSerializeError::Other {
			message: message.into(),
		}
	}

	/// Create a serde error
	pub fn serde(err: impl std::fmt::Display) -> Self {
		AutoSerializeError::Serde {
			message: err.to_string(),
		}
	}

	/// Check if this is a validation error
	pub fn is_validation_error(&self) -> bool {
		matches!(self, AutoSerializeError::Validation(_))
	}

	/// Try to convert to ValidationError if this is a validation error
	pub fn as_validation_error(&self) -> Option<&ValidationError> {
		match self {
			AutoSerializeError::Validation(e) => Some(e),
			_ => None,
		}
	}

	/// Returns the error message
	pub fn message(&self) -> String {
		match self {
			AutoSerializeError::Validation(e) => e.message().to_string(),
			AutoSerializeError::Serde { message } => message.clone(),
			AutoSerializeError::Other { message } => message.clone(),
		}
	}

	/// The HTTP status this error maps onto
	///
	/// Validation failures are the client's fault; everything else is a
	/// server-side serialization problem.
	pub fn status_code(&self) -> StatusCode {
		match self {
			AutoSerializeError::Validation(_) => StatusCode::BAD_REQUEST,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl From<AutoSerializeError> for http::Response<Bytes> {
	/// Convert an error into a JSON error response
	///
	/// Validation errors become `400 Bad Request`; other errors become
	/// `500 Internal Server Error`. The body is `{"error": <message>}`.
	fn from(error: AutoSerializeError) -> Self {
		let body = serde_json::json!({
			"error": error.to_string(),
		});
		let payload = serde_json::to_vec(&body).unwrap_or_else(|_| b"{}".to_vec());

		let mut response = http::Response::new(Bytes::from(payload));
		*response.status_mut() = error.status_code();
		response.headers_mut().insert(
			header::CONTENT_TYPE,
			header::HeaderValue::from_static("application/json"),
		);
		response
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_validation_error_display() {
		let err = ValidationError::field("x", "must be a number");
		assert!(err.to_string().contains("x"));
		assert!(err.to_string().contains("must be a number"));
	}

	#[test]
	fn test_validation_error_accessors() {
		let err = ValidationError::field("y", "out of range");
		assert_eq!(err.message(), "out of range");
		assert_eq!(err.field_name(), Some("y"));

		let err = ValidationError::custom("too far");
		assert_eq!(err.field_name(), None);
	}

	#[test]
	fn test_error_from_validation_error() {
		let err: AutoSerializeError = ValidationError::custom("test error").into();
		assert!(err.is_validation_error());
		assert!(err.as_validation_error().is_some());
	}

	#[test]
	fn test_status_codes() {
		let validation: AutoSerializeError = ValidationError::custom("nope").into();
		assert_eq!(validation.status_code(), StatusCode::BAD_REQUEST);

		let serde = AutoSerializeError::serde("broken");
		assert_eq!(serde.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
	}

	#[test]
	fn test_error_response_conversion() {
		let err: AutoSerializeError = ValidationError::custom("too far").into();
		let response: http::Response<Bytes> = err.into();

		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
		assert_eq!(
			response.headers().get(header::CONTENT_TYPE).unwrap(),
			"application/json"
		);
		let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
		assert!(body["error"].as_str().unwrap().contains("too far"));
	}
}
