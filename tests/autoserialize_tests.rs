//! Tests for self-serializing record behavior
//!
//! Covers the record surface end to end: response payloads, query-string and
//! JSON-body deserialization, the validation hook, field selection and the
//! shared derived serializer.

use std::sync::Arc;

use assert_json_diff::assert_json_eq;
use bytes::Bytes;
use http::{Request, StatusCode};
use reinhardt_autoserialize::{
	AutoSerialize, AutoSerializeError, Field, FieldSelection, ValidationError,
};
use rstest::rstest;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Point {
	x: f64,
	y: f64,
}

impl AutoSerialize for Point {
	fn record_fields() -> Vec<Field> {
		vec![Field::new::<f64>("x"), Field::new::<f64>("y")]
	}

	fn validate(point: Self) -> Result<Self, ValidationError> {
		if point.x + point.y > 1000.0 {
			return Err(ValidationError::custom("too far"));
		}
		Ok(point)
	}

	fn example() -> Option<Self> {
		Some(Point { x: 1.2, y: 3.4 })
	}
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Line {
	start: Point,
	end: Point,
}

impl AutoSerialize for Line {
	fn record_fields() -> Vec<Field> {
		vec![Field::record::<Point>("start"), Field::record::<Point>("end")]
	}

	fn example() -> Option<Self> {
		Some(Line {
			start: Point { x: 1.2, y: 3.4 },
			end: Point { x: 5.6, y: 7.8 },
		})
	}
}

#[derive(Debug, Serialize, Deserialize)]
struct Account {
	username: String,
	email: String,
	password: String,
}

impl AutoSerialize for Account {
	fn record_fields() -> Vec<Field> {
		vec![
			Field::new::<String>("username"),
			Field::new::<String>("email"),
			Field::new::<String>("password"),
		]
	}

	fn fields() -> FieldSelection {
		FieldSelection::Except(vec!["password"])
	}
}

fn sample_account() -> Account {
	Account {
		username: "django".to_string(),
		email: "django@example.com".to_string(),
		password: "hunter2".to_string(),
	}
}

#[derive(Debug, Serialize, Deserialize)]
struct Session {
	id: u32,
	account: Account,
}

impl AutoSerialize for Session {
	fn record_fields() -> Vec<Field> {
		vec![Field::new::<u32>("id"), Field::record::<Account>("account")]
	}

	fn example() -> Option<Self> {
		Some(Session {
			id: 7,
			account: sample_account(),
		})
	}
}

#[derive(Debug, Serialize, Deserialize)]
struct Team {
	name: String,
	members: Vec<Account>,
}

impl AutoSerialize for Team {
	fn record_fields() -> Vec<Field> {
		vec![
			Field::new::<String>("name"),
			Field::record::<Account>("members").many(),
		]
	}
}

#[test]
fn test_to_data_produces_json_object() {
	let point = Point { x: 1.2, y: 3.4 };
	let data = point.to_data().unwrap();
	assert_json_eq!(Value::Object(data), json!({"x": 1.2, "y": 3.4}));
}

#[test]
fn test_point_round_trip() {
	let point = Point { x: 1.2, y: 3.4 };
	let restored = Point::from_data(point.to_data().unwrap()).unwrap();
	assert_eq!(restored, point);
}

#[test]
fn test_nested_record_round_trip() {
	let line = Line {
		start: Point { x: 1.2, y: 3.4 },
		end: Point { x: 5.6, y: 7.8 },
	};
	let data = line.to_data().unwrap();
	assert_json_eq!(
		Value::Object(data.clone()),
		json!({
			"start": {"x": 1.2, "y": 3.4},
			"end": {"x": 5.6, "y": 7.8},
		})
	);

	let restored = Line::from_data(data).unwrap();
	assert_eq!(restored, line);
}

#[test]
fn test_from_get_request_parses_query_string() {
	let request = Request::builder()
		.uri("/points?x=1.2&y=3.4")
		.body(())
		.unwrap();

	let point = Point::from_get_request(&request).unwrap();
	assert_eq!(point, Point { x: 1.2, y: 3.4 });
}

#[test]
fn test_from_get_request_missing_field() {
	let request = Request::builder().uri("/points?x=1.2").body(()).unwrap();

	let err = Point::from_get_request(&request).unwrap_err();
	assert!(err.is_validation_error());
	assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_from_post_request_parses_json_body() {
	let request = Request::builder()
		.method("POST")
		.uri("/points")
		.body(Bytes::from_static(br#"{"x": 1.2, "y": 3.4}"#))
		.unwrap();

	let point = Point::from_post_request(&request).unwrap();
	assert_eq!(point, Point { x: 1.2, y: 3.4 });
}

#[test]
fn test_from_post_request_rejects_malformed_json() {
	let request = Request::builder()
		.method("POST")
		.uri("/points")
		.body(Bytes::from_static(b"{not json"))
		.unwrap();

	let err = Point::from_post_request(&request).unwrap_err();
	assert!(err.is_validation_error());
}

#[test]
fn test_from_post_request_rejects_non_object_body() {
	let request = Request::builder()
		.method("POST")
		.uri("/points")
		.body(Bytes::from_static(b"[1.2, 3.4]"))
		.unwrap();

	let err = Point::from_post_request(&request).unwrap_err();
	assert!(err.is_validation_error());
}

#[rstest]
#[case::missing_field(json!({"x": 1.2}))]
#[case::wrong_type(json!({"x": "hello", "y": 3.4}))]
#[case::null_value(json!({"x": null, "y": 3.4}))]
fn test_from_data_rejects_bad_payloads(#[case] payload: Value) {
	let Value::Object(data) = payload else {
		panic!("payload fixture must be an object");
	};

	let err = Point::from_data(data).unwrap_err();
	assert!(err.is_validation_error());
	assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_validation_hook_rejects() {
	let Value::Object(data) = json!({"x": 1000.0, "y": 1.0}) else {
		unreachable!();
	};

	let err = Point::from_data(data).unwrap_err();
	let validation = err.as_validation_error().expect("validation error");
	assert_eq!(validation.message(), "too far");
}

#[test]
fn test_validation_hook_runs_on_get_requests() {
	let request = Request::builder()
		.uri("/points?x=1000&y=1")
		.body(())
		.unwrap();

	let err = Point::from_get_request(&request).unwrap_err();
	assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_validation_hook_runs_for_nested_records() {
	let Value::Object(data) = json!({
		"start": {"x": 1000.0, "y": 1.0},
		"end": {"x": 5.6, "y": 7.8},
	}) else {
		unreachable!();
	};

	let err = Line::from_data(data).unwrap_err();
	let validation = err.as_validation_error().expect("validation error");
	assert_eq!(validation.field_name(), Some("start"));
	assert_eq!(validation.message(), "too far");
}

#[test]
fn test_nested_validation_runs_on_post_requests() {
	let request = Request::builder()
		.method("POST")
		.uri("/lines")
		.body(Bytes::from_static(
			br#"{"start": {"x": 1000.0, "y": 1.0}, "end": {"x": 5.6, "y": 7.8}}"#,
		))
		.unwrap();

	let err = Line::from_post_request(&request).unwrap_err();
	assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_wrong_typed_nested_record_names_the_field() {
	let Value::Object(data) = json!({
		"start": {"x": "hello", "y": 3.4},
		"end": {"x": 5.6, "y": 7.8},
	}) else {
		unreachable!();
	};

	let err = Line::from_data(data).unwrap_err();
	let validation = err.as_validation_error().expect("validation error");
	assert_eq!(validation.field_name(), Some("start"));
}

#[test]
fn test_to_response_shape() {
	let point = Point { x: 1.2, y: 3.4 };
	let response = point.to_response().unwrap();

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(
		response
			.headers()
			.get(http::header::CONTENT_TYPE)
			.and_then(|value| value.to_str().ok()),
		Some("application/json")
	);

	let body: Value = serde_json::from_slice(response.body()).unwrap();
	assert_json_eq!(body, json!({"x": 1.2, "y": 3.4}));
}

#[test]
fn test_error_converts_to_bad_request_response() {
	let error = AutoSerializeError::from(ValidationError::custom("too far"));
	let response: http::Response<Bytes> = error.into();

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	let body: Value = serde_json::from_slice(response.body()).unwrap();
	assert_eq!(body["error"], json!("Validation error: too far"));
}

#[test]
fn test_selection_drops_excluded_fields_from_output() {
	let data = sample_account().to_data().unwrap();
	assert_json_eq!(
		Value::Object(data),
		json!({"username": "django", "email": "django@example.com"})
	);
}

#[test]
fn test_selection_drops_excluded_fields_from_response() {
	let response = sample_account().to_response().unwrap();
	let body: Value = serde_json::from_slice(response.body()).unwrap();
	assert!(body.get("password").is_none());
}

#[test]
fn test_selection_does_not_affect_deserialization() {
	let Value::Object(data) = json!({
		"username": "django",
		"email": "django@example.com",
		"password": "hunter2",
	}) else {
		unreachable!();
	};

	let account = Account::from_data(data).unwrap();
	assert_eq!(account.password, "hunter2");
}

#[test]
fn test_selection_applies_to_nested_records() {
	let session = Session {
		id: 7,
		account: sample_account(),
	};

	let data = session.to_data().unwrap();
	assert_json_eq!(
		Value::Object(data),
		json!({
			"id": 7,
			"account": {"username": "django", "email": "django@example.com"},
		})
	);
}

#[test]
fn test_selection_applies_to_records_inside_arrays() {
	let team = Team {
		name: "core".to_string(),
		members: vec![sample_account(), sample_account()],
	};

	let data = team.to_data().unwrap();
	for member in data["members"].as_array().unwrap() {
		assert_eq!(member["username"], json!("django"));
		assert!(member.get("password").is_none());
	}
}

#[test]
fn test_selection_applies_to_nested_example_payload() {
	let serializer = Session::serializer();
	let example = serializer.example().expect("example payload");
	assert_json_eq!(
		example,
		json!({
			"id": 7,
			"account": {"username": "django", "email": "django@example.com"},
		})
	);
}

#[test]
fn test_serializer_name_matches_type() {
	assert_eq!(Point::serializer().name(), "Point");
	assert_eq!(Line::serializer().name(), "Line");
}

#[test]
fn test_serializer_is_memoized() {
	assert!(Arc::ptr_eq(&Point::serializer(), &Point::serializer()));
}

#[test]
fn test_example_payload_renders_through_serialization() {
	let serializer = Line::serializer();
	let example = serializer.example().expect("example payload");
	assert_json_eq!(
		example,
		json!({
			"start": {"x": 1.2, "y": 3.4},
			"end": {"x": 5.6, "y": 7.8},
		})
	);
}
