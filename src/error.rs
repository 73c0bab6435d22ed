use std::borrow::Cow;

use axum::{
	body::Body,
	http::{Response, StatusCode},
	response::IntoResponse,
	Json,
};
use axum_jsonschema::JsonSchemaRejection;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::json;
use tower_governor::GovernorError;

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single error message presented to the client.
///
/// `content` is a stable, machine-readable code. `field` points at the
/// offending input field when there is one, and `details` carries any
/// structured context.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Message<'e> {
	pub content: Cow<'e, str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'e, str>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Cow<'e, Map>>,
}

/// The response body used for every error in the application.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Errors<'e> {
	pub errors: Vec<Message<'e>>,
}

/// The client-visible shape of an error.
///
/// The [`std::fmt::Display`] representation is not sent to the client, so
/// it can contain sensitive information.
pub trait ErrorShape: std::fmt::Debug {
	fn status(&self) -> StatusCode;
	fn errors(&self) -> Vec<Message<'_>>;

	fn response(&self) -> Response<Body> {
		(
			self.status(),
			Json(Errors {
				errors: self.errors(),
			}),
		)
			.into_response()
	}
}

/// Errors that any route can produce.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json body rejection")]
	Json(JsonSchemaRejection),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("rate limit error: {0}")]
	Governor(#[from] GovernorError),
}

impl From<JsonSchemaRejection> for AppError {
	fn from(rejection: JsonSchemaRejection) -> Self {
		Self::Json(rejection)
	}
}

impl ErrorShape for AppError {
	fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..) | Self::Json(..) => StatusCode::BAD_REQUEST,
			Self::Database(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::Governor(error) => match error {
				GovernorError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
				GovernorError::UnableToExtractKey | GovernorError::Other { .. } => {
					StatusCode::INTERNAL_SERVER_ERROR
				}
			},
		}
	}

	fn errors(&self) -> Vec<Message<'_>> {
		match self {
			Self::Validation(errors) => errors
				.field_errors()
				.into_iter()
				.flat_map(|(field, errors)| {
					errors.iter().map(move |error| Message {
						content: error.code.clone(),
						field: Some(Cow::Borrowed(field)),
						details: None,
					})
				})
				.collect(),
			Self::Json(..) => vec![Message {
				content: "invalid_body".into(),
				field: None,
				details: None,
			}],
			Self::Database(..) => Vec::new(),
			Self::Governor(error) => match error {
				GovernorError::TooManyRequests { wait_time, .. } => vec![Message {
					content: "rate_limited".into(),
					field: None,
					details: Some(Cow::Owned({
						let mut map = Map::new();
						map.insert("retry_after_s".into(), json!(wait_time));
						map
					})),
				}],
				GovernorError::UnableToExtractKey | GovernorError::Other { .. } => Vec::new(),
			},
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		if let Self::Database(error) = &self {
			tracing::error!(%error, "database error");
		}

		self.response()
	}
}

/// An error returned from a route handler: either a shared [`AppError`] or
/// the route's own error type.
///
/// Route modules convert their own errors with a local `From` impl, so
/// handlers can use `?` on both shared and route-specific failures.
#[derive(Debug)]
pub enum RouteError<T> {
	App(AppError),
	Route(T),
}

impl<T> From<AppError> for RouteError<T> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

impl<T> From<sqlx::Error> for RouteError<T> {
	fn from(error: sqlx::Error) -> Self {
		Self::App(AppError::Database(error))
	}
}

impl<T> From<validator::ValidationErrors> for RouteError<T> {
	fn from(errors: validator::ValidationErrors) -> Self {
		Self::App(AppError::Validation(errors))
	}
}

impl<T: ErrorShape> ErrorShape for RouteError<T> {
	fn status(&self) -> StatusCode {
		match self {
			Self::App(error) => error.status(),
			Self::Route(error) => error.status(),
		}
	}

	fn errors(&self) -> Vec<Message<'_>> {
		match self {
			Self::App(error) => error.errors(),
			Self::Route(error) => error.errors(),
		}
	}
}

impl<T: ErrorShape> IntoResponse for RouteError<T> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::App(error) => error.into_response(),
			Self::Route(error) => error.response(),
		}
	}
}

impl<T: ErrorShape> aide::OperationOutput for RouteError<T> {
	type Inner = Self;
}

#[cfg(test)]
mod test {
	use axum::http::StatusCode;

	use super::{AppError, ErrorShape, GovernorError, RouteError};

	#[derive(Debug, thiserror::Error)]
	enum TestError {
		#[error("nope")]
		Nope,
	}

	impl ErrorShape for TestError {
		fn status(&self) -> StatusCode {
			StatusCode::IM_A_TEAPOT
		}

		fn errors(&self) -> Vec<super::Message<'_>> {
			Vec::new()
		}
	}

	#[test]
	fn test_route_error_statuses() {
		let error: RouteError<TestError> = RouteError::Route(TestError::Nope);

		assert_eq!(error.status(), StatusCode::IM_A_TEAPOT);

		let error: RouteError<TestError> = sqlx::Error::RowNotFound.into();

		assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}

	#[test]
	fn test_governor_too_many_requests() {
		let error = AppError::Governor(GovernorError::TooManyRequests {
			wait_time: 2,
			headers: None,
		});

		assert_eq!(error.status(), StatusCode::TOO_MANY_REQUESTS);
		assert_eq!(error.errors()[0].content, "rate_limited");
	}
}
