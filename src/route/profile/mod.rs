use std::borrow::Cow;

use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;
use serde_json::json;

use crate::{
	directory,
	error::{self, ErrorShape},
	AppState,
};

pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown user {0}")]
	UnknownUser(String),
	#[error("user {0} has no username")]
	MissingUsername(String),
	#[error("user directory error: {0}")]
	Directory(#[from] directory::Error),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new().api_route("/:username", get_with(get_profile, get_profile_docs))
}

impl ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownUser(..) => StatusCode::NOT_FOUND,
			Self::MissingUsername(..) | Self::Directory(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnknownUser(username) => vec![error::Message {
				content: "unknown_user".into(),
				field: None,
				details: Some(Cow::Owned({
					let mut map = error::Map::new();
					map.insert("username".into(), json!(username));
					map
				})),
			}],
			Self::MissingUsername(..) => vec![error::Message {
				content: "user_missing_username".into(),
				field: None,
				details: None,
			}],
			Self::Directory(..) => vec![error::Message {
				content: "user_directory".into(),
				field: None,
				details: None,
			}],
		}
	}
}

impl From<Error> for RouteError {
	fn from(error: Error) -> Self {
		Self::Route(error)
	}
}

impl From<directory::Error> for RouteError {
	fn from(error: directory::Error) -> Self {
		Self::Route(Error::Directory(error))
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[sqlx::test]
	async fn test_profile_lookup(pool: Database) {
		let app = app(pool);

		let response = app.get("/profile/alice").await;

		assert_eq!(response.status_code(), 200);

		let profile = response.json::<serde_json::Value>();

		assert_eq!(profile["id"], "user_alice");
		assert_eq!(profile["username"], "alice");
	}

	#[sqlx::test]
	async fn test_unknown_profile(pool: Database) {
		let app = app(pool);

		let response = app.get("/profile/nobody").await;

		assert_eq!(response.status_code(), 404);
	}
}
