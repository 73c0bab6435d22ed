use std::borrow::Cow;

use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::{
	directory, enrich,
	error::{self, ErrorShape},
	AppState,
};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(Uuid),
	#[error("post rate limit exceeded")]
	RateLimited,
	#[error(transparent)]
	Enrich(#[from] enrich::Error),
	#[error("user directory error: {0}")]
	Directory(#[from] directory::Error),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/",
			get_with(get_posts, get_posts_docs).post_with(create_post, create_post_docs),
		)
		.api_route("/user/:id", get_with(get_user_posts, get_user_posts_docs))
		.api_route("/:id", get_with(get_post, get_post_docs))
}

impl ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) => StatusCode::NOT_FOUND,
			Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
			Self::Enrich(error) => error.status(),
			Self::Directory(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnknownPost(post) => vec![error::Message {
				content: "unknown_post".into(),
				field: None,
				details: Some(Cow::Owned({
					let mut map = error::Map::new();
					map.insert("post".into(), json!(post));
					map
				})),
			}],
			Self::RateLimited => vec![error::Message {
				content: "rate_limited".into(),
				field: None,
				details: None,
			}],
			Self::Enrich(error) => error.errors(),
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

impl From<enrich::Error> for RouteError {
	fn from(error: enrich::Error) -> Self {
		Self::Route(Error::Enrich(error))
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
	async fn test_create_and_fetch(pool: Database) {
		let app = app(pool);

		let response = app
			.post("/posts")
			.add_header(AUTHORIZATION, bearer(ALICE_TOKEN))
			.json(&json!({ "content": "🦀" }))
			.await;

		assert_eq!(response.status_code(), 200);

		let post = response.json::<serde_json::Value>();

		assert_eq!(post["author_id"], "user_alice");
		assert_eq!(post["content"], "🦀");

		let response = app
			.get(&format!("/posts/{}", post["id"].as_str().unwrap()))
			.await;

		assert_eq!(response.status_code(), 200);

		let enriched = response.json::<serde_json::Value>();

		assert_eq!(enriched["post"]["id"], post["id"]);
		assert_eq!(enriched["author"]["username"], "alice");
	}

	#[sqlx::test]
	async fn test_feed_newest_first(pool: Database) {
		let app = app(pool);

		for content in ["1️⃣", "2️⃣", "3️⃣"] {
			let response = app
				.post("/posts")
				.add_header(AUTHORIZATION, bearer(ALICE_TOKEN))
				.json(&json!({ "content": content }))
				.await;

			assert_eq!(response.status_code(), 200);
		}

		let response = app.get("/posts").await;

		assert_eq!(response.status_code(), 200);

		let feed = response.json::<serde_json::Value>();
		let contents = feed
			.as_array()
			.unwrap()
			.iter()
			.map(|post| post["post"]["content"].as_str().unwrap())
			.collect::<Vec<_>>();

		assert_eq!(contents, ["3️⃣", "2️⃣", "1️⃣"]);
	}

	#[sqlx::test]
	async fn test_user_feed_filters_author(pool: Database) {
		let app = app(pool);

		for (token, content) in [(ALICE_TOKEN, "🌊"), (BOB_TOKEN, "🪨")] {
			let response = app
				.post("/posts")
				.add_header(AUTHORIZATION, bearer(token))
				.json(&json!({ "content": content }))
				.await;

			assert_eq!(response.status_code(), 200);
		}

		let response = app.get("/posts/user/user_bob").await;

		assert_eq!(response.status_code(), 200);

		let feed = response.json::<serde_json::Value>();
		let feed = feed.as_array().unwrap();

		assert_eq!(feed.len(), 1);
		assert_eq!(feed[0]["post"]["content"], "🪨");
		// bob has no directory username, the external one is used
		assert_eq!(feed[0]["author"]["username"], "bob-gh");
	}

	#[sqlx::test]
	async fn test_create_requires_session(pool: Database) {
		let app = app(pool);

		let response = app.post("/posts").json(&json!({ "content": "🔥" })).await;

		assert_eq!(response.status_code(), 401);

		let response = app
			.post("/posts")
			.add_header(AUTHORIZATION, bearer("expired"))
			.json(&json!({ "content": "🔥" }))
			.await;

		assert_eq!(response.status_code(), 401);
	}

	#[sqlx::test]
	async fn test_session_cookie_auth(pool: Database) {
		let app = app(pool);

		let response = app
			.post("/posts")
			.add_header(COOKIE, HeaderValue::from_static("session=alice-session"))
			.json(&json!({ "content": "🐦" }))
			.await;

		assert_eq!(response.status_code(), 200);
	}

	#[sqlx::test]
	async fn test_create_rate_limited(pool: Database) {
		let app = app(pool);

		for _ in 0..3 {
			let response = app
				.post("/posts")
				.add_header(AUTHORIZATION, bearer(BOB_TOKEN))
				.json(&json!({ "content": "🔥" }))
				.await;

			assert_eq!(response.status_code(), 200);
		}

		let response = app
			.post("/posts")
			.add_header(AUTHORIZATION, bearer(BOB_TOKEN))
			.json(&json!({ "content": "🔥" }))
			.await;

		assert_eq!(response.status_code(), 429);

		// the quota is per user, others are unaffected
		let response = app
			.post("/posts")
			.add_header(AUTHORIZATION, bearer(ALICE_TOKEN))
			.json(&json!({ "content": "🔥" }))
			.await;

		assert_eq!(response.status_code(), 200);
	}

	#[sqlx::test]
	async fn test_create_rejects_invalid_content(pool: Database) {
		let app = app(pool.clone());

		for content in ["hello", "", "🔥 🔥"] {
			let response = app
				.post("/posts")
				.add_header(AUTHORIZATION, bearer(ALICE_TOKEN))
				.json(&json!({ "content": content }))
				.await;

			assert_eq!(response.status_code(), 400);
		}

		// nothing was persisted
		let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post")
			.fetch_one(&pool)
			.await
			.unwrap();

		assert_eq!(count, 0);
	}

	#[sqlx::test]
	async fn test_unknown_post(pool: Database) {
		let app = app(pool);

		let response = app.get(&format!("/posts/{}", uuid::Uuid::new_v4())).await;

		assert_eq!(response.status_code(), 404);
	}

	#[sqlx::test]
	async fn test_unresolvable_author_is_an_error(pool: Database) {
		sqlx::query("INSERT INTO post (author_id, content) VALUES ($1, $2)")
			.bind("user_gone")
			.bind("👻")
			.execute(&pool)
			.await
			.unwrap();

		let app = app_with(pool, StaticDirectory::default());

		let response = app.get("/posts").await;

		assert_eq!(response.status_code(), 500);
	}
}
