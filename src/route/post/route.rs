use aide::transform::TransformOperation;
use axum::extract::{Path, State};
use uuid::Uuid;

use crate::{
	enrich,
	extract::{Json, Session},
	openapi::tag,
	AppState,
};

use super::{
	model::{self, FEED_LIMIT},
	Error, RouteError,
};

pub fn get_posts_docs(op: TransformOperation) -> TransformOperation {
	op.summary("Get the global feed")
		.description("Returns the most recent posts, newest first, with author records attached.")
		.tag(tag::POST)
}

/// Returns the most recent posts, newest first, enriched with their author
/// records.
pub async fn get_posts(
	State(state): State<AppState>,
) -> Result<Json<Vec<model::EnrichedPost>>, RouteError> {
	let posts = sqlx::query_as::<_, model::Post>(
		r"
		SELECT * FROM post
		ORDER BY created_at DESC
		LIMIT $1
		",
	)
	.bind(FEED_LIMIT)
	.fetch_all(&state.database)
	.await?;

	Ok(Json(
		enrich::attach_authors(posts, state.directory.as_ref()).await?,
	))
}

pub fn get_user_posts_docs(op: TransformOperation) -> TransformOperation {
	op.summary("Get a user's posts")
		.description(
			"Returns the most recent posts by a single author, newest first, \
			 with author records attached.",
		)
		.tag(tag::POST)
}

/// Returns the most recent posts by a single author, newest first.
pub async fn get_user_posts(
	State(state): State<AppState>,
	Path(user_id): Path<String>,
) -> Result<Json<Vec<model::EnrichedPost>>, RouteError> {
	let posts = sqlx::query_as::<_, model::Post>(
		r"
		SELECT * FROM post
		WHERE author_id = $1
		ORDER BY created_at DESC
		LIMIT $2
		",
	)
	.bind(&user_id)
	.bind(FEED_LIMIT)
	.fetch_all(&state.database)
	.await?;

	Ok(Json(
		enrich::attach_authors(posts, state.directory.as_ref()).await?,
	))
}

pub fn get_post_docs(op: TransformOperation) -> TransformOperation {
	op.summary("Get a single post")
		.description("Returns a single post by its unique id, with its author record attached.")
		.tag(tag::POST)
}

/// Returns a single post by its unique id.
pub async fn get_post(
	State(state): State<AppState>,
	Path(post_id): Path<Uuid>,
) -> Result<Json<model::EnrichedPost>, RouteError> {
	let post = sqlx::query_as::<_, model::Post>("SELECT * FROM post WHERE id = $1")
		.bind(post_id)
		.fetch_optional(&state.database)
		.await?
		.ok_or(Error::UnknownPost(post_id))?;

	Ok(Json(
		enrich::attach_author(post, state.directory.as_ref()).await?,
	))
}

pub fn create_post_docs(op: TransformOperation) -> TransformOperation {
	op.summary("Create a post")
		.description(
			"Creates a new post owned by the authenticated user. \
			 Limited to 3 posts per minute per user.",
		)
		.tag(tag::POST)
}

/// Creates a new post owned by the authenticated user.
pub async fn create_post(
	State(state): State<AppState>,
	session: Session,
	Json(input): Json<model::CreatePostInput>,
) -> Result<Json<model::Post>, RouteError> {
	if !state.quota.check(&session.user.id) {
		return Err(Error::RateLimited.into());
	}

	let post = sqlx::query_as::<_, model::Post>(
		r"
		INSERT INTO post (author_id, content)
		VALUES ($1, $2)
		RETURNING *
		",
	)
	.bind(&session.user.id)
	.bind(&input.content)
	.fetch_one(&state.database)
	.await?;

	Ok(Json(post))
}
