use aide::transform::TransformOperation;
use axum::extract::{Path, State};

use crate::{directory::Author, extract::Json, openapi::tag, AppState};

use super::{Error, RouteError};

pub fn get_profile_docs(op: TransformOperation) -> TransformOperation {
	op.summary("Get a user profile")
		.description("Returns a user record by username, with the display username resolved.")
		.tag(tag::PROFILE)
}

/// Returns a user record by username.
pub async fn get_profile(
	State(state): State<AppState>,
	Path(username): Path<String>,
) -> Result<Json<Author>, RouteError> {
	let user = state
		.directory
		.get_user_by_username(&username)
		.await?
		.ok_or_else(|| Error::UnknownUser(username.clone()))?;

	let id = user.id.clone();
	let author = user.into_author().ok_or(Error::MissingUsername(id))?;

	Ok(Json(author))
}
