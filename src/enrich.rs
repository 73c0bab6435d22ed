//! Joins posts with their author records from the user directory.

use std::collections::HashMap;

use axum::http::StatusCode;
use uuid::Uuid;

use crate::{
	directory::{self, UserDirectory},
	error::{ErrorShape, Message},
	route::post::model::{EnrichedPost, Post},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("user directory error: {0}")]
	Directory(#[from] directory::Error),
	#[error("author {user_id} for post {post_id} not found")]
	UnknownAuthor { post_id: Uuid, user_id: String },
	#[error("author {0} has no username")]
	MissingUsername(String),
}

impl ErrorShape for Error {
	fn status(&self) -> StatusCode {
		StatusCode::INTERNAL_SERVER_ERROR
	}

	fn errors(&self) -> Vec<Message<'_>> {
		let content = match self {
			Self::Directory(..) => "user_directory",
			Self::UnknownAuthor { .. } => "author_not_found",
			Self::MissingUsername(..) => "author_missing_username",
		};

		vec![Message {
			content: content.into(),
			field: None,
			details: None,
		}]
	}
}

/// Attaches author records to `posts`, preserving their order.
///
/// Authors are fetched from the directory in one batch call over the
/// distinct author ids. Every post must resolve to an author with a
/// username; anything else fails the whole batch.
pub async fn attach_authors(
	posts: Vec<Post>,
	directory: &dyn UserDirectory,
) -> Result<Vec<EnrichedPost>, Error> {
	let mut ids = Vec::new();

	for post in &posts {
		if !ids.contains(&post.author_id) {
			ids.push(post.author_id.clone());
		}
	}

	let users = directory
		.get_user_list(&ids)
		.await?
		.into_iter()
		.map(|user| (user.id.clone(), user))
		.collect::<HashMap<_, _>>();

	posts
		.into_iter()
		.map(|post| {
			let Some(user) = users.get(&post.author_id) else {
				tracing::error!(
					post_id = %post.id,
					user_id = %post.author_id,
					"author for post not found"
				);

				return Err(Error::UnknownAuthor {
					post_id: post.id,
					user_id: post.author_id,
				});
			};

			let author = user
				.clone()
				.into_author()
				.ok_or_else(|| Error::MissingUsername(user.id.clone()))?;

			Ok(EnrichedPost { post, author })
		})
		.collect()
}

/// [`attach_authors`] for a single post.
pub async fn attach_author(
	post: Post,
	directory: &dyn UserDirectory,
) -> Result<EnrichedPost, Error> {
	let mut enriched = attach_authors(vec![post], directory).await?;

	// one post in, one enriched post out
	Ok(enriched.pop().expect("enrichment dropped a post"))
}

#[cfg(test)]
mod test {
	use uuid::Uuid;

	use crate::{
		route::post::model::Post,
		test::{directory, summary, StaticDirectory},
	};

	use super::{attach_authors, Error};

	fn post(author_id: &str) -> Post {
		Post {
			id: Uuid::new_v4(),
			author_id: author_id.to_owned(),
			content: "🦀".to_owned(),
			created_at: chrono::Utc::now(),
		}
	}

	#[tokio::test]
	async fn test_preserves_order() {
		let directory = directory();
		let posts = vec![post("user_alice"), post("user_bob"), post("user_alice")];
		let ids = posts.iter().map(|post| post.id).collect::<Vec<_>>();

		let enriched = attach_authors(posts, &directory).await.unwrap();

		assert_eq!(
			enriched.iter().map(|post| post.post.id).collect::<Vec<_>>(),
			ids
		);
		assert_eq!(enriched[0].author.username, "alice");
		assert_eq!(enriched[1].author.username, "bob-gh");
	}

	#[tokio::test]
	async fn test_unknown_author() {
		let result = attach_authors(vec![post("user_gone")], &directory()).await;

		assert!(matches!(result, Err(Error::UnknownAuthor { .. })));
	}

	#[tokio::test]
	async fn test_author_without_any_username() {
		let directory = StaticDirectory::default().user(summary("user_blank", None, None));
		let result = attach_authors(vec![post("user_blank")], &directory).await;

		assert!(matches!(result, Err(Error::MissingUsername(..))));
	}

	#[tokio::test]
	async fn test_empty_input() {
		let enriched = attach_authors(Vec::new(), &directory()).await.unwrap();

		assert!(enriched.is_empty());
	}
}
