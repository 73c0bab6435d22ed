use std::sync::OnceLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::directory::Author;

/// Number of posts returned by the feed queries.
pub const FEED_LIMIT: i64 = 100;

/// A single post, created by a user.
///
/// Posts are immutable once created; there is no update surface.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Post {
	/// The unique identifier of the post.
	pub id: Uuid,
	/// The directory id of the user that created the post.
	pub author_id: String,
	/// The emoji content of the post.
	pub content: String,
	/// The creation time of the post.
	pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A post joined with its resolved author record.
#[derive(Debug, Serialize, JsonSchema)]
pub struct EnrichedPost {
	pub post: Post,
	pub author: Author,
}

fn emoji() -> &'static Regex {
	static EMOJI: OnceLock<Regex> = OnceLock::new();

	EMOJI.get_or_init(|| {
		Regex::new(r"^(?:\p{Extended_Pictographic}|\p{Emoji_Component})+$").unwrap()
	})
}

fn validate_emoji(content: &str) -> Result<(), ValidationError> {
	if !emoji().is_match(content) {
		return Err(ValidationError::new("only emojis are allowed"));
	}

	Ok(())
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct CreatePostInput {
	/// The emoji content of the post.
	#[validate(length(min = 1, max = 280), custom(function = "validate_emoji"))]
	pub content: String,
}

#[cfg(test)]
mod test {
	use validator::Validate;

	use super::CreatePostInput;

	fn input(content: &str) -> CreatePostInput {
		CreatePostInput {
			content: content.to_owned(),
		}
	}

	#[test]
	fn test_accepts_emoji() {
		assert!(input("😀").validate().is_ok());
		assert!(input("🔥🔥🔥").validate().is_ok());
		// zwj sequence and flag
		assert!(input("👩‍👩‍👧🇨🇦").validate().is_ok());
	}

	#[test]
	fn test_rejects_text() {
		assert!(input("hello").validate().is_err());
		assert!(input("🔥 ").validate().is_err());
	}

	#[test]
	fn test_rejects_empty() {
		assert!(input("").validate().is_err());
	}

	#[test]
	fn test_rejects_oversized() {
		assert!(input(&"😀".repeat(280)).validate().is_ok());
		assert!(input(&"😀".repeat(281)).validate().is_err());
	}
}
