use schemars::JsonSchema;
use serde::Serialize;

/// A user record as provided by the directory, trimmed to the fields the
/// application exposes.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct UserSummary {
	/// The directory id of the user.
	pub id: String,
	/// The user's directory username, if they chose one.
	pub username: Option<String>,
	/// URL of the user's profile image.
	pub profile_image_url: String,
	/// The username of the user's first linked external account, if any.
	pub external_username: Option<String>,
}

/// A [`UserSummary`] whose username resolved to something displayable.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Author {
	/// The directory id of the user.
	pub id: String,
	/// The display username.
	pub username: String,
	/// URL of the user's profile image.
	pub profile_image_url: String,
}

impl UserSummary {
	/// Resolves the display username, falling back to the external
	/// account's username when the directory record has none of its own.
	pub fn into_author(self) -> Option<Author> {
		let username = self.username.or(self.external_username)?;

		Some(Author {
			id: self.id,
			username,
			profile_image_url: self.profile_image_url,
		})
	}
}

#[cfg(test)]
mod test {
	use super::UserSummary;

	fn summary(username: Option<&str>, external_username: Option<&str>) -> UserSummary {
		UserSummary {
			id: "user_a".to_owned(),
			username: username.map(str::to_owned),
			profile_image_url: "https://images.example/a.png".to_owned(),
			external_username: external_username.map(str::to_owned),
		}
	}

	#[test]
	fn test_prefers_directory_username() {
		let author = summary(Some("a"), Some("a-gh")).into_author().unwrap();

		assert_eq!(author.username, "a");
	}

	#[test]
	fn test_falls_back_to_external_username() {
		let author = summary(None, Some("a-gh")).into_author().unwrap();

		assert_eq!(author.username, "a-gh");
	}

	#[test]
	fn test_unresolvable_without_any_username() {
		assert!(summary(None, None).into_author().is_none());
	}
}
