//! Client for the external auth/user directory.
//!
//! User records and sessions are owned by a hosted provider; this module
//! only fetches them, live, per request. The [`UserDirectory`] trait is the
//! seam tests use to substitute an in-memory directory.

pub mod model;

pub use model::{Author, UserSummary};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

/// Maximum number of users requested in one batch call.
pub const USER_BATCH_LIMIT: usize = 110;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("directory transport error: {0}")]
	Transport(#[from] reqwest::Error),
	#[error("directory returned status {0}")]
	Status(StatusCode),
}

/// The external auth/user directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
	/// Fetches the users matching `ids` in a single batch call.
	///
	/// Users that do not exist are absent from the result; the caller
	/// decides whether that is an error.
	async fn get_user_list(&self, ids: &[String]) -> Result<Vec<UserSummary>, Error>;

	/// Fetches a single user by their directory username.
	async fn get_user_by_username(&self, username: &str) -> Result<Option<UserSummary>, Error>;

	/// Verifies an opaque session token, returning the session's owner.
	async fn verify_session(&self, token: &str) -> Result<Option<UserSummary>, Error>;
}

/// Wire representation of a directory user record.
#[derive(Debug, Deserialize)]
struct UserRecord {
	id: String,
	username: Option<String>,
	profile_image_url: String,
	#[serde(default)]
	external_accounts: Vec<ExternalAccount>,
}

#[derive(Debug, Deserialize)]
struct ExternalAccount {
	username: Option<String>,
}

impl From<UserRecord> for UserSummary {
	fn from(record: UserRecord) -> Self {
		Self {
			external_username: record
				.external_accounts
				.into_iter()
				.next()
				.and_then(|account| account.username),
			id: record.id,
			username: record.username,
			profile_image_url: record.profile_image_url,
		}
	}
}

/// Reqwest-backed [`UserDirectory`] implementation.
///
/// Requests are authenticated with the service secret; the provider treats
/// the secret as a bearer credential.
pub struct HttpDirectory {
	client: reqwest::Client,
	base_url: String,
	secret_key: String,
}

impl HttpDirectory {
	pub fn new(base_url: String, secret_key: String) -> Result<Self, Error> {
		let client = reqwest::Client::builder()
			.user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
			.timeout(Duration::from_secs(10))
			.build()?;

		Ok(Self {
			client,
			base_url: base_url.trim_end_matches('/').to_owned(),
			secret_key,
		})
	}

	async fn get_users(&self, query: &[(&str, &str)]) -> Result<Vec<UserSummary>, Error> {
		let response = self
			.client
			.get(format!("{}/v1/users", self.base_url))
			.query(query)
			.bearer_auth(&self.secret_key)
			.send()
			.await?;

		if !response.status().is_success() {
			return Err(Error::Status(response.status()));
		}

		let records = response.json::<Vec<UserRecord>>().await?;

		Ok(records.into_iter().map(UserSummary::from).collect())
	}
}

#[async_trait]
impl UserDirectory for HttpDirectory {
	async fn get_user_list(&self, ids: &[String]) -> Result<Vec<UserSummary>, Error> {
		let limit = USER_BATCH_LIMIT.to_string();
		let mut query = ids.iter().map(|id| ("id", id.as_str())).collect::<Vec<_>>();

		query.push(("limit", &limit));

		self.get_users(&query).await
	}

	async fn get_user_by_username(&self, username: &str) -> Result<Option<UserSummary>, Error> {
		let users = self.get_users(&[("username", username)]).await?;

		Ok(users.into_iter().next())
	}

	async fn verify_session(&self, token: &str) -> Result<Option<UserSummary>, Error> {
		let response = self
			.client
			.post(format!("{}/v1/sessions/verify", self.base_url))
			.bearer_auth(&self.secret_key)
			.json(&serde_json::json!({ "token": token }))
			.send()
			.await?;

		if response.status() == StatusCode::NOT_FOUND
			|| response.status() == StatusCode::UNAUTHORIZED
		{
			return Ok(None);
		}

		if !response.status().is_success() {
			return Err(Error::Status(response.status()));
		}

		Ok(Some(response.json::<UserRecord>().await?.into()))
	}
}
