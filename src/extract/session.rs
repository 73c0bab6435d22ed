use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request, StatusCode},
};

use crate::{
	directory::{self, UserSummary},
	error::{ErrorShape, Message, RouteError},
	openapi::{SECURITY_SCHEME_BEARER, SECURITY_SCHEME_SESSION},
	session, Directory,
};

pub const AUTHORIZATION_PREFIX: &str = "Bearer ";

/// An error that can occur while authenticating a request.
///
/// Note that the messages are presented to the client, so they should not
/// contain sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
	#[error("no session cookie or bearer token")]
	NoSessionToken,
	#[error("invalid authorization header")]
	InvalidAuthorizationHeader,
	#[error("invalid session token")]
	InvalidSessionToken,
	#[error("user directory error: {0}")]
	Directory(#[from] directory::Error),
}

impl ErrorShape for AuthError {
	fn status(&self) -> StatusCode {
		match self {
			Self::NoSessionToken
			| Self::InvalidAuthorizationHeader
			| Self::InvalidSessionToken => StatusCode::UNAUTHORIZED,
			Self::Directory(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn errors(&self) -> Vec<Message<'_>> {
		let content = match self {
			Self::NoSessionToken => "no_session",
			Self::InvalidAuthorizationHeader => "invalid_authorization_header",
			Self::InvalidSessionToken => "invalid_session",
			Self::Directory(..) => "user_directory",
		};

		vec![Message {
			content: content.into(),
			field: None,
			details: None,
		}]
	}
}

impl From<AuthError> for RouteError<AuthError> {
	fn from(error: AuthError) -> Self {
		Self::Route(error)
	}
}

impl From<directory::Error> for RouteError<AuthError> {
	fn from(error: directory::Error) -> Self {
		Self::Route(AuthError::Directory(error))
	}
}

/// The authenticated caller.
///
/// The request's opaque session token, taken from the `Authorization`
/// header or the session cookie, is verified against the user directory on
/// every request; nothing is stored locally.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub user: UserSummary,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Directory: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<AuthError>;

	/// Extracts the session token from the request and verifies it against
	/// the user directory.
	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let token = if let Some(authorization) = parts.headers.get(header::AUTHORIZATION) {
			let slice = authorization
				.to_str()
				.map_err(|_| AuthError::InvalidAuthorizationHeader)?;

			if !slice.starts_with(AUTHORIZATION_PREFIX) {
				return Err(AuthError::InvalidAuthorizationHeader.into());
			}

			slice[AUTHORIZATION_PREFIX.len()..].to_owned()
		} else {
			let cookies = parts
				.headers
				.get_all(header::COOKIE)
				.into_iter()
				.filter_map(|value| value.to_str().ok());

			cookies
				.flat_map(cookie::Cookie::split_parse)
				.filter_map(Result::ok)
				.find(|cookie| cookie.name() == session::COOKIE_NAME)
				.ok_or(AuthError::NoSessionToken)?
				.value()
				.to_owned()
		};

		let directory = Directory::from_ref(state);
		let user = directory
			.verify_session(&token)
			.await?
			.ok_or(AuthError::InvalidSessionToken)?;

		Ok(Session { user })
	}
}

impl OperationInput for Session {
	/// Operation input for the session extractor.
	///
	/// This adds the session cookie and bearer token requirements to the
	/// `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.extend([
			[(SECURITY_SCHEME_SESSION.to_string(), Vec::new())]
				.into_iter()
				.collect(),
			[(SECURITY_SCHEME_BEARER.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		]);
	}
}
