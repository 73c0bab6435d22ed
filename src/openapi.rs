use std::borrow::Cow;

use aide::{
	openapi::{ApiKeyLocation, SecurityScheme, Tag},
	transform::TransformOpenApi,
};

use crate::{error, extract::Json, session};

pub const SECURITY_SCHEME_SESSION: &str = "Session";
pub const SECURITY_SCHEME_BEARER: &str = "Bearer";

pub mod tag {
	pub const POST: &str = "Post";
	pub const PROFILE: &str = "Profile";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Chirp Open API")
		.summary("An emoji microblog")
		.description(include_str!("../README.md"))
		.tag(Tag {
			name: tag::POST.into(),
			description: Some("Post feeds and creation".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::PROFILE.into(),
			description: Some("User profiles".into()),
			..Default::default()
		})
		.security_scheme(
			SECURITY_SCHEME_SESSION,
			SecurityScheme::ApiKey {
				location: ApiKeyLocation::Cookie,
				name: session::COOKIE_NAME.into(),
				description: Some("A session cookie issued by the auth provider".into()),
				extensions: Default::default(),
			},
		)
		.security_scheme(
			SECURITY_SCHEME_BEARER,
			SecurityScheme::Http {
				scheme: "bearer".into(),
				bearer_format: Some("opaque session token".into()),
				description: Some("A session token issued by the auth provider".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<error::Errors<'static>>, _>(|res| {
			res.example(error::Errors {
				errors: vec![error::Message {
					content: "error_code".into(),
					field: Some("optional field".into()),
					details: Some(Cow::Owned({
						let mut map = error::Map::new();
						map.insert("key".into(), serde_json::json!("value"));
						map
					})),
				}],
			})
		})
}
