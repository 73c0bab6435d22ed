#![warn(clippy::pedantic)]

mod directory;
mod enrich;
mod error;
mod extract;
mod openapi;
mod ratelimit;
mod route;
mod session;
mod trace;

use std::sync::Arc;

use aide::{axum::ApiRouter, openapi::OpenApi};
use axum::Extension;
use tower::ServiceBuilder;
use tower_http::{
	compression::CompressionLayer,
	cors::CorsLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

pub type Database = sqlx::Pool<sqlx::Postgres>;
pub type Directory = Arc<dyn directory::UserDirectory>;
pub type AppState = State;

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access,
/// such as the database connection pool, the user directory client, and the
/// post creation quota.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub directory: Directory,
	pub quota: ratelimit::PostQuota,
}

/// Builds the application router and its `OpenAPI` document.
///
/// Middleware that depends on the process environment (peer-address rate
/// limiting, request tracing) is layered on in [`main`] so tests can drive
/// the exact same routes without it.
pub fn router(state: State) -> axum::Router {
	aide::gen::extract_schemas(true);

	let mut api = OpenApi::default();

	ApiRouter::new()
		.nest_api_service("/posts", route::post::routes().with_state(state.clone()))
		.nest_api_service("/profile", route::profile::routes().with_state(state))
		.nest_api_service("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
}

#[tokio::main]
async fn main() {
	let _guard = trace::init_tracing_subscriber();

	dotenvy::dotenv().ok();

	let database = Database::connect(
		&std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
	)
	.await
	.expect("failed to connect to database");

	let directory = directory::HttpDirectory::new(
		std::env::var("USER_DIRECTORY_URL").expect("USER_DIRECTORY_URL must be set"),
		std::env::var("USER_DIRECTORY_SECRET").expect("USER_DIRECTORY_SECRET must be set"),
	)
	.expect("failed to construct user directory client");

	let state = State {
		database,
		directory: Arc::new(directory),
		quota: ratelimit::PostQuota::default(),
	};

	let governor = ratelimit::default();

	ratelimit::cleanup_old_limits(&[&governor], &state.quota);

	let app = router(state).layer(
		ServiceBuilder::new()
			.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
			.layer(TraceLayer::new_for_http())
			.layer(PropagateRequestIdLayer::x_request_id())
			.layer(CorsLayer::permissive())
			.layer(CompressionLayer::new())
			.layer(tower_governor::GovernorLayer { config: governor }),
	);

	let port = std::env::var("PORT").map_or_else(
		|_| 3000,
		|port| port.parse().expect("PORT must be a number"),
	);

	let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
		.await
		.expect("failed to bind to port");

	tracing::info!("listening on port {}", port);

	axum::serve(
		listener,
		app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
	)
	.await
	.unwrap();
}
