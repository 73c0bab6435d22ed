use std::{num::NonZeroU32, sync::Arc, time::Duration};

use axum::{
	body::Body,
	response::{IntoResponse, Response},
};
use governor::{
	clock::QuantaInstant,
	middleware::{RateLimitingMiddleware, StateInformationMiddleware},
	Quota, RateLimiter,
};
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::{KeyExtractor, PeerIpKeyExtractor},
	GovernorError,
};

use crate::error::AppError;

/// Post creations allowed per user per minute.
pub const POSTS_PER_MINUTE: u32 = 3;

/// Router-wide rate limit, keyed by peer address.
pub fn default() -> Arc<GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>> {
	Arc::new(
		GovernorConfigBuilder::default()
			.per_second(10)
			.burst_size(50)
			.use_headers()
			.error_handler(error_handler)
			.finish()
			.unwrap(),
	)
}

fn error_handler(error: GovernorError) -> Response<Body> {
	AppError::from(error).into_response()
}

/// Sliding-window quota for post creation, keyed by user id.
///
/// Unlike the router-wide limiter this follows the account, not the peer
/// address, so the quota holds across devices.
#[derive(Clone)]
pub struct PostQuota {
	limiter: Arc<governor::DefaultKeyedRateLimiter<String>>,
}

impl PostQuota {
	#[must_use]
	pub fn new(per_minute: NonZeroU32) -> Self {
		Self {
			limiter: Arc::new(RateLimiter::keyed(Quota::per_minute(per_minute))),
		}
	}

	/// Records an attempt for `user_id`, returning whether it fits in the
	/// current window.
	pub fn check(&self, user_id: &str) -> bool {
		self.limiter.check_key(&user_id.to_owned()).is_ok()
	}

	pub fn retain_recent(&self) {
		self.limiter.retain_recent();
	}
}

impl Default for PostQuota {
	fn default() -> Self {
		Self::new(NonZeroU32::new(POSTS_PER_MINUTE).expect("quota must be non-zero"))
	}
}

/// Periodically evicts stale keys from the rate limiting storage.
pub fn cleanup_old_limits<T, M>(configs: &[&Arc<GovernorConfig<T, M>>], quota: &PostQuota)
where
	T: KeyExtractor,
	<T as KeyExtractor>::Key: Send + Sync + 'static,
	M: RateLimitingMiddleware<QuantaInstant> + Send + Sync + 'static,
{
	let limiters = configs
		.iter()
		.map(|config| config.limiter().clone())
		.collect::<Vec<_>>();
	let quota = quota.clone();
	let interval = Duration::from_secs(60);

	std::thread::spawn(move || loop {
		std::thread::sleep(interval);

		for limiter in &limiters {
			tracing::debug!("rate limiting storage size: {}", limiter.len());

			limiter.retain_recent();
		}

		quota.retain_recent();
	});
}

#[cfg(test)]
mod test {
	use std::num::NonZeroU32;

	use super::PostQuota;

	#[test]
	fn test_quota_exhausts_within_window() {
		let quota = PostQuota::new(NonZeroU32::new(3).unwrap());

		for _ in 0..3 {
			assert!(quota.check("user_alice"));
		}

		assert!(!quota.check("user_alice"));
	}

	#[test]
	fn test_quota_is_per_user() {
		let quota = PostQuota::new(NonZeroU32::new(1).unwrap());

		assert!(quota.check("user_alice"));
		assert!(!quota.check("user_alice"));
		assert!(quota.check("user_bob"));
	}
}
