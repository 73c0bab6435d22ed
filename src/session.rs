/// Name of the session cookie set by the hosted auth provider.
///
/// The provider owns the cookie lifecycle; this service only ever reads it
/// and hands the opaque value back to the provider for verification.
pub const COOKIE_NAME: &str = "session";
