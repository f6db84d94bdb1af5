//! Application callback deciding whether a doctape user may sign in.

// self
use crate::{_prelude::*, auth::TokenSecret, error::BoxError, profile::Profile};

/// Result the verification callback resolves to.
///
/// `Ok(Some(user))` signs the user in, `Ok(None)` rejects the credentials, and `Err(_)`
/// reports a failure (for example, the user database being unreachable).
pub type VerifyResult<U> = Result<Option<U>, BoxError>;

/// Boxed future returned by [`Verify::verify`].
pub type VerifyFuture<'a, U> = Pin<Box<dyn Future<Output = VerifyResult<U>> + 'a + Send>>;

/// Maps a doctape login onto an application user.
///
/// Implemented for any `Fn(TokenSecret, Option<TokenSecret>, Profile) -> impl Future` closure,
/// so most applications pass an `async move` closure:
///
/// ```
/// use doctape_oauth2::{auth::TokenSecret, profile::Profile, verify::VerifyResult};
///
/// let verify = |_access: TokenSecret, _refresh: Option<TokenSecret>, profile: Profile| async move {
/// 	VerifyResult::Ok(profile.username)
/// };
/// # let _ = verify;
/// ```
pub trait Verify<U>
where
	Self: Send + Sync,
{
	/// Decides whether the owner of `profile` is signed in.
	fn verify(
		&self,
		access_token: TokenSecret,
		refresh_token: Option<TokenSecret>,
		profile: Profile,
	) -> VerifyFuture<'_, U>;
}
impl<F, Fut, U> Verify<U> for F
where
	F: Send + Sync + Fn(TokenSecret, Option<TokenSecret>, Profile) -> Fut,
	Fut: 'static + Send + Future<Output = VerifyResult<U>>,
{
	fn verify(
		&self,
		access_token: TokenSecret,
		refresh_token: Option<TokenSecret>,
		profile: Profile,
	) -> VerifyFuture<'_, U> {
		Box::pin(self(access_token, refresh_token, profile))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn profile(username: Option<&str>) -> Profile {
		Profile {
			provider: "doctape".into(),
			username: username.map(Into::into),
			email: None,
			raw_body: "{}".into(),
			raw_json: serde_json::json!({}),
		}
	}

	#[tokio::test]
	async fn closures_implement_verify() {
		let verify = |access: TokenSecret, _refresh: Option<TokenSecret>, profile: Profile| async move {
			assert_eq!(access.expose(), "token");

			VerifyResult::Ok(profile.username)
		};

		let user = verify
			.verify(TokenSecret::new("token"), None, profile(Some("alice")))
			.await
			.expect("Verification should not fail.");

		assert_eq!(user.as_deref(), Some("alice"));

		let rejected = verify
			.verify(TokenSecret::new("token"), None, profile(None))
			.await
			.expect("Verification should not fail.");

		assert!(rejected.is_none());
	}

	#[tokio::test]
	async fn trait_objects_box_custom_implementations() {
		struct Deny;
		impl Verify<String> for Deny {
			fn verify(
				&self,
				_access_token: TokenSecret,
				_refresh_token: Option<TokenSecret>,
				_profile: Profile,
			) -> VerifyFuture<'_, String> {
				Box::pin(async { Err("user store offline".into()) })
			}
		}

		let verify: Arc<dyn Verify<String>> = Arc::new(Deny);
		let err = verify
			.verify(TokenSecret::new("token"), None, profile(Some("bob")))
			.await
			.expect_err("Custom verifier should fail.");

		assert_eq!(err.to_string(), "user store offline");
	}
}
