//! Token grant returned by a successful authorization-code exchange.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Tokens issued by doctape's token endpoint for one login.
///
/// The grant is handed to the [`Verify`](crate::verify::Verify) callback and returned to the
/// caller on success; nothing keeps a copy of it.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenGrant {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Token type reported by the provider (normally `bearer`).
	pub token_type: String,
	/// Scopes echoed back by the provider, when it reports them.
	pub scope: Option<Vec<String>>,
	/// Instant the strategy received the token response.
	pub issued_at: OffsetDateTime,
	/// Expiry instant derived from `expires_in`, when present.
	pub expires_at: Option<OffsetDateTime>,
}
impl TokenGrant {
	/// Creates a grant for the provided access token, stamped with `issued_at`.
	pub fn new(
		access_token: impl Into<TokenSecret>,
		token_type: impl Into<String>,
		issued_at: OffsetDateTime,
	) -> Self {
		Self {
			access_token: access_token.into(),
			refresh_token: None,
			token_type: token_type.into(),
			scope: None,
			issued_at,
			expires_at: None,
		}
	}

	/// Attaches a refresh token.
	pub fn with_refresh_token(mut self, token: impl Into<TokenSecret>) -> Self {
		self.refresh_token = Some(token.into());

		self
	}

	/// Sets the expiry relative to `issued_at`.
	///
	/// An expiry beyond the representable date range leaves the grant without one.
	pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
		self.expires_at = self.issued_at.checked_add(expires_in);

		self
	}

	/// Records the scopes reported by the provider.
	pub fn with_scope<I, S>(mut self, scope: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scope = Some(scope.into_iter().map(Into::into).collect());

		self
	}

	/// Returns `true` if the grant carries an expiry that has passed at `instant`.
	///
	/// Grants without `expires_in` never expire from the strategy's point of view.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}

	/// Returns `true` if the grant is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}
impl Debug for TokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGrant")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("token_type", &self.token_type)
			.field("scope", &self.scope)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
