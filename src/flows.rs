//! Authorization-code flow: the redirect that starts a login and the callback that ends it.

pub mod callback;
pub mod session;

pub use callback::*;
pub use session::*;

// self
use crate::{
	_prelude::*,
	auth::TokenGrant,
	http::ProviderHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	strategy::DoctapeStrategy,
};

impl<U, C, M> DoctapeStrategy<U, C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Starts a login: generates the CSRF state (and PKCE pair when enabled) and builds the
	/// authorization URL to redirect the user agent to.
	pub fn start_authorization(&self) -> AuthorizationSession {
		const KIND: FlowKind = FlowKind::Authorize;

		let span = FlowSpan::new(KIND, "start_authorization");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let session = span.in_scope(|| session::build_session(self.config()));

		obs::record_flow_outcome(KIND, FlowOutcome::Success);

		session
	}

	/// Completes a login from the provider callback.
	///
	/// Declined authorizations, state mismatches, missing codes, and users the verification
	/// callback turns down are reported as [`AuthOutcome::Failure`]. Everything else that goes
	/// wrong (provider errors, token exchange, profile fetch, verification errors) is an
	/// [`Error`].
	pub async fn authenticate(
		&self,
		session: AuthorizationSession,
		params: CallbackParams,
	) -> Result<AuthOutcome<U>> {
		const KIND: FlowKind = FlowKind::Authenticate;

		let span = FlowSpan::new(KIND, "authenticate");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.authenticate_callback(session, params)).await;

		obs::record_result(KIND, &result);

		result
	}

	/// Exchanges an authorization code issued for `session`.
	pub async fn exchange_code(
		&self,
		session: &AuthorizationSession,
		code: &str,
	) -> Result<TokenGrant> {
		const KIND: FlowKind = FlowKind::Exchange;

		let span = FlowSpan::new(KIND, "exchange_code");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(self.oauth_client().exchange_code(
				code,
				session.pkce_verifier(),
				&session.redirect_uri,
			))
			.await;

		obs::record_result(KIND, &result);

		result
	}

	async fn authenticate_callback(
		&self,
		session: AuthorizationSession,
		params: CallbackParams,
	) -> Result<AuthOutcome<U>> {
		let CallbackParams { code, state, error, error_description } = params;

		if let Some(code) = error {
			if code == ACCESS_DENIED {
				return Ok(AuthOutcome::Failure(FailureReason::AccessDenied(error_description)));
			}

			return Err(Error::Authorization { code, description: error_description });
		}
		if !session.state_matches(state.as_deref()) {
			return Ok(AuthOutcome::Failure(FailureReason::StateMismatch));
		}

		let Some(code) = code.filter(|code| !code.is_empty()) else {
			return Ok(AuthOutcome::Failure(FailureReason::MissingCode));
		};
		let grant = self.exchange_code(&session, &code).await?;
		let profile = self.user_profile(&grant.access_token).await?;
		let verdict = self
			.verifier()
			.verify(grant.access_token.clone(), grant.refresh_token.clone(), profile.clone())
			.await
			.map_err(Error::Verify)?;

		Ok(match verdict {
			Some(user) => AuthOutcome::Success { user, grant, profile },
			None => AuthOutcome::Failure(FailureReason::Rejected),
		})
	}
}
