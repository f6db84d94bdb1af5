//! Callback query parameters and the outcome of handling them.

// self
use crate::{_prelude::*, auth::TokenGrant, profile::Profile};

/// OAuth error code doctape sends when the user declines the authorization request.
pub const ACCESS_DENIED: &str = "access_denied";

/// Query parameters doctape appends to the callback URL.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackParams {
	/// Authorization code on success.
	pub code: Option<String>,
	/// State echoed back from the authorization request.
	pub state: Option<String>,
	/// OAuth error code on failure.
	pub error: Option<String>,
	/// Human-readable error detail accompanying `error`.
	pub error_description: Option<String>,
}
impl CallbackParams {
	/// Parses a raw query string (without the leading `?`). Unknown keys are ignored.
	pub fn from_query(query: &str) -> Self {
		let mut params = Self::default();

		for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
			let slot = match key.as_ref() {
				"code" => &mut params.code,
				"state" => &mut params.state,
				"error" => &mut params.error,
				"error_description" => &mut params.error_description,
				_ => continue,
			};

			*slot = Some(value.into_owned());
		}

		params
	}

	/// Parses the query of the full callback URL.
	pub fn from_url(url: &Url) -> Self {
		url.query().map(Self::from_query).unwrap_or_default()
	}
}

/// Why a callback did not produce a signed-in user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureReason {
	/// The user declined; carries `error_description` when doctape sent one.
	AccessDenied(Option<String>),
	/// The callback state was missing or did not match the session.
	StateMismatch,
	/// The callback carried neither an error nor an authorization code.
	MissingCode,
	/// The verification callback declined the user.
	Rejected,
}
impl Display for FailureReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			FailureReason::AccessDenied(Some(description)) =>
				write!(f, "access denied: {description}"),
			FailureReason::AccessDenied(None) => f.write_str("access denied"),
			FailureReason::StateMismatch => f.write_str("state mismatch"),
			FailureReason::MissingCode => f.write_str("missing authorization code"),
			FailureReason::Rejected => f.write_str("rejected by verification"),
		}
	}
}

/// Result of a completed callback.
#[derive(Clone, Debug)]
pub enum AuthOutcome<U> {
	/// The verification callback accepted the user.
	Success {
		/// Application user returned by the verification callback.
		user: U,
		/// Tokens from the code exchange.
		grant: TokenGrant,
		/// Profile fetched with the access token.
		profile: Profile,
	},
	/// Authentication did not succeed; no error occurred.
	Failure(FailureReason),
}
impl<U> AuthOutcome<U> {
	/// Returns the signed-in user, if any.
	pub fn user(&self) -> Option<&U> {
		match self {
			AuthOutcome::Success { user, .. } => Some(user),
			AuthOutcome::Failure(_) => None,
		}
	}

	/// Returns the failure reason, if any.
	pub fn failure(&self) -> Option<&FailureReason> {
		match self {
			AuthOutcome::Success { .. } => None,
			AuthOutcome::Failure(reason) => Some(reason),
		}
	}
}
