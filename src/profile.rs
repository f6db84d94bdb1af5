//! Normalized doctape profile and the account endpoint call that produces it.
//!
//! doctape answers `GET /v1/account` with `{"result": {"username": ..., "email": ...}}`.
//! Only those two fields are lifted into [`Profile`]; the full body is kept in
//! [`Profile::raw_body`] and [`Profile::raw_json`] for anything else the application needs.

// crates.io
use serde::{
	Deserializer,
	de::{Error as _, Unexpected},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ProfileError,
	http::ProviderHttpClient,
	oauth::{ResourceResponse, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	strategy::DoctapeStrategy,
};

/// Provider label stamped on every profile.
pub const PROVIDER: &str = "doctape";

/// User profile normalized from doctape's account endpoint.
///
/// doctape's account payload has no documented stable identifier or display name, so the
/// profile carries neither; read them from [`raw_json`](Self::raw_json) once the upstream
/// schema is confirmed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
	/// Always [`PROVIDER`].
	pub provider: String,
	/// `result.username`, when present as a string.
	pub username: Option<String>,
	/// `result.email`, when present as a string.
	pub email: Option<String>,
	/// Response body exactly as received.
	pub raw_body: String,
	/// Parsed response body.
	pub raw_json: serde_json::Value,
}
impl Profile {
	/// Parses an account endpoint body.
	///
	/// A body that is not JSON, or JSON without a non-null `result`, is an error. Inside
	/// `result`, a `username`/`email` that is missing or not a string is passed through as
	/// `None`; [`raw_json`](Self::raw_json) still holds the value as sent.
	pub fn from_account_body(body: impl Into<String>) -> Result<Self, ProfileError> {
		let raw_body = body.into();
		let raw_json = match serde_json::from_str::<serde_json::Value>(&raw_body) {
			Ok(value) => value,
			Err(source) => return Err(ProfileError::Json { source, body: raw_body }),
		};
		let AccountEnvelope { result } = serde_path_to_error::deserialize(&raw_json)
			.map_err(|source| ProfileError::Shape { source })?;

		Ok(Self {
			provider: PROVIDER.to_owned(),
			username: string_field(&result, "username"),
			email: string_field(&result, "email"),
			raw_body,
			raw_json,
		})
	}

	/// Converts an account endpoint response, rejecting non-2xx statuses.
	pub fn from_account_response(response: ResourceResponse) -> Result<Self, ProfileError> {
		if !response.is_success() {
			return Err(ProfileError::Status { status: response.status, body: response.body });
		}

		Self::from_account_body(response.body)
	}
}

#[derive(Deserialize)]
struct AccountEnvelope {
	result: AccountResult,
}

/// `result` member of the account payload; anything but `null` is accepted.
struct AccountResult(serde_json::Value);
impl<'de> Deserialize<'de> for AccountResult {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		match serde_json::Value::deserialize(deserializer)? {
			serde_json::Value::Null =>
				Err(D::Error::invalid_type(Unexpected::Unit, &"a non-null `result` member")),
			value => Ok(Self(value)),
		}
	}
}

fn string_field(result: &AccountResult, key: &str) -> Option<String> {
	result.0.get(key).and_then(serde_json::Value::as_str).map(ToOwned::to_owned)
}

impl<U, C, M> DoctapeStrategy<U, C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Fetches and normalizes the profile of the user `access_token` belongs to.
	///
	/// Issues exactly one `GET {base_url}/v1/account`. Transport failures surface as
	/// [`Error::Transport`] with the transport's error as source; bad statuses and bodies
	/// surface as [`Error::Profile`].
	pub async fn user_profile(&self, access_token: &TokenSecret) -> Result<Profile> {
		const KIND: FlowKind = FlowKind::Profile;

		let span = FlowSpan::new(KIND, "user_profile");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let response = self.oauth_client().get(&self.config().account_url, access_token).await?;

				Ok(Profile::from_account_response(response)?)
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}
}
