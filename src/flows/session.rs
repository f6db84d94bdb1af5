//! Per-login authorization state: CSRF `state`, optional PKCE pair, and the redirect URL.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, config::StrategyConfig};

const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;

/// Supported PKCE challenge methods surfaced via [`AuthorizationSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// Per-login state produced by [`start_authorization`](crate::strategy::DoctapeStrategy::start_authorization).
///
/// Keep it (for example in the user's session) until doctape redirects back, then hand it to
/// [`authenticate`](crate::strategy::DoctapeStrategy::authenticate). It serializes so it can
/// live in a cookie-backed or server-side session store.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthorizationSession {
	/// Opaque state value that must come back on the callback.
	pub state: String,
	/// Redirect URI sent with the authorization request.
	pub redirect_uri: Url,
	/// Authorization URL the user agent should be redirected to.
	pub authorize_url: Url,
	/// Scopes requested on the redirect.
	pub scope: Vec<String>,
	pkce: Option<PkcePair>,
}
impl AuthorizationSession {
	/// PKCE code challenge, when PKCE is enabled.
	pub fn code_challenge(&self) -> Option<&str> {
		self.pkce.as_ref().map(|pkce| pkce.challenge.as_str())
	}

	/// PKCE challenge method, when PKCE is enabled.
	pub fn code_challenge_method(&self) -> Option<PkceCodeChallengeMethod> {
		self.pkce.as_ref().map(|pkce| pkce.method)
	}

	/// Returns `true` when the callback carried this session's state.
	pub fn state_matches(&self, returned_state: Option<&str>) -> bool {
		returned_state == Some(self.state.as_str())
	}

	pub(super) fn pkce_verifier(&self) -> Option<&str> {
		self.pkce.as_ref().map(|pkce| pkce.verifier.as_str())
	}
}
impl Debug for AuthorizationSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationSession")
			.field("state", &self.state)
			.field("redirect_uri", &self.redirect_uri.as_str())
			.field("authorize_url", &self.authorize_url.as_str())
			.field("scope", &self.scope)
			.field("code_challenge", &self.code_challenge())
			.field("code_challenge_method", &self.code_challenge_method())
			.finish()
	}
}

#[derive(Clone, Serialize, Deserialize)]
struct PkcePair {
	verifier: String,
	challenge: String,
	method: PkceCodeChallengeMethod,
}
impl PkcePair {
	fn generate() -> Self {
		let verifier = random_string(PKCE_VERIFIER_LEN);
		let challenge = compute_pkce_challenge(&verifier);

		Self { verifier, challenge, method: PkceCodeChallengeMethod::S256 }
	}
}

pub(super) fn build_session(config: &StrategyConfig) -> AuthorizationSession {
	let state = random_string(STATE_LEN);
	let pkce = config.pkce.then(PkcePair::generate);
	let authorize_url = build_authorize_url(config, &state, pkce.as_ref());

	AuthorizationSession {
		state,
		redirect_uri: config.callback_url.clone(),
		authorize_url,
		scope: config.scope.clone(),
		pkce,
	}
}

fn build_authorize_url(config: &StrategyConfig, state: &str, pkce: Option<&PkcePair>) -> Url {
	let mut url = config.authorization_url.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", &config.client_id);
	pairs.append_pair("redirect_uri", config.callback_url.as_str());

	if let Some(scope) = config.scope_param() {
		pairs.append_pair("scope", &scope);
	}

	pairs.append_pair("state", state);

	if let Some(pkce) = pkce {
		pairs.append_pair("code_challenge", &pkce.challenge);
		pairs.append_pair("code_challenge_method", pkce.method.as_str());
	}

	drop(pairs);

	url
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

fn compute_pkce_challenge(verifier: &str) -> String {
	URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}
