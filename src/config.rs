//! Strategy options and the endpoint derivation applied once at construction.
//!
//! [`StrategyOptions`] is what applications fill in (by hand or through serde from their
//! own config file). [`StrategyConfig::resolve`] checks the required options and computes
//! every endpoint URL by plain string concatenation from `base_url`, unless the caller
//! supplied that URL explicitly. The resolved config never changes afterwards.

// self
use crate::{_prelude::*, error::ConfigError};

/// Default doctape deployment.
pub const DEFAULT_BASE_URL: &str = "https://my.doctape.com";
/// Authorization endpoint path appended to the base URL.
pub const AUTHORIZATION_PATH: &str = "/oauth2";
/// Token endpoint path appended to the base URL.
pub const TOKEN_PATH: &str = "/oauth2/token";
/// Account (profile) endpoint path appended to the base URL.
pub const ACCOUNT_PATH: &str = "/v1/account";

/// How the client authenticates itself at the token endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	/// Form POST body parameters for `client_id`/`client_secret`.
	#[default]
	ClientSecretPost,
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
}

/// Caller-supplied options.
///
/// `client_id`, `client_secret`, and `callback_url` are required; everything else falls back
/// to doctape's defaults.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyOptions {
	/// Provider-issued application identifier.
	pub client_id: Option<String>,
	/// Provider-issued application secret.
	pub client_secret: Option<String>,
	/// Absolute URL doctape redirects back to.
	pub callback_url: Option<String>,
	/// Base URL used to derive the endpoints; defaults to [`DEFAULT_BASE_URL`].
	pub base_url: Option<String>,
	/// Explicit authorization endpoint, used instead of the derived one.
	///
	/// Parsed with [`Url::parse`], which normalizes it (lowercased host, `/` path on a bare
	/// origin); [`StrategyConfig::authorization_url`] holds the normalized form.
	pub authorization_url: Option<String>,
	/// Explicit token endpoint, used instead of the derived one.
	///
	/// Parsed and normalized by [`Url::parse`]; [`StrategyConfig::token_url`] holds the result.
	pub token_url: Option<String>,
	/// Scopes requested on the authorization redirect.
	pub scope: Vec<String>,
	/// Character joining scopes in the `scope` parameter; defaults to a space.
	pub scope_separator: Option<char>,
	/// Sends an S256 PKCE challenge with the authorization request.
	pub pkce: bool,
	/// Client authentication mode for the token endpoint.
	pub client_auth_method: ClientAuthMethod,
}
impl StrategyOptions {
	/// Seeds options with the three required values.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		callback_url: impl Into<String>,
	) -> Self {
		Self {
			client_id: Some(client_id.into()),
			client_secret: Some(client_secret.into()),
			callback_url: Some(callback_url.into()),
			..Default::default()
		}
	}

	/// Overrides the base URL the endpoints are derived from.
	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = Some(url.into());

		self
	}

	/// Overrides the authorization endpoint; not combined with the base URL.
	pub fn authorization_url(mut self, url: impl Into<String>) -> Self {
		self.authorization_url = Some(url.into());

		self
	}

	/// Overrides the token endpoint; not combined with the base URL.
	pub fn token_url(mut self, url: impl Into<String>) -> Self {
		self.token_url = Some(url.into());

		self
	}

	/// Sets the requested scopes.
	pub fn scope<I, S>(mut self, scope: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scope = scope.into_iter().map(Into::into).collect();

		self
	}

	/// Sets the scope separator.
	pub fn scope_separator(mut self, separator: char) -> Self {
		self.scope_separator = Some(separator);

		self
	}

	/// Toggles PKCE.
	pub fn pkce(mut self, enabled: bool) -> Self {
		self.pkce = enabled;

		self
	}

	/// Overrides the token endpoint client authentication mode.
	pub fn client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = method;

		self
	}
}
impl Debug for StrategyOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StrategyOptions")
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("callback_url", &self.callback_url)
			.field("base_url", &self.base_url)
			.field("authorization_url", &self.authorization_url)
			.field("token_url", &self.token_url)
			.field("scope", &self.scope)
			.field("scope_separator", &self.scope_separator)
			.field("pkce", &self.pkce)
			.field("client_auth_method", &self.client_auth_method)
			.finish()
	}
}

/// Immutable configuration resolved from [`StrategyOptions`].
#[derive(Clone, PartialEq, Eq)]
pub struct StrategyConfig {
	/// Provider-issued application identifier.
	pub client_id: String,
	/// Provider-issued application secret.
	pub client_secret: String,
	/// Redirect URI registered with doctape.
	pub callback_url: Url,
	/// Base URL exactly as supplied (or the default).
	pub base_url: String,
	/// Authorization endpoint.
	pub authorization_url: Url,
	/// Token endpoint.
	pub token_url: Url,
	/// Account endpoint queried for the profile.
	pub account_url: Url,
	/// Scopes requested on the authorization redirect.
	pub scope: Vec<String>,
	/// Character joining scopes in the `scope` parameter.
	pub scope_separator: char,
	/// Whether authorization requests carry a PKCE challenge.
	pub pkce: bool,
	/// Client authentication mode for the token endpoint.
	pub client_auth_method: ClientAuthMethod,
}
impl StrategyConfig {
	/// Validates required options and derives the endpoint URLs.
	pub fn resolve(options: StrategyOptions) -> Result<Self, ConfigError> {
		let client_id = required("client_id", options.client_id)?;
		let client_secret = required("client_secret", options.client_secret)?;
		let callback_url = parse_url("callback_url", required("callback_url", options.callback_url)?)?;
		let base_url = options.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
		let authorization_url = parse_url(
			"authorization_url",
			options.authorization_url.unwrap_or_else(|| format!("{base_url}{AUTHORIZATION_PATH}")),
		)?;
		let token_url = parse_url(
			"token_url",
			options.token_url.unwrap_or_else(|| format!("{base_url}{TOKEN_PATH}")),
		)?;
		let account_url = parse_url("base_url", format!("{base_url}{ACCOUNT_PATH}"))?;

		Ok(Self {
			client_id,
			client_secret,
			callback_url,
			base_url,
			authorization_url,
			token_url,
			account_url,
			scope: options.scope,
			scope_separator: options.scope_separator.unwrap_or(' '),
			pkce: options.pkce,
			client_auth_method: options.client_auth_method,
		})
	}

	/// Joins the configured scopes with the separator; `None` when no scope is configured.
	pub fn scope_param(&self) -> Option<String> {
		if self.scope.is_empty() {
			return None;
		}

		let mut buf = String::new();

		for (idx, value) in self.scope.iter().enumerate() {
			if idx > 0 {
				buf.push(self.scope_separator);
			}

			buf.push_str(value);
		}

		Some(buf)
	}
}
impl TryFrom<StrategyOptions> for StrategyConfig {
	type Error = ConfigError;

	fn try_from(options: StrategyOptions) -> Result<Self, Self::Error> {
		Self::resolve(options)
	}
}
impl Debug for StrategyConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StrategyConfig")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("callback_url", &self.callback_url.as_str())
			.field("base_url", &self.base_url)
			.field("authorization_url", &self.authorization_url.as_str())
			.field("token_url", &self.token_url.as_str())
			.field("account_url", &self.account_url.as_str())
			.field("scope", &self.scope)
			.field("scope_separator", &self.scope_separator)
			.field("pkce", &self.pkce)
			.field("client_auth_method", &self.client_auth_method)
			.finish()
	}
}

fn required(option: &'static str, value: Option<String>) -> Result<String, ConfigError> {
	match value {
		Some(value) if !value.is_empty() => Ok(value),
		_ => Err(ConfigError::MissingOption { option }),
	}
}

fn parse_url(option: &'static str, value: String) -> Result<Url, ConfigError> {
	Url::parse(&value).map_err(|source| ConfigError::InvalidUrl { option, value, source })
}
