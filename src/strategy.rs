//! The doctape strategy: resolved configuration, the OAuth2 client it delegates to, and the
//! application's verification callback.

// self
use crate::{
	_prelude::*,
	config::{StrategyConfig, StrategyOptions},
	http::ProviderHttpClient,
	oauth::{OAuth2Client, TransportErrorMapper},
	verify::Verify,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Strategy specialized for the crate's default reqwest transport stack.
pub type ReqwestDoctapeStrategy<U> =
	DoctapeStrategy<U, ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Authentication strategy that signs users in with doctape.
///
/// A strategy is built once at startup and shared across requests; it holds no per-login
/// state. The OAuth 2.0 mechanics live in the composed [`OAuth2Client`]; this type only adds
/// the doctape endpoints, the profile fetch, and the hand-off to [`Verify`].
pub struct DoctapeStrategy<U, C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	config: Arc<StrategyConfig>,
	oauth_client: Arc<OAuth2Client<C, M>>,
	verify: Arc<dyn Verify<U>>,
}
impl<U, C, M> DoctapeStrategy<U, C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Name the host framework routes requests to this strategy by.
	pub const NAME: &'static str = "doctape";

	/// Creates a strategy that reuses the caller-provided transport + mapper pair.
	///
	/// Fails with [`ConfigError`](crate::error::ConfigError) when a required option is missing
	/// or a URL does not parse. No network I/O happens here.
	pub fn with_http_client(
		options: StrategyOptions,
		verify: impl 'static + Verify<U>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let config = StrategyConfig::resolve(options)?;
		let oauth_client = OAuth2Client::from_config(&config, http_client, mapper);

		Ok(Self {
			config: Arc::new(config),
			oauth_client: Arc::new(oauth_client),
			verify: Arc::new(verify),
		})
	}

	/// Strategy name; always `"doctape"`.
	pub fn name(&self) -> &'static str {
		Self::NAME
	}

	/// Resolved configuration.
	pub fn config(&self) -> &StrategyConfig {
		&self.config
	}

	/// Base URL the endpoints were derived from.
	pub fn base_url(&self) -> &str {
		&self.config.base_url
	}

	/// Authorization endpoint.
	pub fn authorization_url(&self) -> &Url {
		&self.config.authorization_url
	}

	/// Token endpoint.
	pub fn token_url(&self) -> &Url {
		&self.config.token_url
	}

	/// Account endpoint the profile is fetched from.
	pub fn account_url(&self) -> &Url {
		&self.config.account_url
	}

	/// OAuth 2.0 client the strategy delegates to.
	pub fn oauth_client(&self) -> &OAuth2Client<C, M> {
		&self.oauth_client
	}

	pub(crate) fn verifier(&self) -> &dyn Verify<U> {
		self.verify.as_ref()
	}
}
#[cfg(feature = "reqwest")]
impl<U> DoctapeStrategy<U, ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a strategy backed by a default reqwest transport.
	pub fn new(options: StrategyOptions, verify: impl 'static + Verify<U>) -> Result<Self> {
		Self::with_http_client(
			options,
			verify,
			ReqwestHttpClient::default(),
			ReqwestTransportErrorMapper,
		)
	}
}
impl<U, C, M> Clone for DoctapeStrategy<U, C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			oauth_client: self.oauth_client.clone(),
			verify: self.verify.clone(),
		}
	}
}
impl<U, C, M> Debug for DoctapeStrategy<U, C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DoctapeStrategy")
			.field("name", &Self::NAME)
			.field("config", &self.config)
			.finish()
	}
}
