//! OAuth 2.0 client facade the strategy delegates protocol mechanics to.
//!
//! [`OAuth2Client`] wraps an `oauth2` [`BasicClient`] configured from a
//! [`StrategyConfig`](crate::config::StrategyConfig). It owns the code exchange and the
//! authenticated GET used for resource calls; the strategy only decides which URLs to hit.

pub use oauth2;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AsyncHttpClient, AuthType, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, PkceCodeVerifier, RedirectUrl, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION},
	},
};
// self
use crate::{
	_prelude::*,
	auth::{TokenGrant, TokenSecret},
	config::{ClientAuthMethod, StrategyConfig},
	error::{ConfigError, TransientError, TransportError},
	http::{ProviderHttpClient, ResponseMetadata, ResponseMetadataSlot},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

// The authorize redirect is built by the session, so only the token endpoint is set.
type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Provider endpoint a request was addressed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
	/// Token endpoint (authorization-code exchange).
	Token,
	/// Account endpoint (profile fetch).
	Account,
}
impl EndpointKind {
	/// Returns a stable label for messages and telemetry.
	pub const fn as_str(self) -> &'static str {
		match self {
			EndpointKind::Token => "token",
			EndpointKind::Account => "account",
		}
	}
}
impl Display for EndpointKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Maps HTTP transport failures into strategy [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a strategy error.
	fn map_transport_error(
		&self,
		endpoint: EndpointKind,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
///
/// Builder failures become configuration errors; everything else is a network error whose
/// source is the original [`ReqwestError`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Copy, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		endpoint: EndpointKind,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<ReqwestError>,
	) -> Error {
		match error {
			HttpClientError::Reqwest(inner) if inner.is_builder() => ConfigError::from(*inner).into(),
			other => PassthroughTransportErrorMapper.map_transport_error(endpoint, metadata, other),
		}
	}
}

/// Mapper for any transport: the transport's error becomes the untouched source of
/// [`TransportError::Network`].
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughTransportErrorMapper;
impl<E> TransportErrorMapper<E> for PassthroughTransportErrorMapper
where
	E: 'static + Send + Sync + StdError,
{
	fn map_transport_error(
		&self,
		endpoint: EndpointKind,
		_metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error {
		match error {
			HttpClientError::Reqwest(inner) => TransportError::Network { endpoint, source: inner }.into(),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(source) => TransportError::Io { endpoint, source }.into(),
			HttpClientError::Other(message) => TransportError::Other { endpoint, message }.into(),
			_ => TransportError::Other { endpoint, message: "unrecognized client failure".into() }
				.into(),
		}
	}
}

/// Status and body of an authenticated resource request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body decoded as UTF-8 (lossy).
	pub body: String,
}
impl ResourceResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// `oauth2`-backed client holding the endpoint configuration and the transport.
pub struct OAuth2Client<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> OAuth2Client<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Configures the `oauth2` client from a resolved strategy config.
	///
	/// The config's URLs are already parsed, so this cannot fail.
	pub fn from_config(
		config: &StrategyConfig,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Self {
		let token_url = TokenUrl::from_url(config.token_url.clone());
		let redirect_url = RedirectUrl::from_url(config.callback_url.clone());
		let mut oauth_client = BasicClient::new(ClientId::new(config.client_id.clone()))
			.set_client_secret(ClientSecret::new(config.client_secret.clone()))
			.set_token_uri(token_url)
			.set_redirect_uri(redirect_url);

		if matches!(config.client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Self { oauth_client, http_client: http_client.into(), error_mapper: error_mapper.into() }
	}

	/// Exchanges an authorization code for a [`TokenGrant`].
	pub async fn exchange_code(
		&self,
		code: &str,
		pkce_verifier: Option<&str>,
		redirect_uri: &Url,
	) -> Result<TokenGrant> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let mut request = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.set_redirect_uri(Cow::Owned(RedirectUrl::from_url(redirect_uri.clone())));

		if let Some(verifier) = pkce_verifier {
			request = request.set_pkce_verifier(PkceCodeVerifier::new(verifier.to_owned()));
		}

		let response = request
			.request_async(&instrumented)
			.await
			.map_err(|err| self.map_request_error(meta.take(), err))?;

		Ok(map_token_response(response))
	}

	/// Performs an authenticated GET with `access_token` as the bearer credential.
	///
	/// Any HTTP status is returned as-is; only transport failures become errors.
	pub async fn get(&self, url: &Url, access_token: &TokenSecret) -> Result<ResourceResponse> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let request = Request::builder()
			.method(Method::GET)
			.uri(url.as_str())
			.header(AUTHORIZATION, access_token.bearer_header())
			.header(ACCEPT, "application/json")
			.body(Vec::new())
			.map_err(ConfigError::from)?;
		let response = instrumented.call(request).await.map_err(|err| {
			self.error_mapper.map_transport_error(EndpointKind::Account, meta.take().as_ref(), err)
		})?;

		Ok(ResourceResponse {
			status: response.status().as_u16(),
			body: String::from_utf8_lossy(response.body()).into_owned(),
		})
	}

	fn map_request_error(
		&self,
		meta: Option<ResponseMetadata>,
		err: BasicRequestTokenError<HttpClientError<C::TransportError>>,
	) -> Error {
		let meta = meta.as_ref();

		match err {
			RequestTokenError::ServerResponse(response) => map_server_response_error(response, meta),
			RequestTokenError::Request(error) =>
				self.error_mapper.map_transport_error(EndpointKind::Token, meta, error),
			RequestTokenError::Parse(source, _body) =>
				TransientError::TokenResponseParse { source, status: meta_status(meta) }.into(),
			RequestTokenError::Other(message) => TransientError::TokenEndpoint {
				message,
				status: meta_status(meta),
				retry_after: meta_retry_after(meta),
			}
			.into(),
		}
	}
}
#[cfg(feature = "reqwest")]
impl OAuth2Client<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Configures a client backed by a default reqwest transport.
	pub fn with_default_transport(config: &StrategyConfig) -> Self {
		Self::from_config(config, ReqwestHttpClient::default(), ReqwestTransportErrorMapper)
	}
}
impl<C, M> Debug for OAuth2Client<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2Client")
			.field("client_id", self.oauth_client.client_id())
			.field("token_uri", &self.oauth_client.token_uri().as_str())
			.finish()
	}
}

/// Provider error categories for failed token exchanges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TokenErrorKind {
	InvalidGrant,
	InvalidClient,
	Transient,
}

fn map_token_response(response: BasicTokenResponse) -> TokenGrant {
	let issued_at = OffsetDateTime::now_utc();
	let mut grant = TokenGrant::new(
		response.access_token().secret().as_str(),
		response.token_type().as_ref(),
		issued_at,
	);

	if let Some(refresh) = response.refresh_token() {
		grant = grant.with_refresh_token(refresh.secret().as_str());
	}
	if let Some(expires_in) = response.expires_in() {
		// Durations outside the representable range are treated as "no expiry".
		if let Ok(secs) = i64::try_from(expires_in.as_secs()) {
			grant = grant.with_expires_in(Duration::seconds(secs));
		}
	}
	if let Some(scopes) = response.scopes() {
		grant = grant.with_scope(scopes.iter().map(|scope| scope.as_str()));
	}

	grant
}

fn map_server_response_error(
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let code = response.error().as_ref().to_owned();
	let description = response.error_description().cloned();
	let kind = classify_oauth_error(&code)
		.or_else(|| description.as_deref().and_then(classify_oauth_error))
		.unwrap_or_else(|| classify_status(meta_status(meta)));
	let message = match description {
		Some(description) => format!("Token endpoint returned an OAuth error: {description}"),
		None => format!("Token endpoint returned an OAuth error: {code}"),
	};

	match kind {
		TokenErrorKind::InvalidGrant => Error::InvalidGrant { reason: message },
		TokenErrorKind::InvalidClient => Error::InvalidClient { reason: message },
		TokenErrorKind::Transient => TransientError::TokenEndpoint {
			message,
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

fn classify_oauth_error(value: &str) -> Option<TokenErrorKind> {
	let lowered = value.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("invalid_grant") || text.contains("access_denied") =>
			Some(TokenErrorKind::InvalidGrant),
		text if text.contains("invalid_client") || text.contains("unauthorized_client") =>
			Some(TokenErrorKind::InvalidClient),
		text if text.contains("temporarily_unavailable") || text.contains("server_error") =>
			Some(TokenErrorKind::Transient),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> TokenErrorKind {
	match status {
		Some(400 | 403 | 404 | 410) => TokenErrorKind::InvalidGrant,
		Some(401) => TokenErrorKind::InvalidClient,
		_ => TokenErrorKind::Transient,
	}
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::config::StrategyOptions;

	fn config(method: ClientAuthMethod) -> StrategyConfig {
		StrategyConfig::resolve(
			StrategyOptions::new("client-id", "secret", "https://app.example.com/callback")
				.client_auth_method(method),
		)
		.expect("Failed to resolve strategy config.")
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn builds_clients_for_every_auth_method() {
		for method in [ClientAuthMethod::ClientSecretPost, ClientAuthMethod::ClientSecretBasic] {
			let client = OAuth2Client::with_default_transport(&config(method));
			let rendered = format!("{client:?}");

			assert!(rendered.contains("https://my.doctape.com/oauth2/token"));
			assert!(!rendered.contains("auth_uri"));
			assert!(!rendered.contains("secret"));
		}
	}

	#[test]
	fn oauth_error_codes_take_priority_over_status() {
		assert_eq!(classify_oauth_error("invalid_grant"), Some(TokenErrorKind::InvalidGrant));
		assert_eq!(classify_oauth_error("UNAUTHORIZED_CLIENT"), Some(TokenErrorKind::InvalidClient));
		assert_eq!(classify_oauth_error("server_error"), Some(TokenErrorKind::Transient));
		assert_eq!(classify_oauth_error("invalid_request"), None);
		assert_eq!(classify_status(Some(401)), TokenErrorKind::InvalidClient);
		assert_eq!(classify_status(Some(400)), TokenErrorKind::InvalidGrant);
		assert_eq!(classify_status(Some(503)), TokenErrorKind::Transient);
		assert_eq!(classify_status(None), TokenErrorKind::Transient);
	}

	#[test]
	fn passthrough_mapper_keeps_io_errors() {
		let err = PassthroughTransportErrorMapper.map_transport_error(
			EndpointKind::Account,
			None,
			HttpClientError::<std::io::Error>::Io(std::io::Error::other("socket closed")),
		);

		assert!(matches!(
			err,
			Error::Transport(TransportError::Io { endpoint: EndpointKind::Account, .. })
		));
	}
}
