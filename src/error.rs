//! Strategy-level error types shared by configuration, transport, token, and profile stages.

// self
use crate::{_prelude::*, oauth::EndpointKind};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error used for transport sources and verification failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Account endpoint answered with something that is not a doctape profile.
	#[error(transparent)]
	Profile(#[from] ProfileError),
	/// Temporary token endpoint failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),

	/// Provider rejected the grant (e.g., a stale or reused code).
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Provider redirected back with an `error` parameter other than `access_denied`.
	#[error("Authorization request failed with `{code}`.")]
	Authorization {
		/// OAuth `error` code from the callback.
		code: String,
		/// OAuth `error_description` from the callback, if any.
		description: Option<String>,
	},
	/// Application verification callback failed.
	#[error("Verification callback failed.")]
	Verify(#[source] BoxError),
}

/// Configuration and validation failures raised while assembling a strategy.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required option was not supplied or is empty.
	#[error("Option `{option}` is required.")]
	MissingOption {
		/// Option name.
		option: &'static str,
	},
	/// An option holds a URL that cannot be parsed.
	#[error("Option `{option}` is not a valid URL: {value}.")]
	InvalidUrl {
		/// Option name.
		option: &'static str,
		/// Offending value.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Provider returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Provider- or strategy-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
///
/// The transport's own error is kept untouched as the `source`, so callers can
/// downcast it back to the concrete type their HTTP client produced.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Endpoint being called.
		endpoint: EndpointKind,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the {endpoint} endpoint.")]
	Io {
		/// Endpoint being called.
		endpoint: EndpointKind,
		/// IO failure.
		#[source]
		source: std::io::Error,
	},
	/// HTTP client failed without a structured error.
	#[error("HTTP client error occurred while calling the {endpoint} endpoint: {message}.")]
	Other {
		/// Endpoint being called.
		endpoint: EndpointKind,
		/// Client-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(endpoint: EndpointKind, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}

	/// Endpoint that was being called when the failure happened.
	pub fn endpoint(&self) -> EndpointKind {
		match self {
			Self::Network { endpoint, .. } | Self::Io { endpoint, .. } | Self::Other { endpoint, .. } =>
				*endpoint,
		}
	}
}

/// Failures turning an account endpoint response into a [`Profile`](crate::profile::Profile).
#[derive(Debug, ThisError)]
pub enum ProfileError {
	/// Account endpoint answered with a non-success status.
	#[error("Account endpoint returned HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Response body text.
		body: String,
	},
	/// Response body is not JSON.
	#[error("Account endpoint returned a body that is not valid JSON.")]
	Json {
		/// Parser failure.
		#[source]
		source: serde_json::Error,
		/// Response body text.
		body: String,
	},
	/// Response JSON lacks a non-null `result` member.
	#[error("Account endpoint returned JSON of an unexpected shape.")]
	Shape {
		/// Structured failure with the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
