//! Sign users in with doctape over OAuth 2.0.
//!
//! [`DoctapeStrategy`](strategy::DoctapeStrategy) derives the provider endpoints from a base URL,
//! drives the authorization-code flow through the `oauth2` crate, and normalizes the
//! `/v1/account` response into a [`Profile`](profile::Profile) handed to the application's
//! [`Verify`](verify::Verify) callback.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod profile;
pub mod strategy;
pub mod verify;
#[cfg(feature = "reqwest")]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers shared by the integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::StrategyOptions,
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		strategy::{DoctapeStrategy, ReqwestDoctapeStrategy},
		verify::Verify,
	};

	/// Client identifier used by test fixtures.
	pub const TEST_CLIENT_ID: &str = "client-it";
	/// Client secret used by test fixtures.
	pub const TEST_CLIENT_SECRET: &str = "secret-it";
	/// Callback URL used by test fixtures.
	pub const TEST_CALLBACK_URL: &str = "https://app.example.com/auth/doctape/callback";

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Options pointing every doctape endpoint at `base_url` (usually a mock server).
	pub fn test_options(base_url: &str) -> StrategyOptions {
		StrategyOptions::new(TEST_CLIENT_ID, TEST_CLIENT_SECRET, TEST_CALLBACK_URL)
			.base_url(base_url)
	}

	/// Constructs a [`DoctapeStrategy`] backed by the insecure reqwest transport used across
	/// integration tests.
	pub fn build_reqwest_test_strategy<U>(
		options: StrategyOptions,
		verify: impl 'static + Verify<U>,
	) -> ReqwestDoctapeStrategy<U> {
		DoctapeStrategy::with_http_client(
			options,
			verify,
			test_reqwest_http_client(),
			ReqwestTransportErrorMapper,
		)
		.expect("Failed to build doctape strategy for tests.")
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
