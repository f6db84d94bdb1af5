//! Walks through a complete doctape login against a local mock of the provider.
//!
//! 1. Build a [`DoctapeStrategy`] whose endpoints derive from the mock server's base URL.
//! 2. Redirect the user agent to the session's authorization URL (printed here).
//! 3. Feed the callback query back into [`DoctapeStrategy::authenticate`], which exchanges the
//!    code, fetches `/v1/account`, and asks the verification callback for an application user.

// crates.io
use color_eyre::{Result, eyre::eyre};
use httpmock::prelude::*;
// self
use doctape_oauth2::{
	auth::TokenSecret,
	config::StrategyOptions,
	flows::{AuthOutcome, CallbackParams},
	profile::Profile,
	strategy::DoctapeStrategy,
	verify::VerifyResult,
};

#[derive(Debug)]
struct AppUser {
	login: String,
	email: Option<String>,
}

async fn find_user(
	_access: TokenSecret,
	_refresh: Option<TokenSecret>,
	profile: Profile,
) -> VerifyResult<AppUser> {
	Ok(profile.username.map(|login| AppUser { login, email: profile.email }))
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let account_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/account").header("authorization", "Bearer demo-access");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"result":{"username":"demo","email":"demo@doctape.test"}}"#);
		})
		.await;
	let options =
		StrategyOptions::new("demo-client", "demo-secret", "https://app.example.com/auth/doctape/callback")
			.base_url(server.base_url())
			.pkce(true);
	let strategy = DoctapeStrategy::new(options, find_user)?;
	let session = strategy.start_authorization();

	println!("Redirect the browser to: {}.", session.authorize_url);

	// doctape would append these to the callback URL after the user approves.
	let callback = CallbackParams::from_query(&format!("code=demo-code&state={}", session.state));

	match strategy.authenticate(session, callback).await? {
		AuthOutcome::Success { user, grant, .. } => println!(
			"Signed in {} <{}>; token expires at {:?}.",
			user.login,
			user.email.as_deref().unwrap_or("no email"),
			grant.expires_at
		),
		AuthOutcome::Failure(reason) => return Err(eyre!("Login failed: {reason}.")),
	}

	token_mock.assert_async().await;
	account_mock.assert_async().await;

	Ok(())
}
