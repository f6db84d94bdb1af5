#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use doctape_oauth2::{
	_preludet::*,
	auth::TokenSecret,
	config::ClientAuthMethod,
	flows::{
		AuthOutcome, AuthorizationSession, CallbackParams, FailureReason, PkceCodeChallengeMethod,
	},
	profile::Profile,
	verify::VerifyResult,
};

const TOKEN_BODY: &str = "{\"access_token\":\"access-ok\",\"refresh_token\":\"refresh-ok\",\"token_type\":\"bearer\",\"expires_in\":3600}";
const ACCOUNT_BODY: &str = r#"{"result":{"username":"alice","email":"alice@example.com"}}"#;

async fn by_username(
	access: TokenSecret,
	refresh: Option<TokenSecret>,
	profile: Profile,
) -> VerifyResult<String> {
	assert_eq!(access.expose(), "access-ok");
	assert_eq!(refresh.as_ref().map(TokenSecret::expose), Some("refresh-ok"));

	Ok(profile.username)
}

async fn reject(
	_access: TokenSecret,
	_refresh: Option<TokenSecret>,
	_profile: Profile,
) -> VerifyResult<String> {
	Ok(None)
}

async fn directory_offline(
	_access: TokenSecret,
	_refresh: Option<TokenSecret>,
	_profile: Profile,
) -> VerifyResult<String> {
	Err("user directory offline".into())
}

fn callback(session: &AuthorizationSession, code: &str) -> CallbackParams {
	CallbackParams {
		code: Some(code.into()),
		state: Some(session.state.clone()),
		..Default::default()
	}
}

async fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await
}

async fn mock_account(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/account").header("authorization", "Bearer access-ok");
			then.status(200).header("content-type", "application/json").body(ACCOUNT_BODY);
		})
		.await
}

#[tokio::test]
async fn callback_with_code_signs_user_in() {
	let server = MockServer::start_async().await;
	let strategy = build_reqwest_test_strategy(test_options(&server.base_url()), by_username);
	let session = strategy.start_authorization();
	let authorize_pairs: HashMap<_, _> = session.authorize_url.query_pairs().into_owned().collect();

	assert!(session.authorize_url.as_str().starts_with(&server.url("/oauth2?")));
	assert_eq!(authorize_pairs.get("response_type"), Some(&"code".into()));
	assert_eq!(authorize_pairs.get("client_id"), Some(&TEST_CLIENT_ID.into()));
	assert_eq!(authorize_pairs.get("redirect_uri"), Some(&TEST_CALLBACK_URL.into()));
	assert_eq!(authorize_pairs.get("state"), Some(&session.state));
	assert_eq!(session.state.len(), 32);
	assert!(!authorize_pairs.contains_key("scope"));
	assert!(!authorize_pairs.contains_key("code_challenge"));

	let token = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth2/token")
				.header("content-type", "application/x-www-form-urlencoded")
				.body_includes("grant_type=authorization_code")
				.body_includes("code=code-ok")
				.body_includes("client_secret=secret-it");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let account = mock_account(&server).await;
	let params = callback(&session, "code-ok");
	let outcome =
		strategy.authenticate(session, params).await.expect("Callback should complete.");

	token.assert_calls_async(1).await;
	account.assert_calls_async(1).await;

	match outcome {
		AuthOutcome::Success { user, grant, profile } => {
			assert_eq!(user, "alice");
			assert_eq!(grant.access_token.expose(), "access-ok");
			assert_eq!(grant.token_type, "bearer");
			assert!(grant.expires_at.is_some());
			assert_eq!(profile.email.as_deref(), Some("alice@example.com"));
		},
		other => panic!("Unexpected outcome: {other:?}."),
	}
}

#[tokio::test]
async fn pkce_sessions_send_challenge_and_verifier() {
	let server = MockServer::start_async().await;
	let strategy = build_reqwest_test_strategy(
		test_options(&server.base_url()).pkce(true).scope(["account", "files"]),
		by_username,
	);
	let session = strategy.start_authorization();
	let authorize_pairs: HashMap<_, _> = session.authorize_url.query_pairs().into_owned().collect();

	assert_eq!(session.code_challenge_method(), Some(PkceCodeChallengeMethod::S256));
	assert_eq!(authorize_pairs.get("code_challenge_method"), Some(&"S256".into()));
	assert_eq!(authorize_pairs.get("code_challenge").map(String::as_str), session.code_challenge());
	assert_eq!(authorize_pairs.get("scope"), Some(&"account files".into()));

	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token").body_includes("code_verifier=");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let account = mock_account(&server).await;
	let params = callback(&session, "code-pkce");
	let outcome =
		strategy.authenticate(session, params).await.expect("PKCE callback should complete.");

	token.assert_async().await;
	account.assert_async().await;

	assert_eq!(outcome.user().map(String::as_str), Some("alice"));
}

#[tokio::test]
async fn client_secret_basic_uses_authorization_header() {
	let server = MockServer::start_async().await;
	let strategy = build_reqwest_test_strategy(
		test_options(&server.base_url()).client_auth_method(ClientAuthMethod::ClientSecretBasic),
		by_username,
	);
	let session = strategy.start_authorization();
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token").header_exists("authorization");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let account = mock_account(&server).await;
	let params = callback(&session, "code-basic");

	strategy.authenticate(session, params).await.expect("Basic-auth callback should complete.");

	token.assert_async().await;
	account.assert_async().await;
}

#[tokio::test]
async fn access_denied_is_a_failure_without_network_calls() {
	let server = MockServer::start_async().await;
	let strategy = build_reqwest_test_strategy(test_options(&server.base_url()), by_username);
	let session = strategy.start_authorization();
	let token = mock_token(&server).await;
	let params = CallbackParams {
		error: Some("access_denied".into()),
		error_description: Some("The user denied access.".into()),
		state: Some(session.state.clone()),
		..Default::default()
	};
	let outcome = strategy.authenticate(session, params).await.expect("Denial is not an error.");

	token.assert_calls_async(0).await;

	assert_eq!(
		outcome.failure(),
		Some(&FailureReason::AccessDenied(Some("The user denied access.".into())))
	);
}

#[tokio::test]
async fn other_callback_errors_are_errors() {
	let server = MockServer::start_async().await;
	let strategy = build_reqwest_test_strategy(test_options(&server.base_url()), by_username);
	let session = strategy.start_authorization();
	let params = CallbackParams::from_query("error=invalid_scope&error_description=Unknown+scope");
	let err = strategy
		.authenticate(session, params)
		.await
		.expect_err("Provider error should surface as an error.");

	assert!(matches!(
		err,
		Error::Authorization { ref code, description: Some(ref description) }
			if code == "invalid_scope" && description == "Unknown scope"
	));
}

#[tokio::test]
async fn state_mismatch_and_missing_code_fail_before_exchange() {
	let server = MockServer::start_async().await;
	let strategy = build_reqwest_test_strategy(test_options(&server.base_url()), by_username);
	let token = mock_token(&server).await;
	let session = strategy.start_authorization();
	let params = CallbackParams {
		code: Some("code-forged".into()),
		state: Some("forged-state".into()),
		..Default::default()
	};
	let outcome = strategy.authenticate(session, params).await.expect("Mismatch is not an error.");

	assert_eq!(outcome.failure(), Some(&FailureReason::StateMismatch));

	let session = strategy.start_authorization();
	let params = CallbackParams { code: Some("code-lost".into()), ..Default::default() };
	let outcome = strategy.authenticate(session, params).await.expect("Mismatch is not an error.");

	assert_eq!(outcome.failure(), Some(&FailureReason::StateMismatch));

	let session = strategy.start_authorization();
	let params = CallbackParams { state: Some(session.state.clone()), ..Default::default() };
	let outcome =
		strategy.authenticate(session, params).await.expect("Missing code is not an error.");

	assert_eq!(outcome.failure(), Some(&FailureReason::MissingCode));

	token.assert_calls_async(0).await;
}

#[tokio::test]
async fn verification_rejection_and_failure() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server).await;
	let account = mock_account(&server).await;
	let strategy = build_reqwest_test_strategy(test_options(&server.base_url()), reject);
	let session = strategy.start_authorization();
	let params = callback(&session, "code-reject");
	let outcome = strategy.authenticate(session, params).await.expect("Rejection is not an error.");

	assert_eq!(outcome.failure(), Some(&FailureReason::Rejected));

	let strategy = build_reqwest_test_strategy(test_options(&server.base_url()), directory_offline);
	let session = strategy.start_authorization();
	let params = callback(&session, "code-offline");
	let err = strategy
		.authenticate(session, params)
		.await
		.expect_err("Verification failure should surface.");

	match err {
		Error::Verify(source) => assert_eq!(source.to_string(), "user directory offline"),
		other => panic!("Unexpected error: {other:?}."),
	}

	token.assert_calls_async(2).await;
	account.assert_calls_async(2).await;
}

#[tokio::test]
async fn invalid_grant_from_token_endpoint_skips_profile() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"Code already used\"}");
		})
		.await;
	let account = mock_account(&server).await;
	let strategy = build_reqwest_test_strategy(test_options(&server.base_url()), by_username);
	let session = strategy.start_authorization();
	let params = callback(&session, "code-reused");
	let err = strategy
		.authenticate(session, params)
		.await
		.expect_err("Reused code should fail.");

	token.assert_async().await;
	account.assert_calls_async(0).await;

	assert!(matches!(err, Error::InvalidGrant { ref reason } if reason.contains("Code already used")));
}

#[tokio::test]
async fn unavailable_token_endpoint_is_transient() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(503)
				.header("content-type", "application/json")
				.header("retry-after", "30")
				.body("{\"error\":\"temporarily_unavailable\"}");
		})
		.await;

	let strategy = build_reqwest_test_strategy(test_options(&server.base_url()), by_username);
	let session = strategy.start_authorization();
	let params = callback(&session, "code-later");
	let err = strategy
		.authenticate(session, params)
		.await
		.expect_err("503 should fail.");

	match err {
		Error::Transient(doctape_oauth2::error::TransientError::TokenEndpoint {
			status,
			retry_after,
			..
		}) => {
			assert_eq!(status, Some(503));
			assert_eq!(retry_after, Some(Duration::seconds(30)));
		},
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn out_of_range_expires_in_yields_grant_without_expiry() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-ok\",\"refresh_token\":\"refresh-ok\",\"token_type\":\"bearer\",\"expires_in\":300000000000}",
			);
		})
		.await;
	let account = mock_account(&server).await;
	let strategy = build_reqwest_test_strategy(test_options(&server.base_url()), by_username);
	let session = strategy.start_authorization();
	let params = callback(&session, "code-far-future");
	let outcome = strategy
		.authenticate(session, params)
		.await
		.expect("Far-future expiry should not fail the login.");

	token.assert_async().await;
	account.assert_async().await;

	match outcome {
		AuthOutcome::Success { user, grant, .. } => {
			assert_eq!(user, "alice");
			assert_eq!(grant.expires_at, None);
		},
		other => panic!("Unexpected outcome: {other:?}."),
	}
}
