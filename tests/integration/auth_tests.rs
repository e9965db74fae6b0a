//! Authentication integration tests.
//!
//! Tests verify:
//! - Login issues a bearer token for the seeded credential
//! - Wrong credentials are rejected with 400
//! - Missing, malformed, expired and forged tokens are rejected with 401
//! - Public routes need no token
//! - Seeding the admin credential is idempotent

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::http::{header, Method, StatusCode};

use meme_host::{check_login, seed_admin, CredentialHasher, SqliteMetadataStore, TokenAuth};

use super::test_utils::{
    authorized, body_json, get, login_request, multipart_request, Part, TestApp, ADMIN_LOGIN,
    ADMIN_PASSWORD, TEST_SECRET,
};

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_issues_bearer_token() {
    let app = TestApp::new().await;

    let response = app.send(login_request(ADMIN_LOGIN, ADMIN_PASSWORD)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["token_type"], "bearer");
    assert_eq!(json["expires_in"], 3600);

    let token = json["access_token"].as_str().unwrap();
    let auth = TokenAuth::new(TEST_SECRET, Duration::from_secs(3600));
    assert_eq!(auth.verify(token).unwrap(), ADMIN_LOGIN);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = TestApp::new().await;

    let response = app.send(login_request(ADMIN_LOGIN, "wrong")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "invalid_credentials");
    assert_eq!(json["message"], "Incorrect username or password");
}

#[tokio::test]
async fn test_login_unknown_user() {
    let app = TestApp::new().await;

    let response = app.send(login_request("someone", ADMIN_PASSWORD)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Token Checks
// =============================================================================

#[tokio::test]
async fn test_private_routes_require_token() {
    let app = TestApp::new().await;

    let response = app.send(get("/private/memes", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
    assert_eq!(body_json(response).await["error"], "missing_token");

    let response = app
        .send(authorized(Method::DELETE, "/private/memes?meme_id=1", None))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = multipart_request(
        Method::POST,
        "/private/memes",
        None,
        &[
            Part::text("text", "cat"),
            Part::file("image", "cat.png", "image/png", b"x"),
        ],
    );
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(app.blobs.keys().await.is_empty());
}

#[tokio::test]
async fn test_non_bearer_scheme_rejected() {
    let app = TestApp::new().await;
    let token = app.login().await;

    let request = axum::http::Request::builder()
        .uri("/private/memes")
        .header(header::AUTHORIZATION, format!("Basic {}", token))
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "invalid_token_format");
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let app = TestApp::new().await;
    let auth = TokenAuth::new(TEST_SECRET, Duration::from_secs(3600));
    let token = auth.issue_with_expiry(ADMIN_LOGIN, now() - 60);

    let response = app.send(get("/private/memes", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "token_expired");
}

#[tokio::test]
async fn test_forged_token_rejected() {
    let app = TestApp::new().await;
    let other = TokenAuth::new("some-other-secret", Duration::from_secs(3600));
    let (token, _) = other.issue(ADMIN_LOGIN);

    let response = app.send(get("/private/memes", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "invalid_token");
}

#[tokio::test]
async fn test_username_is_not_a_token() {
    let app = TestApp::new().await;

    let response = app.send(get("/private/memes", Some(ADMIN_LOGIN))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_token_grants_access() {
    let app = TestApp::new().await;
    let token = app.login().await;

    let response = app.send(get("/private/memes", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_public_routes_need_no_token() {
    let app = TestApp::new().await;

    for uri in ["/health", "/memes", "/memes?page=1"] {
        let response = app.send(get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn test_unknown_private_path_is_not_found() {
    let app = TestApp::new().await;

    let response = app.send(get("/private/nope", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Credential Seeding
// =============================================================================

#[tokio::test]
async fn test_seed_admin_is_idempotent() {
    let store = SqliteMetadataStore::open_in_memory().unwrap();
    let hasher = CredentialHasher::with_iterations("salt", 1);

    assert!(seed_admin(&store, &hasher, "madsoft", "first").await.unwrap());
    assert!(!seed_admin(&store, &hasher, "other", "second").await.unwrap());

    // The first credential is kept
    assert!(check_login(&store, &hasher, "madsoft", "first")
        .await
        .unwrap()
        .is_some());
    assert!(check_login(&store, &hasher, "other", "second")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_seeded_credential_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memes.db");
    let hasher = CredentialHasher::with_iterations("salt", 1);

    {
        let store = SqliteMetadataStore::open(&path).unwrap();
        seed_admin(&store, &hasher, "madsoft", "madsoft").await.unwrap();
    }

    let store = SqliteMetadataStore::open(&path).unwrap();
    assert!(!seed_admin(&store, &hasher, "madsoft", "changed").await.unwrap());
    assert!(check_login(&store, &hasher, "madsoft", "madsoft")
        .await
        .unwrap()
        .is_some());
}
