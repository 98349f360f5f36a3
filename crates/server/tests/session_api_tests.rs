//! Tests for the account and session endpoints: registration, password
//! login, listing and logout.

use axum_test::TestServer;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbBackend, Set, Statement};
use serde_json::{Value, json};
use session_gate::{
    AppResources,
    api::build_router,
    config::{AppConfig, JwtConfig, OAuthConfig, ProviderConfig},
    entity::user,
    password::hash_password,
    token::Claims,
};
use std::sync::Arc;
use time::OffsetDateTime;

/// Create a test database with the identity tables.
async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.expect("connect");

    db.execute(Statement::from_string(
        DbBackend::Sqlite,
        r#"CREATE TABLE user (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NULL,
            picture TEXT NULL,
            password_hash TEXT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );"#,
    ))
    .await
    .expect("create user table");

    db.execute(Statement::from_string(
        DbBackend::Sqlite,
        r#"CREATE TABLE session (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            user_agent TEXT NOT NULL,
            valid INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );"#,
    ))
    .await
    .expect("create session table");

    db
}

fn create_test_config() -> AppConfig {
    let provider = ProviderConfig {
        client_id: "client".into(),
        client_secret: "secret".into(),
        redirect_url: "http://localhost:8080/api/oauth/google/callback".into(),
        token_url: "http://localhost:1/token".into(),
        userinfo_url: "http://localhost:1/userinfo".into(),
    };
    AppConfig {
        database_url: "sqlite::memory:".into(),
        bind_addr: "0.0.0.0:0".into(),
        client_origin: "http://localhost:3000".into(),
        production: false,
        cookie_domain: None,
        jwt: JwtConfig {
            secret: "12345678901234567890123456789012".into(),
            access_token_ttl_secs: 900,
            refresh_token_ttl_secs: 31_536_000,
        },
        oauth: OAuthConfig {
            google: provider.clone(),
            facebook: provider,
        },
        provider_timeout_secs: 1,
    }
}

async fn create_test_resources() -> AppResources {
    let db = Arc::new(create_test_db().await);
    AppResources::new(db, Arc::new(create_test_config()))
}

/// Insert a password-bearing user row.
async fn seed_user(resources: &AppResources, email: &str, password: &str) -> user::Model {
    let now = OffsetDateTime::now_utc();
    user::ActiveModel {
        id: Set(uuid::Uuid::new_v4().to_string()),
        email: Set(email.to_string()),
        name: Set(Some("Jane".to_string())),
        picture: Set(None),
        password_hash: Set(Some(hash_password(password).expect("hash"))),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(resources.db.as_ref())
    .await
    .expect("insert user")
}

fn bearer(token: &str) -> axum::http::HeaderValue {
    axum::http::HeaderValue::from_str(&format!("Bearer {token}")).expect("header value")
}

#[tokio::test]
async fn registration_then_password_login_round_trips() {
    let resources = create_test_resources().await;
    let server = TestServer::new(build_router(resources.clone())).expect("create test server");

    let response = server
        .post("/api/users")
        .json(&json!({
            "email": "jane@example.com",
            "name": "Jane",
            "password": "hunter2!",
            "passwordConfirmation": "hunter2!",
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["email"], "jane@example.com");
    assert_eq!(body["name"], "Jane");
    // Credential material never leaves the server.
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("password_hash").is_none());

    let login = server
        .post("/api/sessions")
        .json(&json!({"email": "jane@example.com", "password": "hunter2!"}))
        .await;
    login.assert_status_ok();
    let tokens: Value = login.json();
    assert!(tokens["accessToken"].is_string());
}

#[tokio::test]
async fn registration_rejects_bad_input_and_taken_email() {
    let resources = create_test_resources().await;
    seed_user(&resources, "taken@example.com", "hunter2!").await;
    let server = TestServer::new(build_router(resources)).expect("create test server");

    let mismatched = server
        .post("/api/users")
        .json(&json!({
            "email": "jane@example.com",
            "password": "hunter2!",
            "passwordConfirmation": "hunter3!",
        }))
        .await;
    mismatched.assert_status_bad_request();

    let short = server
        .post("/api/users")
        .json(&json!({
            "email": "jane@example.com",
            "password": "pw",
            "passwordConfirmation": "pw",
        }))
        .await;
    short.assert_status_bad_request();

    let duplicate = server
        .post("/api/users")
        .json(&json!({
            "email": "taken@example.com",
            "password": "hunter2!",
            "passwordConfirmation": "hunter2!",
        }))
        .await;
    duplicate.assert_status(axum::http::StatusCode::CONFLICT);
    let body: Value = duplicate.json();
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn password_login_issues_credentials_and_cookies() {
    let resources = create_test_resources().await;
    let user = seed_user(&resources, "jane@example.com", "hunter2!").await;
    let server = TestServer::new(build_router(resources.clone())).expect("create test server");

    let response = server
        .post("/api/sessions")
        .json(&json!({"email": "jane@example.com", "password": "hunter2!"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let access = body["accessToken"].as_str().expect("accessToken").to_string();
    let refresh = body["refreshToken"].as_str().expect("refreshToken").to_string();

    // Both credentials verify and carry the user snapshot.
    for token in [&access, &refresh] {
        let verification = resources.codec.verify(token);
        assert!(verification.valid);
        let claims = verification.claims.expect("claims");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "jane@example.com");
    }

    let cookies: Vec<String> = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok().map(String::from))
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=")));
    // Development profile: host-only, lax.
    assert!(cookies.iter().all(|c| c.contains("HttpOnly")));
    assert!(cookies.iter().all(|c| !c.contains("Secure")));

    // A session row exists for the user.
    let sessions = resources
        .sessions()
        .find_active(&user.id)
        .await
        .expect("list");
    assert_eq!(sessions.len(), 1);
}

#[tokio::test]
async fn wrong_password_unknown_email_and_passwordless_account_all_reject_alike() {
    let resources = create_test_resources().await;
    seed_user(&resources, "jane@example.com", "hunter2!").await;
    // Federated-only account, no password hash.
    let now = OffsetDateTime::now_utc();
    user::ActiveModel {
        id: Set("federated".to_string()),
        email: Set("fed@example.com".to_string()),
        name: Set(None),
        picture: Set(None),
        password_hash: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(resources.db.as_ref())
    .await
    .expect("insert user");

    let server = TestServer::new(build_router(resources)).expect("create test server");

    let attempts = [
        json!({"email": "jane@example.com", "password": "wrong"}),
        json!({"email": "nobody@example.com", "password": "hunter2!"}),
        json!({"email": "fed@example.com", "password": "hunter2!"}),
    ];
    for payload in attempts {
        let response = server.post("/api/sessions").json(&payload).await;
        response.assert_status_unauthorized();
        let body: Value = response.json();
        assert_eq!(body["error_description"], "Invalid email or password");
    }
}

#[tokio::test]
async fn list_sessions_returns_active_rows_newest_first() {
    let resources = create_test_resources().await;
    let user = seed_user(&resources, "jane@example.com", "hunter2!").await;
    let first = resources
        .sessions()
        .create(&user.id, "agent-1")
        .await
        .expect("create");
    let second = resources
        .sessions()
        .create(&user.id, "agent-2")
        .await
        .expect("create");
    // A revoked session must not show up.
    let revoked = resources
        .sessions()
        .create(&user.id, "agent-3")
        .await
        .expect("create");
    resources
        .sessions()
        .invalidate(&revoked.id)
        .await
        .expect("invalidate");

    let token = resources
        .codec
        .issue(&Claims::for_session(&user, &first.id, 900))
        .expect("issue");
    let server = TestServer::new(build_router(resources)).expect("create test server");

    let response = server
        .get("/api/sessions")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let rows = body.as_array().expect("array");
    assert_eq!(rows.len(), 2);
    let ids: Vec<&str> = rows.iter().filter_map(|r| r["id"].as_str()).collect();
    assert!(ids.contains(&first.id.as_str()));
    assert!(ids.contains(&second.id.as_str()));
    assert!(!ids.contains(&revoked.id.as_str()));
}

#[tokio::test]
async fn logout_revokes_session_and_clears_cookies() {
    let resources = create_test_resources().await;
    let user = seed_user(&resources, "jane@example.com", "hunter2!").await;
    let session = resources
        .sessions()
        .create(&user.id, "agent")
        .await
        .expect("create");
    let token = resources
        .codec
        .issue(&Claims::for_session(&user, &session.id, 900))
        .expect("issue");
    let server = TestServer::new(build_router(resources.clone())).expect("create test server");

    let response = server
        .delete("/api/sessions")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["accessToken"].is_null());
    assert!(body["refreshToken"].is_null());

    let cookies: Vec<String> = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok().map(String::from))
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=;")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=;")));
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));

    let row = resources
        .sessions()
        .find_by_id(&session.id)
        .await
        .expect("lookup")
        .expect("exists");
    assert!(!row.valid);
}

#[tokio::test]
async fn logout_is_idempotent_and_access_credential_outlives_revocation() {
    let resources = create_test_resources().await;
    let user = seed_user(&resources, "jane@example.com", "hunter2!").await;
    let session = resources
        .sessions()
        .create(&user.id, "agent")
        .await
        .expect("create");
    let token = resources
        .codec
        .issue(&Claims::for_session(&user, &session.id, 900))
        .expect("issue");
    let server = TestServer::new(build_router(resources)).expect("create test server");

    server
        .delete("/api/sessions")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .await
        .assert_status_ok();

    // The access credential stays cryptographically valid until it expires,
    // so a repeat logout with it still resolves an identity and succeeds.
    let response = server
        .delete("/api/sessions")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_ok();
}
