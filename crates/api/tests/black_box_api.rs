use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use taskgate_api::config::{BootstrapAdmin, GatewayConfig};

const JWT_SECRET: &str = "black-box-test-secret-0123456789abcdef";
const ADMIN_EMAIL: &str = "root@example.com";
const ADMIN_PASSWORD: &str = "root-password";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let mut config = GatewayConfig::new(JWT_SECRET);
        config.bootstrap_admin = Some(BootstrapAdmin {
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
        });

        // Build app (same router as prod), but bind to an ephemeral port.
        let app = taskgate_api::app::build_app(&config)
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn register(&self, login: &str, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/register"))
            .json(&json!({ "login": login, "email": email, "password": password }))
            .send()
            .await
            .unwrap()
    }

    async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap()
    }

    async fn token_for(&self, email: &str, password: &str) -> String {
        let res = self.login(email, password).await;
        assert_eq!(res.status(), StatusCode::OK, "login failed for {email}");
        let body: serde_json::Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.unwrap()
    }

    async fn admin_action(&self, token: &str, email: &str, action: &str) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/admin/users/{email}/{action}")))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(secret: &str, algorithm: Algorithm, sub: &str, ttl: ChronoDuration) -> String {
    let now = Utc::now();
    let (iat, exp) = if ttl > ChronoDuration::zero() {
        (now, now + ttl)
    } else {
        (now + ttl * 2, now + ttl)
    };
    let claims = json!({
        "sub": sub,
        "iat": iat.timestamp(),
        "exp": exp.timestamp(),
        "blocked": false,
    });

    jsonwebtoken::encode(
        &Header::new(algorithm),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn error_body(res: reqwest::Response) -> serde_json::Value {
    res.json().await.expect("error body is json")
}

#[tokio::test]
async fn public_routes_need_no_credentials() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/health", None).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv.register("alice", "alice@example.com", "pw-alice").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["token"].as_str().is_some_and(|t| t.split('.').count() == 3));
}

#[tokio::test]
async fn protected_route_without_header_is_unauthorized() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/api/users/me", None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = error_body(res).await;
    assert_eq!(body["status"], 401);
    assert_eq!(
        body["message"],
        "Authentication failed: Missing or invalid Authorization header"
    );
    assert_eq!(body["details"], "uri=/api/users/me");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn wrong_scheme_is_treated_as_missing() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .get(srv.url("/api/users/me"))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_bearer_token_is_invalid_format() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/api/users/me", Some("garbage")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_body(res).await["message"], "Invalid token format");
}

#[tokio::test]
async fn token_signed_with_other_secret_is_rejected() {
    let srv = TestServer::spawn().await;
    srv.register("bob", "bob@example.com", "pw-bob").await;

    let forged = mint_jwt(
        "some-other-secret",
        Algorithm::HS512,
        "bob@example.com",
        ChronoDuration::minutes(10),
    );
    let res = srv.get("/api/users/me", Some(&forged)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_body(res).await["message"], "Invalid token signature");
}

#[tokio::test]
async fn token_with_other_algorithm_is_rejected() {
    let srv = TestServer::spawn().await;
    srv.register("bob", "bob@example.com", "pw-bob").await;

    let token = mint_jwt(
        JWT_SECRET,
        Algorithm::HS256,
        "bob@example.com",
        ChronoDuration::minutes(10),
    );
    let res = srv.get("/api/users/me", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_body(res).await["message"], "Invalid token signature");
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let srv = TestServer::spawn().await;
    srv.register("carol", "carol@example.com", "pw-carol").await;

    let expired = mint_jwt(
        JWT_SECRET,
        Algorithm::HS512,
        "carol@example.com",
        -ChronoDuration::minutes(5),
    );
    let res = srv.get("/api/users/me", Some(&expired)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_body(res).await["message"], "Token expired");
}

#[tokio::test]
async fn valid_token_for_deleted_subject_is_unknown_principal() {
    let srv = TestServer::spawn().await;

    let token = mint_jwt(
        JWT_SECRET,
        Algorithm::HS512,
        "ghost@example.com",
        ChronoDuration::minutes(10),
    );
    let res = srv.get("/api/users/me", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        error_body(res).await["message"],
        "Authentication failed: unknown principal"
    );
}

#[tokio::test]
async fn login_failures_are_unauthorized() {
    let srv = TestServer::spawn().await;
    srv.register("dave", "dave@example.com", "pw-dave").await;

    let res = srv.login("dave@example.com", "not-the-password").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        error_body(res).await["message"],
        "Unauthorized: invalid credentials"
    );

    let res = srv.login("nobody@example.com", "pw-dave").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        error_body(res).await["message"],
        "Authentication failed: unknown principal"
    );
}

#[tokio::test]
async fn user_sees_own_profile_but_not_admin_routes() {
    let srv = TestServer::spawn().await;
    srv.register("erin", "Erin@Example.com", "pw-erin").await;
    let token = srv.token_for("erin@example.com", "pw-erin").await;

    let res = srv.get("/api/users/me", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let me: serde_json::Value = res.json().await.unwrap();
    assert_eq!(me["email"], "erin@example.com");
    assert_eq!(me["login"], "erin");
    assert_eq!(me["role"], "USER");
    assert_eq!(me["blocked"], false);

    let res = srv.get("/api/admin/users", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body = error_body(res).await;
    assert!(body["message"].as_str().unwrap().contains("Access Denied"));
    assert!(body["details"].is_null());
}

#[tokio::test]
async fn admin_can_list_users() {
    let srv = TestServer::spawn().await;
    srv.register("frank", "frank@example.com", "pw-frank").await;
    let admin = srv.token_for(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let res = srv.get("/api/admin/users", Some(&admin)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let users: Vec<serde_json::Value> = res.json().await.unwrap();
    let emails: Vec<&str> = users.iter().filter_map(|u| u["email"].as_str()).collect();
    assert_eq!(emails, vec!["frank@example.com", ADMIN_EMAIL]);
}

#[tokio::test]
async fn blocking_takes_effect_on_existing_tokens() {
    let srv = TestServer::spawn().await;
    srv.register("grace", "grace@example.com", "pw-grace").await;
    let token = srv.token_for("grace@example.com", "pw-grace").await;
    let admin = srv.token_for(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let res = srv.admin_action(&admin, "grace@example.com", "block").await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // Token was issued before the block and is still cryptographically valid.
    let res = srv.get("/api/users/me", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        error_body(res).await["message"],
        "Access Denied: account is locked"
    );

    // Lock status wins over a wrong password at login.
    let res = srv.login("grace@example.com", "wrong").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv.admin_action(&admin, "grace@example.com", "unblock").await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = srv.get("/api/users/me", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn role_changes_apply_on_next_request() {
    let srv = TestServer::spawn().await;
    srv.register("heidi", "heidi@example.com", "pw-heidi").await;
    let token = srv.token_for("heidi@example.com", "pw-heidi").await;
    let admin = srv.token_for(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    assert_eq!(
        srv.get("/api/admin/users", Some(&token)).await.status(),
        StatusCode::FORBIDDEN
    );

    let res = srv.admin_action(&admin, "heidi@example.com", "make-admin").await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        srv.get("/api/admin/users", Some(&token)).await.status(),
        StatusCode::OK
    );

    let res = srv.admin_action(&admin, "heidi@example.com", "make-user").await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        srv.get("/api/admin/users", Some(&token)).await.status(),
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn deleted_user_token_stops_resolving() {
    let srv = TestServer::spawn().await;
    srv.register("kate", "kate@example.com", "pw-kate").await;
    let token = srv.token_for("kate@example.com", "pw-kate").await;
    let admin = srv.token_for(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let res = srv
        .client
        .delete(srv.url("/api/admin/users/kate@example.com"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = srv.get("/api/users/me", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        error_body(res).await["message"],
        "Authentication failed: unknown principal"
    );

    let res = srv
        .client
        .delete(srv.url("/api/admin/users/kate@example.com"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_cannot_delete_accounts() {
    let srv = TestServer::spawn().await;
    srv.register("leo", "leo@example.com", "pw-leo").await;
    let token = srv.token_for("leo@example.com", "pw-leo").await;

    let res = srv
        .client
        .delete(srv.url(&format!("/api/admin/users/{ADMIN_EMAIL}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_actions_on_unknown_user_are_not_found() {
    let srv = TestServer::spawn().await;
    let admin = srv.token_for(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let res = srv.admin_action(&admin, "ghost@example.com", "block").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_body(res).await["message"], "User not found");
}

#[tokio::test]
async fn admin_can_create_users_with_role() {
    let srv = TestServer::spawn().await;
    let admin = srv.token_for(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let res = srv
        .client
        .post(srv.url("/api/admin/users"))
        .bearer_auth(&admin)
        .json(&json!({
            "login": "ivan",
            "email": "ivan@example.com",
            "password": "pw-ivan",
            "role": "ADMIN",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["role"], "ADMIN");

    let token = srv.token_for("ivan@example.com", "pw-ivan").await;
    assert_eq!(
        srv.get("/api/admin/users", Some(&token)).await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn registration_rejects_duplicates_and_blank_fields() {
    let srv = TestServer::spawn().await;

    let res = srv.register("judy", "judy@example.com", "pw").await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv.register("judy2", "JUDY@example.com", "pw").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = srv.register("judy", "other@example.com", "pw").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = srv.register("", "blank@example.com", "pw").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = error_body(res).await;
    assert_eq!(body["details"], "uri=/api/auth/register");
}
