//! Drives the full router over the in-memory store and a temporary mail outbox.

use api_lib::adapters::FileMailer;
use api_lib::config::Config;
use api_lib::web::{
    router,
    state::{Adapters, AppState},
};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use notekeeper_core::memory::InMemoryStore;
use notekeeper_core::testing::PlainTextHasher;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    app: Router,
    outbox: TempDir,
}

struct Reply {
    status: StatusCode,
    cookie: Option<String>,
    body: Value,
}

fn spawn_app(expose_confirmation_link: bool) -> TestApp {
    let outbox = tempfile::tempdir().unwrap();
    let config = Arc::new(Config {
        expose_confirmation_link,
        email_dir: outbox.path().to_path_buf(),
        ..Config::default()
    });
    let store = Arc::new(InMemoryStore::new());
    let adapters = Adapters {
        users: store.clone(),
        notes: store.clone(),
        sessions: store,
        hasher: Arc::new(PlainTextHasher),
        mailer: Arc::new(FileMailer::new(outbox.path())),
    };
    let app = router(Arc::new(AppState::new(config, adapters))).unwrap();
    TestApp { app, outbox }
}

impl TestApp {
    async fn call(&self, method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply {
            status,
            cookie,
            body,
        }
    }

    /// Every token found in the outbox, in no particular order.
    fn mailed_tokens(&self) -> Vec<String> {
        std::fs::read_dir(self.outbox.path())
            .unwrap()
            .map(|entry| std::fs::read_to_string(entry.unwrap().path()).unwrap())
            .filter_map(|body| {
                body.split("/confirm/")
                    .nth(1)
                    .map(|rest| rest.trim().to_string())
            })
            .collect()
    }

    async fn register(&self, email: &str, password: &str) -> Reply {
        self.call(
            Method::POST,
            "/register",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    async fn login(&self, email: &str, password: &str, cookie: Option<&str>) -> Reply {
        self.call(
            Method::POST,
            "/login",
            cookie,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Registers, confirms and logs in; returns the session cookie.
    async fn signed_in(&self, email: &str) -> String {
        let before = self.mailed_tokens();
        assert_eq!(self.register(email, "secret1").await.status, StatusCode::CREATED);
        let token = self
            .mailed_tokens()
            .into_iter()
            .find(|t| !before.contains(t))
            .unwrap();
        let confirm = self.call(Method::GET, &format!("/confirm/{}", token), None, None).await;
        assert_eq!(confirm.status, StatusCode::OK);
        self.login(email, "secret1", None).await.cookie.unwrap()
    }

    async fn create_note(&self, cookie: &str, body: Value) -> Reply {
        self.call(Method::POST, "/notes", Some(cookie), Some(body)).await
    }
}

fn titles(reply: &Reply) -> Vec<String> {
    reply
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn register_confirm_login_and_manage_a_note() {
    let app = spawn_app(false);

    let registered = app.register("a@x.com", "secret1").await;
    assert_eq!(registered.status, StatusCode::CREATED);
    assert!(registered.body.get("confirmation_link").is_none());

    let tokens = app.mailed_tokens();
    assert_eq!(tokens.len(), 1);
    let confirmed = app
        .call(Method::GET, &format!("/confirm/{}", tokens[0]), None, None)
        .await;
    assert_eq!(confirmed.status, StatusCode::OK);

    let login = app.login("a@x.com", "secret1", None).await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["user"]["confirmed"], json!(true));
    assert_eq!(login.body["user"]["email"], json!("a@x.com"));
    let cookie = login.cookie.unwrap();
    assert!(cookie.starts_with("session="));

    let created = app
        .create_note(&cookie, json!({ "title": "T", "content": "C", "category": "cat" }))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["status"], json!("new"));
    let id = created.body["id"].as_i64().unwrap();

    let found = app
        .call(Method::GET, "/notes?status=new", Some(&cookie), None)
        .await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(titles(&found), vec!["T"]);

    let deleted = app
        .call(Method::DELETE, &format!("/notes/{}", id), Some(&cookie), None)
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let empty = app.call(Method::GET, "/notes", Some(&cookie), None).await;
    assert_eq!(empty.body, json!([]));
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = spawn_app(false);
    for (method, uri) in [
        (Method::GET, "/me"),
        (Method::GET, "/notes"),
        (Method::POST, "/notes"),
        (Method::PUT, "/notes/1"),
        (Method::DELETE, "/notes/1"),
    ] {
        let reply = app.call(method.clone(), uri, None, Some(json!({}))).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert!(reply.body["error"].is_string());

        let forged = app
            .call(method.clone(), uri, Some("session=forged"), Some(json!({})))
            .await;
        assert_eq!(forged.status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
    }
}

#[tokio::test]
async fn account_rejections_map_to_distinct_statuses() {
    let app = spawn_app(false);
    assert_eq!(app.register("", "pw").await.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.register("a@x.com", "secret1").await.status, StatusCode::CREATED);
    assert_eq!(app.register("A@X.COM", "other").await.status, StatusCode::CONFLICT);

    assert_eq!(app.login("a@x.com", "secret1", None).await.status, StatusCode::FORBIDDEN);
    assert_eq!(app.login("a@x.com", "wrong", None).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login("b@x.com", "secret1", None).await.status, StatusCode::UNAUTHORIZED);

    let token = app.mailed_tokens().pop().unwrap();
    let uri = format!("/confirm/{}", token);
    assert_eq!(app.call(Method::GET, &uri, None, None).await.status, StatusCode::OK);
    let again = app.call(Method::GET, &uri, None, None).await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.body["error"], json!("Invalid or expired confirmation token"));
}

#[tokio::test]
async fn malformed_json_bodies_are_bad_requests() {
    let app = spawn_app(false);
    let wrong_type = app
        .call(
            Method::POST,
            "/register",
            None,
            Some(json!({ "email": "a@x.com", "password": 12345 })),
        )
        .await;
    assert_eq!(wrong_type.status, StatusCode::BAD_REQUEST);
    assert!(wrong_type.body["error"].is_string());
    assert!(app.mailed_tokens().is_empty());

    let cookie = app.signed_in("b@x.com").await;
    let bad_status = app
        .create_note(&cookie, json!({ "title": "t", "content": "c", "category": "x", "status": 5 }))
        .await;
    assert_eq!(bad_status.status, StatusCode::BAD_REQUEST);
    assert!(bad_status.body["error"].is_string());

    let no_content_type = Request::builder()
        .method(Method::POST)
        .uri("/login")
        .body(Body::from(json!({ "email": "b@x.com", "password": "secret1" }).to_string()))
        .unwrap();
    let response = app.app.clone().oneshot(no_content_type).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn notes_are_isolated_between_users() {
    let app = spawn_app(false);
    let alice = app.signed_in("alice@x.com").await;
    let bob = app.signed_in("bob@x.com").await;

    let note = app
        .create_note(&alice, json!({ "title": "private", "content": "c", "category": "cat" }))
        .await;
    let uri = format!("/notes/{}", note.body["id"]);

    let listed = app.call(Method::GET, "/notes", Some(&bob), None).await;
    assert_eq!(listed.body, json!([]));

    let update = app
        .call(Method::PUT, &uri, Some(&bob), Some(json!({ "title": "mine now" })))
        .await;
    assert_eq!(update.status, StatusCode::NOT_FOUND);
    let delete = app.call(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);

    let missing = app.call(Method::DELETE, "/notes/9999", Some(&bob), None).await;
    assert_eq!(missing.body, delete.body);

    let still_there = app.call(Method::GET, "/notes", Some(&alice), None).await;
    assert_eq!(titles(&still_there), vec!["private"]);
}

#[tokio::test]
async fn search_filters_and_updates() {
    let app = spawn_app(false);
    let cookie = app.signed_in("a@x.com").await;

    for (title, category, status) in [
        ("barfoobaz", "work", "done"),
        ("nothing", "work", "todo"),
        ("third", "home", "done"),
    ] {
        let reply = app
            .create_note(
                &cookie,
                json!({ "title": title, "content": "body", "category": category, "status": status }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED);
    }

    let all = app.call(Method::GET, "/notes", Some(&cookie), None).await;
    assert_eq!(titles(&all), vec!["third", "nothing", "barfoobaz"]);

    let by_query = app.call(Method::GET, "/notes?q=Foo", Some(&cookie), None).await;
    assert_eq!(titles(&by_query), vec!["barfoobaz"]);

    let combined = app
        .call(Method::GET, "/notes?status=done&category=work", Some(&cookie), None)
        .await;
    assert_eq!(titles(&combined), vec!["barfoobaz"]);

    let blank = app
        .call(Method::GET, "/notes?q=&status=&category=", Some(&cookie), None)
        .await;
    assert_eq!(titles(&blank).len(), 3);

    let bad_status = app.call(Method::GET, "/notes?status=bogus", Some(&cookie), None).await;
    assert_eq!(bad_status.status, StatusCode::BAD_REQUEST);

    let bogus = app
        .create_note(&cookie, json!({ "title": "t", "content": "c", "category": "x", "status": "bogus" }))
        .await;
    assert_eq!(bogus.status, StatusCode::BAD_REQUEST);

    let id = all.body[0]["id"].as_i64().unwrap();
    let updated = app
        .call(
            Method::PUT,
            &format!("/notes/{}", id),
            Some(&cookie),
            Some(json!({ "status": "todo" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["status"], json!("todo"));
    assert_eq!(updated.body["title"], json!("third"));
    assert_eq!(updated.body["category"], json!("home"));
}

#[tokio::test]
async fn logout_and_relogin_manage_sessions() {
    let app = spawn_app(false);
    let first = app.signed_in("a@x.com").await;

    let second = app.login("a@x.com", "secret1", Some(&first)).await.cookie.unwrap();
    assert_ne!(first, second);
    let stale = app.call(Method::GET, "/me", Some(&first), None).await;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);

    let me = app.call(Method::GET, "/me", Some(&second), None).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["email"], json!("a@x.com"));
    assert_eq!(me.body["confirmed"], json!(true));

    let logout = app.call(Method::POST, "/logout", Some(&second), None).await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.cookie.as_deref(), Some("session="));
    assert_eq!(
        app.call(Method::POST, "/logout", Some(&second), None).await.status,
        StatusCode::OK
    );
    assert_eq!(app.call(Method::POST, "/logout", None, None).await.status, StatusCode::OK);
    assert_eq!(
        app.call(Method::GET, "/me", Some(&second), None).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn confirmation_link_is_only_returned_when_enabled() {
    let app = spawn_app(true);
    let reply = app.register("a@x.com", "secret1").await;
    let link = reply.body["confirmation_link"].as_str().unwrap();
    let token = app.mailed_tokens().pop().unwrap();
    assert_eq!(link, format!("http://localhost:3000/confirm/{}", token));
}

#[tokio::test]
async fn health_and_openapi_are_public() {
    let app = spawn_app(false);
    let health = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(health.body, json!({ "status": "ok" }));

    let doc = app.call(Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(doc.status, StatusCode::OK);
    assert!(doc.body["paths"]["/notes/{id}"].is_object());
}
