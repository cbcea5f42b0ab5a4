use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use base64::Engine;
use brink::config::Config;
use brink::entities::users::Role;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use tracing::field::{Field, Visit};
use tracing::span;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

async fn spawn_app() -> (Arc<brink::api::AppState>, Router) {
    let db_path = std::env::temp_dir().join(format!("brink-api-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_url = format!("sqlite:{}", db_path.display());
    config.security.jwt_secret = "integration-test-secret".to_string();

    let state = brink::api::create_app_state_from_config(config, None)
        .await
        .expect("failed to create app state");
    let router = brink::api::router(state.clone());
    (state, router)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("Authorization", auth);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn register(app: &Router, username: &str) -> (i32, String) {
    let (status, body) = send(
        app,
        "PUT",
        "/v1/users",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "hunter22",
            "first_name": "Test",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let id = i32::try_from(body["response_id"].as_i64().unwrap()).unwrap();
    let token = body["jwt_token"].as_str().unwrap().to_string();
    (id, format!("Bearer {token}"))
}

async fn register_admin(state: &brink::api::AppState, app: &Router, username: &str) -> String {
    let (_, token) = register(app, username).await;
    assert!(
        state
            .store()
            .set_user_role(username, Role::Admin)
            .await
            .unwrap()
    );
    token
}

#[tokio::test]
async fn test_register_and_fetch_user() {
    let (_state, app) = spawn_app().await;
    let (id, token) = register(&app, "alice").await;

    let (status, body) = send(&app, "GET", &format!("/v1/users/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["first_name"], "Test");
    assert_eq!(body["role"], "user");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_register_conflicts_and_validation() {
    let (_state, app) = spawn_app().await;
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        "PUT",
        "/v1/users",
        None,
        Some(json!({"username": "alice", "email": "other@example.com", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Username already exists.");

    let (status, body) = send(
        &app,
        "PUT",
        "/v1/users",
        None,
        Some(json!({"username": "bob", "email": "alice@example.com", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already exists.");

    let (status, body) = send(
        &app,
        "PUT",
        "/v1/users",
        None,
        Some(json!({"username": "alice@example.com", "email": "dave@example.com", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User with that email address already exists.");

    let (status, body) = send(
        &app,
        "PUT",
        "/v1/users",
        None,
        Some(json!({"username": "carol", "email": "carol@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "'password' is a required parameter.");
}

#[tokio::test]
async fn test_login() {
    let (_state, app) = spawn_app().await;
    let (id, _) = register(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/login",
        None,
        Some(json!({"username": "alice", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication failed.");

    let (status, body) = send(
        &app,
        "POST",
        "/v1/login",
        None,
        Some(json!({"username": "nobody", "password": "hunter22"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication failed.");

    let (status, body) = send(
        &app,
        "POST",
        "/v1/login",
        None,
        Some(json!({"username": "alice", "password": "hunter22"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert!(body["date_created"].is_string());

    let token = format!("JWT {}", body["jwt_token"].as_str().unwrap());
    let (status, _) = send(&app, "GET", &format!("/v1/users/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let (_state, app) = spawn_app().await;
    let (id, _) = register(&app, "alice").await;

    let (status, body) = send(&app, "GET", &format!("/v1/users/{id}"), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Request does not contain an access token");

    let (status, _) = send(
        &app,
        "GET",
        &format!("/v1/users/{id}"),
        Some("Bearer not.a.token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_and_delete_user() {
    let (_state, app) = spawn_app().await;
    let (alice, alice_token) = register(&app, "alice").await;
    let (bob, _) = register(&app, "bob").await;

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/v1/users/{bob}"),
        Some(&alice_token),
        Some(json!({"first_name": "Mallory"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/v1/users/{alice}"),
        Some(&alice_token),
        Some(json!({"username": "bob"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Username already in use.");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/v1/users/{alice}"),
        Some(&alice_token),
        Some(json!({"email": "bob@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already in use.");

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/v1/users/{alice}"),
        Some(&alice_token),
        Some(json!({"last_name": "Liddell", "password": "new-secret"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/v1/login",
        None,
        Some(json!({"username": "alice", "password": "new-secret"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/v1/users/{alice}"),
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], "User deleted.");

    let (status, _) = send(&app, "GET", &format!("/v1/users/{alice}"), Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_meta() {
    let (_state, app) = spawn_app().await;
    let (id, token) = register(&app, "alice").await;
    let uri = format!("/v1/users/{id}/meta");

    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({"theme": "dark", "volume": 7, "layout": {"cols": 2}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["keys"], json!(["layout", "theme", "volume"]));

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(&token),
        Some(json!({"keys": ["theme", "layout", "missing"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"theme": "dark", "layout": {"cols": 2}}));

    let (status, _) = send(&app, "DELETE", &format!("{uri}/theme"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(body["keys"], json!(["layout", "volume"]));
}

#[tokio::test]
async fn test_flights_require_admin() {
    let (state, app) = spawn_app().await;
    let (_, user_token) = register(&app, "pilot").await;

    let (status, body) = send(&app, "PUT", "/v1/flights", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Not authorized.");

    let admin_token = register_admin(&state, &app, "tower").await;
    let (status, body) = send(&app, "PUT", "/v1/flights", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["response_id"].as_i64().unwrap();

    let (status, body) = send(&app, "GET", &format!("/v1/flights/{id}"), Some(&user_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);

    let (status, body) = send(&app, "GET", "/v1/flights/9999", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Flight not found.");
}

#[tokio::test]
async fn test_flight_meta_and_cascade_delete() {
    let (state, app) = spawn_app().await;
    let admin = register_admin(&state, &app, "tower").await;

    let (_, body) = send(&app, "PUT", "/v1/flights", Some(&admin), None).await;
    let id = body["response_id"].as_i64().unwrap();
    let meta_uri = format!("/v1/flights/{id}/meta");

    let (status, body) = send(
        &app,
        "POST",
        &meta_uri,
        Some(&admin),
        Some(json!({"keys": ["color"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, body) = send(&app, "POST", &meta_uri, Some(&admin), Some(json!({"keys": "color"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "keys must be provided as an array");

    send(&app, "PUT", &meta_uri, Some(&admin), Some(json!({"color": "red"}))).await;
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/v1/flights/{id}/data"),
        Some(&admin),
        Some(json!({
            "timestamp": 1,
            "coordinate_x": 1.5,
            "coordinate_y": 2.5,
            "pressure": 1013,
            "temperature": 20,
            "altitude": 300,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "DELETE", &format!("/v1/flights/{id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], "Flight deleted.");

    let (status, _) = send(&app, "GET", &meta_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let id = i32::try_from(id).unwrap();
    assert!(state.store().flight_meta().list_meta_keys(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_data_points_paging() {
    let (state, app) = spawn_app().await;
    let admin = register_admin(&state, &app, "tower").await;

    let (_, body) = send(&app, "PUT", "/v1/flights", Some(&admin), None).await;
    let id = body["response_id"].as_i64().unwrap();
    let data_uri = format!("/v1/flights/{id}/data");

    for ts in (1..=5).rev() {
        let (status, _) = send(
            &app,
            "PUT",
            &data_uri,
            Some(&admin),
            Some(json!({
                "timestamp": ts,
                "coordinate_x": 0.0,
                "coordinate_y": 0.0,
                "pressure": 1000,
                "temperature": 15,
                "altitude": ts * 100,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        "PUT",
        &data_uri,
        Some(&admin),
        Some(json!({"timestamp": 6, "coordinate_x": 0.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "'coordinate_y' is a required parameter.");

    let (status, body) = send(
        &app,
        "POST",
        &data_uri,
        Some(&admin),
        Some(json!({"page": 1, "per_page": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 5);
    assert_eq!(body["pages"], 3);
    let timestamps: Vec<i64> = body["data"]
        .as_object()
        .unwrap()
        .values()
        .map(|p| p["timestamp"].as_i64().unwrap())
        .collect();
    let mut sorted = timestamps.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec![1, 2]);

    let (status, body) = send(
        &app,
        "GET",
        &format!("{data_uri}?page=9&per_page=2"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 5);
    assert!(body["data"].as_object().unwrap().is_empty());

    let (status, _) = send(&app, "POST", "/v1/flights/9999/data", Some(&admin), Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_user_records_data() {
    let (state, app) = spawn_app().await;
    let admin = register_admin(&state, &app, "tower").await;

    let hash = brink::auth::password::hash_password("sensor-pw", &state.config().security).unwrap();
    state.store().api_users().create("sensor", hash).await.unwrap();

    let (_, body) = send(&app, "PUT", "/v1/flights", Some(&admin), None).await;
    let id = body["response_id"].as_i64().unwrap();

    let basic = |user: &str, pw: &str| {
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(format!("{user}:{pw}"))
        )
    };
    let point = json!({
        "timestamp": 10,
        "coordinate_x": 4.0,
        "coordinate_y": 5.0,
        "pressure": 990,
        "temperature": -3,
        "altitude": 1200,
    });

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/v1/flights/{id}/data"),
        Some(&basic("sensor", "sensor-pw")),
        Some(point.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/v1/flights/{id}/data"),
        Some(&basic("sensor", "wrong")),
        Some(point),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/v1/flights/{id}"),
        Some(&basic("sensor", "sensor-pw")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_route() {
    let (_state, app) = spawn_app().await;
    let (status, body) = send(&app, "GET", "/v1/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found.");
}

#[tokio::test]
async fn test_rejections_render_json_errors() {
    let (_state, app) = spawn_app().await;
    let (id, token) = register(&app, "alice").await;

    let (status, body) = send(&app, "GET", "/v1/users/abc", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, "POST", "/v1/users", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "Method not allowed.");

    let (status, body) = send(&app, "PATCH", &format!("/v1/users/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "Method not allowed.");
}

#[tokio::test]
async fn test_bad_query_values_fall_back_to_defaults() {
    let (state, app) = spawn_app().await;
    let admin = register_admin(&state, &app, "tower").await;

    let (_, body) = send(&app, "PUT", "/v1/flights", Some(&admin), None).await;
    let id = body["response_id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "GET",
        &format!("/v1/flights/{id}/data?page=abc&per_page=-4"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["per_page"], 20);
}

/// Collects every value recorded into a `user_id` span field.
#[derive(Clone, Default)]
struct UserIdRecorder(Arc<Mutex<Vec<String>>>);

struct UserIdVisitor<'a>(&'a mut Option<String>);

impl Visit for UserIdVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "user_id" {
            *self.0 = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, _field: &Field, _value: &dyn std::fmt::Debug) {}
}

impl<S: tracing::Subscriber> Layer<S> for UserIdRecorder {
    fn on_record(&self, _id: &span::Id, values: &span::Record<'_>, _ctx: Context<'_, S>) {
        let mut user_id = None;
        values.record(&mut UserIdVisitor(&mut user_id));
        if let Some(user_id) = user_id {
            self.0.lock().unwrap().push(user_id);
        }
    }
}

#[tokio::test]
async fn test_request_span_records_the_caller() {
    let recorder = UserIdRecorder::default();
    let _guard = tracing::subscriber::set_default(
        tracing_subscriber::registry().with(recorder.clone()),
    );

    let (_state, app) = spawn_app().await;
    let (id, token) = register(&app, "alice").await;

    let (status, _) = send(&app, "GET", &format!("/v1/users/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let recorded = recorder.0.lock().unwrap().clone();
    assert_eq!(recorded, vec![format!("user:{id}")]);
}
