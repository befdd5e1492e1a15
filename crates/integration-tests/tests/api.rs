//! HTTP API tests: the real router driven through `tower::ServiceExt`.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use party_rsvp_integration_tests::{
    ACCESS_SECRET, BAD_TOKEN, CONFIG_TOKEN, FakeGistApi, OTHER_TOKEN, state_for,
};
use serde_json::{Value, json};
use tower::ServiceExt;

fn gated_app(api: &FakeGistApi) -> Router {
    party_rsvp_server::app(state_for(api, &[("RSVP_ACCESS_SECRET", ACCESS_SECRET)]))
}

fn rsvp_body() -> Value {
    json!({
        "name": "Ana",
        "email": "ana@party.test",
        "child_name": "Skye",
        "going": true,
        "num_adults": 2,
        "num_kids": 1,
        "message": "Can't wait"
    })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value, Option<String>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(String::from);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body, cookie)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let api = FakeGistApi::start().await;
    let response = gated_app(&api).oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_access_check() {
    let api = FakeGistApi::start().await;
    let app = gated_app(&api);

    let (status, body, _) = send(&app, get(&format!("/api/access?access={ACCESS_SECRET}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"valid": true, "open": false}));

    let (status, body, _) = send(&app, get("/api/access?access=nope")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["kind"], "access_denied");
}

#[tokio::test]
async fn test_submit_then_list_via_header_secret() {
    let api = FakeGistApi::start().await;
    let app = gated_app(&api);

    let (status, body, _) = send(
        &app,
        post_json(&format!("/api/rsvp?access={ACCESS_SECRET}"), &rsvp_body()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["rsvp"]["contact_name"], "Ana");
    assert_eq!(body["rsvp"]["attending"], true);

    let request = Request::get("/api/admin/rsvps")
        .header("x-access-token", ACCESS_SECRET)
        .body(Body::empty())
        .unwrap();
    let (status, body, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert!(body["rsvps"][0]["id"].is_string());
    assert_eq!(body["rsvps"][0]["adult_count"], 2);
}

#[tokio::test]
async fn test_submit_with_wrong_secret_is_forbidden_and_remote_free() {
    let api = FakeGistApi::start().await;
    let app = gated_app(&api);

    let (status, body, _) = send(&app, post_json("/api/rsvp?access=wrong", &rsvp_body())).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["kind"], "access_denied");
    assert_eq!(api.calls(), 0);
}

#[tokio::test]
async fn test_submit_validation_error_names_field() {
    let api = FakeGistApi::start().await;
    let app = gated_app(&api);

    let mut body = rsvp_body();
    body["going"] = Value::Null;
    let (status, body, _) = send(
        &app,
        post_json(&format!("/api/rsvp?access={ACCESS_SECRET}"), &body),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["kind"], "validation_error");
    assert_eq!(body["error"]["field"], "attending");
    assert_eq!(api.calls(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_validation_error() {
    let api = FakeGistApi::start().await;
    let app = gated_app(&api);

    let request = Request::post(format!("/api/rsvp?access={ACCESS_SECRET}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["field"], "body");
}

#[tokio::test]
async fn test_admin_requires_access_before_credential() {
    let api = FakeGistApi::start().await;
    let app = party_rsvp_server::app(state_for(
        &api,
        &[("RSVP_ACCESS_SECRET", ACCESS_SECRET), ("GITHUB_TOKEN", "")],
    ));

    let (status, body, _) = send(&app, get("/api/admin/stats")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["kind"], "access_denied");

    let (status, body, _) = send(&app, get(&format!("/api/admin/stats?access={ACCESS_SECRET}"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["kind"], "credential_missing");
    assert_eq!(api.calls(), 0);
}

#[tokio::test]
async fn test_rejected_token_maps_to_bad_gateway() {
    let api = FakeGistApi::start().await;
    let app = gated_app(&api);

    // Create the gist first so the read actually reaches the remote
    send(
        &app,
        post_json(&format!("/api/rsvp?access={ACCESS_SECRET}"), &rsvp_body()),
    )
    .await;

    let (status, body, _) = send(
        &app,
        get(&format!("/api/admin/rsvps?access={ACCESS_SECRET}&token={BAD_TOKEN}")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["kind"], "auth_rejected");
}

#[tokio::test]
async fn test_stats_overview_and_clear() {
    let api = FakeGistApi::start().await;
    let app = gated_app(&api);
    let q = format!("access={ACCESS_SECRET}");

    send(&app, post_json(&format!("/api/rsvp?{q}"), &rsvp_body())).await;
    let mut decline = rsvp_body();
    decline["name"] = json!("Ben");
    decline["going"] = json!(false);
    decline["num_adults"] = json!(0);
    decline["num_kids"] = json!(0);
    send(&app, post_json(&format!("/api/rsvp?{q}"), &decline)).await;

    let (_, stats, _) = send(&app, get(&format!("/api/admin/stats?{q}"))).await;
    assert_eq!(
        stats,
        json!({"total": 2, "going": 1, "not_going": 1, "total_adults": 2, "total_kids": 1})
    );

    let (_, overview, _) = send(&app, get(&format!("/api/admin/overview?{q}"))).await;
    assert_eq!(overview["rsvps"].as_array().unwrap().len(), 2);
    assert_eq!(overview["stats"], stats);

    let (status, cleared, _) = send(&app, post_json(&format!("/api/admin/clear?{q}"), &json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["success"], true);

    let (_, list, _) = send(&app, get(&format!("/api/admin/rsvps?{q}"))).await;
    assert_eq!(list["total"], 0);
}

#[tokio::test]
async fn test_credential_precedence_request_over_session_over_config() {
    let api = FakeGistApi::start().await;
    let app = gated_app(&api);
    let q = format!("access={ACCESS_SECRET}");

    // Deployment token
    send(&app, get(&format!("/api/admin/rsvps?{q}"))).await;
    // No gist yet, so nothing reached the remote
    assert!(api.tokens_seen().is_empty());
    send(&app, post_json(&format!("/api/rsvp?{q}"), &rsvp_body())).await;
    assert_eq!(api.tokens_seen().last().unwrap(), CONFIG_TOKEN);

    // Session token overrides the deployment token
    let request = Request::put(format!("/api/session/credential?{q}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"token": OTHER_TOKEN}).to_string()))
        .unwrap();
    let (status, _, cookie) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    let cookie = cookie.unwrap();

    let request = Request::get(format!("/api/admin/rsvps?{q}"))
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    send(&app, request).await;
    assert_eq!(api.tokens_seen().last().unwrap(), OTHER_TOKEN);

    // Request token overrides the session token
    let request = Request::get(format!("/api/admin/rsvps?{q}&token={BAD_TOKEN}"))
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(api.tokens_seen().last().unwrap(), BAD_TOKEN);

    // Forgetting the session token falls back to the deployment token
    let request = Request::delete(format!("/api/session/credential?{q}"))
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let (status, body, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stored"], false);

    let request = Request::get(format!("/api/admin/rsvps?{q}"))
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    send(&app, request).await;
    assert_eq!(api.tokens_seen().last().unwrap(), CONFIG_TOKEN);
}

#[tokio::test]
async fn test_session_credential_requires_token() {
    let api = FakeGistApi::start().await;
    let app = gated_app(&api);

    let request = Request::put(format!("/api/session/credential?access={ACCESS_SECRET}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"token": "   "}).to_string()))
        .unwrap();
    let (status, body, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["field"], "token");
}

#[tokio::test]
async fn test_request_id_is_returned() {
    let api = FakeGistApi::start().await;
    let response = gated_app(&api).oneshot(get("/health")).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
