use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use futures::StreamExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use swipely_datastore::MemoryStore;

use crate::models::tests::profile;
use crate::models::{Gender, MatchRecord, Profile};
use crate::store::DataStore;
use crate::test_support::{state_with, synced_state, token};
use crate::router;

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = bearer {
        req = req.header("Authorization", format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => req
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

struct Fixture {
    app: Router,
    profiles: Arc<MemoryStore<Profile>>,
    matches: Arc<MemoryStore<MatchRecord>>,
    ann: Profile,
    bob: Profile,
}

fn fixture() -> Fixture {
    let ann = profile("ann", Gender::Female, Gender::Male);
    let bob = profile("bob", Gender::Male, Gender::Female);
    let profiles = Arc::new(MemoryStore::with_records(vec![ann.clone(), bob.clone()]));
    let matches = Arc::new(MemoryStore::<MatchRecord>::new());
    let store = DataStore::new(profiles.clone(), matches.clone());

    Fixture {
        app: router(synced_state(store)),
        profiles,
        matches,
        ann,
        bob,
    }
}

#[tokio::test]
async fn health_reports_checks() {
    let f = fixture();
    let (status, body) = call(&f.app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn requests_need_a_session() {
    let f = fixture();
    let (status, body) = call(&f.app, Method::GET, "/deck", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "E0004");
}

#[tokio::test]
async fn deck_waits_for_profile_sync() {
    let app = router(state_with(DataStore::memory()));
    let (status, body) = call(&app, Method::GET, "/deck", Some(&token("sub-ann")), None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "E0007");
}

#[tokio::test]
async fn fling_then_button_makes_a_match() {
    let f = fixture();
    let ann = token(&f.ann.sub);
    let bob = token(&f.bob.sub);

    let (status, body) = call(&f.app, Method::GET, "/deck", Some(&ann), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deck"]["current"]["id"], f.bob.id.to_string());

    call(&f.app, Method::POST, "/deck/drag/start", Some(&ann), None).await;
    let drag = json!({ "translation_x": 140.0 });
    call(&f.app, Method::POST, "/deck/drag", Some(&ann), Some(drag)).await;
    let release = json!({ "velocity_x": 1300.0 });
    let (_, body) = call(&f.app, Method::POST, "/deck/release", Some(&ann), Some(release)).await;
    assert_eq!(body["data"]["deck"]["phase"]["flung"], "right");

    let (status, body) = call(&f.app, Method::POST, "/deck/settle", Some(&ann), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["swipe"]["result"]["outcome"], "pending");
    assert_eq!(body["data"]["deck"]["index"], 1);
    assert_eq!(body["data"]["deck"]["message"], "no more users");
    assert_eq!(f.matches.len(), 1);

    // Bob likes Ann back with the button
    let (_, body) = call(&f.app, Method::GET, "/deck", Some(&bob), None).await;
    assert_eq!(body["data"]["deck"]["current"]["id"], f.ann.id.to_string());
    let (status, body) = call(&f.app, Method::POST, "/swipes/right", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["result"]["outcome"], "matched");
    assert_eq!(f.matches.len(), 1);

    let (_, body) = call(&f.app, Method::GET, "/matches", Some(&ann), None).await;
    let cards = body["data"].as_array().unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0]["name"], "bob");

    // Matched profiles leave the deck on reload
    let (_, body) = call(&f.app, Method::POST, "/deck/reload", Some(&bob), None).await;
    assert!(body["data"]["deck"]["current"].is_null());
}

#[tokio::test]
async fn slow_release_keeps_the_card() {
    let f = fixture();
    let ann = token(&f.ann.sub);

    call(&f.app, Method::GET, "/deck", Some(&ann), None).await;
    call(&f.app, Method::POST, "/deck/drag/start", Some(&ann), None).await;
    let drag = json!({ "translation_x": 250.0 });
    call(&f.app, Method::POST, "/deck/drag", Some(&ann), Some(drag)).await;
    let release = json!({ "velocity_x": 300.0 });
    call(&f.app, Method::POST, "/deck/release", Some(&ann), Some(release)).await;

    let (_, body) = call(&f.app, Method::POST, "/deck/settle", Some(&ann), None).await;
    assert!(body["data"].get("swipe").is_none());
    assert_eq!(body["data"]["deck"]["index"], 0);
    assert_eq!(body["data"]["deck"]["offset"], 0.0);
    assert_eq!(f.matches.len(), 0);
}

#[tokio::test]
async fn incomplete_profile_is_rejected_without_writes() {
    let f = fixture();
    let ann = token(&f.ann.sub);

    let (status, body) = call(
        &f.app,
        Method::PUT,
        "/me",
        Some(&ann),
        Some(json!({ "name": "Ann", "bio": "", "gender": "FEMALE", "looking_for": "MALE" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "E2003");
    assert_eq!(body["error"]["details"]["fields"], json!(["bio"]));
    assert_eq!(f.profiles.writes(), 0);

    let (status, body) = call(
        &f.app,
        Method::PUT,
        "/me",
        Some(&ann),
        Some(json!({ "name": "Ann", "bio": "hello", "gender": "female", "looking_for": "male" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["record"]["image"], f.ann.image);
    assert_eq!(f.profiles.writes(), 1);
}

#[tokio::test]
async fn media_library_without_permission() {
    let f = fixture();
    let (status, body) = call(
        &f.app,
        Method::POST,
        "/me/image/library",
        Some(&token(&f.ann.sub)),
        Some(json!({ "file_name": "beach.jpg" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "E2005");
}

#[tokio::test]
async fn sign_out_ends_one_session_and_keeps_records() {
    let f = fixture();
    let ann = token(&f.ann.sub);
    let bob = token(&f.bob.sub);

    call(&f.app, Method::GET, "/deck", Some(&ann), None).await;
    call(&f.app, Method::POST, "/swipes/right", Some(&ann), None).await;
    assert_eq!(f.matches.len(), 1);

    let (status, _) = call(&f.app, Method::POST, "/sign-out", Some(&ann), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!((f.profiles.clears(), f.matches.clears()), (1, 1));
    assert_eq!(f.profiles.len(), 2);
    assert_eq!(f.matches.len(), 1);

    let (status, body) = call(&f.app, Method::GET, "/me", Some(&ann), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "E1003");

    let (status, body) = call(&f.app, Method::GET, "/me", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_new"], false);
    assert_eq!(body["data"]["profile_id"], f.bob.id.to_string());
}

#[tokio::test]
async fn new_profile_refreshes_an_empty_deck() {
    let f = fixture();
    let zoe = token("sub-zoe");

    let (_, body) = call(&f.app, Method::GET, "/deck", Some(&zoe), None).await;
    assert!(body["data"]["deck"]["current"].is_null());
    assert_eq!(body["data"]["deck"]["message"], "no more users");

    let (status, _) = call(
        &f.app,
        Method::PUT,
        "/me",
        Some(&zoe),
        Some(json!({ "name": "Zoe", "bio": "hi", "gender": "FEMALE", "looking_for": "MALE" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(&f.app, Method::GET, "/deck", Some(&zoe), None).await;
    assert_eq!(body["data"]["deck"]["current"]["id"], f.bob.id.to_string());
}

#[tokio::test]
async fn live_stream_announces_a_confirmed_match() {
    let f = fixture();
    let ann = token(&f.ann.sub);
    let bob = token(&f.bob.sub);

    call(&f.app, Method::GET, "/deck", Some(&ann), None).await;
    call(&f.app, Method::POST, "/swipes/right", Some(&ann), None).await;

    let req = Request::builder()
        .uri("/matches/live")
        .header("Authorization", format!("Bearer {ann}"))
        .body(Body::empty())
        .unwrap();
    let resp = f.app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let mut frames = resp.into_body().into_data_stream();

    call(&f.app, Method::GET, "/deck", Some(&bob), None).await;
    let (_, body) = call(&f.app, Method::POST, "/swipes/right", Some(&bob), None).await;
    assert_eq!(body["data"]["result"]["outcome"], "matched");

    let mut text = String::new();
    while !text.contains("\n\n") {
        let chunk = tokio::time::timeout(std::time::Duration::from_secs(2), frames.next())
            .await
            .expect("no frame within 2s")
            .expect("stream ended")
            .unwrap();
        text.push_str(&String::from_utf8_lossy(&chunk));
    }

    assert!(text.contains("event: match"), "unexpected frame: {text}");
    let data = text
        .lines()
        .find_map(|l| l.strip_prefix("data: "))
        .expect("frame has no data line");
    let record: Value = serde_json::from_str(data).unwrap();
    assert_eq!(record["is_match"], true);
    assert_eq!(record["user1_id"], f.ann.id.to_string());
    assert_eq!(record["user2_id"], f.bob.id.to_string());
}
