use std::path::PathBuf;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wander_agents::GuideConfig;
use wander_api::{build_app, ApiSettings};

const API_KEY: &str = "test-key";
const GROTE_MARKT: (f64, f64) = (51.2213, 4.3997);

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/antwerp.json")
}

fn app_with(settings: ApiSettings) -> Router {
    build_app(&GuideConfig::offline(fixture_path()), settings).expect("app should build")
}

fn app() -> Router {
    app_with(ApiSettings {
        api_key: API_KEY.to_string(),
        ..ApiSettings::default()
    })
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn grote_markt() -> Value {
    json!({ "latitude": GROTE_MARKT.0, "longitude": GROTE_MARKT.1 })
}

#[tokio::test]
async fn health_is_public() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = read_json(response).await;
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["capabilities"]["geodata"], "fixture");
    assert_eq!(parsed["capabilities"]["reasoning"], "local_only");
}

#[tokio::test]
async fn poi_requires_api_key() {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/poi")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "location": grote_markt() }).to_string()))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn poi_returns_filtered_pois_sorted_by_distance() {
    let response = app()
        .oneshot(post("/v1/poi", json!({ "location": grote_markt() })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    let pois = parsed["pois"].as_array().expect("pois array");
    let ids = pois
        .iter()
        .map(|poi| poi["id"].as_str().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["node/1001", "way/2003", "way/2002", "node/1006"]);

    let distances = pois
        .iter()
        .map(|poi| poi["distance"].as_f64().unwrap())
        .collect::<Vec<_>>();
    assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(pois[3]["type"], "place_of_worship");
}

#[tokio::test]
async fn poi_rejects_invalid_location() {
    let response = app()
        .oneshot(post(
            "/v1/poi",
            json!({ "location": { "latitude": 95.0, "longitude": 4.4 } }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "invalid_location");
}

#[tokio::test]
async fn poi_rejects_radius_past_the_ceiling() {
    let app = app();

    for radius in [0, 5_001, 4_000_000] {
        let response = app
            .clone()
            .oneshot(post(
                "/v1/poi",
                json!({ "location": grote_markt(), "initial_radius": radius }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "radius {radius}");
        assert_eq!(read_json(response).await["error"], "invalid_radius");
    }

    let at_ceiling = app
        .oneshot(post(
            "/v1/poi",
            json!({ "location": grote_markt(), "initial_radius": 5_000 }),
        ))
        .await
        .unwrap();
    assert_eq!(at_ceiling.status(), StatusCode::OK);
}

#[tokio::test]
async fn story_rejects_empty_pois() {
    let response = app()
        .oneshot(post("/v1/story", json!({ "pois": [] })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn story_falls_back_to_template_without_reasoning() {
    let app = app();
    let discovered = read_json(
        app.clone()
            .oneshot(post("/v1/poi", json!({ "location": grote_markt() })))
            .await
            .unwrap(),
    )
    .await;

    let response = app
        .oneshot(post(
            "/v1/story",
            json!({ "pois": discovered["pois"], "messages": [] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let story = read_json(response).await;
    let selected = story["selectedPOIs"].as_array().expect("selected");
    assert_eq!(selected.len(), 3);
    assert_eq!(story["nextDestination"], selected[0]);
    assert_eq!(story["nextDestination"]["name"], "Brabofontein");
    assert!(story["story"].as_str().unwrap().contains("Brabofontein"));
}

#[tokio::test]
async fn explore_without_nearby_places_has_no_story() {
    let response = app()
        .oneshot(post(
            "/v1/explore",
            json!({ "location": { "latitude": 48.8584, "longitude": 2.2945 } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    assert_eq!(parsed["pois"], json!([]));
    assert!(parsed["story"].is_null());
}

#[tokio::test]
async fn explore_discovers_and_narrates() {
    let response = app()
        .oneshot(post(
            "/v1/explore",
            json!({
                "location": grote_markt(),
                "messages": [{ "role": "user", "content": "Anything old around here?" }]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    assert_eq!(parsed["pois"].as_array().unwrap().len(), 4);
    assert_eq!(parsed["story"]["nextDestination"]["id"], "node/1001");
}

#[tokio::test]
async fn arrival_without_encyclopedia_still_answers() {
    let poi = json!({
        "id": "way/2002",
        "name": "Het Steen",
        "type": "attraction",
        "latitude": 51.22275,
        "longitude": 4.39738,
        "distance": 228.0
    });

    let response = app()
        .oneshot(post("/v1/arrival", json!({ "poi": poi })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let report = read_json(response).await;
    assert_eq!(report["source"], "unavailable");
    assert!(report["message"]
        .as_str()
        .unwrap()
        .starts_with("You've arrived at Het Steen!"));
}

#[tokio::test]
async fn arrival_rejects_invalid_coordinates() {
    let poi = json!({
        "id": "way/2002",
        "name": "Het Steen",
        "type": "attraction",
        "latitude": 51.22275,
        "longitude": 200.0
    });

    let response = app()
        .oneshot(post("/v1/arrival", json!({ "poi": poi })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rate_limit_applies_per_client() {
    let app = app_with(ApiSettings {
        api_key: API_KEY.to_string(),
        rate_limit_window: Duration::from_secs(60),
        rate_limit_max: 1,
    });

    let first = app
        .clone()
        .oneshot(post("/v1/story", json!({ "pois": [] })))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::BAD_REQUEST);

    let second = app
        .clone()
        .oneshot(post("/v1/story", json!({ "pois": [] })))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().contains_key("retry-after"));

    let health = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}
