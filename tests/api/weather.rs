use reqwest::StatusCode;

use serde_json::json;

use sqlx::PgPool;

use wiremock::matchers::*;
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{current_weather_body, TestApp};

#[sqlx::test(migrations = "./migrations")]
async fn weather_returns_current_conditions(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;

    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .and(query_param("key", "TestKey"))
        .and(query_param("q", "Kyiv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_weather_body(
            12.5,
            81,
            "Light rain",
        )))
        .expect(1)
        .mount(&app.weather_server)
        .await;

    let res = app.weather(Some("Kyiv")).await.expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(
        json!({ "temperature": 12.5, "humidity": 81, "description": "Light rain" }),
        body
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn weather_rejects_missing_or_invalid_city(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.weather_server)
        .await;

    for city in [None, Some(""), Some("Київ"), Some("Kyiv1")] {
        let res = app.weather(city).await.unwrap();

        assert_eq!(StatusCode::BAD_REQUEST, res.status(), "city: {:?}", city);
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn weather_for_unknown_city_is_not_found(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;

    Mock::given(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 1006, "message": "No matching location found." }
        })))
        .expect(1)
        .mount(&app.weather_server)
        .await;

    let res = app.weather(Some("Atlantis")).await.unwrap();

    assert_eq!(StatusCode::NOT_FOUND, res.status());
}

#[sqlx::test(migrations = "./migrations")]
async fn weather_upstream_failure_is_unavailable(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;

    Mock::given(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.weather_server)
        .await;

    let res = app.weather(Some("Kyiv")).await.unwrap();

    assert_eq!(StatusCode::SERVICE_UNAVAILABLE, res.status());
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!("Weather service unavailable", body["error"]);
}
