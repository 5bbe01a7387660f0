//! HTTP Request Handlers
//!
//! This module contains all HTTP request handlers organized by domain.

pub mod entries;
pub mod health;
pub mod prizes;
pub mod race;
pub mod snapshot;

use axum::Router;

use crate::state::AppState;

/// Create all API routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(race::view_routes())
        .nest("/race", race::routes())
        .nest("/entries", entries::routes())
        .nest("/bibs", entries::bib_routes())
        .nest("/prizes", prizes::routes())
        .nest("/snapshot", snapshot::routes())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use chrono::{TimeDelta, TimeZone, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{config::Config, create_router, race::Race, state::AppState, utils::ManualClock};

    fn app() -> (Router, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 4, 8, 0, 0).unwrap());
        let race = Race::new(Arc::new(clock.clone()));
        let mut config = Config::default();
        config.server.handler_limit = 4;
        (create_router(AppState::new(race, config)), clock)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    fn entry(bib: u32, first: &str, gender: &str, age: u32) -> Value {
        json!({
            "bib": bib,
            "first_name": first,
            "last_name": "Runner",
            "gender": gender,
            "age": age,
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let (status, body) = send(&app, Method::GET, "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["started"], false);
    }

    #[tokio::test]
    async fn test_race_day_flow() {
        let (app, clock) = app();

        let prizes = r#"
            {"Title":"Men's Overall","LowAge":0,"HighAge":200,"Gender":"M","Amount":1,"WinAgain":false}
            {"Title":"Women's Overall","LowAge":0,"HighAge":200,"Gender":"F","Amount":1,"WinAgain":false}
        "#;
        let request = Request::builder()
            .method(Method::PUT)
            .uri("/api/v1/prizes")
            .body(Body::from(prizes))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (status, body) = send(&app, Method::POST, "/api/v1/entries", Some(entry(1, "A", "M", 15))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["state"], "unlinked");
        let (status, _) = send(&app, Method::POST, "/api/v1/entries", Some(entry(2, "B", "F", 25))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = send(&app, Method::POST, "/api/v1/bibs/1/time", None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(&app, Method::POST, "/api/v1/race/start", Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["started_at"], "2024-05-04T08:00:00Z");

        clock.advance(TimeDelta::seconds(1));
        let (status, body) = send(&app, Method::POST, "/api/v1/bibs/2/time?scanned=true", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "confirmed");
        assert_eq!(body["duration"], "00:00:01.00");

        clock.advance(TimeDelta::seconds(1));
        let (_, body) = send(&app, Method::POST, "/api/v1/bibs/1/time", None).await;
        assert_eq!(body["state"], "linked");
        let (_, body) = send(&app, Method::POST, "/api/v1/bibs/1/time", None).await;
        assert_eq!(body["state"], "confirmed");

        let (status, body) = send(&app, Method::POST, "/api/v1/bibs/1/time", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "ALREADY_CONFIRMED");
        assert_eq!(body["error"]["kind"], "conflict");

        let (_, body) = send(&app, Method::GET, "/api/v1/entries", None).await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["entries"][0]["first_name"], "B");
        assert_eq!(body["entries"][0]["place"], 1);
        assert_eq!(body["entries"][1]["first_name"], "A");

        let (_, body) = send(&app, Method::GET, "/api/v1/prizes", None).await;
        assert_eq!(body["prizes"][0]["Title"], "Men's Overall");
        assert_eq!(body["prizes"][0]["winners"][0]["first_name"], "A");
        assert_eq!(body["prizes"][1]["winners"][0]["first_name"], "B");

        let (_, body) = send(&app, Method::GET, "/api/v1/audit", None).await;
        assert_eq!(body["total"], 4);

        let (_, body) = send(&app, Method::GET, "/api/v1/results/recent", None).await;
        assert_eq!(body["results"].as_array().map(Vec::len), Some(2));

        let (_, body) = send(&app, Method::GET, "/api/v1/race", None).await;
        assert_eq!(body["clock"], "00:00:02");
        assert_eq!(body["confirmed"], 2);
    }

    #[tokio::test]
    async fn test_remove_time_over_http() {
        let (app, clock) = app();
        send(&app, Method::POST, "/api/v1/entries", Some(entry(7, "C", "F", 40))).await;
        send(&app, Method::POST, "/api/v1/race/start", Some(json!({}))).await;

        let (status, body) = send(&app, Method::DELETE, "/api/v1/bibs/7/time", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "NOTHING_TO_REMOVE");

        clock.advance(TimeDelta::seconds(30));
        send(&app, Method::POST, "/api/v1/bibs/7/time", None).await;
        let (status, body) = send(&app, Method::DELETE, "/api/v1/bibs/7/time", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "unlinked");

        let (status, body) = send(&app, Method::DELETE, "/api/v1/bibs/99/time", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "BIB_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_edit_entry_with_stale_fingerprint() {
        let (app, clock) = app();
        let (_, created) = send(&app, Method::POST, "/api/v1/entries", Some(entry(3, "D", "M", 33))).await;
        let fingerprint = created["fingerprint"].as_str().unwrap().to_string();

        send(&app, Method::POST, "/api/v1/race/start", Some(json!({}))).await;
        clock.advance(TimeDelta::seconds(12));
        send(&app, Method::POST, "/api/v1/bibs/3/time", None).await;

        let mut edit = entry(3, "Dee", "M", 33);
        edit["fingerprint"] = json!(fingerprint);
        let (status, body) = send(&app, Method::PUT, "/api/v1/entries/1", Some(edit.clone())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "STALE_EDIT");

        let (_, listed) = send(&app, Method::GET, "/api/v1/entries", None).await;
        assert_eq!(listed["entries"][0]["first_name"], "D");

        edit["fingerprint"] = listed["entries"][0]["fingerprint"].clone();
        edit["duration"] = json!("00:00:12.00");
        let (status, body) = send(&app, Method::PUT, "/api/v1/entries/1", Some(edit)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["first_name"], "Dee");
        assert_eq!(body["state"], "linked");
    }

    #[tokio::test]
    async fn test_entry_validation() {
        let (app, _) = app();
        let (status, body) = send(&app, Method::POST, "/api/v1/entries", Some(entry(1, "", "M", 30))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let mut bad_duration = entry(1, "E", "M", 30);
        bad_duration["duration"] = json!("1:2");
        let (status, body) = send(&app, Method::POST, "/api/v1/entries", Some(bad_duration)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "FORMAT_ERROR");

        let mut oversized = entry(1, "E", "M", 30);
        oversized["duration"] = json!("99999999999999999:00:00.00");
        let (status, body) = send(&app, Method::POST, "/api/v1/entries", Some(oversized)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "FORMAT_ERROR");
    }

    #[tokio::test]
    async fn test_age_out_of_range() {
        let (app, _) = app();
        for age in [json!(-1), json!(151)] {
            let mut body = entry(1, "F", "F", 30);
            body["age"] = age;
            let (status, body) = send(&app, Method::POST, "/api/v1/entries", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
            assert_eq!(body["error"]["kind"], "validation");
        }

        let (_, listed) = send(&app, Method::GET, "/api/v1/entries", None).await;
        assert_eq!(listed["total"], 0);
    }

    #[tokio::test]
    async fn test_schema_and_snapshot() {
        let (app, _) = app();
        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/v1/race/schema",
            Some(json!({"optional_fields": ["Club"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["optional_fields"], json!(["Club"]));

        let rows = json!({"rows": [
            ["Fname", "Lname", "Gender", "Club"],
            ["Ada", "Lovelace", "F", "Harriers"]
        ]});
        let (status, body) = send(&app, Method::POST, "/api/v1/snapshot", Some(rows)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "MISSING_COLUMNS");

        let rows = json!({"rows": [
            ["Fname", "Lname", "Age", "Gender", "Bib", "Club"],
            ["Ada", "Lovelace", "36", "F", "1", "Harriers"]
        ]});
        let (status, body) = send(&app, Method::POST, "/api/v1/snapshot", Some(rows)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["imported"], 1);

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/v1/race/schema",
            Some(json!({"optional_fields": ["Email"]})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "SCHEMA_LOCKED");

        let (_, body) = send(&app, Method::GET, "/api/v1/snapshot", None).await;
        assert_eq!(body["rows"][0][9], "Club");
        assert_eq!(body["rows"][1][0], "Ada");
        assert_eq!(body["rows"][1][9], "Harriers");
    }

    #[tokio::test]
    async fn test_invalid_prize_upload() {
        let (app, _) = app();
        let request = Request::builder()
            .method(Method::PUT)
            .uri("/api/v1/prizes")
            .body(Body::from(r#"[{"Title":"Backwards","LowAge":50,"HighAge":40,"Amount":1}]"#))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
