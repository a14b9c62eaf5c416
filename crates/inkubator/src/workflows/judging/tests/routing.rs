use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::judging::judging_router;

fn json_request(method: &str, uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn criteria_validation_reports_weight_sum() {
    let fixture = fixture();
    let category = fixture.category(&[("K1", 40), ("K2", 30), ("K3", 20)]);
    let router = judging_router(Arc::new(fixture.judging));

    let response = router
        .oneshot(
            Request::get(format!(
                "/api/v1/categories/{}/criteria/validation",
                category.id
            ))
            .body(Body::empty())
            .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["valid"], false);
    assert_eq!(payload["total_weight"], 90);
}

#[tokio::test]
async fn out_of_range_weight_is_unprocessable() {
    let fixture = fixture();
    let category = fixture.category(&[("K1", 100)]);
    let router = judging_router(Arc::new(fixture.judging));

    let response = router
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/categories/{}/criteria", category.id),
            json!({ "criteria": [{ "id": "K1", "name": "Inovasi", "weight": 0 }] }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "VALIDATION");
}

#[tokio::test]
async fn scoring_ranking_and_winner_over_http() {
    let fixture = fixture();
    let business = fixture.approved_business("Usaha Q");
    let category = fixture.category(&[("K1", 60), ("K2", 40)]);
    fixture.start_event();
    let router = judging_router(Arc::new(fixture.judging));

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/categories/{}/scores", category.id),
            json!({
                "evaluator_id": "dosen-juri",
                "scores": [
                    { "business_id": business.id, "criterion_id": "K1", "nilai": 80 },
                    { "business_id": business.id, "criterion_id": "K2", "nilai": 50 },
                    { "business_id": business.id, "criterion_id": "K2", "nilai": 101 }
                ]
            }),
        ))
        .await
        .expect("scores submitted");
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = read_json_body(response).await;
    assert_eq!(outcome["accepted"], 2);
    assert_eq!(outcome["rejected"][0]["code"], "OUT_OF_RANGE");

    let response = router
        .clone()
        .oneshot(
            Request::get(format!("/api/v1/categories/{}/ranking", category.id))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("ranking");
    let ranking = read_json_body(response).await;
    assert_eq!(ranking["entries"][0]["total_score"], 68.0);
    assert_eq!(ranking["entries"][0]["rank"], 1);

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/categories/{}/winner", category.id),
            json!({ "business_id": business.id, "selected_by": "admin-1" }),
        ))
        .await
        .expect("winner set");
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = read_json_body(response).await;
    assert_eq!(outcome["change"]["change"], "selected");
    assert_eq!(outcome["category"]["winner"]["business_id"], json!(business.id));

    let response = router
        .oneshot(
            Request::delete(format!("/api/v1/categories/{}/winner", category.id))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("winner revoked");
    let category = read_json_body(response).await;
    assert_eq!(category["winner"], Value::Null);
}

#[tokio::test]
async fn score_sheet_import_counts_rows() {
    let fixture = fixture();
    let first = fixture.approved_business("Usaha R");
    let second = fixture.approved_business("Usaha S");
    let category = fixture.category(&[("K1", 100)]);
    fixture.start_event();
    let router = judging_router(Arc::new(fixture.judging));

    let csv = format!(
        "business_id,criterion_id,nilai\n{},K1,90\n{},K1,\n{},K2,70\n",
        first.id, second.id, second.id
    );
    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/categories/{}/score-sheet", category.id),
            json!({ "evaluator_id": "dosen-juri", "csv": csv }),
        ))
        .await
        .expect("sheet imported");
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = read_json_body(response).await;
    assert_eq!(outcome["accepted"], 1);
    assert_eq!(outcome["rejected"][0]["code"], "UNKNOWN_CRITERION");

    let response = router
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/categories/{}/score-sheet", category.id),
            json!({
                "evaluator_id": "dosen-juri",
                "csv": "business_id,criterion_id,nilai\nx,K1,abc\n",
            }),
        ))
        .await
        .expect("bad sheet");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn locked_category_returns_423() {
    let fixture = fixture();
    let business = fixture.approved_business("Usaha T");
    let category = fixture.category(&[("K1", 100)]);
    fixture.start_event();
    fixture.lock_event(true);
    let router = judging_router(Arc::new(fixture.judging));

    let response = router
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/categories/{}/winner", category.id),
            json!({ "business_id": business.id, "selected_by": "admin-1" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::LOCKED);
}

#[tokio::test]
async fn winner_before_the_event_runs_reports_the_current_event() {
    let fixture = fixture();
    let business = fixture.approved_business("Usaha W");
    let category = fixture.category(&[("K1", 100)]);
    let event_id = fixture.event.id.clone();
    let router = judging_router(Arc::new(fixture.judging));

    let response = router
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/categories/{}/winner", category.id),
            json!({ "business_id": business.id, "selected_by": "admin-1" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "INVALID_TRANSITION");
    assert_eq!(payload["current"]["id"], event_id.0.as_str());
    assert_eq!(payload["current"]["status"], "TERBUKA");
}
