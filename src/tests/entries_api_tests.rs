use axum::http::StatusCode;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::tests::{authed_delete, authed_get, authed_json, body_json, test_app, test_state};

async fn create_entry(app: &axum::Router, date: &str, content: &str, extra: Value) -> String {
    let mut body = json!({ "date": date, "content": content });
    if let (Some(obj), Some(extra_obj)) = (body.as_object_mut(), extra.as_object()) {
        for (k, v) in extra_obj {
            obj.insert(k.clone(), v.clone());
        }
    }
    let response = app.clone().oneshot(authed_json("POST", "/entries", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn add_entry_requires_content_and_date() {
    let state = test_state().await;
    let app = test_app(&state);

    for body in [json!({ "date": "2024-01-01" }), json!({ "content": "hello" }), json!({ "date": "", "content": "hello" }), json!({ "date": "2024-01-01", "content": "" })] {
        let response = app.clone().oneshot(authed_json("POST", "/entries", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json.get("error").is_some());
    }
}

#[tokio::test]
async fn add_entry_returns_id_and_defaults() {
    let state = test_state().await;
    let app = test_app(&state);

    let id = create_entry(&app, "2024-01-01", "hello", json!({})).await;

    let response = app.clone().oneshot(authed_get(&format!("/entries/{}", id))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let entry = body_json(response).await;
    assert_eq!(entry["content"], "hello");
    assert_eq!(entry["date"], "2024-01-01");
    assert_eq!(entry["mood"], "");
    assert_eq!(entry["has_images"], false);
    assert_eq!(entry["has_voice"], false);
    assert_eq!(entry["tags"], json!([]));
    assert!(entry["created_at"].as_str().is_some());
    assert_eq!(entry["created_at"], entry["updated_at"]);
}

#[tokio::test]
async fn list_returns_newest_first() {
    let state = test_state().await;
    let app = test_app(&state);

    let first = create_entry(&app, "2024-01-01", "older", json!({})).await;
    let second = create_entry(&app, "2023-06-15", "newer", json!({})).await;

    let response = app.clone().oneshot(authed_get("/entries")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let entries = body_json(response).await;
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    // Ordered by creation time, not by the caller-supplied date string
    assert_eq!(entries[0]["id"], Value::String(second.clone()));
    assert_eq!(entries[1]["id"], Value::String(first.clone()));
    // Summary projection carries no timestamps
    assert!(entries[0].get("created_at").is_none());
}

#[tokio::test]
async fn get_entry_not_found() {
    let state = test_state().await;
    let app = test_app(&state);

    let response = app.clone().oneshot(authed_get("/entries/no-such-id")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_entry_is_partial() {
    let state = test_state().await;
    let app = test_app(&state);

    let id = create_entry(&app, "2024-01-01", "hello", json!({ "mood": "calm" })).await;

    let response = app
        .clone()
        .oneshot(authed_json("PUT", &format!("/entries/{}", id), json!({ "mood": "happy", "tags": ["a", "b"] })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(authed_get(&format!("/entries/{}", id))).await.unwrap();
    let entry = body_json(response).await;
    assert_eq!(entry["mood"], "happy");
    assert_eq!(entry["tags"], json!(["a", "b"]));
    // Untouched fields survive
    assert_eq!(entry["content"], "hello");
    assert_eq!(entry["date"], "2024-01-01");
    assert_ne!(entry["created_at"], entry["updated_at"]);
}

#[tokio::test]
async fn update_entry_allows_clearing_content() {
    // Creation requires non-empty content, update does not re-validate.
    let state = test_state().await;
    let app = test_app(&state);

    let id = create_entry(&app, "2024-01-01", "hello", json!({})).await;

    let response = app
        .clone()
        .oneshot(authed_json("PUT", &format!("/entries/{}", id), json!({ "content": "" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(authed_get(&format!("/entries/{}", id))).await.unwrap();
    let entry = body_json(response).await;
    assert_eq!(entry["content"], "");
}

#[tokio::test]
async fn update_entry_empty_body_rejected() {
    let state = test_state().await;
    let app = test_app(&state);

    let id = create_entry(&app, "2024-01-01", "hello", json!({})).await;

    let response = app
        .clone()
        .oneshot(authed_json("PUT", &format!("/entries/{}", id), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_entry_not_found() {
    let state = test_state().await;
    let app = test_app(&state);

    let response = app
        .clone()
        .oneshot(authed_json("PUT", "/entries/missing", json!({ "mood": "happy" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_entry_lifecycle() {
    let state = test_state().await;
    let app = test_app(&state);

    let id = create_entry(&app, "2024-01-01", "hello", json!({})).await;

    let response = app.clone().oneshot(authed_delete(&format!("/entries/{}", id))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(authed_get(&format!("/entries/{}", id))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.clone().oneshot(authed_delete(&format!("/entries/{}", id))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

async fn seed_search_entries(app: &axum::Router) -> (String, String, String) {
    let a = create_entry(
        app,
        "2024-01-05",
        "Walked along the beach",
        json!({ "mood": "happy", "tags": ["travel", "sea"], "location": "Lisbon" }),
    )
    .await;
    let b = create_entry(
        app,
        "2024-02-10",
        "Rainy day at home",
        json!({ "mood": "melancholic", "tags": ["home"], "location": "Berlin" }),
    )
    .await;
    let c = create_entry(
        app,
        "2024-03-01",
        "Finished the big project",
        json!({ "mood": "happy", "tags": ["work"] }),
    )
    .await;
    (a, b, c)
}

fn ids_of(entries: &Value) -> Vec<String> {
    entries
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn search_without_filters_matches_list() {
    let state = test_state().await;
    let app = test_app(&state);
    seed_search_entries(&app).await;

    let list = body_json(app.clone().oneshot(authed_get("/entries")).await.unwrap()).await;
    let search = body_json(app.clone().oneshot(authed_get("/entries/search")).await.unwrap()).await;
    assert_eq!(list, search);
}

#[tokio::test]
async fn search_by_text_matches_content_and_location() {
    let state = test_state().await;
    let app = test_app(&state);
    let (a, b, _) = seed_search_entries(&app).await;

    // Case-insensitive substring against content
    let result =
        body_json(app.clone().oneshot(authed_get("/entries/search?q=BEACH")).await.unwrap()).await;
    assert_eq!(ids_of(&result), vec![a.clone()]);

    // ... or against location
    let result =
        body_json(app.clone().oneshot(authed_get("/entries/search?q=berlin")).await.unwrap()).await;
    assert_eq!(ids_of(&result), vec![b.clone()]);
}

#[tokio::test]
async fn search_by_mood_is_exact() {
    let state = test_state().await;
    let app = test_app(&state);
    let (a, _, c) = seed_search_entries(&app).await;

    let result =
        body_json(app.clone().oneshot(authed_get("/entries/search?mood=happy")).await.unwrap()).await;
    // Newest first, same order as list
    assert_eq!(ids_of(&result), vec![c, a]);

    let result =
        body_json(app.clone().oneshot(authed_get("/entries/search?mood=happ")).await.unwrap()).await;
    assert!(result.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn search_by_tags_matches_any_given_tag() {
    let state = test_state().await;
    let app = test_app(&state);
    let (a, b, _) = seed_search_entries(&app).await;

    let result = body_json(
        app.clone().oneshot(authed_get("/entries/search?tags=sea&tags=home")).await.unwrap(),
    )
    .await;
    assert_eq!(ids_of(&result), vec![b, a]);
}

#[tokio::test]
async fn search_by_date_range_is_inclusive() {
    let state = test_state().await;
    let app = test_app(&state);
    let (a, b, _) = seed_search_entries(&app).await;

    let result = body_json(
        app.clone()
            .oneshot(authed_get("/entries/search?start_date=2024-01-05&end_date=2024-02-10"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(ids_of(&result), vec![b, a]);
}

#[tokio::test]
async fn search_filters_are_anded() {
    let state = test_state().await;
    let app = test_app(&state);
    let (a, _, _) = seed_search_entries(&app).await;

    let result = body_json(
        app.clone()
            .oneshot(authed_get("/entries/search?mood=happy&tags=travel&q=beach"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(ids_of(&result), vec![a]);
}

#[tokio::test]
async fn tags_endpoint_returns_sorted_distinct_tags() {
    let state = test_state().await;
    let app = test_app(&state);

    create_entry(&app, "2024-01-01", "one", json!({ "tags": ["zeta", "alpha"] })).await;
    create_entry(&app, "2024-01-02", "two", json!({ "tags": ["alpha", "mid"] })).await;

    let response = app.clone().oneshot(authed_get("/tags")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let tags = body_json(response).await;
    assert_eq!(tags, json!(["alpha", "mid", "zeta"]));
}
