//! Tag and ingredient endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::spawn_app;
use serde_json::json;

#[tokio::test]
async fn labels_require_authentication() {
    let app = spawn_app().await;

    for uri in ["/recipe/tags", "/recipe/ingredients"] {
        let (status, _) = app.request(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn tags_are_listed_by_name_descending() {
    let app = spawn_app().await;
    let token = app.user_with_token("test@example.com").await;

    app.create_tag(&token, "Dessert").await;
    app.create_tag(&token, "Vegan").await;

    let (status, body) = app.get("/recipe/tags", &token).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Vegan", "Dessert"]);
}

#[tokio::test]
async fn labels_are_limited_to_owner() {
    let app = spawn_app().await;
    let token = app.user_with_token("test@example.com").await;
    let other = app.user_with_token("other@example.com").await;

    app.create_tag(&other, "Fruity").await;
    let tag_id = app.create_tag(&token, "Comfort Food").await;
    app.create_ingredient(&other, "Vinegar").await;
    app.create_ingredient(&token, "Salt").await;

    let (_, body) = app.get("/recipe/tags", &token).await;
    assert_eq!(body["data"], json!([{"id": tag_id, "name": "Comfort Food"}]));

    let (_, body) = app.get("/recipe/ingredients", &token).await;
    let ingredients = body["data"].as_array().unwrap();
    assert_eq!(ingredients.len(), 1);
    assert_eq!(ingredients[0]["name"], "Salt");
}

#[tokio::test]
async fn create_label_success_and_blank_name_rejected() {
    let app = spawn_app().await;
    let token = app.user_with_token("test@example.com").await;

    let (status, body) = app
        .post("/recipe/ingredients", &token, json!({"name": "Cabbage"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "Cabbage");

    for uri in ["/recipe/tags", "/recipe/ingredients"] {
        let (status, _) = app.post(uri, &token, json!({"name": ""})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");

        let (status, _) = app.post(uri, &token, json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");

        let (status, _) = app
            .post(uri, &token, json!({"name": "x".repeat(256)}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn assigned_only_returns_linked_labels_once() {
    let app = spawn_app().await;
    let token = app.user_with_token("test@example.com").await;

    let breakfast = app.create_tag(&token, "Breakfast").await;
    app.create_tag(&token, "Lunch").await;
    let eggs = app.create_ingredient(&token, "Eggs").await;
    app.create_ingredient(&token, "Cheese").await;

    app.create_recipe(
        &token,
        json!({"title": "Pancakes", "tags": [breakfast], "ingredients": [eggs]}),
    )
    .await;
    app.create_recipe(
        &token,
        json!({"title": "Omelette", "tags": [breakfast], "ingredients": [eggs]}),
    )
    .await;

    let (status, body) = app.get("/recipe/tags?assigned_only=1", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([{"id": breakfast, "name": "Breakfast"}]));

    let (_, body) = app.get("/recipe/ingredients?assigned_only=1", &token).await;
    assert_eq!(body["data"], json!([{"id": eggs, "name": "Eggs"}]));

    let (_, body) = app.get("/recipe/tags?assigned_only=0", &token).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, _) = app.get("/recipe/tags?assigned_only=maybe", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .get("/recipe/tags?assigned_only=1&assigned_only=0", &token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
