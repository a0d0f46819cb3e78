mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{add_kettle, seed_catalog, spawn_app};

#[tokio::test]
async fn test_product_detail() {
    let app = spawn_app().await;
    let token = app.admin_token().await;
    let fixture = seed_catalog(&app, &token).await;
    let id = add_kettle(&app, &token, &fixture, "Kettle", 30.0, fixture.bosch_id, "red").await;

    let body = app.get_json(&format!("/api/product/{id}"), None).await;

    assert_eq!(body["product"]["name"], "Kettle");
    assert_eq!(body["product"]["price"], 30.0);
    assert_eq!(body["category"]["slug"], "kettles");
    assert_eq!(body["parent_category"]["slug"], "kitchen");
    assert_eq!(body["manufacturer"]["name"], "Bosch");
    assert_eq!(body["feedback_count"], 0);
    assert_eq!(body["quantity_in_cart"], 0);
    assert_eq!(body["images"], json!([]));
    assert_eq!(body["navigation"][0]["slug"], "kitchen");

    let colour = body["product_features"]
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["feature_id"] == fixture.colour_id)
        .unwrap();
    assert_eq!(colour["name"], "Colour");
    assert_eq!(colour["type_feature"], "select");
    assert_eq!(colour["value"], "red");
}

#[tokio::test]
async fn test_product_detail_not_found() {
    let app = spawn_app().await;

    let response = app.get("/api/product/999", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_detail_with_unreachable_cache() {
    // the view counter fails against a closed port but the page still renders
    let app = spawn_app().await;
    let token = app.admin_token().await;
    let fixture = seed_catalog(&app, &token).await;
    let id = add_kettle(&app, &token, &fixture, "Kettle", 30.0, fixture.bosch_id, "red").await;

    let response = app.get(&format!("/api/product/{id}"), None).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_product_detail_shows_cart_quantity() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let fixture = seed_catalog(&app, &admin).await;
    let id = add_kettle(&app, &admin, &fixture, "Kettle", 30.0, fixture.bosch_id, "red").await;
    let user = app.user_token("buyer").await;

    let response = app
        .post("/api/cart", Some(&user), json!({ "product_id": id, "quantity": 2 }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = app
        .get_json(&format!("/api/product/{id}"), Some(&user))
        .await;
    assert_eq!(body["quantity_in_cart"], 2);
    assert_eq!(body["cart"]["total_quantity"], 2);
    assert_eq!(body["cart"]["total_price"], 60.0);

    // anonymous visitors see an empty cart
    let body = app.get_json(&format!("/api/product/{id}"), None).await;
    assert_eq!(body["quantity_in_cart"], 0);
}

#[tokio::test]
async fn test_post_feedback() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let fixture = seed_catalog(&app, &admin).await;
    let id = add_kettle(&app, &admin, &fixture, "Kettle", 30.0, fixture.bosch_id, "red").await;
    let user = app.user_token("reviewer").await;

    let response = app
        .post(
            &format!("/api/product/{id}/feedback"),
            Some(&user),
            json!({ "text": "  Boils fast  " }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["feedback_count"], 1);
    assert_eq!(body["feedbacks"][0]["text"], "Boils fast");
    assert_eq!(body["feedbacks"][0]["username"], "reviewer");

    let response = app
        .post(
            &format!("/api/product/{id}/feedback"),
            Some(&user),
            json!({ "text": "Still fine a month later" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = app.get_json(&format!("/api/product/{id}"), None).await;
    let texts: Vec<&str> = body["feedbacks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, ["Boils fast", "Still fine a month later"]);
}

#[tokio::test]
async fn test_post_feedback_validation() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let fixture = seed_catalog(&app, &admin).await;
    let id = add_kettle(&app, &admin, &fixture, "Kettle", 30.0, fixture.bosch_id, "red").await;
    let user = app.user_token("critic").await;

    let response = app
        .post(
            &format!("/api/product/{id}/feedback"),
            None,
            json!({ "text": "Anonymous" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .post(
            &format!("/api/product/{id}/feedback"),
            Some(&user),
            json!({ "text": "   " }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post(
            &format!("/api/product/{id}/feedback"),
            Some(&user),
            json!({ "text": "x".repeat(2001) }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post(
            "/api/product/999/feedback",
            Some(&user),
            json!({ "text": "Where is it?" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_feedback_length_ignores_padding() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let fixture = seed_catalog(&app, &admin).await;
    let id = add_kettle(&app, &admin, &fixture, "Kettle", 30.0, fixture.bosch_id, "red").await;
    let user = app.user_token("padder").await;

    let response = app
        .post(
            &format!("/api/product/{id}/feedback"),
            Some(&user),
            json!({ "text": format!("Great{}", " ".repeat(1996)) }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["feedbacks"][0]["text"], "Great");

    let response = app
        .post(
            &format!("/api/product/{id}/feedback"),
            Some(&user),
            json!({ "text": format!("  {}  ", "y".repeat(2000)) }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}
