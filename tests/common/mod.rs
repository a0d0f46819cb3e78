#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use sea_orm::{ConnectOptions, Database};
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};
use uuid::Uuid;

use store_catalog::{
    build_app,
    cache::{CacheError, PopularCache, RedisPopularCache},
    config::Config,
    entities::{seed_admin, setup_schema},
    state::AppState,
};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "Secret15-admin";
pub const USER_PASSWORD: &str = "Muzion15-user";

pub struct TestApp {
    pub base: String,
    pub client: Client,
    pub upload_dir: PathBuf,
}

/// Popular cache kept in process memory, keyed by host like the redis one.
pub struct MemoryCache {
    limit: usize,
    views: Mutex<HashMap<String, HashMap<String, u64>>>,
    lists: Mutex<HashMap<String, Vec<String>>>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::with_limit(8)
    }
}

impl MemoryCache {
    /// Keeps at most `limit` ids per host, as `POPULAR_LIMIT` does for redis.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            views: Mutex::default(),
            lists: Mutex::default(),
        }
    }

    pub fn set_list(&self, host: &str, ids: Vec<String>) {
        self.lists.lock().unwrap().insert(host.to_owned(), ids);
    }
}

#[async_trait]
impl PopularCache for MemoryCache {
    async fn popular_ids(&self, host: &str) -> Result<Vec<String>, CacheError> {
        Ok(self.lists.lock().unwrap().get(host).cloned().unwrap_or_default())
    }

    async fn record_view(&self, host: &str, product_id: &str) -> Result<(), CacheError> {
        let mut views = self.views.lock().unwrap();
        let counts = views.entry(host.to_owned()).or_default();
        *counts.entry(product_id.to_owned()).or_default() += 1;

        let mut ranked: Vec<(String, u64)> =
            counts.iter().map(|(id, n)| (id.clone(), *n)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
        let top = ranked
            .into_iter()
            .take(self.limit)
            .map(|(id, _)| id)
            .collect();
        self.set_list(host, top);
        Ok(())
    }
}

/// App whose popular cache points at a closed redis port.
pub async fn spawn_app() -> TestApp {
    let cache = RedisPopularCache::new("redis://127.0.0.1:1", 8, Duration::from_millis(200))
        .expect("Failed to build redis client");
    spawn_app_with_cache(Arc::new(cache)).await
}

/// Redis url of a listener that accepts connections and never answers.
pub async fn silent_redis() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind silent redis");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("redis://{}", addr)
}

pub async fn spawn_app_with_cache(cache: Arc<dyn PopularCache>) -> TestApp {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    setup_schema(&db).await.expect("Failed to create schema");
    seed_admin(&db, ADMIN_USERNAME, ADMIN_PASSWORD)
        .await
        .expect("Failed to seed admin");

    let upload_dir = std::env::temp_dir().join(format!("store-catalog-{}", Uuid::new_v4()));
    let config = Config {
        bind_addr: "127.0.0.1:0".into(),
        database_url: "sqlite::memory:".into(),
        redis_url: "redis://127.0.0.1:1".into(),
        redis_timeout_ms: 200,
        jwt_secret: "test-secret".into(),
        token_ttl_hours: 1,
        popular_limit: 8,
        catalog_page_size: 8,
        admin_page_size: 100,
        upload_dir: upload_dir.clone(),
        admin_username: ADMIN_USERNAME.into(),
        admin_password: Some(ADMIN_PASSWORD.into()),
    };

    let state = AppState::new(db, cache, config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        axum::serve(listener, build_app(state))
            .await
            .expect("Test server failed");
    });

    TestApp {
        base: format!("http://{}", addr),
        client: Client::new(),
        upload_dir,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .client
            .post(self.url("/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to send login request");
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.expect("Login body is not JSON");
        body["token"]
            .as_str()
            .expect("Token not found in login response")
            .to_owned()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_USERNAME, ADMIN_PASSWORD).await
    }

    /// Registers `username` and returns a token for it.
    pub async fn user_token(&self, username: &str) -> String {
        let response = self
            .client
            .post(self.url("/register"))
            .json(&json!({ "username": username, "password": USER_PASSWORD }))
            .send()
            .await
            .expect("Failed to send register request");
        assert_eq!(response.status(), StatusCode::CREATED);
        self.login(username, USER_PASSWORD).await
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Response {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        request.send().await.expect("Failed to send GET request")
    }

    pub async fn get_json(&self, path: &str, token: Option<&str>) -> Value {
        let response = self.get(path, token).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {path}");
        response.json().await.expect("Response is not JSON")
    }

    pub async fn send_json(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&str>,
        body: Value,
    ) -> Response {
        let mut request = self.client.request(method, self.url(path)).json(&body);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        request.send().await.expect("Failed to send request")
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> Response {
        self.send_json(reqwest::Method::POST, path, token, body).await
    }

    pub async fn patch(&self, path: &str, token: Option<&str>, body: Value) -> Response {
        self.send_json(reqwest::Method::PATCH, path, token, body).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Response {
        let mut request = self.client.delete(self.url(path));
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        request.send().await.expect("Failed to send DELETE request")
    }

    /// POST that must answer 201; returns the created id.
    pub async fn create(&self, path: &str, token: &str, body: Value) -> i64 {
        let response = self.post(path, Some(token), body).await;
        assert_eq!(response.status(), StatusCode::CREATED, "POST {path}");
        let body: Value = response.json().await.expect("Response is not JSON");
        body["id"].as_i64().expect("Created id missing")
    }
}

/// A small catalog: one root category with a kettles subcategory exposing a
/// `select` colour feature and a `text` power feature, plus two makers.
pub struct Fixture {
    pub root_id: i64,
    pub kettles_id: i64,
    pub colour_id: i64,
    pub power_id: i64,
    pub bosch_id: i64,
    pub tefal_id: i64,
}

pub async fn seed_catalog(app: &TestApp, token: &str) -> Fixture {
    let colour_id = app
        .create(
            "/api/admin/feature",
            token,
            json!({ "name": "Colour", "type_feature": "select" }),
        )
        .await;
    let power_id = app
        .create(
            "/api/admin/feature",
            token,
            json!({ "name": "Power", "type_feature": "text" }),
        )
        .await;
    let root_id = app
        .create(
            "/api/admin/category",
            token,
            json!({ "name": "Kitchen", "slug": "kitchen" }),
        )
        .await;
    let kettles_id = app
        .create(
            "/api/admin/category",
            token,
            json!({
                "name": "Kettles",
                "slug": "kettles",
                "parent_id": root_id,
                "feature_ids": [colour_id, power_id],
            }),
        )
        .await;
    let bosch_id = app
        .create("/api/admin/manufacturer", token, json!({ "name": "Bosch" }))
        .await;
    let tefal_id = app
        .create("/api/admin/manufacturer", token, json!({ "name": "Tefal" }))
        .await;

    Fixture {
        root_id,
        kettles_id,
        colour_id,
        power_id,
        bosch_id,
        tefal_id,
    }
}

/// Creates a kettle and sets its colour; returns the product id.
pub async fn add_kettle(
    app: &TestApp,
    token: &str,
    fixture: &Fixture,
    name: &str,
    price: f64,
    manufacturer_id: i64,
    colour: &str,
) -> i64 {
    let id = app
        .create(
            "/api/admin/product",
            token,
            json!({
                "name": name,
                "description": format!("{name} description"),
                "price": price,
                "count": 5,
                "category_id": fixture.kettles_id,
                "manufacturer_id": manufacturer_id,
            }),
        )
        .await;
    let response = app
        .patch(
            &format!("/api/admin/product/{id}"),
            Some(token),
            json!({ "features": [{ "feature_id": fixture.colour_id, "value": colour }] }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    id
}
