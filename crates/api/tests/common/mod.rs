#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use invite_core::assets::AssetStore;
use invite_core::config_store::ConfigStore;
use invite_worker::{Dispatcher, MemoryQueue};
use tower::ServiceExt;

use invite_api::config::ServerConfig;
use invite_api::router::build_app_router;
use invite_api::state::AppState;

pub const TEST_API_KEY: &str = "test-key";

pub const CONFIG: &str = r##"{
    "city2phone": {"Kazan": "+78430000"},
    "city2email": {"Kazan": "kazan@example.com"},
    "city2vk": {"Kazan": "vk.com/kazan", "Perm": "vk.com/perm"},
    "presets": [
        {"name": "wedding", "template": "wedding.png", "texts": [
            {"type": "date", "x": 10, "y": 10, "font": "a.ttf", "size": 20, "color": "#000"},
            {"type": "time", "x": 10, "y": 40, "font": "a.ttf", "size": 20, "color": "#000"},
            {"type": "address", "x": 10, "y": 70, "font": "a.ttf", "size": 20, "color": "#000"}
        ]}
    ],
    "theme": "dark"
}"##;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(dir: &std::path::Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        api_key: TEST_API_KEY.to_string(),
        config_ui_path: dir.join("config-ui").join("index.html"),
    }
}

/// The app plus handles on everything behind it.
pub struct TestApp {
    pub dir: tempfile::TempDir,
    pub router: Router,
    pub store: Arc<ConfigStore>,
    pub queue: Arc<MemoryQueue>,
}

/// Build the full application router over a temp storage folder and an
/// in-memory queue with no workers attached.
pub fn build_test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    std::fs::write(&config_path, CONFIG).unwrap();

    let config = test_config(dir.path());
    let store = Arc::new(ConfigStore::new(config_path));
    let queue = Arc::new(MemoryQueue::new());

    let state = AppState {
        config: Arc::new(config.clone()),
        store: Arc::clone(&store),
        fonts: AssetStore::fonts(dir.path().join("fonts")),
        templates: AssetStore::templates(dir.path().join("templates")),
        dispatcher: Arc::new(Dispatcher::new(Arc::clone(&store), queue.clone())),
    };

    TestApp {
        router: build_app_router(state, &config),
        dir,
        store,
        queue,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Authenticated request with an optional JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("api-key", TEST_API_KEY);
        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.request(Method::GET, uri, None).await
    }

    /// Authenticated multipart upload of one `file` field.
    pub async fn upload(&self, uri: &str, filename: &str, bytes: &[u8]) -> Response<Body> {
        let boundary = "XTESTBOUNDARYX";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("api-key", TEST_API_KEY)
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}
