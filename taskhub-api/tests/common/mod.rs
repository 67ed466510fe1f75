/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup and cleanup
/// - App construction with a disabled mailer
/// - User registration and request helpers
///
/// Tests run against a real PostgreSQL instance named by `DATABASE_URL`.
/// When the variable is absent every test returns early after printing a
/// notice, so the suite still passes on machines without a database.
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use sqlx::PgPool;
use taskhub_api::app::{build_router, AppState};
use taskhub_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use taskhub_shared::{email::Mailer, models::user::User};
use tower::Service as _;
use uuid::Uuid;

/// Signing secret for test tokens, never used outside the suite
pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Default password for registered test users
pub const TEST_PASSWORD: &str = "horse-battery-7";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    user_ids: Vec<Uuid>,
}

impl TestContext {
    /// Creates a new test context, or `None` when no database is configured
    pub async fn new() -> Option<Self> {
        dotenvy::dotenv().ok();
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping integration test");
            return None;
        };

        let db = PgPool::connect(&url).await.expect("connect to test db");
        sqlx::migrate!("../migrations")
            .run(&db)
            .await
            .expect("run migrations");

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: DatabaseConfig {
                url,
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: TEST_JWT_SECRET.to_string(),
            },
            email: None,
        };

        let state = AppState::new(db.clone(), config, Mailer::disabled());
        let app = build_router(state);

        Some(TestContext {
            db,
            app,
            user_ids: Vec::new(),
        })
    }

    /// Sends a request through the router and returns the raw response
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.app.clone().call(request).await.unwrap()
    }

    /// Registers a fresh user with a unique email, returning the response
    /// body (`{"user": ..., "token": ...}`) after recording the id for
    /// cleanup
    pub async fn register_user(&mut self, name: &str) -> serde_json::Value {
        let email = format!("test-{}@example.com", Uuid::new_v4());
        let response = self
            .request(
                "POST",
                "/users",
                None,
                Some(serde_json::json!({
                    "name": name,
                    "email": email,
                    "password": TEST_PASSWORD,
                })),
            )
            .await;
        assert_eq!(response.status(), axum::http::StatusCode::CREATED);

        let body = json_body(response).await;
        let id = Uuid::parse_str(body["user"]["id"].as_str().unwrap()).unwrap();
        self.user_ids.push(id);
        body
    }

    /// Removes every user this context registered, tasks included
    pub async fn cleanup(&self) {
        for id in &self.user_ids {
            User::delete_with_tasks(&self.db, *id)
                .await
                .expect("cleanup user");
        }
    }
}

/// Reads a response body as JSON
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Reads a response body as raw bytes
pub async fn raw_body(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

/// Builds a multipart/form-data body with a single `avatar` file field
///
/// Returns the content-type header value and the encoded body.
pub fn multipart_avatar(filename: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let boundary = "taskhub-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"avatar\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    (
        format!("multipart/form-data; boundary={}", boundary),
        body,
    )
}

/// Encodes a solid-color PNG of the given dimensions for upload tests
pub fn test_png(width: u32, height: u32) -> Vec<u8> {
    let image = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([120, 30, 200]),
    ));
    let mut buffer = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}
