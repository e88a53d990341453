use wedding_invite::{
    api::router::create_router,
    state::AppState,
    config::{Config, RateLimit},
    infra::repositories::{
        sqlite_admin_repo::SqliteAdminRepo,
        sqlite_event_repo::SqliteEventRepo,
        sqlite_guest_repo::SqliteGuestRepo,
    },
    domain::models::admin::Admin,
    domain::ports::EmailService,
    domain::services::{auth_service::AuthService, mailer::load_templates},
    error::AppError,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, header},
    response::Response,
    Router,
};
use async_trait::async_trait;
use tower::ServiceExt;
use serde_json::Value;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

#[derive(Clone, Debug)]
pub struct SentMail {
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
}

/// Records every send. Recipients starting with `bounce` fail like a provider rejection.
#[derive(Default)]
pub struct MockEmailService {
    pub sent: Mutex<Vec<SentMail>>,
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError> {
        if recipient.starts_with("bounce") {
            return Err(AppError::InternalWithMsg("Email provider returned 422".into()));
        }
        self.sent.lock().unwrap().push(SentMail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        });
        Ok(())
    }
}

pub fn test_config(db_url: &str) -> Config {
    Config {
        database_url: db_url.to_string(),
        port: 0,
        jwt_secret: "integration-test-secret".to_string(),
        default_admin_email: None,
        default_admin_password: None,
        base_url: "https://wedding.test".to_string(),
        email_api_url: "http://localhost".to_string(),
        email_api_key: "test-key".to_string(),
        email_from: "Wedding <invite@wedding.test>".to_string(),
        invitation_video_url: Some("https://video.test/invite.mp4".to_string()),
        app_env: "test".to_string(),
        login_rate_limit: RateLimit { max_requests: 1000, window_secs: 60 },
        guest_rate_limit: RateLimit { max_requests: 1000, window_secs: 60 },
        trust_proxy_headers: false,
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub email: Arc<MockEmailService>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(customize: impl FnOnce(&mut Config)) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let mut config = test_config(&db_url);
        customize(&mut config);

        let email = Arc::new(MockEmailService::default());
        let state = Arc::new(AppState::new(
            config,
            Arc::new(SqliteAdminRepo::new(pool.clone())),
            Arc::new(SqliteEventRepo::new(pool.clone())),
            Arc::new(SqliteGuestRepo::new(pool.clone())),
            email.clone(),
            Arc::new(load_templates().unwrap()),
        ));

        let admin = Admin::new(ADMIN_EMAIL, AuthService::hash_password(ADMIN_PASSWORD).unwrap());
        state.admin_repo.create(&admin).await.unwrap();

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            email,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Logs in and returns the `admin_token` cookie value.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self.send(json_request("POST", "/api/v1/admin/login", None, &serde_json::json!({
            "email": email,
            "password": password
        }))).await;

        if !response.status().is_success() {
            panic!("Login failed in test helper: status {}", response.status());
        }

        session_cookie(&response).expect("No admin_token cookie returned")
    }

    pub async fn login_default(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Creates a guest through the API and returns the response body.
    pub async fn create_guest(&self, token: &str, body: Value) -> Value {
        let response = self.send(json_request("POST", "/api/v1/admin/guests", Some(token), &body)).await;
        assert!(response.status().is_success(), "create guest failed: {}", response.status());
        parse_body(response).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}

pub fn session_cookie(response: &Response) -> Option<String> {
    response.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find(|c| c.starts_with("admin_token="))
        .map(|c| {
            let value = &c["admin_token=".len()..];
            value.split(';').next().unwrap_or_default().to_string()
        })
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, session: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = session {
        builder = builder.header(header::COOKIE, format!("admin_token={}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[allow(dead_code)]
pub fn get_request(uri: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = session {
        builder = builder.header(header::COOKIE, format!("admin_token={}", token));
    }
    builder.body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub fn guest_request(method: &str, uri: &str, fingerprint: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(fp) = fingerprint {
        builder = builder.header("x-device-fingerprint", fp);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn parse_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Attaches the socket address the server would see for this request.
#[allow(dead_code)]
pub fn from_peer(mut request: Request<Body>, peer: [u8; 4]) -> Request<Body> {
    request.extensions_mut().insert(ConnectInfo(SocketAddr::from((peer, 40000))));
    request
}
