use std::env;

#[derive(Clone, Debug)]
pub struct RateLimit {
    pub max_requests: u32,
    pub window_secs: u64,
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub default_admin_email: Option<String>,
    pub default_admin_password: Option<String>,
    pub base_url: String,
    pub email_api_url: String,
    pub email_api_key: String,
    pub email_from: String,
    pub invitation_video_url: Option<String>,
    pub app_env: String,
    pub login_rate_limit: RateLimit,
    pub guest_rate_limit: RateLimit,
    /// Take the client address from proxy headers instead of the socket.
    pub trust_proxy_headers: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            default_admin_email: optional_var("DEFAULT_ADMIN_EMAIL"),
            default_admin_password: optional_var("DEFAULT_ADMIN_PASSWORD"),
            base_url: env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            email_api_url: env::var("EMAIL_API_URL").unwrap_or_else(|_| "https://api.resend.com/emails".to_string()),
            email_api_key: env::var("EMAIL_API_KEY").unwrap_or_default(),
            email_from: env::var("EMAIL_FROM").unwrap_or_else(|_| "Wedding <invite@example.com>".to_string()),
            invitation_video_url: optional_var("INVITATION_VIDEO_URL"),
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "production".to_string()),
            login_rate_limit: RateLimit {
                max_requests: parse_var("RATE_LIMIT_LOGIN_MAX", 5),
                window_secs: parse_var("RATE_LIMIT_LOGIN_WINDOW_SECS", 900),
            },
            guest_rate_limit: RateLimit {
                max_requests: parse_var("RATE_LIMIT_GUEST_MAX", 20),
                window_secs: parse_var("RATE_LIMIT_GUEST_WINDOW_SECS", 60),
            },
            trust_proxy_headers: flag_var("TRUST_PROXY_HEADERS"),
        }
    }

    pub fn is_development(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("development")
    }

    pub fn invite_link(&self, token: &str) -> String {
        format!("{}/invite/{}", self.base_url.trim_end_matches('/'), token)
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| panic!("{} must be a number", key)),
        Err(_) => default,
    }
}

fn flag_var(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
