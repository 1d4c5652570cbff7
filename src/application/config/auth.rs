use std::env;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for signing access tokens.
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    pub token_expire_secs: i64,
    /// Bootstrap admin account, created on startup if missing.
    pub admin_email: String,
    pub admin_password: String,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            jwt_secret: env::var("ATRIUM_JWT_SECRET")
                .unwrap_or_else(|_| "atrium-insecure-dev-secret".to_string()),
            token_expire_secs: env::var("ATRIUM_TOKEN_EXPIRE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(604800), // 7 days
            admin_email: env::var("ATRIUM_ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@example.com".to_string()),
            admin_password: env::var("ATRIUM_ADMIN_PASSWORD")
                .unwrap_or_else(|_| "changeme".to_string()),
        }
    }
}
