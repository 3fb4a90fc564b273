use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use url::Url;

use crate::db::DEFAULT_MAX_POOL_SIZE;

pub const DEFAULT_EMAIL_FROM: &str = "Kalanchiyam <noreply@kalanchiyam.com>";
const PLACEHOLDER_RESEND_KEY: &str = "dummy-key";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_pool_size: u32,
    pub server_host: String,
    pub server_port: u16,
    pub app_base_url: String,
    pub session_secret: String,
    pub session_issuer: String,
    pub session_audience: String,
    pub session_expiry_minutes: i64,
    pub session_cookie_secure: bool,
    pub cors_allowed_origin: Option<String>,
    pub aws_endpoint_url: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_region: String,
    pub s3_bucket: String,
    pub avatar_bucket: Option<String>,
    pub avatar_public_base_url: Option<String>,
    pub public_dir: PathBuf,
    pub auth_provider_url: String,
    pub auth_provider_anon_key: String,
    pub auth_provider_service_key: Option<String>,
    pub resend_api_key: Option<String>,
    pub email_from: String,
    pub invite_ttl_days: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_pool_size = env::var("DATABASE_MAX_POOL_SIZE")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_MAX_POOL_SIZE);
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("SERVER_PORT must be a valid u16")?;
        let app_base_url = env::var("APP_BASE_URL")
            .map(|value| value.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        Url::parse(&app_base_url).context("APP_BASE_URL must be an absolute URL")?;
        let session_secret = env::var("SESSION_SECRET").context("SESSION_SECRET must be set")?;
        let session_issuer = env::var("SESSION_ISSUER").unwrap_or_else(|_| "docvault".to_string());
        let session_audience =
            env::var("SESSION_AUDIENCE").unwrap_or_else(|_| "docvault-clients".to_string());
        let session_expiry_minutes = env::var("SESSION_EXPIRY_MINUTES")
            .unwrap_or_else(|_| "10080".to_string())
            .parse()
            .context("SESSION_EXPIRY_MINUTES must be an integer")?;
        let session_cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let cors_allowed_origin = env::var("CORS_ALLOWED_ORIGIN").ok();
        let aws_endpoint_url = env::var("AWS_ENDPOINT_URL").ok();
        let aws_access_key_id = env::var("AWS_ACCESS_KEY_ID").ok();
        let aws_secret_access_key = env::var("AWS_SECRET_ACCESS_KEY").ok();
        let aws_region = env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let s3_bucket = env::var("S3_BUCKET").context("S3_BUCKET must be set")?;
        let avatar_bucket = non_empty(env::var("AVATAR_BUCKET").ok());
        let avatar_public_base_url = non_empty(env::var("AVATAR_PUBLIC_BASE_URL").ok());
        let public_dir = env::var("PUBLIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("public"));
        let auth_provider_url = env::var("AUTH_PROVIDER_URL")
            .context("AUTH_PROVIDER_URL must be set")?
            .trim_end_matches('/')
            .to_string();
        let auth_provider_anon_key =
            env::var("AUTH_PROVIDER_ANON_KEY").context("AUTH_PROVIDER_ANON_KEY must be set")?;
        let auth_provider_service_key = non_empty(env::var("AUTH_PROVIDER_SERVICE_KEY").ok());
        let resend_api_key = usable_resend_key(env::var("RESEND_API_KEY").ok());
        let email_from = env::var("EMAIL_FROM").unwrap_or_else(|_| DEFAULT_EMAIL_FROM.to_string());
        let invite_ttl_days = env::var("INVITE_TTL_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse()
            .context("INVITE_TTL_DAYS must be an integer")?;

        Ok(Self {
            database_url,
            database_max_pool_size,
            server_host,
            server_port,
            app_base_url,
            session_secret,
            session_issuer,
            session_audience,
            session_expiry_minutes,
            session_cookie_secure,
            cors_allowed_origin,
            aws_endpoint_url,
            aws_access_key_id,
            aws_secret_access_key,
            aws_region,
            s3_bucket,
            avatar_bucket,
            avatar_public_base_url,
            public_dir,
            auth_provider_url,
            auth_provider_anon_key,
            auth_provider_service_key,
            resend_api_key,
            email_from,
            invite_ttl_days,
        })
    }

    pub fn redacted_database_url(&self) -> String {
        redact_database_url(&self.database_url)
    }

    /// Where the auth provider sends users back after a magic link or invite.
    pub fn auth_callback_url(&self) -> String {
        format!("{}/auth/callback", self.app_base_url)
    }

    /// Public prefix for hosted avatars. Falls back to the virtual-hosted S3 URL.
    pub fn avatar_base_url(&self) -> Option<String> {
        if let Some(base) = &self.avatar_public_base_url {
            return Some(base.trim_end_matches('/').to_string());
        }
        let bucket = self.avatar_bucket.as_ref()?;
        Some(match &self.aws_endpoint_url {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", bucket, self.aws_region),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn usable_resend_key(value: Option<String>) -> Option<String> {
    non_empty(value).filter(|key| key != PLACEHOLDER_RESEND_KEY)
}

fn redact_database_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("*****"));
            }
            parsed.to_string()
        }
        Err(_) => "***".to_string(),
    }
}
