use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Supabase,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub upload_dir: String,
    pub public_dir: String,
    pub low_stock_threshold: i64,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: 24,
            supabase_url: String::new(),
            supabase_service_key: String::new(),
            upload_dir: "./uploads".to_string(),
            public_dir: "./public".to_string(),
            low_stock_threshold: 10,
            port: 5000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, tokens cannot be issued or verified");
                    String::new()
                }),
            token_ttl_hours: parse_or("TOKEN_TTL_HOURS", defaults.token_ttl_hours),
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using in-memory storage");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_KEY")
                .unwrap_or_default(),
            upload_dir: env::var("UPLOAD_DIR")
                .unwrap_or(defaults.upload_dir),
            public_dir: env::var("PUBLIC_DIR")
                .unwrap_or(defaults.public_dir),
            low_stock_threshold: parse_or("LOW_STOCK_THRESHOLD", defaults.low_stock_threshold),
            port: parse_or("PORT", defaults.port),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty()
    }

    pub fn storage_backend(&self) -> StorageBackend {
        if !self.supabase_url.is_empty() && !self.supabase_service_key.is_empty() {
            StorageBackend::Supabase
        } else {
            StorageBackend::Memory
        }
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
