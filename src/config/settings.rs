//! Application settings loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use super::constants::{
    DEFAULT_DATABASE_URL, DEFAULT_DB_IDLE_TIMEOUT_SECONDS, DEFAULT_DB_MAX_CONNECTIONS,
    DEFAULT_DB_MIN_CONNECTIONS, DEFAULT_FROM_EMAIL, DEFAULT_FRONTEND_URL,
    DEFAULT_INVITATION_TTL_MINUTES, DEFAULT_QUERY_TIMEOUT_SECONDS, DEFAULT_REDIS_URL,
    DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DEFAULT_SESSION_TTL_SECONDS, SESSION_COOKIE_NAME,
};
use crate::domain::{AccountKind, HashCost};

/// Connection pool settings
#[derive(Clone, Debug)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout: Duration,
}

/// Session cookie and store settings
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_seconds: u64,
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: SESSION_COOKIE_NAME.to_string(),
            ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            secure_cookie: false,
        }
    }
}

/// Outbound mail settings
#[derive(Clone)]
pub struct MailConfig {
    pub resend_api_key: Option<String>,
    pub from_email: String,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field(
                "resend_api_key",
                &self.resend_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("from_email", &self.from_email)
            .finish()
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub pool: PoolConfig,
    pub redis_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub frontend_url: String,
    pub session: SessionConfig,
    pub mail: MailConfig,
    pub hash_cost: HashCost,
    pub invitation_ttl_minutes: i64,
    pub query_timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("pool", &self.pool)
            .field("redis_url", &"[REDACTED]")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("frontend_url", &self.frontend_url)
            .field("session", &self.session)
            .field("mail", &self.mail)
            .field("hash_cost", &self.hash_cost)
            .field("invitation_ttl_minutes", &self.invitation_ttl_minutes)
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Reads `.env` first when present. Every value has a development default.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = HashCost::default();

        let resend_api_key = env::var("RESEND_API_KEY").ok().filter(|k| !k.is_empty());

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            pool: PoolConfig {
                max_connections: parse_var("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
                min_connections: parse_var("DB_MIN_CONNECTIONS", DEFAULT_DB_MIN_CONNECTIONS),
                idle_timeout: Duration::from_secs(parse_var(
                    "DB_IDLE_TIMEOUT_SECS",
                    DEFAULT_DB_IDLE_TIMEOUT_SECONDS,
                )),
            },
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            server_port: parse_var("SERVER_PORT", DEFAULT_SERVER_PORT),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| DEFAULT_FRONTEND_URL.to_string()),
            session: SessionConfig {
                cookie_name: SESSION_COOKIE_NAME.to_string(),
                ttl_seconds: parse_var("SESSION_TTL_SECONDS", DEFAULT_SESSION_TTL_SECONDS),
                secure_cookie: env::var("SESSION_COOKIE_SECURE")
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(false),
            },
            mail: MailConfig {
                resend_api_key,
                from_email: env::var("RESEND_FROM_EMAIL")
                    .unwrap_or_else(|_| DEFAULT_FROM_EMAIL.to_string()),
            },
            hash_cost: HashCost {
                memory_kib: parse_var("ARGON2_MEMORY_KIB", defaults.memory_kib),
                iterations: parse_var("ARGON2_ITERATIONS", defaults.iterations),
                parallelism: parse_var("ARGON2_PARALLELISM", defaults.parallelism),
            },
            invitation_ttl_minutes: parse_var(
                "INVITATION_TTL_MINUTES",
                DEFAULT_INVITATION_TTL_MINUTES,
            ),
            query_timeout: Duration::from_secs(parse_var(
                "QUERY_TIMEOUT_SECONDS",
                DEFAULT_QUERY_TIMEOUT_SECONDS,
            )),
        }
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Link the frontend shows to complete activation.
    pub fn activation_url(&self, kind: AccountKind, raw_token: &str) -> String {
        activation_url(&self.frontend_url, kind, raw_token)
    }
}

/// Build `{frontend}/{kind}/activate/{token}`.
pub fn activation_url(frontend_url: &str, kind: AccountKind, raw_token: &str) -> String {
    format!(
        "{}/{}/activate/{}",
        frontend_url.trim_end_matches('/'),
        kind.as_str(),
        raw_token
    )
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_url_per_kind() {
        assert_eq!(
            activation_url("http://localhost:3000/", AccountKind::User, "abc"),
            "http://localhost:3000/user/activate/abc"
        );
        assert_eq!(
            activation_url("https://inquiro.app", AccountKind::Mentor, "xyz"),
            "https://inquiro.app/mentor/activate/xyz"
        );
    }

    #[test]
    fn test_mail_config_debug_hides_key() {
        let mail = MailConfig {
            resend_api_key: Some("re_secret".to_string()),
            from_email: "team@inquiro.app".to_string(),
        };
        let rendered = format!("{:?}", mail);
        assert!(!rendered.contains("re_secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
