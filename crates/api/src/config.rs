use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

/// Which error detail clients see and whether auth cookies are `Secure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Production,
}

impl AppEnvironment {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(AppEnvironment::Development),
            "production" | "prod" => Some(AppEnvironment::Production),
            _ => None,
        }
    }

    pub fn is_development(self) -> bool {
        self == AppEnvironment::Development
    }
}

/// Default request body limit: room for a 2 MiB event photo plus form fields.
const DEFAULT_BODY_LIMIT_BYTES: usize = 3 * 1024 * 1024;

/// Default per-IP request budget on `/api`.
const DEFAULT_RATE_LIMIT_PER_HOUR: u32 = 100;

/// Runtime settings, read once at startup.
///
/// Only `JWT_SECRET` has no default.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed to call the API with credentials.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub environment: AppEnvironment,
    /// Holds the `users/` and `events/` photo folders.
    pub uploads_dir: PathBuf,
    /// Prefix for links mailed to users, e.g. password reset.
    pub base_url: String,
    pub body_limit_bytes: usize,
    /// Per client IP on `/api/v1`; `None` turns the limiter off.
    pub rate_limit_per_hour: Option<u32>,
    pub jwt: JwtConfig,
}

/// Read `var`, falling back to `default`, and parse it.
///
/// # Panics
///
/// When the value does not parse as `T`.
fn env_parsed<T>(var: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("invalid {var}={raw:?}: {e}")),
        Err(_) => default,
    }
}

fn env_string(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

impl ServerConfig {
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `APP_ENV`              | `production`               |
    /// | `UPLOADS_DIR`          | `uploads`                  |
    /// | `APP_BASE_URL`         | `http://localhost:<PORT>`  |
    /// | `BODY_LIMIT_BYTES`     | `3145728`                  |
    /// | `RATE_LIMIT_PER_HOUR`  | `100` (`0` disables)       |
    ///
    /// Plus the `JWT_*` variables read by [`JwtConfig::from_env`].
    ///
    /// # Panics
    ///
    /// On any unparseable value, so a bad deploy fails before binding.
    pub fn from_env() -> Self {
        let port: u16 = env_parsed("PORT", 3000);

        let environment = match std::env::var("APP_ENV") {
            Ok(name) => AppEnvironment::from_name(&name)
                .unwrap_or_else(|| panic!("APP_ENV={name:?} is neither development nor production")),
            Err(_) => AppEnvironment::Production,
        };

        let rate_limit: u32 = env_parsed("RATE_LIMIT_PER_HOUR", DEFAULT_RATE_LIMIT_PER_HOUR);

        Self {
            host: env_string("HOST", "0.0.0.0"),
            port,
            cors_origins: split_origins(&env_string("CORS_ORIGINS", "http://localhost:5173")),
            request_timeout_secs: env_parsed("REQUEST_TIMEOUT_SECS", 30),
            environment,
            uploads_dir: PathBuf::from(env_string("UPLOADS_DIR", "uploads")),
            base_url: env_string("APP_BASE_URL", &format!("http://localhost:{port}"))
                .trim_end_matches('/')
                .to_string(),
            body_limit_bytes: env_parsed("BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT_BYTES),
            rate_limit_per_hour: (rate_limit > 0).then_some(rate_limit),
            jwt: JwtConfig::from_env(),
        }
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}
