//! The `jwt` session cookie.

use axum::http::HeaderValue;
use chrono::{Duration, Utc};

use crate::config::AppEnvironment;
use crate::error::AppError;

pub const TOKEN_COOKIE: &str = "jwt";

/// Value written on logout; it never validates as a token.
pub const LOGGED_OUT: &str = "loggedout";

/// Lifetime of the logout cookie.
const LOGGED_OUT_TTL_SECS: i64 = 10;

/// `Set-Cookie` value carrying a freshly issued token.
pub fn token_cookie(
    token: &str,
    expiry_days: i64,
    environment: AppEnvironment,
) -> Result<HeaderValue, AppError> {
    build_cookie(
        token,
        Duration::days(expiry_days).num_seconds(),
        environment,
    )
}

/// `Set-Cookie` value that overwrites the token and expires within seconds.
pub fn logged_out_cookie(environment: AppEnvironment) -> Result<HeaderValue, AppError> {
    build_cookie(LOGGED_OUT, LOGGED_OUT_TTL_SECS, environment)
}

fn build_cookie(
    value: &str,
    max_age_secs: i64,
    environment: AppEnvironment,
) -> Result<HeaderValue, AppError> {
    let expires = (Utc::now() + Duration::seconds(max_age_secs))
        .format("%a, %d %b %Y %H:%M:%S GMT");
    let mut cookie = format!(
        "{TOKEN_COOKIE}={value}; Path=/; Max-Age={max_age_secs}; Expires={expires}; HttpOnly; SameSite=Lax"
    );
    if environment == AppEnvironment::Production {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::InternalError(format!("Invalid cookie header: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_cookies_are_secure() {
        let cookie = token_cookie("abc", 90, AppEnvironment::Production).unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("jwt=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=7776000"));
        assert!(cookie.ends_with("; Secure"));
    }

    #[test]
    fn development_cookies_are_not_secure() {
        let cookie = token_cookie("abc", 1, AppEnvironment::Development).unwrap();
        assert!(!cookie.to_str().unwrap().contains("Secure"));
    }

    #[test]
    fn logout_cookie_expires_quickly() {
        let cookie = logged_out_cookie(AppEnvironment::Development).unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("jwt=loggedout;"));
        assert!(cookie.contains("Max-Age=10"));
    }
}
