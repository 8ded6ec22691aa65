use crate::errors::AppError;
use axum::http::{header::COOKIE, HeaderMap};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "edit_token";
pub const SESSION_TTL_SECS: i64 = 60 * 60 * 24 * 7;

#[derive(Clone)]
pub struct AccessGuard {
    secret: Option<String>,
    secure_cookies: bool,
}

impl AccessGuard {
    /// A guard without a secret rejects every login.
    pub fn new(secret: Option<String>, secure_cookies: bool) -> Self {
        Self {
            secret: secret.filter(|secret| !secret.is_empty()),
            secure_cookies,
        }
    }

    pub fn editing_enabled(&self) -> bool {
        self.secret.is_some()
    }

    pub fn login(&self, supplied: &str) -> Result<String, AppError> {
        self.login_at(supplied, Utc::now().timestamp())
    }

    pub fn login_at(&self, supplied: &str, now: i64) -> Result<String, AppError> {
        match self.secret.as_deref() {
            Some(secret) if secret == supplied => {
                let expires = now + SESSION_TTL_SECS;
                let mac = sign(secret, expires).ok_or(AppError::InvalidCredentials)?;
                Ok(format!("{expires}.{}", URL_SAFE_NO_PAD.encode(mac)))
            }
            _ => Err(AppError::InvalidCredentials),
        }
    }

    pub fn check(&self, token: Option<&str>) -> bool {
        self.check_at(token, Utc::now().timestamp())
    }

    pub fn check_at(&self, token: Option<&str>, now: i64) -> bool {
        let (Some(secret), Some(token)) = (self.secret.as_deref(), token) else {
            return false;
        };
        let Some((expires, mac)) = token.split_once('.') else {
            return false;
        };
        let Ok(expires) = expires.parse::<i64>() else {
            return false;
        };
        if expires <= now {
            return false;
        }
        let Ok(mac) = URL_SAFE_NO_PAD.decode(mac) else {
            return false;
        };
        let Ok(mut verifier) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        verifier.update(expires.to_string().as_bytes());
        verifier.verify_slice(&mac).is_ok()
    }

    pub fn session_cookie(&self, token: &str) -> String {
        self.cookie(token, SESSION_TTL_SECS)
    }

    pub fn logout_cookie(&self) -> String {
        self.cookie("", 0)
    }

    fn cookie(&self, value: &str, max_age: i64) -> String {
        let mut cookie =
            format!("{SESSION_COOKIE}={value}; Max-Age={max_age}; Path=/; HttpOnly; SameSite=Strict");
        if self.secure_cookies {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

fn sign(secret: &str, expires: i64) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(expires.to_string().as_bytes());
    Some(mac.finalize().into_bytes().to_vec())
}

/// Pulls the session token out of the request's `Cookie` headers.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const NOW: i64 = 1_767_700_000;

    fn guard() -> AccessGuard {
        AccessGuard::new(Some("hunter2".into()), false)
    }

    #[test]
    fn login_with_secret_issues_checkable_token() {
        let guard = guard();
        let token = guard.login_at("hunter2", NOW).unwrap();
        assert!(guard.check_at(Some(&token), NOW));
        assert!(!token.contains("hunter2"));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let guard = guard();
        assert!(matches!(
            guard.login_at("hunter3", NOW),
            Err(AppError::InvalidCredentials)
        ));
    }

    #[test]
    fn tokens_expire_after_seven_days() {
        let guard = guard();
        let token = guard.login_at("hunter2", NOW).unwrap();
        assert!(guard.check_at(Some(&token), NOW + SESSION_TTL_SECS - 1));
        assert!(!guard.check_at(Some(&token), NOW + SESSION_TTL_SECS));
    }

    #[test]
    fn tampered_or_foreign_tokens_fail() {
        let guard = guard();
        let token = guard.login_at("hunter2", NOW).unwrap();
        let (_, mac) = token.split_once('.').unwrap();
        let stretched = format!("{}.{mac}", NOW + 10 * SESSION_TTL_SECS);
        assert!(!guard.check_at(Some(&stretched), NOW));
        assert!(!guard.check_at(Some("hunter2"), NOW));
        assert!(!guard.check_at(None, NOW));

        let rotated = AccessGuard::new(Some("new-secret".into()), false);
        assert!(!rotated.check_at(Some(&token), NOW));
    }

    #[test]
    fn no_secret_disables_editing() {
        let guard = AccessGuard::new(None, false);
        assert!(!guard.editing_enabled());
        assert!(guard.login_at("", NOW).is_err());
        assert!(!guard.check_at(Some(""), NOW));
    }

    #[test]
    fn cookie_attributes() {
        let cookie = guard().session_cookie("abc");
        assert!(cookie.starts_with("edit_token=abc;"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(!cookie.contains("Secure"));

        let secure = AccessGuard::new(Some("s".into()), true);
        assert!(secure.session_cookie("abc").ends_with("; Secure"));
        assert!(secure.logout_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn reads_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; edit_token=123.abc"));
        assert_eq!(session_token(&headers).as_deref(), Some("123.abc"));

        headers.insert(COOKIE, HeaderValue::from_static("edit_token="));
        assert_eq!(session_token(&headers), None);
    }
}
