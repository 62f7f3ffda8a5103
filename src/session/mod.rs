//! Client-side session held in a signed cookie.
//!
//! The whole session is serialized as JSON into one cookie value and signed
//! with HMAC through `axum-extra`'s [`SignedCookieJar`]. Nothing is stored on
//! the server: a cookie whose signature does not verify is simply ignored.

use std::collections::BTreeMap;

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::config::SessionConfig;
use crate::errors::{AppError, AppResult};

pub const TOKEN_KEY: &str = "token";
pub const USER_ID_KEY: &str = "user_id";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session {
    values: BTreeMap<String, String>,
}

impl Session {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn unset(&mut self, key: &str) {
        self.values.remove(key);
    }

    /// Bearer token issued by the API; empty strings count as absent.
    pub fn token(&self) -> Option<&str> {
        self.get(TOKEN_KEY).filter(|token| !token.is_empty())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.get(USER_ID_KEY)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Clone)]
pub struct SessionStore {
    key: Key,
    cookie_name: String,
    max_age: Duration,
    secure: bool,
}

impl SessionStore {
    pub fn new(settings: &SessionConfig) -> AppResult<Self> {
        let key = Key::try_from(settings.secret.as_bytes()).map_err(|_| {
            AppError::Session("session secret must be at least 64 bytes long".into())
        })?;

        Ok(Self {
            key,
            cookie_name: settings.cookie_name.clone(),
            max_age: Duration::days(settings.max_age_days),
            secure: settings.secure,
        })
    }

    /// Reads the session from the request's `Cookie` headers.
    ///
    /// Missing, tampered or undecodable cookies all produce an empty session.
    pub fn load(&self, headers: &HeaderMap) -> Session {
        let jar = SignedCookieJar::from_headers(headers, self.key.clone());
        match jar.get(&self.cookie_name) {
            Some(cookie) => serde_json::from_str(cookie.value()).unwrap_or_else(|e| {
                tracing::warn!("Discarding undecodable session cookie: {}", e);
                Session::default()
            }),
            None => Session::default(),
        }
    }

    /// Signs the session into a jar whose only delta is the session cookie.
    /// Return the jar as part of the response to emit `Set-Cookie`.
    pub fn commit(&self, session: &Session) -> AppResult<SignedCookieJar> {
        let value = serde_json::to_string(session)
            .map_err(|e| AppError::Session(format!("failed to encode session: {}", e)))?;

        let mut cookie = self.base_cookie(value);
        cookie.set_max_age(self.max_age);
        Ok(SignedCookieJar::new(self.key.clone()).add(cookie))
    }

    /// Produces a cookie that makes the browser drop the session at once.
    ///
    /// Always emitted, even when the request carried no session cookie, so
    /// repeated logouts behave the same.
    pub fn destroy(&self, _session: &Session) -> SignedCookieJar {
        let mut cookie = self.base_cookie("{}".to_string());
        cookie.set_max_age(Duration::ZERO);
        cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
        SignedCookieJar::new(self.key.clone()).add(cookie)
    }

    fn base_cookie(&self, value: String) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{cookie_header, set_cookie, test_session_config};
    use axum::http::header;
    use axum::response::IntoResponse;

    fn store() -> SessionStore {
        SessionStore::new(&test_session_config()).unwrap()
    }

    fn committed_cookie(store: &SessionStore, session: &Session) -> String {
        let response = store.commit(session).unwrap().into_response();
        set_cookie(&response).expect("commit must set a cookie")
    }

    #[test]
    fn rejects_short_secret() {
        let mut settings = test_session_config();
        settings.secret = "una-clau-secreta".into();
        assert!(matches!(SessionStore::new(&settings), Err(AppError::Session(_))));
    }

    #[test]
    fn no_cookie_yields_empty_session() {
        let session = store().load(&HeaderMap::new());
        assert!(session.is_empty());
        assert_eq!(session.token(), None);
    }

    #[test]
    fn committed_values_round_trip() {
        let store = store();
        let mut session = Session::default();
        session.set(TOKEN_KEY, "abc");
        session.set(USER_ID_KEY, "42");

        let cookie = committed_cookie(&store, &session);
        let loaded = store.load(&cookie_header(&cookie));

        assert_eq!(loaded, session);
        assert_eq!(loaded.token(), Some("abc"));
        assert_eq!(loaded.user_id(), Some("42"));
    }

    #[test]
    fn commit_sets_cookie_attributes() {
        let store = store();
        let mut session = Session::default();
        session.set(TOKEN_KEY, "abc");
        let response = store.commit(&session).unwrap().into_response();
        let raw = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();

        assert!(raw.starts_with("__session="));
        assert!(raw.contains("HttpOnly"));
        assert!(raw.contains("SameSite=Lax"));
        assert!(raw.contains("Path=/"));
        assert!(raw.contains("Max-Age=604800"));
    }

    #[test]
    fn tampered_cookie_yields_empty_session() {
        let store = store();
        let mut session = Session::default();
        session.set(TOKEN_KEY, "abc");
        let cookie = committed_cookie(&store, &session);
        let tampered = cookie.replace("abc", "xyz");
        assert_ne!(tampered, cookie);

        assert!(store.load(&cookie_header(&tampered)).is_empty());
    }

    #[test]
    fn cookie_signed_with_other_key_is_ignored() {
        let mut other_settings = test_session_config();
        other_settings.secret = "z".repeat(64);
        let other = SessionStore::new(&other_settings).unwrap();

        let mut session = Session::default();
        session.set(TOKEN_KEY, "abc");
        let cookie = committed_cookie(&other, &session);

        assert!(store().load(&cookie_header(&cookie)).is_empty());
    }

    #[test]
    fn unsigned_cookie_is_ignored() {
        let headers = cookie_header(r#"__session={"token":"forged"}"#);
        assert_eq!(store().load(&headers).token(), None);
    }

    #[test]
    fn destroy_expires_cookie_immediately() {
        let store = store();
        let response = store.destroy(&Session::default()).into_response();
        let raw = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();

        assert!(raw.contains("Max-Age=0"));
        let cookie = set_cookie(&response).unwrap();
        assert_eq!(store.load(&cookie_header(&cookie)).token(), None);
    }

    #[test]
    fn empty_token_counts_as_absent() {
        let mut session = Session::default();
        session.set(TOKEN_KEY, "");
        assert_eq!(session.token(), None);
        session.unset(TOKEN_KEY);
        assert!(session.is_empty());
    }
}
