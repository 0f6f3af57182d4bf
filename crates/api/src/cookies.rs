//! Credential cookies.

use axum::http::{header, HeaderMap};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const SESSION_COOKIE: &str = "SESSION";

/// Cookie attributes shared by every credential cookie the board sets.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    pub name: &'static str,
    pub max_age_secs: i64,
    pub secure: bool,
}

impl CookieSettings {
    /// `Set-Cookie` value carrying a credential.
    pub fn issue(&self, value: &str) -> String {
        self.render(value, self.max_age_secs)
    }

    /// `Set-Cookie` value that makes the browser drop the cookie.
    pub fn clear(&self) -> String {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.name, value, max_age
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Value of the first cookie called `name` across all `Cookie` headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}
