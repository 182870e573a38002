use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::{Duration, OffsetDateTime};

pub const AUTH_COOKIE: &str = "jwt";

/// Value written on logout; never a valid credential.
pub const LOGGED_OUT: &str = "loggedout";

const LOGGED_OUT_TTL_SECS: i64 = 10;

/// Cookie carrying a fresh credential.
pub fn session_cookie(token: &str, lifetime_days: u64, secure: bool) -> Cookie<'static> {
    build(token.to_string(), Duration::days(lifetime_days.min(3650) as i64), secure)
}

/// Cookie that replaces the credential with the logout sentinel.
pub fn logged_out_cookie(secure: bool) -> Cookie<'static> {
    build(LOGGED_OUT.to_string(), Duration::seconds(LOGGED_OUT_TTL_SECS), secure)
}

fn build(value: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .expires(OffsetDateTime::now_utc() + max_age)
        .secure(secure)
        .build()
}

/// The `jwt` cookie value, if present and non-empty.
pub fn read_auth_cookie(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(AUTH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("abc.def.ghi", 90, false);
        assert_eq!(cookie.name(), "jwt");
        assert_eq!(cookie.value(), "abc.def.ghi");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(Duration::days(90)));
        assert!(cookie.expires_datetime().is_some());
        assert_eq!(cookie.secure(), Some(false));

        assert_eq!(session_cookie("t", 1, true).secure(), Some(true));
        assert!(session_cookie("t", 1, true).to_string().contains("Secure"));
    }

    #[test]
    fn logout_cookie_is_short_lived_sentinel() {
        let cookie = logged_out_cookie(false);
        assert_eq!(cookie.value(), LOGGED_OUT);
        assert_eq!(cookie.max_age(), Some(Duration::seconds(10)));
        assert!(cookie.to_string().starts_with("jwt=loggedout"));
    }

    #[test]
    fn reads_auth_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.append("cookie", HeaderValue::from_static("theme=dark; jwt=token-1"));
        assert_eq!(read_auth_cookie(&headers).as_deref(), Some("token-1"));

        let mut other = HeaderMap::new();
        other.append("cookie", HeaderValue::from_static("session=abc"));
        assert_eq!(read_auth_cookie(&other), None);
    }

    #[test]
    fn empty_cookie_is_absent() {
        let mut headers = HeaderMap::new();
        headers.append("cookie", HeaderValue::from_static("jwt="));
        assert_eq!(read_auth_cookie(&headers), None);
    }
}
