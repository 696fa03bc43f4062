use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use cookie::time::Duration as CookieDuration;
use serde::{Deserialize, Serialize};

pub const SESSION_COOKIE: &str = "___session__liber";
pub const SESSION_TTL_DAYS: i64 = 7;

/// Contents of the signed session cookie. Both keys are optional so a
/// partially-populated or legacy cookie still reads cleanly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionPayload {
    #[serde(
        rename = "accessToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub access_token: Option<String>,
    #[serde(
        rename = "refreshToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_token: Option<String>,
}

/// Derive the cookie-signing key from the configured secret. The secret is
/// repeated out to the 64 bytes of master-key material `Key` expects, so
/// short human-chosen secrets work without weakening the derivation step.
pub fn signing_key(secret: &str) -> Key {
    let seed = if secret.is_empty() { "liber" } else { secret };
    let mut material = Vec::with_capacity(64);
    while material.len() < 64 {
        material.extend_from_slice(seed.as_bytes());
    }
    Key::derive_from(&material)
}

fn read_payload(jar: &SignedCookieJar) -> SessionPayload {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| serde_json::from_str(cookie.value()).ok())
        .unwrap_or_default()
}

pub fn access_token(jar: &SignedCookieJar) -> Option<String> {
    read_payload(jar).access_token
}

pub fn refresh_token(jar: &SignedCookieJar) -> Option<String> {
    read_payload(jar).refresh_token
}

/// Store both tokens in the session cookie and redirect. `remember` keeps the
/// cookie for seven days; otherwise it lives only for the browser session.
pub fn create_user_session(
    jar: SignedCookieJar,
    access_token: &str,
    refresh_token: &str,
    remember: bool,
    redirect_to: &str,
    secure: bool,
) -> (SignedCookieJar, Redirect) {
    let payload = SessionPayload {
        access_token: Some(access_token.to_string()),
        refresh_token: Some(refresh_token.to_string()),
    };
    let value = serde_json::to_string(&payload).unwrap_or_default();

    let mut cookie = base_cookie(value, secure);
    if remember {
        cookie.set_max_age(CookieDuration::days(SESSION_TTL_DAYS));
    }

    (jar.add(cookie), Redirect::to(&safe_redirect(redirect_to)))
}

/// Clear the session cookie and send the user back to the landing page.
pub fn destroy_session(jar: SignedCookieJar, secure: bool) -> (SignedCookieJar, Redirect) {
    let mut removal = base_cookie(String::new(), secure);
    removal.set_max_age(CookieDuration::seconds(0));

    (jar.remove(removal), Redirect::to("/"))
}

fn base_cookie(value: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie
}

/// Only same-origin absolute paths are honored as redirect targets; anything
/// else (external URLs, scheme-relative `//... `) falls back to the root.
pub fn safe_redirect(target: &str) -> String {
    if target.starts_with('/') && !target.starts_with("//") {
        target.to_string()
    } else {
        "/".to_string()
    }
}
