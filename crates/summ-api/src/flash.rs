//! One-shot messages carried across a redirect in a short-lived cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use tracing::warn;

const FLASH_COOKIE: &str = "flash";

/// Queues `message` for the next rendered page.
pub fn push(jar: CookieJar, message: &str) -> CookieJar {
    let mut messages = peek(&jar);
    messages.push(message.to_string());

    let encoded = match serde_json::to_vec(&messages) {
        Ok(json) => B64.encode(json),
        Err(e) => {
            warn!("Dropping flash message: {}", e);
            return jar;
        }
    };
    let cookie = Cookie::build((FLASH_COOKIE, encoded))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

/// Removes and returns every queued message.
pub fn take(jar: CookieJar) -> (CookieJar, Vec<String>) {
    let messages = peek(&jar);
    if jar.get(FLASH_COOKIE).is_none() {
        return (jar, messages);
    }
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), messages)
}

/// A cookie that fails to decode is treated as empty.
fn peek(jar: &CookieJar) -> Vec<String> {
    jar.get(FLASH_COOKIE)
        .and_then(|c| B64.decode(c.value()).ok())
        .and_then(|bytes| serde_json::from_slice::<Vec<String>>(&bytes).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_survive_until_taken() {
        let jar = push(CookieJar::new(), "Summary added to favorites");
        let jar = push(jar, "A summary for \"x; y\" already exists.");

        let (jar, messages) = take(jar);
        assert_eq!(
            messages,
            vec![
                "Summary added to favorites".to_string(),
                "A summary for \"x; y\" already exists.".to_string(),
            ]
        );

        let (_, messages) = take(jar);
        assert!(messages.is_empty());
    }

    #[test]
    fn multiline_message_stays_one_message() {
        let jar = push(CookieJar::new(), "first line\nsecond line");
        let (_, messages) = take(jar);
        assert_eq!(messages, vec!["first line\nsecond line".to_string()]);
    }

    #[test]
    fn garbage_cookie_is_ignored() {
        let jar = CookieJar::new().add(Cookie::new(FLASH_COOKIE, "%%%"));
        let (_, messages) = take(jar);
        assert!(messages.is_empty());
    }
}
