// Manual cookie accumulation for the B2C login
//
// B2C issues cookies whose names contain `|`, which cookie stores reject.
// Raw `Set-Cookie` headers are folded into a name→value map and replayed
// as a single `Cookie` header on every later step.

use indexmap::IndexMap;
use reqwest::header::{HeaderMap, SET_COOKIE};

/// Name→value cookie map for one login attempt. Later values replace
/// earlier ones with the same name; first-seen order is kept.
#[derive(Debug, Default, Clone)]
pub struct CookieJar {
    cookies: IndexMap<String, String>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge every `Set-Cookie` header from a response.
    pub fn absorb(&mut self, headers: &HeaderMap) {
        for raw in headers.get_all(SET_COOKIE) {
            let Ok(raw) = raw.to_str() else {
                continue;
            };
            self.absorb_line(raw);
        }
    }

    /// Merge one `Set-Cookie` value (`name=value; Path=/; ...`).
    pub fn absorb_line(&mut self, raw: &str) {
        let pair = raw.split(';').next().unwrap_or_default();
        if let Some((name, value)) = pair.split_once('=') {
            let name = name.trim();
            if !name.is_empty() {
                self.cookies.insert(name.to_owned(), value.trim().to_owned());
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// `Cookie` header value: `a=1; b=2`.
    pub fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    #[test]
    fn keeps_pipe_names_and_replaces_values() {
        let mut jar = CookieJar::new();
        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("x-ms-cpim-trans=abc; path=/; secure; HttpOnly"),
        );
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("x-ms-cpim-csrf=tok1; domain=login.example; path=/"),
        );
        jar.absorb(&headers);
        jar.absorb_line("x-ms-cpim-cache|abc_0=payload==; path=/");
        jar.absorb_line("x-ms-cpim-csrf=tok2; path=/");

        assert_eq!(jar.len(), 3);
        assert_eq!(jar.get("x-ms-cpim-cache|abc_0"), Some("payload=="));
        assert_eq!(
            jar.header_value(),
            "x-ms-cpim-trans=abc; x-ms-cpim-csrf=tok2; x-ms-cpim-cache|abc_0=payload=="
        );
    }

    #[test]
    fn ignores_malformed_lines() {
        let mut jar = CookieJar::new();
        jar.absorb_line("no-equals-sign");
        jar.absorb_line("=value-without-name");
        assert!(jar.is_empty());
        assert_eq!(jar.header_value(), "");
    }
}
