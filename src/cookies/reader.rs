use axum::http::{header::COOKIE, HeaderMap};
use cookie::Cookie;

/// Immutable view of the cookies sent with one request.
///
/// Pairs keep header order. When a name repeats, the first occurrence wins:
/// browsers send the cookie with the most specific path first.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RequestCookies {
    pairs: Vec<(String, String)>,
}

impl RequestCookies {
    /// Parse every `Cookie` header. Malformed pairs are skipped; header bytes
    /// are read as UTF-8, with invalid sequences replaced.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut out = RequestCookies::default();
        for hv in headers.get_all(COOKIE).iter() {
            let raw = String::from_utf8_lossy(hv.as_bytes());
            for parsed in Cookie::split_parse(raw.as_ref()) {
                let Ok(c) = parsed else { continue; };
                out.push(c.name(), c.value());
            }
        }
        out
    }

    pub fn from_pairs<I, N, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let mut out = RequestCookies::default();
        for (n, v) in pairs {
            let (n, v) = (n.into(), v.into());
            out.push(&n, &v);
        }
        out
    }

    fn push(&mut self, name: &str, value: &str) {
        if name.is_empty() || self.pairs.iter().any(|(n, _)| n == name) { return; }
        self.pairs.push((name.to_string(), value.to_string()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self) -> &[(String, String)] { &self.pairs }

    pub fn len(&self) -> usize { self.pairs.len() }

    pub fn is_empty(&self) -> bool { self.pairs.is_empty() }
}

impl std::fmt::Debug for RequestCookies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.pairs.iter().map(|(n, _)| n)).finish()
    }
}
