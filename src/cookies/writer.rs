use std::collections::HashSet;

use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue};
use cookie::Cookie;
use tracing::warn;

use super::mutation::{CookieMutation, MutationSet};

/// Render one staged mutation as a `Set-Cookie` header value.
pub fn render_set_cookie(m: &CookieMutation) -> String {
    let attrs = &m.attributes;
    let mut b = Cookie::build((m.name.clone(), m.value.clone()));
    if let Some(path) = &attrs.path { b = b.path(path.clone()); }
    if let Some(domain) = &attrs.domain { b = b.domain(domain.clone()); }
    if let Some(secs) = attrs.max_age { b = b.max_age(cookie::time::Duration::seconds(secs)); }
    if attrs.secure { b = b.secure(true); }
    if attrs.http_only { b = b.http_only(true); }
    if let Some(ss) = attrs.same_site { b = b.same_site(ss); }
    b.build().to_string()
}

fn set_cookie_name(hv: &HeaderValue) -> Option<String> {
    let raw = hv.to_str().ok()?;
    Cookie::parse(raw).ok().map(|c| c.name().to_string())
}

/// Apply a mutation set onto outgoing response headers.
///
/// Existing `Set-Cookie` headers for names in the set are replaced, so flushing
/// the same set again leaves the headers unchanged. Headers for other names are
/// kept in front. A mutation that cannot be encoded is logged and skipped.
/// Returns the number of `Set-Cookie` headers written for the set.
pub fn flush(headers: &mut HeaderMap, set: &MutationSet) -> usize {
    if set.is_empty() { return 0; }
    let names: HashSet<&str> = set.names().collect();
    let kept: Vec<HeaderValue> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter(|hv| set_cookie_name(hv).map(|n| !names.contains(n.as_str())).unwrap_or(true))
        .cloned()
        .collect();
    headers.remove(SET_COOKIE);
    for hv in kept { headers.append(SET_COOKIE, hv); }

    let mut written = 0usize;
    for m in set.iter() {
        match HeaderValue::from_str(&render_set_cookie(m)) {
            Ok(hv) => {
                headers.append(SET_COOKIE, hv);
                written += 1;
            }
            Err(e) => warn!(cookie = %m.name, "dropping cookie mutation that is not a valid header value: {}", e),
        }
    }
    written
}
