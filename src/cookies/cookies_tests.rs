use super::*;
use axum::http::{header::{COOKIE, SET_COOKIE}, HeaderMap, HeaderValue};

fn headers_with_cookies(values: &[&str]) -> HeaderMap {
    let mut h = HeaderMap::new();
    for v in values { h.append(COOKIE, HeaderValue::from_str(v).unwrap()); }
    h
}

fn set_cookie_lines(h: &HeaderMap) -> Vec<String> {
    h.get_all(SET_COOKIE).iter().map(|v| v.to_str().unwrap().to_string()).collect()
}

#[test]
fn reader_parses_pairs_in_order() {
    let h = headers_with_cookies(&["sb-abcd-auth-token=validtoken; theme=dark", "lang=en"]);
    let c = RequestCookies::from_headers(&h);
    assert_eq!(c.len(), 3);
    assert_eq!(c.get("sb-abcd-auth-token"), Some("validtoken"));
    assert_eq!(c.get("lang"), Some("en"));
    let names: Vec<&str> = c.get_all().iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["sb-abcd-auth-token", "theme", "lang"]);
}

#[test]
fn reader_missing_cookie_is_none() {
    let c = RequestCookies::from_headers(&HeaderMap::new());
    assert!(c.is_empty());
    assert_eq!(c.get("anything"), None);
}

#[test]
fn reader_skips_malformed_and_keeps_first_duplicate() {
    let h = headers_with_cookies(&["novalue; a=1; =orphan; a=2; b="]);
    let c = RequestCookies::from_headers(&h);
    assert_eq!(c.get("a"), Some("1"));
    assert_eq!(c.get("b"), Some(""));
    assert_eq!(c.len(), 2);
}

#[test]
fn reader_keeps_header_with_utf8_values() {
    let mut h = HeaderMap::new();
    h.append(COOKIE, HeaderValue::from_bytes("sb-abcd-auth-token=validtoken; pref=café".as_bytes()).unwrap());
    h.append(COOKIE, HeaderValue::from_bytes(b"lang=\xff\xfe; theme=dark").unwrap());
    let c = RequestCookies::from_headers(&h);
    assert_eq!(c.get("sb-abcd-auth-token"), Some("validtoken"));
    assert_eq!(c.get("pref"), Some("café"));
    assert_eq!(c.get("theme"), Some("dark"));
    assert!(c.get("lang").is_some());
}

#[test]
fn reader_debug_hides_values() {
    let c = RequestCookies::from_pairs([("sb-x-auth-token", "supersecret")]);
    let dbg = format!("{:?}", c);
    assert!(dbg.contains("sb-x-auth-token"));
    assert!(!dbg.contains("supersecret"));
}

#[test]
fn staging_same_name_overwrites_in_place() {
    let attrs = CookieAttributes::session(true);
    let mut set = MutationSet::new();
    set.set("a", "1", &attrs);
    set.set("b", "2", &attrs);
    set.set("a", "3", &attrs);
    assert_eq!(set.len(), 2);
    assert_eq!(set.names().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(set.get("a").unwrap().value, "3");
}

#[test]
fn removal_is_empty_value_with_zero_max_age() {
    let attrs = CookieAttributes::session(true);
    let mut set = MutationSet::new();
    set.set("sb-p-auth-token", "tok", &attrs);
    set.remove("sb-p-auth-token", &attrs);
    let m = set.get("sb-p-auth-token").unwrap();
    assert!(m.is_removal());
    assert_eq!(m.value, "");
    assert_eq!(m.attributes.max_age, Some(0));
    assert_eq!(m.attributes.path.as_deref(), Some("/"));
    assert_eq!(m, &CookieMutation::set("sb-p-auth-token", "", attrs.expired()));

    let line = render_set_cookie(m);
    assert!(line.starts_with("sb-p-auth-token=;"), "{line}");
    assert!(line.contains("Max-Age=0"), "{line}");
}

#[test]
fn render_keeps_attributes() {
    let attrs = CookieAttributes {
        max_age: Some(3600),
        path: Some("/api".into()),
        domain: Some("example.com".into()),
        secure: true,
        http_only: true,
        same_site: Some(SameSite::Strict),
    };
    let line = render_set_cookie(&CookieMutation::set("k", "v", attrs));
    assert!(line.starts_with("k=v"));
    for part in ["HttpOnly", "Secure", "SameSite=Strict", "Path=/api", "Domain=example.com", "Max-Age=3600"] {
        assert!(line.contains(part), "missing {part} in {line}");
    }
}

#[test]
fn flush_is_idempotent() {
    let attrs = CookieAttributes::session(false);
    let mut set = MutationSet::new();
    set.set("sb-p-auth-token", "base64-abc", &attrs);
    set.remove("sb-p-auth-token.0", &attrs);

    let mut h = HeaderMap::new();
    h.append(SET_COOKIE, HeaderValue::from_static("theme=dark; Path=/"));
    assert_eq!(flush(&mut h, &set), 2);
    let first = set_cookie_lines(&h);
    assert_eq!(flush(&mut h, &set), 2);
    let second = set_cookie_lines(&h);
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    assert_eq!(first[0], "theme=dark; Path=/");
}

#[test]
fn flush_replaces_existing_header_for_same_name() {
    let attrs = CookieAttributes::session(false);
    let mut h = HeaderMap::new();
    h.append(SET_COOKIE, HeaderValue::from_static("sb-p-auth-token=old; Path=/"));
    let set: MutationSet = [CookieMutation::set("sb-p-auth-token", "new", attrs)].into_iter().collect();
    flush(&mut h, &set);
    let lines = set_cookie_lines(&h);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("sb-p-auth-token=new"));
}

#[test]
fn flush_empty_set_touches_nothing() {
    let mut h = HeaderMap::new();
    h.append(SET_COOKIE, HeaderValue::from_static("a=1"));
    assert_eq!(flush(&mut h, &MutationSet::new()), 0);
    assert_eq!(set_cookie_lines(&h), vec!["a=1".to_string()]);
}

#[test]
fn flush_skips_unencodable_value() {
    let attrs = CookieAttributes::default();
    let mut set = MutationSet::new();
    set.set("bad", "line\nbreak", &attrs);
    set.set("good", "ok", &attrs);
    let mut h = HeaderMap::new();
    assert_eq!(flush(&mut h, &set), 1);
    assert_eq!(set_cookie_lines(&h), vec!["good=ok".to_string()]);
}

#[test]
fn session_cookie_predicate() {
    assert!(is_session_cookie("sb-abcd-auth-token"));
    assert!(is_session_cookie("sb-abcd-auth-token.1"));
    assert!(is_session_cookie("legacy-auth-token"));
    assert!(!is_session_cookie("theme"));
}
