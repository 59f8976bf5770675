//! Cache key derivation from request identity.

use axum::http::header::HOST;
use axum::http::{HeaderMap, Method, Uri};

/// Key used against a local store: method, path and canonical query.
pub fn local_key(method: &Method, uri: &Uri) -> String {
    let mut key = format!("{}{}", method, uri.path());
    push_query(&mut key, uri.query());
    key
}

/// Key used against a remote cache: method, scheme, host, path and canonical
/// query. Scheme and host keep several origins apart on one shared cache.
pub fn remote_key(method: &Method, uri: &Uri, headers: &HeaderMap) -> String {
    let scheme = uri.scheme_str().unwrap_or_default();
    let host = uri
        .authority()
        .map(|authority| authority.as_str())
        .or_else(|| headers.get(HOST).and_then(|value| value.to_str().ok()))
        .unwrap_or_default();

    let mut key = format!("{}{}{}{}", method, scheme, host, uri.path());
    push_query(&mut key, uri.query());
    key
}

fn push_query(key: &mut String, query: Option<&str>) {
    let canonical = canonical_query(query.unwrap_or_default());
    if !canonical.is_empty() {
        key.push('?');
        key.push_str(&canonical);
    }
}

/// Sorts the query pairs so that parameter order does not split the cache.
fn canonical_query(query: &str) -> String {
    let mut pairs: Vec<&str> = query.split('&').filter(|pair| !pair.is_empty()).collect();
    pairs.sort_unstable();
    pairs.join("&")
}
