//! Header-based rules and `Cache-Control` parsing.

use std::convert::Infallible;

use axum::http::header::{HeaderName, HeaderValue, AUTHORIZATION, CACHE_CONTROL, PROXY_AUTHENTICATE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::response::{IntoResponseParts, ResponseParts};

use super::Rule;
use crate::engine::RecordedResponse;

/// Reserved marker a handler sets on its response to opt out of caching.
/// Also honored on requests.
pub const NO_CACHE_HEADER: HeaderName = HeaderName::from_static("x-no-cache");

const MAX_AGE_DIRECTIVE: &str = "max-age=";

// == Cache-Control ==
/// Parses the first `max-age=<seconds>` directive of a `Cache-Control` value.
///
/// Returns `None` when the directive is absent or has no digits.
pub fn parse_max_age(header: &str) -> Option<u64> {
    header.split(',').find_map(|directive| {
        let directive = directive.trim();
        let value = directive
            .get(..MAX_AGE_DIRECTIVE.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(MAX_AGE_DIRECTIVE))
            .map(|_| directive[MAX_AGE_DIRECTIVE.len()..].trim_matches('"'))?;

        let digits_end = value
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(value.len());
        value[..digits_end].parse().ok()
    })
}

/// Lower-cased `Cache-Control` directives across every header value.
fn cache_control_directives(headers: &HeaderMap) -> impl Iterator<Item = String> + '_ {
    headers
        .get_all(CACHE_CONTROL)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|directive| directive.trim().to_ascii_lowercase())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

// == No Cache ==
/// Marks a response as non-cacheable regardless of the rule set outcome.
pub fn no_cache(headers: &mut HeaderMap) {
    headers.insert(NO_CACHE_HEADER, HeaderValue::from_static("true"));
}

/// Response part that marks a handler's response as non-cacheable.
///
/// ```ignore
/// async fn handler() -> impl IntoResponse {
///     (NoCache, "always fresh")
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct NoCache;

impl IntoResponseParts for NoCache {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        no_cache(res.headers_mut());
        Ok(res)
    }
}

// == Rules ==
/// Denies requests carrying credentials; a shared cache must not answer them.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationRule;

impl Rule<Parts> for AuthorizationRule {
    fn evaluate(&self, request: &Parts) -> bool {
        !request.headers.contains_key(AUTHORIZATION)
            && !request.headers.contains_key(PROXY_AUTHENTICATE)
    }
}

/// Denies requests that ask for revalidation with the origin.
///
/// Looks at `Cache-Control` directives and at the bare `Must-Revalidate`,
/// `S-Maxage` and `Max-Age` headers some clients send.
#[derive(Debug, Clone, Copy)]
pub struct RevalidationRule;

impl Rule<Parts> for RevalidationRule {
    fn evaluate(&self, request: &Parts) -> bool {
        let headers = &request.headers;

        let directive_denies = cache_control_directives(headers).any(|directive| {
            matches!(directive.as_str(), "must-revalidate" | "s-maxage=0" | "max-age=0")
        });
        if directive_denies {
            return false;
        }

        header_str(headers, "must-revalidate").map_or(true, str::is_empty)
            && header_str(headers, "s-maxage") != Some("0")
            && header_str(headers, "max-age") != Some("0")
    }
}

/// Denies anything carrying the [`NO_CACHE_HEADER`] marker.
#[derive(Debug, Clone, Copy)]
pub struct NoCacheRule;

impl Rule<Parts> for NoCacheRule {
    fn evaluate(&self, request: &Parts) -> bool {
        !request.headers.contains_key(NO_CACHE_HEADER)
    }
}

impl Rule<RecordedResponse> for NoCacheRule {
    fn evaluate(&self, response: &RecordedResponse) -> bool {
        !response.headers().contains_key(NO_CACHE_HEADER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use axum::response::{IntoResponse, Response};

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_parse_max_age() {
        assert_eq!(parse_max_age("max-age=60"), Some(60));
        assert_eq!(parse_max_age("public, max-age=3600, must-revalidate"), Some(3600));
        assert_eq!(parse_max_age("Max-Age=5"), Some(5));
        assert_eq!(parse_max_age("max-age=\"20\""), Some(20));
    }

    #[test]
    fn test_parse_max_age_unknown() {
        assert_eq!(parse_max_age(""), None);
        assert_eq!(parse_max_age("no-store"), None);
        assert_eq!(parse_max_age("max-age=abc"), None);
        assert_eq!(parse_max_age("s-maxage=30"), None);
    }

    #[test]
    fn test_parse_max_age_first_numeric_match() {
        assert_eq!(parse_max_age("max-age=, max-age=15"), Some(15));
        assert_eq!(parse_max_age("max-age=10, max-age=20"), Some(10));
    }

    #[test]
    fn test_revalidation_rule_legacy_headers() {
        assert!(!RevalidationRule.evaluate(&parts(&[("must-revalidate", "1")])));
        assert!(!RevalidationRule.evaluate(&parts(&[("s-maxage", "0")])));
        assert!(!RevalidationRule.evaluate(&parts(&[("max-age", "0")])));
        assert!(RevalidationRule.evaluate(&parts(&[("max-age", "10")])));
    }

    #[test]
    fn test_no_cache_sets_marker() {
        let mut headers = HeaderMap::new();
        no_cache(&mut headers);
        assert_eq!(headers.get(NO_CACHE_HEADER).unwrap(), "true");
    }

    #[test]
    fn test_no_cache_response_part() {
        let response: Response = (NoCache, "fresh").into_response();
        assert!(response.headers().contains_key(NO_CACHE_HEADER));
    }
}
