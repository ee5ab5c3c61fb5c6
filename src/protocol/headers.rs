//! Header merging and `Cookie` header formatting.
//!
//! Header maps are merged layer by layer with case-insensitive names: a later
//! layer replaces every value an earlier layer had for the same name.
//!
//! # Examples
//!
//! ```
//! use curlopt_client::protocol::merge_headers;
//!
//! let persistent = vec![("Accept", "text/html"), ("X-Trace", "1")];
//! let one_time = vec![("accept", "application/json")];
//! let merged = merge_headers([persistent, one_time]).unwrap();
//! assert_eq!(merged["accept"], "application/json");
//! assert_eq!(merged["x-trace"], "1");
//! ```

use crate::error::{ClientError, Result};
use cookie::Cookie;
use http::header::{HeaderMap, HeaderName, HeaderValue};

/// Parse a header name.
pub fn header_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ClientError::InvalidHeader(format!("bad name {name:?}")))
}

/// Parse a header value.
pub fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| ClientError::InvalidHeader(format!("bad value for {name:?}")))
}

/// Set `name: value`, replacing any existing values for `name`.
pub fn set_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    headers.insert(header_name(name)?, header_value(name, value)?);
    Ok(())
}

/// Merge header layers; later layers win.
pub fn merge_headers<L, K, V>(layers: impl IntoIterator<Item = L>) -> Result<HeaderMap>
where
    L: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut merged = HeaderMap::new();
    for layer in layers {
        for (name, value) in layer {
            set_header(&mut merged, name.as_ref(), value.as_ref())?;
        }
    }
    Ok(merged)
}

/// Build the `Cookie` header for a request carrying one-time cookies.
///
/// The parts are joined in order: an explicit `Cookie` header, the jar's
/// cookies for the URL, then the one-time cookies. Returns `None` when there is
/// nothing to send.
pub fn cookie_header(
    explicit: Option<&HeaderValue>,
    from_jar: Option<&HeaderValue>,
    cookies: &[Cookie<'static>],
) -> Result<Option<HeaderValue>> {
    let mut parts: Vec<String> = Vec::new();
    for value in [explicit, from_jar].into_iter().flatten() {
        let value = value
            .to_str()
            .map_err(|_| ClientError::InvalidHeader("non-ASCII cookie header".to_string()))?;
        if !value.is_empty() {
            parts.push(value.to_string());
        }
    }
    parts.extend(cookies.iter().map(|c| format!("{}={}", c.name(), c.value())));

    if parts.is_empty() {
        return Ok(None);
    }
    header_value("cookie", &parts.join("; ")).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_later_layer_wins() {
        let a = vec![("User-Agent", "a"), ("X-One", "1")];
        let b = vec![("user-agent", "b")];
        let merged = merge_headers([a, b]).unwrap();
        assert_eq!(merged["user-agent"], "b");
        assert_eq!(merged["x-one"], "1");
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_merge_owned_strings() {
        let layer = vec![("X-Id".to_string(), "7".to_string())];
        let merged = merge_headers([layer]).unwrap();
        assert_eq!(merged["x-id"], "7");
    }

    #[test]
    fn test_invalid_header_name() {
        let layer = [("bad header", "x")];
        assert!(matches!(merge_headers([layer]), Err(ClientError::InvalidHeader(_))));
    }

    #[test]
    fn test_invalid_header_value() {
        let layer = [("X-Bad", "line\nbreak")];
        assert!(matches!(merge_headers([layer]), Err(ClientError::InvalidHeader(_))));
    }

    #[test]
    fn test_cookie_header_joins_parts() {
        let jar = HeaderValue::from_static("session=abc");
        let cookies = [Cookie::new("flavor", "oat")];
        let header = cookie_header(None, Some(&jar), &cookies).unwrap().unwrap();
        assert_eq!(header, "session=abc; flavor=oat");
    }

    #[test]
    fn test_cookie_header_with_explicit() {
        let explicit = HeaderValue::from_static("a=1");
        let cookies = [Cookie::new("b", "2"), Cookie::new("c", "3")];
        let header = cookie_header(Some(&explicit), None, &cookies).unwrap().unwrap();
        assert_eq!(header, "a=1; b=2; c=3");
    }

    #[test]
    fn test_cookie_header_empty() {
        assert!(cookie_header(None, None, &[]).unwrap().is_none());
    }
}
