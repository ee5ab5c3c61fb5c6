//! Query-string and form parameter encoding.
//!
//! Parameters are kept in a `BTreeMap`, so encoding is sorted by key and
//! deterministic.
//!
//! # Examples
//!
//! ```
//! use curlopt_client::protocol::{add_params, collect_params};
//!
//! let params = collect_params([("b", "2")]);
//! assert_eq!(add_params("http://x/y?a=1", &params).unwrap(), "http://x/y?a=1&b=2");
//! assert_eq!(add_params("http://x/y", &params).unwrap(), "http://x/y?b=2");
//! ```

use super::constants::FILE_MARKER;
use crate::error::Result;
use std::collections::BTreeMap;

/// Request parameters, sorted by key.
pub type Params = BTreeMap<String, String>;

/// Collect any iterator of string pairs into [`Params`].
pub fn collect_params<I, K, V>(params: I) -> Params
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    params
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// URL-encode parameters as `application/x-www-form-urlencoded`.
pub fn encode_params(params: &Params) -> Result<String> {
    Ok(serde_urlencoded::to_string(params)?)
}

/// Append encoded parameters to a URL's query string.
///
/// An existing query is extended with `&`; a URL already ending in `?` or `&`
/// gets the parameters appended directly.
pub fn add_params(url: &str, params: &Params) -> Result<String> {
    if params.is_empty() {
        return Ok(url.to_string());
    }

    let encoded = encode_params(params)?;
    let mut url = url.to_string();
    if !url.contains('?') {
        url.push('?');
    }
    if !(url.ends_with('?') || url.ends_with('&')) {
        url.push('&');
    }
    url.push_str(&encoded);
    Ok(url)
}

/// Whether any parameter names a file to upload.
pub fn has_file_param(params: &Params) -> bool {
    params.keys().any(|k| k.starts_with(FILE_MARKER))
}
