//! Cookie store selection.
//!
//! `OPT_COOKIEJAR` is either a bool (`true` for a fresh in-memory jar) or a
//! caller-supplied store. Stores are shared between concurrent calls, so they
//! must synchronize internally; `reqwest::cookie::Jar` does.

use crate::error::{ClientError, Result};
use crate::options::{Opt, OptionMap, OptionValue};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use std::sync::Arc;
use url::Url;

/// A cookie store shared across calls.
pub type SharedJar = Arc<dyn CookieStore>;

/// Build the cookie store for a resolved option map.
///
/// Returns `None` when cookies are not persisted across calls.
pub fn build_jar(options: &OptionMap) -> Result<Option<SharedJar>> {
    match options.get(Opt::CookieJar) {
        None | Some(OptionValue::Bool(false)) => Ok(None),
        Some(OptionValue::Bool(true)) => {
            tracing::debug!("built in-memory cookie jar");
            Ok(Some(Arc::new(Jar::default())))
        }
        Some(OptionValue::CookieJar(store)) => Ok(Some(store.clone())),
        Some(_) => Err(ClientError::InvalidCookieJar),
    }
}

/// Identity of a jar, stable while the jar is alive.
pub(crate) fn jar_key(jar: &SharedJar) -> usize {
    Arc::as_ptr(jar) as *const () as usize
}

/// Adapter handing a shared `dyn` store to the engine, which wants a sized type.
pub(crate) struct JarHandle(pub(crate) SharedJar);

impl CookieStore for JarHandle {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        self.0.set_cookies(cookie_headers, url)
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.0.cookies(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_true_builds_jar() {
        let options = OptionMap::new().with(Opt::CookieJar, true);
        let jar = build_jar(&options).unwrap().unwrap();
        let url = Url::parse("http://example.com/").unwrap();
        let set = HeaderValue::from_static("session=abc; Path=/");
        jar.set_cookies(&mut std::iter::once(&set), &url);
        assert_eq!(jar.cookies(&url).unwrap(), "session=abc");
    }

    #[test]
    fn test_false_or_absent_is_none() {
        let options = OptionMap::new().with(Opt::CookieJar, false);
        assert!(build_jar(&options).unwrap().is_none());
        assert!(build_jar(&OptionMap::new()).unwrap().is_none());
    }

    #[test]
    fn test_supplied_store_used_as_is() {
        let store = Arc::new(Jar::default());
        let url = Url::parse("http://example.com/").unwrap();
        store.add_cookie_str("k=v", &url);

        let options = OptionMap::new().with(Opt::CookieJar, OptionValue::cookie_jar(store));
        let jar = build_jar(&options).unwrap().unwrap();
        assert_eq!(jar.cookies(&url).unwrap(), "k=v");
    }

    #[test]
    fn test_invalid_value() {
        let options = OptionMap::new().with(Opt::CookieJar, "yes");
        assert!(matches!(build_jar(&options), Err(ClientError::InvalidCookieJar)));
    }

    #[test]
    fn test_jar_key_stable_across_clones() {
        let jar: SharedJar = Arc::new(Jar::default());
        assert_eq!(jar_key(&jar), jar_key(&jar.clone()));
    }
}
