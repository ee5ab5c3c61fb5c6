//! The client session and its per-call builder.
//!
//! [`HttpClient`] owns the long-lived state: default and persistent options,
//! persistent headers, and the cached transport and cookie jar. Every request
//! goes through a [`Call`], an owned builder that stages one-time options,
//! headers and cookies. Because staged overrides live in the `Call` value and
//! not in the client, concurrent callers can never see each other's
//! overrides, and a failed call leaves nothing behind.
//!
//! # Resource reuse
//!
//! | Staged one-time option | Transport | Jar |
//! |------------------------|-----------|-----|
//! | none, or only request-level (`OPT_REFERER`, redirects, ...) | cached | cached |
//! | transport-affecting (`OPT_TIMEOUT`, `OPT_PROXY`, ...) | built for this call | cached |
//! | `OPT_COOKIEJAR` | cached | built for this call |
//!
//! Resources built for a single call are never written back to the cache.

use super::engine::Engine;
use super::jar::{build_jar, SharedJar};
use super::redirect::RedirectPolicy;
use super::request::{Headers, RequestBody};
use super::transport::Transport;
use crate::error::Result;
use crate::options::{
    affects_jar, affects_transport, resolve_layers, Defaults, Opt, OptionMap, OptionValue,
};
use crate::protocol::{header_name, header_value, merge_headers};
use cookie::Cookie;
use http::{HeaderMap, Method};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

struct SessionState {
    options: OptionMap,
    headers: Headers,
    transport: Option<Arc<Transport>>,
    // `Some(None)` caches the decision not to keep cookies
    jar: Option<Option<SharedJar>>,
}

impl SessionState {
    fn invalidate_for(&mut self, opt: Opt) {
        if affects_transport(opt) {
            self.transport = None;
        }
        if affects_jar(opt) {
            self.jar = None;
        }
    }
}

struct Inner {
    defaults: Defaults,
    state: Mutex<SessionState>,
    engine: Engine,
}

/// HTTP client configured through CURL-like options.
///
/// Cloning is cheap; clones share options, headers and cached resources.
///
/// # Examples
///
/// ```no_run
/// use curlopt_client::{HttpClient, Opt, OptionMap};
///
/// # async fn run() -> curlopt_client::Result<()> {
/// let client = HttpClient::new(OptionMap::new().with(Opt::Timeout, 10));
///
/// // persistent options apply to every call
/// let response = client.get("http://example.com/", [("q", "rust")]).await?;
/// println!("{}", response.status());
///
/// // one-time overrides apply to this call only
/// let response = client
///     .with_option(Opt::TimeoutMs, 500)
///     .with_header("X-Request-Id", "42")
///     .get("http://example.com/slow", [("page", "2")])
///     .await?;
/// println!("{}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<Inner>,
}

impl HttpClient {
    /// Create a client with the builtin defaults and the given persistent options.
    pub fn new(options: OptionMap) -> Self {
        Self::with_defaults(Defaults::builtin(), options)
    }

    /// Create a client with an explicit default layer.
    pub fn with_defaults(defaults: Defaults, options: OptionMap) -> Self {
        HttpClient {
            inner: Arc::new(Inner {
                defaults,
                state: Mutex::new(SessionState {
                    options,
                    headers: Headers::new(),
                    transport: None,
                    jar: None,
                }),
                engine: Engine::new(),
            }),
        }
    }

    /// The default layer.
    pub fn defaults(&self) -> &Defaults {
        &self.inner.defaults
    }

    /// Snapshot of the persistent options.
    pub fn options(&self) -> OptionMap {
        self.inner.state.lock().options.clone()
    }

    /// Set a persistent option. Cached resources it affects are dropped.
    pub fn set_option(&self, opt: Opt, value: impl Into<OptionValue>) {
        let mut state = self.inner.state.lock();
        state.options.set(opt, value);
        state.invalidate_for(opt);
    }

    /// Set several persistent options.
    pub fn set_options(&self, options: OptionMap) {
        let mut state = self.inner.state.lock();
        for (opt, value) in options {
            state.options.set(opt, value);
            state.invalidate_for(opt);
        }
    }

    /// Remove a persistent option.
    pub fn remove_option(&self, opt: Opt) -> Option<OptionValue> {
        let mut state = self.inner.state.lock();
        let previous = state.options.remove(opt);
        if previous.is_some() {
            state.invalidate_for(opt);
        }
        previous
    }

    /// Snapshot of the persistent headers (names lowercased).
    pub fn headers(&self) -> Headers {
        self.inner.state.lock().headers.clone()
    }

    /// Set a persistent header.
    ///
    /// # Errors
    ///
    /// [`ClientError::InvalidHeader`](crate::ClientError::InvalidHeader) when
    /// the name or value cannot be sent; the client is left unchanged.
    pub fn set_header(&self, name: impl AsRef<str>, value: impl Into<String>) -> Result<()> {
        let name = header_name(name.as_ref())?;
        let value = value.into();
        header_value(name.as_str(), &value)?;
        self.inner
            .state
            .lock()
            .headers
            .insert(name.as_str().to_string(), value);
        Ok(())
    }

    /// Remove a persistent header.
    pub fn remove_header(&self, name: impl AsRef<str>) -> Option<String> {
        self.inner
            .state
            .lock()
            .headers
            .remove(&name.as_ref().to_ascii_lowercase())
    }

    /// Drop the cached transport and cookie jar; the next call rebuilds both.
    pub fn invalidate(&self) {
        let mut state = self.inner.state.lock();
        state.transport = None;
        state.jar = None;
    }

    /// Identity of the cached transport, if one has been built.
    pub fn cached_transport_id(&self) -> Option<u64> {
        self.inner.state.lock().transport.as_ref().map(|t| t.id())
    }

    /// Start a call with no overrides.
    pub fn call(&self) -> Call {
        Call::new(self.clone())
    }

    /// Start a call with a one-time option.
    pub fn with_option(&self, opt: Opt, value: impl Into<OptionValue>) -> Call {
        self.call().with_option(opt, value)
    }

    /// Start a call with several one-time options.
    pub fn with_options(&self, options: OptionMap) -> Call {
        self.call().with_options(options)
    }

    /// Start a call with a one-time header.
    pub fn with_header(&self, name: impl Into<String>, value: impl Into<String>) -> Call {
        self.call().with_header(name, value)
    }

    /// Start a call with several one-time headers.
    pub fn with_headers<I, K, V>(&self, headers: I) -> Call
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.call().with_headers(headers)
    }

    /// Start a call with a one-time cookie.
    pub fn with_cookie(&self, cookie: Cookie<'static>) -> Call {
        self.call().with_cookie(cookie)
    }

    /// Send a request with no one-time overrides.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        headers: &Headers,
        body: impl Into<RequestBody>,
    ) -> Result<reqwest::Response> {
        self.call().send(method, url, headers, body).await
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(OptionMap::new())
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("HttpClient")
            .field("options", &state.options)
            .field("headers", &state.headers)
            .field("transport", &state.transport.as_ref().map(|t| t.id()))
            .finish_non_exhaustive()
    }
}

/// One request's worth of staged overrides.
///
/// Created by [`HttpClient::call`] or any `with_*` method on the client and
/// consumed by a terminal operation (`send`, `get`, `post`,
/// `post_multipart`, `resolve`). Dropping it discards the overrides.
#[must_use = "a call does nothing until it is sent"]
pub struct Call {
    client: HttpClient,
    options: OptionMap,
    headers: Vec<(String, String)>,
    cookies: Vec<Cookie<'static>>,
    reuse_transport: bool,
    reuse_jar: bool,
}

impl Call {
    fn new(client: HttpClient) -> Self {
        Call {
            client,
            options: OptionMap::new(),
            headers: Vec::new(),
            cookies: Vec::new(),
            reuse_transport: true,
            reuse_jar: true,
        }
    }

    /// Stage a one-time option.
    pub fn with_option(mut self, opt: Opt, value: impl Into<OptionValue>) -> Self {
        if affects_transport(opt) {
            self.reuse_transport = false;
        }
        if affects_jar(opt) {
            self.reuse_jar = false;
        }
        self.options.set(opt, value);
        self
    }

    /// Stage several one-time options.
    pub fn with_options(self, options: OptionMap) -> Self {
        options
            .into_iter()
            .fold(self, |call, (opt, value)| call.with_option(opt, value))
    }

    /// Stage a one-time header; it wins over a persistent header of the same name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Stage several one-time headers.
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Stage a cookie sent with this request only.
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Whether this call will use the client's cached transport.
    pub fn reuses_transport(&self) -> bool {
        self.reuse_transport
    }

    /// Whether this call will use the client's cached cookie jar.
    pub fn reuses_jar(&self) -> bool {
        self.reuse_jar
    }

    /// Merge the option layers and acquire the transport, jar and redirect
    /// policy for this call, consuming the staged overrides.
    ///
    /// The client's state lock is held only for the merge and acquisition and
    /// is released on every path, including errors.
    pub fn resolve(self) -> Result<Resolved> {
        let Call {
            client,
            options: one_time,
            headers: one_time_headers,
            cookies,
            reuse_transport,
            reuse_jar,
        } = self;
        let inner = &client.inner;

        let (options, headers, transport, jar) = {
            let mut guard = inner.state.lock();
            let state = &mut *guard;

            let options = resolve_layers(inner.defaults.options(), &state.options, &one_time);
            let headers = merge_headers([
                state
                    .headers
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect::<Vec<_>>(),
                one_time_headers
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect(),
            ])?;

            let cached = if reuse_transport { state.transport.clone() } else { None };
            let transport = match cached {
                Some(transport) => {
                    tracing::debug!(id = transport.id(), "reusing cached transport");
                    transport
                }
                None => {
                    let transport = Arc::new(Transport::from_options(&options)?);
                    if reuse_transport {
                        state.transport = Some(transport.clone());
                    }
                    transport
                }
            };

            let cached = if reuse_jar { state.jar.clone() } else { None };
            let jar = match cached {
                Some(jar) => jar,
                None => {
                    let jar = build_jar(&options)?;
                    if reuse_jar {
                        state.jar = Some(jar.clone());
                    }
                    jar
                }
            };

            (options, headers, transport, jar)
        };

        let redirect = RedirectPolicy::from_options(&options)?;

        Ok(Resolved {
            client,
            options,
            headers,
            cookies,
            transport,
            jar,
            redirect,
        })
    }

    /// Send the request; the generic form behind every helper.
    pub async fn send(
        self,
        method: Method,
        url: &str,
        headers: &Headers,
        body: impl Into<RequestBody>,
    ) -> Result<reqwest::Response> {
        let resolved = self.resolve()?;
        let request = resolved.prepare(method, url, headers, body.into())?;
        resolved.client.inner.engine.execute(&resolved, request).await
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("options", &self.options)
            .field("headers", &self.headers)
            .field("cookies", &self.cookies.len())
            .field("reuse_transport", &self.reuse_transport)
            .field("reuse_jar", &self.reuse_jar)
            .finish()
    }
}

/// Everything needed to build and execute exactly one request.
pub struct Resolved {
    client: HttpClient,
    options: OptionMap,
    headers: HeaderMap,
    cookies: Vec<Cookie<'static>>,
    transport: Arc<Transport>,
    jar: Option<SharedJar>,
    redirect: RedirectPolicy,
}

impl Resolved {
    /// The merged option map.
    pub fn options(&self) -> &OptionMap {
        &self.options
    }

    /// Persistent and one-time headers, merged.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// One-time cookies.
    pub fn cookies(&self) -> &[Cookie<'static>] {
        &self.cookies
    }

    /// The transport used for this call.
    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    /// The cookie jar used for this call.
    pub fn jar(&self) -> Option<&SharedJar> {
        self.jar.as_ref()
    }

    /// The redirect policy used for this call.
    pub fn redirect(&self) -> &RedirectPolicy {
        &self.redirect
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolved")
            .field("options", &self.options)
            .field("headers", &self.headers)
            .field("transport", &self.transport)
            .field("jar", &self.jar.is_some())
            .field("redirect", &self.redirect)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use std::time::Duration;

    #[test]
    fn test_request_level_option_keeps_transport() {
        let client = HttpClient::new(OptionMap::new());
        let first = client.call().resolve().unwrap();

        let call = client.with_option(Opt::Referer, "http://origin/");
        assert!(call.reuses_transport());
        let second = call.resolve().unwrap();
        assert!(Arc::ptr_eq(first.transport(), second.transport()));
    }

    #[test]
    fn test_transport_option_forces_rebuild() {
        let client = HttpClient::new(OptionMap::new());
        let first = client.call().resolve().unwrap();

        let call = client.with_option(Opt::TimeoutMs, 500);
        assert!(!call.reuses_transport());
        assert!(call.reuses_jar());
        let second = call.resolve().unwrap();
        assert!(!Arc::ptr_eq(first.transport(), second.transport()));
        assert_eq!(second.transport().timeout(), Some(Duration::from_millis(500)));

        // the one-off transport is not cached
        let third = client.call().resolve().unwrap();
        assert!(Arc::ptr_eq(first.transport(), third.transport()));
        assert_eq!(client.cached_transport_id(), Some(first.transport().id()));
    }

    #[test]
    fn test_jar_option_forces_new_jar() {
        let client = HttpClient::new(OptionMap::new());
        let first = client.call().resolve().unwrap();
        assert!(first.jar().is_some());

        let call = client.with_option(Opt::CookieJar, false);
        assert!(call.reuses_transport());
        assert!(!call.reuses_jar());
        let second = call.resolve().unwrap();
        assert!(second.jar().is_none());

        let third = client.call().resolve().unwrap();
        assert!(Arc::ptr_eq(first.jar().unwrap(), third.jar().unwrap()));
    }

    #[test]
    fn test_one_time_options_win() {
        let client = HttpClient::new(OptionMap::new().with(Opt::UserAgent, "persistent"));
        let resolved = client.with_option(Opt::UserAgent, "one-time").resolve().unwrap();
        assert_eq!(
            resolved.options().get(Opt::UserAgent).and_then(|v| v.as_str()),
            Some("one-time")
        );

        let resolved = client.call().resolve().unwrap();
        assert_eq!(
            resolved.options().get(Opt::UserAgent).and_then(|v| v.as_str()),
            Some("persistent")
        );
    }

    #[test]
    fn test_one_time_headers_win() {
        let client = HttpClient::default();
        client.set_header("X-Mode", "persistent").unwrap();
        client.set_header("X-Keep", "yes").unwrap();

        let resolved = client.with_header("x-mode", "one-time").resolve().unwrap();
        assert_eq!(resolved.headers()["x-mode"], "one-time");
        assert_eq!(resolved.headers()["x-keep"], "yes");

        let resolved = client.call().resolve().unwrap();
        assert_eq!(resolved.headers()["x-mode"], "persistent");
    }

    #[test]
    fn test_failed_resolve_leaves_client_usable() {
        let client = HttpClient::default();
        let err = client.with_option(Opt::TimeoutMs, "soon").resolve().unwrap_err();
        assert!(matches!(err, ClientError::InvalidOptionType { option: Opt::TimeoutMs, .. }));

        let resolved = client.call().resolve().unwrap();
        assert_eq!(resolved.transport().timeout(), None);
    }

    #[test]
    fn test_invalid_persistent_header_rejected() {
        let client = HttpClient::default();
        client.set_header("X-Ok", "1").unwrap();

        let err = client.set_header("bad header", "x").unwrap_err();
        assert!(matches!(err, ClientError::InvalidHeader(_)));
        let err = client.set_header("X-Bad", "line\nbreak").unwrap_err();
        assert!(matches!(err, ClientError::InvalidHeader(_)));

        assert_eq!(client.headers().len(), 1);
        let resolved = client.call().resolve().unwrap();
        assert_eq!(resolved.headers()["x-ok"], "1");
    }

    #[test]
    fn test_persistent_change_invalidates_cache() {
        let client = HttpClient::default();
        let first = client.call().resolve().unwrap();

        client.set_option(Opt::Referer, "http://r/");
        let second = client.call().resolve().unwrap();
        assert!(Arc::ptr_eq(first.transport(), second.transport()));

        client.set_option(Opt::Timeout, 5);
        assert_eq!(client.cached_transport_id(), None);
        let third = client.call().resolve().unwrap();
        assert!(!Arc::ptr_eq(first.transport(), third.transport()));
        assert_eq!(third.transport().timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_invalidate_drops_both() {
        let client = HttpClient::default();
        let first = client.call().resolve().unwrap();
        client.invalidate();
        let second = client.call().resolve().unwrap();
        assert!(!Arc::ptr_eq(first.transport(), second.transport()));
        assert!(!Arc::ptr_eq(first.jar().unwrap(), second.jar().unwrap()));
    }

    #[test]
    fn test_with_options_classifies_each() {
        let client = HttpClient::default();
        let call = client.with_options(
            OptionMap::new()
                .with(Opt::MaxRedirs, 2)
                .with(Opt::CookieJar, true),
        );
        assert!(call.reuses_transport());
        assert!(!call.reuses_jar());
    }

    #[test]
    fn test_redirect_policy_resolved() {
        let client = HttpClient::default();
        let resolved = client.with_option(Opt::MaxRedirs, 3).resolve().unwrap();
        assert!(matches!(
            resolved.redirect(),
            RedirectPolicy::Limited { follow: true, max: 3 }
        ));
    }
}
