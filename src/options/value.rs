//! Option values and the option map.

use super::Opt;
use crate::client::{ProxyKind, RedirectRefused};
use reqwest::cookie::CookieStore;
use std::collections::hash_map;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Custom redirect decision: `(next, previous)` where `previous` starts with
/// the original request URL.
pub type RedirectFn =
    Arc<dyn Fn(&Url, &[Url]) -> std::result::Result<(), RedirectRefused> + Send + Sync>;

/// Per-request proxy selector returning the proxy kind and `host:port`.
///
/// The selector is consulted for the first request, for every redirect hop
/// and again while connecting, so it must be pure: the same URL must always
/// get the same answer.
pub type ProxyFn = Arc<dyn Fn(&Url) -> anyhow::Result<(ProxyKind, String)> + Send + Sync>;

/// The value held by an option.
#[derive(Clone)]
pub enum OptionValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer (timeouts in their unit, counts, proxy kinds).
    Int(i64),
    /// String (addresses, header values).
    Str(String),
    /// Duration, accepted wherever a timeout is expected.
    Duration(Duration),
    /// Caller-supplied cookie store.
    CookieJar(Arc<dyn CookieStore>),
    /// Custom redirect policy.
    RedirectPolicy(RedirectFn),
    /// Proxy selector.
    ProxyFunc(ProxyFn),
}

impl OptionValue {
    /// Wrap a redirect decision function.
    pub fn redirect_policy<F>(f: F) -> Self
    where
        F: Fn(&Url, &[Url]) -> std::result::Result<(), RedirectRefused> + Send + Sync + 'static,
    {
        OptionValue::RedirectPolicy(Arc::new(f))
    }

    /// Wrap a proxy selector.
    ///
    /// `f` may be called more than once for the same URL and must return the
    /// same answer each time. An error, or a kind other than
    /// [`ProxyKind::Http`], fails the call.
    pub fn proxy_func<F>(f: F) -> Self
    where
        F: Fn(&Url) -> anyhow::Result<(ProxyKind, String)> + Send + Sync + 'static,
    {
        OptionValue::ProxyFunc(Arc::new(f))
    }

    /// Wrap a cookie store.
    pub fn cookie_jar<C: CookieStore + 'static>(store: Arc<C>) -> Self {
        OptionValue::CookieJar(store)
    }

    /// The value as a bool, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The value as an integer, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            OptionValue::Bool(_) => "bool",
            OptionValue::Int(_) => "int",
            OptionValue::Str(_) => "string",
            OptionValue::Duration(_) => "duration",
            OptionValue::CookieJar(_) => "cookie jar",
            OptionValue::RedirectPolicy(_) => "redirect policy",
            OptionValue::ProxyFunc(_) => "proxy function",
        }
    }
}

impl fmt::Debug for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            OptionValue::Int(n) => f.debug_tuple("Int").field(n).finish(),
            OptionValue::Str(s) => f.debug_tuple("Str").field(s).finish(),
            OptionValue::Duration(d) => f.debug_tuple("Duration").field(d).finish(),
            other => write!(f, "<{}>", other.kind()),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(i64::from(value))
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        OptionValue::Int(i64::from(value))
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Str(value)
    }
}

impl From<Duration> for OptionValue {
    fn from(value: Duration) -> Self {
        OptionValue::Duration(value)
    }
}

impl From<ProxyKind> for OptionValue {
    fn from(value: ProxyKind) -> Self {
        OptionValue::Int(value.code())
    }
}

/// A mapping from option to value; one option layer.
#[derive(Debug, Clone, Default)]
pub struct OptionMap(HashMap<Opt, OptionValue>);

impl OptionMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, opt: Opt, value: impl Into<OptionValue>) -> Self {
        self.0.insert(opt, value.into());
        self
    }

    /// Insert or replace a value, returning the previous one.
    pub fn set(&mut self, opt: Opt, value: impl Into<OptionValue>) -> Option<OptionValue> {
        self.0.insert(opt, value.into())
    }

    /// Look a value up.
    pub fn get(&self, opt: Opt) -> Option<&OptionValue> {
        self.0.get(&opt)
    }

    /// Remove a value.
    pub fn remove(&mut self, opt: Opt) -> Option<OptionValue> {
        self.0.remove(&opt)
    }

    /// Whether the option is present.
    pub fn contains(&self, opt: Opt) -> bool {
        self.0.contains_key(&opt)
    }

    /// Number of options present.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no option is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the entries in arbitrary order.
    pub fn iter(&self) -> hash_map::Iter<'_, Opt, OptionValue> {
        self.0.iter()
    }

    /// Copy every entry of `other` over this map.
    pub fn merge_from(&mut self, other: &OptionMap) {
        for (opt, value) in other.iter() {
            self.0.insert(*opt, value.clone());
        }
    }
}

impl FromIterator<(Opt, OptionValue)> for OptionMap {
    fn from_iter<I: IntoIterator<Item = (Opt, OptionValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<(Opt, OptionValue)> for OptionMap {
    fn extend<I: IntoIterator<Item = (Opt, OptionValue)>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for OptionMap {
    type Item = (Opt, OptionValue);
    type IntoIter = hash_map::IntoIter<Opt, OptionValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a OptionMap {
    type Item = (&'a Opt, &'a OptionValue);
    type IntoIter = hash_map::Iter<'a, Opt, OptionValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
