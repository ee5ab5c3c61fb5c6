//! The closed set of CURL-like options and their classification.
//!
//! Codes follow CURL's `CURLOPT_*` numbering so option maps written against
//! libcurl constants keep their meaning. The two extra options without a CURL
//! counterpart (`OPT_REDIRECT_POLICY`, `OPT_PROXY_FUNC`) live above 100000.
//!
//! | Option | Code | Value | Affects |
//! |--------|------|-------|---------|
//! | `OPT_AUTOREFERER` | 58 | bool | transport |
//! | `OPT_FOLLOWLOCATION` | 52 | bool | redirects |
//! | `OPT_CONNECTTIMEOUT` | 78 | seconds | transport |
//! | `OPT_CONNECTTIMEOUT_MS` | 156 | milliseconds | transport |
//! | `OPT_MAXREDIRS` | 68 | int | redirects |
//! | `OPT_PROXYTYPE` | 101 | int | transport |
//! | `OPT_TIMEOUT` | 13 | seconds | transport |
//! | `OPT_TIMEOUT_MS` | 155 | milliseconds | transport |
//! | `OPT_COOKIEJAR` | 10082 | bool or store | jar |
//! | `OPT_INTERFACE` | 10062 | IP address | transport |
//! | `OPT_PROXY` | 10004 | `host:port` | transport |
//! | `OPT_REFERER` | 10016 | string | request |
//! | `OPT_USERAGENT` | 10018 | string | request |
//! | `OPT_REDIRECT_POLICY` | 100000 | function | redirects |
//! | `OPT_PROXY_FUNC` | 100001 | function | transport |

use super::{OptionMap, OptionValue};
use std::fmt;

/// User agent sent when nothing else is configured.
pub const USER_AGENT: &str = concat!("curlopt-client v", env!("CARGO_PKG_VERSION"));

/// A configuration option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Opt {
    /// Send a `Referer` header when following redirects.
    AutoReferer,
    /// Follow `Location` redirects.
    FollowLocation,
    /// Connection timeout in seconds.
    ConnectTimeout,
    /// Connection timeout in milliseconds.
    ConnectTimeoutMs,
    /// Maximum number of redirects.
    MaxRedirs,
    /// Proxy kind (see [`ProxyKind`](crate::client::ProxyKind)).
    ProxyType,
    /// Whole-request timeout in seconds.
    Timeout,
    /// Whole-request timeout in milliseconds.
    TimeoutMs,
    /// Cookie persistence: `true` for a built-in jar or a caller-supplied store.
    CookieJar,
    /// Local address to bind outgoing connections to.
    Interface,
    /// Static HTTP proxy address.
    Proxy,
    /// `Referer` header value.
    Referer,
    /// `User-Agent` header value.
    UserAgent,
    /// Custom redirect decision function.
    RedirectPolicy,
    /// Per-request proxy selector function.
    ProxyFunc,
}

impl Opt {
    /// Every option, in declaration order.
    pub const ALL: [Opt; 15] = [
        Opt::AutoReferer,
        Opt::FollowLocation,
        Opt::ConnectTimeout,
        Opt::ConnectTimeoutMs,
        Opt::MaxRedirs,
        Opt::ProxyType,
        Opt::Timeout,
        Opt::TimeoutMs,
        Opt::CookieJar,
        Opt::Interface,
        Opt::Proxy,
        Opt::Referer,
        Opt::UserAgent,
        Opt::RedirectPolicy,
        Opt::ProxyFunc,
    ];

    /// The stable integer key of this option.
    pub const fn code(self) -> i64 {
        match self {
            Opt::AutoReferer => 58,
            Opt::FollowLocation => 52,
            Opt::ConnectTimeout => 78,
            Opt::ConnectTimeoutMs => 156,
            Opt::MaxRedirs => 68,
            Opt::ProxyType => 101,
            Opt::Timeout => 13,
            Opt::TimeoutMs => 155,
            Opt::CookieJar => 10082,
            Opt::Interface => 10062,
            Opt::Proxy => 10004,
            Opt::Referer => 10016,
            Opt::UserAgent => 10018,
            Opt::RedirectPolicy => 100000,
            Opt::ProxyFunc => 100001,
        }
    }

    /// Look an option up by its integer key.
    pub fn from_code(code: i64) -> Option<Opt> {
        Self::ALL.into_iter().find(|opt| opt.code() == code)
    }

    /// The canonical `OPT_*` name.
    pub const fn name(self) -> &'static str {
        match self {
            Opt::AutoReferer => "OPT_AUTOREFERER",
            Opt::FollowLocation => "OPT_FOLLOWLOCATION",
            Opt::ConnectTimeout => "OPT_CONNECTTIMEOUT",
            Opt::ConnectTimeoutMs => "OPT_CONNECTTIMEOUT_MS",
            Opt::MaxRedirs => "OPT_MAXREDIRS",
            Opt::ProxyType => "OPT_PROXYTYPE",
            Opt::Timeout => "OPT_TIMEOUT",
            Opt::TimeoutMs => "OPT_TIMEOUT_MS",
            Opt::CookieJar => "OPT_COOKIEJAR",
            Opt::Interface => "OPT_INTERFACE",
            Opt::Proxy => "OPT_PROXY",
            Opt::Referer => "OPT_REFERER",
            Opt::UserAgent => "OPT_USERAGENT",
            Opt::RedirectPolicy => "OPT_REDIRECT_POLICY",
            Opt::ProxyFunc => "OPT_PROXY_FUNC",
        }
    }

    /// Look an option up by its canonical `OPT_*` name (exact match).
    pub fn from_name(name: &str) -> Option<Opt> {
        Self::ALL.into_iter().find(|opt| opt.name() == name)
    }

    const fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

impl fmt::Display for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of options packed into a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OptionSet(u32);

impl OptionSet {
    /// Options whose change invalidates a cached transport.
    pub const TRANSPORT: OptionSet = OptionSet::of(&[
        Opt::ConnectTimeout,
        Opt::ConnectTimeoutMs,
        Opt::ProxyType,
        Opt::Timeout,
        Opt::TimeoutMs,
        Opt::Interface,
        Opt::Proxy,
        Opt::ProxyFunc,
        Opt::AutoReferer,
    ]);

    /// Options whose change invalidates a cached cookie jar.
    pub const JAR: OptionSet = OptionSet::of(&[Opt::CookieJar]);

    /// Build a set from a list of options.
    pub const fn of(opts: &[Opt]) -> OptionSet {
        let mut bits = 0;
        let mut i = 0;
        while i < opts.len() {
            bits |= opts[i].bit();
            i += 1;
        }
        OptionSet(bits)
    }

    /// Membership test.
    #[inline]
    pub const fn contains(self, opt: Opt) -> bool {
        self.0 & opt.bit() != 0
    }

    /// Iterate the members in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Opt> {
        Opt::ALL.into_iter().filter(move |opt| self.contains(*opt))
    }
}

/// The lowest-precedence option layer.
///
/// Passed explicitly when a client is constructed; there is no process-wide
/// mutable default table.
#[derive(Debug, Clone)]
pub struct Defaults {
    options: OptionMap,
}

impl Defaults {
    /// The builtin defaults: follow up to 10 redirects, auto referer, the crate
    /// user agent and an in-memory cookie jar.
    pub fn builtin() -> Self {
        let options = OptionMap::new()
            .with(Opt::FollowLocation, true)
            .with(Opt::MaxRedirs, 10)
            .with(Opt::AutoReferer, true)
            .with(Opt::UserAgent, USER_AGENT)
            .with(Opt::CookieJar, true);
        Self { options }
    }

    /// No defaults at all; every option must come from the client or the call.
    pub fn empty() -> Self {
        Self {
            options: OptionMap::new(),
        }
    }

    /// Use an arbitrary option map as the default layer.
    pub fn from_options(options: OptionMap) -> Self {
        Self { options }
    }

    /// The default layer.
    pub fn options(&self) -> &OptionMap {
        &self.options
    }

    /// A single default value.
    pub fn get(&self, opt: Opt) -> Option<&OptionValue> {
        self.options.get(opt)
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self::builtin()
    }
}
