//! Connection-layer configuration built from resolved options.
//!
//! A [`Transport`] is what gets cached between calls: the connect and overall
//! deadlines, the proxy rule, the local bind address and automatic referer.
//! The engine adapter turns it into a `reqwest::Client`.

use crate::error::{ClientError, Result};
use crate::options::{Opt, OptionMap, OptionValue, ProxyFn};
use std::fmt;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use url::Url;

static NEXT_TRANSPORT_ID: AtomicU64 = AtomicU64::new(1);

/// Proxy kinds, numbered as CURL's `CURLPROXY_*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyKind {
    /// Plain HTTP proxy. The only supported kind.
    Http,
    /// SOCKS4.
    Socks4,
    /// SOCKS5.
    Socks5,
    /// SOCKS4a.
    Socks4a,
}

impl ProxyKind {
    /// CURL numeric code.
    pub const fn code(self) -> i64 {
        match self {
            ProxyKind::Http => 0,
            ProxyKind::Socks4 => 4,
            ProxyKind::Socks5 => 5,
            ProxyKind::Socks4a => 6,
        }
    }

    /// Decode a CURL numeric code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ProxyKind::Http),
            4 => Some(ProxyKind::Socks4),
            5 => Some(ProxyKind::Socks5),
            6 => Some(ProxyKind::Socks4a),
            _ => None,
        }
    }
}

/// How the proxy for a request is chosen.
#[derive(Clone)]
pub enum ProxyRule {
    /// Connect directly; environment proxies are ignored.
    Direct,
    /// Always go through this HTTP proxy.
    Static(Url),
    /// Ask the selector for every outbound URL.
    Selector(ProxyFn),
}

impl fmt::Debug for ProxyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyRule::Direct => f.write_str("Direct"),
            ProxyRule::Static(url) => f.debug_tuple("Static").field(&url.as_str()).finish(),
            ProxyRule::Selector(_) => f.write_str("Selector(<fn>)"),
        }
    }
}

/// Resolved connection-layer configuration.
#[derive(Debug, Clone)]
pub struct Transport {
    id: u64,
    connect_timeout: Option<Duration>,
    timeout: Option<Duration>,
    proxy: ProxyRule,
    local_address: Option<IpAddr>,
    auto_referer: bool,
}

impl Transport {
    /// Build a transport from a resolved option map.
    ///
    /// # Errors
    ///
    /// - [`ClientError::InvalidOptionType`] when a typed option holds the wrong kind of value
    /// - [`ClientError::UnsupportedProxyKind`] for any proxy kind other than HTTP
    /// - [`ClientError::InvalidOptionValue`] when the interface is not an IP address
    /// - [`ClientError::UrlParse`] when the proxy address is not a valid authority
    pub fn from_options(options: &OptionMap) -> Result<Self> {
        let mut connect_ms = timeout_millis(options, Opt::ConnectTimeoutMs, Opt::ConnectTimeout)?;
        let timeout_ms = timeout_millis(options, Opt::TimeoutMs, Opt::Timeout)?;

        // a connect phase longer than the whole request could never finish in time
        if timeout_ms > 0 && (connect_ms == 0 || connect_ms > timeout_ms) {
            connect_ms = timeout_ms;
        }

        let proxy = proxy_rule(options)?;

        let local_address = match options.get(Opt::Interface) {
            None => None,
            Some(OptionValue::Str(iface)) => Some(iface.parse::<IpAddr>().map_err(|_| {
                ClientError::InvalidOptionValue {
                    option: Opt::Interface,
                    reason: format!("{iface:?} is not an IP address"),
                }
            })?),
            Some(_) => {
                return Err(ClientError::InvalidOptionType {
                    option: Opt::Interface,
                    expected: "a string",
                })
            }
        };

        let auto_referer = match options.get(Opt::AutoReferer) {
            None => false,
            Some(OptionValue::Bool(b)) => *b,
            Some(_) => {
                return Err(ClientError::InvalidOptionType {
                    option: Opt::AutoReferer,
                    expected: "a bool",
                })
            }
        };

        let transport = Transport {
            id: NEXT_TRANSPORT_ID.fetch_add(1, Ordering::Relaxed),
            connect_timeout: nonzero_millis(connect_ms),
            timeout: nonzero_millis(timeout_ms),
            proxy,
            local_address,
            auto_referer,
        };
        tracing::debug!(
            id = transport.id,
            connect_timeout = ?transport.connect_timeout,
            timeout = ?transport.timeout,
            proxy = ?transport.proxy,
            "built transport"
        );
        Ok(transport)
    }

    /// Unique identity of this transport.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Deadline for establishing a connection.
    #[inline]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    /// Deadline for the whole request.
    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The proxy rule.
    #[inline]
    pub fn proxy(&self) -> &ProxyRule {
        &self.proxy
    }

    /// Local address outgoing connections bind to.
    #[inline]
    pub fn local_address(&self) -> Option<IpAddr> {
        self.local_address
    }

    /// Whether a `Referer` is sent automatically when following redirects.
    #[inline]
    pub fn auto_referer(&self) -> bool {
        self.auto_referer
    }

    /// The HTTP proxy to use for `target`, if any.
    ///
    /// # Errors
    ///
    /// Fails when the selector fails, returns a kind other than HTTP, or
    /// returns an address that does not parse.
    pub fn select_proxy(&self, target: &Url) -> Result<Option<Url>> {
        match &self.proxy {
            ProxyRule::Direct => Ok(None),
            ProxyRule::Static(url) => Ok(Some(url.clone())),
            ProxyRule::Selector(select) => {
                let (kind, address) =
                    select(target).map_err(|e| ClientError::ProxySelector(format!("{e:#}")))?;
                if kind != ProxyKind::Http {
                    return Err(ClientError::UnsupportedProxyKind(kind.code()));
                }
                proxy_url(&address).map(Some)
            }
        }
    }
}

fn proxy_rule(options: &OptionMap) -> Result<ProxyRule> {
    match options.get(Opt::ProxyFunc) {
        Some(OptionValue::ProxyFunc(select)) => return Ok(ProxyRule::Selector(select.clone())),
        Some(_) => {
            return Err(ClientError::InvalidOptionType {
                option: Opt::ProxyFunc,
                expected: "a proxy selector function",
            })
        }
        None => {}
    }

    match options.get(Opt::ProxyType) {
        None => {}
        Some(OptionValue::Int(code)) if *code == ProxyKind::Http.code() => {}
        Some(OptionValue::Int(code)) => return Err(ClientError::UnsupportedProxyKind(*code)),
        Some(_) => {
            return Err(ClientError::InvalidOptionType {
                option: Opt::ProxyType,
                expected: "an int",
            })
        }
    }

    match options.get(Opt::Proxy) {
        None => Ok(ProxyRule::Direct),
        Some(OptionValue::Str(address)) => Ok(ProxyRule::Static(proxy_url(address)?)),
        Some(_) => Err(ClientError::InvalidOptionType {
            option: Opt::Proxy,
            expected: "a string",
        }),
    }
}

/// `host:port` becomes `http://host:port`; an explicit scheme is kept.
fn proxy_url(address: &str) -> Result<Url> {
    if address.contains("://") {
        Ok(Url::parse(address)?)
    } else {
        Ok(Url::parse(&format!("http://{address}"))?)
    }
}

/// The millisecond option wins over the second option when both are set.
fn timeout_millis(options: &OptionMap, precise: Opt, coarse: Opt) -> Result<u64> {
    if let Some(value) = options.get(precise) {
        return as_millis(precise, value, 1);
    }
    if let Some(value) = options.get(coarse) {
        return as_millis(coarse, value, 1000);
    }
    Ok(0)
}

fn as_millis(opt: Opt, value: &OptionValue, scale: u64) -> Result<u64> {
    match value {
        OptionValue::Int(n) => Ok(u64::try_from(*n).unwrap_or(0).saturating_mul(scale)),
        OptionValue::Duration(d) => Ok(u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
        _ => Err(ClientError::InvalidOptionType {
            option: opt,
            expected: "an int or a duration",
        }),
    }
}

fn nonzero_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_clamped_to_overall() {
        let options = OptionMap::new()
            .with(Opt::ConnectTimeoutMs, 10_000)
            .with(Opt::TimeoutMs, 2_000);
        let transport = Transport::from_options(&options).unwrap();
        assert_eq!(transport.connect_timeout(), Some(Duration::from_millis(2_000)));
        assert_eq!(transport.timeout(), Some(Duration::from_millis(2_000)));
    }

    #[test]
    fn test_connect_defaults_to_overall() {
        let options = OptionMap::new().with(Opt::Timeout, 3);
        let transport = Transport::from_options(&options).unwrap();
        assert_eq!(transport.connect_timeout(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_shorter_connect_kept() {
        let options = OptionMap::new().with(Opt::ConnectTimeout, 1).with(Opt::Timeout, 5);
        let transport = Transport::from_options(&options).unwrap();
        assert_eq!(transport.connect_timeout(), Some(Duration::from_secs(1)));
        assert_eq!(transport.timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_millis_win_over_seconds() {
        let options = OptionMap::new()
            .with(Opt::ConnectTimeout, 9)
            .with(Opt::ConnectTimeoutMs, 250);
        let transport = Transport::from_options(&options).unwrap();
        assert_eq!(transport.connect_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(transport.timeout(), None);
    }

    #[test]
    fn test_duration_values_accepted() {
        let options = OptionMap::new().with(Opt::TimeoutMs, Duration::from_millis(1500));
        let transport = Transport::from_options(&options).unwrap();
        assert_eq!(transport.timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_no_timeouts() {
        let transport = Transport::from_options(&OptionMap::new()).unwrap();
        assert_eq!(transport.connect_timeout(), None);
        assert_eq!(transport.timeout(), None);
        assert!(matches!(transport.proxy(), ProxyRule::Direct));
        assert!(!transport.auto_referer());
    }

    #[test]
    fn test_wrong_timeout_type() {
        let options = OptionMap::new().with(Opt::TimeoutMs, "soon");
        let err = Transport::from_options(&options).unwrap_err();
        assert!(matches!(
            err,
            ClientError::InvalidOptionType { option: Opt::TimeoutMs, .. }
        ));
    }

    #[test]
    fn test_static_proxy() {
        let options = OptionMap::new().with(Opt::Proxy, "127.0.0.1:3128");
        let transport = Transport::from_options(&options).unwrap();
        let target = Url::parse("http://example.com/").unwrap();
        let proxy = transport.select_proxy(&target).unwrap().unwrap();
        assert_eq!(proxy.as_str(), "http://127.0.0.1:3128/");
    }

    #[test]
    fn test_proxy_type_must_be_http() {
        let options = OptionMap::new()
            .with(Opt::ProxyType, ProxyKind::Socks5)
            .with(Opt::Proxy, "127.0.0.1:1080");
        let err = Transport::from_options(&options).unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedProxyKind(5)));

        let options = OptionMap::new().with(Opt::ProxyType, ProxyKind::Http);
        assert!(Transport::from_options(&options).is_ok());
    }

    #[test]
    fn test_proxy_selector() {
        let options = OptionMap::new().with(
            Opt::ProxyFunc,
            OptionValue::proxy_func(|url| {
                if url.host_str() == Some("socks.example") {
                    Ok((ProxyKind::Socks4, "127.0.0.1:1080".to_string()))
                } else if url.host_str() == Some("broken.example") {
                    Err(anyhow::anyhow!("no route"))
                } else {
                    Ok((ProxyKind::Http, "proxy.local:8080".to_string()))
                }
            }),
        );
        let transport = Transport::from_options(&options).unwrap();

        let plain = Url::parse("http://example.com/").unwrap();
        let proxy = transport.select_proxy(&plain).unwrap().unwrap();
        assert_eq!(proxy.host_str(), Some("proxy.local"));

        let socks = Url::parse("http://socks.example/").unwrap();
        assert!(matches!(
            transport.select_proxy(&socks),
            Err(ClientError::UnsupportedProxyKind(4))
        ));

        let broken = Url::parse("http://broken.example/").unwrap();
        assert!(matches!(
            transport.select_proxy(&broken),
            Err(ClientError::ProxySelector(_))
        ));
    }

    #[test]
    fn test_proxy_func_wrong_type() {
        let options = OptionMap::new().with(Opt::ProxyFunc, "nope");
        assert!(matches!(
            Transport::from_options(&options),
            Err(ClientError::InvalidOptionType { option: Opt::ProxyFunc, .. })
        ));
    }

    #[test]
    fn test_interface_must_be_ip() {
        let options = OptionMap::new().with(Opt::Interface, "127.0.0.1");
        let transport = Transport::from_options(&options).unwrap();
        assert_eq!(transport.local_address(), Some("127.0.0.1".parse().unwrap()));

        let options = OptionMap::new().with(Opt::Interface, "eth0");
        assert!(matches!(
            Transport::from_options(&options),
            Err(ClientError::InvalidOptionValue { option: Opt::Interface, .. })
        ));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Transport::from_options(&OptionMap::new()).unwrap();
        let b = Transport::from_options(&OptionMap::new()).unwrap();
        assert_ne!(a.id(), b.id());
    }
}
