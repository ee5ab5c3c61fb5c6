//! Serializable client configuration.
//!
//! [`ClientConfig`] is the file-friendly form of a persistent option layer.
//! Every field is optional; only the fields that are set become options, so
//! anything left out falls through to the client's defaults.
//!
//! ```
//! use curlopt_client::client::ClientConfig;
//! use curlopt_client::options::Opt;
//!
//! let config = ClientConfig::from_json_str(r#"{ "timeout_ms": 2500, "follow_redirects": false }"#).unwrap();
//! let options = config.to_options();
//! assert_eq!(options.get(Opt::TimeoutMs).and_then(|v| v.as_int()), Some(2500));
//! assert_eq!(options.get(Opt::FollowLocation).and_then(|v| v.as_bool()), Some(false));
//! assert!(!options.contains(Opt::MaxRedirs));
//! ```

use super::request::Headers;
use super::session::HttpClient;
use crate::error::Result;
use crate::options::{Opt, OptionMap};
use serde::{Deserialize, Serialize};

/// Persistent client settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Whole-request deadline in milliseconds (`OPT_TIMEOUT_MS`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Connect deadline in milliseconds (`OPT_CONNECTTIMEOUT_MS`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout_ms: Option<u64>,
    /// HTTP proxy as `host:port` (`OPT_PROXY`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    /// `OPT_FOLLOWLOCATION`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_redirects: Option<bool>,
    /// `OPT_MAXREDIRS`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_redirects: Option<u32>,
    /// Keep cookies between calls (`OPT_COOKIEJAR`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie_jar: Option<bool>,
    /// `OPT_AUTOREFERER`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_referer: Option<bool>,
    /// `OPT_USERAGENT`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// `OPT_REFERER`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    /// Local IP address to bind (`OPT_INTERFACE`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    /// Persistent headers.
    #[serde(skip_serializing_if = "Headers::is_empty")]
    pub headers: Headers,
}

impl ClientConfig {
    /// Parse a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The option layer described by this configuration. Headers are not
    /// options and are left out.
    pub fn to_options(&self) -> OptionMap {
        let mut options = OptionMap::new();
        if let Some(ms) = self.timeout_ms {
            options.set(Opt::TimeoutMs, i64::try_from(ms).unwrap_or(i64::MAX));
        }
        if let Some(ms) = self.connect_timeout_ms {
            options.set(Opt::ConnectTimeoutMs, i64::try_from(ms).unwrap_or(i64::MAX));
        }
        if let Some(proxy) = &self.proxy {
            options.set(Opt::Proxy, proxy.as_str());
        }
        if let Some(follow) = self.follow_redirects {
            options.set(Opt::FollowLocation, follow);
        }
        if let Some(max) = self.max_redirects {
            options.set(Opt::MaxRedirs, max);
        }
        if let Some(jar) = self.cookie_jar {
            options.set(Opt::CookieJar, jar);
        }
        if let Some(auto) = self.auto_referer {
            options.set(Opt::AutoReferer, auto);
        }
        if let Some(agent) = &self.user_agent {
            options.set(Opt::UserAgent, agent.as_str());
        }
        if let Some(referer) = &self.referer {
            options.set(Opt::Referer, referer.as_str());
        }
        if let Some(interface) = &self.interface {
            options.set(Opt::Interface, interface.as_str());
        }
        options
    }
}

impl HttpClient {
    /// Create a client whose persistent options and headers come from `config`.
    ///
    /// Fails with [`ClientError::InvalidHeader`](crate::ClientError::InvalidHeader)
    /// when a configured header cannot be sent.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let client = HttpClient::new(config.to_options());
        for (name, value) in &config.headers {
            client.set_header(name, value.clone())?;
        }
        Ok(client)
    }
}
