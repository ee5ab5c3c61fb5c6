//! HTTP client driven by CURL-like options.
//!
//! This module turns resolved option maps into the resources a request needs
//! and executes requests through `reqwest`. Clients can:
//!
//! - **Keep persistent options and headers** that apply to every call
//! - **Stage one-time overrides** on a [`Call`] without touching the client
//! - **Reuse the transport and cookie jar** whenever a call's overrides allow it
//! - **Send GET, POST and multipart POST** requests through thin helpers
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── session   - HttpClient, Call and Resolved
//! ├── transport - timeouts, proxy rule, local address
//! ├── redirect  - redirect decisions
//! ├── jar       - cookie store selection
//! ├── request   - request bodies and header assembly
//! ├── helpers   - get, post, post_multipart
//! ├── engine    - reqwest client cache and execution
//! └── config    - serializable client configuration
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`HttpClient`] | Shared client holding persistent state and caches |
//! | [`Call`] | One request's staged overrides |
//! | [`Resolved`] | Merged options and acquired resources for one request |
//! | [`Transport`] | Cached connection-layer configuration |
//! | [`RedirectPolicy`] | Decides whether a redirect is followed |
//! | [`ClientConfig`] | Serializable persistent settings |
//!
//! # Examples
//!
//! ## Creating a Client
//!
//! ```
//! use curlopt_client::client::{ClientConfig, HttpClient};
//! use curlopt_client::options::{Opt, OptionMap};
//!
//! // Builtin defaults only
//! let client = HttpClient::default();
//!
//! // Persistent options
//! let client = HttpClient::new(OptionMap::new().with(Opt::Timeout, 30));
//!
//! // From configuration
//! let config = ClientConfig {
//!     max_redirects: Some(3),
//!     ..Default::default()
//! };
//! let client = HttpClient::from_config(&config).unwrap();
//! ```
//!
//! ## One-time Overrides
//!
//! ```
//! use curlopt_client::client::HttpClient;
//! use curlopt_client::options::Opt;
//!
//! let client = HttpClient::default();
//! let call = client
//!     .with_option(Opt::FollowLocation, false)
//!     .with_header("Accept", "application/json");
//! assert!(call.reuses_transport());
//!
//! let call = client.with_option(Opt::TimeoutMs, 250);
//! assert!(!call.reuses_transport());
//! ```

mod config;
mod engine;
mod helpers;
mod jar;
mod redirect;
mod request;
mod session;
mod transport;

pub use config::ClientConfig;
pub use jar::{build_jar, SharedJar};
pub use redirect::{RedirectPolicy, RedirectRefused};
pub use request::{Headers, PreparedRequest, RequestBody};
pub use session::{Call, HttpClient, Resolved};
pub use transport::{ProxyKind, ProxyRule, Transport};
