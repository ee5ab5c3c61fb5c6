#![warn(missing_docs)]

//! # curlopt-client: CURL-style options over reqwest
//!
//! This crate layers a CURL-like numeric option model on top of `reqwest`.
//! Timeouts, redirects, proxying, cookie persistence and header overrides are
//! all configured through one option map, and any call can carry one-time
//! overrides that never leak into the shared client.
//!
//! ## Overview
//!
//! Every request merges three option layers:
//!
//! 1. **Defaults** - follow up to 10 redirects, automatic referer, a crate user agent, an in-memory cookie jar
//! 2. **Persistent options** - set on the client, shared by every call
//! 3. **One-time options** - staged on a single [`Call`]
//!
//! The merged options decide the request's transport (timeouts, proxy, local
//! address), cookie jar and redirect policy. The client caches its transport
//! and jar; a call rebuilds one only when its own overrides change it.
//!
//! ## Usage
//!
//! ```no_run
//! use curlopt_client::{HttpClient, Opt, OptionMap, ProxyKind};
//!
//! #[tokio::main]
//! async fn main() -> curlopt_client::Result<()> {
//!     let client = HttpClient::new(
//!         OptionMap::new()
//!             .with(Opt::TimeoutMs, 5_000)
//!             .with(Opt::ProxyType, ProxyKind::Http),
//!     );
//!     client.set_header("Accept", "application/json")?;
//!
//!     let response = client.get("http://localhost:8080/search", [("q", "rust")]).await?;
//!     println!("{}", response.status());
//!
//!     // upload a file; `@` marks a parameter whose value is a path
//!     let response = client
//!         .with_option(Opt::FollowLocation, false)
//!         .post("http://localhost:8080/upload", [("@report", "/tmp/report.csv"), ("kind", "csv")])
//!         .await?;
//!     println!("{}", response.status());
//!     Ok(())
//! }
//! ```
//!
//! ## String-keyed Options
//!
//! ```
//! use curlopt_client::{options_from_names, Opt};
//!
//! let options = options_from_names([("timeout", 5), ("OPT_MAXREDIRS", 3), ("bogus", 1)]);
//! assert_eq!(options.get(Opt::Timeout).and_then(|v| v.as_int()), Some(5));
//! assert_eq!(options.len(), 2);
//! ```
//!
//! ## Module Structure
//!
//! - **[options]** - option registry, values and layer resolution
//! - **[client]** - the client session, builders and request helpers
//! - **[error]** - error types and result handling
//! - **[protocol]** - header merging, parameter encoding and constants

pub mod client;
pub mod error;
pub mod options;
pub mod protocol;

pub use client::{Call, ClientConfig, HttpClient, ProxyKind, RedirectRefused, Resolved};
pub use error::{ClientError, Result};
pub use options::{
    options_from_json, options_from_names, strict_options_from_names, Defaults, Opt, OptionMap,
    OptionValue,
};
