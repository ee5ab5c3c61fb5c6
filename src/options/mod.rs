//! CURL-like options: registry, values and layer resolution.
//!
//! # Layers
//!
//! Three layers are merged for every request, later ones winning:
//!
//! | Layer | Lifetime | Set with |
//! |-------|----------|----------|
//! | defaults | the client | [`Defaults`] at construction |
//! | persistent | the client | `HttpClient::new`, `HttpClient::set_option` |
//! | one-time | one call | `Call::with_option` |
//!
//! # Classification
//!
//! [`OptionSet::TRANSPORT`] and [`OptionSet::JAR`] decide whether a one-time
//! option forces a fresh transport or cookie jar for its call.
//!
//! # Examples
//!
//! ```
//! use curlopt_client::options::{options_from_names, resolve_layers, Defaults, Opt, OptionMap};
//!
//! let persistent = options_from_names([("timeout", 5)]);
//! let one_time = OptionMap::new().with(Opt::Timeout, 1);
//! let merged = resolve_layers(Defaults::builtin().options(), &persistent, &one_time);
//! assert_eq!(merged.get(Opt::Timeout).and_then(|v| v.as_int()), Some(1));
//! assert_eq!(merged.get(Opt::MaxRedirs).and_then(|v| v.as_int()), Some(10));
//! ```

mod registry;
mod resolve;
mod value;

pub use registry::{Defaults, Opt, OptionSet, USER_AGENT};
pub use resolve::{
    affects_jar, affects_transport, lookup_name, options_from_json, options_from_names, resolve,
    resolve_layers, strict_options_from_names,
};
pub use value::{OptionMap, OptionValue, ProxyFn, RedirectFn};
