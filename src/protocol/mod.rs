//! Protocol-level helpers: constants, header merging and parameter encoding.
//!
//! These are thin formatting helpers used by the client; they hold no state.
//!
//! | Module | Contents |
//! |--------|----------|
//! | `constants` | file marker, content types |
//! | `headers` | case-insensitive header merging, `Cookie` header assembly |
//! | `params` | query-string and form encoding |

pub mod constants;
mod headers;
mod params;

pub use headers::{cookie_header, header_name, header_value, merge_headers, set_header};
pub use params::{add_params, collect_params, encode_params, has_file_param, Params};
