//! Building the outbound request from a resolved call.

use super::session::Resolved;
use crate::error::{ClientError, Result};
use crate::options::{Opt, OptionMap, OptionValue};
use crate::protocol::{cookie_header, set_header};
use bytes::Bytes;
use http::header::{HeaderMap, COOKIE, REFERER, USER_AGENT};
use http::Method;
use reqwest::multipart::Form;
use std::collections::BTreeMap;
use url::Url;

/// Call-site headers.
pub type Headers = BTreeMap<String, String>;

/// Request body handed to the engine.
#[derive(Debug, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// A buffered body.
    Bytes(Bytes),
    /// A `multipart/form-data` body; the engine sets the boundary content type.
    Multipart(Form),
}

impl From<Bytes> for RequestBody {
    fn from(value: Bytes) -> Self {
        RequestBody::Bytes(value)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(value: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(value))
    }
}

impl From<String> for RequestBody {
    fn from(value: String) -> Self {
        RequestBody::Bytes(Bytes::from(value))
    }
}

impl From<&'static str> for RequestBody {
    fn from(value: &'static str) -> Self {
        RequestBody::Bytes(Bytes::from_static(value.as_bytes()))
    }
}

impl From<Form> for RequestBody {
    fn from(value: Form) -> Self {
        RequestBody::Multipart(value)
    }
}

/// A fully built request, ready for the engine.
#[derive(Debug)]
pub struct PreparedRequest {
    /// HTTP method.
    pub method: Method,
    /// Target URL.
    pub url: Url,
    /// Final header set.
    pub headers: HeaderMap,
    /// Body.
    pub body: RequestBody,
}

impl Resolved {
    /// Build the request for this call.
    ///
    /// Header precedence, lowest first: `OPT_REFERER` / `OPT_USERAGENT`,
    /// persistent headers, one-time headers, `headers`. One-time cookies are
    /// appended to the `Cookie` header together with the jar's cookies for the
    /// URL.
    pub fn prepare(
        &self,
        method: Method,
        url: &str,
        headers: &Headers,
        body: RequestBody,
    ) -> Result<PreparedRequest> {
        let url = Url::parse(url)?;

        let mut map = HeaderMap::new();
        if let Some(referer) = string_option(self.options(), Opt::Referer)? {
            set_header(&mut map, REFERER.as_str(), referer)?;
        }
        if let Some(agent) = string_option(self.options(), Opt::UserAgent)? {
            set_header(&mut map, USER_AGENT.as_str(), agent)?;
        }
        for (name, value) in self.headers() {
            map.insert(name.clone(), value.clone());
        }
        for (name, value) in headers {
            set_header(&mut map, name, value)?;
        }

        if !self.cookies().is_empty() {
            let from_jar = self.jar().and_then(|jar| jar.cookies(&url));
            if let Some(value) = cookie_header(map.get(COOKIE), from_jar.as_ref(), self.cookies())? {
                map.insert(COOKIE, value);
            }
        }

        tracing::trace!(%method, %url, headers = map.len(), "prepared request");
        Ok(PreparedRequest {
            method,
            url,
            headers: map,
            body,
        })
    }
}

fn string_option(options: &OptionMap, opt: Opt) -> Result<Option<&str>> {
    match options.get(opt) {
        None => Ok(None),
        Some(OptionValue::Str(s)) => Ok(Some(s)),
        Some(_) => Err(ClientError::InvalidOptionType {
            option: opt,
            expected: "a string",
        }),
    }
}
