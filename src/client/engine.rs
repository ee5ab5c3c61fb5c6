//! Adapter between resolved calls and `reqwest`.
//!
//! `reqwest` fixes the proxy, timeouts, cookie store and redirect policy when
//! a client is built. The engine keeps a small LRU of built clients keyed on
//! the transport identity, the jar identity and the redirect policy, so calls
//! that share all three also share a connection pool.

use super::jar::{jar_key, JarHandle};
use super::redirect::RedirectKey;
use super::request::{PreparedRequest, RequestBody};
use super::session::Resolved;
use super::transport::{ProxyRule, Transport};
use crate::error::{ClientError, Result};
use http::header::CONTENT_TYPE;
use lru::LruCache;
use parking_lot::Mutex;
use reqwest::{Client, Proxy};
use std::num::NonZeroUsize;
use std::sync::Arc;

const CLIENT_CACHE_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ClientKey {
    transport: u64,
    jar: Option<usize>,
    redirect: RedirectKey,
}

pub(crate) struct Engine {
    clients: Mutex<LruCache<ClientKey, Client>>,
}

impl Engine {
    pub(crate) fn new() -> Self {
        let capacity = NonZeroUsize::new(CLIENT_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Engine {
            clients: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Execute a prepared request with the resources of `resolved`.
    pub(crate) async fn execute(
        &self,
        resolved: &Resolved,
        request: PreparedRequest,
    ) -> Result<reqwest::Response> {
        // selector failures are reported here; the engine hook can only skip the proxy
        let proxy = resolved.transport().select_proxy(&request.url)?;

        let client = self.client_for(resolved)?;
        let PreparedRequest {
            method,
            url,
            mut headers,
            body,
        } = request;

        tracing::debug!(
            %method,
            %url,
            transport = resolved.transport().id(),
            proxy = proxy.as_ref().map(|p| p.as_str()),
            "sending request"
        );

        let builder = match body {
            RequestBody::Empty => client.request(method, url).headers(headers),
            RequestBody::Bytes(bytes) => client.request(method, url).headers(headers).body(bytes),
            RequestBody::Multipart(form) => {
                headers.remove(CONTENT_TYPE);
                client.request(method, url).headers(headers).multipart(form)
            }
        };

        let response = builder.send().await.map_err(refused_hop)?;
        tracing::debug!(status = %response.status(), url = %response.url(), "received response");
        Ok(response)
    }

    fn client_for(&self, resolved: &Resolved) -> Result<Client> {
        let key = ClientKey {
            transport: resolved.transport().id(),
            jar: resolved.jar().map(jar_key),
            redirect: resolved.redirect().key(),
        };

        if let Some(client) = self.clients.lock().get(&key) {
            tracing::trace!(?key, "engine client cache hit");
            return Ok(client.clone());
        }

        tracing::debug!(?key, "building engine client");
        let client = build_client(resolved)?;
        self.clients.lock().put(key, client.clone());
        Ok(client)
    }
}

fn build_client(resolved: &Resolved) -> Result<Client> {
    let transport = resolved.transport();
    let mut builder = Client::builder()
        .redirect(resolved.redirect().to_engine(transport))
        .referer(transport.auto_referer())
        .local_address(transport.local_address());

    if let Some(timeout) = transport.connect_timeout() {
        builder = builder.connect_timeout(timeout);
    }
    if let Some(timeout) = transport.timeout() {
        builder = builder.timeout(timeout);
    }

    builder = match transport.proxy() {
        ProxyRule::Direct => builder.no_proxy(),
        ProxyRule::Static(url) => builder.proxy(Proxy::all(url.as_str())?),
        ProxyRule::Selector(_) => builder.proxy(selector_proxy(transport)),
    };

    if let Some(jar) = resolved.jar() {
        builder = builder.cookie_provider(Arc::new(JarHandle(jar.clone())));
    }

    Ok(builder.build()?)
}

// Hops are vetted by the pre-check and the redirect policy; the hook only
// fails here if the selector answers differently for the same URL.
fn selector_proxy(transport: &Transport) -> Proxy {
    let transport = transport.clone();
    Proxy::custom(move |url| match transport.select_proxy(url) {
        Ok(proxy) => proxy,
        Err(e) => {
            tracing::warn!(%url, error = %e, "proxy selector changed its answer, connecting directly");
            None
        }
    })
}

/// A redirect hop refused by the proxy selector surfaces as the selector's
/// own error; everything else stays an engine error.
fn refused_hop(err: reqwest::Error) -> ClientError {
    if err.is_redirect() {
        let refusal = std::error::Error::source(&err)
            .and_then(|source| source.downcast_ref::<ClientError>());
        match refusal {
            Some(ClientError::UnsupportedProxyKind(kind)) => {
                return ClientError::UnsupportedProxyKind(*kind)
            }
            Some(ClientError::ProxySelector(reason)) => {
                return ClientError::ProxySelector(reason.clone())
            }
            Some(ClientError::UrlParse(e)) => return ClientError::UrlParse(*e),
            _ => {}
        }
    }
    ClientError::Engine(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{HttpClient, ProxyKind};
    use crate::options::{Opt, OptionMap, OptionValue};

    #[test]
    fn test_clients_shared_for_same_resources() {
        let client = HttpClient::default();
        let engine = Engine::new();

        let a = client.call().resolve().unwrap();
        let b = client.with_option(Opt::Referer, "http://r/").resolve().unwrap();
        engine.client_for(&a).unwrap();
        engine.client_for(&b).unwrap();
        assert_eq!(engine.clients.lock().len(), 1);

        let c = client.with_option(Opt::MaxRedirs, 2).resolve().unwrap();
        engine.client_for(&c).unwrap();
        assert_eq!(engine.clients.lock().len(), 2);
    }

    #[test]
    fn test_cache_is_bounded() {
        let client = HttpClient::default();
        let engine = Engine::new();
        for n in 0..(CLIENT_CACHE_SIZE as i64 + 4) {
            let resolved = client.with_option(Opt::MaxRedirs, n).resolve().unwrap();
            engine.client_for(&resolved).unwrap();
        }
        assert_eq!(engine.clients.lock().len(), CLIENT_CACHE_SIZE);
    }

    #[tokio::test]
    async fn test_selector_error_surfaces_before_sending() {
        let client = HttpClient::new(OptionMap::new().with(
            Opt::ProxyFunc,
            OptionValue::proxy_func(|_| Ok((ProxyKind::Socks5, "127.0.0.1:1080".to_string()))),
        ));
        let err = client
            .send(http::Method::GET, "http://127.0.0.1:9/", &Default::default(), RequestBody::Empty)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::ClientError::UnsupportedProxyKind(5)));
    }
}
