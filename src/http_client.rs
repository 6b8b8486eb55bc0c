//! HTTP transport shared by the auth and stream layers.
//!
//! Features:
//! - One cookie jar across every hop of a login or resolution
//! - A second client that never follows redirects, for reading `Location`
//! - Configurable TLS verification and an optional proxy on every call

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder, Proxy, Url};
use tracing::debug;

use crate::config::HttpConfig;
use crate::error::Result;
use crate::settings::ProxyConfig;

/// Pair of HTTP clients sharing one cookie jar.
#[derive(Clone)]
pub struct SessionClient {
    client: Client,
    no_redirect: Client,
    jar: Arc<Jar>,
}

impl SessionClient {
    /// Create a client pair from transport settings and an optional proxy.
    pub fn new(config: &HttpConfig, proxy: Option<&ProxyConfig>) -> Result<Self> {
        let jar = Arc::new(Jar::default());

        let client = Self::builder(config, proxy, &jar)?
            .redirect(Policy::limited(10))
            .build()?;
        let no_redirect = Self::builder(config, proxy, &jar)?
            .redirect(Policy::none())
            .build()?;

        if let Some(p) = proxy {
            debug!(proxy = %p.url, "Using proxy");
        }

        Ok(Self {
            client,
            no_redirect,
            jar,
        })
    }

    fn builder(
        config: &HttpConfig,
        proxy: Option<&ProxyConfig>,
        jar: &Arc<Jar>,
    ) -> Result<ClientBuilder> {
        let mut builder = Client::builder()
            .use_rustls_tls()
            .danger_accept_invalid_certs(!config.verify_tls)
            .user_agent(config.user_agent.clone())
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .cookie_provider(Arc::clone(jar));

        if let Some(p) = proxy {
            let mut proxy = Proxy::all(&p.url)?;
            if let Some(ref username) = p.username {
                proxy = proxy.basic_auth(username, p.password.as_deref().unwrap_or_default());
            }
            builder = builder.proxy(proxy);
        }

        Ok(builder)
    }

    /// Client that follows redirects.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Client that returns 3xx responses as-is.
    #[must_use]
    pub fn no_redirect(&self) -> &Client {
        &self.no_redirect
    }

    /// `Cookie` header value the jar would send to `url`.
    pub fn cookie_header(&self, url: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        self.jar
            .cookies(&url)
            .and_then(|v| v.to_str().ok().map(str::to_string))
    }
}

impl std::fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient").finish_non_exhaustive()
    }
}
