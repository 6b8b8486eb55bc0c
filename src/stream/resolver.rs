//! Catalog id → playable stream resolution.
//!
//! Three hops, each attempted once:
//! 1. video configuration (first-party API) → provider descriptor
//! 2. provider session → published manifest + license URL
//! 3. manifest location → final manifest URL

use async_trait::async_trait;
use reqwest::RequestBuilder;
use tracing::{debug, info, instrument, warn};

use crate::config::{ApiConfig, ProviderConfig, ServiceConfig};
use crate::error::{check_status, Result};
use crate::http_client::SessionClient;
use crate::stream::manifest::ManifestRewrite;
use crate::stream::provider::{Category, ResolvedStream, StreamProvider};
use crate::stream::session::{parse_session, PublishedUrl, SessionRequest};
use crate::stream::video_config::{ProviderDescriptor, VideoConfig};

pub struct StreamResolver {
    api: ApiConfig,
    provider: ProviderConfig,
    client: SessionClient,
}

impl StreamResolver {
    pub fn new(config: &ServiceConfig, client: SessionClient) -> Self {
        Self {
            api: config.api.clone(),
            provider: config.provider.clone(),
            client,
        }
    }

    async fn fetch_video_config(&self, category: Category, id: &str) -> Result<VideoConfig> {
        let url = self.api.video_config_url(category, id);
        debug!(%url, "Fetching video configuration");

        let mut request = self.client.inner().get(&url);
        for (name, value) in self.api.headers() {
            request = request.header(name, value);
        }

        let body = send_checked("video configuration", request).await?;
        VideoConfig::parse(&body)
    }

    async fn open_session(&self, descriptor: &ProviderDescriptor) -> Result<PublishedUrl> {
        let session = SessionRequest::new(descriptor);
        let url = self.provider.session_url(session.video_id());
        debug!(%url, video_id = %descriptor.video_id, "Opening provider session");

        let request = self
            .with_provider_headers(self.client.inner().post(&url))
            .query(&session.query())
            .json(&session.payload(&self.provider));

        let body = send_checked("provider session", request).await?;
        parse_session(&body, &self.provider.callback)
    }

    async fn resolve_manifest(&self, manifest_url: &str) -> Result<String> {
        debug!(url = %manifest_url, "Resolving manifest location");

        let request = self.with_provider_headers(self.client.inner().get(manifest_url));
        let body = send_checked("manifest", request).await?;

        let rewrite = ManifestRewrite::parse(&body);
        debug!(?rewrite, "Manifest rewrite");
        Ok(rewrite.resolve(manifest_url))
    }

    fn with_provider_headers(&self, mut request: RequestBuilder) -> RequestBuilder {
        for (name, value) in self.provider.headers() {
            request = request.header(name, value);
        }
        request
    }
}

#[async_trait]
impl StreamProvider for StreamResolver {
    fn name(&self) -> &'static str {
        "anvato"
    }

    #[instrument(skip(self))]
    async fn resolve(&self, category: Category, id: &str) -> Result<ResolvedStream> {
        let config = self.fetch_video_config(category, id).await?;
        let descriptor = config
            .find_descriptor(&self.provider.kind)
            .inspect_err(|e| warn!(error = %e, "No playable stream in video configuration"))?;

        let published = self.open_session(&descriptor).await?;
        let manifest_url = self.resolve_manifest(&published.manifest_url).await?;
        let metadata = config.metadata(category, id);

        info!(title = %metadata.title, manifest = %manifest_url, "Stream resolved");

        Ok(ResolvedStream {
            program_title: metadata.program_title,
            title: metadata.title,
            duration_seconds: metadata.duration_seconds,
            session_cookies: self.client.cookie_header(&manifest_url),
            manifest_url,
            license_url: published.license_url,
        })
    }
}

/// Send `request` and return its body, classifying non-2xx statuses.
async fn send_checked(step: &str, request: RequestBuilder) -> Result<String> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    check_status(step, status, &body)
        .inspect_err(|e| warn!(step, %status, error = %e, "Request failed"))?;
    Ok(body)
}
