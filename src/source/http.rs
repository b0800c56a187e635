//! HTTP-backed implementation of [`ExternalSource`].

use async_trait::async_trait;
use futures_util::StreamExt;

use super::{ExternalFolder, ExternalSource, ObjectStream};
use crate::config::UpstreamConfig;
use crate::error::{DocGateError, DocGateResult};

/// Talks to the upstream store over HTTP with a bearer token from the
/// explicit [`UpstreamConfig`]; no ambient credentials are consulted.
pub struct HttpSource {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl HttpSource {
    pub fn new(config: UpstreamConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl ExternalSource for HttpSource {
    async fn list_child_folders(
        &self,
        parent_external_id: &str,
    ) -> DocGateResult<Vec<ExternalFolder>> {
        let url = self.url(&format!("folders/{}/children", parent_external_id));
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.auth_token)
            .send()
            .await
            .map_err(|e| DocGateError::Upstream(format!("list {}: {}", parent_external_id, e)))?;

        if !response.status().is_success() {
            return Err(DocGateError::Upstream(format!(
                "list {}: upstream returned {}",
                parent_external_id,
                response.status()
            )));
        }

        response
            .json::<Vec<ExternalFolder>>()
            .await
            .map_err(|e| DocGateError::Upstream(format!("list {}: {}", parent_external_id, e)))
    }

    async fn fetch_object(&self, external_id: &str) -> DocGateResult<ObjectStream> {
        let url = self.url(&format!("objects/{}", external_id));
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.auth_token)
            .send()
            .await
            .map_err(|e| DocGateError::Upstream(format!("fetch {}: {}", external_id, e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DocGateError::NotFound(format!(
                "object {} not found upstream",
                external_id
            )));
        }
        if !response.status().is_success() {
            return Err(DocGateError::Upstream(format!(
                "fetch {}: upstream returned {}",
                external_id,
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let content_length = response.content_length();

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| DocGateError::Upstream(format!("stream: {}", e))));

        Ok(ObjectStream {
            content_type,
            content_length,
            stream: Box::pin(stream),
        })
    }
}
