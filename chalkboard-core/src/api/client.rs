//! HTTP client for the whiteboard-teaching REST API
//!
//! One method per backend operation, mapped onto `/sessions`,
//! `/explanations` and `/animations`. Every non-2xx response becomes an
//! [`Error::Transport`] carrying the HTTP status, except 404 on a single
//! addressed resource which becomes the fatal-to-view [`Error::NotFound`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::types::{
    Animation, CreateAnimation, CreateExplanation, CreateSession, Explanation, Session,
};

use super::Backend;

/// HTTP client for the whiteboard-teaching API
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client from configuration
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        config.validate()?;

        let base_url = config.base_url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// The configured base URL, without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of an animation's rendered video. Pure derivation, no network call.
    pub fn animation_file_url(&self, animation_id: i64) -> String {
        format!("{}/animations/{}/file", self.base_url, animation_id)
    }

    /// URL of an animation's thumbnail image. Pure derivation, no network call.
    pub fn animation_thumbnail_url(&self, animation_id: i64) -> String {
        format!("{}/animations/{}/thumbnail", self.base_url, animation_id)
    }

    /// GET `url` and decode a JSON body.
    ///
    /// `resource` names the addressed entity for the 404 → NotFound mapping.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
        resource: &str,
    ) -> Result<T> {
        let response = self
            .http_client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::transport(None, format!("HTTP request failed: {}", e)))?;

        Self::decode(response, resource).await
    }

    /// POST a JSON body to `url` and decode a JSON response.
    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
        resource: &str,
    ) -> Result<T> {
        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::transport(None, format!("HTTP request failed: {}", e)))?;

        Self::decode(response, resource).await
    }

    /// Map a response to a typed value or the error taxonomy.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response, resource: &str) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| {
                Error::transport(
                    Some(status.as_u16()),
                    format!("failed to parse response: {}", e),
                )
            })
        } else if status == StatusCode::NOT_FOUND {
            Err(Error::NotFound(resource.to_string()))
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::transport(
                Some(status.as_u16()),
                format!("API error ({}): {}", status, error_text),
            ))
        }
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn create_session(&self, req: &CreateSession) -> Result<Session> {
        let url = format!("{}/sessions/", self.base_url);
        self.post_json(url, req, "session").await
    }

    async fn list_sessions(&self) -> Result<Vec<Session>> {
        let url = format!("{}/sessions/", self.base_url);
        self.get_json(url, &[], "sessions").await
    }

    async fn get_session(&self, session_id: &str) -> Result<Session> {
        let url = format!(
            "{}/sessions/{}",
            self.base_url,
            urlencoding::encode(session_id)
        );
        self.get_json(url, &[], &format!("session {}", session_id))
            .await
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let url = format!(
            "{}/sessions/{}",
            self.base_url,
            urlencoding::encode(session_id)
        );

        let response = self
            .http_client
            .delete(&url)
            .send()
            .await
            .map_err(|e| Error::transport(None, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status == StatusCode::NOT_FOUND {
            Err(Error::NotFound(format!("session {}", session_id)))
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::transport(
                Some(status.as_u16()),
                format!("API error ({}): {}", status, error_text),
            ))
        }
    }

    async fn create_explanation(&self, req: &CreateExplanation) -> Result<Explanation> {
        let url = format!("{}/explanations/", self.base_url);
        // The backend answers 404 when the addressed session is gone
        self.post_json(url, req, &format!("session {}", req.session_id))
            .await
    }

    async fn list_explanations(&self, session_id: Option<&str>) -> Result<Vec<Explanation>> {
        let url = format!("{}/explanations/", self.base_url);
        let query: Vec<(&str, String)> = session_id
            .map(|id| vec![("session_id", id.to_string())])
            .unwrap_or_default();
        self.get_json(url, &query, "explanations").await
    }

    async fn get_explanation(&self, explanation_id: i64) -> Result<Explanation> {
        let url = format!("{}/explanations/{}", self.base_url, explanation_id);
        self.get_json(url, &[], &format!("explanation {}", explanation_id))
            .await
    }

    async fn create_animation(&self, req: &CreateAnimation) -> Result<Animation> {
        let url = format!("{}/animations/", self.base_url);
        self.post_json(url, req, &format!("explanation {}", req.explanation_id))
            .await
    }

    async fn list_animations(&self, explanation_id: Option<i64>) -> Result<Vec<Animation>> {
        let url = format!("{}/animations/", self.base_url);
        let query: Vec<(&str, String)> = explanation_id
            .map(|id| vec![("explanation_id", id.to_string())])
            .unwrap_or_default();
        self.get_json(url, &query, "animations").await
    }

    async fn get_animation(&self, animation_id: i64) -> Result<Animation> {
        let url = format!("{}/animations/{}", self.base_url, animation_id);
        self.get_json(url, &[], &format!("animation {}", animation_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(base_url: &str) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_client_requires_valid_config() {
        let config = ApiConfig {
            base_url: String::new(),
            timeout_secs: 5,
        };
        assert!(ApiClient::new(&config).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_is_normalized() {
        let client = client_for("http://localhost:8000/api/v1/");
        assert_eq!(client.base_url(), "http://localhost:8000/api/v1");
    }

    #[test]
    fn test_media_url_derivation() {
        let client = client_for("http://localhost:8000/api/v1");
        assert_eq!(
            client.animation_file_url(42),
            "http://localhost:8000/api/v1/animations/42/file"
        );
        assert_eq!(
            client.animation_thumbnail_url(42),
            "http://localhost:8000/api/v1/animations/42/thumbnail"
        );
    }
}
