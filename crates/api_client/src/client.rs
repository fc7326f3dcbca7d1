//! Backend HTTP client bound to the service base address

use config::HttpClientConfig;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use types::{ApiClientError, FrontEndError};
use url::Url;

pub type ApiResult<T> = std::result::Result<T, ApiClientError>;

/// Shared client for the conference planner backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http_client: Client,
    timeout: Duration,
}

impl ApiClient {
    /// Create a client bound to `base_url`
    pub fn new(base_url: Url, config: &HttpClientConfig) -> types::Result<Self> {
        let request_timeout = Duration::from_secs(config.timeout_seconds);
        let http_client = Client::builder()
            .timeout(request_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| FrontEndError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            http_client,
            timeout: request_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` against the base address.
    ///
    /// Standard URL join rules apply: with base `http://api/v1` the last
    /// segment is replaced, with `http://api/v1/` it is kept.
    pub fn url_for(&self, path: &str) -> ApiResult<Url> {
        self.base_url.join(path).map_err(|e| ApiClientError::InvalidUrl {
            url: path.to_string(),
            message: e.to_string(),
        })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.url_for(path)?;
        let response = self.send(&url, self.http_client.get(url.clone())).await?;
        decode(&url, response).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url_for(path)?;
        let response = self.send(&url, self.http_client.post(url.clone()).json(body)).await?;
        decode(&url, response).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        let url = self.url_for(path)?;
        self.send(&url, self.http_client.delete(url.clone())).await?;
        Ok(())
    }

    /// Probe the base address. Any status below 500 counts as reachable.
    pub async fn health_check(&self) -> ApiResult<Duration> {
        let start = Instant::now();
        let url = self.base_url.clone();

        let response = timeout(self.timeout, self.http_client.get(url.clone()).send())
            .await
            .map_err(|_| ApiClientError::Timeout { url: url.to_string() })?
            .map_err(|e| transport_error(&url, e))?;

        let elapsed = start.elapsed();
        if response.status().is_server_error() {
            return Err(ApiClientError::Http {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(elapsed)
    }

    async fn send(&self, url: &Url, request: RequestBuilder) -> ApiResult<Response> {
        tracing::debug!(url = %url, "Backend request");

        let response = timeout(self.timeout, request.send())
            .await
            .map_err(|_| ApiClientError::Timeout { url: url.to_string() })?
            .map_err(|e| transport_error(url, e))?;

        if !response.status().is_success() {
            tracing::warn!(url = %url, status = response.status().as_u16(), "Backend returned error status");
            return Err(ApiClientError::Http {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response)
    }
}

async fn decode<T: DeserializeOwned>(url: &Url, response: Response) -> ApiResult<T> {
    let bytes = response.bytes().await.map_err(|e| ApiClientError::Decode {
        url: url.to_string(),
        message: format!("error reading response body: {}", e),
    })?;

    serde_json::from_slice(&bytes).map_err(|e| ApiClientError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

fn transport_error(url: &Url, err: reqwest::Error) -> ApiClientError {
    if err.is_timeout() {
        return ApiClientError::Timeout { url: url.to_string() };
    }
    match err.status() {
        Some(status) => ApiClientError::Http {
            url: url.to_string(),
            status: status.as_u16(),
        },
        None => ApiClientError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use wiremock::{
        matchers::{body_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    #[derive(Debug, Deserialize, PartialEq)]
    struct Speaker {
        id: u32,
        name: String,
    }

    fn http_config() -> HttpClientConfig {
        HttpClientConfig {
            timeout_seconds: 5,
            ..HttpClientConfig::default()
        }
    }

    fn client_for(base: &str) -> ApiClient {
        ApiClient::new(Url::parse(base).unwrap(), &http_config()).unwrap()
    }

    #[test]
    fn test_url_for_join_semantics() {
        let with_slash = client_for("http://backend.local/api/");
        assert_eq!(
            with_slash.url_for("Speakers/1").unwrap().as_str(),
            "http://backend.local/api/Speakers/1"
        );

        let without_slash = client_for("http://backend.local/api");
        assert_eq!(
            without_slash.url_for("Speakers/1").unwrap().as_str(),
            "http://backend.local/Speakers/1"
        );

        // Rooted paths replace the base path
        assert_eq!(
            with_slash.url_for("/Sessions").unwrap().as_str(),
            "http://backend.local/Sessions"
        );
    }

    #[tokio::test]
    async fn test_get_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/Speakers/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": 7, "name": "Ada" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&format!("{}/api/", server.uri()));
        let speaker: Speaker = client.get_json("Speakers/7").await.unwrap();
        assert_eq!(speaker, Speaker { id: 7, name: "Ada".to_string() });
    }

    #[tokio::test]
    async fn test_post_json_sends_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Speakers"))
            .and(body_json(serde_json::json!({ "name": "Grace" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "id": 9, "name": "Grace" })))
            .mount(&server)
            .await;

        let client = client_for(&format!("{}/", server.uri()));
        let created: Speaker = client
            .post_json("Speakers", &serde_json::json!({ "name": "Grace" }))
            .await
            .unwrap();
        assert_eq!(created.id, 9);
    }

    #[tokio::test]
    async fn test_error_status_and_bad_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/garbled"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/Speakers/3"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = client_for(&format!("{}/", server.uri()));

        let missing = client.get_json::<Speaker>("missing").await.unwrap_err();
        assert!(matches!(missing, ApiClientError::Http { status: 404, .. }));

        let garbled = client.get_json::<Speaker>("garbled").await.unwrap_err();
        assert!(matches!(garbled, ApiClientError::Decode { .. }));

        client.delete("Speakers/3").await.unwrap();
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let config = HttpClientConfig {
            timeout_seconds: 1,
            ..HttpClientConfig::default()
        };
        let client = ApiClient::new(Url::parse(&format!("{}/", server.uri())).unwrap(), &config).unwrap();

        let err = client.get_json::<Speaker>("slow").await.unwrap_err();
        assert!(matches!(err, ApiClientError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_health_check_status_threshold() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&format!("{}/", server.uri()));
        tokio_test::assert_ok!(client.health_check().await);

        let failing = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&failing)
            .await;

        let client = client_for(&format!("{}/", failing.uri()));
        assert!(matches!(
            client.health_check().await,
            Err(ApiClientError::Http { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_refused_connection_is_transport_error() {
        // Nothing listens on port 9 in the test environment
        let client = client_for("http://127.0.0.1:9/");

        let err = client.health_check().await.unwrap_err();
        assert!(matches!(err, ApiClientError::Transport { .. }));
        assert!(err.to_string().starts_with("Failed to reach backend at http://127.0.0.1:9/"));

        let err = client.get_json::<Speaker>("Speakers").await.unwrap_err();
        assert!(matches!(err, ApiClientError::Transport { .. }));
    }
}
