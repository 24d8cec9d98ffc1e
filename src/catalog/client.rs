use crate::config::CatalogConfig;
use reqwest::Client;
use std::sync::OnceLock;
use std::time::Duration;
use u7d_common::{Error, Program, RequestIdentity, ResolvedProgram, Result};

/// Resolves request identities to programs.
#[async_trait::async_trait]
pub trait CatalogResolver: Send + Sync {
    /// Look up the program a request refers to.
    ///
    /// Any failure (non-success status, timeout, transport error, missing
    /// program id) is an [`Error::NotFound`]. No retries.
    async fn resolve(&self, identity: &RequestIdentity) -> Result<Program>;
}

/// Catalog client talking to the EPG service over HTTP.
///
/// The underlying [`Client`] is built on first use and shared by every
/// lookup afterwards.
pub struct EpgClient {
    client: OnceLock<Client>,
    base_url: String,
    connect_timeout: Duration,
}

impl EpgClient {
    pub fn new(config: &CatalogConfig) -> Self {
        Self::with_base_url(config.base_url(), config.connect_timeout())
    }

    pub fn with_base_url(base_url: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            client: OnceLock::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            connect_timeout,
        }
    }

    fn client(&self) -> &Client {
        self.client.get_or_init(|| {
            tracing::debug!(
                base_url = %self.base_url,
                connect_timeout_ms = self.connect_timeout.as_millis() as u64,
                "Creating catalog HTTP client"
            );
            Client::builder()
                .connect_timeout(self.connect_timeout)
                .build()
                .unwrap_or_else(|e| {
                    tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                    Client::new()
                })
        })
    }

    fn url(&self, identity: &RequestIdentity) -> String {
        format!(
            "{}/get_program_id/{}/{}/{}",
            self.base_url, identity.channel_id, identity.channel_key, identity.token
        )
    }

    async fn fetch(&self, url: &str) -> anyhow::Result<Option<Program>> {
        let response = self.client().get(url).send().await?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "Catalog lookup rejected: {}", url);
            return Ok(None);
        }

        let resolved: ResolvedProgram = response.json().await?;
        Ok(resolved.into_program())
    }
}

#[async_trait::async_trait]
impl CatalogResolver for EpgClient {
    async fn resolve(&self, identity: &RequestIdentity) -> Result<Program> {
        let url = self.url(identity);

        match self.fetch(&url).await {
            Ok(Some(program)) => {
                tracing::debug!(
                    channel_id = %program.channel_id,
                    program_id = %program.program_id,
                    offset = %program.offset,
                    "Resolved {}",
                    identity
                );
                Ok(program)
            }
            Ok(None) => Err(Error::not_found(identity)),
            Err(e) => {
                tracing::debug!("Catalog GET {} failed: {:?}", url, e);
                Err(Error::not_found(identity))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn identity() -> RequestIdentity {
        RequestIdentity::new("1", "2", "video-abc")
    }

    async fn client_for(server: &MockServer) -> EpgClient {
        EpgClient::with_base_url(server.uri(), Duration::from_secs(2))
    }

    #[tokio::test]
    async fn test_resolve_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_program_id/1/2/video-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "channel_id": "1",
                "program_id": "99",
                "offset": "30",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let program = client_for(&server).await.resolve(&identity()).await.unwrap();
        assert_eq!(program.channel_id, "1");
        assert_eq!(program.program_id, "99");
        assert_eq!(program.offset, "30");
    }

    #[tokio::test]
    async fn test_resolve_numeric_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_program_id/1/2/video-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "channel_id": 1,
                "program_id": 99,
                "offset": 30,
            })))
            .mount(&server)
            .await;

        let program = client_for(&server).await.resolve(&identity()).await.unwrap();
        assert_eq!(program.program_id, "99");
        assert_eq!(program.offset, "30");
    }

    #[tokio::test]
    async fn test_resolve_non_success_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "status": "1/2/video-abc not found",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server).await.resolve(&identity()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(err.to_string(), "1/2/video-abc not found");
    }

    #[tokio::test]
    async fn test_resolve_missing_program_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "channel_id": "1",
                "offset": "0",
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).await.resolve(&identity()).await.unwrap_err();
        assert_eq!(err.to_string(), "1/2/video-abc not found");
    }

    #[tokio::test]
    async fn test_resolve_garbage_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.resolve(&identity()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_unreachable() {
        // Grab a free port, then release it so nothing is listening there.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = EpgClient::with_base_url(format!("http://{addr}"), Duration::from_secs(2));
        let err = client.resolve(&identity()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_connect_timeout() {
        // Non-routable address: the TCP handshake never completes.
        let client =
            EpgClient::with_base_url("http://10.255.255.1:8889", Duration::from_millis(200));

        let started = std::time::Instant::now();
        let err = tokio::time::timeout(Duration::from_secs(5), client.resolve(&identity()))
            .await
            .expect("connect timeout not applied")
            .unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(err.to_string(), "1/2/video-abc not found");
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_client_is_reused() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let _ = client.resolve(&identity()).await;
        let first = client.client() as *const Client;
        let _ = client.resolve(&identity()).await;
        assert_eq!(first, client.client() as *const Client);
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let client = EpgClient::with_base_url("http://127.0.0.1:8889/", Duration::from_secs(2));
        assert_eq!(
            client.url(&identity()),
            "http://127.0.0.1:8889/get_program_id/1/2/video-abc"
        );
    }
}
