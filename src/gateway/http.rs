use crate::core::credentials::CredentialProvider;
use crate::core::error::SyncError;
use crate::core::fund::{FavoriteMark, Fund, FundId, FundSummary, MetricsRecord};
use crate::core::gateway::FundGateway;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Debug, Deserialize)]
struct FundResponse {
    id: i64,
    #[serde(alias = "cnpj")]
    tax_id: String,
    name: String,
    #[serde(default, alias = "class_name", alias = "classe")]
    asset_class: Option<String>,
    #[serde(default, alias = "rentabilidade")]
    rentability: Option<f64>,
    #[serde(default, alias = "risk", alias = "risco")]
    volatility: Option<f64>,
    #[serde(default)]
    sharpe: Option<f64>,
}

impl From<FundResponse> for Fund {
    fn from(row: FundResponse) -> Self {
        let summary = match (row.rentability, row.volatility, row.sharpe) {
            (Some(rentability), Some(volatility), Some(sharpe)) => Some(FundSummary {
                rentability,
                volatility,
                sharpe,
            }),
            _ => None,
        };
        Fund {
            id: FundId(row.id),
            tax_id: row.tax_id,
            name: row.name,
            asset_class: row.asset_class,
            summary,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FavoriteResponse {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct MetricsResponse {
    #[serde(alias = "rentabilidade")]
    rentability: f64,
    #[serde(alias = "volatilidade", alias = "risk")]
    volatility: f64,
    sharpe: f64,
    #[serde(default, alias = "n")]
    observations: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    detail: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

/// What a non-success status means depends on the endpoint.
#[derive(Debug, Clone, Copy)]
enum Endpoint {
    Listing,
    Metrics,
    FavoriteWrite,
    Report,
}

pub struct HttpGateway {
    base_url: Url,
    client: reqwest::Client,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpGateway {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, SyncError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| SyncError::InvalidUrl(format!("{base_url}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(SyncError::InvalidUrl(format!(
                "{base_url}: not a hierarchical URL"
            )));
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("fundmatch/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: parsed,
            client,
            credentials,
        })
    }

    /// Appends `segments` to the base URL. Each segment is percent-encoded on
    /// its own, so a tax id like `00.017.024/0001-53` stays one segment. An
    /// empty last segment yields a trailing slash.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Hierarchical base checked in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorized(&self, method: Method, url: Url) -> Result<RequestBuilder, SyncError> {
        let token = self.credentials.bearer_token()?;
        debug!("Requesting {} {}", method, url);
        Ok(self.client.request(method, url).bearer_auth(token))
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        endpoint: Endpoint,
        key: &str,
    ) -> Result<Response, SyncError> {
        let response = self.authorized(method, url)?.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| match e.detail {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or(body);
        Err(classify(status, endpoint, key, detail))
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, SyncError> {
        let url = self.url(segments);
        let what = url.path().to_string();
        let response = self.send(Method::GET, url, Endpoint::Listing, &what).await?;
        decode(response, &what).await
    }

    async fn write_favorite(&self, method: Method, fund_id: FundId) -> Result<(), SyncError> {
        let url = self.url(&["favorites", &fund_id.to_string()]);
        let what = url.path().to_string();
        self.send(method, url, Endpoint::FavoriteWrite, &what).await?;
        Ok(())
    }
}

fn classify(status: StatusCode, endpoint: Endpoint, key: &str, detail: String) -> SyncError {
    match (status, endpoint) {
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => SyncError::Authentication(detail),
        (StatusCode::NOT_FOUND, Endpoint::Metrics) => SyncError::MetricsUnavailable {
            key: key.to_string(),
            reason: detail,
        },
        (_, Endpoint::Metrics) if status.is_server_error() => SyncError::MetricsUnavailable {
            key: key.to_string(),
            reason: format!("{status}: {detail}"),
        },
        (StatusCode::NOT_FOUND, _) => SyncError::NotFound(detail),
        (StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY, _) => {
            SyncError::Validation(detail)
        }
        _ => SyncError::Server {
            status: status.as_u16(),
            detail,
        },
    }
}

async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T, SyncError> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        error!(error = ?e, response = %text, "Failed to parse gateway response");
        SyncError::Decode(format!("{what}: {e}"))
    })
}

#[async_trait]
impl FundGateway for HttpGateway {
    async fn list_funds(&self) -> Result<Vec<Fund>, SyncError> {
        let rows: Vec<FundResponse> = self.get_json(&["funds", ""]).await?;
        Ok(rows.into_iter().map(Fund::from).collect())
    }

    async fn list_favorites(&self) -> Result<Vec<FavoriteMark>, SyncError> {
        let rows: Vec<FavoriteResponse> = self.get_json(&["favorites", ""]).await?;
        Ok(rows
            .into_iter()
            .map(|row| FavoriteMark { id: FundId(row.id) })
            .collect())
    }

    async fn list_recommendations(&self) -> Result<Vec<Fund>, SyncError> {
        let rows: Vec<FundResponse> = self.get_json(&["recommendations", ""]).await?;
        Ok(rows.into_iter().map(Fund::from).collect())
    }

    async fn fetch_metrics(&self, tax_id: &str) -> Result<MetricsRecord, SyncError> {
        let url = self.url(&["funds", tax_id, "metrics"]);
        let what = url.path().to_string();
        let response = self
            .send(Method::GET, url, Endpoint::Metrics, tax_id)
            .await?;
        let metrics: MetricsResponse = decode(response, &what).await?;
        Ok(MetricsRecord {
            rentability: metrics.rentability,
            volatility: metrics.volatility,
            sharpe: metrics.sharpe,
            observations: metrics.observations,
        })
    }

    async fn add_favorite(&self, fund_id: FundId) -> Result<(), SyncError> {
        self.write_favorite(Method::POST, fund_id).await
    }

    async fn remove_favorite(&self, fund_id: FundId) -> Result<(), SyncError> {
        self.write_favorite(Method::DELETE, fund_id).await
    }

    async fn generate_report(&self) -> Result<Vec<u8>, SyncError> {
        let url = self.url(&["report", "generate"]);
        let response = self
            .send(Method::GET, url, Endpoint::Report, "report")
            .await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn health(&self) -> Result<String, SyncError> {
        let url = self.url(&["health"]);
        debug!("Requesting GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Server {
                status: status.as_u16(),
                detail: response.text().await.unwrap_or_default(),
            });
        }
        let health: HealthResponse = decode(response, "/health").await?;
        Ok(health.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::credentials::{MissingToken, StaticToken};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "test-token";

    async fn create_mock_server(
        verb: &str,
        request_path: &str,
        response: ResponseTemplate,
    ) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method(verb))
            .and(path(request_path))
            .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn gateway(server: &MockServer) -> HttpGateway {
        HttpGateway::new(
            &server.uri(),
            Duration::from_secs(5),
            Arc::new(StaticToken::new(TOKEN)),
        )
        .unwrap()
    }

    const FUNDS_JSON: &str = r#"[
        {
            "id": 1,
            "cnpj": "00.017.024/0001-53",
            "name": "Fundo Alpha",
            "class_name": "Renda Fixa",
            "rentability": 0.12,
            "risk": 0.03,
            "sharpe": 1.4
        },
        {
            "id": 2,
            "tax_id": "11.222.333/0001-44",
            "name": "Fundo Beta",
            "classe": "Multimercado"
        }
    ]"#;

    #[tokio::test]
    async fn test_list_funds_accepts_legacy_field_names() {
        let server =
            create_mock_server("GET", "/funds/", ResponseTemplate::new(200).set_body_string(FUNDS_JSON))
                .await;

        let funds = gateway(&server).list_funds().await.unwrap();

        assert_eq!(funds.len(), 2);
        assert_eq!(funds[0].id, FundId(1));
        assert_eq!(funds[0].tax_id, "00.017.024/0001-53");
        assert_eq!(funds[0].asset_class.as_deref(), Some("Renda Fixa"));
        let summary = funds[0].summary.unwrap();
        assert_eq!(summary.volatility, 0.03);
        assert_eq!(funds[1].tax_id, "11.222.333/0001-44");
        assert_eq!(funds[1].asset_class.as_deref(), Some("Multimercado"));
        assert!(funds[1].summary.is_none());
    }

    #[tokio::test]
    async fn test_list_favorites_keeps_ids_only() {
        let server = create_mock_server(
            "GET",
            "/favorites/",
            ResponseTemplate::new(200).set_body_string(FUNDS_JSON),
        )
        .await;

        let favorites = gateway(&server).list_favorites().await.unwrap();
        assert_eq!(
            favorites,
            vec![FavoriteMark { id: FundId(1) }, FavoriteMark { id: FundId(2) }]
        );
    }

    #[tokio::test]
    async fn test_fetch_metrics() {
        let server = create_mock_server(
            "GET",
            "/funds/12345/metrics",
            ResponseTemplate::new(200)
                .set_body_string(r#"{"rentability": 0.08, "volatility": 0.01, "sharpe": 2.1, "n": 250}"#),
        )
        .await;

        let metrics = gateway(&server).fetch_metrics("12345").await.unwrap();
        assert_eq!(metrics.rentability, 0.08);
        assert_eq!(metrics.volatility, 0.01);
        assert_eq!(metrics.sharpe, 2.1);
        assert_eq!(metrics.observations, Some(250));
    }

    #[tokio::test]
    async fn test_fetch_metrics_keeps_slashed_tax_id_in_one_segment() {
        let server = create_mock_server(
            "GET",
            "/funds/00.017.024%2F0001-53/metrics",
            ResponseTemplate::new(200)
                .set_body_string(r#"{"rentability": 0.05, "volatility": 0.02, "sharpe": 0.7}"#),
        )
        .await;

        let metrics = gateway(&server)
            .fetch_metrics("00.017.024/0001-53")
            .await
            .unwrap();
        assert_eq!(metrics.sharpe, 0.7);
        assert_eq!(metrics.observations, None);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.path(), "/funds/00.017.024%2F0001-53/metrics");
    }

    #[tokio::test]
    async fn test_base_url_path_prefix_is_kept() {
        let server = create_mock_server(
            "GET",
            "/api/funds/",
            ResponseTemplate::new(200).set_body_string("[]"),
        )
        .await;

        let gateway = HttpGateway::new(
            &format!("{}/api/", server.uri()),
            Duration::from_secs(5),
            Arc::new(StaticToken::new(TOKEN)),
        )
        .unwrap();
        assert!(gateway.list_funds().await.unwrap().is_empty());
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = HttpGateway::new(
            "not a url",
            Duration::from_secs(5),
            Arc::new(StaticToken::new(TOKEN)),
        );
        assert!(matches!(result, Err(SyncError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_metrics_not_found() {
        let server = create_mock_server(
            "GET",
            "/funds/999/metrics",
            ResponseTemplate::new(404).set_body_string(r#"{"detail": "Fund not found"}"#),
        )
        .await;

        let err = gateway(&server).fetch_metrics("999").await.unwrap_err();
        match err {
            SyncError::MetricsUnavailable { key, reason } => {
                assert_eq!(key, "999");
                assert_eq!(reason, "Fund not found");
            }
            other => panic!("Expected MetricsUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_authentication() {
        let server = create_mock_server(
            "GET",
            "/recommendations/",
            ResponseTemplate::new(401).set_body_string(r#"{"detail": "Could not validate credentials"}"#),
        )
        .await;

        let err = gateway(&server).list_recommendations().await.unwrap_err();
        assert!(err.requires_login());
        assert_eq!(
            err.to_string(),
            "Authentication failed: Could not validate credentials"
        );
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .expect(0)
            .mount(&server)
            .await;

        let gateway =
            HttpGateway::new(&server.uri(), Duration::from_secs(5), Arc::new(MissingToken)).unwrap();
        assert!(gateway.list_funds().await.unwrap_err().requires_login());
    }

    #[tokio::test]
    async fn test_add_favorite_conflict_is_validation() {
        let server = create_mock_server(
            "POST",
            "/favorites/3",
            ResponseTemplate::new(409).set_body_string(r#"{"detail": "Already a favorite"}"#),
        )
        .await;

        let err = gateway(&server).add_favorite(FundId(3)).await.unwrap_err();
        assert!(matches!(err, SyncError::Validation(ref msg) if msg == "Already a favorite"));
    }

    #[tokio::test]
    async fn test_remove_favorite() {
        let server = create_mock_server(
            "DELETE",
            "/favorites/3",
            ResponseTemplate::new(200).set_body_string(r#"{"message": "Removed from favorites"}"#),
        )
        .await;
        assert!(gateway(&server).remove_favorite(FundId(3)).await.is_ok());

        let err = gateway(&server).remove_favorite(FundId(4)).await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_generate_report_returns_bytes() {
        let server = create_mock_server(
            "GET",
            "/report/generate",
            ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 body".to_vec()),
        )
        .await;

        let payload = gateway(&server).generate_report().await.unwrap();
        assert_eq!(payload, b"%PDF-1.4 body".to_vec());
    }

    #[tokio::test]
    async fn test_server_error_on_listing() {
        let server = create_mock_server(
            "GET",
            "/funds/",
            ResponseTemplate::new(503).set_body_string("maintenance"),
        )
        .await;

        let err = gateway(&server).list_funds().await.unwrap_err();
        assert!(matches!(err, SyncError::Server { status: 503, ref detail } if detail == "maintenance"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = create_mock_server(
            "GET",
            "/funds/",
            ResponseTemplate::new(200).set_body_string(r#"{"not": "a list"}"#),
        )
        .await;

        let err = gateway(&server).list_funds().await.unwrap_err();
        assert!(matches!(err, SyncError::Decode(_)));
    }

    #[tokio::test]
    async fn test_health_needs_no_credential() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status": "ok"}"#))
            .mount(&server)
            .await;

        let gateway =
            HttpGateway::new(&server.uri(), Duration::from_secs(5), Arc::new(MissingToken)).unwrap();
        assert_eq!(gateway.health().await.unwrap(), "ok");
    }
}
