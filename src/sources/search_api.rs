use std::borrow::Cow;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::entities::drug::{IdenticalQuery, IdenticalResponse, SearchQuery, SearchResponse};
use crate::error::DrugLookupError;
use crate::service::SearchService;

pub const SEARCH_API_BASE: &str = "http://127.0.0.1:5000";
pub(crate) const SEARCH_API: &str = "search-api";
pub const SEARCH_API_BASE_ENV: &str = "DRUG_LOOKUP_BASE";

const SEARCH_PATH: &str = "/api/search";
const IDENTICAL_PATH: &str = "/api/identical";

fn de_null_as_empty<'de, D>(deserializer: D) -> Result<Vec<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// `/api/search` envelope as sent by the server. Rows stay untyped until
/// normalization because their keys vary by data source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSearchResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "de_null_as_empty")]
    pub results: Vec<serde_json::Value>,
    #[serde(rename = "isIdenticalSearch", default)]
    pub is_identical_search: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawIdenticalResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "de_null_as_empty")]
    pub results: Vec<serde_json::Value>,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub error: Option<String>,
}

pub struct SearchApiClient {
    client: reqwest_middleware::ClientWithMiddleware,
    base: Cow<'static, str>,
}

impl SearchApiClient {
    pub fn new() -> Result<Self, DrugLookupError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: crate::sources::env_base(SEARCH_API_BASE, SEARCH_API_BASE_ENV),
        })
    }

    pub fn with_base(base: &str) -> Result<Self, DrugLookupError> {
        let base = base.trim();
        if base.is_empty() {
            return Err(DrugLookupError::InvalidArgument(
                "--base-url must not be empty".into(),
            ));
        }
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: Cow::Owned(base.to_string()),
        })
    }

    pub fn base(&self) -> &str {
        self.base.as_ref()
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base.as_ref().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DrugLookupError> {
        let url = self.endpoint(path);
        let resp = self.client.post(&url).json(body).send().await?;
        let status = resp.status();
        let content_type = resp.headers().get(reqwest::header::CONTENT_TYPE).cloned();
        let bytes = crate::sources::read_limited_body(resp, SEARCH_API).await?;

        if !status.is_success() {
            // The server answers rejected or failed searches with a
            // `{success: false, error}` envelope and a 4xx/5xx status.
            if let Some(envelope) = parse_error_envelope(&bytes) {
                debug!(%status, path, "search api returned an error envelope");
                return serde_json::from_value(envelope).map_err(|source| {
                    DrugLookupError::ApiJson {
                        api: SEARCH_API.to_string(),
                        source,
                    }
                });
            }
            let excerpt = crate::sources::body_excerpt(&bytes);
            return Err(DrugLookupError::Api {
                api: SEARCH_API.to_string(),
                message: format!("HTTP {status}: {excerpt}"),
            });
        }

        crate::sources::ensure_json_content_type(SEARCH_API, content_type.as_ref(), &bytes)?;
        serde_json::from_slice(&bytes).map_err(|source| DrugLookupError::ApiJson {
            api: SEARCH_API.to_string(),
            source,
        })
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, DrugLookupError> {
        let raw: RawSearchResponse = self.post_json(SEARCH_PATH, query).await?;
        Ok(crate::transform::drug::from_search_response(raw))
    }

    pub async fn identical(
        &self,
        query: &IdenticalQuery,
    ) -> Result<IdenticalResponse, DrugLookupError> {
        let raw: RawIdenticalResponse = self.post_json(IDENTICAL_PATH, query).await?;
        Ok(crate::transform::drug::from_identical_response(raw))
    }
}

fn parse_error_envelope(bytes: &[u8]) -> Option<serde_json::Value> {
    let value: serde_json::Value = serde_json::from_slice(bytes).ok()?;
    value
        .as_object()
        .is_some_and(|obj| obj.contains_key("success"))
        .then_some(value)
}

#[async_trait::async_trait]
impl SearchService for SearchApiClient {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, DrugLookupError> {
        SearchApiClient::search(self, query).await
    }

    async fn identical(
        &self,
        query: &IdenticalQuery,
    ) -> Result<IdenticalResponse, DrugLookupError> {
        SearchApiClient::identical(self, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::drug::SearchForm;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn aspirin_query() -> SearchQuery {
        SearchForm {
            item_name: "Aspirin".into(),
            ..SearchForm::default()
        }
        .to_query()
        .unwrap()
    }

    #[tokio::test]
    async fn search_posts_full_body_and_normalizes_rows() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "itmNm": "Aspirin",
                "gnlNmCd": "",
                "mdsCd": "",
                "mnfEntpNm": "",
                "num_rows": 20
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "isIdenticalSearch": false,
                "results": [
                    {"itmNm": "아스피린정", "gnlNmCd": "110701ATB", "mdsCd": "A1", "mnfEntpNm": "바이엘"},
                    {"품목명": "아스피린프로텍트정", "주성분코드": "110702ATE"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = SearchApiClient::with_base(&server.uri()).unwrap();
        let resp = client.search(&aspirin_query()).await.unwrap();

        assert!(resp.success);
        assert_eq!(resp.results.len(), 2);
        assert_eq!(resp.results[0].manufacturer, "바이엘");
        assert_eq!(resp.results[1].title, "아스피린프로텍트정");
        assert_eq!(resp.results[1].generic_code, "110702ATE");
        assert_eq!(resp.results[1].product_code, "N/A");
    }

    #[tokio::test]
    async fn search_treats_missing_results_as_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "success": true })),
            )
            .mount(&server)
            .await;

        let client = SearchApiClient::with_base(&server.uri()).unwrap();
        let resp = client.search(&aspirin_query()).await.unwrap();
        assert!(resp.success);
        assert!(resp.results.is_empty());
        assert!(!resp.is_identical_search);
    }

    #[tokio::test]
    async fn error_status_with_envelope_is_an_application_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "success": false,
                "error": "의약품 데이터를 로드할 수 없습니다."
            })))
            .mount(&server)
            .await;

        let client = SearchApiClient::with_base(&server.uri()).unwrap();
        let resp = client.search(&aspirin_query()).await.unwrap();
        assert!(!resp.success);
        assert_eq!(
            resp.error.as_deref(),
            Some("의약품 데이터를 로드할 수 없습니다.")
        );
    }

    #[tokio::test]
    async fn error_status_without_envelope_is_an_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let client = SearchApiClient::with_base(&server.uri()).unwrap();
        let err = client.search(&aspirin_query()).await.unwrap_err();
        assert!(matches!(err, DrugLookupError::Api { .. }));
        let msg = err.to_string();
        assert!(msg.contains("502"));
        assert!(msg.contains("Bad Gateway"));
    }

    #[tokio::test]
    async fn malformed_body_is_a_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_string("{\"success\": tru"),
            )
            .mount(&server)
            .await;

        let client = SearchApiClient::with_base(&server.uri()).unwrap();
        let err = client.search(&aspirin_query()).await.unwrap_err();
        assert!(matches!(err, DrugLookupError::ApiJson { .. }));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn identical_posts_generic_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/identical"))
            .and(body_json(serde_json::json!({ "gnlNmCd": "281700ATB" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "count": 1,
                "results": [{"제품명": "아시콘정", "주성분코드": "281700ATB", "제품코드": "A03850091", "제조업체명": "건일제약"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = SearchApiClient::with_base(&format!("{}/", server.uri())).unwrap();
        let resp = client
            .identical(&IdenticalQuery::new("281700ATB").unwrap())
            .await
            .unwrap();
        assert_eq!(resp.count, Some(1));
        assert_eq!(resp.results[0].title, "아시콘정");
        assert_eq!(resp.results[0].manufacturer, "건일제약");
    }

    #[test]
    fn with_base_rejects_blank_url() {
        let err = SearchApiClient::with_base("  ").err().expect("blank base");
        assert!(matches!(err, DrugLookupError::InvalidArgument(_)));
    }
}
