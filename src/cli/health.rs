use std::sync::OnceLock;
use std::time::{Duration, Instant};

use crate::error::DrugLookupError;

#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthRow {
    pub check: String,
    pub status: String,
    pub latency: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthReport {
    pub base_url: String,
    pub healthy: usize,
    pub total: usize,
    pub rows: Vec<HealthRow>,
}

impl HealthReport {
    pub fn all_healthy(&self) -> bool {
        self.healthy == self.total
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Drug Lookup Health Check\n\n");
        out.push_str(&format!("Server: {}\n\n", self.base_url));
        out.push_str("| Check | Status | Latency |\n");
        out.push_str("|-------|--------|---------|\n");
        for row in &self.rows {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                row.check, row.status, row.latency
            ));
        }
        out.push_str(&format!(
            "\nStatus: {}/{} checks healthy\n",
            self.healthy, self.total
        ));
        out
    }
}

fn transport_reason(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connect"
    } else {
        "error"
    }
}

async fn check_page(client: reqwest::Client, check: &str, url: &str) -> HealthRow {
    let start = Instant::now();
    match client.get(url).send().await {
        Ok(resp) => {
            let status = resp.status();
            let elapsed = start.elapsed().as_millis();
            if status.is_success() {
                HealthRow {
                    check: check.to_string(),
                    status: "ok".into(),
                    latency: format!("{elapsed}ms"),
                }
            } else {
                HealthRow {
                    check: check.to_string(),
                    status: "error".into(),
                    latency: format!("{elapsed}ms (HTTP {})", status.as_u16()),
                }
            }
        }
        Err(err) => HealthRow {
            check: check.to_string(),
            status: "error".into(),
            latency: transport_reason(&err).into(),
        },
    }
}

/// Posts a deliberately empty query; a live endpoint rejects it with its
/// `{success: false, error}` envelope.
async fn check_envelope(client: reqwest::Client, check: &str, url: &str) -> HealthRow {
    let start = Instant::now();
    let resp = client
        .post(url)
        .json(&serde_json::json!({ "gnlNmCd": "" }))
        .send()
        .await;
    let resp = match resp {
        Ok(resp) => resp,
        Err(err) => {
            return HealthRow {
                check: check.to_string(),
                status: "error".into(),
                latency: transport_reason(&err).into(),
            };
        }
    };

    let status = resp.status();
    let speaks_envelope = resp
        .json::<serde_json::Value>()
        .await
        .ok()
        .is_some_and(|v| v.get("success").is_some());
    let elapsed = start.elapsed().as_millis();
    if speaks_envelope {
        HealthRow {
            check: check.to_string(),
            status: "ok".into(),
            latency: format!("{elapsed}ms"),
        }
    } else {
        HealthRow {
            check: check.to_string(),
            status: "error".into(),
            latency: format!("{elapsed}ms (HTTP {}, no JSON envelope)", status.as_u16()),
        }
    }
}

fn health_http_client() -> Result<reqwest::Client, DrugLookupError> {
    static HEALTH_HTTP_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

    if let Some(client) = HEALTH_HTTP_CLIENT.get() {
        return Ok(client.clone());
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .connect_timeout(Duration::from_secs(5))
        .user_agent(concat!("drug-lookup/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(DrugLookupError::HttpClientInit)?;

    Ok(HEALTH_HTTP_CLIENT.get_or_init(|| client).clone())
}

/// Probes the search server's index page and identical-ingredient endpoint.
///
/// # Errors
///
/// Returns an error when the HTTP client cannot be created.
pub async fn check(base_url: &str) -> Result<HealthReport, DrugLookupError> {
    let client = health_http_client()?;
    let base = base_url.trim_end_matches('/');

    let index_url = format!("{base}/");
    let identical_url = format!("{base}/api/identical");
    let (index, identical) = tokio::join!(
        check_page(client.clone(), "Index page", &index_url),
        check_envelope(client.clone(), "Identical API", &identical_url),
    );
    let rows = vec![index, identical];
    let healthy = rows.iter().filter(|r| r.status == "ok").count();

    Ok(HealthReport {
        base_url: base.to_string(),
        healthy,
        total: rows.len(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn check_reports_live_server_healthy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/identical"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "success": false,
                "error": "성분코드가 필요합니다."
            })))
            .mount(&server)
            .await;

        let report = check(&server.uri()).await.unwrap();
        assert!(report.all_healthy(), "{report:?}");
        assert_eq!(report.total, 2);
        let markdown = report.to_markdown();
        assert!(markdown.contains("| Index page | ok |"));
        assert!(markdown.contains("Status: 2/2 checks healthy"));
    }

    #[tokio::test]
    async fn check_flags_endpoint_without_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/identical"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let report = check(&server.uri()).await.unwrap();
        assert!(!report.all_healthy());
        assert_eq!(report.healthy, 1);
        assert_eq!(report.rows[1].status, "error");
        assert!(report.rows[1].latency.contains("HTTP 404"));
    }
}
