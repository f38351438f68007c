use std::time::Instant;

use http::Extensions;
use reqwest_middleware::{Middleware, Next};
use tracing::debug;

/// Logs every outgoing request with its status and latency.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct RequestLogMiddleware;

fn outcome_label(result: &reqwest_middleware::Result<reqwest::Response>) -> String {
    match result {
        Ok(resp) => resp.status().as_u16().to_string(),
        Err(err) if err.is_timeout() => "timeout".to_string(),
        Err(err) if err.is_connect() => "connect".to_string(),
        Err(_) => "error".to_string(),
    }
}

#[async_trait::async_trait]
impl Middleware for RequestLogMiddleware {
    async fn handle(
        &self,
        req: reqwest::Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<reqwest::Response> {
        let method = req.method().clone();
        let url = req.url().clone();
        let start = Instant::now();

        let result = next.run(req, extensions).await;

        debug!(
            method = %method,
            url = %url,
            outcome = outcome_label(&result),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search api request"
        );
        result
    }
}
