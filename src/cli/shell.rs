use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{SearchArgs, render_page, submit};
use crate::controller::SearchPageController;
use crate::entities::drug::IdenticalQuery;
use crate::error::DrugLookupError;
use crate::render::page::Page;
use crate::service::SearchService;

const PROMPT: &str = "drug-lookup> ";
const MAX_LINE_LEN: usize = 1024;

#[derive(Parser, Debug)]
#[command(
    name = "drug-lookup shell",
    no_binary_name = true,
    disable_version_flag = true
)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// Submit the search form
    Search(SearchArgs),
    /// Load identical-ingredient products in the background
    Identical { generic_code: String },
    /// Clear the form and hide result panels
    Reset,
    /// Print the current page
    Show,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

enum Step {
    Continue(String),
    Quit,
}

async fn handle_line<S>(
    controller: &SearchPageController<S, Page>,
    line: &str,
    json: bool,
) -> Result<Step, DrugLookupError>
where
    S: SearchService + 'static,
{
    let line = line.trim();
    if line.is_empty() {
        return Ok(Step::Continue(String::new()));
    }
    if line.len() > MAX_LINE_LEN {
        return Ok(Step::Continue("Error: command is too long".into()));
    }
    let Some(args) = shlex::split(line) else {
        return Ok(Step::Continue(format!(
            "Error: Invalid command syntax: {line}"
        )));
    };
    let parsed = match ShellLine::try_parse_from(args) {
        Ok(parsed) => parsed,
        Err(err) => return Ok(Step::Continue(err.to_string().trim_end().to_string())),
    };

    let show = |controller: &SearchPageController<S, Page>| {
        controller.with_view(|page| render_page(page, json))
    };

    match parsed.command {
        ShellCommand::Search(args) => {
            let (_outcome, related) = submit(controller, &args).await;
            let mut text = show(controller)?;
            if related.is_some() {
                text.push_str(
                    "\nLoading identical-ingredient products in the background; run `show` to see them.",
                );
            }
            Ok(Step::Continue(text))
        }
        ShellCommand::Identical { generic_code } => {
            let query = match IdenticalQuery::new(&generic_code) {
                Ok(query) => query,
                Err(err) => return Ok(Step::Continue(format!("Error: {err}"))),
            };
            // Detached: the shell keeps accepting commands meanwhile.
            drop(controller.load_related_records(&query.generic_code));
            Ok(Step::Continue(format!(
                "Loading identical-ingredient products for {} in the background; run `show` to see them.",
                query.generic_code
            )))
        }
        ShellCommand::Reset => {
            controller.reset_form();
            Ok(Step::Continue(show(controller)?))
        }
        ShellCommand::Show => Ok(Step::Continue(show(controller)?)),
        ShellCommand::Quit => Ok(Step::Quit),
    }
}

/// Reads commands from `input` until EOF, `quit`, or `shutdown` fires.
pub async fn run<S, R, W>(
    controller: &SearchPageController<S, Page>,
    input: R,
    mut output: W,
    json: bool,
    shutdown: CancellationToken,
) -> Result<(), DrugLookupError>
where
    S: SearchService + 'static,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let line = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            break;
        };

        match handle_line(controller, &line, json).await? {
            Step::Quit => break,
            Step::Continue(text) if text.is_empty() => {}
            Step::Continue(text) => {
                output.write_all(text.as_bytes()).await?;
                if !text.ends_with('\n') {
                    output.write_all(b"\n").await?;
                }
            }
        }
    }
    debug!("shell session ended");
    output.flush().await?;
    Ok(())
}

pub async fn run_stdio<S>(service: Arc<S>, json: bool) -> Result<(), DrugLookupError>
where
    S: SearchService + 'static,
{
    let shutdown = CancellationToken::new();

    let cancel = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let controller = SearchPageController::new(service, Page::default());
    run(
        &controller,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        json,
        shutdown,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::search_api::SearchApiClient;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "isIdenticalSearch": false,
                "results": [{"itmNm": "아시콘정", "gnlNmCd": "281700ATB"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/identical"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "results": [{"제품명": "아시콘정"}, {"제품명": "아세클로페낙정"}]
            })))
            .mount(&server)
            .await;
        server
    }

    async fn session(
        server: &MockServer,
        input: &str,
    ) -> (SearchPageController<SearchApiClient, Page>, String) {
        let client = SearchApiClient::with_base(&server.uri()).unwrap();
        let controller = SearchPageController::new(Arc::new(client), Page::default());
        let mut output = Vec::new();
        run(
            &controller,
            input.as_bytes(),
            &mut output,
            false,
            CancellationToken::new(),
        )
        .await
        .unwrap();
        (controller, String::from_utf8(output).unwrap())
    }

    #[tokio::test]
    async fn search_then_reset_hides_results() {
        let server = mock_server().await;
        let (controller, output) =
            session(&server, "search -n 아시콘정\nreset\nquit\nshow\n").await;

        assert!(output.contains("## 검색 결과 (1건)"));
        assert!(output.contains("### 1. 아시콘정"));
        // `show` after `quit` never runs.
        assert_eq!(output.matches("# 의약품 검색").count(), 2);
        controller.with_view(|page| {
            assert!(page.visible_panels().is_empty());
            assert_eq!(page.form.item_name, "");
        });
    }

    #[tokio::test]
    async fn bad_lines_report_errors_and_keep_going() {
        let server = mock_server().await;
        let (_controller, output) =
            session(&server, "frobnicate\nsearch -n \"unterminated\nidentical \" \"\nshow\n").await;

        assert!(output.contains("unrecognized subcommand"));
        assert!(output.contains("Invalid command syntax"));
        assert!(output.contains("Generic code is required"));
        assert!(output.contains("# 의약품 검색"));
    }

    #[tokio::test]
    async fn blank_search_shows_validation_message() {
        let server = mock_server().await;
        let (_controller, output) = session(&server, "search\n").await;
        assert!(output.contains("> 최소 하나의 검색 조건을 입력해주세요."));
    }

    #[tokio::test]
    async fn identical_loads_in_background() {
        let server = mock_server().await;
        let (controller, output) = session(&server, "identical 281700ATB\n").await;
        assert!(output.contains("in the background"));

        let mut shown = false;
        for _ in 0..100 {
            shown = controller.with_view(|page| page.identical.visible);
            if shown {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(shown);
        controller.with_view(|page| assert_eq!(page.identical.count_label, "2건"));
    }

    #[tokio::test]
    async fn cancelled_session_stops_reading() {
        let server = mock_server().await;
        let client = SearchApiClient::with_base(&server.uri()).unwrap();
        let controller = SearchPageController::new(Arc::new(client), Page::default());
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let mut output = Vec::new();
        run(
            &controller,
            "search -n 아시콘정\n".as_bytes(),
            &mut output,
            false,
            shutdown,
        )
        .await
        .unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(!output.contains("검색 결과"));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }
}
