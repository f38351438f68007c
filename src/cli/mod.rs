//! Command-line surface: one-shot searches, the interactive shell, and health checks.

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::warn;

use crate::controller::SearchPageController;
use crate::controller::state::SearchOutcome;
use crate::controller::view::Panel;
use crate::entities::drug::{CODE_FALLBACK, IdenticalQuery, SearchForm};
use crate::render::page::Page;
use crate::service::SearchService;
use crate::sources::search_api::SearchApiClient;

pub mod health;
pub mod shell;

#[derive(Parser, Debug)]
#[command(
    name = "drug-lookup",
    version,
    about = "Search drug products and list products with identical ingredients"
)]
pub struct Cli {
    /// Search server base URL (default: $DRUG_LOOKUP_BASE or http://127.0.0.1:5000)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Print the result page as JSON instead of markdown
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search by item name, generic code, product code, or manufacturer
    Search(SearchArgs),
    /// List products sharing a generic (ingredient) code
    Identical {
        /// Generic code, e.g. 281700ATB
        generic_code: String,
    },
    /// Interactive session keeping one search page open
    Shell,
    /// Check that the search server is reachable
    Health,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Item (product) name, e.g. 졸피드정
    #[arg(short = 'n', long = "item-name")]
    pub item_name: Option<String>,

    /// Generic (ingredient) code, e.g. 281700ATB
    #[arg(short = 'g', long = "generic-code")]
    pub generic_code: Option<String>,

    /// Product code, e.g. A03850091
    #[arg(short = 'p', long = "product-code")]
    pub product_code: Option<String>,

    /// Manufacturer name, e.g. 건일제약
    #[arg(short = 'm', long)]
    pub manufacturer: Option<String>,

    /// Also list identical-ingredient products for the first result
    #[arg(long)]
    pub related: bool,
}

impl SearchArgs {
    pub fn to_form(&self) -> SearchForm {
        SearchForm {
            item_name: self.item_name.clone().unwrap_or_default(),
            generic_code: self.generic_code.clone().unwrap_or_default(),
            product_code: self.product_code.clone().unwrap_or_default(),
            manufacturer: self.manufacturer.clone().unwrap_or_default(),
        }
    }
}

/// Rendered command output plus whether the action succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub text: String,
    pub success: bool,
}

pub fn search_client(base_url: Option<&str>) -> Result<SearchApiClient, crate::error::DrugLookupError> {
    match base_url {
        Some(base) => SearchApiClient::with_base(base),
        None => SearchApiClient::new(),
    }
}

pub fn render_page(page: &Page, json: bool) -> Result<String, crate::error::DrugLookupError> {
    if json {
        crate::render::json::to_pretty(page)
    } else {
        crate::render::markdown::page_markdown(page)
    }
}

/// Generic code of the first main-panel card, if it has a real one.
pub(crate) fn first_generic_code(page: &Page) -> Option<String> {
    page.panel(Panel::Main)
        .cards
        .first()
        .and_then(|card| card.field("성분코드"))
        .map(str::trim)
        .filter(|code| !code.is_empty() && *code != CODE_FALLBACK)
        .map(str::to_string)
}

/// Submits one search. With `args.related`, a main-panel success also
/// starts the identical-ingredient lookup for the first result; the task
/// handle is returned so one-shot callers can wait for it.
pub(crate) async fn submit<S>(
    controller: &SearchPageController<S, Page>,
    args: &SearchArgs,
) -> (SearchOutcome, Option<tokio::task::JoinHandle<()>>)
where
    S: SearchService + 'static,
{
    let outcome = controller.submit_search(args.to_form()).await;
    let related = match &outcome {
        SearchOutcome::Success {
            panel: Panel::Main, ..
        } if args.related => controller
            .with_view(first_generic_code)
            .map(|code| controller.load_related_records(&code)),
        _ => None,
    };
    (outcome, related)
}

async fn run_search<S>(service: Arc<S>, args: &SearchArgs, json: bool) -> anyhow::Result<RunOutput>
where
    S: SearchService + 'static,
{
    let controller = SearchPageController::new(service, Page::default());
    let (outcome, related) = submit(&controller, args).await;
    if let Some(handle) = related {
        if let Err(err) = handle.await {
            warn!(error = %err, "identical-ingredient task did not finish");
        }
    }

    let text = controller.with_view(|page| render_page(page, json))?;
    Ok(RunOutput {
        text,
        success: outcome.is_success(),
    })
}

async fn run_identical<S>(service: Arc<S>, generic_code: &str, json: bool) -> anyhow::Result<RunOutput>
where
    S: SearchService + 'static,
{
    let query = IdenticalQuery::new(generic_code)?;
    let controller = SearchPageController::new(service, Page::default());
    if let Err(err) = controller.load_related_records(&query.generic_code).await {
        warn!(error = %err, "identical-ingredient task did not finish");
    }

    let (text, shown) = controller.with_view(|page| {
        (
            render_page(page, json),
            page.panel(Panel::Identical).visible,
        )
    });
    let mut text = text?;
    // The page stays silent on a failed lookup.
    if !shown && !json {
        text = format!("{}\n\n{}", text.trim_end(), Panel::Identical.empty_message());
    }
    Ok(RunOutput {
        text,
        success: shown,
    })
}

/// Runs a parsed CLI command and returns rendered output.
pub async fn run(cli: Cli) -> anyhow::Result<RunOutput> {
    match cli.command {
        Commands::Search(args) => {
            let client = search_client(cli.base_url.as_deref())?;
            run_search(Arc::new(client), &args, cli.json).await
        }
        Commands::Identical { generic_code } => {
            let client = search_client(cli.base_url.as_deref())?;
            run_identical(Arc::new(client), &generic_code, cli.json).await
        }
        Commands::Shell => {
            let client = search_client(cli.base_url.as_deref())?;
            shell::run_stdio(Arc::new(client), cli.json).await?;
            Ok(RunOutput {
                text: String::new(),
                success: true,
            })
        }
        Commands::Health => {
            let client = search_client(cli.base_url.as_deref())?;
            let report = health::check(client.base()).await?;
            let text = if cli.json {
                crate::render::json::to_pretty(&report)?
            } else {
                report.to_markdown()
            };
            Ok(RunOutput {
                text,
                success: report.all_healthy(),
            })
        }
    }
}
