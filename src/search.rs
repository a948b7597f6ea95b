//! Query engine: full-text and category search over the catalog.
//!
//! Non-empty query text runs a ranked FTS5 match combined with the
//! structured filters; empty text (or text with no searchable terms) falls
//! back to a filtered scan ordered by recency. Both paths report the size
//! of the filtered set before pagination.

use anyhow::{bail, Result};
use serde::Serialize;

use crate::catalog::{RecordFilter, SqliteCatalog};
use crate::config::Config;
use crate::error::CatalogResult;
use crate::models::{Complexity, SearchPage, TriggerType, WorkflowRecord};
use crate::services;

/// One search request.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub text: String,
    pub filter: RecordFilter,
    pub limit: i64,
    pub offset: i64,
}

/// Turn free user text into a safe FTS5 expression.
///
/// Each whitespace-separated term is stripped of double quotes and quoted,
/// so FTS5 operators in user text are matched literally. Terms are joined
/// with implicit AND. Returns `None` when no term has searchable content.
pub fn build_match_expression(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split_whitespace()
        .map(|term| term.replace('"', ""))
        .filter(|term| term.chars().any(char::is_alphanumeric))
        .map(|term| format!("\"{}\"", term))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

pub async fn search(catalog: &SqliteCatalog, query: &SearchQuery) -> CatalogResult<SearchPage> {
    let (records, total) = match build_match_expression(&query.text) {
        Some(expr) => {
            catalog
                .query_ranked(&expr, &query.filter, query.limit, query.offset)
                .await?
        }
        None => {
            catalog
                .query_recent(&query.filter, query.limit, query.offset)
                .await?
        }
    };
    Ok(SearchPage { records, total })
}

/// Records using at least one service of `category`. Unknown keys yield an
/// empty page.
pub async fn search_by_category(
    catalog: &SqliteCatalog,
    category: &str,
    limit: i64,
    offset: i64,
) -> CatalogResult<SearchPage> {
    let Some(members) = services::category_services(category) else {
        return Ok(SearchPage::default());
    };
    let (records, total) = catalog.query_containing_any(members, limit, offset).await?;
    Ok(SearchPage { records, total })
}

/// Parse a CLI trigger filter; `all` means no filter.
pub fn parse_trigger_filter(value: &str) -> Result<Option<TriggerType>> {
    if value.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    match value.parse::<TriggerType>() {
        Ok(t) => Ok(Some(t)),
        Err(e) => bail!(e),
    }
}

/// Parse a CLI complexity filter; `all` means no filter.
pub fn parse_complexity_filter(value: &str) -> Result<Option<Complexity>> {
    if value.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    match value.parse::<Complexity>() {
        Ok(c) => Ok(Some(c)),
        Err(e) => bail!(e),
    }
}

/// 1-based page number and page size to a SQL offset. Saturates for page
/// numbers far past the end, which then simply yield an empty page.
pub fn page_offset(page: i64, per_page: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(per_page.max(0))
}

#[derive(Serialize)]
struct PageOutput<'a> {
    total: i64,
    page: i64,
    per_page: i64,
    pages: i64,
    workflows: &'a [WorkflowRecord],
}

/// `flowcat search`.
pub async fn run_search(
    config: &Config,
    text: Option<&str>,
    filter: RecordFilter,
    page: i64,
    per_page: Option<i64>,
    json: bool,
) -> Result<()> {
    let per_page = config.page_size(per_page);
    let query = SearchQuery {
        text: text.unwrap_or_default().to_string(),
        filter,
        limit: per_page,
        offset: page_offset(page, per_page),
    };

    let catalog = SqliteCatalog::open(&config.db.path).await?;
    let result = search(&catalog, &query).await;
    catalog.close().await;

    print_page(&result?, page.max(1), per_page, json)
}

/// `flowcat category <KEY>`.
pub async fn run_category(
    config: &Config,
    category: &str,
    page: i64,
    per_page: Option<i64>,
    json: bool,
) -> Result<()> {
    let per_page = config.page_size(per_page);

    let catalog = SqliteCatalog::open(&config.db.path).await?;
    let result =
        search_by_category(&catalog, category, per_page, page_offset(page, per_page)).await;
    catalog.close().await;

    print_page(&result?, page.max(1), per_page, json)
}

/// `flowcat categories`: list category keys and their services.
pub fn run_categories() {
    for (key, members) in services::CATEGORIES {
        println!("{:<20} {}", key, members.join(", "));
    }
}

fn print_page(result: &SearchPage, page: i64, per_page: i64, json: bool) -> Result<()> {
    if json {
        let output = PageOutput {
            total: result.total,
            page,
            per_page,
            pages: result.page_count(per_page),
            workflows: &result.records,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if result.records.is_empty() {
        println!("No results.");
        return Ok(());
    }

    let first = page_offset(page, per_page);
    for (i, record) in result.records.iter().enumerate() {
        println!(
            "{}. {} [{} / {}]",
            first.saturating_add(i as i64 + 1),
            record.display_name,
            record.trigger_type,
            record.complexity
        );
        println!("    file: {}", record.filename);
        println!(
            "    nodes: {}  active: {}",
            record.node_count,
            if record.active { "yes" } else { "no" }
        );
        if !record.integrations.is_empty() {
            println!("    integrations: {}", record.integrations.join(", "));
        }
        if !record.description.is_empty() {
            println!("    {}", record.description);
        }
        println!();
    }
    println!(
        "total: {}  (page {} of {})",
        result.total,
        page,
        result.page_count(per_page)
    );

    Ok(())
}
