//! Page content capture — visible text from the active tab, used to infer
//! job context on the extension surfaces.
//!
//! The pipeline mirrors what the background collaborator does in the tab:
//! strip non-content elements, collapse whitespace, cap the result so it fits
//! the model context. Partial or empty content is a valid outcome; only an
//! inaccessible tab or a failing scrape call is an error.

use async_trait::async_trait;
use scraper::{Html, Node, Selector};
use serde::{Deserialize, Serialize};

use crate::error::PageExtractError;

/// Upper bound on captured page text forwarded to the model (popup path; the
/// side panel receives pre-budgeted data through the store).
pub const PAGE_CONTENT_BUDGET: usize = 15_000;

/// Elements stripped before visible-text collection.
const EXCLUDED_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "iframe", "noscript", "svg", "img",
];

/// What a successful capture of the active tab yields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    pub title: String,
    pub content: String,
}

/// Collaborator seam: something that can capture the active tab. Present on
/// extension surfaces only; the web page runs without one.
#[async_trait]
pub trait PageExtractor: Send + Sync {
    async fn capture(&self) -> Result<PageSnapshot, PageExtractError>;
}

/// Builds a [`PageSnapshot`] from raw page HTML.
pub fn snapshot_from_html(html: &str, url: &str) -> PageSnapshot {
    let doc = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| doc.select(&sel).next())
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let mut raw = String::new();
    let body = Selector::parse("body")
        .ok()
        .and_then(|sel| doc.select(&sel).next());
    match body {
        Some(body) => collect_visible_text(*body, &mut raw),
        None => collect_visible_text(doc.tree.root(), &mut raw),
    }

    PageSnapshot {
        url: url.to_string(),
        title,
        content: truncate_chars(collapse_whitespace(&raw), PAGE_CONTENT_BUDGET),
    }
}

fn collect_visible_text(node: ego_tree::NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Element(el) if EXCLUDED_TAGS.contains(&el.name()) => {}
            Node::Element(_) => collect_visible_text(child, out),
            Node::Text(text) => {
                out.push_str(&text.text);
                out.push(' ');
            }
            _ => {}
        }
    }
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: String, max: usize) -> String {
    if text.chars().count() <= max {
        text
    } else {
        text.chars().take(max).collect()
    }
}

/// Cross-surface scrape request sent to the background collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PageMessage {
    #[serde(rename = "SCRAPE_PAGE")]
    ScrapePage,
}

/// Reply to a [`PageMessage::ScrapePage`] request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScrapeReply {
    Ok { success: bool, data: PageSnapshot },
    Err { error: String },
}

impl ScrapeReply {
    pub fn into_result(self) -> Result<PageSnapshot, PageExtractError> {
        match self {
            ScrapeReply::Ok { success: true, data } => Ok(data),
            ScrapeReply::Ok { success: false, .. } => {
                Err(PageExtractError::Failed("scrape was not successful".to_string()))
            }
            ScrapeReply::Err { error } => Err(PageExtractError::Failed(error)),
        }
    }
}
