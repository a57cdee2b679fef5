//! Term list parser
//!
//! The index page carries a drop-down of every published term, newest first.

use super::{node_text, parse_selector, ScraperError};
use scraper::Html;

/// Drop-down of historical term links on the index page
pub const TERM_LIST_SELECTOR: &str = ".kj_main01_right .kjxq_box02 .iSelectBox .iSelectList a";

/// Parse the term list from index page HTML
///
/// Returns the terms oldest first.
pub fn parse_term_list(html: &str) -> Result<Vec<u32>, ScraperError> {
    let document = Html::parse_document(html);
    let selector = parse_selector(TERM_LIST_SELECTOR)?;

    let nodes: Vec<_> = document.select(&selector).collect();
    if nodes.is_empty() {
        return Err(ScraperError::EmptySelection {
            selector: TERM_LIST_SELECTOR.to_string(),
        });
    }

    let count = nodes.len();
    let mut terms = vec![0u32; count];
    for (i, node) in nodes.iter().enumerate() {
        let term = node_text(node)
            .parse::<u32>()
            .map_err(|_| ScraperError::UnexpectedFormat {
                what: "term".to_string(),
                html: node.html(),
            })?;

        // Page order is newest first
        terms[count - i - 1] = term;
    }

    if terms.windows(2).any(|w| w[0] >= w[1]) {
        tracing::warn!("Term list is not strictly increasing");
    }

    Ok(terms)
}
