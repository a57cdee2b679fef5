//! Web scraper for kaijiang.500.com double-color-ball results
//!
//! Lists the published draw terms and parses per-term result pages into
//! [`Award`](crate::models::Award) records.
//!
//! # Example
//!
//! ```no_run
//! use tyche::scraper::{LotteryScraper, ScraperConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let scraper = LotteryScraper::new(ScraperConfig::default())?;
//!
//!     let terms = scraper.list_terms().await?;
//!     println!("Found {} terms", terms.len());
//!
//!     let award = scraper.fetch_award(18077).await?;
//!     println!("Numbers: {:?}", award.numbers);
//!
//!     Ok(())
//! }
//! ```

mod award;
mod client;
mod codec;
mod terms;

pub use award::{
    parse_award, parse_draw_dates, DetailLayout, BLUE_BALL_COUNT, PRIZE_CELL_COUNT,
    RED_BALL_COUNT,
};
pub use client::{ErrorKind, LotteryScraper, ScraperConfig, ScraperError};
pub use codec::{DecodeError, TextDecoder, DEFAULT_ENCODING};
pub use terms::parse_term_list;

use scraper::{ElementRef, Html, Selector};

/// Default results base URL (double color ball)
pub const DEFAULT_BASE_URL: &str = "http://kaijiang.500.com/shtml/ssq";

/// Compile a CSS selector
fn parse_selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::ParseError(format!("{}: {}", css, e)))
}

/// Select all matches of `css` in the document, requiring exactly `expected`
fn select_exact<'a>(
    document: &'a Html,
    css: &str,
    expected: usize,
) -> Result<Vec<ElementRef<'a>>, ScraperError> {
    let selector = parse_selector(css)?;
    let nodes: Vec<_> = document.select(&selector).collect();
    expect_count(css, nodes, expected)
}

fn expect_count<'a>(
    css: &str,
    nodes: Vec<ElementRef<'a>>,
    expected: usize,
) -> Result<Vec<ElementRef<'a>>, ScraperError> {
    if nodes.len() != expected {
        return Err(ScraperError::UnexpectedCount {
            selector: css.to_string(),
            expected,
            actual: nodes.len(),
        });
    }
    Ok(nodes)
}

/// Trimmed text content of a node
fn node_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Parse a figure such as "1,120,563,145元" or "5,000,000"
fn parse_figure<T: std::str::FromStr>(element: &ElementRef, what: &str) -> Result<T, ScraperError> {
    let cleaned: String = node_text(element)
        .chars()
        .filter(|c| !matches!(c, ',' | '，' | '元') && !c.is_whitespace())
        .collect();

    cleaned.parse::<T>().map_err(|_| ScraperError::UnexpectedFormat {
        what: what.to_string(),
        html: element.html(),
    })
}
