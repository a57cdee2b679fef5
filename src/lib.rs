//! Tyche - double-color-ball lottery results scraper
//!
//! This library provides:
//! - Term discovery from the results index page
//! - Parsing of per-term result pages into [`Award`] records
//! - GB18030 page decoding
//! - Layered configuration for the CLI and HTTP server
//!
//! # Example
//!
//! ```no_run
//! use tyche::scraper::parse_award;
//! use tyche::scraper::DetailLayout;
//!
//! let html = std::fs::read_to_string("18077.html").unwrap();
//! let award = parse_award(&html, 18077, &DetailLayout::default()).unwrap();
//! println!("Drawn on {}: {:?}", award.draw_date, award.numbers);
//! ```

pub mod config;
pub mod models;
pub mod scraper;

// API-specific modules (only available with api feature)
#[cfg(feature = "api")]
pub mod error;

// Re-export commonly used types
pub use crate::config::{AppConfig, ServerConfig};
pub use crate::models::{format_term, Award, AwardLevel, Piece};
pub use crate::scraper::{LotteryScraper, ScraperConfig, ScraperError};
