//! Tyche CLI - Command-line interface for lottery result scraping

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use tyche::config::AppConfig;
use tyche::models::{format_term, Award};
use tyche::scraper::{LotteryScraper, ScraperConfig, RED_BALL_COUNT};

const DEFAULT_OUTPUT_DIR: &str = "data/awards";

#[derive(Parser)]
#[command(name = "tyche")]
#[command(author, version, about = "Double color ball results scraper", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file stem (tyche.toml by default)
    #[arg(long, default_value = "tyche")]
    config: String,

    /// Override the results base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Delay between requests in milliseconds
    #[arg(long)]
    delay: Option<u64>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Attempts per page, first request included
    #[arg(long)]
    attempts: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all published terms, oldest first
    Terms {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the result of a single term
    Award {
        /// Term number (e.g. 18077)
        #[arg(short, long)]
        term: u32,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch results for a range of terms into JSON files
    Fetch {
        /// First term to fetch (inclusive)
        #[arg(long)]
        from: Option<u32>,

        /// Last term to fetch (inclusive)
        #[arg(long)]
        to: Option<u32>,

        /// Only fetch the most recent N terms of the range
        #[arg(long)]
        latest: Option<usize>,

        /// Output directory
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = scraper_config(&cli)?;
    let scraper = LotteryScraper::new(config).context("Failed to create scraper")?;

    // Create runtime for async operations
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    match cli.command {
        Commands::Terms { json } => {
            let terms = rt
                .block_on(scraper.list_terms())
                .context("Failed to list terms")?;
            print_terms(&terms, json)?;
        }
        Commands::Award { term, json } => {
            let award = rt
                .block_on(scraper.fetch_award(term))
                .with_context(|| format!("Failed to fetch term {}", format_term(term)))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&award)?);
            } else {
                print_award(&award);
            }
        }
        Commands::Fetch {
            from,
            to,
            latest,
            output,
        } => {
            run_fetch(&rt, &scraper, from, to, latest, &output)?;
        }
    }

    Ok(())
}

/// Layered config with command-line overrides applied
fn scraper_config(cli: &Cli) -> Result<ScraperConfig> {
    let mut config = AppConfig::load_from(&cli.config)
        .context("Failed to load configuration")?
        .scraper;

    if let Some(ref base_url) = cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(attempts) = cli.attempts {
        config.max_attempts = attempts;
    }

    Ok(config)
}

fn print_terms(terms: &[u32], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(terms)?);
        return Ok(());
    }

    println!("{}: {}", "Terms".yellow().bold(), terms.len());
    if let (Some(first), Some(last)) = (terms.first(), terms.last()) {
        println!("Range: {} - {}", format_term(*first), format_term(*last));
    }
    println!("{}", "-".repeat(40));
    for chunk in terms.chunks(8) {
        let line: Vec<String> = chunk.iter().map(|t| format_term(*t)).collect();
        println!("  {}", line.join(" "));
    }

    Ok(())
}

fn print_award(award: &Award) {
    println!(
        "{} {}",
        "Term".yellow().bold(),
        award.term_string().bold()
    );
    println!(
        "Drawn: {}  Claim by: {}",
        award.draw_date.format("%Y-%m-%d"),
        award.claim_deadline.format("%Y-%m-%d")
    );

    let (reds, blues) = award.numbers.split_at(RED_BALL_COUNT.min(award.numbers.len()));
    let reds: Vec<String> = reds.iter().map(|n| format!("{:02}", n).red().to_string()).collect();
    let blues: Vec<String> = blues
        .iter()
        .map(|n| format!("{:02}", n).blue().to_string())
        .collect();
    println!("Numbers: {} + {}", reds.join(" "), blues.join(" "));

    println!(
        "Sales: {}  Pool: {}",
        group_thousands(award.sales_volume),
        group_thousands(award.remaining_bonus)
    );
    println!();

    println!("{:<8} {:>12} {:>14}", "Tier", "Winners", "Bonus");
    println!("{}", "-".repeat(36));
    for piece in &award.pieces {
        println!(
            "{:<8} {:>12} {:>14}",
            piece.level.number(),
            group_thousands(piece.winner_count as u64),
            group_thousands(piece.bonus_per_winner as u64)
        );
    }
}

/// Select the terms to fetch from the published list
fn select_terms(terms: &[u32], from: Option<u32>, to: Option<u32>, latest: Option<usize>) -> Vec<u32> {
    let mut selected: Vec<u32> = terms
        .iter()
        .copied()
        .filter(|t| from.map_or(true, |f| *t >= f))
        .filter(|t| to.map_or(true, |l| *t <= l))
        .collect();

    if let Some(n) = latest {
        let skip = selected.len().saturating_sub(n);
        selected.drain(..skip);
    }

    selected
}

fn run_fetch(
    rt: &tokio::runtime::Runtime,
    scraper: &LotteryScraper,
    from: Option<u32>,
    to: Option<u32>,
    latest: Option<usize>,
    output: &Path,
) -> Result<()> {
    if let (Some(f), Some(t)) = (from, to) {
        if f > t {
            anyhow::bail!("--from ({}) must not exceed --to ({})", f, t);
        }
    }

    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {:?}", output))?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("Invalid progress template")?,
    );
    spinner.set_message("Listing terms...");
    let terms = rt.block_on(scraper.list_terms());
    spinner.finish_and_clear();

    let terms = select_terms(&terms.context("Failed to list terms")?, from, to, latest);
    if terms.is_empty() {
        println!("{}: no terms in range", "Warning".yellow());
        return Ok(());
    }

    println!(
        "{}: {} terms ({} - {})",
        "Fetching".green(),
        terms.len(),
        format_term(terms[0]),
        format_term(terms[terms.len() - 1])
    );

    let pb = ProgressBar::new(terms.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Invalid progress template")?
            .progress_chars("#>-"),
    );

    let mut success_count = 0;

    for term in &terms {
        pb.set_message(format_term(*term));

        let result = rt.block_on(async {
            let award = scraper.fetch_award(*term).await?;
            let filepath = output.join(format!("{}.json", award.term_string()));
            let json = serde_json::to_string_pretty(&award)?;
            std::fs::write(&filepath, json)?;
            Ok::<_, anyhow::Error>(filepath)
        });

        match result {
            Ok(_) => success_count += 1,
            Err(e) => {
                pb.println(format!("{} {}: {}", "Warning".yellow(), format_term(*term), e));
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();

    println!(
        "\n{}: {}/{} awards saved to {:?}",
        "Complete".green(),
        success_count,
        terms.len(),
        output
    );

    Ok(())
}

/// Format an integer with thousands separators
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}
