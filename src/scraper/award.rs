//! Draw result page parser
//!
//! Result pages hold two `.kj_tablelist02` tables. The first carries the
//! title (term and dates), the drawn balls and the sales figures; the second
//! is the prize grid.

use super::{
    expect_count, node_text, parse_figure, parse_selector, select_exact, ScraperError,
};
use crate::models::{Award, AwardLevel, Piece};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::OnceLock;

const TITLE_SELECTOR: &str = ".kj_main01_right .kj_tablelist02 .td_title01 span";
const BLUE_BALL_SELECTOR: &str = ".kj_main01_right .kj_tablelist02 .ball_box01 .ball_blue";
const BALL_CELL_SELECTOR: &str = ".kj_main01_right .kj_tablelist02 tr td tr td";
const FIGURE_SELECTOR: &str = ".kj_main01_right .kj_tablelist02 .cfont1";
const TABLE_SELECTOR: &str = ".kj_main01_right .kj_tablelist02";
const PRIZE_CELL_SELECTOR: &str = "tr td";

const DATE_RANGE_PATTERN: &str =
    r"^开奖日期：([0-9]+)年([0-9]+)月([0-9]+)日\s*兑奖截止日期：([0-9]+)年([0-9]+)月([0-9]+)日$";

static DATE_RANGE: OnceLock<Regex> = OnceLock::new();

/// Term span and date span come first in every layout
pub const MIN_TITLE_SPAN_COUNT: usize = 2;

/// Nested ball table: label/balls row, then label/drawn-order row
const BALL_CELL_COUNT: usize = 4;
/// Cell holding the red balls in drawn order
const RED_BALL_CELL: usize = 3;

pub const RED_BALL_COUNT: usize = 6;
pub const BLUE_BALL_COUNT: usize = 1;
const RED_BALL_RANGE: std::ops::RangeInclusive<u8> = 1..=33;
const BLUE_BALL_RANGE: std::ops::RangeInclusive<u8> = 1..=16;

/// Sales volume, then remaining bonus
const FIGURE_COUNT: usize = 2;

/// The prize grid is the second result table
const PRIZE_TABLE_INDEX: usize = 1;
/// Title cell plus the three column headers
const PRIZE_HEADER_CELLS: usize = 4;
/// Tier name, winner count, bonus per winner
const PRIZE_COLUMNS: usize = 3;
const PRIZE_TIERS: usize = AwardLevel::ALL.len();
/// Total row
const PRIZE_FOOTER_CELLS: usize = 2;
pub const PRIZE_CELL_COUNT: usize =
    PRIZE_HEADER_CELLS + PRIZE_COLUMNS * PRIZE_TIERS + PRIZE_FOOTER_CELLS;

/// Page layout details that have changed between site revisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailLayout {
    /// Number of `span` nodes in the title cell. Older pages carry a third,
    /// decorative span.
    title_span_count: usize,
}

impl DetailLayout {
    pub fn new(title_span_count: usize) -> Result<Self, ScraperError> {
        if title_span_count < MIN_TITLE_SPAN_COUNT {
            return Err(ScraperError::InvalidConfig(format!(
                "title_span_count must be at least {}, got {}",
                MIN_TITLE_SPAN_COUNT, title_span_count
            )));
        }
        Ok(Self { title_span_count })
    }

    pub fn title_span_count(&self) -> usize {
        self.title_span_count
    }
}

impl Default for DetailLayout {
    fn default() -> Self {
        Self {
            title_span_count: MIN_TITLE_SPAN_COUNT,
        }
    }
}

/// Parse a draw result page for `term`
///
/// Every structural check must pass; no partial award is returned.
pub fn parse_award(html: &str, term: u32, layout: &DetailLayout) -> Result<Award, ScraperError> {
    let document = Html::parse_document(html);

    // DetailLayout guarantees at least the term and date spans
    let titles = select_exact(&document, TITLE_SELECTOR, layout.title_span_count)?;
    let (term_node, date_node) = (&titles[0], &titles[1]);

    let found = parse_term_title(term_node)?;
    if found != term {
        return Err(ScraperError::TermMismatch {
            requested: term,
            found,
        });
    }

    let (draw_date, claim_deadline) = parse_draw_dates(&node_text(date_node))?;
    tracing::debug!("Term {} drawn {}", term, draw_date.date_naive());

    let mut numbers = parse_red_balls(&document)?;
    numbers.extend(parse_blue_balls(&document)?);

    let figures = select_exact(&document, FIGURE_SELECTOR, FIGURE_COUNT)?;
    let sales_volume = parse_figure::<u64>(&figures[0], "sales volume")?;
    let remaining_bonus = parse_figure::<u64>(&figures[1], "remaining bonus")?;

    let pieces = parse_prize_grid(&document)?;

    Ok(Award {
        term,
        draw_date,
        claim_deadline,
        numbers,
        sales_volume,
        remaining_bonus,
        pieces,
    })
}

/// Term number from the `strong` node of the first title span
fn parse_term_title(title: &ElementRef) -> Result<u32, ScraperError> {
    let strong = parse_selector("strong")?;
    let node = title
        .select(&strong)
        .next()
        .ok_or_else(|| ScraperError::EmptySelection {
            selector: format!("{} strong", TITLE_SELECTOR),
        })?;

    node_text(&node)
        .parse::<u32>()
        .map_err(|_| ScraperError::UnexpectedFormat {
            what: "term".to_string(),
            html: node.html(),
        })
}

/// Parse "开奖日期：2018年12月25日 兑奖截止日期：2019年6月25日" into
/// (draw date, claim deadline) at UTC midnight
pub fn parse_draw_dates(text: &str) -> Result<(DateTime<Utc>, DateTime<Utc>), ScraperError> {
    let pattern = DATE_RANGE
        .get_or_init(|| Regex::new(DATE_RANGE_PATTERN).expect("date range pattern is valid"));
    let text = text.trim();

    let caps = pattern
        .captures(text)
        .ok_or_else(|| ScraperError::UnexpectedFormat {
            what: "date range".to_string(),
            html: text.to_string(),
        })?;

    let draw = utc_midnight(&caps[1], &caps[2], &caps[3], text)?;
    let deadline = utc_midnight(&caps[4], &caps[5], &caps[6], text)?;
    Ok((draw, deadline))
}

fn utc_midnight(
    year: &str,
    month: &str,
    day: &str,
    source: &str,
) -> Result<DateTime<Utc>, ScraperError> {
    let iso = format!("{}-{:0>2}-{:0>2}", year, month, day);

    let date = NaiveDate::parse_from_str(&iso, "%Y-%m-%d").map_err(|_| {
        ScraperError::UnexpectedFormat {
            what: "date".to_string(),
            html: source.to_string(),
        }
    })?;

    Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

fn parse_red_balls(document: &Html) -> Result<Vec<u8>, ScraperError> {
    let cells = select_exact(document, BALL_CELL_SELECTOR, BALL_CELL_COUNT)?;
    let cell = &cells[RED_BALL_CELL];
    let text = node_text(cell);

    let reds = text
        .split_whitespace()
        .map(|s| s.parse::<u8>().ok().filter(|n| RED_BALL_RANGE.contains(n)))
        .collect::<Option<Vec<u8>>>()
        .filter(|reds| reds.len() == RED_BALL_COUNT)
        .ok_or_else(|| ScraperError::UnexpectedFormat {
            what: "red balls".to_string(),
            html: cell.html(),
        })?;

    Ok(reds)
}

fn parse_blue_balls(document: &Html) -> Result<Vec<u8>, ScraperError> {
    let nodes = select_exact(document, BLUE_BALL_SELECTOR, BLUE_BALL_COUNT)?;

    nodes
        .iter()
        .map(|node| {
            node_text(node)
                .parse::<u8>()
                .ok()
                .filter(|n| BLUE_BALL_RANGE.contains(n))
                .ok_or_else(|| ScraperError::UnexpectedFormat {
                    what: "blue ball".to_string(),
                    html: node.html(),
                })
        })
        .collect()
}

fn parse_prize_grid(document: &Html) -> Result<Vec<Piece>, ScraperError> {
    let table_selector = parse_selector(TABLE_SELECTOR)?;
    let table = document
        .select(&table_selector)
        .nth(PRIZE_TABLE_INDEX)
        .ok_or_else(|| ScraperError::UnexpectedCount {
            selector: TABLE_SELECTOR.to_string(),
            expected: PRIZE_TABLE_INDEX + 1,
            actual: document.select(&table_selector).count(),
        })?;

    let cell_selector = parse_selector(PRIZE_CELL_SELECTOR)?;
    let cells = expect_count(
        &format!("{} (table {}) {}", TABLE_SELECTOR, PRIZE_TABLE_INDEX, PRIZE_CELL_SELECTOR),
        table.select(&cell_selector).collect(),
        PRIZE_CELL_COUNT,
    )?;

    let tiers = &cells[PRIZE_HEADER_CELLS..PRIZE_HEADER_CELLS + PRIZE_COLUMNS * PRIZE_TIERS];
    tiers
        .chunks_exact(PRIZE_COLUMNS)
        .zip(AwardLevel::ALL)
        .map(|(row, level)| parse_prize_row(row, level))
        .collect()
}

fn parse_prize_row(row: &[ElementRef], level: AwardLevel) -> Result<Piece, ScraperError> {
    let name = node_text(&row[0]);
    match AwardLevel::from_label(&name) {
        Some(labelled) if labelled != level => {
            return Err(ScraperError::UnexpectedFormat {
                what: format!("tier {} label", level.number()),
                html: row[0].html(),
            });
        }
        Some(_) => {}
        None => tracing::debug!("Unrecognised tier label {:?}, using position", name),
    }

    Ok(Piece {
        level,
        winner_count: parse_figure(&row[1], "winner count")?,
        bonus_per_winner: parse_figure(&row[2], "bonus per winner")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIERS: [(&str, &str, &str); 6] = [
        ("一等奖", "7", "5,520,270"),
        ("二等奖", "95", "142,452"),
        ("三等奖", "1,367", "3,000"),
        ("四等奖", "71,546", "200"),
        ("五等奖", "1,370,855", "10"),
        ("六等奖", "10,209,468", "5"),
    ];

    struct Fixture {
        term: &'static str,
        term_in_strong: bool,
        dates: &'static str,
        extra_title_span: bool,
        reds: &'static str,
        drawn_order_row: bool,
        blue: &'static str,
        blue_count: usize,
        sales: &'static str,
        pool_figure: bool,
        tiers: [(&'static str, &'static str, &'static str); 6],
        footer_cells: usize,
    }

    impl Default for Fixture {
        fn default() -> Self {
            Self {
                term: "18150",
                term_in_strong: true,
                dates: "开奖日期：2018年12月25日 兑奖截止日期：2019年6月25日",
                extra_title_span: false,
                reds: "13 05 23 26 29 11",
                drawn_order_row: true,
                blue: "09",
                blue_count: 1,
                sales: "392,465,832元",
                pool_figure: true,
                tiers: TIERS,
                footer_cells: 2,
            }
        }
    }

    impl Fixture {
        fn html(&self) -> String {
            let extra = if self.extra_title_span {
                r#"<span class="iSelectBox">往期</span>"#
            } else {
                ""
            };

            let term = if self.term_in_strong {
                format!("<strong>{}</strong>", self.term)
            } else {
                self.term.to_string()
            };

            let drawn_order = if self.drawn_order_row {
                format!("<tr><td>出球顺序：</td><td>{}</td></tr>", self.reds)
            } else {
                String::new()
            };

            let blues: String = (0..self.blue_count)
                .map(|_| format!(r#"<li class="ball_blue">{}</li>"#, self.blue))
                .collect();

            let pool = if self.pool_figure {
                r#"&nbsp;奖池滚存：<span class="cfont1">1,120,563,145元</span>"#
            } else {
                ""
            };

            let tier_rows: String = self
                .tiers
                .iter()
                .map(|(name, count, bonus)| {
                    format!("<tr><td>{}</td><td>{}</td><td>{}</td></tr>", name, count, bonus)
                })
                .collect();

            let footer: String = (0..self.footer_cells)
                .map(|i| format!("<td>合计{}</td>", i))
                .collect();

            format!(
                r#"<html><body>
<div class="kj_main01_right">
  <table class="kj_tablelist02">
    <tr><td class="td_title01">
      <span class="cfont2">{term}期</span>
      <span class="span_right">{dates}</span>
      {extra}
    </td></tr>
    <tr><td>
      <table>
        <tr><td>开奖号码：</td><td><div class="ball_box01"><ul>
          <li class="ball_red">05</li><li class="ball_red">11</li><li class="ball_red">13</li>
          <li class="ball_red">23</li><li class="ball_red">26</li><li class="ball_red">29</li>
          {blues}
        </ul></div></td></tr>
        {drawn_order}
      </table>
    </td></tr>
    <tr><td>本期销量：<span class="cfont1">{sales}</span>{pool}</td></tr>
  </table>
  <table class="kj_tablelist02">
    <tr><td colspan="3">开奖详情</td></tr>
    <tr><td>奖项</td><td>中奖注数</td><td>单注奖金(元)</td></tr>
    {tier_rows}
    <tr>{footer}</tr>
  </table>
</div>
</body></html>"#,
                term = term,
                dates = self.dates,
                extra = extra,
                blues = blues,
                drawn_order = drawn_order,
                sales = self.sales,
                pool = pool,
                tier_rows = tier_rows,
                footer = footer,
            )
        }
    }

    fn parse(fixture: &Fixture, term: u32) -> Result<Award, ScraperError> {
        parse_award(&fixture.html(), term, &DetailLayout::default())
    }

    #[test]
    fn test_parse_award_full_page() {
        let award = parse(&Fixture::default(), 18150).unwrap();

        assert_eq!(award.term, 18150);
        assert_eq!(award.draw_date.to_rfc3339(), "2018-12-25T00:00:00+00:00");
        assert_eq!(award.claim_deadline.to_rfc3339(), "2019-06-25T00:00:00+00:00");
        assert_eq!(award.numbers, vec![13, 5, 23, 26, 29, 11, 9]);
        assert_eq!(award.sales_volume, 392_465_832);
        assert_eq!(award.remaining_bonus, 1_120_563_145);
    }

    #[test]
    fn test_parse_award_pieces() {
        let award = parse(&Fixture::default(), 18150).unwrap();

        assert_eq!(award.pieces.len(), 6);
        for (piece, level) in award.pieces.iter().zip(AwardLevel::ALL) {
            assert_eq!(piece.level, level);
        }
        assert_eq!(
            award.pieces[0],
            Piece {
                level: AwardLevel::First,
                winner_count: 7,
                bonus_per_winner: 5_520_270,
            }
        );
        assert_eq!(award.pieces[5].winner_count, 10_209_468);
        assert_eq!(award.pieces[5].bonus_per_winner, 5);
    }

    #[test]
    fn test_parse_award_term_mismatch() {
        let err = parse(&Fixture::default(), 18151).unwrap_err();
        assert!(matches!(
            err,
            ScraperError::TermMismatch {
                requested: 18151,
                found: 18150
            }
        ));
    }

    #[test]
    fn test_parse_award_zero_padded_term() {
        let fixture = Fixture {
            term: "03001",
            ..Default::default()
        };
        assert_eq!(parse(&fixture, 3001).unwrap().term, 3001);
    }

    #[test]
    fn test_parse_award_title_count_mismatch() {
        let fixture = Fixture {
            extra_title_span: true,
            // Would also fail later; the title check must come first
            footer_cells: 0,
            ..Default::default()
        };
        let err = parse(&fixture, 18150).unwrap_err();
        assert!(matches!(
            err,
            ScraperError::UnexpectedCount {
                expected: 2,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_award_three_span_layout() {
        let fixture = Fixture {
            extra_title_span: true,
            ..Default::default()
        };
        let layout = DetailLayout::new(3).unwrap();
        let award = parse_award(&fixture.html(), 18150, &layout).unwrap();
        assert_eq!(award.term, 18150);
    }

    #[test]
    fn test_parse_award_prize_grid_short() {
        let fixture = Fixture {
            footer_cells: 1,
            ..Default::default()
        };
        let err = parse(&fixture, 18150).unwrap_err();
        assert!(matches!(
            err,
            ScraperError::UnexpectedCount {
                expected: 24,
                actual: 23,
                ..
            }
        ));
        let message = err.to_string();
        assert!(message.contains("24"));
        assert!(message.contains("23"));
    }

    #[test]
    fn test_parse_award_bad_red_balls() {
        let too_few = Fixture {
            reds: "13 05 23 26 29",
            ..Default::default()
        };
        assert!(matches!(
            parse(&too_few, 18150),
            Err(ScraperError::UnexpectedFormat { .. })
        ));

        let out_of_range = Fixture {
            reds: "13 05 23 26 29 34",
            ..Default::default()
        };
        assert!(parse(&out_of_range, 18150).is_err());
    }

    #[test]
    fn test_parse_award_bad_blue_ball() {
        let fixture = Fixture {
            blue: "17",
            ..Default::default()
        };
        assert!(matches!(
            parse(&fixture, 18150),
            Err(ScraperError::UnexpectedFormat { .. })
        ));
    }

    #[test]
    fn test_parse_award_bad_sales_figure() {
        let fixture = Fixture {
            sales: "暂无",
            ..Default::default()
        };
        let err = parse(&fixture, 18150).unwrap_err();
        assert!(err.to_string().contains("sales volume"));
    }

    #[test]
    fn test_parse_award_bad_dates() {
        let fixture = Fixture {
            dates: "开奖日期：2018-12-25",
            ..Default::default()
        };
        assert!(matches!(
            parse(&fixture, 18150),
            Err(ScraperError::UnexpectedFormat { .. })
        ));
    }

    #[test]
    fn test_parse_award_empty_page() {
        let err = parse_award("<html><body></body></html>", 18150, &DetailLayout::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ScraperError::UnexpectedCount { actual: 0, .. }
        ));
    }

    #[test]
    fn test_parse_draw_dates() {
        let (draw, deadline) =
            parse_draw_dates("开奖日期：2018年12月25日 兑奖截止日期：2019年6月25日").unwrap();
        assert_eq!(draw, Utc.with_ymd_and_hms(2018, 12, 25, 0, 0, 0).unwrap());
        assert_eq!(deadline, Utc.with_ymd_and_hms(2019, 6, 25, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_draw_dates_single_digits_and_spacing() {
        let (draw, deadline) =
            parse_draw_dates("  开奖日期：2019年1月3日\u{a0}\u{a0}兑奖截止日期：2019年3月4日 ").unwrap();
        assert_eq!(draw, Utc.with_ymd_and_hms(2019, 1, 3, 0, 0, 0).unwrap());
        assert_eq!(deadline, Utc.with_ymd_and_hms(2019, 3, 4, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_draw_dates_impossible_date() {
        let result = parse_draw_dates("开奖日期：2019年2月30日 兑奖截止日期：2019年4月30日");
        assert!(matches!(
            result,
            Err(ScraperError::UnexpectedFormat { .. })
        ));
    }

    #[test]
    fn test_detail_layout_rejects_single_span() {
        let err = DetailLayout::new(1).unwrap_err();
        assert!(matches!(err, ScraperError::InvalidConfig(_)));
        assert!(err.to_string().contains("title_span_count"));
        assert!(DetailLayout::new(0).is_err());
        assert_eq!(DetailLayout::new(2).unwrap(), DetailLayout::default());
    }

    #[test]
    fn test_parse_award_term_without_strong() {
        let fixture = Fixture {
            term_in_strong: false,
            ..Default::default()
        };
        let err = parse(&fixture, 18150).unwrap_err();
        assert!(matches!(err, ScraperError::EmptySelection { .. }));
        assert!(err.to_string().contains(TITLE_SELECTOR));
    }

    #[test]
    fn test_parse_award_non_numeric_term() {
        let fixture = Fixture {
            term: "第一",
            ..Default::default()
        };
        let err = parse(&fixture, 18150).unwrap_err();
        assert!(matches!(
            err,
            ScraperError::UnexpectedFormat { ref what, .. } if what == "term"
        ));
        assert!(err.to_string().contains("<strong>第一</strong>"));
    }

    #[test]
    fn test_parse_award_ball_cell_count() {
        let fixture = Fixture {
            drawn_order_row: false,
            ..Default::default()
        };
        let err = parse(&fixture, 18150).unwrap_err();
        assert!(matches!(
            err,
            ScraperError::UnexpectedCount {
                expected: 4,
                actual: 2,
                ..
            }
        ));
        assert!(err.to_string().contains(BALL_CELL_SELECTOR));
    }

    #[test]
    fn test_parse_award_blue_ball_count() {
        for blue_count in [0, 2] {
            let fixture = Fixture {
                blue_count,
                ..Default::default()
            };
            let err = parse(&fixture, 18150).unwrap_err();
            assert!(matches!(
                err,
                ScraperError::UnexpectedCount { expected: 1, actual, .. } if actual == blue_count
            ));
            assert!(err.to_string().contains(BLUE_BALL_SELECTOR));
        }
    }

    #[test]
    fn test_parse_award_figure_count() {
        let fixture = Fixture {
            pool_figure: false,
            ..Default::default()
        };
        let err = parse(&fixture, 18150).unwrap_err();
        assert!(matches!(
            err,
            ScraperError::UnexpectedCount {
                expected: 2,
                actual: 1,
                ..
            }
        ));
        assert!(err.to_string().contains(FIGURE_SELECTOR));
    }

    #[test]
    fn test_parse_award_tier_label_out_of_place() {
        let mut tiers = TIERS;
        tiers.swap(0, 1);
        let fixture = Fixture {
            tiers,
            ..Default::default()
        };
        let err = parse(&fixture, 18150).unwrap_err();
        assert!(matches!(
            err,
            ScraperError::UnexpectedFormat { ref what, .. } if what == "tier 1 label"
        ));
        assert!(err.to_string().contains("二等奖"));
    }

    #[test]
    fn test_prize_cell_count() {
        assert_eq!(PRIZE_CELL_COUNT, 24);
    }
}
