use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prize tier, ordered by significance (First = highest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AwardLevel {
    First = 1,
    Second = 2,
    Third = 3,
    Fourth = 4,
    Fifth = 5,
    Sixth = 6,
}

impl AwardLevel {
    /// All tiers in page order
    pub const ALL: [AwardLevel; 6] = [
        AwardLevel::First,
        AwardLevel::Second,
        AwardLevel::Third,
        AwardLevel::Fourth,
        AwardLevel::Fifth,
        AwardLevel::Sixth,
    ];

    /// Tier from its number (1-6)
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1..=6 => Some(Self::ALL[n as usize - 1]),
            _ => None,
        }
    }

    /// Tier from the label shown on the results page (e.g. "一等奖")
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "一等奖" => Some(Self::First),
            "二等奖" => Some(Self::Second),
            "三等奖" => Some(Self::Third),
            "四等奖" => Some(Self::Fourth),
            "五等奖" => Some(Self::Fifth),
            "六等奖" => Some(Self::Sixth),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::First => "一等奖",
            Self::Second => "二等奖",
            Self::Third => "三等奖",
            Self::Fourth => "四等奖",
            Self::Fifth => "五等奖",
            Self::Sixth => "六等奖",
        }
    }
}

impl From<AwardLevel> for u8 {
    fn from(level: AwardLevel) -> Self {
        level.number()
    }
}

impl TryFrom<u8> for AwardLevel {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Self::from_number(n).ok_or_else(|| format!("award level must be 1-6, got {}", n))
    }
}

/// Outcome of one prize tier within a draw
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub level: AwardLevel,
    pub winner_count: u32,
    pub bonus_per_winner: u32,
}

/// One completed draw
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Award {
    pub term: u32,
    pub draw_date: DateTime<Utc>,
    pub claim_deadline: DateTime<Utc>,
    /// Red balls in drawn order followed by the blue ball
    pub numbers: Vec<u8>,
    pub sales_volume: u64,
    pub remaining_bonus: u64,
    pub pieces: Vec<Piece>,
}

impl Award {
    /// Canonical 5-digit term string (e.g. "18077")
    pub fn term_string(&self) -> String {
        format_term(self.term)
    }

    /// Look up the outcome of a single tier
    pub fn piece(&self, level: AwardLevel) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.level == level)
    }
}

/// Zero-pad a term to its canonical 5-digit form
pub fn format_term(term: u32) -> String {
    format!("{:05}", term)
}

/// Term list response
#[derive(Debug, Serialize, Deserialize)]
pub struct TermsResponse {
    pub count: usize,
    pub terms: Vec<u32>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Version response
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResponse {
    pub name: String,
    pub version: String,
    pub description: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
