//! Rank label interpretation for exam registration.
//!
//! Roster rank labels come in three shapes: a colored-belt grade (`Cấp 9`),
//! a black-belt degree (`3 Đẳng`), or anything else (instructor tags, typos).
//! Only grades are downgraded for registration; degrees and other labels are
//! echoed verbatim.

use serde::Serialize;
use std::fmt;

const GRADE_TOKEN: &str = "Cấp";
const DEGREE_TOKEN: &str = "Đẳng";

/// Parsed form of a roster rank label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankLabel {
    Grade(i64),
    Degree { level: i64, label: String },
    Other(String),
}

impl RankLabel {
    /// Interprets a raw label. Never fails: unparseable numeric suffixes fall
    /// through to [`RankLabel::Other`].
    pub fn parse(raw: &str) -> Self {
        let label = raw.trim();

        if let Some(rest) = label.strip_prefix(GRADE_TOKEN) {
            return match parse_number(rest) {
                Some(grade) => Self::Grade(grade),
                None => Self::Other(label.to_string()),
            };
        }

        if label.contains(DEGREE_TOKEN) {
            let remainder = label.replace(DEGREE_TOKEN, "");
            return match parse_number(&remainder) {
                Some(level) => Self::Degree {
                    level,
                    label: label.to_string(),
                },
                None => Self::Other(label.to_string()),
            };
        }

        Self::Other(label.to_string())
    }

    /// Value submitted on the registration sheet.
    pub fn registration_rank(&self) -> RegistrationRank {
        match self {
            Self::Grade(grade) => RegistrationRank::Grade(grade.saturating_sub(1)),
            Self::Degree { label, .. } => RegistrationRank::Label(label.clone()),
            Self::Other(label) => RegistrationRank::Label(label.clone()),
        }
    }

    /// Grades first (highest grade first), then degrees ascending, then the rest.
    pub fn sort_key(&self) -> RankSortKey {
        match self {
            Self::Grade(grade) => RankSortKey {
                group: 0,
                order: grade.saturating_neg(),
            },
            Self::Degree { level, .. } => RankSortKey {
                group: 1,
                order: *level,
            },
            Self::Other(_) => RankSortKey { group: 2, order: 0 },
        }
    }
}

fn parse_number(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}

/// Ordering key derived from a rank label; compares by `group` then `order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RankSortKey {
    pub group: u8,
    pub order: i64,
}

/// Registration rank cell: a number for downgraded grades, text otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RegistrationRank {
    Grade(i64),
    Label(String),
}

impl fmt::Display for RegistrationRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationRank::Grade(value) => write!(f, "{value}"),
            RegistrationRank::Label(label) => f.write_str(label),
        }
    }
}

/// Outcome of running a raw label through the transformer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankTransform {
    pub registration_rank: RegistrationRank,
    pub sort_key: RankSortKey,
}

pub fn transform(raw: &str) -> RankTransform {
    let label = RankLabel::parse(raw);
    RankTransform {
        registration_rank: label.registration_rank(),
        sort_key: label.sort_key(),
    }
}
