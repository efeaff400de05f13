//! Letter ratings and the grids that turn ratios into ratings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::{LiveMeasureError, Result};
use crate::live::types::{ImpactSeverity, Severity};

/// Default debt rating grid: upper bounds of A, B, C and D.
pub const DEFAULT_DEBT_RATING_GRID: [f64; 4] = [0.05, 0.1, 0.2, 0.5];

/// Ordinal letter grade. `A` is best and encodes as 0, `E` encodes as 4.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Rating {
    /// Best grade
    #[default]
    A,
    /// Second grade
    B,
    /// Third grade
    C,
    /// Fourth grade
    D,
    /// Worst grade
    E,
}

impl Rating {
    /// All ratings from best to worst.
    pub const ALL: [Rating; 5] = [Rating::A, Rating::B, Rating::C, Rating::D, Rating::E];

    /// Integer encoding used when a rating is stored as a number.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Decode a stored ordinal. Fractional values are truncated.
    pub fn from_index(index: f64) -> Option<Self> {
        if !index.is_finite() || index < 0.0 {
            return None;
        }
        // truncation is intended: thresholds like "2.0" and "2" are equivalent
        Self::ALL.get(index as usize).copied()
    }

    /// Letter of the rating.
    pub fn letter(self) -> &'static str {
        match self {
            Rating::A => "A",
            Rating::B => "B",
            Rating::C => "C",
            Rating::D => "D",
            Rating::E => "E",
        }
    }

    /// Rating attached to the highest unresolved rule severity.
    pub fn from_severity(severity: Severity) -> Self {
        match severity {
            Severity::Info => Rating::A,
            Severity::Minor => Rating::B,
            Severity::Major => Rating::C,
            Severity::Critical => Rating::D,
            Severity::Blocker => Rating::E,
        }
    }

    /// Rating attached to the highest unresolved impact severity.
    pub fn from_impact_severity(severity: ImpactSeverity) -> Self {
        match severity {
            ImpactSeverity::Info => Rating::A,
            ImpactSeverity::Low => Rating::B,
            ImpactSeverity::Medium => Rating::C,
            ImpactSeverity::High => Rating::D,
            ImpactSeverity::Blocker => Rating::E,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

impl FromStr for Rating {
    type Err = LiveMeasureError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "A" | "a" => Ok(Rating::A),
            "B" | "b" => Ok(Rating::B),
            "C" | "c" => Ok(Rating::C),
            "D" | "d" => Ok(Rating::D),
            "E" | "e" => Ok(Rating::E),
            other => Err(LiveMeasureError::validation(format!(
                "Unknown rating letter '{other}'"
            ))),
        }
    }
}

/// Maps a debt density (effort / development cost) to a rating.
///
/// Each bound is the inclusive upper limit of a grade:
/// `A <= g[0] < B <= g[1] < C <= g[2] < D <= g[3] < E`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebtRatingGrid {
    bounds: [f64; 4],
}

impl Default for DebtRatingGrid {
    fn default() -> Self {
        Self {
            bounds: DEFAULT_DEBT_RATING_GRID,
        }
    }
}

impl DebtRatingGrid {
    /// Build a grid from the upper bounds of A, B, C and D.
    pub fn new(bounds: [f64; 4]) -> Result<Self> {
        if bounds.iter().any(|b| !b.is_finite() || *b <= 0.0) {
            return Err(LiveMeasureError::validation_field(
                format!("Rating grid bounds must be positive, got {bounds:?}"),
                "debt_rating_grid",
            ));
        }
        if bounds.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(LiveMeasureError::validation_field(
                format!("Rating grid bounds must be strictly increasing, got {bounds:?}"),
                "debt_rating_grid",
            ));
        }
        Ok(Self { bounds })
    }

    /// Parse a comma separated grid such as `"0.05,0.1,0.2,0.5"`.
    pub fn parse(grid: &str) -> Result<Self> {
        let values = grid
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let bounds: [f64; 4] = values.as_slice().try_into().map_err(|_| {
            LiveMeasureError::validation_field(
                format!(
                    "Rating grid must contain exactly 4 values, got {}",
                    values.len()
                ),
                "debt_rating_grid",
            )
        })?;
        Self::new(bounds)
    }

    /// Upper bounds of A, B, C and D.
    pub fn bounds(&self) -> [f64; 4] {
        self.bounds
    }

    /// Inclusive upper bound of a grade (`f64::MAX` for E).
    pub fn upper_bound(&self, rating: Rating) -> f64 {
        match rating {
            Rating::E => f64::MAX,
            other => self.bounds[other.index() as usize],
        }
    }

    /// Exclusive lower bound of a grade (0 for A).
    pub fn lower_bound(&self, rating: Rating) -> f64 {
        match rating {
            Rating::A => 0.0,
            other => self.bounds[other.index() as usize - 1],
        }
    }

    /// Rating for a debt density.
    pub fn rating_for_density(&self, density: f64) -> Rating {
        self.bounds
            .iter()
            .position(|upper| density <= *upper)
            .map_or(Rating::E, |i| Rating::ALL[i])
    }
}

/// Percentage of reviewed hotspots, absent when there is nothing to review.
pub fn review_percent(to_review: u64, reviewed: u64) -> Option<f64> {
    let total = to_review + reviewed;
    if total == 0 {
        None
    } else {
        Some(reviewed as f64 * 100.0 / total as f64)
    }
}

/// A-E security review rating for a review percentage.
pub fn review_rating(percent: Option<f64>) -> Rating {
    match percent {
        None => Rating::A,
        Some(p) if p >= 80.0 => Rating::A,
        Some(p) if p >= 70.0 => Rating::B,
        Some(p) if p >= 50.0 => Rating::C,
        Some(p) if p >= 30.0 => Rating::D,
        Some(_) => Rating::E,
    }
}

/// A-D security review rating used by the software quality family.
pub fn review_rating_a_to_d(percent: Option<f64>) -> Rating {
    match percent {
        None => Rating::A,
        Some(p) if p >= 80.0 => Rating::A,
        Some(p) if p >= 50.0 => Rating::B,
        Some(p) if p >= 30.0 => Rating::C,
        Some(_) => Rating::D,
    }
}
