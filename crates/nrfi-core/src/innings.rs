// Innings-pitched parsing ("6.2" = six innings plus two outs).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use thiserror::Error;
use tracing::debug;

/// Outs recorded per inning.
const OUTS_PER_INNING: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedInnings {
    #[error("empty innings value")]
    Empty,

    #[error("innings value `{0}` is not a number")]
    NotNumeric(String),

    #[error("innings value `{0}` has a fractional part other than .0, .1 or .2")]
    BadThirds(String),

    #[error("innings value `{0}` is negative or not finite")]
    OutOfRange(String),
}

/// Innings pitched, held as a count of outs so that partial innings add up
/// exactly (6.1 + 5.2 == 12.0).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Innings {
    outs: u32,
}

impl Innings {
    pub const ZERO: Innings = Innings { outs: 0 };

    pub fn from_outs(outs: u32) -> Self {
        Self { outs }
    }

    pub fn outs(self) -> u32 {
        self.outs
    }

    pub fn is_zero(self) -> bool {
        self.outs == 0
    }

    /// Real-valued inning count, `W + F/3`.
    pub fn as_f64(self) -> f64 {
        f64::from(self.outs) / f64::from(OUTS_PER_INNING)
    }

    /// Strict parse of box-score notation.
    ///
    /// `W.F` with `F` in {0, 1, 2} means `W` innings plus `F` outs. A value
    /// without a fractional part is read as a plain number of innings.
    pub fn try_parse(raw: &str) -> Result<Self, MalformedInnings> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(MalformedInnings::Empty);
        }

        match text.split_once('.') {
            Some((whole, thirds)) => {
                let whole: u32 = whole
                    .parse()
                    .map_err(|_| MalformedInnings::NotNumeric(text.to_string()))?;
                let thirds: u32 = thirds
                    .parse()
                    .map_err(|_| MalformedInnings::NotNumeric(text.to_string()))?;
                if thirds >= OUTS_PER_INNING {
                    return Err(MalformedInnings::BadThirds(text.to_string()));
                }
                whole
                    .checked_mul(OUTS_PER_INNING)
                    .and_then(|outs| outs.checked_add(thirds))
                    .map(Self::from_outs)
                    .ok_or_else(|| MalformedInnings::OutOfRange(text.to_string()))
            }
            None => {
                let value: f64 = text
                    .parse()
                    .map_err(|_| MalformedInnings::NotNumeric(text.to_string()))?;
                if !value.is_finite() || value < 0.0 || value > f64::from(u32::MAX / OUTS_PER_INNING) {
                    return Err(MalformedInnings::OutOfRange(text.to_string()));
                }
                Ok(Self::from_outs((value * f64::from(OUTS_PER_INNING)).round() as u32))
            }
        }
    }

    /// Best-effort parse used when normalizing stored appearances.
    ///
    /// Anything [`Innings::try_parse`] rejects counts as zero innings, so the
    /// appearance contributes nothing to per-nine denominators.
    pub fn parse_lenient(raw: &str) -> Self {
        match Self::try_parse(raw) {
            Ok(innings) => innings,
            Err(err) => {
                debug!("treating innings value as zero: {}", err);
                Self::ZERO
            }
        }
    }
}

/// Convert box-score innings notation to a real inning count, returning `0.0`
/// for missing or malformed input.
pub fn parse_innings(raw: &str) -> f64 {
    Innings::parse_lenient(raw).as_f64()
}

impl Add for Innings {
    type Output = Innings;

    fn add(self, rhs: Innings) -> Innings {
        Innings::from_outs(self.outs.saturating_add(rhs.outs))
    }
}

impl Sum for Innings {
    fn sum<I: Iterator<Item = Innings>>(iter: I) -> Innings {
        iter.fold(Innings::ZERO, Add::add)
    }
}

impl fmt::Display for Innings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.outs / OUTS_PER_INNING, self.outs % OUTS_PER_INNING)
    }
}
