//! Exact beat arithmetic.
//!
//! Pattern offsets and strum displacements are written as decimals (`1.5`) or
//! fractions (`1/8`). They are kept as reduced rationals so that repeated
//! displacement steps never accumulate rounding error; conversion to ticks
//! happens once, at emission time.

use std::fmt;
use std::str::FromStr;

/// Rational beat position or span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Beat {
    numerator: i64,
    denominator: i64,
}

impl Beat {
    pub const ZERO: Beat = Beat {
        numerator: 0,
        denominator: 1,
    };
    pub const ONE: Beat = Beat {
        numerator: 1,
        denominator: 1,
    };

    /// Create a reduced beat value. Returns `None` for a zero denominator.
    pub fn new(numerator: i64, denominator: i64) -> Option<Self> {
        Self::reduce(numerator as i128, denominator as i128)
    }

    /// Reduce a wide fraction, failing when either part does not fit back
    /// into an `i64`.
    fn reduce(numerator: i128, denominator: i128) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        let gcd = gcd(numerator.abs(), denominator.abs()).max(1);
        let sign = if denominator < 0 { -1 } else { 1 };
        let numerator = i64::try_from(sign * numerator / gcd).ok()?;
        let denominator = i64::try_from(sign * denominator / gcd).ok()?;
        // keeps `abs` and negation total
        if numerator == i64::MIN {
            return None;
        }
        Some(Beat {
            numerator,
            denominator,
        })
    }

    pub fn from_int(n: i64) -> Self {
        Beat {
            numerator: n,
            denominator: 1,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    pub fn is_negative(&self) -> bool {
        self.numerator < 0
    }

    pub fn abs(self) -> Self {
        Beat {
            numerator: self.numerator.abs(),
            denominator: self.denominator,
        }
    }

    /// Exact sum, or `None` when the reduced result overflows.
    pub fn checked_add(self, other: Beat) -> Option<Beat> {
        let numerator = self.numerator as i128 * other.denominator as i128
            + other.numerator as i128 * self.denominator as i128;
        let denominator = self.denominator as i128 * other.denominator as i128;
        Self::reduce(numerator, denominator)
    }

    pub fn checked_sub(self, other: Beat) -> Option<Beat> {
        self.checked_add(Beat {
            numerator: other.numerator.checked_neg()?,
            denominator: other.denominator,
        })
    }

    /// Convert to ticks, rounding half away from zero. Returns `None` when
    /// the tick count does not fit in an `i64`.
    pub fn to_ticks(self, ticks_per_beat: u32) -> Option<i64> {
        let scaled = self.numerator as i128 * ticks_per_beat as i128;
        let denominator = self.denominator as i128;
        let half = denominator / 2;
        let ticks = if scaled >= 0 {
            (scaled + half) / denominator
        } else {
            (scaled - half) / denominator
        };
        i64::try_from(ticks).ok()
    }
}

fn gcd(mut a: i128, mut b: i128) -> i128 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

impl PartialOrd for Beat {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Beat {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        let lhs = self.numerator as i128 * other.denominator as i128;
        let rhs = other.numerator as i128 * self.denominator as i128;
        lhs.cmp(&rhs)
    }
}

impl fmt::Display for Beat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

/// Error returned when a beat literal is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeatParseError;

impl FromStr for Beat {
    type Err = BeatParseError;

    /// Accepts an optionally signed integer (`3`), decimal (`1.25`) or
    /// fraction (`-1/8`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        if body.is_empty() {
            return Err(BeatParseError);
        }

        let beat = if let Some((num, den)) = body.split_once('/') {
            let num = parse_digits(num)?;
            let den = parse_digits(den)?;
            Beat::new(num, den).ok_or(BeatParseError)?
        } else if let Some((whole, frac)) = body.split_once('.') {
            if whole.is_empty() && frac.is_empty() {
                return Err(BeatParseError);
            }
            let whole = if whole.is_empty() { 0 } else { parse_digits(whole)? };
            let scale = 10_i64
                .checked_pow(frac.len() as u32)
                .ok_or(BeatParseError)?;
            let frac = if frac.is_empty() { 0 } else { parse_digits(frac)? };
            let numerator = whole
                .checked_mul(scale)
                .and_then(|n| n.checked_add(frac))
                .ok_or(BeatParseError)?;
            Beat::new(numerator, scale).ok_or(BeatParseError)?
        } else {
            Beat::from_int(parse_digits(body)?)
        };

        if negative {
            Beat::ZERO.checked_sub(beat).ok_or(BeatParseError)
        } else {
            Ok(beat)
        }
    }
}

fn parse_digits(s: &str) -> Result<i64, BeatParseError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BeatParseError);
    }
    s.parse().map_err(|_| BeatParseError)
}
