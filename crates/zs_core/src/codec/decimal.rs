// Arbitrary-precision decimal numbers as they appear in save files.
// The coefficient digits and exponent are stored exactly as parsed so the
// original text ("5.0", "91.50799999999999") can be reproduced on write.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Coefficient and exponent of the near-zero tolerance, 9e-05.
const TOLERANCE_COEFFICIENT: &str = "9";
const TOLERANCE_EXPONENT: i64 = -5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecimalError {
    #[error("Invalid decimal literal: {0:?}")]
    Invalid(String),

    #[error("Decimal exponent out of range: {0:?}")]
    ExponentOutOfRange(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Repr {
    Finite {
        negative: bool,
        // ASCII digits without leading zeros ("0" for zero)
        coefficient: String,
        exponent: i64,
    },
    NaN,
    Infinity {
        negative: bool,
    },
}

/// A signed decimal `coefficient × 10^exponent`, or one of the non-finite
/// values NaN, Infinity and -Infinity.
///
/// Equality is representational: `5.0` and `5.00` are different values
/// because they are written differently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    repr: Repr,
}

impl Decimal {
    pub fn nan() -> Self {
        Self { repr: Repr::NaN }
    }

    pub fn infinity() -> Self {
        Self {
            repr: Repr::Infinity { negative: false },
        }
    }

    pub fn neg_infinity() -> Self {
        Self {
            repr: Repr::Infinity { negative: true },
        }
    }

    /// An integer with exponent 0, written as plain digits.
    pub fn from_i64(value: i64) -> Self {
        Self {
            repr: Repr::Finite {
                negative: value < 0,
                coefficient: value.unsigned_abs().to_string(),
                exponent: 0,
            },
        }
    }

    /// A whole number in the game's float family, written as `n.0`.
    pub fn from_whole(value: i64) -> Self {
        let coefficient = if value == 0 {
            "0".to_string()
        } else {
            format!("{}0", value.unsigned_abs())
        };
        Self {
            repr: Repr::Finite {
                negative: value < 0,
                coefficient,
                exponent: -1,
            },
        }
    }

    /// Rescales an exponent-0 value to exponent -1 so it prints as `n.0`
    /// and reads back as a decimal rather than an integer. Any other value
    /// is returned unchanged.
    pub fn float_family(&self) -> Self {
        match &self.repr {
            Repr::Finite {
                negative,
                coefficient,
                exponent: 0,
            } => {
                let coefficient = if coefficient == "0" {
                    coefficient.clone()
                } else {
                    format!("{coefficient}0")
                };
                Self {
                    repr: Repr::Finite {
                        negative: *negative,
                        coefficient,
                        exponent: -1,
                    },
                }
            }
            _ => self.clone(),
        }
    }

    pub fn is_finite(&self) -> bool {
        matches!(self.repr, Repr::Finite { .. })
    }

    pub fn is_nan(&self) -> bool {
        matches!(self.repr, Repr::NaN)
    }

    pub fn is_zero(&self) -> bool {
        matches!(&self.repr, Repr::Finite { coefficient, .. } if coefficient == "0")
    }

    pub fn is_sign_negative(&self) -> bool {
        match &self.repr {
            Repr::Finite { negative, .. } | Repr::Infinity { negative } => *negative,
            Repr::NaN => false,
        }
    }

    /// Coefficient digits, or `None` for non-finite values.
    pub fn coefficient(&self) -> Option<&str> {
        match &self.repr {
            Repr::Finite { coefficient, .. } => Some(coefficient),
            _ => None,
        }
    }

    pub fn exponent(&self) -> Option<i64> {
        match &self.repr {
            Repr::Finite { exponent, .. } => Some(*exponent),
            _ => None,
        }
    }

    /// Exponent of the most significant digit, i.e. `e` in `d.ddd × 10^e`.
    pub fn adjusted_exponent(&self) -> Option<i128> {
        match &self.repr {
            Repr::Finite {
                coefficient,
                exponent,
                ..
            } => Some(*exponent as i128 + coefficient.len() as i128 - 1),
            _ => None,
        }
    }

    /// Same value with the sign cleared. Non-finite values keep NaN-ness.
    pub fn abs(&self) -> Self {
        let repr = match &self.repr {
            Repr::Finite {
                coefficient,
                exponent,
                ..
            } => Repr::Finite {
                negative: false,
                coefficient: coefficient.clone(),
                exponent: *exponent,
            },
            Repr::Infinity { .. } => Repr::Infinity { negative: false },
            Repr::NaN => Repr::NaN,
        };
        Self { repr }
    }

    /// Compares magnitudes of two finite values. `None` if either is not finite.
    pub fn cmp_abs(&self, other: &Decimal) -> Option<Ordering> {
        match (&self.repr, &other.repr) {
            (
                Repr::Finite {
                    coefficient: a,
                    exponent: ea,
                    ..
                },
                Repr::Finite {
                    coefficient: b,
                    exponent: eb,
                    ..
                },
            ) => Some(cmp_magnitude(a, *ea, b, *eb)),
            _ => None,
        }
    }

    /// True for a value within 9e-05 of zero, except the literal `0.0`
    /// which the game writes in plain form.
    pub fn is_almost_zero(&self) -> bool {
        match &self.repr {
            Repr::Finite {
                negative,
                coefficient,
                exponent,
            } => {
                if !*negative && coefficient == "0" && *exponent == -1 {
                    return false;
                }
                cmp_magnitude(
                    coefficient,
                    *exponent,
                    TOLERANCE_COEFFICIENT,
                    TOLERANCE_EXPONENT,
                ) != Ordering::Greater
            }
            _ => false,
        }
    }

    /// Lower-case exponential form with a signed, two-digit minimum exponent:
    /// `1.5e-05`, `-3e-07`, `0e-02`.
    pub fn to_scientific(&self) -> String {
        match &self.repr {
            Repr::Finite {
                negative,
                coefficient,
                exponent,
            } => {
                let adjusted = *exponent as i128 + coefficient.len() as i128 - 1;
                let (lead, rest) = coefficient.split_at(1);
                let sign = if *negative { "-" } else { "" };
                if rest.is_empty() {
                    format!("{sign}{lead}e{adjusted:+03}")
                } else {
                    format!("{sign}{lead}.{rest}e{adjusted:+03}")
                }
            }
            _ => self.to_string(),
        }
    }

    /// The value as an `i64` if it has no fractional part and fits.
    pub fn to_i64(&self) -> Option<i64> {
        let Repr::Finite {
            negative,
            coefficient,
            exponent,
        } = &self.repr
        else {
            return None;
        };

        let magnitude: i128 = if *exponent >= 0 {
            if coefficient == "0" {
                0
            } else {
                let zeros = usize::try_from(*exponent).ok()?;
                if coefficient.len() + zeros > 19 {
                    return None;
                }
                format!("{coefficient}{}", "0".repeat(zeros)).parse().ok()?
            }
        } else {
            let frac_len = usize::try_from(exponent.unsigned_abs()).ok()?;
            let split = coefficient.len().saturating_sub(frac_len);
            let (int_part, frac_part) = coefficient.split_at(split);
            if frac_part.bytes().any(|b| b != b'0') {
                return None;
            }
            if int_part.is_empty() {
                0
            } else {
                if int_part.len() > 19 {
                    return None;
                }
                int_part.parse().ok()?
            }
        };

        let signed = if *negative { -magnitude } else { magnitude };
        i64::try_from(signed).ok()
    }
}

fn cmp_magnitude(a: &str, ea: i64, b: &str, eb: i64) -> Ordering {
    match (a == "0", b == "0") {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => {}
    }

    let adj_a = ea as i128 + a.len() as i128;
    let adj_b = eb as i128 + b.len() as i128;
    if adj_a != adj_b {
        return adj_a.cmp(&adj_b);
    }

    let (a, b) = (a.as_bytes(), b.as_bytes());
    for i in 0..a.len().max(b.len()) {
        let da = a.get(i).copied().unwrap_or(b'0');
        let db = b.get(i).copied().unwrap_or(b'0');
        if da != db {
            return da.cmp(&db);
        }
    }
    Ordering::Equal
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

impl FromStr for Decimal {
    type Err = DecimalError;

    /// Accepts `[+-]digits[.digits][(e|E)[+-]digits]` (either side of the
    /// point may be empty, not both) plus `NaN`, `Infinity` and `-Infinity`.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "NaN" => return Ok(Self::nan()),
            "Infinity" | "+Infinity" => return Ok(Self::infinity()),
            "-Infinity" => return Ok(Self::neg_infinity()),
            _ => {}
        }

        let invalid = || DecimalError::Invalid(text.to_string());

        let (negative, unsigned) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };

        let (mantissa, exp_text) = match unsigned.find(['e', 'E']) {
            Some(idx) => (&unsigned[..idx], Some(&unsigned[idx + 1..])),
            None => (unsigned, None),
        };

        let (int_part, frac_part) = match mantissa.find('.') {
            Some(idx) => (&mantissa[..idx], &mantissa[idx + 1..]),
            None => (mantissa, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(invalid());
        }

        let written_exponent: i64 = match exp_text {
            None => 0,
            Some(exp) => {
                let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
                if digits.is_empty() || !all_digits(digits) {
                    return Err(invalid());
                }
                exp.parse()
                    .map_err(|_| DecimalError::ExponentOutOfRange(text.to_string()))?
            }
        };
        let frac_len = i64::try_from(frac_part.len())
            .map_err(|_| DecimalError::ExponentOutOfRange(text.to_string()))?;
        let exponent = written_exponent
            .checked_sub(frac_len)
            .ok_or_else(|| DecimalError::ExponentOutOfRange(text.to_string()))?;

        let joined = format!("{int_part}{frac_part}");
        let trimmed = joined.trim_start_matches('0');
        let coefficient = if trimmed.is_empty() { "0" } else { trimmed };

        Ok(Self {
            repr: Repr::Finite {
                negative,
                coefficient: coefficient.to_string(),
                exponent,
            },
        })
    }
}

impl fmt::Display for Decimal {
    /// General decimal arithmetic "to-scientific-string": plain notation
    /// while the exponent is non-positive and the value is not too small,
    /// `d.dddE±n` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (negative, coefficient, exponent) = match &self.repr {
            Repr::NaN => return f.write_str("NaN"),
            Repr::Infinity { negative: false } => return f.write_str("Infinity"),
            Repr::Infinity { negative: true } => return f.write_str("-Infinity"),
            Repr::Finite {
                negative,
                coefficient,
                exponent,
            } => (*negative, coefficient, *exponent as i128),
        };

        if negative {
            f.write_str("-")?;
        }

        let len = coefficient.len() as i128;
        let left = exponent + len;
        let dot = if exponent <= 0 && left > -6 { left } else { 1 };

        if dot <= 0 {
            write!(f, "0.{}{}", "0".repeat((-dot) as usize), coefficient)?;
        } else if dot >= len {
            write!(f, "{}{}", coefficient, "0".repeat((dot - len) as usize))?;
        } else {
            let (int_part, frac_part) = coefficient.split_at(dot as usize);
            write!(f, "{int_part}.{frac_part}")?;
        }

        if left != dot {
            write!(f, "E{:+}", left - dot)?;
        }
        Ok(())
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
