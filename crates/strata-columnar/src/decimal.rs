use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Arbitrary-scale decimal number stored as `mantissa * 10^-scale`.
///
/// Values are kept normalized (no trailing zeros in the fractional part), so equality and hashing
/// are structural.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Decimal {
    mantissa: i128,
    scale: u32,
}

/// Largest scale accepted when parsing; keeps `10^scale` inside `i128`.
const MAX_SCALE: u32 = 36;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecimalError {
    #[error("invalid decimal literal")]
    Invalid,
    #[error("decimal out of range")]
    Overflow,
}

impl Decimal {
    pub const ZERO: Decimal = Decimal {
        mantissa: 0,
        scale: 0,
    };

    pub fn new(mantissa: i128, scale: u32) -> Self {
        let mut value = Self { mantissa, scale };
        value.normalize();
        value
    }

    fn normalize(&mut self) {
        while self.scale > 0 && self.mantissa % 10 == 0 {
            self.mantissa /= 10;
            self.scale -= 1;
        }
        if self.mantissa == 0 {
            self.scale = 0;
        }
    }

    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn from_i64(value: i64) -> Self {
        Self::new(i128::from(value), 0)
    }

    /// Exact decimal expansion of the shortest representation of `value`. Non-finite values and
    /// values whose expansion does not fit are rejected.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        format!("{value}").parse().ok()
    }

    pub fn to_f64(&self) -> f64 {
        self.mantissa as f64 / 10f64.powi(self.scale as i32)
    }

    /// Rounds half away from zero.
    pub fn round(&self) -> i128 {
        if self.scale == 0 {
            return self.mantissa;
        }
        let divisor = 10i128.pow(self.scale);
        let quotient = self.mantissa / divisor;
        let remainder = (self.mantissa % divisor).abs();
        if remainder * 2 >= divisor {
            quotient + self.mantissa.signum()
        } else {
            quotient
        }
    }

    pub fn is_integer(&self) -> bool {
        self.scale == 0
    }

    fn rescaled(&self, scale: u32) -> Option<i128> {
        let factor = 10i128.checked_pow(scale.checked_sub(self.scale)?)?;
        self.mantissa.checked_mul(factor)
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let scale = self.scale.max(other.scale);
        match (self.rescaled(scale), other.rescaled(scale)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.to_f64().total_cmp(&other.to_f64()),
        }
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Decimal {
    type Err = DecimalError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (negative, body) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let (body, exponent) = match body.find(['e', 'E']) {
            Some(idx) => {
                let exponent: i32 = body[idx + 1..]
                    .parse()
                    .map_err(|_| DecimalError::Invalid)?;
                (&body[..idx], exponent)
            }
            None => (body, 0),
        };
        let (integer, fraction) = body.split_once('.').unwrap_or((body, ""));
        if integer.is_empty() && fraction.is_empty() {
            return Err(DecimalError::Invalid);
        }
        let mut mantissa: i128 = 0;
        for ch in integer.chars().chain(fraction.chars()) {
            let digit = ch.to_digit(10).ok_or(DecimalError::Invalid)?;
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(i128::from(digit)))
                .ok_or(DecimalError::Overflow)?;
        }
        let mut scale = fraction.len() as i64 - i64::from(exponent);
        while scale < 0 {
            mantissa = mantissa.checked_mul(10).ok_or(DecimalError::Overflow)?;
            scale += 1;
        }
        let mut value = Decimal {
            mantissa: if negative { -mantissa } else { mantissa },
            scale: u32::try_from(scale).map_err(|_| DecimalError::Overflow)?,
        };
        value.normalize();
        if value.scale > MAX_SCALE {
            return Err(DecimalError::Overflow);
        }
        Ok(value)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let digits = self.mantissa.unsigned_abs().to_string();
        let scale = self.scale as usize;
        let sign = if self.mantissa < 0 { "-" } else { "" };
        if digits.len() > scale {
            let (int, frac) = digits.split_at(digits.len() - scale);
            write!(f, "{sign}{int}.{frac}")
        } else {
            write!(f, "{sign}0.{}{digits}", "0".repeat(scale - digits.len()))
        }
    }
}
