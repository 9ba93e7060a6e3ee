use crate::decimal::Decimal;
use crate::types::ValueType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeDelta, Utc};
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use url::Url;

/// A single scalar cell of a value column.
///
/// Doubles compare and hash through [`OrderedFloat`], so `NaN` equals itself and any `Value` can
/// be used as a grouping key.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Decimal(Decimal),
    String(Arc<str>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Instant(DateTime<Utc>),
    Duration(TimeDelta),
    Url(Url),
    List(Arc<[Value]>),
    Json(Arc<serde_json::Value>),
}

impl Value {
    pub fn string(text: impl AsRef<str>) -> Self {
        Value::String(Arc::from(text.as_ref()))
    }

    pub fn list<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Value::List(values.into_iter().map(Into::into).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Concrete runtime type of the value; `None` for nulls.
    pub fn value_type(&self) -> Option<ValueType> {
        Some(match self {
            Value::Null => return None,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Int(_) => ValueType::Int,
            Value::Long(_) => ValueType::Long,
            Value::Double(_) => ValueType::Double,
            Value::Decimal(_) => ValueType::Decimal,
            Value::String(_) => ValueType::String,
            Value::Date(_) => ValueType::Date,
            Value::Time(_) => ValueType::Time,
            Value::DateTime(_) => ValueType::DateTime,
            Value::Instant(_) => ValueType::Instant,
            Value::Duration(_) => ValueType::Duration,
            Value::Url(_) => ValueType::Url,
            Value::List(_) => ValueType::List,
            Value::Json(_) => ValueType::Json,
        })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(f64::from(*v)),
            Value::Long(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            Value::Decimal(v) => Some(v.to_f64()),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Int(_) | Value::Long(_) | Value::Double(_) | Value::Decimal(_) => 2,
            Value::String(_) => 3,
            Value::Date(_) => 4,
            Value::Time(_) => 5,
            Value::DateTime(_) => 6,
            Value::Instant(_) => 7,
            Value::Duration(_) => 8,
            Value::Url(_) => 9,
            Value::List(_) => 10,
            Value::Json(_) => 11,
        }
    }
}

/// Total order over values used by sorting.
///
/// Numbers of different concrete types compare by magnitude; otherwise values of different
/// types are ordered by a fixed type rank (null first).
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Decimal(x), Value::Decimal(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Date(x), Value::Date(y)) => x.cmp(y),
        (Value::Time(x), Value::Time(y)) => x.cmp(y),
        (Value::DateTime(x), Value::DateTime(y)) => x.cmp(y),
        (Value::Instant(x), Value::Instant(y)) => x.cmp(y),
        (Value::Duration(x), Value::Duration(y)) => x.cmp(y),
        (Value::Url(x), Value::Url(y)) => x.as_str().cmp(y.as_str()),
        (Value::List(x), Value::List(y)) => {
            for (left, right) in x.iter().zip(y.iter()) {
                let ord = compare_values(left, right);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Json(x), Value::Json(y)) => x.to_string().cmp(&y.to_string()),
        _ => compare_numbers(a, b).unwrap_or_else(|| a.rank().cmp(&b.rank())),
    }
}

/// Orders two numbers of possibly different concrete types, or `None` when either is not a
/// number. Integers compare exactly against doubles and decimals.
fn compare_numbers(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    match (a, b) {
        (Value::Decimal(x), Value::Decimal(y)) => Some(x.cmp(y)),
        (Value::Decimal(x), _) => b
            .as_i64()
            .map(|y| x.cmp(&Decimal::from_i64(y)))
            .or_else(|| b.as_f64().map(|y| OrderedFloat(x.to_f64()).cmp(&OrderedFloat(y)))),
        (_, Value::Decimal(_)) => compare_numbers(b, a).map(Ordering::reverse),
        (Value::Double(x), Value::Double(y)) => Some(OrderedFloat(*x).cmp(&OrderedFloat(*y))),
        (_, Value::Double(y)) => a.as_i64().map(|x| compare_integer_to_double(x, *y)),
        (Value::Double(_), _) => compare_numbers(b, a).map(Ordering::reverse),
        _ => None,
    }
}

/// NaN sorts above every number, as it does for [`OrderedFloat`].
fn compare_integer_to_double(x: i64, y: f64) -> Ordering {
    // 2^63: the first double past `i64::MAX`.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if y.is_nan() || y >= LIMIT {
        return Ordering::Less;
    }
    if y < -LIMIT {
        return Ordering::Greater;
    }
    let whole = y.trunc();
    match x.cmp(&(whole as i64)) {
        Ordering::Equal => OrderedFloat(whole).cmp(&OrderedFloat(y)),
        ord => ord,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => OrderedFloat(*a) == OrderedFloat(*b),
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Instant(a), Value::Instant(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Url(a), Value::Url(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(v) => v.hash(state),
            Value::Int(v) => v.hash(state),
            Value::Long(v) => v.hash(state),
            Value::Double(v) => OrderedFloat(*v).hash(state),
            Value::Decimal(v) => v.hash(state),
            Value::String(v) => v.hash(state),
            Value::Date(v) => v.hash(state),
            Value::Time(v) => v.hash(state),
            Value::DateTime(v) => v.hash(state),
            Value::Instant(v) => v.hash(state),
            Value::Duration(v) => v.hash(state),
            Value::Url(v) => v.as_str().hash(state),
            Value::List(v) => v.hash(state),
            Value::Json(v) => v.to_string().hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Double(v) => {
                if v.is_nan() {
                    f.write_str("NaN")
                } else if v.is_infinite() {
                    f.write_str(if *v > 0.0 { "Infinity" } else { "-Infinity" })
                } else {
                    write!(f, "{v}")
                }
            }
            Value::Decimal(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Value::Time(v) => write!(f, "{}", v.format("%H:%M:%S%.f")),
            Value::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::Instant(v) => f.write_str(&v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Duration(v) => write!(f, "{v}"),
            Value::Url(v) => f.write_str(v.as_str()),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Json(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::string(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(Arc::from(v))
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Instant(v)
    }
}

impl From<TimeDelta> for Value {
    fn from(v: TimeDelta) -> Self {
        Value::Duration(v)
    }
}

impl From<Url> for Value {
    fn from(v: Url) -> Self {
        Value::Url(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(Arc::from(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_across_types() {
        assert_eq!(
            compare_values(&Value::Int(2), &Value::Double(1.5)),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(&Value::Long(3), &Value::Int(3)),
            Ordering::Equal
        );
        assert_eq!(
            compare_values(&Value::Null, &Value::Boolean(false)),
            Ordering::Less
        );
    }

    #[test]
    fn large_integers_compare_exactly_with_doubles() {
        let boundary = 1i64 << 53;
        let double = Value::Double(boundary as f64);
        assert_eq!(compare_values(&Value::Long(boundary), &double), Ordering::Equal);
        assert_eq!(
            compare_values(&Value::Long(boundary + 1), &double),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(&double, &Value::Long(boundary + 1)),
            Ordering::Less
        );
        assert_eq!(
            compare_values(&Value::Long(i64::MAX), &Value::Double(9.3e18)),
            Ordering::Less
        );
        assert_eq!(
            compare_values(&Value::Int(-1), &Value::Double(-1.5)),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(&Value::Int(0), &Value::Double(f64::NAN)),
            Ordering::Less
        );
        assert_eq!(
            compare_values(&Value::Decimal(Decimal::new(15, 1)), &Value::Int(2)),
            Ordering::Less
        );
    }

    #[test]
    fn nan_is_a_usable_key() {
        assert_eq!(Value::Double(f64::NAN), Value::Double(f64::NAN));
        assert_ne!(Value::Int(1), Value::Long(1));
    }

    #[test]
    fn display_is_iso_for_temporal_values() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let dt = date.and_hms_opt(3, 4, 5).unwrap();
        assert_eq!(Value::Date(date).to_string(), "2024-01-02");
        assert_eq!(Value::DateTime(dt).to_string(), "2024-01-02T03:04:05");
        assert_eq!(Value::Instant(dt.and_utc()).to_string(), "2024-01-02T03:04:05Z");
        assert_eq!(Value::list([1, 2]).to_string(), "[1, 2]");
    }
}
