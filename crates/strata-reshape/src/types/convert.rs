use super::parse::{parse_value_as, ParserOptions};
use crate::tree::replace_column;
use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone, Utc};
use strata_columnar::{
    Column, ColumnPath, ColumnSelector, Decimal, ElementType, Frame, FrameError, FrameResult,
    Unresolved, Value, ValueColumn, ValueType,
};

/// Options for typed conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Used for string sources.
    pub parser: ParserOptions,
    /// Zone in which epoch milliseconds and instants are read as local dates and times.
    pub time_zone: FixedOffset,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            parser: ParserOptions::default(),
            time_zone: Utc.fix(),
        }
    }
}

/// Failure to convert a single value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueConversionError {
    #[error("no converter from {from} to {to}")]
    NoConverter { from: ValueType, to: ValueType },
    #[error("can not convert {value} to {to}: {reason}")]
    Failed {
        value: String,
        to: ValueType,
        reason: String,
    },
}

impl ValueConversionError {
    fn at(self, path: &ColumnPath) -> FrameError {
        match self {
            ValueConversionError::NoConverter { from, to } => FrameError::ConverterNotFound {
                path: path.clone(),
                from,
                to,
            },
            ValueConversionError::Failed { value, to, reason } => FrameError::ConversionFailed {
                path: path.clone(),
                value,
                to,
                reason,
            },
        }
    }
}

fn failed(value: &Value, to: ValueType, reason: &str) -> ValueConversionError {
    ValueConversionError::Failed {
        value: value.to_string(),
        to,
        reason: reason.to_string(),
    }
}

/// Converts one value to `target`, dispatching on the value's own type. Nulls stay nulls.
pub fn convert_value(
    value: &Value,
    target: ValueType,
    options: &ConvertOptions,
) -> Result<Value, ValueConversionError> {
    let Some(from) = value.value_type() else {
        return Ok(Value::Null);
    };
    if target.accepts(from) {
        return Ok(value.clone());
    }
    let no_converter = || ValueConversionError::NoConverter { from, to: target };
    let tz = &options.time_zone;

    match (value, target) {
        (_, ValueType::String) => Ok(Value::string(value.to_string())),
        (Value::String(text), _) => parse_value_as(text, target, &options.parser)
            .ok_or_else(|| failed(value, target, "not a valid value of the target type")),

        (Value::Boolean(b), ValueType::Int | ValueType::Number) => Ok(Value::Int(i32::from(*b))),
        (Value::Boolean(b), ValueType::Long) => Ok(Value::Long(i64::from(*b))),
        (Value::Boolean(b), ValueType::Double) => Ok(Value::Double(if *b { 1.0 } else { 0.0 })),
        (Value::Boolean(b), ValueType::Decimal) => Ok(Value::Decimal(Decimal::from_i64(i64::from(*b)))),

        (Value::Int(_) | Value::Long(_) | Value::Double(_) | Value::Decimal(_), _)
            if target.is_numeric() || target == ValueType::Boolean =>
        {
            convert_number(value, target)
        }

        (Value::Int(_) | Value::Long(_), ValueType::Instant) => {
            Ok(Value::Instant(instant_from_millis(value)?))
        }
        (Value::Int(_) | Value::Long(_), ValueType::DateTime) => {
            Ok(Value::DateTime(instant_from_millis(value)?.with_timezone(tz).naive_local()))
        }
        (Value::Int(_) | Value::Long(_), ValueType::Date) => Ok(Value::Date(
            instant_from_millis(value)?.with_timezone(tz).date_naive(),
        )),
        (Value::Int(_) | Value::Long(_), ValueType::Duration) => {
            Ok(Value::Duration(TimeDelta::milliseconds(value.as_i64().unwrap_or_default())))
        }

        (Value::Instant(instant), _) => match target {
            ValueType::Long => Ok(Value::Long(instant.timestamp_millis())),
            ValueType::DateTime => Ok(Value::DateTime(instant.with_timezone(tz).naive_local())),
            ValueType::Date => Ok(Value::Date(instant.with_timezone(tz).date_naive())),
            ValueType::Time => Ok(Value::Time(instant.with_timezone(tz).time())),
            _ => Err(no_converter()),
        },
        (Value::DateTime(local), _) => match target {
            ValueType::Instant => Ok(Value::Instant(local_to_instant(value, local, tz)?)),
            ValueType::Long => Ok(Value::Long(local_to_instant(value, local, tz)?.timestamp_millis())),
            ValueType::Date => Ok(Value::Date(local.date())),
            ValueType::Time => Ok(Value::Time(local.time())),
            _ => Err(no_converter()),
        },
        (Value::Date(date), _) => {
            let midnight = date.and_time(NaiveTime::MIN);
            match target {
                ValueType::DateTime => Ok(Value::DateTime(midnight)),
                ValueType::Instant => Ok(Value::Instant(local_to_instant(value, &midnight, tz)?)),
                ValueType::Long => Ok(Value::Long(
                    local_to_instant(value, &midnight, tz)?.timestamp_millis(),
                )),
                _ => Err(no_converter()),
            }
        }
        (Value::Duration(duration), ValueType::Long) => Ok(Value::Long(duration.num_milliseconds())),
        _ => Err(no_converter()),
    }
}

fn instant_from_millis(value: &Value) -> Result<DateTime<Utc>, ValueConversionError> {
    value
        .as_i64()
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(|| failed(value, ValueType::Instant, "out of range"))
}

fn local_to_instant(
    value: &Value,
    local: &NaiveDateTime,
    tz: &FixedOffset,
) -> Result<DateTime<Utc>, ValueConversionError> {
    tz.from_local_datetime(local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| failed(value, ValueType::Instant, "out of range"))
}

fn convert_number(value: &Value, target: ValueType) -> Result<Value, ValueConversionError> {
    let overflow = || failed(value, target, "out of range");
    let as_i128 = || -> Result<i128, ValueConversionError> {
        match value {
            Value::Int(v) => Ok(i128::from(*v)),
            Value::Long(v) => Ok(i128::from(*v)),
            Value::Double(v) if v.is_finite() => Ok(v.round() as i128),
            Value::Double(_) => Err(failed(value, target, "not a finite number")),
            Value::Decimal(v) => Ok(v.round()),
            _ => Err(ValueConversionError::NoConverter {
                from: value.value_type().unwrap_or(ValueType::Any),
                to: target,
            }),
        }
    };
    match target {
        ValueType::Int => i32::try_from(as_i128()?)
            .map(Value::Int)
            .map_err(|_| overflow()),
        ValueType::Long => i64::try_from(as_i128()?)
            .map(Value::Long)
            .map_err(|_| overflow()),
        ValueType::Double => Ok(Value::Double(value.as_f64().unwrap_or(f64::NAN))),
        ValueType::Decimal => match value {
            Value::Double(v) => Decimal::from_f64(*v).map(Value::Decimal).ok_or_else(overflow),
            other => other
                .as_i64()
                .map(|v| Value::Decimal(Decimal::from_i64(v)))
                .ok_or_else(overflow),
        },
        ValueType::Boolean => Ok(Value::Boolean(match value {
            Value::Decimal(v) => v.mantissa() != 0,
            other => other.as_f64().is_some_and(|v| v != 0.0),
        })),
        // Numeric values already fit `Number`.
        _ => Ok(value.clone()),
    }
}

/// Converts a value column to `target`. The result is nullable when the target or the source is,
/// or when the converted values contain nulls.
pub fn convert_column(
    column: &ValueColumn,
    path: &ColumnPath,
    target: ElementType,
    options: &ConvertOptions,
) -> FrameResult<ValueColumn> {
    let source = column.element_type();
    if source.value_type == target.value_type {
        return Ok(column.with_element_type(target.with_nullable(target.nullable || source.nullable)));
    }
    let values = column
        .values()
        .iter()
        .map(|v| convert_value(v, target.value_type, options).map_err(|e| e.at(path)))
        .collect::<FrameResult<Vec<_>>>()?;
    let nullable = target.nullable || source.nullable || values.iter().any(Value::is_null);
    log::trace!("converted column {path} from {source} to {}", target.value_type);
    Ok(ValueColumn::new(
        column.name(),
        ElementType::new(target.value_type, nullable),
        values,
    ))
}

/// Converts every selected value column to `target`.
pub fn convert(
    frame: &Frame,
    columns: impl Into<ColumnSelector>,
    target: ElementType,
    options: &ConvertOptions,
) -> FrameResult<Frame> {
    let paths = columns.into().resolve(frame, Unresolved::Fail)?;
    let mut result = frame.clone();
    for path in paths {
        let converted = convert_column(result.value_column(&path)?, &path, target, options)?;
        result = replace_column(&result, &path, Column::Value(converted))?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn convert(value: impl Into<Value>, target: ValueType) -> Result<Value, ValueConversionError> {
        convert_value(&value.into(), target, &ConvertOptions::default())
    }

    #[test]
    fn numeric_narrowing_rounds_and_checks_range() {
        assert_eq!(convert(2.5, ValueType::Int), Ok(Value::Int(3)));
        assert_eq!(convert(-2.5, ValueType::Long), Ok(Value::Long(-3)));
        assert!(matches!(
            convert(i64::MAX, ValueType::Int),
            Err(ValueConversionError::Failed { .. })
        ));
        assert_eq!(convert(0, ValueType::Boolean), Ok(Value::Boolean(false)));
        assert_eq!(convert(true, ValueType::Double), Ok(Value::Double(1.0)));
    }

    #[test]
    fn temporal_conversions_use_the_time_zone() {
        let options = ConvertOptions {
            time_zone: FixedOffset::east_opt(3_600).unwrap(),
            ..ConvertOptions::default()
        };
        let instant = convert_value(&Value::Long(0), ValueType::DateTime, &options).unwrap();
        assert_eq!(
            instant,
            Value::DateTime(
                NaiveDate::from_ymd_opt(1970, 1, 1)
                    .unwrap()
                    .and_hms_opt(1, 0, 0)
                    .unwrap()
            )
        );
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            convert(date, ValueType::DateTime),
            Ok(Value::DateTime(date.and_hms_opt(0, 0, 0).unwrap()))
        );
    }

    #[test]
    fn strings_go_through_the_parser() {
        assert_eq!(convert("42", ValueType::Long), Ok(Value::Long(42)));
        assert!(matches!(
            convert("x", ValueType::Int),
            Err(ValueConversionError::Failed { .. })
        ));
        assert_eq!(convert(7, ValueType::String), Ok(Value::string("7")));
        assert!(matches!(
            convert(true, ValueType::Date),
            Err(ValueConversionError::NoConverter { .. })
        ));
    }
}
