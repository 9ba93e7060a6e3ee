use super::locale::ValueLocaleConfig;
use crate::tree::replace_column;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use std::str::FromStr;
use std::sync::Arc;
use strata_columnar::{
    Column, ColumnPath, ColumnSelector, Decimal, ElementType, Frame, FrameColumn, FrameError,
    FrameResult, Unresolved, Value, ValueColumn, ValueType,
};
use url::Url;

/// Strings read as nulls unless [`ParserOptions::null_strings`] says otherwise.
pub const DEFAULT_NULL_STRINGS: &[&str] = &["null", "NULL", "NA", "N/A"];

/// URL schemes a string must use to be detected as a URL.
const URL_SCHEMES: &[&str] = &["http", "https", "ftp", "file", "jar"];

const ISO_DATE_TIMES: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];
const ISO_TIMES: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Configuration of string parsing. Passed explicitly to every parse call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParserOptions {
    pub locale: ValueLocaleConfig,
    /// When set, the only pattern (chrono `strftime` syntax) used for dates, times and
    /// date-times.
    pub date_time_format: Option<String>,
    /// Extra patterns tried before the ISO forms.
    pub date_time_patterns: Vec<String>,
    /// Strings read as nulls; [`DEFAULT_NULL_STRINGS`] when `None`.
    pub null_strings: Option<Vec<String>>,
    /// Types left out of automatic detection.
    pub skip_types: Vec<ValueType>,
}

impl ParserOptions {
    pub const DEFAULT: ParserOptions = ParserOptions {
        locale: ValueLocaleConfig::en_us(),
        date_time_format: None,
        date_time_patterns: Vec::new(),
        null_strings: None,
        skip_types: Vec::new(),
    };

    #[must_use]
    pub fn with_locale(mut self, locale: ValueLocaleConfig) -> Self {
        self.locale = locale;
        self
    }

    #[must_use]
    pub fn with_date_time_format(mut self, format: impl Into<String>) -> Self {
        self.date_time_format = Some(format.into());
        self
    }

    #[must_use]
    pub fn with_date_time_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.date_time_patterns.push(pattern.into());
        self
    }

    #[must_use]
    pub fn with_null_strings<I, S>(mut self, strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.null_strings = Some(strings.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn skip(mut self, value_type: ValueType) -> Self {
        self.skip_types.push(value_type);
        self
    }

    pub fn is_null_string(&self, text: &str) -> bool {
        match &self.null_strings {
            Some(strings) => strings.iter().any(|s| s == text),
            None => DEFAULT_NULL_STRINGS.contains(&text),
        }
    }

    fn temporal_patterns(&self) -> Vec<&str> {
        match &self.date_time_format {
            Some(format) => vec![format.as_str()],
            None => self.date_time_patterns.iter().map(String::as_str).collect(),
        }
    }
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Entries of the detection cascade, tried in this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Parser {
    Int,
    Long,
    Instant,
    DateTime,
    Date,
    Duration,
    Time,
    Url,
    LocaleDouble,
    PosixDouble,
    Boolean,
    Decimal,
}

const CASCADE: [Parser; 12] = [
    Parser::Int,
    Parser::Long,
    Parser::Instant,
    Parser::DateTime,
    Parser::Date,
    Parser::Duration,
    Parser::Time,
    Parser::Url,
    Parser::LocaleDouble,
    Parser::PosixDouble,
    Parser::Boolean,
    Parser::Decimal,
];

impl Parser {
    fn target(self) -> ValueType {
        match self {
            Parser::Int => ValueType::Int,
            Parser::Long => ValueType::Long,
            Parser::Instant => ValueType::Instant,
            Parser::DateTime => ValueType::DateTime,
            Parser::Date => ValueType::Date,
            Parser::Duration => ValueType::Duration,
            Parser::Time => ValueType::Time,
            Parser::Url => ValueType::Url,
            Parser::LocaleDouble | Parser::PosixDouble => ValueType::Double,
            Parser::Boolean => ValueType::Boolean,
            Parser::Decimal => ValueType::Decimal,
        }
    }

    fn parse(self, text: &str, options: &ParserOptions) -> Option<Value> {
        match self {
            Parser::Int => text.parse::<i32>().ok().map(Value::Int),
            Parser::Long => text.parse::<i64>().ok().map(Value::Long),
            Parser::Instant => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| Value::Instant(dt.with_timezone(&Utc))),
            Parser::DateTime => parse_date_time(text, options).map(Value::DateTime),
            Parser::Date => parse_date(text, options).map(Value::Date),
            Parser::Duration => parse_duration(text).map(Value::Duration),
            Parser::Time => parse_time(text, options).map(Value::Time),
            Parser::Url => parse_url(text).map(Value::Url),
            Parser::LocaleDouble => parse_locale_double(text, options.locale).map(Value::Double),
            Parser::PosixDouble => parse_posix_double(text).map(Value::Double),
            Parser::Boolean => parse_boolean(text).map(Value::Boolean),
            Parser::Decimal => Decimal::from_str(text).ok().map(Value::Decimal),
        }
    }
}

fn parse_date_time(text: &str, options: &ParserOptions) -> Option<NaiveDateTime> {
    let custom = options.temporal_patterns();
    let iso = if options.date_time_format.is_some() {
        &[][..]
    } else {
        ISO_DATE_TIMES
    };
    custom
        .into_iter()
        .chain(iso.iter().copied())
        .find_map(|pattern| NaiveDateTime::parse_from_str(text, pattern).ok())
}

fn parse_date(text: &str, options: &ParserOptions) -> Option<NaiveDate> {
    let custom = options.temporal_patterns();
    if options.date_time_format.is_some() {
        return custom
            .into_iter()
            .find_map(|pattern| NaiveDate::parse_from_str(text, pattern).ok());
    }
    let numeric: &[&str] = match options.locale.date_order {
        super::DateOrder::MDY => &["%m/%d/%Y"],
        super::DateOrder::DMY => &["%d/%m/%Y", "%d.%m.%Y"],
        super::DateOrder::YMD => &["%Y/%m/%d"],
    };
    custom
        .into_iter()
        .chain(std::iter::once("%Y-%m-%d"))
        .chain(numeric.iter().copied())
        .find_map(|pattern| NaiveDate::parse_from_str(text, pattern).ok())
}

fn parse_time(text: &str, options: &ParserOptions) -> Option<NaiveTime> {
    let custom = options.temporal_patterns();
    let iso = if options.date_time_format.is_some() {
        &[][..]
    } else {
        ISO_TIMES
    };
    custom
        .into_iter()
        .chain(iso.iter().copied())
        .find_map(|pattern| NaiveTime::parse_from_str(text, pattern).ok())
}

fn parse_url(text: &str) -> Option<Url> {
    let url = Url::parse(text).ok()?;
    URL_SCHEMES.contains(&url.scheme()).then_some(url)
}

fn parse_boolean(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" => Some(true),
        "false" | "f" | "no" => Some(false),
        _ => None,
    }
}

fn parse_special_double(text: &str) -> Option<f64> {
    match text.to_ascii_lowercase().as_str() {
        "nan" => Some(f64::NAN),
        "inf" | "+inf" | "infinity" | "+infinity" => Some(f64::INFINITY),
        "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

fn is_plain_number(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        && text.chars().any(|c| c.is_ascii_digit())
}

fn parse_posix_double(text: &str) -> Option<f64> {
    if let Some(special) = parse_special_double(text) {
        return Some(special);
    }
    if !is_plain_number(text) {
        return None;
    }
    text.parse::<f64>().ok()
}

/// Number written with the locale's separators. Grouped digits must come in blocks of three so
/// that dotted dates like `2020.01.01` are not taken for numbers in locales grouping with `.`.
fn parse_locale_double(text: &str, locale: ValueLocaleConfig) -> Option<f64> {
    if let Some(special) = parse_special_double(text) {
        return Some(special);
    }
    let separators = locale.separators;
    if text.contains(separators.thousands_sep) {
        let compact = compact_for_grouping_validation(text)?;
        if !has_valid_thousands_grouping(&compact, separators.decimal_sep, separators.thousands_sep)
        {
            return None;
        }
    }
    let normalized: String = text
        .chars()
        .filter(|&c| c != separators.thousands_sep)
        .map(|c| if c == separators.decimal_sep { '.' } else { c })
        .collect();
    parse_posix_double(&normalized)
}

fn compact_for_grouping_validation(text: &str) -> Option<String> {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix('-') {
        s = rest.trim_start();
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest.trim_start();
    }
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        None
    } else {
        Some(compact)
    }
}

fn has_valid_thousands_grouping(compact: &str, decimal_sep: char, group_sep: char) -> bool {
    if group_sep == decimal_sep {
        return false;
    }

    // Exponent digits are not grouped.
    let mantissa = compact
        .split_once(['e', 'E'])
        .map_or(compact, |(m, _)| m);
    if !mantissa.contains(group_sep) {
        return true;
    }

    let (integer, fractional) = mantissa
        .split_once(decimal_sep)
        .map_or((mantissa, None), |(i, f)| (i, Some(f)));
    if fractional.is_some_and(|f| f.contains(group_sep)) {
        return false;
    }

    let segments: Vec<&str> = integer.split(group_sep).collect();
    if segments.len() <= 1 {
        return true;
    }
    if segments[0].is_empty() || segments[0].len() > 3 {
        return false;
    }
    segments
        .iter()
        .all(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_ascii_digit()))
        && segments[1..].iter().all(|seg| seg.len() == 3)
}

const NANOS_PER_SECOND: f64 = 1e9;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Durations in ISO 8601 form (`PT1H30M`, `P2DT3.5S`) or as a list of unit terms
/// (`1h 30m`, `2d 3h 4m 5.5s`, `250ms`). A leading `-` negates the whole duration.
fn parse_duration(text: &str) -> Option<TimeDelta> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let duration = match body.strip_prefix('P') {
        Some(iso) => parse_iso_duration(iso)?,
        None => scan_duration(body, |unit| {
            Some(match unit {
                "d" => SECONDS_PER_DAY,
                "h" => 3_600.0,
                "m" => 60.0,
                "s" => 1.0,
                "ms" => 1e-3,
                "us" => 1e-6,
                "ns" => 1e-9,
                _ => return None,
            })
        })?,
    };
    Some(if negative { -duration } else { duration })
}

fn parse_iso_duration(body: &str) -> Option<TimeDelta> {
    let (date, time) = match body.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (body, None),
    };
    let mut total = TimeDelta::zero();
    if !date.is_empty() {
        total = total
            + scan_duration(date, |unit| match unit {
                "D" => Some(SECONDS_PER_DAY),
                "W" => Some(7.0 * SECONDS_PER_DAY),
                _ => None,
            })?;
    }
    match time {
        Some(time) => {
            total = total
                + scan_duration(time, |unit| match unit {
                    "H" => Some(3_600.0),
                    "M" => Some(60.0),
                    "S" => Some(1.0),
                    _ => None,
                })?;
        }
        None if date.is_empty() => return None,
        None => {}
    }
    Some(total)
}

/// Sums `<number><unit>` terms, optionally separated by spaces. `unit` gives seconds per unit.
fn scan_duration(text: &str, unit: impl Fn(&str) -> Option<f64>) -> Option<TimeDelta> {
    let mut rest = text.trim_start();
    if rest.is_empty() {
        return None;
    }
    let mut nanos = 0.0;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let unit_end = rest[number_end..]
            .find(|c: char| !c.is_ascii_alphabetic())
            .map_or(rest.len(), |i| number_end + i);
        if number_end == 0 || unit_end == number_end {
            return None;
        }
        let amount: f64 = rest[..number_end].parse().ok()?;
        nanos += amount * unit(&rest[number_end..unit_end])? * NANOS_PER_SECOND;
        rest = rest[unit_end..].trim_start();
    }
    if !nanos.is_finite() || nanos.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(TimeDelta::nanoseconds(nanos.round() as i64))
}

/// Parses one string as `target`. Supertype targets try the matching cascade entries in order;
/// `String` always succeeds.
pub fn parse_value_as(text: &str, target: ValueType, options: &ParserOptions) -> Option<Value> {
    let text = text.trim();
    let first = |accepts: &dyn Fn(ValueType) -> bool| {
        CASCADE
            .iter()
            .filter(|p| accepts(p.target()))
            .find_map(|p| p.parse(text, options))
    };
    match target {
        ValueType::String => Some(Value::string(text)),
        ValueType::Any => first(&|_: ValueType| true).or_else(|| Some(Value::string(text))),
        ValueType::Number => first(&ValueType::is_numeric),
        ValueType::Json => serde_json::from_str(text)
            .ok()
            .map(|json| Value::Json(Arc::new(json))),
        ValueType::List => None,
        concrete => first(&|t: ValueType| t == concrete),
    }
}

/// Detects the type of a string column. The first cascade entry parsing every non-null value
/// wins; null strings become nulls. Without a winner the column is returned unchanged.
pub fn try_parse_column(column: &ValueColumn, options: &ParserOptions) -> ValueColumn {
    if column.element_type().value_type != ValueType::String || column.is_empty() {
        return column.clone();
    }
    let texts: Vec<Option<&str>> = column
        .values()
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::trim)
                .filter(|s| !options.is_null_string(s))
        })
        .collect();
    let nullable = texts.iter().any(Option::is_none);
    if texts.iter().all(Option::is_none) {
        return ValueColumn::nulls(column.name(), ValueType::String, column.len());
    }

    'parsers: for parser in CASCADE {
        if options.skip_types.contains(&parser.target()) {
            continue;
        }
        let mut values = Vec::with_capacity(texts.len());
        for text in &texts {
            match text {
                None => values.push(Value::Null),
                Some(text) => match parser.parse(text, options) {
                    Some(value) => values.push(value),
                    None => continue 'parsers,
                },
            }
        }
        log::debug!(
            "column {} detected as {}",
            column.name(),
            parser.target()
        );
        return ValueColumn::new(
            column.name(),
            ElementType::new(parser.target(), nullable),
            values,
        );
    }
    log::trace!("column {} stays a string column", column.name());
    column.clone()
}

fn parse_column(column: &Column, options: &ParserOptions) -> FrameResult<Column> {
    Ok(match column {
        Column::Value(c) => Column::Value(try_parse_column(c, options)),
        Column::Group(g) => Column::group(g.name(), parse(g.frame(), options)?),
        Column::Frame(c) => Column::Frame(FrameColumn::new(
            c.name(),
            c.frames()
                .iter()
                .map(|f| f.as_ref().map(|f| parse(f, options)).transpose())
                .collect::<FrameResult<Vec<_>>>()?,
        )),
    })
}

/// Detects the types of all string columns, descending into column groups and frame columns.
pub fn parse(frame: &Frame, options: &ParserOptions) -> FrameResult<Frame> {
    let columns = frame
        .columns()
        .iter()
        .map(|c| parse_column(c, options))
        .collect::<FrameResult<Vec<_>>>()?;
    frame.with_columns(columns)
}

/// Like [`parse`], restricted to the selected columns.
pub fn parse_columns(
    frame: &Frame,
    columns: impl Into<ColumnSelector>,
    options: &ParserOptions,
) -> FrameResult<Frame> {
    let paths = columns.into().resolve(frame, Unresolved::Fail)?;
    let mut result = frame.clone();
    for path in paths {
        let parsed = parse_column(result.try_get(&path)?, options)?;
        result = replace_column(&result, &path, parsed)?;
    }
    Ok(result)
}

/// Parses every selected value column as `target`. Unlike detection, the first value that does
/// not parse is an error.
pub fn parse_as(
    frame: &Frame,
    columns: impl Into<ColumnSelector>,
    target: ValueType,
    options: &ParserOptions,
) -> FrameResult<Frame> {
    let paths = columns.into().resolve(frame, Unresolved::Fail)?;
    let mut result = frame.clone();
    for path in paths {
        let column = result.value_column(&path)?;
        let values = column
            .values()
            .iter()
            .map(|value| parse_cell_as(value, &path, target, options))
            .collect::<FrameResult<Vec<_>>>()?;
        let nullable = values.iter().any(Value::is_null);
        let parsed = ValueColumn::new(column.name(), ElementType::new(target, nullable), values);
        result = replace_column(&result, &path, Column::Value(parsed))?;
    }
    Ok(result)
}

fn parse_cell_as(
    value: &Value,
    path: &ColumnPath,
    target: ValueType,
    options: &ParserOptions,
) -> FrameResult<Value> {
    let text = match value {
        Value::Null => return Ok(Value::Null),
        Value::String(s) => s.trim().to_string(),
        other if other.value_type().is_some_and(|t| target.accepts(t)) => {
            return Ok(other.clone())
        }
        other => other.to_string(),
    };
    if options.is_null_string(&text) {
        return Ok(Value::Null);
    }
    parse_value_as(&text, target, options).ok_or_else(|| FrameError::Parse {
        path: path.clone(),
        value: text,
        to: target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn grouping_must_come_in_threes() {
        assert!(has_valid_thousands_grouping("1,234,567.5", '.', ','));
        assert!(!has_valid_thousands_grouping("1,23", '.', ','));
        assert!(!has_valid_thousands_grouping("2020.01.01", ',', '.'));
    }

    #[test]
    fn locale_doubles() {
        let de = ValueLocaleConfig::de_de();
        assert_eq!(parse_locale_double("1.234,5", de), Some(1234.5));
        assert_eq!(parse_locale_double("2020.01.01", de), None);
        assert_eq!(parse_posix_double("-1.5e3"), Some(-1500.0));
        assert!(parse_posix_double("NaN").is_some_and(f64::is_nan));
        assert_eq!(parse_posix_double("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_posix_double("1.2.3"), None);
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("PT1H30M"), Some(TimeDelta::minutes(90)));
        assert_eq!(parse_duration("P1D"), Some(TimeDelta::days(1)));
        assert_eq!(parse_duration("-PT2S"), Some(TimeDelta::seconds(-2)));
        assert_eq!(parse_duration("1h 30m"), Some(TimeDelta::minutes(90)));
        assert_eq!(parse_duration("250ms"), Some(TimeDelta::milliseconds(250)));
        assert_eq!(parse_duration("P"), None);
        assert_eq!(parse_duration("12"), None);
        assert_eq!(parse_duration("1x"), None);
    }

    #[test]
    fn custom_date_time_format_replaces_iso_forms() {
        let options = ParserOptions::default().with_date_time_format("%d|%m|%Y %H.%M");
        let parsed = parse_date_time("03|02|2024 10.15", &options).unwrap();
        assert_eq!(parsed.hour(), 10);
        assert!(parse_date_time("2024-02-03T10:15", &options).is_none());
    }

    #[test]
    fn urls_need_a_known_scheme() {
        assert!(parse_url("https://example.com/a").is_some());
        assert!(parse_url("t:1").is_none());
    }
}
