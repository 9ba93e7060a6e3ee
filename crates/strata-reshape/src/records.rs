//! Conversion between serde records and frames.
//!
//! Records go through `serde_json` values. Struct and map fields become columns in field order;
//! nested structs become column groups, sequences of structs become frame columns and other
//! sequences become list values.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value as Json};
use std::sync::Arc;
use strata_columnar::{Cell, Column, ColumnPath, Frame, FrameError, FrameResult, Row, Value, ValueColumn};

/// Controls how records are mapped to columns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntrospectionOptions {
    /// Structured fields nested deeper than this are stored as JSON values; scalar and scalar
    /// list fields keep their types. Unlimited when `None`.
    pub max_depth: Option<usize>,
    /// Fields left out of the frame.
    pub exclude: Vec<ColumnPath>,
    /// Structured fields stored as JSON values instead of being expanded.
    pub preserve: Vec<ColumnPath>,
}

impl IntrospectionOptions {
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    #[must_use]
    pub fn exclude(mut self, path: impl Into<ColumnPath>) -> Self {
        self.exclude.push(path.into());
        self
    }

    #[must_use]
    pub fn preserve(mut self, path: impl Into<ColumnPath>) -> Self {
        self.preserve.push(path.into());
        self
    }
}

/// Builds a frame with one row per record.
pub fn to_frame<T: Serialize>(records: &[T], options: &IntrospectionOptions) -> FrameResult<Frame> {
    let values = records
        .iter()
        .map(|r| serde_json::to_value(r).map_err(|e| FrameError::Record(e.to_string())))
        .collect::<FrameResult<Vec<_>>>()?;
    let objects = values
        .iter()
        .enumerate()
        .map(|(i, v)| match v {
            Json::Object(map) => Ok(Some(map)),
            other => Err(FrameError::Record(format!(
                "record {i} is not a struct or map: {other}"
            ))),
        })
        .collect::<FrameResult<Vec<_>>>()?;
    let frame = objects_to_frame(&objects, &ColumnPath::root(), options)?;
    log::debug!(
        "introspected {} records into {} columns",
        frame.row_count(),
        frame.column_count()
    );
    Ok(frame)
}

fn objects_to_frame(
    objects: &[Option<&Map<String, Json>>],
    prefix: &ColumnPath,
    options: &IntrospectionOptions,
) -> FrameResult<Frame> {
    let mut names: Vec<&str> = Vec::new();
    for map in objects.iter().flatten() {
        for key in map.keys() {
            if !names.contains(&key.as_str()) {
                names.push(key);
            }
        }
    }

    let mut columns = Vec::with_capacity(names.len());
    for name in names {
        let path = prefix.child(name);
        if options.exclude.contains(&path) {
            continue;
        }
        let cells: Vec<Option<&Json>> = objects
            .iter()
            .map(|o| o.and_then(|m| m.get(name)).filter(|v| !v.is_null()))
            .collect();
        let expand = !options.preserve.contains(&path)
            && options.max_depth.map_or(true, |max| path.len() <= max);
        columns.push(field_column(name, &cells, &path, expand, options)?);
    }
    if columns.is_empty() {
        return Ok(Frame::empty(objects.len()));
    }
    Frame::with_row_count(columns, objects.len())
}

fn field_column(
    name: &str,
    cells: &[Option<&Json>],
    path: &ColumnPath,
    expand: bool,
    options: &IntrospectionOptions,
) -> FrameResult<Column> {
    let present: Vec<&Json> = cells.iter().flatten().copied().collect();
    let structured = |j: &Json| {
        j.is_object()
            || j.as_array()
                .is_some_and(|items| items.iter().any(Json::is_object))
    };
    if !expand && present.iter().any(|j| structured(j)) {
        log::trace!("keeping {path} as JSON");
        return Ok(json_column(name, cells));
    }

    if expand && !present.is_empty() && present.iter().all(|j| j.is_object()) {
        let objects: Vec<Option<&Map<String, Json>>> =
            cells.iter().map(|c| c.and_then(Json::as_object)).collect();
        return Ok(Column::group(name, objects_to_frame(&objects, path, options)?));
    }

    let is_record_list = |j: &Json| {
        j.as_array()
            .is_some_and(|items| items.iter().all(Json::is_object))
    };
    let has_records = present
        .iter()
        .any(|j| j.as_array().is_some_and(|items| !items.is_empty()));
    if expand && has_records && present.iter().all(|j| is_record_list(j)) {
        let frames = cells
            .iter()
            .map(|c| {
                c.and_then(Json::as_array)
                    .map(|items| {
                        let objects: Vec<_> = items.iter().map(Json::as_object).collect();
                        objects_to_frame(&objects, path, options)
                    })
                    .transpose()
            })
            .collect::<FrameResult<Vec<_>>>()?;
        return Ok(Column::frames(name, frames));
    }

    if present.iter().any(|j| j.is_object()) {
        return Ok(json_column(name, cells));
    }

    let integer_type = narrowest_integers(&present);
    let values = cells
        .iter()
        .map(|c| c.map_or(Value::Null, |j| json_to_value(j, integer_type)))
        .collect();
    Ok(Column::Value(ValueColumn::infer(name, values)))
}

fn json_column(name: &str, cells: &[Option<&Json>]) -> Column {
    let values = cells
        .iter()
        .map(|c| c.map_or(Value::Null, |j| Value::Json(Arc::new(j.clone()))))
        .collect();
    Column::Value(ValueColumn::infer(name, values))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Integers {
    Int,
    Long,
    Double,
}

/// Smallest type holding every number of a field.
fn narrowest_integers(values: &[&Json]) -> Integers {
    let mut narrowest = Integers::Int;
    for number in values.iter().filter_map(|j| j.as_number()) {
        match number.as_i64() {
            Some(v) if i32::try_from(v).is_ok() => {}
            Some(_) => narrowest = narrowest.max_with(Integers::Long),
            None => return Integers::Double,
        }
    }
    narrowest
}

impl Integers {
    fn max_with(self, other: Integers) -> Integers {
        match (self, other) {
            (Integers::Double, _) | (_, Integers::Double) => Integers::Double,
            (Integers::Long, _) | (_, Integers::Long) => Integers::Long,
            _ => Integers::Int,
        }
    }

    fn for_number(number: &Number) -> Integers {
        match number.as_i64() {
            Some(v) if i32::try_from(v).is_ok() => Integers::Int,
            Some(_) => Integers::Long,
            None => Integers::Double,
        }
    }
}

fn json_to_value(json: &Json, integers: Integers) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Boolean(*b),
        Json::Number(n) => match (integers, n.as_i64()) {
            (Integers::Int, Some(v)) => i32::try_from(v).map_or(Value::Long(v), Value::Int),
            (Integers::Long, Some(v)) => Value::Long(v),
            _ => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::string(s),
        Json::Array(items) => Value::list(items.iter().map(|item| match item {
            Json::Number(n) => json_to_value(item, Integers::for_number(n)),
            Json::Object(_) => Value::Json(Arc::new(item.clone())),
            other => json_to_value(other, Integers::Int),
        })),
        Json::Object(_) => Value::Json(Arc::new(json.clone())),
    }
}

/// Deserializes every row of `frame` into a `T`, matching columns to fields by name.
pub fn from_frame<T: DeserializeOwned>(frame: &Frame) -> FrameResult<Vec<T>> {
    frame
        .rows()
        .enumerate()
        .map(|(i, row)| {
            serde_json::from_value(row_to_json(&row))
                .map_err(|e| FrameError::Record(format!("row {i}: {e}")))
        })
        .collect()
}

fn row_to_json(row: &Row) -> Json {
    Json::Object(
        row.iter()
            .map(|(name, cell)| (name.to_string(), cell_to_json(cell)))
            .collect(),
    )
}

fn cell_to_json(cell: &Cell) -> Json {
    match cell {
        Cell::Value(value) => value_to_json(value),
        Cell::Row(row) => row_to_json(row),
        Cell::Frame(None) => Json::Null,
        Cell::Frame(Some(frame)) => Json::Array(frame.rows().map(|r| row_to_json(&r)).collect()),
    }
}

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::Int(v) => Json::from(*v),
        Value::Long(v) => Json::from(*v),
        Value::Double(v) => Number::from_f64(*v).map_or(Json::Null, Json::Number),
        Value::Decimal(d) => Number::from_f64(d.to_f64()).map_or(Json::Null, Json::Number),
        Value::List(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Json(json) => json.as_ref().clone(),
        other => Json::String(other.to_string()),
    }
}
