use crate::error::{FrameError, FrameResult};
use crate::frame::Frame;
use crate::path::ColumnPath;
use crate::row::Cell;
use crate::schema::ColumnSchema;
use crate::types::{ElementType, ValueType};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Value,
    Group,
    Frame,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColumnKind::Value => "value",
            ColumnKind::Group => "group",
            ColumnKind::Frame => "frame",
        })
    }
}

/// Infers the element type of a list of values: the common type of all non-null values, nullable
/// iff a null is present. A column without any non-null value is typed `Any`.
pub fn infer_element_type(values: &[Value]) -> ElementType {
    let mut value_type: Option<ValueType> = None;
    let mut nullable = false;
    for value in values {
        match value.value_type() {
            None => nullable = true,
            Some(t) => {
                value_type = Some(match value_type {
                    None => t,
                    Some(current) => current.common(t),
                });
            }
        }
    }
    ElementType::new(value_type.unwrap_or(ValueType::Any), nullable)
}

/// Column of scalar values.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValueColumn {
    name: String,
    element_type: ElementType,
    values: Arc<[Value]>,
}

impl ValueColumn {
    /// Builds a column with a declared element type. The values are trusted to conform to it; use
    /// [`ValueColumn::typed`] to validate them.
    pub fn new(name: impl Into<String>, element_type: ElementType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            element_type,
            values: Arc::from(values),
        }
    }

    pub fn infer(name: impl Into<String>, values: Vec<Value>) -> Self {
        let element_type = infer_element_type(&values);
        Self::new(name, element_type, values)
    }

    pub fn typed(
        name: impl Into<String>,
        element_type: ElementType,
        values: Vec<Value>,
    ) -> FrameResult<Self> {
        let name = name.into();
        for value in &values {
            match value.value_type() {
                None if !element_type.nullable => {
                    return Err(FrameError::NullsNotAllowed {
                        path: ColumnPath::single(name),
                        to: element_type.value_type,
                    });
                }
                Some(t) if !element_type.value_type.accepts(t) => {
                    return Err(FrameError::InvalidArgument(format!(
                        "value {value} of type {t} does not fit column {name} of type {element_type}"
                    )));
                }
                _ => {}
            }
        }
        Ok(Self::new(name, element_type, values))
    }

    pub fn nulls(name: impl Into<String>, value_type: ValueType, len: usize) -> Self {
        Self::new(
            name,
            ElementType::nullable(value_type),
            vec![Value::Null; len],
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn has_nulls(&self) -> bool {
        self.values.iter().any(Value::is_null)
    }

    pub fn all_null(&self) -> bool {
        self.values.iter().all(Value::is_null)
    }

    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            element_type: self.element_type,
            values: Arc::clone(&self.values),
        }
    }

    pub fn with_element_type(&self, element_type: ElementType) -> Self {
        Self {
            name: self.name.clone(),
            element_type,
            values: Arc::clone(&self.values),
        }
    }

    pub fn take(&self, indices: &[usize]) -> Self {
        let values = indices.iter().map(|&i| self.values[i].clone()).collect();
        Self::new(self.name.clone(), self.element_type, values)
    }

    /// Like [`ValueColumn::take`], `None` producing a null row.
    pub fn take_opt(&self, indices: &[Option<usize>]) -> Self {
        let values: Vec<Value> = indices
            .iter()
            .map(|i| i.map_or(Value::Null, |i| self.values[i].clone()))
            .collect();
        let nullable = self.element_type.nullable || indices.iter().any(Option::is_none);
        Self::new(
            self.name.clone(),
            self.element_type.with_nullable(nullable),
            values,
        )
    }
}

/// Named group of columns sharing the row count of the enclosing frame.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GroupColumn {
    name: String,
    frame: Frame,
}

impl GroupColumn {
    pub fn new(name: impl Into<String>, frame: Frame) -> Self {
        Self {
            name: name.into(),
            frame,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn into_frame(self) -> Frame {
        self.frame
    }

    pub fn len(&self) -> usize {
        self.frame.row_count()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.row_count() == 0
    }
}

/// Column holding one independent nested frame per row. Rows may be null.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrameColumn {
    name: String,
    frames: Arc<[Option<Frame>]>,
}

impl FrameColumn {
    pub fn new(name: impl Into<String>, frames: Vec<Option<Frame>>) -> Self {
        Self {
            name: name.into(),
            frames: Arc::from(frames),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frames(&self) -> &[Option<Frame>] {
        &self.frames
    }

    pub fn get(&self, row: usize) -> Option<&Frame> {
        self.frames.get(row).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn has_nulls(&self) -> bool {
        self.frames.iter().any(Option::is_none)
    }
}

/// A named column of a [`Frame`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Column {
    Value(ValueColumn),
    Group(GroupColumn),
    Frame(FrameColumn),
}

impl Column {
    /// Value column with an inferred element type.
    pub fn values<V: Into<Value>>(name: impl Into<String>, values: Vec<V>) -> Self {
        Column::Value(ValueColumn::infer(
            name,
            values.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn group(name: impl Into<String>, frame: Frame) -> Self {
        Column::Group(GroupColumn::new(name, frame))
    }

    pub fn frames(name: impl Into<String>, frames: Vec<Option<Frame>>) -> Self {
        Column::Frame(FrameColumn::new(name, frames))
    }

    pub fn name(&self) -> &str {
        match self {
            Column::Value(c) => c.name(),
            Column::Group(c) => c.name(),
            Column::Frame(c) => c.name(),
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Value(_) => ColumnKind::Value,
            Column::Group(_) => ColumnKind::Group,
            Column::Frame(_) => ColumnKind::Frame,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Value(c) => c.len(),
            Column::Group(c) => c.len(),
            Column::Frame(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_value(&self) -> Option<&ValueColumn> {
        match self {
            Column::Value(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupColumn> {
        match self {
            Column::Group(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_frame(&self) -> Option<&FrameColumn> {
        match self {
            Column::Frame(c) => Some(c),
            _ => None,
        }
    }

    pub fn renamed(&self, name: impl Into<String>) -> Column {
        match self {
            Column::Value(c) => Column::Value(c.renamed(name)),
            Column::Group(c) => Column::Group(GroupColumn::new(name, c.frame.clone())),
            Column::Frame(c) => Column::Frame(FrameColumn {
                name: name.into(),
                frames: Arc::clone(&c.frames),
            }),
        }
    }

    /// Null cells: nulls in value columns, null frames in frame columns. A group row is never
    /// null itself.
    pub fn has_nulls(&self) -> bool {
        match self {
            Column::Value(c) => c.has_nulls(),
            Column::Group(_) => false,
            Column::Frame(c) => c.has_nulls(),
        }
    }

    pub fn cell(&self, row: usize) -> Cell {
        match self {
            Column::Value(c) => Cell::Value(c.values[row].clone()),
            Column::Group(c) => Cell::Row(c.frame.row_at(row)),
            Column::Frame(c) => Cell::Frame(c.frames[row].clone()),
        }
    }

    pub fn take(&self, indices: &[usize]) -> Column {
        match self {
            Column::Value(c) => Column::Value(c.take(indices)),
            Column::Group(c) => Column::group(c.name.clone(), c.frame.take(indices)),
            Column::Frame(c) => Column::frames(
                c.name.clone(),
                indices.iter().map(|&i| c.frames[i].clone()).collect(),
            ),
        }
    }

    pub fn take_opt(&self, indices: &[Option<usize>]) -> Column {
        match self {
            Column::Value(c) => Column::Value(c.take_opt(indices)),
            Column::Group(c) => Column::group(c.name.clone(), c.frame.take_opt(indices)),
            Column::Frame(c) => Column::frames(
                c.name.clone(),
                indices
                    .iter()
                    .map(|i| i.and_then(|i| c.frames[i].clone()))
                    .collect(),
            ),
        }
    }

    pub fn schema(&self) -> ColumnSchema {
        match self {
            Column::Value(c) => ColumnSchema::Value(c.element_type),
            Column::Group(c) => ColumnSchema::Group(c.frame.schema()),
            Column::Frame(c) => ColumnSchema::Frame {
                schema: crate::schema::union_of_frames(c.frames.iter().flatten()),
                nullable: c.has_nulls(),
            },
        }
    }
}

impl From<ValueColumn> for Column {
    fn from(c: ValueColumn) -> Self {
        Column::Value(c)
    }
}

impl From<GroupColumn> for Column {
    fn from(c: GroupColumn) -> Self {
        Column::Group(c)
    }
}

impl From<FrameColumn> for Column {
    fn from(c: FrameColumn) -> Self {
        Column::Frame(c)
    }
}
