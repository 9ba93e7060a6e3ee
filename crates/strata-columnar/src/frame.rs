use crate::column::{Column, ColumnKind, FrameColumn, GroupColumn, ValueColumn};
use crate::error::{FrameError, FrameResult};
use crate::path::ColumnPath;
use crate::row::{Cell, Row};
use crate::schema::{ColumnSchema, FrameSchema};
use crate::types::{ElementType, ValueType};
use crate::value::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Immutable, ordered collection of equally sized columns.
///
/// Cloning a frame is cheap: the column list and every column payload are reference counted.
/// Every operation returns a new frame.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Frame {
    columns: Arc<[Column]>,
    row_count: usize,
}

impl Default for Frame {
    fn default() -> Self {
        Frame::empty(0)
    }
}

impl Frame {
    /// Frame without columns. Its row count is kept so that removing every column of a frame and
    /// inserting them back reproduces the original frame.
    pub fn empty(row_count: usize) -> Self {
        Self {
            columns: Arc::from(Vec::new()),
            row_count,
        }
    }

    /// Builds a frame from columns, validating that all of them have the same length and distinct
    /// names. The row count is taken from the first column.
    pub fn from_columns(columns: Vec<Column>) -> FrameResult<Self> {
        let row_count = columns.first().map_or(0, Column::len);
        Self::with_row_count(columns, row_count)
    }

    pub fn with_row_count(columns: Vec<Column>, row_count: usize) -> FrameResult<Self> {
        let mut names = HashSet::with_capacity(columns.len());
        for column in &columns {
            if column.len() != row_count {
                return Err(FrameError::RowCountMismatch {
                    column: column.name().to_string(),
                    expected: row_count,
                    actual: column.len(),
                });
            }
            if !names.insert(column.name()) {
                return Err(FrameError::DuplicateName {
                    name: column.name().to_string(),
                });
            }
        }
        Ok(Self {
            columns: Arc::from(columns),
            row_count,
        })
    }

    /// Builds a frame of value columns from row-major values.
    pub fn from_rows<S: AsRef<str>>(names: &[S], rows: Vec<Vec<Value>>) -> FrameResult<Self> {
        let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); names.len()];
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(FrameError::InvalidArgument(format!(
                    "row {i} has {} values, expected {}",
                    row.len(),
                    names.len()
                )));
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }
        let row_count = columns.first().map_or(0, Vec::len);
        let columns = names
            .iter()
            .zip(columns)
            .map(|(name, values)| Column::Value(ValueColumn::infer(name.as_ref(), values)))
            .collect();
        Self::with_row_count(columns, row_count)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns.to_vec()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn column_at(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Resolves a path through nested column groups.
    pub fn get(&self, path: &ColumnPath) -> Option<&Column> {
        let (last, parents) = path.names().split_last()?;
        let mut frame = self;
        for name in parents {
            frame = frame.column(name)?.as_group()?.frame();
        }
        frame.column(last)
    }

    pub fn try_get(&self, path: &ColumnPath) -> FrameResult<&Column> {
        self.get(path)
            .ok_or_else(|| FrameError::ColumnNotFound { path: path.clone() })
    }

    pub fn value_column(&self, path: &ColumnPath) -> FrameResult<&ValueColumn> {
        let column = self.try_get(path)?;
        column
            .as_value()
            .ok_or_else(|| FrameError::IncompatibleKind {
                path: path.clone(),
                expected: ColumnKind::Value,
                actual: column.kind(),
            })
    }

    /// All columns with their paths, parents before children.
    pub fn walk(&self) -> Vec<(ColumnPath, &Column)> {
        let mut out = Vec::new();
        walk_into(self, &ColumnPath::root(), &mut out);
        out
    }

    pub fn row(&self, index: usize) -> Option<Row> {
        (index < self.row_count).then(|| self.row_at(index))
    }

    /// # Panics
    /// If `index` is out of range.
    pub fn row_at(&self, index: usize) -> Row {
        Row::new(
            self.columns
                .iter()
                .map(|c| (c.name().to_string(), c.cell(index)))
                .collect(),
        )
    }

    pub fn rows(&self) -> impl Iterator<Item = Row> + '_ {
        (0..self.row_count).map(|i| self.row_at(i))
    }

    /// Values of a single row addressed by path, used for grouping keys.
    pub fn cell(&self, path: &ColumnPath, row: usize) -> Option<Cell> {
        let column = self.get(path)?;
        (row < column.len()).then(|| column.cell(row))
    }

    pub fn take(&self, indices: &[usize]) -> Frame {
        Frame {
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
            row_count: indices.len(),
        }
    }

    pub fn take_opt(&self, indices: &[Option<usize>]) -> Frame {
        Frame {
            columns: self.columns.iter().map(|c| c.take_opt(indices)).collect(),
            row_count: indices.len(),
        }
    }

    /// Replaces the column list, keeping the row count.
    pub fn with_columns(&self, columns: Vec<Column>) -> FrameResult<Frame> {
        if columns.is_empty() {
            return Ok(Frame::empty(self.row_count));
        }
        Frame::with_row_count(columns, self.row_count)
    }

    /// Appends a column at the end.
    pub fn with_column(&self, column: Column) -> FrameResult<Frame> {
        let mut columns = self.columns.to_vec();
        columns.push(column);
        Frame::with_row_count(columns, self.row_count)
    }

    pub fn schema(&self) -> FrameSchema {
        FrameSchema::new(
            self.columns
                .iter()
                .map(|c| (c.name().to_string(), c.schema()))
                .collect(),
        )
    }

    /// Stacks frames vertically. The result has the union of all column names in first-seen
    /// order; a column absent from some frame is filled with nulls for that frame's rows.
    pub fn concat<'a>(frames: impl IntoIterator<Item = &'a Frame>) -> FrameResult<Frame> {
        let parts: Vec<(Option<&Frame>, usize)> = frames
            .into_iter()
            .map(|f| (Some(f), f.row_count))
            .collect();
        concat_parts(&parts)
    }
}

fn walk_into<'a>(frame: &'a Frame, parent: &ColumnPath, out: &mut Vec<(ColumnPath, &'a Column)>) {
    for column in frame.columns() {
        let path = parent.child(column.name());
        out.push((path.clone(), column));
        if let Column::Group(group) = column {
            walk_into(group.frame(), &path, out);
        }
    }
}

fn is_null_values(column: &Column) -> bool {
    matches!(column, Column::Value(c) if c.all_null())
}

/// Vertical concatenation where a `None` part contributes only null rows.
fn concat_parts(parts: &[(Option<&Frame>, usize)]) -> FrameResult<Frame> {
    let total = parts.iter().map(|(_, n)| n).sum();
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for frame in parts.iter().filter_map(|(f, _)| *f) {
        for column in frame.columns() {
            if seen.insert(column.name()) {
                names.push(column.name());
            }
        }
    }
    let columns = names
        .iter()
        .map(|name| {
            let column_parts: Vec<(Option<&Column>, usize)> = parts
                .iter()
                .map(|(f, n)| (f.and_then(|f| f.column(name)), *n))
                .collect();
            concat_column(name, &column_parts)
        })
        .collect::<FrameResult<Vec<_>>>()?;
    if columns.is_empty() {
        return Ok(Frame::empty(total));
    }
    Frame::with_row_count(columns, total)
}

fn concat_column(name: &str, parts: &[(Option<&Column>, usize)]) -> FrameResult<Column> {
    let mut kind: Option<ColumnKind> = None;
    for column in parts.iter().filter_map(|(c, _)| *c) {
        if is_null_values(column) {
            continue;
        }
        match kind {
            None => kind = Some(column.kind()),
            Some(k) if k != column.kind() => {
                return Err(FrameError::IncompatibleKind {
                    path: ColumnPath::single(name),
                    expected: k,
                    actual: column.kind(),
                })
            }
            Some(_) => {}
        }
    }

    match kind.unwrap_or(ColumnKind::Value) {
        ColumnKind::Value => {
            let mut values = Vec::new();
            let mut value_type: Option<ValueType> = None;
            let mut nullable = false;
            for (column, n) in parts {
                match column.and_then(Column::as_value) {
                    Some(c) => {
                        values.extend(c.values().iter().cloned());
                        nullable |= c.element_type().nullable;
                        if !c.all_null() || c.element_type().value_type != ValueType::Any {
                            let t = c.element_type().value_type;
                            value_type = Some(value_type.map_or(t, |v| v.common(t)));
                        }
                    }
                    None => {
                        values.extend(std::iter::repeat(Value::Null).take(*n));
                        nullable |= *n > 0;
                    }
                }
            }
            let element_type = ElementType::new(value_type.unwrap_or(ValueType::Any), nullable);
            Ok(Column::Value(ValueColumn::new(name, element_type, values)))
        }
        ColumnKind::Group => {
            let nested: Vec<(Option<&Frame>, usize)> = parts
                .iter()
                .map(|(c, n)| (c.and_then(Column::as_group).map(GroupColumn::frame), *n))
                .collect();
            Ok(Column::group(name, concat_parts(&nested)?))
        }
        ColumnKind::Frame => {
            let mut frames = Vec::new();
            for (column, n) in parts {
                match column.and_then(Column::as_frame) {
                    Some(c) => frames.extend(c.frames().iter().cloned()),
                    None => frames.extend(std::iter::repeat(None).take(*n)),
                }
            }
            Ok(Column::Frame(FrameColumn::new(name, frames)))
        }
    }
}

/// Builds a column of `row_count` empty cells matching `schema`: nulls for value columns, null
/// frames for frame columns, and groups of such columns. Without rows the column has exactly
/// the given schema.
pub fn null_column(name: &str, schema: &ColumnSchema, row_count: usize) -> Column {
    match schema {
        ColumnSchema::Value(element_type) => Column::Value(ValueColumn::new(
            name,
            element_type.with_nullable(element_type.nullable || row_count > 0),
            vec![Value::Null; row_count],
        )),
        ColumnSchema::Group(nested) => {
            let columns: Vec<Column> = nested
                .iter()
                .map(|(n, s)| null_column(n, s, row_count))
                .collect();
            let frame = if columns.is_empty() {
                Frame::empty(row_count)
            } else {
                Frame {
                    columns: Arc::from(columns),
                    row_count,
                }
            };
            Column::group(name, frame)
        }
        ColumnSchema::Frame { .. } => Column::frames(name, vec![None; row_count]),
    }
}
