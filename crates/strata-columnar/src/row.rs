use crate::frame::Frame;
use crate::path::ColumnPath;
use crate::value::Value;

/// One row of one column: a scalar, the nested row of a column group, or the nested frame of a
/// frame column.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Value(Value),
    Row(Row),
    Frame(Option<Frame>),
}

impl Cell {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Cell::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_row(&self) -> Option<&Row> {
        match self {
            Cell::Row(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_frame(&self) -> Option<&Frame> {
        match self {
            Cell::Frame(f) => f.as_ref(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Cell::Value(v) => v.is_null(),
            Cell::Row(r) => r.cells().all(Cell::is_null),
            Cell::Frame(f) => f.is_none(),
        }
    }
}

impl From<Value> for Cell {
    fn from(v: Value) -> Self {
        Cell::Value(v)
    }
}

/// Owned snapshot of one frame row, keyed by column name in frame order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Row {
    fields: Vec<(String, Cell)>,
}

impl Row {
    pub fn new(fields: Vec<(String, Cell)>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.fields.iter().map(|(_, cell)| cell)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.fields.iter().map(|(name, cell)| (name.as_str(), cell))
    }

    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, cell)| cell)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(Cell::as_value)
    }

    pub fn get_path(&self, path: &ColumnPath) -> Option<&Cell> {
        let (last, parents) = path.names().split_last()?;
        let mut row = self;
        for name in parents {
            row = row.get(name)?.as_row()?;
        }
        row.get(last)
    }

    pub fn into_fields(self) -> Vec<(String, Cell)> {
        self.fields
    }
}
