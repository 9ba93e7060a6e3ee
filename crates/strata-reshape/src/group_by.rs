use crate::names::NameGenerator;
use crate::pivot::{Pivot, PivotColumns};
use crate::tree::{insert, ColumnToInsert};
use std::collections::HashMap;
use strata_columnar::{
    Cell, Column, ColumnPath, ColumnSelector, Frame, FrameColumn, FrameResult, Unresolved,
    Value, ValueColumn,
};

/// Name of the frame column holding the rows of each group.
pub const GROUPS_COLUMN: &str = "group";

/// Name given to unnamed aggregation results.
pub const VALUE_COLUMN: &str = "value";

/// Result of [`group_by`]: one key row per distinct key combination plus the matching rows.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupedFrame {
    keys: Frame,
    groups: Vec<Frame>,
}

/// Row indices per distinct key, in order of first appearance.
pub(crate) struct Partition {
    pub first_rows: Vec<usize>,
    pub rows: Vec<Vec<usize>>,
}

pub(crate) fn partition(frame: &Frame, paths: &[ColumnPath]) -> FrameResult<Partition> {
    let columns = paths
        .iter()
        .map(|p| frame.try_get(p))
        .collect::<FrameResult<Vec<_>>>()?;
    let mut index: HashMap<Vec<Cell>, usize> = HashMap::new();
    let mut first_rows = Vec::new();
    let mut rows: Vec<Vec<usize>> = Vec::new();
    for row in 0..frame.row_count() {
        let key: Vec<Cell> = columns.iter().map(|c| c.cell(row)).collect();
        let group = *index.entry(key).or_insert_with(|| {
            first_rows.push(row);
            rows.push(Vec::new());
            rows.len() - 1
        });
        rows[group].push(row);
    }
    Ok(Partition { first_rows, rows })
}

/// Frame made of the given columns, taken at `rows`, each inserted at its path.
pub(crate) fn key_frame(frame: &Frame, paths: &[ColumnPath], rows: &[usize]) -> FrameResult<Frame> {
    if paths.is_empty() {
        return Ok(Frame::empty(rows.len()));
    }
    let columns = paths
        .iter()
        .map(|p| Ok(ColumnToInsert::new(p.clone(), frame.try_get(p)?.take(rows))))
        .collect::<FrameResult<Vec<_>>>()?;
    insert(None, None, columns)
}

/// Partitions rows by the values of the key columns. Keys keep the order in which they first
/// appear, and every group keeps the original relative order of its rows.
pub fn group_by(frame: &Frame, keys: impl Into<ColumnSelector>) -> FrameResult<GroupedFrame> {
    let paths = keys.into().resolve(frame, Unresolved::Fail)?;
    let partition = partition(frame, &paths)?;
    let keys = key_frame(frame, &paths, &partition.first_rows)?;
    let groups = partition.rows.iter().map(|rows| frame.take(rows)).collect();
    log::debug!(
        "grouped {} rows into {} groups",
        frame.row_count(),
        partition.rows.len()
    );
    Ok(GroupedFrame { keys, groups })
}

/// Collects the values produced by an aggregation body for one group.
#[derive(Clone, Debug, Default)]
pub struct Yielder {
    yields: Vec<(Option<ColumnPath>, Value)>,
}

impl Yielder {
    pub fn yield_into(&mut self, path: impl Into<ColumnPath>, value: impl Into<Value>) {
        self.yields.push((Some(path.into()), value.into()));
    }

    pub fn yield_value(&mut self, value: impl Into<Value>) {
        self.yields.push((None, value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.yields.is_empty()
    }

    pub(crate) fn into_yields(self) -> Vec<(Option<ColumnPath>, Value)> {
        self.yields
    }
}

/// Value columns assembled from yields: one column per distinct path, in order of first
/// appearance, holding the default value where a row did not yield that path.
pub(crate) struct YieldTable {
    row_count: usize,
    default: Value,
    index: HashMap<ColumnPath, usize>,
    paths: Vec<ColumnPath>,
    cells: Vec<Vec<Value>>,
}

impl YieldTable {
    pub fn new(row_count: usize, default: Value) -> Self {
        Self {
            row_count,
            default,
            index: HashMap::new(),
            paths: Vec::new(),
            cells: Vec::new(),
        }
    }

    pub fn set(&mut self, row: usize, path: ColumnPath, value: Value) {
        let column = match self.index.get(&path) {
            Some(&column) => column,
            None => {
                self.cells.push(vec![self.default.clone(); self.row_count]);
                self.paths.push(path.clone());
                self.index.insert(path, self.paths.len() - 1);
                self.paths.len() - 1
            }
        };
        self.cells[column][row] = value;
    }

    pub fn into_columns(self) -> Vec<ColumnToInsert> {
        self.paths
            .into_iter()
            .zip(self.cells)
            .map(|(path, values)| {
                let name = path.name().unwrap_or(VALUE_COLUMN).to_string();
                ColumnToInsert::new(path, Column::Value(ValueColumn::infer(name, values)))
            })
            .collect()
    }
}

impl GroupedFrame {
    pub fn keys(&self) -> &Frame {
        &self.keys
    }

    pub fn groups(&self) -> &[Frame] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Key frame with the groups appended as a frame column named [`GROUPS_COLUMN`] (made unique
    /// against the key names).
    pub fn into_frame(self) -> FrameResult<Frame> {
        let mut names = NameGenerator::new(self.keys.column_names());
        let name = names.add_unique(GROUPS_COLUMN);
        let groups = FrameColumn::new(name, self.groups.into_iter().map(Some).collect());
        self.keys.with_column(Column::Frame(groups))
    }

    /// All group rows stacked back into one frame, group by group.
    pub fn concat(&self) -> FrameResult<Frame> {
        Frame::concat(&self.groups)
    }

    /// Key frame plus an `Int` column with the size of every group.
    pub fn count(&self, name: &str) -> FrameResult<Frame> {
        let counts = self
            .groups
            .iter()
            .map(|g| Value::Int(i32::try_from(g.row_count()).unwrap_or(i32::MAX)))
            .collect();
        self.keys
            .with_column(Column::Value(ValueColumn::infer(name, counts)))
    }

    /// Runs `body` once per group and adds one column per yielded path to the key frame.
    /// Unnamed results go to a column named [`VALUE_COLUMN`].
    pub fn aggregate(
        &self,
        mut body: impl FnMut(&Frame, &mut Yielder) -> FrameResult<()>,
    ) -> FrameResult<Frame> {
        let mut table = YieldTable::new(self.groups.len(), Value::Null);
        for (row, group) in self.groups.iter().enumerate() {
            let mut yielder = Yielder::default();
            body(group, &mut yielder)?;
            for (path, value) in yielder.into_yields() {
                let path = path.unwrap_or_else(|| ColumnPath::single(VALUE_COLUMN));
                table.set(row, path, value);
            }
        }
        insert(Some(&self.keys), None, table.into_columns())
    }

    /// Pivot inside every group. Pivoted columns are nested under the pivot column names unless
    /// [`Pivot::inward`] says otherwise.
    pub fn pivot(&self, columns: impl Into<PivotColumns>) -> Pivot {
        Pivot::grouped(self.clone(), columns.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unnamed_yields_land_in_value() {
        let frame = Frame::from_rows(
            &["k", "v"],
            vec![
                vec!["a".into(), 1.into()],
                vec!["b".into(), 2.into()],
                vec!["a".into(), 3.into()],
            ],
        )
        .unwrap();
        let grouped = group_by(&frame, "k").unwrap();
        let sums = grouped
            .aggregate(|g, y| {
                let total: i64 = g
                    .value_column(&"v".into())?
                    .values()
                    .iter()
                    .filter_map(Value::as_i64)
                    .sum();
                y.yield_value(total);
                Ok(())
            })
            .unwrap();
        assert_eq!(sums.column_names(), vec!["k", VALUE_COLUMN]);
        assert_eq!(
            sums.column(VALUE_COLUMN).and_then(Column::as_value).unwrap().values(),
            &[Value::Long(4), Value::Long(2)]
        );
    }
}
