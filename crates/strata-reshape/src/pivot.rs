//! Pivot: turns the distinct values of one or more columns into columns.
//!
//! Pivot columns are organized in chains. Columns in one chain ([`PivotColumns::then`]) nest
//! into each other: pivoting `a then b` yields paths `a-value / b / b-value`. Independent chains
//! ([`PivotColumns::and`]) produce separate sets of columns side by side.
//!
//! For every key group and every combination of pivot values, an aggregation body runs on the
//! matching rows. One unnamed result is placed at the combination's path; several results nest
//! one level deeper (or, with [`Pivot::separate`], go first and the pivot path nests under
//! them); a combination without rows, or a body yielding nothing, gets the default value.

use crate::group_by::{key_frame, partition, GroupedFrame, YieldTable, Yielder, VALUE_COLUMN};
use crate::tree::insert;
use std::collections::HashMap;
use strata_columnar::{
    ColumnKind, ColumnPath, ColumnSelector, Frame, FrameError, FrameResult, Unresolved,
    Value,
};

/// One pivot column inside a chain.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PivotChainElement {
    pub column: ColumnPath,
    /// Whether the column's own name is a segment of the generated paths, before its values.
    pub include_name_in_path: bool,
}

/// Pivot columns organized in chains.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PivotColumns {
    chains: Vec<Vec<ColumnPath>>,
}

impl PivotColumns {
    pub fn new(column: impl Into<ColumnPath>) -> Self {
        Self {
            chains: vec![vec![column.into()]],
        }
    }

    /// Nests `column` under the last pivot column.
    pub fn then(mut self, column: impl Into<ColumnPath>) -> Self {
        if let Some(chain) = self.chains.last_mut() {
            chain.push(column.into());
        }
        self
    }

    /// Starts an independent chain.
    pub fn and(mut self, column: impl Into<ColumnPath>) -> Self {
        self.chains.push(vec![column.into()]);
        self
    }

    pub fn column_count(&self) -> usize {
        self.chains.iter().map(Vec::len).sum()
    }

    /// Chain elements. The first column of a chain shows its name only when pivoting inward,
    /// subsequent columns always do.
    pub fn elements(&self, inward: bool) -> Vec<Vec<PivotChainElement>> {
        self.chains
            .iter()
            .map(|chain| {
                chain
                    .iter()
                    .enumerate()
                    .map(|(i, column)| PivotChainElement {
                        column: column.clone(),
                        include_name_in_path: inward || i > 0,
                    })
                    .collect()
            })
            .collect()
    }
}

impl From<&str> for PivotColumns {
    fn from(name: &str) -> Self {
        PivotColumns::new(name)
    }
}

impl From<ColumnPath> for PivotColumns {
    fn from(path: ColumnPath) -> Self {
        PivotColumns::new(path)
    }
}

enum Keys {
    None,
    Selector(ColumnSelector),
    Grouped(GroupedFrame),
}

/// Pivot builder returned by [`pivot`] and [`GroupedFrame::pivot`].
pub struct Pivot {
    frame: Frame,
    columns: PivotColumns,
    keys: Keys,
    inward: Option<bool>,
    default: Option<Value>,
    separate: bool,
}

/// Starts a pivot over `frame`. Without [`Pivot::group_by`] the result has a single row.
pub fn pivot(frame: &Frame, columns: impl Into<PivotColumns>) -> Pivot {
    Pivot {
        frame: frame.clone(),
        columns: columns.into(),
        keys: Keys::None,
        inward: None,
        default: None,
        separate: false,
    }
}

impl Pivot {
    pub(crate) fn grouped(grouped: GroupedFrame, columns: PivotColumns) -> Pivot {
        Pivot {
            frame: Frame::empty(0),
            columns,
            keys: Keys::Grouped(grouped),
            inward: None,
            default: None,
            separate: false,
        }
    }

    pub fn group_by(mut self, keys: impl Into<ColumnSelector>) -> Self {
        self.keys = Keys::Selector(keys.into());
        self
    }

    /// Whether the first pivot column's name prefixes every generated path. Defaults to `true`
    /// when pivoting on several columns or inside an existing grouping.
    pub fn inward(mut self, inward: bool) -> Self {
        self.inward = Some(inward);
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Places named results first, with the pivot path nested under each result name.
    pub fn separate(mut self, separate: bool) -> Self {
        self.separate = separate;
        self
    }

    fn resolved_inward(&self) -> bool {
        let grouped = matches!(self.keys, Keys::Grouped(_));
        self.inward
            .unwrap_or(self.columns.column_count() > 1 || grouped)
    }

    /// Number of rows per combination; `0` where a combination is absent.
    pub fn count(mut self) -> FrameResult<Frame> {
        self.default.get_or_insert(Value::Int(0));
        self.aggregate(|rows, y| {
            y.yield_value(Value::Int(i32::try_from(rows.row_count()).unwrap_or(i32::MAX)));
            Ok(())
        })
    }

    /// `true` for every combination present in a key group, `false` otherwise.
    pub fn matches(mut self) -> FrameResult<Frame> {
        self.default.get_or_insert(Value::Boolean(false));
        self.aggregate(|_, y| {
            y.yield_value(true);
            Ok(())
        })
    }

    /// Evaluates `expr` for every matching row. A single matching row gives its value, several
    /// give the list of their values.
    pub fn with(
        self,
        mut expr: impl FnMut(&Frame, usize) -> FrameResult<Value>,
    ) -> FrameResult<Frame> {
        self.aggregate(|rows, y| {
            let values = (0..rows.row_count())
                .map(|row| expr(rows, row))
                .collect::<FrameResult<Vec<_>>>()?;
            y.yield_value(collapse(values));
            Ok(())
        })
    }

    /// Values of the selected value columns. One column gives unnamed results, several give one
    /// nested result per column.
    pub fn values(self, columns: impl Into<ColumnSelector>) -> FrameResult<Frame> {
        let selector = columns.into();
        self.aggregate(move |rows, y| {
            let paths = selector.resolve(rows, Unresolved::Fail)?;
            let single = paths.len() == 1;
            for path in paths {
                let column = rows.value_column(&path)?;
                let value = collapse(column.values().to_vec());
                if single {
                    y.yield_value(value);
                } else {
                    y.yield_into(ColumnPath::single(path.name().unwrap_or(VALUE_COLUMN)), value);
                }
            }
            Ok(())
        })
    }

    /// Runs `body` for every key group and pivot combination with at least one row.
    pub fn aggregate(
        self,
        mut body: impl FnMut(&Frame, &mut Yielder) -> FrameResult<()>,
    ) -> FrameResult<Frame> {
        let inward = self.resolved_inward();
        let default = self.default.clone().unwrap_or(Value::Null);
        let (keys, groups) = match self.keys {
            Keys::None => (Frame::empty(1), vec![self.frame.clone()]),
            Keys::Selector(selector) => {
                let paths = selector.resolve(&self.frame, Unresolved::Fail)?;
                let partition = partition(&self.frame, &paths)?;
                let keys = key_frame(&self.frame, &paths, &partition.first_rows)?;
                let groups = partition
                    .rows
                    .iter()
                    .map(|rows| self.frame.take(rows))
                    .collect();
                (keys, groups)
            }
            Keys::Grouped(grouped) => (grouped.keys().clone(), grouped.groups().to_vec()),
        };

        let mut table = YieldTable::new(groups.len(), default.clone());
        for chain in self.columns.elements(inward) {
            let combos = Combinations::collect(&groups, &chain)?;
            let by_group = groups
                .iter()
                .map(|group| combos.partition(group, &chain))
                .collect::<FrameResult<Vec<_>>>()?;
            for (combo_index, combo_path) in combos.paths.iter().enumerate() {
                let mut produced = false;
                for (group_index, group) in groups.iter().enumerate() {
                    let matching = &by_group[group_index][combo_index];
                    if matching.is_empty() {
                        continue;
                    }
                    let mut yielder = Yielder::default();
                    body(&group.take(matching), &mut yielder)?;
                    for (path, value) in place_yields(combo_path, yielder.into_yields(), self.separate)
                    {
                        table.set(group_index, path, value);
                        produced = true;
                    }
                }
                if !produced {
                    for group_index in 0..groups.len() {
                        table.set(group_index, combo_path.clone(), default.clone());
                    }
                }
            }
        }

        let frame = insert(Some(&keys), None, table.into_columns())?;
        log::debug!(
            "pivot produced {} rows and {} columns",
            frame.row_count(),
            frame.column_count()
        );
        Ok(frame)
    }
}

fn collapse(mut values: Vec<Value>) -> Value {
    if values.len() == 1 {
        values.pop().unwrap_or(Value::Null)
    } else {
        Value::list(values)
    }
}

fn place_yields(
    combo: &ColumnPath,
    yields: Vec<(Option<ColumnPath>, Value)>,
    separate: bool,
) -> Vec<(ColumnPath, Value)> {
    match yields.len() {
        1 if yields[0].0.is_none() => {
            let value = yields.into_iter().next().map_or(Value::Null, |(_, v)| v);
            vec![(combo.clone(), value)]
        }
        _ => yields
            .into_iter()
            .map(|(name, value)| {
                let name = name.unwrap_or_else(|| ColumnPath::single(VALUE_COLUMN));
                let path = if separate {
                    name.concat(combo)
                } else {
                    combo.concat(&name)
                };
                (path, value)
            })
            .collect(),
    }
}

/// Distinct value combinations of one pivot chain, in order of first appearance.
struct Combinations {
    keys: HashMap<Vec<Value>, usize>,
    paths: Vec<ColumnPath>,
}

impl Combinations {
    fn collect(groups: &[Frame], chain: &[PivotChainElement]) -> FrameResult<Self> {
        let mut combos = Combinations {
            keys: HashMap::new(),
            paths: Vec::new(),
        };
        for group in groups {
            let columns = chain_columns(group, chain)?;
            for row in 0..group.row_count() {
                let key: Vec<Value> = columns.iter().map(|c| c[row].clone()).collect();
                if combos.keys.contains_key(&key) {
                    continue;
                }
                combos.paths.push(combo_path(chain, &key));
                combos.keys.insert(key, combos.paths.len() - 1);
            }
        }
        Ok(combos)
    }

    /// Row indices of `group` per combination.
    fn partition(&self, group: &Frame, chain: &[PivotChainElement]) -> FrameResult<Vec<Vec<usize>>> {
        let columns = chain_columns(group, chain)?;
        let mut out = vec![Vec::new(); self.paths.len()];
        for row in 0..group.row_count() {
            let key: Vec<Value> = columns.iter().map(|c| c[row].clone()).collect();
            if let Some(&combo) = self.keys.get(&key) {
                out[combo].push(row);
            }
        }
        Ok(out)
    }
}

fn chain_columns<'a>(
    frame: &'a Frame,
    chain: &[PivotChainElement],
) -> FrameResult<Vec<&'a [Value]>> {
    chain
        .iter()
        .map(|element| {
            let column = frame.try_get(&element.column)?;
            column
                .as_value()
                .map(|c| c.values())
                .ok_or_else(|| FrameError::IncompatibleKind {
                    path: element.column.clone(),
                    expected: ColumnKind::Value,
                    actual: column.kind(),
                })
        })
        .collect()
}

fn combo_path(chain: &[PivotChainElement], values: &[Value]) -> ColumnPath {
    let mut names = Vec::with_capacity(chain.len() * 2);
    for (element, value) in chain.iter().zip(values) {
        if element.include_name_in_path {
            names.push(element.column.name().unwrap_or_default().to_string());
        }
        names.push(value.to_string());
    }
    ColumnPath::new(names)
}
