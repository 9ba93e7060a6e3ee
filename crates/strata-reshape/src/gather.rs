use crate::tree::remove;
use strata_columnar::{
    Column, ColumnKind, ColumnPath, ColumnSelector, Frame, FrameError, FrameResult, Value,
    ValueColumn,
};

type ValuePredicate = Box<dyn Fn(&Value) -> bool>;
type KeyMapper = Box<dyn Fn(&str) -> Value>;
type ValueMapper = Box<dyn Fn(&Value) -> Value>;

/// Gather builder returned by [`gather`].
pub struct Gather {
    frame: Frame,
    selector: ColumnSelector,
    filter: Option<ValuePredicate>,
    map_keys: Option<KeyMapper>,
    map_values: Option<ValueMapper>,
    explode: bool,
}

/// Starts folding the selected columns into key/value pairs, one output row per pair.
pub fn gather(frame: &Frame, columns: impl Into<ColumnSelector>) -> Gather {
    Gather {
        frame: frame.clone(),
        selector: columns.into(),
        filter: None,
        map_keys: None,
        map_values: None,
        explode: false,
    }
}

enum Gathered {
    Values(Vec<(String, ValueColumn)>),
    Groups(Vec<(String, Frame)>),
}

impl Gather {
    /// Keeps only pairs whose value satisfies `predicate`. Applied before [`Gather::map_values`].
    pub fn where_value(mut self, predicate: impl Fn(&Value) -> bool + 'static) -> Self {
        self.filter = Some(Box::new(predicate));
        self
    }

    pub fn not_null(self) -> Self {
        self.where_value(|v| !v.is_null())
    }

    pub fn map_keys(mut self, f: impl Fn(&str) -> Value + 'static) -> Self {
        self.map_keys = Some(Box::new(f));
        self
    }

    pub fn map_values(mut self, f: impl Fn(&Value) -> Value + 'static) -> Self {
        self.map_values = Some(Box::new(f));
        self
    }

    /// Spreads list values over one pair per element.
    pub fn explode(mut self, explode: bool) -> Self {
        self.explode = explode;
        self
    }

    /// Appends a key column and a value column after the remaining columns.
    pub fn into(self, key: &str, value: &str) -> FrameResult<Frame> {
        self.build(Some(key), Some(value))
    }

    pub fn keys_into(self, key: &str) -> FrameResult<Frame> {
        self.build(Some(key), None)
    }

    pub fn values_into(self, value: &str) -> FrameResult<Frame> {
        self.build(None, Some(value))
    }

    fn build(self, key_name: Option<&str>, value_name: Option<&str>) -> FrameResult<Frame> {
        let paths = self
            .selector
            .resolve_non_empty(&self.frame, strata_columnar::Unresolved::Fail)?;
        let removal = remove(&self.frame, &ColumnSelector::paths(paths))?;
        let gathered = collect_gathered(&removal.removed_columns().collect::<Vec<_>>())?;

        // (source row, gathered column, value or row inside the group)
        let mut source_rows = Vec::new();
        let mut keys = Vec::new();
        let mut values = Vec::new();
        let mut group_rows = Vec::new();
        for row in 0..self.frame.row_count() {
            match &gathered {
                Gathered::Values(columns) => {
                    for (name, column) in columns {
                        let cell = &column.values()[row];
                        let items: Vec<Value> = match cell {
                            Value::List(items) if self.explode => items.to_vec(),
                            other => vec![other.clone()],
                        };
                        for item in items {
                            if self.filter.as_ref().is_some_and(|f| !f(&item)) {
                                continue;
                            }
                            let item = match &self.map_values {
                                Some(f) => f(&item),
                                None => item,
                            };
                            source_rows.push(row);
                            keys.push(self.key(name));
                            values.push(item);
                        }
                    }
                }
                Gathered::Groups(groups) => {
                    for (index, (name, _)) in groups.iter().enumerate() {
                        source_rows.push(row);
                        keys.push(self.key(name));
                        group_rows.push(index * self.frame.row_count() + row);
                    }
                }
            }
        }

        let mut result = removal.frame.take(&source_rows);
        if let Some(key_name) = key_name {
            result = result.with_column(Column::Value(ValueColumn::infer(key_name, keys)))?;
        }
        if let Some(value_name) = value_name {
            let column = match &gathered {
                Gathered::Values(_) => Column::Value(ValueColumn::infer(value_name, values)),
                Gathered::Groups(groups) => {
                    let stacked = Frame::concat(groups.iter().map(|(_, f)| f))?;
                    Column::group(value_name, stacked.take(&group_rows))
                }
            };
            result = result.with_column(column)?;
        }
        log::debug!(
            "gathered {} rows into {} pairs",
            self.frame.row_count(),
            result.row_count()
        );
        Ok(result)
    }

    fn key(&self, name: &str) -> Value {
        match &self.map_keys {
            Some(f) => f(name),
            None => Value::string(name),
        }
    }
}

fn collect_gathered(columns: &[(ColumnPath, &Column)]) -> FrameResult<Gathered> {
    let first_kind = columns.first().map_or(ColumnKind::Value, |(_, c)| c.kind());
    for (path, column) in columns {
        if column.kind() != first_kind || first_kind == ColumnKind::Frame {
            return Err(FrameError::IncompatibleKind {
                path: path.clone(),
                expected: if first_kind == ColumnKind::Frame {
                    ColumnKind::Value
                } else {
                    first_kind
                },
                actual: column.kind(),
            });
        }
    }
    let name = |path: &ColumnPath| path.name().unwrap_or_default().to_string();
    Ok(match first_kind {
        ColumnKind::Group => Gathered::Groups(
            columns
                .iter()
                .filter_map(|(p, c)| c.as_group().map(|g| (name(p), g.frame().clone())))
                .collect(),
        ),
        _ => Gathered::Values(
            columns
                .iter()
                .filter_map(|(p, c)| c.as_value().map(|v| (name(p), v.clone())))
                .collect(),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn gathers_groups_into_a_group_column() {
        let a = Frame::from_rows(&["x"], vec![vec![1.into()], vec![2.into()]]).unwrap();
        let b = Frame::from_rows(&["x"], vec![vec![3.into()], vec![4.into()]]).unwrap();
        let frame = Frame::from_columns(vec![
            Column::values("id", vec![10, 20]),
            Column::group("a", a),
            Column::group("b", b),
        ])
        .unwrap();
        let gathered = gather(&frame, ["a", "b"]).into("key", "value").unwrap();
        assert_eq!(gathered.column_names(), vec!["id", "key", "value"]);
        let x = gathered.get(&ColumnPath::from(["value", "x"])).unwrap();
        assert_eq!(
            x.as_value().unwrap().values(),
            &[Value::Int(1), Value::Int(3), Value::Int(2), Value::Int(4)]
        );
    }
}
