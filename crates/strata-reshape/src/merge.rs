use crate::tree::{insert, remove, ColumnToInsert};
use strata_columnar::{
    Column, ColumnKind, ColumnPath, ColumnSelector, Frame, FrameError, FrameResult, Unresolved,
    Value, ValueColumn,
};

type Merger = Box<dyn Fn(&[Value]) -> Value>;

/// Merge builder returned by [`merge`].
pub struct Merge {
    frame: Frame,
    selector: ColumnSelector,
    not_null: bool,
    merger: Merger,
}

/// Starts combining the selected value columns into one column. By default each row becomes
/// the list of its values.
pub fn merge(frame: &Frame, columns: impl Into<ColumnSelector>) -> Merge {
    Merge {
        frame: frame.clone(),
        selector: columns.into(),
        not_null: false,
        merger: Box::new(|values| Value::list(values.iter().cloned())),
    }
}

impl Merge {
    /// Leaves null cells out of every row before merging.
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn by(mut self, f: impl Fn(&[Value]) -> Value + 'static) -> Self {
        self.merger = Box::new(f);
        self
    }

    /// Joins the string forms of the values with `separator`.
    pub fn by_separator(self, separator: &str) -> Self {
        let separator = separator.to_string();
        self.by(move |values| {
            let parts: Vec<String> = values.iter().map(ToString::to_string).collect();
            Value::string(parts.join(&separator))
        })
    }

    /// Merges every row into the list of its values, regardless of an earlier [`Merge::by`].
    pub fn into_list(mut self, path: impl Into<ColumnPath>) -> FrameResult<Frame> {
        self.merger = Box::new(|values| Value::list(values.iter().cloned()));
        self.into(path)
    }

    /// Places the merged column at `path`, where the first merged column used to be.
    pub fn into(self, path: impl Into<ColumnPath>) -> FrameResult<Frame> {
        let path = path.into();
        let paths = self
            .selector
            .resolve_non_empty(&self.frame, Unresolved::Fail)?;
        let removal = remove(&self.frame, &ColumnSelector::paths(paths))?;
        let columns = removal
            .removed_columns()
            .map(|(path, column)| match column {
                Column::Value(c) => Ok(c),
                other => Err(FrameError::IncompatibleKind {
                    path,
                    expected: ColumnKind::Value,
                    actual: other.kind(),
                }),
            })
            .collect::<FrameResult<Vec<&ValueColumn>>>()?;

        let mut merged = Vec::with_capacity(self.frame.row_count());
        let mut row_values = Vec::with_capacity(columns.len());
        for row in 0..self.frame.row_count() {
            row_values.clear();
            row_values.extend(
                columns
                    .iter()
                    .map(|c| c.values()[row].clone())
                    .filter(|v| !(self.not_null && v.is_null())),
            );
            merged.push((self.merger)(&row_values));
        }

        let name = path.name().unwrap_or_default().to_string();
        let mut request = ColumnToInsert::new(path, Column::Value(ValueColumn::infer(name, merged)));
        if let Some(&first) = removal.removed.first() {
            request = request.with_reference(first);
        }
        insert(Some(&removal.frame), Some(&removal.tree), vec![request])
    }
}
