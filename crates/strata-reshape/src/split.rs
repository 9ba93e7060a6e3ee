use crate::explode::explode;
use crate::names::NameGenerator;
use crate::tree::{insert, remove_paths, replace_column, ColumnToInsert};
use regex::Regex;
use strata_columnar::{
    Column, ColumnKind, ColumnPath, ColumnSelector, Frame, FrameError, FrameResult, Unresolved,
    Value, ValueColumn,
};

type Splitter = Box<dyn Fn(&Value) -> Vec<Value>>;

/// Split builder returned by [`split`].
pub struct Split {
    frame: Frame,
    selector: ColumnSelector,
    splitter: Splitter,
    default: Value,
}

/// Starts splitting the selected value columns. By default strings are split on `,` with
/// every part trimmed, lists are taken as they are and nulls give no parts.
pub fn split(frame: &Frame, columns: impl Into<ColumnSelector>) -> Split {
    Split {
        frame: frame.clone(),
        selector: columns.into(),
        splitter: Box::new(|value| split_on(value, |s| s.split(',').map(str::to_string).collect())),
        default: Value::Null,
    }
}

fn split_on(value: &Value, f: impl Fn(&str) -> Vec<String>) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::List(items) => items.to_vec(),
        Value::String(s) => f(s).into_iter().map(|p| Value::string(p.trim())).collect(),
        other => f(&other.to_string())
            .into_iter()
            .map(|p| Value::string(p.trim()))
            .collect(),
    }
}

impl Split {
    pub fn by(mut self, f: impl Fn(&Value) -> Vec<Value> + 'static) -> Self {
        self.splitter = Box::new(f);
        self
    }

    pub fn by_separator(self, separator: &str) -> Self {
        let separator = separator.to_string();
        self.by(move |value| {
            split_on(value, |s| s.split(separator.as_str()).map(str::to_string).collect())
        })
    }

    pub fn by_regex(self, pattern: Regex) -> Self {
        self.by(move |value| split_on(value, |s| pattern.split(s).map(str::to_string).collect()))
    }

    /// Value used to pad rows with fewer parts than columns.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }

    fn parts(&self) -> FrameResult<Vec<(ColumnPath, Vec<Vec<Value>>)>> {
        let paths = self
            .selector
            .resolve_non_empty(&self.frame, Unresolved::Fail)?;
        paths
            .into_iter()
            .map(|path| {
                let column = self.frame.try_get(&path)?;
                let Column::Value(values) = column else {
                    return Err(FrameError::IncompatibleKind {
                        path,
                        expected: ColumnKind::Value,
                        actual: column.kind(),
                    });
                };
                let parts = values.values().iter().map(|v| (self.splitter)(v)).collect();
                Ok((path, parts))
            })
            .collect()
    }

    /// Spreads the parts over sibling columns named `names`, followed by generated names
    /// `split1`, `split2`, ... when a row has more parts than names.
    pub fn into<S: AsRef<str>>(self, names: &[S]) -> FrameResult<Frame> {
        self.spread(names, false)
    }

    /// Like [`Split::into`], nesting the new columns in a group replacing the source column.
    pub fn inward<S: AsRef<str>>(self, names: &[S]) -> FrameResult<Frame> {
        self.spread(names, true)
    }

    fn spread<S: AsRef<str>>(self, names: &[S], inward: bool) -> FrameResult<Frame> {
        let parts = self.parts()?;
        let paths: Vec<ColumnPath> = parts.iter().map(|(p, _)| p.clone()).collect();
        let removal = remove_paths(&self.frame, &paths)?;

        let mut requests = Vec::new();
        for ((path, rows), &id) in parts.into_iter().zip(&removal.removed) {
            let width = rows.iter().map(Vec::len).max().unwrap_or(0);
            let parent = if inward {
                path.clone()
            } else {
                path.parent().unwrap_or_default()
            };
            let mut generator = if inward {
                NameGenerator::default()
            } else {
                let siblings = if parent.is_empty() {
                    Some(&removal.frame)
                } else {
                    removal
                        .frame
                        .get(&parent)
                        .and_then(Column::as_group)
                        .map(|g| g.frame())
                };
                NameGenerator::new(siblings.map(Frame::column_names).unwrap_or_default())
            };
            for i in 0..width {
                let preferred = match names.get(i) {
                    Some(name) => name.as_ref().to_string(),
                    None => format!("split{}", i + 1 - names.len()),
                };
                let name = generator.add_unique(&preferred);
                let values = rows
                    .iter()
                    .map(|parts| parts.get(i).cloned().unwrap_or_else(|| self.default.clone()))
                    .collect();
                requests.push(
                    ColumnToInsert::new(
                        parent.child(name.as_str()),
                        Column::Value(ValueColumn::infer(name, values)),
                    )
                    .with_reference(id),
                );
            }
        }
        insert(Some(&removal.frame), Some(&removal.tree), requests)
    }

    /// Replaces every selected column by a column of part lists.
    pub fn in_place(self) -> FrameResult<Frame> {
        let parts = self.parts()?;
        let mut frame = self.frame;
        for (path, rows) in parts {
            let name = path.name().unwrap_or_default().to_string();
            let lists = rows.into_iter().map(Value::from).collect();
            frame = replace_column(&frame, &path, Column::Value(ValueColumn::infer(name, lists)))?;
        }
        Ok(frame)
    }

    /// One row per part; rows without parts are dropped.
    pub fn into_rows(self) -> FrameResult<Frame> {
        let paths = self
            .selector
            .resolve_non_empty(&self.frame, Unresolved::Fail)?;
        let replaced = self.in_place()?;
        explode(&replaced, ColumnSelector::paths(paths), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_splitter_trims_parts() {
        let parts = split_on(&Value::string("a, b ,c"), |s| {
            s.split(',').map(str::to_string).collect()
        });
        assert_eq!(parts, vec![Value::string("a"), Value::string("b"), Value::string("c")]);
        assert!(split_on(&Value::Null, |_| Vec::new()).is_empty());
    }
}
