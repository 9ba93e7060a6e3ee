//! Column selectors: a small expression tree describing a set of column paths.
//!
//! Operators take a [`ColumnSelector`] and resolve it against the frame they work on. Resolution
//! keeps the declared order (first occurrence wins for duplicates), which is the order removed
//! columns are reported in.

use crate::column::{Column, ColumnKind};
use crate::error::{FrameError, FrameResult};
use crate::frame::Frame;
use crate::path::ColumnPath;
use crate::types::ValueType;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// What to do with a named column that does not exist in the frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Unresolved {
    /// Report [`FrameError::ColumnNotFound`].
    #[default]
    Fail,
    /// Drop the reference from the selection.
    Skip,
}

type Predicate = Arc<dyn Fn(&ColumnPath, &Column) -> bool + Send + Sync>;

/// Predicate over a column and its path.
#[derive(Clone)]
pub enum ColumnFilter {
    Any,
    Kind(ColumnKind),
    /// Value columns whose declared value type equals the given one.
    ValueType(ValueType),
    NameMatches(Regex),
    Custom(Predicate),
}

impl ColumnFilter {
    pub fn custom(f: impl Fn(&ColumnPath, &Column) -> bool + Send + Sync + 'static) -> Self {
        ColumnFilter::Custom(Arc::new(f))
    }

    pub fn matches(&self, path: &ColumnPath, column: &Column) -> bool {
        match self {
            ColumnFilter::Any => true,
            ColumnFilter::Kind(kind) => column.kind() == *kind,
            ColumnFilter::ValueType(t) => column
                .as_value()
                .is_some_and(|c| c.element_type().value_type == *t),
            ColumnFilter::NameMatches(re) => re.is_match(column.name()),
            ColumnFilter::Custom(f) => f(path, column),
        }
    }
}

impl fmt::Debug for ColumnFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnFilter::Any => f.write_str("Any"),
            ColumnFilter::Kind(k) => write!(f, "Kind({k})"),
            ColumnFilter::ValueType(t) => write!(f, "ValueType({t})"),
            ColumnFilter::NameMatches(re) => write!(f, "NameMatches({})", re.as_str()),
            ColumnFilter::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Clone, Debug)]
pub enum ColumnSelector {
    /// Top-level column by name.
    Name(String),
    Path(ColumnPath),
    /// Every top-level column.
    All,
    /// Direct children of a column group.
    Children(ColumnPath),
    /// Top-level columns matching a filter.
    Filter(ColumnFilter),
    /// Columns at any depth matching a filter, parents before children.
    AtAnyDepth(ColumnFilter),
    Union(Vec<ColumnSelector>),
    Except(Box<ColumnSelector>, Box<ColumnSelector>),
}

impl ColumnSelector {
    pub fn name(name: impl Into<String>) -> Self {
        ColumnSelector::Name(name.into())
    }

    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnSelector::Union(names.into_iter().map(|n| ColumnSelector::Name(n.into())).collect())
    }

    pub fn path(path: impl Into<ColumnPath>) -> Self {
        ColumnSelector::Path(path.into())
    }

    pub fn paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ColumnPath>,
    {
        ColumnSelector::Union(paths.into_iter().map(|p| ColumnSelector::Path(p.into())).collect())
    }

    pub fn all() -> Self {
        ColumnSelector::All
    }

    pub fn children(path: impl Into<ColumnPath>) -> Self {
        ColumnSelector::Children(path.into())
    }

    pub fn of_kind(kind: ColumnKind) -> Self {
        ColumnSelector::Filter(ColumnFilter::Kind(kind))
    }

    pub fn of_type(value_type: ValueType) -> Self {
        ColumnSelector::Filter(ColumnFilter::ValueType(value_type))
    }

    pub fn matching(re: Regex) -> Self {
        ColumnSelector::Filter(ColumnFilter::NameMatches(re))
    }

    pub fn at_any_depth(filter: ColumnFilter) -> Self {
        ColumnSelector::AtAnyDepth(filter)
    }

    pub fn and(self, other: impl Into<ColumnSelector>) -> Self {
        match self {
            ColumnSelector::Union(mut items) => {
                items.push(other.into());
                ColumnSelector::Union(items)
            }
            first => ColumnSelector::Union(vec![first, other.into()]),
        }
    }

    pub fn except(self, other: impl Into<ColumnSelector>) -> Self {
        ColumnSelector::Except(Box::new(self), Box::new(other.into()))
    }

    /// Resolves the selector to distinct paths in declared order.
    pub fn resolve(&self, frame: &Frame, unresolved: Unresolved) -> FrameResult<Vec<ColumnPath>> {
        let mut out = Vec::new();
        self.collect(frame, unresolved, &mut out)?;
        let mut seen = HashSet::new();
        out.retain(|p| seen.insert(p.clone()));
        Ok(out)
    }

    /// Like [`ColumnSelector::resolve`], failing with [`FrameError::EmptySelection`] when nothing
    /// is selected.
    pub fn resolve_non_empty(
        &self,
        frame: &Frame,
        unresolved: Unresolved,
    ) -> FrameResult<Vec<ColumnPath>> {
        let paths = self.resolve(frame, unresolved)?;
        if paths.is_empty() {
            return Err(FrameError::EmptySelection {
                selector: format!("{self:?}"),
            });
        }
        Ok(paths)
    }

    fn collect(
        &self,
        frame: &Frame,
        unresolved: Unresolved,
        out: &mut Vec<ColumnPath>,
    ) -> FrameResult<()> {
        match self {
            ColumnSelector::Name(name) => {
                push_existing(frame, ColumnPath::single(name.as_str()), unresolved, out)?
            }
            ColumnSelector::Path(path) => push_existing(frame, path.clone(), unresolved, out)?,
            ColumnSelector::All => out.extend(
                frame
                    .columns()
                    .iter()
                    .map(|c| ColumnPath::single(c.name())),
            ),
            ColumnSelector::Children(parent) => {
                let nested = if parent.is_empty() {
                    Some(frame)
                } else {
                    match frame.get(parent) {
                        Some(Column::Group(g)) => Some(g.frame()),
                        Some(_) => return Err(FrameError::NotAGroup { path: parent.clone() }),
                        None if unresolved == Unresolved::Skip => None,
                        None => {
                            return Err(FrameError::ColumnNotFound {
                                path: parent.clone(),
                            })
                        }
                    }
                };
                if let Some(nested) = nested {
                    out.extend(nested.columns().iter().map(|c| parent.child(c.name())));
                }
            }
            ColumnSelector::Filter(filter) => out.extend(
                frame
                    .columns()
                    .iter()
                    .map(|c| (ColumnPath::single(c.name()), c))
                    .filter(|(p, c)| filter.matches(p, c))
                    .map(|(p, _)| p),
            ),
            ColumnSelector::AtAnyDepth(filter) => out.extend(
                frame
                    .walk()
                    .into_iter()
                    .filter(|(p, c)| filter.matches(p, c))
                    .map(|(p, _)| p),
            ),
            ColumnSelector::Union(items) => {
                for item in items {
                    item.collect(frame, unresolved, out)?;
                }
            }
            ColumnSelector::Except(left, right) => {
                let excluded: HashSet<ColumnPath> =
                    right.resolve(frame, Unresolved::Skip)?.into_iter().collect();
                let mut kept = Vec::new();
                left.collect(frame, unresolved, &mut kept)?;
                out.extend(kept.into_iter().filter(|p| !excluded.contains(p)));
            }
        }
        Ok(())
    }
}

fn push_existing(
    frame: &Frame,
    path: ColumnPath,
    unresolved: Unresolved,
    out: &mut Vec<ColumnPath>,
) -> FrameResult<()> {
    if frame.get(&path).is_some() {
        out.push(path);
        return Ok(());
    }
    match unresolved {
        Unresolved::Fail => Err(FrameError::ColumnNotFound { path }),
        Unresolved::Skip => {
            log::warn!("skipping unresolved column {path}");
            Ok(())
        }
    }
}

impl From<&str> for ColumnSelector {
    fn from(name: &str) -> Self {
        ColumnSelector::name(name)
    }
}

impl From<String> for ColumnSelector {
    fn from(name: String) -> Self {
        ColumnSelector::Name(name)
    }
}

impl From<ColumnPath> for ColumnSelector {
    fn from(path: ColumnPath) -> Self {
        ColumnSelector::Path(path)
    }
}

impl From<&ColumnPath> for ColumnSelector {
    fn from(path: &ColumnPath) -> Self {
        ColumnSelector::Path(path.clone())
    }
}

impl<const N: usize> From<[&str; N]> for ColumnSelector {
    fn from(names: [&str; N]) -> Self {
        ColumnSelector::names(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn sample() -> Frame {
        let address = Frame::from_rows(&["city", "zip"], vec![vec!["Oslo".into(), 1.into()]]).unwrap();
        Frame::from_columns(vec![
            Column::values("name", vec!["Ann"]),
            Column::group("address", address),
            Column::values("age", vec![Value::Int(3)]),
        ])
        .unwrap()
    }

    #[test]
    fn keeps_declared_order_and_dedups() {
        let frame = sample();
        let sel = ColumnSelector::names(["age", "name", "age"]);
        assert_eq!(
            sel.resolve(&frame, Unresolved::Fail).unwrap(),
            vec![ColumnPath::single("age"), ColumnPath::single("name")]
        );
    }

    #[test]
    fn strict_resolution_fails_on_unknown_names() {
        let frame = sample();
        let sel = ColumnSelector::names(["age", "nope"]);
        assert!(matches!(
            sel.resolve(&frame, Unresolved::Fail),
            Err(FrameError::ColumnNotFound { .. })
        ));
        assert_eq!(
            sel.resolve(&frame, Unresolved::Skip).unwrap(),
            vec![ColumnPath::single("age")]
        );
    }

    #[test]
    fn any_depth_and_except() {
        let frame = sample();
        let ints = ColumnSelector::at_any_depth(ColumnFilter::ValueType(ValueType::Int));
        assert_eq!(
            ints.resolve(&frame, Unresolved::Fail).unwrap(),
            vec![ColumnPath::from(["address", "zip"]), ColumnPath::single("age")]
        );
        let rest = ColumnSelector::all().except("address");
        assert_eq!(
            rest.resolve(&frame, Unresolved::Fail).unwrap(),
            vec![ColumnPath::single("name"), ColumnPath::single("age")]
        );
        let children = ColumnSelector::children("address");
        assert_eq!(
            children.resolve(&frame, Unresolved::Fail).unwrap(),
            vec![
                ColumnPath::from(["address", "city"]),
                ColumnPath::from(["address", "zip"])
            ]
        );
    }
}
