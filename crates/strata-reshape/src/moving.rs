//! Column moves. Every move removes the selected columns and inserts them again at rewritten
//! paths, so columns keep their relative order and empty groups left behind disappear.

use crate::names::NameGenerator;
use crate::tree::{insert, insert_at, remove, remove_lenient, update_group, ColumnToInsert};
use strata_columnar::{
    Column, ColumnKind, ColumnPath, ColumnSelector, Frame, FrameError, FrameResult, Unresolved,
};

/// Move builder returned by [`move_columns`].
pub struct Move {
    frame: Frame,
    selector: ColumnSelector,
}

/// Starts moving the selected columns.
pub fn move_columns(frame: &Frame, columns: impl Into<ColumnSelector>) -> Move {
    Move {
        frame: frame.clone(),
        selector: columns.into(),
    }
}

impl Move {
    /// Moves every column to the path computed by `f` from its current path. Columns landing
    /// in the group they came from keep their position there.
    pub fn into(self, mut f: impl FnMut(&ColumnPath) -> ColumnPath) -> FrameResult<Frame> {
        let paths = self
            .selector
            .resolve_non_empty(&self.frame, Unresolved::Fail)?;
        let removal = remove(&self.frame, &ColumnSelector::paths(paths))?;
        let requests = removal.rewritten(|path, column| {
            let target = f(path);
            let column = column.renamed(target.name().unwrap_or_else(|| column.name()));
            (target, column)
        });
        insert(Some(&removal.frame), Some(&removal.tree), requests)
    }

    /// Moves the columns into the group at `group`, creating it when missing.
    pub fn under(self, group: impl Into<ColumnPath>) -> FrameResult<Frame> {
        let group = group.into();
        self.into(|path| group.child(path.name().unwrap_or_default()))
    }

    pub fn to_top(self) -> FrameResult<Frame> {
        self.into(|path| ColumnPath::single(path.name().unwrap_or_default()))
    }

    /// Moves the columns to the beginning of their own group.
    pub fn to_start(self) -> FrameResult<Frame> {
        self.to_index(0)
    }

    pub fn to_end(self) -> FrameResult<Frame> {
        self.to_index(usize::MAX)
    }

    /// Moves the columns, in selection order, to `index` within the group of the first
    /// selected column. All selected columns must share that group.
    pub fn to_index(self, index: usize) -> FrameResult<Frame> {
        let paths = self
            .selector
            .resolve_non_empty(&self.frame, Unresolved::Fail)?;
        let parent = shared_parent(&paths)?;
        let names: Vec<&str> = paths.iter().filter_map(ColumnPath::name).collect();
        update_group(&self.frame, &parent, |group| {
            let moved = names
                .iter()
                .filter_map(|n| group.column(n).cloned())
                .collect::<Vec<_>>();
            let rest = group
                .columns()
                .iter()
                .filter(|c| !names.contains(&c.name()))
                .cloned()
                .collect::<Vec<_>>();
            let reordered = Frame::with_row_count(rest, group.row_count())?;
            insert_at(&reordered, &ColumnPath::root(), index, moved)
        })
    }

    /// Moves the columns right after the column at `after`, which must be a sibling.
    pub fn after(self, after: impl Into<ColumnPath>) -> FrameResult<Frame> {
        let after = after.into();
        let paths = self
            .selector
            .resolve_non_empty(&self.frame, Unresolved::Fail)?;
        if paths.contains(&after) {
            return Err(FrameError::InvalidArgument(format!(
                "column {after} cannot be moved after itself"
            )));
        }
        self.frame.try_get(&after)?;
        let parent = after.parent().unwrap_or_default();
        let removal = remove(&self.frame, &ColumnSelector::paths(paths))?;
        let columns: Vec<Column> = removal.removed_columns().map(|(_, c)| c.clone()).collect();
        let anchor = after.name().unwrap_or_default().to_string();
        update_group(&removal.frame, &parent, |group| {
            let index = group
                .index_of(&anchor)
                .ok_or_else(|| FrameError::ColumnNotFound { path: after.clone() })?;
            let mut existing = group.columns().to_vec();
            existing.splice(index + 1..index + 1, columns);
            group.with_columns(existing)
        })
    }
}

fn shared_parent(paths: &[ColumnPath]) -> FrameResult<ColumnPath> {
    let parent = paths
        .first()
        .and_then(ColumnPath::parent)
        .unwrap_or_default();
    if let Some(other) = paths
        .iter()
        .find(|p| p.parent().unwrap_or_default() != parent)
    {
        return Err(FrameError::InvalidArgument(format!(
            "column {other} is not a sibling of the columns under {parent}"
        )));
    }
    Ok(parent)
}

/// Moves the selected columns into a new group named `name`, placed where the first of them was.
pub fn group_columns(
    frame: &Frame,
    columns: impl Into<ColumnSelector>,
    name: &str,
) -> FrameResult<Frame> {
    move_columns(frame, columns).into(|path| {
        let parent = path.parent().unwrap_or_default();
        parent
            .child(name)
            .child(path.name().unwrap_or_default())
    })
}

/// Replaces the selected column groups by their children. Children whose names clash with the
/// group's siblings get a numeric suffix.
pub fn ungroup(frame: &Frame, columns: impl Into<ColumnSelector>) -> FrameResult<Frame> {
    let groups = columns.into().resolve_non_empty(frame, Unresolved::Fail)?;
    let mut result = frame.clone();
    for group in groups {
        let Column::Group(column) = result.try_get(&group)? else {
            return Err(FrameError::NotAGroup { path: group });
        };
        let parent = group.parent().unwrap_or_default();
        let siblings = sibling_names(&result, &parent)
            .into_iter()
            .filter(|n| Some(n.as_str()) != group.name());
        let mut names = NameGenerator::new(siblings);
        let children: Vec<Column> = column
            .frame()
            .columns()
            .iter()
            .map(|c| c.renamed(names.add_unique(c.name())))
            .collect();
        let anchor = group.name().unwrap_or_default().to_string();
        result = update_group(&result, &parent, |frame| {
            let index = frame
                .index_of(&anchor)
                .ok_or_else(|| FrameError::ColumnNotFound { path: group.clone() })?;
            let mut existing = frame.columns().to_vec();
            existing.splice(index..=index, children);
            frame.with_columns(existing)
        })?;
    }
    Ok(result)
}

fn sibling_names(frame: &Frame, parent: &ColumnPath) -> Vec<String> {
    let group = if parent.is_empty() {
        Some(frame)
    } else {
        frame.get(parent).and_then(Column::as_group).map(|g| g.frame())
    };
    group
        .map(|g| g.column_names().into_iter().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Options for [`flatten`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlattenOptions {
    /// When set, flattened columns are named after their full path joined with this separator.
    pub keep_parent_names: Option<String>,
}

impl FlattenOptions {
    pub fn keep_parent_names(separator: impl Into<String>) -> Self {
        Self {
            keep_parent_names: Some(separator.into()),
        }
    }
}

/// Pulls every value and frame column nested inside the selected groups up to the level of the
/// outermost selected group. Clashing names get a numeric suffix.
pub fn flatten(
    frame: &Frame,
    columns: impl Into<ColumnSelector>,
    options: &FlattenOptions,
) -> FrameResult<Frame> {
    let roots = columns.into().resolve_non_empty(frame, Unresolved::Fail)?;
    let mut roots: Vec<ColumnPath> = roots
        .iter()
        .filter(|p| !roots.iter().any(|other| other != *p && p.starts_with(other)))
        .cloned()
        .collect();
    roots.retain(|p| matches!(frame.get(p), Some(Column::Group(_))));
    if roots.is_empty() {
        return Ok(frame.clone());
    }

    let mut leaves = Vec::new();
    for root in &roots {
        let Some(Column::Group(group)) = frame.get(root) else {
            continue;
        };
        leaves.extend(
            group
                .frame()
                .walk()
                .into_iter()
                .filter(|(_, c)| c.kind() != ColumnKind::Group)
                .map(|(p, _)| (root.clone(), root.concat(&p))),
        );
    }
    let paths: Vec<ColumnPath> = leaves.iter().map(|(_, p)| p.clone()).collect();
    let removal = remove(frame, &ColumnSelector::paths(paths))?;

    let mut generators: Vec<(ColumnPath, NameGenerator)> = Vec::new();
    let mut requests = Vec::with_capacity(leaves.len());
    for ((root, path), (&id, (_, column))) in leaves
        .iter()
        .zip(removal.removed.iter().zip(removal.removed_columns()))
    {
        let parent = root.parent().unwrap_or_default();
        let preferred = match &options.keep_parent_names {
            Some(separator) => path.drop_first(parent.len()).names().join(separator),
            None => path.name().unwrap_or_default().to_string(),
        };
        let position = match generators.iter().position(|(p, _)| *p == parent) {
            Some(position) => position,
            None => {
                generators.push((
                    parent.clone(),
                    NameGenerator::new(sibling_names(&removal.frame, &parent)),
                ));
                generators.len() - 1
            }
        };
        let name = generators[position].1.add_unique(&preferred);
        requests.push(
            ColumnToInsert::new(parent.child(name.as_str()), column.renamed(name))
                .with_reference(id),
        );
    }
    log::trace!("flattening {} columns", requests.len());
    insert(Some(&removal.frame), Some(&removal.tree), requests)
}

/// Renames the column at `path`, keeping its position.
pub fn rename(frame: &Frame, path: impl Into<ColumnPath>, name: &str) -> FrameResult<Frame> {
    let path = path.into();
    let parent = path.parent().unwrap_or_default();
    if sibling_names(frame, &parent).iter().any(|n| n == name) && path.name() != Some(name) {
        return Err(FrameError::DuplicateColumn {
            path: parent.child(name),
        });
    }
    let column = frame.try_get(&path)?.renamed(name);
    crate::tree::replace_column(frame, &path, column)
}

/// Keeps only the selected columns, in selection order at the top level.
pub fn select(frame: &Frame, columns: impl Into<ColumnSelector>) -> FrameResult<Frame> {
    let paths = columns.into().resolve(frame, Unresolved::Fail)?;
    let requests = paths
        .iter()
        .map(|path| Ok(ColumnToInsert::new(path.clone(), frame.try_get(path)?.clone())))
        .collect::<FrameResult<Vec<_>>>()?;
    if requests.is_empty() {
        return Ok(Frame::empty(frame.row_count()));
    }
    insert(None, None, requests)
}

/// Drops the selected columns. Names that do not exist are ignored.
pub fn remove_columns(frame: &Frame, columns: impl Into<ColumnSelector>) -> FrameResult<Frame> {
    Ok(remove_lenient(frame, &columns.into())?.frame)
}
