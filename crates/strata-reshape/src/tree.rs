//! Column tree editing.
//!
//! Every restructuring operator is expressed as a [`remove`] followed by an [`insert`]. `remove`
//! records where each removed column used to live in a [`ColumnTree`]; `insert` uses those
//! records as references so that columns put back (possibly renamed, regrouped or retyped) land
//! where they originally were, even though some of their former siblings are gone.

use std::collections::HashMap;
use strata_columnar::{
    Column, ColumnPath, ColumnSelector, Frame, FrameError, FrameResult, Unresolved,
};

/// Index of a node in a [`ColumnTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Clone, Debug)]
pub struct TreeNode {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    depth: usize,
    original_index: usize,
    was_removed: bool,
    column: Option<Column>,
}

impl TreeNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The root has depth 0, top-level columns depth 1.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Position of the column among its siblings before removal.
    pub fn original_index(&self) -> usize {
        self.original_index
    }

    /// `false` for column groups that were only partially emptied and still exist.
    pub fn was_removed(&self) -> bool {
        self.was_removed
    }

    /// The removed column for removal targets, the rebuilt group for partially emptied groups,
    /// `None` for groups that collapsed.
    pub fn column(&self) -> Option<&Column> {
        self.column.as_ref()
    }
}

/// Arena holding the columns touched by one [`remove`].
#[derive(Clone, Debug)]
pub struct ColumnTree {
    nodes: Vec<TreeNode>,
}

impl Default for ColumnTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![TreeNode {
                name: String::new(),
                parent: None,
                children: Vec::new(),
                depth: 0,
                original_index: 0,
                was_removed: false,
                column: None,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    fn add_child(&mut self, parent: NodeId, name: &str, original_index: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        let depth = self.nodes[parent.0].depth + 1;
        self.nodes.push(TreeNode {
            name: name.to_string(),
            parent: Some(parent),
            children: Vec::new(),
            depth,
            original_index,
            was_removed: true,
            column: None,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.node(parent)
            .children
            .iter()
            .copied()
            .find(|&c| self.node(c).name == name)
    }

    pub fn find(&self, path: &ColumnPath) -> Option<NodeId> {
        path.iter()
            .try_fold(self.root(), |node, name| self.child(node, name))
    }

    pub fn path(&self, id: NodeId) -> ColumnPath {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current.map(|c| self.node(c)) {
            if node.parent.is_some() {
                names.push(node.name.clone());
            }
            current = node.parent;
        }
        names.reverse();
        ColumnPath::new(names)
    }

    /// The ancestor of `id` (or `id` itself) at the given depth.
    pub fn ancestor_at(&self, id: NodeId, depth: usize) -> Option<NodeId> {
        let mut current = id;
        if self.node(current).depth < depth {
            return None;
        }
        while self.node(current).depth > depth {
            current = self.node(current).parent?;
        }
        Some(current)
    }
}

/// Outcome of [`remove`].
#[derive(Clone, Debug)]
pub struct RemoveResult {
    pub frame: Frame,
    pub tree: ColumnTree,
    /// Removed columns in the order the selector declared them.
    pub removed: Vec<NodeId>,
}

impl RemoveResult {
    pub fn removed_columns(&self) -> impl Iterator<Item = (ColumnPath, &Column)> + '_ {
        self.removed.iter().filter_map(|&id| {
            self.tree
                .node(id)
                .column()
                .map(|column| (self.tree.path(id), column))
        })
    }

    /// Insertion requests putting every removed column back at its own path.
    pub fn reinsertions(&self) -> Vec<ColumnToInsert> {
        self.rewritten(|path, column| (path.clone(), column.clone()))
    }

    /// Insertion requests for every removed column, rewritten by `f`, each keeping its removal
    /// node as ordering reference.
    pub fn rewritten(
        &self,
        mut f: impl FnMut(&ColumnPath, &Column) -> (ColumnPath, Column),
    ) -> Vec<ColumnToInsert> {
        self.removed
            .iter()
            .filter_map(|&id| {
                let column = self.tree.node(id).column()?;
                let (path, column) = f(&self.tree.path(id), column);
                Some(ColumnToInsert::new(path, column).with_reference(id))
            })
            .collect()
    }
}

/// A column to place at `path`, optionally remembering where a column used to live.
#[derive(Clone, Debug)]
pub struct ColumnToInsert {
    pub path: ColumnPath,
    pub column: Column,
    pub reference: Option<NodeId>,
}

impl ColumnToInsert {
    pub fn new(path: impl Into<ColumnPath>, column: Column) -> Self {
        Self {
            path: path.into(),
            column,
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: NodeId) -> Self {
        self.reference = Some(reference);
        self
    }
}

/// Removes the selected columns. Unknown names are an error.
pub fn remove(frame: &Frame, selector: &ColumnSelector) -> FrameResult<RemoveResult> {
    remove_with(frame, selector, Unresolved::Fail)
}

/// Removes the selected columns, ignoring names that do not exist.
pub fn remove_lenient(frame: &Frame, selector: &ColumnSelector) -> FrameResult<RemoveResult> {
    remove_with(frame, selector, Unresolved::Skip)
}

pub fn remove_with(
    frame: &Frame,
    selector: &ColumnSelector,
    unresolved: Unresolved,
) -> FrameResult<RemoveResult> {
    let paths = selector.resolve(frame, unresolved)?;
    remove_paths(frame, &paths)
}

pub fn remove_paths(frame: &Frame, paths: &[ColumnPath]) -> FrameResult<RemoveResult> {
    let mut tree = ColumnTree::new();
    let root = tree.root();
    let refs: Vec<&ColumnPath> = paths.iter().collect();
    let residual = remove_level(&mut tree, root, frame, &refs, 0)?;
    let frame = if residual.is_empty() {
        Frame::empty(frame.row_count())
    } else {
        frame.with_columns(residual)?
    };

    let mut removed = Vec::new();
    for path in paths {
        let Some(id) = tree.find(path) else {
            // Covered by an ancestor that was removed as a whole.
            continue;
        };
        let node = tree.node(id);
        if node.was_removed && node.column.is_some() && !removed.contains(&id) {
            removed.push(id);
        }
    }
    log::trace!("removed {} of {} selected columns", removed.len(), paths.len());
    Ok(RemoveResult {
        frame,
        tree,
        removed,
    })
}

fn remove_level(
    tree: &mut ColumnTree,
    parent: NodeId,
    frame: &Frame,
    paths: &[&ColumnPath],
    depth: usize,
) -> FrameResult<Vec<Column>> {
    let mut by_name: HashMap<&str, Vec<&ColumnPath>> = HashMap::new();
    for path in paths {
        if let Some(name) = path.get(depth) {
            by_name.entry(name).or_default().push(path);
        }
    }

    let mut residual = Vec::with_capacity(frame.column_count());
    for (index, column) in frame.columns().iter().enumerate() {
        let Some(targets) = by_name.get(column.name()) else {
            residual.push(column.clone());
            continue;
        };
        let node = tree.add_child(parent, column.name(), index);
        if targets.iter().all(|p| p.len() > depth + 1) {
            let Column::Group(group) = column else {
                return Err(FrameError::NotAGroup {
                    path: targets[0].take_first(depth + 1),
                });
            };
            let nested = remove_level(tree, node, group.frame(), targets, depth + 1)?;
            if !nested.is_empty() {
                let rebuilt = Column::group(column.name(), group.frame().with_columns(nested)?);
                let entry = &mut tree.nodes[node.0];
                entry.was_removed = false;
                entry.column = Some(rebuilt.clone());
                residual.push(rebuilt);
            }
        } else {
            tree.nodes[node.0].column = Some(column.clone());
        }
    }
    Ok(residual)
}

/// Inserts columns into `frame` (or into a new frame when `None`), creating intermediate column
/// groups as needed.
///
/// New columns are placed at the position recorded by their reference node in `tree` when that
/// node is a direct child of the group being filled, and appended otherwise.
pub fn insert(
    frame: Option<&Frame>,
    tree: Option<&ColumnTree>,
    columns: Vec<ColumnToInsert>,
) -> FrameResult<Frame> {
    let row_count = match (frame, columns.first()) {
        (Some(frame), _) => frame.row_count(),
        (None, Some(first)) => first.column.len(),
        (None, None) => 0,
    };
    if columns.is_empty() {
        return Ok(frame.cloned().unwrap_or_else(|| Frame::empty(row_count)));
    }
    let root = tree.map(ColumnTree::root);
    insert_level(
        frame,
        row_count,
        tree,
        root,
        columns,
        0,
        &ColumnPath::root(),
    )
}

fn insert_level(
    frame: Option<&Frame>,
    row_count: usize,
    tree: Option<&ColumnTree>,
    tree_node: Option<NodeId>,
    requests: Vec<ColumnToInsert>,
    depth: usize,
    parent_path: &ColumnPath,
) -> FrameResult<Frame> {
    let mut groups: Vec<(String, Vec<ColumnToInsert>)> = Vec::new();
    for request in requests {
        let Some(name) = request.path.get(depth).map(str::to_string) else {
            return Err(FrameError::InvalidArgument(format!(
                "can not insert a column at {}",
                request.path
            )));
        };
        match groups.iter_mut().find(|(n, _)| *n == name) {
            Some((_, group)) => group.push(request),
            None => groups.push((name, vec![request])),
        }
    }

    let mut columns: Vec<Column> = frame.map(|f| f.columns().to_vec()).unwrap_or_default();
    let mut new_columns: Vec<(Option<usize>, Column)> = Vec::new();

    for (name, requests) in groups {
        let path = parent_path.child(name.as_str());
        let child_node = match (tree, tree_node) {
            (Some(tree), Some(node)) => tree.child(node, &name),
            _ => None,
        };

        if let Some(pos) = columns.iter().position(|c| c.name() == name) {
            if requests.iter().any(|r| r.path.len() == depth + 1) {
                return Err(FrameError::DuplicateColumn { path });
            }
            let Column::Group(group) = &columns[pos] else {
                return Err(FrameError::NotAGroup { path });
            };
            let nested = insert_level(
                Some(group.frame()),
                row_count,
                tree,
                child_node,
                requests,
                depth + 1,
                &path,
            )?;
            columns[pos] = Column::group(name, nested);
            continue;
        }

        let index = requests
            .iter()
            .filter_map(|r| original_position(tree?, r.reference?, tree_node?, depth + 1))
            .min();

        let (exact, deeper): (Vec<ColumnToInsert>, Vec<ColumnToInsert>) = requests
            .into_iter()
            .partition(|r| r.path.len() == depth + 1);
        let column = match (exact.len(), deeper.is_empty()) {
            (0, _) => {
                let nested =
                    insert_level(None, row_count, tree, child_node, deeper, depth + 1, &path)?;
                Column::group(name, nested)
            }
            (1, true) => exact[0].column.renamed(name),
            (1, false) => {
                let Column::Group(base) = &exact[0].column else {
                    return Err(FrameError::NotAGroup { path });
                };
                let nested = insert_level(
                    Some(base.frame()),
                    row_count,
                    tree,
                    child_node,
                    deeper,
                    depth + 1,
                    &path,
                )?;
                Column::group(name, nested)
            }
            _ => return Err(FrameError::AmbiguousInsert { path }),
        };
        new_columns.push((index, column));
    }

    // Stable: simultaneous new columns at one position keep their request order.
    new_columns.sort_by_key(|(index, _)| index.unwrap_or(usize::MAX));

    let siblings: &[NodeId] = match (tree, tree_node) {
        (Some(tree), Some(node)) => tree.node(node).children(),
        _ => &[],
    };
    let mut k = 0;
    let mut offset: isize = 0;
    for (index, column) in new_columns {
        match index {
            None => columns.push(column),
            Some(index) => {
                if let Some(tree) = tree {
                    while k < siblings.len() && tree.node(siblings[k]).original_index < index {
                        if tree.node(siblings[k]).was_removed {
                            offset -= 1;
                        }
                        k += 1;
                    }
                }
                let at = (index as isize + offset).clamp(0, columns.len() as isize) as usize;
                log::trace!("inserting {}.{} at {at}", parent_path, column.name());
                columns.insert(at, column);
                offset += 1;
            }
        }
    }

    if columns.is_empty() {
        return Ok(Frame::empty(row_count));
    }
    Frame::with_row_count(columns, row_count)
}

/// Original position of `reference`'s ancestor at `depth`, when that ancestor is a direct child
/// of `parent`. A surviving node points right after itself.
fn original_position(
    tree: &ColumnTree,
    reference: NodeId,
    parent: NodeId,
    depth: usize,
) -> Option<usize> {
    let ancestor = tree.node(tree.ancestor_at(reference, depth)?);
    if ancestor.parent != Some(parent) {
        return None;
    }
    Some(if ancestor.was_removed {
        ancestor.original_index
    } else {
        ancestor.original_index + 1
    })
}

/// Replaces the column at `path` with `column`, keeping its position.
pub fn replace_column(frame: &Frame, path: &ColumnPath, column: Column) -> FrameResult<Frame> {
    update_parent(frame, path, |parent, name| {
        let mut columns = parent.columns().to_vec();
        let pos = parent
            .index_of(name)
            .ok_or_else(|| FrameError::ColumnNotFound { path: path.clone() })?;
        columns[pos] = column;
        parent.with_columns(columns)
    })
}

/// Inserts `columns` into the group at `parent` (the frame itself for the root path) starting
/// at `index`.
pub fn insert_at(
    frame: &Frame,
    parent: &ColumnPath,
    index: usize,
    columns: Vec<Column>,
) -> FrameResult<Frame> {
    update_group(frame, parent, |group| {
        let mut existing = group.columns().to_vec();
        let at = index.min(existing.len());
        existing.splice(at..at, columns);
        group.with_columns(existing)
    })
}

/// Rebuilds the group at `path` (or the frame itself for the root path) with `f`.
pub fn update_group(
    frame: &Frame,
    path: &ColumnPath,
    f: impl FnOnce(&Frame) -> FrameResult<Frame>,
) -> FrameResult<Frame> {
    update_nested(frame, path.names(), path, Box::new(f))
}

type GroupUpdate<'a> = Box<dyn FnOnce(&Frame) -> FrameResult<Frame> + 'a>;

fn update_nested(
    frame: &Frame,
    names: &[String],
    path: &ColumnPath,
    f: GroupUpdate<'_>,
) -> FrameResult<Frame> {
    let Some((first, rest)) = names.split_first() else {
        return f(frame);
    };
    let Some(pos) = frame.index_of(first) else {
        return Err(FrameError::ColumnNotFound { path: path.clone() });
    };
    let Column::Group(group) = &frame.columns()[pos] else {
        return Err(FrameError::NotAGroup {
            path: path.take_first(path.len() - rest.len()),
        });
    };
    let rebuilt = Column::group(first.as_str(), update_nested(group.frame(), rest, path, f)?);
    let mut columns = frame.columns().to_vec();
    columns[pos] = rebuilt;
    frame.with_columns(columns)
}

fn update_parent(
    frame: &Frame,
    path: &ColumnPath,
    f: impl FnOnce(&Frame, &str) -> FrameResult<Frame>,
) -> FrameResult<Frame> {
    let (Some(name), Some(parent)) = (path.name(), path.parent()) else {
        return Err(FrameError::ColumnNotFound { path: path.clone() });
    };
    update_group(frame, &parent, |group| f(group, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nested() -> Frame {
        let address = Frame::from_columns(vec![
            Column::values("city", vec!["Oslo"]),
            Column::values("zip", vec![1]),
        ])
        .unwrap();
        Frame::from_columns(vec![
            Column::values("name", vec!["Ann"]),
            Column::group("address", address),
            Column::values("age", vec![3]),
        ])
        .unwrap()
    }

    #[test]
    fn partially_removed_group_survives() {
        let frame = nested();
        let result = remove(&frame, &ColumnSelector::path(["address", "zip"])).unwrap();
        let address = result.tree.find(&ColumnPath::single("address")).unwrap();
        assert!(!result.tree.node(address).was_removed());
        assert_eq!(result.removed.len(), 1);
        assert_eq!(
            result.tree.path(result.removed[0]),
            ColumnPath::from(["address", "zip"])
        );
        assert_eq!(result.frame.column_names(), vec!["name", "address", "age"]);
    }

    #[test]
    fn emptied_group_collapses_and_comes_back() {
        let frame = nested();
        let sel = ColumnSelector::paths([["address", "city"], ["address", "zip"]]);
        let result = remove(&frame, &sel).unwrap();
        assert_eq!(result.frame.column_names(), vec!["name", "age"]);
        let restored = insert(
            Some(&result.frame),
            Some(&result.tree),
            result.reinsertions(),
        )
        .unwrap();
        assert_eq!(restored, frame);
    }

    #[test]
    fn ancestors_are_resolved_by_depth() {
        let frame = nested();
        let result = remove(&frame, &ColumnSelector::path(["address", "zip"])).unwrap();
        let zip = result.removed[0];
        let address = result.tree.ancestor_at(zip, 1).unwrap();
        assert_eq!(result.tree.node(address).name(), "address");
        assert_eq!(result.tree.ancestor_at(zip, 3), None);
    }
}
