//! Restructuring and reshaping of [`strata_columnar`] frames.
//!
//! Everything here is built on two primitives from [`tree`]: [`remove`] takes columns out of a
//! frame while recording where they were, and [`insert`] puts columns back at paths, using those
//! records to keep columns at their original positions. Moving, flattening, splitting, merging,
//! gathering and exploding are all a removal followed by an insertion of rewritten columns.
//!
//! All operations are pure functions from frames to new frames.

pub mod conform;
pub mod explode;
pub mod gather;
pub mod group_by;
pub mod merge;
pub mod moving;
pub mod names;
pub mod pivot;
pub mod records;
pub mod sort;
pub mod split;
pub mod tree;
pub mod types;

pub use conform::{convert_to, ConformanceOptions, ExtraColumns};
pub use explode::{explode, implode};
pub use gather::{gather, Gather};
pub use group_by::{group_by, GroupedFrame, Yielder, GROUPS_COLUMN, VALUE_COLUMN};
pub use merge::{merge, Merge};
pub use moving::{
    flatten, group_columns, move_columns, remove_columns, rename, select, ungroup, FlattenOptions,
    Move,
};
pub use names::NameGenerator;
pub use pivot::{pivot, Pivot, PivotChainElement, PivotColumns};
pub use records::{from_frame, to_frame, IntrospectionOptions};
pub use sort::{sort_by, sort_permutation, NullsOrder, SortDirection, SortKey};
pub use split::{split, Split};
pub use tree::{
    insert, remove, remove_lenient, ColumnToInsert, ColumnTree, NodeId, RemoveResult, TreeNode,
};
pub use types::{
    convert, convert_column, convert_value, parse, parse_as, parse_columns, parse_value_as,
    try_parse_column, ConvertOptions, DateOrder, ParserOptions, ValueLocaleConfig,
};
