//! Immutable nested columnar frames.
//!
//! A [`Frame`] is an ordered list of equally sized [`Column`]s. A column is one of:
//! - a [`ValueColumn`] of scalar [`Value`]s tagged with an [`ElementType`],
//! - a [`GroupColumn`] wrapping a nested frame with the same row count,
//! - a [`FrameColumn`] holding an independent, possibly null, frame per row.
//!
//! Columns are addressed through nested groups by [`ColumnPath`] and selected with
//! [`ColumnSelector`] expressions. Frames are values: every operation builds a new frame and
//! payloads are shared behind `Arc`s, so frames are cheap to clone and safe to share between
//! threads.

mod column;
mod decimal;
mod error;
mod frame;
mod path;
mod row;
mod schema;
mod selector;
mod types;
mod value;

pub use column::{infer_element_type, Column, ColumnKind, FrameColumn, GroupColumn, ValueColumn};
pub use decimal::{Decimal, DecimalError};
pub use error::{FrameError, FrameResult};
pub use frame::{null_column, Frame};
pub use path::ColumnPath;
pub use row::{Cell, Row};
pub use schema::{union_of_frames, ColumnSchema, FrameSchema};
pub use selector::{ColumnFilter, ColumnSelector, Unresolved};
pub use types::{ElementType, ValueType};
pub use value::{compare_values, Value};
