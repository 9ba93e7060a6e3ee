use std::cmp::Ordering;
use strata_columnar::{compare_values, Column, ColumnPath, Frame, FrameError, FrameResult, Value};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NullsOrder {
    First,
    Last,
}

/// One sort criterion. Without an explicit [`NullsOrder`], nulls come first when ascending and
/// last when descending, i.e. they sort as the smallest value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SortKey {
    pub path: ColumnPath,
    pub direction: SortDirection,
    pub nulls: Option<NullsOrder>,
}

impl SortKey {
    pub fn asc(path: impl Into<ColumnPath>) -> Self {
        Self {
            path: path.into(),
            direction: SortDirection::Ascending,
            nulls: None,
        }
    }

    pub fn desc(path: impl Into<ColumnPath>) -> Self {
        Self {
            path: path.into(),
            direction: SortDirection::Descending,
            nulls: None,
        }
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullsOrder::First);
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullsOrder::Last);
        self
    }

    fn nulls_order(&self) -> NullsOrder {
        self.nulls.unwrap_or(match self.direction {
            SortDirection::Ascending => NullsOrder::First,
            SortDirection::Descending => NullsOrder::Last,
        })
    }
}

impl From<&str> for SortKey {
    fn from(name: &str) -> Self {
        SortKey::asc(name)
    }
}

/// Compares two values of one key. Null placement does not depend on the direction.
fn compare_for_key(left: &Value, right: &Value, key: &SortKey) -> Ordering {
    match (left.is_null(), right.is_null(), key.nulls_order()) {
        (true, true, _) => return Ordering::Equal,
        (true, false, NullsOrder::First) | (false, true, NullsOrder::Last) => {
            return Ordering::Less
        }
        (true, false, NullsOrder::Last) | (false, true, NullsOrder::First) => {
            return Ordering::Greater
        }
        _ => {}
    }
    match key.direction {
        SortDirection::Ascending => compare_values(left, right),
        SortDirection::Descending => compare_values(left, right).reverse(),
    }
}

fn key_columns<'a>(frame: &'a Frame, keys: &[SortKey]) -> FrameResult<Vec<&'a [Value]>> {
    keys.iter()
        .map(|key| match frame.try_get(&key.path)? {
            Column::Value(column) => Ok(column.values()),
            _ => Err(FrameError::UnsortableColumn {
                path: key.path.clone(),
            }),
        })
        .collect()
}

/// Row order sorting `frame` by `keys`, first key first. Rows that compare equal on every key
/// keep their original order.
pub fn sort_permutation(frame: &Frame, keys: &[SortKey]) -> FrameResult<Vec<usize>> {
    let columns = key_columns(frame, keys)?;
    let mut order: Vec<usize> = (0..frame.row_count()).collect();
    order.sort_by(|&a, &b| {
        for (key, values) in keys.iter().zip(&columns) {
            let ord = compare_for_key(&values[a], &values[b], key);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
    Ok(order)
}

/// Stable sort of the rows of `frame`.
pub fn sort_by(frame: &Frame, keys: &[SortKey]) -> FrameResult<Frame> {
    if keys.is_empty() {
        return Ok(frame.clone());
    }
    let order = sort_permutation(frame, keys)?;
    log::trace!("sorted {} rows on {} keys", order.len(), keys.len());
    Ok(frame.take(&order))
}
