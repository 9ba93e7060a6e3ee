use crate::group_by::partition;
use crate::tree::{insert, remove_paths, ColumnToInsert};
use strata_columnar::{
    Column, ColumnPath, ColumnSelector, Frame, FrameColumn, FrameResult, Unresolved, Value,
    ValueColumn,
};

/// Selected paths with column groups replaced by their value and frame descendants.
fn leaf_paths(frame: &Frame, selector: &ColumnSelector) -> FrameResult<Vec<ColumnPath>> {
    let mut out = Vec::new();
    for path in selector.resolve(frame, Unresolved::Fail)? {
        match frame.try_get(&path)? {
            Column::Group(group) => out.extend(
                group
                    .frame()
                    .walk()
                    .into_iter()
                    .filter(|(_, c)| !matches!(c, Column::Group(_)))
                    .map(|(p, _)| path.concat(&p)),
            ),
            _ => out.push(path),
        }
    }
    Ok(out)
}

fn cell_len(column: &Column, row: usize) -> usize {
    match column {
        Column::Value(c) => match &c.values()[row] {
            Value::List(items) => items.len(),
            _ => 1,
        },
        Column::Frame(c) => c.get(row).map_or(0, Frame::row_count),
        Column::Group(_) => 1,
    }
}

/// Spreads list values and nested frames of the selected columns over several rows.
///
/// Every row is repeated as many times as its longest selected cell has elements; other selected
/// cells are padded with nulls. With `drop_empty`, rows whose selected cells are all empty are
/// dropped; otherwise they are kept once with nulls. Frame columns become column groups.
pub fn explode(
    frame: &Frame,
    columns: impl Into<ColumnSelector>,
    drop_empty: bool,
) -> FrameResult<Frame> {
    let paths = leaf_paths(frame, &columns.into())?;
    if paths.is_empty() {
        return Ok(frame.clone());
    }
    let removal = remove_paths(frame, &paths)?;
    let exploded: Vec<(ColumnPath, &Column)> = removal.removed_columns().collect();

    let mut factors = Vec::with_capacity(frame.row_count());
    for row in 0..frame.row_count() {
        let factor = exploded
            .iter()
            .map(|(_, c)| cell_len(c, row))
            .max()
            .unwrap_or(1);
        factors.push(if factor == 0 && !drop_empty { 1 } else { factor });
    }

    let source_rows: Vec<usize> = factors
        .iter()
        .enumerate()
        .flat_map(|(row, &factor)| std::iter::repeat(row).take(factor))
        .collect();
    let residual = removal.frame.take(&source_rows);

    let mut requests = Vec::with_capacity(exploded.len());
    for (&id, (path, column)) in removal.removed.iter().zip(&exploded) {
        let name = path.name().unwrap_or_default();
        let column = match column {
            Column::Value(c) => Column::Value(explode_values(c, name, &factors)),
            Column::Frame(c) => explode_frames(c, name, &factors)?,
            Column::Group(_) => (*column).clone(),
        };
        requests.push(ColumnToInsert::new(path.clone(), column).with_reference(id));
    }
    insert(Some(&residual), Some(&removal.tree), requests)
}

fn explode_values(column: &ValueColumn, name: &str, factors: &[usize]) -> ValueColumn {
    let mut values = Vec::with_capacity(factors.iter().sum());
    for (value, &factor) in column.values().iter().zip(factors) {
        let items: &[Value] = match value {
            Value::List(items) => items,
            other => std::slice::from_ref(other),
        };
        values.extend(items.iter().take(factor).cloned());
        values.extend(std::iter::repeat(Value::Null).take(factor.saturating_sub(items.len())));
    }
    ValueColumn::infer(name, values)
}

fn explode_frames(column: &FrameColumn, name: &str, factors: &[usize]) -> FrameResult<Column> {
    let stacked = Frame::concat(column.frames().iter().flatten())?;
    let mut offset = 0;
    let mut indices = Vec::with_capacity(factors.iter().sum());
    for (frame, &factor) in column.frames().iter().zip(factors) {
        let rows = frame.as_ref().map_or(0, Frame::row_count);
        for i in 0..factor {
            indices.push((i < rows).then_some(offset + i));
        }
        offset += rows;
    }
    Ok(Column::group(name, stacked.take_opt(&indices)))
}

/// Collapses rows that agree on every non-selected column into one row; the selected columns
/// then hold, per group, the list of their values (value columns) or the stacked rows (column
/// groups and frame columns).
pub fn implode(
    frame: &Frame,
    columns: impl Into<ColumnSelector>,
    drop_nulls: bool,
) -> FrameResult<Frame> {
    let paths = columns.into().resolve(frame, Unresolved::Fail)?;
    if paths.is_empty() {
        return Ok(frame.clone());
    }
    let removal = remove_paths(frame, &paths)?;
    let residual_paths: Vec<ColumnPath> = removal
        .frame
        .columns()
        .iter()
        .map(|c| ColumnPath::single(c.name()))
        .collect();
    let groups = partition(&removal.frame, &residual_paths)?;
    let residual = removal.frame.take(&groups.first_rows);

    let mut requests = Vec::new();
    for (&id, (path, column)) in removal.removed.iter().zip(removal.removed_columns()) {
        let name = path.name().unwrap_or_default();
        let column = match column {
            Column::Value(c) => {
                let lists = groups
                    .rows
                    .iter()
                    .map(|rows| {
                        Value::list(
                            rows.iter()
                                .map(|&r| c.values()[r].clone())
                                .filter(|v| !(drop_nulls && v.is_null())),
                        )
                    })
                    .collect();
                Column::Value(ValueColumn::infer(name, lists))
            }
            Column::Group(g) => Column::frames(
                name,
                groups
                    .rows
                    .iter()
                    .map(|rows| Some(g.frame().take(rows)))
                    .collect(),
            ),
            Column::Frame(c) => Column::frames(
                name,
                groups
                    .rows
                    .iter()
                    .map(|rows| Frame::concat(rows.iter().filter_map(|&r| c.get(r))).map(Some))
                    .collect::<FrameResult<Vec<_>>>()?,
            ),
        };
        requests.push(ColumnToInsert::new(path, column).with_reference(id));
    }
    insert(Some(&residual), Some(&removal.tree), requests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn frame_columns_explode_into_groups() {
        let a = Frame::from_rows(&["x"], vec![vec![1.into()], vec![2.into()]]).unwrap();
        let frame = Frame::from_columns(vec![
            Column::values("id", vec![1, 2]),
            Column::frames("nested", vec![Some(a), None]),
        ])
        .unwrap();
        let exploded = explode(&frame, "nested", false).unwrap();
        assert_eq!(exploded.row_count(), 3);
        let x = exploded.get(&ColumnPath::from(["nested", "x"])).unwrap();
        assert_eq!(
            x.as_value().unwrap().values(),
            &[Value::Int(1), Value::Int(2), Value::Null]
        );
        let dropped = explode(&frame, "nested", true).unwrap();
        assert_eq!(dropped.row_count(), 2);
    }
}
