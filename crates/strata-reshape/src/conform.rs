//! Schema conformance: reshapes a frame so that it matches a target [`FrameSchema`].

use crate::types::{convert_column, ConvertOptions};
use strata_columnar::{
    null_column, Column, ColumnKind, ColumnPath, ColumnSchema, ElementType, Frame, FrameColumn,
    FrameError, FrameResult, FrameSchema, ValueColumn,
};

/// What to do with columns the target schema does not define.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExtraColumns {
    Remove,
    Keep,
    #[default]
    Fail,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConformanceOptions {
    /// Whether columns may be converted or retagged to their target schema. When `false`, every
    /// present column must already match it exactly.
    pub allow_conversion: bool,
    pub extra_columns: ExtraColumns,
    pub convert: ConvertOptions,
}

impl Default for ConformanceOptions {
    fn default() -> Self {
        Self {
            allow_conversion: true,
            extra_columns: ExtraColumns::default(),
            convert: ConvertOptions::default(),
        }
    }
}

impl ConformanceOptions {
    #[must_use]
    pub fn extra_columns(mut self, extra_columns: ExtraColumns) -> Self {
        self.extra_columns = extra_columns;
        self
    }

    #[must_use]
    pub fn allow_conversion(mut self, allow_conversion: bool) -> Self {
        self.allow_conversion = allow_conversion;
        self
    }
}

/// Conforms `frame` to `schema`.
///
/// Columns keep their order in `frame`; schema columns missing from the frame are filled with
/// nulls and appended when the schema allows it, otherwise they are reported together in
/// [`FrameError::MissingColumns`]. Value columns are converted to their target element type,
/// column groups and frame columns are conformed recursively. Without
/// [`ConformanceOptions::allow_conversion`] any column whose schema differs from its target is a
/// [`FrameError::SchemaMismatch`].
pub fn convert_to(
    frame: &Frame,
    schema: &FrameSchema,
    options: &ConformanceOptions,
) -> FrameResult<Frame> {
    conform_frame(frame, schema, &ColumnPath::root(), options)
}

fn conform_frame(
    frame: &Frame,
    schema: &FrameSchema,
    prefix: &ColumnPath,
    options: &ConformanceOptions,
) -> FrameResult<Frame> {
    let mut columns = Vec::with_capacity(schema.len());
    let mut seen = vec![false; schema.len()];
    for column in frame.columns() {
        let path = prefix.child(column.name());
        match schema
            .iter()
            .enumerate()
            .find(|(_, (name, _))| name == column.name())
        {
            Some((index, (_, target))) => {
                seen[index] = true;
                columns.push(conform_column(column, target, &path, options)?);
            }
            None => match options.extra_columns {
                ExtraColumns::Fail => return Err(FrameError::UnexpectedColumn { path }),
                ExtraColumns::Remove => log::trace!("dropping column {path}"),
                ExtraColumns::Keep => columns.push(column.clone()),
            },
        }
    }

    let mut missing = Vec::new();
    for ((name, target), seen) in schema.iter().zip(seen) {
        if seen {
            continue;
        }
        if target.is_nullable() || frame.row_count() == 0 {
            log::debug!("filling missing column {} with nulls", prefix.child(name.as_str()));
            columns.push(null_column(name, target, frame.row_count()));
        } else {
            missing.push(prefix.child(name.as_str()));
        }
    }
    if !missing.is_empty() {
        return Err(FrameError::MissingColumns { paths: missing });
    }
    frame.with_columns(columns)
}

fn conform_column(
    column: &Column,
    target: &ColumnSchema,
    path: &ColumnPath,
    options: &ConformanceOptions,
) -> FrameResult<Column> {
    if column.schema() == *target {
        return Ok(column.clone());
    }
    if !options.allow_conversion {
        return Err(mismatch(column, target, path));
    }
    match (column, target) {
        (Column::Value(values), ColumnSchema::Value(element_type)) => Ok(Column::Value(
            conform_values(values, *element_type, path, options)?,
        )),
        (Column::Group(group), ColumnSchema::Group(schema)) => Ok(Column::group(
            group.name(),
            conform_frame(group.frame(), schema, path, options)?,
        )),
        (Column::Frame(frames), ColumnSchema::Frame { schema, nullable }) => {
            if frames.has_nulls() && !nullable {
                return Err(mismatch(column, target, path));
            }
            let conformed = frames
                .frames()
                .iter()
                .map(|f| {
                    f.as_ref()
                        .map(|f| conform_frame(f, schema, path, options))
                        .transpose()
                })
                .collect::<FrameResult<Vec<_>>>()?;
            Ok(Column::Frame(FrameColumn::new(frames.name(), conformed)))
        }
        (Column::Value(values), ColumnSchema::Group(schema)) if values.all_null() => {
            let empty = Frame::empty(values.len());
            Ok(Column::group(
                values.name(),
                conform_frame(&empty, schema, path, options)?,
            ))
        }
        (Column::Value(values), ColumnSchema::Frame { schema, .. }) if values.all_null() => {
            let empty = conform_frame(&Frame::empty(0), schema, path, options)?;
            Ok(Column::frames(values.name(), vec![Some(empty); values.len()]))
        }
        (Column::Group(group), ColumnSchema::Frame { schema, .. }) => {
            let rows = (0..group.len())
                .map(|row| {
                    conform_frame(&group.frame().take(&[row]), schema, path, options).map(Some)
                })
                .collect::<FrameResult<Vec<_>>>()?;
            Ok(Column::frames(group.name(), rows))
        }
        _ => Err(FrameError::IncompatibleKind {
            path: path.clone(),
            expected: target.kind(),
            actual: column.kind(),
        }),
    }
}

fn conform_values(
    values: &ValueColumn,
    target: ElementType,
    path: &ColumnPath,
    options: &ConformanceOptions,
) -> FrameResult<ValueColumn> {
    if values.has_nulls() && !target.nullable {
        return Err(FrameError::NullsNotAllowed {
            path: path.clone(),
            to: target.value_type,
        });
    }
    let source = values.element_type().value_type;
    if source == target.value_type || target.value_type.accepts(source) {
        return Ok(values.with_element_type(target));
    }
    let converted = convert_column(values, path, target, &options.convert)?;
    if converted.has_nulls() && !target.nullable {
        return Err(FrameError::NullsNotAllowed {
            path: path.clone(),
            to: target.value_type,
        });
    }
    Ok(converted.with_element_type(target))
}

fn mismatch(column: &Column, target: &ColumnSchema, path: &ColumnPath) -> FrameError {
    FrameError::SchemaMismatch {
        path: path.clone(),
        expected: describe(target),
        actual: describe(&column.schema()),
    }
}

fn describe(schema: &ColumnSchema) -> String {
    match schema {
        ColumnSchema::Value(element_type) => element_type.to_string(),
        ColumnSchema::Group(_) => ColumnKind::Group.to_string(),
        ColumnSchema::Frame { nullable: true, .. } => format!("{}?", ColumnKind::Frame),
        ColumnSchema::Frame { .. } => ColumnKind::Frame.to_string(),
    }
}
