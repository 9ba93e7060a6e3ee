use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use strata_columnar::{
    Column, ColumnPath, ColumnSchema, ElementType, Frame, FrameError, FrameSchema, Value,
    ValueColumn, ValueType,
};
use strata_reshape::{convert, convert_to, ConformanceOptions, ConvertOptions, ExtraColumns};

fn orders() -> Frame {
    Frame::from_columns(vec![
        Column::values("extra", vec![true, false]),
        Column::values("id", vec![1, 2]),
        Column::values("placed", vec!["2024-01-02", "2024-02-03"]),
    ])
    .unwrap()
}

fn target() -> FrameSchema {
    FrameSchema::default()
        .value("id", ElementType::not_null(ValueType::Long))
        .value("placed", ElementType::not_null(ValueType::Date))
}

#[test]
fn extra_columns_fail_by_default() {
    let err = convert_to(&orders(), &target(), &ConformanceOptions::default()).unwrap_err();
    assert_eq!(
        err,
        FrameError::UnexpectedColumn {
            path: ColumnPath::single("extra")
        }
    );
}

#[test]
fn conformed_frames_keep_the_source_order() {
    let options = ConformanceOptions::default().extra_columns(ExtraColumns::Remove);
    let conformed = convert_to(&orders(), &target(), &options).unwrap();
    assert_eq!(conformed.schema(), target());
    assert_eq!(
        conformed.value_column(&"placed".into()).unwrap().values()[1],
        Value::Date(NaiveDate::from_ymd_opt(2024, 2, 3).unwrap())
    );

    let options = ConformanceOptions::default().extra_columns(ExtraColumns::Keep);
    let kept = convert_to(&orders(), &target(), &options).unwrap();
    assert_eq!(kept.column_names(), vec!["extra", "id", "placed"]);

    let reversed = Frame::from_columns(vec![
        Column::values("placed", vec!["2024-01-02"]),
        Column::values("id", vec![1]),
    ])
    .unwrap();
    let schema = target().value("note", ElementType::nullable(ValueType::String));
    let conformed = convert_to(&reversed, &schema, &ConformanceOptions::default()).unwrap();
    assert_eq!(conformed.column_names(), vec!["placed", "id", "note"]);
}

#[test]
fn missing_nullable_columns_are_filled_with_nulls() {
    let schema = target().value("note", ElementType::nullable(ValueType::String));
    let options = ConformanceOptions::default().extra_columns(ExtraColumns::Remove);
    let conformed = convert_to(&orders(), &schema, &options).unwrap();
    let note = conformed.value_column(&"note".into()).unwrap();
    assert!(note.all_null());
    assert_eq!(note.element_type(), ElementType::nullable(ValueType::String));
}

#[test]
fn missing_required_columns_are_reported_together() {
    let schema = target()
        .value("total", ElementType::not_null(ValueType::Double))
        .value("owner", ElementType::not_null(ValueType::String));
    let options = ConformanceOptions::default().extra_columns(ExtraColumns::Remove);
    let err = convert_to(&orders(), &schema, &options).unwrap_err();
    assert_eq!(
        err,
        FrameError::MissingColumns {
            paths: vec![ColumnPath::single("total"), ColumnPath::single("owner")]
        }
    );

    let empty = orders().take(&[]);
    let conformed = convert_to(&empty, &schema, &options).unwrap();
    assert_eq!(conformed.schema(), schema);
}

#[test]
fn nulls_need_a_nullable_target() {
    let frame = Frame::from_rows(&["id"], vec![vec![1.into()], vec![Value::Null]]).unwrap();
    let schema = FrameSchema::default().value("id", ElementType::not_null(ValueType::Int));
    let err = convert_to(&frame, &schema, &ConformanceOptions::default()).unwrap_err();
    assert_eq!(
        err,
        FrameError::NullsNotAllowed {
            path: ColumnPath::single("id"),
            to: ValueType::Int
        }
    );

    let schema = FrameSchema::default().value("id", ElementType::nullable(ValueType::Int));
    let conformed = convert_to(&frame, &schema, &ConformanceOptions::default()).unwrap();
    assert_eq!(conformed.schema(), schema);
}

#[test]
fn conversion_can_be_disallowed() {
    let frame = Frame::from_rows(&["id"], vec![vec![1.into()]]).unwrap();
    let options = ConformanceOptions::default().allow_conversion(false);
    for target in [
        ElementType::not_null(ValueType::Long),
        ElementType::nullable(ValueType::Int),
        ElementType::nullable(ValueType::Number),
    ] {
        let schema = FrameSchema::default().value("id", target);
        let err = convert_to(&frame, &schema, &options).unwrap_err();
        assert!(matches!(err, FrameError::SchemaMismatch { .. }));
    }

    let exact = FrameSchema::default().value("id", ElementType::not_null(ValueType::Int));
    assert_eq!(convert_to(&frame, &exact, &options).unwrap(), frame);

    let point = Frame::from_rows(&["x"], vec![vec![1.into()]]).unwrap();
    let nested = Frame::from_columns(vec![Column::group("point", point)]).unwrap();
    let schema = FrameSchema::default().group(
        "point",
        FrameSchema::default().value("x", ElementType::not_null(ValueType::Double)),
    );
    assert!(matches!(
        convert_to(&nested, &schema, &options),
        Err(FrameError::SchemaMismatch { .. })
    ));
}

#[test]
fn groups_and_frame_columns_conform_recursively() {
    let point = Frame::from_rows(&["x"], vec![vec![1.into()], vec![2.into()]]).unwrap();
    let items = Frame::from_rows(&["qty"], vec![vec!["3".into()]]).unwrap();
    let frame = Frame::from_columns(vec![
        Column::group("point", point),
        Column::frames("items", vec![Some(items), None]),
        Column::values("meta", vec![Value::Null, Value::Null]),
    ])
    .unwrap();
    let item_schema = FrameSchema::default().value("qty", ElementType::not_null(ValueType::Int));
    let schema = FrameSchema::default()
        .group(
            "point",
            FrameSchema::default()
                .value("x", ElementType::not_null(ValueType::Double))
                .value("y", ElementType::nullable(ValueType::Double)),
        )
        .frame("items", item_schema.clone(), true)
        .group(
            "meta",
            FrameSchema::default().value("tag", ElementType::nullable(ValueType::String)),
        );
    let conformed = convert_to(&frame, &schema, &ConformanceOptions::default()).unwrap();
    assert_eq!(
        conformed
            .value_column(&ColumnPath::from(["point", "x"]))
            .unwrap()
            .values(),
        &[Value::Double(1.0), Value::Double(2.0)]
    );
    let items = conformed.get(&"items".into()).and_then(Column::as_frame).unwrap();
    assert_eq!(items.get(0).unwrap().schema(), item_schema);
    assert!(items.get(1).is_none());
    assert!(conformed
        .value_column(&ColumnPath::from(["meta", "tag"]))
        .unwrap()
        .all_null());

    let required = FrameSchema::default().frame("items", item_schema, false);
    let options = ConformanceOptions::default().extra_columns(ExtraColumns::Remove);
    assert!(matches!(
        convert_to(&frame, &required, &options),
        Err(FrameError::SchemaMismatch { .. })
    ));
}

#[test]
fn kinds_must_be_compatible() {
    let frame = Frame::from_rows(&["v"], vec![vec![1.into()]]).unwrap();
    let schema = FrameSchema::default().group("v", FrameSchema::default());
    assert!(matches!(
        convert_to(&frame, &schema, &ConformanceOptions::default()),
        Err(FrameError::IncompatibleKind { .. })
    ));
}

#[test]
fn convert_reports_the_failing_value() {
    let frame = Frame::from_rows(&["n"], vec![vec![1i64.into()], vec![i64::MAX.into()]]).unwrap();
    let err = convert(
        &frame,
        "n",
        ElementType::not_null(ValueType::Int),
        &ConvertOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        FrameError::ConversionFailed { ref path, to: ValueType::Int, .. } if *path == ColumnPath::single("n")
    ));

    let flags = Frame::from_rows(&["f"], vec![vec![true.into()]]).unwrap();
    let err = convert(
        &flags,
        "f",
        ElementType::not_null(ValueType::Date),
        &ConvertOptions::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        FrameError::ConverterNotFound {
            path: ColumnPath::single("f"),
            from: ValueType::Boolean,
            to: ValueType::Date
        }
    );
}

#[test]
fn convert_keeps_nulls_and_marks_them() {
    let frame = Frame::from_rows(&["s"], vec![vec!["1.5".into()], vec![Value::Null]]).unwrap();
    let converted = convert(
        &frame,
        "s",
        ElementType::not_null(ValueType::Double),
        &ConvertOptions::default(),
    )
    .unwrap();
    let column = converted.value_column(&"s".into()).unwrap();
    assert_eq!(column.element_type(), ElementType::nullable(ValueType::Double));
    assert_eq!(column.values(), &[Value::Double(1.5), Value::Null]);
    assert_eq!(
        converted.schema().get("s"),
        Some(&ColumnSchema::Value(ElementType::nullable(ValueType::Double)))
    );
}

#[test]
fn convert_keeps_declared_nullability() {
    let declared = ValueColumn::new("n", ElementType::nullable(ValueType::Int), vec![Value::Int(1)]);
    let frame = Frame::from_columns(vec![Column::Value(declared)]).unwrap();
    let converted = convert(
        &frame,
        "n",
        ElementType::not_null(ValueType::Long),
        &ConvertOptions::default(),
    )
    .unwrap();
    let column = converted.value_column(&"n".into()).unwrap();
    assert_eq!(column.element_type(), ElementType::nullable(ValueType::Long));
    assert_eq!(column.values(), &[Value::Long(1)]);
}
