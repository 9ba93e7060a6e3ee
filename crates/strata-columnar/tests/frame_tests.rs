use pretty_assertions::assert_eq;
use strata_columnar::{
    infer_element_type, null_column, union_of_frames, Cell, Column, ColumnKind, ColumnPath,
    ColumnSchema, ColumnSelector, ElementType, Frame, FrameError, FrameSchema, Unresolved, Value,
    ValueType,
};

fn people() -> Frame {
    let address = Frame::from_rows(
        &["city", "zip"],
        vec![
            vec!["Oslo".into(), 150.into()],
            vec!["Bergen".into(), Value::Null],
        ],
    )
    .unwrap();
    Frame::from_columns(vec![
        Column::values("name", vec!["Ann", "Bob"]),
        Column::group("address", address),
        Column::values("age", vec![31, 42]),
    ])
    .unwrap()
}

#[test]
fn from_rows_infers_element_types() {
    let frame = Frame::from_rows(
        &["a", "b", "c"],
        vec![
            vec![1.into(), "x".into(), Value::Null],
            vec![2i64.into(), Value::Null, Value::Null],
        ],
    )
    .unwrap();
    let types: Vec<ElementType> = frame
        .columns()
        .iter()
        .map(|c| c.as_value().unwrap().element_type())
        .collect();
    assert_eq!(
        types,
        vec![
            ElementType::not_null(ValueType::Number),
            ElementType::nullable(ValueType::String),
            ElementType::nullable(ValueType::Any),
        ]
    );
}

#[test]
fn from_rows_rejects_ragged_rows() {
    let err = Frame::from_rows(&["a", "b"], vec![vec![1.into()]]).unwrap_err();
    assert!(matches!(err, FrameError::InvalidArgument(_)));
}

#[test]
fn paths_resolve_through_groups() {
    let frame = people();
    let zip = frame.get(&ColumnPath::from(["address", "zip"])).unwrap();
    assert_eq!(zip.kind(), ColumnKind::Value);
    assert_eq!(
        zip.as_value().unwrap().element_type(),
        ElementType::nullable(ValueType::Int)
    );
    assert!(frame.get(&ColumnPath::from(["name", "zip"])).is_none());
    assert!(matches!(
        frame.value_column(&ColumnPath::single("address")),
        Err(FrameError::IncompatibleKind {
            expected: ColumnKind::Value,
            actual: ColumnKind::Group,
            ..
        })
    ));
}

#[test]
fn walk_lists_parents_before_children() {
    let frame = people();
    let paths: Vec<String> = frame.walk().into_iter().map(|(p, _)| p.to_string()).collect();
    assert_eq!(
        paths,
        vec!["name", "address", "address.city", "address.zip", "age"]
    );
}

#[test]
fn rows_expose_nested_cells() {
    let frame = people();
    let row = frame.row(1).unwrap();
    assert_eq!(row.value("name"), Some(&Value::string("Bob")));
    let address = row.get("address").and_then(Cell::as_row).unwrap();
    assert_eq!(address.value("city"), Some(&Value::string("Bergen")));
    assert!(address.get("zip").unwrap().is_null());
    assert_eq!(
        row.get_path(&ColumnPath::from(["address", "city"])),
        Some(&Cell::Value(Value::string("Bergen")))
    );
    assert!(frame.row(2).is_none());
}

#[test]
fn take_reorders_every_column() {
    let frame = people().take(&[1, 0, 1]);
    assert_eq!(frame.row_count(), 3);
    let city = frame.value_column(&ColumnPath::from(["address", "city"])).unwrap();
    assert_eq!(
        city.values(),
        &[
            Value::string("Bergen"),
            Value::string("Oslo"),
            Value::string("Bergen")
        ]
    );
}

#[test]
fn empty_frames_keep_their_row_count() {
    let frame = Frame::empty(3);
    assert!(frame.is_empty());
    assert_eq!(frame.row_count(), 3);
    assert_eq!(frame.rows().count(), 3);
    assert_eq!(Frame::default().row_count(), 0);
}

#[test]
fn with_row_count_validates_lengths() {
    let err = Frame::with_row_count(vec![Column::values("a", vec![1, 2])], 3).unwrap_err();
    assert_eq!(
        err,
        FrameError::RowCountMismatch {
            column: "a".to_string(),
            expected: 3,
            actual: 2
        }
    );
}

#[test]
fn schema_and_union() {
    let a = Frame::from_rows(&["x"], vec![vec![1.into()]]).unwrap();
    let b = Frame::from_rows(&["y"], vec![vec!["s".into()]]).unwrap();
    let union = union_of_frames([&a, &b]);
    assert_eq!(union.names().collect::<Vec<_>>(), vec!["x", "y"]);
    assert_eq!(
        union.get("x"),
        Some(&ColumnSchema::Value(ElementType::nullable(ValueType::Int)))
    );
    assert_eq!(
        a.schema(),
        FrameSchema::default().value("x", ElementType::not_null(ValueType::Int))
    );
}

#[test]
fn null_columns_follow_the_schema() {
    let schema = ColumnSchema::Group(
        FrameSchema::default()
            .value("v", ElementType::not_null(ValueType::Long))
            .frame("f", FrameSchema::default(), true),
    );
    let column = null_column("g", &schema, 2);
    let group = column.as_group().unwrap();
    assert_eq!(group.frame().column_names(), vec!["v", "f"]);
    let v = group.frame().value_column(&"v".into()).unwrap();
    assert_eq!(v.element_type(), ElementType::nullable(ValueType::Long));
    assert!(v.all_null());
    assert!(group.frame().column("f").unwrap().has_nulls());

    let empty = null_column("v", &ColumnSchema::Value(ElementType::not_null(ValueType::Long)), 0);
    assert_eq!(
        empty.schema(),
        ColumnSchema::Value(ElementType::not_null(ValueType::Long))
    );
}

#[test]
fn selectors_combine() {
    let frame = people();
    let selector = ColumnSelector::of_kind(ColumnKind::Value).and(ColumnSelector::children("address"));
    assert_eq!(
        selector.resolve(&frame, Unresolved::Fail).unwrap(),
        vec![
            ColumnPath::single("name"),
            ColumnPath::single("age"),
            ColumnPath::from(["address", "city"]),
            ColumnPath::from(["address", "zip"]),
        ]
    );
    let none = ColumnSelector::of_type(ValueType::Boolean);
    assert!(matches!(
        none.resolve_non_empty(&frame, Unresolved::Fail),
        Err(FrameError::EmptySelection { .. })
    ));
}

#[test]
fn element_type_inference_widens_numbers() {
    let values = vec![Value::Int(1), Value::Double(2.5), Value::Null];
    assert_eq!(
        infer_element_type(&values),
        ElementType::nullable(ValueType::Number)
    );
    let mixed = vec![Value::Int(1), Value::string("a")];
    assert_eq!(infer_element_type(&mixed), ElementType::not_null(ValueType::Any));
}
