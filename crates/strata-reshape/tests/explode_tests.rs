use pretty_assertions::assert_eq;
use strata_columnar::{Column, ColumnPath, ElementType, Frame, Value, ValueType};
use strata_reshape::{explode, implode};

fn lists() -> Frame {
    Frame::from_columns(vec![
        Column::values("a", vec![1, 2]),
        Column::values("b", vec![Value::list([1, 2]), Value::list([3, 4])]),
    ])
    .unwrap()
}

#[test]
fn explode_repeats_rows_per_list_element() {
    let exploded = explode(&lists(), "b", false).unwrap();
    let expected = Frame::from_rows(
        &["a", "b"],
        vec![
            vec![1.into(), 1.into()],
            vec![1.into(), 2.into()],
            vec![2.into(), 3.into()],
            vec![2.into(), 4.into()],
        ],
    )
    .unwrap();
    assert_eq!(exploded, expected);
}

#[test]
fn implode_reverses_explode() {
    let frame = lists();
    let exploded = explode(&frame, "b", false).unwrap();
    assert_eq!(implode(&exploded, "b", false).unwrap(), frame);
}

#[test]
fn shorter_lists_are_padded_with_nulls() {
    let frame = Frame::from_columns(vec![
        Column::values("id", vec![1]),
        Column::values("x", vec![Value::list([1, 2, 3])]),
        Column::values("y", vec![Value::list(["a"])]),
    ])
    .unwrap();
    let exploded = explode(&frame, ["x", "y"], false).unwrap();
    assert_eq!(exploded.row_count(), 3);
    let y = exploded.value_column(&"y".into()).unwrap();
    assert_eq!(
        y.values(),
        &[Value::string("a"), Value::Null, Value::Null]
    );
    assert_eq!(y.element_type(), ElementType::nullable(ValueType::String));
    assert_eq!(exploded.column_names(), vec!["id", "x", "y"]);
}

#[test]
fn empty_lists_are_kept_or_dropped() {
    let frame = Frame::from_columns(vec![
        Column::values("id", vec![1, 2, 3]),
        Column::values(
            "tags",
            vec![Value::list(["x"]), Value::list(Vec::<Value>::new()), Value::Null],
        ),
    ])
    .unwrap();

    let kept = explode(&frame, "tags", false).unwrap();
    assert_eq!(
        kept.value_column(&"id".into()).unwrap().values(),
        &[Value::Int(1), Value::Int(2), Value::Int(3)]
    );
    assert_eq!(
        kept.value_column(&"tags".into()).unwrap().values(),
        &[Value::string("x"), Value::Null, Value::Null]
    );

    let dropped = explode(&frame, "tags", true).unwrap();
    assert_eq!(
        dropped.value_column(&"id".into()).unwrap().values(),
        &[Value::Int(1), Value::Int(3)]
    );
}

#[test]
fn exploding_a_group_explodes_its_leaves() {
    let point = Frame::from_columns(vec![
        Column::values("x", vec![Value::list([1, 2])]),
        Column::values("y", vec![Value::list([3])]),
    ])
    .unwrap();
    let frame = Frame::from_columns(vec![
        Column::values("id", vec![7]),
        Column::group("point", point),
    ])
    .unwrap();
    let exploded = explode(&frame, "point", false).unwrap();
    assert_eq!(exploded.row_count(), 2);
    assert_eq!(exploded.column_names(), vec!["id", "point"]);
    let y = exploded
        .value_column(&ColumnPath::from(["point", "y"]))
        .unwrap();
    assert_eq!(y.values(), &[Value::Int(3), Value::Null]);
}

#[test]
fn implode_collects_groups_into_frames() {
    let detail = Frame::from_rows(
        &["qty"],
        vec![vec![1.into()], vec![2.into()], vec![5.into()]],
    )
    .unwrap();
    let frame = Frame::from_columns(vec![
        Column::values("order", vec!["a", "a", "b"]),
        Column::group("detail", detail),
    ])
    .unwrap();
    let imploded = implode(&frame, "detail", false).unwrap();
    assert_eq!(imploded.row_count(), 2);
    let details = imploded.get(&"detail".into()).and_then(Column::as_frame).unwrap();
    let first = details.get(0).unwrap();
    assert_eq!(
        first.value_column(&"qty".into()).unwrap().values(),
        &[Value::Int(1), Value::Int(2)]
    );
    assert_eq!(details.get(1).unwrap().row_count(), 1);
}

#[test]
fn implode_can_drop_nulls() {
    let frame = Frame::from_rows(
        &["k", "v"],
        vec![
            vec!["a".into(), 1.into()],
            vec!["a".into(), Value::Null],
            vec!["b".into(), Value::Null],
        ],
    )
    .unwrap();
    let imploded = implode(&frame, "v", true).unwrap();
    assert_eq!(
        imploded.value_column(&"v".into()).unwrap().values(),
        &[Value::list([1]), Value::list(Vec::<Value>::new())]
    );
}
