use pretty_assertions::assert_eq;
use strata_columnar::{Column, ColumnPath, Frame, FrameError, FrameResult, Value};
use strata_reshape::{gather, group_by, pivot, PivotColumns, Yielder, GROUPS_COLUMN};

fn long_form() -> Frame {
    Frame::from_rows(
        &["name", "key", "value"],
        vec![
            vec!["a".into(), "x".into(), 1.into()],
            vec!["a".into(), "y".into(), 2.into()],
            vec!["b".into(), "x".into(), 3.into()],
        ],
    )
    .unwrap()
}

fn leaf_paths(frame: &Frame) -> Vec<String> {
    frame
        .walk()
        .into_iter()
        .filter(|(_, c)| c.as_group().is_none())
        .map(|(p, _)| p.to_string())
        .collect()
}

#[test]
fn pivot_spreads_values_over_columns() {
    let wide = pivot(&long_form(), "key")
        .group_by("name")
        .values("value")
        .unwrap();
    assert_eq!(wide.column_names(), vec!["name", "x", "y"]);
    assert_eq!(
        wide.value_column(&"x".into()).unwrap().values(),
        &[Value::Int(1), Value::Int(3)]
    );
    assert_eq!(
        wide.value_column(&"y".into()).unwrap().values(),
        &[Value::Int(2), Value::Null]
    );
}

#[test]
fn gather_undoes_pivot() {
    let frame = long_form();
    let wide = pivot(&frame, "key")
        .group_by("name")
        .values("value")
        .unwrap();
    let long = gather(&wide, ["x", "y"])
        .not_null()
        .into("key", "value")
        .unwrap();
    assert_eq!(long, frame);
}

#[test]
fn count_and_matches_fill_absent_combinations() {
    let counts = pivot(&long_form(), "key").group_by("name").count().unwrap();
    assert_eq!(
        counts.value_column(&"y".into()).unwrap().values(),
        &[Value::Int(1), Value::Int(0)]
    );
    let matches = pivot(&long_form(), "key").group_by("name").matches().unwrap();
    assert_eq!(
        matches.value_column(&"y".into()).unwrap().values(),
        &[Value::Boolean(true), Value::Boolean(false)]
    );
}

#[test]
fn pivot_without_keys_has_one_row() {
    let totals = pivot(&long_form(), "name").count().unwrap();
    assert_eq!(totals.row_count(), 1);
    assert_eq!(totals.column_names(), vec!["a", "b"]);
    assert_eq!(
        totals.value_column(&"a".into()).unwrap().values(),
        &[Value::Int(2)]
    );
}

#[test]
fn chained_pivot_columns_nest() {
    let frame = Frame::from_rows(
        &["k", "f", "v"],
        vec![
            vec!["x".into(), "p".into(), 1.into()],
            vec!["x".into(), "q".into(), 2.into()],
            vec!["y".into(), "p".into(), 3.into()],
        ],
    )
    .unwrap();
    let nested = pivot(&frame, PivotColumns::new("k").then("f"))
        .values("v")
        .unwrap();
    assert_eq!(
        leaf_paths(&nested),
        vec!["k.x.f.p", "k.x.f.q", "k.y.f.p"]
    );
    assert_eq!(
        nested
            .value_column(&ColumnPath::from(["k", "x", "f", "q"]))
            .unwrap()
            .values(),
        &[Value::Int(2)]
    );

    let side_by_side = pivot(&frame, PivotColumns::new("k").and("f"))
        .count()
        .unwrap();
    assert_eq!(
        leaf_paths(&side_by_side),
        vec!["k.x", "k.y", "f.p", "f.q"]
    );
    assert_eq!(
        side_by_side
            .value_column(&ColumnPath::from(["f", "p"]))
            .unwrap()
            .values(),
        &[Value::Int(2)]
    );
}

#[test]
fn several_matching_rows_give_a_list() {
    let frame = long_form();
    let wide = pivot(&frame, "key").values("value").unwrap();
    assert_eq!(
        wide.value_column(&"x".into()).unwrap().values(),
        &[Value::list([1, 3])]
    );
}

#[test]
fn named_results_nest_under_the_combination() {
    let frame = long_form();
    let body = |rows: &Frame, y: &mut Yielder| -> FrameResult<()> {
        let values = rows.value_column(&"value".into())?;
        let total: i64 = values.values().iter().filter_map(Value::as_i64).sum();
        y.yield_into("sum", total);
        y.yield_into("n", Value::Int(rows.row_count() as i32));
        Ok(())
    };
    let nested = pivot(&frame, "key").group_by("name").aggregate(body).unwrap();
    assert_eq!(
        leaf_paths(&nested),
        vec!["name", "x.sum", "x.n", "y.sum", "y.n"]
    );
    assert_eq!(
        nested
            .value_column(&ColumnPath::from(["y", "sum"]))
            .unwrap()
            .values(),
        &[Value::Long(2), Value::Null]
    );

    let separate = pivot(&frame, "key")
        .group_by("name")
        .separate(true)
        .aggregate(body)
        .unwrap();
    assert_eq!(
        leaf_paths(&separate),
        vec!["name", "sum.x", "sum.y", "n.x", "n.y"]
    );
}

#[test]
fn grouped_pivot_is_inward_by_default() {
    let grouped = group_by(&long_form(), "name").unwrap();
    let counts = grouped.pivot("key").count().unwrap();
    assert_eq!(leaf_paths(&counts), vec!["name", "key.x", "key.y"]);
    let flat = grouped.pivot("key").inward(false).count().unwrap();
    assert_eq!(flat.column_names(), vec!["name", "x", "y"]);
}

#[test]
fn group_by_keeps_first_seen_key_order() {
    let frame = Frame::from_rows(
        &["k", "v"],
        vec![
            vec!["b".into(), 1.into()],
            vec![Value::Null, 2.into()],
            vec!["a".into(), 3.into()],
            vec!["b".into(), 4.into()],
            vec![Value::Null, 5.into()],
        ],
    )
    .unwrap();
    let grouped = group_by(&frame, "k").unwrap();
    assert_eq!(grouped.len(), 3);
    assert_eq!(
        grouped.keys().value_column(&"k".into()).unwrap().values(),
        &[Value::string("b"), Value::Null, Value::string("a")]
    );
    assert_eq!(
        grouped.groups()[0]
            .value_column(&"v".into())
            .unwrap()
            .values(),
        &[Value::Int(1), Value::Int(4)]
    );
    let counts = grouped.count("n").unwrap();
    assert_eq!(
        counts.value_column(&"n".into()).unwrap().values(),
        &[Value::Int(2), Value::Int(2), Value::Int(1)]
    );
    assert_eq!(grouped.concat().unwrap().row_count(), 5);

    let nested = grouped.into_frame().unwrap();
    assert_eq!(nested.column_names(), vec!["k", GROUPS_COLUMN]);
    assert!(nested.column(GROUPS_COLUMN).and_then(Column::as_frame).is_some());
}

#[test]
fn gather_options() {
    let frame = Frame::from_columns(vec![
        Column::values("id", vec![1, 2]),
        Column::values("q1", vec![Value::list([10, 11]), Value::Null]),
        Column::values("q2", vec![Value::Int(20), Value::Int(21)]),
    ])
    .unwrap();

    let exploded = gather(&frame, ["q1", "q2"])
        .explode(true)
        .not_null()
        .map_keys(|k| Value::string(k.to_uppercase()))
        .into("quarter", "sales")
        .unwrap();
    assert_eq!(
        exploded.value_column(&"quarter".into()).unwrap().values(),
        &[
            Value::string("Q1"),
            Value::string("Q1"),
            Value::string("Q2"),
            Value::string("Q2"),
        ]
    );
    assert_eq!(
        exploded.value_column(&"sales".into()).unwrap().values(),
        &[Value::Int(10), Value::Int(11), Value::Int(20), Value::Int(21)]
    );

    let keys = gather(&frame, ["q1", "q2"]).keys_into("quarter").unwrap();
    assert_eq!(keys.column_names(), vec!["id", "quarter"]);
    assert_eq!(keys.row_count(), 4);

    let values = gather(&frame, ["q2"])
        .map_values(|v| Value::Long(v.as_i64().unwrap_or_default() * 2))
        .values_into("doubled")
        .unwrap();
    assert_eq!(
        values.value_column(&"doubled".into()).unwrap().values(),
        &[Value::Long(40), Value::Long(42)]
    );
}

#[test]
fn gather_needs_columns_of_one_kind() {
    let inner = Frame::from_rows(&["x"], vec![vec![1.into()]]).unwrap();
    let frame = Frame::from_columns(vec![
        Column::values("a", vec![1]),
        Column::group("g", inner),
    ])
    .unwrap();
    let err = gather(&frame, ["a", "g"]).into("k", "v").unwrap_err();
    assert!(matches!(err, FrameError::IncompatibleKind { .. }));
    let err = gather(&frame, ColumnPath::single("nope"))
        .into("k", "v")
        .unwrap_err();
    assert!(matches!(err, FrameError::ColumnNotFound { .. }));
}
