use pretty_assertions::assert_eq;
use regex::Regex;
use strata_columnar::{ColumnPath, Frame, Value};
use strata_reshape::{merge, split};

fn names() -> Frame {
    Frame::from_rows(
        &["id", "name", "age"],
        vec![
            vec![1.into(), "Ada, Lovelace".into(), 36.into()],
            vec![2.into(), "Alan,Turing,M".into(), 41.into()],
        ],
    )
    .unwrap()
}

fn strings(frame: &Frame, path: impl Into<ColumnPath>) -> Vec<Value> {
    frame.value_column(&path.into()).unwrap().values().to_vec()
}

#[test]
fn split_spreads_parts_over_named_columns() {
    let parts = split(&names(), "name").into(&["first", "last"]).unwrap();
    assert_eq!(
        parts.column_names(),
        vec!["id", "first", "last", "split1", "age"]
    );
    assert_eq!(
        strings(&parts, "last"),
        vec![Value::string("Lovelace"), Value::string("Turing")]
    );
    assert_eq!(
        strings(&parts, "split1"),
        vec![Value::Null, Value::string("M")]
    );

    let padded = split(&names(), "name")
        .default("")
        .into(&["first", "last", "initial"])
        .unwrap();
    assert_eq!(
        strings(&padded, "initial"),
        vec![Value::string(""), Value::string("M")]
    );
}

#[test]
fn split_inward_nests_the_parts() {
    let parts = split(&names(), "name").inward(&["first", "last"]).unwrap();
    assert_eq!(parts.column_names(), vec!["id", "name", "age"]);
    assert_eq!(
        strings(&parts, ["name", "first"]),
        vec![Value::string("Ada"), Value::string("Alan")]
    );
    assert_eq!(
        strings(&parts, ["name", "split1"]),
        vec![Value::Null, Value::string("M")]
    );
}

#[test]
fn split_in_place_and_into_rows() {
    let lists = split(&names(), "name").in_place().unwrap();
    assert_eq!(
        strings(&lists, "name"),
        vec![
            Value::list(["Ada", "Lovelace"]),
            Value::list(["Alan", "Turing", "M"])
        ]
    );

    let rows = split(&names(), "name").into_rows().unwrap();
    assert_eq!(rows.row_count(), 5);
    assert_eq!(
        strings(&rows, "id"),
        vec![
            Value::Int(1),
            Value::Int(1),
            Value::Int(2),
            Value::Int(2),
            Value::Int(2)
        ]
    );
    assert_eq!(strings(&rows, "name")[4], Value::string("M"));
}

#[test]
fn split_by_pattern_or_separator() {
    let frame = Frame::from_rows(&["s"], vec![vec!["a  b\tc".into()]]).unwrap();
    let parts = split(&frame, "s")
        .by_regex(Regex::new(r"\s+").unwrap())
        .in_place()
        .unwrap();
    assert_eq!(strings(&parts, "s"), vec![Value::list(["a", "b", "c"])]);

    let frame = Frame::from_rows(&["d"], vec![vec!["2024-01-02".into()]]).unwrap();
    let parts = split(&frame, "d")
        .by_separator("-")
        .into(&["y", "m", "day"])
        .unwrap();
    assert_eq!(parts.column_names(), vec!["y", "m", "day"]);
    assert_eq!(strings(&parts, "m"), vec![Value::string("01")]);
}

#[test]
fn merge_collects_rows_into_lists() {
    let frame = Frame::from_rows(
        &["id", "a", "mid", "b"],
        vec![
            vec![1.into(), 1.into(), "x".into(), 2.into()],
            vec![2.into(), 3.into(), "y".into(), Value::Null],
        ],
    )
    .unwrap();
    let merged = merge(&frame, ["a", "b"]).into("ab").unwrap();
    assert_eq!(merged.column_names(), vec!["id", "ab", "mid"]);
    assert_eq!(
        strings(&merged, "ab"),
        vec![Value::list([1, 2]), Value::list([Value::Int(3), Value::Null])]
    );

    let dense = merge(&frame, ["a", "b"]).not_null().into("ab").unwrap();
    assert_eq!(strings(&dense, "ab")[1], Value::list([3]));

    let nested = merge(&frame, ["a", "b"])
        .by_separator("+")
        .into(["sum", "text"])
        .unwrap();
    assert_eq!(nested.column_names(), vec!["id", "sum", "mid"]);
    assert_eq!(
        strings(&nested, ["sum", "text"]),
        vec![Value::string("1+2"), Value::string("3+null")]
    );

    let listed = merge(&frame, ["a", "b"])
        .by_separator("+")
        .into_list("ab")
        .unwrap();
    assert_eq!(strings(&listed, "ab")[0], Value::list([1, 2]));
}
