mod common;

use arrow_ilp::arrow_array::{
    BooleanArray, DictionaryArray, Float32Array, Float64Array, Int8Array, Int64Array,
    ListArray, StringArray, TimestampNanosecondArray, UInt32Array,
    types::{Float64Type, Int32Type},
};
use arrow_ilp::{CellError, ErrorCode, prelude::*};
use common::{arr, encode, render, table};

fn weather() -> Batch {
    let city: DictionaryArray<Int32Type> = vec!["London", "Paris", "London"].into_iter().collect();
    Batch::try_new(vec![
        InputColumn::new("city", arr(city)),
        InputColumn::new(
            "temp",
            arr(Float64Array::from(vec![Some(12.5), Some(8.0), None])),
        ),
    ])
    .unwrap()
    .with_name("weather")
}

#[test]
fn symbols_precede_fields_and_nulls_are_skipped() {
    let text = render(
        &TableSpec::BatchName,
        &SymbolsSpec::Columns(vec!["city".into()]),
        &AtSpec::Server,
        &weather(),
    )
    .unwrap();
    assert_eq!(
        text,
        "weather,city=London temp=12.5\n\
         weather,city=Paris temp=8.0\n\
         weather,city=London\n"
    );
    for line in text.lines() {
        let symbol = line.find("city=").unwrap();
        if let Some(field) = line.find("temp=") {
            assert!(symbol < field, "{line}");
        }
    }
}

#[test]
fn every_scalar_field_type() {
    let batch = Batch::try_new(vec![
        InputColumn::new("b", arr(BooleanArray::from(vec![true, false]))),
        InputColumn::new("i", arr(Int8Array::from(vec![-3, 4]))),
        InputColumn::new("u", arr(UInt32Array::from(vec![7, u32::MAX]))),
        InputColumn::new("f", arr(Float32Array::from(vec![0.5, -2.0]))),
        InputColumn::new("s", arr(StringArray::from(vec!["hi", "say \"x\""]))),
        InputColumn::new(
            "ts",
            arr(TimestampNanosecondArray::from(vec![1_000, 2_500_000])),
        ),
    ])
    .unwrap();
    let text = render(&table("t"), &SymbolsSpec::None, &AtSpec::Fixed(1_000), &batch).unwrap();
    assert_eq!(
        text,
        "t b=t,i=-3i,u=7i,f=0.5,s=\"hi\",ts=1t 1000\n\
         t b=f,i=4i,u=4294967295i,f=-2.0,s=\"say \\\"x\\\"\",ts=2500t 1000\n"
    );
}

#[test]
fn unquoted_values_are_escaped() {
    let batch = Batch::try_new(vec![
        InputColumn::new("place", arr(StringArray::from(vec!["New York, NY"]))),
        InputColumn::new("v", arr(Int64Array::from(vec![1]))),
    ])
    .unwrap();
    let text = render(&table("my table"), &SymbolsSpec::All, &AtSpec::Server, &batch).unwrap();
    assert_eq!(text, "my\\ table,place=New\\ York\\,\\ NY v=1i\n");
}

#[test]
fn table_name_from_column() {
    let batch = Batch::try_new(vec![
        InputColumn::new("dest", arr(StringArray::from(vec!["a", "b", "a"]))),
        InputColumn::new("v", arr(Int64Array::from(vec![1, 2, 3]))),
    ])
    .unwrap();
    let text = render(
        &TableSpec::Column(ColumnRef::Index(0)),
        &SymbolsSpec::Auto,
        &AtSpec::Server,
        &batch,
    )
    .unwrap();
    assert_eq!(text, "a v=1i\nb v=2i\na v=3i\n");
}

#[test]
fn invalid_table_name_in_column_is_a_cell_error() {
    let batch = Batch::try_new(vec![
        InputColumn::new("dest", arr(StringArray::from(vec!["ok", "not/ok"]))),
        InputColumn::new("v", arr(Int64Array::from(vec![1, 2]))),
    ])
    .unwrap();
    let mut buf = Buffer::new(ProtocolVersion::V1);
    let err = encode(
        &mut buf,
        &TableSpec::Column("dest".into()),
        &SymbolsSpec::Auto,
        &AtSpec::Server,
        &batch,
    )
    .unwrap_err();
    match err {
        EncodeError::Cell { column, row, value, .. } => {
            assert_eq!(column, "dest");
            assert_eq!(row, 1);
            assert_eq!(value, "'not/ok'");
        }
        other => panic!("expected a cell error, got {other:?}"),
    }
    assert!(buf.is_empty());
}

#[test]
fn all_null_row_is_rejected_and_rewound() {
    let batch = Batch::try_new(vec![InputColumn::new(
        "x",
        arr(Int64Array::from(vec![Some(1), None, Some(3)])),
    )])
    .unwrap();
    let mut buf = Buffer::new(ProtocolVersion::V1);
    encode(&mut buf, &table("pre"), &SymbolsSpec::Auto, &AtSpec::Server, &batch.clone())
        .unwrap_err();
    assert!(buf.is_empty());

    let ok = Batch::try_new(vec![InputColumn::new("x", arr(Int64Array::from(vec![9])))]).unwrap();
    encode(&mut buf, &table("pre"), &SymbolsSpec::Auto, &AtSpec::Server, &ok).unwrap();
    let (len, rows) = (buf.len(), buf.row_count());

    let err =
        encode(&mut buf, &table("t"), &SymbolsSpec::Auto, &AtSpec::Server, &batch).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Bad dataframe row at index 1: All values are nulls."
    );
    assert_eq!(err.kind(), ErrorKind::Config);
    assert_eq!((buf.len(), buf.row_count()), (len, rows));
    assert_eq!(buf.as_str(), "pre x=9i\n");
}

#[test]
fn configuration_errors_leave_buffer_untouched() {
    let mut buf = Buffer::new(ProtocolVersion::V1);
    let err = encode(
        &mut buf,
        &TableSpec::BatchName,
        &SymbolsSpec::Auto,
        &AtSpec::Server,
        &Batch::try_new(weather().columns().to_vec()).unwrap(),
    )
    .unwrap_err();
    assert!(err.is_config());
    assert!(buf.is_empty());
}

#[test]
fn empty_batch_writes_nothing() {
    let batch = Batch::try_new(vec![InputColumn::new(
        "x",
        arr(Int64Array::from(Vec::<i64>::new())),
    )])
    .unwrap();
    assert_eq!(
        render(&table("t"), &SymbolsSpec::Auto, &AtSpec::Server, &batch).unwrap(),
        ""
    );
}

#[test]
fn arrays_need_protocol_v2() {
    let list = ListArray::from_iter_primitive::<Float64Type, _, _>(vec![
        Some(vec![Some(1.0), Some(2.0)]),
        None,
    ]);
    let batch = Batch::try_new(vec![
        InputColumn::new("arr", arr(list)),
        InputColumn::new("n", arr(Int64Array::from(vec![1, 2]))),
    ])
    .unwrap();

    let mut v1 = Buffer::new(ProtocolVersion::V1);
    let err =
        encode(&mut v1, &table("t"), &SymbolsSpec::Auto, &AtSpec::Server, &batch).unwrap_err();
    match &err {
        EncodeError::Cell { column, source, .. } => {
            assert_eq!(column, "arr");
            match source {
                CellError::Line(line) => assert_eq!(line.code(), ErrorCode::ProtocolVersionError),
                other => panic!("expected a line error, got {other:?}"),
            }
        }
        other => panic!("expected a cell error, got {other:?}"),
    }
    assert!(err.to_string().ends_with("Protocol version v1 does not support array datatype"));
    assert!(v1.is_empty());

    let mut v2 = Buffer::new(ProtocolVersion::V2);
    encode(&mut v2, &table("t"), &SymbolsSpec::Auto, &AtSpec::Server, &batch).unwrap();
    let mut expected = b"t arr==".to_vec();
    expected.extend_from_slice(&[14, 10, 1]);
    expected.extend_from_slice(&2u32.to_le_bytes());
    expected.extend_from_slice(&1.0f64.to_le_bytes());
    expected.extend_from_slice(&2.0f64.to_le_bytes());
    expected.extend_from_slice(b",n=1i\nt n=2i\n");
    assert_eq!(v2.as_bytes(), expected.as_slice());
}

#[test]
fn v2_floats_are_binary() {
    let batch = Batch::try_new(vec![InputColumn::new(
        "f",
        arr(Float64Array::from(vec![1.5])),
    )])
    .unwrap();
    let mut buf = Buffer::new(ProtocolVersion::V2);
    encode(&mut buf, &table("t"), &SymbolsSpec::Auto, &AtSpec::Fixed(5), &batch).unwrap();
    let mut expected = b"t f==".to_vec();
    expected.push(16);
    expected.extend_from_slice(&1.5f64.to_le_bytes());
    expected.extend_from_slice(b" 5n\n");
    assert_eq!(buf.as_bytes(), expected.as_slice());
}
