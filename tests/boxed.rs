mod common;

use arrow_ilp::arrow_array::Int64Array;
use arrow_ilp::{CellError, prelude::*};
use common::{arr, encode, render, table};

fn boxed(name: &str, cells: Vec<HostValue>) -> InputColumn {
    InputColumn::new(name, cells)
}

#[test]
fn mixed_types_fail_at_the_offending_row() {
    let mut cells: Vec<HostValue> = (0..5).map(|i| HostValue::Bool(i % 2 == 0)).collect();
    cells.push(HostValue::Int(1));
    let batch = Batch::try_new(vec![boxed("flag", cells)]).unwrap();

    let mut buf = Buffer::new(ProtocolVersion::V1);
    let err =
        encode(&mut buf, &table("t"), &SymbolsSpec::Auto, &AtSpec::Server, &batch).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to serialize value of column 'flag' at row index 5 (1): expected an object of type bool, got int"
    );
    match err {
        EncodeError::Cell {
            source: CellError::TypeMismatch { expected, got },
            ..
        } => assert_eq!((expected, got), ("bool", "int")),
        other => panic!("expected a type mismatch, got {other:?}"),
    }
    assert!(buf.is_empty());
}

#[test]
fn int_too_big() {
    let batch = Batch::try_new(vec![boxed(
        "n",
        vec![HostValue::Int(1), HostValue::Int(i128::from(i64::MAX) + 1)],
    )])
    .unwrap();
    let err = render(&table("t"), &SymbolsSpec::Auto, &AtSpec::Server, &batch).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to serialize value of column 'n' at row index 1 (9223372036854775808): int too big to convert to a 64-bit integer"
    );
}

#[test]
fn nulls_and_nan() {
    let batch = Batch::try_new(vec![
        boxed(
            "s",
            vec![HostValue::from("a"), HostValue::Null, HostValue::Float(f64::NAN)],
        ),
        boxed(
            "f",
            vec![HostValue::Float(f64::NAN), HostValue::Float(1.5), HostValue::Null],
        ),
        InputColumn::new("v", arr(Int64Array::from(vec![1, 2, 3]))),
    ])
    .unwrap();
    let text = render(&table("t"), &SymbolsSpec::All, &AtSpec::Server, &batch).unwrap();
    // NaN is a value in a float column but a null in any other.
    assert_eq!(text, "t,s=a f=NaN,v=1i\nt f=1.5,v=2i\nt v=3i\n");
}

#[test]
fn non_utf8_strings_are_transcoded() {
    let batch = Batch::try_new(vec![
        boxed(
            "name",
            vec![
                HostValue::Str(HostStr::Ucs1(vec![b'c', 0xe9])),
                HostValue::Str(HostStr::Ucs2(vec![0x65e5, 0x672c])),
                HostValue::Str(HostStr::Ucs4(vec![0x1f600])),
            ],
        ),
        boxed("i", vec![1i64.into(), 2i64.into(), 3i64.into()]),
    ])
    .unwrap();
    let text = render(&table("t"), &SymbolsSpec::None, &AtSpec::Server, &batch).unwrap();
    assert_eq!(
        text,
        "t name=\"c\u{e9}\",i=1i\nt name=\"\u{65e5}\u{672c}\",i=2i\nt name=\"\u{1f600}\",i=3i\n"
    );
}

#[test]
fn lone_surrogate_is_rejected() {
    let batch = Batch::try_new(vec![boxed(
        "name",
        vec![HostValue::from("ok"), HostValue::Str(HostStr::Ucs2(vec![0xd800]))],
    )])
    .unwrap();
    let err = render(&table("t"), &SymbolsSpec::None, &AtSpec::Server, &batch).unwrap_err();
    assert!(matches!(
        err,
        EncodeError::Cell {
            row: 1,
            source: CellError::Transcode(_),
            ..
        }
    ));
    assert!(err.to_string().ends_with("invalid UCS-2 code point: 55296"), "{err}");
}

#[test]
fn unsupported_objects() {
    let batch = Batch::try_new(vec![boxed("o", vec![HostValue::Other("Decimal")])]).unwrap();
    let err = render(&table("t"), &SymbolsSpec::Auto, &AtSpec::Server, &batch).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Bad column 'o': Unsupported object column containing an object of type Decimal."
    );
}
