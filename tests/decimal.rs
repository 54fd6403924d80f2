mod common;

use arrow_ilp::arrow_array::{Decimal128Array, Decimal256Array, Int64Array};
use arrow_ilp::arrow_buffer::i256;
use arrow_ilp::{CellError, ErrorCode, prelude::*};
use common::{arr, encode, table};

const DECIMAL: u8 = 23;

fn line(out: &mut Vec<u8>, dec: Option<&[u8]>, v: i64) {
    out.extend_from_slice(b"t ");
    if let Some(dec) = dec {
        out.extend_from_slice(b"d==");
        out.push(DECIMAL);
        out.extend_from_slice(dec);
        out.push(b',');
    }
    out.extend_from_slice(format!("v={v}i\n").as_bytes());
}

#[test]
fn decimal128_cells_are_binary_with_their_scale() {
    let d = Decimal128Array::from(vec![Some(12345), None, Some(-5)])
        .with_precision_and_scale(10, 2)
        .unwrap();
    let batch = Batch::try_new(vec![
        InputColumn::new("d", arr(d)),
        InputColumn::new("v", arr(Int64Array::from(vec![1, 2, 3]))),
    ])
    .unwrap();
    let mut buf = Buffer::new(ProtocolVersion::V3);
    encode(&mut buf, &table("t"), &SymbolsSpec::Auto, &AtSpec::Server, &batch).unwrap();

    let mut expected = Vec::new();
    line(&mut expected, Some(&[2, 2, 0x30, 0x39]), 1);
    line(&mut expected, None, 2);
    line(&mut expected, Some(&[2, 1, 0xfb]), 3);
    assert_eq!(buf.as_bytes(), expected.as_slice());
}

#[test]
fn decimal256_and_boxed_decimals() {
    let wide = Decimal256Array::from(vec![i256::from_i128(1), i256::MINUS_ONE])
        .with_precision_and_scale(40, 3)
        .unwrap();
    let batch = Batch::try_new(vec![
        InputColumn::new("d", arr(wide)),
        InputColumn::new("v", arr(Int64Array::from(vec![1, 2]))),
    ])
    .unwrap();
    let mut buf = Buffer::new(ProtocolVersion::V3);
    encode(&mut buf, &table("t"), &SymbolsSpec::Auto, &AtSpec::Server, &batch).unwrap();
    let mut expected = Vec::new();
    line(&mut expected, Some(&[3, 1, 0x01]), 1);
    line(&mut expected, Some(&[3, 1, 0xff]), 2);
    assert_eq!(buf.as_bytes(), expected.as_slice());

    let boxed = vec![
        HostValue::Decimal {
            unscaled: 150,
            scale: 1,
        },
        HostValue::Null,
    ];
    let batch = Batch::try_new(vec![
        InputColumn::new("d", boxed),
        InputColumn::new("v", arr(Int64Array::from(vec![1, 2]))),
    ])
    .unwrap();
    let mut buf = Buffer::new(ProtocolVersion::V3);
    encode(&mut buf, &table("t"), &SymbolsSpec::Auto, &AtSpec::Server, &batch).unwrap();
    let mut expected = Vec::new();
    line(&mut expected, Some(&[1, 2, 0x00, 0x96]), 1);
    line(&mut expected, None, 2);
    assert_eq!(buf.as_bytes(), expected.as_slice());
}

#[test]
fn decimals_need_protocol_v3() {
    let d = Decimal128Array::from(vec![12345])
        .with_precision_and_scale(10, 2)
        .unwrap();
    let batch = Batch::try_new(vec![InputColumn::new("d", arr(d))]).unwrap();
    let mut buf = Buffer::new(ProtocolVersion::V2);
    let err =
        encode(&mut buf, &table("t"), &SymbolsSpec::Auto, &AtSpec::Server, &batch).unwrap_err();
    match &err {
        EncodeError::Cell { source, .. } => match source {
            CellError::Line(line) => assert_eq!(line.code(), ErrorCode::ProtocolVersionError),
            other => panic!("expected a line error, got {other:?}"),
        },
        other => panic!("expected a cell error, got {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "Failed to serialize value of column 'd' at row index 0 (123.45): \
         Protocol version v2 does not support the decimal datatype"
    );
    assert!(buf.is_empty());
}

#[test]
fn boxed_decimal_type_mismatch_and_negative_scale() {
    let boxed = vec![
        HostValue::Decimal {
            unscaled: -5,
            scale: 3,
        },
        HostValue::Int(1),
    ];
    let batch = Batch::try_new(vec![InputColumn::new("d", boxed)]).unwrap();
    let mut buf = Buffer::new(ProtocolVersion::V3);
    let err =
        encode(&mut buf, &table("t"), &SymbolsSpec::Auto, &AtSpec::Server, &batch).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to serialize value of column 'd' at row index 1 (1): \
         expected an object of type Decimal, got int"
    );
    assert!(buf.is_empty());

    let d = Decimal128Array::from(vec![1])
        .with_precision_and_scale(10, -2)
        .unwrap();
    let batch = Batch::try_new(vec![InputColumn::new("d", arr(d))]).unwrap();
    let err =
        encode(&mut buf, &table("t"), &SymbolsSpec::Auto, &AtSpec::Server, &batch).unwrap_err();
    assert_eq!(err.to_string(), "Bad column 'd': Unsupported negative decimal scale -2");
}
