mod common;

use arrow_ilp::arrow_array::{Int64Array, UInt64Array};
use arrow_ilp::{CellError, prelude::*};
use common::{arr, encode, table};

fn batch(values: Vec<u64>) -> Batch {
    let n = values.len();
    Batch::try_new(vec![
        InputColumn::new("big", arr(UInt64Array::from(values))),
        InputColumn::new("row", arr(Int64Array::from_iter_values(0..n as i64))),
    ])
    .unwrap()
}

#[test]
fn u64_above_i64_max_overflows() {
    let mut buf = Buffer::new(ProtocolVersion::V1);
    let err = encode(
        &mut buf,
        &table("t"),
        &SymbolsSpec::Auto,
        &AtSpec::Server,
        &batch(vec![1, 2, 1 << 63]),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to serialize value of column 'big' at row index 2 (9223372036854775808): \
         uint64 value 9223372036854775808 exceeds the maximum int64 value 9223372036854775807"
    );
    assert!(matches!(
        err,
        EncodeError::Cell {
            source: CellError::Overflow { .. },
            ..
        }
    ));
    assert!(buf.is_empty());
}

#[test]
fn i64_max_still_fits() {
    let mut buf = Buffer::new(ProtocolVersion::V1);
    encode(
        &mut buf,
        &table("t"),
        &SymbolsSpec::Auto,
        &AtSpec::Server,
        &batch(vec![i64::MAX as u64]),
    )
    .unwrap();
    assert_eq!(buf.as_str(), "t big=9223372036854775807i,row=0i\n");
}

#[test]
fn failure_restores_previous_contents() {
    let mut buf = Buffer::new(ProtocolVersion::V1);
    encode(&mut buf, &table("a"), &SymbolsSpec::Auto, &AtSpec::Server, &batch(vec![7])).unwrap();
    let before = buf.as_bytes().to_vec();
    let rows = buf.row_count();

    let long = vec![5; 100].into_iter().chain([u64::MAX]).collect();
    for bad in [vec![u64::MAX], vec![0, 0, 0, u64::MAX], long] {
        let bad = batch(bad);
        encode(&mut buf, &table("b"), &SymbolsSpec::Auto, &AtSpec::Server, &bad).unwrap_err();
        assert_eq!(buf.as_bytes(), before.as_slice());
        assert_eq!(buf.row_count(), rows);
    }

    // The buffer remains usable after a rewind.
    encode(&mut buf, &table("c"), &SymbolsSpec::Auto, &AtSpec::Server, &batch(vec![8])).unwrap();
    assert_eq!(buf.as_str(), "a big=7i,row=0i\nc big=8i,row=0i\n");
}
