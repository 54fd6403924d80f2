use arrow_array::{Array, ArrayRef};
use arrow_schema::{DataType, TimeUnit};
use tracing::debug;

use super::{Column, StorageKind};
use crate::{
    batch::{ColumnSource, InputColumn},
    error::{EncodeError, Result},
    host::HostValue,
};

/// Classify one input column and acquire handles to its buffers.
///
/// Boxed columns are typed by their first non-null cell; a column holding only
/// nulls (or `NaN`) classifies as [`StorageKind::Null`].
pub fn classify(index: usize, input: &InputColumn) -> Result<Column<'_>> {
    let name = input.name.as_str();
    let column = match &input.source {
        ColumnSource::Flat(array) => classify_flat(index, name, array)?,
        ColumnSource::Chunked(chunks) => classify_chunked(index, name, chunks)?,
        ColumnSource::Boxed(cells) => classify_boxed(index, name, cells)?,
    };
    debug!(
        column = name,
        index,
        kind = %column.kind(),
        chunks = column.chunk_count(),
        "classified column"
    );
    Ok(column)
}

fn flat_kind(data_type: &DataType) -> Option<StorageKind> {
    Some(match data_type {
        DataType::Boolean => StorageKind::FlatBool,
        DataType::Int8 => StorageKind::FlatI8,
        DataType::Int16 => StorageKind::FlatI16,
        DataType::Int32 => StorageKind::FlatI32,
        DataType::Int64 => StorageKind::FlatI64,
        DataType::UInt8 => StorageKind::FlatU8,
        DataType::UInt16 => StorageKind::FlatU16,
        DataType::UInt32 => StorageKind::FlatU32,
        DataType::UInt64 => StorageKind::FlatU64,
        DataType::Float32 => StorageKind::FlatF32,
        DataType::Float64 => StorageKind::FlatF64,
        DataType::Timestamp(TimeUnit::Nanosecond, None) => StorageKind::FlatDatetimeNs,
        DataType::Timestamp(TimeUnit::Nanosecond, Some(_)) => StorageKind::FlatDatetimeTzNs,
        _ => return None,
    })
}

fn chunked_kind(name: &str, data_type: &DataType) -> Result<StorageKind> {
    let kind = match data_type {
        DataType::Null => StorageKind::Null,
        DataType::Boolean => StorageKind::ChunkedBool,
        DataType::Int8 => StorageKind::ChunkedI8,
        DataType::Int16 => StorageKind::ChunkedI16,
        DataType::Int32 => StorageKind::ChunkedI32,
        DataType::Int64 => StorageKind::ChunkedI64,
        DataType::UInt8 => StorageKind::ChunkedU8,
        DataType::UInt16 => StorageKind::ChunkedU16,
        DataType::UInt32 => StorageKind::ChunkedU32,
        DataType::UInt64 => StorageKind::ChunkedU64,
        DataType::Float32 => StorageKind::ChunkedF32,
        DataType::Float64 => StorageKind::ChunkedF64,
        DataType::Timestamp(TimeUnit::Nanosecond, _) => StorageKind::ChunkedTimestampNs,
        DataType::Timestamp(unit, _) => {
            return Err(EncodeError::bad_column(
                name,
                format_args!(
                    "Unsupported timestamp unit {unit:?}: only nanosecond precision is supported"
                ),
            ));
        }
        DataType::Decimal128(_, scale) | DataType::Decimal256(_, scale) if *scale < 0 => {
            return Err(EncodeError::bad_column(
                name,
                format_args!("Unsupported negative decimal scale {scale}"),
            ));
        }
        DataType::Decimal128(..) => StorageKind::ChunkedDecimal128,
        DataType::Decimal256(..) => StorageKind::ChunkedDecimal256,
        DataType::Utf8 => StorageKind::Utf8,
        DataType::LargeUtf8 => StorageKind::LargeUtf8,
        DataType::Dictionary(key, value) => {
            if value.as_ref() != &DataType::Utf8 {
                return Err(EncodeError::bad_column(
                    name,
                    format_args!("Expected a category of strings, got a category of {value}"),
                ));
            }
            match key.as_ref() {
                DataType::Int8 => StorageKind::DictI8,
                DataType::Int16 => StorageKind::DictI16,
                DataType::Int32 => StorageKind::DictI32,
                DataType::UInt8 => StorageKind::DictU8,
                DataType::UInt16 => StorageKind::DictU16,
                DataType::UInt32 => StorageKind::DictU32,
                other => {
                    return Err(EncodeError::bad_column(
                        name,
                        format_args!("Unsupported category index type {other}"),
                    ));
                }
            }
        }
        DataType::List(field) if field.data_type() == &DataType::Float64 => StorageKind::ListF64,
        other => {
            return Err(EncodeError::bad_column(
                name,
                format_args!("Unsupported dtype {other}"),
            ));
        }
    };
    Ok(kind)
}

fn classify_flat<'b>(index: usize, name: &'b str, array: &ArrayRef) -> Result<Column<'b>> {
    // Strings, categoricals, decimals and lists have no flat layout; read them as one chunk.
    let Some(kind) = flat_kind(array.data_type()) else {
        return classify_chunked(index, name, std::slice::from_ref(array));
    };
    if array.null_count() > 0 {
        return Err(EncodeError::bad_column(
            name,
            "A flat column must not carry a validity bitmap, pass it as a chunked column",
        ));
    }
    Ok(Column::arrow(index, name, kind, [array.to_data()]))
}

fn classify_chunked<'b>(index: usize, name: &'b str, chunks: &[ArrayRef]) -> Result<Column<'b>> {
    let Some(first) = chunks.first() else {
        return Ok(Column::arrow(index, name, StorageKind::Null, Vec::new()));
    };
    let data_type = first.data_type();
    if let Some(other) = chunks.iter().find(|c| c.data_type() != data_type) {
        return Err(EncodeError::bad_column(
            name,
            format_args!(
                "All chunks must share one dtype, got {data_type} and {}",
                other.data_type()
            ),
        ));
    }
    let kind = chunked_kind(name, data_type)?;
    let chunks: Vec<_> = chunks.iter().map(|c| c.to_data()).collect();
    if kind == StorageKind::ListF64
        && chunks
            .iter()
            .any(|c| c.child_data().first().is_some_and(|v| v.null_count() > 0))
    {
        return Err(EncodeError::bad_column(name, "List elements must not be null"));
    }
    Ok(Column::arrow(index, name, kind, chunks))
}

fn classify_boxed<'b>(index: usize, name: &'b str, cells: &'b [HostValue]) -> Result<Column<'b>> {
    let kind = match cells.iter().find(|c| !c.is_null_like()) {
        None => StorageKind::Null,
        Some(HostValue::Bool(_)) => StorageKind::BoxedBool,
        Some(HostValue::Int(_)) => StorageKind::BoxedInt,
        Some(HostValue::Float(_)) => StorageKind::BoxedFloat,
        Some(HostValue::Str(_)) => StorageKind::BoxedStr,
        Some(HostValue::Decimal { .. }) => StorageKind::BoxedDecimal,
        Some(other) => {
            return Err(EncodeError::bad_column(
                name,
                format_args!(
                    "Unsupported object column containing an object of type {}.",
                    other.type_name()
                ),
            ));
        }
    };
    Ok(Column::boxed(index, name, kind, cells))
}
