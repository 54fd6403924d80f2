//! Classified columns: storage kind, buffer handles and the per-column cursor.

mod classify;
mod cursor;
mod kind;

use arrow_array::OffsetSizeTrait;
use arrow_buffer::{ArrowNativeType, bit_util, i256};
use arrow_data::ArrayData;
use arrow_schema::DataType;

pub use classify::classify;
pub use cursor::{ChunkCursor, ChunkSpan};
pub use kind::{Role, StorageKind};

use crate::{
    error::CellError,
    host::HostValue,
    line::{ColumnName, format_decimal},
};

/// One input column after classification.
///
/// Holds reference-counted handles to the Arrow buffers of every non-empty
/// chunk (released when the column drops) or a borrow of the boxed cells.
#[derive(Debug)]
pub struct Column<'b> {
    index: usize,
    name: &'b str,
    kind: StorageKind,
    chunks: Vec<ArrayData>,
    cells: &'b [HostValue],
    cursor: ChunkCursor,
}

impl<'b> Column<'b> {
    pub(crate) fn arrow(
        index: usize,
        name: &'b str,
        kind: StorageKind,
        chunks: impl IntoIterator<Item = ArrayData>,
    ) -> Self {
        let chunks: Vec<ArrayData> = chunks.into_iter().filter(|c| !c.is_empty()).collect();
        let cursor = ChunkCursor::new(chunks.iter().map(|c| ChunkSpan {
            offset: c.offset(),
            len: c.len(),
            null_count: c.null_count(),
        }));
        Self {
            index,
            name,
            kind,
            chunks,
            cells: &[],
            cursor,
        }
    }

    pub(crate) fn boxed(
        index: usize,
        name: &'b str,
        kind: StorageKind,
        cells: &'b [HostValue],
    ) -> Self {
        Self {
            index,
            name,
            kind,
            chunks: Vec::new(),
            cells,
            cursor: ChunkCursor::single(cells.len()),
        }
    }

    /// Position in the input batch.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Column name.
    pub fn name(&self) -> &'b str {
        self.name
    }

    /// Classified storage kind.
    pub fn kind(&self) -> StorageKind {
        self.kind
    }

    /// Row cursor.
    pub fn cursor(&self) -> &ChunkCursor {
        &self.cursor
    }

    /// Number of non-empty Arrow chunks held.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub(crate) fn advance(&mut self) {
        self.cursor.advance();
    }

    /// Column name as a key. Validated during planning.
    #[inline]
    pub(crate) fn key(&self) -> ColumnName<'b> {
        ColumnName::new_unchecked(self.name)
    }

    #[inline]
    fn chunk(&self) -> &ArrayData {
        &self.chunks[self.cursor.chunk()]
    }

    /// Whether the current Arrow cell is non-null.
    #[inline]
    pub(crate) fn is_valid(&self) -> bool {
        if self.cursor.span().null_count == 0 {
            return true;
        }
        match self.chunk().nulls() {
            Some(nulls) => nulls.is_valid(self.cursor.relative()),
            None => true,
        }
    }

    /// Fixed-width value at the cursor.
    #[inline]
    pub(crate) fn value<T: ArrowNativeType>(&self) -> T {
        self.chunk().buffers()[0].typed_data::<T>()[self.cursor.offset()]
    }

    /// Bit-packed boolean at the cursor.
    #[inline]
    pub(crate) fn bit(&self) -> bool {
        bit_util::get_bit(self.chunk().buffers()[0].as_slice(), self.cursor.offset())
    }

    /// Variable-length string at the cursor.
    #[inline]
    pub(crate) fn utf8<O: OffsetSizeTrait>(&self) -> Result<&str, CellError> {
        str_at::<O>(self.chunk(), self.cursor.offset())
    }

    /// Dictionary value at the cursor, looked up through a key of type `K`.
    ///
    /// `None` when the key points at a null dictionary value.
    #[inline]
    pub(crate) fn dict_str<K: ArrowNativeType>(&self) -> Result<Option<&str>, CellError> {
        let key = self.value::<K>();
        let values = &self.chunk().child_data()[0];
        let index = key
            .to_usize()
            .filter(|&k| k < values.len())
            .ok_or_else(|| {
                CellError::Invalid(format!(
                    "dictionary key {key:?} out of range for {} values",
                    values.len()
                ))
            })?;
        if values.nulls().is_some_and(|nulls| nulls.is_null(index)) {
            return Ok(None);
        }
        str_at::<i32>(values, values.offset() + index).map(Some)
    }

    /// Scale of the decimal chunk at the cursor.
    #[inline]
    pub(crate) fn decimal_scale(&self) -> u32 {
        match self.chunk().data_type() {
            DataType::Decimal128(_, scale) | DataType::Decimal256(_, scale) => {
                u32::try_from(*scale).unwrap_or_default()
            }
            _ => 0,
        }
    }

    /// f64 list elements at the cursor.
    pub(crate) fn f64_list(&self) -> &[f64] {
        let data = self.chunk();
        let offsets = data.buffers()[0].typed_data::<i32>();
        let at = self.cursor.offset();
        let values = &data.child_data()[0];
        let start = values.offset() + offsets[at].as_usize();
        let end = values.offset() + offsets[at + 1].as_usize();
        &values.buffers()[0].typed_data::<f64>()[start..end]
    }

    /// Boxed cell at the cursor.
    #[inline]
    pub(crate) fn cell(&self) -> &'b HostValue {
        &self.cells[self.cursor.offset()]
    }

    /// Human readable rendering of the current cell for error messages.
    pub(crate) fn render(&self) -> String {
        use StorageKind::*;

        fn quoted(s: Result<Option<&str>, CellError>) -> String {
            match s {
                Ok(Some(s)) => format!("'{s}'"),
                Ok(None) => "None".to_owned(),
                Err(err) => format!("<{err}>"),
            }
        }

        if self.kind.needs_host_access() {
            return self.cell().to_string();
        }
        if self.kind == Null || !self.is_valid() {
            return "None".to_owned();
        }
        match self.kind {
            FlatBool | ChunkedBool => String::from(if self.bit() { "True" } else { "False" }),
            FlatI8 | ChunkedI8 => self.value::<i8>().to_string(),
            FlatI16 | ChunkedI16 => self.value::<i16>().to_string(),
            FlatI32 | ChunkedI32 => self.value::<i32>().to_string(),
            FlatI64 | ChunkedI64 => self.value::<i64>().to_string(),
            FlatU8 | ChunkedU8 => self.value::<u8>().to_string(),
            FlatU16 | ChunkedU16 => self.value::<u16>().to_string(),
            FlatU32 | ChunkedU32 => self.value::<u32>().to_string(),
            FlatU64 | ChunkedU64 => self.value::<u64>().to_string(),
            FlatF32 | ChunkedF32 => format!("{:?}", self.value::<f32>()),
            FlatF64 | ChunkedF64 => format!("{:?}", self.value::<f64>()),
            FlatDatetimeNs | FlatDatetimeTzNs | ChunkedTimestampNs => match self.value::<i64>() {
                i64::MIN => "NaT".to_owned(),
                nanos => format!("{nanos}ns"),
            },
            Utf8 => quoted(self.utf8::<i32>().map(Some)),
            LargeUtf8 => quoted(self.utf8::<i64>().map(Some)),
            DictI8 => quoted(self.dict_str::<i8>()),
            DictI16 => quoted(self.dict_str::<i16>()),
            DictI32 => quoted(self.dict_str::<i32>()),
            DictU8 => quoted(self.dict_str::<u8>()),
            DictU16 => quoted(self.dict_str::<u16>()),
            DictU32 => quoted(self.dict_str::<u32>()),
            ChunkedDecimal128 => {
                format_decimal(&self.value::<i128>().to_string(), self.decimal_scale())
            }
            ChunkedDecimal256 => {
                format_decimal(&self.value::<i256>().to_string(), self.decimal_scale())
            }
            ListF64 => format!("{:?}", self.f64_list()),
            Null | BoxedBool | BoxedInt | BoxedFloat | BoxedStr | BoxedDecimal => {
                "None".to_owned()
            }
        }
    }
}

fn str_at<O: OffsetSizeTrait>(data: &ArrayData, index: usize) -> Result<&str, CellError> {
    let offsets = data.buffers()[0].typed_data::<O>();
    let start = offsets[index].as_usize();
    let end = offsets[index + 1].as_usize();
    std::str::from_utf8(&data.buffers()[1].as_slice()[start..end])
        .map_err(|err| CellError::Invalid(format!("invalid UTF-8: {err}")))
}
