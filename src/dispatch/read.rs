//! Cell readers: how one logical cell is pulled out of each storage layout.

use std::marker::PhantomData;

use arrow_array::OffsetSizeTrait;
use arrow_buffer::{ArrowNativeType, i256};

use crate::{
    column::Column, error::CellError, host::HostValue, line::Decimal, strings::StrBuffer,
};

/// Reads a fixed-size value at the cursor. `None` means null.
pub(crate) trait ReadCell<T> {
    fn read(col: &Column<'_>) -> Result<Option<T>, CellError>;
}

/// Reads a string at the cursor, transcoding through the arena if needed.
pub(crate) trait ReadStr {
    fn read<'c>(col: &'c Column<'_>, strings: &'c mut StrBuffer)
    -> Result<Option<&'c str>, CellError>;
}

/// Fixed-width Arrow values, widened losslessly.
pub(crate) struct Native<T>(PhantomData<fn() -> T>);

/// `u64` values, range-checked against `i64`.
pub(crate) struct U64;

/// Bit-packed Arrow booleans.
pub(crate) struct Bits;

/// Nanosecond timestamps; `i64::MIN` is null as well as an unset validity bit.
pub(crate) struct Nanos;

/// Arrow `Decimal128` and `Decimal256`, by unscaled native type.
pub(crate) struct Dec<T>(PhantomData<fn() -> T>);

/// Boxed host cells.
pub(crate) struct Boxed;

/// Offset-encoded UTF-8.
pub(crate) struct Text<O>(PhantomData<fn() -> O>);

/// Dictionary-encoded UTF-8 with key type `K`.
pub(crate) struct Dict<K>(PhantomData<fn() -> K>);

impl<T: ArrowNativeType + Into<i64>> ReadCell<i64> for Native<T> {
    #[inline]
    fn read(col: &Column<'_>) -> Result<Option<i64>, CellError> {
        Ok(col.is_valid().then(|| col.value::<T>().into()))
    }
}

impl<T: ArrowNativeType + Into<f64>> ReadCell<f64> for Native<T> {
    #[inline]
    fn read(col: &Column<'_>) -> Result<Option<f64>, CellError> {
        Ok(col.is_valid().then(|| col.value::<T>().into()))
    }
}

impl ReadCell<i64> for U64 {
    #[inline]
    fn read(col: &Column<'_>) -> Result<Option<i64>, CellError> {
        if !col.is_valid() {
            return Ok(None);
        }
        let value = col.value::<u64>();
        i64::try_from(value).map(Some).map_err(|_| {
            CellError::overflow(format!(
                "uint64 value {value} exceeds the maximum int64 value {}",
                i64::MAX
            ))
        })
    }
}

impl ReadCell<bool> for Bits {
    #[inline]
    fn read(col: &Column<'_>) -> Result<Option<bool>, CellError> {
        Ok(col.is_valid().then(|| col.bit()))
    }
}

impl ReadCell<i64> for Nanos {
    #[inline]
    fn read(col: &Column<'_>) -> Result<Option<i64>, CellError> {
        if !col.is_valid() {
            return Ok(None);
        }
        Ok(Some(col.value::<i64>()).filter(|&nanos| nanos != i64::MIN))
    }
}

impl ReadCell<Decimal> for Dec<i128> {
    #[inline]
    fn read(col: &Column<'_>) -> Result<Option<Decimal>, CellError> {
        Ok(col
            .is_valid()
            .then(|| Decimal::from_i128(col.value::<i128>(), col.decimal_scale())))
    }
}

impl ReadCell<Decimal> for Dec<i256> {
    #[inline]
    fn read(col: &Column<'_>) -> Result<Option<Decimal>, CellError> {
        Ok(col
            .is_valid()
            .then(|| Decimal::from_i256(col.value::<i256>(), col.decimal_scale())))
    }
}

impl ReadCell<bool> for Boxed {
    fn read(col: &Column<'_>) -> Result<Option<bool>, CellError> {
        match col.cell() {
            HostValue::Bool(v) => Ok(Some(*v)),
            cell if cell.is_null_like() => Ok(None),
            cell => Err(CellError::mismatch("bool", cell.type_name())),
        }
    }
}

impl ReadCell<i64> for Boxed {
    fn read(col: &Column<'_>) -> Result<Option<i64>, CellError> {
        match col.cell() {
            HostValue::Int(v) => i64::try_from(*v)
                .map(Some)
                .map_err(|_| CellError::overflow("int too big to convert to a 64-bit integer")),
            cell if cell.is_null_like() => Ok(None),
            cell => Err(CellError::mismatch("int", cell.type_name())),
        }
    }
}

impl ReadCell<f64> for Boxed {
    fn read(col: &Column<'_>) -> Result<Option<f64>, CellError> {
        match col.cell() {
            HostValue::Float(v) => Ok(Some(*v)),
            HostValue::Null => Ok(None),
            cell => Err(CellError::mismatch("float", cell.type_name())),
        }
    }
}

impl ReadCell<Decimal> for Boxed {
    fn read(col: &Column<'_>) -> Result<Option<Decimal>, CellError> {
        match col.cell() {
            HostValue::Decimal { unscaled, scale } => {
                Ok(Some(Decimal::from_i128(*unscaled, *scale)))
            }
            cell if cell.is_null_like() => Ok(None),
            cell => Err(CellError::mismatch("Decimal", cell.type_name())),
        }
    }
}

impl ReadStr for Boxed {
    fn read<'c>(
        col: &'c Column<'_>,
        strings: &'c mut StrBuffer,
    ) -> Result<Option<&'c str>, CellError> {
        match col.cell() {
            HostValue::Str(s) => strings.transcode(s).map(Some),
            cell if cell.is_null_like() => Ok(None),
            cell => Err(CellError::mismatch("str", cell.type_name())),
        }
    }
}

impl<O: OffsetSizeTrait> ReadStr for Text<O> {
    #[inline]
    fn read<'c>(col: &'c Column<'_>, _: &'c mut StrBuffer) -> Result<Option<&'c str>, CellError> {
        if !col.is_valid() {
            return Ok(None);
        }
        col.utf8::<O>().map(Some)
    }
}

impl<K: ArrowNativeType> ReadStr for Dict<K> {
    #[inline]
    fn read<'c>(col: &'c Column<'_>, _: &'c mut StrBuffer) -> Result<Option<&'c str>, CellError> {
        if !col.is_valid() {
            return Ok(None);
        }
        col.dict_str::<K>()
    }
}
