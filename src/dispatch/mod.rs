//! Serializer selection by (storage kind, role).
//!
//! The role fixes which [`LineWriter`] call is made; the storage kind fixes how
//! the cell is read. [`resolve`] is evaluated once per column after every role
//! in the batch is final, and the returned function pointer is invoked for each
//! row.

mod read;

use arrow_buffer::i256;

use read::{Bits, Boxed, Dec, Dict, Nanos, Native, ReadCell, ReadStr, Text, U64};

use crate::{
    column::{Column, Role, StorageKind},
    error::CellError,
    line::{Decimal, LineWriter, TableName},
    strings::StrBuffer,
};

/// Outcome of serializing one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    /// The cell was appended to the writer.
    Written,
    /// The cell was null and nothing was appended.
    Skipped,
}

/// Serializer for one (storage kind, role) pair.
pub type SerializeFn<W> = fn(&mut W, &mut StrBuffer, &Column<'_>) -> Result<Emit, CellError>;

/// Pick the serializer for `kind` in `role`.
///
/// Returns `None` for pairs outside the supported matrix and for [`Role::Skip`].
pub fn resolve<W: LineWriter>(kind: StorageKind, role: Role) -> Option<SerializeFn<W>> {
    use StorageKind::*;

    macro_rules! only {
        ($role:ident => $f:expr) => {
            if role == Role::$role {
                $f as SerializeFn<W>
            } else {
                return None;
            }
        };
    }
    macro_rules! text {
        ($reader:ty) => {
            match role {
                Role::TableName => table_name::<W, $reader> as SerializeFn<W>,
                Role::Symbol => symbol::<W, $reader>,
                Role::FieldStr => field_str::<W, $reader>,
                _ => return None,
            }
        };
    }
    macro_rules! time {
        ($reader:ty) => {
            match role {
                Role::FieldTimestamp => field_ts::<W, $reader> as SerializeFn<W>,
                Role::At => designated::<W, $reader>,
                _ => return None,
            }
        };
    }

    let serialize = match kind {
        Null => return None,
        BoxedBool => only!(FieldBool => field_bool::<W, Boxed>),
        BoxedInt => only!(FieldI64 => field_i64::<W, Boxed>),
        BoxedFloat => only!(FieldF64 => field_f64::<W, Boxed>),
        BoxedStr => text!(Boxed),
        BoxedDecimal => only!(FieldDecimal => field_dec::<W, Boxed>),
        FlatBool | ChunkedBool => only!(FieldBool => field_bool::<W, Bits>),
        FlatI8 | ChunkedI8 => only!(FieldI64 => field_i64::<W, Native<i8>>),
        FlatI16 | ChunkedI16 => only!(FieldI64 => field_i64::<W, Native<i16>>),
        FlatI32 | ChunkedI32 => only!(FieldI64 => field_i64::<W, Native<i32>>),
        FlatI64 | ChunkedI64 => only!(FieldI64 => field_i64::<W, Native<i64>>),
        FlatU8 | ChunkedU8 => only!(FieldI64 => field_i64::<W, Native<u8>>),
        FlatU16 | ChunkedU16 => only!(FieldI64 => field_i64::<W, Native<u16>>),
        FlatU32 | ChunkedU32 => only!(FieldI64 => field_i64::<W, Native<u32>>),
        FlatU64 | ChunkedU64 => only!(FieldI64 => field_i64::<W, U64>),
        FlatF32 | ChunkedF32 => only!(FieldF64 => field_f64::<W, Native<f32>>),
        FlatF64 | ChunkedF64 => only!(FieldF64 => field_f64::<W, Native<f64>>),
        FlatDatetimeNs | FlatDatetimeTzNs | ChunkedTimestampNs => time!(Nanos),
        ChunkedDecimal128 => only!(FieldDecimal => field_dec::<W, Dec<i128>>),
        ChunkedDecimal256 => only!(FieldDecimal => field_dec::<W, Dec<i256>>),
        Utf8 => text!(Text<i32>),
        LargeUtf8 => text!(Text<i64>),
        DictI8 => text!(Dict<i8>),
        DictI16 => text!(Dict<i16>),
        DictI32 => text!(Dict<i32>),
        DictU8 => text!(Dict<u8>),
        DictU16 => text!(Dict<u16>),
        DictU32 => text!(Dict<u32>),
        ListF64 => only!(FieldArrayF64 => field_arr_f64::<W>),
    };
    Some(serialize)
}

fn table_name<W: LineWriter, R: ReadStr>(
    writer: &mut W,
    strings: &mut StrBuffer,
    col: &Column<'_>,
) -> Result<Emit, CellError> {
    let Some(name) = R::read(col, strings)? else {
        return Err(CellError::NullNotAllowed("Table name cannot be null"));
    };
    writer.table(TableName::new(name)?)?;
    Ok(Emit::Written)
}

fn symbol<W: LineWriter, R: ReadStr>(
    writer: &mut W,
    strings: &mut StrBuffer,
    col: &Column<'_>,
) -> Result<Emit, CellError> {
    match R::read(col, strings)? {
        Some(value) => {
            writer.symbol(col.key(), value)?;
            Ok(Emit::Written)
        }
        None => Ok(Emit::Skipped),
    }
}

fn field_str<W: LineWriter, R: ReadStr>(
    writer: &mut W,
    strings: &mut StrBuffer,
    col: &Column<'_>,
) -> Result<Emit, CellError> {
    match R::read(col, strings)? {
        Some(value) => {
            writer.column_str(col.key(), value)?;
            Ok(Emit::Written)
        }
        None => Ok(Emit::Skipped),
    }
}

fn field_bool<W: LineWriter, R: ReadCell<bool>>(
    writer: &mut W,
    _: &mut StrBuffer,
    col: &Column<'_>,
) -> Result<Emit, CellError> {
    let Some(value) = R::read(col)? else {
        return Err(CellError::NullNotAllowed(
            "Cannot insert null into a boolean column",
        ));
    };
    writer.column_bool(col.key(), value)?;
    Ok(Emit::Written)
}

fn field_i64<W: LineWriter, R: ReadCell<i64>>(
    writer: &mut W,
    _: &mut StrBuffer,
    col: &Column<'_>,
) -> Result<Emit, CellError> {
    match R::read(col)? {
        Some(value) => {
            writer.column_i64(col.key(), value)?;
            Ok(Emit::Written)
        }
        None => Ok(Emit::Skipped),
    }
}

fn field_f64<W: LineWriter, R: ReadCell<f64>>(
    writer: &mut W,
    _: &mut StrBuffer,
    col: &Column<'_>,
) -> Result<Emit, CellError> {
    match R::read(col)? {
        Some(value) => {
            writer.column_f64(col.key(), value)?;
            Ok(Emit::Written)
        }
        None => Ok(Emit::Skipped),
    }
}

fn field_ts<W: LineWriter, R: ReadCell<i64>>(
    writer: &mut W,
    _: &mut StrBuffer,
    col: &Column<'_>,
) -> Result<Emit, CellError> {
    match R::read(col)? {
        Some(nanos) => {
            writer.column_ts(col.key(), nanos)?;
            Ok(Emit::Written)
        }
        None => Ok(Emit::Skipped),
    }
}

fn field_dec<W: LineWriter, R: ReadCell<Decimal>>(
    writer: &mut W,
    _: &mut StrBuffer,
    col: &Column<'_>,
) -> Result<Emit, CellError> {
    match R::read(col)? {
        Some(value) => {
            writer.column_dec(col.key(), &value)?;
            Ok(Emit::Written)
        }
        None => Ok(Emit::Skipped),
    }
}

fn field_arr_f64<W: LineWriter>(
    writer: &mut W,
    _: &mut StrBuffer,
    col: &Column<'_>,
) -> Result<Emit, CellError> {
    if !col.is_valid() {
        return Ok(Emit::Skipped);
    }
    writer.column_arr_f64(col.key(), col.f64_list())?;
    Ok(Emit::Written)
}

/// A null designated timestamp lets the server assign the time.
fn designated<W: LineWriter, R: ReadCell<i64>>(
    writer: &mut W,
    _: &mut StrBuffer,
    col: &Column<'_>,
) -> Result<Emit, CellError> {
    match R::read(col)? {
        Some(nanos) => writer.at(nanos)?,
        None => writer.at_now()?,
    }
    Ok(Emit::Written)
}
