//! Line protocol writer: the append-only wire buffer the encoder drives.
//!
//! [`LineWriter`] is the seam between the encoding engine and the byte-level
//! encoder; [`Buffer`] is the in-crate implementation.

mod buffer;
mod decimal;
mod names;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use buffer::Buffer;
pub use decimal::{Decimal, MAX_DECIMAL_SCALE};
pub(crate) use decimal::format_decimal;
pub use names::{ColumnName, TableName};

use crate::error::LineError;

/// Default maximum length of table and column names.
pub const MAX_NAME_LEN_DEFAULT: usize = 127;

pub(crate) const DOUBLE_BINARY_FORMAT_TYPE: u8 = 16;
pub(crate) const ARRAY_BINARY_FORMAT_TYPE: u8 = 14;
pub(crate) const ARRAY_F64_TYPE_TAG: u8 = 10;
pub(crate) const DECIMAL_BINARY_FORMAT_TYPE: u8 = 23;

/// Line protocol revision spoken by a [`Buffer`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    /// Text-only protocol. Field timestamps are written in microseconds.
    #[default]
    V1,
    /// Adds binary doubles, f64 arrays and nanosecond timestamps.
    V2,
    /// Adds binary decimals.
    V3,
}

impl ProtocolVersion {
    /// Whether `self` includes every feature of `other`.
    pub fn supports(self, other: ProtocolVersion) -> bool {
        self >= other
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => f.write_str("v1"),
            Self::V2 => f.write_str("v2"),
            Self::V3 => f.write_str("v3"),
        }
    }
}

/// Typed append operations of a line protocol buffer.
///
/// Calls are sequentially coupled: a row starts with [`table`](Self::table),
/// continues with any symbols, then any columns, and ends with
/// [`at`](Self::at) or [`at_now`](Self::at_now). At least one symbol or column
/// must be written before the row is terminated.
pub trait LineWriter {
    /// Begin a new row.
    fn table(&mut self, name: TableName<'_>) -> Result<(), LineError>;
    /// Append a symbol (tag).
    fn symbol(&mut self, name: ColumnName<'_>, value: &str) -> Result<(), LineError>;
    /// Append a boolean field.
    fn column_bool(&mut self, name: ColumnName<'_>, value: bool) -> Result<(), LineError>;
    /// Append an integer field.
    fn column_i64(&mut self, name: ColumnName<'_>, value: i64) -> Result<(), LineError>;
    /// Append a float field.
    fn column_f64(&mut self, name: ColumnName<'_>, value: f64) -> Result<(), LineError>;
    /// Append a string field.
    fn column_str(&mut self, name: ColumnName<'_>, value: &str) -> Result<(), LineError>;
    /// Append a timestamp field given in nanoseconds since the Unix epoch.
    fn column_ts(&mut self, name: ColumnName<'_>, nanos: i64) -> Result<(), LineError>;
    /// Append a one-dimensional f64 array field.
    fn column_arr_f64(&mut self, name: ColumnName<'_>, values: &[f64]) -> Result<(), LineError>;
    /// Append an exact decimal field.
    fn column_dec(&mut self, name: ColumnName<'_>, value: &Decimal) -> Result<(), LineError>;
    /// Terminate the row with a designated timestamp in nanoseconds.
    fn at(&mut self, nanos: i64) -> Result<(), LineError>;
    /// Terminate the row and let the server assign the timestamp.
    fn at_now(&mut self) -> Result<(), LineError>;

    /// Remember the current position so it can be restored later.
    fn set_marker(&mut self) -> Result<(), LineError>;
    /// Discard everything written since [`set_marker`](Self::set_marker).
    fn rewind_to_marker(&mut self) -> Result<(), LineError>;
    /// Forget the marker.
    fn clear_marker(&mut self);

    /// Number of bytes buffered.
    fn len(&self) -> usize;
    /// Whether nothing is buffered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Number of complete rows buffered.
    fn row_count(&self) -> usize;
    /// Buffered bytes.
    fn as_bytes(&self) -> &[u8];
    /// Drop all buffered bytes, rows and the marker.
    fn clear(&mut self);
    /// Longest accepted table or column name.
    fn max_name_len(&self) -> usize {
        MAX_NAME_LEN_DEFAULT
    }
}
