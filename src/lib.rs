#![deny(missing_docs)]
//! arrow-ilp: encode Arrow and boxed columnar batches into InfluxDB line protocol.
//!
//! A [`Batch`] is classified once per call: every column gets a
//! [`StorageKind`] describing its physical layout and a [`Role`] in the output
//! row. Each (kind, role) pair resolves to a serializer, and the row loop then
//! walks all columns in lockstep, appending one line per row to a
//! [`LineWriter`]. Rows are committed atomically: a failing batch leaves the
//! writer as it found it.

pub mod access;
pub mod batch;
pub mod column;
pub mod config;
pub mod dispatch;
pub mod encode;
pub mod error;
pub mod flush;
pub mod host;
pub mod line;
pub mod plan;
pub mod sender;
pub mod strings;

/// Prelude exporting the types needed to encode a batch.
pub mod prelude {
    pub use crate::{
        batch::{Batch, ColumnSource, InputColumn},
        config::{AutoFlushConfig, EncoderConfig},
        encode::{EncodeContext, encode_batch},
        error::{EncodeError, ErrorKind},
        flush::{AutoFlushController, FlushHook, NoFlush, Transport, WriteTransport},
        host::{ExclusiveAccess, HostLock, HostStr, HostValue},
        line::{Buffer, LineWriter, ProtocolVersion},
        plan::{AtSpec, ColumnRef, SymbolsSpec, TableSpec},
        sender::Sender,
        strings::StrBuffer,
    };
}

// Re-export Arrow crates so callers can build batches without depending on
// Arrow directly.
pub use arrow_array;
pub use arrow_buffer;
pub use arrow_schema;

pub use crate::{
    access::AccessPolicy,
    batch::{Batch, ColumnSource, InputColumn},
    column::{Column, Role, StorageKind},
    config::{AutoFlushConfig, DEFAULT_PULSE_ROWS, EncoderConfig},
    encode::{EncodeContext, encode_batch},
    error::{
        CellError, EncodeError, ErrorCode, ErrorKind, LineError, Result, TransportError,
    },
    flush::{AutoFlushController, FlushHook, NoFlush, Transport, WriteTransport},
    host::{ExclusiveAccess, HostLock, HostStr, HostValue},
    line::{Buffer, ColumnName, Decimal, LineWriter, ProtocolVersion, TableName},
    plan::{AtSpec, ColumnRef, Plan, SymbolsSpec, TableSpec},
    sender::Sender,
    strings::StrBuffer,
};
