//! Error types for arrow-ilp.

use std::{borrow::Cow, fmt, io};

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = EncodeError> = std::result::Result<T, E>;

/// Category of a [`LineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Table or column name failed validation.
    InvalidName,
    /// Writer methods were called out of order.
    InvalidApiCall,
    /// A designated timestamp could not be written.
    InvalidTimestamp,
    /// An array value could not be written.
    ArrayError,
    /// The selected protocol version does not support the requested value.
    ProtocolVersionError,
    /// A decimal value could not be written.
    InvalidDecimal,
}

/// Error reported by a [`LineWriter`](crate::line::LineWriter) call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{msg}")]
pub struct LineError {
    code: ErrorCode,
    msg: String,
}

impl LineError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
        }
    }

    /// The error category.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The human readable message.
    pub fn msg(&self) -> &str {
        &self.msg
    }
}

/// Build a [`LineError`] from an [`ErrorCode`] variant and a format string.
macro_rules! line_err {
    ($code:ident, $($arg:tt)*) => {
        $crate::error::LineError::new($crate::error::ErrorCode::$code, format!($($arg)*))
    };
}

pub(crate) use line_err;

/// Error raised by a [`Transport`](crate::flush::Transport) while sending a payload.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Underlying I/O failure.
    #[error("Could not flush buffer: {0}")]
    Io(#[from] io::Error),
    /// Transport-specific failure that is not an I/O error.
    #[error("Could not flush buffer: {0}")]
    Rejected(String),
}

/// Failure to serialize a single cell.
#[derive(Debug, Error)]
pub enum CellError {
    /// Boxed cell holds a different type than the one sniffed for its column.
    #[error("expected an object of type {expected}, got {got}")]
    TypeMismatch {
        /// Type picked when the column was classified.
        expected: &'static str,
        /// Type found in the cell.
        got: &'static str,
    },
    /// Integer value does not fit the signed 64-bit field type.
    #[error("{message}")]
    Overflow {
        /// Description of the overflow.
        message: Cow<'static, str>,
    },
    /// Null found where the role requires a value.
    #[error("{0}")]
    NullNotAllowed(&'static str),
    /// Malformed cell data such as an out-of-range dictionary key.
    #[error("{0}")]
    Invalid(String),
    /// Host string could not be transcoded to UTF-8.
    #[error("{0}")]
    Transcode(String),
    /// The line writer rejected the value.
    #[error(transparent)]
    Line(#[from] LineError),
}

impl CellError {
    pub(crate) fn overflow(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Overflow {
            message: message.into(),
        }
    }

    pub(crate) fn mismatch(expected: &'static str, got: &'static str) -> Self {
        Self::TypeMismatch { expected, got }
    }
}

/// Broad classification of an [`EncodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Detected before or independently of any row: bad arguments, bad dtypes, empty rows.
    Config,
    /// A single cell failed to serialize.
    Cell,
    /// Flushing to the transport failed.
    Transport,
}

/// Error returned by [`encode_batch`](crate::encode::encode_batch) and the sender.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// An argument selecting table name, symbols or timestamp is invalid.
    #[error("Bad argument `{arg}`: {message}")]
    BadArgument {
        /// Name of the offending argument.
        arg: &'static str,
        /// Description of the problem.
        message: String,
    },
    /// A column cannot be encoded with its dtype or role.
    #[error("Bad column '{column}': {message}")]
    BadColumn {
        /// Column name.
        column: String,
        /// Description of the problem.
        message: String,
    },
    /// A cell failed to serialize.
    #[error("Failed to serialize value of column '{column}' at row index {row} ({value}): {source}")]
    Cell {
        /// Column name.
        column: String,
        /// Zero-based row index within the batch.
        row: usize,
        /// Rendering of the offending value.
        value: String,
        /// Underlying cause.
        #[source]
        source: CellError,
    },
    /// Every symbol and field of a row was null.
    #[error("Bad dataframe row at index {row}: All values are nulls.")]
    EmptyRow {
        /// Zero-based row index within the batch.
        row: usize,
    },
    /// Auto-flush or explicit flush failed.
    #[error(transparent)]
    Flush(#[from] TransportError),
    /// The line writer rejected a call outside of any cell.
    #[error(transparent)]
    Line(#[from] LineError),
}

impl EncodeError {
    /// Create a bad argument error.
    pub fn bad_argument(arg: &'static str, message: impl fmt::Display) -> Self {
        Self::BadArgument {
            arg,
            message: message.to_string(),
        }
    }

    /// Create a bad column error.
    pub fn bad_column(column: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::BadColumn {
            column: column.into(),
            message: message.to_string(),
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadArgument { .. } | Self::BadColumn { .. } | Self::EmptyRow { .. } => {
                ErrorKind::Config
            }
            Self::Line(_) => ErrorKind::Config,
            Self::Cell { .. } => ErrorKind::Cell,
            Self::Flush(_) => ErrorKind::Transport,
        }
    }

    /// Whether the error was raised before any row could be emitted.
    pub fn is_config(&self) -> bool {
        self.kind() == ErrorKind::Config
    }
}
