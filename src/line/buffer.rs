use std::fmt;

use super::{
    ARRAY_BINARY_FORMAT_TYPE, ARRAY_F64_TYPE_TAG, ColumnName, DECIMAL_BINARY_FORMAT_TYPE,
    DOUBLE_BINARY_FORMAT_TYPE, Decimal, LineWriter, MAX_DECIMAL_SCALE, MAX_NAME_LEN_DEFAULT,
    ProtocolVersion, TableName,
};
use crate::error::{LineError, line_err};

fn must_escape_unquoted(b: u8) -> bool {
    matches!(b, b' ' | b',' | b'=' | b'\n' | b'\r' | b'\\')
}

fn must_escape_quoted(b: u8) -> bool {
    matches!(b, b'\n' | b'\r' | b'"' | b'\\')
}

fn write_escaped(output: &mut Vec<u8>, s: &str, escape: fn(u8) -> bool) {
    let extra = s.bytes().filter(|&b| escape(b)).count();
    if extra == 0 {
        output.extend_from_slice(s.as_bytes());
        return;
    }
    output.reserve(s.len() + extra);
    for b in s.bytes() {
        if escape(b) {
            output.push(b'\\');
        }
        output.push(b);
    }
}

fn write_quoted(output: &mut Vec<u8>, s: &str) {
    output.push(b'"');
    write_escaped(output, s, must_escape_quoted);
    output.push(b'"');
}

/// Text rendering of an `f64` as accepted by the server.
pub(crate) fn format_f64(buf: &mut ryu::Buffer, value: f64) -> &str {
    if value.is_finite() {
        buf.format_finite(value)
    } else if value.is_nan() {
        "NaN"
    } else if value.is_sign_negative() {
        "-Infinity"
    } else {
        "Infinity"
    }
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Table = 1,
    Symbol = 1 << 1,
    Column = 1 << 2,
    At = 1 << 3,
}

impl Op {
    fn descr(self) -> &'static str {
        match self {
            Op::Table => "table",
            Op::Symbol => "symbol",
            Op::Column => "column",
            Op::At => "at",
        }
    }
}

/// Which calls are legal next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpCase {
    Init = Op::Table as isize,
    TableWritten = Op::Symbol as isize | Op::Column as isize,
    SymbolWritten = Op::Symbol as isize | Op::Column as isize | Op::At as isize,
    ColumnWritten = Op::Column as isize | Op::At as isize,
}

impl OpCase {
    fn allows(self, op: Op) -> bool {
        (self as isize & op as isize) != 0
    }

    fn next_op_descr(self) -> &'static str {
        match self {
            OpCase::Init => "should have called `table` instead",
            OpCase::TableWritten => "should have called `symbol` or `column` instead",
            OpCase::SymbolWritten => "should have called `symbol`, `column` or `at` instead",
            OpCase::ColumnWritten => "should have called `column` or `at` instead",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct BufferState {
    op_case: OpCase,
    row_count: usize,
}

impl BufferState {
    const fn new() -> Self {
        Self {
            op_case: OpCase::Init,
            row_count: 0,
        }
    }
}

/// Growable line protocol buffer.
///
/// ```
/// use arrow_ilp::line::{Buffer, ColumnName, LineWriter, ProtocolVersion, TableName};
///
/// let mut buf = Buffer::new(ProtocolVersion::V1);
/// buf.table(TableName::new("trades").unwrap()).unwrap();
/// buf.symbol(ColumnName::new("sym").unwrap(), "ETH-USD").unwrap();
/// buf.column_f64(ColumnName::new("price").unwrap(), 2615.54).unwrap();
/// buf.at(1_700_000_000_000_000_000).unwrap();
/// assert_eq!(buf.as_str(), "trades,sym=ETH-USD price=2615.54 1700000000000000000\n");
/// ```
#[derive(Clone)]
pub struct Buffer {
    output: Vec<u8>,
    state: BufferState,
    marker: Option<(usize, BufferState)>,
    max_name_len: usize,
    protocol_version: ProtocolVersion,
}

impl Buffer {
    /// Create an empty buffer with the default name length limit.
    pub fn new(protocol_version: ProtocolVersion) -> Self {
        Self::with_max_name_len(protocol_version, MAX_NAME_LEN_DEFAULT)
    }

    /// Create an empty buffer with a custom name length limit.
    pub fn with_max_name_len(protocol_version: ProtocolVersion, max_name_len: usize) -> Self {
        Self {
            output: Vec::new(),
            state: BufferState::new(),
            marker: None,
            max_name_len,
            protocol_version,
        }
    }

    /// Protocol revision used to encode values.
    pub fn protocol_version(&self) -> ProtocolVersion {
        self.protocol_version
    }

    /// Buffered bytes as text. Binary values of protocol v2 are replaced lossily.
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.output)
    }

    fn check_op(&self, op: Op) -> Result<(), LineError> {
        if self.state.op_case.allows(op) {
            Ok(())
        } else {
            Err(line_err!(
                InvalidApiCall,
                "State error: Bad call to `{}`, {}.",
                op.descr(),
                self.state.op_case.next_op_descr()
            ))
        }
    }

    fn check_name_len(&self, name: &str) -> Result<(), LineError> {
        if name.len() > self.max_name_len {
            return Err(line_err!(
                InvalidName,
                "Bad name: {:?}: Too long (max {} characters)",
                name,
                self.max_name_len
            ));
        }
        Ok(())
    }

    fn write_column_key(&mut self, name: ColumnName<'_>) -> Result<(), LineError> {
        self.check_name_len(name.as_str())?;
        self.check_op(Op::Column)?;
        let sep = if self.state.op_case.allows(Op::Symbol) {
            b' '
        } else {
            b','
        };
        self.output.push(sep);
        write_escaped(&mut self.output, name.as_str(), must_escape_unquoted);
        self.output.push(b'=');
        self.state.op_case = OpCase::ColumnWritten;
        Ok(())
    }

    fn write_int(&mut self, value: i64) {
        let mut buf = itoa::Buffer::new();
        self.output.extend_from_slice(buf.format(value).as_bytes());
    }

    fn end_row(&mut self) {
        self.state.op_case = OpCase::Init;
        self.state.row_count += 1;
    }
}

impl LineWriter for Buffer {
    fn table(&mut self, name: TableName<'_>) -> Result<(), LineError> {
        self.check_name_len(name.as_str())?;
        self.check_op(Op::Table)?;
        write_escaped(&mut self.output, name.as_str(), must_escape_unquoted);
        self.state.op_case = OpCase::TableWritten;
        Ok(())
    }

    fn symbol(&mut self, name: ColumnName<'_>, value: &str) -> Result<(), LineError> {
        self.check_name_len(name.as_str())?;
        self.check_op(Op::Symbol)?;
        self.output.push(b',');
        write_escaped(&mut self.output, name.as_str(), must_escape_unquoted);
        self.output.push(b'=');
        write_escaped(&mut self.output, value, must_escape_unquoted);
        self.state.op_case = OpCase::SymbolWritten;
        Ok(())
    }

    fn column_bool(&mut self, name: ColumnName<'_>, value: bool) -> Result<(), LineError> {
        self.write_column_key(name)?;
        self.output.push(if value { b't' } else { b'f' });
        Ok(())
    }

    fn column_i64(&mut self, name: ColumnName<'_>, value: i64) -> Result<(), LineError> {
        self.write_column_key(name)?;
        self.write_int(value);
        self.output.push(b'i');
        Ok(())
    }

    fn column_f64(&mut self, name: ColumnName<'_>, value: f64) -> Result<(), LineError> {
        self.write_column_key(name)?;
        if self.protocol_version.supports(ProtocolVersion::V2) {
            self.output.push(b'=');
            self.output.push(DOUBLE_BINARY_FORMAT_TYPE);
            self.output.extend_from_slice(&value.to_le_bytes());
        } else {
            let mut buf = ryu::Buffer::new();
            self.output
                .extend_from_slice(format_f64(&mut buf, value).as_bytes());
        }
        Ok(())
    }

    fn column_str(&mut self, name: ColumnName<'_>, value: &str) -> Result<(), LineError> {
        self.write_column_key(name)?;
        write_quoted(&mut self.output, value);
        Ok(())
    }

    fn column_ts(&mut self, name: ColumnName<'_>, nanos: i64) -> Result<(), LineError> {
        self.write_column_key(name)?;
        match self.protocol_version {
            ProtocolVersion::V1 => {
                self.write_int(nanos / 1000);
                self.output.push(b't');
            }
            ProtocolVersion::V2 | ProtocolVersion::V3 => {
                self.write_int(nanos);
                self.output.push(b'n');
            }
        }
        Ok(())
    }

    fn column_arr_f64(&mut self, name: ColumnName<'_>, values: &[f64]) -> Result<(), LineError> {
        if !self.protocol_version.supports(ProtocolVersion::V2) {
            return Err(line_err!(
                ProtocolVersionError,
                "Protocol version {} does not support array datatype",
                self.protocol_version
            ));
        }
        let Ok(dim) = u32::try_from(values.len()) else {
            return Err(line_err!(
                ArrayError,
                "Array dimension {} exceeds the maximum of {}",
                values.len(),
                u32::MAX
            ));
        };
        self.write_column_key(name)?;
        self.output
            .reserve(4 + size_of::<u32>() + values.len() * size_of::<f64>());
        self.output.push(b'=');
        self.output.push(ARRAY_BINARY_FORMAT_TYPE);
        self.output.push(ARRAY_F64_TYPE_TAG);
        self.output.push(1);
        self.output.extend_from_slice(&dim.to_le_bytes());
        for value in values {
            self.output.extend_from_slice(&value.to_le_bytes());
        }
        Ok(())
    }

    fn column_dec(&mut self, name: ColumnName<'_>, value: &Decimal) -> Result<(), LineError> {
        if !self.protocol_version.supports(ProtocolVersion::V3) {
            return Err(line_err!(
                ProtocolVersionError,
                "Protocol version {} does not support the decimal datatype",
                self.protocol_version
            ));
        }
        if value.scale() > MAX_DECIMAL_SCALE {
            return Err(line_err!(
                InvalidDecimal,
                "Decimal scale {} exceeds the maximum of {}",
                value.scale(),
                MAX_DECIMAL_SCALE
            ));
        }
        self.write_column_key(name)?;
        let unscaled = value.unscaled_be();
        self.output.reserve(4 + unscaled.len());
        self.output.push(b'=');
        self.output.push(DECIMAL_BINARY_FORMAT_TYPE);
        self.output.push(value.scale() as u8);
        self.output.push(unscaled.len() as u8);
        self.output.extend_from_slice(unscaled);
        Ok(())
    }

    fn at(&mut self, nanos: i64) -> Result<(), LineError> {
        self.check_op(Op::At)?;
        if nanos < 0 {
            return Err(line_err!(
                InvalidTimestamp,
                "Timestamp {} is negative. It must be >= 0.",
                nanos
            ));
        }
        self.output.push(b' ');
        self.write_int(nanos);
        if self.protocol_version.supports(ProtocolVersion::V2) {
            self.output.push(b'n');
        }
        self.output.push(b'\n');
        self.end_row();
        Ok(())
    }

    fn at_now(&mut self) -> Result<(), LineError> {
        self.check_op(Op::At)?;
        self.output.push(b'\n');
        self.end_row();
        Ok(())
    }

    fn set_marker(&mut self) -> Result<(), LineError> {
        if !self.state.op_case.allows(Op::Table) {
            return Err(line_err!(
                InvalidApiCall,
                "Can't set the marker whilst constructing a line. A marker may only be set on an empty buffer or after `at` or `at_now` is called."
            ));
        }
        self.marker = Some((self.output.len(), self.state));
        Ok(())
    }

    fn rewind_to_marker(&mut self) -> Result<(), LineError> {
        let Some((position, state)) = self.marker.take() else {
            return Err(line_err!(
                InvalidApiCall,
                "Can't rewind to the marker: No marker set."
            ));
        };
        self.output.truncate(position);
        self.state = state;
        Ok(())
    }

    fn clear_marker(&mut self) {
        self.marker = None;
    }

    fn len(&self) -> usize {
        self.output.len()
    }

    fn row_count(&self) -> usize {
        self.state.row_count
    }

    fn as_bytes(&self) -> &[u8] {
        &self.output
    }

    fn clear(&mut self) {
        self.output.clear();
        self.state = BufferState::new();
        self.marker = None;
    }

    fn max_name_len(&self) -> usize {
        self.max_name_len
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("output", &self.as_str())
            .field("state", &self.state)
            .field("marker", &self.marker)
            .field("max_name_len", &self.max_name_len)
            .field("protocol_version", &self.protocol_version)
            .finish()
    }
}
