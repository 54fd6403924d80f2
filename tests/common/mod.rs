#![allow(dead_code)]

use std::sync::{Arc, Once};

use arrow_ilp::{
    arrow_array::{Array, ArrayRef},
    prelude::*,
    TransportError,
};

static TRACING: Once = Once::new();

/// Install a test subscriber once; filtered by `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn arr(array: impl Array + 'static) -> ArrayRef {
    Arc::new(array)
}

/// Transport that records every payload and can be told to fail.
#[derive(Debug, Default)]
pub struct Recording {
    pub payloads: Vec<Vec<u8>>,
    pub fail: bool,
}

impl Recording {
    pub fn text(&self) -> String {
        self.payloads
            .iter()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .collect()
    }
}

impl Transport for Recording {
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if self.fail {
            return Err(TransportError::Rejected("connection refused".into()));
        }
        self.payloads.push(payload.to_vec());
        Ok(())
    }
}

/// Encode `batch` into `buf` without auto-flush or host lock.
pub fn encode(
    buf: &mut Buffer,
    table: &TableSpec,
    symbols: &SymbolsSpec,
    at: &AtSpec,
    batch: &Batch,
) -> Result<(), EncodeError> {
    init_tracing();
    let mut strings = StrBuffer::new();
    let mut flush = NoFlush;
    let mut access = ExclusiveAccess::unmanaged();
    let mut ctx = EncodeContext::new(buf, &mut strings, &mut flush, &mut access);
    encode_batch(&mut ctx, table, symbols, at, batch)
}

/// Encode into a fresh V1 buffer and return the text.
pub fn render(
    table: &TableSpec,
    symbols: &SymbolsSpec,
    at: &AtSpec,
    batch: &Batch,
) -> Result<String, EncodeError> {
    let mut buf = Buffer::new(ProtocolVersion::V1);
    encode(&mut buf, table, symbols, at, batch)?;
    Ok(buf.as_str().into_owned())
}

pub fn table(name: &str) -> TableSpec {
    TableSpec::Name(name.to_owned())
}
