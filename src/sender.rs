//! A buffer, string arena and auto-flush controller bundled behind one handle.

use std::num::NonZeroUsize;

use crate::{
    batch::Batch,
    config::EncoderConfig,
    encode::{EncodeContext, encode_batch},
    error::Result,
    flush::{AutoFlushController, Transport},
    host::{ExclusiveAccess, HostLock},
    line::{Buffer, LineWriter},
    plan::{AtSpec, SymbolsSpec, TableSpec},
    strings::StrBuffer,
};

/// Encodes batches into an owned [`Buffer`] and flushes them to a transport.
///
/// ```
/// use std::sync::Arc;
///
/// use arrow_array::{ArrayRef, Float64Array, StringArray};
/// use arrow_ilp::prelude::*;
///
/// let batch = Batch::try_new(vec![
///     InputColumn::new("city", Arc::new(StringArray::from(vec!["Paris"])) as ArrayRef),
///     InputColumn::new("temp", Arc::new(Float64Array::from(vec![21.5])) as ArrayRef),
/// ])?;
/// let config = EncoderConfig {
///     auto_flush: AutoFlushConfig::off(),
///     ..EncoderConfig::default()
/// };
/// let mut sender = Sender::new(WriteTransport::new(Vec::new()), &config)?;
/// sender.dataframe(
///     &TableSpec::Name("weather".into()),
///     &SymbolsSpec::Columns(vec!["city".into()]),
///     &AtSpec::Server,
///     &batch,
/// )?;
/// sender.flush()?;
/// assert_eq!(sender.transport().get_ref().as_slice(), b"weather,city=Paris temp=21.5\n");
/// # Ok::<(), arrow_ilp::EncodeError>(())
/// ```
#[derive(Debug)]
pub struct Sender<T> {
    buffer: Buffer,
    strings: StrBuffer,
    auto_flush: AutoFlushController<T>,
    lock: Option<&'static HostLock>,
    pulse_rows: NonZeroUsize,
}

impl<T: Transport> Sender<T> {
    /// Validate `config` and create a sender writing to `transport`.
    pub fn new(transport: T, config: &EncoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            buffer: Buffer::with_max_name_len(config.protocol_version, config.max_name_len),
            strings: StrBuffer::new(),
            auto_flush: AutoFlushController::new(config.auto_flush.clone(), transport)?,
            lock: None,
            pulse_rows: config.pulse_rows(),
        })
    }

    /// Take `lock` around every [`dataframe`](Self::dataframe) call.
    pub fn with_host_lock(mut self, lock: &'static HostLock) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Encode `batch` and auto-flush as configured.
    pub fn dataframe(
        &mut self,
        table: &TableSpec,
        symbols: &SymbolsSpec,
        at: &AtSpec,
        batch: &Batch,
    ) -> Result<()> {
        let mut access = match self.lock {
            Some(lock) => ExclusiveAccess::held(lock),
            None => ExclusiveAccess::unmanaged(),
        };
        let mut ctx = EncodeContext::new(
            &mut self.buffer,
            &mut self.strings,
            &mut self.auto_flush,
            &mut access,
        )
        .with_pulse_rows(self.pulse_rows);
        encode_batch(&mut ctx, table, symbols, at, batch)
    }

    /// Send everything buffered.
    pub fn flush(&mut self) -> Result<()> {
        self.auto_flush.flush_now(&mut self.buffer)?;
        Ok(())
    }

    /// Buffered rows not yet flushed.
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Number of bytes waiting to be flushed.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &T {
        self.auto_flush.transport()
    }

    /// Mutably borrow the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        self.auto_flush.transport_mut()
    }

    /// Drop the sender and return its transport. Unflushed rows are discarded.
    pub fn into_transport(self) -> T {
        self.auto_flush.into_transport()
    }
}
