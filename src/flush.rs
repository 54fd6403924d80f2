//! Transport seam and the auto-flush controller.

use std::{io, time::Instant};

use tracing::{debug, trace};

use crate::{
    config::AutoFlushConfig,
    error::{Result, TransportError},
    line::LineWriter,
};

/// Destination for flushed line protocol payloads.
pub trait Transport {
    /// Deliver `payload` in full or fail.
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        (**self).send(payload)
    }
}

/// Adapts any [`io::Write`] into a [`Transport`].
#[derive(Debug, Default)]
pub struct WriteTransport<W> {
    inner: W,
}

impl<W: io::Write> WriteTransport<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Borrow the wrapped writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> Transport for WriteTransport<W> {
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.inner.write_all(payload)?;
        self.inner.flush()?;
        Ok(())
    }
}

/// Decides when the encoder flushes and performs the flush.
///
/// Consulted after every committed row, never in the middle of one.
pub trait FlushHook<W: LineWriter + ?Sized> {
    /// Whether the buffered rows should be flushed now.
    fn should_flush(&mut self, writer: &W) -> bool;
    /// Send the buffered rows and clear the writer.
    ///
    /// On failure the writer keeps its contents.
    fn flush(&mut self, writer: &mut W) -> Result<(), TransportError>;
}

/// Hook that never flushes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFlush;

impl<W: LineWriter + ?Sized> FlushHook<W> for NoFlush {
    fn should_flush(&mut self, _: &W) -> bool {
        false
    }

    fn flush(&mut self, _: &mut W) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Flushes to a [`Transport`] when row, byte or interval thresholds are reached.
#[derive(Debug)]
pub struct AutoFlushController<T> {
    config: AutoFlushConfig,
    transport: T,
    last_flush: Instant,
}

impl<T: Transport> AutoFlushController<T> {
    /// Validate `config` and take ownership of `transport`.
    pub fn new(config: AutoFlushConfig, transport: T) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            last_flush: Instant::now(),
        })
    }

    /// Active thresholds.
    pub fn config(&self) -> &AutoFlushConfig {
        &self.config
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Unwrap the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Send whatever `writer` holds, regardless of thresholds.
    pub fn flush_now<W: LineWriter + ?Sized>(
        &mut self,
        writer: &mut W,
    ) -> Result<(), TransportError> {
        if writer.is_empty() {
            return Ok(());
        }
        let (bytes, rows) = (writer.len(), writer.row_count());
        self.transport.send(writer.as_bytes())?;
        writer.clear();
        self.last_flush = Instant::now();
        debug!(bytes, rows, "flushed buffer");
        Ok(())
    }
}

impl<T: Transport, W: LineWriter + ?Sized> FlushHook<W> for AutoFlushController<T> {
    fn should_flush(&mut self, writer: &W) -> bool {
        if !self.config.enabled || writer.row_count() == 0 {
            return false;
        }
        let by_rows = self
            .config
            .rows()
            .is_some_and(|rows| writer.row_count() >= rows.get());
        let by_bytes = self
            .config
            .bytes()
            .is_some_and(|bytes| writer.len() >= bytes.get());
        let by_time = self
            .config
            .interval()
            .is_some_and(|interval| self.last_flush.elapsed() >= interval);
        trace!(by_rows, by_bytes, by_time, "auto-flush check");
        by_rows || by_bytes || by_time
    }

    fn flush(&mut self, writer: &mut W) -> Result<(), TransportError> {
        self.flush_now(writer)
    }
}
