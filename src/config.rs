//! Encoder configuration.

use std::{num::NonZeroUsize, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    error::{EncodeError, Result},
    line::{MAX_NAME_LEN_DEFAULT, ProtocolVersion},
};

/// Rows encoded between two pulses of a released host lock.
pub const DEFAULT_PULSE_ROWS: usize = 5_000;

/// Thresholds that trigger an automatic flush.
///
/// Any subset may be set; when enabled at least one must be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoFlushConfig {
    /// Master switch.
    pub enabled: bool,
    /// Flush once this many rows are buffered.
    pub rows: Option<usize>,
    /// Flush once this many bytes are buffered.
    pub bytes: Option<usize>,
    /// Flush once this many milliseconds passed since the last flush.
    pub interval_ms: Option<u64>,
}

impl Default for AutoFlushConfig {
    /// HTTP defaults: every 75 000 rows or every second.
    fn default() -> Self {
        Self {
            enabled: true,
            rows: Some(75_000),
            bytes: None,
            interval_ms: Some(1_000),
        }
    }
}

impl AutoFlushConfig {
    /// TCP defaults: every 600 rows or every second.
    pub fn tcp() -> Self {
        Self {
            rows: Some(600),
            ..Self::default()
        }
    }

    /// Never flush automatically.
    pub fn off() -> Self {
        Self {
            enabled: false,
            rows: None,
            bytes: None,
            interval_ms: None,
        }
    }

    /// Row threshold, if active.
    pub fn rows(&self) -> Option<NonZeroUsize> {
        self.rows.and_then(NonZeroUsize::new)
    }

    /// Byte threshold, if active.
    pub fn bytes(&self) -> Option<NonZeroUsize> {
        self.bytes.and_then(NonZeroUsize::new)
    }

    /// Interval threshold, if active.
    pub fn interval(&self) -> Option<Duration> {
        self.interval_ms.map(Duration::from_millis)
    }

    /// Check the thresholds for consistency.
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        for (arg, value) in [
            ("auto_flush_rows", self.rows.map(|v| v as u64)),
            ("auto_flush_bytes", self.bytes.map(|v| v as u64)),
            ("auto_flush_interval", self.interval_ms),
        ] {
            if value == Some(0) {
                return Err(EncodeError::bad_argument(arg, "must be greater than 0"));
            }
        }
        if self.rows.is_none() && self.bytes.is_none() && self.interval_ms.is_none() {
            return Err(EncodeError::bad_argument(
                "auto_flush",
                "Cannot enable auto flush without specifying at least one of `auto_flush_rows`, `auto_flush_bytes` or `auto_flush_interval`.",
            ));
        }
        Ok(())
    }
}

/// Settings for a [`Sender`](crate::sender::Sender).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Line protocol revision.
    pub protocol_version: ProtocolVersion,
    /// Longest accepted table or column name.
    pub max_name_len: usize,
    /// Automatic flush thresholds.
    pub auto_flush: AutoFlushConfig,
    /// Rows between host lock pulses while encoding lock-free.
    pub pulse_rows: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            protocol_version: ProtocolVersion::default(),
            max_name_len: MAX_NAME_LEN_DEFAULT,
            auto_flush: AutoFlushConfig::default(),
            pulse_rows: DEFAULT_PULSE_ROWS,
        }
    }
}

impl EncoderConfig {
    /// Check every setting.
    pub fn validate(&self) -> Result<()> {
        if self.max_name_len == 0 {
            return Err(EncodeError::bad_argument(
                "max_name_len",
                "must be greater than 0",
            ));
        }
        if self.pulse_rows == 0 {
            return Err(EncodeError::bad_argument("pulse_rows", "must be greater than 0"));
        }
        self.auto_flush.validate()
    }

    /// Pulse cadence. Zero, rejected by [`validate`](Self::validate), reads as one.
    pub fn pulse_rows(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.pulse_rows).unwrap_or(NonZeroUsize::MIN)
    }
}
