//! Host runtime model: boxed cell values and the runtime's exclusive-access lock.

use std::fmt;

use once_cell::sync::Lazy;
use parking_lot::{Mutex, MutexGuard};

use crate::line::format_decimal;

/// String storage as kept by the host runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostStr {
    /// Already UTF-8.
    Utf8(String),
    /// One byte per code point (Latin-1).
    Ucs1(Vec<u8>),
    /// Two bytes per code point.
    Ucs2(Vec<u16>),
    /// Four bytes per code point.
    Ucs4(Vec<u32>),
}

impl From<&str> for HostStr {
    fn from(s: &str) -> Self {
        Self::Utf8(s.to_owned())
    }
}

impl From<String> for HostStr {
    fn from(s: String) -> Self {
        Self::Utf8(s)
    }
}

impl fmt::Display for HostStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lossy = |u: u32| char::from_u32(u).unwrap_or(char::REPLACEMENT_CHARACTER);
        match self {
            Self::Utf8(s) => f.write_str(s),
            Self::Ucs1(units) => units.iter().try_for_each(|&u| write!(f, "{}", char::from(u))),
            Self::Ucs2(units) => units
                .iter()
                .try_for_each(|&u| write!(f, "{}", lossy(u32::from(u)))),
            Self::Ucs4(units) => units.iter().try_for_each(|&u| write!(f, "{}", lossy(u))),
        }
    }
}

/// One boxed cell of a host-runtime object column.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    /// Missing value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Arbitrary precision integers are modelled up to 128 bits.
    Int(i128),
    /// Double precision float. `NaN` counts as null outside float columns.
    Float(f64),
    /// String.
    Str(HostStr),
    /// Exact decimal `unscaled * 10^-scale`, modelled up to 128 bits.
    Decimal {
        /// Value without the decimal point.
        unscaled: i128,
        /// Digits after the decimal point.
        scale: u32,
    },
    /// Any other host object, carrying its type name.
    Other(&'static str),
}

impl HostValue {
    /// Host type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "None",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Decimal { .. } => "Decimal",
            Self::Other(name) => *name,
        }
    }

    /// Whether the cell is skipped when sniffing a column's type.
    pub fn is_null_like(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Float(v) => v.is_nan(),
            _ => false,
        }
    }
}

impl From<bool> for HostValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for HostValue {
    fn from(v: i64) -> Self {
        Self::Int(i128::from(v))
    }
}

impl From<f64> for HostValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for HostValue {
    fn from(v: &str) -> Self {
        Self::Str(v.into())
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) if v.is_nan() => f.write_str("nan"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Str(s) => write!(f, "'{s}'"),
            Self::Decimal { unscaled, scale } => write!(
                f,
                "Decimal('{}')",
                format_decimal(&unscaled.to_string(), *scale)
            ),
            Self::Other(name) => write!(f, "<{name} object>"),
        }
    }
}

/// The host runtime's global exclusive-access lock.
#[derive(Debug, Default)]
pub struct HostLock {
    inner: Mutex<()>,
}

static GLOBAL_HOST_LOCK: Lazy<HostLock> = Lazy::new(HostLock::new);

impl HostLock {
    /// Create an independent lock.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(()),
        }
    }

    /// The process-wide lock, created on first use.
    pub fn global() -> &'static HostLock {
        &GLOBAL_HOST_LOCK
    }

    /// Whether some token currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }
}

/// Token tracking whether the current call holds the [`HostLock`].
///
/// The token is threaded through the row loop. Releasing and reacquiring go
/// through this value only, so the lock state is always known to the caller.
pub struct ExclusiveAccess<'a> {
    lock: Option<&'a HostLock>,
    guard: Option<MutexGuard<'a, ()>>,
}

impl<'a> ExclusiveAccess<'a> {
    /// Take `lock` and return a token that holds it.
    pub fn held(lock: &'a HostLock) -> Self {
        Self {
            lock: Some(lock),
            guard: Some(lock.inner.lock()),
        }
    }

    /// Token for callers that have no host runtime; every operation is a no-op.
    pub fn unmanaged() -> Self {
        Self {
            lock: None,
            guard: None,
        }
    }

    /// Whether the token currently holds the lock.
    pub fn is_held(&self) -> bool {
        self.guard.is_some()
    }

    /// Whether a lock is attached at all.
    pub fn is_managed(&self) -> bool {
        self.lock.is_some()
    }

    /// Drop the lock if held.
    pub fn release(&mut self) {
        self.guard = None;
    }

    /// Take the lock if attached and not already held.
    pub fn acquire(&mut self) {
        if self.guard.is_none() {
            if let Some(lock) = self.lock {
                self.guard = Some(lock.inner.lock());
            }
        }
    }

    /// Briefly take and drop the lock so other waiters can be scheduled.
    pub fn pulse(&mut self) {
        if self.guard.is_none() {
            if let Some(lock) = self.lock {
                drop(lock.inner.lock());
            }
        }
    }

    /// Run `f` with the lock temporarily released.
    pub fn unlocked<R>(&mut self, f: impl FnOnce() -> R) -> R {
        match self.guard.as_mut() {
            Some(guard) => MutexGuard::unlocked(guard, f),
            None => f(),
        }
    }
}

impl fmt::Debug for ExclusiveAccess<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExclusiveAccess")
            .field("managed", &self.is_managed())
            .field("held", &self.is_held())
            .finish()
    }
}
