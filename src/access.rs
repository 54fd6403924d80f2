//! Exclusive-access scheduling for the row loop.

use std::{
    num::NonZeroUsize,
    ops::{Deref, DerefMut},
};

use crate::{column::StorageKind, host::ExclusiveAccess};

/// How the host lock is handled while a batch is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Hold the lock for the whole batch; some column reads host objects.
    Hold,
    /// Release the lock for the batch, pulsing it every `pulse_rows` rows.
    Release {
        /// Rows between two pulses.
        pulse_rows: NonZeroUsize,
    },
}

impl AccessPolicy {
    /// Pick the policy for a batch made of `kinds`.
    pub fn for_kinds(
        kinds: impl IntoIterator<Item = StorageKind>,
        pulse_rows: NonZeroUsize,
    ) -> Self {
        if kinds.into_iter().any(StorageKind::needs_host_access) {
            Self::Hold
        } else {
            Self::Release { pulse_rows }
        }
    }
}

/// Applies an [`AccessPolicy`] to a token for the duration of the row loop.
///
/// Under [`AccessPolicy::Release`] a held lock is dropped on entry and taken
/// back when the scope ends, on every exit path.
pub(crate) struct AccessScope<'s, 'h> {
    access: &'s mut ExclusiveAccess<'h>,
    pulse_rows: Option<NonZeroUsize>,
}

impl<'s, 'h> AccessScope<'s, 'h> {
    pub(crate) fn enter(access: &'s mut ExclusiveAccess<'h>, policy: AccessPolicy) -> Self {
        let pulse_rows = match policy {
            AccessPolicy::Release { pulse_rows } if access.is_held() => {
                access.release();
                Some(pulse_rows)
            }
            _ => None,
        };
        Self { access, pulse_rows }
    }

    /// Called after each committed row.
    #[inline]
    pub(crate) fn tick(&mut self, rows_done: usize) {
        if let Some(every) = self.pulse_rows {
            if rows_done % every.get() == 0 {
                self.access.pulse();
            }
        }
    }
}

impl<'h> Deref for AccessScope<'_, 'h> {
    type Target = ExclusiveAccess<'h>;

    fn deref(&self) -> &Self::Target {
        self.access
    }
}

impl DerefMut for AccessScope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.access
    }
}

impl Drop for AccessScope<'_, '_> {
    fn drop(&mut self) {
        if self.pulse_rows.is_some() {
            self.access.acquire();
        }
    }
}
