//! Row transactor: runs a planned batch row by row into a [`LineWriter`].

use std::num::NonZeroUsize;

use tracing::{debug, warn};

use crate::{
    access::{AccessPolicy, AccessScope},
    batch::Batch,
    config::DEFAULT_PULSE_ROWS,
    dispatch::Emit,
    error::{EncodeError, Result},
    flush::FlushHook,
    host::ExclusiveAccess,
    line::{LineWriter, TableName},
    plan::{AtSpec, AtTarget, Plan, SymbolsSpec, TableSpec},
    strings::StrBuffer,
};

/// Everything one [`encode_batch`] call borrows exclusively.
pub struct EncodeContext<'c, 'h, W, F> {
    writer: &'c mut W,
    strings: &'c mut StrBuffer,
    flush: &'c mut F,
    access: &'c mut ExclusiveAccess<'h>,
    pulse_rows: NonZeroUsize,
}

impl<'c, 'h, W: LineWriter, F: FlushHook<W>> EncodeContext<'c, 'h, W, F> {
    /// Bundle the collaborators of an encode call.
    pub fn new(
        writer: &'c mut W,
        strings: &'c mut StrBuffer,
        flush: &'c mut F,
        access: &'c mut ExclusiveAccess<'h>,
    ) -> Self {
        Self {
            writer,
            strings,
            flush,
            access,
            pulse_rows: NonZeroUsize::new(DEFAULT_PULSE_ROWS).unwrap_or(NonZeroUsize::MIN),
        }
    }

    /// Rows between two host lock pulses while the lock is released.
    pub fn with_pulse_rows(mut self, pulse_rows: NonZeroUsize) -> Self {
        self.pulse_rows = pulse_rows;
        self
    }

    /// The writer rows are appended to.
    pub fn writer(&self) -> &W {
        self.writer
    }
}

/// Encode every row of `batch` into the context's writer.
///
/// On success every row is buffered or already flushed. On failure, other
/// than a failed flush, the writer is rewound to its state before the call or
/// after the last auto-flush, whichever is later. A failed flush leaves the
/// unsent rows buffered.
pub fn encode_batch<W: LineWriter, F: FlushHook<W>>(
    ctx: &mut EncodeContext<'_, '_, W, F>,
    table: &TableSpec,
    symbols: &SymbolsSpec,
    at: &AtSpec,
    batch: &Batch,
) -> Result<()> {
    if batch.column_count() == 0 || batch.row_count() == 0 {
        return Ok(());
    }
    let mut plan = Plan::<W>::build(table, symbols, at, batch, ctx.writer.max_name_len())?;
    let policy = AccessPolicy::for_kinds(plan.kinds(), ctx.pulse_rows);
    debug!(
        rows = batch.row_count(),
        columns = plan.columns().len(),
        ?policy,
        "encoding batch"
    );

    ctx.writer.set_marker()?;
    let checkpoint = ctx.strings.tell();
    let result = {
        let mut scope = AccessScope::enter(ctx.access, policy);
        run_rows(
            &mut plan,
            ctx.writer,
            ctx.strings,
            ctx.flush,
            &mut scope,
            batch.row_count(),
        )
    };
    ctx.strings.truncate(checkpoint);

    match &result {
        Ok(()) | Err(EncodeError::Flush(_)) => ctx.writer.clear_marker(),
        Err(err) => {
            warn!(error = %err, "rewinding batch");
            if let Err(rewind) = ctx.writer.rewind_to_marker() {
                warn!(error = %rewind, "failed to rewind batch");
            }
        }
    }
    result
}

fn run_rows<W: LineWriter, F: FlushHook<W>>(
    plan: &mut Plan<'_, W>,
    writer: &mut W,
    strings: &mut StrBuffer,
    flush: &mut F,
    scope: &mut AccessScope<'_, '_>,
    rows: usize,
) -> Result<()> {
    for row in 0..rows {
        let pos = strings.tell();
        let outcome = encode_row(plan, writer, strings, row);
        strings.truncate(pos);
        outcome?;

        plan.advance();
        scope.tick(row + 1);
        if flush.should_flush(writer) {
            scope.unlocked(|| flush.flush(writer))?;
            writer.set_marker()?;
        }
    }
    Ok(())
}

fn encode_row<W: LineWriter>(
    plan: &Plan<'_, W>,
    writer: &mut W,
    strings: &mut StrBuffer,
    row: usize,
) -> Result<()> {
    if let Some(name) = plan.table() {
        writer.table(TableName::new_unchecked(name))?;
    }
    let mut payload = 0usize;
    for col in plan.columns() {
        match col.serialize(writer, strings) {
            Ok(Emit::Written) => payload += usize::from(col.role().is_payload()),
            Ok(Emit::Skipped) => {}
            Err(source) => return Err(col.cell_error(row, source)),
        }
    }
    if payload == 0 {
        return Err(EncodeError::EmptyRow { row });
    }
    match plan.at() {
        AtTarget::Server => writer.at_now()?,
        AtTarget::Fixed(nanos) => writer.at(*nanos)?,
        AtTarget::Column(col) => {
            col.serialize(writer, strings)
                .map_err(|source| col.cell_error(row, source))?;
        }
    }
    Ok(())
}
