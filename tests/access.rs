mod common;

use std::{
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread,
    time::Duration,
};

use arrow_ilp::arrow_array::{Float64Array, UInt64Array};
use arrow_ilp::{AccessPolicy, StorageKind, TransportError, prelude::*};
use common::{arr, init_tracing, table};

/// Flush hook recording the lock state at every check and every flush.
struct LockWatch<'l> {
    lock: &'l HostLock,
    every: usize,
    checks: Vec<bool>,
    flushes: Vec<bool>,
}

impl<'l> LockWatch<'l> {
    fn new(lock: &'l HostLock, every: usize) -> Self {
        Self {
            lock,
            every,
            checks: Vec::new(),
            flushes: Vec::new(),
        }
    }
}

impl FlushHook<Buffer> for LockWatch<'_> {
    fn should_flush(&mut self, writer: &Buffer) -> bool {
        self.checks.push(self.lock.is_locked());
        writer.row_count() >= self.every
    }

    fn flush(&mut self, writer: &mut Buffer) -> Result<(), TransportError> {
        self.flushes.push(self.lock.is_locked());
        writer.clear();
        Ok(())
    }
}

fn run(
    watch: &mut LockWatch<'_>,
    token: &mut ExclusiveAccess<'_>,
    batch: &Batch,
) -> Result<(), EncodeError> {
    init_tracing();
    let mut buf = Buffer::new(ProtocolVersion::V1);
    let mut strings = StrBuffer::new();
    let mut ctx = EncodeContext::new(&mut buf, &mut strings, watch, token)
        .with_pulse_rows(NonZeroUsize::new(2).unwrap());
    encode_batch(&mut ctx, &table("t"), &SymbolsSpec::Auto, &AtSpec::Server, batch)
}

#[test]
fn boxed_columns_hold_the_lock_except_while_flushing() {
    let lock = HostLock::new();
    let mut token = ExclusiveAccess::held(&lock);
    let mut watch = LockWatch::new(&lock, 2);
    let batch = Batch::try_new(vec![InputColumn::new(
        "o",
        (0..5).map(|i| HostValue::Int(i)).collect::<Vec<_>>(),
    )])
    .unwrap();
    run(&mut watch, &mut token, &batch).unwrap();

    assert_eq!(watch.checks, vec![true; 5]);
    assert_eq!(watch.flushes, vec![false, false]);
    assert!(token.is_held() && lock.is_locked());
}

#[test]
fn arrow_columns_release_the_lock() {
    let lock = HostLock::new();
    let mut token = ExclusiveAccess::held(&lock);
    let mut watch = LockWatch::new(&lock, 3);
    let batch = Batch::try_new(vec![InputColumn::new(
        "f",
        arr(Float64Array::from(vec![0.5; 7])),
    )])
    .unwrap();
    run(&mut watch, &mut token, &batch).unwrap();

    assert_eq!(watch.checks, vec![false; 7]);
    assert_eq!(watch.flushes, vec![false, false]);
    assert!(token.is_held() && lock.is_locked());
}

#[test]
fn lock_is_restored_after_an_error() {
    let lock = HostLock::new();
    let mut token = ExclusiveAccess::held(&lock);
    let mut watch = LockWatch::new(&lock, usize::MAX);
    let batch = Batch::try_new(vec![InputColumn::new(
        "u",
        arr(UInt64Array::from(vec![1, u64::MAX])),
    )])
    .unwrap();
    run(&mut watch, &mut token, &batch).unwrap_err();
    assert_eq!(watch.checks, vec![false]);
    assert!(token.is_held() && lock.is_locked());
}

#[test]
fn unmanaged_token_never_locks() {
    let lock = HostLock::new();
    let mut token = ExclusiveAccess::unmanaged();
    let mut watch = LockWatch::new(&lock, 1);
    let batch = Batch::try_new(vec![InputColumn::new(
        "o",
        vec![HostValue::from(true), HostValue::from(false)],
    )])
    .unwrap();
    run(&mut watch, &mut token, &batch).unwrap();
    assert_eq!(watch.checks, vec![false, false]);
    assert!(!token.is_held());
}

/// Hands the released lock to another thread after the first row and records,
/// at every check, whether that thread has let go of it again.
struct Handoff<'a> {
    released: &'a AtomicBool,
    take: Option<mpsc::Sender<()>>,
    taken: mpsc::Receiver<()>,
    seen: Vec<bool>,
}

impl FlushHook<Buffer> for Handoff<'_> {
    fn should_flush(&mut self, _: &Buffer) -> bool {
        self.seen.push(self.released.load(Ordering::SeqCst));
        if let Some(take) = self.take.take() {
            take.send(()).unwrap();
            self.taken.recv().unwrap();
        }
        false
    }

    fn flush(&mut self, _: &mut Buffer) -> Result<(), TransportError> {
        Ok(())
    }
}

#[test]
fn pulse_waits_for_a_contending_thread() {
    init_tracing();
    let lock = HostLock::new();
    let released = AtomicBool::new(false);
    let (take_tx, take_rx) = mpsc::channel();
    let (taken_tx, taken_rx) = mpsc::channel();
    let batch = Batch::try_new(vec![InputColumn::new(
        "f",
        arr(Float64Array::from(vec![1.0, 2.0, 3.0, 4.0])),
    )])
    .unwrap();

    thread::scope(|s| {
        let (lock, released) = (&lock, &released);
        s.spawn(move || {
            take_rx.recv().unwrap();
            let other = ExclusiveAccess::held(lock);
            taken_tx.send(()).unwrap();
            thread::sleep(Duration::from_millis(50));
            released.store(true, Ordering::SeqCst);
            drop(other);
        });

        let mut token = ExclusiveAccess::held(lock);
        let mut hook = Handoff {
            released,
            take: Some(take_tx),
            taken: taken_rx,
            seen: Vec::new(),
        };
        let mut buf = Buffer::new(ProtocolVersion::V1);
        let mut strings = StrBuffer::new();
        let mut ctx = EncodeContext::new(&mut buf, &mut strings, &mut hook, &mut token)
            .with_pulse_rows(NonZeroUsize::new(2).unwrap());
        encode_batch(&mut ctx, &table("t"), &SymbolsSpec::Auto, &AtSpec::Server, &batch).unwrap();
        drop(ctx);

        assert_eq!(hook.seen, vec![false, true, true, true]);
        assert!(token.is_held());
        assert_eq!(buf.row_count(), 4);
    });
}

#[test]
fn policy_selection() {
    let pulse = NonZeroUsize::new(10).unwrap();
    assert_eq!(
        AccessPolicy::for_kinds([StorageKind::ChunkedF64, StorageKind::Utf8], pulse),
        AccessPolicy::Release { pulse_rows: pulse }
    );
    assert_eq!(
        AccessPolicy::for_kinds([StorageKind::Utf8, StorageKind::BoxedStr], pulse),
        AccessPolicy::Hold
    );
}
