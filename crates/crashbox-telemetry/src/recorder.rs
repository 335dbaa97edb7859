//! Crash capture
//!
//! [`CrashRecorder`] turns an unhandled fault into a `.stacktrace` record on
//! disk, synchronously, on the faulting thread, and then hands the fault to
//! the handler that was active before it. The previous handler is always an
//! explicit value: [`install`] wraps whatever `std::panic::take_hook`
//! returned, tests pass their own [`FaultHandler`].

use std::error::Error;
use std::panic::PanicHookInfo;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crashbox_core::domain::{now_millis, Fault, SessionContext, ThreadInfo};
use tracing::{error, info};

use crate::store::{RecordHandle, RecordStore, StoreError};

/// A process panic hook, as returned by `std::panic::take_hook`.
pub type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

/// Receives unhandled faults.
pub trait FaultHandler: Send + Sync {
    fn on_uncaught_fault(&self, thread: &ThreadInfo, fault: &Fault<'_>);
}

impl<T: FaultHandler + ?Sized> FaultHandler for Arc<T> {
    fn on_uncaught_fault(&self, thread: &ThreadInfo, fault: &Fault<'_>) {
        (**self).on_uncaught_fault(thread, fault)
    }
}

/// Adapts a previously installed panic hook to [`FaultHandler`].
///
/// The hook is only called for faults that came from a panic, with the
/// original `PanicHookInfo`. Faults built from plain errors have no hook
/// argument to pass on.
pub struct PanicHookChain(PanicHook);

impl PanicHookChain {
    pub fn new(hook: PanicHook) -> Self {
        Self(hook)
    }
}

impl FaultHandler for PanicHookChain {
    fn on_uncaught_fault(&self, _thread: &ThreadInfo, fault: &Fault<'_>) {
        if let Some(info) = fault.panic_info() {
            (self.0)(info);
        }
    }
}

impl std::fmt::Debug for PanicHookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PanicHookChain")
    }
}

/// Persists faults as records, then chains to the previous handler.
pub struct CrashRecorder<H> {
    context: Arc<SessionContext>,
    store: RecordStore,
    previous: H,
    last_stamp: AtomicI64,
}

impl<H: FaultHandler> CrashRecorder<H> {
    pub fn new(context: Arc<SessionContext>, store: RecordStore, previous: H) -> Self {
        Self {
            context,
            store,
            previous,
            last_stamp: AtomicI64::new(i64::MIN),
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Serializes `fault` and writes it to the store. Does not chain.
    pub fn record_fault(
        &self,
        thread: &ThreadInfo,
        fault: &Fault<'_>,
    ) -> Result<RecordHandle, StoreError> {
        let stamp = self.next_stamp(now_millis());
        let record = self.context.record(stamp, fault.trace_text(thread));
        self.store.write(stamp, record.to_wire().as_bytes())
    }

    /// Records a fatal error the host caught itself, attributed to the
    /// calling thread. The previous handler is not involved.
    pub fn record_error<E: Error + 'static>(&self, err: &E) -> Result<RecordHandle, StoreError> {
        self.record_fault(&ThreadInfo::current(), &Fault::from_error(err))
    }

    /// Strictly increasing capture stamps, so two faults in the same
    /// millisecond get distinct file names.
    fn next_stamp(&self, now: i64) -> i64 {
        let mut last = self.last_stamp.load(Ordering::SeqCst);
        loop {
            let next = now.max(last.saturating_add(1));
            match self
                .last_stamp
                .compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}

impl<H: FaultHandler> FaultHandler for CrashRecorder<H> {
    fn on_uncaught_fault(&self, thread: &ThreadInfo, fault: &Fault<'_>) {
        match self.record_fault(thread, fault) {
            Ok(handle) => info!(record = %handle.name, thread = %thread, "Crash record saved"),
            Err(e) => error!(error = %e, thread = %thread, "Failed to save crash record"),
        }

        self.previous.on_uncaught_fault(thread, fault);
    }
}

/// Installs a recorder as the process panic hook.
///
/// `previous` is the hook to chain to, normally `std::panic::take_hook()`.
/// The returned recorder is the same instance the hook uses.
///
/// The hook runs before unwinding starts, so panics that are later caught
/// (`std::panic::catch_unwind`, a Tokio task observed through its
/// `JoinHandle`) are recorded as crashes too.
pub fn install(
    context: Arc<SessionContext>,
    store: RecordStore,
    previous: PanicHook,
) -> Arc<CrashRecorder<PanicHookChain>> {
    let recorder = Arc::new(CrashRecorder::new(
        context,
        store,
        PanicHookChain::new(previous),
    ));

    let hook = Arc::clone(&recorder);
    std::panic::set_hook(Box::new(move |info| {
        let thread = ThreadInfo::current();
        let fault = Fault::from_panic(info);
        hook.on_uncaught_fault(&thread, &fault);
    }));

    info!(dir = %recorder.store().dir().display(), "Crash recorder installed");
    recorder
}
