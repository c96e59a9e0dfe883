//! Output capture harness
//!
//! The runner writes console output into an explicit `OutputSink` rather
//! than the process-wide streams, so capture needs no redirection and no
//! restoration. The harness wraps one operation future: it times it, traps
//! panics, and always produces exactly one `OperationResult` - snapshotting
//! whatever partial output exists before any fault is reported.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures::FutureExt;
use stackd_foundation::{Error, OperationResult, Result};

/// Cloneable handle over the stdout/stderr buffers for one operation.
///
/// Writers never block; clones share the same buffers.
#[derive(Clone, Default)]
pub struct OutputSink {
    inner: Arc<SinkBuffers>,
}

#[derive(Default)]
struct SinkBuffers {
    stdout: Mutex<String>,
    stderr: Mutex<String>,
}

impl OutputSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_stdout(&self, text: &str) {
        push(&self.inner.stdout, text);
    }

    pub fn write_stderr(&self, text: &str) {
        push(&self.inner.stderr, text);
    }

    /// Copy of everything written so far
    pub fn snapshot(&self) -> (String, String) {
        (read(&self.inner.stdout), read(&self.inner.stderr))
    }
}

fn push(buffer: &Mutex<String>, text: &str) {
    // A panicked writer must not lose the output captured so far.
    let mut guard = buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.push_str(text);
}

fn read(buffer: &Mutex<String>) -> String {
    buffer
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Run one operation under capture.
///
/// Returns the result (always) and the failure (if any). A panic inside the
/// operation is trapped, the sink is snapshotted first, and the panic is
/// reported as `Error::Fault` - it never escapes to the caller's task.
pub async fn run_captured<F>(sink: &OutputSink, operation: F) -> (OperationResult, Option<Error>)
where
    F: std::future::Future<Output = Result<()>>,
{
    let started = Instant::now();
    let outcome = AssertUnwindSafe(operation).catch_unwind().await;

    let (stdout, stderr) = sink.snapshot();
    let result = OperationResult {
        stdout,
        stderr,
        duration_ms: started.elapsed().as_millis() as u64,
    };

    let error = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(error)) => Some(error),
        Err(panic) => Some(Error::Fault(panic_message(panic.as_ref()))),
    };
    (result, error)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
