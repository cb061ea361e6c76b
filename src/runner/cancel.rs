//! Run cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::{debug, warn};

use crate::error::Result;

/// Shared flag that stops a run from starting new steps.
///
/// Steps already running finish; every step not yet started is recorded
/// as skipped with reason "cancelled".
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Cancel `token` on the first Ctrl-C.
///
/// A second Ctrl-C exits the process with status 130.
pub fn cancel_on_interrupt(token: CancellationToken) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    thread::Builder::new()
        .name("stepwise-interrupt".to_string())
        .spawn(move || {
            runtime.block_on(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    debug!("Ctrl-C handler unavailable: {}", e);
                    return;
                }
                warn!("Interrupted; waiting for running steps, skipping the rest");
                token.cancel();

                if tokio::signal::ctrl_c().await.is_ok() {
                    std::process::exit(130);
                }
            })
        })?;

    Ok(())
}
