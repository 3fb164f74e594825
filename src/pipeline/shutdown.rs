use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Coarse, cooperative interruption flag.
///
/// Stages check it at their boundaries only: before each discovery query and
/// before each organization starts. Work already in flight runs to completion.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    requested: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Set the flag when the process receives Ctrl-C
    pub fn listen_for_ctrl_c(&self) {
        let signal = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, finishing in-flight work");
                signal.request();
            }
        });
    }
}
