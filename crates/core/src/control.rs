use crate::ScanError;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Pause and cancel switches that the scan loop polls between steps.
#[derive(Debug, Clone)]
pub struct ScanControl {
    cancel: CancellationToken,
    paused: Arc<watch::Sender<bool>>,
}

impl Default for ScanControl {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanControl {
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            cancel: CancellationToken::new(),
            paused: Arc::new(paused),
        }
    }

    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
        self.resume();
    }

    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Waits out a pause, then fails if the scan was cancelled.
    pub async fn checkpoint(&self) -> Result<(), ScanError> {
        let mut paused = self.paused.subscribe();
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = async {
                let _ = paused.wait_for(|is_paused| !*is_paused).await;
            } => {}
        }

        if self.cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        Ok(())
    }
}
