use std::sync::Arc;

use spartan_core::event::Event;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::wrapper::Chain;

/// `tokio::sync::mpsc::Receiver` is single-consumer; the filter controller
/// fans one `InputChan` out to N worker pipelines, so the receiver is
/// wrapped in an async mutex each worker contends for — the idiomatic Rust
/// stand-in for a natively multi-consumer Go channel.
pub struct SharedReceiver(tokio::sync::Mutex<mpsc::Receiver<Event>>);

impl SharedReceiver {
    pub fn new(rx: mpsc::Receiver<Event>) -> Self {
        Self(tokio::sync::Mutex::new(rx))
    }

    pub async fn recv(&self) -> Option<Event> {
        self.0.lock().await.recv().await
    }
}

/// One worker pipeline: owns a chain head, batches events off `input`, runs
/// the chain, and forwards survivors to `output`. Has no internal
/// concurrency beyond its own task.
pub struct Pipeline {
    chain: Arc<Chain>,
    start: usize,
    batch_size: usize,
}

impl Pipeline {
    pub fn new(chain: Arc<Chain>, start: usize, batch_size: usize) -> Self {
        Self { chain, start, batch_size }
    }

    /// Runs until cancelled. Collects up to `batch_size` events, racing a
    /// cancellation signal; a termination mid-batch truncates to what was
    /// received. A termination arriving with an empty batch exits cleanly
    /// without running the chain — this is the documented workaround for a
    /// wake-up race where the cancellation and an empty recv can both be
    /// ready at once.
    pub async fn run(
        &self,
        input: Arc<SharedReceiver>,
        output: mpsc::Sender<Event>,
        cancel: CancellationToken,
    ) {
        loop {
            let mut batch = Vec::with_capacity(self.batch_size);
            let mut terminating = false;
            while batch.len() < self.batch_size {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        terminating = true;
                        break;
                    }
                    event = input.recv() => {
                        match event {
                            Some(e) => batch.push(e),
                            None => {
                                terminating = true;
                                break;
                            }
                        }
                    }
                }
            }

            if terminating && batch.is_empty() {
                debug!("pipeline exiting on empty batch during shutdown");
                return;
            }

            let survivors = self.chain.run(self.start, batch, &|_matched: &Event| {});
            for event in survivors {
                if output.send(event).await.is_err() {
                    info!("pipeline output channel closed, stopping");
                    return;
                }
            }

            if terminating {
                return;
            }
        }
    }
}
