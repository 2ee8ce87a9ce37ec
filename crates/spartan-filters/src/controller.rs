use std::sync::Arc;
use std::time::Duration;

use spartan_core::event::Event;
use spartan_core::traits::Output;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::pipeline::{Pipeline, SharedReceiver};
use crate::wrapper::Chain;

/// The corpus's own library default; the reference CLI binary passes an
/// explicit 100 at startup (see `bin/spartan`), which takes precedence
/// there — this is only the fallback when a caller doesn't specify one.
pub const DEFAULT_BATCH_SIZE: usize = 150;

const FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Fans `InputChan` into N worker pipelines sharing one chain, plus one
/// flusher task (only spawned if the chain has any flushable filter) that
/// ticks every 5s and forwards flushed events directly to `OutputChan`,
/// bypassing the chain.
pub struct Controller {
    cancel: CancellationToken,
    pipeline_handles: Vec<JoinHandle<()>>,
    flusher_handle: Option<JoinHandle<()>>,
}

impl Controller {
    pub fn start(
        chain: Arc<Chain>,
        input_rx: mpsc::Receiver<Event>,
        output_tx: mpsc::Sender<Event>,
        pipelines: usize,
        batch_size: usize,
    ) -> Self {
        let cancel = CancellationToken::new();
        let shared_input = Arc::new(SharedReceiver::new(input_rx));

        let flushable = chain.flushable_filters();
        let flusher_handle = if flushable.is_empty() {
            None
        } else {
            let flusher_cancel = cancel.child_token();
            let flusher_output = output_tx.clone();
            Some(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(FLUSH_INTERVAL);
                loop {
                    tokio::select! {
                        _ = flusher_cancel.cancelled() => return,
                        _ = ticker.tick() => {
                            for filter in &flushable {
                                let Some(flushable) = filter.as_flushable() else { continue };
                                for event in flushable.flush() {
                                    if flusher_output.send(event).await.is_err() {
                                        return;
                                    }
                                }
                            }
                        }
                    }
                }
            }))
        };

        let mut pipeline_handles = Vec::with_capacity(pipelines);
        for _ in 0..pipelines {
            let pipeline = Pipeline::new(chain.clone(), 0, batch_size);
            let input = shared_input.clone();
            let output = output_tx.clone();
            let pipeline_cancel = cancel.child_token();
            pipeline_handles.push(tokio::spawn(async move {
                pipeline.run(input, output, pipeline_cancel).await;
            }));
        }

        Self {
            cancel,
            pipeline_handles,
            flusher_handle,
        }
    }

    /// Kills the flusher first and awaits it, then cancels and awaits every
    /// worker pipeline — so the flusher can never write to a downstream
    /// consumer that has already been closed by a pipeline's own shutdown.
    pub async fn close(self) {
        self.cancel.cancel();
        if let Some(handle) = self.flusher_handle {
            let _ = handle.await;
        }
        for handle in self.pipeline_handles {
            let _ = handle.await;
        }
        info!("filter controller closed");
    }
}

/// Same batching-loop shape as [`Pipeline`], but the terminal step invokes
/// the output chain (consuming the batch) rather than forwarding it.
pub struct OutputController {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl OutputController {
    pub fn start(mut output: Box<dyn Output>, input_rx: mpsc::Receiver<Event>, batch_size: usize) -> Self {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.child_token();
        let mut input_rx = input_rx;
        let handle = tokio::spawn(async move {
            loop {
                let mut batch = Vec::with_capacity(batch_size);
                let mut terminating = false;
                while batch.len() < batch_size {
                    tokio::select! {
                        biased;
                        _ = task_cancel.cancelled() => {
                            terminating = true;
                            break;
                        }
                        event = input_rx.recv() => {
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
                    return;
                }

                if let Err(err) = output.run(batch).await {
                    tracing::warn!(error = %err, "output chain returned an error");
                }

                if terminating {
                    return;
                }
            }
        });
        Self { cancel, handle }
    }

    pub async fn close(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
        info!("output controller closed");
    }
}
