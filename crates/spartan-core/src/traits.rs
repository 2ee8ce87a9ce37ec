use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::event::Event;

/// An input module: produces events asynchronously onto `out`. `start`
/// returns once the task is spawned, not once it's drained; `close` signals
/// the underlying task to stop and waits for it.
#[async_trait]
pub trait Input: Send + Sync {
    async fn start(&mut self, out: mpsc::Sender<Event>, cancel: CancellationToken) -> anyhow::Result<()>;
}

/// A filter module. `filter` receives a batch and a `matched` callback
/// invoked for every event that satisfied the filter's condition, and
/// returns the (possibly pruned/enriched) surviving batch.
pub trait Filter: Send + Sync {
    fn filter(&self, batch: Vec<Event>, matched: &dyn Fn(&Event)) -> Vec<Event>;

    /// Stateful filters (e.g. metrics) override this to expose a periodic
    /// flush hook; most filters are not flushable.
    fn as_flushable(&self) -> Option<&dyn Flushable> {
        None
    }
}

/// A filter that emits synthesised events on a timer, independent of the
/// regular batch flow (e.g. a metrics filter emitting rate summaries).
pub trait Flushable: Send + Sync {
    fn flush(&self) -> Vec<Event>;
}

/// An output module. `run` consumes a batch (the terminal effect — stdout,
/// file, network); `set_next` wires a linked chain the way filters do,
/// though in practice the reference adapters are single-stage.
#[async_trait]
pub trait Output: Send + Sync {
    async fn run(&mut self, batch: Vec<Event>) -> anyhow::Result<()>;

    fn set_next(&mut self, _next: Box<dyn Output>) {}
}

/// A bytes↔event serializer, owned by output modules (and, for
/// round-trippable codecs, by reader-side inputs).
pub trait Codec: Send + Sync {
    fn encode(&self, event: &Event) -> Vec<u8>;
    fn decode(&self, bytes: &[u8]) -> anyhow::Result<Event>;
}
