//! Filter wrapper/chain, batching worker pipeline, filter and output
//! controllers, and the EWMA/SMA metrics meter.

pub mod controller;
pub mod metrics;
pub mod modules;
pub mod pipeline;
pub mod wiring;
pub mod wrapper;

pub use controller::{Controller, OutputController, DEFAULT_BATCH_SIZE};
pub use metrics::{EstimatorKind, Meter};
pub use modules::register_builtins;
pub use pipeline::{Pipeline, SharedReceiver};
pub use wiring::{build_filter_chain, build_output_chain, WiringError};
pub use wrapper::Chain;
