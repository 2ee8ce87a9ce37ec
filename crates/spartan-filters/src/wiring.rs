use std::sync::Arc;

use spartan_config::parser::PipelineDef;
use spartan_core::registry::Registry;
use spartan_core::traits::{Filter, Output};
use thiserror::Error;

use crate::wrapper::Chain;

#[derive(Debug, Error)]
pub enum WiringError {
    #[error("if/else connections are reserved and not implemented")]
    NotImplemented,
    #[error("module factory error: {0}")]
    Factory(#[from] anyhow::Error),
}

/// Builds a filter chain from parsed `filter { }` definitions: one instance
/// per definition, wired via `Connections`. An empty definition list yields
/// a single identity node (spec's empty-filter-chain case). `if`/`else`
/// wiring (`Connections` of length 3) is rejected here, at wiring time —
/// not at parse time, matching spec §4.D/§9.
pub fn build_filter_chain(defs: &[PipelineDef], registry: &Registry<Arc<dyn Filter>>) -> Result<Chain, WiringError> {
    if defs.is_empty() {
        return Ok(Chain::identity());
    }
    let mut nodes = Vec::with_capacity(defs.len());
    for def in defs {
        if def.connections.len() == 3 {
            return Err(WiringError::NotImplemented);
        }
        let next = def.connections.first().copied();
        let mut opts = def.options.clone();
        let filter = registry.create(&def.module, &mut opts)?;
        nodes.push((Some(filter), next));
    }
    Ok(Chain::from_filters(nodes))
}

/// Builds the output chain as a real owned linked list via `set_next`
/// (unlike filters, outputs have no `if`/`else` reconvergence risk, so the
/// corpus's `SetNext`-linked-list shape is kept as-is). An empty
/// definition list yields a single no-op terminal output.
pub fn build_output_chain(defs: &[PipelineDef], registry: &Registry<Box<dyn Output>>) -> Result<Box<dyn Output>, WiringError> {
    struct EndOutput;
    #[async_trait::async_trait]
    impl Output for EndOutput {
        async fn run(&mut self, _batch: Vec<spartan_core::event::Event>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    if defs.is_empty() {
        return Ok(Box::new(EndOutput));
    }
    for def in defs {
        if def.connections.len() == 3 {
            return Err(WiringError::NotImplemented);
        }
    }
    // Instantiate every output first so factory errors surface before any
    // linking happens, then stitch tail-to-head.
    let mut instances = Vec::with_capacity(defs.len());
    for def in defs {
        let mut opts = def.options.clone();
        instances.push(registry.create(&def.module, &mut opts)?);
    }
    let mut chain = instances.pop().expect("non-empty");
    while let Some(mut next) = instances.pop() {
        next.set_next(chain);
        chain = next;
    }
    Ok(chain)
}
