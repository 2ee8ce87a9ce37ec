use std::sync::Arc;

use spartan_core::event::Event;
use spartan_core::traits::Filter;

/// One link of the filter chain: a filter and the index of the next link.
/// `next: None` terminates the chain at this node (the node's own filter,
/// if any, still runs first); `filter: None` is an identity pass-through
/// that still continues to `next` — this is what an empty config's
/// single-node chain is made of.
///
/// Deliberately a flat `Vec<Node>` with index-based `next` rather than a
/// linked list of owning pointers: `if`/`else` branches that reconverge
/// would otherwise create a cyclic ownership graph.
struct Node {
    filter: Option<Arc<dyn Filter>>,
    next: Option<usize>,
}

pub struct Chain {
    nodes: Vec<Node>,
}

impl Chain {
    /// A chain with a single identity node — the empty-filter-config case.
    pub fn identity() -> Self {
        Self {
            nodes: vec![Node { filter: None, next: None }],
        }
    }

    pub fn from_filters(filters: Vec<(Option<Arc<dyn Filter>>, Option<usize>)>) -> Self {
        Self {
            nodes: filters.into_iter().map(|(filter, next)| Node { filter, next }).collect(),
        }
    }

    /// Runs the chain starting at `start`, calling `matched` for every
    /// event each filter considers a match. Order is preserved head-to-tail
    /// and across the batch slice within this single run.
    pub fn run(&self, start: usize, mut batch: Vec<Event>, matched: &dyn Fn(&Event)) -> Vec<Event> {
        let mut idx = start;
        loop {
            let node = &self.nodes[idx];
            if let Some(filter) = &node.filter {
                batch = filter.filter(batch, matched);
            }
            match node.next {
                Some(next) => idx = next,
                None => return batch,
            }
        }
    }

    /// Every filter in the chain that declares itself flushable, in chain
    /// order — used by the controller to spawn (or skip) the flusher task.
    /// Returns owned `Arc` clones so the flusher task can hold them past
    /// this call without borrowing the chain.
    pub fn flushable_filters(&self) -> Vec<Arc<dyn Filter>> {
        self.nodes
            .iter()
            .filter_map(|n| n.filter.clone())
            .filter(|f| f.as_flushable().is_some())
            .collect()
    }

    pub fn is_empty_identity(&self) -> bool {
        self.nodes.len() == 1 && self.nodes[0].filter.is_none() && self.nodes[0].next.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spartan_core::value::Value;

    struct Uppercase;
    impl Filter for Uppercase {
        fn filter(&self, batch: Vec<Event>, matched: &dyn Fn(&Event)) -> Vec<Event> {
            batch
                .into_iter()
                .map(|mut e| {
                    if let Some(m) = e.message() {
                        let upper = m.to_uppercase();
                        e.set("message", Value::String(upper));
                    }
                    matched(&e);
                    e
                })
                .collect()
        }
    }

    #[test]
    fn identity_chain_passes_batch_through_unchanged() {
        let chain = Chain::identity();
        let batch = vec![Event::with_message("a"), Event::with_message("b")];
        let out = chain.run(0, batch, &|_| {});
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].message(), Some("a"));
    }

    #[test]
    fn chain_applies_filters_in_order() {
        let chain = Chain::from_filters(vec![(Some(Arc::new(Uppercase)), None)]);
        let batch = vec![Event::with_message("hi")];
        let out = chain.run(0, batch, &|_| {});
        assert_eq!(out[0].message(), Some("HI"));
    }
}
