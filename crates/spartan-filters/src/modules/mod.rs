//! Reference filter adapters: `grok`, `date`, `remove_field`, `metrics`.

pub mod date;
pub mod grok;
pub mod metrics_filter;
pub mod remove_field;

use std::sync::Arc;

use spartan_config::grok::PatternRegistry;
use spartan_core::registry::Registry;
use spartan_core::traits::Filter;

pub use date::DateFilter;
pub use grok::GrokFilter;
pub use metrics_filter::MetricsFilter;
pub use remove_field::RemoveFieldFilter;

/// Registers every reference filter adapter under its DSL name. Called once
/// from the CLI binary at startup, before any config file is parsed;
/// registering the same name twice is refused by the registry itself.
pub fn register_builtins(registry: &Registry<Arc<dyn Filter>>, patterns: Arc<PatternRegistry>) -> anyhow::Result<()> {
    registry.register("grok", move |opts| {
        Ok(Arc::new(GrokFilter::new(opts, &patterns)?) as Arc<dyn Filter>)
    })?;
    registry.register("date", |opts| Ok(Arc::new(DateFilter::new(opts)?) as Arc<dyn Filter>))?;
    registry.register("remove_field", |opts| {
        Ok(Arc::new(RemoveFieldFilter::new(opts)?) as Arc<dyn Filter>)
    })?;
    registry.register("metrics", |opts| Ok(Arc::new(MetricsFilter::new(opts)?) as Arc<dyn Filter>))?;
    Ok(())
}
