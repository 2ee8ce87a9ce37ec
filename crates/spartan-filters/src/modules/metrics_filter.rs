use spartan_config::verify::{verify, Setting, SettingType};
use spartan_core::event::Event;
use spartan_core::interface_map::InterfaceMap;
use spartan_core::traits::{Filter, Flushable};
use spartan_core::value::Value;

use crate::metrics::{EstimatorKind, Meter};

fn schema() -> Vec<Setting> {
    vec![Setting::new("name", SettingType::String).default(Value::String("events".into()))]
}

/// Marks one event per batch item through an EWMA meter and, on flush,
/// emits a single synthesized `type="metrics"` event carrying the running
/// count and the three rate windows — the controller's flusher task is
/// what drives the 5s cadence this filter ticks on.
pub struct MetricsFilter {
    name: String,
    meter: Meter,
}

impl MetricsFilter {
    pub fn new(options: &mut InterfaceMap) -> anyhow::Result<Self> {
        verify(options, &schema())?;
        let name = options.get("name").and_then(Value::as_str).unwrap_or("events").to_string();
        Ok(Self {
            name,
            meter: Meter::new(EstimatorKind::Ewma),
        })
    }
}

impl Filter for MetricsFilter {
    fn filter(&self, batch: Vec<Event>, matched: &dyn Fn(&Event)) -> Vec<Event> {
        self.meter.mark(batch.len() as i64);
        for event in &batch {
            matched(event);
        }
        batch
    }

    fn as_flushable(&self) -> Option<&dyn Flushable> {
        Some(self)
    }
}

impl Flushable for MetricsFilter {
    fn flush(&self) -> Vec<Event> {
        self.meter.tick();
        let mut event = Event::new();
        event.set_type("metrics".into());
        event.set(&format!("{}.count", self.name), Value::Int(self.meter.count()));
        event.set(&format!("{}.rate_1m", self.name), Value::Float(self.meter.rate_1m()));
        event.set(&format!("{}.rate_5m", self.name), Value::Float(self.meter.rate_5m()));
        event.set(&format!("{}.rate_15m", self.name), Value::Float(self.meter.rate_15m()));
        vec![event]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_marks_meter_and_passes_batch_through() {
        let mut opts = InterfaceMap::new();
        let f = MetricsFilter::new(&mut opts).unwrap();
        let batch = vec![Event::with_message("a"), Event::with_message("b")];
        let out = f.filter(batch, &|_| {});
        assert_eq!(out.len(), 2);
        assert_eq!(f.meter.count(), 2);
    }

    #[test]
    fn flush_emits_a_metrics_typed_event_with_the_running_count() {
        let mut opts = InterfaceMap::new();
        let f = MetricsFilter::new(&mut opts).unwrap();
        f.filter(vec![Event::with_message("a")], &|_| {});
        let flushed = f.flush();
        assert_eq!(flushed.len(), 1);
        assert_eq!(flushed[0].get_type(), Some("metrics"));
        assert_eq!(flushed[0].get("events.count"), Some(&Value::Int(1)));
    }
}
