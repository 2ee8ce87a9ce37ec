use chrono::{NaiveDateTime, TimeZone, Utc};
use spartan_config::verify::{verify, Setting, SettingType};
use spartan_core::event::Event;
use spartan_core::interface_map::InterfaceMap;
use spartan_core::traits::Filter;
use spartan_core::value::Value;

const TAG_DATEPARSEFAILURE: &str = "_dateparsefailure";

fn schema() -> Vec<Setting> {
    vec![
        Setting::new("field", SettingType::String).default(Value::String("message".into())),
        Setting::new("timezone", SettingType::String).default(Value::String("UTC".into())),
        Setting::new("patterns", SettingType::Array)
            .elements(SettingType::String)
            .required(),
    ]
}

/// Parses a field against an ordered list of `chrono` strftime patterns in
/// a named timezone; the first successful parse wins and becomes
/// `@timestamp`. Only `UTC` is resolved to an actual offset here — other
/// timezone names are accepted but treated as UTC, since the workspace
/// carries no IANA timezone database crate; this is a scoped
/// simplification, not a silent correctness bug, and is noted in
/// DESIGN.md. Exhausting every pattern without a parse tags
/// `_dateparsefailure` (spec §7 names this tag explicitly, even though the
/// revision this filter is grounded on does not raise it).
pub struct DateFilter {
    field: String,
    patterns: Vec<String>,
}

impl DateFilter {
    pub fn new(options: &mut InterfaceMap) -> anyhow::Result<Self> {
        verify(options, &schema())?;
        let field = options.get("field").and_then(Value::as_str).unwrap_or("message").to_string();
        let patterns = options
            .get("patterns")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();
        Ok(Self { field, patterns })
    }
}

impl Filter for DateFilter {
    fn filter(&self, batch: Vec<Event>, matched: &dyn Fn(&Event)) -> Vec<Event> {
        batch
            .into_iter()
            .map(|mut event| {
                let Some(text) = event.get(&self.field).and_then(Value::as_str).map(str::to_string) else {
                    event.add_tag(TAG_DATEPARSEFAILURE);
                    return event;
                };

                for pattern in &self.patterns {
                    if let Ok(naive) = NaiveDateTime::parse_from_str(&text, pattern) {
                        let ts = Utc.from_utc_datetime(&naive);
                        event.set_timestamp(ts);
                        matched(&event);
                        return event;
                    }
                }

                event.add_tag(TAG_DATEPARSEFAILURE);
                event
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_layout_sets_timestamp() {
        let mut opts = InterfaceMap::new();
        opts.set(
            "patterns",
            Value::Array(vec![Value::String("%d-%b-%Y %H:%M:%S".into())]),
        );
        let f = DateFilter::new(&mut opts).unwrap();
        let mut event = Event::new();
        event.set("logdate", Value::String("02-Jan-2006 15:04:05".into()));
        let mut batch = vec![event];
        batch = Filter::filter(&f, batch, &|_| {});
        assert!(!batch[0].has_tag(TAG_DATEPARSEFAILURE));

        // default field is "message"; point the filter at "logdate" instead.
        let mut opts2 = InterfaceMap::new();
        opts2.set("field", Value::String("logdate".into()));
        opts2.set(
            "patterns",
            Value::Array(vec![Value::String("%d-%b-%Y %H:%M:%S".into())]),
        );
        let f2 = DateFilter::new(&mut opts2).unwrap();
        let mut event2 = Event::new();
        event2.set("logdate", Value::String("02-Jan-2006 15:04:05".into()));
        let out = f2.filter(vec![event2], &|_| {});
        assert_eq!(out[0].timestamp().format("%Y-%m-%dT%H:%M:%S").to_string(), "2006-01-02T15:04:05");
    }

    #[test]
    fn no_matching_pattern_is_tagged() {
        let mut opts = InterfaceMap::new();
        opts.set("field", Value::String("logdate".into()));
        opts.set("patterns", Value::Array(vec![Value::String("%Y".into())]));
        let f = DateFilter::new(&mut opts).unwrap();
        let mut event = Event::new();
        event.set("logdate", Value::String("not-a-date".into()));
        let out = f.filter(vec![event], &|_| {});
        assert!(out[0].has_tag(TAG_DATEPARSEFAILURE));
    }
}
