use spartan_config::verify::{verify, Setting, SettingType};
use spartan_core::event::Event;
use spartan_core::interface_map::InterfaceMap;
use spartan_core::traits::Filter;
use spartan_core::value::Value;

fn schema() -> Vec<Setting> {
    vec![Setting::new("fields", SettingType::Array)
        .elements(SettingType::String)
        .required()]
}

/// Deletes a fixed list of fields from every event; never invokes the
/// matched callback, since it expresses no condition.
pub struct RemoveFieldFilter {
    fields: Vec<String>,
}

impl RemoveFieldFilter {
    pub fn new(options: &mut InterfaceMap) -> anyhow::Result<Self> {
        verify(options, &schema())?;
        let fields = options
            .get("fields")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();
        Ok(Self { fields })
    }
}

impl Filter for RemoveFieldFilter {
    fn filter(&self, batch: Vec<Event>, _matched: &dyn Fn(&Event)) -> Vec<Event> {
        batch
            .into_iter()
            .map(|mut event| {
                for field in &self.fields {
                    event.delete(field);
                }
                event
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_fields_are_removed() {
        let mut opts = InterfaceMap::new();
        opts.set("fields", Value::Array(vec![Value::String("secret".into())]));
        let f = RemoveFieldFilter::new(&mut opts).unwrap();
        let mut event = Event::new();
        event.set("secret", Value::String("shh".into()));
        event.set("keep", Value::String("yes".into()));
        let out = f.filter(vec![event], &|_| {});
        assert!(!out[0].has_field("secret"));
        assert!(out[0].has_field("keep"));
    }

    #[test]
    fn reserved_fields_stay_protected() {
        let mut opts = InterfaceMap::new();
        opts.set(
            "fields",
            Value::Array(vec![Value::String("@timestamp".into()), Value::String("type".into())]),
        );
        let f = RemoveFieldFilter::new(&mut opts).unwrap();
        let mut event = Event::new();
        event.set_type("demo".into());
        let out = f.filter(vec![event], &|_| {});
        assert_eq!(out[0].get_type(), Some("demo"));
    }
}
