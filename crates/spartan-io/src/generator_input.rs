use async_trait::async_trait;
use spartan_config::verify::{verify, Setting, SettingType};
use spartan_core::event::Event;
use spartan_core::interface_map::InterfaceMap;
use spartan_core::traits::Input;
use spartan_core::value::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn schema() -> Vec<Setting> {
    vec![
        Setting::new("message", SettingType::String).default(Value::String(String::new())),
        Setting::new("count", SettingType::Int).default(Value::Int(0)),
        Setting::new("lines", SettingType::Array).elements(SettingType::String),
    ]
}

/// Emits each of `lines` round-robin up to `count` times total (0 means
/// unbounded), then idles until cancelled. `lines` defaults to a single
/// repeated `message` when left unset.
pub struct GeneratorInput {
    lines: Vec<String>,
    count: i64,
}

impl GeneratorInput {
    pub fn new(options: &mut InterfaceMap) -> anyhow::Result<Self> {
        verify(options, &schema())?;
        let message = options.get("message").and_then(Value::as_str).unwrap_or_default().to_string();
        let count = options.get("count").and_then(Value::as_int).unwrap_or(0);
        let mut lines: Vec<String> = options
            .get("lines")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();
        if lines.is_empty() {
            lines.push(message);
        }
        Ok(Self { lines, count })
    }
}

#[async_trait]
impl Input for GeneratorInput {
    async fn start(&mut self, out: mpsc::Sender<Event>, cancel: CancellationToken) -> anyhow::Result<()> {
        let lines = self.lines.clone();
        let count = self.count;
        tokio::spawn(async move {
            let line_len = lines.len();
            let mut index = 0usize;
            let mut emitted = 0i64;
            loop {
                if count > 0 && emitted >= count {
                    break;
                }
                if cancel.is_cancelled() {
                    return;
                }
                if out.send(Event::with_message(lines[index].clone())).await.is_err() {
                    return;
                }
                index = (index + 1) % line_len;
                emitted += 1;
            }
            cancel.cancelled().await;
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emits_exactly_count_events_then_idles() {
        let mut opts = InterfaceMap::new();
        opts.set("message", Value::String("hi".into()));
        opts.set("count", Value::Int(3));
        let mut input = GeneratorInput::new(&mut opts).unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        input.start(tx, cancel.clone()).await.unwrap();

        for _ in 0..3 {
            let event = rx.recv().await.unwrap();
            assert_eq!(event.message(), Some("hi"));
        }
        assert!(tokio::time::timeout(std::time::Duration::from_millis(100), rx.recv()).await.is_err());
        cancel.cancel();
    }

    #[tokio::test]
    async fn round_robins_through_lines() {
        let mut opts = InterfaceMap::new();
        opts.set(
            "lines",
            Value::Array(vec![Value::String("a".into()), Value::String("b".into())]),
        );
        opts.set("count", Value::Int(4));
        let mut input = GeneratorInput::new(&mut opts).unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        input.start(tx, cancel.clone()).await.unwrap();

        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(rx.recv().await.unwrap().message().unwrap().to_string());
        }
        assert_eq!(seen, vec!["a", "b", "a", "b"]);
        cancel.cancel();
    }
}
