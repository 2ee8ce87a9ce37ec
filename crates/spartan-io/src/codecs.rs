use spartan_core::event::Event;
use spartan_core::registry::CodecRegistry;
use spartan_core::traits::Codec;
use std::sync::Arc;

/// No delimiter between encoded events; decoding treats the whole buffer
/// as one message.
pub struct PlainCodec;

impl Codec for PlainCodec {
    fn encode(&self, event: &Event) -> Vec<u8> {
        event.to_string().into_bytes()
    }

    fn decode(&self, bytes: &[u8]) -> anyhow::Result<Event> {
        Ok(Event::with_message(String::from_utf8_lossy(bytes).into_owned()))
    }
}

/// Like [`PlainCodec`] but newline-delimited on encode.
pub struct LineCodec;

impl Codec for LineCodec {
    fn encode(&self, event: &Event) -> Vec<u8> {
        let mut out = event.to_string().into_bytes();
        out.push(b'\n');
        out
    }

    fn decode(&self, bytes: &[u8]) -> anyhow::Result<Event> {
        Ok(Event::with_message(String::from_utf8_lossy(bytes).into_owned()))
    }
}

/// Encodes an event's full field map as a compact JSON object. Decoding is
/// not supported, matching the reference this is grounded on.
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, event: &Event) -> Vec<u8> {
        serde_json::to_vec(&event.data()).unwrap_or_default()
    }

    fn decode(&self, _bytes: &[u8]) -> anyhow::Result<Event> {
        anyhow::bail!("json codec does not support decoding")
    }
}

/// Like [`JsonCodec`] but newline-terminated, for streaming sinks.
pub struct JsonLinesCodec;

impl Codec for JsonLinesCodec {
    fn encode(&self, event: &Event) -> Vec<u8> {
        let mut out = serde_json::to_vec(&event.data()).unwrap_or_default();
        out.push(b'\n');
        out
    }

    fn decode(&self, _bytes: &[u8]) -> anyhow::Result<Event> {
        anyhow::bail!("json_lines codec does not support decoding")
    }
}

/// Pretty-printed (2-space indent) JSON encoding of an event's field map.
pub struct JsonPrettyCodec;

impl Codec for JsonPrettyCodec {
    fn encode(&self, event: &Event) -> Vec<u8> {
        serde_json::to_vec_pretty(&event.data()).unwrap_or_default()
    }

    fn decode(&self, _bytes: &[u8]) -> anyhow::Result<Event> {
        anyhow::bail!("json_pretty codec does not support decoding")
    }
}

/// Encodes every event as a single `.`, for terse progress-style output.
/// Decoding a dot back into an event makes no sense and is refused.
pub struct DotsCodec;

impl Codec for DotsCodec {
    fn encode(&self, _event: &Event) -> Vec<u8> {
        vec![b'.']
    }

    fn decode(&self, _bytes: &[u8]) -> anyhow::Result<Event> {
        anyhow::bail!("dots codec does not support decoding")
    }
}

/// Registers the six reference codecs under their DSL names. Called once
/// from the CLI binary at startup.
pub fn register_builtins(registry: &CodecRegistry) -> anyhow::Result<()> {
    registry.register("plain", Arc::new(PlainCodec) as Arc<dyn Codec>)?;
    registry.register("line", Arc::new(LineCodec) as Arc<dyn Codec>)?;
    registry.register("json", Arc::new(JsonCodec) as Arc<dyn Codec>)?;
    registry.register("json_lines", Arc::new(JsonLinesCodec) as Arc<dyn Codec>)?;
    registry.register("json_pretty", Arc::new(JsonPrettyCodec) as Arc<dyn Codec>)?;
    registry.register("dots", Arc::new(DotsCodec) as Arc<dyn Codec>)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_codec_appends_newline() {
        let event = Event::with_message("hello");
        let encoded = String::from_utf8(LineCodec.encode(&event)).unwrap();
        assert!(encoded.ends_with(": hello\n"));
    }

    #[test]
    fn plain_codec_prefixes_timestamp() {
        let event = Event::with_message("hello");
        let encoded = String::from_utf8(PlainCodec.encode(&event)).unwrap();
        assert!(encoded.ends_with(": hello"));
        assert!(!encoded.ends_with('\n'));
    }

    #[test]
    fn plain_codec_roundtrips_message() {
        let decoded = PlainCodec.decode(b"hi there").unwrap();
        assert_eq!(decoded.message(), Some("hi there"));
    }

    #[test]
    fn dots_codec_ignores_event_contents() {
        assert_eq!(DotsCodec.encode(&Event::with_message("anything")), vec![b'.']);
    }

    #[test]
    fn json_codec_refuses_to_decode() {
        assert!(JsonCodec.decode(b"{}").is_err());
    }

    #[test]
    fn builtins_register_without_duplicates() {
        let registry = CodecRegistry::new();
        register_builtins(&registry).unwrap();
        assert!(registry.get("plain").is_ok());
        assert!(registry.get("json_pretty").is_ok());
    }
}
