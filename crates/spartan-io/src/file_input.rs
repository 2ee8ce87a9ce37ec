use std::time::Duration;

use async_trait::async_trait;
use spartan_config::verify::{verify, Setting, SettingType};
use spartan_core::event::Event;
use spartan_core::interface_map::InterfaceMap;
use spartan_core::traits::Input;
use spartan_core::value::Value;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

fn schema() -> Vec<Setting> {
    vec![Setting::new("path", SettingType::String).required()]
}

/// Tails a file from its end, forever, retrying on open failure with a
/// fixed backoff. There is no OS-level filesystem watch here (the corpus
/// reaches for a follow-and-reopen tailing library); this polls for new
/// lines every tick instead, which is the simplest faithful Rust rendition
/// without adopting a dependency unused elsewhere in the workspace.
pub struct FileInput {
    path: String,
}

impl FileInput {
    pub fn new(options: &mut InterfaceMap) -> anyhow::Result<Self> {
        verify(options, &schema())?;
        let path = options.get("path").and_then(Value::as_str).unwrap_or_default().to_string();
        Ok(Self { path })
    }

    async fn run(path: String, out: mpsc::Sender<Event>, cancel: CancellationToken) {
        loop {
            if cancel.is_cancelled() {
                return;
            }

            let file = match tokio::fs::File::open(&path).await {
                Ok(f) => f,
                Err(err) => {
                    warn!(path = %path, error = %err, "file input failed to open, retrying");
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = tokio::time::sleep(RETRY_BACKOFF) => continue,
                    }
                }
            };

            let mut reader = tokio::io::BufReader::new(file);
            if let Err(err) = reader.seek(std::io::SeekFrom::End(0)).await {
                warn!(path = %path, error = %err, "file input failed to seek to end");
            }

            loop {
                let mut line = String::new();
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    result = reader.read_line(&mut line) => {
                        match result {
                            Ok(0) => {
                                tokio::select! {
                                    _ = cancel.cancelled() => return,
                                    _ = tokio::time::sleep(RETRY_BACKOFF) => continue,
                                }
                            }
                            Ok(_) => {
                                let text = line.trim_end_matches(['\n', '\r']).to_string();
                                if out.send(Event::with_message(text)).await.is_err() {
                                    return;
                                }
                            }
                            Err(err) => {
                                warn!(path = %path, error = %err, "file input read error, reopening");
                                break;
                            }
                        }
                    }
                }
            }
        }
    }
}

#[async_trait]
impl Input for FileInput {
    async fn start(&mut self, out: mpsc::Sender<Event>, cancel: CancellationToken) -> anyhow::Result<()> {
        let path = self.path.clone();
        tokio::spawn(Self::run(path, out, cancel));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn tails_lines_appended_after_start() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "seed-line").unwrap();
        tmp.flush().unwrap();

        let mut opts = InterfaceMap::new();
        opts.set("path", Value::String(tmp.path().to_string_lossy().into_owned()));
        let mut input = FileInput::new(&mut opts).unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        input.start(tx, cancel.clone()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        writeln!(tmp, "new-line").unwrap();
        tmp.flush().unwrap();

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        assert_eq!(event.message(), Some("new-line"));
        cancel.cancel();
    }
}
