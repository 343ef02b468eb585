use std::io::{self, BufRead};

use tokio::sync::mpsc;
use tracing::warn;

/// Lines typed by the user, read on a dedicated thread so the async
/// prompt can wait on input and reminder popups at the same time.
pub struct LineReader {
    rx: mpsc::UnboundedReceiver<String>,
}

impl LineReader {
    /// Start reading stdin. The reader thread exits at EOF or once the
    /// receiver is dropped.
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to read stdin");
                        break;
                    }
                }
            }
        });
        Self { rx }
    }

    /// Reader over a fixed script of lines.
    #[cfg(test)]
    pub fn scripted<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        for line in lines {
            let _ = tx.send(line.into());
        }
        Self { rx }
    }

    /// Next trimmed line, or `None` at end of input.
    pub async fn next_line(&mut self) -> Option<String> {
        self.rx.recv().await.map(|line| line.trim().to_string())
    }
}
