// Command channel
// Decision: a detached reader task feeds raw chunks into an unbounded mpsc;
// try_read() only ever drains the channel, so the runtime can poll it once
// per loop iteration without risking its responsiveness to job timeouts

use std::collections::VecDeque;

use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tracing::debug;

/// Non-blocking reader of line-delimited commands.
///
/// Chunks may arrive with several commands at once or with a command split
/// across reads; complete lines are queued, a trailing partial line is kept
/// until its newline shows up.
pub struct CommandChannel {
    rx: Option<mpsc::UnboundedReceiver<String>>,
    pending: VecDeque<String>,
    partial: String,
}

impl CommandChannel {
    /// Channel over this process's stdin
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut stdin = tokio::io::stdin();
            let mut buf = [0u8; 1024];
            loop {
                match stdin.read(&mut buf).await {
                    Ok(0) => {
                        debug!("command stream closed");
                        break;
                    }
                    Ok(n) => {
                        let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
                        if tx.send(chunk).is_err() {
                            break;
                        }
                    }
                    Err(error) => {
                        debug!(%error, "command stream read failed");
                        break;
                    }
                }
            }
        });
        Self::from_receiver(rx)
    }

    /// Channel over an arbitrary chunk source (tests inject a sender here)
    pub fn from_receiver(rx: mpsc::UnboundedReceiver<String>) -> Self {
        Self {
            rx: Some(rx),
            pending: VecDeque::new(),
            partial: String::new(),
        }
    }

    /// Return the next complete command line, if any. Never blocks;
    /// `None` is the normal, frequent outcome when no command is waiting.
    pub fn try_read(&mut self) -> Option<String> {
        if let Some(command) = self.pending.pop_front() {
            return Some(command);
        }
        let rx = self.rx.as_mut()?;
        while let Ok(chunk) = rx.try_recv() {
            self.partial.push_str(&chunk);
            while let Some(idx) = self.partial.find('\n') {
                let line: String = self.partial.drain(..=idx).collect();
                let line = line.trim().to_string();
                if !line.is_empty() {
                    self.pending.push_back(line);
                }
            }
        }
        self.pending.pop_front()
    }

    /// Release the underlying stream. Safe to call multiple times; closing
    /// an already-closed channel is not a fault.
    pub fn close(&mut self) {
        self.rx.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (mpsc::UnboundedSender<String>, CommandChannel) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, CommandChannel::from_receiver(rx))
    }

    #[test]
    fn test_try_read_empty_is_none() {
        let (_tx, mut commands) = channel();
        assert_eq!(commands.try_read(), None);
        assert_eq!(commands.try_read(), None);
    }

    #[test]
    fn test_multi_command_chunk_is_queued() {
        let (tx, mut commands) = channel();
        tx.send("stop\nreload\n".to_string()).unwrap();
        assert_eq!(commands.try_read().as_deref(), Some("stop"));
        assert_eq!(commands.try_read().as_deref(), Some("reload"));
        assert_eq!(commands.try_read(), None);
    }

    #[test]
    fn test_partial_line_is_retained_across_reads() {
        let (tx, mut commands) = channel();
        tx.send("st".to_string()).unwrap();
        assert_eq!(commands.try_read(), None);
        tx.send("op\n".to_string()).unwrap();
        assert_eq!(commands.try_read().as_deref(), Some("stop"));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let (tx, mut commands) = channel();
        tx.send("\n\nstop\n".to_string()).unwrap();
        assert_eq!(commands.try_read().as_deref(), Some("stop"));
        assert_eq!(commands.try_read(), None);
    }

    #[test]
    fn test_close_is_idempotent() {
        let (_tx, mut commands) = channel();
        commands.close();
        commands.close();
        assert_eq!(commands.try_read(), None);
    }

    #[test]
    fn test_sender_drop_is_not_a_fault() {
        let (tx, mut commands) = channel();
        tx.send("stop\n".to_string()).unwrap();
        drop(tx);
        assert_eq!(commands.try_read().as_deref(), Some("stop"));
        assert_eq!(commands.try_read(), None);
    }
}
