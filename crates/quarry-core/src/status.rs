// Status frame writer
// Decision: synchronous, flushed writes; the foreman may be tailing the
// stream line by line, and frame ordering must match lifecycle ordering
// Decision: write failures propagate; a worker that cannot be supervised must stop

use std::io::Write;

use quarry_contracts::{keys, WorkerState, FIELD_SEP, FRAME_FLAG};

use crate::error::Result;

/// Serializes status events onto a shared output stream.
///
/// Each event becomes one frame: `FLAG (SEP KEY=VALUE)* FLAG \n`. The flags
/// let a reader extract frames unambiguously from stdout even when other
/// code writes free-form text to the same stream. A field whose value is
/// empty is omitted entirely: absence, not an empty string, means "not set".
pub struct StatusChannel {
    out: Box<dyn Write + Send>,
}

impl StatusChannel {
    /// Channel over this process's stdout
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Channel over an arbitrary sink (tests inject a buffer here)
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }

    /// Report that a job has been checked out and handed to the executor
    pub fn job_started(&mut self, job_id: &str, timeout: u64, description: Option<&str>) -> Result<()> {
        let timeout = timeout.to_string();
        let mut fields = vec![(keys::JOB_ID, job_id), (keys::TIMEOUT, timeout.as_str())];
        if let Some(desc) = description {
            fields.push((keys::MESSAGE, desc));
        }
        self.emit(&fields)
    }

    /// Free-form progress message
    pub fn status(&mut self, message: &str) -> Result<()> {
        self.emit(&[(keys::MESSAGE, message)])
    }

    /// Progress within a named phase; `fraction` is clamped to [0,1]
    pub fn percent(&mut self, fraction: f64, message: &str, phase: &str) -> Result<()> {
        let clamped = fraction.clamp(0.0, 1.0);
        let percent = format!("{clamped:.3}");
        self.emit(&[
            (keys::PERCENT, percent.as_str()),
            (keys::MESSAGE, message),
            (keys::PHASE, phase),
        ])
    }

    /// Lifecycle state, optionally with a message
    pub fn state(&mut self, state: WorkerState, message: Option<&str>) -> Result<()> {
        let mut fields = vec![(keys::STATE, state.as_str())];
        if let Some(msg) = message {
            fields.push((keys::MESSAGE, msg));
        }
        self.emit(&fields)
    }

    /// The worker's VPID, reported once at startup
    pub fn identity(&mut self, vpid: &str) -> Result<()> {
        self.emit(&[(keys::VPID, vpid)])
    }

    fn emit(&mut self, fields: &[(char, &str)]) -> Result<()> {
        let mut frame = String::from(FRAME_FLAG);
        for (key, value) in fields {
            if value.is_empty() {
                continue;
            }
            frame.push_str(FIELD_SEP);
            frame.push(*key);
            frame.push('=');
            frame.push_str(value);
        }
        frame.push_str(FRAME_FLAG);
        frame.push('\n');
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl SharedSink {
        fn new() -> Self {
            Self(Arc::new(Mutex::new(Vec::new())))
        }

        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn channel() -> (StatusChannel, SharedSink) {
        let sink = SharedSink::new();
        (StatusChannel::new(Box::new(sink.clone())), sink)
    }

    #[test]
    fn test_percent_clamps_low() {
        let (mut status, sink) = channel();
        status.percent(-0.5, "reading rows", "extract").unwrap();
        assert!(sink.text().contains("@&P=0.000"));
    }

    #[test]
    fn test_percent_clamps_high() {
        let (mut status, sink) = channel();
        status.percent(1.5, "reading rows", "extract").unwrap();
        assert!(sink.text().contains("@&P=1.000"));
    }

    #[test]
    fn test_percent_fixed_precision() {
        let (mut status, sink) = channel();
        status.percent(0.333, "reading rows", "extract").unwrap();
        let text = sink.text();
        assert!(text.contains("@&P=0.333"));
        assert!(text.contains("@&M=reading rows"));
        assert!(text.contains("@&N=extract"));
    }

    #[test]
    fn test_frame_is_flanked_and_newline_terminated() {
        let (mut status, sink) = channel();
        status.status("hello").unwrap();
        assert_eq!(sink.text(), "@&@&@&M=hello@&@&\n");
    }

    #[test]
    fn test_empty_fields_are_omitted() {
        let (mut status, sink) = channel();
        status.job_started("j-1", 300, Some("")).unwrap();
        let text = sink.text();
        assert!(text.contains("@&J=j-1"));
        assert!(text.contains("@&T=300"));
        assert!(!text.contains("M="));
    }

    #[test]
    fn test_state_vocabulary() {
        let (mut status, sink) = channel();
        status.state(WorkerState::Idle, None).unwrap();
        status.state(WorkerState::Failed, Some("boom")).unwrap();
        let text = sink.text();
        assert!(text.contains("@&S=IDLE@&@&"));
        assert!(text.contains("@&S=FAILED@&M=boom@&@&"));
    }

    #[test]
    fn test_identity_frame() {
        let (mut status, sink) = channel();
        status.identity("20260823-host-worker-120000-99").unwrap();
        assert_eq!(sink.text(), "@&@&@&V=20260823-host-worker-120000-99@&@&\n");
    }
}
