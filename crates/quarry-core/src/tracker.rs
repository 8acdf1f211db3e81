// Tracker client and message-channel abstraction
// Decision: strict request/reply: the checkout socket is never reused for a
// second send until the first reply has been read, which `&mut self` enforces
// Decision: a bad reply costs one checkout round and is logged; only the
// socket itself failing is allowed to take the worker down

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use quarry_contracts::{CheckoutReply, CheckoutRequest, ConfigPatch, HelloRequest};

use crate::error::{Result, WorkerError};

/// Synchronous request/reply (and fire-and-forget) message transport.
///
/// Object-safe so tests can script replies without a socket.
#[async_trait]
pub trait MessageChannel: Send {
    /// Send one message and block for exactly one reply.
    async fn request(&mut self, message: Value) -> Result<Value>;

    /// Send one message without waiting for a reply (signaling channel).
    async fn send(&mut self, message: Value) -> Result<()>;

    /// Best-effort close; errors are swallowed.
    async fn close(&mut self);
}

/// Newline-delimited JSON over TCP.
pub struct TcpMessageChannel {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TcpMessageChannel {
    /// Connect to `addr` (`host:port`). Failure here is a transport error,
    /// which surfaces as a startup failure.
    pub async fn connect(addr: &str) -> Result<Self> {
        debug!(%addr, "connecting message channel");
        let stream = TcpStream::connect(addr).await?;
        let (read, write) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read),
            writer: write,
        })
    }
}

#[async_trait]
impl MessageChannel for TcpMessageChannel {
    async fn request(&mut self, message: Value) -> Result<Value> {
        self.send(message).await?;
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(WorkerError::protocol(
                "tracker closed the connection before replying",
            ));
        }
        serde_json::from_str(line.trim())
            .map_err(|e| WorkerError::protocol(format!("malformed tracker reply: {e}")))
    }

    async fn send(&mut self, message: Value) -> Result<()> {
        let mut raw = serde_json::to_vec(&message)
            .map_err(|e| WorkerError::protocol(format!("unencodable message: {e}")))?;
        raw.push(b'\n');
        self.writer.write_all(&raw).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn close(&mut self) {
        let _ = self.writer.shutdown().await;
    }
}

/// Client for the two tracker interactions: registration and job checkout,
/// plus an optional outbound signaling channel to the foreman.
///
/// One worker owns exactly one socket pair; sockets are never shared.
pub struct TrackerClient {
    checkout: Box<dyn MessageChannel>,
    signal: Option<Box<dyn MessageChannel>>,
}

impl TrackerClient {
    /// Build a client over pre-opened channels (tests inject doubles here)
    pub fn new(checkout: Box<dyn MessageChannel>, signal: Option<Box<dyn MessageChannel>>) -> Self {
        Self { checkout, signal }
    }

    /// Connect the checkout channel and, if configured, the signaling channel
    pub async fn connect(tracker_addr: &str, foreman_addr: Option<&str>) -> Result<Self> {
        let checkout = TcpMessageChannel::connect(tracker_addr).await?;
        let signal = match foreman_addr {
            Some(addr) => Some(Box::new(TcpMessageChannel::connect(addr).await?) as Box<dyn MessageChannel>),
            None => None,
        };
        Ok(Self::new(Box::new(checkout), signal))
    }

    /// One-time registration handshake. The reply body is an opaque
    /// configuration patch merged by the caller.
    pub async fn hello(&mut self, vpid: &str, job_type: &str) -> Result<ConfigPatch> {
        let request = serde_json::to_value(HelloRequest::new(job_type, vpid))
            .map_err(|e| WorkerError::protocol(e.to_string()))?;
        let reply = self.checkout.request(request).await?;
        if !reply.is_object() {
            return Err(WorkerError::protocol("hello reply is not an object"));
        }
        Ok(reply)
    }

    /// Check out at most one job.
    ///
    /// Returns `Ok(None)` when the tracker legitimately has no work, and
    /// also (after a logged protocol error) when the reply is malformed,
    /// the ack is not "OK", or more than one job comes back; multiplicity
    /// is a tracker bug, not fatal to the worker.
    pub async fn checkout(&mut self, vpid: &str, job_type: &str) -> Result<Option<Value>> {
        let request = serde_json::to_value(CheckoutRequest::new(vpid, job_type))
            .map_err(|e| WorkerError::protocol(e.to_string()))?;

        let reply = match self.checkout.request(request).await {
            Ok(reply) => reply,
            Err(WorkerError::Protocol(message)) => {
                warn!(%message, "checkout reply rejected");
                return Ok(None);
            }
            Err(other) => return Err(other),
        };

        let reply: CheckoutReply = match serde_json::from_value(reply) {
            Ok(reply) => reply,
            Err(error) => {
                warn!(%error, "checkout reply has unexpected shape");
                return Ok(None);
            }
        };

        if !reply.is_ok() {
            warn!(ack = ?reply.ack, "tracker did not acknowledge checkout");
            return Ok(None);
        }
        let Some(mut jobs) = reply.jobs else {
            warn!("checkout reply missing jobs field");
            return Ok(None);
        };
        match jobs.len() {
            0 => Ok(None),
            1 => Ok(jobs.pop()),
            count => {
                warn!(count, "tracker returned more than one job per checkout");
                Ok(None)
            }
        }
    }

    /// Best-effort outbound signal to the foreman; a dropped signal is
    /// logged, never fatal. No-op without a signaling channel.
    pub async fn signal(&mut self, message: Value) {
        if let Some(channel) = self.signal.as_mut() {
            if let Err(error) = channel.send(message).await {
                warn!(%error, "foreman signal dropped");
            }
        }
    }

    /// Tear down both sockets, swallowing errors.
    pub async fn shutdown(&mut self) {
        self.checkout.close().await;
        if let Some(channel) = self.signal.as_mut() {
            channel.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    struct ScriptedChannel {
        replies: VecDeque<Value>,
        sent: Arc<Mutex<Vec<Value>>>,
    }

    impl ScriptedChannel {
        fn new(replies: Vec<Value>) -> (Self, Arc<Mutex<Vec<Value>>>) {
            let sent = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    replies: replies.into(),
                    sent: sent.clone(),
                },
                sent,
            )
        }
    }

    #[async_trait]
    impl MessageChannel for ScriptedChannel {
        async fn request(&mut self, message: Value) -> Result<Value> {
            self.sent.lock().unwrap().push(message);
            self.replies
                .pop_front()
                .ok_or_else(|| WorkerError::protocol("script exhausted"))
        }

        async fn send(&mut self, message: Value) -> Result<()> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }

        async fn close(&mut self) {}
    }

    fn client_with(replies: Vec<Value>) -> (TrackerClient, Arc<Mutex<Vec<Value>>>) {
        let (channel, sent) = ScriptedChannel::new(replies);
        (TrackerClient::new(Box::new(channel), None), sent)
    }

    #[tokio::test]
    async fn test_checkout_one_job() {
        let (mut client, sent) = client_with(vec![json!({
            "ack": "OK",
            "jobs": [{"id": "j-1", "description": "parcels", "timeout": 60}]
        })]);

        let job = client.checkout("vpid-1", "parcels").await.unwrap();
        assert_eq!(job.unwrap()["id"], "j-1");

        let sent = sent.lock().unwrap();
        assert_eq!(sent[0]["checkout"]["owner"], "vpid-1");
        assert_eq!(sent[0]["checkout"]["type"], "parcels");
    }

    #[tokio::test]
    async fn test_checkout_no_work() {
        let (mut client, _) = client_with(vec![json!({"ack": "OK", "jobs": []})]);
        assert!(client.checkout("vpid-1", "parcels").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_checkout_bad_ack_is_not_fatal() {
        let (mut client, _) = client_with(vec![json!({"ack": "ERROR", "jobs": []})]);
        assert!(client.checkout("vpid-1", "parcels").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_checkout_missing_jobs_field() {
        let (mut client, _) = client_with(vec![json!({"ack": "OK"})]);
        assert!(client.checkout("vpid-1", "parcels").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_checkout_multiplicity_is_a_tracker_bug() {
        let (mut client, _) = client_with(vec![json!({
            "ack": "OK",
            "jobs": [{"id": "a"}, {"id": "b"}]
        })]);
        assert!(client.checkout("vpid-1", "parcels").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_checkout_protocol_error_yields_no_job() {
        // Exhausted script surfaces as a protocol error from the channel
        let (mut client, _) = client_with(vec![]);
        assert!(client.checkout("vpid-1", "parcels").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_hello_returns_patch() {
        let (mut client, sent) = client_with(vec![json!({"pollIntervalMs": 500})]);
        let patch = client.hello("vpid-1", "parcels").await.unwrap();
        assert_eq!(patch["pollIntervalMs"], 500);

        let sent = sent.lock().unwrap();
        assert_eq!(sent[0]["jobType"], "parcels");
        assert_eq!(sent[0]["vpid"], "vpid-1");
        assert_eq!(sent[0]["encoding"], "json");
    }

    #[tokio::test]
    async fn test_hello_rejects_non_object_reply() {
        let (mut client, _) = client_with(vec![json!("welcome")]);
        let result = client.hello("vpid-1", "parcels").await;
        assert!(matches!(result, Err(WorkerError::Protocol(_))));
    }
}
