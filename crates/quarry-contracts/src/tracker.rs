// Tracker checkout protocol payloads
// Decision: camelCase field names on the wire are pinned by the tracker, not by us

use serde::{Deserialize, Serialize};

/// Registration handshake sent once per worker process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelloRequest {
    pub job_type: String,
    pub vpid: String,
    pub lang: String,
    /// Always `"json"`; the tracker also speaks a legacy encoding we do not
    pub encoding: String,
}

impl HelloRequest {
    pub fn new(job_type: impl Into<String>, vpid: impl Into<String>) -> Self {
        Self {
            job_type: job_type.into(),
            vpid: vpid.into(),
            lang: "rust".to_string(),
            encoding: "json".to_string(),
        }
    }
}

/// Opaque configuration object returned by the hello handshake.
///
/// Recognized members (all optional): `trackerAddr`, `pollIntervalMs`,
/// `idleTimeoutSecs`. Unknown members are ignored.
pub type ConfigPatch = serde_json::Value;

/// Checkout request: `{"checkout": {"owner": <vpid>, "type": <jobType>}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub checkout: CheckoutClaim,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutClaim {
    pub owner: String,
    #[serde(rename = "type")]
    pub job_type: String,
}

impl CheckoutRequest {
    pub fn new(owner: impl Into<String>, job_type: impl Into<String>) -> Self {
        Self {
            checkout: CheckoutClaim {
                owner: owner.into(),
                job_type: job_type.into(),
            },
        }
    }
}

/// Checkout reply: `{"ack": "OK", "jobs": [ ... ]}`.
///
/// The tracker contract is at most one job per checkout; `jobs` is a list
/// only for wire compatibility. Entries stay raw JSON here so each job
/// family can parse its own shape through its job factory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutReply {
    #[serde(default)]
    pub ack: Option<String>,
    #[serde(default)]
    pub jobs: Option<Vec<serde_json::Value>>,
}

impl CheckoutReply {
    pub fn is_ok(&self) -> bool {
        self.ack.as_deref() == Some("OK")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_request_wire_shape() {
        let req = CheckoutRequest::new("vpid-1", "parcels");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["checkout"]["owner"], "vpid-1");
        assert_eq!(value["checkout"]["type"], "parcels");
    }

    #[test]
    fn test_hello_request_wire_shape() {
        let req = HelloRequest::new("parcels", "vpid-1");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["jobType"], "parcels");
        assert_eq!(value["vpid"], "vpid-1");
        assert_eq!(value["encoding"], "json");
    }

    #[test]
    fn test_checkout_reply_missing_ack() {
        let reply: CheckoutReply = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(!reply.is_ok());
        assert!(reply.jobs.is_none());
    }
}
