//! VK API wire types (the subset Bottex uses).

use bottex_core::{TransportError, TransportResult};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Credentials of a Bots Long Poll server (`groups.getLongPollServer`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LongPollServer {
    pub key: String,
    pub server: String,
    #[serde(deserialize_with = "string_or_number")]
    pub ts: String,
}

/// An `a_check` answer.
#[derive(Debug, Clone, Deserialize)]
pub struct LongPollResponse {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub ts: Option<String>,
    #[serde(default)]
    pub updates: Vec<Value>,
    #[serde(default)]
    pub failed: Option<i64>,
}

/// What the receiver should do after an `a_check` answer.
#[derive(Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// Events to process and the ts to continue from.
    Events { ts: String, updates: Vec<Value> },
    /// History is outdated; continue from the given ts.
    Resync { ts: String },
    /// The key expired or information was lost; a new server is needed.
    Reconnect,
}

impl LongPollResponse {
    /// Classifies the answer according to its `failed` code.
    pub fn outcome(self) -> PollOutcome {
        match (self.failed, self.ts) {
            (None, Some(ts)) => PollOutcome::Events { ts, updates: self.updates },
            (Some(1), Some(ts)) => PollOutcome::Resync { ts },
            _ => PollOutcome::Reconnect,
        }
    }
}

/// Returns the `response` field of a method answer, or the API error.
pub fn decode_response(body: Value) -> TransportResult<Value> {
    if let Some(error) = body.get("error") {
        return Err(TransportError::Api {
            code: error.get("error_code").and_then(Value::as_i64).unwrap_or_default(),
            message: error
                .get("error_msg")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }
    match body {
        Value::Object(mut map) => map
            .remove("response")
            .ok_or_else(|| TransportError::Decode("missing `response` field".into())),
        other => Err(TransportError::Decode(format!("unexpected answer: {other}"))),
    }
}

/// A `message_new` event reduced to what dispatch needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub peer_id: i64,
    pub from_id: i64,
    pub text: String,
}

/// Returns the message object of a `message_new` event.
///
/// API versions before 5.103 put the message directly under `object`.
fn message_object(event: &Value) -> Option<&Value> {
    if event.get("type").and_then(Value::as_str) != Some("message_new") {
        return None;
    }
    let object = event.get("object")?;
    Some(object.get("message").unwrap_or(object))
}

/// Parses a `message_new` event. Other event types yield `None`.
pub fn new_message(event: &Value) -> Option<NewMessage> {
    let message = message_object(event)?;
    Some(NewMessage {
        peer_id: message.get("peer_id")?.as_i64()?,
        from_id: message.get("from_id")?.as_i64()?,
        text: message.get("text")?.as_str()?.to_string(),
    })
}

/// Extracts the sender id from a raw event payload.
pub fn sender_id(payload: &Value) -> Option<String> {
    let message = message_object(payload)?;
    Some(message.get("from_id")?.as_i64()?.to_string())
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected ts, got {other}"))),
    }
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    string_or_number(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(text: &str) -> Value {
        json!({
            "type": "message_new",
            "object": {"message": {"peer_id": 2000000001, "from_id": 42, "text": text}},
            "group_id": 1
        })
    }

    #[test]
    fn test_new_message() {
        let message = new_message(&event("Hi")).unwrap();
        assert_eq!(message.peer_id, 2000000001);
        assert_eq!(message.from_id, 42);
        assert_eq!(message.text, "Hi");
        assert_eq!(sender_id(&event("Hi")).as_deref(), Some("42"));
    }

    #[test]
    fn test_legacy_message_layout() {
        let legacy = json!({"type": "message_new", "object": {"peer_id": 5, "from_id": 5, "text": "x"}});
        assert_eq!(new_message(&legacy).unwrap().peer_id, 5);
    }

    #[test]
    fn test_other_events_are_ignored() {
        let typing = json!({"type": "message_typing_state", "object": {"from_id": 1}});
        assert!(new_message(&typing).is_none());
        assert!(sender_id(&typing).is_none());
    }

    #[test]
    fn test_poll_outcomes() {
        let ok: LongPollResponse = serde_json::from_value(json!({"ts": "11", "updates": [event("a")]})).unwrap();
        assert!(matches!(ok.outcome(), PollOutcome::Events { ts, updates } if ts == "11" && updates.len() == 1));

        let outdated: LongPollResponse = serde_json::from_value(json!({"failed": 1, "ts": 30})).unwrap();
        assert_eq!(outdated.outcome(), PollOutcome::Resync { ts: "30".into() });

        let expired: LongPollResponse = serde_json::from_value(json!({"failed": 2})).unwrap();
        assert_eq!(expired.outcome(), PollOutcome::Reconnect);
    }

    #[test]
    fn test_decode_response() {
        let server: LongPollServer = serde_json::from_value(
            decode_response(json!({"response": {"key": "k", "server": "https://lp.vk.com/wh1", "ts": 10}})).unwrap(),
        )
        .unwrap();
        assert_eq!(server.ts, "10");

        let err = decode_response(json!({"error": {"error_code": 5, "error_msg": "User authorization failed"}}));
        assert!(matches!(err, Err(TransportError::Api { code: 5, .. })));
    }
}
