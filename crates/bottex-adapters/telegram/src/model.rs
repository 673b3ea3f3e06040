//! Bot API wire types (the subset Bottex uses).

use bottex_core::{Keyboard, TransportError, TransportResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ApiResponse {
    /// Returns the `result` field, or the API error.
    pub fn into_result(self) -> TransportResult<Value> {
        if self.ok {
            return Ok(self.result.unwrap_or(Value::Null));
        }
        Err(TransportError::Api {
            code: self.error_code.unwrap_or_default(),
            message: self.description.unwrap_or_else(|| "unknown error".into()),
        })
    }
}

/// An incoming update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

/// A message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: ChatRef,
    #[serde(default)]
    pub from: Option<UserRef>,
    #[serde(default)]
    pub text: Option<String>,
}

/// The chat a message belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRef {
    pub id: i64,
}

/// The sender of a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
}

impl Update {
    /// Returns `(chat_id, text)` for text messages.
    pub fn text_message(&self) -> Option<(i64, &str)> {
        let message = self.message.as_ref()?;
        Some((message.chat.id, message.text.as_deref()?))
    }

    /// Returns the sender id as it is keyed in the user store.
    ///
    /// Falls back to the chat id for messages without a sender (channels).
    pub fn sender_id(&self) -> Option<String> {
        let message = self.message.as_ref()?;
        Some(message.from.as_ref().map_or(message.chat.id, |u| u.id).to_string())
    }
}

/// Extracts the sender id from a raw update payload.
pub fn sender_id(payload: &Value) -> Option<String> {
    serde_json::from_value::<Update>(payload.clone())
        .ok()
        .and_then(|update| update.sender_id())
}

// =============================================================================
// Outgoing
// =============================================================================

/// `sendMessage` parameters.
#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyKeyboardMarkup>,
}

/// A custom reply keyboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub one_time_keyboard: bool,
    pub resize_keyboard: bool,
}

/// A text button.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

impl ReplyKeyboardMarkup {
    /// Converts a keyboard; the empty keyboard has no markup.
    pub fn from_keyboard(keyboard: &Keyboard) -> Option<Self> {
        if keyboard.is_empty() {
            return None;
        }
        Some(Self {
            keyboard: keyboard
                .rows()
                .iter()
                .filter(|row| !row.is_empty())
                .map(|row| {
                    row.iter()
                        .map(|b| KeyboardButton {
                            text: b.label().to_string(),
                        })
                        .collect()
                })
                .collect(),
            one_time_keyboard: keyboard.is_one_time(),
            resize_keyboard: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_text_update() {
        let payload = json!({
            "update_id": 10,
            "message": {
                "message_id": 1,
                "chat": {"id": 555, "type": "private"},
                "from": {"id": 777, "is_bot": false, "first_name": "A"},
                "date": 0,
                "text": "hello"
            }
        });
        let update: Update = serde_json::from_value(payload.clone()).unwrap();

        assert_eq!(update.text_message(), Some((555, "hello")));
        assert_eq!(sender_id(&payload).as_deref(), Some("777"));
    }

    #[test]
    fn test_non_text_update() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 11,
            "message": {"message_id": 2, "chat": {"id": 1}, "sticker": {}}
        }))
        .unwrap();
        assert!(update.text_message().is_none());

        let update: Update = serde_json::from_value(json!({"update_id": 12})).unwrap();
        assert!(update.sender_id().is_none());
    }

    #[test]
    fn test_error_response() {
        let response: ApiResponse = serde_json::from_value(json!({
            "ok": false, "error_code": 401, "description": "Unauthorized"
        }))
        .unwrap();

        match response.into_result() {
            Err(TransportError::Api { code, message }) => {
                assert_eq!(code, 401);
                assert_eq!(message, "Unauthorized");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_keyboard_markup() {
        assert!(ReplyKeyboardMarkup::from_keyboard(&Keyboard::new()).is_none());

        let markup =
            ReplyKeyboardMarkup::from_keyboard(&Keyboard::new().row(["A", "B"]).one_time(true)).unwrap();
        assert_eq!(
            serde_json::to_value(&markup).unwrap(),
            json!({
                "keyboard": [[{"text": "A"}, {"text": "B"}]],
                "one_time_keyboard": true,
                "resize_keyboard": true
            })
        );
    }

    #[test]
    fn test_send_message_omits_empty_markup() {
        let body = SendMessage {
            chat_id: 1,
            text: "hi",
            reply_markup: None,
        };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({"chat_id": 1, "text": "hi"}));
    }
}
