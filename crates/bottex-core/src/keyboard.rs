//! Reply keyboards.
//!
//! A [`Keyboard`] is an ordered list of rows of text buttons. The empty
//! keyboard is a valid value meaning "show no keyboard".
//!
//! # Wire Shape
//!
//! The boundary format (used verbatim by VK and accepted by
//! [`Keyboard::from_wire`]) is:
//!
//! ```json
//! {"one_time": false,
//!  "buttons": [[{"action": {"type": "text", "label": "A"}, "color": "secondary"}]]}
//! ```
//!
//! An empty keyboard serializes to the empty string, not to `{}`.

use serde::{Deserialize, Serialize};

/// Button color written to the wire; platforms without colors ignore it.
const DEFAULT_COLOR: &str = "secondary";

/// A single text button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    label: String,
}

impl Button {
    /// Creates a text button.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Returns the button label.
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// A reply keyboard.
///
/// # Example
///
/// ```rust,ignore
/// let kb = Keyboard::new()
///     .row(["Yes", "No"])
///     .row(["Cancel"])
///     .one_time(true);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    rows: Vec<Vec<Button>>,
    one_time: bool,
}

impl Keyboard {
    /// Creates an empty keyboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row of buttons (builder pattern).
    pub fn row<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_row(labels);
        self
    }

    /// Appends a row of buttons.
    pub fn push_row<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows
            .push(labels.into_iter().map(|l| Button::new(l)).collect());
    }

    /// Sets whether the platform should hide the keyboard after one use.
    pub fn one_time(mut self, one_time: bool) -> Self {
        self.one_time = one_time;
        self
    }

    /// Returns whether the keyboard is hidden after one use.
    pub fn is_one_time(&self) -> bool {
        self.one_time
    }

    /// Returns the button rows.
    pub fn rows(&self) -> &[Vec<Button>] {
        &self.rows
    }

    /// Returns `true` if the keyboard has no buttons at all.
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    /// Serializes to the wire shape; an empty keyboard becomes `""`.
    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        if self.is_empty() {
            return Ok(String::new());
        }
        serde_json::to_string(&WireKeyboard::from(self))
    }

    /// Parses the wire shape; `""` yields an empty keyboard.
    pub fn from_wire(s: &str) -> Result<Self, serde_json::Error> {
        if s.trim().is_empty() {
            return Ok(Self::new());
        }
        let wire: WireKeyboard = serde_json::from_str(s)?;
        Ok(wire.into())
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct WireKeyboard {
    one_time: bool,
    buttons: Vec<Vec<WireButton>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireButton {
    action: WireAction,
    #[serde(default = "default_color")]
    color: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireAction {
    #[serde(rename = "type")]
    kind: String,
    label: String,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

impl From<&Keyboard> for WireKeyboard {
    fn from(kb: &Keyboard) -> Self {
        Self {
            one_time: kb.one_time,
            buttons: kb
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|b| WireButton {
                            action: WireAction {
                                kind: "text".to_string(),
                                label: b.label.clone(),
                            },
                            color: default_color(),
                        })
                        .collect()
                })
                .collect(),
        }
    }
}

impl From<WireKeyboard> for Keyboard {
    fn from(wire: WireKeyboard) -> Self {
        Self {
            one_time: wire.one_time,
            rows: wire
                .buttons
                .into_iter()
                .map(|row| row.into_iter().map(|b| Button::new(b.action.label)).collect())
                .collect(),
        }
    }
}
