use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StreamSegmentKind {
    /// Deliberation framed by `<think>` markers.
    Reasoning,
    /// The user-facing answer.
    Narrative,
}

/// A run of display text carrying exactly one kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Segment {
    pub kind: StreamSegmentKind,
    pub text: String,
}

impl Segment {
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self {
            kind: StreamSegmentKind::Reasoning,
            text: text.into(),
        }
    }

    pub fn narrative(text: impl Into<String>) -> Self {
        Self {
            kind: StreamSegmentKind::Narrative,
            text: text.into(),
        }
    }
}

/// Returns whether the receiver wants the stream to keep flowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamControl {
    Continue,
    Cancel,
}
