//! Core data carried between the page, durable storage and the engine.
//! Records are owned by the engine; this layer only stores and forwards them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One finished game as the engine encoded it. Never inspected here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryRecord(pub Value);

/// Finished games in engine order (newest last).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History(pub Vec<HistoryRecord>);

impl History {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Value> for History {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().map(HistoryRecord).collect())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Flags handed to the engine once, at construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionFlags {
    pub history: History,
    pub height: u32,
    pub width: u32,
    #[serde(rename = "initPath")]
    pub init_path: String,
}

impl SessionFlags {
    pub fn new(history: History, viewport: Viewport, init_path: impl Into<String>) -> Self {
        Self {
            history,
            height: viewport.height,
            width: viewport.width,
            init_path: init_path.into(),
        }
    }
}
