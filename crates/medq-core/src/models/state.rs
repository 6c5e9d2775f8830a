use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Lifecycle state shared by clinical events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum EventState {
    #[default]
    Preparation,
    InProgress,
    Suspended,
    Aborted,
    Completed,
    EnteredInError,
    Unknown,
}

impl EventState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preparation => "preparation",
            Self::InProgress => "in_progress",
            Self::Suspended => "suspended",
            Self::Aborted => "aborted",
            Self::Completed => "completed",
            Self::EnteredInError => "entered_in_error",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EventState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
