//! Version history cursor for page undo/redo.
//!
//! Every snapshot a page ever had stays in its append-only version log. The
//! cursor stored on the page decides what undo and redo mean:
//!
//! - `current_version` is the snapshot the live blocks came from (0 = none).
//! - `redo_stack` holds the versions undone since the last new snapshot,
//!   most recently undone last.
//!
//! Each snapshot records the cursor it was taken from as its parent, so undo
//! after an undo-then-edit returns to the branch point instead of to the
//! abandoned branch. Appending a snapshot empties the redo stack.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::VersionNumber;

pub const NO_UNDO_STEPS: &str = "No more undo steps available";
pub const NO_REDO_STEP: &str = "No redo step available";

// ---------------------------------------------------------------------------
// SaveType
// ---------------------------------------------------------------------------

/// Why a snapshot was taken. Informational; only used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveType {
    #[default]
    Auto,
    Manual,
    Publish,
    Restore,
}

impl SaveType {
    pub fn as_str(self) -> &'static str {
        match self {
            SaveType::Auto => "auto",
            SaveType::Manual => "manual",
            SaveType::Publish => "publish",
            SaveType::Restore => "restore",
        }
    }
}

impl fmt::Display for SaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaveType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(SaveType::Auto),
            "manual" => Ok(SaveType::Manual),
            "publish" => Ok(SaveType::Publish),
            "restore" => Ok(SaveType::Restore),
            other => Err(CoreError::Validation(format!(
                "Invalid save type '{other}'. Must be one of: auto, manual, publish, restore"
            ))),
        }
    }
}

impl TryFrom<String> for SaveType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// HistoryCursor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryCursor {
    pub current_version: VersionNumber,
    pub redo_stack: Vec<VersionNumber>,
}

/// A planned move of the cursor. `target` is the snapshot whose blocks
/// become the live content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryStep {
    pub target: VersionNumber,
    pub cursor: HistoryCursor,
}

impl HistoryCursor {
    pub fn new(current_version: VersionNumber, redo_stack: Vec<VersionNumber>) -> Self {
        Self {
            current_version,
            redo_stack,
        }
    }

    /// Parent to record on the next snapshot (`None` when there is no history yet).
    pub fn parent_for_next(&self) -> Option<VersionNumber> {
        (self.current_version > 0).then_some(self.current_version)
    }

    /// Cursor after appending snapshot `version`. Forward history is dropped.
    pub fn advance(&self, version: VersionNumber) -> Self {
        Self {
            current_version: version,
            redo_stack: Vec::new(),
        }
    }

    /// Plan an undo.
    ///
    /// `parent` is the parent recorded on the current snapshot. Version 1
    /// and snapshots without a parent are the oldest reachable state. A
    /// parent that is not older than the current snapshot cannot be undone
    /// to and is reported as inconsistent history.
    pub fn plan_undo(&self, parent: Option<VersionNumber>) -> Result<HistoryStep, CoreError> {
        if self.current_version <= 1 {
            return Err(CoreError::TerminalState(NO_UNDO_STEPS.into()));
        }
        let target = match parent {
            Some(p) if p >= self.current_version => {
                return Err(CoreError::InternalConsistency(format!(
                    "version {} records parent {p}, which is not older",
                    self.current_version
                )))
            }
            Some(p) if p > 0 => p,
            _ => return Err(CoreError::TerminalState(NO_UNDO_STEPS.into())),
        };

        let mut redo_stack = self.redo_stack.clone();
        redo_stack.push(self.current_version);
        Ok(HistoryStep {
            target,
            cursor: Self {
                current_version: target,
                redo_stack,
            },
        })
    }

    /// Plan a redo of the most recently undone snapshot.
    pub fn plan_redo(&self) -> Result<HistoryStep, CoreError> {
        let mut redo_stack = self.redo_stack.clone();
        let target = redo_stack
            .pop()
            .ok_or_else(|| CoreError::TerminalState(NO_REDO_STEP.into()))?;
        Ok(HistoryStep {
            target,
            cursor: Self {
                current_version: target,
                redo_stack,
            },
        })
    }
}
