//! Property change types.

use serde::Serialize;
use std::fmt;

use crate::fieldpath::Path;
use crate::typed::PropertyValue;

/// ChangeKind classifies a change to one top-level property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    /// The property is set in the desired tree and absent in the observed one.
    Add,
    /// The property differs somewhere at or below its top level.
    Modify,
    /// The property returns to its schema default.
    Remove,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeKind::Add => "ADD",
            ChangeKind::Modify => "MODIFY",
            ChangeKind::Remove => "REMOVE",
        };
        f.write_str(name)
    }
}

/// PropertyChange is one difference between a desired and an observed
/// table, at top-level property granularity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyChange {
    pub table: String,
    /// Path of the top-level property.
    pub path: Path,
    pub kind: ChangeKind,
    /// Observed value, None when the property is absent.
    pub old: Option<PropertyValue>,
    /// Full replacement value. For REMOVE this is the default the property
    /// resets to.
    pub new: Option<PropertyValue>,
    /// Every differing leaf below `path`, in ascending order.
    pub leaves: Vec<Path>,
}

impl PropertyChange {
    /// Returns the name of the top-level property this change replaces.
    pub fn property(&self) -> &str {
        self.path.root().unwrap_or_default()
    }
}

impl fmt::Display for PropertyChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.kind {
            ChangeKind::Add => '+',
            ChangeKind::Modify => '~',
            ChangeKind::Remove => '-',
        };
        write!(f, "{} {} {}", sign, self.table, self.path)?;
        match (&self.old, &self.new) {
            (Some(old), Some(new)) => write!(f, ": {} -> {}", old, new),
            (None, Some(new)) => write!(f, ": {}", new),
            (Some(old), None) => write!(f, ": {} -> <absent>", old),
            (None, None) => Ok(()),
        }
    }
}
