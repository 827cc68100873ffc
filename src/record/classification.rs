/// Detail page classification
///
/// Decides which extraction schema runs for a detail page.
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of detail page a tender points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Results protocol of a finished procurement
    Completed,

    /// Open announcement still accepting bids
    Published,

    /// No marker matched; nothing is extracted
    Unknown,
}

impl Classification {
    /// Converts the classification to its stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Published => "published",
            Self::Unknown => "unknown",
        }
    }

    /// Parses a classification from its stored string form
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(Self::Completed),
            "published" => Some(Self::Published),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
