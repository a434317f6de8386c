use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a replicated text file, as it appears in client requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileName(pub String);

impl FileName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Base name with everything from the first `.` onward stripped, e.g.
    /// `notes.txt` → `notes`, `a.b.txt` → `a`. Matches the original
    /// system's per-node file naming scheme (`file_name.split('.')[0]`),
    /// which truncates at the first dot rather than the last extension.
    pub fn stem(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FileName {
    fn from(name: &str) -> Self {
        FileName(name.to_string())
    }
}

impl From<String> for FileName {
    fn from(name: String) -> Self {
        FileName(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_strips_extension() {
        assert_eq!(FileName::new("notes.txt").stem(), "notes");
        assert_eq!(FileName::new("README").stem(), "README");
    }

    #[test]
    fn stem_truncates_at_first_dot_for_multi_dot_names() {
        assert_eq!(FileName::new("a.b.txt").stem(), "a");
    }
}
