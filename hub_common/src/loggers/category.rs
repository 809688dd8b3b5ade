use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::configs::ConfigError;

/// # Log Category
///
/// A named log stream with its own file and routing policy. The set is closed:
/// adding a stream means adding a variant here and a default
/// [`CategoryPolicy`](crate::configs::CategoryPolicy) in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    /// Request/connection traffic.
    Access,
    /// Failures; mirrored to the real-time stream by default.
    Error,
}

impl LogCategory {
    /// Every category, in declaration order.
    pub const ALL: [LogCategory; 2] = [LogCategory::Access, LogCategory::Error];

    /// The lowercase identifier used in file names and configuration.
    pub const fn as_str(self) -> &'static str {
        match self {
            LogCategory::Access => "access",
            LogCategory::Error => "error",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogCategory {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogCategory::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_file_naming() {
        assert_eq!(LogCategory::Access.to_string(), "access");
        assert_eq!(LogCategory::Error.to_string(), "error");
    }

    #[test]
    fn parses_known_names() {
        assert_eq!("access".parse::<LogCategory>().unwrap(), LogCategory::Access);
        assert_eq!(" ERROR ".parse::<LogCategory>().unwrap(), LogCategory::Error);
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "audit".parse::<LogCategory>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownCategory(name) if name == "audit"));
    }

    #[test]
    fn serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&LogCategory::Error).unwrap(), "\"error\"");
        let back: LogCategory = serde_json::from_str("\"access\"").unwrap();
        assert_eq!(back, LogCategory::Access);
    }
}
