//! Engine version reported by a session

use crate::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `major.minor.patch`, ordered numerically.
///
/// Pre-release and build suffixes (`3.0.0-preview2`, `2.4.8+build`) are accepted and
/// ignored for comparison purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EngineVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl EngineVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// True when this version is `major.minor` or newer
    pub fn at_least(&self, major: u32, minor: u32) -> bool {
        *self >= Self::new(major, minor, 0)
    }
}

impl FromStr for EngineVersion {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        let core = s
            .trim()
            .split(|c| c == '-' || c == '+')
            .next()
            .unwrap_or_default();

        let mut parts = core.split('.');
        let mut next = |required: bool| -> Result<u32> {
            match parts.next() {
                Some(part) => part
                    .parse()
                    .map_err(|_| BridgeError::Remote(format!("Invalid engine version: {}", s))),
                None if required => Err(BridgeError::Remote(format!("Invalid engine version: {}", s))),
                None => Ok(0),
            }
        };

        let major = next(true)?;
        let minor = next(false)?;
        let patch = next(false)?;
        Ok(Self::new(major, minor, patch))
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("2.4.1".parse::<EngineVersion>().unwrap(), EngineVersion::new(2, 4, 1));
        assert_eq!("1.6".parse::<EngineVersion>().unwrap(), EngineVersion::new(1, 6, 0));
        assert_eq!("3".parse::<EngineVersion>().unwrap(), EngineVersion::new(3, 0, 0));
        assert_eq!(
            "3.0.0-preview2".parse::<EngineVersion>().unwrap(),
            EngineVersion::new(3, 0, 0)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<EngineVersion>().is_err());
        assert!("two.zero".parse::<EngineVersion>().is_err());
    }

    #[test]
    fn test_ordering() {
        let v16 = EngineVersion::new(1, 6, 3);
        let v20 = EngineVersion::new(2, 0, 0);
        assert!(v16 < v20);
        assert!(!v16.at_least(2, 0));
        assert!(v20.at_least(2, 0));
        assert!(EngineVersion::new(10, 0, 0).at_least(2, 0));
    }

    #[test]
    fn test_display() {
        assert_eq!(EngineVersion::new(2, 4, 8).to_string(), "2.4.8");
    }
}
