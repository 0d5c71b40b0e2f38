use crate::{SupervisorError, SupervisorResult};

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// `MAJOR.MINOR[.PATCH]` version reported by the server's version command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ToolVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl ToolVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// First version-looking token in free-form command output.
    ///
    /// Handles `reasoning-server 1.4.2`, `v1.4.2`, `version: 1.4.2-beta (abc)`.
    pub fn extract(output: &str) -> Option<Self> {
        output
            .split(|c: char| c.is_whitespace() || c == ',' || c == '(' || c == ')')
            .map(|token| token.trim_start_matches(['v', 'V']))
            .find_map(|token| token.parse().ok())
    }
}

impl FromStr for ToolVersion {
    type Err = SupervisorError;

    fn from_str(s: &str) -> SupervisorResult<Self> {
        // Pre-release and build metadata do not take part in comparisons.
        let core = s.split(['-', '+']).next().unwrap_or_default();
        let mut parts = core.split('.');

        let mut next_number = |required: bool| -> SupervisorResult<u64> {
            match parts.next() {
                Some(part) => part
                    .parse::<u64>()
                    .map_err(|_| SupervisorError::invalid_version(s)),
                None if required => Err(SupervisorError::invalid_version(s)),
                None => Ok(0),
            }
        };

        let major = next_number(true)?;
        let minor = next_number(true)?;
        let patch = next_number(false)?;

        if parts.next().is_some() {
            return Err(SupervisorError::invalid_version(s));
        }

        Ok(Self::new(major, minor, patch))
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
