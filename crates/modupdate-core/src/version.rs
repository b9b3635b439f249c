//! Dotted version strings (`1.2`, `1.2.0.3`) with zero-padded ordering.

use crate::errors::{Result, UpdateError};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Non-negative integer components. Missing trailing components count as zero,
/// so `1.2` and `1.2.0` are equal.
#[derive(Debug, Clone)]
pub struct Version {
    parts: Vec<u64>,
}

impl FromStr for Version {
    type Err = UpdateError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(UpdateError::InvalidVersion(s.to_string()));
        }

        let parts = trimmed
            .split('.')
            .map(|c| {
                // `u64::from_str` accepts a leading '+', which is not a version digit
                if c.is_empty() || !c.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(UpdateError::InvalidVersion(s.to_string()));
                }
                c.parse::<u64>()
                    .map_err(|_| UpdateError::InvalidVersion(s.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Version { parts })
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let n = self.parts.len().max(other.parts.len());
        (0..n)
            .map(|i| {
                let a = self.parts.get(i).copied().unwrap_or(0);
                let b = other.parts.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for p in &self.parts {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{p}")?;
            first = false;
        }
        Ok(())
    }
}

/// True when `candidate` orders strictly after `reference`.
pub fn is_newer(candidate: &str, reference: &str) -> Result<bool> {
    let candidate: Version = candidate.parse()?;
    let reference: Version = reference.parse()?;
    Ok(candidate > reference)
}
