use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LauncherError;

/// Dotted game version such as `0.3.5.0`.
///
/// Equality is strict: `1.0` and `1` are different versions, no trailing-zero
/// normalisation is applied. Serialised as a JSON array of integers, matching
/// the remote manifest.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u64>", into = "Vec<u64>")]
pub struct Version(Vec<u64>);

impl Version {
    pub fn new(components: Vec<u64>) -> Result<Self, LauncherError> {
        if components.is_empty() {
            return Err(LauncherError::Parse(
                "version needs at least one component".into(),
            ));
        }
        Ok(Self(components))
    }

    /// Release tag used in download URLs, e.g. `v0.3.5.0`.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("v{self}")
    }
}

impl FromStr for Version {
    type Err = LauncherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let components = trimmed
            .split('.')
            .map(|part| {
                // u64::from_str accepts a leading '+', which is not a version digit.
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(LauncherError::Parse(format!(
                        "invalid version component {part:?} in {trimmed:?}"
                    )));
                }
                part.parse::<u64>().map_err(|e| {
                    LauncherError::Parse(format!("invalid version component {part:?}: {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(components)
    }
}

impl TryFrom<Vec<u64>> for Version {
    type Error = LauncherError;

    fn try_from(components: Vec<u64>) -> Result<Self, Self::Error> {
        Self::new(components)
    }
}

impl From<Version> for Vec<u64> {
    fn from(version: Version) -> Self {
        version.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}
