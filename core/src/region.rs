//! Region identity.
//!
//! Each region runs its own independent component set; the region value
//! appears in bids, event envelopes, and the coordinator's reachability map.
//! The canonical string form ("US", "EU") is what gets serialized into event
//! payloads, so both sides of the inter-region link agree on it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for region parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown region: {0}")]
pub struct ParseRegionError(String);

/// A deployment region.
///
/// The `Ord` implementation gives the ascending tie-break order used by the
/// leaderboard sort (US before EU).
///
/// # Examples
///
/// ```
/// use gavel_core::region::Region;
///
/// assert_eq!(Region::Us.to_string(), "US");
/// assert_eq!("EU".parse::<Region>(), Ok(Region::Eu));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    /// United States region.
    Us,
    /// European Union region.
    Eu,
}

impl Region {
    /// All regions known to the system.
    pub const ALL: [Self; 2] = [Self::Us, Self::Eu];

    /// Canonical string form ("US", "EU").
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Us => "US",
            Self::Eu => "EU",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = ParseRegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "US" => Ok(Self::Us),
            "EU" => Ok(Self::Eu),
            other => Err(ParseRegionError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_roundtrips() {
        for region in Region::ALL {
            #[allow(clippy::expect_used)] // Panics: Test will fail if parse fails
            let parsed: Region = region.as_str().parse().expect("parse should succeed");
            assert_eq!(parsed, region);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("us".parse::<Region>(), Ok(Region::Us));
        assert_eq!("eu".parse::<Region>(), Ok(Region::Eu));
    }

    #[test]
    fn parse_unknown_fails() {
        assert!("AP".parse::<Region>().is_err());
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail if serialization fails
    fn serde_uses_canonical_strings() {
        let json = serde_json::to_string(&Region::Eu).expect("serialize should succeed");
        assert_eq!(json, "\"EU\"");
        let back: Region = serde_json::from_str(&json).expect("deserialize should succeed");
        assert_eq!(back, Region::Eu);
    }

    #[test]
    fn tie_break_order_is_us_first() {
        assert!(Region::Us < Region::Eu);
    }
}
