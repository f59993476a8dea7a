use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifier of a node in a record store.
///
/// Identifiers are assigned by the store on first persist and are rendered
/// as a decimal digit run, which is also their form inside a path segment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Create a `NodeId` from its raw value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The identifier that follows this one in store assignment order, or
    /// `None` once the id space is exhausted.
    pub fn checked_next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = TypeError;

    /// Parse a segment. Only plain ASCII digits are accepted, so `"+1"` or
    /// `" 1"` are rejected even though `u64::from_str` would take some of them.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TypeError::InvalidId(s.to_string()));
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|e| TypeError::InvalidId(format!("{s}: {e}")))
    }
}

impl From<u64> for NodeId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<NodeId> for u64 {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_decimal() {
        assert_eq!(NodeId::new(42).to_string(), "42");
        assert_eq!(format!("{:?}", NodeId::new(7)), "NodeId(7)");
    }

    #[test]
    fn parse_accepts_digits_only() {
        assert_eq!("17".parse::<NodeId>().unwrap(), NodeId::new(17));
        assert!("".parse::<NodeId>().is_err());
        assert!("+1".parse::<NodeId>().is_err());
        assert!("1a".parse::<NodeId>().is_err());
        assert!(" 1".parse::<NodeId>().is_err());
    }

    #[test]
    fn parse_rejects_overflow() {
        let err = "99999999999999999999999".parse::<NodeId>().unwrap_err();
        assert!(matches!(err, TypeError::InvalidId(_)));
    }

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&NodeId::new(5)).unwrap();
        assert_eq!(json, "5");
        let back: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, NodeId::new(5));
    }

    #[test]
    fn checked_next_increments_until_exhausted() {
        assert_eq!(NodeId::new(1).checked_next(), Some(NodeId::new(2)));
        assert_eq!(NodeId::new(u64::MAX).checked_next(), None);
    }
}
