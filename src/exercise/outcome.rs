//! Per-cog outcome records.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::identifiers::CogName;

// ============================================================================
// CogOutcome
// ============================================================================

/// What the bot confirmed for one cog during an exercise run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CogOutcome {
    /// Cog that was exercised.
    pub name: CogName,
    /// The bot confirmed the load.
    pub loaded: bool,
    /// The bot confirmed the unload.
    pub unloaded: bool,
}

impl CogOutcome {
    /// Creates a pending outcome with nothing confirmed yet.
    #[inline]
    #[must_use]
    pub fn pending(name: CogName) -> Self {
        Self {
            name,
            loaded: false,
            unloaded: false,
        }
    }

    /// Returns `true` once both halves of the round trip are confirmed.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.loaded && self.unloaded
    }
}

impl fmt::Display for CogOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (loaded: {}, unloaded: {})",
            self.name, self.loaded, self.unloaded
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_is_incomplete() {
        let mut outcome = CogOutcome::pending(CogName::new("alpha").expect("valid"));
        assert!(!outcome.is_complete());

        outcome.loaded = true;
        assert!(!outcome.is_complete());

        outcome.unloaded = true;
        assert!(outcome.is_complete());
        assert_eq!(outcome.to_string(), "alpha (loaded: true, unloaded: true)");
    }
}
