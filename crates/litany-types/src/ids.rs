//! Type-safe identifier wrappers.
//!
//! Followers are numbered sequentially from 1 in recruitment order, so the
//! identifier is a plain counter rather than a random UUID.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Identifier of a recruited follower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FollowerId(pub u32);

impl FollowerId {
    /// The identifier handed to the first follower ever recruited.
    pub const FIRST: Self = Self(1);

    /// Return the identifier that follows this one, or `None` on overflow.
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    /// Return the inner counter value.
    pub const fn into_inner(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for FollowerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for FollowerId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_increments() {
        assert_eq!(FollowerId::FIRST.next(), Some(FollowerId(2)));
        assert_eq!(FollowerId(u32::MAX).next(), None);
    }

    #[test]
    fn display_uses_hash_prefix() {
        assert_eq!(FollowerId(7).to_string(), "#7");
    }
}
