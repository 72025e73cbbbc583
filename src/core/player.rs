//! Player identification.
//!
//! ## PlayerId
//!
//! Type-safe player identifier supporting up to 255 seats. Ids are handed
//! out by the lobby in join order and never reused within a game instance,
//! so an id stays valid after other players are excluded.

use serde::{Deserialize, Serialize};

/// Stable player identifier.
///
/// Ids are 0-based: the first player to join is `PlayerId(0)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw player index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

/// Name and id pair used in outbound player lists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerTag {
    pub id: PlayerId,
    pub name: String,
}

impl PlayerTag {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_basics() {
        let p0 = PlayerId::new(0);
        let p1 = PlayerId::new(1);

        assert_eq!(p0.index(), 0);
        assert_eq!(p1.index(), 1);
        assert!(p0 < p1);
        assert_eq!(format!("{}", p0), "Player 0");
    }

    #[test]
    fn test_player_tag_serialization() {
        let tag = PlayerTag::new(PlayerId::new(2), "Val");
        let json = serde_json::to_string(&tag).unwrap();
        let deserialized: PlayerTag = serde_json::from_str(&json).unwrap();
        assert_eq!(tag, deserialized);
    }
}
