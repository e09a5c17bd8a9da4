use std::fmt;

use super::board::Cell;

/// One of the two seats. Encoded on the board as 1 and 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub const BOTH: [Player; 2] = [Player::One, Player::Two];

    /// Get the other player. Computed, never stored.
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Board encoding: 1 or 2.
    pub fn position(self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }

    /// Zero-based index into per-player arrays.
    pub fn index(self) -> usize {
        self.position() as usize - 1
    }

    pub fn from_position(position: u8) -> Option<Player> {
        match position {
            1 => Some(Player::One),
            2 => Some(Player::Two),
            _ => None,
        }
    }

    /// Convert player to cell type
    pub fn to_cell(self) -> Cell {
        Cell::Occupied(self)
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opponent() {
        assert_eq!(Player::One.opponent(), Player::Two);
        assert_eq!(Player::Two.opponent(), Player::One);
    }

    #[test]
    fn test_position_roundtrip() {
        for player in Player::BOTH {
            assert_eq!(Player::from_position(player.position()), Some(player));
            assert_eq!(3 - player.position(), player.opponent().position());
        }
        assert_eq!(Player::from_position(0), None);
        assert_eq!(Player::from_position(3), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Player::One.to_string(), "player 1");
    }
}
