use super::board::Board;
use super::player::Player;
use super::win::check_win_at;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameResult {
    InProgress,
    Win(Player),
    Draw,
}

impl GameResult {
    /// Result after `player` dropped a piece that landed on `(row, col)`.
    pub fn after_move(board: &Board, row: usize, col: usize, player: Player) -> GameResult {
        if check_win_at(board, row, col, player) {
            GameResult::Win(player)
        } else if board.is_full() {
            GameResult::Draw
        } else {
            GameResult::InProgress
        }
    }

    pub fn is_terminal(self) -> bool {
        self != GameResult::InProgress
    }

    pub fn winner(self) -> Option<Player> {
        match self {
            GameResult::Win(player) => Some(player),
            _ => None,
        }
    }

    /// Host encoding: winner's position, or 0 for a draw or an open game.
    pub fn winner_code(self) -> u8 {
        self.winner().map_or(0, Player::position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_progress() {
        let mut board = Board::standard();
        let row = board.apply(3, Player::One).unwrap();
        let result = GameResult::after_move(&board, row, 3, Player::One);
        assert_eq!(result, GameResult::InProgress);
        assert!(!result.is_terminal());
        assert_eq!(result.winner_code(), 0);
    }

    #[test]
    fn test_win_detection() {
        let mut board = Board::from_moves(6, 7, &[0, 0, 1, 1, 2, 2]).unwrap();
        let row = board.apply(3, Player::One).unwrap();
        let result = GameResult::after_move(&board, row, 3, Player::One);
        assert_eq!(result, GameResult::Win(Player::One));
        assert_eq!(result.winner_code(), 1);
    }

    #[test]
    fn test_draw_when_full_without_line() {
        let mut board = Board::from_moves(2, 2, &[0, 1, 1]).unwrap();
        let row = board.apply(0, Player::Two).unwrap();
        let result = GameResult::after_move(&board, row, 0, Player::Two);
        assert_eq!(result, GameResult::Draw);
        assert!(result.is_terminal());
        assert_eq!(result.winner(), None);
    }
}
