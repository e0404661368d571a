//! Position evaluation

use crate::game::{Board, GameResult, Player};

/// Score of a decided game (effectively infinite)
pub const WIN_VALUE: f32 = 100000.0;

/// Material balance from `perspective`'s point of view
///
/// Positive favours `perspective` no matter whose turn it is, so a minimax
/// search keeps one fixed sign convention from root to leaves.
pub fn evaluate(board: &Board, perspective: Player) -> f32 {
    let own = board.color_power(perspective) as f32;
    let theirs = board.color_power(perspective.opponent()) as f32;
    own - theirs
}

/// Score for a finished game, or `None` while it is still being played
///
/// `depth` is the remaining search depth, so quicker wins score higher and
/// quicker losses lower.
pub fn evaluate_terminal(board: &Board, perspective: Player, depth: u32) -> Option<f32> {
    match board.result() {
        GameResult::Ongoing => None,
        GameResult::Draw => Some(0.0),
        result => {
            let bonus = depth as f32;
            if result.winner() == Some(perspective) {
                Some(WIN_VALUE + bonus)
            } else {
                Some(-WIN_VALUE - bonus)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Hex;
    use crate::game::Cell;

    fn board_with(cells: &[(u8, u8, Player, u8)]) -> Board {
        Board::from_cells(
            Player::Red,
            2,
            cells
                .iter()
                .map(|&(r, q, p, k)| (Hex::new(r, q), Cell::occupied(p, k))),
        )
        .unwrap()
    }

    #[test]
    fn test_evaluate_material() {
        let board = board_with(&[(0, 0, Player::Red, 3), (1, 1, Player::Red, 2), (4, 4, Player::Blue, 4)]);
        assert_eq!(evaluate(&board, Player::Red), 1.0);
        assert_eq!(evaluate(&board, Player::Blue), -1.0);
    }

    #[test]
    fn test_evaluate_symmetric() {
        let board = board_with(&[(0, 0, Player::Red, 5), (4, 4, Player::Blue, 2), (2, 6, Player::Blue, 1)]);
        let swapped = board_with(&[(0, 0, Player::Blue, 5), (4, 4, Player::Red, 2), (2, 6, Player::Red, 1)]);
        assert_eq!(evaluate(&board, Player::Red), -evaluate(&swapped, Player::Red));
        assert_eq!(evaluate(&board, Player::Red), evaluate(&swapped, Player::Blue));
    }

    #[test]
    fn test_evaluate_terminal() {
        let won = board_with(&[(0, 0, Player::Red, 3)]);
        assert_eq!(evaluate_terminal(&won, Player::Red, 2), Some(WIN_VALUE + 2.0));
        assert_eq!(evaluate_terminal(&won, Player::Blue, 2), Some(-WIN_VALUE - 2.0));

        let ongoing = board_with(&[(0, 0, Player::Red, 3), (4, 4, Player::Blue, 1)]);
        assert_eq!(evaluate_terminal(&ongoing, Player::Red, 2), None);
    }

    #[test]
    fn test_evaluate_independent_of_turn() {
        let red_to_move = board_with(&[(0, 0, Player::Red, 3), (4, 4, Player::Blue, 1)]);
        let blue_to_move = Board::from_snapshot(&crate::game::BoardSnapshot {
            turn: Player::Blue,
            ..red_to_move.snapshot()
        })
        .unwrap();
        assert_eq!(
            evaluate(&red_to_move, Player::Red),
            evaluate(&blue_to_move, Player::Red)
        );
    }
}
