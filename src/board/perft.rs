/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{Board, Color, Square};

/// Counts the leaf nodes of the legal move tree rooted at `board`, with `color` to move, down to `depth` plies.
///
/// Uses the same simulate-and-discard legality test as move resolution.
/// Castling is not part of the tree, and every promotion counts once (as a queen).
///
/// This performs bulk counting, meaning that, at depth 1, it returns the number of available moves
/// rather than making them.
///
/// # Example
/// ```
/// # use arbiter::{perft, Board, Color};
/// let board = Board::default();
/// assert_eq!(perft(&board, Color::White, 1), 20);
/// assert_eq!(perft(&board, Color::White, 2), 400);
/// ```
pub fn perft(board: &Board, color: Color, depth: usize) -> u64 {
    match depth {
        0 => 1,
        1 => board.legal_moves(color).len() as u64,
        _ => board
            .legal_moves(color)
            .into_iter()
            .fold(0, |nodes, (from, to)| {
                nodes + perft(&board.simulate_move(from, to, None), color.opponent(), depth - 1)
            }),
    }
}

/// Like [`perft`], but reports the node count below each root move separately.
///
/// The returned list is in move generation order. Summing its counts gives `perft(board, color, depth)`
/// for any `depth >= 1`.
pub fn splitperft(board: &Board, color: Color, depth: usize) -> Vec<((Square, Square), u64)> {
    if depth == 0 {
        return Vec::new();
    }

    board
        .legal_moves(color)
        .into_iter()
        .map(|(from, to)| {
            let after = board.simulate_move(from, to, None);
            ((from, to), perft(&after, color.opponent(), depth - 1))
        })
        .collect()
}
