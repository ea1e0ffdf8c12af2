/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::Square;

/// FEN string for the starting position of chess.
pub const FEN_STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Maximum possible number of moves in a reachable chess position.
///
/// Found [here](<https://www.chessprogramming.org/Chess_Position#cite_note-4>).
/// Hand-made positions can exceed it, so it only sizes the initial allocation of [`LegalMoves`].
pub const MAX_NUM_MOVES: usize = 218;

/// Most squares a single piece can reach: a queen in the centre of an empty board.
pub const MAX_DESTINATIONS: usize = 27;

/// Every legal `(from, to)` pair available in a position.
pub type LegalMoves = Vec<(Square, Square)>;
