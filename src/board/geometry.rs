/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use arrayvec::ArrayVec;

use super::{Board, Color, Piece, PieceKind, Rank, Square, MAX_DESTINATIONS};

/// Squares a single piece can move to, ignoring whether its own king is left in check.
pub type Destinations = ArrayVec<Square, MAX_DESTINATIONS>;

/// `(file, rank)` steps of a knight.
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

/// `(file, rank)` steps of a king, which are also the eight ray directions of a queen.
const KING_OFFSETS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

const ORTHOGONAL_RAYS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

const DIAGONAL_RAYS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

/// Enumerates the pseudo-legal destinations of `piece` standing on `from`.
///
/// Castling is not generated here; it is a two-piece move composed by [`crate::Player`].
///
/// # Example
/// ```
/// # use arbiter::{Board, Piece, Square, pseudo_legal_destinations};
/// let board = Board::default();
/// let knight_moves = pseudo_legal_destinations(&board, Square::G1, Piece::WHITE_KNIGHT);
/// assert_eq!(knight_moves.len(), 2);
/// ```
pub fn pseudo_legal_destinations(board: &Board, from: Square, piece: Piece) -> Destinations {
    let color = piece.color();
    match piece.kind() {
        PieceKind::Pawn => pawn_destinations(board, from, color),
        PieceKind::Knight => step_destinations(board, from, color, &KNIGHT_OFFSETS),
        PieceKind::Bishop => ray_destinations(board, from, color, &DIAGONAL_RAYS),
        PieceKind::Rook => ray_destinations(board, from, color, &ORTHOGONAL_RAYS),
        PieceKind::Queen => ray_destinations(board, from, color, &KING_OFFSETS),
        PieceKind::King => step_destinations(board, from, color, &KING_OFFSETS),
    }
}

/// Forward pushes onto empty squares, plus diagonal captures of enemy pieces or the en passant target.
///
/// The en passant target only counts while an enemy pawn stands just behind it.
fn pawn_destinations(board: &Board, from: Square, color: Color) -> Destinations {
    let mut destinations = Destinations::new();
    let direction = color.negation_multiplier();

    if let Some(single) = from.forward_by(color, 1) {
        if board.piece_at(single).is_none() {
            destinations.push(single);

            if from.rank() == Rank::second(color) {
                if let Some(double) = from.forward_by(color, 2) {
                    if board.piece_at(double).is_none() {
                        destinations.push(double);
                    }
                }
            }
        }
    }

    for file_delta in [-1, 1] {
        let Some(target) = from.offset(file_delta, direction) else {
            continue;
        };

        let is_enemy = board
            .piece_at(target)
            .is_some_and(|occupant| occupant.color() != color);

        let victim = Piece::new(color.opponent(), PieceKind::Pawn);
        let is_en_passant = board.en_passant() == Some(target)
            && target.rank() == Rank::sixth(color)
            && board.piece_at(target).is_none()
            && target
                .backward_by(color, 1)
                .is_some_and(|behind| board.piece_at(behind) == Some(victim));

        if is_enemy || is_en_passant {
            destinations.push(target);
        }
    }

    destinations
}

/// Single-step pieces: each offset is tried once.
fn step_destinations(
    board: &Board,
    from: Square,
    color: Color,
    offsets: &[(i8, i8)],
) -> Destinations {
    offsets
        .iter()
        .filter_map(|&(df, dr)| from.offset(df, dr))
        .filter(|&to| board.color_at(to) != Some(color))
        .collect()
}

/// Sliding pieces: each ray runs until the board edge or the first occupied square.
fn ray_destinations(board: &Board, from: Square, color: Color, rays: &[(i8, i8)]) -> Destinations {
    let mut destinations = Destinations::new();

    for &(df, dr) in rays {
        let mut current = from;
        while let Some(next) = current.offset(df, dr) {
            match board.color_at(next) {
                None => destinations.push(next),
                Some(occupant) => {
                    if occupant != color {
                        destinations.push(next);
                    }
                    break;
                }
            }
            current = next;
        }
    }

    destinations
}
