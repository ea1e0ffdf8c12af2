/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use anyhow::{bail, Context, Result};
use tracing::{debug, trace};

use crate::{Board, Castle, Color, File, MoveRequest, Piece, PieceKind, Rank, Square};

/// Whether a player may still castle on either side.
///
/// Rights are only ever lost, never regained.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct CastlingRights {
    pub short: bool,
    pub long: bool,
}

impl CastlingRights {
    /// Both rights intact.
    pub const ALL: Self = Self {
        short: true,
        long: true,
    };

    /// No rights left.
    pub const NONE: Self = Self {
        short: false,
        long: false,
    };

    #[inline(always)]
    pub const fn allows(&self, side: Castle) -> bool {
        match side {
            Castle::Short => self.short,
            Castle::Long => self.long,
        }
    }

    #[inline(always)]
    pub fn revoke(&mut self, side: Castle) {
        match side {
            Castle::Short => self.short = false,
            Castle::Long => self.long = false,
        }
    }

    #[inline(always)]
    pub fn revoke_all(&mut self) {
        *self = Self::NONE;
    }
}

/// What happened when a [`Player`] tried to move.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct MoveOutcome {
    /// Whether anything moved. When `false`, the board is untouched.
    pub played: bool,

    /// Whether the move was a capture or a pawn move, and so cannot be undone by later moves.
    pub irreversible: bool,

    /// En passant target left behind by a pawn double step.
    pub en_passant: Option<Square>,
}

impl MoveOutcome {
    /// The outcome of a rejected move.
    pub const NOT_PLAYED: Self = Self {
        played: false,
        irreversible: false,
        en_passant: None,
    };
}

/// One side of a game: its [`Color`] and its [`CastlingRights`].
///
/// A player never owns the board it moves on. The [`crate::Game`] owns the one shared
/// [`Board`] and lends it to whichever player is moving.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Player {
    color: Color,
    castling_rights: CastlingRights,
}

impl Player {
    pub const fn new(color: Color, castling_rights: CastlingRights) -> Self {
        Self {
            color,
            castling_rights,
        }
    }

    #[inline(always)]
    pub const fn color(&self) -> Color {
        self.color
    }

    #[inline(always)]
    pub const fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    /// Resolves and plays `request` on `board`, reporting a rejected move as [`MoveOutcome::NOT_PLAYED`].
    ///
    /// # Example
    /// ```
    /// # use arbiter::{Board, CastlingRights, Color, MoveRequest, Player};
    /// let mut board = Board::default();
    /// let mut white = Player::new(Color::White, CastlingRights::ALL);
    ///
    /// let outcome = white.make_move(&mut board, &"e4".parse().unwrap());
    /// assert!(outcome.played);
    /// assert!(outcome.irreversible);
    /// assert_eq!(outcome.en_passant, Some("e3".parse().unwrap()));
    ///
    /// let outcome = white.make_move(&mut board, &"Ke3".parse().unwrap());
    /// assert!(!outcome.played);
    /// ```
    pub fn make_move(&mut self, board: &mut Board, request: &MoveRequest) -> MoveOutcome {
        match self.try_move(board, request) {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!(color = self.color.name(), %request, "move rejected: {err:#}");
                MoveOutcome::NOT_PLAYED
            }
        }
    }

    /// Resolves and plays `request` on `board`, explaining why when the move is illegal.
    ///
    /// On error, neither `board` nor this player's castling rights have changed.
    pub fn try_move(&mut self, board: &mut Board, request: &MoveRequest) -> Result<MoveOutcome> {
        if let Some(side) = request.castle {
            return self.try_castle(board, side);
        }

        let from = self.find_origin(board, request)?;
        let to = request.destination;
        let piece = Piece::new(self.color, request.kind);
        trace!(color = self.color.name(), %request, %from, "resolved origin");

        let after = board.simulate_move(from, to, request.promotion);
        if after.is_king_in_check(self.color) {
            bail!("{from}{to} would leave the {} king in check", self.color.name());
        }

        let captured = board.make_move(from, to, request.promotion);

        match piece.kind() {
            PieceKind::King => self.castling_rights.revoke_all(),
            PieceKind::Rook if from.file() == Castle::Short.rook_file() => {
                self.castling_rights.revoke(Castle::Short)
            }
            PieceKind::Rook if from.file() == Castle::Long.rook_file() => {
                self.castling_rights.revoke(Castle::Long)
            }
            _ => {}
        }

        Ok(MoveOutcome {
            played: true,
            irreversible: captured.is_some() || piece.is_pawn(),
            en_passant: board.en_passant(),
        })
    }

    /// Finds the square of the piece `request` refers to.
    ///
    /// Every piece of the requested kind that can reach the destination is a candidate.
    /// A single candidate is used as is. Among several, the first (scanning from rank 8 down,
    /// file `a` first) that matches both hints is chosen when both are given, or that matches
    /// *either* hint otherwise. Without hints, several candidates are ambiguous.
    ///
    /// Pawns only consider diagonal moves when the request is a capture, and straight moves otherwise.
    pub fn find_origin(&self, board: &Board, request: &MoveRequest) -> Result<Square> {
        let piece = Piece::new(self.color, request.kind);
        let to = request.destination;

        let candidates = Rank::iter()
            .rev()
            .flat_map(|rank| File::iter().map(move |file| Square::new(file, rank)))
            .filter(|&from| board.piece_at(from) == Some(piece))
            .filter(|&from| !piece.is_pawn() || (from.file() != to.file()) == request.capture)
            .filter(|&from| board.pseudo_legal_destinations(from).contains(&to))
            .collect::<Vec<_>>();

        match candidates.as_slice() {
            [] => bail!("no {} can move to {to}", piece.name()),
            [only] => Ok(*only),
            many => {
                let matches = |square: &&Square| match (request.file, request.rank) {
                    (Some(file), Some(rank)) => square.file() == file && square.rank() == rank,
                    (file, rank) => file == Some(square.file()) || rank == Some(square.rank()),
                };

                many.iter().find(matches).copied().with_context(|| {
                    format!(
                        "{} {}s can move to {to} and the request does not tell them apart",
                        many.len(),
                        piece.name()
                    )
                })
            }
        }
    }

    /// Castles on `side`, moving king and rook together.
    ///
    /// Requires the matching right, the king and rook on their home squares, nothing between them,
    /// and the king neither in check, crossing an attacked square, nor landing in check.
    fn try_castle(&mut self, board: &mut Board, side: Castle) -> Result<MoveOutcome> {
        if !self.castling_rights.allows(side) {
            bail!("{} has no right to castle {side}", self.color.name());
        }

        let home = Rank::first(self.color);
        let king_from = Square::new(File::E, home);
        let rook_from = Square::new(side.rook_file(), home);
        let (king_file, rook_file) = side.destination_files();
        let king_to = Square::new(king_file, home);
        let rook_to = Square::new(rook_file, home);

        if board.piece_at(king_from) != Some(Piece::new(self.color, PieceKind::King)) {
            bail!("{side} needs the king on {king_from}");
        }
        if board.piece_at(rook_from) != Some(Piece::new(self.color, PieceKind::Rook)) {
            bail!("{side} needs a rook on {rook_from}");
        }

        if let Some(blocker) = side
            .between_files()
            .iter()
            .map(|&file| Square::new(file, home))
            .find(|&square| board.piece_at(square).is_some())
        {
            bail!("{side} is blocked on {blocker}");
        }

        if board.is_king_in_check(self.color) {
            bail!("cannot castle out of check");
        }

        let crossing = Square::new(side.crossing_file(), home);
        let mut passing = board.clone();
        passing.move_piece(king_from, crossing);
        if passing.is_king_in_check(self.color) {
            bail!("{side} would move the king through an attacked square ({crossing})");
        }

        let mut after = board.clone();
        after.move_piece(king_from, king_to);
        after.move_piece(rook_from, rook_to);
        after.set_en_passant(None);
        if after.is_king_in_check(self.color) {
            bail!("{side} would leave the {} king in check", self.color.name());
        }

        *board = after;
        self.castling_rights.revoke_all();
        trace!(color = self.color.name(), %side, "castled");

        Ok(MoveOutcome {
            played: true,
            irreversible: false,
            en_passant: None,
        })
    }

    /// Drops any right whose rook no longer stands on its home corner.
    ///
    /// Called after the opponent moves, so a captured corner rook takes its right with it.
    pub fn revoke_rights_for_missing_rooks(&mut self, board: &Board) {
        let rook = Piece::new(self.color, PieceKind::Rook);

        for side in [Castle::Short, Castle::Long] {
            let corner = Square::new(side.rook_file(), Rank::first(self.color));
            if self.castling_rights.allows(side) && board.piece_at(corner) != Some(rook) {
                debug!(color = self.color.name(), %side, "castling right lost with the {corner} rook");
                self.castling_rights.revoke(side);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn players() -> (Player, Player) {
        (
            Player::new(Color::White, CastlingRights::ALL),
            Player::new(Color::Black, CastlingRights::ALL),
        )
    }

    fn req(san: &str) -> MoveRequest {
        MoveRequest::from_san(san).unwrap()
    }

    #[test]
    fn test_pawn_double_step_reports_en_passant() {
        let mut board = Board::default();
        let (mut white, mut black) = players();

        let outcome = white.make_move(&mut board, &req("e4"));
        assert_eq!(
            outcome,
            MoveOutcome {
                played: true,
                irreversible: true,
                en_passant: Some(Square::E3),
            }
        );

        let outcome = black.make_move(&mut board, &req("Nf6"));
        assert!(outcome.played);
        assert!(!outcome.irreversible);
        assert_eq!(outcome.en_passant, None);
        assert_eq!(board.en_passant(), None);
    }

    #[test]
    fn test_blocked_king_is_not_played() {
        let mut board = Board::default();
        let before = board.clone();
        let (mut white, _) = players();

        assert_eq!(white.make_move(&mut board, &req("Ke2")), MoveOutcome::NOT_PLAYED);
        assert_eq!(board, before);
        assert!(white.try_move(&mut board, &req("Ke2")).is_err());
    }

    #[test]
    fn test_pawn_capture_flag_selects_geometry() {
        let mut board = Board::from_fen("4k3/8/8/3p4/4P3/8/8/4K3").unwrap();
        let (mut white, _) = players();

        // Writing a capture as a push is rejected
        assert!(white.try_move(&mut board, &req("d5")).is_err());
        assert!(white.try_move(&mut board, &req("exd5")).unwrap().irreversible);
        assert_eq!(board.piece_at(Square::D5), Some(Piece::WHITE_PAWN));
    }

    #[test]
    fn test_self_check_is_rejected_without_side_effects() {
        // The e2 rook is pinned against the king
        let mut board = Board::from_fen("4r1k1/8/8/8/8/8/4R3/4K3").unwrap();
        let before = board.clone();
        let mut white = Player::new(Color::White, CastlingRights::ALL);

        assert!(!white.make_move(&mut board, &req("Ra2")).played);
        assert_eq!(board, before);
        assert_eq!(white.castling_rights(), CastlingRights::ALL);

        // Moving along the pin is fine
        assert!(white.make_move(&mut board, &req("Re4")).played);
    }

    #[test]
    fn test_disambiguation_by_file_and_rank() {
        // Knights on b1 and f1 can both reach d2
        let fen = "4k3/8/8/8/8/8/8/1N2KN2";
        let (mut white, _) = players();

        let mut board = Board::from_fen(fen).unwrap();
        assert!(white.try_move(&mut board, &req("Nd2")).is_err());

        let mut board = Board::from_fen(fen).unwrap();
        assert!(white.make_move(&mut board, &req("Nfd2")).played);
        assert_eq!(board.piece_at(Square::D2), Some(Piece::WHITE_KNIGHT));
        assert_eq!(board.piece_at(Square::F1), None);
        assert_eq!(board.piece_at(Square::B1), Some(Piece::WHITE_KNIGHT));
    }

    #[test]
    fn test_disambiguation_accepts_either_hint() {
        // Rooks on a1 and a5 can both reach a3; the rank hint names a1
        let fen = "4k3/8/8/R7/8/8/8/R3K3";
        let white = Player::new(Color::White, CastlingRights::NONE);
        let board = Board::from_fen(fen).unwrap();
        assert_eq!(white.find_origin(&board, &req("R1a3")).unwrap(), Square::A1);

        // A file hint shared by both candidates picks the first one scanned from rank 8
        let origin = white.find_origin(&board, &req("Raa3")).unwrap();
        assert_eq!(origin, Square::from_uci("a5").unwrap());

        // With both hints given, they must both match
        assert!(white.find_origin(&board, &req("Rb1a3")).is_err());
        assert_eq!(white.find_origin(&board, &req("Ra1a3")).unwrap(), Square::A1);

        // A hint matching no candidate at all
        assert!(white.find_origin(&board, &req("Rca3")).is_err());
    }

    #[test]
    fn test_king_and_rook_moves_revoke_rights() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R";
        let (mut white, mut black) = players();

        let mut board = Board::from_fen(fen).unwrap();
        assert!(white.make_move(&mut board, &req("Rb1")).played);
        assert_eq!(white.castling_rights(), CastlingRights { short: true, long: false });

        assert!(black.make_move(&mut board, &req("Rg8")).played);
        assert_eq!(black.castling_rights(), CastlingRights { short: false, long: true });

        assert!(white.make_move(&mut board, &req("Kd1")).played);
        assert_eq!(white.castling_rights(), CastlingRights::NONE);

        // Moving the king back home does not restore anything
        assert!(black.make_move(&mut board, &req("Rh8")).played);
        assert!(white.make_move(&mut board, &req("Ke1")).played);
        assert_eq!(white.castling_rights(), CastlingRights::NONE);
        assert_eq!(black.castling_rights(), CastlingRights { short: false, long: true });
    }

    #[test]
    fn test_castling_both_sides() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R";
        let (mut white, mut black) = players();
        let mut board = Board::from_fen(fen).unwrap();

        assert!(white.make_move(&mut board, &req("O-O")).played);
        assert_eq!(board.piece_at(Square::G1), Some(Piece::WHITE_KING));
        assert_eq!(board.piece_at(Square::F1), Some(Piece::WHITE_ROOK));
        assert_eq!(board.piece_at(Square::H1), None);
        assert_eq!(white.castling_rights(), CastlingRights::NONE);

        assert!(black.make_move(&mut board, &req("O-O-O")).played);
        assert_eq!(board.piece_at(Square::C8), Some(Piece::BLACK_KING));
        assert_eq!(board.piece_at(Square::D8), Some(Piece::BLACK_ROOK));
        assert_eq!(board.piece_at(Square::A8), None);

        // Rights are gone for good
        assert!(white.try_move(&mut board, &req("O-O")).is_err());
    }

    #[test]
    fn test_castling_requires_rights() {
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R").unwrap();
        let mut white = Player::new(Color::White, CastlingRights { short: false, long: true });

        assert_eq!(white.make_move(&mut board, &req("O-O")), MoveOutcome::NOT_PLAYED);
        assert!(white.make_move(&mut board, &req("O-O-O")).played);
    }

    #[test]
    fn test_castling_path_must_be_clear_and_safe() {
        let (mut white, _) = players();

        // Knight on g1 blocks the short side, b1 blocks the long side
        let mut board = Board::from_fen("4k3/8/8/8/8/8/8/RN2K1NR").unwrap();
        assert!(white.try_move(&mut board, &req("O-O")).is_err());
        assert!(white.try_move(&mut board, &req("O-O-O")).is_err());

        // Rook on f8 attacks f1, which the king must cross
        let mut board = Board::from_fen("4kr2/8/8/8/8/8/8/4K2R").unwrap();
        assert!(white.try_move(&mut board, &req("O-O")).is_err());

        // King in check on e1
        let mut board = Board::from_fen("4r1k1/8/8/8/8/8/8/R3K2R").unwrap();
        assert!(white.try_move(&mut board, &req("O-O")).is_err());
        assert!(white.try_move(&mut board, &req("O-O-O")).is_err());

        // Landing square attacked
        let mut board = Board::from_fen("6r1/8/8/8/8/8/8/4K2R").unwrap();
        assert!(white.try_move(&mut board, &req("O-O")).is_err());

        // The b1 square may be attacked for a long castle; only the king's path matters
        let mut board = Board::from_fen("1r2k3/8/8/8/8/8/8/R3K3").unwrap();
        assert!(white.try_move(&mut board, &req("O-O-O")).is_ok());

        // Rook missing from its corner
        let mut board = Board::from_fen("4k3/8/8/8/8/8/8/4K3").unwrap();
        assert!(white.try_move(&mut board, &req("O-O")).is_err());
    }

    #[test]
    fn test_en_passant_capture_through_player() {
        let mut board = Board::from_fen("4k3/3p4/8/4P3/8/8/8/4K3").unwrap();
        let (mut white, mut black) = players();

        let outcome = black.make_move(&mut board, &req("d5"));
        assert_eq!(outcome.en_passant, Some(Square::D6));

        let outcome = white.make_move(&mut board, &req("exd6"));
        assert!(outcome.played);
        assert!(outcome.irreversible);
        assert_eq!(board.piece_at(Square::D5), None);
        assert_eq!(board.piece_at(Square::D6), Some(Piece::WHITE_PAWN));
    }

    #[test]
    fn test_en_passant_expires_after_one_ply() {
        let mut board = Board::from_fen("4k3/3p4/8/4P3/8/8/8/4K3").unwrap();
        let (mut white, mut black) = players();

        assert!(black.make_move(&mut board, &req("d5")).played);
        assert_eq!(board.en_passant(), Some(Square::D6));
        assert!(white.make_move(&mut board, &req("Kd1")).played);
        assert!(black.make_move(&mut board, &req("Ke7")).played);
        assert_eq!(board.en_passant(), None);
        assert!(white.try_move(&mut board, &req("exd6")).is_err());
    }

    #[test]
    fn test_missing_corner_rook_revokes_right() {
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R").unwrap();
        let mut black = Player::new(Color::Black, CastlingRights::ALL);

        board.take(Square::H8);
        black.revoke_rights_for_missing_rooks(&board);
        assert_eq!(black.castling_rights(), CastlingRights { short: false, long: true });
    }
}
