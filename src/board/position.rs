/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{bail, Context, Result};

use super::{
    pseudo_legal_destinations, Color, Destinations, File, LegalMoves, Piece, PieceKind, Rank,
    Square, FEN_STARTPOS, MAX_NUM_MOVES,
};

/// Why a side to move has no legal moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// The side to move is in check and cannot escape it.
    Checkmate,

    /// The side to move is not in check but has no legal move.
    Stalemate,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checkmate => write!(f, "checkmate"),
            Self::Stalemate => write!(f, "stalemate"),
        }
    }
}

/// An `8x8` grid of squares, each holding at most one [`Piece`].
///
/// Besides occupancy, the board remembers the en passant target left by the
/// previous move and whether it is currently displayed upside-down.
/// It has no notion of whose turn it is or of castling rights; see [`crate::Game`].
///
/// Two boards are equal when their pieces and en passant target match, whichever way up they are displayed.
#[derive(Clone)]
pub struct Board {
    mailbox: [Option<Piece>; Square::COUNT],

    /// Square a pawn skipped over on the last move, valid for one ply only.
    en_passant: Option<Square>,

    /// Display orientation. Has no effect on any rule.
    flipped: bool,
}

impl Board {
    /// Creates a new, empty [`Board`] containing no pieces.
    ///
    /// # Example
    /// ```
    /// # use arbiter::Board;
    /// let board = Board::new();
    /// assert_eq!(board.to_fen(), "8/8/8/8/8/8/8/8");
    /// ```
    #[inline(always)]
    pub const fn new() -> Self {
        Self {
            mailbox: [None; Square::COUNT],
            en_passant: None,
            flipped: false,
        }
    }

    /// Constructs a [`Board`] from the piece placement field of a FEN string.
    ///
    /// Any fields after the placements are ignored.
    /// Every rank must account for exactly eight squares.
    ///
    /// # Example
    /// ```
    /// # use arbiter::{Board, Piece, Square};
    /// let board = Board::from_fen("4k3/8/8/8/8/8/8/4K3").unwrap();
    /// assert_eq!(board.piece_at(Square::E1), Some(Piece::WHITE_KING));
    /// assert!(Board::from_fen("4k3/8/8/8/8/8/8/4K4").is_err());
    /// ```
    pub fn from_fen(fen: &str) -> Result<Self> {
        let placements = fen
            .split_ascii_whitespace()
            .next()
            .context("FEN string must contain piece placements")?;

        let rows = placements.split('/').collect::<Vec<_>>();
        if rows.len() != Rank::COUNT {
            bail!(
                "FEN must have piece placements for all 8 ranks. Got {} in {placements:?}",
                rows.len()
            );
        }

        let mut board = Self::new();

        // Ranks are listed from 8 down to 1
        for (row, rank) in rows.into_iter().zip(Rank::iter().rev()) {
            let mut file = 0u8;

            for c in row.chars() {
                if let Some(empty) = c.to_digit(10) {
                    if !(1..=8).contains(&empty) {
                        bail!("FEN empty-square counts must be between [1, 8]. Got {c:?}");
                    }
                    file += empty as u8;
                } else {
                    let piece = Piece::from_uci(c)
                        .with_context(|| format!("Invalid char in FEN placements {row:?}"))?;

                    if file > File::MAX {
                        bail!("FEN rank {row:?} describes more than 8 squares");
                    }
                    board.place(piece, Square::new(File(file), rank));
                    file += 1;
                }
            }

            if file as usize != File::COUNT {
                bail!("FEN rank {row:?} must describe exactly 8 squares. Got {file}");
            }
        }

        Ok(board)
    }

    /// Constructs a [`Board`] from a decoded grid of rows, rank 8 first and file `a` first within each row.
    ///
    /// # Example
    /// ```
    /// # use arbiter::{Board, Piece, Square};
    /// let mut rows = [[None; 8]; 8];
    /// rows[7][4] = Some(Piece::WHITE_KING);
    /// rows[0][4] = Some(Piece::BLACK_KING);
    /// let board = Board::from_rows(rows);
    /// assert_eq!(board.piece_at(Square::E1), Some(Piece::WHITE_KING));
    /// assert_eq!(board.piece_at(Square::E8), Some(Piece::BLACK_KING));
    /// ```
    pub fn from_rows(rows: [[Option<Piece>; File::COUNT]; Rank::COUNT]) -> Self {
        let mut board = Self::new();

        for (row, rank) in rows.iter().zip(Rank::iter().rev()) {
            for (occupant, file) in row.iter().zip(File::iter()) {
                if let Some(piece) = occupant {
                    board.place(*piece, Square::new(file, rank));
                }
            }
        }

        board
    }

    /// Returns the grid as it would be displayed: rank 8 first when upright,
    /// rotated 180 degrees when [flipped](Board::flip).
    pub fn rows(&self) -> [[Option<Piece>; File::COUNT]; Rank::COUNT] {
        let mut rows = [[None; File::COUNT]; Rank::COUNT];

        for (i, rank) in self.display_ranks().enumerate() {
            for (j, file) in self.display_files().enumerate() {
                rows[i][j] = self.piece_at(Square::new(file, rank));
            }
        }

        rows
    }

    /// Generates the piece placement field of a FEN string for this [`Board`].
    pub fn to_fen(&self) -> String {
        let mut placements = Vec::with_capacity(Rank::COUNT);

        for rank in Rank::iter().rev() {
            let mut row = String::with_capacity(File::COUNT);
            let mut empty_spaces = 0;

            for file in File::iter() {
                if let Some(piece) = self.piece_at(Square::new(file, rank)) {
                    if empty_spaces != 0 {
                        row += &empty_spaces.to_string();
                        empty_spaces = 0;
                    }
                    row.push(piece.char());
                } else {
                    empty_spaces += 1;
                }
            }

            if empty_spaces != 0 {
                row += &empty_spaces.to_string();
            }
            placements.push(row);
        }

        placements.join("/")
    }

    /// Fetches the [`Piece`] on `square`, if there is one.
    #[inline(always)]
    pub const fn piece_at(&self, square: Square) -> Option<Piece> {
        self.mailbox[square.index()]
    }

    /// Fetches the [`Color`] of the piece on `square`, if there is one.
    #[inline(always)]
    pub fn color_at(&self, square: Square) -> Option<Color> {
        self.piece_at(square).map(|piece| piece.color())
    }

    /// Places `piece` on `square`, replacing any previous occupant.
    #[inline(always)]
    pub fn place(&mut self, piece: Piece, square: Square) {
        self.mailbox[square] = Some(piece);
    }

    /// Removes and returns the occupant of `square`.
    #[inline(always)]
    pub fn take(&mut self, square: Square) -> Option<Piece> {
        self.mailbox[square].take()
    }

    /// Iterates over every occupied square and its [`Piece`], starting at `a1`.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::iter().filter_map(|square| self.piece_at(square).map(|piece| (square, piece)))
    }

    /// Number of pieces of the given [`Color`] and [`PieceKind`] on the board.
    ///
    /// # Example
    /// ```
    /// # use arbiter::{Board, Color, PieceKind};
    /// let board = Board::default();
    /// assert_eq!(board.count(Color::White, PieceKind::Pawn), 8);
    /// assert_eq!(board.count(Color::Black, PieceKind::Queen), 1);
    /// ```
    pub fn count(&self, color: Color, kind: PieceKind) -> usize {
        let target = Piece::new(color, kind);
        self.pieces().filter(|(_, piece)| *piece == target).count()
    }

    /// Location of `color`'s king, if it has one.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        let king = Piece::new(color, PieceKind::King);
        Square::iter().find(|&square| self.piece_at(square) == Some(king))
    }

    /// The square a pawn skipped over on the previous move, if any.
    #[inline(always)]
    pub const fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline(always)]
    pub fn set_en_passant(&mut self, target: Option<Square>) {
        self.en_passant = target;
    }

    /// Relocates the occupant of `from` onto `to`, overwriting whatever stood there.
    ///
    /// No rule of any kind is checked, and the en passant target is left untouched.
    /// Returns the overwritten piece.
    pub fn move_piece(&mut self, from: Square, to: Square) -> Option<Piece> {
        let piece = self.take(from)?;
        let captured = self.take(to);
        self.place(piece, to);
        captured
    }

    /// Executes a move of the piece on `from` to `to` without checking its legality.
    ///
    /// Pawn rules are applied on the way:
    /// * moving onto the en passant target diagonally removes the enemy pawn that skipped over it,
    /// * reaching the last rank promotes to `promotion` (a queen if `None`),
    /// * a double step sets a fresh en passant target; every other move clears it.
    ///
    /// Returns the captured piece, if any.
    pub fn make_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Option<Piece> {
        let mut piece = self.take(from)?;
        let color = piece.color();
        let ep_target = self.en_passant.take();

        let mut captured = self.take(to);

        if piece.is_pawn() {
            if captured.is_none() && Some(to) == ep_target && from.file() != to.file() {
                let victim = Piece::new(color.opponent(), PieceKind::Pawn);
                if let Some(behind) = to
                    .backward_by(color, 1)
                    .filter(|&square| self.piece_at(square) == Some(victim))
                {
                    captured = self.take(behind);
                }
            }

            if from.distance_ranks(to) == 2 {
                self.en_passant = from.forward_by(color, 1);
            }

            if to.rank() == Rank::eighth(color) {
                piece = piece.promoted(promotion.unwrap_or(PieceKind::Queen));
            }
        }

        self.place(piece, to);
        captured
    }

    /// Returns a copy of this board with the move applied, leaving `self` untouched.
    ///
    /// # Example
    /// ```
    /// # use arbiter::{Board, Square};
    /// let board = Board::default();
    /// let after = board.simulate_move(Square::E2, Square::E4, None);
    /// assert!(board.piece_at(Square::E2).is_some());
    /// assert!(after.piece_at(Square::E2).is_none());
    /// ```
    pub fn simulate_move(&self, from: Square, to: Square, promotion: Option<PieceKind>) -> Self {
        let mut copy = self.clone();
        copy.make_move(from, to, promotion);
        copy
    }

    /// Whether any piece of `color`'s opponent can reach `color`'s king.
    ///
    /// A board without a king of `color` is never in check.
    pub fn is_king_in_check(&self, color: Color) -> bool {
        let Some(king) = self.king_square(color) else {
            return false;
        };

        self.pieces()
            .filter(|(_, piece)| piece.color() != color)
            .any(|(square, piece)| pseudo_legal_destinations(self, square, piece).contains(&king))
    }

    /// Pseudo-legal destinations of the piece on `from`. Empty if `from` is unoccupied.
    pub fn pseudo_legal_destinations(&self, from: Square) -> Destinations {
        self.piece_at(from)
            .map(|piece| pseudo_legal_destinations(self, from, piece))
            .unwrap_or_default()
    }

    /// Destinations of the piece on `from` that do not leave its own king in check.
    ///
    /// # Example
    /// ```
    /// # use arbiter::{Board, Square};
    /// let board = Board::default();
    /// assert_eq!(board.legal_destinations(Square::E2).len(), 2);
    /// assert!(board.legal_destinations(Square::E4).is_empty());
    /// ```
    pub fn legal_destinations(&self, from: Square) -> Destinations {
        let Some(piece) = self.piece_at(from) else {
            return Destinations::new();
        };

        pseudo_legal_destinations(self, from, piece)
            .into_iter()
            .filter(|&to| {
                !self
                    .simulate_move(from, to, None)
                    .is_king_in_check(piece.color())
            })
            .collect()
    }

    /// Every `(from, to)` pair `color` could legally play, castling excluded.
    pub fn legal_moves(&self, color: Color) -> LegalMoves {
        let mut moves = LegalMoves::with_capacity(MAX_NUM_MOVES);

        for (from, piece) in self.pieces() {
            if piece.color() != color {
                continue;
            }

            for to in self.legal_destinations(from) {
                moves.push((from, to));
            }
        }

        moves
    }

    /// Whether `color` has at least one legal move.
    pub fn has_legal_move(&self, color: Color) -> bool {
        self.pieces()
            .filter(|(_, piece)| piece.color() == color)
            .any(|(from, _)| !self.legal_destinations(from).is_empty())
    }

    /// Determines whether `color`, as the side to move, can continue the game.
    ///
    /// If not, the reason is [`Termination::Checkmate`] when its king is attacked
    /// and [`Termination::Stalemate`] otherwise.
    ///
    /// # Example
    /// ```
    /// # use arbiter::{Board, Color, Termination};
    /// let board = Board::from_fen("8/8/8/8/8/8/2k5/Kq6").unwrap();
    /// assert_eq!(board.can_play_continue(Color::White), (false, Some(Termination::Checkmate)));
    /// assert_eq!(board.can_play_continue(Color::Black), (true, None));
    /// ```
    pub fn can_play_continue(&self, color: Color) -> (bool, Option<Termination>) {
        match self.termination(color) {
            Some(reason) => (false, Some(reason)),
            None => (true, None),
        }
    }

    /// The terminal state `color` is in as the side to move, if any.
    pub fn termination(&self, color: Color) -> Option<Termination> {
        if self.has_legal_move(color) {
            None
        } else if self.is_king_in_check(color) {
            Some(Termination::Checkmate)
        } else {
            Some(Termination::Stalemate)
        }
    }

    /// Rotates the displayed board by 180 degrees. Applying it twice restores the original view.
    #[inline(always)]
    pub fn flip(&mut self) {
        self.flipped = !self.flipped;
    }

    /// Ranks in top-to-bottom display order.
    fn display_ranks(&self) -> Box<dyn Iterator<Item = Rank>> {
        if self.flipped {
            Box::new(Rank::iter())
        } else {
            Box::new(Rank::iter().rev())
        }
    }

    /// Files in left-to-right display order.
    fn display_files(&self) -> Box<dyn Iterator<Item = File>> {
        if self.flipped {
            Box::new(File::iter().rev())
        } else {
            Box::new(File::iter())
        }
    }
}

impl Default for Board {
    /// The standard starting position.
    #[inline(always)]
    fn default() -> Self {
        let mut board = Self::new();
        let back_rank = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        for color in Color::all() {
            for (file, kind) in File::iter().zip(back_rank) {
                board.place(Piece::new(color, kind), Square::new(file, Rank::first(color)));
                board.place(
                    Piece::new(color, PieceKind::Pawn),
                    Square::new(file, Rank::second(color)),
                );
            }
        }

        debug_assert_eq!(board.to_fen(), FEN_STARTPOS.split(' ').next().unwrap_or_default());
        board
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.mailbox == other.mailbox && self.en_passant == other.en_passant
    }
}

impl Eq for Board {}

impl FromStr for Board {
    type Err = anyhow::Error;
    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut board = String::with_capacity(198);

        for rank in self.display_ranks() {
            board += &format!("{rank}| ");

            for file in self.display_files() {
                let occupant = match self.piece_at(Square::new(file, rank)) {
                    Some(piece) => piece.char(),
                    None => '.',
                };
                board.push(occupant);
                board.push(' ');
            }

            board += "\n";
        }

        board += " +";
        for _ in File::iter() {
            board += "--";
        }
        board += "\n   ";
        for file in self.display_files() {
            board += &format!("{file} ");
        }

        write!(f, "{board}")
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ep = self
            .en_passant
            .map(|square| square.to_string())
            .unwrap_or_else(|| String::from("-"));
        write!(f, "{} (ep: {ep})\n{self}", self.to_fen())
    }
}
