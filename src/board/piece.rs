/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{Index, IndexMut, Not},
    str::FromStr,
};

use anyhow::{bail, Result};

/// The side a piece, player or turn belongs to.
///
/// White moves first, so [`Color`] defaults to [`Color::White`].
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Color {
    #[default]
    White,
    Black,
}

impl Color {
    /// Number of color variants.
    pub const COUNT: usize = 2;

    /// Both colors, White first.
    #[inline(always)]
    pub const fn all() -> [Self; Self::COUNT] {
        [Self::White, Self::Black]
    }

    /// Direction of travel along the ranks for this [`Color`].
    ///
    /// White advances toward rank 8, Black toward rank 1.
    ///
    /// # Example
    /// ```
    /// # use arbiter::Color;
    /// assert_eq!(Color::White.negation_multiplier(), 1);
    /// assert_eq!(Color::Black.negation_multiplier(), -1);
    /// ```
    #[inline(always)]
    pub const fn negation_multiplier(&self) -> i8 {
        match self {
            Self::White => 1,
            Self::Black => -1,
        }
    }

    /// Returns the other side.
    ///
    /// # Example
    /// ```
    /// # use arbiter::Color;
    /// assert_eq!(Color::White.opponent(), Color::Black);
    /// assert_eq!(Color::Black.opponent(), Color::White);
    /// ```
    #[inline(always)]
    pub const fn opponent(&self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// `0` for White, `1` for Black. Useful for indexing into per-color arrays.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Parses the active color field of a FEN string.
    ///
    /// Only lowercase `w` and `b` are accepted.
    ///
    /// # Example
    /// ```
    /// # use arbiter::Color;
    /// assert_eq!(Color::from_uci('b').unwrap(), Color::Black);
    /// assert!(Color::from_uci('W').is_err());
    /// ```
    #[inline(always)]
    pub fn from_uci(color: char) -> Result<Self> {
        match color {
            'w' => Ok(Self::White),
            'b' => Ok(Self::Black),
            _ => bail!("Color must be either 'w' or 'b'. Found {color:?}"),
        }
    }

    /// Uppercase letters are White, lowercase letters are Black.
    #[inline(always)]
    pub const fn from_case(c: char) -> Self {
        if c.is_ascii_lowercase() {
            Self::Black
        } else {
            Self::White
        }
    }

    #[inline(always)]
    pub const fn to_uci(&self) -> char {
        match self {
            Self::White => 'w',
            Self::Black => 'b',
        }
    }

    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }
}

impl Not for Color {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self::Output {
        self.opponent()
    }
}

impl<T> Index<Color> for [T; Color::COUNT] {
    type Output = T;
    #[inline(always)]
    fn index(&self, index: Color) -> &Self::Output {
        &self[index.index()]
    }
}

impl<T> IndexMut<Color> for [T; Color::COUNT] {
    #[inline(always)]
    fn index_mut(&mut self, index: Color) -> &mut Self::Output {
        &mut self[index.index()]
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_uci(c),
            _ => bail!("Invalid str for Color: Must be 'w' or 'b'. Got {s:?}"),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The kind (or "role") of a chess piece, without a [`Color`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Parses a piece letter, ignoring case.
    ///
    /// # Example
    /// ```
    /// # use arbiter::PieceKind;
    /// assert_eq!(PieceKind::from_uci('N').unwrap(), PieceKind::Knight);
    /// assert_eq!(PieceKind::from_uci('n').unwrap(), PieceKind::Knight);
    /// assert!(PieceKind::from_uci('x').is_err());
    /// ```
    pub fn from_uci(kind: char) -> Result<Self> {
        match kind.to_ascii_lowercase() {
            'p' => Ok(Self::Pawn),
            'n' => Ok(Self::Knight),
            'b' => Ok(Self::Bishop),
            'r' => Ok(Self::Rook),
            'q' => Ok(Self::Queen),
            'k' => Ok(Self::King),
            _ => bail!("Invalid char for PieceKind: Must be one of [pnbrqk] (case-insensitive). Got {kind:?}"),
        }
    }

    /// Lowercase letter of this kind.
    #[inline(always)]
    pub const fn char(&self) -> char {
        match self {
            Self::Pawn => 'p',
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
            Self::King => 'k',
        }
    }

    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pawn => "pawn",
            Self::Knight => "knight",
            Self::Bishop => "bishop",
            Self::Rook => "rook",
            Self::Queen => "queen",
            Self::King => "king",
        }
    }

    /// Whether a pawn may promote to this kind.
    #[inline(always)]
    pub const fn is_promotion_target(&self) -> bool {
        matches!(self, Self::Knight | Self::Bishop | Self::Rook | Self::Queen)
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char().to_ascii_uppercase())
    }
}

impl fmt::Debug for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A chess piece: a [`PieceKind`] together with the [`Color`] that owns it.
///
/// Both parts are fixed at creation. A promoted pawn is a new [`Piece`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    color: Color,
    kind: PieceKind,
}

impl Piece {
    pub const WHITE_PAWN: Self = Self::new(Color::White, PieceKind::Pawn);
    pub const WHITE_KNIGHT: Self = Self::new(Color::White, PieceKind::Knight);
    pub const WHITE_BISHOP: Self = Self::new(Color::White, PieceKind::Bishop);
    pub const WHITE_ROOK: Self = Self::new(Color::White, PieceKind::Rook);
    pub const WHITE_QUEEN: Self = Self::new(Color::White, PieceKind::Queen);
    pub const WHITE_KING: Self = Self::new(Color::White, PieceKind::King);

    pub const BLACK_PAWN: Self = Self::new(Color::Black, PieceKind::Pawn);
    pub const BLACK_KNIGHT: Self = Self::new(Color::Black, PieceKind::Knight);
    pub const BLACK_BISHOP: Self = Self::new(Color::Black, PieceKind::Bishop);
    pub const BLACK_ROOK: Self = Self::new(Color::Black, PieceKind::Rook);
    pub const BLACK_QUEEN: Self = Self::new(Color::Black, PieceKind::Queen);
    pub const BLACK_KING: Self = Self::new(Color::Black, PieceKind::King);

    #[inline(always)]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    #[inline(always)]
    pub const fn color(&self) -> Color {
        self.color
    }

    #[inline(always)]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    #[inline(always)]
    pub const fn is_pawn(&self) -> bool {
        matches!(self.kind, PieceKind::Pawn)
    }

    /// Parses a FEN piece letter: uppercase is White, lowercase is Black.
    ///
    /// # Example
    /// ```
    /// # use arbiter::{Piece, Color, PieceKind};
    /// let black_knight = Piece::from_uci('n').unwrap();
    /// assert_eq!(black_knight.color(), Color::Black);
    /// assert_eq!(black_knight.kind(), PieceKind::Knight);
    /// ```
    #[inline(always)]
    pub fn from_uci(piece: char) -> Result<Self> {
        let kind = PieceKind::from_uci(piece)?;
        Ok(Self::new(Color::from_case(piece), kind))
    }

    /// The FEN letter of this piece.
    ///
    /// # Example
    /// ```
    /// # use arbiter::Piece;
    /// assert_eq!(Piece::WHITE_QUEEN.char(), 'Q');
    /// assert_eq!(Piece::BLACK_PAWN.char(), 'p');
    /// ```
    #[inline(always)]
    pub const fn char(&self) -> char {
        match self.color {
            Color::White => self.kind.char().to_ascii_uppercase(),
            Color::Black => self.kind.char(),
        }
    }

    /// Returns the piece this one becomes when promoted to `promotion`.
    #[inline(always)]
    pub const fn promoted(self, promotion: PieceKind) -> Self {
        Self::new(self.color, promotion)
    }

    /// Human-readable name, such as `"white queen"`.
    #[inline(always)]
    pub fn name(&self) -> String {
        format!("{} {}", self.color.name(), self.kind.name())
    }
}

impl TryFrom<char> for Piece {
    type Error = anyhow::Error;
    #[inline(always)]
    fn try_from(value: char) -> Result<Self, Self::Error> {
        Self::from_uci(value)
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl fmt::Debug for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" ({})", self.name(), self.char())
    }
}
