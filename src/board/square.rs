/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{Index, IndexMut},
    str::FromStr,
};

use anyhow::{bail, Context, Result};

use super::Color;

/// Represents a single square on an `8x8` chess board.
///
/// Squares use [Least Significant File Mapping](https://www.chessprogramming.org/Square_Mapping_Considerations#Deduction_on_Files_and_Ranks),
/// so `square = file + rank * 8`:
/// ```text
/// 8| 56 57 58 59 60 61 62 63
/// 7| 48 49 50 51 52 53 54 55
/// 6| 40 41 42 43 44 45 46 47
/// 5| 32 33 34 35 36 37 38 39
/// 4| 24 25 26 27 28 29 30 31
/// 3| 16 17 18 19 20 21 22 23
/// 2|  8  9 10 11 12 13 14 15
/// 1|  0  1  2  3  4  5  6  7
///  +------------------------
///    a  b  c  d  e  f  g  h
/// ```
///
/// White pieces start on the low ranks and advance toward rank 8.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct Square(pub(crate) u8);

impl Square {
    pub const A1: Self = Self::new(File::A, Rank::ONE);
    pub const B1: Self = Self::new(File::B, Rank::ONE);
    pub const C1: Self = Self::new(File::C, Rank::ONE);
    pub const D1: Self = Self::new(File::D, Rank::ONE);
    pub const E1: Self = Self::new(File::E, Rank::ONE);
    pub const F1: Self = Self::new(File::F, Rank::ONE);
    pub const G1: Self = Self::new(File::G, Rank::ONE);
    pub const H1: Self = Self::new(File::H, Rank::ONE);

    pub const A2: Self = Self::new(File::A, Rank::TWO);
    pub const D2: Self = Self::new(File::D, Rank::TWO);
    pub const E2: Self = Self::new(File::E, Rank::TWO);
    pub const F2: Self = Self::new(File::F, Rank::TWO);

    pub const C3: Self = Self::new(File::C, Rank::THREE);
    pub const D3: Self = Self::new(File::D, Rank::THREE);
    pub const E3: Self = Self::new(File::E, Rank::THREE);
    pub const F3: Self = Self::new(File::F, Rank::THREE);

    pub const C4: Self = Self::new(File::C, Rank::FOUR);
    pub const D4: Self = Self::new(File::D, Rank::FOUR);
    pub const E4: Self = Self::new(File::E, Rank::FOUR);

    pub const D5: Self = Self::new(File::D, Rank::FIVE);
    pub const E5: Self = Self::new(File::E, Rank::FIVE);
    pub const F5: Self = Self::new(File::F, Rank::FIVE);

    pub const D6: Self = Self::new(File::D, Rank::SIX);
    pub const E6: Self = Self::new(File::E, Rank::SIX);
    pub const F6: Self = Self::new(File::F, Rank::SIX);

    pub const E7: Self = Self::new(File::E, Rank::SEVEN);
    pub const F7: Self = Self::new(File::F, Rank::SEVEN);

    pub const A8: Self = Self::new(File::A, Rank::EIGHT);
    pub const C8: Self = Self::new(File::C, Rank::EIGHT);
    pub const D8: Self = Self::new(File::D, Rank::EIGHT);
    pub const E8: Self = Self::new(File::E, Rank::EIGHT);
    pub const F8: Self = Self::new(File::F, Rank::EIGHT);
    pub const G8: Self = Self::new(File::G, Rank::EIGHT);
    pub const H8: Self = Self::new(File::H, Rank::EIGHT);

    pub const MIN: u8 = 0;
    pub const MAX: u8 = 63;
    pub const COUNT: usize = 64;

    const FILE_MASK: u8 = 0b0000_0111;

    /// Returns an iterator over all available squares, starting at `a1`.
    ///
    /// # Example
    /// ```
    /// # use arbiter::Square;
    /// let mut iter = Square::iter();
    /// assert_eq!(iter.len(), 64);
    /// assert_eq!(iter.next().unwrap(), Square::A1);
    /// assert_eq!(iter.last().unwrap(), Square::H8);
    /// ```
    #[inline(always)]
    pub fn iter() -> impl ExactSizeIterator<Item = Self> + DoubleEndedIterator<Item = Self> {
        (Self::MIN..=Self::MAX).map(Self)
    }

    /// Creates a new [`Square`] from the provided [`File`] and [`Rank`].
    ///
    /// # Example
    /// ```
    /// # use arbiter::{Square, File, Rank};
    /// let c4 = Square::new(File::C, Rank::FOUR);
    /// assert_eq!(c4, Square::C4);
    /// ```
    #[inline(always)]
    pub const fn new(file: File, rank: Rank) -> Self {
        Self(file.0 ^ rank.0 << 3)
    }

    /// Fetches the [`File`] of this [`Square`].
    #[inline(always)]
    pub const fn file(&self) -> File {
        File(self.0 & Self::FILE_MASK)
    }

    /// Fetches the [`Rank`] of this [`Square`].
    #[inline(always)]
    pub const fn rank(&self) -> Rank {
        Rank(self.0 >> 3)
    }

    /// Fetches the inner index value of the [`Square`], casted to a [`usize`].
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Returns the number of ranks away `self` is from `other`.
    ///
    /// # Example
    /// ```
    /// # use arbiter::Square;
    /// assert_eq!(Square::E2.distance_ranks(Square::E4), 2);
    /// ```
    #[inline(always)]
    pub const fn distance_ranks(&self, other: Self) -> u8 {
        self.rank().0.abs_diff(other.rank().0)
    }

    /// Creates a [`Square`] from a string in coordinate notation, such as `"e4"`.
    ///
    /// # Example
    /// ```
    /// # use arbiter::Square;
    /// assert_eq!(Square::from_uci("c4").unwrap(), Square::C4);
    /// assert!(Square::from_uci("z0").is_err());
    /// ```
    pub fn from_uci(square: &str) -> Result<Self> {
        let mut chars = square.chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            bail!("Invalid Square string: String must contain exactly 2 characters. Got {square:?}")
        };

        Ok(Self::new(File::from_char(file)?, Rank::from_char(rank)?))
    }

    /// Converts this [`Square`] to a string in coordinate notation.
    #[inline(always)]
    pub fn to_uci(self) -> String {
        format!("{}{}", self.file(), self.rank())
    }

    /// Attempt to offset this [`Square`] by the file and rank offsets.
    ///
    /// Offsets leading off the board yield `None`.
    ///
    /// # Example
    /// ```
    /// # use arbiter::Square;
    /// assert_eq!(Square::C4.offset(1, 1), Some(Square::D5));
    /// assert_eq!(Square::A1.offset(-1, -1), None);
    /// ```
    #[inline(always)]
    pub const fn offset(&self, file_delta: i8, rank_delta: i8) -> Option<Self> {
        let Some(file) = self.file().offset(file_delta) else {
            return None;
        };

        let Some(rank) = self.rank().offset(rank_delta) else {
            return None;
        };

        Some(Self::new(file, rank))
    }

    /// Moves this [`Square`] `n` ranks toward the far side of the board, as seen by `color`.
    ///
    /// # Example
    /// ```
    /// # use arbiter::{Square, Color};
    /// assert_eq!(Square::E2.forward_by(Color::White, 2), Some(Square::E4));
    /// assert_eq!(Square::E7.forward_by(Color::Black, 1), Some(Square::E6));
    /// ```
    #[inline(always)]
    pub const fn forward_by(&self, color: Color, n: u8) -> Option<Self> {
        self.offset(0, n as i8 * color.negation_multiplier())
    }

    /// Moves this [`Square`] `n` ranks back toward `color`'s own side of the board.
    #[inline(always)]
    pub const fn backward_by(&self, color: Color, n: u8) -> Option<Self> {
        self.offset(0, n as i8 * color.opponent().negation_multiplier())
    }
}

impl FromStr for Square {
    type Err = anyhow::Error;
    /// Wrapper for [`Square::from_uci`].
    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_uci(s)
    }
}

impl TryFrom<&str> for Square {
    type Error = anyhow::Error;
    #[inline(always)]
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_uci(value)
    }
}

impl<T> Index<Square> for [T; Square::COUNT] {
    type Output = T;
    /// A [`Square`] can be used to index into an array of 64 elements.
    #[inline(always)]
    fn index(&self, index: Square) -> &Self::Output {
        &self[index.index()]
    }
}

impl<T> IndexMut<Square> for [T; Square::COUNT] {
    #[inline(always)]
    fn index_mut(&mut self, index: Square) -> &mut Self::Output {
        &mut self[index.index()]
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_uci().fmt(f)
    }
}

impl fmt::Debug for Square {
    /// Displays the coordinate along with the internal index.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.to_uci(), self.0)
    }
}

/// Represents one of eight ranks on a chess board.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Rank(pub(crate) u8);

impl Rank {
    pub const ONE: Self = Self(0);
    pub const TWO: Self = Self(1);
    pub const THREE: Self = Self(2);
    pub const FOUR: Self = Self(3);
    pub const FIVE: Self = Self(4);
    pub const SIX: Self = Self(5);
    pub const SEVEN: Self = Self(6);
    pub const EIGHT: Self = Self(7);

    pub const MIN: u8 = 0;
    pub const MAX: u8 = 7;
    pub const COUNT: usize = 8;

    /// Returns an iterator over all ranks, from rank 1 to rank 8.
    #[inline(always)]
    pub fn iter() -> impl ExactSizeIterator<Item = Self> + DoubleEndedIterator<Item = Self> {
        (Self::MIN..=Self::MAX).map(Self)
    }

    /// Construct a new [`Rank`] from the provided value.
    #[inline(always)]
    pub fn new(rank: u8) -> Result<Self> {
        if rank > Self::MAX {
            bail!(
                "Invalid int for Rank: Must be between [{}, {}]. Got {rank}",
                Self::MIN,
                Self::MAX
            );
        }

        Ok(Self(rank))
    }

    /// First rank relative to `color`.
    #[inline(always)]
    pub const fn first(color: Color) -> Self {
        [Self::ONE, Self::EIGHT][color.index()]
    }

    /// Home rank of `color`'s pawns.
    #[inline(always)]
    pub const fn second(color: Color) -> Self {
        [Self::TWO, Self::SEVEN][color.index()]
    }

    /// Rank a pawn of `color` lands on after capturing en passant.
    #[inline(always)]
    pub const fn sixth(color: Color) -> Self {
        [Self::SIX, Self::THREE][color.index()]
    }

    #[inline(always)]
    pub const fn eighth(color: Color) -> Self {
        [Self::EIGHT, Self::ONE][color.index()]
    }

    #[inline(always)]
    pub fn from_char(rank: char) -> Result<Self> {
        let rank_int = rank
            .to_digit(10)
            .and_then(|r| r.checked_sub(1))
            .context(format!(
                "Invalid char for Rank: Must be between [1, 8]. Got {rank}"
            ))?;

        Self::new(rank_int as u8)
    }

    #[inline(always)]
    pub const fn char(&self) -> char {
        (self.0 + b'1') as char
    }

    /// Attempt to offset this [`Rank`] by the provided `delta`.
    ///
    /// If `self + delta` would leave the board, `None` is returned.
    #[inline(always)]
    pub const fn offset(self, delta: i8) -> Option<Self> {
        match self.0.checked_add_signed(delta) {
            Some(bits) if bits <= Self::MAX => Some(Self(bits)),
            _ => None,
        }
    }
}

impl TryFrom<char> for Rank {
    type Error = anyhow::Error;
    #[inline(always)]
    fn try_from(value: char) -> Result<Self, Self::Error> {
        Self::from_char(value)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.char().fmt(f)
    }
}

impl fmt::Debug for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.char(), self.0)
    }
}

/// Represents one of eight files on a chess board.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct File(pub(crate) u8);

impl File {
    pub const A: Self = Self(0);
    pub const B: Self = Self(1);
    pub const C: Self = Self(2);
    pub const D: Self = Self(3);
    pub const E: Self = Self(4);
    pub const F: Self = Self(5);
    pub const G: Self = Self(6);
    pub const H: Self = Self(7);

    pub const MIN: u8 = 0;
    pub const MAX: u8 = 7;
    pub const COUNT: usize = 8;

    /// Returns an iterator over all files, from `a` to `h`.
    #[inline(always)]
    pub fn iter() -> impl ExactSizeIterator<Item = Self> + DoubleEndedIterator<Item = Self> {
        (Self::MIN..=Self::MAX).map(Self)
    }

    #[inline(always)]
    pub fn new(file: u8) -> Result<Self> {
        if file > Self::MAX {
            bail!(
                "Invalid int for File: Must be between [{}, {}]. Got {file}",
                Self::MIN,
                Self::MAX
            );
        }
        Ok(Self(file))
    }

    /// Parses a file letter. Only lowercase `a` through `h` are accepted,
    /// since uppercase letters name pieces in move notation.
    #[inline(always)]
    pub fn from_char(file: char) -> Result<Self> {
        if !('a'..='h').contains(&file) {
            bail!("Invalid char for File: Must be between [a, h]. Got {file}");
        }

        Self::new(file as u8 - b'a')
    }

    #[inline(always)]
    pub const fn char(&self) -> char {
        (self.0 + b'a') as char
    }

    /// Attempt to offset this [`File`] by the provided `delta`.
    ///
    /// If `self + delta` would leave the board, `None` is returned.
    #[inline(always)]
    pub const fn offset(self, delta: i8) -> Option<Self> {
        match self.0.checked_add_signed(delta) {
            Some(bits) if bits <= Self::MAX => Some(Self(bits)),
            _ => None,
        }
    }
}

impl TryFrom<char> for File {
    type Error = anyhow::Error;
    #[inline(always)]
    fn try_from(value: char) -> Result<Self, Self::Error> {
        Self::from_char(value)
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.char().fmt(f)
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.char(), self.0)
    }
}
