/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{anyhow, bail, Context, Result};

use super::{File, PieceKind, Rank, Square};

/// The two ways a king and rook can castle.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Castle {
    /// King toward the `h` file rook. Written `O-O`.
    Short,

    /// King toward the `a` file rook. Written `O-O-O`.
    Long,
}

impl Castle {
    /// File the rook starts on.
    #[inline(always)]
    pub const fn rook_file(&self) -> File {
        match self {
            Self::Short => File::H,
            Self::Long => File::A,
        }
    }

    /// Files the king and rook land on, in that order.
    #[inline(always)]
    pub const fn destination_files(&self) -> (File, File) {
        match self {
            Self::Short => (File::G, File::F),
            Self::Long => (File::C, File::D),
        }
    }

    /// Files strictly between the king and the rook, which must be empty.
    #[inline(always)]
    pub const fn between_files(&self) -> &'static [File] {
        match self {
            Self::Short => &[File::F, File::G],
            Self::Long => &[File::B, File::C, File::D],
        }
    }

    /// File the king passes over on its way to its destination.
    #[inline(always)]
    pub const fn crossing_file(&self) -> File {
        match self {
            Self::Short => File::F,
            Self::Long => File::D,
        }
    }
}

impl fmt::Display for Castle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short => write!(f, "O-O"),
            Self::Long => write!(f, "O-O-O"),
        }
    }
}

/// A structured request to move a piece, as decoded from move notation.
///
/// The request names the kind of piece and where it should go; which piece
/// of that kind actually moves is worked out by [`crate::Player`].
///
/// For castling requests, `kind` is [`PieceKind::King`] and `destination` is
/// the king's target square from White's side. The mover's colour decides the real rank.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct MoveRequest {
    /// Kind of the piece to move.
    pub kind: PieceKind,

    /// Origin file hint, used to pick between several candidate pieces.
    pub file: Option<File>,

    /// Origin rank hint, used to pick between several candidate pieces.
    pub rank: Option<Rank>,

    pub destination: Square,

    /// Whether the mover claims to capture. Pawns use it to choose between pushes and captures.
    pub capture: bool,

    pub castle: Option<Castle>,

    /// Kind a pawn becomes on the last rank. Queen when absent.
    pub promotion: Option<PieceKind>,
}

impl MoveRequest {
    /// Creates a request to move a `kind` piece to `destination`, with no hints.
    ///
    /// # Example
    /// ```
    /// # use arbiter::{MoveRequest, PieceKind, Square};
    /// let req = MoveRequest::new(PieceKind::Pawn, Square::E4);
    /// assert_eq!(req.to_string(), "e4");
    /// ```
    #[inline(always)]
    pub const fn new(kind: PieceKind, destination: Square) -> Self {
        Self {
            kind,
            file: None,
            rank: None,
            destination,
            capture: false,
            castle: None,
            promotion: None,
        }
    }

    /// Creates a castling request.
    #[inline(always)]
    pub const fn castle(side: Castle) -> Self {
        let (king_file, _) = side.destination_files();
        let mut req = Self::new(PieceKind::King, Square::new(king_file, Rank::ONE));
        req.castle = Some(side);
        req
    }

    /// Parses a move written in a small subset of Standard Algebraic Notation.
    ///
    /// Accepted forms are castling (`O-O`, `O-O-O`, or with zeros), and
    /// `[NBRQK][file][rank][x]<square>[=NBRQ]`. A trailing `+`, `#`, `!` or `?` is ignored.
    /// Pawn moves have no piece letter; in a pawn capture the leading file is the origin file.
    ///
    /// # Example
    /// ```
    /// # use arbiter::{MoveRequest, PieceKind, Square, File};
    /// let req = MoveRequest::from_san("Nbd2").unwrap();
    /// assert_eq!(req.kind, PieceKind::Knight);
    /// assert_eq!(req.file, Some(File::B));
    /// assert_eq!(req.destination, Square::D2);
    ///
    /// assert!(MoveRequest::from_san("Zz9").is_err());
    /// ```
    pub fn from_san(san: &str) -> Result<Self> {
        let trimmed = san.trim().trim_end_matches(['+', '#', '!', '?']);

        match trimmed {
            "O-O" | "0-0" => return Ok(Self::castle(Castle::Short)),
            "O-O-O" | "0-0-0" => return Ok(Self::castle(Castle::Long)),
            "" => bail!("Cannot parse empty move {san:?}"),
            _ => {}
        }

        let (body, promotion) = match trimmed.split_once('=') {
            Some((body, promo)) => {
                let mut chars = promo.chars();
                let (Some(c), None) = (chars.next(), chars.next()) else {
                    bail!("Promotion in {san:?} must be a single piece letter");
                };
                if !c.is_ascii_uppercase() {
                    bail!("Promotion piece in {san:?} must be uppercase. Got {c:?}");
                }
                let kind = PieceKind::from_uci(c)?;
                if !kind.is_promotion_target() {
                    bail!("Cannot promote to a {}", kind.name());
                }
                (body, Some(kind))
            }
            None => (trimmed, None),
        };

        let mut chars = body.chars().peekable();

        let kind = match chars.peek() {
            Some(c) if c.is_ascii_uppercase() => {
                let kind = PieceKind::from_uci(*c)
                    .with_context(|| format!("Invalid piece letter in {san:?}"))?;
                if kind == PieceKind::Pawn {
                    bail!("Pawn moves are written without a piece letter. Got {san:?}");
                }
                chars.next();
                kind
            }
            _ => PieceKind::Pawn,
        };

        let rest = chars.collect::<String>();
        if rest.len() < 2 || !rest.is_ascii() {
            bail!("Move {san:?} is missing a destination square");
        }

        let (prefix, dest) = rest.split_at(rest.len() - 2);
        let destination = Square::from_uci(dest)
            .with_context(|| format!("Invalid destination square in {san:?}"))?;

        let mut req = Self::new(kind, destination);
        req.promotion = promotion;

        for c in prefix.chars() {
            match c {
                'x' if !req.capture => req.capture = true,
                'a'..='h' if req.file.is_none() && !req.capture => {
                    req.file = Some(File::from_char(c)?)
                }
                '1'..='8' if req.rank.is_none() && !req.capture => {
                    req.rank = Some(Rank::from_char(c)?)
                }
                _ => return Err(anyhow!("Unexpected {c:?} before destination in {san:?}")),
            }
        }

        if promotion.is_some() && kind != PieceKind::Pawn {
            bail!("Only pawns can promote. Got {san:?}");
        }

        if kind == PieceKind::Pawn && req.capture && req.file.is_none() {
            bail!("Pawn captures must name the origin file. Got {san:?}");
        }

        Ok(req)
    }
}

impl FromStr for MoveRequest {
    type Err = anyhow::Error;
    /// Wrapper for [`MoveRequest::from_san`].
    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_san(s)
    }
}

impl fmt::Display for MoveRequest {
    /// Writes the request back out in the notation accepted by [`MoveRequest::from_san`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(side) = self.castle {
            return write!(f, "{side}");
        }

        if self.kind != PieceKind::Pawn {
            write!(f, "{}", self.kind)?;
        }
        if let Some(file) = self.file {
            write!(f, "{file}")?;
        }
        if let Some(rank) = self.rank {
            write!(f, "{rank}")?;
        }
        if self.capture {
            write!(f, "x")?;
        }
        write!(f, "{}", self.destination)?;
        if let Some(promotion) = self.promotion {
            write!(f, "={promotion}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pawn_moves() {
        let req = MoveRequest::from_san("e4").unwrap();
        assert_eq!(req, MoveRequest::new(PieceKind::Pawn, Square::E4));

        let req = MoveRequest::from_san("exd5").unwrap();
        assert_eq!(req.kind, PieceKind::Pawn);
        assert_eq!(req.file, Some(File::E));
        assert!(req.capture);
        assert_eq!(req.destination, Square::D5);

        let req = MoveRequest::from_san("e8=N+").unwrap();
        assert_eq!(req.destination, Square::E8);
        assert_eq!(req.promotion, Some(PieceKind::Knight));
    }

    #[test]
    fn test_parse_piece_moves() {
        let req = MoveRequest::from_san("Qxf7#").unwrap();
        assert_eq!(req.kind, PieceKind::Queen);
        assert!(req.capture);
        assert_eq!(req.destination, Square::F7);
        assert_eq!(req.file, None);
        assert_eq!(req.rank, None);

        let req = MoveRequest::from_san("R1a3").unwrap();
        assert_eq!(req.rank, Some(Rank::ONE));
        assert_eq!(req.file, None);

        let req = MoveRequest::from_san("Qh4xe1").unwrap();
        assert_eq!(req.file, Some(File::H));
        assert_eq!(req.rank, Some(Rank::FOUR));
        assert!(req.capture);
        assert_eq!(req.destination, Square::E1);
    }

    #[test]
    fn test_parse_castling() {
        for san in ["O-O", "0-0", "O-O+"] {
            let req = MoveRequest::from_san(san).unwrap();
            assert_eq!(req.castle, Some(Castle::Short));
            assert_eq!(req.kind, PieceKind::King);
        }
        for san in ["O-O-O", "0-0-0"] {
            assert_eq!(MoveRequest::from_san(san).unwrap().castle, Some(Castle::Long));
        }
    }

    #[test]
    fn test_parse_failures() {
        for san in [
            "", "e", "e9", "i4", "Pe4", "Xe4", "Ke2=Q", "e8=K", "e8=q", "xd5", "Nxxd5", "Nbbd2",
            "Nd2b", "é4",
        ] {
            assert!(MoveRequest::from_san(san).is_err(), "{san:?} should not parse");
        }
    }

    #[test]
    fn test_display_matches_notation() {
        for san in ["e4", "exd5", "Nbd2", "Qh4xe1", "e8=Q", "O-O", "O-O-O", "Kxf2"] {
            assert_eq!(MoveRequest::from_san(san).unwrap().to_string(), san);
        }
    }
}
