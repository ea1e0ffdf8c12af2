/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, info};

use crate::{
    Board, Castle, CastlingRights, Color, LegalMoves, MoveOutcome, MoveRequest, Piece,
    PieceKind, Player, Rank, Square, Termination,
};

/// How a finished game ended, from the scoresheet's point of view.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
}

impl GameResult {
    /// The result of a game in which `color` just delivered checkmate.
    #[inline(always)]
    pub const fn win_for(color: Color) -> Self {
        match color {
            Color::White => Self::WhiteWins,
            Color::Black => Self::BlackWins,
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WhiteWins => write!(f, "1-0"),
            Self::BlackWins => write!(f, "0-1"),
            Self::Draw => write!(f, "1/2-1/2"),
        }
    }
}

/// A game of chess between two [`Player`]s sharing one [`Board`].
///
/// The game owns the board and both players, keeps track of whose turn it is,
/// and stops accepting moves once checkmate or stalemate is reached.
///
/// The basic methods you're probably looking for are [`Game::from_fen`], [`Game::play_move`], and [`Game::result`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Game {
    board: Board,

    /// Indexed by [`Color`].
    players: [Player; Color::COUNT],

    side_to_move: Color,

    in_play: bool,

    result: Option<GameResult>,

    termination: Option<Termination>,

    /// Plies since the last capture or pawn move.
    halfmove: usize,

    /// Starts at 1 and increments after every Black move.
    fullmove: usize,
}

impl Game {
    /// Creates a new [`Game`] on `board`, with `side_to_move` to play.
    ///
    /// If `side_to_move` already has no legal move, the game starts (and stays) finished.
    pub fn new(
        board: Board,
        side_to_move: Color,
        castling_rights: [CastlingRights; Color::COUNT],
    ) -> Self {
        let mut game = Self {
            board,
            players: [
                Player::new(Color::White, castling_rights[Color::White]),
                Player::new(Color::Black, castling_rights[Color::Black]),
            ],
            side_to_move,
            in_play: true,
            result: None,
            termination: None,
            halfmove: 0,
            fullmove: 1,
        };
        game.scan_for_termination();
        game
    }

    /// Constructs a [`Game`] from a FEN string.
    ///
    /// The placement, active color, and castling fields are required. The en passant,
    /// halfmove, and fullmove fields are optional. Each side must have exactly one king
    /// and material that promotions from a legal start could produce. An en passant
    /// square must be empty with an enemy pawn just past it.
    ///
    /// # Example
    /// ```
    /// # use arbiter::{Game, Color};
    /// let game = Game::from_fen("8/8/8/8/8/1q6/2k5/K7 b - -").unwrap();
    /// assert_eq!(game.side_to_move(), Color::Black);
    /// assert!(game.is_in_play());
    ///
    /// assert!(Game::from_fen("8/8/8/8/8/1q6/2k5/K7 x -").is_err());
    /// assert!(Game::from_fen("8/8/8/8/8/1q6/8/K7 b -").is_err());
    /// ```
    pub fn from_fen(fen: &str) -> Result<Self> {
        let fields = fen.split_ascii_whitespace().collect::<Vec<_>>();
        if !(3..=6).contains(&fields.len()) {
            bail!(
                "FEN string must have between 3 and 6 fields. Got {} in {fen:?}",
                fields.len()
            );
        }

        let mut board = Board::from_fen(fields[0])?;
        for color in Color::all() {
            validate_material(&board, color)?;
        }

        let side_to_move = Color::from_str(fields[1])
            .with_context(|| format!("Invalid active color in FEN {fen:?}"))?;

        let castling_rights = parse_castling(fields[2])?;

        if let Some(&ep) = fields.get(3).filter(|&&ep| ep != "-") {
            let target = Square::from_uci(ep)
                .with_context(|| format!("Invalid en passant square in FEN {fen:?}"))?;
            if target.rank() != Rank::sixth(side_to_move) {
                bail!(
                    "En passant square {target} is not on rank {} for {} to move",
                    Rank::sixth(side_to_move),
                    side_to_move.name()
                );
            }

            let skipped = Piece::new(side_to_move.opponent(), PieceKind::Pawn);
            let behind = target.backward_by(side_to_move, 1);
            if board.piece_at(target).is_some()
                || behind.and_then(|square| board.piece_at(square)) != Some(skipped)
            {
                bail!(
                    "En passant square {target} must be empty with a {} just behind it",
                    skipped.name()
                );
            }
            board.set_en_passant(Some(target));
        }

        let mut game = Self::new(board, side_to_move, castling_rights);

        if let Some(halfmove) = fields.get(4) {
            game.halfmove = halfmove
                .parse()
                .map_err(|_| anyhow!("FEN string must have valid halfmove counter. Got {halfmove:?}"))?;
        }

        if let Some(fullmove) = fields.get(5) {
            game.fullmove = fullmove
                .parse()
                .map_err(|_| anyhow!("FEN string must have valid fullmove counter. Got {fullmove:?}"))?;
        }

        Ok(game)
    }

    /// Generates a FEN string for the current state of the game.
    pub fn to_fen(&self) -> String {
        let white = self.players[Color::White].castling_rights();
        let black = self.players[Color::Black].castling_rights();

        let mut castling = String::with_capacity(4);
        for (right, c) in [
            (white.short, 'K'),
            (white.long, 'Q'),
            (black.short, 'k'),
            (black.long, 'q'),
        ] {
            if right {
                castling.push(c);
            }
        }
        if castling.is_empty() {
            castling.push('-');
        }

        let ep = self
            .board
            .en_passant()
            .map(|square| square.to_string())
            .unwrap_or_else(|| String::from("-"));

        format!(
            "{} {} {castling} {ep} {} {}",
            self.board.to_fen(),
            self.side_to_move,
            self.halfmove,
            self.fullmove
        )
    }

    #[inline(always)]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    #[inline(always)]
    pub const fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline(always)]
    pub const fn player(&self, color: Color) -> &Player {
        &self.players[color.index()]
    }

    /// Whether moves are still accepted.
    #[inline(always)]
    pub const fn is_in_play(&self) -> bool {
        self.in_play
    }

    /// The result, once the game is over.
    #[inline(always)]
    pub const fn result(&self) -> Option<GameResult> {
        self.result
    }

    /// Why the game ended, once it has.
    #[inline(always)]
    pub const fn termination(&self) -> Option<Termination> {
        self.termination
    }

    #[inline(always)]
    pub const fn halfmove(&self) -> usize {
        self.halfmove
    }

    #[inline(always)]
    pub const fn fullmove(&self) -> usize {
        self.fullmove
    }

    /// Rotates the displayed board. Has no effect on play.
    #[inline(always)]
    pub fn flip(&mut self) {
        self.board.flip();
    }

    /// Plays a move written in algebraic notation for the side to move.
    ///
    /// Returns `false`, leaving the game untouched, if the notation cannot be read,
    /// the move is illegal, or the game is already over.
    ///
    /// # Example
    /// ```
    /// # use arbiter::{Game, Color};
    /// let mut game = Game::default();
    /// assert!(game.play_move("e4"));
    /// assert_eq!(game.side_to_move(), Color::Black);
    /// assert!(!game.play_move("e4"));
    /// assert_eq!(game.side_to_move(), Color::Black);
    /// ```
    pub fn play_move(&mut self, san: &str) -> bool {
        match self.try_play_move(san) {
            Ok(_) => true,
            Err(err) => {
                debug!(san, "move not played: {err:#}");
                false
            }
        }
    }

    /// Like [`Game::play_move`], but explains why a move was not played.
    pub fn try_play_move(&mut self, san: &str) -> Result<MoveOutcome> {
        let request = MoveRequest::from_san(san)?;
        self.try_play(&request)
    }

    /// Plays an already-decoded [`MoveRequest`] for the side to move. See [`Game::play_move`].
    pub fn play(&mut self, request: &MoveRequest) -> bool {
        match self.try_play(request) {
            Ok(_) => true,
            Err(err) => {
                debug!(%request, "move not played: {err:#}");
                false
            }
        }
    }

    /// Like [`Game::play`], but explains why a move was not played.
    ///
    /// After a successful move the turn passes, and the game ends if the new side to move
    /// is checkmated (the mover wins) or stalemated (a draw).
    pub fn try_play(&mut self, request: &MoveRequest) -> Result<MoveOutcome> {
        if !self.in_play {
            match self.result {
                Some(result) => bail!("the game is over ({result})"),
                None => bail!("the game is over"),
            }
        }

        let mover = self.side_to_move;
        let outcome = self.players[mover].try_move(&mut self.board, request)?;

        self.players[mover.opponent()].revoke_rights_for_missing_rooks(&self.board);

        if outcome.irreversible {
            self.halfmove = 0;
        } else {
            self.halfmove += 1;
        }
        if mover == Color::Black {
            self.fullmove += 1;
        }

        self.side_to_move = mover.opponent();
        self.scan_for_termination();

        Ok(outcome)
    }

    /// Every legal `(from, to)` pair for the side to move, castling excluded.
    ///
    /// Empty once the game is over.
    pub fn legal_moves(&self) -> LegalMoves {
        if !self.in_play {
            return LegalMoves::new();
        }
        self.board.legal_moves(self.side_to_move)
    }

    /// The castling moves the side to move could play right now.
    pub fn legal_castles(&self) -> Vec<Castle> {
        if !self.in_play {
            return Vec::new();
        }

        [Castle::Short, Castle::Long]
            .into_iter()
            .filter(|&side| {
                let mut player = self.players[self.side_to_move];
                let mut board = self.board.clone();
                player
                    .try_move(&mut board, &MoveRequest::castle(side))
                    .is_ok()
            })
            .collect()
    }

    /// Checks whether the side to move can still play, and records the result if not.
    fn scan_for_termination(&mut self) {
        let (can_continue, reason) = self.board.can_play_continue(self.side_to_move);
        if can_continue {
            return;
        }

        let result = match reason {
            Some(Termination::Checkmate) => GameResult::win_for(self.side_to_move.opponent()),
            _ => GameResult::Draw,
        };

        self.in_play = false;
        self.termination = reason;
        self.result = Some(result);

        if let Some(reason) = reason {
            info!(%reason, %result, "game over");
        }
    }
}

/// Parses the castling field of a FEN string: `-`, or some of `KQkq` in that order.
/// Rejects placements no game could reach: a missing or extra king, too many pieces or pawns,
/// more extra minor and major pieces than missing pawns could have promoted into, or pawns on a back rank.
fn validate_material(board: &Board, color: Color) -> Result<()> {
    let name = color.name();

    let kings = board.count(color, PieceKind::King);
    if kings != 1 {
        bail!("FEN must place exactly one {name} king. Got {kings}");
    }

    let total = board.pieces().filter(|(_, piece)| piece.color() == color).count();
    if total > 16 {
        bail!("FEN places {total} {name} pieces. At most 16 are allowed");
    }

    let pawns = board.count(color, PieceKind::Pawn);
    if pawns > 8 {
        bail!("FEN places {pawns} {name} pawns. At most 8 are allowed");
    }

    let promoted = [
        (PieceKind::Knight, 2),
        (PieceKind::Bishop, 2),
        (PieceKind::Rook, 2),
        (PieceKind::Queen, 1),
    ]
    .into_iter()
    .map(|(kind, initial)| board.count(color, kind).saturating_sub(initial))
    .sum::<usize>();
    if promoted > 8 - pawns {
        bail!("FEN gives {name} {promoted} promoted pieces but only {} pawns are missing", 8 - pawns);
    }

    let pawn = Piece::new(color, PieceKind::Pawn);
    if let Some((square, _)) = board
        .pieces()
        .find(|&(square, piece)| piece == pawn && matches!(square.rank(), Rank::ONE | Rank::EIGHT))
    {
        bail!("FEN places a {name} pawn on {square}, which is a back rank");
    }

    Ok(())
}

fn parse_castling(castling: &str) -> Result<[CastlingRights; Color::COUNT]> {
    let mut rights = [CastlingRights::NONE; Color::COUNT];
    if castling == "-" {
        return Ok(rights);
    }

    let order = ['K', 'Q', 'k', 'q'];
    let mut next = 0;

    for c in castling.chars() {
        let Some(offset) = order[next..].iter().position(|&o| o == c) else {
            bail!("FEN castling rights must be '-' or some of \"KQkq\" in that order. Got {castling:?}");
        };
        next += offset + 1;

        match c {
            'K' => rights[Color::White].short = true,
            'Q' => rights[Color::White].long = true,
            'k' => rights[Color::Black].short = true,
            _ => rights[Color::Black].long = true,
        }
    }

    Ok(rights)
}

impl FromStr for Game {
    type Err = anyhow::Error;
    /// Wrapper for [`Game::from_fen`]
    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

impl Default for Game {
    /// Standard starting position for Chess.
    #[inline(always)]
    fn default() -> Self {
        Self::new(Board::default(), Color::White, [CastlingRights::ALL; Color::COUNT])
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.board)?;
        writeln!(f)?;
        writeln!(f, "FEN: {}", self.to_fen())?;

        match (self.result, self.termination) {
            (Some(result), Some(reason)) => write!(f, "Result: {result} ({reason})"),
            _ => write!(f, "To move: {}", self.side_to_move.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FEN_STARTPOS;

    #[test]
    fn test_default_is_startpos() {
        let game = Game::default();
        assert_eq!(game.to_fen(), FEN_STARTPOS);
        assert_eq!(Game::from_fen(FEN_STARTPOS).unwrap(), game);
        assert_eq!(
            Game::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq").unwrap(),
            game
        );
    }

    #[test]
    fn test_from_fen_validation() {
        // Missing fields
        assert!(Game::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w").is_err());
        // Bad active color
        assert!(Game::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR W KQkq").is_err());
        // Castling out of order or unknown letters
        assert!(Game::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w QK").is_err());
        assert!(Game::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KKq").is_err());
        assert!(Game::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkqx").is_err());
        assert!(Game::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w HAha").is_err());
        // Two white kings
        assert!(Game::from_fen("4k3/8/8/8/8/8/8/3KK3 w -").is_err());
        // En passant square on the wrong rank
        assert!(Game::from_fen("4k3/8/8/8/4P3/8/8/4K3 w - e3").is_err());
        assert!(Game::from_fen("4k3/8/8/8/4P3/8/8/4K3 b - e3").is_ok());
        // En passant square with no enemy pawn behind it, or occupied
        assert!(Game::from_fen("4k3/8/8/3PB3/8/8/8/4K3 w - e6").is_err());
        assert!(Game::from_fen("4k3/8/8/8/8/8/8/4K3 w - e6").is_err());
        assert!(Game::from_fen("4k3/8/4n3/4p3/8/8/8/4K3 w - e6").is_err());
        // Bad counters
        assert!(Game::from_fen("4k3/8/8/8/8/8/8/4K3 w - - x 1").is_err());
        assert!(Game::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 -1").is_err());
        // Too many fields
        assert!(Game::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1 extra").is_err());
    }

    #[test]
    fn test_from_fen_rejects_impossible_material() {
        // Nine white pawns
        assert!(Game::from_fen("4k3/8/8/8/8/P7/PPPPPPPP/4K3 w -").is_err());
        // Seventeen white pieces
        assert!(Game::from_fen("4k3/8/8/8/NN6/NNNNNNNN/NNNNNN2/4K3 w -").is_err());
        // Three knights need a missing pawn
        assert!(Game::from_fen("4k3/8/8/8/8/8/PPPPPPPP/1NN1KN2 w -").is_err());
        assert!(Game::from_fen("4k3/8/8/8/8/8/PPPPPPP1/1NN1KN2 w -").is_ok());
        // Pawns never stand on a back rank
        assert!(Game::from_fen("P3k3/8/8/8/8/8/8/4K3 w -").is_err());
        assert!(Game::from_fen("4k3/8/8/8/8/8/8/p3K3 w -").is_err());
        // Ten white queens alongside a full set of officers
        assert!(Game::from_fen("R4Q1R/3Q4/1Q4Q1/4Q3/2Q4Q/Q4Q2/pp1Q4/kBNN1KB1 w - - 0 1").is_err());
    }

    #[test]
    fn test_castling_field() {
        let game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w Kq").unwrap();
        assert_eq!(
            game.player(Color::White).castling_rights(),
            CastlingRights { short: true, long: false }
        );
        assert_eq!(
            game.player(Color::Black).castling_rights(),
            CastlingRights { short: false, long: true }
        );
        assert!(game.to_fen().starts_with("r3k2r/8/8/8/8/8/8/R3K2R w Kq - "));
    }

    #[test]
    fn test_fen_round_trip() {
        let fen = "r1bqkbnr/1ppp1ppp/p1n5/4p3/2B1P3/5Q2/PPPP1PPP/RNB1K1NR w KQkq - 0 4";
        assert_eq!(Game::from_fen(fen).unwrap().to_fen(), fen);
    }

    #[test]
    fn test_counters() {
        let mut game = Game::default();
        assert!(game.play_move("Nf3"));
        assert_eq!((game.halfmove(), game.fullmove()), (1, 1));
        assert!(game.play_move("Nc6"));
        assert_eq!((game.halfmove(), game.fullmove()), (2, 2));
        assert!(game.play_move("e4"));
        assert_eq!((game.halfmove(), game.fullmove()), (0, 2));
        assert_eq!(
            game.to_fen(),
            "r1bqkbnr/pppppppp/2n5/8/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq e3 0 2"
        );
    }

    #[test]
    fn test_unreadable_move_is_not_played() {
        let mut game = Game::default();
        assert!(!game.play_move("hello"));
        assert!(!game.play_move(""));
        assert_eq!(game, Game::default());
    }

    #[test]
    fn test_capturing_corner_rook_revokes_right() {
        let mut game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K3 w kq").unwrap();
        assert!(game.play_move("Rxa8+"));
        assert_eq!(
            game.player(Color::Black).castling_rights(),
            CastlingRights { short: true, long: false }
        );
    }

    #[test]
    fn test_position_already_over() {
        let game = Game::from_fen("8/8/8/8/8/8/2k5/Kq6 w - -").unwrap();
        assert!(!game.is_in_play());
        assert_eq!(game.result(), Some(GameResult::BlackWins));
        assert!(game.legal_moves().is_empty());
    }

    #[test]
    fn test_legal_castles() {
        let game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq -").unwrap();
        assert_eq!(game.legal_castles(), vec![Castle::Short, Castle::Long]);

        let game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w Q -").unwrap();
        assert_eq!(game.legal_castles(), vec![Castle::Long]);

        assert!(Game::default().legal_castles().is_empty());
    }
}
