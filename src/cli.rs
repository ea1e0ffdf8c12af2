/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::str::FromStr;

use clap::{error::ErrorKind, Parser};

use crate::{Square, FEN_STARTPOS};

/// Command-line arguments of the `arbiter` binary.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Position to start from.
    #[arg(long, default_value = FEN_STARTPOS)]
    pub fen: String,

    /// Start with the board displayed from Black's side.
    #[arg(long, default_value = "false")]
    pub flip: bool,

    /// Log every rejected move and its reason to stderr.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Moves, in algebraic notation, to play before reading from stdin.
    pub moves: Vec<String>,
}

/// A command entered during an interactive session.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    multicall = true,
    about,
    rename_all = "lower",
    override_usage("<COMMAND> | <MOVE>")
)]
pub enum SessionCommand {
    /// Print a visual representation of the current board state.
    #[command(alias = "d")]
    Display,

    /// Quit the session.
    #[command(alias = "quit")]
    Exit,

    /// Generate and print a FEN string for the current position.
    Fen,

    /// Rotate the displayed board by 180 degrees.
    Flip,

    /// Play a move for the side to move, if it is legal.
    ///
    /// A bare move such as `e4` or `Nf3` works too.
    #[command(alias = "m")]
    Move { san: String },

    /// Shows all legal moves in the current position, or for the piece on a specific square.
    Moves { square: Option<Square> },

    /// Performs a split perft on the current position at the supplied depth, printing node counts.
    Perft { depth: usize },

    /// Print the result of the game, or `*` while it is still going.
    #[command(name = "result")]
    GameResult,
}

impl FromStr for SessionCommand {
    type Err = clap::Error;
    /// Attempt to parse a [`SessionCommand`] from a line of input.
    ///
    /// If this fails and the line is a single word, it is treated as a move.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::try_parse_from(s.split_ascii_whitespace()) {
            Ok(cmd) => Ok(cmd),
            Err(e) => {
                let mut words = s.split_ascii_whitespace();
                match (words.next(), words.next()) {
                    (Some(san), None) if !matches!(e.kind(), ErrorKind::DisplayHelp) => {
                        Ok(Self::Move {
                            san: san.to_string(),
                        })
                    }
                    _ => Err(e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("display".parse::<SessionCommand>().unwrap(), SessionCommand::Display);
        assert_eq!("d".parse::<SessionCommand>().unwrap(), SessionCommand::Display);
        assert_eq!("quit".parse::<SessionCommand>().unwrap(), SessionCommand::Exit);
        assert_eq!(
            "perft 3".parse::<SessionCommand>().unwrap(),
            SessionCommand::Perft { depth: 3 }
        );
        assert_eq!(
            "moves e2".parse::<SessionCommand>().unwrap(),
            SessionCommand::Moves {
                square: Some(Square::E2)
            }
        );
        assert_eq!(
            "moves".parse::<SessionCommand>().unwrap(),
            SessionCommand::Moves { square: None }
        );
    }

    #[test]
    fn test_bare_words_are_moves() {
        assert_eq!(
            "Nf3".parse::<SessionCommand>().unwrap(),
            SessionCommand::Move {
                san: String::from("Nf3")
            }
        );
        assert_eq!(
            "move O-O".parse::<SessionCommand>().unwrap(),
            SessionCommand::Move {
                san: String::from("O-O")
            }
        );
    }

    #[test]
    fn test_bad_arguments_are_errors() {
        assert!("perft deep".parse::<SessionCommand>().is_err());
        assert!("moves z9".parse::<SessionCommand>().is_err());
        assert!("fly me to the moon".parse::<SessionCommand>().is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["arbiter"]).unwrap();
        assert_eq!(cli.fen, FEN_STARTPOS);
        assert!(!cli.flip);
        assert!(cli.moves.is_empty());

        let cli = Cli::try_parse_from(["arbiter", "-v", "--flip", "e4", "e5"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.flip);
        assert_eq!(cli.moves, vec!["e4", "e5"]);
    }
}
