/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::{splitperft, Game, SessionCommand};

/// A line-oriented session over a single [`Game`].
///
/// Commands are read one per line and executed in order, on the calling thread.
#[derive(Debug, Clone, Default)]
pub struct Session {
    game: Game,
}

impl Session {
    /// Constructs a new [`Session`] to be executed with [`Session::run`].
    pub fn new(game: Game) -> Self {
        Self { game }
    }

    /// The game being played.
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Reads commands from `input` until `exit` or end of input, writing responses to `output`.
    ///
    /// Unreadable lines are reported to `output` and skipped.
    pub fn run(&mut self, input: impl BufRead, mut output: impl Write) -> Result<()> {
        for line in input.lines() {
            let line = line.context("Failed to read a line of input")?;
            if line.trim().is_empty() {
                continue;
            }

            match line.parse::<SessionCommand>() {
                Ok(cmd) => {
                    if !self.execute(cmd, &mut output)? {
                        break;
                    }
                }
                Err(err) => writeln!(output, "{err}")?,
            }
        }

        Ok(())
    }

    /// Runs the session on stdin and stdout.
    pub fn run_stdio(&mut self) -> Result<()> {
        let stdin = io::stdin();
        self.run(stdin.lock(), io::stdout())
    }

    /// Executes a single command. Returns `false` once the session should stop.
    pub fn execute(&mut self, cmd: SessionCommand, output: &mut impl Write) -> Result<bool> {
        match cmd {
            SessionCommand::Display => writeln!(output, "{}", self.game)?,

            SessionCommand::Exit => return Ok(false),

            SessionCommand::Fen => writeln!(output, "{}", self.game.to_fen())?,

            SessionCommand::Flip => self.game.flip(),

            SessionCommand::Move { san } => match self.game.try_play_move(&san) {
                Ok(_) => {
                    if let Some(result) = self.game.result() {
                        writeln!(output, "{result}")?;
                    }
                }
                Err(err) => {
                    warn!(%san, "illegal move: {err:#}");
                    writeln!(output, "illegal move {san:?}: {err:#}")?;
                }
            },

            SessionCommand::Moves { square } => {
                let mut moves = match square {
                    Some(from) if self.game.is_in_play() => {
                        let mine = self.game.board().color_at(from) == Some(self.game.side_to_move());
                        if mine {
                            self.game
                                .board()
                                .legal_destinations(from)
                                .into_iter()
                                .map(|to| format!("{from}{to}"))
                                .collect()
                        } else {
                            Vec::new()
                        }
                    }
                    Some(_) => Vec::new(),
                    None => self
                        .game
                        .legal_moves()
                        .into_iter()
                        .map(|(from, to)| format!("{from}{to}"))
                        .chain(self.game.legal_castles().into_iter().map(|c| c.to_string()))
                        .collect::<Vec<_>>(),
                };
                moves.sort();

                // If there are none, print "(none)"
                let moves_string = if moves.is_empty() {
                    String::from("(none)")
                } else {
                    moves.join(", ")
                };
                writeln!(output, "{moves_string}")?;
            }

            SessionCommand::Perft { depth } => {
                let board = self.game.board();
                let split = splitperft(board, self.game.side_to_move(), depth);
                for ((from, to), nodes) in &split {
                    writeln!(output, "{from}{to}\t{nodes}")?;
                }
                let total: u64 = if depth == 0 {
                    1
                } else {
                    split.iter().map(|(_, nodes)| nodes).sum()
                };
                info!(depth, total, "perft finished");
                writeln!(output, "\n{total}")?;
            }

            SessionCommand::GameResult => match (self.game.result(), self.game.termination()) {
                (Some(result), Some(reason)) => writeln!(output, "{result} ({reason})")?,
                _ => writeln!(output, "*")?,
            },
        }

        Ok(true)
    }
}
