/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Board representation and the rules of piece movement.
mod board;

/// Command-line arguments and session commands.
mod cli;

/// Turn order, results, and FEN handling for a whole game.
mod game;

/// Move resolution for one side: finding the moving piece, self-check prevention, castling rights.
mod player;

/// Line-oriented interactive play.
mod session;

pub use board::*;
pub use cli::*;
pub use game::*;
pub use player::*;
pub use session::*;
