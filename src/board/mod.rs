/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Per-piece movement rules.
mod geometry;

/// Structured move requests and their notation.
mod moves;

/// Node counting over the legal move tree.
mod perft;

/// Colors, piece kinds, and pieces.
mod piece;

/// The board itself: occupancy, simulation, check and terminal-state detection.
mod position;

/// Squares, ranks, and files.
mod square;

/// Misc constants and type aliases.
mod utils;

pub use geometry::*;
pub use moves::*;
pub use perft::*;
pub use piece::*;
pub use position::*;
pub use square::*;
pub use utils::*;
