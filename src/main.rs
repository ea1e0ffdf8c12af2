/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use anyhow::Result;
use arbiter::{Cli, Game, Session};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut game = Game::from_fen(&cli.fen)?;
    if cli.flip {
        game.flip();
    }

    for san in &cli.moves {
        if !game.play_move(san) {
            warn!(%san, "skipping move from the command line");
        }
    }

    if let Err(e) = Session::new(game).run_stdio() {
        eprintln!("{} encountered an error: {e}", env!("CARGO_PKG_NAME"));
    }

    Ok(())
}
