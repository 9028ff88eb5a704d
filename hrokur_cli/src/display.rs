//! ANSI rendering of positions and search statistics.

use std::fmt::Write as _;

use hrokur_core::board::{Color, Move, Square, State};

const LIGHT_SQUARE: &str = "\x1b[48;5;180m";
const DARK_SQUARE: &str = "\x1b[48;5;136m";
const PIECE_FG: &str = "\x1b[38;5;232m";
const RESET: &str = "\x1b[0m";

/// Renders the board with ANSI background colours, rank and file legends,
/// and a side-to-move banner.
pub fn render_state(state: &State) -> String {
    let mut out = String::new();

    for rank in (0..8).rev() {
        let _ = write!(out, " {} ", rank + 1);
        for file in 0..8 {
            let square = Square::new_unchecked(rank, file);
            let background = if (rank + file) % 2 == 0 {
                DARK_SQUARE
            } else {
                LIGHT_SQUARE
            };
            let glyph = match state.cell(square).piece() {
                Some(piece) => piece.as_unicode_char(),
                None => ' ',
            };
            let _ = write!(out, "{background}{PIECE_FG} {glyph} {RESET}");
        }
        out.push('\n');
    }

    out.push_str("    a  b  c  d  e  f  g  h\n");

    let _ = write!(
        out,
        "\n ply {}, {} to move\n",
        state.ply(),
        match state.to_move() {
            Color::White => "white",
            Color::Black => "black",
        }
    );

    out
}

/// Prints a move list six to a row, the way the prompt has always listed
/// legal moves.
pub fn print_move_list(moves: &[Move]) {
    for (index, m) in moves.iter().enumerate() {
        print!("{:<9}", m.to_string());
        if (index + 1) % 6 == 0 {
            println!();
        }
    }
    if moves.len() % 6 != 0 {
        println!();
    }
}

/// Prints per-move playout statistics, most-simulated first.
pub fn print_statistics(state: &State) {
    if state.games_played() == 0 {
        println!("No playouts recorded yet; run `search` first.");
        return;
    }

    println!(
        "{} playouts through this position (+{} -{} ={})",
        state.games_played(),
        state.wins_white(),
        state.wins_black(),
        state.draws()
    );

    let mut children: Vec<&State> = state.children().iter().collect();
    children.sort_by_key(|child| std::cmp::Reverse(child.games_played()));

    println!("{:<9} {:>8} {:>8} {:>8} {:>8}", "move", "games", "white", "black", "draw");
    for child in children.iter().take(10) {
        println!(
            "{:<9} {:>8} {:>8} {:>8} {:>8}",
            child.last_move().to_string(),
            child.games_played(),
            child.wins_white(),
            child.wins_black(),
            child.draws()
        );
    }
}
