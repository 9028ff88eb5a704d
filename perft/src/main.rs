use std::time::{Duration, Instant};

use clap::Parser;
use hrokur_core::{
    board::State,
    perft::{perft, perft_divide},
};

/// Perft tester for hrokur.
///
/// Runs perft on the move generator for hrokur to debug issues and check
/// its performance.
#[derive(Parser, Debug)]
struct Args {
    /// Starting position of the board.
    ///
    /// Expects either the string "startpos" or a valid position in
    /// Forsyth-Edwards Notation (FEN). Additional alterations to the
    /// position can be specified via the --moves option.
    #[arg(short, long, default_value = "startpos", value_parser = parse_position)]
    position: State,

    /// Additional moves to play before running perft.
    ///
    /// Plays the specified moves on top of the position specified with
    /// `--position` before running perft. Can be used to quickly test
    /// variations on a position.
    ///
    /// Moves are written the way the engine prints them: the moving piece's
    /// letter (except for pawns), starting square, ending square and an
    /// optional promotion target, e.g. `d2d4`, `Ng1f3`, `e7e8Q`.
    #[arg(short, long, num_args(0..))]
    moves: Vec<String>,

    /// Exact depth to search to.
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..), default_value_t = 5)]
    depth: u8,

    /// Run in divide mode.
    ///
    /// When provided, will run perft down to the provided depth and list
    /// each possible move in the current position along with the number of
    /// nodes found under that move. This is useful for debugging errors by
    /// identifying the exact sequence of moves under which they occur.
    #[arg(long)]
    divide: bool,
}

fn parse_position(s: &str) -> Result<State, String> {
    if s == "startpos" {
        Ok(State::starting_position())
    } else {
        State::try_parse_fen(s).map_err(|e| {
            format!("Expected `startpos` or a valid FEN string. FEN parsing error: {e}")
        })
    }
}

fn generic_perft(mut state: State, max_depth: usize) {
    let mut total_time = Duration::ZERO;
    let mut last_depth_time = Duration::ZERO;
    let mut total_nodes = 0;

    for depth in 0..=max_depth {
        let start_time = Instant::now();

        let nodes = perft(&mut state, depth);

        let time_taken = start_time.elapsed();

        println!(
            "Depth: {depth}\tNodes: {nodes}\tTime taken: {:.3}s",
            time_taken.as_secs_f64()
        );

        total_time += time_taken;
        last_depth_time = time_taken;
        total_nodes += nodes;
    }

    println!();

    let nodes_per_second = total_nodes as f64 / last_depth_time.as_secs_f64();

    println!(
        "Total nodes: {total_nodes}\tTotal time: {:.3}s\tNodes per second: {:.3}",
        total_time.as_secs_f64(),
        nodes_per_second
    );
}

fn specific_perft(mut state: State, depth: usize) {
    assert!(depth >= 1);

    let divided = perft_divide(&mut state, depth);

    let mut total_nodes = 0;
    for (m, nodes) in divided {
        total_nodes += nodes;
        println!("{m}: {nodes}");
    }

    println!();
    println!("Nodes searched: {total_nodes}");
}

fn main() -> Result<(), String> {
    let Args {
        position,
        moves,
        depth,
        divide,
    } = Args::parse();

    let mut state = position;
    for move_spec in moves {
        state.expand();
        match state.find_move(&move_spec) {
            Some(index) => state = state.advance(index),
            None => {
                return Err(format!(
                    "Move `{move_spec}` is invalid to play in this position ({})",
                    state.fen()
                ));
            }
        }
    }

    if divide {
        specific_perft(state, depth as _)
    } else {
        generic_perft(state, depth as _);
    }

    Ok(())
}
