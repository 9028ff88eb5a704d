use std::{io::stdin, time::Instant};

use anyhow::Result;
use clap::Parser;
use crossbeam_channel::bounded;
use hrokur_core::{
    board::{GameState, State, STARTING_POSITION_FEN},
    perft::perft_divide,
    save,
};
use hrokur_engine::{
    search_result::SearchResult,
    search_settings::{SearchSettings, DEFAULT_WORKERS},
    Engine,
};
use log::warn;

use command::Command;

mod command;
mod display;

/// Interactive chess prompt driving the hrokur Monte-Carlo engine.
#[derive(Parser, Debug)]
struct Args {
    /// Starting position.
    ///
    /// Expects "startpos", the name of a built-in fixture (kiwipete, pos3,
    /// pos5, promotion, enpassant) or a position in Forsyth-Edwards
    /// Notation.
    #[arg(short, long, default_value = "startpos", value_parser = parse_position)]
    position: State,

    /// Playout workers fanned out per search iteration.
    #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Base seed for the playout generators, for reproducible searches.
    #[arg(long)]
    seed: Option<u64>,

    /// Skip writing an autosave under history/ after each move.
    #[arg(long)]
    no_autosave: bool,
}

fn fixture_fen(name: &str) -> Option<&'static str> {
    Some(match name.to_ascii_lowercase().as_str() {
        "startpos" | "initial" => STARTING_POSITION_FEN,
        "kiwipete" => "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "pos3" => "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "pos5" => "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        "promotion" => "k7/4P3/8/8/8/8/8/K7 w - - 0 1",
        "enpassant" => "rnbqkbnr/1pp1pppp/p7/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3",
        _ => return None,
    })
}

fn parse_position(s: &str) -> Result<State, String> {
    let fen = fixture_fen(s).unwrap_or(s);
    State::try_parse_fen(fen)
        .map_err(|e| format!("expected `startpos`, a fixture name or a valid FEN string ({e})"))
}

/// Reads one line from stdin; [`None`] means end of input.
fn read_line() -> Option<String> {
    let mut buffer = String::new();
    match stdin().read_line(&mut buffer) {
        Ok(0) => None,
        Ok(_) => Some(buffer.trim().to_owned()),
        Err(e) => {
            warn!("error reading from stdin: {e}");
            None
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  <move>     play a legal move, e.g. e2e4, Ng1f3, e7e8Q");
    println!("  search     start the Monte-Carlo search on this position");
    println!("  stop       stop the search and show what it found");
    println!("  best       show playout statistics for this position");
    println!("  perft N    count move sequences of depth N");
    println!("  load X     load a fixture name, a FEN string or a .game file");
    println!("  save       write this position under history/");
    println!("  quit       leave");
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = SearchSettings {
        workers: args.workers,
        seed: args.seed,
        ..Default::default()
    };
    let engine = Engine::new(settings);

    run_prompt(args.position, engine, args.no_autosave)
}

fn run_prompt(mut state: State, mut engine: Engine, no_autosave: bool) -> Result<()> {
    let (result_tx, result_rx) = bounded::<SearchResult>(1);

    loop {
        // While a search runs the tree belongs to the driver; the prompt
        // only lets the user stop it (or leave).
        if engine.is_searching() {
            let Some(line) = read_line() else {
                engine.shutdown();
                break;
            };
            match line.parse() {
                Ok(Command::Stop) => {
                    engine.stop();
                    let result = result_rx.recv()?;
                    adopt_result(&mut state, result);
                }
                Ok(Command::Quit) => {
                    engine.shutdown();
                    break;
                }
                _ => println!("A search is running; `stop` it first."),
            }
            continue;
        }

        print!("{}", display::render_state(&state));

        match state.game_state() {
            GameState::Win(winner) => {
                println!("CHECKMATE -- {winner:?} wins");
                break;
            }
            GameState::Stalemate => {
                println!("STALEMATE");
                break;
            }
            GameState::InPlay { check: true } => println!("CHECK"),
            GameState::InPlay { check: false } => {}
        }

        display::print_move_list(&state.legal_moves());

        println!();
        println!("Enter a move, or `search` to think (`help` lists everything):");
        let Some(line) = read_line() else { break };

        let Ok(command) = line.parse() else {
            println!("Invalid command, try again.");
            continue;
        };

        match command {
            Command::Move(text) => match state.find_move(&text) {
                Some(index) => {
                    state = state.advance(index);
                    if !no_autosave {
                        match save::autosave(&state) {
                            Ok(path) => log::debug!("autosaved to {}", path.display()),
                            Err(e) => warn!("autosave failed: {e}"),
                        }
                    }
                }
                None => println!("Invalid command, try again."),
            },

            Command::Search => {
                let tx = result_tx.clone();
                match engine.start_search(&state, move |result| {
                    let _ = tx.send(result);
                }) {
                    Ok(()) => println!("Searching... type `stop` to finish."),
                    Err(e) => println!("{e}"),
                }
            }

            Command::Stop => println!("No search is running."),

            Command::Best => display::print_statistics(&state),

            Command::Perft(depth) => run_perft(&mut state, depth),

            Command::Load(source) => match load_position(&source) {
                Ok(loaded) => state = loaded,
                Err(message) => println!("{message}"),
            },

            Command::Save => match save::autosave(&state) {
                Ok(path) => println!("Saved to {}.", path.display()),
                Err(e) => warn!("save failed: {e}"),
            },

            Command::Help => print_help(),

            Command::Quit => break,
        }
    }

    Ok(())
}

fn load_position(source: &str) -> Result<State, String> {
    if source.ends_with(".game") {
        save::load(source.as_ref()).map_err(|e| format!("could not load {source}: {e}"))
    } else {
        parse_position(source)
    }
}

fn run_perft(state: &mut State, depth: usize) {
    if depth == 0 {
        println!("Nodes searched: 1");
        return;
    }

    let start = Instant::now();
    let divided = perft_divide(state, depth);
    let time_taken = start.elapsed();

    for (m, nodes) in &divided {
        println!("{m}: {nodes}");
    }

    let total: u64 = divided.iter().map(|(_, nodes)| nodes).sum();
    println!();
    println!(
        "Nodes searched: {total}\tTime taken: {:.3}s",
        time_taken.as_secs_f64()
    );
}

fn adopt_result(state: &mut State, result: SearchResult) {
    // Commits are refused while searching, so the searched root can only be
    // the current position.
    if result.root == *state {
        *state = result.root;
        println!(
            "Search ran {} playouts over {} iterations in {:.2}s ({:.0}/s).",
            result.stats.playouts,
            result.stats.iterations,
            result.stats.elapsed.as_secs_f64(),
            result.stats.playouts_per_second()
        );
        if let Some(best) = result.best_move {
            println!("Most explored move: {best}");
        }
        display::print_statistics(state);
    } else {
        warn!("discarding a search result for a position no longer current");
    }
}
