//! The Monte-Carlo tree search driver.
//!
//! Each iteration is strictly sequential: UCB1 selection down the tree,
//! a parallel playout fan-out on the selected node, then backpropagation of
//! the summed tally. The tree itself is only ever touched by the driver;
//! workers see value copies.
//!
//! Selection records the path of child indices it walked, and
//! backpropagation replays that same path. Nodes therefore need no parent
//! links at all, and growing a children vector can never invalidate
//! anything.

use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Instant,
};

use hrokur_core::board::{Color, Move, State};
use log::debug;

use crate::{
    playout::PlayoutTally, search_settings::SearchSettings, search_stats::SearchStats,
    worker::WorkerPool,
};

pub struct SearchContext<'a> {
    root: &'a mut State,
    settings: &'a SearchSettings,
    pool: &'a WorkerPool,
    stop_flag: &'a AtomicBool,
    stats: SearchStats,
}

impl<'a> SearchContext<'a> {
    pub fn new(
        root: &'a mut State,
        settings: &'a SearchSettings,
        pool: &'a WorkerPool,
        stop_flag: &'a AtomicBool,
    ) -> Self {
        Self {
            root,
            settings,
            pool,
            stop_flag,
            stats: SearchStats::default(),
        }
    }

    /// Iterates until the stop flag flips. The flag is checked once per
    /// iteration, so an in-flight fan-out always completes before the search
    /// winds down.
    pub fn run(mut self) -> SearchStats {
        let start = Instant::now();
        while !self.stop_flag.load(Ordering::Relaxed) {
            self.iterate();
        }
        self.stats.elapsed = start.elapsed();
        debug!(
            "search stopped after {} iterations / {} playouts",
            self.stats.iterations, self.stats.playouts
        );
        self.stats
    }

    /// Runs exactly `count` iterations, ignoring the stop flag.
    pub fn run_iterations(mut self, count: u64) -> SearchStats {
        let start = Instant::now();
        for _ in 0..count {
            self.iterate();
        }
        self.stats.elapsed = start.elapsed();
        self.stats
    }

    fn iterate(&mut self) {
        let path = select_path(self.root, self.settings.exploration);
        let node = node_at_path(self.root, &path);
        let tally = self.pool.run_playouts(node);

        debug_assert_eq!(tally.total(), self.pool.worker_count() as u64);

        backpropagate(self.root, &path, tally);

        self.stats.iterations += 1;
        self.stats.playouts += tally.total();
    }
}

/// Walks from the root towards a node worth simulating and returns the
/// child indices of the walk.
///
/// The descent stops at the first node that has never been simulated or
/// that has no legal successors. While descending, a never-simulated child
/// is preferred outright over any UCB1 ranking; otherwise the child
/// maximising UCB1 is taken, first maximum winning ties.
fn select_path(root: &mut State, exploration: f64) -> Vec<usize> {
    let mut path = Vec::new();
    let mut node: &mut State = root;

    loop {
        if node.games_played() == 0 && path.is_empty() {
            // A fresh root gets simulated before the tree grows under it
            break;
        }

        node.expand();
        if node.children().is_empty() {
            break;
        }

        let index = match node
            .children()
            .iter()
            .position(|child| child.games_played() == 0)
        {
            Some(unsimulated) => unsimulated,
            None => best_ucb_index(node, exploration),
        };

        path.push(index);
        node = &mut node.children_mut()[index];

        if node.games_played() == 0 {
            break;
        }
    }

    path
}

/// UCB1 over a node's fully-simulated children:
///
/// ```text
/// (wins - losses) / games  +  C * sqrt(ln(parent games) / games)
/// ```
///
/// with wins and losses counted for the side to move at the node itself.
fn best_ucb_index(node: &State, exploration: f64) -> usize {
    let parent_games = node.games_played() as f64;
    let mover = node.to_move();

    let mut best_index = 0;
    let mut best_score = f64::NEG_INFINITY;

    for (index, child) in node.children().iter().enumerate() {
        let games = child.games_played() as f64;
        debug_assert!(games > 0.0);

        let (wins, losses) = match mover {
            Color::White => (child.wins_white(), child.wins_black()),
            Color::Black => (child.wins_black(), child.wins_white()),
        };

        let exploitation = (wins as f64 - losses as f64) / games;
        let score = exploitation + exploration * (parent_games.ln() / games).sqrt();

        if score > best_score {
            best_score = score;
            best_index = index;
        }
    }

    best_index
}

fn node_at_path<'tree>(root: &'tree mut State, path: &[usize]) -> &'tree mut State {
    let mut node = root;
    for &index in path {
        node = &mut node.children_mut()[index];
    }
    node
}

/// Credits the tally to every node on the path, the selected node and the
/// root included. Every ancestor receives exactly the delta the selected
/// node received.
fn backpropagate(root: &mut State, path: &[usize], tally: PlayoutTally) {
    let mut node: &mut State = root;
    node.record_playouts(tally.wins_white, tally.wins_black, tally.draws);
    for &index in path {
        node = &mut node.children_mut()[index];
        node.record_playouts(tally.wins_white, tally.wins_black, tally.draws);
    }
}

/// The move of the most-simulated root child, ties broken towards the
/// earliest child in scan order.
pub fn most_played_move(root: &State) -> Option<Move> {
    let mut best: Option<(&State, u64)> = None;
    for child in root.children() {
        let games = child.games_played();
        if best.map_or(true, |(_, best_games)| games > best_games) {
            best = Some((child, games));
        }
    }
    best.map(|(child, _)| child.last_move())
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_settings(workers: usize) -> SearchSettings {
        SearchSettings {
            workers,
            seed: Some(1),
            playout_ply_cap: 40,
            ..Default::default()
        }
    }

    fn run_search(fen: Option<&str>, iterations: u64, workers: usize) -> (State, SearchStats) {
        let settings = test_settings(workers);
        let pool = WorkerPool::new(&settings);
        let stop_flag = AtomicBool::new(false);

        let mut root = match fen {
            Some(fen) => State::try_parse_fen(fen).unwrap(),
            None => State::starting_position(),
        };

        let stats = SearchContext::new(&mut root, &settings, &pool, &stop_flag)
            .run_iterations(iterations);
        (root, stats)
    }

    #[test]
    fn first_iteration_simulates_the_root_itself() {
        let (root, stats) = run_search(None, 1, 1);
        assert_eq!(stats.iterations, 1);
        assert_eq!(stats.playouts, 1);
        assert_eq!(root.games_played(), 1);
        // The tree has not grown yet
        assert!(root.children().iter().all(|c| c.games_played() == 0));
    }

    #[test]
    fn unsimulated_children_are_visited_before_any_revisit() {
        // 1 (root) + 20 (one per child) iterations
        let (root, _) = run_search(None, 21, 1);
        assert_eq!(root.children().len(), 20);
        for child in root.children() {
            assert_eq!(child.games_played(), 1);
        }
    }

    #[test]
    fn backpropagation_identity() {
        let iterations = 60;
        let (root, stats) = run_search(None, iterations, 1);

        assert_eq!(stats.playouts, iterations);
        assert_eq!(root.games_played(), iterations);

        // Every playout except the root's own first one was credited to
        // exactly one top-level child.
        let child_games: u64 = root.children().iter().map(State::games_played).sum();
        assert_eq!(child_games, iterations - 1);

        let child_wins_white: u64 = root.children().iter().map(State::wins_white).sum();
        let child_wins_black: u64 = root.children().iter().map(State::wins_black).sum();
        let child_draws: u64 = root.children().iter().map(State::draws).sum();
        assert!(child_wins_white <= root.wins_white());
        assert!(child_wins_black <= root.wins_black());
        assert!(child_draws <= root.draws());
    }

    #[test]
    fn playout_counts_scale_with_workers() {
        let (root, stats) = run_search(None, 5, 4);
        assert_eq!(stats.iterations, 5);
        assert_eq!(stats.playouts, 20);
        assert_eq!(root.games_played(), 20);
    }

    #[test]
    fn terminal_root_keeps_accumulating() {
        // Checkmated position: selection always lands on the root
        let (root, _) = run_search(
            Some("rnb1kbnr/pppp1ppp/4p3/8/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3"),
            3,
            2,
        );
        assert_eq!(root.games_played(), 6);
        assert_eq!(root.wins_black(), 6);
        assert_eq!(root.children().len(), 0);
    }

    #[test]
    fn ucb_prefers_the_stronger_child() {
        let mut root = State::starting_position();
        root.expand();
        root.record_playouts(6, 4, 0);

        // White to move at the root: child 0 looks winning for white, child
        // 1 looks losing, the rest are untried... give every child one game
        // so UCB ranking applies.
        for child in root.children_mut() {
            child.record_playouts(0, 0, 1);
        }
        root.children_mut()[0].record_playouts(3, 0, 0);
        root.children_mut()[1].record_playouts(0, 3, 0);

        assert_eq!(best_ucb_index(&root, 0.5), 0);
    }

    #[test]
    fn ucb_ties_break_towards_scan_order() {
        let mut root = State::starting_position();
        root.expand();
        root.record_playouts(10, 10, 0);
        for child in root.children_mut() {
            child.record_playouts(1, 1, 0);
        }

        assert_eq!(best_ucb_index(&root, 0.5), 0);
    }

    #[test]
    fn most_played_move_picks_the_heaviest_child() {
        let mut root = State::starting_position();
        root.expand();
        // All children at zero games: the first child wins the tie
        assert_eq!(
            most_played_move(&root),
            Some(root.children()[0].last_move())
        );

        root.children_mut()[5].record_playouts(2, 1, 1);
        let expected = root.children()[5].last_move();
        assert_eq!(most_played_move(&root), Some(expected));
    }

    #[test]
    fn stopping_is_cooperative() {
        let settings = test_settings(1);
        let pool = WorkerPool::new(&settings);
        let stop_flag = AtomicBool::new(true);

        let mut root = State::starting_position();
        let stats = SearchContext::new(&mut root, &settings, &pool, &stop_flag).run();

        // Flag already set: not a single iteration ran
        assert_eq!(stats.iterations, 0);
        assert_eq!(root.games_played(), 0);
    }
}
