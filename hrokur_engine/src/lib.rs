//! Monte-Carlo tree search for hrokur.
//!
//! The [`Engine`] owns a pool of playout workers (spawned once, parked
//! between jobs) and at most one driver thread running the search loop. The
//! search tree lives entirely on the driver; the only cross-thread traffic
//! is owned copies of the selected node going out and playout tallies coming
//! back.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::JoinHandle,
};

use hrokur_core::board::State;
use log::info;
use thiserror::Error;

use mcts::{most_played_move, SearchContext};
use search_result::SearchResult;
use search_settings::SearchSettings;
use worker::WorkerPool;

pub mod mcts;
pub mod playout;
pub mod search_result;
pub mod search_settings;
pub mod search_stats;
pub mod worker;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("a search is already running")]
    AlreadyRunning,
}

pub struct Engine {
    settings: SearchSettings,
    pool: Arc<WorkerPool>,
    stop_flag: Arc<AtomicBool>,
    driver: Option<JoinHandle<()>>,
}

impl Engine {
    pub fn new(settings: SearchSettings) -> Self {
        let pool = Arc::new(WorkerPool::new(&settings));
        Self {
            settings,
            pool,
            stop_flag: Arc::new(AtomicBool::new(false)),
            driver: None,
        }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Returns true while a driver thread is running.
    pub fn is_searching(&self) -> bool {
        self.driver
            .as_ref()
            .is_some_and(|driver| !driver.is_finished())
    }

    /// Starts searching from a copy of `state` on a dedicated driver thread.
    ///
    /// The search runs until [`stop`](Self::stop) flips the stop flag; the
    /// driver then invokes `callback` with the searched tree. Refuses to
    /// start while a previous search is still running.
    pub fn start_search(
        &mut self,
        state: &State,
        callback: impl FnOnce(SearchResult) + Send + 'static,
    ) -> Result<(), SearchError> {
        if self.is_searching() {
            return Err(SearchError::AlreadyRunning);
        }

        self.stop_flag.store(false, Ordering::Relaxed);

        let stop_flag = Arc::clone(&self.stop_flag);
        let pool = Arc::clone(&self.pool);
        let settings = self.settings.clone();
        let mut root = state.clone();

        info!(
            "starting search with {} workers from ply {}",
            pool.worker_count(),
            root.ply()
        );

        self.driver = Some(std::thread::spawn(move || {
            let stats = SearchContext::new(&mut root, &settings, &pool, &stop_flag).run();

            info!(
                "search finished: {} playouts in {:.2}s ({:.0}/s)",
                stats.playouts,
                stats.elapsed.as_secs_f64(),
                stats.playouts_per_second()
            );

            let best_move = most_played_move(&root);
            callback(SearchResult {
                root,
                best_move,
                stats,
            });
        }));

        Ok(())
    }

    /// Asks the running search to stop at its next iteration boundary. The
    /// callback passed to [`start_search`](Self::start_search) still fires.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    /// Stops any running search and blocks until the driver has delivered
    /// its result.
    pub fn shutdown(&mut self) {
        self.stop();
        if let Some(driver) = self.driver.take() {
            let _ = driver.join();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crossbeam_channel::bounded;
    use pretty_assertions::assert_eq;

    fn small_settings() -> SearchSettings {
        SearchSettings {
            workers: 2,
            seed: Some(9),
            playout_ply_cap: 30,
            ..Default::default()
        }
    }

    #[test]
    fn search_stops_and_delivers_a_result() {
        let mut engine = Engine::new(small_settings());
        let state = State::starting_position();

        let (tx, rx) = bounded(1);
        engine
            .start_search(&state, move |result| {
                tx.send(result).unwrap();
            })
            .unwrap();

        assert!(engine.is_searching());

        // Let at least a few iterations happen, then stop
        std::thread::sleep(std::time::Duration::from_millis(50));
        engine.stop();

        let result = rx.recv().unwrap();
        assert_eq!(result.root, state);
        assert_eq!(result.root.games_played(), result.stats.playouts);
        assert!(result.stats.playouts >= result.stats.iterations);
    }

    #[test]
    fn second_search_is_refused_while_running() {
        let mut engine = Engine::new(small_settings());
        let state = State::starting_position();

        let (tx, rx) = bounded(1);
        engine
            .start_search(&state, move |result| {
                tx.send(result).unwrap();
            })
            .unwrap();

        let refused = engine.start_search(&state, |_| {});
        assert!(matches!(refused, Err(SearchError::AlreadyRunning)));

        engine.stop();
        rx.recv().unwrap();
    }

    #[test]
    fn engine_can_search_again_after_a_stop() {
        let mut engine = Engine::new(small_settings());
        let state = State::starting_position();

        for _ in 0..2 {
            let (tx, rx) = bounded(1);
            engine
                .start_search(&state, move |result| {
                    tx.send(result).unwrap();
                })
                .unwrap();
            engine.stop();
            rx.recv().unwrap();
            engine.shutdown();
        }
    }
}
