//! The playout worker pool.
//!
//! Workers are spawned once, block on a private job channel each, and never
//! touch the search tree: a job carries an owned copy of the selected node
//! and the result travels back over a shared channel as a plain tally.

use std::{
    thread::{self, JoinHandle},
    time::{SystemTime, UNIX_EPOCH},
};

use crossbeam_channel::{bounded, Receiver, Sender};
use hrokur_core::board::State;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    playout::{playout, PlayoutTally},
    search_settings::SearchSettings,
};

enum Job {
    Playout(Box<State>),
    Shutdown,
}

struct Worker {
    jobs: Sender<Job>,
    thread: Option<JoinHandle<()>>,
}

pub struct WorkerPool {
    workers: Vec<Worker>,
    results: Receiver<PlayoutTally>,
}

impl WorkerPool {
    /// Spawns the configured number of workers, each with a generator seeded
    /// from the configured base seed (or the wall clock) plus its index.
    pub fn new(settings: &SearchSettings) -> Self {
        let worker_count = settings.workers.max(1);
        let base_seed = settings.seed.unwrap_or_else(seed_from_clock);
        let ply_cap = settings.playout_ply_cap;

        let (result_tx, results) = bounded(worker_count);

        let workers = (0..worker_count)
            .map(|index| {
                let (jobs, job_rx) = bounded::<Job>(1);
                let result_tx = result_tx.clone();
                let rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(index as u64));

                let thread = thread::Builder::new()
                    .name(format!("playout-{index}"))
                    .spawn(move || worker_loop(job_rx, result_tx, rng, ply_cap))
                    .expect("failed to spawn playout worker");

                Worker {
                    jobs,
                    thread: Some(thread),
                }
            })
            .collect();

        Self { workers, results }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Fans one playout per worker onto independent copies of `node`,
    /// blocks until all of them come back, and returns the summed tally.
    pub fn run_playouts(&self, node: &State) -> PlayoutTally {
        for worker in &self.workers {
            worker
                .jobs
                .send(Job::Playout(Box::new(node.clone())))
                .expect("playout worker hung up");
        }

        let mut tally = PlayoutTally::default();
        for _ in &self.workers {
            tally.merge(self.results.recv().expect("playout worker hung up"));
        }
        tally
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for worker in &self.workers {
            // A worker that already exited has disconnected its receiver;
            // nothing to do for it.
            let _ = worker.jobs.send(Job::Shutdown);
        }
        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                let _ = thread.join();
            }
        }
    }
}

fn worker_loop(
    jobs: Receiver<Job>,
    results: Sender<PlayoutTally>,
    mut rng: ChaCha8Rng,
    ply_cap: u32,
) {
    while let Ok(job) = jobs.recv() {
        match job {
            Job::Playout(state) => {
                let tally = playout(*state, &mut rng, ply_cap);
                if results.send(tally).is_err() {
                    break;
                }
            }
            Job::Shutdown => break,
        }
    }
}

fn seed_from_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn settings(workers: usize) -> SearchSettings {
        SearchSettings {
            workers,
            seed: Some(42),
            playout_ply_cap: 40,
            ..Default::default()
        }
    }

    #[test]
    fn pool_runs_one_playout_per_worker() {
        let pool = WorkerPool::new(&settings(3));
        assert_eq!(pool.worker_count(), 3);

        let root = State::starting_position();
        let tally = pool.run_playouts(&root);
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn pool_can_be_reused_across_iterations() {
        let pool = WorkerPool::new(&settings(2));
        let root = State::starting_position();

        let mut sum = PlayoutTally::default();
        for _ in 0..4 {
            sum.merge(pool.run_playouts(&root));
        }
        assert_eq!(sum.total(), 8);
    }

    #[test]
    fn zero_workers_is_clamped_to_one() {
        let pool = WorkerPool::new(&settings(0));
        assert_eq!(pool.worker_count(), 1);
    }

    #[test]
    fn pool_shuts_down_cleanly() {
        let pool = WorkerPool::new(&settings(4));
        let root = State::starting_position();
        pool.run_playouts(&root);
        drop(pool);
    }
}
