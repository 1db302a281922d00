use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Context as _;
use rayon::prelude::*;
use tracing::info;

use crate::{
    foundation::{
        core::TileCoord,
        error::{Goes16Error, Goes16Result},
    },
    net::{fetch::Fetcher, transport::Transport},
    tiles::plan::TileJob,
};

/// Raw bytes of one downloaded tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileResult {
    pub coord: TileCoord,
    pub bytes: Vec<u8>,
}

/// Completion counter shared by the workers of one download run.
#[derive(Debug)]
pub struct Progress {
    done: AtomicUsize,
    total: usize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            done: AtomicUsize::new(0),
            total,
        }
    }

    /// Records one completion and returns the new count.
    ///
    /// Exactly one caller observes `total`.
    pub fn complete(&self) -> usize {
        let n = self.done.fetch_add(1, Ordering::AcqRel) + 1;
        if n == self.total {
            info!("Downloading tiles: completed.");
        } else {
            info!("Downloading tiles: {n}/{} completed...", self.total);
        }
        n
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::Acquire)
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

/// Downloads every job on its own worker thread.
///
/// All jobs run to completion; if any of them exhausted its retries the
/// whole run fails with [`Goes16Error::PartialDownload`].
pub fn download_all<T: Transport>(
    fetcher: &Fetcher<T>,
    jobs: &[TileJob],
) -> Goes16Result<Vec<TileResult>> {
    if jobs.is_empty() {
        return Err(Goes16Error::validation("no tiles to download"));
    }

    let pool = build_thread_pool(jobs.len())?;
    let progress = Progress::new(jobs.len());

    info!("Downloading tiles...");
    let outcomes: Vec<Goes16Result<TileResult>> = pool.install(|| {
        jobs.par_iter()
            .with_max_len(1)
            .map(|job| {
                let bytes = fetcher.fetch(&job.url())?;
                progress.complete();
                Ok(TileResult {
                    coord: job.coord,
                    bytes,
                })
            })
            .collect()
    });

    let total = outcomes.len();
    let mut results = Vec::with_capacity(total);
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(result) => results.push(result),
            Err(err) => failures.push(err),
        }
    }

    if let Some(first) = failures.first() {
        return Err(Goes16Error::PartialDownload {
            failed: failures.len(),
            total,
            first: first.to_string(),
        });
    }
    Ok(results)
}

fn build_thread_pool(threads: usize) -> Goes16Result<rayon::ThreadPool> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("goes16-tile-{i}"))
        .build()
        .context("build tile download pool")?;
    Ok(pool)
}
