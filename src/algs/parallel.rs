//! Bounded parallel execution over target cells.
//!
//! Each run owns a dedicated Rayon pool sized by
//! [`RegridConfig::max_concurrency`](crate::config::RegridConfig), so at most
//! that many per-target tasks execute at once. Tasks only read shared state
//! and return their own results; the collecting `collect()` inside
//! `pool.install` is the join that every task must pass before a mapping is
//! considered final.

use crate::algs::weights::TargetOutcome;
use crate::data::mapping::{Diagnostics, SparseMapping};
use crate::mesh_error::MeshRegridError;
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Cooperative cancellation flag, checked before each per-target task.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A fixed-size worker pool for one regridding run.
pub struct Executor {
    pool: rayon::ThreadPool,
    max_concurrency: usize,
}

impl Executor {
    pub fn new(max_concurrency: usize) -> Result<Self, MeshRegridError> {
        if max_concurrency == 0 {
            return Err(MeshRegridError::InvalidConfig(
                "max_concurrency must be at least 1".into(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_concurrency)
            .thread_name(|i| format!("regrid-worker-{i}"))
            .build()
            .map_err(|e| MeshRegridError::ThreadPool(e.to_string()))?;
        Ok(Self {
            pool,
            max_concurrency,
        })
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Run `task(t)` for every `t in 0..count` and return results in `t` order.
    ///
    /// Returns [`MeshRegridError::Cancelled`] if `cancel` fires before all
    /// tasks have started; no partial results are kept.
    pub fn run<T, F>(
        &self,
        count: usize,
        cancel: Option<&CancelToken>,
        task: F,
    ) -> Result<Vec<T>, MeshRegridError>
    where
        T: Send,
        F: Fn(usize) -> T + Send + Sync,
    {
        let done = AtomicUsize::new(0);
        let report_every = (count / 10).max(1);
        self.pool.install(|| {
            (0..count)
                .into_par_iter()
                .map(|t| {
                    if cancel.is_some_and(CancelToken::is_cancelled) {
                        return Err(MeshRegridError::Cancelled);
                    }
                    let out = task(t);
                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    if finished % report_every == 0 {
                        log::debug!("processed {finished} of {count} target cells");
                    }
                    Ok(out)
                })
                .collect()
        })
    }
}

/// Merge per-target outcomes into one mapping plus the combined diagnostics.
pub fn merge_outcomes(
    outcomes: Vec<TargetOutcome>,
) -> Result<(SparseMapping, Diagnostics), MeshRegridError> {
    let total = outcomes.iter().map(|o| o.records.len()).sum();
    let mut records = Vec::with_capacity(total);
    let mut diagnostics = Diagnostics::default();
    for outcome in outcomes {
        records.extend(outcome.records);
        diagnostics.extend(outcome.diagnostics);
    }
    let mapping = SparseMapping::from_records(records)?;
    Ok((mapping, diagnostics))
}
