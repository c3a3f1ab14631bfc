//! Batch execution of per-index kernels.
//!
//! Every phase is a flat batch over `0..count`. The batch returning is the
//! barrier: all writes of phase N are visible before phase N+1 starts.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// How a phase's invocations are scheduled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dispatch {
    /// rayon work-stealing pool, no ordering between invocations
    #[default]
    Parallel,
    /// In-order loop on the calling thread
    Serial,
}

impl Dispatch {
    /// Run `kernel(tid)` for every `tid` in `0..count` and wait for all of them.
    pub fn for_each_index<F>(self, count: usize, kernel: F)
    where
        F: Fn(usize) + Sync + Send,
    {
        match self {
            Dispatch::Parallel => (0..count).into_par_iter().for_each(kernel),
            Dispatch::Serial => (0..count).for_each(kernel),
        }
    }
}
