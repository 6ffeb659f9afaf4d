//! # Execution schedules
//!
//! Every stage of the pipeline writes one output cell per pixel from immutable inputs, so a stage
//! body can be run row by row on one thread or spread across the rayon thread pool without any
//! change in output.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    /// A plain loop over the rows on the calling thread.
    Sequential,

    /// Rows are distributed over the global rayon thread pool.
    Parallel
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Schedule {
    /// Calls `f(y, row)` for every `width`-long row of `out`.
    pub(crate) fn for_each_row<T, F>(self, out: &mut [T], width: usize, f: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Sync + Send
    {
        if width == 0 {
            return;
        }

        match self {
            Schedule::Sequential => out
                .chunks_mut(width)
                .enumerate()
                .for_each(|(y, row)| f(y, row)),
            Schedule::Parallel => out
                .par_chunks_mut(width)
                .enumerate()
                .for_each(|(y, row)| f(y, row))
        }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Schedule::Parallel
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
