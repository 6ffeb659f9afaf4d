//! # Left/right consistency
//!
//! Cross-checks the left-reference and right-reference disparity maps against each other.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use crate::disparity::DisparityMap;
use crate::error::*;
use crate::frame::check_dimensions;
use crate::schedule::Schedule;

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Keep the left disparity of every pixel where the two maps differ by at most `tolerance`, mark
/// the rest `INVALID`.
pub fn cross_check(
    left: &DisparityMap,
    right: &DisparityMap,
    tolerance: usize,
    schedule: Schedule
) -> Result<DisparityMap> {
    check_dimensions(left.dimensions(), right.dimensions())?;

    let mut map = DisparityMap::from_rows(left.width(), left.height(), schedule, |y, row| {
        let pairs = left.row(y).iter().zip(right.row(y));

        for (out, (&dl, &dr)) in row.iter_mut().zip(pairs) {
            *out = if (dl as i64 - dr as i64).abs() as usize <= tolerance {
                dl
            }
            else {
                DisparityMap::INVALID
            };
        }
    });
    map.max_disp = left.max_disp;

    Ok(map)
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
