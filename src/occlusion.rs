//! # Occlusion filling
//!
//! Fills pixels left invalid by the cross-check from their valid neighbours.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use log::warn;

use crate::disparity::DisparityMap;
use crate::error::*;
use crate::schedule::Schedule;

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Replace each `INVALID` pixel at least `neighbourhood_size / 2` away from the edges with the
/// middle element of its valid neighbours.
///
/// Neighbours are gathered row by row, left to right, skipping the centre, and the element at
/// index `len / 2` of that list is taken as is. The list is not sorted, so this is a
/// positional rather than a statistical median. Neighbours are always read from `map`, never from
/// pixels filled earlier in the same pass.
pub fn fill_occlusions(
    map: &DisparityMap,
    neighbourhood_size: usize,
    schedule: Schedule
) -> Result<DisparityMap> {
    if neighbourhood_size == 0 || neighbourhood_size % 2 == 0 {
        return Err(Error::InvalidParams(format!(
            "neighbourhood size must be odd and at least 1, got {}", neighbourhood_size
        )));
    }

    let (width, height) = map.dimensions();
    let half = neighbourhood_size / 2;

    if neighbourhood_size > width.min(height) {
        warn!(
            "Neighbourhood of {} px doesn't fit in a {}x{} map, nothing will be filled",
            neighbourhood_size, width, height
        );
    }

    let mut filled = DisparityMap::from_rows(width, height, schedule, |y, row| {
        row.copy_from_slice(map.row(y));

        if y < half || y + half >= height {
            return;
        }

        let mut neighbours = Vec::with_capacity(neighbourhood_size * neighbourhood_size);

        for x in half..width.saturating_sub(half) {
            if row[x] != DisparityMap::INVALID {
                continue;
            }

            neighbours.clear();
            for ny in y - half..=y + half {
                for nx in x - half..=x + half {
                    if nx == x && ny == y {
                        continue;
                    }

                    let val = map.get(nx, ny);
                    if val != DisparityMap::INVALID {
                        neighbours.push(val);
                    }
                }
            }

            if let Some(&median) = neighbours.get(neighbours.len() / 2) {
                row[x] = median;
            }
        }
    });
    filled.max_disp = map.max_disp;

    Ok(filled)
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
