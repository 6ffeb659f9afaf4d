//! # ZNCC disparity computation
//!
//! This module provides a dense block matcher scoring candidate disparities with the Zero-mean
//! Normalised Cross-Correlation of square windows. A run matches in both directions, drops pixels
//! where the two directions disagree and then fills the holes from their neighbours.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;
use std::time::Instant;

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::consistency::cross_check;
use crate::disparity::{DisparityAlgorithm, DisparityMap};
use crate::error::*;
use crate::frame::{Direction, StereoFrame};
use crate::occlusion::fill_occlusions;
use crate::schedule::Schedule;

#[cfg(feature = "statistics")]
use plotters::prelude::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

#[cfg(feature = "statistics")]
const PLOT_DIR: &str = "plots/zncc";

#[cfg(feature = "statistics")]
const PLOT_PATH: &str = "plots/zncc/invalid_rows.png";

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

pub struct Zncc {
    params: Params
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Params {
    /// Side of the square correlation window, must be odd.
    pub window_size: usize,

    /// Largest disparity searched, inclusive.
    pub max_disparity: usize,

    /// Largest allowed difference between the two directional maps.
    pub cross_check_tolerance: usize,

    /// Side of the square neighbourhood used to fill invalid pixels, must be odd.
    pub neighbourhood_size: usize,

    /// Reference image used by `search`. A full run always matches in both directions.
    pub direction: Direction,

    pub schedule: Schedule
}

/// Every intermediate map of a run.
#[derive(Debug, Clone)]
pub struct Stages {
    pub left: DisparityMap,
    pub right: DisparityMap,
    pub consistent: DisparityMap,
    pub filled: DisparityMap
}

/// Pixel accessors for one window placement.
struct Window<'a> {
    reference: &'a [u8],
    candidate: &'a [u8],
    width: isize,
    height: isize,
    x: isize,
    y: isize,
    shift: isize,
    radius: isize
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Params {
    /// Half the window size, rounded down.
    pub fn radius(&self) -> usize {
        self.window_size.saturating_sub(1) / 2
    }

    /// Check the invariants the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 || self.window_size % 2 == 0 {
            return Err(Error::InvalidParams(format!(
                "window size must be odd and at least 1, got {}", self.window_size
            )));
        }

        if self.neighbourhood_size == 0 || self.neighbourhood_size % 2 == 0 {
            return Err(Error::InvalidParams(format!(
                "neighbourhood size must be odd and at least 1, got {}", self.neighbourhood_size
            )));
        }

        if self.max_disparity > i32::MAX as usize {
            return Err(Error::InvalidParams(format!(
                "maximum disparity {} does not fit a disparity map", self.max_disparity
            )));
        }

        Ok(())
    }

    /// Parameters for images shrunk by `factor`, see `preprocess::downsample`.
    pub fn downscaled(&self, factor: u32) -> Result<Self> {
        if factor == 0 {
            return Err(Error::InvalidParams("downsampling factor must be at least 1".into()));
        }

        Ok(Params {
            max_disparity: self.max_disparity / factor as usize,
            ..self.clone()
        })
    }

    /// The same parameters matching with the given reference image.
    pub fn with_direction(&self, direction: Direction) -> Self {
        Params {
            direction,
            ..self.clone()
        }
    }

    /// Parse parameters from JSON. Missing fields take their default value.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: Params = serde_json::from_str(json)?;
        params.validate()?;

        Ok(params)
    }

    /// Load parameters from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

impl Default for Params {
    fn default() -> Self {
        Params {
            window_size: 11,
            max_disparity: 65,
            cross_check_tolerance: 8,
            neighbourhood_size: 3,
            direction: Direction::LeftReference,
            schedule: Schedule::Parallel
        }
    }
}

impl Window<'_> {
    /// Visit every `(reference, candidate)` sample pair of the window, skipping offsets whose
    /// samples would fall outside the image.
    fn for_each_sample<F: FnMut(f64, f64)>(&self, mut f: F) {
        for dy in -self.radius..=self.radius {
            let row = self.y + dy;
            if row < 0 || row >= self.height {
                continue;
            }
            let base = (row * self.width) as usize;

            for dx in -self.radius..=self.radius {
                let rx = self.x + dx;
                let cx = rx - self.shift;
                if rx < 0 || rx >= self.width || cx < 0 || cx >= self.width {
                    continue;
                }

                f(
                    self.reference[base + rx as usize] as f64,
                    self.candidate[base + cx as usize] as f64
                );
            }
        }
    }
}

impl Zncc {
    /// Create a new instance of the algorithm with the given parameters.
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Run the whole pipeline, keeping every intermediate map.
    pub fn compute_stages(&self, frame: &StereoFrame) -> Result<Stages> {
        self.params.validate()?;

        if self.params.window_size > frame.width().min(frame.height()) {
            warn!(
                "Window of {} px is larger than the {}x{} frame, every pixel is border",
                self.params.window_size, frame.width(), frame.height()
            );
        }

        // ---- STEREO CORRELATION ----

        let start = Instant::now();
        let left = search(frame, &self.params.with_direction(Direction::LeftReference))?;
        debug!("Left-reference search took {:?}", start.elapsed());

        let start = Instant::now();
        let right = search(frame, &self.params.with_direction(Direction::RightReference))?;
        debug!("Right-reference search took {:?}", start.elapsed());

        // ---- POST FILTER ----

        let start = Instant::now();
        let consistent = cross_check(
            &left,
            &right,
            self.params.cross_check_tolerance,
            self.params.schedule
        )?;
        debug!(
            "Cross-check took {:?}, {} invalid pixels",
            start.elapsed(),
            consistent.stats().invalid
        );

        let start = Instant::now();
        let mut filled = fill_occlusions(
            &consistent,
            self.params.neighbourhood_size,
            self.params.schedule
        )?;
        filled.max_disp = Some(self.params.max_disparity);
        debug!(
            "Occlusion filling took {:?}, {} invalid pixels remain",
            start.elapsed(),
            filled.stats().invalid
        );

        Ok(Stages {
            left,
            right,
            consistent,
            filled
        })
    }

    /// Plot the number of pixels per row invalidated by the cross-check.
    #[cfg(feature = "statistics")]
    fn plot_invalid_rows(&self, stages: &Stages) -> Result<()> {
        let map = &stages.consistent;

        let history: Vec<(usize, usize)> = (0..map.height())
            .map(|y| {
                let invalid = map.row(y)
                    .iter()
                    .filter(|&&d| d == DisparityMap::INVALID)
                    .count();
                (invalid, y)
            })
            .collect();

        std::fs::create_dir_all(PLOT_DIR)?;

        let area = BitMapBackend::new(PLOT_PATH, (800, 600)).into_drawing_area();
        area.fill(&WHITE).map_err(plot_err)?;

        let mut chart = ChartBuilder::on(&area)
            .caption("Invalid pixels per row", ("sans-serif", 20).into_font())
            .margin(5)
            .x_label_area_size(30)
            .y_label_area_size(30)
            .build_ranged(0..map.width() + 1, 0..map.height() + 1)
            .map_err(plot_err)?;

        chart.configure_mesh().draw().map_err(plot_err)?;

        chart
            .draw_series(LineSeries::new(history, &RED))
            .map_err(plot_err)?;

        debug!("Statistics plotted to {}", PLOT_PATH);

        Ok(())
    }
}

impl DisparityAlgorithm for Zncc {
    /// Compute the filled disparity map for the given frame.
    fn compute(&mut self, frame: &StereoFrame) -> Result<DisparityMap> {
        let stages = self.compute_stages(frame)?;

        #[cfg(feature = "statistics")]
        self.plot_invalid_rows(&stages)?;

        Ok(stages.filled)
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// ZNCC score of the `2 * radius + 1` window centred on `(x, y)` in the reference image against
/// the window shifted by `d` in the candidate image.
///
/// Offsets that would read outside the image are left out of every sum. Returns `None` when no
/// offset is left or when either window has zero variance.
pub fn window_score(
    frame: &StereoFrame,
    direction: Direction,
    radius: usize,
    x: usize,
    y: usize,
    d: usize
) -> Option<f64> {
    let (reference, candidate) = frame.pair(direction);

    let window = Window {
        reference: reference.as_raw(),
        candidate: candidate.as_raw(),
        width: frame.width() as isize,
        height: frame.height() as isize,
        x: x as isize,
        y: y as isize,
        shift: direction.sign() * d as isize,
        radius: radius as isize
    };

    let mut count = 0usize;
    let mut sum_ref = 0.0;
    let mut sum_cand = 0.0;

    window.for_each_sample(|r, c| {
        count += 1;
        sum_ref += r;
        sum_cand += c;
    });

    if count == 0 {
        return None;
    }

    let mean_ref = sum_ref / count as f64;
    let mean_cand = sum_cand / count as f64;

    let mut numerator = 0.0;
    let mut denom_ref = 0.0;
    let mut denom_cand = 0.0;

    window.for_each_sample(|r, c| {
        let r = r - mean_ref;
        let c = c - mean_cand;
        numerator += r * c;
        denom_ref += r * r;
        denom_cand += c * c;
    });

    let denom = denom_ref.sqrt() * denom_cand.sqrt();
    if denom == 0.0 {
        return None;
    }

    Some(numerator / denom)
}

/// Compute the disparity map with `params.direction` as the reference image.
///
/// Pixels within half a window of any edge are left `INVALID`. Every other pixel gets the
/// disparity in `0..=max_disparity` with the strictly highest score, ties going to the smaller
/// disparity. The scan stops as soon as the shifted window would cross column 0.
pub fn search(frame: &StereoFrame, params: &Params) -> Result<DisparityMap> {
    params.validate()?;

    let width = frame.width();
    let height = frame.height();
    let radius = params.radius();
    let direction = params.direction;
    let max_disparity = params.max_disparity;

    trace!(
        "Searching {:?} over {}x{} px, radius {}, disparities 0..={}",
        direction, width, height, radius, max_disparity
    );

    let mut map = DisparityMap::from_rows(width, height, params.schedule, |y, row| {
        if y < radius || y + radius >= height {
            return;
        }

        for x in radius..width.saturating_sub(radius) {
            row[x] = best_disparity(frame, direction, radius, max_disparity, x, y) as i32;
        }
    });
    map.max_disp = Some(max_disparity);

    Ok(map)
}

/// Arg-max of the window score over the candidate disparities of one pixel.
fn best_disparity(
    frame: &StereoFrame,
    direction: Direction,
    radius: usize,
    max_disparity: usize,
    x: usize,
    y: usize
) -> usize {
    let mut best_disp = 0;
    let mut best_score = std::f64::NEG_INFINITY;

    let width = frame.width() as isize;

    for d in 0..=max_disparity {
        // Left edge of the shifted window. Past the right edge every sample is skipped, and stays
        // skipped for larger shifts.
        let left_edge = x as isize - direction.sign() * d as isize - radius as isize;
        if left_edge < 0 || left_edge >= width {
            break;
        }

        if let Some(score) = window_score(frame, direction, radius, x, y, d) {
            if score > best_score {
                best_score = score;
                best_disp = d;
            }
        }
    }

    best_disp
}

#[cfg(feature = "statistics")]
fn plot_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Plotting(e.to_string())
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    /// Deterministic noise, textured enough that windows never correlate by accident. Same
    /// generator as `tests/common`.
    fn noise(x: u32, y: u32) -> u8 {
        let mut h = x.wrapping_mul(0x9E37_79B1) ^ y.wrapping_mul(0x85EB_CA77);
        h ^= h >> 15;
        h = h.wrapping_mul(0xC2B2_AE3D);
        h ^= h >> 13;
        (h >> 24) as u8
    }

    /// Pair where the left image is the right one moved `shift` columns to the right.
    fn shifted_pair(width: u32, height: u32, shift: u32) -> StereoFrame {
        let left = GrayImage::from_fn(width, height, |x, y| Luma([noise(x, y)]));
        let right = GrayImage::from_fn(width, height, |x, y| Luma([noise(x + shift, y)]));
        StereoFrame::new(left, right).unwrap()
    }

    fn params(window_size: usize, max_disparity: usize, direction: Direction) -> Params {
        Params {
            window_size,
            max_disparity,
            direction,
            ..Params::default()
        }
    }

    #[test]
    fn identical_windows_score_one() {
        let frame = shifted_pair(12, 12, 0);
        let score = window_score(&frame, Direction::LeftReference, 2, 6, 6, 0).unwrap();

        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn flat_windows_have_no_score() {
        let flat = GrayImage::from_pixel(9, 9, Luma([42]));
        let frame = StereoFrame::new(flat.clone(), flat).unwrap();

        assert_eq!(window_score(&frame, Direction::LeftReference, 2, 4, 4, 1), None);
    }

    #[test]
    fn window_fully_outside_has_no_score() {
        let frame = shifted_pair(8, 8, 0);

        assert_eq!(window_score(&frame, Direction::RightReference, 1, 6, 4, 5), None);
    }

    #[test]
    fn score_is_brightness_and_contrast_invariant() {
        let left = GrayImage::from_fn(10, 10, |x, y| Luma([noise(x, y) / 2]));
        let right = GrayImage::from_fn(10, 10, |x, y| Luma([noise(x, y) / 4 + 60]));
        let frame = StereoFrame::new(left, right).unwrap();

        let score = window_score(&frame, Direction::LeftReference, 2, 5, 5, 0).unwrap();
        assert!(score > 0.95);
    }

    #[test]
    fn border_is_invalid() {
        let frame = shifted_pair(20, 14, 2);
        let map = search(&frame, &params(5, 4, Direction::LeftReference)).unwrap();

        for y in 0..14 {
            for x in 0..20 {
                if x < 2 || x >= 18 || y < 2 || y >= 12 {
                    assert_eq!(map.get(x, y), DisparityMap::INVALID, "({}, {})", x, y);
                }
            }
        }
    }

    #[test]
    fn flat_pair_stays_at_zero() {
        let flat = GrayImage::from_pixel(16, 16, Luma([128]));
        let frame = StereoFrame::new(flat.clone(), flat).unwrap();
        let map = search(&frame, &params(5, 6, Direction::LeftReference)).unwrap();

        assert!(map.as_slice().iter().all(|&d| d == 0));
    }

    #[test]
    fn left_reference_recovers_global_shift() {
        let frame = shifted_pair(40, 16, 4);
        let map = search(&frame, &params(5, 10, Direction::LeftReference)).unwrap();

        // Columns below radius + shift can't reach the true disparity
        for y in 2..14 {
            for x in 6..38 {
                assert_eq!(map.get(x, y), 4, "({}, {})", x, y);
            }
        }
    }

    #[test]
    fn right_reference_recovers_global_shift() {
        let frame = shifted_pair(40, 16, 4);
        let map = search(&frame, &params(5, 10, Direction::RightReference)).unwrap();

        for y in 2..14 {
            for x in 2..34 {
                assert_eq!(map.get(x, y), 4, "({}, {})", x, y);
            }
        }
    }

    #[test]
    fn right_reference_stops_past_the_right_edge() {
        let frame = shifted_pair(16, 16, 3);
        let mut p = params(5, 16, Direction::RightReference);
        p.schedule = Schedule::Sequential;
        let bounded = search(&frame, &p).unwrap();

        // Would take seconds if every empty window were still scored
        p.max_disparity = 200_000;
        let start = Instant::now();
        let unbounded = search(&frame, &p).unwrap();

        assert_eq!(bounded.as_slice(), unbounded.as_slice());
        assert!(start.elapsed().as_secs() < 2);
    }

    #[test]
    fn ties_keep_the_smallest_disparity() {
        // Zero-mean windows of a horizontal ramp look the same at every shift
        let ramp = GrayImage::from_fn(16, 8, |x, _| Luma([(x * 8) as u8]));
        let frame = StereoFrame::new(ramp.clone(), ramp).unwrap();
        let map = search(&frame, &params(3, 5, Direction::LeftReference)).unwrap();

        assert!(map.as_slice().iter().all(|&d| d == 0));
    }

    #[test]
    fn schedules_agree() {
        let frame = shifted_pair(30, 20, 3);
        let mut p = params(5, 6, Direction::RightReference);

        p.schedule = Schedule::Sequential;
        let sequential = search(&frame, &p).unwrap();
        p.schedule = Schedule::Parallel;
        let parallel = search(&frame, &p).unwrap();

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn rejects_even_window() {
        let frame = shifted_pair(10, 10, 0);
        assert!(search(&frame, &params(4, 3, Direction::LeftReference)).is_err());
    }

    #[test]
    fn params_from_json_fill_defaults() {
        let params = Params::from_json_str(
            r#"{ "window_size": 5, "max_disparity": 8, "schedule": "sequential" }"#
        ).unwrap();

        assert_eq!(params.window_size, 5);
        assert_eq!(params.max_disparity, 8);
        assert_eq!(params.schedule, Schedule::Sequential);
        assert_eq!(params.neighbourhood_size, Params::default().neighbourhood_size);

        assert!(Params::from_json_str(r#"{ "neighbourhood_size": 2 }"#).is_err());
        assert!(Params::from_json_str("not json").is_err());
    }

    #[test]
    fn downscaling_divides_max_disparity() {
        let params = Params { max_disparity: 260, ..Params::default() };

        assert_eq!(params.downscaled(4).unwrap().max_disparity, 65);
        assert!(params.downscaled(0).is_err());
    }

    #[test]
    fn pipeline_recovers_shift() {
        let frame = shifted_pair(32, 20, 3);
        let params = Params {
            window_size: 5,
            max_disparity: 8,
            cross_check_tolerance: 2,
            neighbourhood_size: 3,
            ..Params::default()
        };

        let mut zncc = Zncc::new(params);
        let stages = zncc.compute_stages(&frame).unwrap();
        let filled = zncc.compute(&frame).unwrap();

        assert_eq!(stages.filled, filled);
        assert_eq!(filled.max_disp, Some(8));

        for y in 2..18 {
            for x in 5..30 {
                assert_eq!(stages.consistent.get(x, y), 3, "({}, {})", x, y);
            }
        }
    }
}
