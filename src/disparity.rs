//! # General disparity objects
//!
//! This module provides generic disparity traits and structures for use by different algorithms.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::GrayImage;

use crate::error::*;
use crate::frame::StereoFrame;
use crate::schedule::Schedule;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A dense integer disparity map, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisparityMap {
    width: usize,
    height: usize,
    data: Vec<i32>,

    /// Upper bound of the search that produced this map, used for normalisation.
    pub max_disp: Option<usize>
}

/// Summary of the values held in a disparity map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisparityStats {
    /// Smallest valid disparity, `None` if every pixel is invalid.
    pub min: Option<i32>,
    pub max: Option<i32>,
    pub invalid: usize
}

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

pub trait DisparityAlgorithm {
    /// Compute the disparity map of the given stereo frame.
    fn compute(&mut self, frame: &StereoFrame) -> Result<DisparityMap>;
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl DisparityMap {
    /// Marks border, inconsistent and unmatched pixels. Shares its value with a literal zero
    /// disparity.
    pub const INVALID: i32 = 0;

    /// Create a map with every pixel set to `INVALID`.
    pub fn new(width: usize, height: usize) -> Self {
        DisparityMap {
            width,
            height,
            data: vec![Self::INVALID; width * height],
            max_disp: None
        }
    }

    /// Wrap an existing row-major buffer.
    pub fn from_vec(width: usize, height: usize, data: Vec<i32>) -> Result<Self> {
        if data.len() != width * height {
            return Err(Error::InvalidParams(format!(
                "a {}x{} disparity map needs {} values, got {}",
                width, height, width * height, data.len()
            )));
        }

        Ok(DisparityMap {
            width,
            height,
            data,
            max_disp: None
        })
    }

    /// Build a map by running `f(y, row)` over every row under the given schedule. Rows start out
    /// `INVALID`.
    pub(crate) fn from_rows<F>(width: usize, height: usize, schedule: Schedule, f: F) -> Self
    where
        F: Fn(usize, &mut [i32]) + Sync + Send
    {
        let mut map = Self::new(width, height);
        schedule.for_each_row(&mut map.data, width, f);
        map
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn get(&self, x: usize, y: usize) -> i32 {
        self.data[y * self.width + x]
    }

    pub fn put(&mut self, x: usize, y: usize, val: i32) {
        self.data[y * self.width + x] = val;
    }

    pub fn row(&self, y: usize) -> &[i32] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<i32> {
        self.data
    }

    /// Minimum and maximum valid disparity and the number of invalid pixels.
    pub fn stats(&self) -> DisparityStats {
        let mut stats = DisparityStats {
            min: None,
            max: None,
            invalid: 0
        };

        for &val in &self.data {
            if val == Self::INVALID {
                stats.invalid += 1;
                continue;
            }

            stats.min = Some(stats.min.map_or(val, |m| m.min(val)));
            stats.max = Some(stats.max.map_or(val, |m| m.max(val)));
        }

        stats
    }

    /// Converts the map into a Luma8 image, clamping disparities to `0..=255`.
    pub fn to_luma(&self) -> GrayImage {
        GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let val = self.get(x as usize, y as usize).max(0).min(255);
            image::Luma([val as u8])
        })
    }

    /// Converts the map to a normalised GrayImage.
    ///
    /// Normalises by the search's maximum disparity. If the maximum disparity is not set then the
    /// function is equivalent to `.to_luma()`.
    pub fn to_luma_normalised(&self) -> GrayImage {
        match self.max_disp {
            Some(max) => self.normalise(max),
            None => self.to_luma()
        }
    }

    /// Rescale every disparity from `0..=max_disparity` to `0..=255`.
    pub fn normalise(&self, max_disparity: usize) -> GrayImage {
        GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            image::Luma([normalise_value(self.get(x as usize, y as usize), max_disparity)])
        })
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// `round(value / max_disparity * 255)`, saturating at the ends of the `u8` range.
///
/// A zero `max_disparity` maps everything to black.
pub fn normalise_value(value: i32, max_disparity: usize) -> u8 {
    if max_disparity == 0 {
        return 0;
    }

    // Float to int casts saturate, so out of range values clamp to 0 or 255.
    (value as f64 / max_disparity as f64 * 255.0).round() as u8
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
