//! # Stereo frames
//!
//! A rectified pair of grayscale images sharing the same dimensions.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;

use image::{DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};

use crate::error::*;
use crate::preprocess;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A rectified stereo pair. Both images are guaranteed to have the same dimensions.
#[derive(Debug, Clone)]
pub struct StereoFrame {
    left: GrayImage,
    right: GrayImage
}

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// Which image of the pair windows are anchored in.
///
/// With `LeftReference` a disparity `d` pairs left column `x` with right column `x - d`, with
/// `RightReference` it pairs right column `x` with left column `x + d`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    LeftReference,
    RightReference
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl StereoFrame {
    /// Build a frame from two grayscale images, failing if their dimensions differ.
    pub fn new(left: GrayImage, right: GrayImage) -> Result<Self> {
        check_dimensions(
            (left.width() as usize, left.height() as usize),
            (right.width() as usize, right.height() as usize)
        )?;

        Ok(Self { left, right })
    }

    /// Build a frame from two decoded images, reducing each to grayscale by channel averaging.
    pub fn from_dynamic(left: &DynamicImage, right: &DynamicImage) -> Result<Self> {
        Self::new(preprocess::average_gray(left), preprocess::average_gray(right))
    }

    /// Load a frame from a pair of image files.
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(left: P, right: Q) -> Result<Self> {
        let left = image::open(left)?;
        let right = image::open(right)?;

        Self::from_dynamic(&left, &right)
    }

    /// Apply the same image transform to both sides of the frame.
    pub fn map<F>(&self, f: F) -> Result<Self>
    where
        F: Fn(&GrayImage) -> Result<GrayImage>
    {
        Self::new(f(&self.left)?, f(&self.right)?)
    }

    pub fn left(&self) -> &GrayImage {
        &self.left
    }

    pub fn right(&self) -> &GrayImage {
        &self.right
    }

    pub fn width(&self) -> usize {
        self.left.width() as usize
    }

    pub fn height(&self) -> usize {
        self.left.height() as usize
    }

    /// Returns the `(reference, candidate)` images for the given direction.
    pub fn pair(&self, direction: Direction) -> (&GrayImage, &GrayImage) {
        match direction {
            Direction::LeftReference => (&self.left, &self.right),
            Direction::RightReference => (&self.right, &self.left)
        }
    }
}

impl Direction {
    /// Sign applied to a disparity to get the candidate column offset (`x - sign * d`).
    pub fn sign(self) -> isize {
        match self {
            Direction::LeftReference => 1,
            Direction::RightReference => -1
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::LeftReference => Direction::RightReference,
            Direction::RightReference => Direction::LeftReference
        }
    }
}

impl Default for Direction {
    fn default() -> Self {
        Direction::LeftReference
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Fails with `Error::DimensionMismatch` unless both `(width, height)` pairs are equal.
pub(crate) fn check_dimensions(left: (usize, usize), right: (usize, usize)) -> Result<()> {
    if left != right {
        return Err(Error::DimensionMismatch { left, right });
    }

    Ok(())
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
