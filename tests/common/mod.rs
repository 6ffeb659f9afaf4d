//! Shared helpers for the integration tests.

#![allow(dead_code)]

use image::{GrayImage, Luma};
use zncc_disparity::prelude::*;

/// Deterministic noise, textured enough that windows never correlate by accident.
pub fn noise(x: u32, y: u32) -> u8 {
    let mut h = x.wrapping_mul(0x9E37_79B1) ^ y.wrapping_mul(0x85EB_CA77);
    h ^= h >> 15;
    h = h.wrapping_mul(0xC2B2_AE3D);
    h ^= h >> 13;
    (h >> 24) as u8
}

/// Left and right images where the left one is the right one moved `shift` columns right.
pub fn shifted_images(width: u32, height: u32, shift: u32) -> (GrayImage, GrayImage) {
    let left = GrayImage::from_fn(width, height, |x, y| Luma([noise(x, y)]));
    let right = GrayImage::from_fn(width, height, |x, y| Luma([noise(x + shift, y)]));
    (left, right)
}

pub fn shifted_pair(width: u32, height: u32, shift: u32) -> StereoFrame {
    let (left, right) = shifted_images(width, height, shift);
    StereoFrame::new(left, right).unwrap()
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
